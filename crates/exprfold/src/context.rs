//! Evaluation context configuration

/// Default recursion limit for [`EvalContext`].
pub const DEFAULT_MAX_DEPTH: usize = 1000;

/// Configuration passed to every evaluation.
///
/// The visited-set already stops cycles; `max_depth` additionally bounds
/// how deep a chain of distinct nodes may go before evaluation gives up on
/// the current branch and falls back to its default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalContext {
    /// Maximum recursion depth of the constant evaluator
    pub max_depth: usize,
}

impl Default for EvalContext {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl EvalContext {
    /// Create a new context with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context with a custom depth limit.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }
}
