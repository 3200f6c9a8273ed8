//! Error types for lowering source code into an expression tree
//!
//! Evaluation itself never fails: it yields `Option<String>`. Only the
//! frontends, which parse host source, have an error channel.

use thiserror::Error;

/// Error produced while lowering source code.
#[derive(Error, Debug)]
pub enum FrontendError {
    /// The source did not parse
    #[error("Parse error: {0}")]
    Parse(#[from] syn::Error),

    /// Two constants or statics share a path
    #[error("Duplicate definition: `{name}` is defined more than once")]
    DuplicateDefinition {
        /// Qualified name of the definition
        name: String,
    },
}

/// Result type alias for frontend operations
pub type Result<T> = std::result::Result<T, FrontendError>;
