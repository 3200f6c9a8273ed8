//! Expression evaluation
//!
//! Two reductions over an [`ExprTree`], both total:
//!
//! - [`Evaluator::evaluate_constant`] folds an expression to the string a
//!   compile-time constant would hold, or the caller's default.
//! - [`Evaluator::substitute_parameter`] renders an expression as a display
//!   template, inlining literals and writing `${<text>}` for anything that
//!   cannot be resolved.
//!
//! Each top-level call owns its visited-set; nothing is shared between calls.

mod constant;
mod substitute;

use crate::context::EvalContext;
use crate::translation::{NoTranslations, TranslationLookup};
use crate::tree::{ExprId, ExprTree};

static NO_TRANSLATIONS: NoTranslations = NoTranslations;

/// Read-only evaluator over one expression tree.
///
/// # Example
///
/// ```
/// use exprfold::{EvalContext, Evaluator, ExprTree};
///
/// let mut tree = ExprTree::new();
/// let a = tree.literal("a", "\"a\"");
/// let b = tree.literal("b", "\"b\"");
/// let root = tree.concatenation(vec![a, b], "\"a\" + \"b\"");
///
/// let ctx = EvalContext::default();
/// let evaluator = Evaluator::new(&tree, &ctx);
/// assert_eq!(evaluator.evaluate_constant(root, None, None).as_deref(), Some("ab"));
/// ```
pub struct Evaluator<'a> {
    tree: &'a ExprTree,
    ctx: &'a EvalContext,
    translations: &'a dyn TranslationLookup,
}

impl<'a> Evaluator<'a> {
    /// Create an evaluator with no translation lookup.
    pub fn new(tree: &'a ExprTree, ctx: &'a EvalContext) -> Self {
        Self {
            tree,
            ctx,
            translations: &NO_TRANSLATIONS,
        }
    }

    /// Use `translations` for calls when translations are allowed.
    pub fn with_translations(mut self, translations: &'a dyn TranslationLookup) -> Self {
        self.translations = translations;
        self
    }

    /// The tree being evaluated.
    pub fn tree(&self) -> &'a ExprTree {
        self.tree
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Convenience Functions
// ═══════════════════════════════════════════════════════════════════════

/// Fold `root` to a constant string with the default context.
pub fn evaluate_constant(
    tree: &ExprTree,
    root: ExprId,
    default: Option<&str>,
    parameter_replacement: Option<&str>,
) -> Option<String> {
    let ctx = EvalContext::default();
    Evaluator::new(tree, &ctx).evaluate_constant(root, default, parameter_replacement)
}

/// Render `root` as a display template with the default context.
pub fn substitute_parameter(
    tree: &ExprTree,
    root: ExprId,
    allow_references: bool,
    allow_translations: bool,
    translations: &dyn TranslationLookup,
) -> Option<String> {
    let ctx = EvalContext::default();
    Evaluator::new(tree, &ctx)
        .with_translations(translations)
        .substitute_parameter(root, allow_references, allow_translations)
}
