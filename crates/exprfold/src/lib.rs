//! # exprfold
//!
//! Cycle-safe constant folding and placeholder substitution over a small,
//! host-agnostic expression tree.
//!
//! A frontend lowers host source into an [`ExprTree`]: a closed set of node
//! kinds (literal, cast, reference, `+` concatenation, call, opaque) plus the
//! declarations references resolve to. The [`Evaluator`] then reduces an
//! expression to an optional string:
//!
//! - [`evaluate_constant`] yields the value a compile-time constant would
//!   hold, or a caller-supplied default.
//! - [`substitute_parameter`] yields a display template where unresolved
//!   pieces render as `${<source text>}`.
//!
//! ## Architecture
//!
//! - **Frontend**: parse host source, lower it to the expression tree
//! - **Tree**: arena of nodes and declarations, identity by id
//! - **Evaluator**: total, read-only reductions with per-call cycle guards
//! - **Translations**: optional collaborator consulted for calls
//!
//! ## Example
//!
//! ```
//! use exprfold::frontends::RustFrontend;
//! use exprfold::{EvalContext, Frontend};
//!
//! let program = RustFrontend::new()
//!     .lower(r#"
//!         const PREFIX: &str = "mod.";
//!         fn announce(player: &str) {
//!             broadcast(PREFIX + "joined: " + player);
//!             broadcast(player);
//!         }
//!     "#)
//!     .unwrap();
//!
//! let ctx = EvalContext::default();
//! let evaluator = program.evaluator(&ctx);
//! let body = program.function("announce").unwrap();
//! let first = program.tree().call_arguments(body.roots[0])[0];
//! let second = program.tree().call_arguments(body.roots[1])[0];
//!
//! assert_eq!(
//!     evaluator.evaluate_constant(first, None, Some("<player>")).as_deref(),
//!     Some("mod.joined: <player>")
//! );
//! assert_eq!(
//!     evaluator.substitute_parameter(second, true, false).as_deref(),
//!     Some("${player}")
//! );
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod error;
pub mod eval;
pub mod frontend;
pub mod frontends;
pub mod translation;
pub mod tree;

// Re-export main types
pub use context::EvalContext;
pub use error::{FrontendError, Result};
pub use eval::{evaluate_constant, substitute_parameter, Evaluator};
pub use frontend::{AttributeValue, Frontend, FunctionBody, Program};
pub use translation::{
    FormattingError, NoTranslations, Translation, TranslationLookup, TranslationTable,
};
pub use tree::{DeclId, DeclKind, Declaration, ExprId, ExprKind, ExprNode, ExprTree, Literal};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }
}
