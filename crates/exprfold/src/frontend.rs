//! Language frontend trait
//!
//! A frontend is the adapter between a host language's syntax tree and the
//! closed [`ExprKind`](crate::ExprKind) set the evaluator understands:
//!
//! ```text
//! Source Code → [Frontend] → ExprTree + scopes → [Evaluator] → Option<String>
//! ```
//!
//! Frontends are responsible for:
//! - Parsing source code
//! - Classifying expressions into the closed node set
//! - Resolving names to declarations
//!
//! The evaluator never sees host types, so host API churn stays here.

use indexmap::IndexMap;

use crate::context::EvalContext;
use crate::error::Result;
use crate::eval::Evaluator;
use crate::tree::{DeclId, ExprId, ExprTree};

// ═══════════════════════════════════════════════════════════════════════
// LOWERED PROGRAM
// ═══════════════════════════════════════════════════════════════════════

/// Roots and scope of one lowered function.
#[derive(Debug, Clone, Default)]
pub struct FunctionBody {
    /// Parameters in declaration order (including `self`)
    pub parameters: Vec<DeclId>,

    /// Expression statements and the tail expression, in source order
    pub roots: Vec<ExprId>,
}

/// A `key = value` argument of an attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeValue {
    /// Qualified name of the annotated item
    pub item: String,

    /// Attribute path, e.g. `inject` or `serde`
    pub attribute: String,

    /// Argument name
    pub key: String,

    /// Lowered argument value
    pub value: ExprId,
}

/// The result of lowering a source file.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub(crate) tree: ExprTree,
    pub(crate) globals: IndexMap<String, DeclId>,
    pub(crate) functions: IndexMap<String, FunctionBody>,
    pub(crate) attributes: Vec<AttributeValue>,
}

impl Program {
    /// The expression arena.
    pub fn tree(&self) -> &ExprTree {
        &self.tree
    }

    /// Global constant or static by qualified name (`NAME`, `module::NAME`,
    /// `Type::NAME`).
    pub fn global(&self, name: &str) -> Option<DeclId> {
        self.globals.get(name).copied()
    }

    /// Initializer of a global constant or static.
    pub fn constant(&self, name: &str) -> Option<ExprId> {
        self.global(name)
            .and_then(|decl| self.tree.decl(decl).initializer())
    }

    /// Qualified names of all globals, in definition order.
    pub fn global_names(&self) -> impl Iterator<Item = &str> {
        self.globals.keys().map(String::as_str)
    }

    /// Function by qualified name (`name`, `module::name`, `Type::name`).
    pub fn function(&self, name: &str) -> Option<&FunctionBody> {
        self.functions.get(name)
    }

    /// Qualified names of all functions, in definition order.
    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    /// Every attribute argument, in source order.
    pub fn attributes(&self) -> &[AttributeValue] {
        &self.attributes
    }

    /// Value of `#[attribute(key = ...)]` on `item`.
    pub fn attribute(&self, item: &str, attribute: &str, key: &str) -> Option<ExprId> {
        self.attributes
            .iter()
            .find(|a| a.item == item && a.attribute == attribute && a.key == key)
            .map(|a| a.value)
    }

    /// An evaluator over this program's tree.
    pub fn evaluator<'a>(&'a self, ctx: &'a EvalContext) -> Evaluator<'a> {
        Evaluator::new(&self.tree, ctx)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// LANGUAGE FRONTEND TRAIT
// ═══════════════════════════════════════════════════════════════════════

/// Language frontend interface.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use exprfold::{Frontend, Program, Result};
///
/// struct NullFrontend;
///
/// impl Frontend for NullFrontend {
///     fn lower(&self, _source: &str) -> Result<Program> {
///         Ok(Program::default())
///     }
///
///     fn name(&self) -> &str {
///         "Null"
///     }
///
///     fn file_extension(&self) -> &str {
///         "null"
///     }
/// }
/// ```
pub trait Frontend: Send + Sync {
    /// Parse `source` and lower it into a [`Program`].
    ///
    /// # Errors
    ///
    /// Returns a [`FrontendError`](crate::FrontendError) if the source does
    /// not parse or defines the same global twice.
    fn lower(&self, source: &str) -> Result<Program>;

    /// Lower a standalone expression against the globals of `program`.
    fn lower_expr(&self, program: &mut Program, source: &str) -> Result<ExprId>;

    /// Language name (e.g. "Rust").
    fn name(&self) -> &str;

    /// File extension without the dot (e.g. "rs").
    fn file_extension(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_program() {
        let program = Program::default();
        assert!(program.tree().is_empty());
        assert!(program.global("X").is_none());
        assert!(program.constant("X").is_none());
        assert!(program.function("main").is_none());
        assert!(program.attributes().is_empty());
        assert_eq!(program.global_names().count(), 0);
    }

    #[test]
    fn test_constant_lookup() {
        let mut program = Program::default();
        let lit = program.tree.literal("v", "\"v\"");
        let decl = program.tree.declare_variable("X", Some(lit));
        program.globals.insert("X".to_string(), decl);

        assert_eq!(program.global("X"), Some(decl));
        assert_eq!(program.constant("X"), Some(lit));
        assert_eq!(program.global_names().collect::<Vec<_>>(), vec!["X"]);
    }

    #[test]
    fn test_attribute_lookup() {
        let mut program = Program::default();
        let value = program.tree.literal("tick", "\"tick\"");
        program.attributes.push(AttributeValue {
            item: "Handler::on_tick".into(),
            attribute: "inject".into(),
            key: "method".into(),
            value,
        });

        assert_eq!(
            program.attribute("Handler::on_tick", "inject", "method"),
            Some(value)
        );
        assert!(program.attribute("Handler::on_tick", "inject", "at").is_none());
    }
}
