//! Expression tree arena
//!
//! Nodes and declarations are stored in flat vectors and addressed by
//! [`ExprId`] / [`DeclId`]. Node identity is the id: two nodes with the same
//! kind and text are still different nodes, which is what the evaluator's
//! cycle guard relies on.

use std::fmt;

// ═══════════════════════════════════════════════════════════════════════
// Identifiers
// ═══════════════════════════════════════════════════════════════════════

/// Identity of an expression node inside an [`ExprTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(u32);

impl ExprId {
    /// Position of the node in its arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identity of a declaration inside an [`ExprTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(u32);

impl DeclId {
    /// Position of the declaration in its arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Nodes
// ═══════════════════════════════════════════════════════════════════════

/// A literal value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// String literal
    Str(String),
    /// Integer literal
    Int(i64),
    /// Floating point literal
    Float(f64),
    /// Boolean literal
    Bool(bool),
    /// Character literal
    Char(char),
    /// The null literal
    Null,
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Str(s) => f.write_str(s),
            Literal::Int(n) => write!(f, "{}", n),
            Literal::Float(n) => write_float(f, *n),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Char(c) => write!(f, "{}", c),
            Literal::Null => f.write_str("null"),
        }
    }
}

/// Decimal form inside `[1e-3, 1e7)`, `<mantissa>E<exp>` outside it; the
/// mantissa always carries a fractional digit.
fn write_float(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n.is_nan() {
        return f.write_str("NaN");
    }
    if n.is_infinite() {
        return f.write_str(if n > 0.0 { "Infinity" } else { "-Infinity" });
    }

    let magnitude = n.abs();
    if magnitude == 0.0 || (1e-3..1e7).contains(&magnitude) {
        // Debug keeps the fractional part and only switches to exponent
        // form far outside this range
        return write!(f, "{:?}", n);
    }

    let scientific = format!("{:e}", n);
    let (mantissa, exponent) = scientific
        .split_once('e')
        .unwrap_or((scientific.as_str(), "0"));
    if mantissa.contains('.') {
        write!(f, "{}E{}", mantissa, exponent)
    } else {
        write!(f, "{}.0E{}", mantissa, exponent)
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Literal::Str(s.to_string())
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Literal::Str(s)
    }
}

impl From<i64> for Literal {
    fn from(n: i64) -> Self {
        Literal::Int(n)
    }
}

impl From<f64> for Literal {
    fn from(n: f64) -> Self {
        Literal::Float(n)
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Literal::Bool(b)
    }
}

impl From<char> for Literal {
    fn from(c: char) -> Self {
        Literal::Char(c)
    }
}

/// The closed set of expression kinds the evaluator understands.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// A literal value
    Literal(Literal),

    /// A type cast; the operand may be missing in incomplete code
    Cast {
        /// The expression being cast
        operand: Option<ExprId>,
    },

    /// A name reference, resolved by the frontend
    Reference {
        /// The declaration this reference resolves to, if any
        resolves_to: Option<DeclId>,
    },

    /// An n-ary `+` chain
    Concatenation {
        /// Operands in source order
        operands: Vec<ExprId>,
    },

    /// A function or method call
    Call {
        /// Explicit arguments in source order
        arguments: Vec<ExprId>,
    },

    /// Anything else
    Opaque,
}

impl ExprKind {
    /// Human-readable name of the kind, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            ExprKind::Literal(_) => "literal",
            ExprKind::Cast { .. } => "cast",
            ExprKind::Reference { .. } => "reference",
            ExprKind::Concatenation { .. } => "concatenation",
            ExprKind::Call { .. } => "call",
            ExprKind::Opaque => "opaque",
        }
    }
}

/// An expression node: its kind plus the source text it was lowered from.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprNode {
    /// What the node is
    pub kind: ExprKind,

    /// Source text, rendered inside placeholders
    pub text: String,
}

// ═══════════════════════════════════════════════════════════════════════
// Declarations
// ═══════════════════════════════════════════════════════════════════════

/// What a reference can resolve to.
#[derive(Debug, Clone, PartialEq)]
pub enum DeclKind {
    /// A function parameter; it has no compile-time value
    Parameter,

    /// A variable, constant or static
    Variable {
        /// Initializer expression, if the declaration has one
        initializer: Option<ExprId>,
    },
}

/// A named declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    /// Declared name
    pub name: String,

    /// Parameter or variable
    pub kind: DeclKind,
}

impl Declaration {
    /// The initializer of a variable, `None` for parameters.
    pub fn initializer(&self) -> Option<ExprId> {
        match self.kind {
            DeclKind::Variable { initializer } => initializer,
            DeclKind::Parameter => None,
        }
    }

    /// Whether this declaration is a parameter.
    pub fn is_parameter(&self) -> bool {
        matches!(self.kind, DeclKind::Parameter)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Arena
// ═══════════════════════════════════════════════════════════════════════

/// Arena owning every expression node and declaration of a program.
///
/// Building is append-only; the only in-place update is
/// [`ExprTree::set_initializer`], which lets a variable's initializer refer
/// back to the variable itself.
///
/// # Example
///
/// ```
/// use exprfold::{ExprTree, Literal};
///
/// let mut tree = ExprTree::new();
/// let hello = tree.literal("hello", "\"hello\"");
/// let v = tree.declare_variable("GREETING", Some(hello));
/// let r = tree.reference(Some(v), "GREETING");
/// let world = tree.literal(" world", "\" world\"");
/// let root = tree.concatenation(vec![r, world], "GREETING + \" world\"");
///
/// assert_eq!(tree.len(), 4);
/// assert_eq!(tree.text(root), "GREETING + \" world\"");
/// assert_eq!(tree.decl(v).name, "GREETING");
/// assert_eq!(tree.kind(hello), &exprfold::ExprKind::Literal(Literal::from("hello")));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExprTree {
    nodes: Vec<ExprNode>,
    decls: Vec<Declaration>,
}

impl ExprTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of expression nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no expression nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of declarations.
    pub fn decl_count(&self) -> usize {
        self.decls.len()
    }

    /// Append a node and return its id.
    pub fn alloc(&mut self, kind: ExprKind, text: impl Into<String>) -> ExprId {
        let id = ExprId(self.nodes.len() as u32);
        self.nodes.push(ExprNode {
            kind,
            text: text.into(),
        });
        id
    }

    /// Append a literal node.
    pub fn literal(&mut self, value: impl Into<Literal>, text: impl Into<String>) -> ExprId {
        self.alloc(ExprKind::Literal(value.into()), text)
    }

    /// Append a cast node.
    pub fn cast(&mut self, operand: Option<ExprId>, text: impl Into<String>) -> ExprId {
        self.alloc(ExprKind::Cast { operand }, text)
    }

    /// Append a reference node.
    pub fn reference(&mut self, resolves_to: Option<DeclId>, text: impl Into<String>) -> ExprId {
        self.alloc(ExprKind::Reference { resolves_to }, text)
    }

    /// Append a concatenation node.
    pub fn concatenation(&mut self, operands: Vec<ExprId>, text: impl Into<String>) -> ExprId {
        self.alloc(ExprKind::Concatenation { operands }, text)
    }

    /// Append a call node.
    pub fn call(&mut self, arguments: Vec<ExprId>, text: impl Into<String>) -> ExprId {
        self.alloc(ExprKind::Call { arguments }, text)
    }

    /// Append an opaque node.
    pub fn opaque(&mut self, text: impl Into<String>) -> ExprId {
        self.alloc(ExprKind::Opaque, text)
    }

    /// Declare a parameter.
    pub fn declare_parameter(&mut self, name: impl Into<String>) -> DeclId {
        self.declare(name.into(), DeclKind::Parameter)
    }

    /// Declare a variable with an optional initializer.
    pub fn declare_variable(
        &mut self,
        name: impl Into<String>,
        initializer: Option<ExprId>,
    ) -> DeclId {
        self.declare(name.into(), DeclKind::Variable { initializer })
    }

    fn declare(&mut self, name: String, kind: DeclKind) -> DeclId {
        let id = DeclId(self.decls.len() as u32);
        self.decls.push(Declaration { name, kind });
        id
    }

    /// Attach an initializer to a variable declared earlier.
    ///
    /// Returns `false` (and changes nothing) when `decl` is a parameter.
    pub fn set_initializer(&mut self, decl: DeclId, initializer: ExprId) -> bool {
        match &mut self.decls[decl.index()].kind {
            DeclKind::Variable { initializer: slot } => {
                *slot = Some(initializer);
                true
            }
            DeclKind::Parameter => false,
        }
    }

    /// Look up a node.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not allocated by this tree.
    pub fn node(&self, id: ExprId) -> &ExprNode {
        &self.nodes[id.index()]
    }

    /// Look up a node, returning `None` for foreign ids.
    pub fn get(&self, id: ExprId) -> Option<&ExprNode> {
        self.nodes.get(id.index())
    }

    /// Kind of a node.
    pub fn kind(&self, id: ExprId) -> &ExprKind {
        &self.node(id).kind
    }

    /// Source text of a node.
    pub fn text(&self, id: ExprId) -> &str {
        &self.node(id).text
    }

    /// Look up a declaration.
    pub fn decl(&self, id: DeclId) -> &Declaration {
        &self.decls[id.index()]
    }

    /// The declaration a reference node resolves to.
    pub fn resolve(&self, id: ExprId) -> Option<&Declaration> {
        match self.kind(id) {
            ExprKind::Reference {
                resolves_to: Some(decl),
            } => Some(self.decl(*decl)),
            _ => None,
        }
    }

    /// Arguments of a call node, empty for anything else.
    pub fn call_arguments(&self, id: ExprId) -> &[ExprId] {
        match self.kind(id) {
            ExprKind::Call { arguments } => arguments,
            _ => &[],
        }
    }

    /// Placeholder rendering of a node: `${<text>}`.
    pub fn placeholder(&self, id: ExprId) -> String {
        format!("${{{}}}", self.text(id))
    }
}
