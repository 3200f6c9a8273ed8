//! Rust language frontend
//!
//! Parses Rust source with `syn` and lowers constants, statics, function
//! bodies and attribute arguments into an [`ExprTree`].
//!
//! Lowering runs in two passes. The first declares every constant and
//! static (so forward and cyclic references resolve) and records `use`
//! aliases; the second lowers initializers, function bodies and attributes.

use indexmap::IndexMap;
use quote::ToTokens;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{Expr, Token};
use tracing::debug;

use crate::error::{FrontendError, Result};
use crate::frontend::{AttributeValue, Frontend, FunctionBody, Program};
use crate::tree::{DeclId, ExprId, ExprTree, Literal};

/// Rust language frontend.
///
/// Node text is taken from the source through proc-macro2's
/// `span-locations` feature. proc-macro2 records every parsed source in a
/// thread-local map that is never cleared, so each [`lower`](Frontend::lower)
/// and [`lower_expr`](Frontend::lower_expr) call keeps its input alive for
/// the lifetime of the thread. Long-running hosts should lower on a
/// dedicated thread they can retire, or keep the set of parsed sources
/// bounded.
///
/// # Example
///
/// ```
/// use exprfold::frontends::RustFrontend;
/// use exprfold::{evaluate_constant, Frontend};
///
/// let program = RustFrontend::new()
///     .lower(r#"
///         const MOD_ID: &str = "examplemod";
///         const KEY: &str = MOD_ID + ".greeting";
///     "#)
///     .unwrap();
///
/// let key = program.constant("KEY").unwrap();
/// assert_eq!(
///     evaluate_constant(program.tree(), key, None, None).as_deref(),
///     Some("examplemod.greeting")
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct RustFrontend;

impl RustFrontend {
    /// Create a new Rust frontend.
    pub fn new() -> Self {
        Self
    }
}

impl Frontend for RustFrontend {
    fn lower(&self, source: &str) -> Result<Program> {
        let file = syn::parse_file(source)?;

        let mut program = Program::default();
        let mut collector = Collector {
            tree: &mut program.tree,
            globals: &mut program.globals,
            imports: IndexMap::new(),
            pending: Vec::new(),
        };
        collector.collect_items(&file.items, &Scope::default())?;
        let Collector {
            imports, pending, ..
        } = collector;

        let mut lowerer = Lowerer {
            tree: &mut program.tree,
            globals: &program.globals,
            imports: &imports,
            scope: Scope::default(),
            locals: Vec::new(),
        };
        for work in pending {
            match work {
                Pending::Initializer { decl, expr, scope } => {
                    lowerer.enter(scope);
                    let initializer = lowerer.lower_expr(expr);
                    lowerer.tree.set_initializer(decl, initializer);
                }
                Pending::Function {
                    key,
                    sig,
                    body,
                    scope,
                } => {
                    lowerer.enter(scope);
                    let function = lowerer.lower_function(sig, body);
                    program.functions.insert(key, function);
                }
                Pending::Attributes { item, attrs, scope } => {
                    lowerer.enter(scope);
                    lowerer.lower_attributes(&item, attrs, &mut program.attributes);
                }
            }
        }

        debug!(
            globals = program.globals.len(),
            functions = program.functions.len(),
            attributes = program.attributes.len(),
            nodes = program.tree.len(),
            "lowered Rust source"
        );
        Ok(program)
    }

    fn lower_expr(&self, program: &mut Program, source: &str) -> Result<ExprId> {
        let expr: Expr = syn::parse_str(source)?;
        let imports = IndexMap::new();
        let mut lowerer = Lowerer {
            tree: &mut program.tree,
            globals: &program.globals,
            imports: &imports,
            scope: Scope::default(),
            locals: Vec::new(),
        };
        Ok(lowerer.lower_expr(&expr))
    }

    fn name(&self) -> &str {
        "Rust"
    }

    fn file_extension(&self) -> &str {
        "rs"
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Scopes
// ═══════════════════════════════════════════════════════════════════════

/// Where an item lives: its module path and, inside impls and traits, the
/// qualified name `Self` stands for.
#[derive(Debug, Clone, Default)]
struct Scope {
    module: Vec<String>,
    self_ty: Option<String>,
}

impl Scope {
    fn qualify(&self, name: &str) -> String {
        if self.module.is_empty() {
            name.to_string()
        } else {
            format!("{}::{}", self.module.join("::"), name)
        }
    }

    fn nested(&self, module: &syn::Ident) -> Scope {
        let mut path = self.module.clone();
        path.push(module.to_string());
        Scope {
            module: path,
            self_ty: None,
        }
    }

    fn with_self(&self, self_ty: String) -> Scope {
        Scope {
            module: self.module.clone(),
            self_ty: Some(self_ty),
        }
    }
}

/// Crate-absolute readings of a path written inside `module`.
///
/// Plain paths are tried relative to the module first, then from the crate
/// root.
fn absolute_candidates(module: &[String], segments: &[String]) -> Vec<Vec<String>> {
    let Some((first, rest)) = segments.split_first() else {
        return Vec::new();
    };
    match first.as_str() {
        "crate" => vec![rest.to_vec()],
        "self" => vec![[module, rest].concat()],
        "super" => {
            let parent = &module[..module.len().saturating_sub(1)];
            vec![[parent, rest].concat()]
        }
        _ if module.is_empty() => vec![segments.to_vec()],
        _ => vec![[module, segments].concat(), segments.to_vec()],
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Pass 1: declarations
// ═══════════════════════════════════════════════════════════════════════

enum Pending<'s> {
    Initializer {
        decl: DeclId,
        expr: &'s Expr,
        scope: Scope,
    },
    Function {
        key: String,
        sig: &'s syn::Signature,
        body: &'s syn::Block,
        scope: Scope,
    },
    Attributes {
        item: String,
        attrs: &'s [syn::Attribute],
        scope: Scope,
    },
}

struct Collector<'s, 'p> {
    tree: &'p mut ExprTree,
    globals: &'p mut IndexMap<String, DeclId>,
    imports: IndexMap<String, Vec<Vec<String>>>,
    pending: Vec<Pending<'s>>,
}

impl<'s> Collector<'s, '_> {
    fn collect_items(&mut self, items: &'s [syn::Item], scope: &Scope) -> Result<()> {
        for item in items {
            match item {
                syn::Item::Const(c) => {
                    let key = scope.qualify(&c.ident.to_string());
                    self.define(scope, key.clone(), &c.ident, &c.expr)?;
                    self.attributes(key, &c.attrs, scope);
                }
                syn::Item::Static(s) => {
                    let key = scope.qualify(&s.ident.to_string());
                    self.define(scope, key.clone(), &s.ident, &s.expr)?;
                    self.attributes(key, &s.attrs, scope);
                }
                syn::Item::Fn(f) => {
                    let key = scope.qualify(&f.sig.ident.to_string());
                    self.attributes(key.clone(), &f.attrs, scope);
                    self.pending.push(Pending::Function {
                        key,
                        sig: &f.sig,
                        body: &f.block,
                        scope: scope.clone(),
                    });
                }
                syn::Item::Mod(m) => {
                    self.attributes(scope.qualify(&m.ident.to_string()), &m.attrs, scope);
                    if let Some((_, items)) = &m.content {
                        self.collect_items(items, &scope.nested(&m.ident))?;
                    }
                }
                syn::Item::Impl(i) => self.collect_impl(i, scope),
                syn::Item::Trait(t) => self.collect_trait(t, scope),
                syn::Item::Use(u) => self.collect_use(&u.tree, scope, Vec::new()),
                syn::Item::Struct(s) => {
                    self.attributes(scope.qualify(&s.ident.to_string()), &s.attrs, scope)
                }
                syn::Item::Enum(e) => {
                    self.attributes(scope.qualify(&e.ident.to_string()), &e.attrs, scope)
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn collect_impl(&mut self, item: &'s syn::ItemImpl, scope: &Scope) {
        let self_ty = scope.qualify(&type_name(&item.self_ty));
        let inner = scope.with_self(self_ty.clone());
        for impl_item in &item.items {
            match impl_item {
                syn::ImplItem::Const(c) => {
                    let key = format!("{}::{}", self_ty, c.ident);
                    self.define_associated(&inner, key.clone(), &c.ident, Some(&c.expr));
                    self.attributes(key, &c.attrs, &inner);
                }
                syn::ImplItem::Fn(f) => {
                    let key = format!("{}::{}", self_ty, f.sig.ident);
                    self.attributes(key.clone(), &f.attrs, &inner);
                    self.pending.push(Pending::Function {
                        key,
                        sig: &f.sig,
                        body: &f.block,
                        scope: inner.clone(),
                    });
                }
                _ => {}
            }
        }
    }

    fn collect_trait(&mut self, item: &'s syn::ItemTrait, scope: &Scope) {
        let self_ty = scope.qualify(&item.ident.to_string());
        let inner = scope.with_self(self_ty.clone());
        for trait_item in &item.items {
            match trait_item {
                syn::TraitItem::Const(c) => {
                    let key = format!("{}::{}", self_ty, c.ident);
                    let default = c.default.as_ref().map(|(_, expr)| expr);
                    self.define_associated(&inner, key.clone(), &c.ident, default);
                    self.attributes(key, &c.attrs, &inner);
                }
                syn::TraitItem::Fn(f) => {
                    let key = format!("{}::{}", self_ty, f.sig.ident);
                    self.attributes(key.clone(), &f.attrs, &inner);
                    if let Some(body) = &f.default {
                        self.pending.push(Pending::Function {
                            key,
                            sig: &f.sig,
                            body,
                            scope: inner.clone(),
                        });
                    }
                }
                _ => {}
            }
        }
    }

    fn collect_use(&mut self, tree: &syn::UseTree, scope: &Scope, mut prefix: Vec<String>) {
        match tree {
            syn::UseTree::Path(path) => {
                prefix.push(path.ident.to_string());
                self.collect_use(&path.tree, scope, prefix);
            }
            syn::UseTree::Name(name) if name.ident == "self" => {
                if let Some(alias) = prefix.last().cloned() {
                    self.import(scope, alias, prefix);
                }
            }
            syn::UseTree::Name(name) => {
                let alias = name.ident.to_string();
                prefix.push(alias.clone());
                self.import(scope, alias, prefix);
            }
            syn::UseTree::Rename(rename) => {
                prefix.push(rename.ident.to_string());
                self.import(scope, rename.rename.to_string(), prefix);
            }
            syn::UseTree::Group(group) => {
                for item in &group.items {
                    self.collect_use(item, scope, prefix.clone());
                }
            }
            syn::UseTree::Glob(_) => {}
        }
    }

    fn import(&mut self, scope: &Scope, alias: String, target: Vec<String>) {
        let candidates = absolute_candidates(&scope.module, &target);
        self.imports.insert(scope.qualify(&alias), candidates);
    }

    /// Declare a module-level constant or static.
    fn define(
        &mut self,
        scope: &Scope,
        key: String,
        ident: &syn::Ident,
        expr: &'s Expr,
    ) -> Result<()> {
        if self.globals.contains_key(&key) {
            return Err(FrontendError::DuplicateDefinition { name: key });
        }
        let decl = self.tree.declare_variable(ident.to_string(), None);
        self.globals.insert(key, decl);
        self.pending.push(Pending::Initializer {
            decl,
            expr,
            scope: scope.clone(),
        });
        Ok(())
    }

    /// Declare an associated constant; several trait impls may define the
    /// same name for one type, the first one wins.
    fn define_associated(
        &mut self,
        scope: &Scope,
        key: String,
        ident: &syn::Ident,
        expr: Option<&'s Expr>,
    ) {
        if self.globals.contains_key(&key) {
            debug!(%key, "associated constant defined more than once, keeping the first");
            return;
        }
        let decl = self.tree.declare_variable(ident.to_string(), None);
        self.globals.insert(key, decl);
        if let Some(expr) = expr {
            self.pending.push(Pending::Initializer {
                decl,
                expr,
                scope: scope.clone(),
            });
        }
    }

    fn attributes(&mut self, item: String, attrs: &'s [syn::Attribute], scope: &Scope) {
        if !attrs.is_empty() {
            self.pending.push(Pending::Attributes {
                item,
                attrs,
                scope: scope.clone(),
            });
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Pass 2: expressions
// ═══════════════════════════════════════════════════════════════════════

struct Lowerer<'p> {
    tree: &'p mut ExprTree,
    globals: &'p IndexMap<String, DeclId>,
    imports: &'p IndexMap<String, Vec<Vec<String>>>,
    scope: Scope,
    /// Visible locals, innermost last
    locals: Vec<(String, DeclId)>,
}

impl Lowerer<'_> {
    fn enter(&mut self, scope: Scope) {
        self.scope = scope;
        self.locals.clear();
    }

    fn lower_function(&mut self, sig: &syn::Signature, body: &syn::Block) -> FunctionBody {
        let mut function = FunctionBody::default();
        for input in &sig.inputs {
            let names = match input {
                syn::FnArg::Receiver(_) => vec!["self".to_string()],
                syn::FnArg::Typed(arg) => pattern_bindings(&arg.pat),
            };
            for name in names {
                let decl = self.tree.declare_parameter(name.clone());
                self.locals.push((name, decl));
                function.parameters.push(decl);
            }
        }
        self.lower_block(body, &mut function.roots);
        self.locals.clear();
        function
    }

    fn lower_block(&mut self, block: &syn::Block, roots: &mut Vec<ExprId>) {
        let mark = self.locals.len();
        for stmt in &block.stmts {
            match stmt {
                syn::Stmt::Local(local) => self.lower_local(local),
                syn::Stmt::Item(syn::Item::Const(c)) => {
                    let initializer = self.lower_expr(&c.expr);
                    let name = c.ident.to_string();
                    let decl = self.tree.declare_variable(name.clone(), Some(initializer));
                    self.locals.push((name, decl));
                }
                syn::Stmt::Expr(expr, _) => self.lower_statement(expr, roots),
                syn::Stmt::Item(_) | syn::Stmt::Macro(_) => {}
            }
        }
        self.locals.truncate(mark);
    }

    fn lower_local(&mut self, local: &syn::Local) {
        if let (Some(name), Some(init)) = (single_binding(&local.pat), &local.init) {
            // the initializer cannot see the binding it introduces
            let initializer = self.lower_expr(&init.expr);
            let decl = self.tree.declare_variable(name.clone(), Some(initializer));
            self.locals.push((name, decl));
            return;
        }
        for name in pattern_bindings(&local.pat) {
            let decl = self.tree.declare_variable(name.clone(), None);
            self.locals.push((name, decl));
        }
    }

    /// Control-flow statements contribute the roots of their blocks rather
    /// than a single opaque root.
    fn lower_statement(&mut self, expr: &Expr, roots: &mut Vec<ExprId>) {
        match expr {
            Expr::Block(e) => self.lower_block(&e.block, roots),
            Expr::Unsafe(e) => self.lower_block(&e.block, roots),
            Expr::Loop(e) => self.lower_block(&e.body, roots),
            Expr::While(e) => {
                roots.push(self.lower_expr(&e.cond));
                self.lower_block(&e.body, roots);
            }
            Expr::If(e) => {
                roots.push(self.lower_expr(&e.cond));
                self.lower_block(&e.then_branch, roots);
                if let Some((_, otherwise)) = &e.else_branch {
                    self.lower_statement(otherwise, roots);
                }
            }
            Expr::ForLoop(e) => {
                roots.push(self.lower_expr(&e.expr));
                let mark = self.locals.len();
                for name in pattern_bindings(&e.pat) {
                    let decl = self.tree.declare_variable(name.clone(), None);
                    self.locals.push((name, decl));
                }
                self.lower_block(&e.body, roots);
                self.locals.truncate(mark);
            }
            _ => roots.push(self.lower_expr(expr)),
        }
    }

    fn lower_attributes(
        &mut self,
        item: &str,
        attrs: &[syn::Attribute],
        out: &mut Vec<AttributeValue>,
    ) {
        for attr in attrs {
            let attribute = path_to_string(attr.path());
            match &attr.meta {
                syn::Meta::List(_) => {
                    let parser = Punctuated::<syn::Meta, Token![,]>::parse_terminated;
                    let Ok(args) = attr.parse_args_with(parser) else {
                        continue;
                    };
                    for arg in args {
                        if let syn::Meta::NameValue(nv) = arg {
                            let value = self.lower_expr(&nv.value);
                            out.push(AttributeValue {
                                item: item.to_string(),
                                attribute: attribute.clone(),
                                key: path_to_string(&nv.path),
                                value,
                            });
                        }
                    }
                }
                syn::Meta::NameValue(nv) if attribute != "doc" => {
                    let value = self.lower_expr(&nv.value);
                    out.push(AttributeValue {
                        item: item.to_string(),
                        attribute,
                        key: "value".to_string(),
                        value,
                    });
                }
                _ => {}
            }
        }
    }

    fn lower_expr(&mut self, expr: &Expr) -> ExprId {
        match expr {
            Expr::Paren(e) => self.lower_expr(&e.expr),
            Expr::Group(e) => self.lower_expr(&e.expr),

            Expr::Lit(e) => match lower_lit(&e.lit, false) {
                Some(value) => self.tree.literal(value, token_text(expr)),
                None => self.tree.opaque(token_text(expr)),
            },

            Expr::Unary(syn::ExprUnary {
                op: syn::UnOp::Neg(_),
                expr: operand,
                ..
            }) => match operand.as_ref() {
                Expr::Lit(lit) => match lower_lit(&lit.lit, true) {
                    Some(value) => self.tree.literal(value, token_text(expr)),
                    None => self.tree.opaque(token_text(expr)),
                },
                _ => self.tree.opaque(token_text(expr)),
            },

            Expr::Cast(e) => {
                let operand = self.lower_expr(&e.expr);
                self.tree.cast(Some(operand), token_text(expr))
            }

            Expr::Path(e) if e.qself.is_none() => {
                let decl = self.resolve(&e.path);
                self.tree.reference(decl, path_to_string(&e.path))
            }

            Expr::Binary(syn::ExprBinary {
                op: syn::BinOp::Add(_),
                ..
            }) => {
                let mut operands = Vec::new();
                self.flatten_addition(expr, &mut operands);
                self.tree.concatenation(operands, token_text(expr))
            }

            Expr::Call(e) => {
                let arguments = e.args.iter().map(|arg| self.lower_expr(arg)).collect();
                self.tree.call(arguments, token_text(expr))
            }

            Expr::MethodCall(e) => {
                let arguments = e.args.iter().map(|arg| self.lower_expr(arg)).collect();
                self.tree.call(arguments, token_text(expr))
            }

            _ => self.tree.opaque(token_text(expr)),
        }
    }

    /// `a + b + c` parses as `(a + b) + c`; collect it as one operand list.
    /// Explicitly parenthesized additions stay separate nodes.
    fn flatten_addition(&mut self, expr: &Expr, operands: &mut Vec<ExprId>) {
        match expr {
            Expr::Binary(syn::ExprBinary {
                left,
                op: syn::BinOp::Add(_),
                right,
                ..
            }) => {
                self.flatten_addition(left, operands);
                operands.push(self.lower_expr(right));
            }
            _ => operands.push(self.lower_expr(expr)),
        }
    }

    fn resolve(&self, path: &syn::Path) -> Option<DeclId> {
        let segments: Vec<String> = path.segments.iter().map(|s| s.ident.to_string()).collect();
        let (first, rest) = segments.split_first()?;

        if rest.is_empty() {
            if let Some((_, decl)) = self.locals.iter().rev().find(|(name, _)| name == first) {
                return Some(*decl);
            }
        }

        if first == "Self" {
            let self_ty = self.scope.self_ty.as_ref()?;
            let key = format!("{}::{}", self_ty, rest.join("::"));
            return self.globals.get(&key).copied();
        }

        absolute_candidates(&self.scope.module, &segments)
            .iter()
            .find_map(|candidate| self.lookup(candidate))
    }

    /// Look up a crate-absolute path, following one `use` alias.
    fn lookup(&self, path: &[String]) -> Option<DeclId> {
        if let Some(decl) = self.globals.get(&path.join("::")) {
            return Some(*decl);
        }
        (1..=path.len()).find_map(|split| {
            let targets = self.imports.get(&path[..split].join("::"))?;
            targets.iter().find_map(|target| {
                let full = [target.as_slice(), &path[split..]].concat();
                self.globals.get(&full.join("::")).copied()
            })
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════════

fn lower_lit(lit: &syn::Lit, negate: bool) -> Option<Literal> {
    let value = match lit {
        syn::Lit::Str(s) if !negate => Literal::Str(s.value()),
        syn::Lit::Int(i) => {
            let digits = if negate {
                format!("-{}", i.base10_digits())
            } else {
                i.base10_digits().to_string()
            };
            match digits.parse::<i64>() {
                Ok(n) => Literal::Int(n),
                // out of i64 range: keep the digits
                Err(_) => Literal::Str(digits),
            }
        }
        syn::Lit::Float(f) => {
            let value = f.base10_parse::<f64>().ok()?;
            Literal::Float(if negate { -value } else { value })
        }
        syn::Lit::Bool(b) if !negate => Literal::Bool(b.value),
        syn::Lit::Char(c) if !negate => Literal::Char(c.value()),
        syn::Lit::Byte(b) if !negate => Literal::Int(i64::from(b.value())),
        _ => return None,
    };
    Some(value)
}

/// Name of the single identifier a pattern binds, if it is that simple.
fn single_binding(pat: &syn::Pat) -> Option<String> {
    match pat {
        syn::Pat::Ident(p) if p.subpat.is_none() => Some(p.ident.to_string()),
        syn::Pat::Type(p) => single_binding(&p.pat),
        _ => None,
    }
}

/// Every identifier a pattern binds, in source order.
fn pattern_bindings(pat: &syn::Pat) -> Vec<String> {
    let mut names = Vec::new();
    collect_bindings(pat, &mut names);
    names
}

fn collect_bindings(pat: &syn::Pat, names: &mut Vec<String>) {
    match pat {
        syn::Pat::Ident(p) => {
            names.push(p.ident.to_string());
            if let Some((_, sub)) = &p.subpat {
                collect_bindings(sub, names);
            }
        }
        syn::Pat::Type(p) => collect_bindings(&p.pat, names),
        syn::Pat::Reference(p) => collect_bindings(&p.pat, names),
        syn::Pat::Paren(p) => collect_bindings(&p.pat, names),
        syn::Pat::Tuple(p) => p.elems.iter().for_each(|e| collect_bindings(e, names)),
        syn::Pat::TupleStruct(p) => p.elems.iter().for_each(|e| collect_bindings(e, names)),
        syn::Pat::Slice(p) => p.elems.iter().for_each(|e| collect_bindings(e, names)),
        syn::Pat::Struct(p) => p.fields.iter().for_each(|f| collect_bindings(&f.pat, names)),
        // every alternative binds the same names
        syn::Pat::Or(p) => {
            if let Some(first) = p.cases.first() {
                collect_bindings(first, names);
            }
        }
        _ => {}
    }
}

/// Name of the type an impl block is for.
fn type_name(ty: &syn::Type) -> String {
    match ty {
        syn::Type::Path(p) => p
            .path
            .segments
            .last()
            .map(|s| s.ident.to_string())
            .unwrap_or_default(),
        syn::Type::Reference(r) => type_name(&r.elem),
        syn::Type::Paren(p) => type_name(&p.elem),
        syn::Type::Group(g) => type_name(&g.elem),
        other => other.to_token_stream().to_string(),
    }
}

/// Convert a syn::Path to `a::b::c`.
pub fn path_to_string(path: &syn::Path) -> String {
    path.segments
        .iter()
        .map(|s| s.ident.to_string())
        .collect::<Vec<_>>()
        .join("::")
}

/// Source text of an expression, or its token rendering when the
/// span carries no source (tokens built in memory).
fn token_text(expr: &Expr) -> String {
    expr.span()
        .source_text()
        .unwrap_or_else(|| expr.to_token_stream().to_string())
}
