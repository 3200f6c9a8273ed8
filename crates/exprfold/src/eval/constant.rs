//! Constant folding

use indexmap::IndexSet;
use tracing::{trace, warn};

use super::Evaluator;
use crate::tree::{DeclKind, ExprId, ExprKind, ExprTree};

impl Evaluator<'_> {
    /// Fold `root` to the string a compile-time constant would hold.
    ///
    /// References to parameters fold to `parameter_replacement`. Anything
    /// that cannot be folded (unresolved references, calls, opaque nodes,
    /// cycles) yields `default`. A variable's initializer is folded with no
    /// default, so an unresolvable nested reference does not leak the outer
    /// default into a concatenation.
    ///
    /// Every node is folded at most once per call: reaching a node a second
    /// time, through a cycle or a shared initializer, yields the default of
    /// that visit. A `root` that does not belong to the evaluator's tree
    /// yields `default`.
    pub fn evaluate_constant(
        &self,
        root: ExprId,
        default: Option<&str>,
        parameter_replacement: Option<&str>,
    ) -> Option<String> {
        if self.tree.get(root).is_none() {
            warn!(?root, "expression does not belong to this tree");
            return default.map(str::to_owned);
        }
        ConstantFolder::new(self.tree, self.ctx.max_depth, parameter_replacement)
            .fold(root, default)
    }
}

/// State of one `evaluate_constant` call.
pub(super) struct ConstantFolder<'a> {
    tree: &'a ExprTree,
    max_depth: usize,
    parameter_replacement: Option<&'a str>,
    /// Every node entered so far; never shrinks
    visited: IndexSet<ExprId>,
    depth: usize,
}

impl<'a> ConstantFolder<'a> {
    pub(super) fn new(
        tree: &'a ExprTree,
        max_depth: usize,
        parameter_replacement: Option<&'a str>,
    ) -> Self {
        Self {
            tree,
            max_depth,
            parameter_replacement,
            visited: IndexSet::new(),
            depth: 0,
        }
    }

    pub(super) fn fold(&mut self, expr: ExprId, default: Option<&str>) -> Option<String> {
        if !self.visited.insert(expr) {
            trace!(?expr, text = self.tree.text(expr), "node already folded in this call");
            return default.map(str::to_owned);
        }

        if self.depth >= self.max_depth {
            warn!(
                max_depth = self.max_depth,
                text = self.tree.text(expr),
                "constant expression nested too deeply"
            );
            return default.map(str::to_owned);
        }

        self.depth += 1;
        let result = self.fold_node(expr, default);
        self.depth -= 1;
        result
    }

    fn fold_node(&mut self, expr: ExprId, default: Option<&str>) -> Option<String> {
        let tree = self.tree;
        match tree.kind(expr) {
            ExprKind::Cast {
                operand: Some(operand),
            } => self.fold(*operand, default),

            ExprKind::Reference {
                resolves_to: Some(decl),
            } => match tree.decl(*decl).kind {
                DeclKind::Parameter => self.parameter_replacement.map(str::to_owned),
                DeclKind::Variable {
                    initializer: Some(initializer),
                } => self.fold(initializer, None),
                DeclKind::Variable { initializer: None } => default.map(str::to_owned),
            },

            ExprKind::Literal(value) => Some(value.to_string()),

            ExprKind::Concatenation { operands } => {
                let mut value = String::new();
                for &operand in operands {
                    match self.fold(operand, default) {
                        Some(part) => value.push_str(&part),
                        None => return default.map(str::to_owned),
                    }
                }
                Some(value)
            }

            other => {
                trace!(kind = other.name(), text = tree.text(expr), "not a constant");
                default.map(str::to_owned)
            }
        }
    }
}
