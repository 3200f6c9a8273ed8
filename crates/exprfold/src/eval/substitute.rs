//! Placeholder substitution

use indexmap::IndexSet;
use tracing::{trace, warn};

use super::constant::ConstantFolder;
use super::Evaluator;
use crate::tree::{ExprId, ExprKind};

impl Evaluator<'_> {
    /// Render `root` as a display template.
    ///
    /// Literals are inlined. A reference to an initialized variable is
    /// followed into its initializer, remembering `${<reference>}` as the
    /// fallback should the initializer not resolve. When `allow_references`
    /// is set, anything unresolvable renders as `${<text>}`; otherwise it
    /// yields the inherited fallback.
    ///
    /// Operands of a concatenation are folded with
    /// [`evaluate_constant`](Evaluator::evaluate_constant), not substituted,
    /// so a concatenation involving a parameter never produces placeholders.
    ///
    /// A `root` that does not belong to the evaluator's tree yields `None`.
    pub fn substitute_parameter(
        &self,
        root: ExprId,
        allow_references: bool,
        allow_translations: bool,
    ) -> Option<String> {
        let tree = self.tree;
        if tree.get(root).is_none() {
            warn!(?root, "expression does not belong to this tree");
            return None;
        }

        let mut visited = IndexSet::new();
        let mut expr = root;
        let mut default: Option<String> = None;

        loop {
            if !visited.insert(expr) {
                trace!(?expr, text = tree.text(expr), "cycle in substituted expression");
                return Some(tree.placeholder(expr));
            }

            match tree.kind(expr) {
                ExprKind::Cast {
                    operand: Some(operand),
                } => {
                    expr = *operand;
                    default = None;
                    continue;
                }

                ExprKind::Reference { .. } => {
                    if let Some(initializer) = tree.resolve(expr).and_then(|d| d.initializer()) {
                        default = Some(tree.placeholder(expr));
                        expr = initializer;
                        continue;
                    }
                }

                ExprKind::Literal(value) => return Some(value.to_string()),

                ExprKind::Concatenation { operands } => {
                    let mut value = String::new();
                    for &operand in operands {
                        let folded = ConstantFolder::new(tree, self.ctx.max_depth, None)
                            .fold(operand, None);
                        match folded {
                            Some(part) => value.push_str(&part),
                            None => return default,
                        }
                    }
                    return Some(value);
                }

                ExprKind::Call { arguments } if allow_translations => {
                    let found = (0..arguments.len())
                        .find_map(|index| self.translations.find(tree, expr, index));
                    if let Some(translation) = found {
                        return Some(translation.render());
                    }
                }

                _ => {}
            }

            return if allow_references {
                Some(tree.placeholder(expr))
            } else {
                default
            };
        }
    }
}
