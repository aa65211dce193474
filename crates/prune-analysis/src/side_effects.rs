//! Side-effect classification.
//!
//! "Side effect" means anything that makes an expression unsafe to delete,
//! duplicate, or reorder: writes, increments, constructions, calls that are
//! not provably pure, and casts that can throw. The classifier is purely
//! syntactic and errs toward "has effects" whenever it cannot prove
//! otherwise; a wrong `true` only suppresses a simplification, a wrong
//! `false` would corrupt one.

use once_cell::sync::Lazy;
use prune_ast::node::{Node, NodeId};
use prune_ast::ops::{is_primitive_type, BinaryOp};
use prune_ast::Arena;
use rustc_hash::FxHashSet;

/// Method names treated as pure when called with pure receiver and
/// arguments. Accessor-shaped names from the platform collection and
/// string types; anything not listed is assumed effectful.
static PURE_CALL_NAMES: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    [
        "length", "size", "isEmpty", "abs", "min", "max", "charAt", "substring", "indexOf",
        "contains", "equals", "hashCode", "toString", "get", "compareTo", "valueOf",
    ]
    .into_iter()
    .collect()
});

/// Recursion ceiling; past it everything is treated as effectful rather
/// than risking a stack overflow on pathological nesting.
pub const MAX_SIDE_EFFECT_DEPTH: u32 = 256;

/// Classifies expressions by their ability to mutate state or throw.
pub struct SideEffectChecker<'a> {
    arena: &'a Arena,
}

impl<'a> SideEffectChecker<'a> {
    pub fn new(arena: &'a Arena) -> SideEffectChecker<'a> {
        SideEffectChecker { arena }
    }

    /// May evaluating this expression have any observable effect?
    pub fn may_have_side_effects(&self, id: NodeId) -> bool {
        self.effectful(id, false, 0)
    }

    /// Like [`Self::may_have_side_effects`], but writes whose target
    /// resolves to a local declaration do not count. Used when the
    /// question is "can this affect anything outside the statement being
    /// rewritten".
    pub fn may_have_non_local_side_effects(&self, id: NodeId) -> bool {
        self.effectful(id, true, 0)
    }

    fn effectful(&self, id: NodeId, non_local_only: bool, depth: u32) -> bool {
        if depth > MAX_SIDE_EFFECT_DEPTH {
            return true;
        }
        let Some(node) = self.arena.get(id) else {
            return true;
        };
        match node {
            Node::Literal(_) | Node::VarRef { .. } => false,
            Node::Paren(inner) => self.effectful(*inner, non_local_only, depth + 1),
            Node::Unary { operand, .. } | Node::InstanceOf { operand, .. } => {
                self.effectful(*operand, non_local_only, depth + 1)
            }
            Node::Binary { operands, .. } => operands
                .iter()
                .any(|&o| self.effectful(o, non_local_only, depth + 1)),
            Node::Assign { target, value, .. } => {
                if non_local_only {
                    !self.writes_local(*target) || self.effectful(*value, non_local_only, depth + 1)
                } else {
                    true
                }
            }
            Node::IncDec { operand, .. } => !non_local_only || !self.writes_local(*operand),
            Node::Conditional {
                condition,
                then_expr,
                else_expr,
            } => {
                self.effectful(*condition, non_local_only, depth + 1)
                    || self.effectful(*then_expr, non_local_only, depth + 1)
                    || self.effectful(*else_expr, non_local_only, depth + 1)
            }
            Node::Call {
                receiver,
                callee,
                args,
            } => {
                if !PURE_CALL_NAMES.contains(self.arena.name(*callee)) {
                    return true;
                }
                receiver.is_some_and(|r| self.effectful(r, non_local_only, depth + 1))
                    || args.iter().any(|&a| self.effectful(a, non_local_only, depth + 1))
            }
            Node::New { .. } => true,
            Node::Cast { type_name, operand } => {
                // Reference downcasts can throw; primitive conversions
                // cannot.
                !is_primitive_type(self.arena.name(*type_name))
                    || self.effectful(*operand, non_local_only, depth + 1)
            }
            // Statements (and anything unmodeled) are conservatively
            // effectful; the classifier's contract is expression-level.
            _ => true,
        }
    }

    /// True when the write target is a reference resolved to a local
    /// declaration. Field accesses and unresolved names are non-local.
    fn writes_local(&self, target: NodeId) -> bool {
        let target = self.arena.skip_parens(target);
        match self.arena.get(target) {
            Some(Node::VarRef { decl: Some(d), .. }) => {
                matches!(self.arena.get(*d), Some(Node::LocalDecl { .. }))
            }
            _ => false,
        }
    }

    /// The minimal side-effecting subtrees of `id`, in evaluation order.
    ///
    /// Replacing `id` with an expression-statement sequence of the returned
    /// nodes preserves every effect of evaluating `id` (discarding its
    /// value). Conditionally evaluated regions are never split: when a
    /// later operand of `&&`/`||` or a branch of a ternary is effectful,
    /// the whole operator node is returned instead of its parts.
    pub fn extract_side_effecting_subexpressions(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.extract_into(id, &mut out, 0);
        out
    }

    fn extract_into(&self, id: NodeId, out: &mut Vec<NodeId>, depth: u32) {
        if !self.may_have_side_effects(id) {
            return;
        }
        if depth > MAX_SIDE_EFFECT_DEPTH {
            // Too deep to decompose; keeping the whole subtree preserves
            // every effect.
            out.push(id);
            return;
        }
        let Some(node) = self.arena.get(id) else {
            out.push(id);
            return;
        };
        match node {
            Node::Paren(inner) => self.extract_into(*inner, out, depth + 1),
            Node::Unary { operand, .. } | Node::InstanceOf { operand, .. } => {
                self.extract_into(*operand, out, depth + 1)
            }
            Node::Binary { op, operands } => {
                if matches!(op, BinaryOp::And | BinaryOp::Or)
                    && operands[1..].iter().any(|&o| self.may_have_side_effects(o))
                {
                    // Later operands run conditionally; keep the
                    // short-circuit structure intact.
                    out.push(id);
                } else if op.is_short_circuit() {
                    self.extract_into(operands[0], out, depth + 1);
                } else {
                    for &operand in operands {
                        self.extract_into(operand, out, depth + 1);
                    }
                }
            }
            Node::Conditional {
                condition,
                then_expr,
                else_expr,
            } => {
                if self.may_have_side_effects(*then_expr)
                    || self.may_have_side_effects(*else_expr)
                {
                    out.push(id);
                } else {
                    self.extract_into(*condition, out, depth + 1);
                }
            }
            Node::Call {
                receiver,
                callee,
                args,
            } => {
                if PURE_CALL_NAMES.contains(self.arena.name(*callee)) {
                    if let Some(r) = receiver {
                        self.extract_into(*r, out, depth + 1);
                    }
                    for &arg in args {
                        self.extract_into(arg, out, depth + 1);
                    }
                } else {
                    out.push(id);
                }
            }
            Node::Cast { type_name, operand } => {
                if is_primitive_type(self.arena.name(*type_name)) {
                    self.extract_into(*operand, out, depth + 1);
                } else {
                    out.push(id);
                }
            }
            // Assignments, increments, and constructions are effects in
            // their own right. Unknown kinds stay whole.
            _ => out.push(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prune_parser::parse_expression;

    fn effectful(source: &str) -> bool {
        let (arena, id) = parse_expression(source).expect("parse");
        SideEffectChecker::new(&arena).may_have_side_effects(id)
    }

    #[test]
    fn reads_and_arithmetic_are_pure() {
        assert!(!effectful("a + b * 3"));
        assert!(!effectful("x < 10 && y"));
    }

    #[test]
    fn writes_and_calls_are_effectful() {
        assert!(effectful("x = 1"));
        assert!(effectful("i++"));
        assert!(effectful("update(x)"));
        assert!(effectful("new Builder()"));
    }

    #[test]
    fn allow_listed_accessors_are_pure() {
        assert!(!effectful("s.length()"));
        assert!(!effectful("list.isEmpty()"));
        // A pure-named call with an effectful argument is still effectful.
        assert!(effectful("list.contains(next())"));
    }

    #[test]
    fn reference_casts_may_throw() {
        assert!(effectful("(String) o"));
        assert!(!effectful("(int) x"));
    }

    #[test]
    fn local_writes_are_local() {
        let (arena, stmts) =
            prune_parser::parse_program("int x = 0; x = 1; x = f(); y = 2;").expect("parse");
        let checker = SideEffectChecker::new(&arena);
        let assign_of = |stmt: NodeId| -> NodeId {
            match arena.get(stmt) {
                Some(Node::ExprStmt { expression }) => *expression,
                other => panic!("expected expression statement, got {other:?}"),
            }
        };
        // x = 1: resolved local target, pure value.
        assert!(!checker.may_have_non_local_side_effects(assign_of(stmts[1])));
        assert!(checker.may_have_side_effects(assign_of(stmts[1])));
        // x = f(): the write is local but the call is not.
        assert!(checker.may_have_non_local_side_effects(assign_of(stmts[2])));
        // y = 2: unresolved target, conservatively non-local.
        assert!(checker.may_have_non_local_side_effects(assign_of(stmts[3])));
    }

    #[test]
    fn extraction_keeps_evaluation_order() {
        let (arena, id) = parse_expression("f(a) + g(b) + 1").expect("parse");
        let checker = SideEffectChecker::new(&arena);
        let parts = checker.extract_side_effecting_subexpressions(id);
        assert_eq!(parts.len(), 2);
        assert!(matches!(arena.get(parts[0]), Some(Node::Call { .. })));
        assert!(matches!(arena.get(parts[1]), Some(Node::Call { .. })));
    }

    #[test]
    fn deep_nesting_is_conservatively_effectful() {
        let mut arena = prune_ast::Arena::new();
        let mut id = arena.add_var("x", None);
        for _ in 0..100_000 {
            id = arena.add_not(id);
        }
        let checker = SideEffectChecker::new(&arena);
        // The chain is pure, but past the recursion ceiling the checker
        // must answer "effectful" instead of overflowing the stack.
        assert!(checker.may_have_side_effects(id));
        assert_eq!(checker.extract_side_effecting_subexpressions(id).len(), 1);
    }

    #[test]
    fn short_circuit_regions_stay_whole() {
        let (arena, id) = parse_expression("ready && advance()").expect("parse");
        let checker = SideEffectChecker::new(&arena);
        let parts = checker.extract_side_effecting_subexpressions(id);
        assert_eq!(parts, vec![id]);
    }
}
