//! Boolean expression simplification.
//!
//! Rewrites an expression into an equivalent, strictly simpler one:
//! constant operands folded out of `&&`/`||`/`^`, double negation and
//! negated comparisons flattened, common factors pulled out of
//! and/or-of-and/or shapes, degenerate ternaries collapsed, and duplicate
//! or contradictory operands removed from commutative boolean lists.
//!
//! Every rule is gated on the side-effect classifier: a rewrite that would
//! drop or reorder an effectful subexpression does not fire. The arena is
//! only appended to, so the input tree survives unchanged next to the
//! simplified one.

use prune_ast::node::{Literal, Node, NodeId, OperandList};
use prune_ast::ops::{BinaryOp, UnaryOp};
use prune_ast::Arena;
use smallvec::smallvec;
use tracing::debug;

use crate::bool_eval::{evaluate_if_constant, BooleanValue};
use crate::equivalence::EquivalenceChecker;
use crate::side_effects::SideEffectChecker;

/// Fixed-point iteration limit. A single bottom-up pass handles almost
/// everything; the bound only matters for rules that cascade.
const MAX_SIMPLIFY_PASSES: usize = 8;

/// Recursion ceiling; operands past it are returned unchanged rather than
/// risking a stack overflow on pathological nesting.
const MAX_SIMPLIFY_DEPTH: u32 = 256;

/// Rewrites boolean expressions to simpler equivalents by appending
/// replacement nodes.
pub struct Simplifier<'a> {
    arena: &'a mut Arena,
}

impl<'a> Simplifier<'a> {
    pub fn new(arena: &'a mut Arena) -> Simplifier<'a> {
        Simplifier { arena }
    }

    /// Simplifies to a fixed point: `simplify(simplify(e))` returns the
    /// same node as `simplify(e)`. Returns the input id when nothing
    /// applies.
    pub fn simplify(&mut self, id: NodeId) -> NodeId {
        let mut current = id;
        for _ in 0..MAX_SIMPLIFY_PASSES {
            let next = self.simplify_once(current, 0);
            if next == current {
                break;
            }
            current = next;
        }
        current
    }

    fn simplify_once(&mut self, id: NodeId, depth: u32) -> NodeId {
        if depth > MAX_SIMPLIFY_DEPTH {
            return id;
        }
        let Some(node) = self.arena.get(id) else {
            return id;
        };
        // A pure subtree whose value is decided by literals becomes that
        // literal outright. Effectful subtrees go through the structural
        // rules, which know how to keep the effectful prefix.
        if !matches!(node, Node::Literal(_)) {
            let value = evaluate_if_constant(self.arena, id);
            if value.is_known() && self.is_pure(id) {
                debug!("folding constant boolean expression");
                return self.arena.add_bool(value == BooleanValue::True);
            }
        }
        match node.clone() {
            Node::Paren(inner) => self.simplify_once(inner, depth + 1),
            Node::Unary {
                op: UnaryOp::Not,
                operand,
            } => {
                let simplified = self.simplify_once(operand, depth + 1);
                self.simplify_negation(id, operand, simplified)
            }
            Node::Binary { op, operands } if op.is_short_circuit() => {
                let simplified: OperandList = operands
                    .iter()
                    .map(|&o| self.simplify_once(o, depth + 1))
                    .collect();
                self.simplify_junction(id, op, &operands, simplified)
            }
            Node::Binary {
                op: BinaryOp::Xor,
                operands,
            } => {
                let simplified: OperandList = operands
                    .iter()
                    .map(|&o| self.simplify_once(o, depth + 1))
                    .collect();
                self.simplify_xor(id, &operands, simplified)
            }
            Node::Binary { op, operands }
                if matches!(op, BinaryOp::Eq | BinaryOp::Ne) && operands.len() == 2 =>
            {
                let simplified: OperandList = operands
                    .iter()
                    .map(|&o| self.simplify_once(o, depth + 1))
                    .collect();
                self.simplify_boolean_comparison(id, op, &operands, simplified)
            }
            Node::Conditional {
                condition,
                then_expr,
                else_expr,
            } => {
                let c = self.simplify_once(condition, depth + 1);
                let t = self.simplify_once(then_expr, depth + 1);
                let e = self.simplify_once(else_expr, depth + 1);
                self.simplify_conditional(id, (condition, then_expr, else_expr), (c, t, e))
            }
            _ => id,
        }
    }

    // =========================================================================
    // Negation
    // =========================================================================

    fn simplify_negation(&mut self, original: NodeId, old_operand: NodeId, operand: NodeId) -> NodeId {
        let target = self.arena.skip_parens(operand);
        match self.arena.get(target).cloned() {
            Some(Node::Literal(Literal::Bool(b))) => self.arena.add_bool(!b),
            // !!x
            Some(Node::Unary {
                op: UnaryOp::Not,
                operand: inner,
            }) => {
                debug!("removing double negation");
                self.arena.skip_parens(inner)
            }
            Some(Node::Binary { op, operands }) if operands.len() == 2 => {
                let blocked = op.is_relational() && self.involves_float_literal(&operands);
                match op.negated() {
                    Some(negated) if !blocked => {
                        debug!(operator = op.token(), "rewriting negated comparison");
                        self.arena.add(Node::Binary {
                            op: negated,
                            operands,
                        })
                    }
                    _ => self.rebuild_negation(original, old_operand, operand),
                }
            }
            _ => self.rebuild_negation(original, old_operand, operand),
        }
    }

    fn rebuild_negation(&mut self, original: NodeId, old_operand: NodeId, operand: NodeId) -> NodeId {
        if operand == old_operand {
            original
        } else {
            self.arena.add_not(operand)
        }
    }

    /// NaN makes `!(a < b)` differ from `a >= b`; a floating-point literal
    /// operand is the syntactic signal this analysis can see.
    fn involves_float_literal(&self, operands: &[NodeId]) -> bool {
        operands.iter().any(|&o| {
            let o = self.arena.skip_parens(o);
            match self.arena.get(o) {
                Some(Node::Literal(Literal::Float(_))) => true,
                Some(Node::Unary {
                    op: UnaryOp::Neg,
                    operand,
                }) => matches!(
                    self.arena.get(self.arena.skip_parens(*operand)),
                    Some(Node::Literal(Literal::Float(_)))
                ),
                _ => false,
            }
        })
    }

    // =========================================================================
    // && and ||
    // =========================================================================

    fn simplify_junction(
        &mut self,
        original: NodeId,
        op: BinaryOp,
        old_operands: &[NodeId],
        operands: OperandList,
    ) -> NodeId {
        // For `&&` the deciding constant is false and the neutral one is
        // true; for `||` the other way around.
        let deciding = op == BinaryOp::Or;

        let mut kept: OperandList = smallvec![];
        let mut decided = false;
        for &operand in &operands {
            match self.arena.as_bool_literal(operand) {
                Some(v) if v == deciding => {
                    // Operands past a deciding constant never evaluate.
                    // The ones before it only disappear if they are pure.
                    if kept.iter().all(|&k| self.is_pure(k)) {
                        debug!(operator = op.token(), "collapsed to deciding constant");
                        return self.arena.add_bool(deciding);
                    }
                    kept.push(operand);
                    decided = true;
                    break;
                }
                Some(_) => {
                    debug!(operator = op.token(), "dropping neutral constant operand");
                }
                None => kept.push(operand),
            }
        }

        if !decided {
            if let Some(folded) = self.fold_duplicate_operands(op, &mut kept) {
                return folded;
            }
        }
        match kept.len() {
            0 => return self.arena.add_bool(!deciding),
            1 => return kept[0],
            _ => {}
        }
        if !decided {
            if let Some(factored) = self.try_factor(op, &kept) {
                return factored;
            }
        }
        if kept.as_slice() == old_operands {
            original
        } else {
            self.arena.add(Node::Binary { op, operands: kept })
        }
    }

    /// Duplicate and contradictory operand elimination, on fully pure
    /// operand lists only (dropping a duplicate removes an evaluation).
    /// Returns a replacement node when a tautology/contradiction collapses
    /// the whole list; otherwise edits `kept` in place.
    fn fold_duplicate_operands(
        &mut self,
        op: BinaryOp,
        kept: &mut OperandList,
    ) -> Option<NodeId> {
        if kept.len() < 2 || kept.iter().any(|&k| !self.is_pure(k)) {
            return None;
        }
        for i in 0..kept.len() {
            for j in (i + 1)..kept.len() {
                if self.opposite(kept[i], kept[j]) {
                    debug!(operator = op.token(), "operand list contains an operand and its negation");
                    // X && !X is false, X || !X is true.
                    return Some(self.arena.add_bool(op == BinaryOp::Or));
                }
            }
        }
        let mut i = 0;
        while i < kept.len() {
            let mut j = i + 1;
            while j < kept.len() {
                if self.equivalent(kept[i], kept[j]) {
                    debug!(operator = op.token(), "dropping duplicate operand");
                    kept.remove(j);
                } else {
                    j += 1;
                }
            }
            i += 1;
        }
        None
    }

    fn opposite(&self, a: NodeId, b: NodeId) -> bool {
        let stripped_b = self.arena.skip_parens(b);
        if let Some(Node::Unary {
            op: UnaryOp::Not,
            operand,
        }) = self.arena.get(stripped_b)
        {
            if self.equivalent(a, *operand) {
                return true;
            }
        }
        let stripped_a = self.arena.skip_parens(a);
        if let Some(Node::Unary {
            op: UnaryOp::Not,
            operand,
        }) = self.arena.get(stripped_a)
        {
            if self.equivalent(*operand, b) {
                return true;
            }
        }
        false
    }

    /// `(A && B) || (A && C)` becomes `A && (B || C)`, and the three other
    /// placements of the common factor likewise. Reordering evaluation is
    /// only legal when the moved parts are pure; the factor-first/
    /// factor-first shape keeps evaluation order and may carry effectful
    /// remainders.
    fn try_factor(&mut self, op: BinaryOp, operands: &[NodeId]) -> Option<NodeId> {
        if operands.len() != 2 {
            return None;
        }
        let inner_op = match op {
            BinaryOp::Or => BinaryOp::And,
            BinaryOp::And => BinaryOp::Or,
            _ => return None,
        };
        let (la, lb) = self.two_operands_of(operands[0], inner_op)?;
        let (ra, rb) = self.two_operands_of(operands[1], inner_op)?;

        // (factor_left, factor_right, remainder_left, remainder_right,
        //  order_preserved)
        let candidates = [
            (la, ra, lb, rb, true),
            (la, rb, lb, ra, false),
            (lb, ra, la, rb, false),
            (lb, rb, la, ra, false),
        ];
        for (fl, fr, rl, rr, order_preserved) in candidates {
            if !self.equivalent(fl, fr) || !self.is_pure(fl) || !self.is_pure(fr) {
                continue;
            }
            if !order_preserved && (!self.is_pure(rl) || !self.is_pure(rr)) {
                continue;
            }
            debug!(operator = op.token(), "extracting common factor");
            let remainder = self.arena.add(Node::Binary {
                op,
                operands: smallvec![rl, rr],
            });
            return Some(self.arena.add(Node::Binary {
                op: inner_op,
                operands: smallvec![fl, remainder],
            }));
        }
        None
    }

    fn two_operands_of(&self, id: NodeId, op: BinaryOp) -> Option<(NodeId, NodeId)> {
        let id = self.arena.skip_parens(id);
        match self.arena.get(id) {
            Some(Node::Binary {
                op: actual,
                operands,
            }) if *actual == op && operands.len() == 2 => Some((operands[0], operands[1])),
            _ => None,
        }
    }

    // =========================================================================
    // ^
    // =========================================================================

    /// Literal operands of `^` fold into a parity bit: `false` vanishes,
    /// each `true` flips the result.
    fn simplify_xor(
        &mut self,
        original: NodeId,
        old_operands: &[NodeId],
        operands: OperandList,
    ) -> NodeId {
        let mut kept: OperandList = smallvec![];
        let mut parity = false;
        for &operand in &operands {
            match self.arena.as_bool_literal(operand) {
                Some(true) => parity = !parity,
                Some(false) => {}
                None => kept.push(operand),
            }
        }
        let rest = match kept.len() {
            0 => return self.arena.add_bool(parity),
            1 => kept[0],
            _ if kept.as_slice() == old_operands => original,
            _ => self.arena.add(Node::Binary {
                op: BinaryOp::Xor,
                operands: kept,
            }),
        };
        if parity {
            debug!("xor literal parity negates the rest");
            self.arena.add_not(rest)
        } else {
            rest
        }
    }

    // =========================================================================
    // == and != against boolean literals
    // =========================================================================

    /// `x == true` is `x`, `x != true` is `!x`, and the `false` duals.
    /// Only fires when the other operand is syntactically boolean; the
    /// host language may give `==` on other types different semantics
    /// (boxed comparisons).
    fn simplify_boolean_comparison(
        &mut self,
        original: NodeId,
        op: BinaryOp,
        old_operands: &[NodeId],
        operands: OperandList,
    ) -> NodeId {
        for (literal_side, other_side) in [(0, 1), (1, 0)] {
            let Some(value) = self.arena.as_bool_literal(operands[literal_side]) else {
                continue;
            };
            let other = operands[other_side];
            if !self.is_boolean_expr(other) {
                continue;
            }
            debug!(operator = op.token(), "removing comparison with boolean literal");
            let keep_polarity = value == (op == BinaryOp::Eq);
            return if keep_polarity {
                self.arena.skip_parens(other)
            } else {
                let stripped = self.arena.skip_parens(other);
                self.arena.add_not(stripped)
            };
        }
        if operands.as_slice() == old_operands {
            original
        } else {
            self.arena.add(Node::Binary { op, operands })
        }
    }

    // =========================================================================
    // Ternaries
    // =========================================================================

    fn simplify_conditional(
        &mut self,
        original: NodeId,
        old: (NodeId, NodeId, NodeId),
        new: (NodeId, NodeId, NodeId),
    ) -> NodeId {
        let (condition, then_expr, else_expr) = new;

        if let Some(value) = self.arena.as_bool_literal(condition) {
            debug!("conditional on a constant condition");
            return if value { then_expr } else { else_expr };
        }
        // c ? x : x
        if self.is_pure(condition) && self.equivalent(then_expr, else_expr) {
            debug!("conditional branches are equivalent");
            return then_expr;
        }

        let then_literal = self.arena.as_bool_literal(then_expr);
        let else_literal = self.arena.as_bool_literal(else_expr);
        match (then_literal, else_literal) {
            (Some(true), Some(false)) => return self.arena.skip_parens(condition),
            (Some(false), Some(true)) => {
                let stripped = self.arena.skip_parens(condition);
                return self.arena.add_not(stripped);
            }
            // c ? true : x  =>  c || x, and the three related shapes. The
            // branch that still evaluates keeps its position, so effects
            // are preserved as-is.
            (Some(true), None) => {
                debug!("conditional with constant then-branch");
                return self.arena.add(Node::Binary {
                    op: BinaryOp::Or,
                    operands: smallvec![condition, else_expr],
                });
            }
            (Some(false), None) => {
                debug!("conditional with constant then-branch");
                let negated = self.arena.add_not(condition);
                return self.arena.add(Node::Binary {
                    op: BinaryOp::And,
                    operands: smallvec![negated, else_expr],
                });
            }
            (None, Some(true)) => {
                debug!("conditional with constant else-branch");
                let negated = self.arena.add_not(condition);
                return self.arena.add(Node::Binary {
                    op: BinaryOp::Or,
                    operands: smallvec![negated, then_expr],
                });
            }
            (None, Some(false)) => {
                debug!("conditional with constant else-branch");
                return self.arena.add(Node::Binary {
                    op: BinaryOp::And,
                    operands: smallvec![condition, then_expr],
                });
            }
            _ => {}
        }

        // c ? x : !x  =>  c == x ; c ? !x : x  =>  c != x. Requires a
        // boolean, pure x so the duplicated occurrence can be unified.
        if self.is_boolean_expr(then_expr) && self.is_pure(then_expr) {
            if self.opposite(then_expr, else_expr) {
                let op = if self.is_negation(then_expr) {
                    // c ? !x : x
                    BinaryOp::Ne
                } else {
                    BinaryOp::Eq
                };
                let operand = if self.is_negation(then_expr) {
                    else_expr
                } else {
                    then_expr
                };
                debug!("conditional branches are a value and its negation");
                return self.arena.add(Node::Binary {
                    op,
                    operands: smallvec![condition, operand],
                });
            }
        }

        if (condition, then_expr, else_expr) == old {
            original
        } else {
            self.arena.add(Node::Conditional {
                condition,
                then_expr,
                else_expr,
            })
        }
    }

    fn is_negation(&self, id: NodeId) -> bool {
        matches!(
            self.arena.get(self.arena.skip_parens(id)),
            Some(Node::Unary {
                op: UnaryOp::Not,
                ..
            })
        )
    }

    // =========================================================================
    // Gates
    // =========================================================================

    fn is_pure(&self, id: NodeId) -> bool {
        !SideEffectChecker::new(self.arena).may_have_side_effects(id)
    }

    fn equivalent(&self, a: NodeId, b: NodeId) -> bool {
        EquivalenceChecker::new(self.arena).expressions_are_equivalent(a, b)
    }

    fn is_boolean_expr(&self, id: NodeId) -> bool {
        is_boolean_shaped(self.arena, id)
    }
}

/// Syntactically boolean-valued: the shapes the type system would call
/// `boolean` without any inference.
pub fn is_boolean_shaped(arena: &Arena, id: NodeId) -> bool {
    boolean_shaped(arena, id, 0)
}

fn boolean_shaped(arena: &Arena, id: NodeId, depth: u32) -> bool {
    if depth > MAX_SIMPLIFY_DEPTH {
        // Not provably boolean; the rules gated on this stay off.
        return false;
    }
    let id = arena.skip_parens(id);
    let Some(node) = arena.get(id) else {
        return false;
    };
    match node {
        Node::Literal(Literal::Bool(_)) => true,
        Node::Unary {
            op: UnaryOp::Not, ..
        } => true,
        Node::Binary { op, .. } => op.is_boolean_valued(),
        Node::InstanceOf { .. } => true,
        Node::Conditional {
            then_expr,
            else_expr,
            ..
        } => {
            boolean_shaped(arena, *then_expr, depth + 1)
                && boolean_shaped(arena, *else_expr, depth + 1)
        }
        Node::VarRef { decl: Some(d), .. } => match arena.get(*d) {
            Some(Node::LocalDecl { type_name, .. }) => arena.name(*type_name) == "boolean",
            _ => false,
        },
        Node::Cast { type_name, .. } => arena.name(*type_name) == "boolean",
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prune_ast::Printer;
    use prune_parser::parse_expression;

    fn simplified(source: &str) -> String {
        let (mut arena, id) = parse_expression(source).expect("parse");
        let result = Simplifier::new(&mut arena).simplify(id);
        Printer::new(&arena).print_expr(result)
    }

    #[test]
    fn neutral_constants_drop() {
        assert_eq!(simplified("x && true"), "x");
        assert_eq!(simplified("false || x || false"), "x");
        assert_eq!(simplified("x && true && y"), "x && y");
    }

    #[test]
    fn deciding_constants_collapse_when_pure() {
        assert_eq!(simplified("x && false"), "false");
        assert_eq!(simplified("x || true"), "true");
        // The call may not be dropped; the deciding constant stays after it.
        assert_eq!(simplified("f() && false"), "f() && false");
        // Operands after the deciding constant never run.
        assert_eq!(simplified("x && false && f()"), "false");
    }

    #[test]
    fn negations_flatten() {
        assert_eq!(simplified("!!x"), "x");
        assert_eq!(simplified("!!!x"), "!x");
        assert_eq!(simplified("!(a < b)"), "a >= b");
        assert_eq!(simplified("!(a == b)"), "a != b");
        // NaN: relational negation does not fire near float literals.
        assert_eq!(simplified("!(a < 1.0)"), "!(a < 1.0)");
        assert_eq!(simplified("!(a == 1.0)"), "a != 1.0");
    }

    #[test]
    fn ternaries_collapse() {
        assert_eq!(simplified("c ? true : false"), "c");
        assert_eq!(simplified("c ? false : true"), "!c");
        assert_eq!(simplified("c ? x : x"), "x");
        assert_eq!(simplified("true ? x : y"), "x");
        assert_eq!(simplified("c ? true : x"), "c || x");
        assert_eq!(simplified("c ? x : false"), "c && x");
    }

    #[test]
    fn branch_and_negated_branch_become_comparison() {
        assert_eq!(simplified("c ? b != null : !(b != null)"), "c == (b != null)");
    }

    #[test]
    fn boolean_literal_comparisons() {
        assert_eq!(simplified("(a < b) == true"), "a < b");
        assert_eq!(simplified("(a < b) != true"), "a >= b");
        // Not provably boolean: left alone.
        assert_eq!(simplified("x == true"), "x == true");
    }

    #[test]
    fn duplicates_and_contradictions() {
        assert_eq!(simplified("x || x"), "x");
        assert_eq!(simplified("x && !x"), "false");
        assert_eq!(simplified("x || !x"), "true");
        // Effectful operands block the collapse.
        assert_eq!(simplified("f() || f()"), "f() || f()");
    }

    #[test]
    fn common_factors_extract() {
        assert_eq!(simplified("a && b || a && c"), "a && (b || c)");
        assert_eq!(simplified("(a || b) && (a || c)"), "a || b && c");
        // The factor must be pure.
        assert_eq!(simplified("f() && b || f() && c"), "f() && b || f() && c");
    }

    #[test]
    fn simplify_is_idempotent() {
        for source in ["!!x && true", "c ? true : false", "a && b || a && c", "x ^ true"] {
            let (mut arena, id) = parse_expression(source).expect("parse");
            let mut simplifier = Simplifier::new(&mut arena);
            let once = simplifier.simplify(id);
            let twice = simplifier.simplify(once);
            assert_eq!(once, twice, "not idempotent on {source}");
        }
    }

    #[test]
    fn deep_negation_chains_do_not_overflow() {
        let mut arena = Arena::new();
        let mut id = arena.add_var("x", None);
        for _ in 0..100_000 {
            id = arena.add_not(id);
        }
        // Levels past the recursion ceiling come back unchanged; the point
        // is that this returns at all.
        let result = Simplifier::new(&mut arena).simplify(id);
        assert!(arena.get(result).is_some());
    }

    #[test]
    fn xor_parity() {
        assert_eq!(simplified("x ^ false"), "x");
        assert_eq!(simplified("x ^ true"), "!x");
        assert_eq!(simplified("true ^ true"), "false");
    }
}
