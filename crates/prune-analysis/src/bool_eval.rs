//! Three-valued constant evaluation of boolean expressions.
//!
//! `Unknown` is the default answer; only expressions built from literals
//! fold. Evaluation is value-level, so `u && false` folds to `False` even
//! though `u` is unknown (the fold is about the value, not about whether
//! `u` may be deleted; droppability is the side-effect classifier's job).

use prune_ast::node::{Literal, Node, NodeId};
use prune_ast::ops::{BinaryOp, UnaryOp};
use prune_ast::Arena;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanValue {
    True,
    False,
    Unknown,
}

impl BooleanValue {
    pub fn from_bool(b: bool) -> BooleanValue {
        if b { BooleanValue::True } else { BooleanValue::False }
    }

    pub const fn negated(self) -> BooleanValue {
        match self {
            BooleanValue::True => BooleanValue::False,
            BooleanValue::False => BooleanValue::True,
            BooleanValue::Unknown => BooleanValue::Unknown,
        }
    }

    pub const fn is_known(self) -> bool {
        !matches!(self, BooleanValue::Unknown)
    }
}

/// Recursion ceiling; anything deeper evaluates to `Unknown` rather than
/// risking a stack overflow on pathological nesting.
const MAX_EVAL_DEPTH: u32 = 256;

/// Folds `id` to a boolean constant when its value is decided by literals.
pub fn evaluate_if_constant(arena: &Arena, id: NodeId) -> BooleanValue {
    evaluate(arena, id, 0)
}

fn evaluate(arena: &Arena, id: NodeId, depth: u32) -> BooleanValue {
    if depth > MAX_EVAL_DEPTH {
        return BooleanValue::Unknown;
    }
    let id = arena.skip_parens(id);
    let Some(node) = arena.get(id) else {
        return BooleanValue::Unknown;
    };
    match node {
        Node::Literal(Literal::Bool(b)) => BooleanValue::from_bool(*b),
        Node::Unary {
            op: UnaryOp::Not,
            operand,
        } => evaluate(arena, *operand, depth + 1).negated(),
        Node::Binary { op, operands } => evaluate_binary(arena, *op, operands, depth),
        _ => BooleanValue::Unknown,
    }
}

fn evaluate_binary(arena: &Arena, op: BinaryOp, operands: &[NodeId], depth: u32) -> BooleanValue {
    match op {
        BinaryOp::And => {
            let mut all_true = true;
            for &operand in operands {
                match evaluate(arena, operand, depth + 1) {
                    BooleanValue::False => return BooleanValue::False,
                    BooleanValue::Unknown => all_true = false,
                    BooleanValue::True => {}
                }
            }
            if all_true { BooleanValue::True } else { BooleanValue::Unknown }
        }
        BinaryOp::Or => {
            let mut all_false = true;
            for &operand in operands {
                match evaluate(arena, operand, depth + 1) {
                    BooleanValue::True => return BooleanValue::True,
                    BooleanValue::Unknown => all_false = false,
                    BooleanValue::False => {}
                }
            }
            if all_false { BooleanValue::False } else { BooleanValue::Unknown }
        }
        BinaryOp::Xor => {
            let mut parity = false;
            for &operand in operands {
                match evaluate(arena, operand, depth + 1) {
                    BooleanValue::True => parity = !parity,
                    BooleanValue::False => {}
                    BooleanValue::Unknown => return BooleanValue::Unknown,
                }
            }
            BooleanValue::from_bool(parity)
        }
        BinaryOp::Eq | BinaryOp::Ne => {
            let [a, b] = operands else {
                return BooleanValue::Unknown;
            };
            let equal = match (literal_of(arena, *a, depth), literal_of(arena, *b, depth)) {
                (Some(FoldedValue::Int(x)), Some(FoldedValue::Int(y))) => x == y,
                (Some(FoldedValue::Bool(x)), Some(FoldedValue::Bool(y))) => x == y,
                _ => return BooleanValue::Unknown,
            };
            BooleanValue::from_bool(if op == BinaryOp::Eq { equal } else { !equal })
        }
        BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge => {
            let [a, b] = operands else {
                return BooleanValue::Unknown;
            };
            let (Some(FoldedValue::Int(x)), Some(FoldedValue::Int(y))) =
                (literal_of(arena, *a, depth), literal_of(arena, *b, depth))
            else {
                return BooleanValue::Unknown;
            };
            BooleanValue::from_bool(match op {
                BinaryOp::Lt => x < y,
                BinaryOp::Gt => x > y,
                BinaryOp::Le => x <= y,
                _ => x >= y,
            })
        }
        _ => BooleanValue::Unknown,
    }
}

enum FoldedValue {
    Int(i64),
    Bool(bool),
}

/// The comparable literal value of an operand: integer literals (with a
/// folded unary minus) and boolean literals. Floats are left alone so NaN
/// comparisons never fold.
fn literal_of(arena: &Arena, id: NodeId, depth: u32) -> Option<FoldedValue> {
    if depth > MAX_EVAL_DEPTH {
        return None;
    }
    let id = arena.skip_parens(id);
    match arena.get(id)? {
        Node::Literal(Literal::Int(v)) => Some(FoldedValue::Int(*v)),
        Node::Literal(Literal::Bool(b)) => Some(FoldedValue::Bool(*b)),
        Node::Unary {
            op: UnaryOp::Neg,
            operand,
        } => match literal_of(arena, *operand, depth + 1)? {
            FoldedValue::Int(v) => Some(FoldedValue::Int(v.wrapping_neg())),
            FoldedValue::Bool(_) => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prune_parser::parse_expression;

    fn eval(source: &str) -> BooleanValue {
        let (arena, id) = parse_expression(source).expect("parse");
        evaluate_if_constant(&arena, id)
    }

    #[test]
    fn literals_and_negation() {
        assert_eq!(eval("true"), BooleanValue::True);
        assert_eq!(eval("!(false)"), BooleanValue::True);
        assert_eq!(eval("x"), BooleanValue::Unknown);
        assert_eq!(eval("!x"), BooleanValue::Unknown);
    }

    #[test]
    fn deciding_constants_absorb_unknowns() {
        assert_eq!(eval("x && false"), BooleanValue::False);
        assert_eq!(eval("true || x"), BooleanValue::True);
        assert_eq!(eval("x && true"), BooleanValue::Unknown);
        assert_eq!(eval("true && true && true"), BooleanValue::True);
    }

    #[test]
    fn xor_needs_every_operand() {
        assert_eq!(eval("true ^ false"), BooleanValue::True);
        assert_eq!(eval("true ^ true"), BooleanValue::False);
        assert_eq!(eval("true ^ x"), BooleanValue::Unknown);
    }

    #[test]
    fn deep_nesting_evaluates_to_unknown() {
        let mut arena = Arena::new();
        let mut id = arena.add_bool(true);
        for _ in 0..100_000 {
            id = arena.add_not(id);
        }
        // Decidable in principle, but past the recursion ceiling the
        // evaluator must give up rather than overflow the stack.
        assert_eq!(evaluate_if_constant(&arena, id), BooleanValue::Unknown);
    }

    #[test]
    fn integer_comparisons_fold() {
        assert_eq!(eval("3 < 5"), BooleanValue::True);
        assert_eq!(eval("-1 >= 0"), BooleanValue::False);
        assert_eq!(eval("2 == 2"), BooleanValue::True);
        assert_eq!(eval("true != false"), BooleanValue::True);
        // Float comparisons never fold (NaN).
        assert_eq!(eval("1.0 == 1.0"), BooleanValue::Unknown);
    }
}
