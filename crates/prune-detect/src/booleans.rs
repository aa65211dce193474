//! Rules over boolean expressions, built on the simplifier.

use prune_analysis::equivalence::EquivalenceChecker;
use prune_analysis::side_effects::SideEffectChecker;
use prune_analysis::simplify::{is_boolean_shaped, Simplifier};
use prune_ast::node::{Literal, Node, NodeId};
use prune_ast::ops::{BinaryOp, UnaryOp};

use crate::registry::DetectContext;
use crate::walk::collect_nodes;

pub const DOUBLE_NEGATION: &str = "double-negation";
pub const BOOLEAN_LITERAL_COMPARE: &str = "boolean-literal-compare";
pub const POINTLESS_TERNARY: &str = "pointless-ternary";
pub const SIMPLIFIABLE_BOOLEAN: &str = "simplifiable-boolean";
pub const FACTORIZABLE_BOOLEAN: &str = "factorizable-boolean";
pub const TAUTOLOGY: &str = "tautology";

/// `!!x`, and `!(a != b)`-style negated inequality.
pub fn double_negation(ctx: &mut DetectContext) {
    let candidates = collect_nodes(ctx.arena, ctx.root, |n| {
        matches!(
            n,
            Node::Unary {
                op: UnaryOp::Not,
                ..
            }
        )
    });
    for id in candidates {
        let Some(Node::Unary {
            op: UnaryOp::Not,
            operand,
        }) = ctx.arena.get(id).cloned()
        else {
            continue;
        };
        let inner = ctx.arena.skip_parens(operand);
        let fires = match ctx.arena.get(inner) {
            Some(Node::Unary {
                op: UnaryOp::Not, ..
            }) => true,
            Some(Node::Binary {
                op: BinaryOp::Ne,
                operands,
            }) => operands.len() == 2,
            _ => false,
        };
        if !fires {
            continue;
        }
        let simplified = Simplifier::new(ctx.arena).simplify(id);
        let replacement = ctx.print_expr(simplified);
        ctx.report(
            id,
            DOUBLE_NEGATION,
            "double negation",
            Some(replacement),
        );
    }
}

/// Comparisons against boolean literals: `x == true`, `x != false`, and
/// friends, when the other operand is provably boolean.
pub fn boolean_literal_compare(ctx: &mut DetectContext) {
    let candidates = collect_nodes(ctx.arena, ctx.root, |n| {
        matches!(
            n,
            Node::Binary {
                op: BinaryOp::Eq | BinaryOp::Ne,
                ..
            }
        )
    });
    for id in candidates {
        let Some(Node::Binary { operands, .. }) = ctx.arena.get(id).cloned() else {
            continue;
        };
        if operands.len() != 2 {
            continue;
        }
        let fires = [(0, 1), (1, 0)].into_iter().any(|(lit, other)| {
            matches!(
                ctx.arena.get(ctx.arena.skip_parens(operands[lit])),
                Some(Node::Literal(Literal::Bool(_)))
            ) && is_boolean_shaped(ctx.arena, operands[other])
        });
        if !fires {
            continue;
        }
        let simplified = Simplifier::new(ctx.arena).simplify(id);
        if simplified == id {
            continue;
        }
        let text = ctx.print_expr(simplified);
        ctx.report(
            id,
            BOOLEAN_LITERAL_COMPARE,
            format!("comparison with a boolean literal; use '{text}'"),
            Some(text.clone()),
        );
    }
}

/// `c ? true : false` and the other literal-branch ternaries.
pub fn pointless_ternary(ctx: &mut DetectContext) {
    let candidates = collect_nodes(ctx.arena, ctx.root, |n| matches!(n, Node::Conditional { .. }));
    for id in candidates {
        let Some(Node::Conditional {
            then_expr,
            else_expr,
            ..
        }) = ctx.arena.get(id).cloned()
        else {
            continue;
        };
        if ctx.arena.as_bool_literal(then_expr).is_none()
            && ctx.arena.as_bool_literal(else_expr).is_none()
        {
            continue;
        }
        let simplified = Simplifier::new(ctx.arena).simplify(id);
        if simplified == id {
            continue;
        }
        let text = ctx.print_expr(simplified);
        ctx.report(
            id,
            POINTLESS_TERNARY,
            format!("conditional with boolean literal branches; use '{text}'"),
            Some(text.clone()),
        );
    }
}

/// Catch-all: a condition the simplifier can rewrite to something
/// strictly simpler. Runs only over condition positions to keep the
/// reports anchored where a reader looks.
pub fn simplifiable_boolean(ctx: &mut DetectContext) {
    let mut conditions: Vec<NodeId> = Vec::new();
    crate::walk::for_each_node(ctx.arena, ctx.root, &mut |_, node| match node {
        Node::If { condition, .. }
        | Node::While { condition, .. }
        | Node::DoWhile { condition, .. }
        | Node::Assert { condition, .. } => conditions.push(*condition),
        Node::For {
            condition: Some(condition),
            ..
        } => conditions.push(*condition),
        _ => {}
    });
    for condition in conditions {
        let before = ctx.print_expr(condition);
        let simplified = Simplifier::new(ctx.arena).simplify(condition);
        let after = ctx.print_expr(simplified);
        if after == before {
            continue;
        }
        ctx.report(
            condition,
            SIMPLIFIABLE_BOOLEAN,
            format!("condition can be simplified to '{after}'"),
            Some(after.clone()),
        );
    }
}

/// `(a && b) || (a && c)`: a common pure factor can be pulled out.
pub fn factorizable_boolean(ctx: &mut DetectContext) {
    let candidates = collect_nodes(ctx.arena, ctx.root, |n| {
        matches!(
            n,
            Node::Binary {
                op: BinaryOp::And | BinaryOp::Or,
                ..
            }
        )
    });
    for id in candidates {
        let Some(Node::Binary { op, operands }) = ctx.arena.get(id).cloned() else {
            continue;
        };
        if operands.len() != 2 {
            continue;
        }
        let inner_op = match op {
            BinaryOp::Or => BinaryOp::And,
            BinaryOp::And => BinaryOp::Or,
            _ => continue,
        };
        let Some((la, lb)) = two_operands_of(ctx, operands[0], inner_op) else {
            continue;
        };
        let Some((ra, rb)) = two_operands_of(ctx, operands[1], inner_op) else {
            continue;
        };
        let has_common_factor = [(la, ra), (la, rb), (lb, ra), (lb, rb)]
            .into_iter()
            .any(|(x, y)| {
                !SideEffectChecker::new(ctx.arena).may_have_side_effects(x)
                    && !SideEffectChecker::new(ctx.arena).may_have_side_effects(y)
                    && EquivalenceChecker::new(ctx.arena).expressions_are_equivalent(x, y)
            });
        if !has_common_factor {
            continue;
        }
        let simplified = Simplifier::new(ctx.arena).simplify(id);
        if simplified == id {
            // The factor exists but moving it would reorder effects.
            continue;
        }
        let text = ctx.print_expr(simplified);
        ctx.report(
            id,
            FACTORIZABLE_BOOLEAN,
            format!("common factor can be extracted: '{text}'"),
            Some(text.clone()),
        );
    }
}

fn two_operands_of(ctx: &DetectContext, id: NodeId, op: BinaryOp) -> Option<(NodeId, NodeId)> {
    let id = ctx.arena.skip_parens(id);
    match ctx.arena.get(id) {
        Some(Node::Binary {
            op: actual,
            operands,
        }) if *actual == op && operands.len() == 2 => Some((operands[0], operands[1])),
        _ => None,
    }
}

/// Duplicate or contradictory operands in one `&&`/`||` list:
/// `x || x`, `x && !x`, `x || !x`.
pub fn tautology(ctx: &mut DetectContext) {
    let candidates = collect_nodes(ctx.arena, ctx.root, |n| {
        matches!(
            n,
            Node::Binary {
                op: BinaryOp::And | BinaryOp::Or,
                ..
            }
        )
    });
    for id in candidates {
        let Some(Node::Binary { operands, .. }) = ctx.arena.get(id).cloned() else {
            continue;
        };
        if operands
            .iter()
            .any(|&o| SideEffectChecker::new(ctx.arena).may_have_side_effects(o))
        {
            continue;
        }
        let mut fires = false;
        'outer: for i in 0..operands.len() {
            for j in (i + 1)..operands.len() {
                if EquivalenceChecker::new(ctx.arena)
                    .expressions_are_equivalent(operands[i], operands[j])
                    || opposite(ctx, operands[i], operands[j])
                {
                    fires = true;
                    break 'outer;
                }
            }
        }
        if !fires {
            continue;
        }
        let simplified = Simplifier::new(ctx.arena).simplify(id);
        if simplified == id {
            continue;
        }
        let text = ctx.print_expr(simplified);
        ctx.report(
            id,
            TAUTOLOGY,
            format!("boolean operand list collapses to '{text}'"),
            Some(text.clone()),
        );
    }
}

fn opposite(ctx: &DetectContext, a: NodeId, b: NodeId) -> bool {
    let negated_operand = |id: NodeId| -> Option<NodeId> {
        match ctx.arena.get(ctx.arena.skip_parens(id)) {
            Some(Node::Unary {
                op: UnaryOp::Not,
                operand,
            }) => Some(*operand),
            _ => None,
        }
    };
    if let Some(inner) = negated_operand(b) {
        if EquivalenceChecker::new(ctx.arena).expressions_are_equivalent(a, inner) {
            return true;
        }
    }
    if let Some(inner) = negated_operand(a) {
        if EquivalenceChecker::new(ctx.arena).expressions_are_equivalent(inner, b) {
            return true;
        }
    }
    false
}
