//! Rules over `if` statements and ternary expressions.

use prune_analysis::bool_eval::{evaluate_if_constant, BooleanValue};
use prune_analysis::equivalence::{EquivalenceChecker, MatchResult};
use prune_analysis::reachability::ReachabilityAnalyzer;
use prune_analysis::side_effects::SideEffectChecker;
use prune_ast::node::{Node, NodeId};
use prune_ast::ops::UnaryOp;
use rustc_hash::FxHashSet;

use crate::registry::DetectContext;
use crate::walk::collect_nodes;

pub const CONSTANT_CONDITIONAL: &str = "constant-conditional";
pub const IDENTICAL_IF_BRANCHES: &str = "identical-if-branches";
pub const IDENTICAL_TERNARY_BRANCHES: &str = "identical-ternary-branches";
pub const PUSHABLE_TERNARY: &str = "pushable-ternary";
pub const PUSHABLE_IF: &str = "pushable-if";
pub const NEGATED_IF: &str = "negated-if";
pub const CONFUSING_ELSE: &str = "confusing-else";
pub const DUPLICATE_CONDITION: &str = "duplicate-condition";

/// `if`/ternary conditions whose value is decided by literals.
pub fn constant_conditional(ctx: &mut DetectContext) {
    let candidates = collect_nodes(ctx.arena, ctx.root, |n| {
        matches!(n, Node::If { .. } | Node::Conditional { .. })
    });
    for id in candidates {
        let condition = match ctx.arena.get(id) {
            Some(Node::If { condition, .. } | Node::Conditional { condition, .. }) => *condition,
            _ => continue,
        };
        let value = evaluate_if_constant(ctx.arena, condition);
        if value.is_known() {
            let text = ctx.print_expr(condition);
            let always = if value == BooleanValue::True { "true" } else { "false" };
            ctx.report(
                condition,
                CONSTANT_CONDITIONAL,
                format!("condition '{text}' is always {always}"),
                None,
            );
        }
    }
}

/// `if (c) X else X` with a pure condition collapses to `X`.
pub fn identical_if_branches(ctx: &mut DetectContext) {
    let candidates = collect_nodes(ctx.arena, ctx.root, |n| matches!(n, Node::If { .. }));
    for id in candidates {
        let Some(Node::If {
            condition,
            then_branch,
            else_branch: Some(else_branch),
        }) = ctx.arena.get(id).cloned()
        else {
            continue;
        };
        if SideEffectChecker::new(ctx.arena).may_have_side_effects(condition) {
            continue;
        }
        if EquivalenceChecker::new(ctx.arena).statements_are_equivalent(then_branch, else_branch) {
            let replacement = ctx.print_stmt(then_branch);
            ctx.report(
                id,
                IDENTICAL_IF_BRANCHES,
                "'if' statement with identical branches",
                Some(replacement),
            );
        }
    }
}

/// `c ? x : x` with a pure condition collapses to `x`.
pub fn identical_ternary_branches(ctx: &mut DetectContext) {
    let candidates = collect_nodes(ctx.arena, ctx.root, |n| matches!(n, Node::Conditional { .. }));
    for id in candidates {
        let Some(Node::Conditional {
            condition,
            then_expr,
            else_expr,
        }) = ctx.arena.get(id).cloned()
        else {
            continue;
        };
        if SideEffectChecker::new(ctx.arena).may_have_side_effects(condition) {
            continue;
        }
        if EquivalenceChecker::new(ctx.arena).expressions_are_equivalent(then_expr, else_expr) {
            let replacement = ctx.print_expr(then_expr);
            ctx.report(
                id,
                IDENTICAL_TERNARY_BRANCHES,
                "both branches of the conditional are identical",
                Some(replacement),
            );
        }
    }
}

/// `c ? f(a) : f(b)` becomes `f(c ? a : b)`: ternary branches that differ
/// in exactly one subexpression, with the conditional pushed down to the
/// difference. Sound when the condition is pure, since its evaluation
/// moves later.
pub fn pushable_ternary(ctx: &mut DetectContext) {
    let candidates = collect_nodes(ctx.arena, ctx.root, |n| matches!(n, Node::Conditional { .. }));
    for id in candidates {
        let Some(Node::Conditional {
            condition,
            then_expr,
            else_expr,
        }) = ctx.arena.get(id).cloned()
        else {
            continue;
        };
        if SideEffectChecker::new(ctx.arena).may_have_side_effects(condition) {
            continue;
        }
        let result = EquivalenceChecker::new(ctx.arena).match_expressions(then_expr, else_expr);
        let MatchResult::PartialMatch {
            left_diff,
            right_diff,
        } = result
        else {
            continue;
        };
        if ctx.options.ignore_whole_branch_diffs
            && left_diff == ctx.arena.skip_parens(then_expr)
        {
            continue;
        }
        let inner = ctx.arena.add_conditional(condition, left_diff, right_diff);
        let pushed = ctx
            .arena
            .clone_with_replacement(then_expr, left_diff, inner);
        let replacement = ctx.print_expr(pushed);
        ctx.report(
            id,
            PUSHABLE_TERNARY,
            "conditional can be pushed inside the expression",
            Some(replacement),
        );
    }
}

/// `if (c) f(a); else f(b);` where the two single-statement branches
/// differ in exactly one subexpression.
pub fn pushable_if(ctx: &mut DetectContext) {
    let candidates = collect_nodes(ctx.arena, ctx.root, |n| matches!(n, Node::If { .. }));
    for id in candidates {
        let Some(Node::If {
            condition,
            then_branch,
            else_branch: Some(else_branch),
        }) = ctx.arena.get(id).cloned()
        else {
            continue;
        };
        if SideEffectChecker::new(ctx.arena).may_have_side_effects(condition) {
            continue;
        }
        let (Some(then_stmt), Some(else_stmt)) = (
            single_statement(ctx, then_branch),
            single_statement(ctx, else_branch),
        ) else {
            continue;
        };
        let result = EquivalenceChecker::new(ctx.arena).match_statements(then_stmt, else_stmt);
        let MatchResult::PartialMatch {
            left_diff,
            right_diff,
        } = result
        else {
            continue;
        };
        if ctx.options.ignore_whole_branch_diffs {
            // A diff that is the whole carried expression (the return
            // value, the full statement expression) would rebuild the
            // same if as a ternary; that is a style call, not redundancy.
            let whole = match ctx.arena.get(then_stmt) {
                Some(Node::ExprStmt { expression }) => Some(*expression),
                Some(Node::Return { value }) => *value,
                _ => None,
            };
            if whole.map(|w| ctx.arena.skip_parens(w)) == Some(left_diff) {
                continue;
            }
        }
        let inner = ctx.arena.add_conditional(condition, left_diff, right_diff);
        let pushed = ctx
            .arena
            .clone_with_replacement(then_stmt, left_diff, inner);
        let replacement = ctx.print_stmt(pushed);
        ctx.report(
            id,
            PUSHABLE_IF,
            "'if' branches differ in a single expression",
            Some(replacement),
        );
    }
}

fn single_statement(ctx: &DetectContext, stmt: NodeId) -> Option<NodeId> {
    match ctx.arena.get(stmt)? {
        Node::Block { statements } if statements.len() == 1 => Some(statements[0]),
        Node::Block { .. } => None,
        _ => Some(stmt),
    }
}

/// `if (!c) a; else b;` reads better with the branches swapped. Skipped
/// when the else branch is itself an `if` (swapping would bury the chain).
pub fn negated_if(ctx: &mut DetectContext) {
    let candidates = collect_nodes(ctx.arena, ctx.root, |n| matches!(n, Node::If { .. }));
    for id in candidates {
        let Some(Node::If {
            condition,
            then_branch,
            else_branch: Some(else_branch),
        }) = ctx.arena.get(id).cloned()
        else {
            continue;
        };
        let stripped = ctx.arena.skip_parens(condition);
        let Some(Node::Unary {
            op: UnaryOp::Not,
            operand,
        }) = ctx.arena.get(stripped).cloned()
        else {
            continue;
        };
        if matches!(ctx.arena.get(else_branch), Some(Node::If { .. })) {
            continue;
        }
        let swapped = ctx.arena.add(Node::If {
            condition: operand,
            then_branch: else_branch,
            else_branch: Some(then_branch),
        });
        let replacement = ctx.print_stmt(swapped);
        ctx.report(
            id,
            NEGATED_IF,
            "'if' condition is negated; the branches can be swapped",
            Some(replacement),
        );
    }
}

/// An `else` after a then-branch that cannot complete normally: the else
/// wrapper is noise, its contents can follow the `if` directly.
pub fn confusing_else(ctx: &mut DetectContext) {
    let candidates = collect_nodes(ctx.arena, ctx.root, |n| matches!(n, Node::If { .. }));
    for id in candidates {
        let Some(Node::If {
            then_branch,
            else_branch: Some(else_branch),
            ..
        }) = ctx.arena.get(id).cloned()
        else {
            continue;
        };
        // Chains stay chains; only a terminal else is worth unwrapping.
        if matches!(ctx.arena.get(else_branch), Some(Node::If { .. })) {
            continue;
        }
        if !ReachabilityAnalyzer::new(ctx.arena).may_complete_normally(then_branch) {
            ctx.report(
                else_branch,
                CONFUSING_ELSE,
                "'else' is unnecessary; the then-branch never falls through",
                None,
            );
        }
    }
}

/// The same condition appearing twice in one `else if` chain; the later
/// occurrence can never fire.
pub fn duplicate_condition(ctx: &mut DetectContext) {
    let ifs = collect_nodes(ctx.arena, ctx.root, |n| matches!(n, Node::If { .. }));
    let mut chain_members: FxHashSet<NodeId> = FxHashSet::default();
    for &id in &ifs {
        if let Some(Node::If {
            else_branch: Some(e),
            ..
        }) = ctx.arena.get(id)
        {
            if matches!(ctx.arena.get(*e), Some(Node::If { .. })) {
                chain_members.insert(*e);
            }
        }
    }
    for &head in &ifs {
        if chain_members.contains(&head) {
            continue;
        }
        let mut conditions: Vec<NodeId> = Vec::new();
        let mut current = head;
        loop {
            let Some(Node::If {
                condition,
                else_branch,
                ..
            }) = ctx.arena.get(current)
            else {
                break;
            };
            conditions.push(*condition);
            match else_branch {
                Some(e) if matches!(ctx.arena.get(*e), Some(Node::If { .. })) => current = *e,
                _ => break,
            }
        }
        if conditions.len() < 2 {
            continue;
        }
        // A duplicate only proves the later branch dead if nothing in
        // between can change what the condition evaluates to.
        let side_effects = SideEffectChecker::new(ctx.arena);
        if conditions
            .iter()
            .any(|&c| side_effects.may_have_side_effects(c))
        {
            continue;
        }
        let mut matched = vec![false; conditions.len()];
        for i in 0..conditions.len() {
            if matched[i] {
                continue;
            }
            for j in (i + 1)..conditions.len() {
                if matched[j] {
                    continue;
                }
                if EquivalenceChecker::new(ctx.arena)
                    .expressions_are_equivalent(conditions[i], conditions[j])
                {
                    matched[j] = true;
                    let text = ctx.print_expr(conditions[j]);
                    ctx.report(
                        conditions[j],
                        DUPLICATE_CONDITION,
                        format!("condition '{text}' duplicates an earlier one in the chain"),
                        None,
                    );
                }
            }
        }
    }
}
