//! Rules over switch statements.

use prune_analysis::equivalence::{EquivalenceChecker, EquivalenceContext};
use prune_ast::node::{Node, NodeId};

use crate::registry::DetectContext;
use crate::walk::collect_nodes;

pub const DUPLICATE_SWITCH_BRANCHES: &str = "duplicate-switch-branches";

/// Two clauses of one switch with equivalent bodies; the later one can be
/// folded into the earlier by sharing its labels.
pub fn duplicate_switch_branches(ctx: &mut DetectContext) {
    let switches = collect_nodes(ctx.arena, ctx.root, |n| matches!(n, Node::Switch { .. }));
    for id in switches {
        let Some(Node::Switch { cases, .. }) = ctx.arena.get(id).cloned() else {
            continue;
        };
        let mut matched = vec![false; cases.len()];
        for i in 0..cases.len() {
            if matched[i] {
                continue;
            }
            for j in (i + 1)..cases.len() {
                if matched[j] {
                    continue;
                }
                if clause_bodies_equivalent(ctx, cases[i], cases[j]) {
                    matched[j] = true;
                    ctx.report(
                        cases[j],
                        DUPLICATE_SWITCH_BRANCHES,
                        "switch clause duplicates the body of an earlier clause",
                        None,
                    );
                }
            }
        }
    }
}

fn clause_bodies_equivalent(ctx: &DetectContext, a: NodeId, b: NodeId) -> bool {
    let (Some(Node::Case { body: body_a, .. }), Some(Node::Case { body: body_b, .. })) =
        (ctx.arena.get(a), ctx.arena.get(b))
    else {
        return false;
    };
    if body_a.len() != body_b.len() || body_a.len() < ctx.options.min_duplicate_case_statements {
        return false;
    }
    // One context across the whole body pair so declarations renamed in an
    // early statement stay renamed in the later ones.
    let checker = EquivalenceChecker::new(ctx.arena);
    let mut shared = EquivalenceContext::new();
    body_a
        .iter()
        .zip(body_b.iter())
        .all(|(&x, &y)| checker.statements_are_equivalent_with(&mut shared, x, y))
}
