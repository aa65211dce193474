//! Rules over loop statements.

use prune_analysis::reachability::ReachabilityAnalyzer;
use prune_ast::node::{Node, NodeId};

use crate::registry::DetectContext;
use crate::walk::collect_nodes;

pub const INFINITE_LOOP: &str = "infinite-loop";
pub const LOOP_DOESNT_LOOP: &str = "loop-doesnt-loop";
pub const UNNECESSARY_CONTINUE: &str = "unnecessary-continue";

/// An endless loop control can never leave: no break out, no return, no
/// throw.
pub fn infinite_loop(ctx: &mut DetectContext) {
    let loops = collect_nodes(ctx.arena, ctx.root, Node::is_loop);
    for id in loops {
        if ReachabilityAnalyzer::new(ctx.arena).is_infinite_loop(id) {
            ctx.report(id, INFINITE_LOOP, "loop never terminates", None);
        }
    }
}

/// A loop whose body can never reach a second iteration: it neither
/// completes normally nor continues.
pub fn loop_doesnt_loop(ctx: &mut DetectContext) {
    let loops = collect_nodes(ctx.arena, ctx.root, Node::is_loop);
    for id in loops {
        if ReachabilityAnalyzer::new(ctx.arena).loop_runs_at_most_once(id) {
            ctx.report(id, LOOP_DOESNT_LOOP, "loop executes at most once", None);
        }
    }
}

/// A naked `continue` as the final statement of a loop body jumps where
/// control was headed anyway.
pub fn unnecessary_continue(ctx: &mut DetectContext) {
    let loops = collect_nodes(ctx.arena, ctx.root, Node::is_loop);
    for id in loops {
        let body = match ctx.arena.get(id) {
            Some(
                Node::While { body, .. }
                | Node::DoWhile { body, .. }
                | Node::For { body, .. }
                | Node::ForEach { body, .. },
            ) => *body,
            _ => continue,
        };
        let Some(last) = trailing_statement(ctx, body) else {
            continue;
        };
        if matches!(ctx.arena.get(last), Some(Node::Continue { label: None })) {
            ctx.report(
                last,
                UNNECESSARY_CONTINUE,
                "'continue' is unnecessary as the last statement of the loop body",
                None,
            );
        }
    }
}

/// The statement control reaches last in a loop body: the body itself, or
/// the final meaningful statement of a body block.
fn trailing_statement(ctx: &DetectContext, body: NodeId) -> Option<NodeId> {
    match ctx.arena.get(body)? {
        Node::Block { statements } => statements
            .iter()
            .rev()
            .find(|&&s| !matches!(ctx.arena.get(s), Some(Node::Empty)))
            .copied(),
        _ => Some(body),
    }
}
