//! Generic preorder tree traversal for the detectors.

use prune_ast::node::{Node, NodeId};
use prune_ast::Arena;

/// Depth-first preorder visit of every node reachable from `root`.
///
/// Driven by an explicit work stack so arbitrarily deep trees walk in
/// constant stack space.
pub fn for_each_node(arena: &Arena, root: NodeId, f: &mut impl FnMut(NodeId, &Node)) {
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        let Some(node) = arena.get(id) else {
            continue;
        };
        f(id, node);
        let children = node.children();
        stack.extend(children.iter().rev().copied());
    }
}

/// All nodes under `root` satisfying `pred`, in preorder. Detectors
/// collect their candidates up front so reporting (which may append
/// replacement nodes to the arena) happens after the walk.
pub fn collect_nodes(arena: &Arena, root: NodeId, pred: impl Fn(&Node) -> bool) -> Vec<NodeId> {
    let mut out = Vec::new();
    for_each_node(arena, root, &mut |id, node| {
        if pred(node) {
            out.push(id);
        }
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walk_is_preorder() {
        let mut arena = Arena::new();
        let a = arena.add_var("a", None);
        let b = arena.add_var("b", None);
        let call = arena.add_call(None, "f", vec![a, b]);
        let root = arena.add_expr_stmt(call);
        let all = collect_nodes(&arena, root, |_| true);
        assert_eq!(all, vec![root, call, a, b]);
    }

    #[test]
    fn deep_trees_walk_without_recursion() {
        let mut arena = Arena::new();
        let mut id = arena.add_var("x", None);
        for _ in 0..100_000 {
            id = arena.add_not(id);
        }
        let all = collect_nodes(&arena, id, |_| true);
        assert_eq!(all.len(), 100_001);
        assert_eq!(all[0], id);
    }
}
