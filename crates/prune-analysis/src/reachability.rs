//! Control-flow reachability: can a statement complete normally?
//!
//! A statement completes normally when control can fall out of its bottom
//! into the following statement. Jumps never complete normally; an `if`
//! completes when a taken branch does; a conditional loop completes unless
//! its condition is the literal `true` and nothing breaks out of it; a
//! switch is analyzed over its last clause since earlier clauses fall
//! through toward the bottom.
//!
//! The analysis is purely structural. Only literal `true`/`false`
//! conditions are treated as constant; everything else is assumed able to
//! go either way, which always errs toward "may complete normally".

use bitflags::bitflags;
use prune_ast::node::{Node, NodeId};
use prune_ast::Arena;
use prune_common::Atom;
use rustc_hash::FxHashSet;

bitflags! {
    /// Bundle of the auxiliary control-flow facts about one statement.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CompletionFacts: u8 {
        const MAY_COMPLETE_NORMALLY = 1 << 0;
        /// The statement is a loop and its body contains a continue
        /// targeting it.
        const CONTINUE_TARGET = 1 << 1;
        /// Contains a naked `break` not bound to a nested loop or switch.
        const UNLABELED_BREAK = 1 << 2;
        /// Contains a `throw` anywhere below.
        const THROWS = 1 << 3;
    }
}

/// Recursion ceiling; past it every query answers its conservative
/// direction ("may complete", "contains the jump") instead of risking a
/// stack overflow on pathological nesting.
pub const MAX_REACHABILITY_DEPTH: u32 = 256;

/// Answers completion and jump-target questions about statements.
pub struct ReachabilityAnalyzer<'a> {
    arena: &'a Arena,
}

impl<'a> ReachabilityAnalyzer<'a> {
    pub fn new(arena: &'a Arena) -> ReachabilityAnalyzer<'a> {
        ReachabilityAnalyzer { arena }
    }

    pub fn completion_facts(&self, stmt: NodeId) -> CompletionFacts {
        let mut facts = CompletionFacts::empty();
        if self.may_complete_normally(stmt) {
            facts |= CompletionFacts::MAY_COMPLETE_NORMALLY;
        }
        if self.is_continue_target(stmt) {
            facts |= CompletionFacts::CONTINUE_TARGET;
        }
        if self.contains_unlabeled_break(stmt) {
            facts |= CompletionFacts::UNLABELED_BREAK;
        }
        if self.contains_throw(stmt) {
            facts |= CompletionFacts::THROWS;
        }
        facts
    }

    // =========================================================================
    // May-complete-normally
    // =========================================================================

    pub fn may_complete_normally(&self, stmt: NodeId) -> bool {
        self.completes(stmt, 0)
    }

    fn completes(&self, stmt: NodeId, depth: u32) -> bool {
        if depth > MAX_REACHABILITY_DEPTH {
            return true;
        }
        let Some(node) = self.arena.get(stmt) else {
            return true;
        };
        match node {
            Node::Break { .. } | Node::Continue { .. } | Node::Return { .. } | Node::Throw { .. } => {
                false
            }
            Node::Block { statements } => self.sequence_completes(statements, depth),
            Node::If {
                condition,
                then_branch,
                else_branch,
            } => match self.arena.as_bool_literal(*condition) {
                Some(true) => self.completes(*then_branch, depth + 1),
                Some(false) => else_branch
                    .map(|e| self.completes(e, depth + 1))
                    .unwrap_or(true),
                None => {
                    self.completes(*then_branch, depth + 1)
                        || else_branch
                            .map(|e| self.completes(e, depth + 1))
                            .unwrap_or(true)
                }
            },
            Node::While { condition, body } => {
                if self.arena.as_bool_literal(*condition) != Some(true) {
                    return true;
                }
                self.breaks_out_of_loop(*body, depth)
            }
            Node::DoWhile { body, condition } => {
                if self.breaks_out_of_loop(*body, depth) {
                    return true;
                }
                self.arena.as_bool_literal(*condition) != Some(true)
                    && (self.completes(*body, depth + 1) || self.is_continue_target(stmt))
            }
            Node::For {
                condition, body, ..
            } => match condition.map(|c| self.arena.as_bool_literal(c)) {
                // No condition, or literal true: only a break gets out.
                None | Some(Some(true)) => self.breaks_out_of_loop(*body, depth),
                _ => true,
            },
            // The iterated collection may be empty.
            Node::ForEach { .. } => true,
            Node::Switch {
                cases, exhaustive, ..
            } => self.switch_completes(cases, *exhaustive, depth),
            Node::Case { body, .. } => self.sequence_completes(body, depth),
            Node::Labeled { label, statement } => {
                self.completes(*statement, depth + 1)
                    || self.break_to_label_in(*statement, *label, depth + 1)
            }
            // Expression statements, declarations, asserts, empties, and
            // bare expressions all fall through.
            _ => true,
        }
    }

    /// A statement sequence completes normally when every statement in it
    /// does; any statement that cannot complete makes the rest dead.
    fn sequence_completes(&self, statements: &[NodeId], depth: u32) -> bool {
        statements.iter().all(|&s| self.completes(s, depth + 1))
    }

    fn switch_completes(&self, cases: &[NodeId], exhaustive: bool, depth: u32) -> bool {
        if cases.is_empty() {
            return true;
        }
        if self.breaks_out_of_switch(cases, depth) {
            return true;
        }
        let has_default = cases.iter().any(|&c| {
            matches!(self.arena.get(c), Some(Node::Case { is_default: true, .. }))
        });
        if !has_default && !exhaustive {
            // Some selector value matches no clause.
            return true;
        }
        // Earlier clauses fall through toward the bottom, so only the last
        // clause decides whether control can fall out of the switch; an
        // empty trailing clause group completes trivially.
        let Some(&last) = cases.last() else {
            return true;
        };
        self.completes(last, depth + 1)
    }

    /// Does any break inside `body` exit the loop it belongs to? Unlabeled
    /// breaks bound to nested loops/switches do not; labeled breaks to a
    /// label defined inside the body do not; labeled breaks to any other
    /// label conservatively count as exiting.
    fn breaks_out_of_loop(&self, body: NodeId, depth: u32) -> bool {
        let mut internal_labels = FxHashSet::default();
        self.escaping_break_in(body, false, &mut internal_labels, depth)
    }

    fn breaks_out_of_switch(&self, cases: &[NodeId], depth: u32) -> bool {
        let mut internal_labels = FxHashSet::default();
        cases
            .iter()
            .any(|&c| self.escaping_break_in(c, false, &mut internal_labels, depth))
    }

    /// Walks `stmt` looking for a break that escapes the construct the walk
    /// started under. `shielded` is true once the walk has entered a nested
    /// breakable construct, where naked breaks bind locally.
    fn escaping_break_in(
        &self,
        stmt: NodeId,
        shielded: bool,
        internal_labels: &mut FxHashSet<Atom>,
        depth: u32,
    ) -> bool {
        if depth > MAX_REACHABILITY_DEPTH {
            return true;
        }
        let Some(node) = self.arena.get(stmt) else {
            return false;
        };
        match node {
            Node::Break { label: None } => !shielded,
            Node::Break { label: Some(l) } => !internal_labels.contains(l),
            Node::Block { statements } => statements
                .iter()
                .any(|&s| self.escaping_break_in(s, shielded, internal_labels, depth + 1)),
            Node::If {
                then_branch,
                else_branch,
                ..
            } => {
                self.escaping_break_in(*then_branch, shielded, internal_labels, depth + 1)
                    || else_branch.is_some_and(|e| {
                        self.escaping_break_in(e, shielded, internal_labels, depth + 1)
                    })
            }
            Node::While { body, .. }
            | Node::DoWhile { body, .. }
            | Node::For { body, .. }
            | Node::ForEach { body, .. } => {
                self.escaping_break_in(*body, true, internal_labels, depth + 1)
            }
            Node::Switch { cases, .. } => cases
                .iter()
                .any(|&c| self.escaping_break_in(c, true, internal_labels, depth + 1)),
            Node::Case { body, .. } => body
                .iter()
                .any(|&s| self.escaping_break_in(s, shielded, internal_labels, depth + 1)),
            Node::Labeled { label, statement } => {
                internal_labels.insert(*label);
                let found =
                    self.escaping_break_in(*statement, shielded, internal_labels, depth + 1);
                internal_labels.remove(label);
                found
            }
            _ => false,
        }
    }

    // =========================================================================
    // Jump-target queries
    // =========================================================================

    /// Is `stmt` a loop containing a continue that targets it? Accepts a
    /// labeled statement wrapping a loop; labels collected on the way in
    /// match labeled continues in the body.
    pub fn is_continue_target(&self, stmt: NodeId) -> bool {
        let mut labels = FxHashSet::default();
        let mut current = stmt;
        while let Some(Node::Labeled { label, statement }) = self.arena.get(current) {
            labels.insert(*label);
            current = *statement;
        }
        let body = match self.arena.get(current) {
            Some(
                Node::While { body, .. }
                | Node::DoWhile { body, .. }
                | Node::For { body, .. }
                | Node::ForEach { body, .. },
            ) => *body,
            _ => return false,
        };
        self.continue_to_in(body, false, &labels, 0)
    }

    fn continue_to_in(
        &self,
        stmt: NodeId,
        shielded: bool,
        labels: &FxHashSet<Atom>,
        depth: u32,
    ) -> bool {
        if depth > MAX_REACHABILITY_DEPTH {
            return true;
        }
        let Some(node) = self.arena.get(stmt) else {
            return false;
        };
        match node {
            Node::Continue { label: None } => !shielded,
            Node::Continue { label: Some(l) } => labels.contains(l),
            Node::Block { statements } => statements
                .iter()
                .any(|&s| self.continue_to_in(s, shielded, labels, depth + 1)),
            Node::If {
                then_branch,
                else_branch,
                ..
            } => {
                self.continue_to_in(*then_branch, shielded, labels, depth + 1)
                    || else_branch
                        .is_some_and(|e| self.continue_to_in(e, shielded, labels, depth + 1))
            }
            // Naked continues inside a nested loop bind to it; labeled
            // continues can still reach out.
            Node::While { body, .. }
            | Node::DoWhile { body, .. }
            | Node::For { body, .. }
            | Node::ForEach { body, .. } => self.continue_to_in(*body, true, labels, depth + 1),
            Node::Switch { cases, .. } => cases
                .iter()
                .any(|&c| self.continue_to_in(c, shielded, labels, depth + 1)),
            Node::Case { body, .. } => body
                .iter()
                .any(|&s| self.continue_to_in(s, shielded, labels, depth + 1)),
            Node::Labeled { statement, .. } => {
                self.continue_to_in(*statement, shielded, labels, depth + 1)
            }
            _ => false,
        }
    }

    /// Contains a naked `break` not bound to a nested loop or switch
    /// inside `stmt`.
    pub fn contains_unlabeled_break(&self, stmt: NodeId) -> bool {
        self.unlabeled_break_in(stmt, 0)
    }

    fn unlabeled_break_in(&self, stmt: NodeId, depth: u32) -> bool {
        if depth > MAX_REACHABILITY_DEPTH {
            return true;
        }
        let Some(node) = self.arena.get(stmt) else {
            return false;
        };
        match node {
            Node::Break { label: None } => true,
            Node::Block { statements } => statements
                .iter()
                .any(|&s| self.unlabeled_break_in(s, depth + 1)),
            Node::If {
                then_branch,
                else_branch,
                ..
            } => {
                self.unlabeled_break_in(*then_branch, depth + 1)
                    || else_branch.is_some_and(|e| self.unlabeled_break_in(e, depth + 1))
            }
            Node::Case { body, .. } => body.iter().any(|&s| self.unlabeled_break_in(s, depth + 1)),
            Node::Labeled { statement, .. } => self.unlabeled_break_in(*statement, depth + 1),
            // Breaks below a nested loop or switch bind there.
            _ => false,
        }
    }

    /// Contains a `throw` anywhere in the subtree (the model has no `try`,
    /// so every throw propagates).
    pub fn contains_throw(&self, stmt: NodeId) -> bool {
        self.throw_in(stmt, 0)
    }

    fn throw_in(&self, stmt: NodeId, depth: u32) -> bool {
        if depth > MAX_REACHABILITY_DEPTH {
            return true;
        }
        let Some(node) = self.arena.get(stmt) else {
            return false;
        };
        if matches!(node, Node::Throw { .. }) {
            return true;
        }
        self.any_child_statement(stmt, |child| self.throw_in(child, depth + 1))
    }

    fn break_to_label_in(&self, stmt: NodeId, label: Atom, depth: u32) -> bool {
        if depth > MAX_REACHABILITY_DEPTH {
            return true;
        }
        if let Some(Node::Break { label: Some(l) }) = self.arena.get(stmt) {
            if *l == label {
                return true;
            }
        }
        self.any_child_statement(stmt, |child| self.break_to_label_in(child, label, depth + 1))
    }

    fn return_in(&self, stmt: NodeId, depth: u32) -> bool {
        if depth > MAX_REACHABILITY_DEPTH {
            return true;
        }
        if matches!(self.arena.get(stmt), Some(Node::Return { .. })) {
            return true;
        }
        self.any_child_statement(stmt, |child| self.return_in(child, depth + 1))
    }

    /// Applies `f` to every nested statement one level down.
    fn any_child_statement(&self, stmt: NodeId, f: impl Fn(NodeId) -> bool) -> bool {
        let Some(node) = self.arena.get(stmt) else {
            return false;
        };
        match node {
            Node::Block { statements } => statements.iter().any(|&s| f(s)),
            Node::If {
                then_branch,
                else_branch,
                ..
            } => f(*then_branch) || else_branch.is_some_and(&f),
            Node::While { body, .. }
            | Node::DoWhile { body, .. }
            | Node::For { body, .. }
            | Node::ForEach { body, .. } => f(*body),
            Node::Switch { cases, .. } => cases.iter().any(|&c| f(c)),
            Node::Case { body, .. } => body.iter().any(|&s| f(s)),
            Node::Labeled { statement, .. } => f(*statement),
            _ => false,
        }
    }

    // =========================================================================
    // Loop shape queries
    // =========================================================================

    /// A loop with no terminating condition: `while (true)`,
    /// `do ... while (true)`, or a `for` whose header is empty apart from
    /// a possibly-omitted literal-true condition.
    pub fn is_endless_loop(&self, stmt: NodeId) -> bool {
        match self.arena.get(stmt) {
            Some(Node::While { condition, .. } | Node::DoWhile { condition, .. }) => {
                self.arena.as_bool_literal(*condition) == Some(true)
            }
            Some(Node::For {
                init,
                condition,
                update,
                ..
            }) => {
                init.is_none()
                    && update.is_none()
                    && condition
                        .map(|c| self.arena.as_bool_literal(c) == Some(true))
                        .unwrap_or(true)
            }
            _ => false,
        }
    }

    /// "Doesn't loop": the body can never finish an iteration and restart,
    /// because it neither completes normally nor continues.
    pub fn loop_runs_at_most_once(&self, stmt: NodeId) -> bool {
        let body = match self.arena.get(stmt) {
            Some(
                Node::While { body, .. }
                | Node::DoWhile { body, .. }
                | Node::For { body, .. }
                | Node::ForEach { body, .. },
            ) => *body,
            _ => return false,
        };
        !self.may_complete_normally(body) && !self.is_continue_target(stmt)
    }

    /// An endless loop that control can never leave: nothing breaks out,
    /// returns, or throws.
    pub fn is_infinite_loop(&self, stmt: NodeId) -> bool {
        self.is_endless_loop(stmt)
            && !self.may_complete_normally(stmt)
            && !self.return_in(stmt, 0)
            && !self.contains_throw(stmt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prune_parser::parse_statement;

    fn completes(source: &str) -> bool {
        let (arena, id) = parse_statement(source).expect("parse");
        ReachabilityAnalyzer::new(&arena).may_complete_normally(id)
    }

    #[test]
    fn jumps_never_complete() {
        assert!(!completes("return;"));
        assert!(!completes("throw e;"));
        assert!(!completes("{ f(); return; }"));
    }

    #[test]
    fn if_completes_through_either_branch() {
        assert!(completes("if (c) { return; }"));
        assert!(!completes("if (c) { return; } else { throw e; }"));
        assert!(!completes("if (true) { return; } else { f(); }"));
        assert!(completes("if (false) { return; }"));
    }

    #[test]
    fn endless_loop_needs_a_break() {
        assert!(!completes("while (true) { f(); }"));
        assert!(completes("while (true) { if (done) break; }"));
        assert!(completes("while (c) { f(); }"));
        // The naked break binds to the inner loop.
        assert!(!completes("while (true) { while (x) { break; } }"));
    }

    #[test]
    fn labeled_break_escapes_nested_loops() {
        assert!(completes(
            "while (true) { while (x) { break outer; } }"
        ));
        // A label defined inside the body does not exit the outer loop.
        assert!(!completes(
            "while (true) { inner: { if (c) break inner; f(); } }"
        ));
    }

    #[test]
    fn do_while_true_without_break_spins() {
        assert!(!completes("do { f(); } while (true);"));
        assert!(completes("do { f(); } while (c);"));
        assert!(!completes("do { return; } while (c);"));
        assert!(completes("do { continue; } while (c);"));
    }

    #[test]
    fn switch_without_default_completes() {
        assert!(completes("switch (x) { case 1: return; }"));
        assert!(!completes(
            "switch (x) { case 1: return; default: throw e; }"
        ));
        assert!(completes(
            "switch (x) { case 1: f(); default: g(); }"
        ));
        assert!(completes(
            "switch (x) { case 1: break; default: return; }"
        ));
    }

    #[test]
    fn loop_shape_queries() {
        let (arena, id) = parse_statement("while (true) { return; }").expect("parse");
        let analyzer = ReachabilityAnalyzer::new(&arena);
        assert!(analyzer.is_endless_loop(id));
        assert!(analyzer.loop_runs_at_most_once(id));
        assert!(!analyzer.is_infinite_loop(id));

        let (arena, id) = parse_statement("while (true) { f(); }").expect("parse");
        let analyzer = ReachabilityAnalyzer::new(&arena);
        assert!(analyzer.is_infinite_loop(id));

        let (arena, id) = parse_statement("while (c) { if (x) continue; f(); }").expect("parse");
        let analyzer = ReachabilityAnalyzer::new(&arena);
        assert!(analyzer.is_continue_target(id));
        assert!(!analyzer.loop_runs_at_most_once(id));
    }

    #[test]
    fn deep_nesting_assumes_completion() {
        let mut arena = Arena::new();
        let mut stmt = arena.add(Node::Return { value: None });
        for _ in 0..100_000 {
            stmt = arena.add_block(vec![stmt]);
        }
        // The buried return makes this unable to complete, but past the
        // recursion ceiling the analyzer must assume completion instead of
        // overflowing the stack.
        let analyzer = ReachabilityAnalyzer::new(&arena);
        assert!(analyzer.may_complete_normally(stmt));
        assert!(analyzer.contains_throw(stmt));
        assert!(analyzer.contains_unlabeled_break(stmt));
    }

    #[test]
    fn completion_facts_bundle() {
        let (arena, id) =
            parse_statement("while (c) { if (x) break; throw e; }").expect("parse");
        let facts = ReachabilityAnalyzer::new(&arena).completion_facts(id);
        assert!(facts.contains(CompletionFacts::MAY_COMPLETE_NORMALLY));
        assert!(facts.contains(CompletionFacts::THROWS));
        // The break binds to the loop itself, not to anything enclosing.
        assert!(!facts.contains(CompletionFacts::UNLABELED_BREAK));
    }
}
