//! Structural equivalence checking with variable re-binding.
//!
//! Two subtrees are equivalent when they compute the same thing: literals
//! by value, variable reads by resolved declaration (or by a consistent
//! renaming of locally scoped declarations), operator nodes by token and
//! operand list, with multiset matching for commutative operators.
//!
//! The partial-match mode additionally extracts the single pair of
//! differing subexpressions when two trees are equivalent everywhere else,
//! which is what lets detectors propose "push the difference inward"
//! rewrites. A second difference anywhere, a difference that is not an
//! expression on both sides, or a difference inside a permuted commutative
//! operand list all degrade the result to `ExactMismatch`.

use prune_ast::node::{Literal, Node, NodeId};
use prune_ast::ops::BinaryOp;
use prune_ast::Arena;
use rustc_hash::{FxHashMap, FxHashSet};

/// Recursion ceiling; beyond it the checker answers `ExactMismatch`
/// rather than risking a stack overflow on pathological nesting.
pub const MAX_EQUIVALENCE_DEPTH: u32 = 256;

/// Outcome of a partial match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    ExactMatch,
    ExactMismatch,
    /// Every node outside the pair is exactly equivalent, and the pair
    /// sits at structurally identical positions in the two trees.
    PartialMatch {
        left_diff: NodeId,
        right_diff: NodeId,
    },
}

impl MatchResult {
    pub const fn is_exact_match(self) -> bool {
        matches!(self, MatchResult::ExactMatch)
    }

    pub const fn is_partial_match(self) -> bool {
        matches!(self, MatchResult::PartialMatch { .. })
    }

    pub const fn is_exact_mismatch(self) -> bool {
        matches!(self, MatchResult::ExactMismatch)
    }
}

/// Call-scoped renaming state.
///
/// The substitution table maps a right-side declaration to the left-side
/// declaration it is considered equal to. It is populated lazily while a
/// single check runs and discarded afterwards, unless the caller reuses
/// one context across several statement pairs that share declarations
/// (matching two branches of an `if`, for example).
#[derive(Debug, Clone, Default)]
pub struct EquivalenceContext {
    substitution: FxHashMap<NodeId, NodeId>,
    locals: FxHashSet<NodeId>,
}

impl EquivalenceContext {
    pub fn new() -> EquivalenceContext {
        EquivalenceContext::default()
    }

    /// Declarations eligible for alpha-renaming on first reference, for
    /// callers that know the local set up front.
    pub fn with_locals(locals: impl IntoIterator<Item = NodeId>) -> EquivalenceContext {
        EquivalenceContext {
            substitution: FxHashMap::default(),
            locals: locals.into_iter().collect(),
        }
    }

    pub fn add_local(&mut self, decl: NodeId) {
        self.locals.insert(decl);
    }

    /// The left-side declaration a right-side declaration was renamed to.
    pub fn renaming_of(&self, right: NodeId) -> Option<NodeId> {
        self.substitution.get(&right).copied()
    }
}

/// Compares subtrees of one arena for semantic equivalence.
pub struct EquivalenceChecker<'a> {
    arena: &'a Arena,
}

impl<'a> EquivalenceChecker<'a> {
    pub fn new(arena: &'a Arena) -> EquivalenceChecker<'a> {
        EquivalenceChecker { arena }
    }

    pub fn expressions_are_equivalent(&self, a: NodeId, b: NodeId) -> bool {
        let mut ctx = EquivalenceContext::new();
        self.expressions_are_equivalent_with(&mut ctx, a, b)
    }

    pub fn expressions_are_equivalent_with(
        &self,
        ctx: &mut EquivalenceContext,
        a: NodeId,
        b: NodeId,
    ) -> bool {
        let mut matcher = Matcher::new(self.arena, ctx, false);
        matcher.expr_match(a, b, 0)
    }

    pub fn statements_are_equivalent(&self, a: NodeId, b: NodeId) -> bool {
        let mut ctx = EquivalenceContext::new();
        self.statements_are_equivalent_with(&mut ctx, a, b)
    }

    pub fn statements_are_equivalent_with(
        &self,
        ctx: &mut EquivalenceContext,
        a: NodeId,
        b: NodeId,
    ) -> bool {
        let mut matcher = Matcher::new(self.arena, ctx, false);
        matcher.stmt_match(a, b, 0)
    }

    pub fn match_expressions(&self, a: NodeId, b: NodeId) -> MatchResult {
        let mut ctx = EquivalenceContext::new();
        self.match_expressions_with(&mut ctx, a, b)
    }

    pub fn match_expressions_with(
        &self,
        ctx: &mut EquivalenceContext,
        a: NodeId,
        b: NodeId,
    ) -> MatchResult {
        let mut matcher = Matcher::new(self.arena, ctx, true);
        let ok = matcher.expr_match(a, b, 0);
        matcher.into_result(ok)
    }

    pub fn match_statements(&self, a: NodeId, b: NodeId) -> MatchResult {
        let mut ctx = EquivalenceContext::new();
        self.match_statements_with(&mut ctx, a, b)
    }

    /// Statement-level partial match; the diff pair is still required to
    /// be a pair of expressions.
    pub fn match_statements_with(
        &self,
        ctx: &mut EquivalenceContext,
        a: NodeId,
        b: NodeId,
    ) -> MatchResult {
        let mut matcher = Matcher::new(self.arena, ctx, true);
        let ok = matcher.stmt_match(a, b, 0);
        matcher.into_result(ok)
    }
}

struct Matcher<'a, 'ctx> {
    arena: &'a Arena,
    ctx: &'ctx mut EquivalenceContext,
    allow_diff: bool,
    diff: Option<(NodeId, NodeId)>,
    overflowed: bool,
}

impl<'a, 'ctx> Matcher<'a, 'ctx> {
    fn new(arena: &'a Arena, ctx: &'ctx mut EquivalenceContext, allow_diff: bool) -> Self {
        Matcher {
            arena,
            ctx,
            allow_diff,
            diff: None,
            overflowed: false,
        }
    }

    fn into_result(self, ok: bool) -> MatchResult {
        if !ok || self.overflowed {
            return MatchResult::ExactMismatch;
        }
        match self.diff {
            None => MatchResult::ExactMatch,
            Some((left_diff, right_diff)) => MatchResult::PartialMatch {
                left_diff,
                right_diff,
            },
        }
    }

    /// Record `(a, b)` as the single allowed difference. Fails when diff
    /// extraction is off, when a diff was already taken, or when either
    /// side is not a full expression.
    fn record_diff(&mut self, a: NodeId, b: NodeId) -> bool {
        if !self.allow_diff || self.diff.is_some() || self.overflowed {
            return false;
        }
        let (Some(na), Some(nb)) = (self.arena.get(a), self.arena.get(b)) else {
            return false;
        };
        if !na.is_expression() || !nb.is_expression() {
            return false;
        }
        self.diff = Some((a, b));
        true
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn expr_match(&mut self, a: NodeId, b: NodeId, depth: u32) -> bool {
        if depth > MAX_EQUIVALENCE_DEPTH {
            self.overflowed = true;
            return false;
        }
        // Parentheses are transparent.
        let a = self.arena.skip_parens(a);
        let b = self.arena.skip_parens(b);
        if a == b {
            return true;
        }
        let (Some(na), Some(nb)) = (self.arena.get(a), self.arena.get(b)) else {
            // Incomplete tree: conservative mismatch, no diff.
            return false;
        };

        let structural = match (na, nb) {
            (Node::Literal(la), Node::Literal(lb)) => la.same_value(*lb),
            (Node::VarRef { .. }, Node::VarRef { .. }) => self.var_eq(na, nb),
            (
                Node::Unary { op: oa, operand: xa },
                Node::Unary { op: ob, operand: xb },
            ) => oa == ob && self.expr_match(*xa, *xb, depth + 1),
            (
                Node::Binary {
                    op: oa,
                    operands: la,
                },
                Node::Binary {
                    op: ob,
                    operands: lb,
                },
            ) => oa == ob && self.operand_lists_match(*oa, la, lb, depth),
            (
                Node::Assign {
                    op: oa,
                    target: ta,
                    value: va,
                },
                Node::Assign {
                    op: ob,
                    target: tb,
                    value: vb,
                },
            ) => {
                oa == ob
                    && self.expr_match(*ta, *tb, depth + 1)
                    && self.expr_match(*va, *vb, depth + 1)
            }
            (
                Node::IncDec {
                    op: oa,
                    prefix: pa,
                    operand: xa,
                },
                Node::IncDec {
                    op: ob,
                    prefix: pb,
                    operand: xb,
                },
            ) => oa == ob && pa == pb && self.expr_match(*xa, *xb, depth + 1),
            (
                Node::Conditional {
                    condition: ca,
                    then_expr: ta,
                    else_expr: ea,
                },
                Node::Conditional {
                    condition: cb,
                    then_expr: tb,
                    else_expr: eb,
                },
            ) => {
                self.expr_match(*ca, *cb, depth + 1)
                    && self.expr_match(*ta, *tb, depth + 1)
                    && self.expr_match(*ea, *eb, depth + 1)
            }
            (
                Node::Call {
                    receiver: ra,
                    callee: fa,
                    args: aa,
                },
                Node::Call {
                    receiver: rb,
                    callee: fb,
                    args: ab,
                },
            ) => {
                // Argument order is observable; never reordered.
                fa == fb
                    && self.opt_expr_match(*ra, *rb, depth)
                    && aa.len() == ab.len()
                    && aa
                        .iter()
                        .zip(ab.iter())
                        .all(|(&x, &y)| self.expr_match(x, y, depth + 1))
            }
            (
                Node::New {
                    type_name: ta,
                    args: aa,
                },
                Node::New {
                    type_name: tb,
                    args: ab,
                },
            ) => {
                ta == tb
                    && aa.len() == ab.len()
                    && aa
                        .iter()
                        .zip(ab.iter())
                        .all(|(&x, &y)| self.expr_match(x, y, depth + 1))
            }
            (
                Node::Cast {
                    type_name: ta,
                    operand: xa,
                },
                Node::Cast {
                    type_name: tb,
                    operand: xb,
                },
            ) => ta == tb && self.expr_match(*xa, *xb, depth + 1),
            (
                Node::InstanceOf {
                    operand: xa,
                    type_name: ta,
                },
                Node::InstanceOf {
                    operand: xb,
                    type_name: tb,
                },
            ) => ta == tb && self.expr_match(*xa, *xb, depth + 1),
            _ => false,
        };

        if structural {
            return true;
        }
        // A mismatch that already consumed the diff (or recorded one in a
        // child) cannot be re-recorded here; only the leaf-most failing
        // expression pair becomes the diff.
        if self.child_recorded(a, b) {
            return false;
        }
        self.record_diff(a, b)
    }

    /// True when a child comparison under (`a`, `b`) already set the diff,
    /// meaning the failure has been accounted for at a finer granularity.
    fn child_recorded(&self, a: NodeId, b: NodeId) -> bool {
        match self.diff {
            Some((l, r)) => l != a || r != b,
            None => false,
        }
    }

    fn opt_expr_match(&mut self, a: Option<NodeId>, b: Option<NodeId>, depth: u32) -> bool {
        match (a, b) {
            (None, None) => true,
            (Some(a), Some(b)) => self.expr_match(a, b, depth + 1),
            _ => false,
        }
    }

    /// Variable reads: same declaration, a recorded renaming, or a new
    /// renaming between two locally scoped declarations. Two unresolved
    /// reads fall back to name equality; a resolved/unresolved pair never
    /// matches.
    fn var_eq(&mut self, na: &Node, nb: &Node) -> bool {
        let (Node::VarRef { name: name_a, decl: decl_a }, Node::VarRef { name: name_b, decl: decl_b }) =
            (na, nb)
        else {
            return false;
        };
        match (decl_a, decl_b) {
            (Some(da), Some(db)) => {
                if da == db {
                    return true;
                }
                if let Some(mapped) = self.ctx.substitution.get(db) {
                    return mapped == da;
                }
                if self.ctx.locals.contains(da) && self.ctx.locals.contains(db) {
                    self.ctx.substitution.insert(*db, *da);
                    return true;
                }
                false
            }
            (None, None) => name_a == name_b,
            _ => false,
        }
    }

    /// Operand lists of one operator node. Commutative operators first try
    /// an exact multiset match; only if that fails does a positional pass
    /// (which may record a diff) run, so a diff never hides inside a
    /// permutation.
    fn operand_lists_match(
        &mut self,
        op: BinaryOp,
        left: &[NodeId],
        right: &[NodeId],
        depth: u32,
    ) -> bool {
        if left.len() != right.len() {
            return false;
        }
        if self.commutative_for(op, left, right, depth) && self.multiset_match(left, right, depth) {
            return true;
        }
        left.iter()
            .zip(right.iter())
            .all(|(&a, &b)| self.expr_match(a, b, depth + 1))
    }

    /// Whether operand reordering is sound for this node pair. `+` is
    /// reorderable only when every operand is provably numeric (string
    /// concatenation is order-sensitive).
    fn commutative_for(&self, op: BinaryOp, left: &[NodeId], right: &[NodeId], depth: u32) -> bool {
        if !op.is_commutative() {
            return false;
        }
        if op != BinaryOp::Add {
            return true;
        }
        left.iter()
            .chain(right.iter())
            .all(|&id| self.is_definitely_numeric(id, depth))
    }

    fn is_definitely_numeric(&self, id: NodeId, depth: u32) -> bool {
        if depth > MAX_EQUIVALENCE_DEPTH {
            // Not provably numeric; `+` stays positional.
            return false;
        }
        let id = self.arena.skip_parens(id);
        let Some(node) = self.arena.get(id) else {
            return false;
        };
        match node {
            Node::Literal(Literal::Int(_)) | Node::Literal(Literal::Float(_)) => true,
            Node::VarRef { decl: Some(d), .. } => match self.arena.get(*d) {
                Some(Node::LocalDecl { type_name, .. }) => {
                    matches!(
                        self.arena.name(*type_name),
                        "byte" | "char" | "short" | "int" | "long" | "float" | "double"
                    )
                }
                _ => false,
            },
            Node::Unary { op, operand } => {
                use prune_ast::UnaryOp;
                matches!(op, UnaryOp::Neg | UnaryOp::Plus | UnaryOp::BitNot)
                    && self.is_definitely_numeric(*operand, depth + 1)
            }
            Node::IncDec { operand, .. } => self.is_definitely_numeric(*operand, depth + 1),
            Node::Binary { op, operands } => match op {
                BinaryOp::Sub
                | BinaryOp::Mul
                | BinaryOp::Div
                | BinaryOp::Rem
                | BinaryOp::Shl
                | BinaryOp::Shr
                | BinaryOp::UShr => true,
                BinaryOp::Add => operands
                    .iter()
                    .all(|&o| self.is_definitely_numeric(o, depth + 1)),
                _ => false,
            },
            Node::Cast { type_name, .. } => matches!(
                self.arena.name(*type_name),
                "byte" | "char" | "short" | "int" | "long" | "float" | "double"
            ),
            Node::Conditional {
                then_expr,
                else_expr,
                ..
            } => {
                self.is_definitely_numeric(*then_expr, depth + 1)
                    && self.is_definitely_numeric(*else_expr, depth + 1)
            }
            _ => false,
        }
    }

    /// Greedy exact multiset matching with an already-matched marker set.
    /// Trial pairings run against a copy of the context so failed attempts
    /// cannot leak renamings.
    fn multiset_match(&mut self, left: &[NodeId], right: &[NodeId], depth: u32) -> bool {
        let mut used = vec![false; right.len()];
        for &l in left {
            let mut found = false;
            for (i, &r) in right.iter().enumerate() {
                if used[i] {
                    continue;
                }
                let mut trial_ctx = self.ctx.clone();
                let mut trial = Matcher::new(self.arena, &mut trial_ctx, false);
                if trial.expr_match(l, r, depth + 1) {
                    *self.ctx = trial_ctx;
                    used[i] = true;
                    found = true;
                    break;
                }
            }
            if !found {
                return false;
            }
        }
        true
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn stmt_match(&mut self, a: NodeId, b: NodeId, depth: u32) -> bool {
        if depth > MAX_EQUIVALENCE_DEPTH {
            self.overflowed = true;
            return false;
        }
        if a == b {
            return true;
        }
        let (Some(na), Some(nb)) = (self.arena.get(a), self.arena.get(b)) else {
            return false;
        };
        // An expression where a statement was expected (or vice versa)
        // cannot match; expression pairs route through expr_match so diff
        // extraction applies.
        if na.is_expression() && nb.is_expression() {
            return self.expr_match(a, b, depth);
        }

        match (na, nb) {
            (
                Node::If {
                    condition: ca,
                    then_branch: ta,
                    else_branch: ea,
                },
                Node::If {
                    condition: cb,
                    then_branch: tb,
                    else_branch: eb,
                },
            ) => {
                self.expr_match(*ca, *cb, depth + 1)
                    && self.stmt_match(*ta, *tb, depth + 1)
                    && self.opt_stmt_match(*ea, *eb, depth)
            }
            (
                Node::While {
                    condition: ca,
                    body: ba,
                },
                Node::While {
                    condition: cb,
                    body: bb,
                },
            ) => self.expr_match(*ca, *cb, depth + 1) && self.stmt_match(*ba, *bb, depth + 1),
            (
                Node::DoWhile {
                    body: ba,
                    condition: ca,
                },
                Node::DoWhile {
                    body: bb,
                    condition: cb,
                },
            ) => self.stmt_match(*ba, *bb, depth + 1) && self.expr_match(*ca, *cb, depth + 1),
            (
                Node::For {
                    init: ia,
                    condition: ca,
                    update: ua,
                    body: ba,
                },
                Node::For {
                    init: ib,
                    condition: cb,
                    update: ub,
                    body: bb,
                },
            ) => {
                self.opt_stmt_match(*ia, *ib, depth)
                    && self.opt_expr_match(*ca, *cb, depth)
                    && self.opt_expr_match(*ua, *ub, depth)
                    && self.stmt_match(*ba, *bb, depth + 1)
            }
            (
                Node::ForEach {
                    variable: va,
                    iterable: ita,
                    body: ba,
                },
                Node::ForEach {
                    variable: vb,
                    iterable: itb,
                    body: bb,
                },
            ) => {
                self.decl_match(*va, *vb, depth)
                    && self.expr_match(*ita, *itb, depth + 1)
                    && self.stmt_match(*ba, *bb, depth + 1)
            }
            (
                Node::Switch {
                    selector: sa,
                    cases: ca,
                    ..
                },
                Node::Switch {
                    selector: sb,
                    cases: cb,
                    ..
                },
            ) => {
                self.expr_match(*sa, *sb, depth + 1)
                    && ca.len() == cb.len()
                    && ca
                        .iter()
                        .zip(cb.iter())
                        .all(|(&x, &y)| self.stmt_match(x, y, depth + 1))
            }
            (
                Node::Case {
                    labels: la,
                    is_default: da,
                    body: ba,
                },
                Node::Case {
                    labels: lb,
                    is_default: db,
                    body: bb,
                },
            ) => {
                da == db
                    && la.len() == lb.len()
                    && la
                        .iter()
                        .zip(lb.iter())
                        .all(|(&x, &y)| self.expr_match(x, y, depth + 1))
                    && self.stmt_list_match(ba, bb, depth)
            }
            (Node::Break { label: la }, Node::Break { label: lb }) => la == lb,
            (Node::Continue { label: la }, Node::Continue { label: lb }) => la == lb,
            (Node::Return { value: va }, Node::Return { value: vb }) => {
                self.opt_expr_match(*va, *vb, depth)
            }
            (Node::Throw { value: va }, Node::Throw { value: vb }) => {
                self.expr_match(*va, *vb, depth + 1)
            }
            (Node::Block { statements: sa }, Node::Block { statements: sb }) => {
                self.stmt_list_match(sa, sb, depth)
            }
            (Node::ExprStmt { expression: ea }, Node::ExprStmt { expression: eb }) => {
                self.expr_match(*ea, *eb, depth + 1)
            }
            (Node::LocalDecl { .. }, Node::LocalDecl { .. }) => self.decl_match(a, b, depth),
            (
                Node::Assert {
                    condition: ca,
                    message: ma,
                },
                Node::Assert {
                    condition: cb,
                    message: mb,
                },
            ) => self.expr_match(*ca, *cb, depth + 1) && self.opt_expr_match(*ma, *mb, depth),
            (
                Node::Labeled {
                    label: la,
                    statement: sa,
                },
                Node::Labeled {
                    label: lb,
                    statement: sb,
                },
            ) => la == lb && self.stmt_match(*sa, *sb, depth + 1),
            (Node::Empty, Node::Empty) => true,
            _ => false,
        }
    }

    fn opt_stmt_match(&mut self, a: Option<NodeId>, b: Option<NodeId>, depth: u32) -> bool {
        match (a, b) {
            (None, None) => true,
            (Some(a), Some(b)) => self.stmt_match(a, b, depth + 1),
            _ => false,
        }
    }

    /// Statement lists compare meaningful statements only (empty
    /// statements are skipped on both sides).
    fn stmt_list_match(&mut self, a: &[NodeId], b: &[NodeId], depth: u32) -> bool {
        let meaningful = |list: &[NodeId]| -> Vec<NodeId> {
            list.iter()
                .copied()
                .filter(|&id| !matches!(self.arena.get(id), Some(Node::Empty)))
                .collect()
        };
        let la = meaningful(a);
        let lb = meaningful(b);
        la.len() == lb.len()
            && la
                .iter()
                .zip(lb.iter())
                .all(|(&x, &y)| self.stmt_match(x, y, depth + 1))
    }

    /// Two local declarations match when modifiers and declared type are
    /// equal and the names are equal or recorded as a renaming; matching
    /// declarations also become locally scoped so later reads can bind
    /// through the substitution table. Initializers are compared as a
    /// separate slot eligible to be the diff.
    fn decl_match(&mut self, a: NodeId, b: NodeId, depth: u32) -> bool {
        let (
            Some(Node::LocalDecl {
                modifiers: ma,
                type_name: ta,
                name: name_a,
                initializer: ia,
            }),
            Some(Node::LocalDecl {
                modifiers: mb,
                type_name: tb,
                name: name_b,
                initializer: ib,
            }),
        ) = (self.arena.get(a), self.arena.get(b))
        else {
            return false;
        };
        if ma != mb || ta != tb {
            return false;
        }
        if name_a != name_b {
            // Renaming is only legal between the declarations being
            // matched right now; record it so subsequent reads line up.
            if let Some(&mapped) = self.ctx.substitution.get(&b) {
                if mapped != a {
                    return false;
                }
            } else {
                self.ctx.substitution.insert(b, a);
            }
        }
        self.ctx.locals.insert(a);
        self.ctx.locals.insert(b);
        self.opt_expr_match(*ia, *ib, depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prune_parser::parse_expression;

    fn both(source_a: &str, source_b: &str) -> (Arena, NodeId, NodeId) {
        // Parse the two expressions into one arena so declarations stay
        // distinct node identities.
        let combined = format!("f({source_a}, {source_b})");
        let (arena, call) = parse_expression(&combined).expect("parse");
        let Some(Node::Call { args, .. }) = arena.get(call) else {
            panic!("expected call wrapper");
        };
        let (a, b) = (args[0], args[1]);
        (arena, a, b)
    }

    #[test]
    fn commutative_reordering_matches() {
        let (arena, a, b) = both("x && y", "y && x");
        let checker = EquivalenceChecker::new(&arena);
        assert!(checker.expressions_are_equivalent(a, b));
    }

    #[test]
    fn subtraction_is_positional() {
        let (arena, a, b) = both("x - y", "y - x");
        let checker = EquivalenceChecker::new(&arena);
        assert!(!checker.expressions_are_equivalent(a, b));
    }

    #[test]
    fn string_concat_is_not_reordered() {
        let (arena, a, b) = both("\"a\" + x", "x + \"a\"");
        let checker = EquivalenceChecker::new(&arena);
        assert!(!checker.expressions_are_equivalent(a, b));
    }

    #[test]
    fn single_leaf_diff_is_partial() {
        let (arena, a, b) = both("g(x, 1)", "g(x, 2)");
        let checker = EquivalenceChecker::new(&arena);
        match checker.match_expressions(a, b) {
            MatchResult::PartialMatch {
                left_diff,
                right_diff,
            } => {
                assert!(matches!(
                    arena.get(left_diff),
                    Some(Node::Literal(Literal::Int(1)))
                ));
                assert!(matches!(
                    arena.get(right_diff),
                    Some(Node::Literal(Literal::Int(2)))
                ));
            }
            other => panic!("expected partial match, got {other:?}"),
        }
    }

    #[test]
    fn two_diffs_degrade_to_mismatch() {
        let (arena, a, b) = both("g(1, 2)", "g(3, 4)");
        let checker = EquivalenceChecker::new(&arena);
        assert!(checker.match_expressions(a, b).is_exact_mismatch());
    }

    #[test]
    fn operator_mismatch_diffs_at_the_operator_node() {
        let (arena, a, b) = both("h(x + y)", "h(x * y)");
        let checker = EquivalenceChecker::new(&arena);
        match checker.match_expressions(a, b) {
            MatchResult::PartialMatch { left_diff, .. } => {
                assert!(matches!(arena.get(left_diff), Some(Node::Binary { .. })));
            }
            other => panic!("expected partial match, got {other:?}"),
        }
    }
}
