//! Cross-cutting properties of the analysis core, checked over parsed
//! source snippets.

use prune_analysis::equivalence::{EquivalenceChecker, MatchResult};
use prune_analysis::simplify::Simplifier;
use prune_ast::node::{Node, NodeId};
use prune_ast::{Arena, Printer};
use prune_parser::{parse_expression, parse_program};

/// Parse two expressions into one arena as `pair(a, b)` so they share an
/// interner but keep distinct node identities.
fn pair(a: &str, b: &str) -> (Arena, NodeId, NodeId) {
    let (arena, call) = parse_expression(&format!("pair({a}, {b})")).expect("parse");
    let Some(Node::Call { args, .. }) = arena.get(call) else {
        panic!("expected call wrapper");
    };
    let (left, right) = (args[0], args[1]);
    (arena, left, right)
}

fn equivalent(a: &str, b: &str) -> bool {
    let (arena, left, right) = pair(a, b);
    EquivalenceChecker::new(&arena).expressions_are_equivalent(left, right)
}

#[test]
fn equivalence_is_reflexive() {
    for source in [
        "x",
        "a * (b + c)",
        "f(x).length() > 0 && !done",
        "o instanceof String ? s : t",
    ] {
        let (arena, left, right) = pair(source, source);
        let checker = EquivalenceChecker::new(&arena);
        assert!(checker.expressions_are_equivalent(left, right), "{source}");
        assert!(
            checker.match_expressions(left, right).is_exact_match(),
            "{source}"
        );
    }
}

#[test]
fn equivalence_is_symmetric() {
    let cases = [
        ("a * b", "b * a"),
        ("a - b", "b - a"),
        ("f(x)", "f(y)"),
        ("x && y && z", "z && y && x"),
    ];
    for (a, b) in cases {
        assert_eq!(equivalent(a, b), equivalent(b, a), "{a} vs {b}");
    }
}

#[test]
fn commutative_operands_reorder_but_ordered_ones_do_not() {
    assert!(equivalent("a * b", "b * a"));
    assert!(equivalent("a && b && c", "c && a && b"));
    assert!(equivalent("(a && b) || d", "(b && a) || d"));
    assert!(!equivalent("a - b", "b - a"));
    assert!(!equivalent("a / b", "b / a"));
    assert!(!equivalent("f(a, b)", "f(b, a)"));
}

#[test]
fn renamed_locals_are_equivalent() {
    let (arena, stmts) = parse_program(
        "{ int i = first(); use(i); } { int j = first(); use(j); }",
    )
    .expect("parse");
    let checker = EquivalenceChecker::new(&arena);
    assert!(checker.statements_are_equivalent(stmts[0], stmts[1]));
}

#[test]
fn renaming_requires_matching_types_and_consistency() {
    let (arena, stmts) = parse_program(
        "{ int i = first(); use(i); } { long j = first(); use(j); }",
    )
    .expect("parse");
    assert!(!EquivalenceChecker::new(&arena).statements_are_equivalent(stmts[0], stmts[1]));

    // One declaration cannot play the role of two different ones.
    let (arena, stmts) = parse_program(
        "{ int i = f(); int l = f(); use(i, i); } { int j = f(); int k = f(); use(j, k); }",
    )
    .expect("parse");
    assert!(!EquivalenceChecker::new(&arena).statements_are_equivalent(stmts[0], stmts[1]));
}

#[test]
fn partial_match_extracts_exactly_one_diff() {
    let (arena, left, right) = pair("a && b", "a && c");
    let checker = EquivalenceChecker::new(&arena);
    match checker.match_expressions(left, right) {
        MatchResult::PartialMatch {
            left_diff,
            right_diff,
        } => {
            let printer = Printer::new(&arena);
            assert_eq!(printer.print_expr(left_diff), "b");
            assert_eq!(printer.print_expr(right_diff), "c");
        }
        other => panic!("expected partial match, got {other:?}"),
    }
}

#[test]
fn diffs_never_hide_inside_a_permutation() {
    // Aligning a/a would leave b vs c as a diff, but only after
    // reordering; that must degrade to a mismatch instead.
    let (arena, left, right) = pair("a && b", "c && a");
    let checker = EquivalenceChecker::new(&arena);
    assert!(checker.match_expressions(left, right).is_exact_mismatch());
}

#[test]
fn simplify_reaches_a_fixed_point() {
    let sources = [
        "x && true",
        "!!x",
        "!(a <= b)",
        "c ? true : false",
        "c ? x : x",
        "a && b || a && c",
        "x || !x",
        "f() && false",
        "p ^ true ^ q",
    ];
    for source in sources {
        let (mut arena, id) = parse_expression(source).expect("parse");
        let mut simplifier = Simplifier::new(&mut arena);
        let once = simplifier.simplify(id);
        let twice = simplifier.simplify(once);
        assert_eq!(once, twice, "simplify not idempotent on {source}");
    }
}

#[test]
fn simplify_never_drops_an_effect() {
    let kept = [
        // The call must survive even though the value is decided.
        ("f() && false", "f() && false"),
        ("f() || true", "f() || true"),
        ("f() ? true : false", "f()"),
        ("f() || f()", "f() || f()"),
        ("c ? f() : f()", "c ? f() : f()"),
    ];
    for (source, expected) in kept {
        let (mut arena, id) = parse_expression(source).expect("parse");
        let result = Simplifier::new(&mut arena).simplify(id);
        assert_eq!(
            Printer::new(&arena).print_expr(result),
            expected,
            "{source}"
        );
    }
}

#[test]
fn simplified_trees_stay_equivalent_under_reparse() {
    // Printing and reparsing a simplified tree yields the same text:
    // the printer emits minimal parens and the parser accepts them.
    for source in ["a && (b || c)", "!(a >= b)", "x && true && y"] {
        let (mut arena, id) = parse_expression(source).expect("parse");
        let simplified = Simplifier::new(&mut arena).simplify(id);
        let text = Printer::new(&arena).print_expr(simplified);
        let (arena2, reparsed) = parse_expression(&text).expect("reparse");
        assert_eq!(Printer::new(&arena2).print_expr(reparsed), text);
    }
}
