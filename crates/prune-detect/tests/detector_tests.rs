//! One positive and one negative source snippet per rule, run through the
//! full registry.

use prune_detect::{DetectOptions, Problem, Registry};
use prune_parser::parse_program;

fn problems_for(source: &str) -> Vec<Problem> {
    static TRACING: std::sync::Once = std::sync::Once::new();
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
    let (mut arena, stmts) = parse_program(source).expect("parse");
    let root = if stmts.len() == 1 {
        stmts[0]
    } else {
        arena.add_block(stmts)
    };
    Registry::with_default_rules().run(&mut arena, root, DetectOptions::default())
}

/// Run the registry over replacement text, which may be statement- or
/// expression-shaped depending on the rule that produced it.
fn problems_for_fragment(text: &str) -> Vec<Problem> {
    if let Ok((mut arena, id)) = prune_parser::parse_expression(text) {
        let root = arena.add_expr_stmt(id);
        return Registry::with_default_rules().run(&mut arena, root, DetectOptions::default());
    }
    problems_for(text)
}

fn assert_fires(source: &str, rule: &str) -> Problem {
    let problems = problems_for(source);
    problems
        .iter()
        .find(|p| p.rule == rule)
        .unwrap_or_else(|| panic!("expected {rule} on {source:?}, got {problems:?}"))
        .clone()
}

fn assert_quiet(source: &str, rule: &str) {
    let problems = problems_for(source);
    assert!(
        problems.iter().all(|p| p.rule != rule),
        "unexpected {rule} on {source:?}: {problems:?}"
    );
}

#[test]
fn registry_has_every_rule_once() {
    let registry = Registry::with_default_rules();
    assert_eq!(registry.len(), 18);
    let names: Vec<_> = registry.rule_names().collect();
    let mut deduped = names.clone();
    deduped.dedup();
    assert_eq!(names, deduped);
}

#[test]
fn constant_conditional() {
    assert_fires("if (true) { f(); }", "constant-conditional");
    assert_fires("if (x && false) { f(); }", "constant-conditional");
    assert_quiet("if (c) { f(); }", "constant-conditional");
}

#[test]
fn identical_if_branches() {
    let problem = assert_fires("if (c) { f(); } else { f(); }", "identical-if-branches");
    assert!(problem.replacement.is_some());
    // An effectful condition blocks the collapse.
    assert_quiet("if (g()) { f(); } else { f(); }", "identical-if-branches");
    assert_quiet("if (c) { f(); } else { h(); }", "identical-if-branches");
}

#[test]
fn identical_ternary_branches() {
    let problem = assert_fires("x = c ? a : a;", "identical-ternary-branches");
    assert_eq!(problem.replacement.as_deref(), Some("a"));
    assert_quiet("x = c ? a : b;", "identical-ternary-branches");
}

#[test]
fn pushable_ternary() {
    let problem = assert_fires("x = c ? f(a, 1) : f(a, 2);", "pushable-ternary");
    assert_eq!(problem.replacement.as_deref(), Some("f(a, c ? 1 : 2)"));
    // Branches that differ entirely are just a ternary, not a pushable one.
    assert_quiet("x = c ? a : b;", "pushable-ternary");
    // Effectful condition: pushing would move its evaluation.
    assert_quiet("x = g() ? f(a, 1) : f(a, 2);", "pushable-ternary");
}

#[test]
fn pushable_if() {
    let problem = assert_fires(
        "if (c) { return f(1); } else { return f(2); }",
        "pushable-if",
    );
    assert_eq!(problem.replacement.as_deref(), Some("return f(c ? 1 : 2);"));
    // The diff can sit inside a declaration initializer.
    let problem = assert_fires(
        "if (c) { int x = f(1); } else { int x = f(2); }",
        "pushable-if",
    );
    assert_eq!(problem.replacement.as_deref(), Some("int x = f(c ? 1 : 2);"));
    assert_quiet("if (c) { return a; } else { return b; }", "pushable-if");
    assert_quiet(
        "if (c) { f(); g(); } else { f(); h(); }",
        "pushable-if",
    );
}

#[test]
fn negated_if() {
    let problem = assert_fires("if (!c) { f(); } else { g(); }", "negated-if");
    assert_eq!(
        problem.replacement.as_deref(),
        Some("if (c) {\n    g();\n} else {\n    f();\n}")
    );
    assert_quiet("if (!c) { f(); }", "negated-if");
    // Swapping in front of an else-if chain would bury the chain.
    assert_quiet(
        "if (!c) { f(); } else if (d) { g(); }",
        "negated-if",
    );
}

#[test]
fn double_negation() {
    let problem = assert_fires("x = !!y;", "double-negation");
    assert_eq!(problem.replacement.as_deref(), Some("y"));
    let problem = assert_fires("x = !(a != b);", "double-negation");
    assert_eq!(problem.replacement.as_deref(), Some("a == b"));
    assert_quiet("x = !y;", "double-negation");
}

#[test]
fn boolean_literal_compare() {
    assert_fires(
        "boolean flag = g(); if (flag == true) { f(); }",
        "boolean-literal-compare",
    );
    let problem = assert_fires("if ((a < b) != false) { f(); }", "boolean-literal-compare");
    assert_eq!(problem.replacement.as_deref(), Some("a < b"));
    // Not provably boolean; `==` may mean something else for this type.
    assert_quiet("if (x == true) { f(); }", "boolean-literal-compare");
}

#[test]
fn pointless_ternary() {
    let problem = assert_fires("x = c ? true : false;", "pointless-ternary");
    assert_eq!(problem.replacement.as_deref(), Some("c"));
    let problem = assert_fires("x = c ? false : true;", "pointless-ternary");
    assert_eq!(problem.replacement.as_deref(), Some("!c"));
    assert_quiet("x = c ? a : b;", "pointless-ternary");
}

#[test]
fn simplifiable_boolean() {
    let problem = assert_fires("if (a && true) { f(); }", "simplifiable-boolean");
    assert_eq!(problem.replacement.as_deref(), Some("a"));
    assert_quiet("if (a && b) { f(); }", "simplifiable-boolean");
}

#[test]
fn factorizable_boolean() {
    let problem = assert_fires("if (a && b || a && c) { f(); }", "factorizable-boolean");
    assert_eq!(problem.replacement.as_deref(), Some("a && (b || c)"));
    // The common factor is effectful; extraction would change how often
    // it runs.
    assert_quiet("if (g() && b || g() && c) { f(); }", "factorizable-boolean");
    assert_quiet("if (a && b || d && c) { f(); }", "factorizable-boolean");
}

#[test]
fn tautology() {
    assert_fires("if (x || !x) { f(); }", "tautology");
    assert_fires("if (x && x) { f(); }", "tautology");
    // Dropping a duplicate would drop a call.
    assert_quiet("if (g() || g()) { f(); }", "tautology");
    assert_quiet("if (x || y) { f(); }", "tautology");
}

#[test]
fn confusing_else() {
    assert_fires("if (c) { return; } else { f(); }", "confusing-else");
    assert_fires("if (c) { throw e; } else { f(); }", "confusing-else");
    assert_quiet("if (c) { f(); } else { g(); }", "confusing-else");
    // Chains are left alone.
    assert_quiet(
        "if (c) { return; } else if (d) { f(); }",
        "confusing-else",
    );
}

#[test]
fn infinite_loop() {
    assert_fires("while (true) { f(); }", "infinite-loop");
    assert_quiet("while (true) { if (c) break; }", "infinite-loop");
    assert_quiet("while (true) { if (c) return; }", "infinite-loop");
    assert_quiet("while (c) { f(); }", "infinite-loop");
}

#[test]
fn loop_doesnt_loop() {
    assert_fires("while (c) { return; }", "loop-doesnt-loop");
    assert_fires("for (int i = 0; i < n; i++) { break; }", "loop-doesnt-loop");
    assert_quiet("while (c) { f(); }", "loop-doesnt-loop");
    assert_quiet("while (c) { if (x) continue; return; }", "loop-doesnt-loop");
}

#[test]
fn unnecessary_continue() {
    assert_fires("while (c) { f(); continue; }", "unnecessary-continue");
    assert_quiet("while (c) { if (x) continue; f(); }", "unnecessary-continue");
}

#[test]
fn duplicate_condition() {
    assert_fires(
        "if (a) { f(); } else if (b) { g(); } else if (a) { h(); }",
        "duplicate-condition",
    );
    assert_quiet(
        "if (a) { f(); } else if (b) { g(); } else if (c) { h(); }",
        "duplicate-condition",
    );
    // Effectful conditions may change between evaluations.
    assert_quiet(
        "if (next()) { f(); } else if (next()) { g(); }",
        "duplicate-condition",
    );
}

#[test]
fn duplicate_switch_branches() {
    assert_fires(
        "switch (x) { case 1: f(); break; case 2: f(); break; }",
        "duplicate-switch-branches",
    );
    assert_quiet(
        "switch (x) { case 1: f(); break; case 2: g(); break; }",
        "duplicate-switch-branches",
    );
    // Grouped labels share one clause; nothing duplicated.
    assert_quiet(
        "switch (x) { case 1: case 2: f(); break; }",
        "duplicate-switch-branches",
    );
}

#[test]
fn replacements_do_not_retrigger_their_rule() {
    let sources = [
        "if (c) { f(); } else { f(); }",
        "x = c ? a : a;",
        "x = c ? f(a, 1) : f(a, 2);",
        "if (c) { return f(1); } else { return f(2); }",
        "if (c) { int x = f(1); } else { int x = f(2); }",
        "if (!c) { f(); } else { g(); }",
        "x = !!y;",
        "x = !(a != b);",
        "if ((a < b) != false) { f(); }",
        "x = c ? true : false;",
        "x = c ? false : true;",
        "if (a && true) { f(); }",
        "if (a && b || a && c) { f(); }",
    ];
    let mut checked = 0;
    for source in sources {
        for problem in problems_for(source) {
            let Some(replacement) = &problem.replacement else {
                continue;
            };
            let again = problems_for_fragment(replacement);
            assert!(
                again.iter().all(|p| p.rule != problem.rule),
                "replacement {replacement:?} for {source:?} re-triggers {}",
                problem.rule
            );
            checked += 1;
        }
    }
    assert!(checked >= sources.len());
}

#[test]
fn runs_are_deterministic() {
    let source = "if (a && true) { f(); } else { f(); } while (true) { g(); }";
    let first = problems_for(source);
    let second = problems_for(source);
    assert_eq!(first, second);
    assert!(!first.is_empty());
}
