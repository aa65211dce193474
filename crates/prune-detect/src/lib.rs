//! Pattern detectors for redundant conditionals, booleans, loops, and
//! switches.
//!
//! Each rule is a pure function from a [`DetectContext`] (tree + options)
//! to zero or more [`Problem`]s. Rules only report what the analysis core
//! proves behavior-preserving: equivalence for merges, side-effect purity
//! for deletions, reachability for control-flow claims. A conservative
//! answer from any gate suppresses the report.
//!
//! The [`Registry`] runs rules in registration order, so a run over a
//! fixed tree always yields the same problem list.

pub mod booleans;
pub mod conditionals;
pub mod loops;
pub mod registry;
pub mod switches;
pub mod walk;

pub use registry::{DetectContext, DetectOptions, Detector, Problem, Registry};

/// The built-in rules, in documentation order.
pub fn default_rules() -> Vec<(&'static str, Detector)> {
    vec![
        (
            conditionals::CONSTANT_CONDITIONAL,
            conditionals::constant_conditional as Detector,
        ),
        (
            conditionals::IDENTICAL_IF_BRANCHES,
            conditionals::identical_if_branches,
        ),
        (
            conditionals::IDENTICAL_TERNARY_BRANCHES,
            conditionals::identical_ternary_branches,
        ),
        (conditionals::PUSHABLE_TERNARY, conditionals::pushable_ternary),
        (conditionals::PUSHABLE_IF, conditionals::pushable_if),
        (conditionals::NEGATED_IF, conditionals::negated_if),
        (booleans::DOUBLE_NEGATION, booleans::double_negation),
        (
            booleans::BOOLEAN_LITERAL_COMPARE,
            booleans::boolean_literal_compare,
        ),
        (booleans::POINTLESS_TERNARY, booleans::pointless_ternary),
        (
            booleans::SIMPLIFIABLE_BOOLEAN,
            booleans::simplifiable_boolean,
        ),
        (
            booleans::FACTORIZABLE_BOOLEAN,
            booleans::factorizable_boolean,
        ),
        (booleans::TAUTOLOGY, booleans::tautology),
        (conditionals::CONFUSING_ELSE, conditionals::confusing_else),
        (loops::INFINITE_LOOP, loops::infinite_loop),
        (loops::LOOP_DOESNT_LOOP, loops::loop_doesnt_loop),
        (loops::UNNECESSARY_CONTINUE, loops::unnecessary_continue),
        (
            conditionals::DUPLICATE_CONDITION,
            conditionals::duplicate_condition,
        ),
        (
            switches::DUPLICATE_SWITCH_BRANCHES,
            switches::duplicate_switch_branches,
        ),
    ]
}
