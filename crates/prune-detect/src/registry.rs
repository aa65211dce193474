//! Problem reporting and the rule registry.

use indexmap::IndexMap;
use prune_ast::{Arena, NodeId, Printer};
use tracing::debug;

/// One finding: where, which rule, a human-readable message, and the
/// proposed replacement text when the rule can compute one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    pub node: NodeId,
    pub rule: &'static str,
    pub message: String,
    pub replacement: Option<String>,
}

/// Noise thresholds. These tune what gets reported, never what is sound;
/// every report is behavior-preserving regardless of the settings.
#[derive(Debug, Clone)]
pub struct DetectOptions {
    /// Skip `pushable-*` reports where the differing pair is the entire
    /// branch; pushing would just rebuild the same conditional.
    pub ignore_whole_branch_diffs: bool,
    /// `duplicate-switch-branches` ignores clause bodies shorter than
    /// this many statements.
    pub min_duplicate_case_statements: usize,
}

impl Default for DetectOptions {
    fn default() -> DetectOptions {
        DetectOptions {
            ignore_whole_branch_diffs: true,
            min_duplicate_case_statements: 1,
        }
    }
}

/// Shared state for one detection run over one root.
///
/// The arena is mutable because rules build replacement subtrees by
/// appending nodes; the input tree itself is never modified.
pub struct DetectContext<'a> {
    pub arena: &'a mut Arena,
    pub options: DetectOptions,
    pub root: NodeId,
    problems: Vec<Problem>,
}

impl<'a> DetectContext<'a> {
    pub fn new(arena: &'a mut Arena, root: NodeId, options: DetectOptions) -> DetectContext<'a> {
        DetectContext {
            arena,
            options,
            root,
            problems: Vec::new(),
        }
    }

    pub fn report(
        &mut self,
        node: NodeId,
        rule: &'static str,
        message: impl Into<String>,
        replacement: Option<String>,
    ) {
        let message = message.into();
        debug!(rule, %message, "problem reported");
        self.problems.push(Problem {
            node,
            rule,
            message,
            replacement,
        });
    }

    pub fn print_expr(&self, id: NodeId) -> String {
        Printer::new(self.arena).print_expr(id)
    }

    pub fn print_stmt(&self, id: NodeId) -> String {
        Printer::new(self.arena).print_stmt(id)
    }

    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }
}

/// A detector: walks the context's root and reports what it finds.
pub type Detector = fn(&mut DetectContext);

/// Ordered rule collection. Registration order is execution and report
/// order, so runs are deterministic.
pub struct Registry {
    rules: IndexMap<&'static str, Detector>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry {
            rules: IndexMap::new(),
        }
    }

    /// Every built-in rule, in the order they are documented.
    pub fn with_default_rules() -> Registry {
        let mut registry = Registry::new();
        for (name, rule) in crate::default_rules() {
            registry.register(name, rule);
        }
        registry
    }

    pub fn register(&mut self, name: &'static str, rule: Detector) {
        self.rules.insert(name, rule);
    }

    pub fn rule_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run every rule over `root` and collect the findings.
    pub fn run(&self, arena: &mut Arena, root: NodeId, options: DetectOptions) -> Vec<Problem> {
        let mut ctx = DetectContext::new(arena, root, options);
        for (name, rule) in &self.rules {
            debug!(rule = name, "running detector");
            rule(&mut ctx);
        }
        ctx.problems
    }
}
