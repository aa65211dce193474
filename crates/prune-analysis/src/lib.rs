//! Semantic analysis core for the prune engine.
//!
//! Four analyses, each a pure function of the input tree:
//! - `equivalence` - structural equivalence with alpha-renaming of locals
//!   and partial-match diff extraction
//! - `side_effects` - may an expression mutate state, throw, or otherwise
//!   be order-sensitive
//! - `reachability` - can a statement complete normally (fall through)
//! - `simplify` - boolean constant evaluation and algebraic simplification
//!
//! Uncertainty is always a value, never an error: unresolved references,
//! malformed subtrees, and unmodeled patterns degrade to the conservative
//! answer (`ExactMismatch`, "may have side effects", "may complete
//! normally", `Unknown`). Nothing in this crate panics on engine paths and
//! nothing is logged except `tracing` debug events.

pub mod bool_eval;
pub mod equivalence;
pub mod reachability;
pub mod side_effects;
pub mod simplify;

pub use bool_eval::{BooleanValue, evaluate_if_constant};
pub use equivalence::{EquivalenceChecker, EquivalenceContext, MatchResult};
pub use reachability::{CompletionFacts, ReachabilityAnalyzer};
pub use side_effects::SideEffectChecker;
pub use simplify::{Simplifier, is_boolean_shaped};
