//! Tree model for the prune analysis engine.
//!
//! The engine consumes a generic expression/statement tree through this
//! crate:
//! - `Node` - one closed tagged union over expression and statement kinds
//! - `Arena` - append-only node storage addressed by `NodeId`
//! - operator tables (commutativity, negation, precedence)
//! - `Printer` - renders subtrees back to source text for rewrite proposals
//!
//! The arena is never mutated in place: analyses borrow it immutably, and
//! rewrites are expressed as freshly appended nodes, so every outstanding
//! `NodeId` stays valid for the lifetime of the arena.

pub mod arena;
pub mod node;
pub mod ops;
pub mod printer;

pub use arena::Arena;
pub use node::{IncDecOp, Literal, Modifiers, Node, NodeId};
pub use ops::{AssignOp, BinaryOp, UnaryOp};
pub use printer::Printer;
