//! Common types for the prune analysis engine.
//!
//! This crate provides foundational types used across all prune crates:
//! - String interning (`Atom`, `Interner`)
//! - Source spans (`Span`)

pub mod interner;
pub use interner::{Atom, Interner};

pub mod span;
pub use span::Span;
