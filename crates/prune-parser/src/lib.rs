//! Scanner and parser for a small Java-like surface language.
//!
//! The analysis engine consumes trees through `prune-ast` and does not care
//! where they come from; a host IDE supplies its own. This crate exists so
//! tests, examples, and standalone use can build trees from source text:
//! - `ScannerState` - tokenizer
//! - `ParserState` - recursive-descent parser with precedence climbing
//!
//! Parsing also performs lexical name resolution: every variable reference
//! is bound to the local declaration it resolves to, which is what the
//! equivalence checker's alpha-renaming support keys on. Unresolved names
//! parse fine and stay unbound (the analyses treat them conservatively).

pub mod parser;
pub mod scanner;

pub use parser::{ParseError, ParserState, parse_expression, parse_program, parse_statement};
pub use scanner::{ScannerState, Token, TokenKind};
