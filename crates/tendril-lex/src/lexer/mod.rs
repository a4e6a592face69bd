//! Lexer module.
//!
//! The implementation is split into focused components:
//! - `core` - main `Lexer` struct, trivia skipping, and dispatch
//! - `ident` - barewords, sigil names, wildcards, labels
//! - `number` - numeric literals
//! - `string` - quoted strings and escapes
//! - `regex` - regex literals, flags, and the division heuristic

mod core;
mod ident;
mod number;
mod regex;
mod string;

pub use core::Lexer;
