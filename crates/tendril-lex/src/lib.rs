//! tendril-lex - Pattern Tokenizer
//!
//! Transforms pattern source text into a stream of [`Token`]s. The
//! lexer is a single forward pass with one token of retrospection: the
//! previously emitted token settles the two context-sensitive points of
//! the surface syntax,
//!
//! - **regex vs. division**: after a value-like token (number, string,
//!   identifier, variable, `)`, `]`, `}`) a bare `/` is the division
//!   operator; anywhere else it opens a regex literal;
//! - **case-insensitive suffix**: an identifier or string immediately
//!   followed by `/i` is rewritten into a single pre-lowered
//!   case-insensitive literal token.
//!
//! Errors are hard: `tokenize` returns the first [`CompileError`] with
//! its byte offset and produces no partial token stream.

pub mod cursor;
mod lexer;
#[cfg(test)]
mod tests;
pub mod token;

pub use cursor::Cursor;
pub use lexer::Lexer;
pub use token::{Token, TokenKind, TypeTag};

use tendril_util::error::CompileResult;

/// Tokenize a pattern source string.
pub fn tokenize(source: &str) -> CompileResult<Vec<Token>> {
    Lexer::new(source).tokenize()
}
