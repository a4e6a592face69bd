//! tendril-sem - Static Validation
//!
//! A single walk over the parsed AST that turns an [`Ast`] into an
//! immutable, reusable [`Program`]. Everything that can fail before a
//! value is ever seen fails here:
//!
//! - label references (`across ^L`) must resolve to a lexically
//!   enclosing `§L`;
//! - bucket names must agree on sigil and scope everywhere they are
//!   used, and must not collide with variable names;
//! - placement rules: no bare `...` in an object body, at most one
//!   `>> ... <<` marker and only in a replaceable position, slice
//!   bindings only inside sequences, map-bucket flows only where a key
//!   context exists;
//! - every guard variable needs at least one binding site in the
//!   pattern;
//! - every regex literal must compile (anchored, with its `i`/`m`/`s`
//!   flags folded in), so no regex error can surface at match time.
//!
//! The walk also performs the trivial normalizations (single-branch
//! alternation, empty or single-item sequences), so the engine only
//! sees canonical shapes.

mod program;
mod validate;

pub use program::{BucketShape, Program};
pub use validate::validate;
