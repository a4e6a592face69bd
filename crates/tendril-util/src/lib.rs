//! tendril-util - Core Utilities and Foundation Types
//!
//! This crate provides the fundamental types shared by every stage of the
//! Tendril pattern pipeline:
//!
//! - [`Span`] - byte ranges into the pattern source, attached to tokens,
//!   AST nodes, and errors
//! - [`CompileError`] / [`MatchError`] / [`EditError`] - the structured
//!   error taxonomy of the engine
//! - [`Symbol`] / [`Interner`] - compact handles for variable, bucket, and
//!   label names
//! - [`IndexVec`] - a vector indexed by a typed id, used as the AST arena
//!
//! Everything here is a leaf: no dependency on any other Tendril crate.

pub mod error;
pub mod index_vec;
pub mod span;
pub mod symbol;

pub use error::{CompileError, CompileErrorKind, EditError, MatchError};
pub use index_vec::{Idx, IndexVec};
pub use span::Span;
pub use symbol::{Interner, Symbol};
