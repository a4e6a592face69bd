//! Core error types for the Tendril pipeline.
//!
//! Three disjoint error families, mirroring the phase that raises them:
//!
//! - [`CompileError`] - hard failures from tokenizing, parsing, or
//!   validating a pattern. Aborts the whole `compile` call.
//! - [`MatchError`] - the only hard match-time failure: the configured
//!   step budget was exhausted. Surfaces as a terminal record on the
//!   solution stream, never as a panic.
//! - [`EditError`] - hard failures while applying an edit plan.
//!
//! Every soft failure (value mismatch, unification failure, guard
//! falsity, coverage violation, bucket collision) triggers backtracking
//! inside the engine and is never represented as an error value.

use crate::span::Span;
use thiserror::Error;

/// Which compilation phase rejected the pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompileErrorKind {
    /// Tokenizer failure (bad character, unterminated literal, bad flag).
    Token,
    /// Grammar violation found by the parser.
    Parse,
    /// Static check failure (labels, buckets, placement, regex).
    Validate,
    /// Malformed guard expression.
    Guard,
}

impl std::fmt::Display for CompileErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompileErrorKind::Token => write!(f, "token error"),
            CompileErrorKind::Parse => write!(f, "parse error"),
            CompileErrorKind::Validate => write!(f, "validate error"),
            CompileErrorKind::Guard => write!(f, "guard error"),
        }
    }
}

/// A structured compile-time error with a source span.
///
/// # Examples
///
/// ```
/// use tendril_util::{CompileError, CompileErrorKind, Span};
///
/// let err = CompileError::token(Span::new(3, 4), "unexpected character '~'");
/// assert_eq!(err.kind, CompileErrorKind::Token);
/// assert!(err.to_string().contains("3..4"));
/// ```
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{kind} at {span}: {message}")]
pub struct CompileError {
    /// The phase that raised the error.
    pub kind: CompileErrorKind,
    /// Source location of the offending text.
    pub span: Span,
    /// Human-readable description.
    pub message: String,
}

impl CompileError {
    /// Create a tokenizer error.
    pub fn token(span: Span, message: impl Into<String>) -> Self {
        Self {
            kind: CompileErrorKind::Token,
            span,
            message: message.into(),
        }
    }

    /// Create a parser error.
    pub fn parse(span: Span, message: impl Into<String>) -> Self {
        Self {
            kind: CompileErrorKind::Parse,
            span,
            message: message.into(),
        }
    }

    /// Create a validator error.
    pub fn validate(span: Span, message: impl Into<String>) -> Self {
        Self {
            kind: CompileErrorKind::Validate,
            span,
            message: message.into(),
        }
    }

    /// Create a guard-expression error.
    pub fn guard(span: Span, message: impl Into<String>) -> Self {
        Self {
            kind: CompileErrorKind::Guard,
            span,
            message: message.into(),
        }
    }
}

/// Hard match-time error. The engine aborts the current enumeration and
/// attaches this as the stream's terminal record.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MatchError {
    /// The configured step budget was exhausted before enumeration
    /// finished.
    #[error("step budget exhausted after {steps} steps")]
    StepBudgetExceeded { steps: u64 },
}

/// Hard edit-time error raised while applying an edit plan.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EditError {
    /// A slice binding was given a replacement that is not a sequence.
    #[error("cannot splice non-sequence value into array slice binding `{name}`")]
    SpliceShape { name: String },

    /// A keys binding was given a replacement that is not a mapping.
    #[error("cannot splice non-mapping value into residual binding `{name}`")]
    SpliceKeysShape { name: String },

    /// A key-position binding was given a non-string replacement.
    #[error("cannot rename a key with a non-string value (binding `{name}`)")]
    RenameShape { name: String },

    /// Two edits target the same site with different values.
    #[error("conflicting replacements at the same position (binding `{name}`)")]
    Conflict { name: String },
}

/// Result alias for compile-phase operations.
pub type CompileResult<T> = std::result::Result<T, CompileError>;
