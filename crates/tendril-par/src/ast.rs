//! AST node definitions.
//!
//! Nodes live in an arena ([`IndexVec`]) and reference each other by
//! [`NodeId`]; solutions and the validator traverse ids, never
//! pointers. Every node carries the span of the source text it was
//! parsed from.

use tendril_lex::TypeTag;
use tendril_util::{Idx, IndexVec, Span, Symbol};

/// Index of a node in the pattern arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl Idx for NodeId {
    fn from_usize(idx: usize) -> Self {
        NodeId(idx as u32)
    }
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// The parsed (not yet validated) pattern: arena plus root.
#[derive(Clone, Debug)]
pub struct Ast {
    pub nodes: IndexVec<NodeId, Node>,
    pub root: NodeId,
    pub interner: tendril_util::Interner,
}

/// One pattern node.
#[derive(Clone, Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

/// Atomic literal payload.
#[derive(Clone, Debug, PartialEq)]
pub enum Lit {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
}

/// Uncompiled regex literal; the validator compiles it.
#[derive(Clone, Debug, PartialEq)]
pub struct RegexLit {
    pub pattern: String,
    pub ignore_case: bool,
    pub multi_line: bool,
    pub dot_all: bool,
}

/// Repetition flavor of a quantifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuantMode {
    /// Longest match first (default).
    Greedy,
    /// Shortest match first (`*?`).
    Lazy,
    /// Longest match, no backtracking into the repetition (`*+`).
    Possessive,
}

/// Which sigil a binding uses; the sigil is part of the name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindSigil {
    /// `$x` - exactly one value.
    Scalar,
    /// `@x` - a contiguous run of an ordered sequence.
    Seq,
    /// `%x` - a submapping.
    Map,
}

/// Bucket shape: `%b` collects pairs, `@b` collects values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BucketSigil {
    Map,
    Seq,
}

/// A reference to a bucket from a flow or collecting clause.
#[derive(Clone, Debug)]
pub struct BucketRef {
    pub sigil: BucketSigil,
    pub name: Symbol,
    /// Explicit `across ^L` scope qualifier.
    pub across: Option<Symbol>,
    pub span: Span,
}

/// Node kinds, dispatched on by the validator and the match engine.
#[derive(Clone, Debug)]
pub enum NodeKind {
    Literal(Lit),
    /// Pre-lowered case-insensitive literal.
    CaseInsensitive(String),
    Regex(RegexLit),
    Wildcard,
    TypedWildcard(TypeTag),
    /// Scalar variable reference `$x`.
    Var(Symbol),
    /// `$x=(P)`, `(P as $x)`, `(P as @x)`, `(P as %x)`.
    Bind {
        inner: NodeId,
        sigil: BindSigil,
        name: Symbol,
    },
    /// `[ ... ]`; the body is a `Seq`, `Alt` of `Seq`s, or `Else`.
    Array(NodeId),
    /// A run of items inside an array or group.
    Seq(Vec<NodeId>),
    /// `{ ... }`.
    Object(ObjBody),
    /// `{{ ... }}`; `open` when a `...` residual is present.
    Set { items: Vec<NodeId>, open: bool },
    /// Inclusive alternation `A | B | C`.
    Alt(Vec<NodeId>),
    /// Prioritized choice `A else B` (right-associative).
    Else { primary: NodeId, fallback: NodeId },
    /// Quantified item.
    Quant {
        inner: NodeId,
        min: u32,
        max: Option<u32>,
        mode: QuantMode,
    },
    /// `(?P)` / `(!P)` zero-width assertion.
    Lookahead { inner: NodeId, negative: bool },
    /// `...` inside a sequence (equivalent to `_*`).
    Spread,
    /// `P -> %b` / `P -> @b`: match `P`, then pour into the bucket.
    Flow { inner: NodeId, bucket: BucketRef },
    /// `§L P`: labels a container for `across ^L` references.
    Label { name: Symbol, inner: NodeId },
    /// `(P where E)`.
    Guard {
        inner: NodeId,
        expr: Box<GuardExpr>,
    },
    /// `>> P <<` replacement target.
    Marker { inner: NodeId },
    /// The empty sequence.
    Epsilon,
}

/// Body of an object pattern: entries in textual order plus at most one
/// trailing residual.
#[derive(Clone, Debug)]
pub struct ObjBody {
    pub entries: Vec<ObjEntry>,
    pub residual: Option<ResidualEntry>,
}

#[derive(Clone, Debug)]
pub struct ObjEntry {
    pub kind: ObjEntryKind,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub enum ObjEntryKind {
    /// `K : V`, `each K : V`, optionally `?`-suffixed.
    Assert {
        key: KeyPattern,
        value: NodeId,
        each: bool,
        optional: bool,
    },
    /// `(!K : V)` - no key may match both.
    NotAssert { key: KeyPattern, value: NodeId },
    /// `-> %b` / `-> @b` standalone flow clause.
    FlowClause(BucketRef),
    /// `<collecting $k:$v in %b across ^L>` (or value-only with `@b`).
    Collecting {
        key: Option<Symbol>,
        value: Symbol,
        bucket: BucketRef,
    },
    /// Bare `...` - always rejected by the validator, kept so the error
    /// can point at it.
    Spread,
}

/// A key position: a single key pattern or a dotted path.
#[derive(Clone, Debug)]
pub enum KeyPattern {
    Node(NodeId),
    Path(Vec<PathSeg>),
}

/// One step of a dotted path. `deep` marks a `..` segment: descend any
/// number of levels to a mapping holding this key.
#[derive(Clone, Debug)]
pub struct PathSeg {
    pub deep: bool,
    pub key: String,
    pub span: Span,
}

/// The `%` family at the end of an object body.
///
/// `%` is `{1, unbounded}`, `%?` is `{0, unbounded}`, `%#{m,n}` is the
/// explicit range, and `(!%)` is `{0, 0}`.
#[derive(Clone, Debug)]
pub struct ResidualEntry {
    pub min: u32,
    pub max: Option<u32>,
    pub bind: Option<Symbol>,
    pub span: Span,
}

/// Guard expression tree (`(P where E)`).
#[derive(Clone, Debug)]
pub enum GuardExpr {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Var { name: Symbol, span: Span },
    Unary {
        op: GuardUnOp,
        expr: Box<GuardExpr>,
    },
    Binary {
        op: GuardBinOp,
        lhs: Box<GuardExpr>,
        rhs: Box<GuardExpr>,
    },
    Call {
        func: GuardFn,
        arg: Box<GuardExpr>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardUnOp {
    Not,
    Neg,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardBinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

/// Guard built-ins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardFn {
    Size,
    Number,
    String,
    Boolean,
}

impl GuardFn {
    pub fn from_name(name: &str) -> Option<GuardFn> {
        match name {
            "size" => Some(GuardFn::Size),
            "number" => Some(GuardFn::Number),
            "string" => Some(GuardFn::String),
            "boolean" => Some(GuardFn::Boolean),
            _ => None,
        }
    }
}
