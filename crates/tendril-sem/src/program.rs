//! The validated, immutable program.

use regex::Regex;
use rustc_hash::FxHashMap;
use tendril_par::ast::{BucketSigil, Node, NodeId};
use tendril_util::{IndexVec, Interner, Symbol};

/// Shape and declaration order of a bucket, for deterministic
/// materialization into solution bindings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BucketShape {
    pub name: Symbol,
    pub sigil: BucketSigil,
}

/// A compiled, validated pattern.
///
/// Immutable after validation; may be shared across callers. Each match
/// invocation builds its own environment, so a `Program` carries no
/// per-run state.
#[derive(Debug)]
pub struct Program {
    /// The normalized node arena.
    pub nodes: IndexVec<NodeId, Node>,
    /// Root node of the pattern.
    pub root: NodeId,
    /// Names interned at parse time.
    pub interner: Interner,
    /// Pre-compiled, fully-anchored regexes, one per regex node.
    pub regexes: FxHashMap<NodeId, Regex>,
    /// Buckets in declaration order.
    pub buckets: Vec<BucketShape>,
    /// The `>> ... <<` target, if the pattern has one.
    pub marker: Option<NodeId>,
    /// The reserved `$0` whole-match binding.
    pub sym_root: Symbol,
}

impl Program {
    /// Resolve a symbol back to its source name.
    pub fn name(&self, sym: Symbol) -> &str {
        self.interner.resolve(sym)
    }

    /// The compiled regex for a regex node.
    ///
    /// Validation guarantees every regex node has an entry.
    pub fn regex(&self, id: NodeId) -> Option<&Regex> {
        self.regexes.get(&id)
    }
}
