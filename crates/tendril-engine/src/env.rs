//! The match environment: four journaled sub-structures.
//!
//! Every choice point takes a [`Snapshot`] (a tuple of journal lengths,
//! O(1)); failure rolls back by popping undo entries until the lengths
//! match (O(changes since snapshot)). Nothing is ever copied wholesale.
//!
//! Four structures carry the interesting invariants - bindings,
//! occurrences, coverage, and buckets - plus the small auxiliary
//! stacks (current-key context, marker positions, deferred guards)
//! that must roll back in lockstep with them.

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use tendril_par::ast::NodeId;
use tendril_util::Symbol;
use tendril_value::Value;

use crate::solution::Occurrence;

/// Bucket accumulation state.
#[derive(Clone, Debug)]
pub(crate) enum BucketState {
    /// `%b`: key -> value pairs in first-pour order.
    Pairs(IndexMap<String, Value>),
    /// `@b`: values in encounter order.
    Items(Vec<Value>),
}

#[derive(Clone, Debug)]
enum CoverOp {
    PushFrame,
    Insert(usize, String),
}

#[derive(Clone, Debug)]
enum KeyOp {
    Push,
    Pop(String),
}

/// Journal lengths at a choice point.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Snapshot {
    bind: usize,
    occ: usize,
    cover: usize,
    bucket: usize,
    key: usize,
    marked: usize,
    deferred: usize,
}

/// Mutable match state, private to one invocation.
#[derive(Debug, Default)]
pub(crate) struct Env {
    bindings: FxHashMap<Symbol, Value>,
    /// Insertion order doubles as the undo journal: bindings are only
    /// ever inserted, never overwritten.
    bind_order: Vec<Symbol>,

    occurrences: FxHashMap<Symbol, Vec<Occurrence>>,
    occ_journal: Vec<Symbol>,

    /// One coverage frame per object-pattern currently being matched.
    cover_frames: Vec<FxHashSet<String>>,
    cover_journal: Vec<CoverOp>,

    buckets: FxHashMap<Symbol, BucketState>,
    /// One entry per successful pour; undo pops the bucket's newest
    /// element.
    bucket_journal: Vec<Symbol>,

    /// Innermost K:V key context, for flows.
    key_stack: Vec<String>,
    key_journal: Vec<KeyOp>,

    /// Positions matched by the replacement marker.
    marked: Vec<Occurrence>,

    /// Guards whose variables were not yet all bound.
    deferred: Vec<NodeId>,
}

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            bind: self.bind_order.len(),
            occ: self.occ_journal.len(),
            cover: self.cover_journal.len(),
            bucket: self.bucket_journal.len(),
            key: self.key_journal.len(),
            marked: self.marked.len(),
            deferred: self.deferred.len(),
        }
    }

    /// Restore every structure to the snapshot.
    pub fn rollback(&mut self, snap: Snapshot) {
        while self.bind_order.len() > snap.bind {
            if let Some(sym) = self.bind_order.pop() {
                self.bindings.remove(&sym);
            }
        }
        self.rollback_occurrences(snap.occ);
        while self.cover_journal.len() > snap.cover {
            match self.cover_journal.pop() {
                Some(CoverOp::PushFrame) => {
                    self.cover_frames.pop();
                }
                Some(CoverOp::Insert(frame, key)) => {
                    if let Some(set) = self.cover_frames.get_mut(frame) {
                        set.remove(&key);
                    }
                }
                None => break,
            }
        }
        while self.bucket_journal.len() > snap.bucket {
            if let Some(sym) = self.bucket_journal.pop() {
                match self.buckets.get_mut(&sym) {
                    Some(BucketState::Pairs(pairs)) => {
                        pairs.pop();
                    }
                    Some(BucketState::Items(items)) => {
                        items.pop();
                    }
                    None => {}
                }
            }
        }
        self.rollback_keys(snap.key);
        self.marked.truncate(snap.marked);
        self.deferred.truncate(snap.deferred);
    }

    /// Roll back only the entry-local structures (bindings,
    /// occurrences, key context, deferred guards), keeping coverage,
    /// buckets, and marker positions. Used between the iterations of an
    /// `each`, whose per-key bindings do not leak but whose bucket
    /// pours do.
    pub fn rollback_scoped(&mut self, snap: Snapshot) {
        while self.bind_order.len() > snap.bind {
            if let Some(sym) = self.bind_order.pop() {
                self.bindings.remove(&sym);
            }
        }
        self.rollback_occurrences(snap.occ);
        self.rollback_keys(snap.key);
        self.deferred.truncate(snap.deferred);
    }

    fn rollback_occurrences(&mut self, to: usize) {
        while self.occ_journal.len() > to {
            if let Some(sym) = self.occ_journal.pop() {
                if let Some(list) = self.occurrences.get_mut(&sym) {
                    list.pop();
                }
            }
        }
    }

    fn rollback_keys(&mut self, to: usize) {
        while self.key_journal.len() > to {
            match self.key_journal.pop() {
                Some(KeyOp::Push) => {
                    self.key_stack.pop();
                }
                Some(KeyOp::Pop(key)) => {
                    self.key_stack.push(key);
                }
                None => break,
            }
        }
    }

    // -- bindings ---------------------------------------------------------

    pub fn get(&self, sym: Symbol) -> Option<&Value> {
        self.bindings.get(&sym)
    }

    /// Bind if unbound, unify by value equality if bound. Records the
    /// occurrence on success.
    pub fn bind_or_unify(&mut self, sym: Symbol, value: &Value, occ: Occurrence) -> bool {
        match self.bindings.get(&sym) {
            Some(bound) => {
                if bound != value {
                    return false;
                }
            }
            None => {
                self.bindings.insert(sym, value.clone());
                self.bind_order.push(sym);
            }
        }
        self.record_occurrence(sym, occ);
        true
    }

    pub fn record_occurrence(&mut self, sym: Symbol, occ: Occurrence) {
        self.occurrences.entry(sym).or_default().push(occ);
        self.occ_journal.push(sym);
    }

    /// Symbols in first-binding order.
    pub fn bound_symbols(&self) -> impl Iterator<Item = Symbol> + '_ {
        let mut seen = FxHashSet::default();
        self.bind_order
            .iter()
            .copied()
            .filter(move |sym| seen.insert(*sym))
    }

    pub fn occurrences_of(&self, sym: Symbol) -> &[Occurrence] {
        self.occurrences
            .get(&sym)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    // -- coverage ---------------------------------------------------------

    /// Open a coverage frame for one object pattern, returning its
    /// index. Frames are addressed by index rather than "innermost":
    /// a nested object's frame stays open while the outer object's
    /// remaining entries run in the continuation.
    pub fn push_cover_frame(&mut self) -> usize {
        self.cover_frames.push(FxHashSet::default());
        self.cover_journal.push(CoverOp::PushFrame);
        self.cover_frames.len() - 1
    }

    /// Add a key to the given coverage frame.
    pub fn cover(&mut self, frame: usize, key: &str) {
        let Some(set) = self.cover_frames.get_mut(frame) else {
            return;
        };
        if set.insert(key.to_string()) {
            self.cover_journal.push(CoverOp::Insert(frame, key.to_string()));
        }
    }

    pub fn is_covered(&self, frame: usize, key: &str) -> bool {
        self.cover_frames
            .get(frame)
            .is_some_and(|set| set.contains(key))
    }

    // -- buckets ----------------------------------------------------------

    /// Pour a key/value pair into a `%` bucket. Same key with the same
    /// value is idempotent; same key with a different value is a
    /// conflict.
    pub fn pour_pair(&mut self, sym: Symbol, key: &str, value: &Value) -> bool {
        let state = self
            .buckets
            .entry(sym)
            .or_insert_with(|| BucketState::Pairs(IndexMap::new()));
        let BucketState::Pairs(pairs) = state else {
            return false;
        };
        match pairs.get(key) {
            Some(existing) => existing == value,
            None => {
                pairs.insert(key.to_string(), value.clone());
                self.bucket_journal.push(sym);
                true
            }
        }
    }

    /// Pour a value into an `@` bucket, appending in encounter order.
    pub fn pour_item(&mut self, sym: Symbol, value: &Value) {
        let state = self
            .buckets
            .entry(sym)
            .or_insert_with(|| BucketState::Items(Vec::new()));
        if let BucketState::Items(items) = state {
            items.push(value.clone());
            self.bucket_journal.push(sym);
        }
    }

    pub fn bucket(&self, sym: Symbol) -> Option<&BucketState> {
        self.buckets.get(&sym)
    }

    // -- key context ------------------------------------------------------

    pub fn push_key(&mut self, key: &str) {
        self.key_stack.push(key.to_string());
        self.key_journal.push(KeyOp::Push);
    }

    pub fn pop_key(&mut self) {
        if let Some(key) = self.key_stack.pop() {
            self.key_journal.push(KeyOp::Pop(key));
        }
    }

    pub fn current_key(&self) -> Option<&str> {
        self.key_stack.last().map(|s| s.as_str())
    }

    // -- markers and deferred guards --------------------------------------

    pub fn push_marked(&mut self, occ: Occurrence) {
        self.marked.push(occ);
    }

    pub fn marked(&self) -> &[Occurrence] {
        &self.marked
    }

    pub fn push_deferred(&mut self, guard: NodeId) {
        self.deferred.push(guard);
    }

    pub fn deferred(&self) -> &[NodeId] {
        &self.deferred
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solution::OccKind;
    use tendril_util::Interner;

    fn occ() -> Occurrence {
        Occurrence {
            path: vec![],
            kind: OccKind::Node,
        }
    }

    #[test]
    fn test_bind_unify_and_rollback() {
        let mut interner = Interner::new();
        let x = interner.intern("x");
        let mut env = Env::new();

        let snap = env.snapshot();
        assert!(env.bind_or_unify(x, &Value::from(1i64), occ()));
        assert!(env.bind_or_unify(x, &Value::from(1i64), occ()));
        assert!(!env.bind_or_unify(x, &Value::from(2i64), occ()));
        assert_eq!(env.occurrences_of(x).len(), 2);

        env.rollback(snap);
        assert!(env.get(x).is_none());
        assert!(env.occurrences_of(x).is_empty());
    }

    #[test]
    fn test_coverage_rollback() {
        let mut env = Env::new();
        let snap = env.snapshot();
        let frame = env.push_cover_frame();
        env.cover(frame, "a");
        assert!(env.is_covered(frame, "a"));
        env.rollback(snap);
        assert!(!env.is_covered(frame, "a"));
    }

    #[test]
    fn test_bucket_pour_and_conflict() {
        let mut interner = Interner::new();
        let b = interner.intern("b");
        let mut env = Env::new();

        assert!(env.pour_pair(b, "k", &Value::from(1i64)));
        // Same key, same value: idempotent.
        assert!(env.pour_pair(b, "k", &Value::from(1i64)));
        // Same key, different value: conflict.
        assert!(!env.pour_pair(b, "k", &Value::from(2i64)));

        let Some(BucketState::Pairs(pairs)) = env.bucket(b) else {
            panic!("expected pair bucket");
        };
        assert_eq!(pairs.len(), 1);
    }

    #[test]
    fn test_bucket_rollback_removes_ghost_entries() {
        let mut interner = Interner::new();
        let b = interner.intern("b");
        let mut env = Env::new();

        env.pour_item(b, &Value::from(1i64));
        let snap = env.snapshot();
        env.pour_item(b, &Value::from(2i64));
        env.pour_item(b, &Value::from(3i64));
        env.rollback(snap);

        let Some(BucketState::Items(items)) = env.bucket(b) else {
            panic!("expected item bucket");
        };
        assert_eq!(items, &vec![Value::from(1i64)]);
    }

    #[test]
    fn test_scoped_rollback_keeps_buckets_and_coverage() {
        let mut interner = Interner::new();
        let x = interner.intern("x");
        let b = interner.intern("b");
        let mut env = Env::new();
        let frame = env.push_cover_frame();

        let snap = env.snapshot();
        env.bind_or_unify(x, &Value::from(1i64), occ());
        env.cover(frame, "a");
        env.pour_item(b, &Value::from(1i64));
        env.rollback_scoped(snap);

        assert!(env.get(x).is_none(), "bindings roll back");
        assert!(env.is_covered(frame, "a"), "coverage persists");
        assert!(
            matches!(env.bucket(b), Some(BucketState::Items(items)) if items.len() == 1),
            "buckets persist"
        );
    }

    #[test]
    fn test_key_stack_rollback() {
        let mut env = Env::new();
        let snap = env.snapshot();
        env.push_key("a");
        env.push_key("b");
        env.pop_key();
        assert_eq!(env.current_key(), Some("a"));
        env.rollback(snap);
        assert_eq!(env.current_key(), None);
    }
}
