//! Solutions and occurrence records.

use indexmap::IndexMap;
use tendril_value::{Path, Value};

/// Where a binding was witnessed, relative to the match root.
///
/// Paths reference the original input by position, never by pointer, so
/// solutions outlive the match and the edit driver can rebuild the
/// spine from the root.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum OccKind {
    /// The value at `path` itself (scalar bindings, `$0`).
    Node,
    /// A contiguous run of the array at `path` (slice bindings).
    Slice { start: usize, end: usize },
    /// A submapping of the object at `path` (residual bindings).
    Keys { keys: Vec<String> },
    /// The key string `key` of the object at `path` (key-position
    /// bindings; editing one renames the key).
    KeyOf { key: String },
}

/// One recorded witness position.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Occurrence {
    /// Path of the container (or of the node itself for `Node`).
    pub path: Path,
    pub kind: OccKind,
}

/// A successful match: bindings plus the positions they were witnessed
/// at.
///
/// Binding order is deterministic: `$0` first, then variables in
/// first-binding order, then buckets in declaration order.
#[derive(Clone, Debug, PartialEq)]
pub struct Solution {
    pub bindings: IndexMap<String, Value>,
    pub occurrences: IndexMap<String, Vec<Occurrence>>,
    /// Positions matched by the `>> ... <<` marker, if the pattern has
    /// one.
    pub marked: Vec<Occurrence>,
}

impl Solution {
    /// Look up a binding by bare name (no sigil).
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    /// The whole matched subject (`$0`).
    pub fn whole(&self) -> Option<&Value> {
        self.bindings.get("0")
    }
}

/// A solution found by the scanner, tagged with the root-relative path
/// of the position it matched at.
#[derive(Clone, Debug, PartialEq)]
pub struct LocatedSolution {
    pub path: Path,
    pub solution: Solution,
}
