//! tendril-value - The Value Universe
//!
//! The data model the engine matches over: `null`, primitives (boolean,
//! number, string), ordered sequences, unordered string-keyed mappings,
//! and unordered sets.
//!
//! Two properties of this crate carry the rest of the engine:
//!
//! 1. **SameValueZero equality.** [`Value`] equality is structural for
//!    composites and numeric with `+0 == -0` and `NaN == NaN`. Hashing is
//!    consistent with that equality (negative zero and NaN are
//!    canonicalized; mapping and set hashes are commutative over
//!    members, since their equality ignores order).
//! 2. **Deterministic iteration.** `Value::Object` is an
//!    [`IndexMap`](indexmap::IndexMap), so "mapping-iteration order"
//!    (the order witness keys are tried in, and the order scanner
//!    positions are visited in) is the insertion order and nothing else.
//!
//! [`PathStep`]/[`Path`] name positions inside a value tree relative to
//! its root; solutions and the edit driver use them instead of borrowed
//! pointers.

mod json;
mod path;
mod value;

pub use json::{value_from_json, value_to_json};
pub use path::{path_to_string, Path, PathStep};
pub use value::{ObjectMap, Value};
