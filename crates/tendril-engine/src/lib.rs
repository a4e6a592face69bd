//! tendril-engine - The Match Engine
//!
//! Executes a validated [`Program`](tendril_sem::Program) against a
//! [`Value`](tendril_value::Value):
//!
//! ```text
//!   Program + Value
//!        │
//!        ▼
//!   [Matcher]  backtracking CPS interpreter, journaled environment
//!        │
//!        ▼
//!   Solutions  (bindings + occurrence positions, deterministic order)
//!        │
//!        ├──▶ [Scanner]      `find`: every sub-position, de-duplicated
//!        └──▶ [Edit driver]  pure structural replacement by position
//! ```
//!
//! The environment's four journaled sub-structures (bindings,
//! occurrences, coverage, buckets) make a choice point an O(1)
//! snapshot and a failure an O(changes) rollback.
//! All failure is backtracking - the only hard match-time
//! error is an exhausted step budget, surfaced as a terminal record on
//! the stream.

mod config;
mod edit;
mod env;
mod eval;
mod matcher;
mod scan;
mod solution;
mod stream;

pub use config::MatchConfig;
pub use edit::{edit_all_with, replace_all_with, EditPlan};
pub use scan::{find_with, first_with};
pub use solution::{LocatedSolution, OccKind, Occurrence, Solution};
pub use stream::{LocatedSolutionStream, SolutionStream};

use tendril_sem::Program;
use tendril_util::EditError;
use tendril_value::Value;

use env::Env;
use matcher::{Matcher, Sig};

/// Match the program against the value at its root, enumerating every
/// solution in deterministic order.
pub fn match_with(program: &Program, value: &Value, config: MatchConfig) -> SolutionStream {
    let matcher = Matcher::new(program, config);
    let mut env = Env::new();
    let mut out = Vec::new();
    let sig = matcher.match_at(value, &[], &mut env, &mut |solution| {
        out.push(solution);
        Sig::More
    });
    let error = match sig {
        Sig::Abort(err) => Some(err),
        _ => None,
    };
    SolutionStream::new(out, error)
}

/// [`match_with`] with the default configuration.
pub fn match_solutions(program: &Program, value: &Value) -> SolutionStream {
    match_with(program, value, MatchConfig::default())
}

/// [`find_with`] with the default configuration.
pub fn find(program: &Program, value: &Value) -> LocatedSolutionStream {
    find_with(program, value, MatchConfig::default())
}

/// The first located solution, short-circuiting inside the engine.
pub fn first(program: &Program, value: &Value) -> Option<LocatedSolution> {
    first_with(program, value, MatchConfig::default())
}

/// Does the value conform to the pattern at its root? Short-circuits
/// on the first solution.
pub fn matches(program: &Program, value: &Value) -> bool {
    let matcher = Matcher::new(program, MatchConfig::default());
    let mut env = Env::new();
    matches!(
        matcher.match_at(value, &[], &mut env, &mut |_solution| Sig::Stop),
        Sig::Stop
    )
}

/// Replace every match site with the default configuration.
pub fn replace_all(
    program: &Program,
    value: &Value,
    f: impl FnMut(&Solution) -> Value,
) -> Result<Value, EditError> {
    replace_all_with(program, value, MatchConfig::default(), f)
}

/// Apply per-binding edit plans with the default configuration.
pub fn edit_all(
    program: &Program,
    value: &Value,
    plan: impl FnMut(&Solution) -> EditPlan,
) -> Result<Value, EditError> {
    edit_all_with(program, value, MatchConfig::default(), plan)
}
