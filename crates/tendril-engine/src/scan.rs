//! The scanner: apply a program at every reachable sub-position.
//!
//! Positions are visited pre-order: the value itself, then every
//! object value in mapping-iteration order, then every array element.
//! Set members have no stable sub-position and are not descended into.
//!
//! Two solutions with identical bindings and occurrence positions at
//! the same scan path are the same occurrence and are de-duplicated.

use rustc_hash::FxHashSet;
use tendril_sem::Program;
use tendril_value::{Path, PathStep, Value};

use crate::config::MatchConfig;
use crate::env::Env;
use crate::matcher::{Matcher, Sig};
use crate::solution::{LocatedSolution, Occurrence, Solution};
use crate::stream::LocatedSolutionStream;

type DedupKey = (Path, Vec<(String, Value)>, Vec<(String, Vec<Occurrence>)>);

fn dedup_key(path: &[PathStep], solution: &Solution) -> DedupKey {
    (
        path.to_vec(),
        solution
            .bindings
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect(),
        solution
            .occurrences
            .iter()
            .map(|(name, occs)| (name.clone(), occs.clone()))
            .collect(),
    )
}

/// Pre-order walk over scannable positions.
pub(crate) fn for_each_position<'v>(
    value: &'v Value,
    path: &mut Path,
    visit: &mut dyn FnMut(&'v Value, &[PathStep]) -> Sig,
) -> Sig {
    match visit(value, path) {
        Sig::More => {}
        other => return other,
    }
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                path.push(PathStep::Key(key.clone()));
                let sig = for_each_position(child, path, visit);
                path.pop();
                match sig {
                    Sig::More => {}
                    other => return other,
                }
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                path.push(PathStep::Index(i));
                let sig = for_each_position(child, path, visit);
                path.pop();
                match sig {
                    Sig::More => {}
                    other => return other,
                }
            }
        }
        _ => {}
    }
    Sig::More
}

/// `find`: the program applied at every sub-position, de-duplicated.
pub fn find_with(program: &Program, value: &Value, config: MatchConfig) -> LocatedSolutionStream {
    let matcher = Matcher::new(program, config);
    let mut out: Vec<LocatedSolution> = Vec::new();
    let mut seen: FxHashSet<DedupKey> = FxHashSet::default();
    let mut path = Vec::new();

    let sig = for_each_position(value, &mut path, &mut |subject, pos_path| {
        let mut env = Env::new();
        let pos: Path = pos_path.to_vec();
        matcher.match_at(subject, pos_path, &mut env, &mut |solution| {
            if seen.insert(dedup_key(&pos, &solution)) {
                out.push(LocatedSolution {
                    path: pos.clone(),
                    solution,
                });
            }
            Sig::More
        })
    });

    let error = match sig {
        Sig::Abort(err) => Some(err),
        _ => None,
    };
    LocatedSolutionStream::new(out, error)
}

/// `first`: short-circuits inside the engine on the first located
/// solution.
pub fn first_with(
    program: &Program,
    value: &Value,
    config: MatchConfig,
) -> Option<LocatedSolution> {
    let matcher = Matcher::new(program, config);
    let mut found = None;
    let mut path = Vec::new();

    let _ = for_each_position(value, &mut path, &mut |subject, pos_path| {
        let mut env = Env::new();
        let pos: Path = pos_path.to_vec();
        matcher.match_at(subject, pos_path, &mut env, &mut |solution| {
            found = Some(LocatedSolution {
                path: pos.clone(),
                solution,
            });
            Sig::Stop
        })
    });
    found
}
