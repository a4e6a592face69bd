//! The edit driver: build a modified copy of the input from solution
//! positions.
//!
//! Pure throughout: the input is never mutated; containers on the path
//! from the root to an edit site are rebuilt, untouched subtrees are
//! cloned as-is. All positions refer to the *original* value, so
//! multiple splices in one container never shift each other.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use tendril_sem::Program;
use tendril_util::EditError;
use tendril_value::{Path, PathStep, Value};

use crate::config::MatchConfig;
use crate::scan::find_with;
use crate::solution::{OccKind, Occurrence, Solution};

/// An edit plan: binding name to replacement value. Names the solution
/// does not bind are silently ignored.
pub type EditPlan = IndexMap<String, Value>;

/// One concrete container operation, derived from an occurrence.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum Op {
    /// Replace the whole root.
    Root,
    /// Replace the value of a key of the object at the path.
    SetKey(String),
    /// Replace one element (array or set member) at the path.
    SetIdx(usize),
    /// Splice a run of the array at the path.
    Splice { start: usize, end: usize },
    /// Replace a keyset of the object at the path with a submapping.
    ReplaceKeys(Vec<String>),
    /// Rename a key of the object at the path.
    Rename(String),
}

#[derive(Clone, Debug)]
struct OpRec {
    path: Path,
    op: Op,
    value: Value,
    name: String,
}

/// Collects operations, de-duplicating identical writes and rejecting
/// conflicting ones.
#[derive(Default)]
struct Edits {
    recs: Vec<OpRec>,
    sites: FxHashMap<(Path, Op), usize>,
}

impl Edits {
    fn add(&mut self, occ: &Occurrence, value: Value, name: &str) -> Result<(), EditError> {
        let (path, op) = match &occ.kind {
            OccKind::Node => {
                let mut path = occ.path.clone();
                match path.pop() {
                    None => (path, Op::Root),
                    Some(PathStep::Key(key)) => (path, Op::SetKey(key)),
                    Some(PathStep::Index(i)) => (path, Op::SetIdx(i)),
                }
            }
            OccKind::Slice { start, end } => {
                if value.as_array().is_none() {
                    return Err(EditError::SpliceShape {
                        name: name.to_string(),
                    });
                }
                (
                    occ.path.clone(),
                    Op::Splice {
                        start: *start,
                        end: *end,
                    },
                )
            }
            OccKind::Keys { keys } => {
                if value.as_object().is_none() {
                    return Err(EditError::SpliceKeysShape {
                        name: name.to_string(),
                    });
                }
                (occ.path.clone(), Op::ReplaceKeys(keys.clone()))
            }
            OccKind::KeyOf { key } => {
                if value.as_str().is_none() {
                    return Err(EditError::RenameShape {
                        name: name.to_string(),
                    });
                }
                (occ.path.clone(), Op::Rename(key.clone()))
            }
        };

        let site = (path.clone(), op.clone());
        if let Some(&existing) = self.sites.get(&site) {
            if self.recs[existing].value == value {
                return Ok(());
            }
            return Err(EditError::Conflict {
                name: name.to_string(),
            });
        }
        self.sites.insert(site, self.recs.len());
        self.recs.push(OpRec {
            path,
            op,
            value,
            name: name.to_string(),
        });
        Ok(())
    }
}

/// Whole-match replacement: every match site (the marked sub-pattern's
/// subject when the pattern carries a `>> ... <<` marker, the whole
/// match otherwise) is replaced by `f(solution)`.
pub fn replace_all_with(
    program: &Program,
    value: &Value,
    config: MatchConfig,
    mut f: impl FnMut(&Solution) -> Value,
) -> Result<Value, EditError> {
    let mut edits = Edits::default();
    for located in find_with(program, value, config) {
        let replacement = f(&located.solution);
        if program.marker.is_some() {
            for occ in &located.solution.marked {
                edits.add(occ, replacement.clone(), "0")?;
            }
        } else {
            let occ = Occurrence {
                path: located.path.clone(),
                kind: OccKind::Node,
            };
            edits.add(&occ, replacement.clone(), "0")?;
        }
    }
    apply(value, edits)
}

/// Per-binding substitution: for each solution, the plan maps binding
/// names to replacement values; every occurrence site of each named
/// binding is replaced. `$0` (name `"0"`) targets the whole match.
pub fn edit_all_with(
    program: &Program,
    value: &Value,
    config: MatchConfig,
    mut plan_fn: impl FnMut(&Solution) -> EditPlan,
) -> Result<Value, EditError> {
    let mut edits = Edits::default();
    for located in find_with(program, value, config) {
        let plan = plan_fn(&located.solution);
        for (name, replacement) in plan {
            // A plan entry for an unbound name is documented to be
            // ignored.
            let Some(occs) = located.solution.occurrences.get(&name) else {
                continue;
            };
            for occ in occs {
                edits.add(occ, replacement.clone(), &name)?;
            }
        }
    }
    apply(value, edits)
}

fn apply(original: &Value, edits: Edits) -> Result<Value, EditError> {
    if let Some(root) = edits.recs.iter().find(|rec| rec.op == Op::Root) {
        return Ok(root.value.clone());
    }
    rebuild(original, &mut Vec::new(), &edits.recs)
}

fn rebuild(value: &Value, prefix: &mut Path, ops: &[OpRec]) -> Result<Value, EditError> {
    let here: Vec<&OpRec> = ops.iter().filter(|rec| rec.path == *prefix).collect();
    let deeper = ops
        .iter()
        .any(|rec| rec.path.len() > prefix.len() && rec.path.starts_with(prefix));
    if here.is_empty() && !deeper {
        return Ok(value.clone());
    }

    match value {
        Value::Object(map) => rebuild_object(map, prefix, &here, ops),
        Value::Array(items) => rebuild_array(items, prefix, &here, ops),
        Value::Set(members) => rebuild_set(members, prefix, &here, ops),
        // Positions always name containers in the original value; a
        // primitive here means the op was consumed by an outer splice.
        other => Ok(other.clone()),
    }
}

fn rebuild_object(
    map: &tendril_value::ObjectMap,
    prefix: &mut Path,
    here: &[&OpRec],
    ops: &[OpRec],
) -> Result<Value, EditError> {
    let mut sets: FxHashMap<&str, &Value> = FxHashMap::default();
    let mut renames: FxHashMap<&str, &str> = FxHashMap::default();
    let mut replacements: Vec<(&[String], &tendril_value::ObjectMap)> = Vec::new();

    for rec in here {
        match &rec.op {
            Op::SetKey(key) => {
                sets.insert(key.as_str(), &rec.value);
            }
            Op::Rename(key) => {
                if let Some(new_name) = rec.value.as_str() {
                    renames.insert(key.as_str(), new_name);
                }
            }
            Op::ReplaceKeys(keys) => {
                if let Some(sub) = rec.value.as_object() {
                    replacements.push((keys.as_slice(), sub));
                }
            }
            _ => {}
        }
    }

    let mut spliced = vec![false; replacements.len()];
    let mut out = tendril_value::ObjectMap::new();
    for (key, val) in map {
        let replaced = replacements
            .iter()
            .position(|(keys, _)| keys.contains(key));
        if let Some(ri) = replaced {
            // The submapping lands at the position of the first
            // replaced key; the rest just disappear.
            if !spliced[ri] {
                spliced[ri] = true;
                for (new_key, new_val) in replacements[ri].1 {
                    out.insert(new_key.clone(), new_val.clone());
                }
            }
            continue;
        }

        let new_key = renames
            .get(key.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| key.clone());
        let new_val = match sets.get(key.as_str()) {
            Some(replacement) => (*replacement).clone(),
            None => {
                prefix.push(PathStep::Key(key.clone()));
                let rebuilt = rebuild(val, prefix, ops)?;
                prefix.pop();
                rebuilt
            }
        };
        out.insert(new_key, new_val);
    }
    Ok(Value::Object(out))
}

fn rebuild_array(
    items: &[Value],
    prefix: &mut Path,
    here: &[&OpRec],
    ops: &[OpRec],
) -> Result<Value, EditError> {
    struct Splice<'a> {
        start: usize,
        end: usize,
        items: Vec<Value>,
        name: &'a str,
    }

    let mut splices: Vec<Splice> = Vec::new();
    for rec in here {
        match &rec.op {
            Op::SetIdx(i) => splices.push(Splice {
                start: *i,
                end: *i + 1,
                items: vec![rec.value.clone()],
                name: rec.name.as_str(),
            }),
            Op::Splice { start, end } => splices.push(Splice {
                start: *start,
                end: *end,
                items: rec.value.as_array().map(|a| a.to_vec()).unwrap_or_default(),
                name: rec.name.as_str(),
            }),
            _ => {}
        }
    }
    splices.sort_by_key(|sp| (sp.start, sp.end));
    for pair in splices.windows(2) {
        if pair[0].end > pair[1].start {
            return Err(EditError::Conflict {
                name: pair[1].name.to_string(),
            });
        }
    }

    let mut out = Vec::new();
    let mut idx = 0usize;
    let mut s = 0usize;
    while idx < items.len() || s < splices.len() {
        if s < splices.len() && splices[s].start == idx {
            out.extend(splices[s].items.iter().cloned());
            idx = idx.max(splices[s].end);
            s += 1;
            continue;
        }
        if idx >= items.len() {
            break;
        }
        prefix.push(PathStep::Index(idx));
        let rebuilt = rebuild(&items[idx], prefix, ops)?;
        prefix.pop();
        out.push(rebuilt);
        idx += 1;
    }
    Ok(Value::Array(out))
}

fn rebuild_set(
    members: &[Value],
    prefix: &mut Path,
    here: &[&OpRec],
    ops: &[OpRec],
) -> Result<Value, EditError> {
    let mut out = Vec::new();
    for (i, member) in members.iter().enumerate() {
        let set_here = here.iter().find(|rec| rec.op == Op::SetIdx(i));
        match set_here {
            Some(rec) => out.push(rec.value.clone()),
            None => {
                prefix.push(PathStep::Index(i));
                let rebuilt = rebuild(member, prefix, ops)?;
                prefix.pop();
                out.push(rebuilt);
            }
        }
    }
    Ok(Value::set(out))
}
