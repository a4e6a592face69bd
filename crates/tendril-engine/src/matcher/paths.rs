//! Dotted-path key assertions: `a.b.c : V` and deep `..key : V`.
//!
//! A fixed segment navigates one key; a deep segment finds its key at
//! any depth, descending through mappings and sequences. Every
//! admissible leaf is its own witness, enumerated depth-first with the
//! shallowest hit first, so each depth is its own solution.

use tendril_par::ast::{NodeId, ObjBody, PathSeg};
use tendril_util::MatchError;
use tendril_value::{ObjectMap, Path, PathStep, Value};

use super::{attempt, extend, Cont, Matcher, Sig};
use crate::env::Env;

/// One admissible leaf of a path: the value under the final key.
struct PathLeaf<'v> {
    value: &'v Value,
    /// Root-relative path of the leaf value.
    path: Path,
    /// The final key, used as the flow key-context.
    key: String,
}

impl<'p> Matcher<'p> {
    /// A K:V assertion whose key is a dotted path.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn obj_path_assert(
        &self,
        segs: &[PathSeg],
        value: NodeId,
        each: bool,
        optional: bool,
        body: &ObjBody,
        idx: usize,
        obj: &ObjectMap,
        frame: usize,
        path: &[PathStep],
        env: &mut Env,
        k: Cont,
    ) -> Sig {
        attempt(env, |env| {
            // The head segment covers its key in this object whenever
            // the key is present at this level.
            if let Some(head) = segs.first() {
                if obj.contains_key(&head.key) {
                    env.cover(frame, &head.key);
                }
            }

            let subject = Value::Object(obj.clone());
            let mut leaves = Vec::new();
            collect_leaves(segs, 0, &subject, path, &mut leaves);

            if each {
                if leaves.is_empty() && !optional {
                    return Sig::More;
                }
                for leaf in &leaves {
                    let snap = env.snapshot();
                    env.push_key(&leaf.key);
                    let sig =
                        self.match_one(value, leaf.value, &leaf.path, env, &mut |_env| Sig::Stop);
                    match sig {
                        Sig::Stop => env.rollback_scoped(snap),
                        Sig::More => return Sig::More,
                        Sig::Abort(err) => return Sig::Abort(err),
                    }
                }
                return self.obj_entries(body, idx + 1, obj, frame, path, env, k);
            }

            if optional {
                let mut any = false;
                for leaf in &leaves {
                    match self.probe_one(value, leaf.value, &leaf.path, env) {
                        Ok(true) => {
                            any = true;
                            break;
                        }
                        Ok(false) => {}
                        Err(err) => return Sig::Abort(err),
                    }
                }
                if !any {
                    return self.obj_entries(body, idx + 1, obj, frame, path, env, k);
                }
            }

            for leaf in &leaves {
                let snap = env.snapshot();
                env.push_key(&leaf.key);
                let sig = self.match_one(value, leaf.value, &leaf.path, env, &mut |env| {
                    attempt(env, |env| {
                        env.pop_key();
                        self.obj_entries(body, idx + 1, obj, frame, path, env, &mut *k)
                    })
                });
                match sig {
                    Sig::More => env.rollback(snap),
                    other => return other,
                }
            }
            Sig::More
        })
    }

    /// Existence probe for `(!a..b : V)`.
    pub(crate) fn exists_path_entry(
        &self,
        segs: &[PathSeg],
        value: NodeId,
        obj: &ObjectMap,
        path: &[PathStep],
        env: &mut Env,
    ) -> Result<bool, MatchError> {
        let subject = Value::Object(obj.clone());
        let mut leaves = Vec::new();
        collect_leaves(segs, 0, &subject, path, &mut leaves);
        for leaf in &leaves {
            if self.probe_one(value, leaf.value, &leaf.path, env)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Enumerate every admissible leaf, depth-first, shallowest first.
fn collect_leaves<'v>(
    segs: &[PathSeg],
    si: usize,
    cur: &'v Value,
    cur_path: &[PathStep],
    out: &mut Vec<PathLeaf<'v>>,
) {
    let Some(seg) = segs.get(si) else {
        return;
    };
    let last = si + 1 == segs.len();

    if seg.deep {
        deep_collect(segs, si, cur, cur_path, out);
        return;
    }

    let Value::Object(map) = cur else {
        return;
    };
    let Some(child) = map.get(&seg.key) else {
        return;
    };
    let child_path = extend(cur_path, PathStep::Key(seg.key.clone()));
    if last {
        out.push(PathLeaf {
            value: child,
            path: child_path,
            key: seg.key.clone(),
        });
    } else {
        collect_leaves(segs, si + 1, child, &child_path, out);
    }
}

/// A deep segment: the key at the current level first, then descend
/// through object values and array elements in iteration order.
fn deep_collect<'v>(
    segs: &[PathSeg],
    si: usize,
    cur: &'v Value,
    cur_path: &[PathStep],
    out: &mut Vec<PathLeaf<'v>>,
) {
    let seg = &segs[si];
    let last = si + 1 == segs.len();

    if let Value::Object(map) = cur {
        if let Some(child) = map.get(&seg.key) {
            let child_path = extend(cur_path, PathStep::Key(seg.key.clone()));
            if last {
                out.push(PathLeaf {
                    value: child,
                    path: child_path,
                    key: seg.key.clone(),
                });
            } else {
                collect_leaves(segs, si + 1, child, &child_path, out);
            }
        }
    }

    match cur {
        Value::Object(map) => {
            for (key, child) in map {
                let child_path = extend(cur_path, PathStep::Key(key.clone()));
                deep_collect(segs, si, child, &child_path, out);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                let child_path = extend(cur_path, PathStep::Index(i));
                deep_collect(segs, si, child, &child_path, out);
            }
        }
        _ => {}
    }
}
