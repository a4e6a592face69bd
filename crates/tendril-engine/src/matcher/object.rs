//! Declarative object matching.
//!
//! Entries are processed in textual order. Each K:V assertion first
//! adds every subject key matching K to the object's coverage frame
//! (whether or not V holds - a "bad entry" still covers), then:
//!
//! - a weak assertion (`K : V`) chooses a witness key; every choice is
//!   a branch, and at least one witness must exist unless `?`-marked;
//! - an `each` assertion requires every key matching K to satisfy V,
//!   committing the first V-solution per key; per-key bindings are
//!   entry-local, bucket pours and coverage persist;
//! - a negative assertion `(!K:V)` demands no key matches both, and
//!   contributes neither coverage nor bindings.
//!
//! After all entries, the residual constraint is checked over the
//! uncovered keys.

use tendril_par::ast::{KeyPattern, NodeId, ObjBody, ObjEntryKind};
use tendril_value::{ObjectMap, PathStep, Value};

use super::{attempt, extend, Cont, Matcher, Sig};
use crate::env::Env;

impl<'p> Matcher<'p> {
    pub(crate) fn match_object(
        &self,
        body: &ObjBody,
        obj: &ObjectMap,
        path: &[PathStep],
        env: &mut Env,
        k: Cont,
    ) -> Sig {
        attempt(env, |env| {
            let frame = env.push_cover_frame();
            self.obj_entries(body, 0, obj, frame, path, env, k)
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn obj_entries(
        &self,
        body: &ObjBody,
        idx: usize,
        obj: &ObjectMap,
        frame: usize,
        path: &[PathStep],
        env: &mut Env,
        k: Cont,
    ) -> Sig {
        if let Err(err) = self.tick() {
            return Sig::Abort(err);
        }
        if idx == body.entries.len() {
            return self.obj_residual(body, obj, frame, path, env, k);
        }

        match &body.entries[idx].kind {
            ObjEntryKind::Assert {
                key,
                value,
                each,
                optional,
            } => match key {
                KeyPattern::Node(kp) => {
                    if *each {
                        self.obj_each(*kp, *value, *optional, body, idx, obj, frame, path, env, k)
                    } else {
                        self.obj_assert(*kp, *value, *optional, body, idx, obj, frame, path, env, k)
                    }
                }
                KeyPattern::Path(segs) => self.obj_path_assert(
                    segs, *value, *each, *optional, body, idx, obj, frame, path, env, k,
                ),
            },

            ObjEntryKind::NotAssert { key, value } => {
                let value = *value;
                let exists = match key {
                    KeyPattern::Node(kp) => self.exists_entry(*kp, value, obj, path, env),
                    KeyPattern::Path(segs) => self.exists_path_entry(segs, value, obj, path, env),
                };
                match exists {
                    Err(err) => Sig::Abort(err),
                    Ok(true) => Sig::More,
                    Ok(false) => self.obj_entries(body, idx + 1, obj, frame, path, env, k),
                }
            }

            ObjEntryKind::FlowClause(bucket) => attempt(env, |env| {
                let subject = Value::Object(obj.clone());
                if self.pour(bucket, &subject, env) {
                    self.obj_entries(body, idx + 1, obj, frame, path, env, k)
                } else {
                    Sig::More
                }
            }),

            ObjEntryKind::Collecting { key, value, bucket } => attempt(env, |env| {
                let Some(item) = env.get(*value).cloned() else {
                    return Sig::More;
                };
                let poured = match key {
                    None => {
                        env.pour_item(bucket.name, &item);
                        true
                    }
                    Some(key_sym) => {
                        let Some(Value::String(key_str)) = env.get(*key_sym).cloned() else {
                            return Sig::More;
                        };
                        env.pour_pair(bucket.name, &key_str, &item)
                    }
                };
                if poured {
                    self.obj_entries(body, idx + 1, obj, frame, path, env, k)
                } else {
                    Sig::More
                }
            }),

            // Rejected at validation; fail safe.
            ObjEntryKind::Spread => Sig::More,
        }
    }

    /// Weak assertion `K : V`: cover every key matching K, then branch
    /// over witnesses matching both K and V.
    #[allow(clippy::too_many_arguments)]
    fn obj_assert(
        &self,
        kp: NodeId,
        value: NodeId,
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
            for key in obj.keys() {
                match self.probe_key(kp, key, path, env) {
                    Ok(true) => env.cover(frame, key),
                    Ok(false) => {}
                    Err(err) => return Sig::Abort(err),
                }
            }

            if optional {
                let mut any = false;
                for (key, val) in obj.iter() {
                    match self.probe_entry(kp, value, key, val, path, env) {
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

            for (key, val) in obj.iter() {
                let snap = env.snapshot();
                let sig = self.match_key(kp, key, path, env, &mut |env| {
                    // Continuations restore on More like everything
                    // else; the key-context ops must be inside the
                    // attempt so sibling key alternatives see a clean
                    // stack.
                    attempt(env, |env| {
                        env.push_key(key);
                        let child = extend(path, PathStep::Key(key.clone()));
                        self.match_one(value, val, &child, env, &mut |env| {
                            attempt(env, |env| {
                                env.pop_key();
                                self.obj_entries(body, idx + 1, obj, frame, path, env, &mut *k)
                            })
                        })
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

    /// `each K : V`: every key matching K must satisfy V. The first
    /// V-solution per key is committed; its bindings are rolled back
    /// after the key (coverage, buckets, and marker positions persist).
    #[allow(clippy::too_many_arguments)]
    fn obj_each(
        &self,
        kp: NodeId,
        value: NodeId,
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
            let mut matching: Vec<&String> = Vec::new();
            for key in obj.keys() {
                match self.probe_key(kp, key, path, env) {
                    Ok(true) => {
                        env.cover(frame, key);
                        matching.push(key);
                    }
                    Ok(false) => {}
                    Err(err) => return Sig::Abort(err),
                }
            }

            if matching.is_empty() && !optional {
                return Sig::More;
            }

            for key in matching {
                let val = &obj[key];
                let snap = env.snapshot();
                let sig = self.match_key(kp, key, path, env, &mut |env| {
                    attempt(env, |env| {
                        env.push_key(key);
                        let child = extend(path, PathStep::Key(key.clone()));
                        self.match_one(value, val, &child, env, &mut |_env| Sig::Stop)
                    })
                });
                match sig {
                    Sig::Stop => env.rollback_scoped(snap),
                    // A bad entry: some key matching K fails V.
                    Sig::More => return Sig::More,
                    Sig::Abort(err) => return Sig::Abort(err),
                }
            }

            self.obj_entries(body, idx + 1, obj, frame, path, env, k)
        })
    }

    /// Does any (key, value) entry match both patterns? All effects
    /// rolled back.
    pub(crate) fn probe_entry(
        &self,
        kp: NodeId,
        value: NodeId,
        key: &str,
        val: &Value,
        path: &[PathStep],
        env: &mut Env,
    ) -> Result<bool, tendril_util::MatchError> {
        let snap = env.snapshot();
        let sig = self.match_key(kp, key, path, env, &mut |env| {
            env.push_key(key);
            let child = extend(path, PathStep::Key(key.to_string()));
            self.match_one(value, val, &child, env, &mut |_env| Sig::Stop)
        });
        env.rollback(snap);
        match sig {
            Sig::Stop => Ok(true),
            Sig::More => Ok(false),
            Sig::Abort(err) => Err(err),
        }
    }

    fn exists_entry(
        &self,
        kp: NodeId,
        value: NodeId,
        obj: &ObjectMap,
        path: &[PathStep],
        env: &mut Env,
    ) -> Result<bool, tendril_util::MatchError> {
        for (key, val) in obj.iter() {
            if self.probe_entry(kp, value, key, val, path, env)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// The residual constraint over uncovered keys, then the final
    /// continuation.
    fn obj_residual(
        &self,
        body: &ObjBody,
        obj: &ObjectMap,
        frame: usize,
        path: &[PathStep],
        env: &mut Env,
        k: Cont,
    ) -> Sig {
        let Some(residual) = &body.residual else {
            return k(env);
        };

        let uncovered: Vec<&String> = obj
            .keys()
            .filter(|key| !env.is_covered(frame, key))
            .collect();
        let count = uncovered.len() as u32;
        if count < residual.min || residual.max.map_or(false, |max| count > max) {
            return Sig::More;
        }

        let Some(name) = residual.bind else {
            return k(env);
        };
        attempt(env, |env| {
            let submap: ObjectMap = uncovered
                .iter()
                .map(|key| ((*key).clone(), obj[*key].clone()))
                .collect();
            let occ = crate::solution::Occurrence {
                path: path.to_vec(),
                kind: crate::solution::OccKind::Keys {
                    keys: uncovered.iter().map(|key| (*key).clone()).collect(),
                },
            };
            if env.bind_or_unify(name, &Value::Object(submap), occ) {
                k(env)
            } else {
                Sig::More
            }
        })
    }
}
