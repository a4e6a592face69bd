//! The backtracking match interpreter.
//!
//! Control flow is continuation-passing: every match function receives
//! the rest of the match as a continuation `k` and invokes it once per
//! local way of succeeding. The return signal threads enumeration
//! control:
//!
//! - `More` - this avenue is exhausted; the caller tries its next
//!   alternative. Invariant: a function returning `More` has rolled the
//!   environment back to its entry state.
//! - `Stop` - a consumer upstream is satisfied (`first`, `matches`, a
//!   committed sub-match); unwind immediately *without* rolling back,
//!   so the environment still holds the successful state.
//! - `Abort` - the step budget ran out; unwind and surface the error.
//!
//! Choice points are environment snapshots; trying the next alternative
//! is a rollback. There is no failure exception anywhere: a mismatch is
//! just `More`.

mod object;
mod paths;
mod seq;
mod set;

use std::cell::Cell;

use tendril_par::ast::{BindSigil, BucketRef, BucketSigil, Lit, NodeId, NodeKind};
use tendril_sem::Program;
use tendril_util::MatchError;
use tendril_value::{Path, PathStep, Value};

use crate::config::MatchConfig;
use crate::env::{BucketState, Env};
use crate::eval::{eval_guard, GuardOutcome};
use crate::solution::{OccKind, Occurrence, Solution};

/// Enumeration control signal.
#[derive(Clone, Debug)]
pub(crate) enum Sig {
    More,
    Stop,
    Abort(MatchError),
}

pub(crate) type Cont<'a> = &'a mut dyn FnMut(&mut Env) -> Sig;
pub(crate) type RunCont<'a> = &'a mut dyn FnMut(&mut Env, usize) -> Sig;

/// Extend a root-relative path by one step.
pub(crate) fn extend(path: &[PathStep], step: PathStep) -> Path {
    let mut out = path.to_vec();
    out.push(step);
    out
}

/// Run `f`; roll back to the entry snapshot if it exhausts (`More`).
pub(crate) fn attempt(env: &mut Env, f: impl FnOnce(&mut Env) -> Sig) -> Sig {
    let snap = env.snapshot();
    let sig = f(env);
    if matches!(sig, Sig::More) {
        env.rollback(snap);
    }
    sig
}

/// One match invocation: a program applied to a subject.
pub(crate) struct Matcher<'p> {
    pub(crate) program: &'p Program,
    budget: Option<u64>,
    steps: Cell<u64>,
}

impl<'p> Matcher<'p> {
    pub fn new(program: &'p Program, config: MatchConfig) -> Self {
        Self {
            program,
            budget: config.step_budget,
            steps: Cell::new(0),
        }
    }

    /// Count one dispatch step against the budget.
    fn tick(&self) -> Result<(), MatchError> {
        let steps = self.steps.get() + 1;
        self.steps.set(steps);
        match self.budget {
            Some(limit) if steps > limit => Err(MatchError::StepBudgetExceeded { steps }),
            _ => Ok(()),
        }
    }

    /// Match the program against `subject` at `base_path`, feeding each
    /// solution to `on_solution`.
    pub fn match_at(
        &self,
        subject: &Value,
        base_path: &[PathStep],
        env: &mut Env,
        on_solution: &mut dyn FnMut(Solution) -> Sig,
    ) -> Sig {
        attempt(env, |env| {
            let bound = env.bind_or_unify(
                self.program.sym_root,
                subject,
                Occurrence {
                    path: base_path.to_vec(),
                    kind: OccKind::Node,
                },
            );
            if !bound {
                return Sig::More;
            }
            self.match_one(self.program.root, subject, base_path, env, &mut |env| {
                match self.emit(env) {
                    Some(solution) => on_solution(solution),
                    None => Sig::More,
                }
            })
        })
    }

    // =========================================================================
    // Single-subject dispatch
    // =========================================================================

    pub(crate) fn match_one(
        &self,
        id: NodeId,
        subject: &Value,
        path: &[PathStep],
        env: &mut Env,
        k: Cont,
    ) -> Sig {
        if let Err(err) = self.tick() {
            return Sig::Abort(err);
        }

        match &self.program.nodes[id].kind {
            NodeKind::Literal(lit) => {
                if lit_matches(lit, subject) {
                    k(env)
                } else {
                    Sig::More
                }
            }

            NodeKind::CaseInsensitive(text) => match subject {
                Value::String(s) if s.to_lowercase() == *text => k(env),
                _ => Sig::More,
            },

            NodeKind::Regex(_) => match subject {
                Value::String(s)
                    if self
                        .program
                        .regex(id)
                        .map(|regex| regex.is_match(s))
                        .unwrap_or(false) =>
                {
                    k(env)
                }
                _ => Sig::More,
            },

            NodeKind::Wildcard => k(env),

            NodeKind::TypedWildcard(tag) => {
                let hit = matches!(
                    (tag, subject),
                    (tendril_lex::TypeTag::String, Value::String(_))
                        | (tendril_lex::TypeTag::Number, Value::Number(_))
                        | (tendril_lex::TypeTag::Boolean, Value::Bool(_))
                );
                if hit {
                    k(env)
                } else {
                    Sig::More
                }
            }

            NodeKind::Var(sym) => {
                let sym = *sym;
                attempt(env, |env| {
                    let occ = Occurrence {
                        path: path.to_vec(),
                        kind: OccKind::Node,
                    };
                    if env.bind_or_unify(sym, subject, occ) {
                        k(env)
                    } else {
                        Sig::More
                    }
                })
            }

            NodeKind::Bind { inner, sigil, name } => {
                let (inner, sigil, name) = (*inner, *sigil, *name);
                match sigil {
                    // A slice binding needs an enclosing run; as a
                    // single-subject pattern it cannot consume one.
                    BindSigil::Seq => Sig::More,
                    BindSigil::Map if subject.as_object().is_none() => Sig::More,
                    _ => self.match_one(inner, subject, path, env, &mut |env| {
                        attempt(env, |env| {
                            let occ = Occurrence {
                                path: path.to_vec(),
                                kind: OccKind::Node,
                            };
                            if env.bind_or_unify(name, subject, occ) {
                                k(env)
                            } else {
                                Sig::More
                            }
                        })
                    }),
                }
            }

            NodeKind::Array(body) => match subject {
                Value::Array(items) => {
                    let body = *body;
                    self.match_run(body, items, path, 0, env, &mut |env, end| {
                        if end == items.len() {
                            k(env)
                        } else {
                            Sig::More
                        }
                    })
                }
                _ => Sig::More,
            },

            NodeKind::Object(body) => match subject {
                Value::Object(map) => self.match_object(body, map, path, env, k),
                _ => Sig::More,
            },

            NodeKind::Set { items, open } => match subject {
                Value::Set(members) => self.match_set(items, *open, members, path, env, k),
                _ => Sig::More,
            },

            NodeKind::Alt(branches) => {
                for &branch in branches {
                    match self.match_one(branch, subject, path, env, &mut *k) {
                        Sig::More => continue,
                        other => return other,
                    }
                }
                Sig::More
            }

            NodeKind::Else { primary, fallback } => {
                let (primary, fallback) = (*primary, *fallback);
                match self.probe_one(primary, subject, path, env) {
                    Err(err) => Sig::Abort(err),
                    Ok(true) => self.match_one(primary, subject, path, env, k),
                    Ok(false) => self.match_one(fallback, subject, path, env, k),
                }
            }

            NodeKind::Lookahead { inner, negative } => {
                let inner = *inner;
                if *negative {
                    match self.probe_one(inner, subject, path, env) {
                        Err(err) => Sig::Abort(err),
                        Ok(true) => Sig::More,
                        Ok(false) => k(env),
                    }
                } else {
                    self.match_one(inner, subject, path, env, k)
                }
            }

            NodeKind::Guard { inner, expr } => {
                let inner = *inner;
                self.match_one(inner, subject, path, env, &mut |env| {
                    match eval_guard(expr, env) {
                        GuardOutcome::Holds => k(env),
                        GuardOutcome::Fails => Sig::More,
                        GuardOutcome::Defer => attempt(env, |env| {
                            env.push_deferred(id);
                            k(env)
                        }),
                    }
                })
            }

            NodeKind::Flow { inner, bucket } => {
                let inner = *inner;
                self.match_one(inner, subject, path, env, &mut |env| {
                    attempt(env, |env| {
                        if self.pour(bucket, subject, env) {
                            k(env)
                        } else {
                            Sig::More
                        }
                    })
                })
            }

            NodeKind::Label { inner, .. } => self.match_one(*inner, subject, path, env, k),

            NodeKind::Marker { inner } => {
                let inner = *inner;
                self.match_one(inner, subject, path, env, &mut |env| {
                    attempt(env, |env| {
                        env.push_marked(Occurrence {
                            path: path.to_vec(),
                            kind: OccKind::Node,
                        });
                        k(env)
                    })
                })
            }

            // Run-shaped nodes cannot match one subject: `$x=(P)` with
            // a sequence-shaped P fails here rather than erroring.
            NodeKind::Seq(_)
            | NodeKind::Quant { .. }
            | NodeKind::Spread
            | NodeKind::Epsilon => Sig::More,
        }
    }

    /// Does `id` match `subject` at all? Effects are rolled back either
    /// way.
    pub(crate) fn probe_one(
        &self,
        id: NodeId,
        subject: &Value,
        path: &[PathStep],
        env: &mut Env,
    ) -> Result<bool, MatchError> {
        let snap = env.snapshot();
        let sig = self.match_one(id, subject, path, env, &mut |_env| Sig::Stop);
        env.rollback(snap);
        match sig {
            Sig::Stop => Ok(true),
            Sig::More => Ok(false),
            Sig::Abort(err) => Err(err),
        }
    }

    // =========================================================================
    // Key patterns
    // =========================================================================

    /// Match a key pattern against a key string of the object at
    /// `container_path`.
    pub(crate) fn match_key(
        &self,
        id: NodeId,
        key: &str,
        container_path: &[PathStep],
        env: &mut Env,
        k: Cont,
    ) -> Sig {
        if let Err(err) = self.tick() {
            return Sig::Abort(err);
        }

        match &self.program.nodes[id].kind {
            NodeKind::Literal(Lit::Str(s)) => {
                if s == key {
                    k(env)
                } else {
                    Sig::More
                }
            }
            NodeKind::Literal(_) => Sig::More,

            NodeKind::CaseInsensitive(text) => {
                if key.to_lowercase() == *text {
                    k(env)
                } else {
                    Sig::More
                }
            }

            NodeKind::Regex(_) => {
                if self
                    .program
                    .regex(id)
                    .map(|regex| regex.is_match(key))
                    .unwrap_or(false)
                {
                    k(env)
                } else {
                    Sig::More
                }
            }

            NodeKind::Wildcard => k(env),

            NodeKind::TypedWildcard(tendril_lex::TypeTag::String) => k(env),
            NodeKind::TypedWildcard(_) => Sig::More,

            NodeKind::Var(sym) => {
                let sym = *sym;
                attempt(env, |env| {
                    let occ = Occurrence {
                        path: container_path.to_vec(),
                        kind: OccKind::KeyOf {
                            key: key.to_string(),
                        },
                    };
                    if env.bind_or_unify(sym, &Value::String(key.to_string()), occ) {
                        k(env)
                    } else {
                        Sig::More
                    }
                })
            }

            NodeKind::Bind {
                inner,
                sigil: BindSigil::Scalar,
                name,
            } => {
                let (inner, name) = (*inner, *name);
                self.match_key(inner, key, container_path, env, &mut |env| {
                    attempt(env, |env| {
                        let occ = Occurrence {
                            path: container_path.to_vec(),
                            kind: OccKind::KeyOf {
                                key: key.to_string(),
                            },
                        };
                        if env.bind_or_unify(name, &Value::String(key.to_string()), occ) {
                            k(env)
                        } else {
                            Sig::More
                        }
                    })
                })
            }

            NodeKind::Alt(branches) => {
                for &branch in branches {
                    match self.match_key(branch, key, container_path, env, &mut *k) {
                        Sig::More => continue,
                        other => return other,
                    }
                }
                Sig::More
            }

            NodeKind::Else { primary, fallback } => {
                let (primary, fallback) = (*primary, *fallback);
                match self.probe_key(primary, key, container_path, env) {
                    Err(err) => Sig::Abort(err),
                    Ok(true) => self.match_key(primary, key, container_path, env, k),
                    Ok(false) => self.match_key(fallback, key, container_path, env, k),
                }
            }

            NodeKind::Guard { inner, expr } => {
                let inner = *inner;
                self.match_key(inner, key, container_path, env, &mut |env| {
                    match eval_guard(expr, env) {
                        GuardOutcome::Holds => k(env),
                        GuardOutcome::Fails => Sig::More,
                        GuardOutcome::Defer => attempt(env, |env| {
                            env.push_deferred(id);
                            k(env)
                        }),
                    }
                })
            }

            NodeKind::Lookahead { inner, negative } => {
                let inner = *inner;
                if *negative {
                    match self.probe_key(inner, key, container_path, env) {
                        Err(err) => Sig::Abort(err),
                        Ok(true) => Sig::More,
                        Ok(false) => k(env),
                    }
                } else {
                    self.match_key(inner, key, container_path, env, k)
                }
            }

            NodeKind::Marker { inner } => {
                let inner = *inner;
                self.match_key(inner, key, container_path, env, &mut |env| {
                    attempt(env, |env| {
                        env.push_marked(Occurrence {
                            path: container_path.to_vec(),
                            kind: OccKind::KeyOf {
                                key: key.to_string(),
                            },
                        });
                        k(env)
                    })
                })
            }

            NodeKind::Label { inner, .. } => self.match_key(*inner, key, container_path, env, k),

            // Keys are strings; structural patterns never match them.
            _ => Sig::More,
        }
    }

    pub(crate) fn probe_key(
        &self,
        id: NodeId,
        key: &str,
        container_path: &[PathStep],
        env: &mut Env,
    ) -> Result<bool, MatchError> {
        let snap = env.snapshot();
        let sig = self.match_key(id, key, container_path, env, &mut |_env| Sig::Stop);
        env.rollback(snap);
        match sig {
            Sig::Stop => Ok(true),
            Sig::More => Ok(false),
            Sig::Abort(err) => Err(err),
        }
    }

    // =========================================================================
    // Buckets
    // =========================================================================

    /// Pour the matched value into a bucket. For `%` buckets the key is
    /// the innermost K:V context; a duplicate key with a different
    /// value is a conflict (false).
    pub(crate) fn pour(&self, bucket: &BucketRef, value: &Value, env: &mut Env) -> bool {
        match bucket.sigil {
            BucketSigil::Seq => {
                env.pour_item(bucket.name, value);
                true
            }
            BucketSigil::Map => {
                let Some(key) = env.current_key().map(str::to_string) else {
                    return false;
                };
                env.pour_pair(bucket.name, &key, value)
            }
        }
    }

    // =========================================================================
    // Emission
    // =========================================================================

    /// Build a [`Solution`] from the current environment, or `None` if
    /// a deferred guard does not hold.
    fn emit(&self, env: &mut Env) -> Option<Solution> {
        for gid in env.deferred().to_vec() {
            let NodeKind::Guard { expr, .. } = &self.program.nodes[gid].kind else {
                continue;
            };
            // Still-unresolved guards fail the branch at emission.
            if eval_guard(expr, env) != GuardOutcome::Holds {
                return None;
            }
        }

        let mut bindings = indexmap::IndexMap::new();
        let mut occurrences = indexmap::IndexMap::new();
        let symbols: Vec<_> = env.bound_symbols().collect();
        for sym in symbols {
            let name = self.program.name(sym).to_string();
            if let Some(value) = env.get(sym) {
                bindings.insert(name.clone(), value.clone());
            }
            occurrences.insert(name, env.occurrences_of(sym).to_vec());
        }

        for shape in &self.program.buckets {
            let name = self.program.name(shape.name).to_string();
            let value = match env.bucket(shape.name) {
                Some(BucketState::Pairs(pairs)) => Value::Object(pairs.clone()),
                Some(BucketState::Items(items)) => Value::Array(items.clone()),
                None => match shape.sigil {
                    BucketSigil::Map => Value::Object(Default::default()),
                    BucketSigil::Seq => Value::Array(Vec::new()),
                },
            };
            bindings.insert(name, value);
        }

        Some(Solution {
            bindings,
            occurrences,
            marked: env.marked().to_vec(),
        })
    }
}

fn lit_matches(lit: &Lit, subject: &Value) -> bool {
    match (lit, subject) {
        (Lit::Null, Value::Null) => true,
        (Lit::Bool(a), Value::Bool(b)) => a == b,
        (Lit::Number(a), Value::Number(b)) => *a == *b || (a.is_nan() && b.is_nan()),
        (Lit::Str(a), Value::String(b)) => a == b,
        _ => false,
    }
}
