//! Sequence matching: runs, quantifiers, spreads, slice bindings.
//!
//! A run continuation receives the position the run ended at; the array
//! body as a whole is anchored (a leading/trailing `...` is just an
//! item that consumes the slack).

use tendril_par::ast::{BindSigil, NodeId, NodeKind, QuantMode};
use tendril_util::MatchError;
use tendril_value::{PathStep, Value};

use super::{attempt, extend, Matcher, RunCont, Sig};
use crate::env::Env;
use crate::eval::{eval_guard, GuardOutcome};
use crate::solution::{OccKind, Occurrence};

impl<'p> Matcher<'p> {
    /// Match `id` as a run over `arr` starting at `pos`; `k` receives
    /// the end position of each way the run can succeed.
    pub(crate) fn match_run(
        &self,
        id: NodeId,
        arr: &[Value],
        arr_path: &[PathStep],
        pos: usize,
        env: &mut Env,
        k: RunCont,
    ) -> Sig {
        if let Err(err) = self.tick() {
            return Sig::Abort(err);
        }

        match &self.program.nodes[id].kind {
            NodeKind::Epsilon => k(env, pos),

            NodeKind::Seq(items) => self.match_items(items, 0, arr, arr_path, pos, env, k),

            NodeKind::Alt(branches) => {
                for &branch in branches {
                    match self.match_run(branch, arr, arr_path, pos, env, &mut *k) {
                        Sig::More => continue,
                        other => return other,
                    }
                }
                Sig::More
            }

            NodeKind::Else { primary, fallback } => {
                let (primary, fallback) = (*primary, *fallback);
                match self.probe_run(primary, arr, arr_path, pos, env) {
                    Err(err) => Sig::Abort(err),
                    Ok(true) => self.match_run(primary, arr, arr_path, pos, env, k),
                    Ok(false) => self.match_run(fallback, arr, arr_path, pos, env, k),
                }
            }

            NodeKind::Quant {
                inner,
                min,
                max,
                mode,
            } => {
                let (inner, min, max) = (*inner, *min, *max);
                match mode {
                    QuantMode::Greedy => {
                        self.quant_greedy(inner, min, max, arr, arr_path, pos, 0, env, k)
                    }
                    QuantMode::Lazy => {
                        self.quant_lazy(inner, min, max, arr, arr_path, pos, 0, env, k)
                    }
                    QuantMode::Possessive => {
                        self.quant_possessive(inner, min, max, arr, arr_path, pos, env, k)
                    }
                }
            }

            // `...` is `_*`: greedy slack, longest first.
            NodeKind::Spread => {
                let mut end = arr.len();
                loop {
                    match k(env, end) {
                        Sig::More => {}
                        other => return other,
                    }
                    if end == pos {
                        return Sig::More;
                    }
                    end -= 1;
                }
            }

            NodeKind::Lookahead { inner, negative } => {
                let inner = *inner;
                if *negative {
                    match self.probe_run(inner, arr, arr_path, pos, env) {
                        Err(err) => Sig::Abort(err),
                        Ok(true) => Sig::More,
                        Ok(false) => k(env, pos),
                    }
                } else {
                    // Zero-width: bindings leak, the position does not.
                    self.match_run(inner, arr, arr_path, pos, env, &mut |env, _end| {
                        k(env, pos)
                    })
                }
            }

            NodeKind::Bind {
                inner,
                sigil: BindSigil::Seq,
                name,
            } => {
                let (inner, name) = (*inner, *name);
                self.match_run(inner, arr, arr_path, pos, env, &mut |env, end| {
                    attempt(env, |env| {
                        let slice = Value::Array(arr[pos..end].to_vec());
                        let occ = Occurrence {
                            path: arr_path.to_vec(),
                            kind: OccKind::Slice { start: pos, end },
                        };
                        if env.bind_or_unify(name, &slice, occ) {
                            k(env, end)
                        } else {
                            Sig::More
                        }
                    })
                })
            }

            NodeKind::Flow { inner, bucket } => {
                let inner = *inner;
                self.match_run(inner, arr, arr_path, pos, env, &mut |env, end| {
                    let value = if end == pos + 1 {
                        arr[pos].clone()
                    } else {
                        Value::Array(arr[pos..end].to_vec())
                    };
                    attempt(env, |env| {
                        if self.pour(bucket, &value, env) {
                            k(env, end)
                        } else {
                            Sig::More
                        }
                    })
                })
            }

            NodeKind::Guard { inner, expr } => {
                let inner = *inner;
                self.match_run(inner, arr, arr_path, pos, env, &mut |env, end| {
                    match eval_guard(expr, env) {
                        GuardOutcome::Holds => k(env, end),
                        GuardOutcome::Fails => Sig::More,
                        GuardOutcome::Defer => attempt(env, |env| {
                            env.push_deferred(id);
                            k(env, end)
                        }),
                    }
                })
            }

            NodeKind::Marker { inner } => {
                let inner = *inner;
                self.match_run(inner, arr, arr_path, pos, env, &mut |env, end| {
                    attempt(env, |env| {
                        env.push_marked(Occurrence {
                            path: arr_path.to_vec(),
                            kind: OccKind::Slice { start: pos, end },
                        });
                        k(env, end)
                    })
                })
            }

            NodeKind::Label { inner, .. } => self.match_run(*inner, arr, arr_path, pos, env, k),

            // Everything else is an atomic item: one element.
            _ => {
                if pos >= arr.len() {
                    return Sig::More;
                }
                let child_path = extend(arr_path, PathStep::Index(pos));
                self.match_one(id, &arr[pos], &child_path, env, &mut |env| k(env, pos + 1))
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn match_items(
        &self,
        items: &[NodeId],
        idx: usize,
        arr: &[Value],
        arr_path: &[PathStep],
        pos: usize,
        env: &mut Env,
        k: RunCont,
    ) -> Sig {
        if idx == items.len() {
            return k(env, pos);
        }
        self.match_run(items[idx], arr, arr_path, pos, env, &mut |env, next| {
            self.match_items(items, idx + 1, arr, arr_path, next, env, &mut *k)
        })
    }

    fn probe_run(
        &self,
        id: NodeId,
        arr: &[Value],
        arr_path: &[PathStep],
        pos: usize,
        env: &mut Env,
    ) -> Result<bool, MatchError> {
        let snap = env.snapshot();
        let sig = self.match_run(id, arr, arr_path, pos, env, &mut |_env, _end| Sig::Stop);
        env.rollback(snap);
        match sig {
            Sig::Stop => Ok(true),
            Sig::More => Ok(false),
            Sig::Abort(err) => Err(err),
        }
    }

    /// Greedy repetition: longest count first. A zero-width inner match
    /// stops the expansion instead of recursing forever.
    #[allow(clippy::too_many_arguments)]
    fn quant_greedy(
        &self,
        inner: NodeId,
        min: u32,
        max: Option<u32>,
        arr: &[Value],
        arr_path: &[PathStep],
        pos: usize,
        count: u32,
        env: &mut Env,
        k: RunCont,
    ) -> Sig {
        if max.map_or(true, |m| count < m) {
            let sig = self.match_run(inner, arr, arr_path, pos, env, &mut |env, end| {
                if end > pos {
                    self.quant_greedy(inner, min, max, arr, arr_path, end, count + 1, env, &mut *k)
                } else {
                    Sig::More
                }
            });
            if !matches!(sig, Sig::More) {
                return sig;
            }
        }
        if count >= min {
            k(env, pos)
        } else {
            Sig::More
        }
    }

    /// Lazy repetition: shortest count first.
    #[allow(clippy::too_many_arguments)]
    fn quant_lazy(
        &self,
        inner: NodeId,
        min: u32,
        max: Option<u32>,
        arr: &[Value],
        arr_path: &[PathStep],
        pos: usize,
        count: u32,
        env: &mut Env,
        k: RunCont,
    ) -> Sig {
        if count >= min {
            match k(env, pos) {
                Sig::More => {}
                other => return other,
            }
        }
        if max.map_or(true, |m| count < m) {
            return self.match_run(inner, arr, arr_path, pos, env, &mut |env, end| {
                if end > pos {
                    self.quant_lazy(inner, min, max, arr, arr_path, end, count + 1, env, &mut *k)
                } else {
                    Sig::More
                }
            });
        }
        Sig::More
    }

    /// Possessive repetition: commit the first solution of each
    /// iteration, as many iterations as possible, and never backtrack
    /// into the repetition.
    #[allow(clippy::too_many_arguments)]
    fn quant_possessive(
        &self,
        inner: NodeId,
        min: u32,
        max: Option<u32>,
        arr: &[Value],
        arr_path: &[PathStep],
        pos: usize,
        env: &mut Env,
        k: RunCont,
    ) -> Sig {
        let outer = env.snapshot();
        let mut cur = pos;
        let mut count = 0u32;

        loop {
            if max == Some(count) {
                break;
            }
            let mut advanced = None;
            let sig = self.match_run(inner, arr, arr_path, cur, env, &mut |_env, end| {
                advanced = Some(end);
                Sig::Stop
            });
            match sig {
                Sig::Abort(err) => {
                    return Sig::Abort(err);
                }
                Sig::Stop => match advanced {
                    Some(end) if end > cur => {
                        cur = end;
                        count += 1;
                    }
                    _ => break,
                },
                Sig::More => break,
            }
        }

        if count >= min {
            let sig = k(env, cur);
            if matches!(sig, Sig::More) {
                env.rollback(outer);
            }
            sig
        } else {
            env.rollback(outer);
            Sig::More
        }
    }
}
