//! The validation walk.

use regex::Regex;
use rustc_hash::{FxHashMap, FxHashSet};

use tendril_par::ast::{
    Ast, BindSigil, BucketRef, BucketSigil, GuardExpr, KeyPattern, Node, NodeId, NodeKind,
    ObjBody, ObjEntryKind, RegexLit,
};
use tendril_util::error::CompileResult;
use tendril_util::{CompileError, Idx, IndexVec, Interner, Span, Symbol};

use crate::program::{BucketShape, Program};

/// Validate a parsed pattern, producing an immutable [`Program`].
pub fn validate(ast: Ast) -> CompileResult<Program> {
    let Ast {
        mut nodes,
        root,
        mut interner,
    } = ast;

    normalize(&mut nodes);
    let sym_root = interner.intern("0");

    let mut v = Validator {
        nodes: &nodes,
        interner: &interner,
        regexes: FxHashMap::default(),
        group_names: FxHashMap::default(),
        buckets: Vec::new(),
        scalar_names: FxHashMap::default(),
        bindable: FxHashSet::default(),
        referenced: Vec::new(),
        labels: Vec::new(),
        scopes: vec![ScopeId::Root],
        each_counter: 0,
        marker: None,
    };

    v.walk(
        root,
        Cx {
            in_seq: false,
            marker_ok: true,
            in_key_ctx: false,
        },
    )?;

    for (name, span) in std::mem::take(&mut v.referenced) {
        if !v.bindable.contains(&name) {
            return Err(CompileError::guard(
                span,
                format!(
                    "variable `${}` has no binding site in the pattern",
                    v.interner.resolve(name)
                ),
            ));
        }
    }

    let Validator {
        regexes,
        buckets,
        marker,
        ..
    } = v;

    Ok(Program {
        nodes,
        root,
        interner,
        regexes,
        buckets,
        marker,
        sym_root,
    })
}

/// Fold away trivial structure so the engine sees canonical shapes:
/// single-branch alternations become the branch, empty sequences become
/// epsilon, single-item sequences become the item.
fn normalize(nodes: &mut IndexVec<NodeId, Node>) {
    for i in 0..nodes.len() {
        let id = NodeId::from_usize(i);
        let replacement = match &nodes[id].kind {
            NodeKind::Alt(branches) if branches.len() == 1 => {
                Some(nodes[branches[0]].kind.clone())
            }
            NodeKind::Seq(items) if items.is_empty() => Some(NodeKind::Epsilon),
            NodeKind::Seq(items) if items.len() == 1 => Some(nodes[items[0]].kind.clone()),
            _ => None,
        };
        if let Some(kind) = replacement {
            nodes[id].kind = kind;
        }
    }
}

/// Identity of a bucket's enclosing scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ScopeId {
    Root,
    Label(Symbol),
    Each(u32),
}

/// How a `@x` / `%x` name is used.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum GroupUse {
    Bind,
    Bucket(ScopeId),
}

/// Walk context.
#[derive(Clone, Copy)]
struct Cx {
    /// Inside an array/run, where items consume elements.
    in_seq: bool,
    /// A `>> ... <<` marker is permitted at this position.
    marker_ok: bool,
    /// An enclosing K:V assertion supplies a current key (needed by
    /// map-bucket flows).
    in_key_ctx: bool,
}

struct Validator<'a> {
    nodes: &'a IndexVec<NodeId, Node>,
    interner: &'a Interner,
    regexes: FxHashMap<NodeId, Regex>,
    /// `@`/`%` names: binds, buckets, residual binds share one
    /// namespace.
    group_names: FxHashMap<Symbol, (BucketSigil, GroupUse, Span)>,
    buckets: Vec<BucketShape>,
    scalar_names: FxHashMap<Symbol, Span>,
    bindable: FxHashSet<Symbol>,
    /// Variables referenced without binding (guards, collecting
    /// clauses); checked against `bindable` at the end.
    referenced: Vec<(Symbol, Span)>,
    labels: Vec<Symbol>,
    scopes: Vec<ScopeId>,
    each_counter: u32,
    marker: Option<NodeId>,
}

impl<'a> Validator<'a> {
    fn walk(&mut self, id: NodeId, cx: Cx) -> CompileResult<()> {
        let node = &self.nodes[id];
        let span = node.span;
        match &node.kind {
            NodeKind::Literal(_)
            | NodeKind::CaseInsensitive(_)
            | NodeKind::Wildcard
            | NodeKind::TypedWildcard(_)
            | NodeKind::Epsilon => Ok(()),

            NodeKind::Regex(lit) => self.compile_regex(id, lit, span),

            NodeKind::Spread => {
                if cx.in_seq {
                    Ok(())
                } else {
                    Err(CompileError::validate(
                        span,
                        "'...' is only meaningful inside a sequence",
                    ))
                }
            }

            NodeKind::Var(name) => {
                self.register_scalar(*name, span)?;
                Ok(())
            }

            NodeKind::Bind { inner, sigil, name } => {
                match sigil {
                    BindSigil::Scalar => self.register_scalar(*name, span)?,
                    BindSigil::Seq => {
                        if !cx.in_seq {
                            return Err(CompileError::validate(
                                span,
                                format!(
                                    "slice binding `@{}` requires a sequence context",
                                    self.interner.resolve(*name)
                                ),
                            ));
                        }
                        self.register_group(*name, BucketSigil::Seq, GroupUse::Bind, span)?;
                    }
                    BindSigil::Map => {
                        self.register_group(*name, BucketSigil::Map, GroupUse::Bind, span)?;
                    }
                }
                self.bindable.insert(*name);
                let inner_cx = Cx {
                    // `$x=(P)` and `(P as %x)` take one subject; only a
                    // slice binding keeps consuming the enclosing run.
                    in_seq: *sigil == BindSigil::Seq && cx.in_seq,
                    ..cx
                };
                self.walk(*inner, inner_cx)
            }

            NodeKind::Array(body) => self.walk(
                *body,
                Cx {
                    in_seq: true,
                    ..cx
                },
            ),

            NodeKind::Seq(items) => {
                for item in items {
                    self.walk(*item, cx)?;
                }
                Ok(())
            }

            NodeKind::Object(body) => self.walk_object(body, cx),

            NodeKind::Set { items, .. } => {
                for item in items {
                    self.walk(
                        *item,
                        Cx {
                            in_seq: false,
                            marker_ok: false,
                            ..cx
                        },
                    )?;
                }
                Ok(())
            }

            NodeKind::Alt(branches) => {
                for branch in branches {
                    self.walk(*branch, cx)?;
                }
                Ok(())
            }

            NodeKind::Else { primary, fallback } => {
                self.walk(*primary, cx)?;
                self.walk(*fallback, cx)
            }

            NodeKind::Quant { inner, .. } => self.walk(*inner, cx),

            NodeKind::Lookahead { inner, .. } => self.walk(
                *inner,
                Cx {
                    marker_ok: false,
                    ..cx
                },
            ),

            NodeKind::Flow { inner, bucket } => {
                self.check_flow_key_context(bucket, cx)?;
                self.register_bucket(bucket)?;
                self.walk(*inner, cx)
            }

            NodeKind::Label { name, inner } => {
                self.labels.push(*name);
                self.scopes.push(ScopeId::Label(*name));
                let result = self.walk(*inner, cx);
                self.scopes.pop();
                self.labels.pop();
                result
            }

            NodeKind::Guard { inner, expr } => {
                self.walk(*inner, cx)?;
                self.collect_guard_vars(expr);
                Ok(())
            }

            NodeKind::Marker { inner } => {
                if !cx.marker_ok {
                    return Err(CompileError::validate(
                        span,
                        "a replacement marker is not allowed in this position",
                    ));
                }
                if self.marker.is_some() {
                    return Err(CompileError::validate(
                        span,
                        "at most one '>> ... <<' replacement marker is allowed per pattern",
                    ));
                }
                self.marker = Some(id);
                self.walk(
                    *inner,
                    Cx {
                        marker_ok: false,
                        ..cx
                    },
                )
            }
        }
    }

    fn walk_object(&mut self, body: &ObjBody, cx: Cx) -> CompileResult<()> {
        for entry in &body.entries {
            match &entry.kind {
                ObjEntryKind::Assert {
                    key,
                    value,
                    each,
                    optional: _,
                } => {
                    self.walk_key(key, cx)?;
                    let value_cx = Cx {
                        in_seq: false,
                        marker_ok: cx.marker_ok,
                        in_key_ctx: true,
                    };
                    if *each {
                        self.each_counter += 1;
                        self.scopes.push(ScopeId::Each(self.each_counter));
                        let result = self.walk(*value, value_cx);
                        self.scopes.pop();
                        result?;
                    } else {
                        self.walk(*value, value_cx)?;
                    }
                }
                ObjEntryKind::NotAssert { key, value } => {
                    let inner_cx = Cx {
                        in_seq: false,
                        marker_ok: false,
                        in_key_ctx: true,
                    };
                    self.walk_key(key, inner_cx)?;
                    self.walk(*value, inner_cx)?;
                }
                ObjEntryKind::FlowClause(bucket) => {
                    self.check_flow_key_context(bucket, cx)?;
                    self.register_bucket(bucket)?;
                }
                ObjEntryKind::Collecting { key, value, bucket } => {
                    let expects = if key.is_some() {
                        BucketSigil::Map
                    } else {
                        BucketSigil::Seq
                    };
                    if bucket.sigil != expects {
                        let msg = if key.is_some() {
                            "collecting a key:value pair requires a '%' bucket"
                        } else {
                            "collecting a single value requires an '@' bucket"
                        };
                        return Err(CompileError::validate(bucket.span, msg));
                    }
                    self.register_bucket(bucket)?;
                    if let Some(k) = key {
                        self.referenced.push((*k, entry.span));
                    }
                    self.referenced.push((*value, entry.span));
                }
                ObjEntryKind::Spread => {
                    return Err(CompileError::validate(
                        entry.span,
                        "'...' cannot appear in an object body; use the '%' residual",
                    ));
                }
            }
        }

        if let Some(residual) = &body.residual {
            if let Some(name) = residual.bind {
                self.register_group(name, BucketSigil::Map, GroupUse::Bind, residual.span)?;
                self.bindable.insert(name);
            }
        }
        Ok(())
    }

    fn walk_key(&mut self, key: &KeyPattern, cx: Cx) -> CompileResult<()> {
        match key {
            KeyPattern::Node(node) => self.walk(
                *node,
                Cx {
                    in_seq: false,
                    in_key_ctx: false,
                    ..cx
                },
            ),
            // Path segments are fixed strings; nothing to validate.
            KeyPattern::Path(_) => Ok(()),
        }
    }

    fn register_scalar(&mut self, name: Symbol, span: Span) -> CompileResult<()> {
        if let Some((sigil, _, _)) = self.group_names.get(&name) {
            return Err(self.sigil_conflict(name, *sigil, span));
        }
        self.scalar_names.entry(name).or_insert(span);
        self.bindable.insert(name);
        Ok(())
    }

    fn register_group(
        &mut self,
        name: Symbol,
        sigil: BucketSigil,
        use_kind: GroupUse,
        span: Span,
    ) -> CompileResult<()> {
        if self.scalar_names.contains_key(&name) {
            return Err(CompileError::validate(
                span,
                format!(
                    "`{}{}` conflicts with scalar variable `${}`",
                    sigil_char(sigil),
                    self.interner.resolve(name),
                    self.interner.resolve(name)
                ),
            ));
        }

        match self.group_names.get(&name) {
            None => {
                self.group_names.insert(name, (sigil, use_kind, span));
                Ok(())
            }
            Some((prev_sigil, prev_use, _)) => {
                if *prev_sigil != sigil {
                    return Err(self.sigil_conflict(name, *prev_sigil, span));
                }
                match (prev_use, use_kind) {
                    (GroupUse::Bucket(prev_scope), GroupUse::Bucket(scope)) => {
                        if *prev_scope != scope {
                            Err(CompileError::validate(
                                span,
                                format!(
                                    "bucket `{}{}` is used in disjoint scopes",
                                    sigil_char(sigil),
                                    self.interner.resolve(name)
                                ),
                            ))
                        } else {
                            Ok(())
                        }
                    }
                    (GroupUse::Bind, GroupUse::Bind) => Err(CompileError::validate(
                        span,
                        format!(
                            "`{}{}` is bound more than once",
                            sigil_char(sigil),
                            self.interner.resolve(name)
                        ),
                    )),
                    _ => Err(CompileError::validate(
                        span,
                        format!(
                            "`{}{}` is used both as a binding and as a bucket",
                            sigil_char(sigil),
                            self.interner.resolve(name)
                        ),
                    )),
                }
            }
        }
    }

    fn sigil_conflict(&self, name: Symbol, prev: BucketSigil, span: Span) -> CompileError {
        CompileError::validate(
            span,
            format!(
                "`{}` is used with conflicting sigils (`{}{}` elsewhere)",
                self.interner.resolve(name),
                sigil_char(prev),
                self.interner.resolve(name)
            ),
        )
    }

    /// A flow into a `%` bucket takes its key from the innermost K:V
    /// context, so there must be one. (A `<collecting>` clause names
    /// its key explicitly and needs no such context.)
    fn check_flow_key_context(&self, bucket: &BucketRef, cx: Cx) -> CompileResult<()> {
        if bucket.sigil == BucketSigil::Map && !cx.in_key_ctx {
            return Err(CompileError::validate(
                bucket.span,
                format!(
                    "object bucket `%{}` needs an enclosing key:value context",
                    self.interner.resolve(bucket.name)
                ),
            ));
        }
        Ok(())
    }

    fn register_bucket(&mut self, bucket: &BucketRef) -> CompileResult<()> {
        if let Some(label) = bucket.across {
            if !self.labels.contains(&label) {
                return Err(CompileError::validate(
                    bucket.span,
                    format!(
                        "unknown label `^{}`: no enclosing `§{}`",
                        self.interner.resolve(label),
                        self.interner.resolve(label)
                    ),
                ));
            }
        }

        let scope = match bucket.across {
            Some(label) => ScopeId::Label(label),
            None => *self.scopes.last().unwrap_or(&ScopeId::Root),
        };

        let is_new = !self.group_names.contains_key(&bucket.name);
        self.register_group(
            bucket.name,
            bucket.sigil,
            GroupUse::Bucket(scope),
            bucket.span,
        )?;
        if is_new {
            self.buckets.push(BucketShape {
                name: bucket.name,
                sigil: bucket.sigil,
            });
        }
        self.bindable.insert(bucket.name);
        Ok(())
    }

    fn collect_guard_vars(&mut self, expr: &GuardExpr) {
        match expr {
            GuardExpr::Null
            | GuardExpr::Bool(_)
            | GuardExpr::Number(_)
            | GuardExpr::Str(_) => {}
            GuardExpr::Var { name, span } => self.referenced.push((*name, *span)),
            GuardExpr::Unary { expr, .. } => self.collect_guard_vars(expr),
            GuardExpr::Binary { lhs, rhs, .. } => {
                self.collect_guard_vars(lhs);
                self.collect_guard_vars(rhs);
            }
            GuardExpr::Call { arg, .. } => self.collect_guard_vars(arg),
        }
    }

    fn compile_regex(&mut self, id: NodeId, lit: &RegexLit, span: Span) -> CompileResult<()> {
        let mut flags = String::new();
        if lit.ignore_case {
            flags.push('i');
        }
        if lit.multi_line {
            flags.push('m');
        }
        if lit.dot_all {
            flags.push('s');
        }

        // Anchor with \A..\z so `m` cannot turn full-match into
        // line-match.
        let wrapped = if flags.is_empty() {
            format!(r"\A(?:{})\z", lit.pattern)
        } else {
            format!(r"(?{})\A(?:{})\z", flags, lit.pattern)
        };

        match Regex::new(&wrapped) {
            Ok(regex) => {
                self.regexes.insert(id, regex);
                Ok(())
            }
            Err(err) => Err(CompileError::validate(
                span,
                format!("invalid regex /{}/: {err}", lit.pattern),
            )),
        }
    }
}

fn sigil_char(sigil: BucketSigil) -> char {
    match sigil {
        BucketSigil::Map => '%',
        BucketSigil::Seq => '@',
    }
}
