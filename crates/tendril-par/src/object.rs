//! Object-body parsing: K:V assertions, `each`, negative assertions,
//! residuals, flows, collecting clauses, and dotted paths in key
//! position.

use tendril_lex::TokenKind;
use tendril_util::error::CompileResult;
use tendril_util::{CompileError, Symbol};

use crate::ast::{
    BucketRef, BucketSigil, KeyPattern, Lit, NodeId, NodeKind, ObjBody, ObjEntry, ObjEntryKind,
    PathSeg, ResidualEntry,
};
use crate::Parser;

impl Parser {
    /// Parse an object body; the opening brace is already consumed.
    pub(crate) fn parse_object(&mut self, start: usize) -> CompileResult<NodeId> {
        let mut entries = Vec::new();
        let mut residual: Option<ResidualEntry> = None;

        loop {
            while self.eat(&TokenKind::Comma) {}
            if self.eat(&TokenKind::RBrace) {
                break;
            }
            if self.check(&TokenKind::Eof) {
                return Err(self.err_here("unclosed object pattern"));
            }
            if residual.is_some() {
                return Err(self.err_here(
                    "the residual must be the last entry in an object pattern",
                ));
            }

            let entry_start = self.peek_span().start;
            match self.peek().clone() {
                TokenKind::Ellipsis => {
                    let span = self.advance().span;
                    entries.push(ObjEntry {
                        kind: ObjEntryKind::Spread,
                        span,
                    });
                }
                TokenKind::Lt if matches!(self.peek_at(1), TokenKind::Ident(w) if w == "collecting") =>
                {
                    entries.push(self.parse_collecting()?);
                }
                TokenKind::Arrow => {
                    self.advance();
                    let bucket = self.parse_bucket_ref()?;
                    let span = self.span_from(entry_start);
                    entries.push(ObjEntry {
                        kind: ObjEntryKind::FlowClause(bucket),
                        span,
                    });
                }
                TokenKind::Percent => {
                    residual = Some(self.parse_bare_residual(entry_start)?);
                }
                TokenKind::LParen if matches!(self.peek_at(1), TokenKind::Percent) => {
                    residual = Some(self.parse_bound_residual(entry_start)?);
                }
                TokenKind::LParenBang if matches!(self.peek_at(1), TokenKind::Percent) => {
                    // `(!%)` - zero uncovered keys.
                    self.advance();
                    self.advance();
                    self.expect(&TokenKind::RParen, "to close '(!%)'")?;
                    residual = Some(ResidualEntry {
                        min: 0,
                        max: Some(0),
                        bind: None,
                        span: self.span_from(entry_start),
                    });
                }
                TokenKind::LParenBang => {
                    entries.push(self.parse_not_assert(entry_start)?);
                }
                TokenKind::Ident(w)
                    if w == "each" && !matches!(self.peek_at(1), TokenKind::Colon) =>
                {
                    self.advance();
                    entries.push(self.parse_assert(entry_start, true)?);
                }
                _ => {
                    entries.push(self.parse_assert(entry_start, false)?);
                }
            }
        }

        let span = self.span_from(start);
        Ok(self.add(NodeKind::Object(ObjBody { entries, residual }), span))
    }

    /// `K : V ("else" V)* ?` with `each` already consumed by the caller
    /// when present.
    fn parse_assert(&mut self, start: usize, each: bool) -> CompileResult<ObjEntry> {
        let key = self.parse_key_pattern()?;
        self.expect(&TokenKind::Colon, "after the key pattern")?;
        let value = self.parse_single()?;
        let optional = self.eat(&TokenKind::Question);
        Ok(ObjEntry {
            kind: ObjEntryKind::Assert {
                key,
                value,
                each,
                optional,
            },
            span: self.span_from(start),
        })
    }

    /// `(!K : V)` with the `(!` still current.
    fn parse_not_assert(&mut self, start: usize) -> CompileResult<ObjEntry> {
        self.advance();
        let key = self.parse_key_pattern()?;
        self.expect(&TokenKind::Colon, "after the key pattern in '(!K:V)'")?;
        let value = self.parse_single()?;
        self.expect(&TokenKind::RParen, "to close the negative assertion")?;
        Ok(ObjEntry {
            kind: ObjEntryKind::NotAssert { key, value },
            span: self.span_from(start),
        })
    }

    /// A key position: one pattern, or a dotted path of fixed keys.
    pub(crate) fn parse_key_pattern(&mut self) -> CompileResult<KeyPattern> {
        if self.check(&TokenKind::DotDot) {
            return Ok(KeyPattern::Path(self.parse_path_segments(Vec::new())?));
        }

        let node = self.parse_single()?;
        if self.check(&TokenKind::Dot) || self.check(&TokenKind::DotDot) {
            let first = self.fixed_key_of(node)?;
            let segs = vec![first];
            return Ok(KeyPattern::Path(self.parse_path_segments(segs)?));
        }
        Ok(KeyPattern::Node(node))
    }

    /// Continue a dotted path: `.key` fixed descent, `..key` deep
    /// descent.
    fn parse_path_segments(&mut self, mut segs: Vec<PathSeg>) -> CompileResult<Vec<PathSeg>> {
        loop {
            let deep = if self.eat(&TokenKind::Dot) {
                false
            } else if self.eat(&TokenKind::DotDot) {
                true
            } else {
                break;
            };

            let span = self.peek_span();
            let key = match self.peek().clone() {
                TokenKind::Ident(w) => {
                    self.advance();
                    w
                }
                TokenKind::Str(s) => {
                    self.advance();
                    s
                }
                other => {
                    return Err(self.err_here(format!(
                        "expected a key name in the path, found {}",
                        other.describe()
                    )));
                }
            };
            segs.push(PathSeg { deep, key, span });
        }
        Ok(segs)
    }

    /// A path's first segment must already be a fixed key literal.
    fn fixed_key_of(&self, node: NodeId) -> CompileResult<PathSeg> {
        let n = &self.nodes[node];
        match &n.kind {
            NodeKind::Literal(Lit::Str(s)) => Ok(PathSeg {
                deep: false,
                key: s.clone(),
                span: n.span,
            }),
            _ => Err(CompileError::parse(
                n.span,
                "path segments must be fixed keys",
            )),
        }
    }

    /// `<collecting $k:$v in %b across ^L>` or
    /// `<collecting $v in @b across ^L>`.
    fn parse_collecting(&mut self) -> CompileResult<ObjEntry> {
        let start = self.peek_span().start;
        self.advance();
        self.advance();

        let first = self.expect_scalar_var("in '<collecting ...>'")?;
        let second = if self.eat(&TokenKind::Colon) || self.eat(&TokenKind::Comma) {
            Some(self.expect_scalar_var("after ':' in '<collecting ...>'")?)
        } else {
            None
        };

        if !self.is_word("in") {
            return Err(self.err_here("expected 'in' in '<collecting ...>'"));
        }
        self.advance();

        let mut bucket = self.parse_bucket_token()?;

        if !self.is_word("across") {
            return Err(self.err_here("expected 'across' in '<collecting ...>'"));
        }
        self.advance();
        match self.peek().clone() {
            TokenKind::LabelRef(label) => {
                self.advance();
                bucket.across = Some(self.intern(&label));
            }
            other => {
                return Err(self.err_here(format!(
                    "expected '^label' after 'across', found {}",
                    other.describe()
                )));
            }
        }

        self.expect(&TokenKind::Gt, "to close '<collecting ...>'")?;

        let (key, value) = match second {
            Some(v) => (Some(first), v),
            None => (None, first),
        };
        Ok(ObjEntry {
            kind: ObjEntryKind::Collecting { key, value, bucket },
            span: self.span_from(start),
        })
    }

    fn expect_scalar_var(&mut self, context: &str) -> CompileResult<Symbol> {
        match self.peek().clone() {
            TokenKind::ScalarVar(name) => {
                self.advance();
                Ok(self.intern(&name))
            }
            other => Err(self.err_here(format!(
                "expected '$name' {context}, found {}",
                other.describe()
            ))),
        }
    }

    /// A `%b` / `@b` bucket naming token (no arrow).
    fn parse_bucket_token(&mut self) -> CompileResult<BucketRef> {
        let span = self.peek_span();
        let (sigil, name) = match self.peek().clone() {
            TokenKind::MapVar(n) => {
                self.advance();
                (BucketSigil::Map, n)
            }
            TokenKind::SeqVar(n) => {
                self.advance();
                (BucketSigil::Seq, n)
            }
            other => {
                return Err(self.err_here(format!(
                    "expected '%bucket' or '@bucket', found {}",
                    other.describe()
                )));
            }
        };
        let name = self.intern(&name);
        Ok(BucketRef {
            sigil,
            name,
            across: None,
            span,
        })
    }

    /// Bare `%`, `%?`, `%#{m,n}`.
    fn parse_bare_residual(&mut self, start: usize) -> CompileResult<ResidualEntry> {
        self.advance();
        let (min, max) = self.parse_residual_counts()?;
        Ok(ResidualEntry {
            min,
            max,
            bind: None,
            span: self.span_from(start),
        })
    }

    /// `(% ... as %x)` with the paren still current.
    fn parse_bound_residual(&mut self, start: usize) -> CompileResult<ResidualEntry> {
        self.advance();
        self.advance();
        let (min, max) = self.parse_residual_counts()?;

        let bind = if self.is_word("as") {
            self.advance();
            match self.peek().clone() {
                TokenKind::MapVar(name) => {
                    self.advance();
                    Some(self.intern(&name))
                }
                other => {
                    return Err(self.err_here(format!(
                        "the residual binds to a '%name' variable, found {}",
                        other.describe()
                    )));
                }
            }
        } else {
            None
        };

        self.expect(&TokenKind::RParen, "to close the residual")?;
        Ok(ResidualEntry {
            min,
            max,
            bind,
            span: self.span_from(start),
        })
    }

    /// The count suffix after `%`: nothing (at least one), `?` (any),
    /// or `#{m,n}`.
    fn parse_residual_counts(&mut self) -> CompileResult<(u32, Option<u32>)> {
        if self.eat(&TokenKind::Question) {
            return Ok((0, None));
        }
        if self.eat(&TokenKind::Hash) {
            self.expect(&TokenKind::LBrace, "after '#' in the residual count")?;
            let bounds = self.parse_bounds()?;
            self.expect(&TokenKind::RBrace, "to close the residual count")?;
            return Ok(bounds);
        }
        Ok((1, None))
    }
}
