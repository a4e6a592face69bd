//! tendril-par - Pattern Parser
//!
//! Builds an arena AST from the token stream. The parser is recursive
//! descent with one token of lookahead for the grammar proper and a
//! Pratt sub-parser for guard expressions.
//!
//! Level structure, loosest to tightest:
//!
//! ```text
//! pattern  :=  alt ( "else" alt )*          prioritized choice, right-assoc
//! alt      :=  branch ( "|" branch )*       inclusive alternation
//! branch   :=  item* | item                 a run inside [..] / (..), else one item
//! item     :=  atom quant? flow?            postfix quantifier, then "-> bucket"
//! atom     :=  literal, wildcard, variable, [..], {..}, {{..}}, (..),
//!              (?..), (!..), >>..<<, §label atom
//! ```
//!
//! `|` and `else` cannot be mixed at one level: each `else` arm is
//! checked for naked pipes and vice versa, so `a | b else c` is a parse
//! error while `(a | b) else c` is fine.
//!
//! The contextual words `as`, `else`, `each`, `where`, `in`, `across`,
//! and `collecting` arrive as ordinary identifier tokens; this module
//! gives them keyword meaning only in their syntactic positions.

pub mod ast;
mod guard;
mod object;
#[cfg(test)]
mod tests;

use tendril_lex::{Token, TokenKind};
use tendril_util::error::CompileResult;
use tendril_util::{CompileError, IndexVec, Interner, Span, Symbol};

use ast::{Ast, BindSigil, BucketRef, BucketSigil, Lit, Node, NodeId, NodeKind, QuantMode, RegexLit};

/// Parse a token stream into an [`Ast`].
pub fn parse(tokens: Vec<Token>) -> CompileResult<Ast> {
    let mut parser = Parser::new(tokens);
    let root = parser.parse_pattern(None)?;
    parser.expect_eof()?;
    Ok(Ast {
        nodes: parser.nodes,
        root,
        interner: parser.interner,
    })
}

/// Sequence context: which delimiter the current run of items lives in.
///
/// Inside parentheses, `as` and `where` terminate the run (they
/// introduce a binding or a guard); inside brackets they are ordinary
/// bareword literals.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SeqCtx {
    Bracket,
    Paren,
}

/// Pattern parser over a lexed token stream.
pub struct Parser {
    /// Token stream from the lexer, ending in Eof.
    tokens: Vec<Token>,

    /// Current position in the token stream.
    position: usize,

    /// Name table shared by the whole pattern.
    interner: Interner,

    /// The node arena under construction.
    nodes: IndexVec<NodeId, Node>,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
            interner: Interner::new(),
            nodes: IndexVec::new(),
        }
    }

    // =========================================================================
    // Token helpers
    // =========================================================================

    fn peek(&self) -> &TokenKind {
        self.tokens
            .get(self.position)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    fn peek_at(&self, offset: usize) -> &TokenKind {
        self.tokens
            .get(self.position + offset)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    fn peek_span(&self) -> Span {
        self.tokens
            .get(self.position)
            .map(|t| t.span)
            .unwrap_or(Span::DUMMY)
    }

    fn prev_end(&self) -> usize {
        if self.position == 0 {
            0
        } else {
            self.tokens[self.position - 1].span.end
        }
    }

    fn advance(&mut self) -> Token {
        let token = self
            .tokens
            .get(self.position)
            .cloned()
            .unwrap_or(Token::new(TokenKind::Eof, Span::DUMMY));
        if self.position < self.tokens.len() {
            self.position += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek() == kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, context: &str) -> CompileResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.err_here(format!(
                "expected {} {context}, found {}",
                kind.describe(),
                self.peek().describe()
            )))
        }
    }

    /// True when the current token is the contextual keyword `word`.
    fn is_word(&self, word: &str) -> bool {
        matches!(self.peek(), TokenKind::Ident(w) if w == word)
    }

    fn err_here(&self, message: impl Into<String>) -> CompileError {
        CompileError::parse(self.peek_span(), message)
    }

    fn expect_eof(&mut self) -> CompileResult<()> {
        if self.check(&TokenKind::Eof) {
            Ok(())
        } else {
            Err(self.err_here(format!(
                "unexpected {} after end of pattern",
                self.peek().describe()
            )))
        }
    }

    fn add(&mut self, kind: NodeKind, span: Span) -> NodeId {
        self.nodes.push(Node { kind, span })
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(start, self.prev_end())
    }

    pub(crate) fn intern(&mut self, name: &str) -> Symbol {
        self.interner.intern(name)
    }

    /// A full pattern in single-subject context (object keys and
    /// values, top level).
    pub(crate) fn parse_single(&mut self) -> CompileResult<NodeId> {
        self.parse_pattern(None)
    }

    // =========================================================================
    // Pattern levels
    // =========================================================================

    /// `pattern := alt ("else" alt)*`, right-associative, with the
    /// no-mixing rule against `|`.
    fn parse_pattern(&mut self, ctx: Option<SeqCtx>) -> CompileResult<NodeId> {
        let start = self.peek_span().start;
        let (primary, saw_pipe) = self.parse_alt(ctx)?;

        if !self.is_word("else") {
            return Ok(primary);
        }
        if saw_pipe {
            return Err(self.err_here(
                "cannot mix '|' and 'else' at the same level; parenthesize one of them",
            ));
        }

        self.advance();
        let fallback = self.parse_else_arm(ctx)?;
        let span = self.span_from(start);
        Ok(self.add(NodeKind::Else { primary, fallback }, span))
    }

    /// One arm of an else-chain; recurses for right associativity.
    fn parse_else_arm(&mut self, ctx: Option<SeqCtx>) -> CompileResult<NodeId> {
        let start = self.peek_span().start;
        let (arm, saw_pipe) = self.parse_alt(ctx)?;
        if saw_pipe {
            return Err(self.err_here(
                "cannot mix '|' and 'else' at the same level; parenthesize one of them",
            ));
        }
        if !self.is_word("else") {
            return Ok(arm);
        }
        self.advance();
        let fallback = self.parse_else_arm(ctx)?;
        let span = self.span_from(start);
        Ok(self.add(
            NodeKind::Else {
                primary: arm,
                fallback,
            },
            span,
        ))
    }

    /// `alt := branch ("|" branch)*`. Returns whether a pipe was seen,
    /// for the mixing check.
    fn parse_alt(&mut self, ctx: Option<SeqCtx>) -> CompileResult<(NodeId, bool)> {
        let start = self.peek_span().start;
        let first = self.parse_branch(ctx)?;
        if !self.check(&TokenKind::Pipe) {
            return Ok((first, false));
        }

        let mut branches = vec![first];
        while self.eat(&TokenKind::Pipe) {
            branches.push(self.parse_branch(ctx)?);
        }
        let span = self.span_from(start);
        Ok((self.add(NodeKind::Alt(branches), span), true))
    }

    /// One alternation branch: a run of items in a sequence context, a
    /// single item elsewhere.
    fn parse_branch(&mut self, ctx: Option<SeqCtx>) -> CompileResult<NodeId> {
        let Some(seq_ctx) = ctx else {
            return self.parse_item(false);
        };

        let start = self.peek_span().start;
        let mut items = Vec::new();
        loop {
            while self.eat(&TokenKind::Comma) {}
            if self.at_branch_end(seq_ctx) {
                break;
            }
            items.push(self.parse_item(true)?);
        }

        match items.len() {
            0 => {
                let span = Span::point(start);
                Ok(self.add(NodeKind::Epsilon, span))
            }
            1 => Ok(items[0]),
            _ => {
                let span = self.span_from(start);
                Ok(self.add(NodeKind::Seq(items), span))
            }
        }
    }

    fn at_branch_end(&self, ctx: SeqCtx) -> bool {
        match self.peek() {
            TokenKind::RParen
            | TokenKind::RBracket
            | TokenKind::RBrace
            | TokenKind::Pipe
            | TokenKind::MarkClose
            | TokenKind::Eof => true,
            TokenKind::Ident(w) if w == "else" => true,
            TokenKind::Ident(w) if ctx == SeqCtx::Paren && (w == "as" || w == "where") => true,
            _ => false,
        }
    }

    /// `item := atom quant? flow?`.
    ///
    /// Quantifiers are only meaningful on sequence items; in
    /// single-subject positions (object values, the top level) a
    /// trailing `*` is left unconsumed and surfaces as an error or, for
    /// `?` after an object value, as the optional-assertion marker.
    fn parse_item(&mut self, allow_quant: bool) -> CompileResult<NodeId> {
        let start = self.peek_span().start;

        if self.check(&TokenKind::Ellipsis) {
            let span = self.advance().span;
            return Ok(self.add(NodeKind::Spread, span));
        }

        let mut node = self.parse_atom()?;

        if allow_quant {
            node = self.parse_quant_suffix(node, start)?;
        }

        if self.check(&TokenKind::Arrow) {
            self.advance();
            let bucket = self.parse_bucket_ref()?;
            let span = self.span_from(start);
            node = self.add(NodeKind::Flow { inner: node, bucket }, span);
        }

        Ok(node)
    }

    fn parse_quant_suffix(&mut self, inner: NodeId, start: usize) -> CompileResult<NodeId> {
        let (min, max) = match self.peek() {
            TokenKind::Star => {
                self.advance();
                (0, None)
            }
            TokenKind::Plus => {
                self.advance();
                (1, None)
            }
            TokenKind::Question => {
                self.advance();
                (0, Some(1))
            }
            TokenKind::StarStar => {
                return Err(self.err_here(
                    "nested quantifiers are not allowed; parenthesize the inner repetition",
                ));
            }
            TokenKind::LBrace if self.brace_is_bounds() => {
                self.advance();
                let bounds = self.parse_bounds()?;
                self.expect(&TokenKind::RBrace, "to close quantifier bounds")?;
                bounds
            }
            _ => return Ok(inner),
        };

        let mode = if self.eat(&TokenKind::Question) {
            QuantMode::Lazy
        } else if self.eat(&TokenKind::Plus) {
            QuantMode::Possessive
        } else {
            QuantMode::Greedy
        };

        // A second quantifier directly after the first has no
        // parenthesized inner repetition to apply to.
        if matches!(
            self.peek(),
            TokenKind::Star | TokenKind::Plus | TokenKind::Question | TokenKind::StarStar
        ) {
            return Err(self.err_here(
                "nested quantifiers are not allowed; parenthesize the inner repetition",
            ));
        }

        let span = self.span_from(start);
        Ok(self.add(
            NodeKind::Quant {
                inner,
                min,
                max,
                mode,
            },
            span,
        ))
    }

    /// Distinguish `a{2,3}` (bounds) from an object literal following
    /// `a` in a sequence. A negative number is still bounds-shaped so
    /// it gets the bounds error rather than an object-parse error.
    fn brace_is_bounds(&self) -> bool {
        match self.peek_at(1) {
            TokenKind::Number(_) => {
                matches!(self.peek_at(2), TokenKind::RBrace | TokenKind::Comma)
            }
            TokenKind::Minus => {
                matches!(self.peek_at(2), TokenKind::Number(_))
                    && matches!(self.peek_at(3), TokenKind::RBrace | TokenKind::Comma)
            }
            _ => false,
        }
    }

    /// `{m}`, `{m,n}`, `{m,}` with the brace already consumed.
    pub(crate) fn parse_bounds(&mut self) -> CompileResult<(u32, Option<u32>)> {
        let min = self.parse_bound_number()?;
        if !self.eat(&TokenKind::Comma) {
            return Ok((min, Some(min)));
        }
        if self.check(&TokenKind::RBrace) {
            return Ok((min, None));
        }
        let max = self.parse_bound_number()?;
        if max < min {
            return Err(self.err_here(format!(
                "quantifier minimum {min} exceeds maximum {max}"
            )));
        }
        Ok((min, Some(max)))
    }

    fn parse_bound_number(&mut self) -> CompileResult<u32> {
        let span = self.peek_span();
        match self.peek() {
            TokenKind::Number(n) => {
                let n = *n;
                if n.fract() != 0.0 || n < 0.0 || n > u32::MAX as f64 {
                    return Err(CompileError::parse(
                        span,
                        format!("quantifier bounds must be non-negative integers, found {n}"),
                    ));
                }
                self.advance();
                Ok(n as u32)
            }
            TokenKind::Minus => Err(CompileError::parse(
                span,
                "quantifier bounds must be non-negative integers",
            )),
            other => Err(CompileError::parse(
                span,
                format!("expected a quantifier bound, found {}", other.describe()),
            )),
        }
    }

    /// `-> %b` / `-> @b`, optionally `across ^L`. The arrow is already
    /// consumed.
    pub(crate) fn parse_bucket_ref(&mut self) -> CompileResult<BucketRef> {
        let start = self.peek_span();
        let (sigil, name) = match self.peek().clone() {
            TokenKind::MapVar(name) => {
                self.advance();
                (BucketSigil::Map, name)
            }
            TokenKind::SeqVar(name) => {
                self.advance();
                (BucketSigil::Seq, name)
            }
            other => {
                return Err(self.err_here(format!(
                    "expected '%bucket' or '@bucket' after '->', found {}",
                    other.describe()
                )));
            }
        };
        let name = self.intern(&name);

        let across = if self.is_word("across") {
            self.advance();
            match self.peek().clone() {
                TokenKind::LabelRef(label) => {
                    self.advance();
                    Some(self.intern(&label))
                }
                other => {
                    return Err(self.err_here(format!(
                        "expected '^label' after 'across', found {}",
                        other.describe()
                    )));
                }
            }
        } else {
            None
        };

        Ok(BucketRef {
            sigil,
            name,
            across,
            span: Span::new(start.start, self.prev_end()),
        })
    }

    // =========================================================================
    // Atoms
    // =========================================================================

    fn parse_atom(&mut self) -> CompileResult<NodeId> {
        let start = self.peek_span().start;
        match self.peek().clone() {
            TokenKind::Number(n) => {
                let span = self.advance().span;
                Ok(self.add(NodeKind::Literal(Lit::Number(n)), span))
            }
            TokenKind::Minus => {
                self.advance();
                match self.peek().clone() {
                    TokenKind::Number(n) => {
                        self.advance();
                        let span = self.span_from(start);
                        Ok(self.add(NodeKind::Literal(Lit::Number(-n)), span))
                    }
                    other => Err(self.err_here(format!(
                        "expected a number after '-', found {}",
                        other.describe()
                    ))),
                }
            }
            TokenKind::Str(s) => {
                let span = self.advance().span;
                Ok(self.add(NodeKind::Literal(Lit::Str(s)), span))
            }
            TokenKind::Ident(word) => {
                let span = self.advance().span;
                let kind = match word.as_str() {
                    "null" => NodeKind::Literal(Lit::Null),
                    "true" => NodeKind::Literal(Lit::Bool(true)),
                    "false" => NodeKind::Literal(Lit::Bool(false)),
                    _ => NodeKind::Literal(Lit::Str(word)),
                };
                Ok(self.add(kind, span))
            }
            TokenKind::CaseInsensitive(s) => {
                let span = self.advance().span;
                Ok(self.add(NodeKind::CaseInsensitive(s), span))
            }
            TokenKind::Regex {
                pattern,
                ignore_case,
                multi_line,
                dot_all,
            } => {
                let span = self.advance().span;
                Ok(self.add(
                    NodeKind::Regex(RegexLit {
                        pattern,
                        ignore_case,
                        multi_line,
                        dot_all,
                    }),
                    span,
                ))
            }
            TokenKind::Underscore => {
                let span = self.advance().span;
                Ok(self.add(NodeKind::Wildcard, span))
            }
            TokenKind::TypedWildcard(tag) => {
                let span = self.advance().span;
                Ok(self.add(NodeKind::TypedWildcard(tag), span))
            }
            TokenKind::ScalarVar(name) => {
                self.advance();
                let sym = self.intern(&name);
                if self.check(&TokenKind::Eq) && matches!(self.peek_at(1), TokenKind::LParen) {
                    self.advance();
                    self.advance();
                    let inner = self.parse_pattern(Some(SeqCtx::Paren))?;
                    self.expect(&TokenKind::RParen, "to close the bound pattern")?;
                    let span = self.span_from(start);
                    Ok(self.add(
                        NodeKind::Bind {
                            inner,
                            sigil: BindSigil::Scalar,
                            name: sym,
                        },
                        span,
                    ))
                } else {
                    let span = self.span_from(start);
                    Ok(self.add(NodeKind::Var(sym), span))
                }
            }
            TokenKind::SeqVar(name) => Err(self.err_here(format!(
                "group variable `@{name}` binds with '(pattern as @{name})'"
            ))),
            TokenKind::MapVar(name) => Err(self.err_here(format!(
                "group variable `%{name}` binds with '(pattern as %{name})'"
            ))),
            TokenKind::Label(name) => {
                self.advance();
                let sym = self.intern(&name);
                let inner = self.parse_atom()?;
                let span = self.span_from(start);
                Ok(self.add(NodeKind::Label { name: sym, inner }, span))
            }
            TokenKind::LBracket => {
                self.advance();
                let body = self.parse_pattern(Some(SeqCtx::Bracket))?;
                self.expect(&TokenKind::RBracket, "to close the array pattern")?;
                let span = self.span_from(start);
                Ok(self.add(NodeKind::Array(body), span))
            }
            TokenKind::LBrace => {
                if matches!(self.peek_at(1), TokenKind::LBrace) {
                    self.parse_set()
                } else {
                    self.advance();
                    self.parse_object(start)
                }
            }
            TokenKind::LParen => {
                self.advance();
                self.parse_paren(start)
            }
            TokenKind::LParenQuestion => {
                self.advance();
                let inner = self.parse_pattern(Some(SeqCtx::Paren))?;
                self.expect(&TokenKind::RParen, "to close the lookahead")?;
                let span = self.span_from(start);
                Ok(self.add(
                    NodeKind::Lookahead {
                        inner,
                        negative: false,
                    },
                    span,
                ))
            }
            TokenKind::LParenBang => {
                self.advance();
                let inner = self.parse_pattern(Some(SeqCtx::Paren))?;
                self.expect(&TokenKind::RParen, "to close the negative lookahead")?;
                let span = self.span_from(start);
                Ok(self.add(
                    NodeKind::Lookahead {
                        inner,
                        negative: true,
                    },
                    span,
                ))
            }
            TokenKind::MarkOpen => {
                self.advance();
                let inner = self.parse_pattern(None)?;
                self.expect(&TokenKind::MarkClose, "to close the replacement marker")?;
                let span = self.span_from(start);
                Ok(self.add(NodeKind::Marker { inner }, span))
            }
            TokenKind::StarStar => Err(self.err_here(
                "nested quantifiers are not allowed; parenthesize the inner repetition",
            )),
            TokenKind::Eof => Err(self.err_here("unexpected end of pattern")),
            other => Err(self.err_here(format!("unexpected {}", other.describe()))),
        }
    }

    /// The inside of a plain `( ... )`: group, `as`-binding, or guard.
    fn parse_paren(&mut self, start: usize) -> CompileResult<NodeId> {
        if self.check(&TokenKind::RParen) {
            return Err(self.err_here("empty group"));
        }
        let inner = self.parse_pattern(Some(SeqCtx::Paren))?;

        if self.is_word("where") {
            self.advance();
            let expr = self.parse_guard_expr()?;
            self.expect(&TokenKind::RParen, "to close the guard")?;
            let span = self.span_from(start);
            return Ok(self.add(
                NodeKind::Guard {
                    inner,
                    expr: Box::new(expr),
                },
                span,
            ));
        }

        if self.is_word("as") {
            self.advance();
            let (sigil, name) = match self.peek().clone() {
                TokenKind::ScalarVar(n) => (BindSigil::Scalar, n),
                TokenKind::SeqVar(n) => (BindSigil::Seq, n),
                TokenKind::MapVar(n) => (BindSigil::Map, n),
                other => {
                    return Err(self.err_here(format!(
                        "expected '$name', '@name', or '%name' after 'as', found {}",
                        other.describe()
                    )));
                }
            };
            self.advance();
            let name = self.intern(&name);
            self.expect(&TokenKind::RParen, "to close the binding")?;
            let span = self.span_from(start);
            return Ok(self.add(NodeKind::Bind { inner, sigil, name }, span));
        }

        self.expect(&TokenKind::RParen, "to close the group")?;
        Ok(inner)
    }

    /// `{{ item* ...? }}`.
    fn parse_set(&mut self) -> CompileResult<NodeId> {
        let start = self.peek_span().start;
        self.advance();
        self.advance();

        let mut items = Vec::new();
        let mut open = false;
        loop {
            while self.eat(&TokenKind::Comma) {}
            if self.check(&TokenKind::RBrace) {
                break;
            }
            if self.check(&TokenKind::Eof) {
                return Err(self.err_here("unclosed set pattern"));
            }
            if self.check(&TokenKind::Ellipsis) {
                self.advance();
                open = true;
                continue;
            }
            items.push(self.parse_item(false)?);
        }
        self.expect(&TokenKind::RBrace, "to close the set pattern")?;
        self.expect(&TokenKind::RBrace, "to close the set pattern")?;
        let span = self.span_from(start);
        Ok(self.add(NodeKind::Set { items, open }, span))
    }
}
