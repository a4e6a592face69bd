//! Core lexer implementation: trivia skipping and character dispatch.

use tendril_util::error::CompileResult;
use tendril_util::{CompileError, Span};

use crate::cursor::Cursor;
use crate::token::{Token, TokenKind};

/// Lexer for the Tendril pattern language.
pub struct Lexer<'a> {
    /// Character cursor for source traversal.
    pub(crate) cursor: Cursor<'a>,

    /// Tokens emitted so far. The last token feeds the regex-vs-division
    /// decision and the `/i` suffix rewrite.
    pub(crate) tokens: Vec<Token>,

    /// Starting byte offset of the token currently being lexed.
    pub(crate) token_start: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given pattern source.
    pub fn new(source: &'a str) -> Self {
        Self {
            cursor: Cursor::new(source),
            tokens: Vec::new(),
            token_start: 0,
        }
    }

    /// Run the lexer to completion.
    ///
    /// The returned stream always ends with a single [`TokenKind::Eof`]
    /// token whose span is the end of input.
    pub fn tokenize(mut self) -> CompileResult<Vec<Token>> {
        loop {
            self.skip_trivia()?;
            self.token_start = self.cursor.position();

            if self.cursor.is_at_end() {
                let end = self.cursor.position();
                self.tokens.push(Token::new(TokenKind::Eof, Span::point(end)));
                return Ok(self.tokens);
            }

            if let Some(kind) = self.next_kind()? {
                self.push(kind);
            }
        }
    }

    /// Lex one token starting at `token_start`.
    ///
    /// Returns `Ok(None)` when the token was folded into the previous
    /// one (the `/i` rewrite).
    fn next_kind(&mut self) -> CompileResult<Option<TokenKind>> {
        let kind = match self.cursor.current_char() {
            '{' => {
                self.cursor.advance();
                TokenKind::LBrace
            }
            '}' => {
                self.cursor.advance();
                TokenKind::RBrace
            }
            '[' => {
                self.cursor.advance();
                TokenKind::LBracket
            }
            ']' => {
                self.cursor.advance();
                TokenKind::RBracket
            }
            '(' => {
                self.cursor.advance();
                if self.cursor.eat('?') {
                    TokenKind::LParenQuestion
                } else if self.cursor.eat('!') {
                    TokenKind::LParenBang
                } else {
                    TokenKind::LParen
                }
            }
            ')' => {
                self.cursor.advance();
                TokenKind::RParen
            }
            ',' => {
                self.cursor.advance();
                TokenKind::Comma
            }
            ':' => {
                self.cursor.advance();
                if self.cursor.eat(':') {
                    TokenKind::ColonColon
                } else {
                    TokenKind::Colon
                }
            }
            '.' => {
                self.cursor.advance();
                if self.cursor.eat('.') {
                    if self.cursor.eat('.') {
                        TokenKind::Ellipsis
                    } else {
                        TokenKind::DotDot
                    }
                } else {
                    TokenKind::Dot
                }
            }
            '=' => {
                self.cursor.advance();
                if self.cursor.eat('=') {
                    TokenKind::EqEq
                } else {
                    TokenKind::Eq
                }
            }
            '|' => {
                self.cursor.advance();
                if self.cursor.eat('|') {
                    TokenKind::OrOr
                } else {
                    TokenKind::Pipe
                }
            }
            '*' => {
                self.cursor.advance();
                if self.cursor.eat('*') {
                    TokenKind::StarStar
                } else {
                    TokenKind::Star
                }
            }
            '+' => {
                self.cursor.advance();
                TokenKind::Plus
            }
            '?' => {
                self.cursor.advance();
                TokenKind::Question
            }
            '-' => {
                self.cursor.advance();
                if self.cursor.eat('>') {
                    TokenKind::Arrow
                } else {
                    TokenKind::Minus
                }
            }
            '!' => {
                self.cursor.advance();
                if self.cursor.eat('=') {
                    TokenKind::BangEq
                } else {
                    TokenKind::Bang
                }
            }
            '<' => {
                self.cursor.advance();
                if self.cursor.eat('<') {
                    TokenKind::MarkClose
                } else if self.cursor.eat('=') {
                    TokenKind::LtEq
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                self.cursor.advance();
                if self.cursor.eat('>') {
                    TokenKind::MarkOpen
                } else if self.cursor.eat('=') {
                    TokenKind::GtEq
                } else {
                    TokenKind::Gt
                }
            }
            '&' => {
                self.cursor.advance();
                if self.cursor.eat('&') {
                    TokenKind::AndAnd
                } else {
                    return Err(self.error("unexpected character '&' (did you mean '&&'?)"));
                }
            }
            '#' => {
                self.cursor.advance();
                TokenKind::Hash
            }
            '/' => return self.lex_slash(),
            '"' | '\'' => self.lex_string()?,
            '$' => self.lex_sigil_name('$')?,
            '@' => self.lex_sigil_name('@')?,
            '%' => {
                // `%name` is a submapping variable; a bare `%` is the
                // residual marker (and the modulo operator in guards).
                if is_ident_start(self.cursor.char_at(1)) {
                    self.lex_sigil_name('%')?
                } else {
                    self.cursor.advance();
                    TokenKind::Percent
                }
            }
            '§' => self.lex_label()?,
            '^' => self.lex_label_ref()?,
            '_' => self.lex_underscore()?,
            c if is_ident_start(c) => self.lex_ident(),
            c if c.is_ascii_digit() => self.lex_number()?,
            c => {
                self.cursor.advance();
                return Err(self.error(format!("unexpected character '{c}'")));
            }
        };
        Ok(Some(kind))
    }

    /// Skip whitespace and comments. Unterminated block comments are a
    /// hard error anchored at the comment opener.
    fn skip_trivia(&mut self) -> CompileResult<()> {
        loop {
            self.cursor.eat_while(|c| c.is_whitespace());

            if self.cursor.current_char() == '/' && self.cursor.char_at(1) == '/' {
                self.cursor.eat_while(|c| c != '\n');
                continue;
            }

            if self.cursor.current_char() == '/' && self.cursor.char_at(1) == '*' {
                let open = self.cursor.position();
                self.cursor.advance();
                self.cursor.advance();
                loop {
                    if self.cursor.is_at_end() {
                        return Err(CompileError::token(
                            Span::new(open, self.cursor.position()),
                            "unterminated block comment",
                        ));
                    }
                    if self.cursor.current_char() == '*' && self.cursor.char_at(1) == '/' {
                        self.cursor.advance();
                        self.cursor.advance();
                        break;
                    }
                    self.cursor.advance();
                }
                continue;
            }

            return Ok(());
        }
    }

    /// Push a token spanning from `token_start` to the cursor.
    pub(crate) fn push(&mut self, kind: TokenKind) {
        let span = Span::new(self.token_start, self.cursor.position());
        self.tokens.push(Token::new(kind, span));
    }

    /// Build a token error spanning the current token.
    pub(crate) fn error(&self, message: impl Into<String>) -> CompileError {
        CompileError::token(
            Span::new(self.token_start, self.cursor.position()),
            message,
        )
    }
}

/// First character of a bareword or sigil name.
pub(crate) fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic()
}

/// Subsequent characters of a bareword or sigil name.
pub(crate) fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
