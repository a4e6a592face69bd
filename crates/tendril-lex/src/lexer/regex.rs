//! Regex literals, flags, and the slash disambiguation.

use tendril_util::error::CompileResult;

use super::core::{is_ident_continue, Lexer};
use crate::token::TokenKind;

impl<'a> Lexer<'a> {
    /// Dispatch for `/`: case-insensitive suffix, division, or regex
    /// literal.
    ///
    /// The `/i` rewrite wins first: an identifier or string token that
    /// ends exactly where this `/` begins, followed by `i` and no
    /// further identifier character, becomes one pre-lowered
    /// case-insensitive literal (returning `None` since no new token is
    /// pushed). Otherwise the previous token decides: value-like means
    /// division, anything else starts a regex.
    pub(crate) fn lex_slash(&mut self) -> CompileResult<Option<TokenKind>> {
        if self.try_case_insensitive_suffix() {
            return Ok(None);
        }

        let prev_value_like = self
            .tokens
            .last()
            .is_some_and(|t| t.kind.is_value_like());
        if prev_value_like {
            self.cursor.advance();
            return Ok(Some(TokenKind::Slash));
        }

        self.lex_regex().map(Some)
    }

    fn try_case_insensitive_suffix(&mut self) -> bool {
        if self.cursor.char_at(1) != 'i' || is_ident_continue(self.cursor.char_at(2)) {
            return false;
        }
        let slash_at = self.cursor.position();
        let Some(last) = self.tokens.last_mut() else {
            return false;
        };
        if last.span.end != slash_at {
            return false;
        }
        let lowered = match &last.kind {
            TokenKind::Ident(w) => w.to_lowercase(),
            TokenKind::Str(s) => s.to_lowercase(),
            _ => return false,
        };
        last.kind = TokenKind::CaseInsensitive(lowered);
        last.span.end = slash_at + 2;

        self.cursor.advance();
        self.cursor.advance();
        true
    }

    /// Lex `/pattern/flags`. The body ends at the first unescaped `/`
    /// outside a `[...]` character class. Allowed flags: `i`, `m`, `s`;
    /// the stateful `g` and `y` flags are rejected.
    fn lex_regex(&mut self) -> CompileResult<TokenKind> {
        self.cursor.advance();
        let body_start = self.cursor.position();
        let mut in_class = false;

        loop {
            let c = self.cursor.current_char();
            if self.cursor.is_at_end() || c == '\n' {
                return Err(self.error("unterminated regex literal"));
            }
            match c {
                '\\' => {
                    self.cursor.advance();
                    if self.cursor.is_at_end() {
                        return Err(self.error("unterminated regex literal"));
                    }
                    self.cursor.advance();
                }
                '[' => {
                    in_class = true;
                    self.cursor.advance();
                }
                ']' => {
                    in_class = false;
                    self.cursor.advance();
                }
                '/' if !in_class => break,
                _ => {
                    self.cursor.advance();
                }
            }
        }

        let pattern = self.cursor.source()[body_start..self.cursor.position()].to_string();
        self.cursor.advance();

        let mut ignore_case = false;
        let mut multi_line = false;
        let mut dot_all = false;
        while is_ident_continue(self.cursor.current_char()) {
            let flag = self.cursor.advance();
            match flag {
                'i' => ignore_case = true,
                'm' => multi_line = true,
                's' => dot_all = true,
                'g' | 'y' => {
                    return Err(self.error(format!(
                        "regex flag '{flag}' is not supported: matching is always anchored and stateless"
                    )));
                }
                other => {
                    return Err(self.error(format!("unknown regex flag '{other}'")));
                }
            }
        }

        Ok(TokenKind::Regex {
            pattern,
            ignore_case,
            multi_line,
            dot_all,
        })
    }
}
