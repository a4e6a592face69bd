//! Numeric literal lexing.

use tendril_util::error::CompileResult;

use super::core::Lexer;
use crate::token::TokenKind;

impl<'a> Lexer<'a> {
    /// Lex a decimal number: integer part, optional fraction, optional
    /// exponent. A trailing `.` not followed by a digit is left for the
    /// path parser (`a.b` descent also uses `.`).
    pub(crate) fn lex_number(&mut self) -> CompileResult<TokenKind> {
        self.cursor.eat_while(|c| c.is_ascii_digit());

        if self.cursor.current_char() == '.' && self.cursor.char_at(1).is_ascii_digit() {
            self.cursor.advance();
            self.cursor.eat_while(|c| c.is_ascii_digit());
        }

        if matches!(self.cursor.current_char(), 'e' | 'E') {
            let next = self.cursor.char_at(1);
            let next2 = self.cursor.char_at(2);
            if next.is_ascii_digit() || ((next == '+' || next == '-') && next2.is_ascii_digit()) {
                self.cursor.advance();
                if matches!(self.cursor.current_char(), '+' | '-') {
                    self.cursor.advance();
                }
                self.cursor.eat_while(|c| c.is_ascii_digit());
            }
        }

        let text = self.cursor.slice_from(self.token_start);
        match text.parse::<f64>() {
            Ok(n) => Ok(TokenKind::Number(n)),
            Err(_) => Err(self.error(format!("invalid number literal `{text}`"))),
        }
    }
}
