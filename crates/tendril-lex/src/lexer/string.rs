//! String literal lexing.

use tendril_util::error::CompileResult;

use super::core::Lexer;
use crate::token::TokenKind;

impl<'a> Lexer<'a> {
    /// Lex a single- or double-quoted string with escapes resolved.
    ///
    /// Supported escapes: `\"` `\'` `\\` `\n` `\t` `\r` `\0` `\uXXXX`.
    /// A raw newline or end of input before the closing quote is an
    /// unterminated-string error at the opening quote.
    pub(crate) fn lex_string(&mut self) -> CompileResult<TokenKind> {
        let quote = self.cursor.advance();
        let mut text = String::new();

        loop {
            let c = self.cursor.current_char();
            if self.cursor.is_at_end() || c == '\n' {
                return Err(self.error("unterminated string literal"));
            }
            if c == quote {
                self.cursor.advance();
                return Ok(TokenKind::Str(text));
            }
            if c != '\\' {
                text.push(c);
                self.cursor.advance();
                continue;
            }

            self.cursor.advance();
            let esc = self.cursor.current_char();
            if self.cursor.is_at_end() {
                return Err(self.error("unterminated string literal"));
            }
            self.cursor.advance();
            match esc {
                '"' => text.push('"'),
                '\'' => text.push('\''),
                '\\' => text.push('\\'),
                'n' => text.push('\n'),
                't' => text.push('\t'),
                'r' => text.push('\r'),
                '0' => text.push('\0'),
                'u' => text.push(self.lex_unicode_escape()?),
                other => {
                    return Err(self.error(format!("invalid escape sequence `\\{other}`")));
                }
            }
        }
    }

    /// Four hex digits after `\u`.
    fn lex_unicode_escape(&mut self) -> CompileResult<char> {
        let mut code: u32 = 0;
        for _ in 0..4 {
            let c = self.cursor.current_char();
            let digit = c
                .to_digit(16)
                .ok_or_else(|| self.error("\\u escape requires four hex digits"))?;
            self.cursor.advance();
            code = code * 16 + digit;
        }
        char::from_u32(code)
            .ok_or_else(|| self.error(format!("\\u{code:04x} is not a valid character")))
    }
}
