//! Barewords, sigil names, wildcards, and labels.

use tendril_util::error::CompileResult;

use super::core::{is_ident_continue, is_ident_start, Lexer};
use crate::token::{TokenKind, TypeTag};

impl<'a> Lexer<'a> {
    /// Lex a bareword identifier. Contextual keywords are not
    /// distinguished here; the parser decides from position.
    pub(crate) fn lex_ident(&mut self) -> TokenKind {
        let word = self.cursor.eat_while(is_ident_continue);
        TokenKind::Ident(word.to_string())
    }

    /// Lex a `$`/`@`/`%` sigil followed by a name.
    pub(crate) fn lex_sigil_name(&mut self, sigil: char) -> CompileResult<TokenKind> {
        self.cursor.advance();
        let c = self.cursor.current_char();
        if c.is_ascii_digit() || c == '_' {
            self.cursor.eat_while(is_ident_continue);
            return Err(self.error(format!(
                "variable name after '{sigil}' must not start with a digit or underscore"
            )));
        }
        if !is_ident_start(c) {
            return Err(self.error(format!("expected a name after '{sigil}'")));
        }
        let name = self.cursor.eat_while(is_ident_continue).to_string();
        Ok(match sigil {
            '$' => TokenKind::ScalarVar(name),
            '@' => TokenKind::SeqVar(name),
            _ => TokenKind::MapVar(name),
        })
    }

    /// Lex `§name`.
    pub(crate) fn lex_label(&mut self) -> CompileResult<TokenKind> {
        self.cursor.advance();
        if !is_ident_start(self.cursor.current_char()) {
            return Err(self.error("expected a label name after '§'"));
        }
        let name = self.cursor.eat_while(is_ident_continue).to_string();
        Ok(TokenKind::Label(name))
    }

    /// Lex `^name`.
    pub(crate) fn lex_label_ref(&mut self) -> CompileResult<TokenKind> {
        self.cursor.advance();
        if !is_ident_start(self.cursor.current_char()) {
            return Err(self.error("expected a label name after '^'"));
        }
        let name = self.cursor.eat_while(is_ident_continue).to_string();
        Ok(TokenKind::LabelRef(name))
    }

    /// Lex `_`, `_string`, `_number`, or `_boolean`.
    ///
    /// Any other underscore-prefixed word is rejected: identifiers must
    /// not begin with an underscore.
    pub(crate) fn lex_underscore(&mut self) -> CompileResult<TokenKind> {
        self.cursor.advance();
        if !is_ident_continue(self.cursor.current_char()) {
            return Ok(TokenKind::Underscore);
        }
        let word = self.cursor.eat_while(is_ident_continue);
        match word {
            "string" => Ok(TokenKind::TypedWildcard(TypeTag::String)),
            "number" => Ok(TokenKind::TypedWildcard(TypeTag::Number)),
            "boolean" => Ok(TokenKind::TypedWildcard(TypeTag::Boolean)),
            other => Err(self.error(format!(
                "identifier must not begin with an underscore: `_{other}`"
            ))),
        }
    }
}
