//! Token definitions for the pattern language.

use tendril_util::Span;

/// Primitive kind checked by a typed wildcard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeTag {
    String,
    Number,
    Boolean,
}

impl std::fmt::Display for TypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeTag::String => write!(f, "_string"),
            TypeTag::Number => write!(f, "_number"),
            TypeTag::Boolean => write!(f, "_boolean"),
        }
    }
}

/// One lexed token.
///
/// `as`, `else`, `each`, `where`, `in`, `across`, and `collecting` are
/// lexed as plain [`TokenKind::Ident`]s; their keyword role is decided
/// by the parser from position, which is what keeps `$else` and
/// `$each` valid variable names.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    /// Numeric literal.
    Number(f64),
    /// Quoted string literal with escapes resolved.
    Str(String),
    /// Bareword identifier (literal word or contextual keyword).
    Ident(String),
    /// Case-insensitive literal (`word/i` or `"text"/i`), pre-lowered.
    CaseInsensitive(String),
    /// Regex literal with its allowed flags.
    Regex {
        pattern: String,
        ignore_case: bool,
        multi_line: bool,
        dot_all: bool,
    },

    /// `$name` scalar variable.
    ScalarVar(String),
    /// `@name` sequence-slice variable or bucket.
    SeqVar(String),
    /// `%name` submapping variable or bucket.
    MapVar(String),
    /// `§name` label.
    Label(String),
    /// `^name` label reference.
    LabelRef(String),

    /// `_` wildcard.
    Underscore,
    /// `_string` / `_number` / `_boolean`.
    TypedWildcard(TypeTag),

    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    /// `(?` opening a positive lookahead.
    LParenQuestion,
    /// `(!` opening a negative lookahead / assertion.
    LParenBang,
    Colon,
    ColonColon,
    Comma,
    Dot,
    /// `..` deep-path segment.
    DotDot,
    /// `...` spread.
    Ellipsis,
    Eq,
    Pipe,
    Star,
    /// `**` - tokenized per the surface syntax, rejected by the parser
    /// with a dedicated message.
    StarStar,
    Plus,
    Question,
    Arrow,
    Percent,
    Hash,
    /// `>>` replacement-marker open.
    MarkOpen,
    /// `<<` replacement-marker close.
    MarkClose,

    // Guard-expression operators.
    Slash,
    Minus,
    EqEq,
    BangEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    AndAnd,
    OrOr,
    Bang,

    Eof,
}

impl TokenKind {
    /// True for tokens that can end a value, for the regex-vs-division
    /// decision: after one of these a bare `/` divides, otherwise it
    /// opens a regex literal.
    pub fn is_value_like(&self) -> bool {
        matches!(
            self,
            TokenKind::Number(_)
                | TokenKind::Str(_)
                | TokenKind::Ident(_)
                | TokenKind::CaseInsensitive(_)
                | TokenKind::ScalarVar(_)
                | TokenKind::SeqVar(_)
                | TokenKind::MapVar(_)
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::RBrace
        )
    }

    /// Short description used in error messages.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Number(n) => format!("number `{n}`"),
            TokenKind::Str(s) => format!("string {s:?}"),
            TokenKind::Ident(w) => format!("`{w}`"),
            TokenKind::CaseInsensitive(w) => format!("`{w}/i`"),
            TokenKind::Regex { pattern, .. } => format!("regex /{pattern}/"),
            TokenKind::ScalarVar(n) => format!("`${n}`"),
            TokenKind::SeqVar(n) => format!("`@{n}`"),
            TokenKind::MapVar(n) => format!("`%{n}`"),
            TokenKind::Label(n) => format!("`§{n}`"),
            TokenKind::LabelRef(n) => format!("`^{n}`"),
            TokenKind::Underscore => "`_`".to_string(),
            TokenKind::TypedWildcard(t) => format!("`{t}`"),
            TokenKind::LBrace => "`{`".to_string(),
            TokenKind::RBrace => "`}`".to_string(),
            TokenKind::LBracket => "`[`".to_string(),
            TokenKind::RBracket => "`]`".to_string(),
            TokenKind::LParen => "`(`".to_string(),
            TokenKind::RParen => "`)`".to_string(),
            TokenKind::LParenQuestion => "`(?`".to_string(),
            TokenKind::LParenBang => "`(!`".to_string(),
            TokenKind::Colon => "`:`".to_string(),
            TokenKind::ColonColon => "`::`".to_string(),
            TokenKind::Comma => "`,`".to_string(),
            TokenKind::Dot => "`.`".to_string(),
            TokenKind::DotDot => "`..`".to_string(),
            TokenKind::Ellipsis => "`...`".to_string(),
            TokenKind::Eq => "`=`".to_string(),
            TokenKind::Pipe => "`|`".to_string(),
            TokenKind::Star => "`*`".to_string(),
            TokenKind::StarStar => "`**`".to_string(),
            TokenKind::Plus => "`+`".to_string(),
            TokenKind::Question => "`?`".to_string(),
            TokenKind::Arrow => "`->`".to_string(),
            TokenKind::Percent => "`%`".to_string(),
            TokenKind::Hash => "`#`".to_string(),
            TokenKind::MarkOpen => "`>>`".to_string(),
            TokenKind::MarkClose => "`<<`".to_string(),
            TokenKind::Slash => "`/`".to_string(),
            TokenKind::Minus => "`-`".to_string(),
            TokenKind::EqEq => "`==`".to_string(),
            TokenKind::BangEq => "`!=`".to_string(),
            TokenKind::Lt => "`<`".to_string(),
            TokenKind::LtEq => "`<=`".to_string(),
            TokenKind::Gt => "`>`".to_string(),
            TokenKind::GtEq => "`>=`".to_string(),
            TokenKind::AndAnd => "`&&`".to_string(),
            TokenKind::OrOr => "`||`".to_string(),
            TokenKind::Bang => "`!`".to_string(),
            TokenKind::Eof => "end of pattern".to_string(),
        }
    }
}

/// A token with its source span.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}
