//! Tokenizer tests, including the slash-disambiguation edge cases.

use crate::token::{TokenKind, TypeTag};
use crate::tokenize;

/// Tokenize and strip the trailing Eof.
fn kinds(source: &str) -> Vec<TokenKind> {
    let tokens = tokenize(source).expect("tokenize failed");
    let mut kinds: Vec<TokenKind> = tokens.into_iter().map(|t| t.kind).collect();
    assert_eq!(kinds.pop(), Some(TokenKind::Eof));
    kinds
}

fn error_message(source: &str) -> String {
    tokenize(source).expect_err("expected a token error").message
}

#[test]
fn test_punctuation() {
    assert_eq!(
        kinds("{ } [ ] ( ) : , ."),
        vec![
            TokenKind::LBrace,
            TokenKind::RBrace,
            TokenKind::LBracket,
            TokenKind::RBracket,
            TokenKind::LParen,
            TokenKind::RParen,
            TokenKind::Colon,
            TokenKind::Comma,
            TokenKind::Dot,
        ]
    );
}

#[test]
fn test_multichar_punctuation() {
    assert_eq!(
        kinds("... ** -> :: >> <<"),
        vec![
            TokenKind::Ellipsis,
            TokenKind::StarStar,
            TokenKind::Arrow,
            TokenKind::ColonColon,
            TokenKind::MarkOpen,
            TokenKind::MarkClose,
        ]
    );
}

#[test]
fn test_lookahead_openers() {
    assert_eq!(
        kinds("(? (! ("),
        vec![
            TokenKind::LParenQuestion,
            TokenKind::LParenBang,
            TokenKind::LParen,
        ]
    );
}

#[test]
fn test_numbers() {
    assert_eq!(
        kinds("0 42 3.25 1e3 2.5e-2"),
        vec![
            TokenKind::Number(0.0),
            TokenKind::Number(42.0),
            TokenKind::Number(3.25),
            TokenKind::Number(1000.0),
            TokenKind::Number(0.025),
        ]
    );
}

#[test]
fn test_number_then_dot_path() {
    // `1.foo` is a number followed by path descent, not a malformed
    // fraction.
    assert_eq!(
        kinds("1.foo"),
        vec![
            TokenKind::Number(1.0),
            TokenKind::Dot,
            TokenKind::Ident("foo".to_string()),
        ]
    );
}

#[test]
fn test_strings_and_escapes() {
    assert_eq!(
        kinds(r#""a\nb" 'c\'d' "A""#),
        vec![
            TokenKind::Str("a\nb".to_string()),
            TokenKind::Str("c'd".to_string()),
            TokenKind::Str("A".to_string()),
        ]
    );
}

#[test]
fn test_unterminated_string() {
    assert!(error_message("\"abc").contains("unterminated string"));
    assert!(error_message("\"ab\nc\"").contains("unterminated string"));
}

#[test]
fn test_invalid_escape() {
    assert!(error_message(r#""\q""#).contains("invalid escape"));
}

#[test]
fn test_variables() {
    assert_eq!(
        kinds("$x @rest %extra"),
        vec![
            TokenKind::ScalarVar("x".to_string()),
            TokenKind::SeqVar("rest".to_string()),
            TokenKind::MapVar("extra".to_string()),
        ]
    );
}

#[test]
fn test_keyword_named_variables_are_fine() {
    assert_eq!(
        kinds("$else $each $where"),
        vec![
            TokenKind::ScalarVar("else".to_string()),
            TokenKind::ScalarVar("each".to_string()),
            TokenKind::ScalarVar("where".to_string()),
        ]
    );
}

#[test]
fn test_variable_name_rules() {
    assert!(error_message("$0").contains("digit or underscore"));
    assert!(error_message("$_x").contains("digit or underscore"));
}

#[test]
fn test_bare_percent_is_residual() {
    assert_eq!(
        kinds("% %? %#"),
        vec![
            TokenKind::Percent,
            TokenKind::Percent,
            TokenKind::Question,
            TokenKind::Percent,
            TokenKind::Hash,
        ]
    );
}

#[test]
fn test_wildcards() {
    assert_eq!(
        kinds("_ _string _number _boolean"),
        vec![
            TokenKind::Underscore,
            TokenKind::TypedWildcard(TypeTag::String),
            TokenKind::TypedWildcard(TypeTag::Number),
            TokenKind::TypedWildcard(TypeTag::Boolean),
        ]
    );
}

#[test]
fn test_underscore_identifier_rejected() {
    assert!(error_message("_foo").contains("underscore"));
}

#[test]
fn test_labels() {
    assert_eq!(
        kinds("§outer ^outer"),
        vec![
            TokenKind::Label("outer".to_string()),
            TokenKind::LabelRef("outer".to_string()),
        ]
    );
}

#[test]
fn test_case_insensitive_suffix() {
    assert_eq!(
        kinds("Hello/i"),
        vec![TokenKind::CaseInsensitive("hello".to_string())]
    );
    assert_eq!(
        kinds("\"Mixed Case\"/i"),
        vec![TokenKind::CaseInsensitive("mixed case".to_string())]
    );
}

#[test]
fn test_case_insensitive_requires_adjacency() {
    // With a space, `/` falls back to the division heuristic: the
    // previous token is value-like, so this is division by `i`.
    assert_eq!(
        kinds("foo /i"),
        vec![
            TokenKind::Ident("foo".to_string()),
            TokenKind::Slash,
            TokenKind::Ident("i".to_string()),
        ]
    );
}

#[test]
fn test_ci_suffix_not_eaten_by_longer_word() {
    // `foo/int` is division by `int`, not `/i` + `nt`.
    assert_eq!(
        kinds("foo/int"),
        vec![
            TokenKind::Ident("foo".to_string()),
            TokenKind::Slash,
            TokenKind::Ident("int".to_string()),
        ]
    );
}

#[test]
fn test_regex_literal() {
    assert_eq!(
        kinds("/ab+c/"),
        vec![TokenKind::Regex {
            pattern: "ab+c".to_string(),
            ignore_case: false,
            multi_line: false,
            dot_all: false,
        }]
    );
}

#[test]
fn test_regex_flags() {
    assert_eq!(
        kinds("/x/ims"),
        vec![TokenKind::Regex {
            pattern: "x".to_string(),
            ignore_case: true,
            multi_line: true,
            dot_all: true,
        }]
    );
    assert!(error_message("/x/g").contains("not supported"));
    assert!(error_message("/x/y").contains("not supported"));
    assert!(error_message("/x/q").contains("unknown regex flag"));
}

#[test]
fn test_regex_slash_inside_class() {
    assert_eq!(
        kinds("/[/]+/"),
        vec![TokenKind::Regex {
            pattern: "[/]+".to_string(),
            ignore_case: false,
            multi_line: false,
            dot_all: false,
        }]
    );
}

#[test]
fn test_regex_escaped_slash() {
    assert_eq!(
        kinds(r"/a\/b/"),
        vec![TokenKind::Regex {
            pattern: r"a\/b".to_string(),
            ignore_case: false,
            multi_line: false,
            dot_all: false,
        }]
    );
}

#[test]
fn test_regex_vs_division() {
    // After a number, `/` is division; at expression start it is a
    // regex.
    assert_eq!(
        kinds("1 / 2"),
        vec![
            TokenKind::Number(1.0),
            TokenKind::Slash,
            TokenKind::Number(2.0),
        ]
    );
    assert_eq!(
        kinds("$x / 2"),
        vec![
            TokenKind::ScalarVar("x".to_string()),
            TokenKind::Slash,
            TokenKind::Number(2.0),
        ]
    );
    assert!(matches!(
        kinds(": /ab/")[1],
        TokenKind::Regex { .. }
    ));
}

#[test]
fn test_unterminated_regex() {
    assert!(error_message(": /abc").contains("unterminated regex"));
}

#[test]
fn test_comments() {
    assert_eq!(
        kinds("a // trailing\n b /* inline */ c"),
        vec![
            TokenKind::Ident("a".to_string()),
            TokenKind::Ident("b".to_string()),
            TokenKind::Ident("c".to_string()),
        ]
    );
}

#[test]
fn test_unterminated_block_comment() {
    assert!(error_message("a /* b").contains("unterminated block comment"));
}

#[test]
fn test_guard_operators() {
    assert_eq!(
        kinds("== != <= >= < > && || ! + - * %"),
        vec![
            TokenKind::EqEq,
            TokenKind::BangEq,
            TokenKind::LtEq,
            TokenKind::GtEq,
            TokenKind::Lt,
            TokenKind::Gt,
            TokenKind::AndAnd,
            TokenKind::OrOr,
            TokenKind::Bang,
            TokenKind::Plus,
            TokenKind::Minus,
            TokenKind::Star,
            TokenKind::Percent,
        ]
    );
}

#[test]
fn test_lone_ampersand_rejected() {
    assert!(error_message("&").contains("&&"));
}

#[test]
fn test_spans_are_byte_offsets() {
    let tokens = tokenize("ab  cd").expect("tokenize failed");
    assert_eq!(tokens[0].span.start, 0);
    assert_eq!(tokens[0].span.end, 2);
    assert_eq!(tokens[1].span.start, 4);
    assert_eq!(tokens[1].span.end, 6);
}

mod properties {
    use proptest::prelude::*;

    use crate::tokenize;

    proptest! {
        /// The lexer never panics, whatever the input.
        #[test]
        fn tokenize_never_panics(source in ".{0,64}") {
            let _ = tokenize(&source);
        }

        /// A successful lex always ends in exactly one Eof token.
        #[test]
        fn eof_terminated(source in "[a-z0-9 :,{}\\[\\]()$@%_.|*+?]{0,40}") {
            if let Ok(tokens) = tokenize(&source) {
                prop_assert!(!tokens.is_empty());
                prop_assert_eq!(
                    tokens.iter().filter(|t| t.kind == crate::TokenKind::Eof).count(),
                    1
                );
            }
        }

        /// Token spans are monotonically ordered and in bounds.
        #[test]
        fn spans_monotonic(source in "[a-z0-9 :,]{0,40}") {
            if let Ok(tokens) = tokenize(&source) {
                let mut prev_end = 0;
                for t in &tokens {
                    prop_assert!(t.span.start >= prev_end);
                    prop_assert!(t.span.end <= source.len());
                    prev_end = t.span.start;
                }
            }
        }
    }
}
