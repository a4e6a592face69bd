//! Parser tests over the full grammar surface.

use tendril_lex::tokenize;
use tendril_util::CompileErrorKind;

use crate::ast::{
    Ast, BindSigil, BucketSigil, KeyPattern, Lit, NodeId, NodeKind, ObjEntryKind, QuantMode,
};
use crate::parse;

fn parse_ok(source: &str) -> Ast {
    let tokens = tokenize(source).expect("tokenize failed");
    parse(tokens).expect("parse failed")
}

fn parse_err(source: &str) -> tendril_util::CompileError {
    let tokens = tokenize(source).expect("tokenize failed");
    parse(tokens).expect_err("expected a parse error")
}

fn kind<'a>(ast: &'a Ast, id: NodeId) -> &'a NodeKind {
    &ast.nodes[id].kind
}

fn root<'a>(ast: &'a Ast) -> &'a NodeKind {
    kind(ast, ast.root)
}

#[test]
fn test_literals() {
    assert!(matches!(
        root(&parse_ok("42")),
        NodeKind::Literal(Lit::Number(n)) if *n == 42.0
    ));
    assert!(matches!(
        root(&parse_ok("-3")),
        NodeKind::Literal(Lit::Number(n)) if *n == -3.0
    ));
    assert!(matches!(root(&parse_ok("null")), NodeKind::Literal(Lit::Null)));
    assert!(matches!(
        root(&parse_ok("true")),
        NodeKind::Literal(Lit::Bool(true))
    ));
    assert!(matches!(
        root(&parse_ok("hello")),
        NodeKind::Literal(Lit::Str(s)) if s == "hello"
    ));
    assert!(matches!(
        root(&parse_ok("\"two words\"")),
        NodeKind::Literal(Lit::Str(s)) if s == "two words"
    ));
}

#[test]
fn test_wildcards() {
    assert!(matches!(root(&parse_ok("_")), NodeKind::Wildcard));
    assert!(matches!(
        root(&parse_ok("_number")),
        NodeKind::TypedWildcard(tendril_lex::TypeTag::Number)
    ));
}

#[test]
fn test_variable_and_bind() {
    let ast = parse_ok("$x");
    assert!(matches!(root(&ast), NodeKind::Var(_)));

    let ast = parse_ok("$x=(/abc/)");
    match root(&ast) {
        NodeKind::Bind { sigil, inner, .. } => {
            assert_eq!(*sigil, BindSigil::Scalar);
            assert!(matches!(kind(&ast, *inner), NodeKind::Regex(_)));
        }
        other => panic!("expected bind, got {other:?}"),
    }
}

#[test]
fn test_as_bindings() {
    let ast = parse_ok("(1 as $x)");
    assert!(matches!(
        root(&ast),
        NodeKind::Bind { sigil: BindSigil::Scalar, .. }
    ));

    let ast = parse_ok("[(1 2 as @run)]");
    let NodeKind::Array(body) = root(&ast) else {
        panic!("expected array");
    };
    match kind(&ast, *body) {
        NodeKind::Bind { sigil, inner, .. } => {
            assert_eq!(*sigil, BindSigil::Seq);
            assert!(matches!(kind(&ast, *inner), NodeKind::Seq(items) if items.len() == 2));
        }
        other => panic!("expected seq bind, got {other:?}"),
    }
}

#[test]
fn test_bare_group_variable_rejected() {
    let err = parse_err("@x");
    assert!(err.message.contains("binds with"));
}

#[test]
fn test_array_and_quantifiers() {
    let ast = parse_ok("[1* 2+? 3{2,4}+]");
    let NodeKind::Array(body) = root(&ast) else {
        panic!("expected array");
    };
    let NodeKind::Seq(items) = kind(&ast, *body) else {
        panic!("expected seq body");
    };
    assert_eq!(items.len(), 3);

    assert!(matches!(
        kind(&ast, items[0]),
        NodeKind::Quant { min: 0, max: None, mode: QuantMode::Greedy, .. }
    ));
    assert!(matches!(
        kind(&ast, items[1]),
        NodeKind::Quant { min: 1, max: None, mode: QuantMode::Lazy, .. }
    ));
    assert!(matches!(
        kind(&ast, items[2]),
        NodeKind::Quant { min: 2, max: Some(4), mode: QuantMode::Possessive, .. }
    ));
}

#[test]
fn test_exact_bound() {
    let ast = parse_ok("[a{3}]");
    let NodeKind::Array(body) = root(&ast) else {
        panic!("expected array");
    };
    assert!(matches!(
        kind(&ast, *body),
        NodeKind::Quant { min: 3, max: Some(3), .. }
    ));
}

#[test]
fn test_quantifier_bound_errors() {
    assert!(parse_err("[a{3,2}]").message.contains("exceeds"));
    assert!(parse_err("[a{1.5}]").message.contains("integers"));
    assert!(parse_err("[a{-1}]").message.contains("integers"));
}

#[test]
fn test_nested_quantifier_rejected() {
    assert!(parse_err("[a**]").message.contains("parenthesize"));
    assert!(parse_err("[a*?*]").message.contains("parenthesize"));
}

#[test]
fn test_spread_in_sequence() {
    let ast = parse_ok("[... 1 ...]");
    let NodeKind::Array(body) = root(&ast) else {
        panic!("expected array");
    };
    let NodeKind::Seq(items) = kind(&ast, *body) else {
        panic!("expected seq");
    };
    assert!(matches!(kind(&ast, items[0]), NodeKind::Spread));
    assert!(matches!(kind(&ast, items[2]), NodeKind::Spread));
}

#[test]
fn test_alternation_collects_branches() {
    let ast = parse_ok("1 | 2 | 3");
    let NodeKind::Alt(branches) = root(&ast) else {
        panic!("expected alt");
    };
    assert_eq!(branches.len(), 3);
}

#[test]
fn test_else_right_associative() {
    let ast = parse_ok("1 else 2 else 3");
    let NodeKind::Else { fallback, .. } = root(&ast) else {
        panic!("expected else");
    };
    assert!(matches!(kind(&ast, *fallback), NodeKind::Else { .. }));
}

#[test]
fn test_mixing_pipe_and_else_rejected() {
    assert!(parse_err("1 | 2 else 3").message.contains("mix"));
    assert!(parse_err("1 else 2 | 3").message.contains("mix"));
}

#[test]
fn test_parenthesized_mix_allowed() {
    let ast = parse_ok("(1 | 2) else 3");
    assert!(matches!(root(&ast), NodeKind::Else { .. }));
}

#[test]
fn test_lookaheads() {
    let ast = parse_ok("[(?1) (!2) 3]");
    let NodeKind::Array(body) = root(&ast) else {
        panic!("expected array");
    };
    let NodeKind::Seq(items) = kind(&ast, *body) else {
        panic!("expected seq");
    };
    assert!(matches!(
        kind(&ast, items[0]),
        NodeKind::Lookahead { negative: false, .. }
    ));
    assert!(matches!(
        kind(&ast, items[1]),
        NodeKind::Lookahead { negative: true, .. }
    ));
}

#[test]
fn test_object_entries() {
    let ast = parse_ok("{a: 1, each $k: _number, b: 2?}");
    let NodeKind::Object(body) = root(&ast) else {
        panic!("expected object");
    };
    assert_eq!(body.entries.len(), 3);
    assert!(matches!(
        body.entries[0].kind,
        ObjEntryKind::Assert { each: false, optional: false, .. }
    ));
    assert!(matches!(
        body.entries[1].kind,
        ObjEntryKind::Assert { each: true, .. }
    ));
    assert!(matches!(
        body.entries[2].kind,
        ObjEntryKind::Assert { optional: true, .. }
    ));
}

#[test]
fn test_each_as_a_key_literal() {
    // `each:` in key position is the string key "each".
    let ast = parse_ok("{each: 1}");
    let NodeKind::Object(body) = root(&ast) else {
        panic!("expected object");
    };
    let ObjEntryKind::Assert { key: KeyPattern::Node(k), each, .. } = &body.entries[0].kind
    else {
        panic!("expected assert");
    };
    assert!(!each);
    assert!(matches!(kind(&ast, *k), NodeKind::Literal(Lit::Str(s)) if s == "each"));
}

#[test]
fn test_residual_forms() {
    let ast = parse_ok("{a: 1, %}");
    let NodeKind::Object(body) = root(&ast) else {
        panic!("expected object");
    };
    let residual = body.residual.as_ref().expect("expected residual");
    assert_eq!((residual.min, residual.max), (1, None));

    let ast = parse_ok("{a: 1, %?}");
    let NodeKind::Object(body) = root(&ast) else {
        panic!("expected object");
    };
    let residual = body.residual.as_ref().expect("expected residual");
    assert_eq!((residual.min, residual.max), (0, None));

    let ast = parse_ok("{a: 1, %#{2,3}}");
    let NodeKind::Object(body) = root(&ast) else {
        panic!("expected object");
    };
    let residual = body.residual.as_ref().expect("expected residual");
    assert_eq!((residual.min, residual.max), (2, Some(3)));

    let ast = parse_ok("{a: 1, (!%)}");
    let NodeKind::Object(body) = root(&ast) else {
        panic!("expected object");
    };
    let residual = body.residual.as_ref().expect("expected residual");
    assert_eq!((residual.min, residual.max), (0, Some(0)));
}

#[test]
fn test_bound_residual() {
    let ast = parse_ok("{a: 1, (% as %rest)}");
    let NodeKind::Object(body) = root(&ast) else {
        panic!("expected object");
    };
    let residual = body.residual.as_ref().expect("expected residual");
    assert!(residual.bind.is_some());
    assert_eq!((residual.min, residual.max), (1, None));
}

#[test]
fn test_residual_must_be_last() {
    assert!(parse_err("{%, a: 1}").message.contains("last entry"));
}

#[test]
fn test_negative_assertion() {
    let ast = parse_ok("{(!secret: _)}");
    let NodeKind::Object(body) = root(&ast) else {
        panic!("expected object");
    };
    assert!(matches!(body.entries[0].kind, ObjEntryKind::NotAssert { .. }));
}

#[test]
fn test_flow_in_value_position() {
    let ast = parse_ok("{$k: (1 -> %ones else 2 -> %twos)}");
    let NodeKind::Object(body) = root(&ast) else {
        panic!("expected object");
    };
    let ObjEntryKind::Assert { value, .. } = &body.entries[0].kind else {
        panic!("expected assert");
    };
    let NodeKind::Else { primary, fallback } = kind(&ast, *value) else {
        panic!("expected else");
    };
    assert!(matches!(
        kind(&ast, *primary),
        NodeKind::Flow { bucket, .. } if bucket.sigil == BucketSigil::Map
    ));
    assert!(matches!(kind(&ast, *fallback), NodeKind::Flow { .. }));
}

#[test]
fn test_flow_with_across() {
    let ast = parse_ok("{a: (1 -> @xs across ^outer)}");
    let NodeKind::Object(body) = root(&ast) else {
        panic!("expected object");
    };
    let ObjEntryKind::Assert { value, .. } = &body.entries[0].kind else {
        panic!("expected assert");
    };
    let NodeKind::Flow { bucket, .. } = kind(&ast, *value) else {
        panic!("expected flow");
    };
    assert_eq!(bucket.sigil, BucketSigil::Seq);
    assert!(bucket.across.is_some());
}

#[test]
fn test_collecting_clause() {
    let ast = parse_ok("{$k: $v, <collecting $k:$v in %pairs across ^top>}");
    let NodeKind::Object(body) = root(&ast) else {
        panic!("expected object");
    };
    let ObjEntryKind::Collecting { key, bucket, .. } = &body.entries[1].kind else {
        panic!("expected collecting");
    };
    assert!(key.is_some());
    assert_eq!(bucket.sigil, BucketSigil::Map);
    assert!(bucket.across.is_some());
}

#[test]
fn test_value_only_collecting() {
    let ast = parse_ok("{each $k: $v, <collecting $v in @values across ^top>}");
    let NodeKind::Object(body) = root(&ast) else {
        panic!("expected object");
    };
    let ObjEntryKind::Collecting { key, bucket, .. } = &body.entries[1].kind else {
        panic!("expected collecting");
    };
    assert!(key.is_none());
    assert_eq!(bucket.sigil, BucketSigil::Seq);
}

#[test]
fn test_fixed_path_key() {
    let ast = parse_ok("{a.b.c: 1}");
    let NodeKind::Object(body) = root(&ast) else {
        panic!("expected object");
    };
    let ObjEntryKind::Assert { key: KeyPattern::Path(segs), .. } = &body.entries[0].kind
    else {
        panic!("expected path key");
    };
    assert_eq!(segs.len(), 3);
    assert!(segs.iter().all(|s| !s.deep));
    assert_eq!(segs[2].key, "c");
}

#[test]
fn test_deep_path_key() {
    let ast = parse_ok("{..password: $p}");
    let NodeKind::Object(body) = root(&ast) else {
        panic!("expected object");
    };
    let ObjEntryKind::Assert { key: KeyPattern::Path(segs), .. } = &body.entries[0].kind
    else {
        panic!("expected path key");
    };
    assert_eq!(segs.len(), 1);
    assert!(segs[0].deep);
    assert_eq!(segs[0].key, "password");
}

#[test]
fn test_mixed_path() {
    let ast = parse_ok("{user..token: _}");
    let NodeKind::Object(body) = root(&ast) else {
        panic!("expected object");
    };
    let ObjEntryKind::Assert { key: KeyPattern::Path(segs), .. } = &body.entries[0].kind
    else {
        panic!("expected path key");
    };
    assert_eq!(segs.len(), 2);
    assert!(!segs[0].deep);
    assert!(segs[1].deep);
}

#[test]
fn test_bare_deep_dots_rejected() {
    assert!(parse_err("{..: 1}").message.contains("key name"));
}

#[test]
fn test_set_pattern() {
    let ast = parse_ok("{{1 2 ...}}");
    let NodeKind::Set { items, open } = root(&ast) else {
        panic!("expected set");
    };
    assert_eq!(items.len(), 2);
    assert!(open);

    let ast = parse_ok("{{a}}");
    assert!(matches!(root(&ast), NodeKind::Set { open: false, .. }));
}

#[test]
fn test_marker() {
    let ast = parse_ok("{a: >>$x<<}");
    let NodeKind::Object(body) = root(&ast) else {
        panic!("expected object");
    };
    let ObjEntryKind::Assert { value, .. } = &body.entries[0].kind else {
        panic!("expected assert");
    };
    assert!(matches!(kind(&ast, *value), NodeKind::Marker { .. }));
}

#[test]
fn test_label_prefix() {
    let ast = parse_ok("§top {a: 1}");
    let NodeKind::Label { inner, .. } = root(&ast) else {
        panic!("expected label");
    };
    assert!(matches!(kind(&ast, *inner), NodeKind::Object(_)));
}

#[test]
fn test_guard() {
    let ast = parse_ok("($x where $x > 3 && size($x) != 0)");
    let NodeKind::Guard { inner, expr } = root(&ast) else {
        panic!("expected guard");
    };
    assert!(matches!(kind(&ast, *inner), NodeKind::Var(_)));
    assert!(matches!(
        **expr,
        crate::ast::GuardExpr::Binary { op: crate::ast::GuardBinOp::And, .. }
    ));
}

#[test]
fn test_guard_precedence() {
    // `1 + 2 * 3 == 7` parses as `(1 + (2 * 3)) == 7`.
    let ast = parse_ok("($x where 1 + 2 * 3 == 7)");
    let NodeKind::Guard { expr, .. } = root(&ast) else {
        panic!("expected guard");
    };
    let crate::ast::GuardExpr::Binary { op, lhs, .. } = &**expr else {
        panic!("expected binary");
    };
    assert_eq!(*op, crate::ast::GuardBinOp::Eq);
    assert!(matches!(
        &**lhs,
        crate::ast::GuardExpr::Binary { op: crate::ast::GuardBinOp::Add, .. }
    ));
}

#[test]
fn test_guard_unknown_identifier() {
    let err = parse_err("($x where bogus)");
    assert_eq!(err.kind, CompileErrorKind::Guard);
}

#[test]
fn test_guard_division_lexes() {
    let ast = parse_ok("($x where $x / 2 == 1)");
    assert!(matches!(root(&ast), NodeKind::Guard { .. }));
}

#[test]
fn test_trailing_tokens_rejected() {
    assert!(parse_err("1 2").message.contains("after end of pattern"));
}

#[test]
fn test_unclosed_delimiters() {
    assert!(parse_err("[1 2").message.contains("`]`"));
    assert!(parse_err("{a: 1").message.contains("unclosed object"));
}

#[test]
fn test_empty_group_rejected() {
    assert!(parse_err("()").message.contains("empty group"));
}

#[test]
fn test_spans_cover_source() {
    let source = "{a: [1 2]}";
    let ast = parse_ok(source);
    let span = ast.nodes[ast.root].span;
    assert_eq!(span.start, 0);
    assert_eq!(span.end, source.len());
}

#[test]
fn test_seed_pattern_shapes() {
    // The seed scenarios from the engine's contract all parse.
    parse_ok("[$x $x]");
    parse_ok("{a:1, (% as %rest)}");
    parse_ok("{each $k: (1 -> %ones else 2 -> %twos)}");
    parse_ok("[(1 as $x)* (1 -> @last) 2]");
    parse_ok("{a:$x, $x=(/abc/):$y}");
    parse_ok("{..password: $p}");
}
