//! Guard expression parsing using Pratt parsing (top-down operator
//! precedence).
//!
//! # Operator precedence (lowest to highest)
//!
//! | Level | Operators | Associativity |
//! |-------|-----------|---------------|
//! | 1 | `\|\|` | Left |
//! | 2 | `&&` | Left |
//! | 3 | `==`, `!=` | Left |
//! | 4 | `<`, `<=`, `>`, `>=` | Left |
//! | 5 | `+`, `-` | Left |
//! | 6 | `*`, `/`, `%` | Left |
//! | 7 | `!`, unary `-` | Prefix |

use tendril_lex::TokenKind;
use tendril_util::error::CompileResult;
use tendril_util::CompileError;

use crate::ast::{GuardBinOp, GuardExpr, GuardFn, GuardUnOp};
use crate::Parser;

/// Binding power levels for Pratt parsing.
/// Higher numbers = tighter binding (higher precedence).
mod bp {
    /// Minimum binding power (start of expression).
    pub const MIN: u8 = 0;

    /// Logical OR: ||
    pub const LOGICAL_OR: u8 = 2;

    /// Logical AND: &&
    pub const LOGICAL_AND: u8 = 4;

    /// Equality: ==, !=
    pub const EQUALITY: u8 = 6;

    /// Comparison: <, <=, >, >=
    pub const COMPARISON: u8 = 8;

    /// Additive: +, -
    pub const ADDITIVE: u8 = 10;

    /// Multiplicative: *, /, %
    pub const MULTIPLICATIVE: u8 = 12;

    /// Prefix operators: !, unary -
    pub const PREFIX: u8 = 14;
}

impl Parser {
    /// Parse a guard expression after `where`; stops before the `)`
    /// that closes the guard.
    pub(crate) fn parse_guard_expr(&mut self) -> CompileResult<GuardExpr> {
        self.parse_guard_bp(bp::MIN)
    }

    /// The Pratt loop: parse a prefix expression, then fold in binary
    /// operators whose left binding power is at least `min_bp`.
    fn parse_guard_bp(&mut self, min_bp: u8) -> CompileResult<GuardExpr> {
        let lhs = self.parse_guard_prefix()?;
        self.parse_guard_binary(lhs, min_bp)
    }

    fn parse_guard_binary(
        &mut self,
        mut lhs: GuardExpr,
        min_bp: u8,
    ) -> CompileResult<GuardExpr> {
        loop {
            let Some((lbp, op)) = guard_binding_power(self.peek()) else {
                return Ok(lhs);
            };
            if lbp < min_bp {
                return Ok(lhs);
            }
            self.advance();
            let rhs = self.parse_guard_bp(lbp + 1)?;
            lhs = GuardExpr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn parse_guard_prefix(&mut self) -> CompileResult<GuardExpr> {
        let span = self.peek_span();
        match self.peek().clone() {
            TokenKind::Number(n) => {
                self.advance();
                Ok(GuardExpr::Number(n))
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(GuardExpr::Str(s))
            }
            TokenKind::ScalarVar(name) => {
                self.advance();
                let name = self.intern(&name);
                Ok(GuardExpr::Var { name, span })
            }
            TokenKind::Ident(word) => {
                self.advance();
                match word.as_str() {
                    "null" => Ok(GuardExpr::Null),
                    "true" => Ok(GuardExpr::Bool(true)),
                    "false" => Ok(GuardExpr::Bool(false)),
                    _ => {
                        if let Some(func) = GuardFn::from_name(&word) {
                            self.expect(&TokenKind::LParen, "to open the call")
                                .map_err(to_guard_error)?;
                            let arg = self.parse_guard_bp(bp::MIN)?;
                            self.expect(&TokenKind::RParen, "to close the call")
                                .map_err(to_guard_error)?;
                            Ok(GuardExpr::Call {
                                func,
                                arg: Box::new(arg),
                            })
                        } else {
                            Err(CompileError::guard(
                                span,
                                format!("unknown identifier `{word}` in guard expression"),
                            ))
                        }
                    }
                }
            }
            TokenKind::Minus => {
                self.advance();
                let expr = self.parse_guard_bp(bp::PREFIX)?;
                Ok(GuardExpr::Unary {
                    op: GuardUnOp::Neg,
                    expr: Box::new(expr),
                })
            }
            TokenKind::Bang => {
                self.advance();
                let expr = self.parse_guard_bp(bp::PREFIX)?;
                Ok(GuardExpr::Unary {
                    op: GuardUnOp::Not,
                    expr: Box::new(expr),
                })
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_guard_bp(bp::MIN)?;
                self.expect(&TokenKind::RParen, "to close the group")
                    .map_err(to_guard_error)?;
                Ok(expr)
            }
            // The lexer fuses `(` and `!`; inside a guard that is a
            // parenthesized negation.
            TokenKind::LParenBang => {
                self.advance();
                let negated = self.parse_guard_bp(bp::PREFIX)?;
                let inner = GuardExpr::Unary {
                    op: GuardUnOp::Not,
                    expr: Box::new(negated),
                };
                let expr = self.parse_guard_binary(inner, bp::MIN)?;
                self.expect(&TokenKind::RParen, "to close the group")
                    .map_err(to_guard_error)?;
                Ok(expr)
            }
            other => Err(CompileError::guard(
                span,
                format!("expected a guard expression, found {}", other.describe()),
            )),
        }
    }
}

fn to_guard_error(mut err: CompileError) -> CompileError {
    err.kind = tendril_util::CompileErrorKind::Guard;
    err
}

/// `(left_binding_power, operator)` for the current token, if it is a
/// binary guard operator. Left-associative throughout: the right-hand
/// side is parsed with `lbp + 1`.
fn guard_binding_power(kind: &TokenKind) -> Option<(u8, GuardBinOp)> {
    Some(match kind {
        TokenKind::OrOr => (bp::LOGICAL_OR, GuardBinOp::Or),
        TokenKind::AndAnd => (bp::LOGICAL_AND, GuardBinOp::And),
        TokenKind::EqEq => (bp::EQUALITY, GuardBinOp::Eq),
        TokenKind::BangEq => (bp::EQUALITY, GuardBinOp::Ne),
        TokenKind::Lt => (bp::COMPARISON, GuardBinOp::Lt),
        TokenKind::LtEq => (bp::COMPARISON, GuardBinOp::Le),
        TokenKind::Gt => (bp::COMPARISON, GuardBinOp::Gt),
        TokenKind::GtEq => (bp::COMPARISON, GuardBinOp::Ge),
        TokenKind::Plus => (bp::ADDITIVE, GuardBinOp::Add),
        TokenKind::Minus => (bp::ADDITIVE, GuardBinOp::Sub),
        TokenKind::Star => (bp::MULTIPLICATIVE, GuardBinOp::Mul),
        TokenKind::Slash => (bp::MULTIPLICATIVE, GuardBinOp::Div),
        TokenKind::Percent => (bp::MULTIPLICATIVE, GuardBinOp::Rem),
        _ => return None,
    })
}
