//! Guard expression evaluation.
//!
//! Three-valued: a guard holds, fails the branch (falsity and every
//! evaluation error look the same to the matcher), or defers because a
//! referenced variable is not bound yet. Deferred guards re-evaluate at
//! solution emission; still-unresolved ones fail the branch there.

use tendril_par::ast::{GuardBinOp, GuardExpr, GuardFn, GuardUnOp};
use tendril_value::Value;

use crate::env::Env;

/// Outcome of evaluating a guard at a particular point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum GuardOutcome {
    /// Truthy: the branch continues.
    Holds,
    /// Falsy or an evaluation error: the branch fails.
    Fails,
    /// A referenced variable is unbound: re-try at emission.
    Defer,
}

enum EvalError {
    Unbound,
    Type,
}

type EvalResult = Result<Value, EvalError>;

/// Evaluate a guard against the current bindings.
pub(crate) fn eval_guard(expr: &GuardExpr, env: &Env) -> GuardOutcome {
    match eval(expr, env) {
        Ok(value) => {
            if truthy(&value) {
                GuardOutcome::Holds
            } else {
                GuardOutcome::Fails
            }
        }
        Err(EvalError::Unbound) => GuardOutcome::Defer,
        Err(EvalError::Type) => GuardOutcome::Fails,
    }
}

/// Truthiness mirrors the host data model: `null`, `false`, `0`, `NaN`,
/// and the empty string are falsy, everything else truthy.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => *n != 0.0 && !n.is_nan(),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

fn eval(expr: &GuardExpr, env: &Env) -> EvalResult {
    match expr {
        GuardExpr::Null => Ok(Value::Null),
        GuardExpr::Bool(b) => Ok(Value::Bool(*b)),
        GuardExpr::Number(n) => Ok(Value::Number(*n)),
        GuardExpr::Str(s) => Ok(Value::String(s.clone())),
        GuardExpr::Var { name, .. } => env.get(*name).cloned().ok_or(EvalError::Unbound),
        GuardExpr::Unary { op, expr } => match op {
            GuardUnOp::Not => {
                let value = eval(expr, env)?;
                Ok(Value::Bool(!truthy(&value)))
            }
            GuardUnOp::Neg => {
                let value = eval(expr, env)?;
                match value {
                    Value::Number(n) => Ok(Value::Number(-n)),
                    _ => Err(EvalError::Type),
                }
            }
        },
        GuardExpr::Binary { op, lhs, rhs } => eval_binary(*op, lhs, rhs, env),
        GuardExpr::Call { func, arg } => {
            let value = eval(arg, env)?;
            eval_builtin(*func, value)
        }
    }
}

fn eval_binary(op: GuardBinOp, lhs: &GuardExpr, rhs: &GuardExpr, env: &Env) -> EvalResult {
    // Short-circuit forms first; an unbound variable on a skipped side
    // stays unevaluated.
    match op {
        GuardBinOp::And => {
            let left = eval(lhs, env)?;
            if !truthy(&left) {
                return Ok(Value::Bool(false));
            }
            let right = eval(rhs, env)?;
            return Ok(Value::Bool(truthy(&right)));
        }
        GuardBinOp::Or => {
            let left = eval(lhs, env)?;
            if truthy(&left) {
                return Ok(Value::Bool(true));
            }
            let right = eval(rhs, env)?;
            return Ok(Value::Bool(truthy(&right)));
        }
        _ => {}
    }

    let left = eval(lhs, env)?;
    let right = eval(rhs, env)?;
    match op {
        GuardBinOp::Eq => Ok(Value::Bool(left == right)),
        GuardBinOp::Ne => Ok(Value::Bool(left != right)),
        GuardBinOp::Lt | GuardBinOp::Le | GuardBinOp::Gt | GuardBinOp::Ge => {
            let ordering = compare(&left, &right)?;
            let holds = match op {
                GuardBinOp::Lt => ordering == std::cmp::Ordering::Less,
                GuardBinOp::Le => ordering != std::cmp::Ordering::Greater,
                GuardBinOp::Gt => ordering == std::cmp::Ordering::Greater,
                _ => ordering != std::cmp::Ordering::Less,
            };
            Ok(Value::Bool(holds))
        }
        GuardBinOp::Add | GuardBinOp::Sub | GuardBinOp::Mul | GuardBinOp::Div
        | GuardBinOp::Rem => {
            let (Value::Number(a), Value::Number(b)) = (&left, &right) else {
                return Err(EvalError::Type);
            };
            let result = match op {
                GuardBinOp::Add => a + b,
                GuardBinOp::Sub => a - b,
                GuardBinOp::Mul => a * b,
                GuardBinOp::Div => {
                    if *b == 0.0 {
                        return Err(EvalError::Type);
                    }
                    a / b
                }
                _ => {
                    if *b == 0.0 {
                        return Err(EvalError::Type);
                    }
                    a % b
                }
            };
            Ok(Value::Number(result))
        }
        GuardBinOp::And | GuardBinOp::Or => unreachable!("handled above"),
    }
}

/// Ordering for `< <= > >=`: numbers numerically, strings
/// lexicographically; anything else is a type error.
fn compare(left: &Value, right: &Value) -> Result<std::cmp::Ordering, EvalError> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => {
            a.partial_cmp(b).ok_or(EvalError::Type)
        }
        (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
        _ => Err(EvalError::Type),
    }
}

fn eval_builtin(func: GuardFn, value: Value) -> EvalResult {
    match func {
        GuardFn::Size => value
            .size()
            .map(|n| Value::Number(n as f64))
            .ok_or(EvalError::Type),
        GuardFn::Number => match value {
            Value::Number(n) => Ok(Value::Number(n)),
            Value::Bool(b) => Ok(Value::Number(if b { 1.0 } else { 0.0 })),
            Value::Null => Ok(Value::Number(0.0)),
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    Ok(Value::Number(0.0))
                } else {
                    Ok(Value::Number(trimmed.parse().unwrap_or(f64::NAN)))
                }
            }
            _ => Err(EvalError::Type),
        },
        GuardFn::String => match value {
            Value::String(s) => Ok(Value::String(s)),
            Value::Number(n) => Ok(Value::String(Value::Number(n).to_string())),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            Value::Null => Ok(Value::String("null".to_string())),
            _ => Err(EvalError::Type),
        },
        GuardFn::Boolean => Ok(Value::Bool(truthy(&value))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tendril_lex::tokenize;
    use tendril_par::ast::NodeKind;
    use tendril_par::parse;
    use tendril_util::Interner;

    use crate::solution::{OccKind, Occurrence};

    /// Parse `($x where <expr>)` and hand back the guard tree plus an
    /// interner that knows the variable names.
    fn guard_of(source: &str) -> (GuardExpr, Interner) {
        let ast = parse(tokenize(source).expect("tokenize")).expect("parse");
        let NodeKind::Guard { expr, .. } = &ast.nodes[ast.root].kind else {
            panic!("expected guard");
        };
        ((**expr).clone(), ast.interner)
    }

    fn env_with(interner: &mut Interner, name: &str, value: Value) -> Env {
        let mut env = Env::new();
        let sym = interner.intern(name);
        env.bind_or_unify(
            sym,
            &value,
            Occurrence {
                path: vec![],
                kind: OccKind::Node,
            },
        );
        env
    }

    #[test]
    fn test_arithmetic_and_comparison() {
        let (expr, mut interner) = guard_of("($x where $x * 2 + 1 == 7)");
        let env = env_with(&mut interner, "x", Value::from(3i64));
        assert_eq!(eval_guard(&expr, &env), GuardOutcome::Holds);

        let env = env_with(&mut interner, "x", Value::from(4i64));
        assert_eq!(eval_guard(&expr, &env), GuardOutcome::Fails);
    }

    #[test]
    fn test_division_by_zero_fails() {
        let (expr, mut interner) = guard_of("($x where 1 / $x > 0)");
        let env = env_with(&mut interner, "x", Value::from(0i64));
        assert_eq!(eval_guard(&expr, &env), GuardOutcome::Fails);
    }

    #[test]
    fn test_unbound_defers() {
        let (expr, _interner) = guard_of("($x where $x > 1)");
        let env = Env::new();
        assert_eq!(eval_guard(&expr, &env), GuardOutcome::Defer);
    }

    #[test]
    fn test_short_circuit_skips_unbound() {
        // `false && $x` decides without $x.
        let (expr, _interner) = guard_of("($x where false && $x)");
        let env = Env::new();
        assert_eq!(eval_guard(&expr, &env), GuardOutcome::Fails);

        let (expr, _interner) = guard_of("($x where true || $x)");
        let env = Env::new();
        assert_eq!(eval_guard(&expr, &env), GuardOutcome::Holds);
    }

    #[test]
    fn test_size_builtin() {
        let (expr, mut interner) = guard_of("($x where size($x) == 2)");
        let env = env_with(
            &mut interner,
            "x",
            Value::Array(vec![Value::Null, Value::Null]),
        );
        assert_eq!(eval_guard(&expr, &env), GuardOutcome::Holds);

        let env = env_with(&mut interner, "x", Value::from("ab"));
        assert_eq!(eval_guard(&expr, &env), GuardOutcome::Holds);

        let env = env_with(&mut interner, "x", Value::from(3i64));
        assert_eq!(eval_guard(&expr, &env), GuardOutcome::Fails, "size(number) errors");
    }

    #[test]
    fn test_conversions() {
        let (expr, mut interner) = guard_of("($x where number($x) == 42)");
        let env = env_with(&mut interner, "x", Value::from("42"));
        assert_eq!(eval_guard(&expr, &env), GuardOutcome::Holds);

        let (expr, mut interner) = guard_of("($x where string($x) == \"7\")");
        let env = env_with(&mut interner, "x", Value::from(7i64));
        assert_eq!(eval_guard(&expr, &env), GuardOutcome::Holds);

        let (expr, mut interner) = guard_of("($x where boolean($x))");
        let env = env_with(&mut interner, "x", Value::from(""));
        assert_eq!(eval_guard(&expr, &env), GuardOutcome::Fails);
    }

    #[test]
    fn test_string_comparison() {
        let (expr, mut interner) = guard_of("($x where $x < \"m\")");
        let env = env_with(&mut interner, "x", Value::from("apple"));
        assert_eq!(eval_guard(&expr, &env), GuardOutcome::Holds);
    }

    #[test]
    fn test_mixed_type_comparison_fails() {
        let (expr, mut interner) = guard_of("($x where $x < 3)");
        let env = env_with(&mut interner, "x", Value::from("apple"));
        assert_eq!(eval_guard(&expr, &env), GuardOutcome::Fails);
    }

    #[test]
    fn test_same_expression_same_outcome() {
        let (expr, mut interner) = guard_of("($x where $x % 2 == 1)");
        let env = env_with(&mut interner, "x", Value::from(5i64));
        let first = eval_guard(&expr, &env);
        let second = eval_guard(&expr, &env);
        assert_eq!(first, second);
    }
}
