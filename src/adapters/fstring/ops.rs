// SPDX-License-Identifier: MIT OR Apache-2.0

//! Operator semantics.
//!
//! Integer arithmetic is checked: results that do not fit in 64 bits raise an
//! `OverflowError` instead of wrapping. Division always produces a float, and
//! floor division and modulo round toward negative infinity.

use super::ast::{BinaryOp, UnaryOp};
use super::value::{Num, Value};
use crate::domain::{EvalError, RuntimeErrorKind};

/// Largest string or list any single operation may produce.
pub const MAX_OUTPUT_LEN: usize = 1 << 24;

/// Fails with `OverflowError` when `len` is over [`MAX_OUTPUT_LEN`].
pub fn check_output_len(len: usize, what: &str) -> Result<(), EvalError> {
    if len > MAX_OUTPUT_LEN {
        return Err(EvalError::runtime(
            RuntimeErrorKind::OverflowError,
            format!("{} is too long", what),
        ));
    }
    Ok(())
}

/// Approximate size of a value: characters for strings, summed items for lists.
fn size_hint(value: &Value) -> usize {
    match value {
        Value::Str(s) => s.len(),
        Value::List(items) => items
            .iter()
            .fold(items.len(), |total, item| total.saturating_add(size_hint(item))),
        _ => 1,
    }
}

/// Applies a binary arithmetic operator.
pub fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    match (op, left, right) {
        (BinaryOp::Add, Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{}{}", a, b))),
        (BinaryOp::Add, Value::List(a), Value::List(b)) => {
            Ok(Value::List(a.iter().chain(b).cloned().collect()))
        }
        (BinaryOp::Mul, Value::Str(_) | Value::List(_), _) if right.as_int().is_some() => {
            repeat(left, right.as_int().unwrap_or(0))
        }
        (BinaryOp::Mul, _, Value::Str(_) | Value::List(_)) if left.as_int().is_some() => {
            repeat(right, left.as_int().unwrap_or(0))
        }
        (BinaryOp::Mod, Value::Str(_), _) => Err(EvalError::type_error(
            "printf-style string formatting is not supported",
        )),
        _ => numeric(op, left, right),
    }
}

/// Applies a unary operator.
pub fn unary(op: UnaryOp, operand: &Value) -> Result<Value, EvalError> {
    let bad_operand = |symbol: &str| {
        EvalError::type_error(format!(
            "bad operand type for unary {}: '{}'",
            symbol,
            operand.type_name()
        ))
    };

    match op {
        UnaryOp::Not => Ok(Value::Bool(!operand.is_truthy())),
        UnaryOp::Neg => match operand.as_num() {
            Some(Num::Int(i)) => i.checked_neg().map(Value::Int).ok_or_else(overflow),
            Some(Num::Float(f)) => Ok(Value::Float(-f)),
            None => Err(bad_operand("-")),
        },
        UnaryOp::Pos => match operand.as_num() {
            Some(Num::Int(i)) => Ok(Value::Int(i)),
            Some(Num::Float(f)) => Ok(Value::Float(f)),
            None => Err(bad_operand("+")),
        },
        UnaryOp::Invert => match operand.as_int() {
            Some(i) => Ok(Value::Int(!i)),
            None => Err(bad_operand("~")),
        },
    }
}

fn overflow() -> EvalError {
    EvalError::runtime(RuntimeErrorKind::OverflowError, "integer result too large")
}

fn zero_division(message: &str) -> EvalError {
    EvalError::runtime(RuntimeErrorKind::ZeroDivisionError, message)
}

fn unsupported(op: BinaryOp, left: &Value, right: &Value) -> EvalError {
    EvalError::type_error(format!(
        "unsupported operand type(s) for {}: '{}' and '{}'",
        op.symbol(),
        left.type_name(),
        right.type_name()
    ))
}

fn repeat(sequence: &Value, times: i64) -> Result<Value, EvalError> {
    let times = usize::try_from(times).unwrap_or(0);
    let total = size_hint(sequence).checked_mul(times).unwrap_or(usize::MAX);
    check_output_len(total, "repeated sequence")?;
    Ok(match sequence {
        Value::Str(s) => Value::Str(s.repeat(times)),
        Value::List(items) if items.is_empty() => Value::List(Vec::new()),
        Value::List(items) => {
            let mut out = Vec::with_capacity(items.len() * times);
            for _ in 0..times {
                out.extend(items.iter().cloned());
            }
            Value::List(out)
        }
        other => other.clone(),
    })
}

fn numeric(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    let (Some(a), Some(b)) = (left.as_num(), right.as_num()) else {
        return Err(unsupported(op, left, right));
    };
    match (a, b) {
        (Num::Int(x), Num::Int(y)) => int_op(op, x, y),
        _ => float_op(op, a.as_f64(), b.as_f64()),
    }
}

fn int_op(op: BinaryOp, x: i64, y: i64) -> Result<Value, EvalError> {
    let result = match op {
        BinaryOp::Add => x.checked_add(y),
        BinaryOp::Sub => x.checked_sub(y),
        BinaryOp::Mul => x.checked_mul(y),
        BinaryOp::Div => {
            if y == 0 {
                return Err(zero_division("division by zero"));
            }
            return Ok(Value::Float(x as f64 / y as f64));
        }
        BinaryOp::FloorDiv => {
            if y == 0 {
                return Err(zero_division("integer division or modulo by zero"));
            }
            x.checked_div(y).map(|q| {
                if x % y != 0 && ((x < 0) != (y < 0)) {
                    q - 1
                } else {
                    q
                }
            })
        }
        BinaryOp::Mod => {
            if y == 0 {
                return Err(zero_division("integer modulo by zero"));
            }
            x.checked_rem(y).map(|r| {
                if r != 0 && ((r < 0) != (y < 0)) {
                    r + y
                } else {
                    r
                }
            })
        }
        BinaryOp::Pow => {
            if y < 0 {
                return float_op(op, x as f64, y as f64);
            }
            match x {
                0 | 1 => Some(if y == 0 { 1 } else { x }),
                -1 => Some(if y % 2 == 0 { 1 } else { -1 }),
                _ => u32::try_from(y).ok().and_then(|e| x.checked_pow(e)),
            }
        }
    };
    result.map(Value::Int).ok_or_else(overflow)
}

fn float_op(op: BinaryOp, a: f64, b: f64) -> Result<Value, EvalError> {
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => {
            if b == 0.0 {
                return Err(zero_division("float division by zero"));
            }
            a / b
        }
        BinaryOp::FloorDiv => {
            if b == 0.0 {
                return Err(zero_division("float floor division by zero"));
            }
            float_divmod(a, b).0
        }
        BinaryOp::Mod => {
            if b == 0.0 {
                return Err(zero_division("float modulo by zero"));
            }
            float_divmod(a, b).1
        }
        BinaryOp::Pow => {
            if a == 0.0 && b < 0.0 {
                return Err(zero_division("0.0 cannot be raised to a negative power"));
            }
            if a < 0.0 && b.fract() != 0.0 && b.is_finite() {
                return Err(EvalError::value_error(
                    "negative number cannot be raised to a fractional power",
                ));
            }
            let result = a.powf(b);
            if result.is_infinite() && a.is_finite() && b.is_finite() {
                return Err(EvalError::runtime(
                    RuntimeErrorKind::OverflowError,
                    "(34, 'Numerical result out of range')",
                ));
            }
            result
        }
    };
    Ok(Value::Float(result))
}

/// Floor quotient and modulo with the sign of the divisor.
fn float_divmod(a: f64, b: f64) -> (f64, f64) {
    let mut modulo = a % b;
    let mut div = (a - modulo) / b;
    if modulo != 0.0 {
        if (b < 0.0) != (modulo < 0.0) {
            modulo += b;
            div -= 1.0;
        }
    } else {
        modulo = 0.0_f64.copysign(b);
    }
    let floordiv = if div != 0.0 {
        let floor = div.floor();
        if div - floor > 0.5 {
            floor + 1.0
        } else {
            floor
        }
    } else {
        0.0_f64.copysign(a / b)
    };
    (floordiv, modulo)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(i: i64) -> Value {
        Value::Int(i)
    }

    fn s(text: &str) -> Value {
        Value::Str(text.to_string())
    }

    #[test]
    fn test_int_arithmetic() {
        assert_eq!(binary(BinaryOp::Add, &int(2), &int(3)).unwrap(), int(5));
        assert_eq!(binary(BinaryOp::Div, &int(7), &int(2)).unwrap(), Value::Float(3.5));
        assert_eq!(binary(BinaryOp::FloorDiv, &int(-7), &int(2)).unwrap(), int(-4));
        assert_eq!(binary(BinaryOp::Mod, &int(-7), &int(2)).unwrap(), int(1));
        assert_eq!(binary(BinaryOp::Mod, &int(7), &int(-2)).unwrap(), int(-1));
        assert_eq!(binary(BinaryOp::Pow, &int(2), &int(10)).unwrap(), int(1024));
        assert_eq!(binary(BinaryOp::Pow, &int(2), &int(-1)).unwrap(), Value::Float(0.5));
    }

    #[test]
    fn test_mixed_arithmetic_promotes_to_float() {
        assert_eq!(
            binary(BinaryOp::Add, &int(1), &Value::Float(0.5)).unwrap(),
            Value::Float(1.5)
        );
        assert_eq!(
            binary(BinaryOp::Mul, &Value::Bool(true), &Value::Float(2.5)).unwrap(),
            Value::Float(2.5)
        );
    }

    #[test]
    fn test_float_floor_and_mod() {
        assert_eq!(
            binary(BinaryOp::FloorDiv, &Value::Float(-7.5), &int(2)).unwrap(),
            Value::Float(-4.0)
        );
        assert_eq!(
            binary(BinaryOp::Mod, &Value::Float(-7.5), &int(2)).unwrap(),
            Value::Float(0.5)
        );
    }

    #[test]
    fn test_overflow() {
        let err = binary(BinaryOp::Mul, &int(i64::MAX), &int(2)).unwrap_err();
        assert!(matches!(
            err,
            EvalError::Runtime {
                kind: RuntimeErrorKind::OverflowError,
                ..
            }
        ));
        assert!(unary(UnaryOp::Neg, &int(i64::MIN)).is_err());
    }

    #[test]
    fn test_division_by_zero() {
        let err = binary(BinaryOp::Div, &int(1), &int(0)).unwrap_err();
        assert_eq!(err.to_string(), "ZeroDivisionError: division by zero");
        let err = binary(BinaryOp::Mod, &Value::Float(1.0), &Value::Float(0.0)).unwrap_err();
        assert_eq!(err.to_string(), "ZeroDivisionError: float modulo by zero");
    }

    #[test]
    fn test_string_operations() {
        assert_eq!(binary(BinaryOp::Add, &s("two_"), &s("x")).unwrap(), s("two_x"));
        assert_eq!(binary(BinaryOp::Mul, &s("ab"), &int(3)).unwrap(), s("ababab"));
        assert_eq!(binary(BinaryOp::Mul, &int(2), &s("ab")).unwrap(), s("abab"));
        assert_eq!(binary(BinaryOp::Mul, &s("ab"), &int(-1)).unwrap(), s(""));
    }

    #[test]
    fn test_string_divided_by_int() {
        let err = binary(BinaryOp::Div, &s("3.14"), &int(2)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "TypeError: unsupported operand type(s) for /: 'str' and 'int'"
        );
    }

    #[test]
    fn test_string_plus_int() {
        let err = binary(BinaryOp::Add, &s("a"), &int(1)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "TypeError: unsupported operand type(s) for +: 'str' and 'int'"
        );
    }

    #[test]
    fn test_repeat_limit() {
        assert!(binary(BinaryOp::Mul, &s("a"), &int(i64::MAX)).is_err());
    }

    #[test]
    fn test_repeat_limit_counts_item_sizes() {
        let big = Value::List(vec![s(&"x".repeat(1 << 20))]);
        let err = binary(BinaryOp::Mul, &big, &int(1 << 10)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "OverflowError: repeated sequence is too long"
        );
        assert_eq!(
            binary(BinaryOp::Mul, &Value::List(Vec::new()), &int(i64::MAX)).unwrap(),
            Value::List(Vec::new())
        );
    }

    #[test]
    fn test_unary() {
        assert_eq!(unary(UnaryOp::Neg, &Value::Float(1.5)).unwrap(), Value::Float(-1.5));
        assert_eq!(unary(UnaryOp::Invert, &int(0)).unwrap(), int(-1));
        assert_eq!(unary(UnaryOp::Not, &s("")).unwrap(), Value::Bool(true));
        let err = unary(UnaryOp::Neg, &s("x")).unwrap_err();
        assert_eq!(err.to_string(), "TypeError: bad operand type for unary -: 'str'");
    }
}
