// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builtin functions and the methods of `str` and `list` values.
//!
//! Builtins are looked up last, after comprehension variables and the names
//! in scope, so an option called `sum` hides the `sum` builtin.

use std::cmp::Ordering;
use std::collections::HashMap;

use once_cell::sync::Lazy;

use super::ast::BinaryOp;
use super::format::format_value;
use super::ops::{self, check_output_len};
use super::value::{compare_values, repr_str, values_equal, Num, Value};
use crate::domain::{EvalError, RuntimeErrorKind};

/// Longest list `range()` may materialize.
const MAX_RANGE_LEN: i64 = 1 << 20;

/// Decimal places past which rounding a float leaves it unchanged.
const MAX_ROUND_DIGITS: i64 = 323;

/// A builtin function.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Builtin {
    /// `abs(x)`
    Abs,
    /// `all(iterable)`
    All,
    /// `any(iterable)`
    Any,
    /// `bin(x)`
    Bin,
    /// `bool(x=False)`
    Bool,
    /// `chr(i)`
    Chr,
    /// `float(x=0.0)`
    Float,
    /// `format(value, spec='')`
    Format,
    /// `hex(x)`
    Hex,
    /// `int(x=0, base=10)`
    Int,
    /// `len(s)`
    Len,
    /// `list(iterable=())`
    List,
    /// `max(iterable)` or `max(a, b, ...)`
    Max,
    /// `min(iterable)` or `min(a, b, ...)`
    Min,
    /// `oct(x)`
    Oct,
    /// `ord(c)`
    Ord,
    /// `pow(base, exp)`
    Pow,
    /// `range(stop)` or `range(start, stop, step=1)`
    Range,
    /// `repr(x)`
    Repr,
    /// `round(x, ndigits=None)`
    Round,
    /// `sorted(iterable, reverse=False)`
    Sorted,
    /// `str(x='')`
    Str,
    /// `sum(iterable, start=0)`
    Sum,
}

static BUILTINS: Lazy<HashMap<&'static str, Builtin>> = Lazy::new(|| {
    [
        Builtin::Abs,
        Builtin::All,
        Builtin::Any,
        Builtin::Bin,
        Builtin::Bool,
        Builtin::Chr,
        Builtin::Float,
        Builtin::Format,
        Builtin::Hex,
        Builtin::Int,
        Builtin::Len,
        Builtin::List,
        Builtin::Max,
        Builtin::Min,
        Builtin::Oct,
        Builtin::Ord,
        Builtin::Pow,
        Builtin::Range,
        Builtin::Repr,
        Builtin::Round,
        Builtin::Sorted,
        Builtin::Str,
        Builtin::Sum,
    ]
    .into_iter()
    .map(|builtin| (builtin.name(), builtin))
    .collect()
});

impl Builtin {
    /// Looks up a builtin by name.
    pub fn lookup(name: &str) -> Option<Builtin> {
        BUILTINS.get(name).copied()
    }

    /// The name the builtin is called by.
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Abs => "abs",
            Builtin::All => "all",
            Builtin::Any => "any",
            Builtin::Bin => "bin",
            Builtin::Bool => "bool",
            Builtin::Chr => "chr",
            Builtin::Float => "float",
            Builtin::Format => "format",
            Builtin::Hex => "hex",
            Builtin::Int => "int",
            Builtin::Len => "len",
            Builtin::List => "list",
            Builtin::Max => "max",
            Builtin::Min => "min",
            Builtin::Oct => "oct",
            Builtin::Ord => "ord",
            Builtin::Pow => "pow",
            Builtin::Range => "range",
            Builtin::Repr => "repr",
            Builtin::Round => "round",
            Builtin::Sorted => "sorted",
            Builtin::Str => "str",
            Builtin::Sum => "sum",
        }
    }

    /// Parameter names and the number of required ones, for fixed-arity builtins.
    fn signature(self) -> (&'static [&'static str], usize) {
        match self {
            Builtin::Abs | Builtin::Repr | Builtin::Bin | Builtin::Hex | Builtin::Oct => {
                (&["x"], 1)
            }
            Builtin::All | Builtin::Any => (&["iterable"], 1),
            Builtin::Bool | Builtin::Float => (&["x"], 0),
            Builtin::Chr => (&["i"], 1),
            Builtin::Ord => (&["c"], 1),
            Builtin::Format => (&["value", "format_spec"], 1),
            Builtin::Int => (&["x", "base"], 0),
            Builtin::Len => (&["obj"], 1),
            Builtin::List => (&["iterable"], 0),
            Builtin::Pow => (&["base", "exp"], 2),
            Builtin::Range => (&["start", "stop", "step"], 1),
            Builtin::Round => (&["number", "ndigits"], 1),
            Builtin::Sorted => (&["iterable", "reverse"], 1),
            Builtin::Str => (&["object"], 0),
            Builtin::Sum => (&["iterable", "start"], 1),
            Builtin::Max | Builtin::Min => (&[], 0),
        }
    }
}

/// Matches positional and keyword arguments against a parameter list.
fn bind(
    func: &str,
    params: &[&str],
    required: usize,
    args: Vec<Value>,
    kwargs: Vec<(String, Value)>,
) -> Result<Vec<Option<Value>>, EvalError> {
    if args.len() > params.len() {
        return Err(EvalError::type_error(format!(
            "{}() takes at most {} argument{} ({} given)",
            func,
            params.len(),
            if params.len() == 1 { "" } else { "s" },
            args.len()
        )));
    }

    let mut bound: Vec<Option<Value>> = args.into_iter().map(Some).collect();
    bound.resize(params.len(), None);

    for (key, value) in kwargs {
        let Some(index) = params.iter().position(|p| *p == key) else {
            return Err(EvalError::type_error(format!(
                "'{}' is an invalid keyword argument for {}()",
                key, func
            )));
        };
        if bound[index].is_some() {
            return Err(EvalError::type_error(format!(
                "{}() got multiple values for argument '{}'",
                func, key
            )));
        }
        bound[index] = Some(value);
    }

    if let Some(missing) = bound.iter().take(required).position(Option::is_none) {
        return Err(EvalError::type_error(format!(
            "{}() missing required argument '{}' (pos {})",
            func,
            params[missing],
            missing + 1
        )));
    }
    Ok(bound)
}

fn take(bound: &mut [Option<Value>], index: usize) -> Option<Value> {
    bound.get_mut(index).and_then(Option::take)
}

fn expect_int(value: &Value) -> Result<i64, EvalError> {
    value.as_int().ok_or_else(|| {
        EvalError::type_error(format!(
            "'{}' object cannot be interpreted as an integer",
            value.type_name()
        ))
    })
}

fn expect_str<'v>(value: &'v Value, context: &str) -> Result<&'v str, EvalError> {
    match value {
        Value::Str(s) => Ok(s),
        other => Err(EvalError::type_error(format!(
            "{} must be str, not {}",
            context,
            other.type_name()
        ))),
    }
}

/// Calls a builtin function.
pub fn call(
    builtin: Builtin,
    args: Vec<Value>,
    kwargs: Vec<(String, Value)>,
) -> Result<Value, EvalError> {
    let name = builtin.name();
    if matches!(builtin, Builtin::Min | Builtin::Max) {
        return min_max(builtin, args, kwargs);
    }

    let (params, required) = builtin.signature();
    let mut bound = bind(name, params, required, args, kwargs)?;
    let first = take(&mut bound, 0);
    let second = take(&mut bound, 1);

    match builtin {
        Builtin::Str => Ok(Value::Str(first.map(|v| v.to_str()).unwrap_or_default())),
        Builtin::Repr => Ok(Value::Str(first.unwrap_or(Value::None).repr())),
        Builtin::Bool => Ok(Value::Bool(first.is_some_and(|v| v.is_truthy()))),
        Builtin::Int => to_int(first.unwrap_or(Value::Int(0)), second),
        Builtin::Float => to_float(first.unwrap_or(Value::Float(0.0))),
        Builtin::Len => len(&first.unwrap_or(Value::None)),
        Builtin::Abs => abs(&first.unwrap_or(Value::None)),
        Builtin::Round => round(&first.unwrap_or(Value::None), second),
        Builtin::Sum => sum(&first.unwrap_or(Value::None), second),
        Builtin::Range => {
            let third = take(&mut bound, 2);
            range(first, second, third)
        }
        Builtin::Sorted => {
            let reverse = second.is_some_and(|v| v.is_truthy());
            sorted(first.unwrap_or(Value::None).iter_values()?, reverse)
        }
        Builtin::Any => Ok(Value::Bool(
            first
                .unwrap_or(Value::None)
                .iter_values()?
                .iter()
                .any(Value::is_truthy),
        )),
        Builtin::All => Ok(Value::Bool(
            first
                .unwrap_or(Value::None)
                .iter_values()?
                .iter()
                .all(Value::is_truthy),
        )),
        Builtin::List => match first {
            Some(value) => Ok(Value::List(value.iter_values()?)),
            None => Ok(Value::List(Vec::new())),
        },
        Builtin::Format => {
            let value = first.unwrap_or(Value::None);
            let spec = match &second {
                Some(spec) => expect_str(spec, "format() argument 2")?,
                None => "",
            };
            format_value(&value, spec).map(Value::Str)
        }
        Builtin::Pow => ops::binary(
            BinaryOp::Pow,
            &first.unwrap_or(Value::None),
            &second.unwrap_or(Value::None),
        ),
        Builtin::Chr => {
            let code = expect_int(&first.unwrap_or(Value::None))?;
            u32::try_from(code)
                .ok()
                .and_then(char::from_u32)
                .map(|c| Value::Str(c.to_string()))
                .ok_or_else(|| EvalError::value_error("chr() arg not in range(0x110000)"))
        }
        Builtin::Ord => {
            let value = first.unwrap_or(Value::None);
            let s = expect_str(&value, "ord() argument")?;
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Value::Int(i64::from(u32::from(c)))),
                _ => Err(EvalError::type_error(format!(
                    "ord() expected a character, but string of length {} found",
                    s.chars().count()
                ))),
            }
        }
        Builtin::Bin | Builtin::Oct | Builtin::Hex => {
            let i = expect_int(&first.unwrap_or(Value::None))?;
            let magnitude = i.unsigned_abs();
            let digits = match builtin {
                Builtin::Bin => format!("0b{:b}", magnitude),
                Builtin::Oct => format!("0o{:o}", magnitude),
                _ => format!("0x{:x}", magnitude),
            };
            let sign = if i < 0 { "-" } else { "" };
            Ok(Value::Str(format!("{}{}", sign, digits)))
        }
        Builtin::Min | Builtin::Max => Err(EvalError::type_error(format!(
            "{}() expected at least 1 argument",
            name
        ))),
    }
}

fn to_int(value: Value, base: Option<Value>) -> Result<Value, EvalError> {
    if let Some(base) = base {
        let base = expect_int(&base)?;
        let Value::Str(text) = &value else {
            return Err(EvalError::type_error(
                "int() can't convert non-string with explicit base",
            ));
        };
        return parse_int(text, base).map(Value::Int);
    }

    match value {
        Value::Bool(b) => Ok(Value::Int(i64::from(b))),
        Value::Int(i) => Ok(Value::Int(i)),
        Value::Float(f) => float_to_int(f.trunc()).map(Value::Int),
        Value::Str(text) => parse_int(&text, 10).map(Value::Int),
        other => Err(EvalError::type_error(format!(
            "int() argument must be a string or a real number, not '{}'",
            other.type_name()
        ))),
    }
}

fn float_to_int(f: f64) -> Result<i64, EvalError> {
    if f.is_nan() {
        return Err(EvalError::value_error("cannot convert float NaN to integer"));
    }
    if f.is_infinite() {
        return Err(EvalError::runtime(
            RuntimeErrorKind::OverflowError,
            "cannot convert float infinity to integer",
        ));
    }
    // i64::MAX as f64 rounds up to 2^63, which is already out of range.
    if f >= i64::MAX as f64 || f < i64::MIN as f64 {
        return Err(EvalError::runtime(
            RuntimeErrorKind::OverflowError,
            "int too large to convert",
        ));
    }
    Ok(f as i64)
}

fn parse_int(text: &str, base: i64) -> Result<i64, EvalError> {
    let invalid = || {
        EvalError::value_error(format!(
            "invalid literal for int() with base {}: {}",
            base,
            repr_str(text)
        ))
    };
    if base != 0 && !(2..=36).contains(&base) {
        return Err(EvalError::value_error(
            "int() base must be >= 2 and <= 36, or 0",
        ));
    }

    let trimmed = text.trim();
    let (negative, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let lower = unsigned.to_ascii_lowercase();
    // A radix prefix may be followed by one underscore: 0x_ff.
    let prefixed = |prefix: &str, radix: i64| {
        lower
            .strip_prefix(prefix)
            .filter(|_| base == 0 || base == radix)
            .map(|rest| (rest.strip_prefix('_').unwrap_or(rest), radix))
    };
    let (digits, radix) = prefixed("0x", 16)
        .or_else(|| prefixed("0o", 8))
        .or_else(|| prefixed("0b", 2))
        .unwrap_or((lower.as_str(), if base == 0 { 10 } else { base }));

    if digits.is_empty() || digits.starts_with('_') || digits.ends_with('_') || digits.contains("__") {
        return Err(invalid());
    }
    let digits = digits.replace('_', "");
    let radix = u32::try_from(radix).map_err(|_| invalid())?;
    let magnitude = u64::from_str_radix(&digits, radix).map_err(|e| {
        if matches!(e.kind(), std::num::IntErrorKind::PosOverflow) {
            EvalError::runtime(RuntimeErrorKind::OverflowError, "int too large to convert")
        } else {
            invalid()
        }
    })?;

    let value = if negative {
        0i64.checked_sub_unsigned(magnitude)
    } else {
        i64::try_from(magnitude).ok()
    };
    value.ok_or_else(|| {
        EvalError::runtime(RuntimeErrorKind::OverflowError, "int too large to convert")
    })
}

fn to_float(value: Value) -> Result<Value, EvalError> {
    match value {
        Value::Str(text) => parse_float(&text).map(Value::Float),
        other => match other.as_num() {
            Some(num) => Ok(Value::Float(num.as_f64())),
            None => Err(EvalError::type_error(format!(
                "float() argument must be a string or a real number, not '{}'",
                other.type_name()
            ))),
        },
    }
}

fn parse_float(text: &str) -> Result<f64, EvalError> {
    let invalid = || {
        EvalError::value_error(format!(
            "could not convert string to float: {}",
            repr_str(text)
        ))
    };
    let trimmed = text.trim();
    if trimmed.is_empty()
        || trimmed.starts_with('_')
        || trimmed.ends_with('_')
        || trimmed.contains("__")
    {
        return Err(invalid());
    }
    let cleaned = trimmed.replace('_', "");
    let lowered = cleaned.to_ascii_lowercase();
    let unsigned = lowered.trim_start_matches(['+', '-']);
    match unsigned {
        "inf" | "infinity" | "nan" => {}
        _ if unsigned.chars().all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | '+' | '-')) => {}
        _ => return Err(invalid()),
    }
    cleaned.parse::<f64>().map_err(|_| invalid())
}

fn len(value: &Value) -> Result<Value, EvalError> {
    let n = match value {
        Value::Str(s) => s.chars().count(),
        Value::List(items) => items.len(),
        other => {
            return Err(EvalError::type_error(format!(
                "object of type '{}' has no len()",
                other.type_name()
            )))
        }
    };
    Ok(Value::Int(i64::try_from(n).unwrap_or(i64::MAX)))
}

fn abs(value: &Value) -> Result<Value, EvalError> {
    match value.as_num() {
        Some(Num::Int(i)) => i.checked_abs().map(Value::Int).ok_or_else(|| {
            EvalError::runtime(RuntimeErrorKind::OverflowError, "integer result too large")
        }),
        Some(Num::Float(f)) => Ok(Value::Float(f.abs())),
        None => Err(EvalError::type_error(format!(
            "bad operand type for abs(): '{}'",
            value.type_name()
        ))),
    }
}

fn round(value: &Value, ndigits: Option<Value>) -> Result<Value, EvalError> {
    let ndigits = match ndigits {
        None | Some(Value::None) => None,
        Some(n) => Some(expect_int(&n)?),
    };
    match (value.as_num(), ndigits) {
        (Some(Num::Int(i)), None) => Ok(Value::Int(i)),
        (Some(Num::Int(i)), Some(n)) if n >= 0 => Ok(Value::Int(i)),
        (Some(Num::Int(i)), Some(n)) => round_int(i, n).map(Value::Int),
        (Some(Num::Float(f)), None) => float_to_int(f.round_ties_even()).map(Value::Int),
        (Some(Num::Float(f)), Some(n)) if !f.is_finite() || n > MAX_ROUND_DIGITS => {
            Ok(Value::Float(f))
        }
        (Some(Num::Float(f)), Some(n)) if n >= 0 => {
            let places = usize::try_from(n).unwrap_or(0);
            let text = format!("{:.*}", places, f);
            Ok(Value::Float(text.parse().unwrap_or(f)))
        }
        (Some(Num::Float(f)), Some(n)) => round_float_tens(f, n).map(Value::Float),
        (None, _) => Err(EvalError::type_error(format!(
            "type {} doesn't define __round__ method",
            value.type_name()
        ))),
    }
}

/// Rounds an integer to a multiple of `10^-n`, ties to even.
fn round_int(i: i64, n: i64) -> Result<i64, EvalError> {
    // |i64| is below half of 10^20, so anything coarser rounds to zero.
    let Some(factor) = u32::try_from(-n).ok().filter(|e| *e < 20).map(|e| 10i128.pow(e)) else {
        return Ok(0);
    };
    let value = i128::from(i);
    let quotient = value.div_euclid(factor);
    let remainder = value.rem_euclid(factor);
    let up = match (2 * remainder).cmp(&factor) {
        Ordering::Greater => true,
        Ordering::Equal => quotient % 2 != 0,
        Ordering::Less => false,
    };
    let rounded = (quotient + i128::from(up)) * factor;
    i64::try_from(rounded).map_err(|_| {
        EvalError::runtime(RuntimeErrorKind::OverflowError, "integer result too large")
    })
}

/// Rounds a finite float to a multiple of `10^-n` for negative `n`, ties to
/// even on the exact decimal value.
fn round_float_tens(f: f64, n: i64) -> Result<f64, EvalError> {
    let places = usize::try_from(n.unsigned_abs()).unwrap_or(usize::MAX);
    let whole = f.abs().trunc();
    let has_fraction = whole != f.abs();
    let digits = format!("{:.0}", whole);
    if places > digits.len() {
        return Ok(0f64.copysign(f));
    }

    let (kept, dropped) = digits.split_at(digits.len() - places);
    let mut dropped_digits = dropped.bytes();
    let up = match dropped_digits.next() {
        Some(b'6'..=b'9') => true,
        Some(b'5') => {
            has_fraction
                || dropped_digits.any(|d| d != b'0')
                || kept.bytes().last().is_some_and(|d| (d - b'0') % 2 == 1)
        }
        _ => false,
    };

    let mut kept = kept.as_bytes().to_vec();
    if up {
        let mut carry = true;
        for digit in kept.iter_mut().rev() {
            if *digit == b'9' {
                *digit = b'0';
            } else {
                *digit += 1;
                carry = false;
                break;
            }
        }
        if carry {
            kept.insert(0, b'1');
        }
    }
    let mut text = String::from_utf8(kept).unwrap_or_default();
    if text.is_empty() {
        text.push('0');
    }
    text.push_str(&"0".repeat(places));

    let rounded: f64 = text.parse().unwrap_or(0.0);
    if rounded.is_infinite() {
        return Err(EvalError::runtime(
            RuntimeErrorKind::OverflowError,
            "rounded value too large to represent",
        ));
    }
    Ok(rounded.copysign(f))
}

fn sum(iterable: &Value, start: Option<Value>) -> Result<Value, EvalError> {
    let start = start.unwrap_or(Value::Int(0));
    if matches!(start, Value::Str(_)) {
        return Err(EvalError::type_error(
            "sum() can't sum strings [use ''.join(seq) instead]",
        ));
    }
    iterable
        .iter_values()?
        .iter()
        .try_fold(start, |total, item| ops::binary(BinaryOp::Add, &total, item))
}

fn range(
    first: Option<Value>,
    second: Option<Value>,
    third: Option<Value>,
) -> Result<Value, EvalError> {
    let first = expect_int(&first.unwrap_or(Value::Int(0)))?;
    let (start, stop) = match &second {
        Some(stop) => (first, expect_int(stop)?),
        None => (0, first),
    };
    let step = match &third {
        Some(step) => expect_int(step)?,
        None => 1,
    };
    if step == 0 {
        return Err(EvalError::value_error("range() arg 3 must not be zero"));
    }

    let span = i128::from(stop) - i128::from(start);
    let count = if (step > 0 && span > 0) || (step < 0 && span < 0) {
        let step = i128::from(step);
        (span + step - step.signum()) / step
    } else {
        0
    };
    if count > i128::from(MAX_RANGE_LEN) {
        return Err(EvalError::runtime(
            RuntimeErrorKind::OverflowError,
            "range() result is too large to build a list",
        ));
    }

    let mut items = Vec::new();
    let mut current = start;
    for _ in 0..count {
        items.push(Value::Int(current));
        current = current.saturating_add(step);
    }
    Ok(Value::List(items))
}

fn sorted(mut items: Vec<Value>, reverse: bool) -> Result<Value, EvalError> {
    let mut failure = None;
    items.sort_by(|a, b| {
        let ordering = match compare_values(a, b, "<") {
            Ok(ordering) => ordering.unwrap_or(Ordering::Equal),
            Err(error) => {
                failure.get_or_insert(error);
                Ordering::Equal
            }
        };
        if reverse {
            ordering.reverse()
        } else {
            ordering
        }
    });
    match failure {
        Some(error) => Err(error),
        None => Ok(Value::List(items)),
    }
}

fn min_max(
    builtin: Builtin,
    args: Vec<Value>,
    kwargs: Vec<(String, Value)>,
) -> Result<Value, EvalError> {
    let name = builtin.name();
    let mut default = None;
    for (key, value) in kwargs {
        if key != "default" {
            return Err(EvalError::type_error(format!(
                "'{}' is an invalid keyword argument for {}()",
                key, name
            )));
        }
        default = Some(value);
    }

    let candidates = match args.len() {
        0 => {
            return Err(EvalError::type_error(format!(
                "{} expected at least 1 argument, got 0",
                name
            )))
        }
        1 => args
            .into_iter()
            .next()
            .map(|value| value.iter_values())
            .transpose()?
            .unwrap_or_default(),
        _ if default.is_some() => {
            return Err(EvalError::type_error(format!(
                "Cannot specify a default for {}() with multiple positional arguments",
                name
            )))
        }
        _ => args,
    };

    let wanted = if builtin == Builtin::Min {
        Ordering::Less
    } else {
        Ordering::Greater
    };
    let mut best: Option<Value> = None;
    for candidate in candidates {
        best = Some(match best {
            None => candidate,
            Some(current) => {
                if compare_values(&candidate, &current, if wanted == Ordering::Less { "<" } else { ">" })?
                    == Some(wanted)
                {
                    candidate
                } else {
                    current
                }
            }
        });
    }

    best.or(default).ok_or_else(|| {
        EvalError::value_error(format!("{}() arg is an empty sequence", name))
    })
}

/// Calls a method on a `str` or `list` receiver.
pub fn call_method(
    receiver: &Value,
    method: &str,
    args: Vec<Value>,
    kwargs: Vec<(String, Value)>,
) -> Result<Value, EvalError> {
    match receiver {
        Value::Str(s) => str_method(s, method, args, kwargs),
        Value::List(items) => list_method(items, method, args, kwargs),
        other => Err(no_attribute(other, method)),
    }
}

/// The `AttributeError` for a missing attribute or method.
pub fn no_attribute(value: &Value, name: &str) -> EvalError {
    EvalError::runtime(
        RuntimeErrorKind::AttributeError,
        format!("'{}' object has no attribute '{}'", value.type_name(), name),
    )
}

fn str_method(
    s: &str,
    method: &str,
    args: Vec<Value>,
    kwargs: Vec<(String, Value)>,
) -> Result<Value, EvalError> {
    let (params, required): (&[&str], usize) = match method {
        "upper" | "lower" | "title" | "capitalize" | "swapcase" | "isdigit" | "isalpha"
        | "isalnum" | "isspace" | "isupper" | "islower" => (&[], 0),
        "strip" | "lstrip" | "rstrip" => (&["chars"], 0),
        "replace" => (&["old", "new", "count"], 2),
        "split" | "rsplit" => (&["sep", "maxsplit"], 0),
        "startswith" | "endswith" => (&["prefix"], 1),
        "removeprefix" => (&["prefix"], 1),
        "removesuffix" => (&["suffix"], 1),
        "join" => (&["iterable"], 1),
        "zfill" => (&["width"], 1),
        "count" | "find" | "index" => (&["sub"], 1),
        "ljust" | "rjust" | "center" => (&["width", "fillchar"], 1),
        _ => return Err(no_attribute(&Value::Str(String::new()), method)),
    };
    let qualified = format!("str.{}", method);
    let mut bound = bind(&qualified, params, required, args, kwargs)?;
    let first = take(&mut bound, 0);
    let second = take(&mut bound, 1);
    let third = take(&mut bound, 2);
    let string = |value: &Option<Value>, what: &str| -> Result<String, EvalError> {
        match value {
            Some(v) => expect_str(v, what).map(str::to_string),
            None => Ok(String::new()),
        }
    };
    let text = |value: String| -> Result<Value, EvalError> { Ok(Value::Str(value)) };

    match method {
        "upper" => text(s.to_uppercase()),
        "lower" => text(s.to_lowercase()),
        "swapcase" => text(
            s.chars()
                .flat_map(|c| {
                    if c.is_uppercase() {
                        c.to_lowercase().collect::<Vec<_>>()
                    } else {
                        c.to_uppercase().collect::<Vec<_>>()
                    }
                })
                .collect(),
        ),
        "title" => text(title_case(s)),
        "capitalize" => {
            let mut chars = s.chars();
            text(match chars.next() {
                Some(c) => c.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect(),
                None => String::new(),
            })
        }
        "isdigit" => Ok(Value::Bool(!s.is_empty() && s.chars().all(|c| c.is_ascii_digit()))),
        "isalpha" => Ok(Value::Bool(!s.is_empty() && s.chars().all(char::is_alphabetic))),
        "isalnum" => Ok(Value::Bool(!s.is_empty() && s.chars().all(char::is_alphanumeric))),
        "isspace" => Ok(Value::Bool(!s.is_empty() && s.chars().all(char::is_whitespace))),
        "isupper" => Ok(Value::Bool(
            s.chars().any(char::is_uppercase) && !s.chars().any(char::is_lowercase),
        )),
        "islower" => Ok(Value::Bool(
            s.chars().any(char::is_lowercase) && !s.chars().any(char::is_uppercase),
        )),
        "strip" | "lstrip" | "rstrip" => {
            let chars = match &first {
                None | Some(Value::None) => None,
                Some(v) => Some(expect_str(v, "strip arg")?.to_string()),
            };
            let matcher = |c: char| match &chars {
                Some(set) => set.contains(c),
                None => c.is_whitespace(),
            };
            text(match method {
                "strip" => s.trim_matches(matcher),
                "lstrip" => s.trim_start_matches(matcher),
                _ => s.trim_end_matches(matcher),
            }
            .to_string())
        }
        "replace" => {
            let old = string(&first, "replace() argument 1")?;
            let new = string(&second, "replace() argument 2")?;
            let count = match &third {
                Some(v) => expect_int(v)?,
                None => -1,
            };
            let found = if old.is_empty() {
                s.chars().count() + 1
            } else {
                s.matches(old.as_str()).count()
            };
            let replaced = usize::try_from(count).map_or(found, |n| n.min(found));
            check_output_len(
                replaced.saturating_mul(new.len()).saturating_add(s.len()),
                "replaced string",
            )?;
            text(match usize::try_from(count) {
                Ok(n) => s.replacen(&old, &new, n),
                Err(_) => s.replace(&old, &new),
            })
        }
        "split" | "rsplit" => {
            let maxsplit = match &second {
                Some(v) => expect_int(v)?,
                None => -1,
            };
            let parts = match &first {
                None | Some(Value::None) => split_whitespace(s, maxsplit, method == "rsplit"),
                Some(v) => {
                    let sep = expect_str(v, "separator")?;
                    if sep.is_empty() {
                        return Err(EvalError::value_error("empty separator"));
                    }
                    match (usize::try_from(maxsplit), method) {
                        (Err(_), _) => s.split(sep).map(str::to_string).collect(),
                        (Ok(n), "split") => s.splitn(n + 1, sep).map(str::to_string).collect(),
                        (Ok(n), _) => {
                            let mut parts: Vec<String> =
                                s.rsplitn(n + 1, sep).map(str::to_string).collect();
                            parts.reverse();
                            parts
                        }
                    }
                }
            };
            Ok(Value::List(parts.into_iter().map(Value::Str).collect()))
        }
        "startswith" => {
            let prefix = string(&first, "startswith first arg")?;
            Ok(Value::Bool(s.starts_with(prefix.as_str())))
        }
        "endswith" => {
            let suffix = string(&first, "endswith first arg")?;
            Ok(Value::Bool(s.ends_with(suffix.as_str())))
        }
        "removeprefix" => {
            let prefix = string(&first, "removeprefix() argument")?;
            text(s.strip_prefix(prefix.as_str()).unwrap_or(s).to_string())
        }
        "removesuffix" => {
            let suffix = string(&first, "removesuffix() argument")?;
            text(s.strip_suffix(suffix.as_str()).unwrap_or(s).to_string())
        }
        "join" => {
            let items = first.unwrap_or(Value::None).iter_values()?;
            let mut pieces = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                match item {
                    Value::Str(piece) => pieces.push(piece.as_str()),
                    other => {
                        return Err(EvalError::type_error(format!(
                            "sequence item {}: expected str instance, {} found",
                            i,
                            other.type_name()
                        )))
                    }
                }
            }
            let total = pieces.iter().fold(
                s.len().saturating_mul(pieces.len().saturating_sub(1)),
                |total, piece| total.saturating_add(piece.len()),
            );
            check_output_len(total, "joined string")?;
            text(pieces.join(s))
        }
        "zfill" => {
            let width = usize::try_from(expect_int(&first.unwrap_or(Value::None))?).unwrap_or(0);
            let len = s.chars().count();
            if len >= width {
                return text(s.to_string());
            }
            check_output_len(width, "padded string")?;
            let zeros = "0".repeat(width - len);
            text(match s.chars().next() {
                Some(sign @ ('+' | '-')) => format!("{}{}{}", sign, zeros, &s[1..]),
                _ => format!("{}{}", zeros, s),
            })
        }
        "count" => {
            let sub = string(&first, "substring")?;
            let n = s.matches(sub.as_str()).count();
            Ok(Value::Int(i64::try_from(n).unwrap_or(i64::MAX)))
        }
        "find" | "index" => {
            let sub = string(&first, "substring")?;
            match s.find(sub.as_str()) {
                Some(byte) => Ok(Value::Int(
                    i64::try_from(s[..byte].chars().count()).unwrap_or(i64::MAX),
                )),
                None if method == "find" => Ok(Value::Int(-1)),
                None => Err(EvalError::value_error("substring not found")),
            }
        }
        "ljust" | "rjust" | "center" => {
            let width = usize::try_from(expect_int(&first.unwrap_or(Value::None))?).unwrap_or(0);
            let fill = match &second {
                Some(v) => {
                    let f = expect_str(v, "The fill character")?;
                    let mut chars = f.chars();
                    match (chars.next(), chars.next()) {
                        (Some(c), None) => c,
                        _ => {
                            return Err(EvalError::type_error(
                                "The fill character must be exactly one character long",
                            ))
                        }
                    }
                }
                None => ' ',
            };
            let len = s.chars().count();
            if len >= width {
                return text(s.to_string());
            }
            check_output_len(width, "padded string")?;
            let margin = width - len;
            let (left, right) = match method {
                "ljust" => (0, margin),
                "rjust" => (margin, 0),
                _ => {
                    let left = margin / 2 + (margin & width & 1);
                    (left, margin - left)
                }
            };
            let pad = |n: usize| fill.to_string().repeat(n);
            text(format!("{}{}{}", pad(left), s, pad(right)))
        }
        _ => Err(no_attribute(&Value::Str(String::new()), method)),
    }
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut previous_cased = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if previous_cased {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            previous_cased = true;
        } else {
            out.push(c);
            previous_cased = false;
        }
    }
    out
}

fn split_whitespace(s: &str, maxsplit: i64, from_right: bool) -> Vec<String> {
    let Ok(limit) = usize::try_from(maxsplit) else {
        return s.split_whitespace().map(str::to_string).collect();
    };

    let mut parts = Vec::new();
    if from_right {
        let mut rest = s.trim_end();
        while !rest.is_empty() && parts.len() < limit {
            match rest.rfind(char::is_whitespace) {
                Some(idx) => {
                    let word_start = idx + rest[idx..].chars().next().map_or(1, char::len_utf8);
                    parts.push(rest[word_start..].to_string());
                    rest = rest[..idx].trim_end();
                }
                None => {
                    parts.push(rest.to_string());
                    rest = "";
                }
            }
        }
        if !rest.is_empty() {
            parts.push(rest.to_string());
        }
        parts.reverse();
    } else {
        let mut rest = s.trim_start();
        while !rest.is_empty() && parts.len() < limit {
            match rest.find(char::is_whitespace) {
                Some(idx) => {
                    parts.push(rest[..idx].to_string());
                    rest = rest[idx..].trim_start();
                }
                None => {
                    parts.push(rest.to_string());
                    rest = "";
                }
            }
        }
        if !rest.is_empty() {
            parts.push(rest.to_string());
        }
    }
    parts
}

fn list_method(
    items: &[Value],
    method: &str,
    args: Vec<Value>,
    kwargs: Vec<(String, Value)>,
) -> Result<Value, EvalError> {
    match method {
        "count" | "index" => {
            let qualified = format!("list.{}", method);
            let mut bound = bind(&qualified, &["value"], 1, args, kwargs)?;
            let needle = take(&mut bound, 0).unwrap_or(Value::None);
            if method == "count" {
                let n = items.iter().filter(|item| values_equal(item, &needle)).count();
                return Ok(Value::Int(i64::try_from(n).unwrap_or(i64::MAX)));
            }
            items
                .iter()
                .position(|item| values_equal(item, &needle))
                .map(|i| Value::Int(i64::try_from(i).unwrap_or(i64::MAX)))
                .ok_or_else(|| {
                    EvalError::value_error(format!("{} is not in list", needle.repr()))
                })
        }
        _ => Err(no_attribute(&Value::List(Vec::new()), method)),
    }
}
