// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runtime values of the expression language.

use std::cmp::Ordering;

use super::builtins::Builtin;
use crate::domain::EvalError;

/// A value produced while evaluating an expression.
///
/// Names bound in the scope always evaluate to [`Value::Str`]; other variants come
/// from literals, operators and builtins.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// `None`
    None,
    /// `True` / `False`
    Bool(bool),
    /// A 64-bit integer
    Int(i64),
    /// A double precision float
    Float(f64),
    /// A string
    Str(String),
    /// A list
    List(Vec<Value>),
    /// A builtin function
    Builtin(Builtin),
}

/// A value viewed as a number. Booleans count as integers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Num {
    /// Integer operand
    Int(i64),
    /// Float operand
    Float(f64),
}

impl Num {
    /// The operand as a float.
    pub fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }
}

impl Value {
    /// The type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Builtin(_) => "builtin_function_or_method",
        }
    }

    /// Numeric view of the value, if it has one.
    pub fn as_num(&self) -> Option<Num> {
        match self {
            Value::Bool(b) => Some(Num::Int(i64::from(*b))),
            Value::Int(i) => Some(Num::Int(*i)),
            Value::Float(f) => Some(Num::Float(*f)),
            _ => None,
        }
    }

    /// Integer view of the value (`bool` included), if it has one.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Bool(b) => Some(i64::from(*b)),
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Truth value.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Builtin(_) => true,
        }
    }

    /// The `str()` rendering.
    pub fn to_str(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            other => other.repr(),
        }
    }

    /// The `repr()` rendering.
    pub fn repr(&self) -> String {
        match self {
            Value::None => "None".to_string(),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => float_repr(*f),
            Value::Str(s) => repr_str(s),
            Value::List(items) => {
                let inner: Vec<String> = items.iter().map(Value::repr).collect();
                format!("[{}]", inner.join(", "))
            }
            Value::Builtin(b) => format!("<built-in function {}>", b.name()),
        }
    }

    /// The `ascii()` rendering: `repr()` with non-ASCII characters escaped.
    pub fn ascii(&self) -> String {
        let mut out = String::new();
        for c in self.repr().chars() {
            let code = c as u32;
            if c.is_ascii() {
                out.push(c);
            } else if code <= 0xff {
                out.push_str(&format!("\\x{:02x}", code));
            } else if code <= 0xffff {
                out.push_str(&format!("\\u{:04x}", code));
            } else {
                out.push_str(&format!("\\U{:08x}", code));
            }
        }
        out
    }

    /// The items of an iterable value. Strings iterate over their characters.
    pub fn iter_values(&self) -> Result<Vec<Value>, EvalError> {
        match self {
            Value::Str(s) => Ok(s.chars().map(|c| Value::Str(c.to_string())).collect()),
            Value::List(items) => Ok(items.clone()),
            other => Err(EvalError::type_error(format!(
                "'{}' object is not iterable",
                other.type_name()
            ))),
        }
    }
}

/// Equality across types: numbers compare by value, everything else only with
/// its own kind.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    if let (Some(x), Some(y)) = (a.as_num(), b.as_num()) {
        return match (x, y) {
            (Num::Int(x), Num::Int(y)) => x == y,
            _ => x.as_f64() == y.as_f64(),
        };
    }
    match (a, b) {
        (Value::None, Value::None) => true,
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::List(x), Value::List(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| values_equal(l, r))
        }
        (Value::Builtin(x), Value::Builtin(y)) => x == y,
        _ => false,
    }
}

/// Ordering for `<`-style comparisons.
///
/// Returns `Ok(None)` for unordered floats (NaN), and a `TypeError` when the two
/// kinds cannot be ordered. `op` is the operator used in the error message.
pub fn compare_values(a: &Value, b: &Value, op: &str) -> Result<Option<Ordering>, EvalError> {
    if let (Some(x), Some(y)) = (a.as_num(), b.as_num()) {
        return Ok(match (x, y) {
            (Num::Int(x), Num::Int(y)) => Some(x.cmp(&y)),
            _ => x.as_f64().partial_cmp(&y.as_f64()),
        });
    }
    match (a, b) {
        (Value::Str(x), Value::Str(y)) => Ok(Some(x.cmp(y))),
        (Value::List(x), Value::List(y)) => {
            for (l, r) in x.iter().zip(y) {
                if !values_equal(l, r) {
                    return compare_values(l, r, op);
                }
            }
            Ok(Some(x.len().cmp(&y.len())))
        }
        _ => Err(EvalError::type_error(format!(
            "'{}' not supported between instances of '{}' and '{}'",
            op,
            a.type_name(),
            b.type_name()
        ))),
    }
}

/// Shortest round-trip rendering of a float, the way `repr()` prints it.
///
/// Integral values keep a `.0`, and magnitudes below `1e-4` or from `1e16` up use
/// exponent notation with a signed, two-digit exponent.
pub fn float_repr(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let magnitude = f.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let shortest = format!("{:e}", f);
        return python_exponent(&shortest);
    }

    let mut s = format!("{}", f);
    if !s.contains('.') {
        s.push_str(".0");
    }
    s
}

/// Rewrites a Rust exponent (`1.5e-5`) into the `1.5e-05` form.
pub fn python_exponent(rust: &str) -> String {
    match rust.split_once(['e', 'E']) {
        Some((mantissa, exponent)) => {
            let exp: i32 = exponent.parse().unwrap_or(0);
            let marker = if rust.contains('E') { 'E' } else { 'e' };
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{}{}{}{:02}", mantissa, marker, sign, exp.abs())
        }
        None => rust.to_string(),
    }
}

/// Quotes a string the way `repr()` does.
pub fn repr_str(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => {
                let code = c as u32;
                if code <= 0xff {
                    out.push_str(&format!("\\x{:02x}", code));
                } else {
                    out.push_str(&format!("\\u{:04x}", code));
                }
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_repr() {
        assert_eq!(float_repr(9.0), "9.0");
        assert_eq!(float_repr(-0.0), "-0.0");
        assert_eq!(float_repr(3.14), "3.14");
        assert_eq!(float_repr(2.141592653589793), "2.141592653589793");
        assert_eq!(float_repr(1e16), "1e+16");
        assert_eq!(float_repr(1e15), "1000000000000000.0");
        assert_eq!(float_repr(0.0001), "0.0001");
        assert_eq!(float_repr(0.000015), "1.5e-05");
        assert_eq!(float_repr(f64::INFINITY), "inf");
        assert_eq!(float_repr(f64::NEG_INFINITY), "-inf");
        assert_eq!(float_repr(f64::NAN), "nan");
    }

    #[test]
    fn test_repr_str_quoting() {
        assert_eq!(repr_str("77.1230"), "'77.1230'");
        assert_eq!(repr_str("it's"), "\"it's\"");
        assert_eq!(repr_str("both ' and \""), "'both \\' and \"'");
        assert_eq!(repr_str("a\\b\n"), "'a\\\\b\\n'");
        assert_eq!(repr_str("\u{1}"), "'\\x01'");
    }

    #[test]
    fn test_str_and_repr() {
        assert_eq!(Value::Str("x".to_string()).to_str(), "x");
        assert_eq!(Value::Str("x".to_string()).repr(), "'x'");
        assert_eq!(Value::Bool(true).to_str(), "True");
        assert_eq!(Value::None.to_str(), "None");
        let list = Value::List(vec![Value::Int(1), Value::Str("a".to_string())]);
        assert_eq!(list.to_str(), "[1, 'a']");
    }

    #[test]
    fn test_ascii() {
        assert_eq!(Value::Str("café".to_string()).ascii(), "'caf\\xe9'");
        assert_eq!(Value::Str("€".to_string()).ascii(), "'\\u20ac'");
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Str(String::new()).is_truthy());
        assert!(Value::Str("0".to_string()).is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::Float(0.0).is_truthy());
        assert!(!Value::List(vec![]).is_truthy());
        assert!(!Value::None.is_truthy());
    }

    #[test]
    fn test_equality_across_numbers() {
        assert!(values_equal(&Value::Int(1), &Value::Float(1.0)));
        assert!(values_equal(&Value::Bool(true), &Value::Int(1)));
        assert!(!values_equal(&Value::Int(1), &Value::Str("1".to_string())));
    }

    #[test]
    fn test_compare() {
        let ord = compare_values(&Value::Int(1), &Value::Float(1.5), "<").unwrap();
        assert_eq!(ord, Some(Ordering::Less));
        let ord = compare_values(
            &Value::Str("abc".to_string()),
            &Value::Str("abd".to_string()),
            "<",
        )
        .unwrap();
        assert_eq!(ord, Some(Ordering::Less));
        assert_eq!(
            compare_values(&Value::Float(f64::NAN), &Value::Int(1), "<").unwrap(),
            None
        );
    }

    #[test]
    fn test_compare_incompatible() {
        let err = compare_values(&Value::Str("a".to_string()), &Value::Int(1), ">").unwrap_err();
        assert_eq!(
            err.to_string(),
            "TypeError: '>' not supported between instances of 'str' and 'int'"
        );
    }

    #[test]
    fn test_iter_values() {
        let items = Value::Str("ab".to_string()).iter_values().unwrap();
        assert_eq!(
            items,
            vec![Value::Str("a".to_string()), Value::Str("b".to_string())]
        );
        assert!(Value::Int(3).iter_values().is_err());
    }
}
