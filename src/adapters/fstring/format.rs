// SPDX-License-Identifier: MIT OR Apache-2.0

//! The format-spec mini-language used after `:` in a replacement field.
//!
//! ```text
//! [[fill]align][sign]["z"]["#"]["0"][width][grouping]["." precision][type]
//! ```

use super::ops::check_output_len;
use super::value::{float_repr, python_exponent, Value};
use crate::domain::{EvalError, RuntimeErrorKind};

/// Digits past which a double's exact decimal expansion is all zeros.
const EXACT_FRACTION_DIGITS: usize = 1100;

/// Formats a value according to a format spec.
///
/// An empty spec yields the `str()` rendering for every type.
pub fn format_value(value: &Value, spec: &str) -> Result<String, EvalError> {
    if spec.is_empty() {
        return Ok(value.to_str());
    }
    let parsed = FormatSpec::parse(spec, value)?;
    match value {
        Value::Str(s) => format_str(s, &parsed),
        Value::Bool(b) => format_int(i64::from(*b), &parsed),
        Value::Int(i) => format_int(*i, &parsed),
        Value::Float(f) => format_float(*f, &parsed),
        other => Err(EvalError::type_error(format!(
            "unsupported format string passed to {}.__format__",
            other.type_name()
        ))),
    }
}

#[derive(Debug)]
struct FormatSpec {
    fill: char,
    align: Option<char>,
    sign: char,
    coerce_zero: bool,
    alternate: bool,
    zero_pad: bool,
    width: usize,
    grouping: Option<char>,
    precision: Option<usize>,
    kind: Option<char>,
}

impl FormatSpec {
    fn parse(spec: &str, value: &Value) -> Result<Self, EvalError> {
        let chars: Vec<char> = spec.chars().collect();
        let mut i = 0;
        let mut parsed = FormatSpec {
            fill: ' ',
            align: None,
            sign: '-',
            coerce_zero: false,
            alternate: false,
            zero_pad: false,
            width: 0,
            grouping: None,
            precision: None,
            kind: None,
        };

        let is_align = |c: char| matches!(c, '<' | '>' | '=' | '^');
        let mut explicit_fill = false;
        if chars.len() >= 2 && is_align(chars[1]) {
            explicit_fill = true;
            parsed.fill = chars[0];
            parsed.align = Some(chars[1]);
            i = 2;
        } else if is_align(chars[0]) {
            parsed.align = Some(chars[0]);
            i = 1;
        }

        if let Some(&c @ ('+' | '-' | ' ')) = chars.get(i) {
            parsed.sign = c;
            i += 1;
        }
        if chars.get(i) == Some(&'z') {
            parsed.coerce_zero = true;
            i += 1;
        }
        if chars.get(i) == Some(&'#') {
            parsed.alternate = true;
            i += 1;
        }
        if chars.get(i) == Some(&'0') {
            parsed.zero_pad = true;
            i += 1;
        }

        let width_start = i;
        while chars.get(i).is_some_and(char::is_ascii_digit) {
            i += 1;
        }
        parsed.width = digits(&chars[width_start..i])?;

        if let Some(&c @ (',' | '_')) = chars.get(i) {
            parsed.grouping = Some(c);
            i += 1;
        }

        if chars.get(i) == Some(&'.') {
            i += 1;
            let precision_start = i;
            while chars.get(i).is_some_and(char::is_ascii_digit) {
                i += 1;
            }
            if i == precision_start {
                return Err(EvalError::value_error("Format specifier missing precision"));
            }
            parsed.precision = Some(digits(&chars[precision_start..i])?);
        }

        if i + 1 == chars.len() {
            parsed.kind = Some(chars[i]);
            i += 1;
        }
        if i != chars.len() {
            return Err(EvalError::value_error(format!(
                "Invalid format specifier '{}' for object of type '{}'",
                spec,
                value.type_name()
            )));
        }

        check_output_len(parsed.width, "format width")?;
        if let Some(precision) = parsed.precision {
            check_output_len(precision, "format precision")?;
        }

        if parsed.zero_pad && !explicit_fill {
            parsed.fill = '0';
        }
        Ok(parsed)
    }

    fn unknown_code(&self, type_name: &str) -> EvalError {
        EvalError::value_error(format!(
            "Unknown format code '{}' for object of type '{}'",
            self.kind.unwrap_or(' '),
            type_name
        ))
    }
}

fn digits(chars: &[char]) -> Result<usize, EvalError> {
    if chars.is_empty() {
        return Ok(0);
    }
    chars
        .iter()
        .collect::<String>()
        .parse()
        .map_err(|_| EvalError::value_error("Too many decimal digits in format string"))
}

/// Pads `body` to the spec's width with the given alignment.
fn pad(body: &str, spec: &FormatSpec, align: char) -> String {
    let len = body.chars().count();
    if len >= spec.width {
        return body.to_string();
    }
    let missing = spec.width - len;
    let fill = |n: usize| spec.fill.to_string().repeat(n);
    match align {
        '<' => format!("{}{}", body, fill(missing)),
        '^' => {
            let left = missing / 2;
            format!("{}{}{}", fill(left), body, fill(missing - left))
        }
        _ => format!("{}{}", fill(missing), body),
    }
}

fn format_str(s: &str, spec: &FormatSpec) -> Result<String, EvalError> {
    if !matches!(spec.kind, None | Some('s')) {
        return Err(spec.unknown_code("str"));
    }
    if spec.sign != '-' {
        return Err(EvalError::value_error(
            "Sign not allowed in string format specifier",
        ));
    }
    if spec.alternate {
        return Err(EvalError::value_error(
            "Alternate form (#) not allowed in string format specifier",
        ));
    }
    if spec.align == Some('=') {
        return Err(EvalError::value_error(
            "'=' alignment not allowed in string format specifier",
        ));
    }
    if let Some(g) = spec.grouping {
        return Err(EvalError::value_error(format!("Cannot specify '{}' with 's'.", g)));
    }

    let truncated: String = match spec.precision {
        Some(p) => s.chars().take(p).collect(),
        None => s.to_string(),
    };
    Ok(pad(&truncated, spec, spec.align.unwrap_or('<')))
}

fn format_int(i: i64, spec: &FormatSpec) -> Result<String, EvalError> {
    let kind = spec.kind.unwrap_or('d');
    if matches!(kind, 'e' | 'E' | 'f' | 'F' | 'g' | 'G' | '%') {
        return format_float(i as f64, spec);
    }
    if spec.precision.is_some() {
        return Err(EvalError::value_error(
            "Precision not allowed in integer format specifier",
        ));
    }

    if kind == 'c' {
        if spec.sign != '-' {
            return Err(EvalError::value_error(
                "Sign not allowed with integer format specifier 'c'",
            ));
        }
        let c = u32::try_from(i)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| {
                EvalError::runtime(
                    RuntimeErrorKind::OverflowError,
                    "%c arg not in range(0x110000)",
                )
            })?;
        return Ok(pad(&c.to_string(), spec, spec.align.unwrap_or('>')));
    }

    let magnitude = i.unsigned_abs();
    let (digits, prefix, group_size) = match kind {
        'd' | 'n' => (magnitude.to_string(), "", 3),
        'b' => (format!("{:b}", magnitude), "0b", 4),
        'o' => (format!("{:o}", magnitude), "0o", 4),
        'x' => (format!("{:x}", magnitude), "0x", 4),
        'X' => (format!("{:X}", magnitude), "0X", 4),
        _ => return Err(spec.unknown_code("int")),
    };
    if spec.grouping == Some(',') && group_size == 4 {
        return Err(EvalError::value_error(format!(
            "Cannot specify ',' with '{}'.",
            kind
        )));
    }
    let prefix = if spec.alternate { prefix } else { "" };

    Ok(finish_number(
        i < 0,
        prefix,
        &digits,
        "",
        group_size,
        spec,
    ))
}

fn format_float(f: f64, spec: &FormatSpec) -> Result<String, EvalError> {
    let kind = spec.kind;
    let upper = matches!(kind, Some('E' | 'F' | 'G'));
    let magnitude = f.abs();

    let body = if !f.is_finite() {
        let text = if f.is_nan() { "nan" } else { "inf" };
        let text = if upper {
            text.to_uppercase()
        } else {
            text.to_string()
        };
        if kind == Some('%') {
            format!("{}%", text)
        } else {
            text
        }
    } else {
        match kind {
            None => match spec.precision {
                None => float_repr(magnitude),
                Some(p) => general(magnitude, p, spec.alternate, true),
            },
            Some('e' | 'E') => {
                let p = spec.precision.unwrap_or(6);
                let mut text = python_exponent(&scientific(magnitude, p));
                if spec.alternate && p == 0 {
                    text = text.replacen('e', ".e", 1);
                }
                if upper {
                    text = text.to_uppercase();
                }
                text
            }
            Some('f' | 'F') => {
                let p = spec.precision.unwrap_or(6);
                let mut text = fixed(magnitude, p);
                if spec.alternate && p == 0 {
                    text.push('.');
                }
                text
            }
            Some('g' | 'G' | 'n') => {
                let text = general(magnitude, spec.precision.unwrap_or(6), spec.alternate, false);
                if upper {
                    text.to_uppercase()
                } else {
                    text
                }
            }
            Some('%') => {
                let p = spec.precision.unwrap_or(6);
                format!("{}%", fixed(magnitude * 100.0, p))
            }
            Some(_) => return Err(spec.unknown_code("float")),
        }
    };

    let mut negative = f.is_sign_negative() && !f.is_nan();
    if negative && spec.coerce_zero && body.chars().all(|c| !c.is_ascii_digit() || c == '0') {
        negative = false;
    }

    let split = body
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(body.len());
    let (int_part, rest) = body.split_at(split);
    Ok(finish_number(negative, "", int_part, rest, 3, spec))
}

/// General format: fixed point for moderate exponents, scientific otherwise.
///
/// `repr_style` is the no-type-with-precision variant: it keeps at least one
/// digit after the point and switches to scientific one exponent earlier.
fn general(magnitude: f64, precision: usize, alternate: bool, repr_style: bool) -> String {
    let p = precision.max(1);
    let sci = scientific(magnitude, p - 1);
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i32 = exponent.parse().unwrap_or(0);
    let threshold = if repr_style { p as i32 - 1 } else { p as i32 };
    let strip = !alternate;

    if (-4..threshold).contains(&exp) {
        let decimals = usize::try_from(p as i32 - 1 - exp).unwrap_or(0);
        let mut text = fixed(magnitude, decimals);
        if strip {
            text = strip_zeros(&text);
        }
        if repr_style && !text.contains('.') {
            text.push_str(".0");
        }
        text
    } else {
        let mut mantissa = mantissa.to_string();
        if strip {
            mantissa = strip_zeros(&mantissa);
        }
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exp.abs())
    }
}

/// Fixed-point rendering with `precision` fraction digits.
///
/// The standard formatter caps precision, so digits past the exact expansion
/// are appended as zeros.
fn fixed(magnitude: f64, precision: usize) -> String {
    if precision <= EXACT_FRACTION_DIGITS {
        return format!("{:.*}", precision, magnitude);
    }
    let mut text = format!("{:.*}", EXACT_FRACTION_DIGITS, magnitude);
    text.push_str(&"0".repeat(precision - EXACT_FRACTION_DIGITS));
    text
}

/// Scientific rendering in the standard formatter's style (`1.5e3`) with
/// `precision` mantissa digits after the point.
fn scientific(magnitude: f64, precision: usize) -> String {
    if precision <= EXACT_FRACTION_DIGITS {
        return format!("{:.*e}", precision, magnitude);
    }
    let text = format!("{:.*e}", EXACT_FRACTION_DIGITS, magnitude);
    let (mantissa, exponent) = text.split_once('e').unwrap_or((text.as_str(), "0"));
    format!(
        "{}{}e{}",
        mantissa,
        "0".repeat(precision - EXACT_FRACTION_DIGITS),
        exponent
    )
}

fn strip_zeros(text: &str) -> String {
    if !text.contains('.') {
        return text.to_string();
    }
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn group(digits: &str, separator: char, size: usize) -> String {
    let chars: Vec<char> = digits.chars().collect();
    let mut out = String::with_capacity(chars.len() + chars.len() / size);
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % size == 0 {
            out.push(separator);
        }
        out.push(*c);
    }
    out
}

/// Assembles sign, prefix, grouped integer digits and the remainder, then pads.
fn finish_number(
    negative: bool,
    prefix: &str,
    int_part: &str,
    rest: &str,
    group_size: usize,
    spec: &FormatSpec,
) -> String {
    let sign = match (negative, spec.sign) {
        (true, _) => "-",
        (false, '+') => "+",
        (false, ' ') => " ",
        _ => "",
    };
    let head = format!("{}{}", sign, prefix);
    let align = spec.align.unwrap_or(if spec.zero_pad { '=' } else { '>' });

    let mut digits = int_part.to_string();
    let grouped = |digits: &str| match spec.grouping {
        Some(separator) if !digits.is_empty() => group(digits, separator, group_size),
        _ => digits.to_string(),
    };

    if align == '=' && spec.fill == '0' && spec.grouping.is_some() && !digits.is_empty() {
        // Zero padding takes part in grouping: 00,001,234
        let available = spec.width.saturating_sub(head.chars().count() + rest.chars().count());
        let mut count = digits.chars().count();
        while count + (count - 1) / group_size < available {
            count += 1;
        }
        digits.insert_str(0, &"0".repeat(count - digits.chars().count()));
        return format!("{}{}{}", head, grouped(&digits), rest);
    }

    let number = format!("{}{}", grouped(&digits), rest);
    if align == '=' {
        let padded = pad(&number, &shrunk(spec, head.chars().count()), '>');
        format!("{}{}", head, padded)
    } else {
        pad(&format!("{}{}", head, number), spec, align)
    }
}

fn shrunk(spec: &FormatSpec, by: usize) -> FormatSpec {
    FormatSpec {
        width: spec.width.saturating_sub(by),
        fill: spec.fill,
        align: spec.align,
        sign: spec.sign,
        coerce_zero: spec.coerce_zero,
        alternate: spec.alternate,
        zero_pad: spec.zero_pad,
        grouping: spec.grouping,
        precision: spec.precision,
        kind: spec.kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(value: Value, spec: &str) -> String {
        format_value(&value, spec).unwrap()
    }

    fn s(text: &str) -> Value {
        Value::Str(text.to_string())
    }

    #[test]
    fn test_empty_spec_is_str() {
        assert_eq!(fmt(Value::Float(9.0), ""), "9.0");
        assert_eq!(fmt(Value::Bool(true), ""), "True");
        assert_eq!(fmt(Value::None, ""), "None");
    }

    #[test]
    fn test_string_precision_truncates() {
        assert_eq!(fmt(s("3.1415926535897932384626433832795"), ".2s"), "3.");
        assert_eq!(fmt(s("31415"), ".2"), "31");
    }

    #[test]
    fn test_string_alignment() {
        assert_eq!(fmt(s("ab"), "5"), "ab   ");
        assert_eq!(fmt(s("ab"), ">5"), "   ab");
        assert_eq!(fmt(s("ab"), "*^6"), "**ab**");
        assert_eq!(fmt(s("ab"), "^5"), " ab  ");
    }

    #[test]
    fn test_string_rejects_numeric_codes() {
        let err = format_value(&s("x"), "d").unwrap_err();
        assert_eq!(
            err.to_string(),
            "ValueError: Unknown format code 'd' for object of type 'str'"
        );
        assert!(format_value(&s("x"), "+").is_err());
        assert!(format_value(&s("x"), "=5").is_err());
    }

    #[test]
    fn test_float_fixed() {
        assert_eq!(fmt(Value::Float(3.1415926535), ".2f"), "3.14");
        assert_eq!(fmt(Value::Float(-3.1415926535), ".3f"), "-3.142");
        assert_eq!(fmt(Value::Float(2.5), "f"), "2.500000");
        assert_eq!(fmt(Value::Float(1.0), "08.2f"), "00001.00");
        assert_eq!(fmt(Value::Float(-1.0), "08.2f"), "-0001.00");
    }

    #[test]
    fn test_float_exponent() {
        assert_eq!(fmt(Value::Float(1234.56), ".2e"), "1.23e+03");
        assert_eq!(fmt(Value::Float(0.00012), "E"), "1.200000E-04");
    }

    #[test]
    fn test_float_general() {
        assert_eq!(fmt(Value::Float(1234.5), "g"), "1234.5");
        assert_eq!(fmt(Value::Float(1234567.0), "g"), "1.23457e+06");
        assert_eq!(fmt(Value::Float(0.0001), "g"), "0.0001");
        assert_eq!(fmt(Value::Float(0.00001), "g"), "1e-05");
        assert_eq!(fmt(Value::Float(2.0), ".3g"), "2");
    }

    #[test]
    fn test_float_no_type_with_precision() {
        assert_eq!(fmt(Value::Float(3.0), ".3"), "3.0");
        assert_eq!(fmt(Value::Float(3.14159), ".3"), "3.14");
        assert_eq!(fmt(Value::Float(31.0), ".2"), "3.1e+01");
    }

    #[test]
    fn test_float_percent_and_sign() {
        assert_eq!(fmt(Value::Float(0.25), ".1%"), "25.0%");
        assert_eq!(fmt(Value::Float(1.5), "+"), "+1.5");
        assert_eq!(fmt(Value::Float(1.5), " "), " 1.5");
    }

    #[test]
    fn test_negative_zero_coercion() {
        assert_eq!(fmt(Value::Float(-0.0001), ".2f"), "-0.00");
        assert_eq!(fmt(Value::Float(-0.0001), "z.2f"), "0.00");
    }

    #[test]
    fn test_float_grouping() {
        assert_eq!(fmt(Value::Float(1234567.891), ",.2f"), "1,234,567.89");
    }

    #[test]
    fn test_non_finite() {
        assert_eq!(fmt(Value::Float(f64::INFINITY), "f"), "inf");
        assert_eq!(fmt(Value::Float(f64::NAN), "F"), "NAN");
        assert_eq!(fmt(Value::Float(f64::NEG_INFINITY), ">6"), "  -inf");
    }

    #[test]
    fn test_int_radix() {
        assert_eq!(fmt(Value::Int(255), "x"), "ff");
        assert_eq!(fmt(Value::Int(255), "#X"), "0XFF");
        assert_eq!(fmt(Value::Int(5), "#b"), "0b101");
        assert_eq!(fmt(Value::Int(-8), "o"), "-10");
    }

    #[test]
    fn test_int_padding_and_grouping() {
        assert_eq!(fmt(Value::Int(42), "05"), "00042");
        assert_eq!(fmt(Value::Int(-42), "05"), "-0042");
        assert_eq!(fmt(Value::Int(-42), "=+6"), "-   42");
        assert_eq!(fmt(Value::Int(1234567), ","), "1,234,567");
        assert_eq!(fmt(Value::Int(1234), "010,"), "00,001,234");
        assert_eq!(fmt(Value::Int(65535), "_x"), "ffff");
        assert_eq!(fmt(Value::Int(1048575), "_x"), "f_ffff");
    }

    #[test]
    fn test_int_as_float() {
        assert_eq!(fmt(Value::Int(3), ".2f"), "3.00");
        assert_eq!(fmt(Value::Int(1), "%"), "100.000000%");
    }

    #[test]
    fn test_int_char() {
        assert_eq!(fmt(Value::Int(65), "c"), "A");
    }

    #[test]
    fn test_int_rejects_precision() {
        assert!(format_value(&Value::Int(3), ".2").is_err());
        assert!(format_value(&Value::Int(3), "s").is_err());
    }

    #[test]
    fn test_bool_formats_as_int() {
        assert_eq!(fmt(Value::Bool(true), ">3"), "  1");
        assert_eq!(fmt(Value::Bool(false), "d"), "0");
    }

    #[test]
    fn test_other_types_reject_spec() {
        let err = format_value(&Value::None, ">5").unwrap_err();
        assert_eq!(
            err.to_string(),
            "TypeError: unsupported format string passed to NoneType.__format__"
        );
    }

    #[test]
    fn test_precision_beyond_formatter_limit() {
        let text = fmt(Value::Float(1.5), ".70000f");
        assert_eq!(text.len(), 70002);
        assert!(text.starts_with("1.5000"));
        assert!(text.ends_with('0'));

        let text = fmt(Value::Float(1.5), ".70000e");
        assert!(text.starts_with("1.5000"));
        assert!(text.ends_with("e+00"));

        let text = fmt(Value::Float(0.1), ".1200f");
        assert!(text.starts_with("0.1000000000000000055511151231257827"));
        assert_eq!(text.len(), 1202);
    }

    #[test]
    fn test_oversized_width_is_overflow_error() {
        let err = format_value(&Value::Int(1), ">99999999999").unwrap_err();
        assert!(matches!(
            err,
            EvalError::Runtime {
                kind: RuntimeErrorKind::OverflowError,
                ..
            }
        ));
        assert!(format_value(&s("x"), "99999999999").is_err());
        assert!(format_value(&Value::Float(1.0), ".99999999999f").is_err());
    }

    #[test]
    fn test_wide_zero_padded_grouping() {
        let text = fmt(Value::Int(1), "020,");
        assert_eq!(text, "0,000,000,000,000,001");
        // Padding stops at the first grouped length reaching the width.
        let text = fmt(Value::Int(1), "0100000,");
        assert_eq!(text.chars().count(), 100001);
    }

    #[test]
    fn test_invalid_spec() {
        assert!(format_value(&Value::Float(1.0), ".f").is_err());
        assert!(format_value(&Value::Float(1.0), "abc").is_err());
    }
}
