// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backslash escape decoding for literal text and string literals.

use crate::domain::EvalError;

/// Decodes backslash escapes.
///
/// Supported: `\\ \' \" \a \b \f \n \r \t \v`, octal `\ooo`, `\xhh`, `\uXXXX`,
/// `\UXXXXXXXX` and backslash-newline (dropped). Unknown escapes keep the
/// backslash, so `\d` stays `\d`.
pub fn decode(src: &str) -> Result<String, EvalError> {
    if !src.contains('\\') {
        return Ok(src.to_string());
    }

    let mut out = String::with_capacity(src.len());
    let mut chars = src.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            None => out.push('\\'),
            Some('\n') => {}
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some('a') => out.push('\u{07}'),
            Some('b') => out.push('\u{08}'),
            Some('f') => out.push('\u{0c}'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('v') => out.push('\u{0b}'),
            Some(d @ '0'..='7') => {
                let mut code = d.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|n| n.to_digit(8)) {
                        Some(digit) => {
                            code = code * 8 + digit;
                            chars.next();
                        }
                        None => break,
                    }
                }
                // At most 0o777, always a valid scalar value.
                out.extend(char::from_u32(code));
            }
            Some('x') => out.push(hex_escape(&mut chars, 2, "\\xXX")?),
            Some('u') => out.push(hex_escape(&mut chars, 4, "\\uXXXX")?),
            Some('U') => out.push(hex_escape(&mut chars, 8, "\\UXXXXXXXX")?),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
        }
    }

    Ok(out)
}

fn hex_escape(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    digits: usize,
    form: &str,
) -> Result<char, EvalError> {
    let mut code: u32 = 0;
    for _ in 0..digits {
        let digit = chars
            .peek()
            .and_then(|c| c.to_digit(16))
            .ok_or_else(|| EvalError::syntax(format!("(unicode error) truncated {} escape", form)))?;
        code = code * 16 + digit;
        chars.next();
    }
    char::from_u32(code)
        .ok_or_else(|| EvalError::syntax("(unicode error) illegal Unicode character"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_escapes() {
        assert_eq!(decode("plain").unwrap(), "plain");
    }

    #[test]
    fn test_simple_escapes() {
        assert_eq!(decode(r"a\tb\nc").unwrap(), "a\tb\nc");
        assert_eq!(decode("\\\\ \\' \\\"").unwrap(), "\\ ' \"");
        assert_eq!(decode(r"\a\b\f\v\r").unwrap(), "\u{7}\u{8}\u{c}\u{b}\r");
    }

    #[test]
    fn test_octal() {
        assert_eq!(decode(r"\1").unwrap(), "\u{1}");
        assert_eq!(decode(r"\101").unwrap(), "A");
        assert_eq!(decode(r"\1019").unwrap(), "A9");
    }

    #[test]
    fn test_hex_and_unicode() {
        assert_eq!(decode(r"\x41").unwrap(), "A");
        assert_eq!(decode(r"\u00e9").unwrap(), "\u{e9}");
        assert_eq!(decode(r"\U0001F600").unwrap(), "😀");
    }

    #[test]
    fn test_truncated_hex_is_syntax_error() {
        let err = decode(r"\x4").unwrap_err();
        assert!(err.is_syntax());
        assert!(decode(r"\uzzzz").is_err());
    }

    #[test]
    fn test_illegal_code_point() {
        assert!(decode(r"\UFFFFFFFF").unwrap_err().is_syntax());
    }

    #[test]
    fn test_unknown_escape_kept() {
        assert_eq!(decode(r"\d\q").unwrap(), r"\d\q");
    }

    #[test]
    fn test_trailing_backslash_kept() {
        assert_eq!(decode("end\\").unwrap(), "end\\");
    }

    #[test]
    fn test_line_continuation() {
        assert_eq!(decode("a\\\nb").unwrap(), "ab");
    }
}
