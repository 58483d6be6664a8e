// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns a raw value into an evaluable template.
//!
//! A raw value may not contain the reserved triple-apostrophe sequence, and up to
//! two trailing apostrophes are held back from the evaluator and re-attached to
//! its output. Both rules keep the evaluator's literal boundary unambiguous.

use crate::domain::EvalError;

/// The literal boundary marker. It cannot appear inside a raw value.
pub const RESERVED_DELIMITER: &str = "'''";

/// A raw value prepared for an [`ExpressionEvaluator`](crate::ports::ExpressionEvaluator).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WrappedTemplate<'a> {
    body: &'a str,
    suffix: &'a str,
    raw: bool,
}

impl<'a> WrappedTemplate<'a> {
    /// The text the evaluator renders.
    pub fn body(&self) -> &'a str {
        self.body
    }

    /// Trailing apostrophes stripped from the raw value.
    pub fn suffix(&self) -> &'a str {
        self.suffix
    }

    /// Whether backslash sequences in literal text are left undecoded.
    pub fn is_raw(&self) -> bool {
        self.raw
    }

    /// Re-attaches the suffix to the evaluator's output.
    pub fn finish(&self, mut rendered: String) -> String {
        rendered.push_str(self.suffix);
        rendered
    }
}

/// Wraps `raw_value` for evaluation.
///
/// # Errors
///
/// Returns [`EvalError::Syntax`] if the value contains [`RESERVED_DELIMITER`].
///
/// # Examples
///
/// ```
/// use interpcfg::service::wrap;
///
/// let template = wrap("{name}''", false).unwrap();
/// assert_eq!(template.body(), "{name}");
/// assert_eq!(template.suffix(), "''");
///
/// assert!(wrap("a'''b", false).is_err());
/// ```
pub fn wrap(raw_value: &str, raw: bool) -> Result<WrappedTemplate<'_>, EvalError> {
    if raw_value.contains(RESERVED_DELIMITER) {
        return Err(EvalError::syntax(
            "Triple-apostrophes ''' are forbidden. Consider using \"\"\" instead.",
        ));
    }

    // At most two: three in a row were rejected above.
    let split = if raw_value.ends_with("''") {
        raw_value.len() - 2
    } else if raw_value.ends_with('\'') {
        raw_value.len() - 1
    } else {
        raw_value.len()
    };

    Ok(WrappedTemplate {
        body: &raw_value[..split],
        suffix: &raw_value[split..],
        raw,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_value() {
        let template = wrap("two_{a}", false).unwrap();
        assert_eq!(template.body(), "two_{a}");
        assert_eq!(template.suffix(), "");
        assert!(!template.is_raw());
    }

    #[test]
    fn test_one_trailing_quote() {
        let template = wrap("it'", true).unwrap();
        assert_eq!(template.body(), "it");
        assert_eq!(template.suffix(), "'");
        assert!(template.is_raw());
    }

    #[test]
    fn test_two_trailing_quotes() {
        let template = wrap("''", false).unwrap();
        assert_eq!(template.body(), "");
        assert_eq!(template.suffix(), "''");
    }

    #[test]
    fn test_inner_quotes_untouched() {
        let template = wrap("'{a}' x", false).unwrap();
        assert_eq!(template.body(), "'{a}' x");
        assert_eq!(template.suffix(), "");
    }

    #[test]
    fn test_reserved_delimiter_rejected() {
        let err = wrap("say '''hi'''", false).unwrap_err();
        assert!(err.is_syntax());
        assert!(err.to_string().contains("\"\"\""));
    }

    #[test]
    fn test_finish_appends_suffix() {
        let template = wrap("{a}''", false).unwrap();
        assert_eq!(template.finish("3.14".to_string()), "3.14''");
    }

    #[test]
    fn test_empty_value() {
        let template = wrap("", false).unwrap();
        assert_eq!(template.body(), "");
        assert_eq!(template.suffix(), "");
    }
}
