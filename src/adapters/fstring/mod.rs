// SPDX-License-Identifier: MIT OR Apache-2.0

//! The built-in f-string expression evaluator.
//!
//! Replacement fields hold expressions in a small Python-like language:
//! arithmetic, comparisons, conditionals, list comprehensions, a set of
//! builtins such as `float`, `int`, `sum` and `len`, and `str` methods.
//! Every name bound in the scope evaluates to a string, so numeric work goes
//! through an explicit conversion: `{float(a) / 2}`.
//!
//! Fields support `!s`, `!r` and `!a` conversions, `{expr=}` self-documenting
//! output and the full format-spec mini-language, including nested fields in
//! the spec (`{x:>{width}}`).
//!
//! # Examples
//!
//! ```rust
//! use interpcfg::adapters::FStringEvaluator;
//! use interpcfg::domain::Scope;
//! use interpcfg::ports::ExpressionEvaluator;
//! use interpcfg::service::wrap;
//!
//! let evaluator = FStringEvaluator::new();
//! let scope: Scope = [("a", "3.14159")].into_iter().collect();
//!
//! let template = wrap("pi={float(a):.2f}", false).unwrap();
//! assert_eq!(evaluator.evaluate(&template, &scope).unwrap(), "pi=3.14");
//! ```

mod ast;
mod builtins;
mod escape;
mod eval;
mod format;
mod lexer;
mod ops;
mod parser;
mod value;

use crate::domain::{EvalError, Scope};
use crate::ports::ExpressionEvaluator;
use crate::service::WrappedTemplate;

/// Evaluator for f-string templates.
#[derive(Clone, Copy, Debug, Default)]
pub struct FStringEvaluator;

impl FStringEvaluator {
    /// Creates an evaluator.
    pub fn new() -> Self {
        Self
    }
}

impl ExpressionEvaluator for FStringEvaluator {
    fn name(&self) -> &str {
        "fstring"
    }

    fn evaluate(&self, template: &WrappedTemplate<'_>, scope: &Scope) -> Result<String, EvalError> {
        let parsed = parser::parse_template(template.body(), template.is_raw())?;
        eval::render(&parsed, scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RuntimeErrorKind;
    use crate::service::wrap;

    fn evaluate(raw: &str, raw_strings: bool, scope: &Scope) -> Result<String, EvalError> {
        let template = wrap(raw, raw_strings)?;
        FStringEvaluator::new()
            .evaluate(&template, scope)
            .map(|rendered| template.finish(rendered))
    }

    #[test]
    fn test_name() {
        assert_eq!(FStringEvaluator::new().name(), "fstring");
    }

    #[test]
    fn test_plain_value_is_unchanged() {
        assert_eq!(evaluate("plain", false, &Scope::new()).unwrap(), "plain");
        assert_eq!(
            evaluate("two_%(a)s", false, &Scope::new()).unwrap(),
            "two_%(a)s"
        );
    }

    #[test]
    fn test_trailing_apostrophes_survive() {
        let scope: Scope = [("a", "x")].into_iter().collect();
        assert_eq!(evaluate("{a}'", false, &scope).unwrap(), "x'");
        assert_eq!(evaluate("{a}''", false, &scope).unwrap(), "x''");
        assert_eq!(evaluate("it's {a}", false, &scope).unwrap(), "it's x");
    }

    #[test]
    fn test_raw_strings_keep_backslashes() {
        let scope = Scope::new();
        assert_eq!(evaluate(r"C:\temp", false, &scope).unwrap(), "C:\temp");
        assert_eq!(evaluate(r"C:\temp", true, &scope).unwrap(), r"C:\temp");
    }

    #[test]
    fn test_deep_nesting_evaluates_without_overflow() {
        let raw = format!("{{{}1{}}}", "(".repeat(199), ")".repeat(199));
        assert_eq!(evaluate(&raw, false, &Scope::new()).unwrap(), "1");

        let raw = format!("{{{}1}}", "-".repeat(998));
        assert_eq!(evaluate(&raw, false, &Scope::new()).unwrap(), "1");
    }

    #[test]
    fn test_excess_nesting_is_syntax_error() {
        let raw = format!("{{{}1{}}}", "(".repeat(300), ")".repeat(300));
        assert!(evaluate(&raw, false, &Scope::new()).unwrap_err().is_syntax());
        assert!(evaluate("{1:{2:{3}}}", false, &Scope::new())
            .unwrap_err()
            .is_syntax());
    }

    #[test]
    fn test_range_renders_as_list() {
        let scope = Scope::new();
        assert_eq!(evaluate("{range(3)}", false, &scope).unwrap(), "[0, 1, 2]");
        assert_eq!(evaluate("{str(range(0))}", false, &scope).unwrap(), "[]");
        assert_eq!(evaluate("{len(range(2, 9, 3))}", false, &scope).unwrap(), "3");
    }

    #[test]
    fn test_error_categories() {
        let scope = Scope::new();
        assert!(evaluate("{", false, &scope).unwrap_err().is_syntax());
        assert!(matches!(
            evaluate("{missing}", false, &scope).unwrap_err(),
            EvalError::UndefinedName { .. }
        ));
        assert!(matches!(
            evaluate("{int('x')}", false, &scope).unwrap_err(),
            EvalError::Runtime {
                kind: RuntimeErrorKind::ValueError,
                ..
            }
        ));
    }
}
