// SPDX-License-Identifier: MIT OR Apache-2.0

//! The f-string interpolation: resolution loop and write-path validation.
//!
//! Resolution evaluates a raw value against its scope, then keeps re-evaluating the
//! output until it stops changing. This makes references transitive: with
//! `a = 3.14` and `b = two_{a}`, the value `three_{b}` first becomes `three_two_{a}`
//! and then `three_two_3.14`. A reference cycle never settles and is cut off by the
//! depth limit.

use crate::adapters::FStringEvaluator;
use crate::domain::{
    EvalError, InterpolationOptions, ResolutionError, ResolvedValue, Scope, ValidationError,
};
use crate::ports::{ExpressionEvaluator, Interpolation};
use crate::service::classifier::{classify, ResolutionContext};
use crate::service::wrapper::wrap;

/// Interpolation that evaluates embedded `{expression}` fields.
///
/// # Examples
///
/// ```rust
/// use interpcfg::domain::Scope;
/// use interpcfg::ports::Interpolation;
/// use interpcfg::service::FStringInterpolation;
///
/// let interpolation = FStringInterpolation::default();
/// let scope: Scope = [("a", "3.14"), ("b", "two_{a}")].into_iter().collect();
///
/// let value = interpolation.resolve("three_{b}", "fstring", "c", &scope).unwrap();
/// assert_eq!(value.as_str(), "three_two_3.14");
/// ```
pub struct FStringInterpolation<E = FStringEvaluator> {
    evaluator: E,
    options: InterpolationOptions,
}

impl FStringInterpolation {
    /// Creates an interpolation with the built-in evaluator and default options.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use interpcfg::service::FStringInterpolation;
    ///
    /// let interpolation = FStringInterpolation::builder()
    ///     .raw_strings(true)
    ///     .max_depth(4)
    ///     .build();
    /// assert_eq!(interpolation.options().max_depth, 4);
    /// ```
    pub fn builder() -> InterpolationBuilder {
        InterpolationBuilder::new()
    }
}

impl Default for FStringInterpolation {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ExpressionEvaluator> FStringInterpolation<E> {
    /// Creates an interpolation around a custom evaluator.
    pub fn with_evaluator(evaluator: E, options: InterpolationOptions) -> Self {
        Self { evaluator, options }
    }

    /// The active options.
    pub fn options(&self) -> &InterpolationOptions {
        &self.options
    }

    /// One wrap-evaluate-finish pass over `candidate`.
    fn evaluate_once(&self, candidate: &str, scope: &Scope) -> Result<String, EvalError> {
        let template = wrap(candidate, self.options.raw_strings)?;
        let rendered = self.evaluator.evaluate(&template, scope)?;
        Ok(template.finish(rendered))
    }
}

impl<E: ExpressionEvaluator> Interpolation for FStringInterpolation<E> {
    fn resolve(
        &self,
        raw_value: &str,
        section: &str,
        option: &str,
        scope: &Scope,
    ) -> Result<ResolvedValue, ResolutionError> {
        let ctx = ResolutionContext {
            section,
            option,
            raw_value,
        };

        let mut current = raw_value.to_string();
        let mut depth = 0usize;

        let failure = loop {
            match self.evaluate_once(&current, scope) {
                Ok(next) if next == current => {
                    tracing::trace!(section, option, depth, "value reached a fixed point");
                    return Ok(ResolvedValue::from(next));
                }
                Ok(next) => {
                    current = next;
                    depth += 1;
                    tracing::trace!(section, option, depth, value = %current, "value changed");
                    if depth > self.options.max_depth {
                        tracing::debug!(
                            "Option '{}' in section '{}' did not settle within {} steps",
                            option,
                            section,
                            self.options.max_depth
                        );
                        return Err(ResolutionError::DepthExceeded {
                            section: section.to_string(),
                            option: option.to_string(),
                            raw_value: raw_value.to_string(),
                            max_depth: self.options.max_depth,
                        });
                    }
                }
                Err(e) if e.is_syntax() => {
                    tracing::debug!(
                        "Syntax error in option '{}' of section '{}': {}",
                        option,
                        section,
                        e
                    );
                    return Err(classify(e, &ctx));
                }
                Err(e) => break e,
            }
        };

        tracing::debug!(
            "Evaluator '{}' failed on option '{}' of section '{}': {}",
            self.evaluator.name(),
            option,
            section,
            failure
        );
        Err(classify(failure, &ctx))
    }

    fn validate(&self, raw_value: &str) -> Result<(), ValidationError> {
        // Evaluated against nothing: only malformed text is an error here.
        match self.evaluate_once(raw_value, &Scope::new()) {
            Err(EvalError::Syntax { message }) => {
                tracing::debug!("Rejecting value {:?}: {}", raw_value, message);
                Err(ValidationError::InvalidExpression {
                    value: raw_value.to_string(),
                    message,
                })
            }
            Err(e) => {
                tracing::trace!("Accepting value {:?} despite {}", raw_value, e);
                Ok(())
            }
            Ok(_) => Ok(()),
        }
    }
}

/// Builder for constructing a [`FStringInterpolation`].
#[derive(Debug, Clone, Default)]
pub struct InterpolationBuilder {
    options: InterpolationOptions,
}

impl InterpolationBuilder {
    /// Creates a builder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces all options at once, e.g. with settings read from a file.
    pub fn options(mut self, options: InterpolationOptions) -> Self {
        self.options = options;
        self
    }

    /// Leaves backslash sequences in literal text undecoded.
    pub fn raw_strings(mut self, raw: bool) -> Self {
        self.options.raw_strings = raw;
        self
    }

    /// Sets how many changing re-evaluations are allowed.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.options.max_depth = depth;
        self
    }

    /// Builds an interpolation with the built-in evaluator.
    pub fn build(self) -> FStringInterpolation {
        FStringInterpolation::with_evaluator(FStringEvaluator::new(), self.options)
    }

    /// Builds an interpolation around a custom evaluator.
    pub fn build_with<E: ExpressionEvaluator>(self, evaluator: E) -> FStringInterpolation<E> {
        FStringInterpolation::with_evaluator(evaluator, self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RuntimeErrorKind;
    use crate::service::WrappedTemplate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const PI: &str = "3.1415926535897932384626433832795";

    fn scope(pairs: &[(&str, &str)]) -> Scope {
        pairs.iter().copied().collect()
    }

    fn resolve(raw: &str, pairs: &[(&str, &str)]) -> Result<ResolvedValue, ResolutionError> {
        FStringInterpolation::default().resolve(raw, "section", "option", &scope(pairs))
    }

    #[test]
    fn test_literal_is_identity() {
        assert_eq!(resolve("plain text", &[]).unwrap(), "plain text");
        assert_eq!(resolve("", &[]).unwrap(), "");
    }

    #[test]
    fn test_transitive_chain() {
        let pairs = [("a", PI), ("b", "two_{a}")];
        assert_eq!(
            resolve("three_{b}", &pairs).unwrap().as_str(),
            format!("three_two_{}", PI)
        );
    }

    #[test]
    fn test_cycle_hits_depth_limit() {
        let pairs = [("a", "{b}"), ("b", "{a}")];
        let err = resolve("{a}", &pairs).unwrap_err();
        match err {
            ResolutionError::DepthExceeded {
                raw_value,
                max_depth,
                ..
            } => {
                assert_eq!(raw_value, "{a}");
                assert_eq!(max_depth, 10);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_growing_self_reference_hits_depth_limit() {
        let err = resolve("x{a}", &[("a", "x{a}")]).unwrap_err();
        assert!(matches!(err, ResolutionError::DepthExceeded { .. }));
    }

    #[test]
    fn test_chain_within_limit() {
        let interpolation = FStringInterpolation::builder().max_depth(2).build();
        let pairs = scope(&[("a", "{b}"), ("b", "{c}"), ("c", "end")]);
        let value = interpolation.resolve("{a}", "s", "o", &pairs).unwrap();
        assert_eq!(value.as_str(), "end");

        let pairs = scope(&[("a", "{b}"), ("b", "{c}"), ("c", "{d}"), ("d", "end")]);
        assert!(matches!(
            interpolation.resolve("{a}", "s", "o", &pairs),
            Err(ResolutionError::DepthExceeded { max_depth: 2, .. })
        ));
    }

    #[test]
    fn test_missing_reference() {
        let err = resolve("{a} is {b}", &[("a", "1")]).unwrap_err();
        assert!(matches!(
            err,
            ResolutionError::MissingReference { ref reference, .. } if reference == "b"
        ));
        assert_eq!(err.section(), "section");
        assert_eq!(err.option(), "option");
    }

    #[test]
    fn test_runtime_failure() {
        let err = resolve("{a/2}", &[("a", PI)]).unwrap_err();
        assert!(matches!(err, ResolutionError::Runtime { .. }));
    }

    #[test]
    fn test_syntax_failure() {
        let err = resolve("{a", &[("a", "1")]).unwrap_err();
        assert!(matches!(err, ResolutionError::Syntax { .. }));
        assert_eq!(err.raw_value(), "{a");
    }

    #[test]
    fn test_reserved_delimiter_is_syntax_failure() {
        let err = resolve("'''", &[]).unwrap_err();
        assert!(matches!(err, ResolutionError::Syntax { .. }));
    }

    #[test]
    fn test_trailing_quotes_preserved() {
        assert_eq!(resolve("{a}'", &[("a", "x")]).unwrap(), "x'");
        assert_eq!(resolve("{a}''", &[("a", "x")]).unwrap(), "x''");
        assert_eq!(resolve("'{a}'", &[("a", "x")]).unwrap(), "'x'");
    }

    #[test]
    fn test_escape_modes() {
        assert_eq!(resolve(r"a\1b", &[]).unwrap(), "a\u{1}b");
        let raw = FStringInterpolation::builder().raw_strings(true).build();
        let value = raw.resolve(r"a\1b", "s", "o", &Scope::new()).unwrap();
        assert_eq!(value.as_str(), r"a\1b");
    }

    #[test]
    fn test_escaped_braces_settle_when_stable() {
        // `{{x}}` renders to `{x}`, which is then evaluated on the next pass.
        assert_eq!(resolve("{{x}}", &[("x", "1")]).unwrap(), "1");
    }

    #[test]
    fn test_scope_is_not_mutated() {
        let pairs = scope(&[("a", "1"), ("b", "{a}")]);
        let before = pairs.clone();
        FStringInterpolation::default()
            .resolve("{b}", "s", "o", &pairs)
            .unwrap();
        assert_eq!(pairs, before);
    }

    #[test]
    fn test_validate_accepts_undefined_names() {
        let interpolation = FStringInterpolation::default();
        assert!(interpolation.validate("{undefined_name}").is_ok());
        assert!(interpolation.validate("{1/0}").is_ok());
        assert!(interpolation.validate("plain").is_ok());
    }

    #[test]
    fn test_validate_rejects_malformed() {
        let interpolation = FStringInterpolation::default();
        for bad in ["{", "}", "{}", "{a +}", "x'''y"] {
            let err = interpolation.validate(bad).unwrap_err();
            let ValidationError::InvalidExpression { value, .. } = err;
            assert_eq!(value, bad);
        }
    }

    struct CountingEvaluator {
        calls: AtomicUsize,
        fail_with: Option<EvalError>,
    }

    impl ExpressionEvaluator for CountingEvaluator {
        fn name(&self) -> &str {
            "counting"
        }

        fn evaluate(&self, template: &WrappedTemplate<'_>, _scope: &Scope) -> Result<String, EvalError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.fail_with {
                Some(e) => Err(e.clone()),
                None if n < 3 => Ok(format!("{}+", template.body())),
                None => Ok(template.body().to_string()),
            }
        }
    }

    #[test]
    fn test_custom_evaluator_loops_until_stable() {
        let interpolation = FStringInterpolation::builder().build_with(CountingEvaluator {
            calls: AtomicUsize::new(0),
            fail_with: None,
        });
        let value = interpolation.resolve("v", "s", "o", &Scope::new()).unwrap();
        assert_eq!(value.as_str(), "v+++");
        assert_eq!(interpolation.evaluator.calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_syntax_failure_is_not_retried() {
        let interpolation = FStringInterpolation::builder().build_with(CountingEvaluator {
            calls: AtomicUsize::new(0),
            fail_with: Some(EvalError::syntax("bad")),
        });
        assert!(interpolation.resolve("v", "s", "o", &Scope::new()).is_err());
        assert_eq!(interpolation.evaluator.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_runtime_failure_from_custom_evaluator() {
        let interpolation = FStringInterpolation::builder().build_with(CountingEvaluator {
            calls: AtomicUsize::new(0),
            fail_with: Some(EvalError::runtime(RuntimeErrorKind::ValueError, "nope")),
        });
        let err = interpolation
            .resolve("v", "s", "o", &Scope::new())
            .unwrap_err();
        assert!(matches!(err, ResolutionError::Runtime { ref message, .. } if message == "ValueError: nope"));
    }

    #[test]
    fn test_builder_options() {
        let options = InterpolationOptions {
            raw_strings: true,
            max_depth: 3,
        };
        let interpolation = FStringInterpolation::builder()
            .options(options.clone())
            .build();
        assert_eq!(interpolation.options(), &options);
    }
}
