// SPDX-License-Identifier: MIT OR Apache-2.0

//! Expression evaluator trait definition.
//!
//! This module defines the `ExpressionEvaluator` trait, the capability the
//! resolution loop consumes to turn one wrapped template into text.

use crate::domain::{EvalError, Scope};
use crate::service::WrappedTemplate;

/// A trait for evaluating wrapped templates against a name scope.
///
/// An evaluator receives a template produced by [`wrap`](crate::service::wrap)
/// and the scope to look names up in. It returns the rendered text, or one of the
/// three [`EvalError`] categories: malformed template, undefined name, or a runtime
/// failure. The trailing quote suffix held by the template is appended by the
/// caller, not by the evaluator.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so an interpolation can be shared
/// between threads.
///
/// # Examples
///
/// ```rust
/// use interpcfg::domain::{EvalError, Scope};
/// use interpcfg::ports::ExpressionEvaluator;
/// use interpcfg::service::WrappedTemplate;
///
/// /// Treats the whole template as one name.
/// struct LookupEvaluator;
///
/// impl ExpressionEvaluator for LookupEvaluator {
///     fn name(&self) -> &str {
///         "lookup"
///     }
///
///     fn evaluate(&self, template: &WrappedTemplate<'_>, scope: &Scope) -> Result<String, EvalError> {
///         scope
///             .get(template.body())
///             .map(str::to_string)
///             .ok_or_else(|| EvalError::UndefinedName { name: template.body().to_string() })
///     }
/// }
/// ```
pub trait ExpressionEvaluator: Send + Sync {
    /// Returns a short identifier for logging.
    fn name(&self) -> &str;

    /// Evaluates the template body against `scope`.
    ///
    /// # Arguments
    ///
    /// * `template` - The wrapped template; `template.is_raw()` selects whether
    ///   backslash sequences in literal text are decoded
    /// * `scope` - The names visible to expressions, read-only
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The rendered body, without the template's suffix
    /// * `Err(EvalError)` - The failure category and message
    fn evaluate(&self, template: &WrappedTemplate<'_>, scope: &Scope) -> Result<String, EvalError>;
}
