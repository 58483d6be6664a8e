// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interpolation trait definition.
//!
//! This module defines the `Interpolation` trait, the interface a configuration
//! store calls on every option read and every option write.

use crate::domain::{ResolutionError, ResolvedValue, Scope, ValidationError};

/// A trait for value interpolation strategies.
///
/// A store owns raw values and hands them to its interpolation:
///
/// - on every read, through [`resolve`](Interpolation::resolve), together with the
///   scope of names visible from the option's section;
/// - on every write, through [`validate`](Interpolation::validate), before the new
///   raw value is committed.
///
/// Implementations must not cache: the store decides when a raw value is stale.
///
/// # Examples
///
/// ```rust
/// use interpcfg::domain::{ResolutionError, ResolvedValue, Scope, ValidationError};
/// use interpcfg::ports::Interpolation;
///
/// struct Uppercase;
///
/// impl Interpolation for Uppercase {
///     fn resolve(
///         &self,
///         raw_value: &str,
///         _section: &str,
///         _option: &str,
///         _scope: &Scope,
///     ) -> Result<ResolvedValue, ResolutionError> {
///         Ok(ResolvedValue::from(raw_value.to_uppercase()))
///     }
///
///     fn validate(&self, _raw_value: &str) -> Result<(), ValidationError> {
///         Ok(())
///     }
/// }
///
/// let value = Uppercase.resolve("abc", "s", "o", &Scope::new()).unwrap();
/// assert_eq!(value.as_str(), "ABC");
/// ```
pub trait Interpolation: Send + Sync {
    /// Resolves a raw value read from `section`/`option`.
    ///
    /// # Arguments
    ///
    /// * `raw_value` - The value as stored
    /// * `section` - The section being read, for error reporting
    /// * `option` - The option being read, for error reporting
    /// * `scope` - Defaults overlaid by the section's options
    ///
    /// # Returns
    ///
    /// * `Ok(ResolvedValue)` - The fully resolved value
    /// * `Err(ResolutionError)` - A classified failure; no partial value is returned
    fn resolve(
        &self,
        raw_value: &str,
        section: &str,
        option: &str,
        scope: &Scope,
    ) -> Result<ResolvedValue, ResolutionError>;

    /// Checks a raw value before it is stored.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The value may be stored
    /// * `Err(ValidationError)` - The value is malformed and must be rejected
    fn validate(&self, raw_value: &str) -> Result<(), ValidationError>;
}
