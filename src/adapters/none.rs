// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interpolation that leaves values untouched.

use crate::domain::{ResolutionError, ResolvedValue, Scope, ValidationError};
use crate::ports::Interpolation;

/// Returns every raw value verbatim and accepts every write.
///
/// # Examples
///
/// ```rust
/// use interpcfg::adapters::NoInterpolation;
/// use interpcfg::domain::Scope;
/// use interpcfg::ports::Interpolation;
///
/// let value = NoInterpolation.resolve("two_{a}", "s", "b", &Scope::new()).unwrap();
/// assert_eq!(value.as_str(), "two_{a}");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoInterpolation;

impl Interpolation for NoInterpolation {
    fn resolve(
        &self,
        raw_value: &str,
        _section: &str,
        _option: &str,
        _scope: &Scope,
    ) -> Result<ResolvedValue, ResolutionError> {
        Ok(ResolvedValue::from(raw_value))
    }

    fn validate(&self, _raw_value: &str) -> Result<(), ValidationError> {
        Ok(())
    }
}
