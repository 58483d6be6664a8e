// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interpolation settings.

use serde::{Deserialize, Serialize};

/// Maximum number of re-evaluation steps before a value is considered cyclic.
///
/// Same limit as configparser's own interpolation.
pub const MAX_INTERPOLATION_DEPTH: usize = 10;

/// Settings for [`FStringInterpolation`](crate::service::FStringInterpolation).
///
/// # Examples
///
/// ```
/// use interpcfg::domain::{InterpolationOptions, MAX_INTERPOLATION_DEPTH};
///
/// let options = InterpolationOptions::default();
/// assert!(!options.raw_strings);
/// assert_eq!(options.max_depth, MAX_INTERPOLATION_DEPTH);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpolationOptions {
    /// Leave backslash sequences in literal text untouched instead of decoding them.
    pub raw_strings: bool,
    /// How many times a value may change under re-evaluation before giving up.
    pub max_depth: usize,
}

impl Default for InterpolationOptions {
    fn default() -> Self {
        Self {
            raw_strings: false,
            max_depth: MAX_INTERPOLATION_DEPTH,
        }
    }
}

#[cfg(feature = "yaml")]
impl InterpolationOptions {
    /// Reads settings from YAML text. Missing fields keep their defaults.
    ///
    /// # Examples
    ///
    /// ```
    /// use interpcfg::domain::InterpolationOptions;
    ///
    /// let options = InterpolationOptions::from_yaml("raw_strings: true").unwrap();
    /// assert!(options.raw_strings);
    /// assert_eq!(options.max_depth, 10);
    /// ```
    pub fn from_yaml(content: &str) -> crate::domain::Result<Self> {
        serde_yaml::from_str(content).map_err(|e| crate::domain::ConfigError::ParseError {
            message: format!("Failed to parse interpolation options: {}", e),
            source: Some(Box::new(e)),
        })
    }
}
