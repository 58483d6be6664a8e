// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resolved configuration value with type-safe conversions.
//!
//! Interpolation always produces text. `ResolvedValue` wraps that text and offers
//! conversions for callers that need numbers or flags out of it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A resolved value could not be converted to the requested type.
#[derive(Debug, Error)]
#[error("cannot convert {value:?} to {target_type}: {source}")]
pub struct ConversionError {
    /// The resolved text
    pub value: String,
    /// The target type name
    pub target_type: String,
    /// The underlying conversion error
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

/// The string produced once resolution reaches a fixed point.
///
/// # Examples
///
/// ```
/// use interpcfg::domain::ResolvedValue;
///
/// let value = ResolvedValue::from("3.14");
/// assert_eq!(value.as_str(), "3.14");
/// assert_eq!(value.as_f64().unwrap(), 3.14);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolvedValue(String);

impl ResolvedValue {
    /// Creates a new `ResolvedValue`.
    pub fn new(value: String) -> Self {
        ResolvedValue(value)
    }

    /// Returns the value as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the value, returning the inner `String`.
    pub fn into_string(self) -> String {
        self.0
    }

    /// Converts the value to a boolean.
    ///
    /// Recognizes the following values (case-insensitive), the same set
    /// configparser's `getboolean` accepts:
    /// - `true`: "true", "yes", "1", "on"
    /// - `false`: "false", "no", "0", "off"
    ///
    /// # Examples
    ///
    /// ```
    /// use interpcfg::domain::ResolvedValue;
    ///
    /// assert!(ResolvedValue::from("True").as_bool().unwrap());
    /// assert!(!ResolvedValue::from("off").as_bool().unwrap());
    /// ```
    pub fn as_bool(&self) -> Result<bool, ConversionError> {
        match self.0.to_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Ok(true),
            "false" | "no" | "0" | "off" => Ok(false),
            _ => self.parse::<bool>(),
        }
    }

    /// Converts the value to an `i64`.
    pub fn as_i64(&self) -> Result<i64, ConversionError> {
        self.parse()
    }

    /// Converts the value to an `f64`.
    ///
    /// Accepts the float renderings the evaluator produces, including `inf`,
    /// `-inf`, `nan` and exponent forms like `1e+16`.
    pub fn as_f64(&self) -> Result<f64, ConversionError> {
        self.parse()
    }

    /// Parses the value into any type that implements `FromStr`.
    ///
    /// # Examples
    ///
    /// ```
    /// use interpcfg::domain::ResolvedValue;
    /// use std::net::IpAddr;
    ///
    /// let value = ResolvedValue::from("127.0.0.1");
    /// let ip: IpAddr = value.parse().unwrap();
    /// assert_eq!(ip.to_string(), "127.0.0.1");
    /// ```
    pub fn parse<T>(&self) -> Result<T, ConversionError>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        self.0.trim().parse::<T>().map_err(|e| ConversionError {
            value: self.0.clone(),
            target_type: std::any::type_name::<T>().to_string(),
            source: Box::new(e),
        })
    }
}

impl From<String> for ResolvedValue {
    fn from(s: String) -> Self {
        ResolvedValue(s)
    }
}

impl From<&str> for ResolvedValue {
    fn from(s: &str) -> Self {
        ResolvedValue(s.to_string())
    }
}

impl From<ResolvedValue> for String {
    fn from(value: ResolvedValue) -> Self {
        value.0
    }
}

impl AsRef<str> for ResolvedValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ResolvedValue {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ResolvedValue {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for ResolvedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::IpAddr;

    #[test]
    fn test_as_str_and_display() {
        let value = ResolvedValue::from("two_3.14");
        assert_eq!(value.as_str(), "two_3.14");
        assert_eq!(format!("{}", value), "two_3.14");
        assert_eq!(value, "two_3.14");
    }

    #[test]
    fn test_as_bool_variants() {
        for val in ["true", "True", "YES", "1", "on"] {
            assert!(ResolvedValue::from(val).as_bool().unwrap(), "{}", val);
        }
        for val in ["false", "False", "no", "0", "OFF"] {
            assert!(!ResolvedValue::from(val).as_bool().unwrap(), "{}", val);
        }
        assert!(ResolvedValue::from("maybe").as_bool().is_err());
    }

    #[test]
    fn test_as_i64() {
        assert_eq!(ResolvedValue::from("42").as_i64().unwrap(), 42);
        assert!(ResolvedValue::from("4.2").as_i64().is_err());
    }

    #[test]
    fn test_as_f64_python_renderings() {
        assert_eq!(ResolvedValue::from("9.0").as_f64().unwrap(), 9.0);
        assert_eq!(ResolvedValue::from("1e+16").as_f64().unwrap(), 1e16);
        assert!(ResolvedValue::from("inf").as_f64().unwrap().is_infinite());
        assert!(ResolvedValue::from("nan").as_f64().unwrap().is_nan());
    }

    #[test]
    fn test_parse_custom_type() {
        let ip: IpAddr = ResolvedValue::from("10.0.0.1").parse().unwrap();
        assert_eq!(ip.to_string(), "10.0.0.1");
        let err = ResolvedValue::from("nope").parse::<IpAddr>().unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_into_string() {
        let s: String = ResolvedValue::from("x").into();
        assert_eq!(s, "x");
        assert_eq!(ResolvedValue::new("y".to_string()).into_string(), "y");
    }
}
