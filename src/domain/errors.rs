// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the interpolation crate.
//!
//! There are three layers of errors:
//!
//! - [`EvalError`]: what an expression evaluator reports for a single evaluation.
//! - [`ResolutionError`] and [`ValidationError`]: what the interpolation entry points
//!   report, classified and tagged with the section, option and raw value involved.
//! - [`ConfigError`]: what the in-memory store reports to its callers.
//!
//! All errors use `thiserror` for proper error handling and conversion.

use std::fmt;
use thiserror::Error;

/// The kind of a runtime failure raised while evaluating an expression.
///
/// The names follow the exception classes of the expression language so that
/// messages read the same way users of f-strings are used to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum RuntimeErrorKind {
    /// An operation was applied to a value of the wrong type.
    TypeError,
    /// An operation received a value of the right type but an invalid content.
    ValueError,
    /// Division or modulo by zero.
    ZeroDivisionError,
    /// A sequence index was out of range.
    IndexError,
    /// A method does not exist on the receiver.
    AttributeError,
    /// A numeric result does not fit the value representation.
    OverflowError,
}

impl fmt::Display for RuntimeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RuntimeErrorKind::TypeError => "TypeError",
            RuntimeErrorKind::ValueError => "ValueError",
            RuntimeErrorKind::ZeroDivisionError => "ZeroDivisionError",
            RuntimeErrorKind::IndexError => "IndexError",
            RuntimeErrorKind::AttributeError => "AttributeError",
            RuntimeErrorKind::OverflowError => "OverflowError",
        };
        f.write_str(name)
    }
}

/// A failure reported by an expression evaluator.
///
/// These are the three failure categories every
/// [`ExpressionEvaluator`](crate::ports::ExpressionEvaluator) maps its errors into.
#[derive(Clone, Debug, PartialEq, Error)]
#[non_exhaustive]
pub enum EvalError {
    /// The template or one of its expressions is malformed.
    #[error("{message}")]
    Syntax {
        /// Description of the syntax problem
        message: String,
    },

    /// An expression referenced a name that is not in scope.
    #[error("name '{name}' is not defined")]
    UndefinedName {
        /// The name that could not be resolved
        name: String,
    },

    /// The expression is well formed but failed while being evaluated.
    #[error("{kind}: {message}")]
    Runtime {
        /// The failure kind
        kind: RuntimeErrorKind,
        /// The error message
        message: String,
    },
}

impl EvalError {
    /// Creates a syntax error.
    pub fn syntax(message: impl Into<String>) -> Self {
        EvalError::Syntax {
            message: message.into(),
        }
    }

    /// Creates a runtime error of the given kind.
    pub fn runtime(kind: RuntimeErrorKind, message: impl Into<String>) -> Self {
        EvalError::Runtime {
            kind,
            message: message.into(),
        }
    }

    /// Shorthand for a `TypeError` runtime failure.
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::runtime(RuntimeErrorKind::TypeError, message)
    }

    /// Shorthand for a `ValueError` runtime failure.
    pub fn value_error(message: impl Into<String>) -> Self {
        Self::runtime(RuntimeErrorKind::ValueError, message)
    }

    /// Returns `true` if this is a syntax error.
    pub fn is_syntax(&self) -> bool {
        matches!(self, EvalError::Syntax { .. })
    }
}

/// A failure to resolve a configuration value.
///
/// Every variant carries the section and option being read and the original raw
/// value as stored, never a partially resolved intermediate.
#[derive(Clone, Debug, PartialEq, Error)]
#[non_exhaustive]
pub enum ResolutionError {
    /// The raw value contains a malformed expression.
    #[error("bad interpolation syntax for option '{option}' in section '{section}': {message}; raw value: {raw_value:?}")]
    Syntax {
        /// Section of the option being read
        section: String,
        /// The option being read
        option: String,
        /// The raw value as stored
        raw_value: String,
        /// The evaluator's syntax message
        message: String,
    },

    /// An expression references a name that is neither in the section nor in the defaults.
    #[error("bad value substitution: option '{option}' in section '{section}' references '{reference}', which is not a valid option name; raw value: {raw_value:?}")]
    MissingReference {
        /// Section of the option being read
        section: String,
        /// The option being read
        option: String,
        /// The raw value as stored
        raw_value: String,
        /// The missing name
        reference: String,
    },

    /// The value did not reach a fixed point within the allowed number of steps.
    #[error("recursion limit exceeded in value substitution: option '{option}' in section '{section}' cannot be resolved in {max_depth} steps; raw value: {raw_value:?}")]
    DepthExceeded {
        /// Section of the option being read
        section: String,
        /// The option being read
        option: String,
        /// The raw value as stored
        raw_value: String,
        /// The depth limit that was exceeded
        max_depth: usize,
    },

    /// An expression raised a type or value error while being evaluated.
    #[error("interpolation of option '{option}' in section '{section}' failed: {message}")]
    Runtime {
        /// Section of the option being read
        section: String,
        /// The option being read
        option: String,
        /// The raw value as stored
        raw_value: String,
        /// The runtime error message
        message: String,
    },
}

impl ResolutionError {
    /// The section of the option whose value failed to resolve.
    pub fn section(&self) -> &str {
        match self {
            ResolutionError::Syntax { section, .. }
            | ResolutionError::MissingReference { section, .. }
            | ResolutionError::DepthExceeded { section, .. }
            | ResolutionError::Runtime { section, .. } => section,
        }
    }

    /// The option whose value failed to resolve.
    pub fn option(&self) -> &str {
        match self {
            ResolutionError::Syntax { option, .. }
            | ResolutionError::MissingReference { option, .. }
            | ResolutionError::DepthExceeded { option, .. }
            | ResolutionError::Runtime { option, .. } => option,
        }
    }

    /// The raw value as it was stored.
    pub fn raw_value(&self) -> &str {
        match self {
            ResolutionError::Syntax { raw_value, .. }
            | ResolutionError::MissingReference { raw_value, .. }
            | ResolutionError::DepthExceeded { raw_value, .. }
            | ResolutionError::Runtime { raw_value, .. } => raw_value,
        }
    }
}

/// A raw value was rejected on the write path.
#[derive(Clone, Debug, PartialEq, Error)]
#[non_exhaustive]
pub enum ValidationError {
    /// The value contains a malformed expression.
    #[error("invalid f-expression {value:?}: {message}")]
    InvalidExpression {
        /// The rejected raw value
        value: String,
        /// The evaluator's syntax message
        message: String,
    },
}

/// Errors reported by the in-memory configuration store.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The requested section does not exist.
    #[error("No section: '{section}'")]
    NoSection {
        /// The missing section
        section: String,
    },

    /// The requested option exists neither in the section nor in the defaults.
    #[error("No option '{option}' in section: '{section}'")]
    NoOption {
        /// The section that was searched
        section: String,
        /// The missing option
        option: String,
    },

    /// A section with the same name already exists.
    #[error("Section '{section}' already exists")]
    DuplicateSection {
        /// The duplicated section
        section: String,
    },

    /// The section name is reserved.
    #[error("Invalid section name: '{section}'")]
    InvalidSectionName {
        /// The rejected section name
        section: String,
    },

    /// Reading a value failed during interpolation.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// Writing a value failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Failed to parse interpolation settings.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// The error message
        message: String,
        /// The underlying parsing error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// A specialized Result type for store operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn missing() -> ResolutionError {
        ResolutionError::MissingReference {
            section: "shortfloat".to_string(),
            option: "title".to_string(),
            raw_value: "{a} is {b}".to_string(),
            reference: "b".to_string(),
        }
    }

    #[test]
    fn test_eval_error_display() {
        let error = EvalError::UndefinedName {
            name: "b".to_string(),
        };
        assert_eq!(error.to_string(), "name 'b' is not defined");

        let error = EvalError::type_error("unsupported operand type(s) for /: 'str' and 'int'");
        assert_eq!(
            error.to_string(),
            "TypeError: unsupported operand type(s) for /: 'str' and 'int'"
        );
    }

    #[test]
    fn test_eval_error_is_syntax() {
        assert!(EvalError::syntax("f-string: expecting '}'").is_syntax());
        assert!(!EvalError::value_error("bad").is_syntax());
    }

    #[test]
    fn test_resolution_error_accessors() {
        let error = missing();
        assert_eq!(error.section(), "shortfloat");
        assert_eq!(error.option(), "title");
        assert_eq!(error.raw_value(), "{a} is {b}");
    }

    #[test]
    fn test_missing_reference_display_names_reference() {
        let message = missing().to_string();
        assert!(message.contains("'b'"));
        assert!(message.contains("shortfloat"));
    }

    #[test]
    fn test_depth_exceeded_display() {
        let error = ResolutionError::DepthExceeded {
            section: "s".to_string(),
            option: "o".to_string(),
            raw_value: "{o}".to_string(),
            max_depth: 10,
        };
        assert!(error.to_string().contains("10 steps"));
    }

    #[test]
    fn test_validation_error_display() {
        let error = ValidationError::InvalidExpression {
            value: "{".to_string(),
            message: "f-string: expecting '}'".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "invalid f-expression \"{\": f-string: expecting '}'"
        );
    }

    #[test]
    fn test_config_error_from_resolution() {
        let error = ConfigError::from(missing());
        assert!(matches!(error, ConfigError::Resolution(_)));
        assert_eq!(error.to_string(), missing().to_string());
    }

    #[test]
    fn test_no_option_display() {
        let error = ConfigError::NoOption {
            section: "more".to_string(),
            option: "c".to_string(),
        };
        assert_eq!(error.to_string(), "No option 'c' in section: 'more'");
    }
}
