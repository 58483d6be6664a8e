// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain layer containing core types.
//!
//! This module contains the types shared by every layer: the name scope an
//! expression is evaluated against, the resolved value, interpolation settings
//! and the error taxonomy.

pub mod errors;
pub mod options;
pub mod resolved_value;
pub mod scope;

// Re-export commonly used types
pub use errors::{
    ConfigError, EvalError, ResolutionError, Result, RuntimeErrorKind, ValidationError,
};
pub use options::{InterpolationOptions, MAX_INTERPOLATION_DEPTH};
pub use resolved_value::{ConversionError, ResolvedValue};
pub use scope::Scope;
