// SPDX-License-Identifier: MIT OR Apache-2.0

//! Expression interpolation for sectioned configuration values.
//!
//! A configuration value may be written as an f-string template. When the value
//! is read, every replacement field is evaluated as an expression against the
//! other options visible from the same section, and the result is evaluated again
//! until it stops changing:
//!
//! ```text
//! [DEFAULT]
//! a = 3.1415926535897932384626433832795
//!
//! [fstring]
//! b = two_{a}                  ; two_3.1415926535897932384626433832795
//! c = three_{b}                ; three_two_3.1415926535897932384626433832795
//! half = {float(a) / 2:.3f}    ; 1.571
//! ```
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain Layer**: Core types (`Scope`, `ResolvedValue`, `InterpolationOptions`, errors)
//! - **Ports**: Trait definitions that define interfaces (`Interpolation`, `ExpressionEvaluator`)
//! - **Adapters**: The f-string evaluator, a no-op interpolation and an in-memory store
//! - **Service**: The interpolation engine that drives an evaluator to a fixed point
//!
//! # Features
//!
//! - **Expressions**: Arithmetic, comparisons, conditionals, comprehensions, builtins
//!   and string methods inside `{...}`
//! - **Format Specs**: The full format-spec mini-language, conversions and `{expr=}`
//! - **Recursive Resolution**: Values are re-evaluated until a fixed point or a depth limit
//! - **Classified Errors**: Syntax, missing reference, depth and runtime failures carry
//!   the section, option and raw value involved
//! - **Extensible**: Plug in another evaluator or another interpolation via the port traits
//!
//! # Feature Flags
//!
//! - `yaml`: Load [`InterpolationOptions`](domain::InterpolationOptions) from YAML (default)
//!
//! # Quick Start
//!
//! ```rust
//! use interpcfg::prelude::*;
//!
//! # fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let mut config = SectionedConfig::default();
//! config.set("DEFAULT", "a", "3.1415926535897932384626433832795")?;
//! config.add_section("fstring")?;
//! config.set("fstring", "half", "{float(a) / 2:.3f}")?;
//!
//! assert_eq!(config.get("fstring", "half")?.as_f64()?, 1.571);
//! # Ok(())
//! # }
//! ```
//!
//! Using the interpolation directly against a scope:
//!
//! ```rust
//! use interpcfg::prelude::*;
//!
//! let interpolation = FStringInterpolation::new();
//! let scope: Scope = [("a", "1"), ("b", "{a}+{a}")].into_iter().collect();
//!
//! let value = interpolation.resolve("{b}={int(a) * 2}", "s", "o", &scope).unwrap();
//! assert_eq!(value, "1+1=2");
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

/// Commonly used types and traits.
///
/// This module re-exports the most commonly used types and traits for convenient access.
pub mod prelude {
    pub use crate::adapters::{FStringEvaluator, NoInterpolation, SectionedConfig};
    pub use crate::domain::{ConfigError, InterpolationOptions, ResolvedValue, Result, Scope};
    pub use crate::ports::{ExpressionEvaluator, Interpolation};
    pub use crate::service::FStringInterpolation;
}
