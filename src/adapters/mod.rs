// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapters layer containing the concrete evaluator and store implementations.
//!
//! This module contains the f-string expression evaluator plugged into the
//! interpolation engine, an interpolation that performs no substitution, and the
//! in-memory sectioned store that calls an interpolation on every read and write.

pub mod fstring;
pub mod memory;
pub mod none;

// Re-export commonly used types
pub use fstring::FStringEvaluator;
pub use memory::{SectionedConfig, DEFAULT_SECTION};
pub use none::NoInterpolation;
