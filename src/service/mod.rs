// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service layer containing the interpolation engine.
//!
//! This module wraps raw values for evaluation, drives evaluation to a fixed
//! point, and classifies evaluator failures into resolution errors.

pub mod classifier;
pub mod interpolator;
pub mod wrapper;

// Re-export commonly used types
pub use classifier::{classify, ResolutionContext};
pub use interpolator::{FStringInterpolation, InterpolationBuilder};
pub use wrapper::{wrap, WrappedTemplate, RESERVED_DELIMITER};
