// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ports layer containing trait definitions.
//!
//! This module contains the trait definitions (ports) that connect the
//! interpolation engine to its collaborators: the expression evaluator it drives
//! and the configuration store that drives it.

pub mod evaluator;
pub mod interpolation;

// Re-export commonly used types
pub use evaluator::ExpressionEvaluator;
pub use interpolation::Interpolation;
