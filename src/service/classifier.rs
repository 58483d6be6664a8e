// SPDX-License-Identifier: MIT OR Apache-2.0

//! Maps evaluator failures onto the resolution error taxonomy.

use crate::domain::{EvalError, ResolutionError};

/// Identifies the read a failure belongs to.
#[derive(Clone, Copy, Debug)]
pub struct ResolutionContext<'a> {
    /// Section being read
    pub section: &'a str,
    /// Option being read
    pub option: &'a str,
    /// Raw value as stored
    pub raw_value: &'a str,
}

/// Classifies an evaluator failure.
///
/// | evaluator failure | resolution error |
/// |---|---|
/// | `Syntax` | `Syntax` |
/// | `UndefinedName` | `MissingReference` |
/// | `Runtime` (any kind) | `Runtime` |
pub fn classify(error: EvalError, ctx: &ResolutionContext<'_>) -> ResolutionError {
    let section = ctx.section.to_string();
    let option = ctx.option.to_string();
    let raw_value = ctx.raw_value.to_string();

    match error {
        EvalError::Syntax { message } => ResolutionError::Syntax {
            section,
            option,
            raw_value,
            message,
        },
        EvalError::UndefinedName { name } => ResolutionError::MissingReference {
            section,
            option,
            raw_value,
            reference: name,
        },
        runtime @ EvalError::Runtime { .. } => ResolutionError::Runtime {
            section,
            option,
            raw_value,
            message: runtime.to_string(),
        },
    }
}
