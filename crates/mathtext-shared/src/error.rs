//! Error types for the evaluation core.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NluError {
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Returned by `Matcher` implementations outside this crate.
    #[error("Matcher {stage} failed: {reason}")]
    Matcher { stage: &'static str, reason: String },
}

impl NluError {
    pub fn code(&self) -> i32 {
        match self {
            NluError::InvalidPattern(_) => -32010,
            NluError::Matcher { .. } => -32012,
        }
    }

    /// Shorthand for a matcher-local failure.
    pub fn matcher(stage: &'static str, reason: impl Into<String>) -> Self {
        NluError::Matcher {
            stage,
            reason: reason.into(),
        }
    }
}
