use thiserror::Error;

/// Run-level failures
///
/// Only these abort a grading run. Everything that goes wrong after the
/// first dispatch attempt is recorded as a failing test result instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GradingError {
    /// Missing or malformed run parameters, rejected before any dispatch
    #[error("{0}")]
    Validation(String),
    /// The executable program could not be assembled
    #[error("failed to prepare submission: {0}")]
    Preparation(String),
}

impl GradingError {
    pub fn validation(message: impl Into<String>) -> Self {
        GradingError::Validation(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, GradingError::Validation(_))
    }
}
