//! Job failure classification.

use std::time::Duration;

use thiserror::Error;

use replan_core::DomainError;

/// Why a job attempt ended without a result.
///
/// Retryable errors re-enter the queue after backoff while retries remain;
/// terminal errors fail the job immediately.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum JobError {
    /// The attempt exceeded its wall-clock budget. Retryable.
    #[error("job timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    /// The attempt itself failed; `retryable` carries the classification.
    #[error("job execution failed: {message}")]
    Execution { message: String, retryable: bool },

    /// The cancellation flag was observed between stages. Terminal, but maps
    /// to Cancelled rather than Failed.
    #[error("job cancelled")]
    Cancelled,
}

impl JobError {
    pub fn execution(message: impl Into<String>, retryable: bool) -> Self {
        Self::Execution {
            message: message.into(),
            retryable,
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            JobError::Timeout { .. } => true,
            JobError::Execution { retryable, .. } => *retryable,
            JobError::Cancelled => false,
        }
    }
}

impl From<DomainError> for JobError {
    /// Domain errors are deterministic functions of the payload; retrying the
    /// same input cannot succeed.
    fn from(error: DomainError) -> Self {
        Self::Execution {
            message: error.to_string(),
            retryable: false,
        }
    }
}
