//! Pipeline error taxonomy

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Every way a pipeline run can fail
///
/// A failed run report carries exactly one of these kinds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// The trigger object never appeared within the watch timeout
    #[error("Trigger object {object} did not appear within {timeout_secs}s")]
    TriggerTimeout { object: String, timeout_secs: u64 },

    /// The batch service refused the job specification
    #[error("Batch submission rejected: {0}")]
    SubmissionRejected(String),

    /// The job was accepted but ended in a non-successful terminal state
    #[error("Batch {batch_id} ended in state {state}: {message}")]
    JobExecutionFailed {
        batch_id: String,
        state: String,
        message: String,
    },

    /// A batch with the same identifier already exists
    #[error("Batch identifier already in use: {0}")]
    DuplicateBatchId(String),

    /// A required configuration variable is absent and has no default
    #[error("Required configuration variable missing: {0}")]
    ConfigurationMissing(String),

    /// A configuration variable is present but unusable
    #[error("Invalid configuration variable {key}: {reason}")]
    ConfigurationInvalid { key: String, reason: String },

    /// An external service could not be reached or answered with a server error
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The run was cancelled externally
    #[error("Pipeline run cancelled")]
    Cancelled,
}

impl PipelineError {
    /// Create an invalid configuration error
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigurationInvalid {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Whether a failed stage may be attempted again under the retry policy
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::ConfigurationMissing(_) | Self::ConfigurationInvalid { .. } | Self::Cancelled
        )
    }
}
