use thiserror::Error;

use crate::core::client::batch::BatchClientError;

/// Result type for step operator operations
pub type OperatorResult<T> = Result<T, OperatorError>;

/// Error types for the step operator.
///
/// Terminal job outcomes (runtime failure, timeout, lost job) are not errors:
/// they are reported through [`crate::types::job::StepResult`], since a failed
/// pipeline step is an expected outcome the calling framework must handle.
#[derive(Error, Debug)]
pub enum OperatorError {
    /// The step's job specification violates a locally checkable constraint.
    /// Raised before any control-plane call.
    #[error("Invalid job specification: {0}")]
    InvalidSpecification(String),

    /// The job's resource requests conflict with the capabilities of the
    /// backend behind the target job queue.
    #[error("Backend capability mismatch: {0}")]
    BackendCapabilityMismatch(String),

    /// Registration-time configuration is missing or malformed.
    #[error("Invalid operator configuration: {0}")]
    InvalidConfiguration(String),

    /// The submit-time control-plane call failed. Not retried at this layer:
    /// the caller decides whether re-running the whole step is safe.
    #[error("Job submission failed: {0}")]
    Submission(#[source] BatchClientError),

    /// Control-plane failure after submission, while polling.
    #[error("Batch client error: {0}")]
    Client(#[from] BatchClientError),
}
