pub mod aws;
pub mod error;

use async_trait::async_trait;

pub use error::BatchClientError;

use crate::types::job::{JobStatusRecord, RemoteJob};
use crate::types::spec::JobDefinition;

/// Trait over the Batch control-plane operations the step operator needs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BatchClient: Send + Sync {
    /// Register a fresh revision of the job definition and return its ARN.
    async fn register_job_definition(
        &self,
        definition: &JobDefinition,
    ) -> Result<String, BatchClientError>;

    /// Submit a job against a previously registered definition.
    ///
    /// One call, at most one submission attempt: a duplicate batch job is
    /// worse than a visible failure, so no retry happens at this layer.
    async fn submit_job(
        &self,
        job_name: &str,
        job_queue: &str,
        job_definition_arn: &str,
    ) -> Result<RemoteJob, BatchClientError>;

    /// Fetch the current status record, or `None` when the control plane no
    /// longer knows the job id.
    async fn describe_job(&self, job_id: &str) -> Result<Option<JobStatusRecord>, BatchClientError>;

    /// Best-effort termination of a running job.
    async fn terminate_job(&self, job_id: &str, reason: &str) -> Result<(), BatchClientError>;
}
