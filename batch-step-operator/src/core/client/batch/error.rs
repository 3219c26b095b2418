use aws_sdk_batch::error::SdkError;
use aws_sdk_batch::operation::describe_jobs::DescribeJobsError;
use aws_sdk_batch::operation::register_job_definition::RegisterJobDefinitionError;
use aws_sdk_batch::operation::submit_job::SubmitJobError;
use aws_sdk_batch::operation::terminate_job::TerminateJobError;
use thiserror::Error;

/// Error types for the Batch control-plane client
#[derive(Error, Debug)]
pub enum BatchClientError {
    #[error("Failed to register job definition: {0}")]
    RegisterJobDefinition(#[from] SdkError<RegisterJobDefinitionError>),

    #[error("Failed to submit job: {0}")]
    SubmitJob(#[from] SdkError<SubmitJobError>),

    #[error("Failed to describe jobs: {0}")]
    DescribeJobs(#[from] SdkError<DescribeJobsError>),

    #[error("Failed to terminate job: {0}")]
    TerminateJob(#[from] SdkError<TerminateJobError>),

    #[error("Failed to build Batch request: {0}")]
    RequestBuild(String),

    #[error("Batch response missing field `{0}`")]
    MissingResponseField(&'static str),
}
