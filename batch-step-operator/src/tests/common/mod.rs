//! Shared fixtures for the operator test suite.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::config::{BatchStepOperatorConfig, BatchStepOperatorSettings};
use crate::core::client::batch::MockBatchClient;
use crate::operator::monitor::Clock;
use crate::types::context::{ResourceSettings, StepExecutionContext};
use crate::types::job::{JobStatus, JobStatusRecord, RemoteJob};
use crate::types::params::ComputeBackend;

pub const EC2_QUEUE: &str = "zenml-test-ec2-job-queue";
pub const FARGATE_QUEUE: &str = "zenml-test-fargate-job-queue";

pub fn test_context() -> StepExecutionContext {
    StepExecutionContext {
        pipeline_run_id: "d5f2a9c4-run-0001".to_string(),
        pipeline_name: "training-pipeline".to_string(),
        step_name: "evaluate".to_string(),
        image_uri: "123456789012.dkr.ecr.eu-west-1.amazonaws.com/pipelines:latest".to_string(),
        command: vec!["python".to_string(), "-m".to_string(), "pipelines.entrypoint".to_string()],
        environment: BTreeMap::from([("PIPELINE_STEP".to_string(), "evaluate".to_string())]),
        resources: ResourceSettings {
            cpu_count: Some(1.0),
            memory_mib: Some(2048),
            gpu_count: None,
        },
    }
}

pub fn test_config() -> BatchStepOperatorConfig {
    BatchStepOperatorConfig {
        execution_role_arn: "arn:aws:iam::123456789012:role/batch-execution-role".to_string(),
        job_role_arn: "arn:aws:iam::123456789012:role/batch-job-role".to_string(),
        default_job_queue_name: FARGATE_QUEUE.to_string(),
        backend: ComputeBackend::Fargate,
        region: None,
        queue_backends: BTreeMap::from([
            (EC2_QUEUE.to_string(), ComputeBackend::Ec2),
            (FARGATE_QUEUE.to_string(), ComputeBackend::Fargate),
        ]),
        default_resources: ResourceSettings::default(),
    }
}

pub fn test_settings() -> BatchStepOperatorSettings {
    BatchStepOperatorSettings::default()
}

pub fn test_remote_job(job_id: &str) -> RemoteJob {
    RemoteJob {
        job_id: job_id.to_string(),
        job_name: "training-pipeline-evaluate-run-0001".to_string(),
        submitted_at: chrono::Utc::now(),
    }
}

pub fn record(status: JobStatus) -> JobStatusRecord {
    JobStatusRecord { status, status_reason: None, exit_code: None }
}

pub fn failed_record(exit_code: i32, reason: &str) -> JobStatusRecord {
    JobStatusRecord {
        status: JobStatus::Failed,
        status_reason: Some(reason.to_string()),
        exit_code: Some(exit_code),
    }
}

pub fn succeeded_record(exit_code: i32) -> JobStatusRecord {
    JobStatusRecord {
        status: JobStatus::Succeeded,
        status_reason: None,
        exit_code: Some(exit_code),
    }
}

/// Script the mock's describe responses, consumed in order; panics if the
/// monitor polls more often than the script allows.
pub fn script_describe(mock: &mut MockBatchClient, responses: Vec<Option<JobStatusRecord>>) {
    let count = responses.len();
    let responses = Arc::new(Mutex::new(VecDeque::from(responses)));
    mock.expect_describe_job().times(count).returning(move |_| {
        Ok(responses.lock().unwrap().pop_front().expect("no scripted response left"))
    });
}

/// Deterministic clock: `sleep` advances the timeline without waiting.
pub struct FakeClock {
    start: Instant,
    elapsed: Mutex<Duration>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self { start: Instant::now(), elapsed: Mutex::new(Duration::ZERO) }
    }

    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock().unwrap()
    }
}

#[async_trait]
impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.start + *self.elapsed.lock().unwrap()
    }

    async fn sleep(&self, duration: Duration) {
        *self.elapsed.lock().unwrap() += duration;
    }
}
