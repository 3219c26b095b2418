//! Blocking poll loop over the remote job lifecycle.
//!
//! The backend exposes no push notification in this integration, so the
//! monitor re-fetches the job state at a fixed interval until a terminal
//! state or the wait deadline. The poll interval trades responsiveness
//! against control-plane rate limits.

use async_trait::async_trait;
use std::time::{Duration, Instant};

use crate::core::client::batch::BatchClient;
use crate::error::OperatorResult;
use crate::types::job::{JobStatus, RemoteJob, StepFailureKind, StepResult};

/// Clock and sleep boundary of the poll loop, injectable so tests can drive
/// the state machine on a fake timeline.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    async fn sleep(&self, duration: Duration);
}

/// Real time.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Blocks a step invocation until its remote job reaches a terminal state or
/// the wait deadline passes.
#[derive(Debug, Clone, Copy)]
pub struct LifecycleMonitor {
    poll_interval: Duration,
    timeout: Duration,
    cancel_on_timeout: bool,
}

impl LifecycleMonitor {
    pub fn new(poll_interval: Duration, timeout: Duration) -> Self {
        Self { poll_interval, timeout, cancel_on_timeout: false }
    }

    pub fn with_cancel_on_timeout(mut self, cancel_on_timeout: bool) -> Self {
        self.cancel_on_timeout = cancel_on_timeout;
        self
    }

    /// Poll until terminal. The remote state is re-fetched on every
    /// iteration, so no decision is made on a view older than one poll
    /// interval.
    pub async fn wait(
        &self,
        client: &dyn BatchClient,
        clock: &dyn Clock,
        job: &RemoteJob,
    ) -> OperatorResult<StepResult> {
        let deadline = clock.now() + self.timeout;
        let mut last_status: Option<JobStatus> = None;

        loop {
            if clock.now() >= deadline {
                return self.on_deadline_exceeded(client, job).await;
            }

            let Some(record) = client.describe_job(&job.job_id).await? else {
                // An unknown id means the control plane dropped the job
                // (backend-side GC or misconfiguration). Resubmitting could
                // duplicate the job's side effects, so this terminates the
                // step instead.
                tracing::error!(job_id = %job.job_id, "Batch control plane no longer knows the job");
                return Ok(StepResult::failed(
                    Some(job.job_id.clone()),
                    StepFailureKind::Lost,
                    "job id is no longer known to the Batch control plane",
                    None,
                ));
            };

            if last_status != Some(record.status) {
                tracing::info!(job_id = %job.job_id, status = %record.status, "Job status changed");
                last_status = Some(record.status);
            }

            match record.status {
                JobStatus::Succeeded => {
                    tracing::info!(job_id = %job.job_id, "Job completed successfully");
                    return Ok(StepResult::succeeded(job.job_id.clone(), record.exit_code));
                }
                JobStatus::Failed => {
                    let reason =
                        record.status_reason.unwrap_or_else(|| "Unknown".to_string());
                    tracing::error!(
                        job_id = %job.job_id,
                        exit_code = ?record.exit_code,
                        reason = %reason,
                        "Job failed"
                    );
                    return Ok(StepResult::failed(
                        Some(job.job_id.clone()),
                        StepFailureKind::RuntimeFailure,
                        reason,
                        record.exit_code,
                    ));
                }
                status => {
                    tracing::debug!(job_id = %job.job_id, status = %status, "Job not terminal yet");
                }
            }

            clock.sleep(self.poll_interval).await;
        }
    }

    async fn on_deadline_exceeded(
        &self,
        client: &dyn BatchClient,
        job: &RemoteJob,
    ) -> OperatorResult<StepResult> {
        if self.cancel_on_timeout {
            // Best effort only; the job may already be terminal remotely.
            if let Err(error) =
                client.terminate_job(&job.job_id, "Step operator wait deadline exceeded").await
            {
                tracing::warn!(job_id = %job.job_id, error = %error, "Failed to terminate timed-out job");
            }
        } else {
            tracing::warn!(
                job_id = %job.job_id,
                "Wait deadline exceeded; the remote job keeps running and must be stopped manually"
            );
        }

        Ok(StepResult::failed(
            Some(job.job_id.clone()),
            StepFailureKind::Timeout,
            format!("job did not reach a terminal state within {}s", self.timeout.as_secs()),
            None,
        ))
    }
}
