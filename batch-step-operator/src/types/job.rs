use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

/// Remote job lifecycle states as reported by the Batch control plane.
///
/// `Succeeded` and `Failed` are terminal; everything else means the job is
/// still queued, being placed, or running.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum JobStatus {
    /// Accepted by the control plane, not yet evaluated for placement
    Submitted,
    /// Waiting on dependencies or queue capacity
    Pending,
    /// Eligible for placement on a compute environment
    Runnable,
    /// Container resources are being provisioned
    Starting,
    /// The step container is executing
    Running,
    /// Terminal: the container exited with code zero
    Succeeded,
    /// Terminal: non-zero exit, kill signal, or placement failure
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

/// Handle to a submitted Batch job. The authoritative state lives remotely;
/// this is only the identity needed to poll for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteJob {
    pub job_id: String,
    pub job_name: String,
    pub submitted_at: DateTime<Utc>,
}

/// A point-in-time view of a remote job, refreshed on every poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatusRecord {
    pub status: JobStatus,
    pub status_reason: Option<String>,
    pub exit_code: Option<i32>,
}

/// Failure classes surfaced to the pipeline framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum StepFailureKind {
    /// The job ran and terminated unsuccessfully (non-zero exit, OOM kill,
    /// placement failure)
    #[strum(serialize = "RUNTIME_FAILURE")]
    RuntimeFailure,
    /// The job did not reach a terminal state within the configured wait
    /// deadline; the remote job may still be running
    #[strum(serialize = "TIMEOUT")]
    Timeout,
    /// The control plane stopped reporting the job id
    #[strum(serialize = "LOST")]
    Lost,
}

/// Terminal outcome of one step invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Succeeded {
        exit_code: Option<i32>,
    },
    Failed {
        kind: StepFailureKind,
        reason: String,
        exit_code: Option<i32>,
    },
}

/// What the operator hands back to the framework for one step. Always carries
/// the remote job id when one was obtained, so a failed run can be inspected
/// directly on the Batch console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepResult {
    pub job_id: Option<String>,
    pub outcome: StepOutcome,
}

impl StepResult {
    pub fn succeeded(job_id: impl Into<String>, exit_code: Option<i32>) -> Self {
        Self { job_id: Some(job_id.into()), outcome: StepOutcome::Succeeded { exit_code } }
    }

    pub fn failed(
        job_id: Option<String>,
        kind: StepFailureKind,
        reason: impl Into<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self { job_id, outcome: StepOutcome::Failed { kind, reason: reason.into(), exit_code } }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, StepOutcome::Succeeded { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_exactly_two_statuses_are_terminal() {
        let terminal: Vec<JobStatus> =
            JobStatus::iter().filter(JobStatus::is_terminal).collect();
        assert_eq!(terminal, vec![JobStatus::Succeeded, JobStatus::Failed]);
    }

    #[test]
    fn test_failure_kinds_display_as_stable_tags() {
        assert_eq!(StepFailureKind::RuntimeFailure.to_string(), "RUNTIME_FAILURE");
        assert_eq!(StepFailureKind::Timeout.to_string(), "TIMEOUT");
        assert_eq!(StepFailureKind::Lost.to_string(), "LOST");
    }
}
