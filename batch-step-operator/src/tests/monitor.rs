use std::time::Duration;

use assert_matches::assert_matches;

use crate::core::client::batch::MockBatchClient;
use crate::operator::monitor::LifecycleMonitor;
use crate::tests::common::{
    failed_record, record, script_describe, succeeded_record, test_remote_job, FakeClock,
};
use crate::types::job::{JobStatus, StepFailureKind, StepOutcome};

#[tokio::test]
async fn test_scripted_transitions_to_success() {
    let mut client = MockBatchClient::new();
    script_describe(
        &mut client,
        vec![
            Some(record(JobStatus::Runnable)),
            Some(record(JobStatus::Starting)),
            Some(record(JobStatus::Running)),
            Some(succeeded_record(0)),
        ],
    );
    let clock = FakeClock::new();

    let monitor = LifecycleMonitor::new(Duration::from_secs(5), Duration::from_secs(300));
    let result =
        monitor.wait(&client, &clock, &test_remote_job("job-0001")).await.unwrap();

    assert!(result.is_success());
    assert_eq!(result.job_id.as_deref(), Some("job-0001"));
    assert_matches!(result.outcome, StepOutcome::Succeeded { exit_code: Some(0) });
}

#[tokio::test]
async fn test_runtime_failure_preserves_exit_code_and_reason() {
    let mut client = MockBatchClient::new();
    script_describe(
        &mut client,
        vec![
            Some(record(JobStatus::Running)),
            Some(failed_record(137, "OutOfMemoryError: Container killed due to memory usage")),
        ],
    );
    let clock = FakeClock::new();

    let monitor = LifecycleMonitor::new(Duration::from_secs(5), Duration::from_secs(300));
    let result =
        monitor.wait(&client, &clock, &test_remote_job("job-0002")).await.unwrap();

    assert_matches!(
        result.outcome,
        StepOutcome::Failed {
            kind: StepFailureKind::RuntimeFailure,
            ref reason,
            exit_code: Some(137),
        } if reason.contains("OutOfMemoryError")
    );
}

#[tokio::test]
async fn test_timeout_without_cancellation() {
    let mut client = MockBatchClient::new();
    // Four polls fit before the 35s deadline at a 10s interval; the job never
    // goes terminal. No terminate expectation is set: any cancellation call
    // would panic the mock.
    client
        .expect_describe_job()
        .times(4)
        .returning(|_| Ok(Some(record(JobStatus::Running))));
    let clock = FakeClock::new();

    let monitor = LifecycleMonitor::new(Duration::from_secs(10), Duration::from_secs(35));
    let result =
        monitor.wait(&client, &clock, &test_remote_job("job-0003")).await.unwrap();

    assert_matches!(
        result.outcome,
        StepOutcome::Failed { kind: StepFailureKind::Timeout, .. }
    );
    assert_eq!(result.job_id.as_deref(), Some("job-0003"));
    assert_eq!(clock.elapsed(), Duration::from_secs(40));
}

#[tokio::test]
async fn test_opt_in_cancellation_on_timeout() {
    let mut client = MockBatchClient::new();
    client
        .expect_describe_job()
        .times(1)
        .returning(|_| Ok(Some(record(JobStatus::Running))));
    client
        .expect_terminate_job()
        .times(1)
        .withf(|job_id, _| job_id == "job-0004")
        .returning(|_, _| Ok(()));
    let clock = FakeClock::new();

    let monitor = LifecycleMonitor::new(Duration::from_secs(10), Duration::from_secs(5))
        .with_cancel_on_timeout(true);
    let result =
        monitor.wait(&client, &clock, &test_remote_job("job-0004")).await.unwrap();

    assert_matches!(
        result.outcome,
        StepOutcome::Failed { kind: StepFailureKind::Timeout, .. }
    );
}

#[tokio::test]
async fn test_lost_job_is_terminal_and_never_resubmitted() {
    let mut client = MockBatchClient::new();
    script_describe(&mut client, vec![Some(record(JobStatus::Runnable)), None]);
    // No submit expectation: a resubmission attempt would panic the mock.
    let clock = FakeClock::new();

    let monitor = LifecycleMonitor::new(Duration::from_secs(5), Duration::from_secs(300));
    let result =
        monitor.wait(&client, &clock, &test_remote_job("job-0005")).await.unwrap();

    assert_matches!(
        result.outcome,
        StepOutcome::Failed { kind: StepFailureKind::Lost, .. }
    );
    assert_eq!(result.job_id.as_deref(), Some("job-0005"));
}

#[tokio::test]
async fn test_unknown_status_does_not_terminate_the_wait() {
    // Pending stands in for any non-terminal state, including ones a newer
    // control plane might add.
    let mut client = MockBatchClient::new();
    script_describe(
        &mut client,
        vec![Some(record(JobStatus::Pending)), Some(succeeded_record(0))],
    );
    let clock = FakeClock::new();

    let monitor = LifecycleMonitor::new(Duration::from_secs(5), Duration::from_secs(300));
    let result =
        monitor.wait(&client, &clock, &test_remote_job("job-0006")).await.unwrap();
    assert!(result.is_success());
}
