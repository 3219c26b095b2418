pub mod builder;
pub mod monitor;
pub mod resolver;

use std::sync::Arc;
use std::time::Duration;

use crate::config::{BatchStepOperatorConfig, BatchStepOperatorSettings};
use crate::core::client::batch::aws::AwsBatch;
use crate::core::client::batch::BatchClient;
use crate::error::{OperatorError, OperatorResult};
use crate::types::context::StepExecutionContext;
use crate::types::job::StepResult;
use monitor::{Clock, LifecycleMonitor, TokioClock};

/// Step operator that runs one pipeline step per invocation as an AWS Batch
/// job and blocks until the job terminates.
///
/// Invocations share nothing mutable: each call builds its own definition,
/// handle and poll loop, so the framework may run steps concurrently by
/// invoking this operator once per step.
pub struct AwsBatchStepOperator {
    config: BatchStepOperatorConfig,
    client: Arc<dyn BatchClient>,
    clock: Arc<dyn Clock>,
}

impl AwsBatchStepOperator {
    /// Build an operator from validated registration config, constructing the
    /// SDK client from the ambient credential chain.
    pub async fn from_config(config: BatchStepOperatorConfig) -> OperatorResult<Self> {
        config.validate()?;
        let sdk_config = config.sdk_config().await;
        Ok(Self::with_client(config, Arc::new(AwsBatch::new(&sdk_config))))
    }

    /// Operator over an explicit client, for frameworks that manage their own
    /// AWS session and for tests.
    pub fn with_client(config: BatchStepOperatorConfig, client: Arc<dyn BatchClient>) -> Self {
        Self { config, client, clock: Arc::new(TokioClock) }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &BatchStepOperatorConfig {
        &self.config
    }

    /// Run one pipeline step as a Batch job.
    ///
    /// Pre-submission validation errors abort with no remote side effect.
    /// Post-submission outcomes, including remote failure, timeout and a lost
    /// job, are returned as a [`StepResult`] and never retried here.
    #[tracing::instrument(
        skip(self, context, settings),
        fields(pipeline = %context.pipeline_name, step = %context.step_name)
    )]
    pub async fn launch(
        &self,
        context: &StepExecutionContext,
        settings: &BatchStepOperatorSettings,
    ) -> OperatorResult<StepResult> {
        settings.validate()?;

        let definition = builder::build_job_definition(context, settings, &self.config)?;

        let backend = settings.backend.unwrap_or(self.config.backend);
        let queue_name =
            settings.job_queue_name.as_deref().unwrap_or(&self.config.default_job_queue_name);
        let queue_backend = self.config.backend_for_queue(queue_name).unwrap_or(backend);
        let descriptor = resolver::resolve(queue_name, queue_backend, &definition)?;

        tracing::debug!(
            job_definition_name = %definition.job_definition_name,
            queue = %descriptor.queue_name,
            backend = %descriptor.backend,
            "Built job definition"
        );

        let definition_arn = self
            .client
            .register_job_definition(&definition)
            .await
            .map_err(OperatorError::Submission)?;
        let job = self
            .client
            .submit_job(&definition.job_definition_name, &descriptor.queue_name, &definition_arn)
            .await
            .map_err(OperatorError::Submission)?;

        let monitor = LifecycleMonitor::new(
            Duration::from_secs(settings.poll_interval_seconds),
            Duration::from_secs(settings.timeout_seconds),
        )
        .with_cancel_on_timeout(settings.cancel_on_timeout);

        monitor.wait(self.client.as_ref(), self.clock.as_ref(), &job).await
    }
}
