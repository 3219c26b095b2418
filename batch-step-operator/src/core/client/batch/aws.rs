use super::{BatchClient, BatchClientError};
use crate::types::job::{JobStatus, JobStatusRecord, RemoteJob};
use crate::types::params::ComputeBackend;
use crate::types::spec::{
    AssignPublicIp, ContainerProperties, JobDefinition, LogDriver, ResourceType, RetryAction,
    RetryStrategy,
};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_batch::types as batch;
use aws_sdk_batch::Client;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;

/// Thin wrapper around the SDK Batch client.
#[derive(Clone, Debug)]
pub(crate) struct InnerBatch(Arc<Client>);

impl InnerBatch {
    pub fn new(aws_config: &SdkConfig) -> Self {
        Self(Arc::new(Client::new(aws_config)))
    }

    pub fn client(&self) -> &Client {
        self.0.as_ref()
    }
}

/// AWS Batch control-plane client.
#[derive(Clone, Debug)]
pub struct AwsBatch {
    inner: InnerBatch,
}

impl AwsBatch {
    /// Creates a new instance of AwsBatch with the provided AWS configuration.
    pub fn new(aws_config: &SdkConfig) -> Self {
        Self { inner: InnerBatch::new(aws_config) }
    }

    pub fn client(&self) -> &Client {
        self.inner.client()
    }
}

fn map_platform_capability(backend: &ComputeBackend) -> batch::PlatformCapability {
    match backend {
        ComputeBackend::Ec2 => batch::PlatformCapability::Ec2,
        ComputeBackend::Fargate => batch::PlatformCapability::Fargate,
    }
}

fn map_resource_type(resource_type: ResourceType) -> batch::ResourceType {
    match resource_type {
        ResourceType::Vcpu => batch::ResourceType::Vcpu,
        ResourceType::Memory => batch::ResourceType::Memory,
        ResourceType::Gpu => batch::ResourceType::Gpu,
    }
}

fn map_job_status(status: &batch::JobStatus) -> JobStatus {
    match status {
        batch::JobStatus::Submitted => JobStatus::Submitted,
        batch::JobStatus::Pending => JobStatus::Pending,
        batch::JobStatus::Runnable => JobStatus::Runnable,
        batch::JobStatus::Starting => JobStatus::Starting,
        batch::JobStatus::Running => JobStatus::Running,
        batch::JobStatus::Succeeded => JobStatus::Succeeded,
        batch::JobStatus::Failed => JobStatus::Failed,
        other => {
            // A status this build does not know can only be non-terminal:
            // treating it as such delays, never corrupts, the decision.
            tracing::warn!(status = ?other, "Unrecognized Batch job status, treating as non-terminal");
            JobStatus::Pending
        }
    }
}

fn map_retry_strategy(retry: &RetryStrategy) -> Result<batch::RetryStrategy, BatchClientError> {
    let evaluate_on_exit = retry
        .evaluate_on_exit
        .iter()
        .map(|rule| {
            let mut builder = batch::EvaluateOnExit::builder().action(match rule.action {
                RetryAction::Retry => batch::RetryAction::Retry,
                RetryAction::Exit => batch::RetryAction::Exit,
            });
            if let Some(code) = &rule.on_exit_code {
                builder = builder.on_exit_code(code);
            }
            if let Some(reason) = &rule.on_reason {
                builder = builder.on_reason(reason);
            }
            builder.build()
        })
        .collect::<Vec<_>>();

    Ok(batch::RetryStrategy::builder()
        .attempts(retry.attempts as i32)
        .set_evaluate_on_exit(Some(evaluate_on_exit))
        .build())
}

fn map_container_properties(
    props: &ContainerProperties,
) -> Result<batch::ContainerProperties, BatchClientError> {
    let environment = props
        .environment
        .iter()
        .map(|kv| batch::KeyValuePair::builder().name(&kv.name).value(&kv.value).build())
        .collect::<Vec<_>>();

    let resource_requirements = props
        .resource_requirements
        .iter()
        .map(|req| {
            batch::ResourceRequirement::builder()
                .r#type(map_resource_type(req.resource_type))
                .value(&req.value)
                .build()
        })
        .collect::<Vec<_>>();

    let log_configuration = batch::LogConfiguration::builder()
        .log_driver(match props.log_configuration.log_driver {
            LogDriver::AwsLogs => batch::LogDriver::Awslogs,
        })
        .build();

    let mut builder = batch::ContainerProperties::builder()
        .image(&props.image)
        .job_role_arn(&props.job_role_arn)
        .execution_role_arn(&props.execution_role_arn)
        .set_command(Some(props.command.clone()))
        .set_environment(Some(environment))
        .set_resource_requirements(Some(resource_requirements))
        .log_configuration(log_configuration);

    if let Some(network) = &props.network_configuration {
        builder = builder.network_configuration(
            batch::NetworkConfiguration::builder()
                .assign_public_ip(match network.assign_public_ip {
                    AssignPublicIp::Enabled => batch::AssignPublicIp::Enabled,
                    AssignPublicIp::Disabled => batch::AssignPublicIp::Disabled,
                })
                .build(),
        );
    }

    Ok(builder.build())
}

#[async_trait]
impl BatchClient for AwsBatch {
    #[tracing::instrument(skip(self, definition), fields(job_definition_name = %definition.job_definition_name))]
    async fn register_job_definition(
        &self,
        definition: &JobDefinition,
    ) -> Result<String, BatchClientError> {
        let container_properties = map_container_properties(&definition.container_properties)?;
        let retry_strategy = map_retry_strategy(&definition.retry_strategy)?;
        let timeout = batch::JobTimeout::builder()
            .attempt_duration_seconds(definition.timeout.attempt_duration_seconds as i32)
            .build();
        let platform_capabilities =
            definition.platform_capabilities.iter().map(map_platform_capability).collect();
        let parameters: Option<HashMap<String, String>> = (!definition.parameters.is_empty())
            .then(|| definition.parameters.clone().into_iter().collect());
        let tags: Option<HashMap<String, String>> =
            (!definition.tags.is_empty()).then(|| definition.tags.clone().into_iter().collect());

        let response = self
            .client()
            .register_job_definition()
            .job_definition_name(&definition.job_definition_name)
            .r#type(batch::JobDefinitionType::Container)
            .set_parameters(parameters)
            .retry_strategy(retry_strategy)
            .propagate_tags(definition.propagate_tags)
            .timeout(timeout)
            .set_tags(tags)
            .set_platform_capabilities(Some(platform_capabilities))
            .container_properties(container_properties)
            .send()
            .await?;

        let arn = response
            .job_definition_arn()
            .ok_or(BatchClientError::MissingResponseField("jobDefinitionArn"))?;
        tracing::debug!(job_definition_arn = %arn, "Registered job definition");
        Ok(arn.to_string())
    }

    #[tracing::instrument(skip(self))]
    async fn submit_job(
        &self,
        job_name: &str,
        job_queue: &str,
        job_definition_arn: &str,
    ) -> Result<RemoteJob, BatchClientError> {
        let response = self
            .client()
            .submit_job()
            .job_name(job_name)
            .job_queue(job_queue)
            .job_definition(job_definition_arn)
            .send()
            .await?;

        let job_id = response.job_id().ok_or(BatchClientError::MissingResponseField("jobId"))?;
        tracing::info!(job_id = %job_id, queue = %job_queue, "Submitted Batch job");

        Ok(RemoteJob {
            job_id: job_id.to_string(),
            job_name: job_name.to_string(),
            submitted_at: Utc::now(),
        })
    }

    async fn describe_job(
        &self,
        job_id: &str,
    ) -> Result<Option<JobStatusRecord>, BatchClientError> {
        let response = self.client().describe_jobs().jobs(job_id).send().await?;

        let Some(job) = response.jobs().first() else {
            return Ok(None);
        };

        let status = match job.status() {
            Some(status) => map_job_status(status),
            None => return Err(BatchClientError::MissingResponseField("status")),
        };
        let exit_code = job.container().and_then(|container| container.exit_code());
        let status_reason = job
            .status_reason()
            .map(str::to_string)
            .or_else(|| job.container().and_then(|container| container.reason()).map(str::to_string));

        Ok(Some(JobStatusRecord { status, status_reason, exit_code }))
    }

    async fn terminate_job(&self, job_id: &str, reason: &str) -> Result<(), BatchClientError> {
        self.client().terminate_job().job_id(job_id).reason(reason).send().await?;
        tracing::info!(job_id = %job_id, "Requested job termination");
        Ok(())
    }
}
