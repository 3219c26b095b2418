//! Pure transform from a step execution context to a Batch job definition.
//!
//! Everything here is checked locally, before any control-plane call: a
//! remote rejection arrives minutes later and names neither the step nor the
//! offending field.

use std::collections::BTreeMap;

use crate::config::{BatchStepOperatorConfig, BatchStepOperatorSettings};
use crate::error::{OperatorError, OperatorResult};
use crate::types::context::{ResourceSettings, StepExecutionContext};
use crate::types::params::ComputeBackend;
use crate::types::spec::{
    ContainerProperties, JobDefinition, JobDefinitionType, JobTimeout, KeyValuePair,
    LogConfiguration, NetworkConfiguration, ResourceRequirement, RetryStrategy,
};
use crate::utils::sanitize_name;

/// Prefix cap leaves room for the separator and run tag within the 128
/// character job name limit.
const JOB_NAME_PREFIX_CAP: usize = 115;
const JOB_NAME_TAG_LEN: usize = 12;

/// vCPU values Fargate accepts.
const VALID_FARGATE_VCPU: &[&str] = &["0.25", "0.5", "1", "2", "4", "8", "16"];

/// Memory values (MiB) Fargate accepts for a given vCPU value.
fn valid_fargate_memory(vcpu: &str) -> Option<Vec<u64>> {
    match vcpu {
        "0.25" => Some(vec![512, 1024, 2048]),
        "0.5" => Some(vec![1024, 2048, 3072, 4096]),
        "1" => Some((2048..=8192).step_by(1024).collect()),
        "2" => Some((4096..=16384).step_by(1024).collect()),
        "4" => Some((8192..=30720).step_by(1024).collect()),
        "8" => Some((16384..=61440).step_by(4096).collect()),
        "16" => Some((32768..=122880).step_by(8192).collect()),
        _ => None,
    }
}

/// Deterministic, unique-per-run job name: sanitized `{pipeline}-{step}`
/// capped at 115 characters, tagged with the tail of the run id.
pub fn generate_job_name(context: &StepExecutionContext) -> String {
    let pipeline = sanitize_name(&context.pipeline_name);
    let step = sanitize_name(&context.step_name);
    let run = sanitize_name(&context.pipeline_run_id);
    let tag = &run[run.len().saturating_sub(JOB_NAME_TAG_LEN)..];

    let mut name = format!("{pipeline}-{step}");
    name.truncate(JOB_NAME_PREFIX_CAP);
    format!("{name}-{tag}")
}

fn validate_resources(resources: &ResourceSettings) -> OperatorResult<()> {
    if let Some(cpu) = resources.cpu_count {
        if cpu <= 0.0 {
            return Err(OperatorError::InvalidSpecification(format!(
                "cpu_count must be positive, got {cpu}"
            )));
        }
    }
    if resources.memory_mib == Some(0) {
        return Err(OperatorError::InvalidSpecification(
            "memory_mib must be positive, got 0".to_string(),
        ));
    }
    Ok(())
}

/// Map the step's resource settings to the resource requirement convention of
/// the Batch job definition, applying the target backend's constraints.
fn map_resource_settings(
    resources: &ResourceSettings,
    backend: ComputeBackend,
) -> OperatorResult<Vec<ResourceRequirement>> {
    validate_resources(resources)?;

    let capabilities = backend.capabilities();
    let gpu_count = resources.gpu_count.unwrap_or(0);
    if gpu_count > 0 && !capabilities.supports_accelerators {
        return Err(OperatorError::InvalidSpecification(format!(
            "{backend} jobs cannot request accelerators ({gpu_count} GPU(s) requested); \
             use the EC2 backend for custom devices"
        )));
    }

    let cpu = resources.cpu_count.unwrap_or(1.0);
    let cpu_value = if capabilities.requires_whole_vcpus {
        let rounded = cpu.ceil();
        if rounded != cpu {
            tracing::info!(
                backend = %backend,
                requested = cpu,
                rounded = rounded,
                "Rounded fractional vCPU request up, the backend requires whole integer vCPU counts"
            );
        }
        (rounded as u64).to_string()
    } else {
        cpu.to_string()
    };

    let memory_value = resources.memory_mib.unwrap_or(1024);

    if capabilities.enforces_vcpu_memory_pairs {
        let Some(valid_memory) = valid_fargate_memory(&cpu_value) else {
            return Err(OperatorError::InvalidSpecification(format!(
                "invalid {backend} vCPU value {cpu_value}, must be one of {VALID_FARGATE_VCPU:?}"
            )));
        };
        if !valid_memory.contains(&memory_value) {
            return Err(OperatorError::InvalidSpecification(format!(
                "invalid {backend} memory value {memory_value} MiB for vCPU={cpu_value}, \
                 must be one of {valid_memory:?}"
            )));
        }
    }

    let mut requirements = vec![
        ResourceRequirement::vcpu(cpu_value),
        ResourceRequirement::memory(memory_value.to_string()),
    ];
    if gpu_count > 0 {
        requirements.push(ResourceRequirement::gpu(gpu_count.to_string()));
    }
    Ok(requirements)
}

/// Build the job definition for one step invocation. Pure: identical inputs
/// produce identical definitions.
pub fn build_job_definition(
    context: &StepExecutionContext,
    settings: &BatchStepOperatorSettings,
    config: &BatchStepOperatorConfig,
) -> OperatorResult<JobDefinition> {
    if context.image_uri.trim().is_empty() {
        return Err(OperatorError::InvalidSpecification(
            "container image URI must not be empty".to_string(),
        ));
    }
    if context.command.is_empty() {
        return Err(OperatorError::InvalidSpecification(
            "entrypoint command must not be empty".to_string(),
        ));
    }

    let backend = settings.backend.unwrap_or(config.backend);
    let resources = context.resources.or_defaults(&config.default_resources);
    let resource_requirements = map_resource_settings(&resources, backend)?;

    // Step-level settings extend and override the context environment.
    let mut environment = context.environment.clone();
    environment.extend(settings.environment.clone());
    let environment: Vec<KeyValuePair> =
        environment.into_iter().map(|(name, value)| KeyValuePair { name, value }).collect();

    let network_configuration = match backend {
        ComputeBackend::Fargate => {
            Some(NetworkConfiguration { assign_public_ip: settings.assign_public_ip })
        }
        ComputeBackend::Ec2 => None,
    };

    Ok(JobDefinition {
        job_definition_name: generate_job_name(context),
        job_type: JobDefinitionType::Container,
        parameters: BTreeMap::new(),
        retry_strategy: RetryStrategy::default(),
        propagate_tags: false,
        timeout: JobTimeout { attempt_duration_seconds: settings.timeout_seconds },
        tags: BTreeMap::new(),
        platform_capabilities: vec![backend],
        container_properties: ContainerProperties {
            image: context.image_uri.clone(),
            command: context.command.clone(),
            job_role_arn: config.job_role_arn.clone(),
            execution_role_arn: config.execution_role_arn.clone(),
            environment,
            resource_requirements,
            log_configuration: LogConfiguration::default(),
            network_configuration,
        },
    })
}
