//! Flavor layer: the operator's configuration schema, validated at
//! registration time, and the capability metadata exposed to the pipeline
//! framework's registration mechanism.

use anyhow::Context;
use aws_config::{Region, SdkConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{OperatorError, OperatorResult};
use crate::types::context::ResourceSettings;
use crate::types::params::{Arn, ComputeBackend};
use crate::types::spec::AssignPublicIp;
use crate::utils::is_valid_queue_name;

/// Name under which the flavor registers with the pipeline framework.
pub const FLAVOR_NAME: &str = "aws_batch";

fn default_backend() -> ComputeBackend {
    ComputeBackend::Fargate
}

fn default_timeout_seconds() -> u64 {
    3600
}

fn default_poll_interval_seconds() -> u64 {
    10
}

fn default_assign_public_ip() -> AssignPublicIp {
    AssignPublicIp::Enabled
}

/// Registration-time configuration. Loaded once, validated once, then passed
/// into every call as an immutable value.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BatchStepOperatorConfig {
    /// Role the container agent assumes to pull images and push logs
    pub execution_role_arn: String,
    /// Role the step container itself assumes
    pub job_role_arn: String,
    /// Queue used when a step does not name one
    pub default_job_queue_name: String,
    /// Backend variant used when a step does not name one
    #[serde(default = "default_backend")]
    pub backend: ComputeBackend,
    /// Region override; the ambient credential chain's region otherwise
    #[serde(default)]
    pub region: Option<String>,
    /// Declared backend variant per known job queue. Queues not listed fall
    /// back to the step's (or operator's) backend variant.
    #[serde(default)]
    pub queue_backends: BTreeMap<String, ComputeBackend>,
    /// Resource values for steps that request nothing
    #[serde(default)]
    pub default_resources: ResourceSettings,
}

impl BatchStepOperatorConfig {
    /// Validate at registration time, before the operator ever runs a step.
    pub fn validate(&self) -> OperatorResult<()> {
        for (field, value) in [
            ("execution_role_arn", &self.execution_role_arn),
            ("job_role_arn", &self.job_role_arn),
        ] {
            let arn = Arn::parse(value).map_err(|e| {
                OperatorError::InvalidConfiguration(format!("`{field}` is not a valid ARN: {e}"))
            })?;
            if arn.service != "iam" {
                return Err(OperatorError::InvalidConfiguration(format!(
                    "`{field}` must be an IAM role ARN, got service `{}`",
                    arn.service
                )));
            }
        }

        if !is_valid_queue_name(&self.default_job_queue_name) {
            return Err(OperatorError::InvalidConfiguration(format!(
                "`default_job_queue_name` `{}` is not a valid Batch job queue name",
                self.default_job_queue_name
            )));
        }
        for queue_name in self.queue_backends.keys() {
            if !is_valid_queue_name(queue_name) {
                return Err(OperatorError::InvalidConfiguration(format!(
                    "`queue_backends` entry `{queue_name}` is not a valid Batch job queue name"
                )));
            }
        }

        if let Some(cpu) = self.default_resources.cpu_count {
            if cpu <= 0.0 {
                return Err(OperatorError::InvalidConfiguration(format!(
                    "`default_resources.cpu_count` must be positive, got {cpu}"
                )));
            }
        }
        if self.default_resources.memory_mib == Some(0) {
            return Err(OperatorError::InvalidConfiguration(
                "`default_resources.memory_mib` must be positive, got 0".to_string(),
            ));
        }

        Ok(())
    }

    /// The declared backend variant behind `queue_name`, if the config names
    /// one.
    pub fn backend_for_queue(&self, queue_name: &str) -> Option<ComputeBackend> {
        self.queue_backends.get(queue_name).copied()
    }

    /// SDK configuration from the ambient credential chain, with the
    /// configured region taking precedence.
    pub async fn sdk_config(&self) -> SdkConfig {
        let config = aws_config::from_env().load().await;
        match &self.region {
            Some(region) if !region.is_empty() => {
                config.into_builder().region(Region::new(region.clone())).build()
            }
            _ => config,
        }
    }

    pub fn from_yaml_str(content: &str) -> OperatorResult<Self> {
        let config: Self = serde_yaml::from_str(content).map_err(|e| {
            OperatorError::InvalidConfiguration(format!("failed to deserialize config: {e}"))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Ok(Self::from_yaml_str(&content)?)
    }

    pub fn from_json_value(value: serde_json::Value) -> OperatorResult<Self> {
        let config: Self = serde_json::from_value(value).map_err(|e| {
            OperatorError::InvalidConfiguration(format!("failed to deserialize config: {e}"))
        })?;
        config.validate()?;
        Ok(config)
    }
}

/// Per-step settings, overriding the registration defaults for one step.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BatchStepOperatorSettings {
    #[serde(default)]
    pub backend: Option<ComputeBackend>,
    #[serde(default)]
    pub job_queue_name: Option<String>,
    /// Upper bound on the blocking wait for the job to terminate
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_poll_interval_seconds")]
    pub poll_interval_seconds: u64,
    /// Extra environment variables, overriding the step context's on conflict
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
    /// Fargate only; EC2 networking comes from the compute environment
    #[serde(default = "default_assign_public_ip")]
    pub assign_public_ip: AssignPublicIp,
    /// Best-effort TerminateJob once the wait deadline passes. Off by
    /// default: the default behavior surfaces the job id and leaves the
    /// remote job untouched for inspection.
    #[serde(default)]
    pub cancel_on_timeout: bool,
}

impl Default for BatchStepOperatorSettings {
    fn default() -> Self {
        Self {
            backend: None,
            job_queue_name: None,
            timeout_seconds: default_timeout_seconds(),
            poll_interval_seconds: default_poll_interval_seconds(),
            environment: BTreeMap::new(),
            assign_public_ip: default_assign_public_ip(),
            cancel_on_timeout: false,
        }
    }
}

impl BatchStepOperatorSettings {
    pub fn validate(&self) -> OperatorResult<()> {
        if self.timeout_seconds == 0 {
            return Err(OperatorError::InvalidConfiguration(
                "`timeout_seconds` must be positive".to_string(),
            ));
        }
        if self.poll_interval_seconds == 0 {
            return Err(OperatorError::InvalidConfiguration(
                "`poll_interval_seconds` must be positive".to_string(),
            ));
        }
        if let Some(queue_name) = &self.job_queue_name {
            if !is_valid_queue_name(queue_name) {
                return Err(OperatorError::InvalidConfiguration(format!(
                    "`job_queue_name` `{queue_name}` is not a valid Batch job queue name"
                )));
            }
        }
        Ok(())
    }
}

/// Capability flags advertised to the pipeline framework at registration.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlavorCapabilities {
    pub supports_resource_customization: bool,
    pub supports_step_timeouts: bool,
    pub supports_accelerators: bool,
}

/// Registration metadata for the AWS Batch step operator flavor.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchStepOperatorFlavor;

impl BatchStepOperatorFlavor {
    pub fn name(&self) -> &'static str {
        FLAVOR_NAME
    }

    pub fn capabilities(&self, backend: ComputeBackend) -> FlavorCapabilities {
        FlavorCapabilities {
            supports_resource_customization: true,
            supports_step_timeouts: true,
            supports_accelerators: backend.capabilities().supports_accelerators,
        }
    }

    /// Parse and validate a raw registration config.
    pub fn parse_config(&self, value: serde_json::Value) -> OperatorResult<BatchStepOperatorConfig> {
        BatchStepOperatorConfig::from_json_value(value)
    }
}
