//! Wire-shaped model of a Batch job definition.
//!
//! Field names serialize in the control plane's camelCase convention, and all
//! maps are ordered, so building the same definition twice yields byte-equal
//! JSON.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::params::ComputeBackend;

/// Batch rejects job names longer than 128 characters.
pub const MAX_JOB_NAME_LEN: usize = 128;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    #[serde(rename = "VCPU")]
    Vcpu,
    #[serde(rename = "MEMORY")]
    Memory,
    #[serde(rename = "GPU")]
    Gpu,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ResourceRequirement {
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub value: String,
}

impl ResourceRequirement {
    pub fn vcpu(value: impl Into<String>) -> Self {
        Self { resource_type: ResourceType::Vcpu, value: value.into() }
    }

    pub fn memory(value: impl Into<String>) -> Self {
        Self { resource_type: ResourceType::Memory, value: value.into() }
    }

    pub fn gpu(value: impl Into<String>) -> Self {
        Self { resource_type: ResourceType::Gpu, value: value.into() }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct KeyValuePair {
    pub name: String,
    pub value: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogDriver {
    #[serde(rename = "awslogs")]
    AwsLogs,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LogConfiguration {
    pub log_driver: LogDriver,
}

impl Default for LogConfiguration {
    fn default() -> Self {
        Self { log_driver: LogDriver::AwsLogs }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignPublicIp {
    #[serde(rename = "ENABLED")]
    Enabled,
    #[serde(rename = "DISABLED")]
    Disabled,
}

/// Fargate-only: tasks without a public IP need NAT routing to pull images.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfiguration {
    pub assign_public_ip: AssignPublicIp,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContainerProperties {
    pub image: String,
    pub command: Vec<String>,
    pub job_role_arn: String,
    pub execution_role_arn: String,
    pub environment: Vec<KeyValuePair>,
    pub resource_requirements: Vec<ResourceRequirement>,
    pub log_configuration: LogConfiguration,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub network_configuration: Option<NetworkConfiguration>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAction {
    #[serde(rename = "RETRY")]
    Retry,
    #[serde(rename = "EXIT")]
    Exit,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateOnExit {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub on_exit_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub on_reason: Option<String>,
    pub action: RetryAction,
}

/// Infra-level retry handled by the Batch service itself, distinct from the
/// operator's own no-retry submission contract.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RetryStrategy {
    pub attempts: u32,
    pub evaluate_on_exit: Vec<EvaluateOnExit>,
}

impl Default for RetryStrategy {
    fn default() -> Self {
        Self {
            attempts: 2,
            evaluate_on_exit: vec![
                // 137: the container was OOM-killed
                EvaluateOnExit {
                    on_exit_code: Some("137".to_string()),
                    on_reason: None,
                    action: RetryAction::Retry,
                },
                // The host was reclaimed under the job
                EvaluateOnExit {
                    on_exit_code: None,
                    on_reason: Some("Host EC2 terminated".to_string()),
                    action: RetryAction::Retry,
                },
            ],
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JobTimeout {
    pub attempt_duration_seconds: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobDefinitionType {
    #[serde(rename = "container")]
    Container,
}

/// A complete, backend-specific job definition payload. Created fresh per
/// step invocation and never mutated after submission.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JobDefinition {
    pub job_definition_name: String,
    #[serde(rename = "type")]
    pub job_type: JobDefinitionType,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub parameters: BTreeMap<String, String>,
    pub retry_strategy: RetryStrategy,
    pub propagate_tags: bool,
    pub timeout: JobTimeout,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub tags: BTreeMap<String, String>,
    pub platform_capabilities: Vec<ComputeBackend>,
    pub container_properties: ContainerProperties,
}

impl JobDefinition {
    /// The backend variant this definition was built for.
    pub fn platform(&self) -> Option<ComputeBackend> {
        self.platform_capabilities.first().copied()
    }

    /// Requested accelerator count; 0 when no GPU requirement is present.
    pub fn requested_gpus(&self) -> u32 {
        self.find_requirement(ResourceType::Gpu).and_then(|value| value.parse().ok()).unwrap_or(0)
    }

    pub fn requested_vcpus(&self) -> Option<f64> {
        self.find_requirement(ResourceType::Vcpu).and_then(|value| value.parse().ok())
    }

    fn find_requirement(&self, resource_type: ResourceType) -> Option<&str> {
        self.container_properties
            .resource_requirements
            .iter()
            .find(|req| req.resource_type == resource_type)
            .map(|req| req.value.as_str())
    }
}
