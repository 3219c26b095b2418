use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Step-level resource requests as handed over by the pipeline framework.
/// `None` means "use the operator's default".
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct ResourceSettings {
    pub cpu_count: Option<f64>,
    pub memory_mib: Option<u64>,
    pub gpu_count: Option<u32>,
}

impl ResourceSettings {
    /// Overlay these settings on top of `defaults`, field by field.
    pub fn or_defaults(&self, defaults: &ResourceSettings) -> ResourceSettings {
        ResourceSettings {
            cpu_count: self.cpu_count.or(defaults.cpu_count),
            memory_mib: self.memory_mib.or(defaults.memory_mib),
            gpu_count: self.gpu_count.or(defaults.gpu_count),
        }
    }
}

/// Description of the pipeline step to execute, owned by the calling
/// framework and read-only to the operator.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StepExecutionContext {
    pub pipeline_run_id: String,
    pub pipeline_name: String,
    pub step_name: String,
    /// Fully qualified container image URI for the step image.
    pub image_uri: String,
    /// Entrypoint command that executes the step inside the container.
    pub command: Vec<String>,
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
    #[serde(default)]
    pub resources: ResourceSettings,
}
