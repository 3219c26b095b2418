use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

/// Compute backend variants that can sit behind a Batch job queue.
///
/// New variants extend this tag set and the capability table below; both the
/// spec builder and the resolver consume the same descriptor.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum ComputeBackend {
    /// Provisioned virtual machines, optionally with accelerator hardware
    #[serde(rename = "EC2")]
    #[strum(serialize = "EC2")]
    Ec2,
    /// Serverless tasks with a narrower, pre-committed resource shape
    #[serde(rename = "FARGATE")]
    #[strum(serialize = "FARGATE")]
    Fargate,
}

/// Capability flags of one backend variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendCapabilities {
    /// Whether GPU resource requirements may be attached to jobs
    pub supports_accelerators: bool,
    /// Whether vCPU counts must be whole integers
    pub requires_whole_vcpus: bool,
    /// Whether vCPU/memory values must come from the committed pair table
    pub enforces_vcpu_memory_pairs: bool,
    /// Upper bound on the vCPU request, if the backend has one
    pub max_vcpus: Option<u32>,
}

impl ComputeBackend {
    pub fn capabilities(&self) -> BackendCapabilities {
        match self {
            ComputeBackend::Ec2 => BackendCapabilities {
                supports_accelerators: true,
                requires_whole_vcpus: true,
                enforces_vcpu_memory_pairs: false,
                max_vcpus: None,
            },
            ComputeBackend::Fargate => BackendCapabilities {
                supports_accelerators: false,
                requires_whole_vcpus: false,
                enforces_vcpu_memory_pairs: true,
                max_vcpus: Some(16),
            },
        }
    }
}
