//! Maps a target job queue to the backend variant that backs it and checks
//! the job definition's resource requests against that backend's
//! capabilities, so a doomed submission fails here instead of at the control
//! plane.

use crate::error::{OperatorError, OperatorResult};
use crate::types::params::{BackendCapabilities, ComputeBackend};
use crate::types::spec::JobDefinition;
use crate::utils::is_valid_queue_name;

/// A job queue name together with the validated capabilities of the backend
/// behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendDescriptor {
    pub queue_name: String,
    pub backend: ComputeBackend,
    pub capabilities: BackendCapabilities,
}

/// Resolve the descriptor for `queue_name`, declared to be backed by
/// `queue_backend`, and fail fast when the definition cannot run there.
///
/// For accelerator requests on the EC2 backend the instance-capability match
/// (GPU-carrying instance types in the compute environment) is declared
/// through the queue's backend variant; the control plane still owns actual
/// placement.
pub fn resolve(
    queue_name: &str,
    queue_backend: ComputeBackend,
    definition: &JobDefinition,
) -> OperatorResult<BackendDescriptor> {
    if !is_valid_queue_name(queue_name) {
        return Err(OperatorError::InvalidSpecification(format!(
            "`{queue_name}` is not a valid Batch job queue name"
        )));
    }

    let capabilities = queue_backend.capabilities();

    if let Some(platform) = definition.platform() {
        if platform != queue_backend {
            return Err(OperatorError::BackendCapabilityMismatch(format!(
                "job definition `{}` targets {platform} but job queue `{queue_name}` is backed \
                 by {queue_backend}",
                definition.job_definition_name
            )));
        }
    }

    let gpus = definition.requested_gpus();
    if gpus > 0 && !capabilities.supports_accelerators {
        return Err(OperatorError::BackendCapabilityMismatch(format!(
            "job queue `{queue_name}` is backed by {queue_backend}, which does not support \
             accelerator requests ({gpus} GPU(s) requested); route the step to an EC2-backed queue"
        )));
    }

    if let (Some(ceiling), Some(vcpus)) = (capabilities.max_vcpus, definition.requested_vcpus()) {
        if vcpus > f64::from(ceiling) {
            return Err(OperatorError::BackendCapabilityMismatch(format!(
                "requested {vcpus} vCPUs exceeds the {queue_backend} ceiling of {ceiling} on \
                 job queue `{queue_name}`"
            )));
        }
    }

    Ok(BackendDescriptor {
        queue_name: queue_name.to_string(),
        backend: queue_backend,
        capabilities,
    })
}
