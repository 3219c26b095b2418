use assert_matches::assert_matches;

use crate::config::BatchStepOperatorSettings;
use crate::operator::builder::build_job_definition;
use crate::operator::resolver::resolve;
use crate::tests::common::{test_config, test_context, EC2_QUEUE, FARGATE_QUEUE};
use crate::types::params::ComputeBackend;
use crate::types::spec::JobDefinition;
use crate::OperatorError;

fn gpu_definition() -> JobDefinition {
    let mut context = test_context();
    context.resources.gpu_count = Some(1);
    let settings =
        BatchStepOperatorSettings { backend: Some(ComputeBackend::Ec2), ..Default::default() };
    build_job_definition(&context, &settings, &test_config()).unwrap()
}

#[test]
fn test_gpu_definition_accepted_on_ec2_backed_queue() {
    let descriptor = resolve(EC2_QUEUE, ComputeBackend::Ec2, &gpu_definition()).unwrap();

    assert_eq!(descriptor.queue_name, EC2_QUEUE);
    assert_eq!(descriptor.backend, ComputeBackend::Ec2);
    assert!(descriptor.capabilities.supports_accelerators);
    assert!(descriptor.capabilities.max_vcpus.is_none());
}

#[test]
fn test_gpu_definition_rejected_on_elastic_queue() {
    let result = resolve(FARGATE_QUEUE, ComputeBackend::Fargate, &gpu_definition());
    assert_matches!(result, Err(OperatorError::BackendCapabilityMismatch(_)));
}

#[test]
fn test_platform_queue_mismatch_rejected_without_gpus() {
    let definition =
        build_job_definition(&test_context(), &BatchStepOperatorSettings::default(), &test_config())
            .unwrap();

    // A Fargate-built definition cannot be routed to an EC2-backed queue.
    let result = resolve(EC2_QUEUE, ComputeBackend::Ec2, &definition);
    assert_matches!(result, Err(OperatorError::BackendCapabilityMismatch(_)));
}

#[test]
fn test_vcpu_ceiling_enforced() {
    let mut definition = gpu_definition();
    // Strip the platform tag and the GPU requirement so only the ceiling check
    // can fire.
    definition.platform_capabilities.clear();
    definition
        .container_properties
        .resource_requirements
        .retain(|req| req.resource_type != crate::types::spec::ResourceType::Gpu);
    definition.container_properties.resource_requirements[0].value = "32".to_string();

    let result = resolve(FARGATE_QUEUE, ComputeBackend::Fargate, &definition);
    assert_matches!(result, Err(OperatorError::BackendCapabilityMismatch(_)));
}

#[test]
fn test_malformed_queue_name_rejected() {
    let result = resolve("not a queue name", ComputeBackend::Fargate, &gpu_definition());
    assert_matches!(result, Err(OperatorError::InvalidSpecification(_)));
}
