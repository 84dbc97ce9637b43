//! ECS resolver adapter
//!
//! Produces the source-side descriptor for an ECS service running in awsvpc
//! networking mode. The service description does not carry its VPC, so it
//! is recovered by describing one of the service's subnets through the
//! injected subnet lookup (same deterministic choice as the engine: the
//! lexicographically smallest subnet ID).

use crate::aws::context::AwsContext;
use crate::aws::error::classify_sdk_error;
use crate::engine::{LookupError, ResourceDescriptor, SubnetLookup};
use tracing::info;

/// Resolves an ECS service to a [`ResourceDescriptor`].
///
/// Accepts either a bare service name (default cluster) or a
/// "cluster:service" pair.
pub struct EcsResolver {
    client: aws_sdk_ecs::Client,
}

impl EcsResolver {
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.ecs_client(),
        }
    }

    pub async fn resolve(
        &self,
        service_spec: &str,
        subnets: &dyn SubnetLookup,
    ) -> Result<ResourceDescriptor, LookupError> {
        let (cluster, service) = match service_spec.split_once(':') {
            Some((cluster, service)) => (Some(cluster), service),
            None => (None, service_spec),
        };

        let mut request = self.client.describe_services().services(service);
        if let Some(cluster) = cluster {
            request = request.cluster(cluster);
        }
        let response = request.send().await.map_err(|e| {
            LookupError::from(classify_sdk_error("ecs service", service_spec, &e))
        })?;

        let Some(description) = response.services().first() else {
            return Err(LookupError::NotFound {
                resource_type: "ecs service",
                resource_id: service_spec.to_string(),
            });
        };

        let network = description
            .network_configuration()
            .and_then(|n| n.awsvpc_configuration())
            .ok_or_else(|| {
                LookupError::Failed(anyhow::anyhow!(
                    "ecs service '{service_spec}' has no awsvpc network configuration"
                ))
            })?;

        let subnet_ids = network.subnets().to_vec();
        let security_group_ids = network.security_groups().to_vec();

        let probe_subnet_id = subnet_ids.iter().min().ok_or_else(|| {
            LookupError::Failed(anyhow::anyhow!(
                "ecs service '{service_spec}' lists no subnets"
            ))
        })?;
        let probe_subnet = subnets.subnet(probe_subnet_id).await?;

        let descriptor =
            ResourceDescriptor::new("ecs", description.service_name().unwrap_or(service_spec))
                .with_vpc(probe_subnet.vpc_id)
                .with_subnets(subnet_ids)
                .with_security_groups(security_group_ids);

        info!(
            service = %descriptor.id,
            vpc = ?descriptor.vpc_id,
            subnets = descriptor.subnet_ids.len(),
            security_groups = descriptor.security_group_ids.len(),
            "Resolved ECS service"
        );

        Ok(descriptor)
    }
}
