//! RDS resolver adapter
//!
//! Produces the destination-side descriptor for an RDS database. The name
//! may identify an instance or a cluster; for a cluster the writer instance
//! is used, matching where connections actually land.

use crate::aws::context::AwsContext;
use crate::aws::error::classify_sdk_error;
use crate::engine::{LookupError, ResourceDescriptor};
use aws_sdk_rds::types::DbInstance;
use tracing::info;

/// A resolved RDS destination: the descriptor plus the endpoint port, used
/// as the default when the user gives no `--port`
#[derive(Debug, Clone)]
pub struct RdsTarget {
    pub descriptor: ResourceDescriptor,
    pub endpoint_port: Option<u16>,
}

/// Resolves an RDS instance or cluster name to an [`RdsTarget`]
pub struct RdsResolver {
    client: aws_sdk_rds::Client,
}

impl RdsResolver {
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.rds_client(),
        }
    }

    pub async fn resolve(&self, name: &str) -> Result<RdsTarget, LookupError> {
        match self.resolve_instance(name).await {
            Ok(target) => Ok(target),
            Err(LookupError::NotFound { .. }) => match self.resolve_cluster_writer(name).await {
                Ok(target) => Ok(target),
                Err(LookupError::NotFound { .. }) => Err(LookupError::NotFound {
                    resource_type: "rds instance or cluster",
                    resource_id: name.to_string(),
                }),
                Err(other) => Err(other),
            },
            Err(other) => Err(other),
        }
    }

    async fn resolve_instance(&self, name: &str) -> Result<RdsTarget, LookupError> {
        let response = self
            .client
            .describe_db_instances()
            .db_instance_identifier(name)
            .send()
            .await
            .map_err(|e| LookupError::from(classify_sdk_error("rds instance", name, &e)))?;

        let Some(instance) = response.db_instances().first() else {
            return Err(LookupError::NotFound {
                resource_type: "rds instance",
                resource_id: name.to_string(),
            });
        };

        let target = target_from_instance(name, instance)?;
        info!(
            instance = %target.descriptor.id,
            vpc = ?target.descriptor.vpc_id,
            endpoint_port = ?target.endpoint_port,
            "Resolved RDS instance"
        );
        Ok(target)
    }

    /// Resolve a cluster name through its writer instance
    async fn resolve_cluster_writer(&self, name: &str) -> Result<RdsTarget, LookupError> {
        let response = self
            .client
            .describe_db_clusters()
            .db_cluster_identifier(name)
            .send()
            .await
            .map_err(|e| LookupError::from(classify_sdk_error("rds cluster", name, &e)))?;

        let Some(cluster) = response.db_clusters().first() else {
            return Err(LookupError::NotFound {
                resource_type: "rds cluster",
                resource_id: name.to_string(),
            });
        };

        let writer = cluster
            .db_cluster_members()
            .iter()
            .find(|member| member.is_cluster_writer().unwrap_or(false))
            .and_then(|member| member.db_instance_identifier())
            .ok_or_else(|| {
                LookupError::Failed(anyhow::anyhow!(
                    "rds cluster '{name}' has no writer instance"
                ))
            })?;

        self.resolve_instance(writer).await
    }
}

fn target_from_instance(name: &str, instance: &DbInstance) -> Result<RdsTarget, LookupError> {
    let subnet_group = instance.db_subnet_group().ok_or_else(|| {
        LookupError::Failed(anyhow::anyhow!(
            "rds instance '{name}' has no DB subnet group"
        ))
    })?;

    let subnet_ids: Vec<String> = subnet_group
        .subnets()
        .iter()
        .filter(|subnet| {
            subnet
                .subnet_status()
                .is_some_and(|status| status.eq_ignore_ascii_case("active"))
        })
        .filter_map(|subnet| subnet.subnet_identifier())
        .map(String::from)
        .collect();

    let security_group_ids: Vec<String> = instance
        .vpc_security_groups()
        .iter()
        .filter(|membership| {
            membership
                .status()
                .is_some_and(|status| status.eq_ignore_ascii_case("active"))
        })
        .filter_map(|membership| membership.vpc_security_group_id())
        .map(String::from)
        .collect();

    let mut descriptor =
        ResourceDescriptor::new("rds", instance.db_instance_identifier().unwrap_or(name))
            .with_subnets(subnet_ids)
            .with_security_groups(security_group_ids);
    if let Some(vpc_id) = subnet_group.vpc_id() {
        descriptor = descriptor.with_vpc(vpc_id);
    }

    let endpoint_port = instance
        .endpoint()
        .and_then(|endpoint| endpoint.port())
        .and_then(|port| u16::try_from(port).ok());

    Ok(RdsTarget {
        descriptor,
        endpoint_port,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_rds::types::{
        DbSubnetGroup, Endpoint, Subnet, VpcSecurityGroupMembership,
    };

    fn instance() -> DbInstance {
        DbInstance::builder()
            .db_instance_identifier("orders-db")
            .db_subnet_group(
                DbSubnetGroup::builder()
                    .vpc_id("vpc-1")
                    .subnets(
                        Subnet::builder()
                            .subnet_identifier("subnet-a")
                            .subnet_status("Active")
                            .build(),
                    )
                    .subnets(
                        Subnet::builder()
                            .subnet_identifier("subnet-b")
                            .subnet_status("Removing")
                            .build(),
                    )
                    .build(),
            )
            .vpc_security_groups(
                VpcSecurityGroupMembership::builder()
                    .vpc_security_group_id("sg-db")
                    .status("active")
                    .build(),
            )
            .vpc_security_groups(
                VpcSecurityGroupMembership::builder()
                    .vpc_security_group_id("sg-old")
                    .status("removing")
                    .build(),
            )
            .endpoint(Endpoint::builder().port(5432).build())
            .build()
    }

    #[test]
    fn builds_descriptor_from_active_attachments_only() {
        let target = target_from_instance("orders-db", &instance()).unwrap();
        assert_eq!(target.descriptor.kind, "rds");
        assert_eq!(target.descriptor.id, "orders-db");
        assert_eq!(target.descriptor.vpc_id.as_deref(), Some("vpc-1"));
        assert_eq!(target.descriptor.subnet_ids, vec!["subnet-a".to_string()]);
        assert_eq!(
            target.descriptor.security_group_ids,
            vec!["sg-db".to_string()]
        );
        assert_eq!(target.endpoint_port, Some(5432));
    }

    #[test]
    fn missing_subnet_group_is_an_error() {
        let bare = DbInstance::builder()
            .db_instance_identifier("orders-db")
            .build();
        assert!(target_from_instance("orders-db", &bare).is_err());
    }
}
