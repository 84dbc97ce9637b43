//! EC2-backed lookup capabilities
//!
//! Implements the engine's [`SubnetLookup`] and [`RuleLookup`] traits
//! against the EC2 API. Throttled calls are retried here with exponential
//! backoff; the engine itself never retries.

use crate::aws::context::AwsContext;
use crate::aws::error::{classify_sdk_error, AwsError};
use crate::engine::{
    LookupError, PortRange, RuleLookup, RulePeer, SecurityGroupRule, SubnetInfo, SubnetLookup,
};
use async_trait::async_trait;
use aws_sdk_ec2::types::{self, Filter};
use backon::{ExponentialBuilder, Retryable};
use std::time::Duration;
use tracing::{debug, warn};

/// EC2 client for subnet and security-group rule lookups
pub struct Ec2Client {
    client: aws_sdk_ec2::Client,
}

impl Ec2Client {
    /// Create an EC2 client from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.ec2_client(),
        }
    }

    async fn describe_subnet(&self, subnet_id: &str) -> Result<types::Subnet, AwsError> {
        let response = self
            .client
            .describe_subnets()
            .subnet_ids(subnet_id)
            .send()
            .await
            .map_err(|e| classify_sdk_error("subnet", subnet_id, &e))?;

        response
            .subnets()
            .first()
            .cloned()
            .ok_or_else(|| AwsError::NotFound {
                resource_type: "subnet",
                resource_id: subnet_id.to_string(),
            })
    }

    async fn describe_ingress_rules(
        &self,
        group_id: &str,
    ) -> Result<Vec<types::SecurityGroupRule>, AwsError> {
        // DescribeSecurityGroupRules filters silently match nothing for a
        // nonexistent group, so probe the group first to get a real
        // InvalidGroup.NotFound out of AWS.
        self.client
            .describe_security_groups()
            .group_ids(group_id)
            .send()
            .await
            .map_err(|e| classify_sdk_error("security group", group_id, &e))?;

        let response = self
            .client
            .describe_security_group_rules()
            .filters(
                Filter::builder()
                    .name("group-id")
                    .values(group_id)
                    .build(),
            )
            .max_results(1000)
            .send()
            .await
            .map_err(|e| classify_sdk_error("security group", group_id, &e))?;

        Ok(response.security_group_rules().to_vec())
    }
}

fn retry_policy() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_secs(1))
        .with_max_delay(Duration::from_secs(10))
        .with_max_times(3)
}

#[async_trait]
impl SubnetLookup for Ec2Client {
    async fn subnet(&self, subnet_id: &str) -> Result<SubnetInfo, LookupError> {
        let subnet = (|| self.describe_subnet(subnet_id))
            .retry(retry_policy())
            .when(AwsError::is_retryable)
            .notify(|e, dur| {
                warn!(subnet_id = %subnet_id, delay = ?dur, error = %e, "Subnet lookup throttled, retrying...");
            })
            .await?;

        let id = subnet
            .subnet_id()
            .unwrap_or(subnet_id)
            .to_string();
        let vpc_id = subnet
            .vpc_id()
            .ok_or_else(|| {
                LookupError::Failed(anyhow::anyhow!("subnet '{subnet_id}' has no VPC ID"))
            })?
            .to_string();
        let cidr_block = subnet
            .cidr_block()
            .ok_or_else(|| {
                LookupError::Failed(anyhow::anyhow!("subnet '{subnet_id}' has no IPv4 CIDR block"))
            })?
            .parse()
            .map_err(|e| {
                LookupError::Failed(anyhow::anyhow!(
                    "subnet '{subnet_id}' has an unparseable CIDR block: {e}"
                ))
            })?;

        Ok(SubnetInfo {
            id,
            vpc_id,
            cidr_block,
        })
    }
}

#[async_trait]
impl RuleLookup for Ec2Client {
    async fn ingress_rules(&self, group_id: &str) -> Result<Vec<SecurityGroupRule>, LookupError> {
        let sdk_rules = (|| self.describe_ingress_rules(group_id))
            .retry(retry_policy())
            .when(AwsError::is_retryable)
            .notify(|e, dur| {
                warn!(group_id = %group_id, delay = ?dur, error = %e, "Rule lookup throttled, retrying...");
            })
            .await?;

        let mut rules = Vec::new();
        for sdk_rule in &sdk_rules {
            match convert_rule(sdk_rule) {
                Some(rule) => rules.push(rule),
                None => {
                    if sdk_rule.is_egress() != Some(true) {
                        debug!(
                            group_id = %group_id,
                            rule_id = ?sdk_rule.security_group_rule_id(),
                            "Skipping ingress rule with unsupported peer"
                        );
                    }
                }
            }
        }
        Ok(rules)
    }
}

/// Convert an SDK rule into the engine's shape.
///
/// Returns `None` for egress rules and for rules this tool cannot evaluate:
/// IPv6-only peers, prefix-list peers, or unparseable CIDR data. Skipped
/// rules are inert - they never match and never count as a near miss.
fn convert_rule(rule: &types::SecurityGroupRule) -> Option<SecurityGroupRule> {
    if rule.is_egress() == Some(true) {
        return None;
    }

    let group_id = rule.group_id()?.to_string();
    let rule_id = rule.security_group_rule_id()?.to_string();
    let protocol = rule.ip_protocol().unwrap_or("-1").to_string();

    // AWS reports -1/-1 for "all ports"
    let port_range = match (rule.from_port(), rule.to_port()) {
        (Some(from), Some(to)) if from >= 0 && to >= 0 => Some(PortRange {
            start: u16::try_from(from).ok()?,
            end: u16::try_from(to).ok()?,
        }),
        _ => None,
    };

    let peer = if let Some(referenced) = rule.referenced_group_info().and_then(|r| r.group_id()) {
        RulePeer::Group(referenced.to_string())
    } else if let Some(cidr) = rule.cidr_ipv4() {
        RulePeer::Cidr(cidr.parse().ok()?)
    } else {
        return None;
    };

    Some(SecurityGroupRule {
        group_id,
        rule_id,
        protocol,
        port_range,
        peer,
    })
}
