//! Read-only lookup capabilities the engine depends on
//!
//! Both traits are implemented by [`crate::aws::Ec2Client`] against the live
//! EC2 API, and by in-memory fixtures in the engine tests. The engine only
//! ever reads through them; it never caches or retries.

use crate::engine::descriptor::{SecurityGroupRule, SubnetInfo};
use crate::engine::error::LookupError;
use async_trait::async_trait;

/// Resolves a subnet ID to its address range
#[async_trait]
pub trait SubnetLookup: Send + Sync {
    async fn subnet(&self, subnet_id: &str) -> Result<SubnetInfo, LookupError>;
}

/// Fetches the inbound rules of a security group
#[async_trait]
pub trait RuleLookup: Send + Sync {
    async fn ingress_rules(&self, group_id: &str) -> Result<Vec<SecurityGroupRule>, LookupError>;
}
