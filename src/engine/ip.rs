//! Source address derivation
//!
//! Security-group CIDR rules are matched against a single CIDR representing
//! the source. When the service API exposes the exact interface CIDR we use
//! it; otherwise we fall back to the address range of one of the resource's
//! subnets.

use crate::engine::descriptor::ResourceDescriptor;
use crate::engine::error::EvalError;
use crate::engine::lookup::SubnetLookup;
use ipnet::Ipv4Net;
use tracing::debug;

/// Derive the best-available CIDR representing `descriptor`'s network presence.
///
/// The subnet fallback always picks the subnet with the lexicographically
/// smallest ID so repeated runs give the same answer. This is a known
/// approximation: a resource spanning several subnets is reachable through
/// any of them, and a security group could permit one subnet's range while
/// blocking another's. We do not enumerate or union the ranges.
pub async fn resolve_source_cidr(
    descriptor: &ResourceDescriptor,
    subnets: &dyn SubnetLookup,
) -> Result<Ipv4Net, EvalError> {
    if let Some(cidr) = descriptor.exact_cidr {
        debug!(resource = %descriptor.id, cidr = %cidr, "Using exact interface CIDR");
        return Ok(cidr);
    }

    let subnet_id = descriptor
        .subnet_ids
        .iter()
        .min()
        .ok_or_else(|| EvalError::NoNetworkIdentity {
            resource: descriptor.display_name(),
        })?;

    let subnet = subnets.subnet(subnet_id).await?;
    debug!(
        resource = %descriptor.id,
        subnet_id = %subnet.id,
        cidr = %subnet.cidr_block,
        "Derived source CIDR from subnet"
    );
    Ok(subnet.cidr_block)
}
