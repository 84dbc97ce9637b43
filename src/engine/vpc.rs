//! VPC membership check
//!
//! Two resources can only be directly reachable under this tool's model if
//! they sit in the same VPC. Cross-VPC traffic would need routing or peering
//! analysis, which we do not attempt, so a failure here is a hard
//! precondition failure and the engine stops.

use crate::engine::descriptor::ResourceDescriptor;
use crate::engine::outcome::{CheckKind, CheckOutcome};

/// Verify that source and destination share a VPC.
pub fn check_vpc_membership(
    source: &ResourceDescriptor,
    destination: &ResourceDescriptor,
) -> CheckOutcome {
    match (&source.vpc_id, &destination.vpc_id) {
        (Some(src), Some(dst)) if src == dst => CheckOutcome::pass(
            CheckKind::VpcMembership,
            format!("source and destination are both in {src}"),
        ),
        (Some(src), Some(dst)) => CheckOutcome::fail(
            CheckKind::VpcMembership,
            format!(
                "{} is in {src} but {} is in {dst}",
                source.display_name(),
                destination.display_name()
            ),
        ),
        (None, _) => CheckOutcome::fail(
            CheckKind::VpcMembership,
            format!("{} is not attached to a VPC", source.display_name()),
        ),
        (_, None) => CheckOutcome::fail(
            CheckKind::VpcMembership,
            format!("{} is not attached to a VPC", destination.display_name()),
        ),
    }
}
