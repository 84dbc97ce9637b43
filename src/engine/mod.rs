//! Connectivity evaluation engine
//!
//! Pure decision logic over normalized descriptors: does the network layer
//! permit traffic from source to destination on a port? The engine runs two
//! checks in a fixed order - VPC membership, then security-group matching -
//! short-circuits on the first failure, and records every step in an
//! [`Evaluation`] trace.
//!
//! The engine holds no state of its own. Subnet and rule data are read
//! through the [`lookup`] capabilities the caller injects, so the same
//! engine drives both the live AWS-backed tool and the in-memory tests.

pub mod descriptor;
pub mod error;
pub mod ip;
pub mod lookup;
pub mod outcome;
pub mod security_group;
pub mod vpc;

pub use descriptor::{PortRange, ResourceDescriptor, RulePeer, SecurityGroupRule, SubnetInfo};
pub use error::{EvalError, LookupError};
pub use lookup::{RuleLookup, SubnetLookup};
pub use outcome::{CheckKind, CheckOutcome, Evaluation, Verdict};

/// Validate a user-supplied port, narrowing it to `u16`.
///
/// Runs before any lookup so a bad port never costs an API call.
pub fn validate_port(port: u32) -> Result<u16, EvalError> {
    if (1..=65535).contains(&port) {
        Ok(port as u16)
    } else {
        Err(EvalError::InvalidPort(port))
    }
}

/// Orchestrates the ordered checks over injected lookup capabilities
pub struct ConnectivityEngine<'a> {
    subnets: &'a dyn SubnetLookup,
    rules: &'a dyn RuleLookup,
}

impl<'a> ConnectivityEngine<'a> {
    pub fn new(subnets: &'a dyn SubnetLookup, rules: &'a dyn RuleLookup) -> Self {
        Self { subnets, rules }
    }

    /// Evaluate whether traffic from `source` to `destination` on `port`
    /// would be permitted.
    ///
    /// Returns a complete [`Evaluation`] with one of three verdicts:
    /// `Indeterminate` when the resources do not share a VPC (the
    /// security-group check is skipped), otherwise `Allowed` or `Blocked`
    /// from the security-group check. Errors mean the evaluation could not
    /// be carried out and no partial trace is returned.
    pub async fn evaluate(
        &self,
        source: &ResourceDescriptor,
        destination: &ResourceDescriptor,
        port: u32,
    ) -> Result<Evaluation, EvalError> {
        let port = validate_port(port)?;

        let mut outcomes = Vec::new();

        let vpc_outcome = vpc::check_vpc_membership(source, destination);
        let in_same_vpc = vpc_outcome.passed;
        outcomes.push(vpc_outcome);
        if !in_same_vpc {
            return Ok(Evaluation {
                outcomes,
                verdict: Verdict::Indeterminate,
            });
        }

        let sg_outcome = security_group::evaluate_security_groups(
            source,
            destination,
            port,
            self.subnets,
            self.rules,
        )
        .await?;
        let verdict = if sg_outcome.passed {
            Verdict::Allowed
        } else {
            Verdict::Blocked
        };
        outcomes.push(sg_outcome);

        Ok(Evaluation { outcomes, verdict })
    }
}
