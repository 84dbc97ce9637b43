//! Typed errors for the evaluation engine
//!
//! A failed check is not an error: "not reachable" comes back as a normal
//! [`crate::engine::Evaluation`] verdict. Errors mean the evaluation itself
//! could not be carried out.

use thiserror::Error;

/// Errors that abort a single evaluation
#[derive(Debug, Error)]
pub enum EvalError {
    /// Caller supplied a port outside the transport-valid range
    #[error("port {0} is outside the valid range 1-65535")]
    InvalidPort(u32),

    /// The source has neither an exact CIDR nor any subnet, so no
    /// CIDR-based match is possible at all
    #[error("{resource} has neither an interface CIDR nor any subnet; cannot derive a source address")]
    NoNetworkIdentity { resource: String },

    /// A subnet or rule lookup failed; propagated unchanged, never retried here
    #[error(transparent)]
    Lookup(#[from] LookupError),
}

/// Errors surfaced by the injected lookup capabilities
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("{resource_type} '{resource_id}' not found")]
    NotFound {
        resource_type: &'static str,
        resource_id: String,
    },

    #[error("lookup failed")]
    Failed(#[source] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_port_message_names_port() {
        let err = EvalError::InvalidPort(70000);
        assert_eq!(err.to_string(), "port 70000 is outside the valid range 1-65535");
    }

    #[test]
    fn not_found_message() {
        let err = LookupError::NotFound {
            resource_type: "subnet",
            resource_id: "subnet-123".to_string(),
        };
        assert_eq!(err.to_string(), "subnet 'subnet-123' not found");
    }
}
