//! AWS error classification
//!
//! Maps AWS SDK error codes to typed errors using `ProvideErrorMetadata`
//! instead of string matching on the Debug format, and attaches a
//! user-facing suggestion for the codes that have an obvious fix.

use crate::engine::LookupError;
use aws_sdk_ec2::error::ProvideErrorMetadata;
use thiserror::Error;

/// Categories of AWS failures the adapters care about
#[derive(Debug, Error)]
pub enum AwsError {
    /// The looked-up resource does not exist
    #[error("{resource_type} '{resource_id}' not found")]
    NotFound {
        resource_type: &'static str,
        resource_id: String,
    },

    /// Rate limit exceeded (retryable with backoff)
    #[error("AWS rate limit exceeded")]
    Throttled,

    /// Credentials lack a required permission or have expired
    #[error("access denied: {message}")]
    AccessDenied { message: String },

    /// Generic AWS SDK error with code and message
    #[error("AWS error: {message}")]
    Sdk {
        code: Option<String>,
        message: String,
    },
}

impl AwsError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, AwsError::NotFound { .. })
    }

    /// Whether the adapter should retry the call
    pub fn is_retryable(&self) -> bool {
        matches!(self, AwsError::Throttled)
    }

    /// A user-facing hint for resolving this error, if we have one
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            AwsError::AccessDenied { .. } => Some(
                "Check that your credentials are current (e.g. `aws sso login`) and allow \
                 the ec2/lambda/ecs/rds Describe* calls this tool makes.",
            ),
            AwsError::Throttled => {
                Some("AWS API rate limit hit; lookups are retried automatically.")
            }
            _ => None,
        }
    }
}

impl From<AwsError> for LookupError {
    fn from(err: AwsError) -> Self {
        match err {
            AwsError::NotFound {
                resource_type,
                resource_id,
            } => LookupError::NotFound {
                resource_type,
                resource_id,
            },
            other => LookupError::Failed(anyhow::Error::new(other)),
        }
    }
}

/// Known AWS error codes for "not found" conditions across the services we query
const NOT_FOUND_CODES: &[&str] = &[
    "InvalidSubnetID.NotFound",
    "InvalidSubnetId.NotFound",
    "InvalidGroup.NotFound",
    "InvalidVpcID.NotFound",
    "ResourceNotFoundException",
    "DBInstanceNotFound",
    "DBInstanceNotFoundFault",
    "DBClusterNotFound",
    "DBClusterNotFoundFault",
    "ClusterNotFoundException",
    "ServiceNotFoundException",
];

/// Known AWS error codes for throttling/rate limiting
const THROTTLING_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "RequestLimitExceeded",
    "TooManyRequestsException",
];

/// Known AWS error codes for missing permissions or stale credentials
const ACCESS_DENIED_CODES: &[&str] = &[
    "AccessDenied",
    "AccessDeniedException",
    "UnauthorizedOperation",
    "UnrecognizedClientException",
    "ExpiredToken",
    "ExpiredTokenException",
    "RequestExpired",
];

/// Classify an AWS error code, keeping the identity of what was being looked up.
pub fn classify_aws_error(
    resource_type: &'static str,
    resource_id: &str,
    code: Option<&str>,
    message: Option<&str>,
) -> AwsError {
    let message = message.unwrap_or("unknown error").to_string();

    match code {
        Some(c) if NOT_FOUND_CODES.contains(&c) => AwsError::NotFound {
            resource_type,
            resource_id: resource_id.to_string(),
        },
        Some(c) if THROTTLING_CODES.contains(&c) => AwsError::Throttled,
        Some(c) if ACCESS_DENIED_CODES.contains(&c) => AwsError::AccessDenied { message },
        _ => AwsError::Sdk {
            code: code.map(|s| s.to_string()),
            message,
        },
    }
}

/// Classify any SDK operation error via its error metadata.
///
/// `SdkError` forwards `ProvideErrorMetadata` to the service error it wraps,
/// so this covers every `send()` result in the adapters.
pub fn classify_sdk_error<E>(resource_type: &'static str, resource_id: &str, err: &E) -> AwsError
where
    E: ProvideErrorMetadata,
{
    classify_aws_error(resource_type, resource_id, err.code(), err.message())
}
