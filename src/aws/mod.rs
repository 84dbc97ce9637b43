//! AWS collaborators for the evaluation engine
//!
//! This module supplies everything the engine treats as external:
//! - context: shared SDK configuration
//! - account: credential validation via STS
//! - ec2: subnet and security-group rule lookups
//! - lambda / ecs / rds: resolver adapters producing descriptors
//! - error: AWS error-code classification

pub mod account;
pub mod context;
pub mod ec2;
pub mod ecs;
pub mod error;
pub mod lambda;
pub mod rds;

pub use account::validate_credentials;
pub use context::AwsContext;
pub use ec2::Ec2Client;
pub use ecs::EcsResolver;
pub use error::{classify_aws_error, classify_sdk_error, AwsError};
pub use lambda::LambdaResolver;
pub use rds::{RdsResolver, RdsTarget};
