//! conncheck - AWS connectivity diagnosis
//!
//! Determines whether one AWS resource (a Lambda function or ECS service)
//! can open a connection to another (an RDS instance or cluster) on a given
//! port, by checking VPC membership and security-group ingress rules.
//!
//! The `engine` module holds the evaluation logic and is independent of AWS;
//! it sees only normalized descriptors and two injected lookup capabilities.
//! The `aws` module supplies those capabilities and the per-service resolver
//! adapters that produce descriptors from live AWS APIs.

pub mod aws;
pub mod config;
pub mod engine;
pub mod report;
