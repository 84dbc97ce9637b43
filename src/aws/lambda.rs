//! Lambda resolver adapter
//!
//! Produces the source-side descriptor for a Lambda function. A function
//! without VPC configuration yields a descriptor with no VPC attachment;
//! the engine then reports it as unreachable-by-this-model rather than
//! erroring here.

use crate::aws::context::AwsContext;
use crate::aws::error::classify_sdk_error;
use crate::engine::{LookupError, ResourceDescriptor};
use tracing::info;

/// Resolves a Lambda function (by name or ARN) to a [`ResourceDescriptor`]
pub struct LambdaResolver {
    client: aws_sdk_lambda::Client,
}

impl LambdaResolver {
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.lambda_client(),
        }
    }

    pub async fn resolve(&self, function_name: &str) -> Result<ResourceDescriptor, LookupError> {
        let response = self
            .client
            .get_function()
            .function_name(function_name)
            .send()
            .await
            .map_err(|e| {
                LookupError::from(classify_sdk_error("lambda function", function_name, &e))
            })?;

        let config = response.configuration().ok_or_else(|| {
            LookupError::Failed(anyhow::anyhow!(
                "GetFunction returned no configuration for '{function_name}'"
            ))
        })?;

        let name = config.function_name().unwrap_or(function_name);
        let mut descriptor = ResourceDescriptor::new("lambda", name);

        // The API reports an empty VpcConfig for functions outside any VPC
        if let Some(vpc_config) = config.vpc_config() {
            if let Some(vpc_id) = vpc_config.vpc_id().filter(|id| !id.is_empty()) {
                descriptor = descriptor
                    .with_vpc(vpc_id)
                    .with_subnets(vpc_config.subnet_ids().to_vec())
                    .with_security_groups(vpc_config.security_group_ids().to_vec());
            }
        }

        info!(
            function = %descriptor.id,
            vpc = ?descriptor.vpc_id,
            subnets = descriptor.subnet_ids.len(),
            security_groups = descriptor.security_group_ids.len(),
            "Resolved Lambda function"
        );

        Ok(descriptor)
    }
}
