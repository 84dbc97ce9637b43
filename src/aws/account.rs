//! Credential validation
//!
//! A cheap STS call made before any resource lookup, so bad or expired
//! credentials fail fast with a clear message instead of surfacing as an
//! opaque error halfway through the diagnosis.

use anyhow::{Context, Result};
use tracing::info;

/// Validate the configured credentials via STS `GetCallerIdentity` and
/// return the account ID they belong to.
///
/// Requires no special permissions; it succeeds whenever the credentials
/// are valid.
pub async fn validate_credentials(config: &aws_config::SdkConfig) -> Result<String> {
    let sts = aws_sdk_sts::Client::new(config);
    let identity = sts
        .get_caller_identity()
        .send()
        .await
        .context("Failed to get AWS caller identity - check credentials")?;

    let account = identity
        .account()
        .context("No account ID returned from STS GetCallerIdentity")?;

    info!(account_id = %account, "AWS credentials validated");

    Ok(account.to_string())
}
