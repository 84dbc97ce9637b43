//! conncheck: diagnose AWS network connectivity between two resources
//!
//! Answers "can this Lambda function or ECS service reach that RDS database
//! on this port?" by checking VPC membership and security-group ingress
//! rules, and prints a trace of every check so a failure points at the
//! offending configuration.

use anyhow::{Context, Result};
use clap::Parser;
use conncheck::aws::{self, AwsContext, Ec2Client, EcsResolver, LambdaResolver, RdsResolver};
use conncheck::config::{CheckConfig, OutputFormat, SourceSelector};
use conncheck::engine::{self, ConnectivityEngine, Verdict};
use conncheck::report;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "conncheck")]
#[command(about = "Determines whether one AWS resource can connect to another")]
#[command(version)]
#[command(group = clap::ArgGroup::new("source").required(true).args(["from_lambda", "from_ecs"]))]
struct Args {
    /// The Lambda function that is trying to make a connection (name or ARN)
    #[arg(long, value_name = "FUNCTION_NAME")]
    from_lambda: Option<String>,

    /// The ECS service that is trying to make a connection; either a name
    /// alone (default cluster) or CLUSTER:NAME
    #[arg(long, value_name = "SERVICE")]
    from_ecs: Option<String>,

    /// The RDS instance or cluster the connection targets; a cluster name
    /// resolves to its writer instance
    #[arg(long, value_name = "INSTANCE_NAME")]
    to_rds: String,

    /// Destination port; defaults to the RDS endpoint port
    #[arg(long)]
    port: Option<u32>,

    /// AWS region
    #[arg(long, default_value = "us-east-2")]
    region: String,

    /// AWS profile to use (overrides AWS_PROFILE env var)
    #[arg(long)]
    aws_profile: Option<String>,

    /// Output format (text, json)
    #[arg(long, default_value = "text")]
    format: String,
}

impl Args {
    fn into_config(self) -> Result<CheckConfig> {
        let source = match (self.from_lambda, self.from_ecs) {
            (Some(name), None) => SourceSelector::Lambda(name),
            (None, Some(spec)) => SourceSelector::Ecs(spec),
            // clap's arg group guarantees exactly one
            _ => unreachable!("clap enforces exactly one source"),
        };
        Ok(CheckConfig {
            source,
            rds_target: self.to_rds,
            port: self.port,
            region: self.region,
            aws_profile: self.aws_profile,
            format: self.format.parse::<OutputFormat>()?,
        })
    }
}

#[tokio::main]
async fn main() {
    match run().await {
        Ok(verdict) => std::process::exit(exit_code(verdict)),
        Err(e) => {
            print_error(&e);
            std::process::exit(2);
        }
    }
}

/// Exit codes follow the convention scripts already depend on:
/// 0 reachable, 2 the check itself failed, 3 not reachable.
fn exit_code(verdict: Verdict) -> i32 {
    match verdict {
        Verdict::Allowed => 0,
        Verdict::Blocked | Verdict::Indeterminate => 3,
    }
}

/// Print error in a user-friendly way
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let mut stderr = std::io::stderr();

    let _ = writeln!(stderr, "\n\x1b[1;31mError:\x1b[0m {e}");

    let mut source = e.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  \x1b[33mCaused by:\x1b[0m {cause}");
        source = cause.source();
    }

    let suggestion = e
        .chain()
        .find_map(|cause| cause.downcast_ref::<aws::AwsError>())
        .and_then(|aws_err| aws_err.suggestion());
    if let Some(suggestion) = suggestion {
        let _ = writeln!(stderr, "  \x1b[36mHint:\x1b[0m {suggestion}");
    }
}

async fn run() -> Result<Verdict> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Args::parse().into_config()?;

    // A bad port should fail before we spend any API calls
    if let Some(port) = config.port {
        engine::validate_port(port)?;
    }

    let ctx = AwsContext::new(&config.region, config.aws_profile.as_deref()).await;
    aws::validate_credentials(ctx.sdk_config()).await?;

    let ec2 = Ec2Client::from_context(&ctx);

    info!(region = %config.region, "Loading resource information");
    let source = match &config.source {
        SourceSelector::Lambda(name) => {
            LambdaResolver::from_context(&ctx).resolve(name).await?
        }
        SourceSelector::Ecs(spec) => {
            EcsResolver::from_context(&ctx).resolve(spec, &ec2).await?
        }
    };
    let target = RdsResolver::from_context(&ctx)
        .resolve(&config.rds_target)
        .await?;

    let port = config
        .port
        .or(target.endpoint_port.map(u32::from))
        .context("no --port given and the RDS endpoint did not report one")?;

    let evaluation = ConnectivityEngine::new(&ec2, &ec2)
        .evaluate(&source, &target.descriptor, port)
        .await?;

    match config.format {
        OutputFormat::Text => print!("{}", report::render_text(&evaluation)),
        OutputFormat::Json => println!("{}", report::render_json(&evaluation)?),
    }

    Ok(evaluation.verdict)
}
