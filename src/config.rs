//! Configuration for a connectivity check run

/// Which resource originates the connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSelector {
    /// Lambda function name or ARN
    Lambda(String),
    /// ECS service, "service" or "cluster:service"
    Ecs(String),
}

/// Output rendering for the evaluation trace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(anyhow::anyhow!(
                "unknown output format '{other}' (expected text or json)"
            )),
        }
    }
}

/// Everything one check run needs, assembled from CLI args
#[derive(Debug, Clone)]
pub struct CheckConfig {
    /// Connection source
    pub source: SourceSelector,
    /// RDS instance or cluster name the connection targets
    pub rds_target: String,
    /// Destination port; when absent the RDS endpoint port is used
    pub port: Option<u32>,
    /// AWS region
    pub region: String,
    /// AWS profile name (overrides default credential resolution)
    pub aws_profile: Option<String>,
    /// Trace rendering
    pub format: OutputFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_formats() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
    }

    #[test]
    fn rejects_unknown_format() {
        let err = "yaml".parse::<OutputFormat>().unwrap_err();
        assert!(err.to_string().contains("yaml"));
    }
}
