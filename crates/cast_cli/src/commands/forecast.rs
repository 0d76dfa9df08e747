//! Forecast command - Forecast one service from recent daily costs.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use cast_series::UNKNOWN;
use cast_service::{CloudcastConfig, ForecastRequest, ForecastService};

#[derive(Args)]
pub struct ForecastArgs {
    /// JSON file holding a full forecast request
    #[arg(long, conflicts_with_all = ["provider", "service", "costs"])]
    request: Option<PathBuf>,

    /// Provider key (aws, azure, gcp)
    #[arg(short, long, required_unless_present = "request")]
    provider: Option<String>,

    /// Service name
    #[arg(short, long, required_unless_present = "request")]
    service: Option<String>,

    #[arg(long, default_value = UNKNOWN)]
    region: String,

    #[arg(long, default_value = UNKNOWN)]
    currency: String,

    /// Recent daily costs, oldest first, comma separated
    #[arg(long, value_delimiter = ',')]
    pub(crate) costs: Vec<f64>,

    /// time_idx of the first cost
    #[arg(long, default_value_t = 0)]
    time_idx_start: i64,
}

impl ForecastArgs {
    async fn into_request(self) -> Result<ForecastRequest> {
        if let Some(path) = &self.request {
            let content = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {:?}", path))?;
            return serde_json::from_str(&content)
                .with_context(|| format!("Invalid forecast request in {:?}", path));
        }
        Ok(ForecastRequest {
            provider: self.provider.unwrap_or_default(),
            service: self.service.unwrap_or_default(),
            region: self.region,
            currency: self.currency,
            recent_costs: self.costs,
            time_idx_start: self.time_idx_start,
        })
    }
}

pub async fn execute(args: ForecastArgs) -> Result<()> {
    let request = args.into_request().await?;
    let service = ForecastService::from_config(CloudcastConfig::from_env())
        .context("Failed to load forecasters")?;

    info!(
        "Forecasting {}/{} from {} recent cost(s)",
        request.provider,
        request.service,
        request.recent_costs.len()
    );
    let response = service.forecast(&request)?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{Cli, Commands};
    use clap::Parser;

    fn args(argv: &[&str]) -> ForecastArgs {
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Forecast(args) => args,
            _ => panic!("expected forecast"),
        }
    }

    #[tokio::test]
    async fn test_request_from_flags() {
        let request = args(&["cloudcast", "forecast", "-p", "aws", "-s", "ec2", "--costs", "4,5"])
            .into_request()
            .await
            .unwrap();
        assert_eq!(request.provider, "aws");
        assert_eq!(request.region, UNKNOWN);
        assert_eq!(request.recent_costs, vec![4.0, 5.0]);
    }

    #[tokio::test]
    async fn test_request_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("request.json");
        std::fs::write(
            &path,
            r#"{"provider":"gcp","service":"bq","region":"eu","currency":"USD","recent_costs":[1.0]}"#,
        )
        .unwrap();

        let request = args(&["cloudcast", "forecast", "--request", path.to_str().unwrap()])
            .into_request()
            .await
            .unwrap();
        assert_eq!(request.service, "bq");
        assert_eq!(request.time_idx_start, 0);
    }
}
