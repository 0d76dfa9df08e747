//! Providers command - List loaded forecasters.

use anyhow::{Context, Result};
use clap::Args;

use cast_service::{CloudcastConfig, ForecastService};

#[derive(Args)]
pub struct ProvidersArgs {
    /// Print as a JSON array
    #[arg(long)]
    json: bool,
}

pub async fn execute(args: ProvidersArgs) -> Result<()> {
    let service = ForecastService::from_config(CloudcastConfig::from_env())
        .context("Failed to load forecasters")?;
    let providers = service.providers();

    if args.json {
        println!("{}", serde_json::to_string(&providers)?);
    } else if providers.is_empty() {
        println!("No forecasters found under {:?}", service.config().model_dir);
    } else {
        for provider in providers {
            println!("{}", provider);
        }
    }
    Ok(())
}
