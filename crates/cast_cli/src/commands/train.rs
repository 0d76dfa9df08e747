//! Train command - Fit and save provider forecasters.

use std::path::PathBuf;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use clap::Args;
use tracing::{info, warn};

use cast_series::CloudProvider;
use cast_service::{CloudcastConfig, TrainReport, Trainer};
use cast_store::ProviderStores;

use super::parse_provider;

#[derive(Args)]
pub struct TrainArgs {
    /// Provider to train (defaults to every provider with a store)
    #[arg(short, long, value_parser = parse_provider)]
    pub(crate) provider: Option<CloudProvider>,

    /// Also save the model as the default forecaster
    #[arg(long, requires = "provider")]
    pub(crate) as_default: bool,

    /// Treat this date as today (YYYY-MM-DD)
    #[arg(long)]
    as_of: Option<NaiveDate>,

    /// Model artifact directory (overrides CLOUDCAST_MODEL_DIR)
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Print reports as JSON
    #[arg(long)]
    json: bool,
}

pub async fn execute(args: TrainArgs) -> Result<()> {
    let mut config = CloudcastConfig::from_env();
    if let Some(dir) = &args.model_dir {
        config = config.with_model_dir(dir);
    }
    let stores = ProviderStores::from_paths(&config.store_paths);
    let today = args.as_of.unwrap_or_else(|| Utc::now().date_naive());

    let providers = match args.provider {
        Some(provider) => vec![provider],
        None => stores.providers(),
    };
    if providers.is_empty() {
        anyhow::bail!("No cost store configured; set CLOUDCAST_<PROVIDER>_STORE");
    }

    let trainer = Trainer::new(&config, &stores);
    let mut first_error = None;
    for provider in providers {
        info!("[{}] Training from {} day(s) of history", provider.tag(), config.training_lookback_days);
        match trainer.train(provider, today, args.as_default).await {
            Ok(report) if args.json => println!("{}", serde_json::to_string_pretty(&report)?),
            Ok(report) => print_report(&report),
            Err(e) => {
                warn!("[{}] Training failed: {}", provider.tag(), e);
                if first_error.is_none() {
                    first_error = Some(anyhow::Error::new(e).context(format!("Training {} failed", provider)));
                }
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn print_report(report: &TrainReport) {
    println!("✅ {} trained", report.provider);
    println!("   Rows:       {}", report.rows);
    println!("   Series:     {}", report.series);
    println!(
        "   Windows:    encoder {} / horizon {}",
        report.plan.encoder_length, report.plan.prediction_length
    );
    println!("   Cutoff:     time_idx {}", report.cutoff);
    if !report.dropped.is_empty() {
        println!("   Dropped:    {}", report.dropped.join(", "));
    }
    if let Some(v) = &report.validation {
        println!("   Validation: MAE {:.4}, RMSE {:.4}", v.mae, v.rmse);
    }
    for path in &report.artifacts {
        println!("   Saved:      {}", path.display());
    }
}
