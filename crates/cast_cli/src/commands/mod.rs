//! CLI command definitions.
//!
//! Every command reads its settings from the environment (and `.env`)
//! through `CloudcastConfig::from_env`; flags override single values.

use cast_series::CloudProvider;
use clap::{Parser, Subcommand};

pub mod forecast;
pub mod ingest;
pub mod providers;
pub mod serve;
pub mod summary;
pub mod train;

/// cloudcast - multi-cloud spend forecasting
#[derive(Parser)]
#[command(name = "cloudcast")]
#[command(version, about = "cloudcast - multi-cloud spend forecasting")]
#[command(long_about = r#"
cloudcast stores daily cloud billing rows per provider, trains one forecaster
per provider and serves per-service forecasts and spend summaries.

WORKFLOWS:
  ingest     → Upsert daily cost rows from a JSON-lines file
  train      → Fit and save a provider's forecaster
  forecast   → Forecast one service from recent costs
  summary    → Weekly/monthly/yearly spend summary per provider
  providers  → List providers with a loaded forecaster
  serve      → Serve the HTTP API

CONFIGURATION:
  CLOUDCAST_<PROVIDER>_STORE      Cost store path per provider (AWS, AZURE, GCP)
  CLOUDCAST_MODEL_DIR             Model artifact directory
  CLOUDCAST_REPORTING_CURRENCY    Currency summaries are reported in
  CLOUDCAST_USD_TO_LOCAL_RATE     USD to local currency rate

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments or request
  3 - Insufficient history
  4 - Configuration error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upsert daily cost rows into the provider stores
    Ingest(ingest::IngestArgs),

    /// Train and save forecasters
    Train(train::TrainArgs),

    /// Forecast one service from recent daily costs
    Forecast(forecast::ForecastArgs),

    /// Summarize forecast spend across providers
    Summary(summary::SummaryArgs),

    /// List providers with a loaded forecaster
    Providers(providers::ProvidersArgs),

    /// Serve the HTTP API
    Serve(serve::ServeArgs),
}

/// Parse a `--provider` value.
pub fn parse_provider(s: &str) -> Result<CloudProvider, String> {
    CloudProvider::parse(s).ok_or_else(|| format!("unknown provider '{}' (expected aws, azure or gcp)", s))
}
