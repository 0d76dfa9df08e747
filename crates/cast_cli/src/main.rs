//! cloudcast CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments or request
//! - 3: Insufficient history
//! - 4: Configuration error

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cast_forecast::ForecastError;
use cast_series::SeriesError;
use cast_service::ServiceError;
use cast_store::StoreError;

mod commands;

use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const INSUFFICIENT_DATA: u8 = 3;
    pub const CONFIGURATION_ERROR: u8 = 4;
}

/// Crates whose logs follow `--verbose` / `--quiet`.
const LOG_TARGETS: &[&str] = &[
    "cast_cli",
    "cast_series",
    "cast_forecast",
    "cast_store",
    "cast_summary",
    "cast_service",
];

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Ingest(args) => commands::ingest::execute(args).await,
        Commands::Train(args) => commands::train::execute(args).await,
        Commands::Forecast(args) => commands::forecast::execute(args).await,
        Commands::Summary(args) => commands::summary::execute(args).await,
        Commands::Providers(args) => commands::providers::execute(args).await,
        Commands::Serve(args) => commands::serve::execute(args).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = log_filter(rust_log.as_deref(), verbose, quiet);

    // Already initialized is fine
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .try_init();
}

/// A non-empty `RUST_LOG` is used as-is; otherwise the flags pick the level.
fn log_filter(rust_log: Option<&str>, verbose: bool, quiet: bool) -> EnvFilter {
    if let Some(filter) = rust_log
        .filter(|s| !s.trim().is_empty())
        .and_then(|s| EnvFilter::try_new(s).ok())
    {
        return filter;
    }

    let level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };

    let mut filter = EnvFilter::default().add_directive(LevelFilter::WARN.into());
    for target in LOG_TARGETS {
        if let Ok(directive) = format!("{}={}", target, level).parse() {
            filter = filter.add_directive(directive);
        }
    }
    if verbose {
        if let Ok(directive) = "tower_http=debug".parse() {
            filter = filter.add_directive(directive);
        }
    }
    filter
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if let Some(err) = cause.downcast_ref::<ServiceError>() {
            if err.is_insufficient_data() {
                return ExitCodes::INSUFFICIENT_DATA;
            }
            if err.is_configuration() {
                return ExitCodes::CONFIGURATION_ERROR;
            }
            if matches!(err.status_code().as_u16(), 400 | 404) {
                return ExitCodes::INVALID_ARGS;
            }
        }
        if let Some(err) = cause.downcast_ref::<SeriesError>() {
            if err.is_insufficient_data() {
                return ExitCodes::INSUFFICIENT_DATA;
            }
        }
        if let Some(err) = cause.downcast_ref::<StoreError>() {
            match err {
                StoreError::NotConfigured(_) => return ExitCodes::CONFIGURATION_ERROR,
                StoreError::InvalidRecord(_) | StoreError::Corrupt { .. } => {
                    return ExitCodes::INVALID_ARGS
                }
                _ => {}
            }
        }
        if let Some(
            ForecastError::UnregisteredProvider(_) | ForecastError::InvalidInput(_),
        ) = cause.downcast_ref::<ForecastError>()
        {
            return ExitCodes::INVALID_ARGS;
        }
    }
    ExitCodes::GENERAL_ERROR
}
