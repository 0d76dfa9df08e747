//! Summary command - Forecast spend per provider.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;

use cast_service::{CloudcastConfig, ForecastService, SummaryResponse};

#[derive(Args)]
pub struct SummaryArgs {
    /// Days of history to forecast from (overrides CLOUDCAST_LOOKBACK_DAYS)
    #[arg(short, long)]
    lookback_days: Option<u32>,

    /// Treat this date as today (YYYY-MM-DD)
    #[arg(long)]
    as_of: Option<NaiveDate>,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

pub async fn execute(args: SummaryArgs) -> Result<()> {
    let service = ForecastService::from_config(CloudcastConfig::from_env())
        .context("Failed to load forecasters")?;

    let response = match args.as_of {
        Some(today) => {
            let lookback = args.lookback_days.unwrap_or(service.config().lookback_days);
            service.summary_as_of(lookback, today).await?
        }
        None => service.summary(args.lookback_days).await?,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_summary(&response);
    }
    Ok(())
}

fn print_summary(response: &SummaryResponse) {
    println!(
        "📊 Spend forecast as of {} ({} day lookback, reported in {})",
        response.as_of, response.lookback_days, response.reporting_currency
    );
    for (provider, summary) in &response.portfolio.providers {
        println!();
        println!(
            "{}: weekly {:.2}  monthly {:.2}  yearly {:.2}  [{}]",
            provider, summary.weekly_total, summary.monthly_total, summary.yearly_total, summary.currency
        );
        for service in &summary.services {
            println!(
                "   - {} ({}): weekly {:.2} {}",
                service.service, service.region, service.totals.weekly, service.currency
            );
        }
    }
    for (provider, reason) in &response.portfolio.skipped {
        println!();
        println!("⚠️  {} skipped: {}", provider, reason);
    }
}
