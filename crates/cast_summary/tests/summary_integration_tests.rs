//! Integration tests for provider and portfolio summaries.

use cast_forecast::{MockForecaster, ModelMetadata};
use cast_series::{CloudProvider, CostObservation};
use cast_summary::{CurrencyConverter, PortfolioSummary, ProviderSkip, SummaryAggregator};
use chrono::{Duration, NaiveDate};

fn history(provider: CloudProvider, service: &str, region: &str, currency: &str) -> Vec<CostObservation> {
    let start = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap();
    (0..10)
        .map(|d| {
            CostObservation::new(start + Duration::days(d), provider, service, 3.0)
                .with_region(region)
                .with_currency(currency)
        })
        .collect()
}

fn forecaster() -> MockForecaster {
    MockForecaster::new(ModelMetadata::new(None, 5, 7).with_quantiles(vec![0.1, 0.5, 0.9]))
        .with_steps(vec![1.0; 7])
}

#[test]
fn test_service_split_across_regions() {
    let mut rows = history(CloudProvider::Azure, "vm", "eastus", "INR");
    rows.extend(history(CloudProvider::Azure, "vm", "westeurope", "INR"));

    let aggregator = SummaryAggregator::new(CurrencyConverter::new("INR", "INR", 88.67).unwrap());
    let mock = forecaster();
    let outcome = aggregator.summarize_provider(CloudProvider::Azure, &rows, &mock);

    let summary = outcome.summary.unwrap();
    assert_eq!(summary.services.len(), 2);
    assert_eq!(summary.services[0].region, "eastus");
    assert_eq!(summary.weekly_total, 14.0);

    // Each group gets the last five days of its own history.
    let inputs = mock.get_inputs();
    assert_eq!(inputs.len(), 2);
    assert!(inputs.iter().all(|i| i.window.len() == 5 && i.time_idx_start == 5));
}

#[test]
fn test_partial_failure_is_reported_not_raised() {
    let mut rows = history(CloudProvider::Gcp, "bigquery", "us", "INR");
    rows.extend(history(CloudProvider::Gcp, "compute", "us", "INR"));
    rows.extend(history(CloudProvider::Gcp, "storage", "us", "INR"));

    let aggregator = SummaryAggregator::new(CurrencyConverter::new("INR", "INR", 88.67).unwrap());
    let mock = forecaster().fail_for_service("compute");
    let outcome = aggregator.summarize_provider(CloudProvider::Gcp, &rows, &mock);

    assert_eq!(mock.call_count(), 3);
    assert_eq!(outcome.failures.len(), 1);
    assert!(outcome.failures[0].to_string().contains("compute"));
    assert_eq!(outcome.summary.unwrap().weekly_total, 14.0);
}

#[test]
fn test_portfolio_serializes_by_provider() {
    let aggregator = SummaryAggregator::new(CurrencyConverter::new("USD", "INR", 88.67).unwrap());
    let mock = forecaster();

    let mut portfolio = PortfolioSummary::new();
    for provider in [CloudProvider::Aws, CloudProvider::Gcp] {
        let rows = history(provider, "storage", "us", "INR");
        if let Some(summary) = aggregator.summarize_provider(provider, &rows, &mock).summary {
            portfolio.insert(summary);
        }
    }
    portfolio.skip(CloudProvider::Azure, ProviderSkip::NotConfigured);

    assert_eq!(portfolio.currency(), Some("USD"));
    let weekly = portfolio.grand_total().unwrap().weekly;
    assert!((weekly - 14.0 / 88.67).abs() < 1e-9);

    let json = serde_json::to_value(&portfolio).unwrap();
    assert!(json["providers"]["aws"]["weekly_total"].is_number());
    assert_eq!(json["providers"]["gcp"]["currency"], "USD");
    assert_eq!(json["skipped"]["azure"]["kind"], "not_configured");
}
