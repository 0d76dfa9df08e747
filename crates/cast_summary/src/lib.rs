//! # cast_summary
//!
//! Turns per-group forecasts into weekly, monthly and yearly spend per
//! provider, normalized into one reporting currency.
//!
//! ```rust,ignore
//! use cast_summary::{CurrencyConverter, SummaryAggregator};
//!
//! let aggregator = SummaryAggregator::new(CurrencyConverter::new("INR", "INR", 88.67)?);
//! let outcome = aggregator.summarize_provider(CloudProvider::Gcp, &rows, forecaster.as_ref());
//! for failure in &outcome.failures {
//!     eprintln!("skipped {}", failure.group);
//! }
//! ```

pub mod aggregator;
pub mod currency;
pub mod error;
pub mod portfolio;

pub use aggregator::{
    GroupForecastError, GroupOutcome, ProviderSummary, ServiceForecast, SpendTotals,
    SummaryAggregator, SummaryOutcome, DAYS_PER_MONTH, MONTHS_PER_YEAR,
};
pub use currency::{Converted, CurrencyConverter, MIXED_CURRENCY, USD};
pub use error::{SummaryError, SummaryResult};
pub use portfolio::{PortfolioSummary, ProviderSkip};
