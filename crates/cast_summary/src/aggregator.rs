//! Rolling per-group forecasts up into provider totals.
//!
//! Each `(service, region, currency)` group is forecast independently. A
//! group that fails is recorded as a [`GroupForecastError`] and left out of
//! the totals; it never aborts the rest of the provider.

use cast_forecast::{ForecastInput, Forecaster};
use cast_series::{group_by_group_key, normalize_calendar, CloudProvider, CostObservation, GroupKey};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::currency::{CurrencyConverter, MIXED_CURRENCY};

/// Days per month used to scale the daily average.
pub const DAYS_PER_MONTH: f64 = 30.0;

/// Months per year used to scale the monthly figure.
pub const MONTHS_PER_YEAR: f64 = 12.0;

/// Weekly, monthly and yearly spend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SpendTotals {
    pub weekly: f64,
    pub monthly: f64,
    pub yearly: f64,
}

impl SpendTotals {
    /// Scale a horizon's predictions into the three figures.
    ///
    /// `weekly` is the plain sum of the horizon; the monthly and yearly
    /// figures come from the daily average with fixed 30-day months and
    /// 12-month years.
    pub fn from_predictions(predictions: &[f64]) -> Self {
        let weekly: f64 = predictions.iter().sum();
        let daily_avg = weekly / predictions.len().max(1) as f64;
        let monthly = daily_avg * DAYS_PER_MONTH;
        Self {
            weekly,
            monthly,
            yearly: monthly * MONTHS_PER_YEAR,
        }
    }

    pub fn map(self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            weekly: f(self.weekly),
            monthly: f(self.monthly),
            yearly: f(self.yearly),
        }
    }

    /// Every figure clamped at zero.
    pub fn floored(self) -> Self {
        self.map(|v| v.max(0.0))
    }

    pub fn add(&mut self, other: &SpendTotals) {
        self.weekly += other.weekly;
        self.monthly += other.monthly;
        self.yearly += other.yearly;
    }
}

/// Forecast for one `(service, region, currency)` group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceForecast {
    pub service: String,
    pub region: String,
    /// Currency of `totals`, after conversion
    pub currency: String,
    /// Currency the history was billed in
    pub source_currency: String,
    pub horizon_days: usize,
    pub totals: SpendTotals,
}

/// Rolled-up forecast for one provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSummary {
    pub provider: CloudProvider,
    pub weekly_total: f64,
    pub monthly_total: f64,
    pub yearly_total: f64,
    /// Shared currency of every service, or `"mixed"`
    pub currency: String,
    /// Ordered by service, region, then currency
    pub services: Vec<ServiceForecast>,
}

impl ProviderSummary {
    /// Combine successful group forecasts; `None` when there are none.
    pub fn from_services(provider: CloudProvider, services: Vec<ServiceForecast>) -> Option<Self> {
        let first_currency = services.first()?.currency.clone();
        let currency = if services.iter().all(|s| s.currency == first_currency) {
            first_currency
        } else {
            MIXED_CURRENCY.to_string()
        };

        let mut totals = SpendTotals::default();
        for service in &services {
            totals.add(&service.totals);
        }

        Some(Self {
            provider,
            weekly_total: totals.weekly,
            monthly_total: totals.monthly,
            yearly_total: totals.yearly,
            currency,
            services,
        })
    }

    pub fn totals(&self) -> SpendTotals {
        SpendTotals {
            weekly: self.weekly_total,
            monthly: self.monthly_total,
            yearly: self.yearly_total,
        }
    }

    pub fn is_mixed_currency(&self) -> bool {
        self.currency == MIXED_CURRENCY
    }
}

/// A group whose forecast could not be produced.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("forecast failed for {group}: {reason}")]
pub struct GroupForecastError {
    pub group: GroupKey,
    pub reason: String,
}

/// Outcome of one group's forecast.
pub type GroupOutcome = Result<ServiceForecast, GroupForecastError>;

/// Everything one provider's summary run produced.
#[derive(Debug, Clone)]
pub struct SummaryOutcome {
    pub provider: CloudProvider,
    /// Absent when no group was forecast successfully
    pub summary: Option<ProviderSummary>,
    pub failures: Vec<GroupForecastError>,
}

impl SummaryOutcome {
    pub fn groups_attempted(&self) -> usize {
        self.failures.len() + self.summary.as_ref().map_or(0, |s| s.services.len())
    }
}

/// Builds provider summaries from recent history and a forecaster.
#[derive(Debug, Clone)]
pub struct SummaryAggregator {
    converter: CurrencyConverter,
}

impl SummaryAggregator {
    pub fn new(converter: CurrencyConverter) -> Self {
        Self { converter }
    }

    pub fn converter(&self) -> &CurrencyConverter {
        &self.converter
    }

    /// Forecast every group of `provider` found in `rows` and roll them up.
    ///
    /// Rows of other providers are ignored. Groups run in key order, so the
    /// same rows always produce the same totals.
    pub fn summarize_provider(
        &self,
        provider: CloudProvider,
        rows: &[CostObservation],
        forecaster: &dyn Forecaster,
    ) -> SummaryOutcome {
        let tag = provider.tag();
        let outcomes = self.forecast_groups(provider, rows, forecaster);

        let mut services = Vec::new();
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(service) => services.push(service),
                Err(failure) => {
                    warn!("[{}] Skipping group: {}", tag, failure);
                    failures.push(failure);
                }
            }
        }

        let summary = ProviderSummary::from_services(provider, services);
        match &summary {
            Some(s) => info!(
                "[{}] Summary over {} group(s): weekly {:.2} {} ({} skipped)",
                tag,
                s.services.len(),
                s.weekly_total,
                s.currency,
                failures.len()
            ),
            None => info!("[{}] No group could be forecast; no summary", tag),
        }

        SummaryOutcome {
            provider,
            summary,
            failures,
        }
    }

    /// One outcome per group, in group key order.
    pub fn forecast_groups(
        &self,
        provider: CloudProvider,
        rows: &[CostObservation],
        forecaster: &dyn Forecaster,
    ) -> Vec<GroupOutcome> {
        let own: Vec<CostObservation> = rows
            .iter()
            .filter(|r| r.provider == provider)
            .cloned()
            .collect();
        let grouped = group_by_group_key(&own);
        debug!(
            "[{}] Forecasting {} group(s) from {} row(s)",
            provider.tag(),
            grouped.len(),
            own.len()
        );

        let (keys, series): (Vec<GroupKey>, Vec<_>) = grouped.into_iter().unzip();
        let series = normalize_calendar(series);

        keys.into_iter()
            .zip(series)
            .map(|(group, s)| {
                let start = s.first().map_or(0, |p| p.time_idx);
                self.forecast_group(group, &s.costs(), start, forecaster)
            })
            .collect()
    }

    fn forecast_group(
        &self,
        group: GroupKey,
        costs: &[f64],
        time_idx_start: i64,
        forecaster: &dyn Forecaster,
    ) -> GroupOutcome {
        let encoder_length = forecaster.metadata().encoder_length;
        let failed = |group: &GroupKey, reason: String| GroupForecastError {
            group: group.clone(),
            reason,
        };

        let input = ForecastInput::from_recent(group.clone(), costs, encoder_length, time_idx_start)
            .map_err(|e| failed(&group, e.to_string()))?;
        let forecast = forecaster
            .predict(&input)
            .map_err(|e| failed(&group, e.to_string()))?;

        let median = forecast.median();
        if median.iter().any(|v| !v.is_finite()) {
            return Err(failed(&group, "forecast contains a non-finite value".to_string()));
        }

        let raw = SpendTotals::from_predictions(median);
        let converted = self.converter.convert(1.0, &group.currency);
        let factor = converted.amount;
        let currency = converted.currency.into_owned();
        let totals = raw.map(|v| v * factor).floored();

        debug!(
            "[{}] {} weekly {:.2} {}",
            group.provider.tag(),
            group.service,
            totals.weekly,
            currency
        );

        Ok(ServiceForecast {
            service: group.service,
            region: group.region,
            currency,
            source_currency: group.currency,
            horizon_days: median.len(),
            totals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cast_forecast::{ForecastError, ForecastResult, ModelMetadata, QuantileForecast};
    use chrono::{Duration, NaiveDate};
    use mockall::mock;

    mock! {
        pub Model {}

        impl Forecaster for Model {
            fn metadata(&self) -> &ModelMetadata;
            fn predict(&self, input: &ForecastInput) -> ForecastResult<QuantileForecast>;
        }
    }

    fn rows(service: &str, currency: &str, costs: &[f64]) -> Vec<CostObservation> {
        let start = NaiveDate::from_ymd_opt(2024, 8, 1).unwrap();
        costs
            .iter()
            .enumerate()
            .map(|(i, c)| {
                CostObservation::new(start + Duration::days(i as i64), CloudProvider::Gcp, service, *c)
                    .with_region("us")
                    .with_currency(currency)
            })
            .collect()
    }

    fn aggregator() -> SummaryAggregator {
        SummaryAggregator::new(CurrencyConverter::new("INR", "INR", 88.67).unwrap())
    }

    fn model_returning(per_day: f64) -> MockModel {
        let mut model = MockModel::new();
        model
            .expect_metadata()
            .return_const(ModelMetadata::new(None, 3, 7).with_quantiles(vec![0.1, 0.5, 0.9]));
        model.expect_predict().returning(move |_| {
            QuantileForecast::new(
                vec![0.1, 0.5, 0.9],
                vec![vec![0.0; 7], vec![per_day; 7], vec![100.0; 7]],
            )
        });
        model
    }

    #[test]
    fn test_rollup_arithmetic() {
        let totals = SpendTotals::from_predictions(&[10.0; 7]);
        assert_eq!(totals.weekly, 70.0);
        assert_eq!(totals.monthly, 300.0);
        assert_eq!(totals.yearly, 3600.0);

        let empty = SpendTotals::from_predictions(&[]);
        assert_eq!(empty, SpendTotals::default());
    }

    #[test]
    fn test_single_group_uses_median() {
        let outcome = aggregator().summarize_provider(
            CloudProvider::Gcp,
            &rows("bq", "INR", &[5.0, 6.0]),
            &model_returning(2.0),
        );

        let summary = outcome.summary.unwrap();
        assert_eq!(summary.weekly_total, 14.0);
        assert_eq!(summary.monthly_total, 60.0);
        assert_eq!(summary.yearly_total, 720.0);
        assert_eq!(summary.currency, "INR");
        assert_eq!(summary.services[0].horizon_days, 7);
    }

    #[test]
    fn test_usd_group_is_converted() {
        let outcome = aggregator().summarize_provider(
            CloudProvider::Gcp,
            &rows("bq", "USD", &[1.0]),
            &model_returning(1.0),
        );

        let summary = outcome.summary.unwrap();
        assert!((summary.weekly_total - 7.0 * 88.67).abs() < 1e-9);
        assert_eq!(summary.currency, "INR");
        assert_eq!(summary.services[0].source_currency, "USD");
    }

    #[test]
    fn test_unconvertible_group_makes_currency_mixed() {
        let mut all = rows("bq", "INR", &[1.0]);
        all.extend(rows("gcs", "EUR", &[1.0]));

        let summary = aggregator()
            .summarize_provider(CloudProvider::Gcp, &all, &model_returning(1.0))
            .summary
            .unwrap();
        assert!(summary.is_mixed_currency());
        assert_eq!(summary.services.len(), 2);
        assert_eq!(summary.services[1].currency, "EUR");
    }

    #[test]
    fn test_currency_case_does_not_make_mixed() {
        let mut all = rows("bq", "eur", &[1.0]);
        all.extend(rows("gcs", "EUR", &[1.0]));

        let summary = aggregator()
            .summarize_provider(CloudProvider::Gcp, &all, &model_returning(1.0))
            .summary
            .unwrap();
        assert!(!summary.is_mixed_currency());
        assert_eq!(summary.currency, "EUR");
        assert_eq!(summary.services[0].source_currency, "eur");
    }

    #[test]
    fn test_negative_predictions_are_floored() {
        let outcome = aggregator().summarize_provider(
            CloudProvider::Gcp,
            &rows("bq", "INR", &[1.0]),
            &model_returning(-3.0),
        );

        let summary = outcome.summary.unwrap();
        assert_eq!(summary.weekly_total, 0.0);
        assert_eq!(summary.monthly_total, 0.0);
        assert_eq!(summary.yearly_total, 0.0);
    }

    #[test]
    fn test_failing_group_is_skipped() {
        let mut all = rows("a-compute", "INR", &[1.0, 1.0]);
        all.extend(rows("b-network", "INR", &[1.0, 1.0]));
        all.extend(rows("c-storage", "INR", &[1.0, 1.0]));

        let mut model = MockModel::new();
        model
            .expect_metadata()
            .return_const(ModelMetadata::new(None, 2, 2).with_quantiles(vec![0.5]));
        model.expect_predict().times(3).returning(|input| {
            if input.group.service == "b-network" {
                Err(ForecastError::Model("backend timed out".to_string()))
            } else {
                QuantileForecast::new(vec![0.5], vec![vec![1.0, 1.0]])
            }
        });

        let outcome = aggregator().summarize_provider(CloudProvider::Gcp, &all, &model);

        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].group.service, "b-network");
        assert_eq!(outcome.groups_attempted(), 3);

        let summary = outcome.summary.unwrap();
        let services: Vec<&str> = summary.services.iter().map(|s| s.service.as_str()).collect();
        assert_eq!(services, vec!["a-compute", "c-storage"]);
        assert_eq!(summary.weekly_total, 4.0);
    }

    #[test]
    fn test_no_rows_means_no_summary() {
        let mut model = MockModel::new();
        model.expect_predict().never();

        let outcome = aggregator().summarize_provider(CloudProvider::Gcp, &[], &model);
        assert!(outcome.summary.is_none());
        assert!(outcome.failures.is_empty());
    }

    #[test]
    fn test_gaps_are_filled_before_forecasting() {
        let start = NaiveDate::from_ymd_opt(2024, 8, 1).unwrap();
        let sparse = vec![
            CostObservation::new(start, CloudProvider::Gcp, "bq", 4.0).with_currency("INR"),
            CostObservation::new(start + Duration::days(3), CloudProvider::Gcp, "bq", 8.0)
                .with_currency("INR"),
        ];

        let mut model = MockModel::new();
        model
            .expect_metadata()
            .return_const(ModelMetadata::new(None, 4, 1).with_quantiles(vec![0.5]));
        model
            .expect_predict()
            .withf(|input| input.window == vec![4.0, 0.0, 0.0, 8.0] && input.time_idx_start == 0)
            .times(1)
            .returning(|_| QuantileForecast::new(vec![0.5], vec![vec![1.0]]));

        let outcome = aggregator().summarize_provider(CloudProvider::Gcp, &sparse, &model);
        assert!(outcome.summary.is_some());
    }
}
