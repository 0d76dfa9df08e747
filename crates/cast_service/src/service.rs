//! The serving component.
//!
//! Holds the forecaster registry, the provider stores and configuration, all
//! fixed at construction, and answers forecast, provider, health and summary
//! calls. Concurrent callers share one instance without locking.

use std::sync::Arc;

use cast_forecast::{ForecastInput, Forecaster, ForecasterRegistry};
use cast_series::{CloudProvider, GroupKey};
use cast_store::ProviderStores;
use cast_summary::{PortfolioSummary, ProviderSkip, ProviderSummary, SummaryAggregator};
use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::api::{ForecastRequest, ForecastResponse, HealthResponse, SummaryResponse};
use crate::config::CloudcastConfig;
use crate::error::{ServiceError, ServiceResult};

/// Answers forecast and summary requests.
pub struct ForecastService {
    registry: Arc<ForecasterRegistry>,
    stores: ProviderStores,
    aggregator: SummaryAggregator,
    config: CloudcastConfig,
}

impl ForecastService {
    pub fn new(
        registry: ForecasterRegistry,
        stores: ProviderStores,
        config: CloudcastConfig,
    ) -> ServiceResult<Self> {
        let aggregator = SummaryAggregator::new(config.currency_converter()?);
        Ok(Self {
            registry: Arc::new(registry),
            stores,
            aggregator,
            config,
        })
    }

    /// Load model artifacts and open stores as configured.
    pub fn from_config(config: CloudcastConfig) -> ServiceResult<Self> {
        let registry = ForecasterRegistry::load_dir(&config.model_dir)?;
        if registry.is_empty() {
            warn!("No model artifacts found under {:?}", config.model_dir);
        } else {
            info!("Loaded forecasters: {}", registry.keys().join(", "));
        }
        let stores = ProviderStores::from_paths(&config.store_paths);
        Self::new(registry, stores, config)
    }

    pub fn config(&self) -> &CloudcastConfig {
        &self.config
    }

    pub fn registry(&self) -> &ForecasterRegistry {
        &self.registry
    }

    /// Forecast one group from caller-supplied recent costs.
    pub fn forecast(&self, request: &ForecastRequest) -> ServiceResult<ForecastResponse> {
        let (provider, forecaster) = self.registry.resolve_key(&request.provider)?;
        if request.service.trim().is_empty() {
            return Err(ServiceError::InvalidRequest("service must not be empty".to_string()));
        }

        let group = GroupKey::new(
            provider,
            request.service.clone(),
            request.region.clone(),
            request.currency.clone(),
        );
        let input = ForecastInput::from_recent(
            group,
            &request.recent_costs,
            forecaster.metadata().encoder_length,
            request.time_idx_start,
        )?;
        debug!(
            "[{}] Forecasting {} with {} ({} value window)",
            provider.tag(),
            input.group.service,
            forecaster.name(),
            input.len()
        );

        let forecast = forecaster.predict(&input)?;
        Ok(ForecastResponse {
            forecast: forecast.by_label(),
        })
    }

    /// Registered provider keys, `default` included.
    pub fn providers(&self) -> Vec<String> {
        self.registry.keys()
    }

    pub fn health(&self) -> HealthResponse {
        HealthResponse {
            providers: self.providers(),
            model_loaded: !self.registry.is_empty(),
        }
    }

    /// Portfolio summary over the configured lookback, as of today.
    pub async fn summary(&self, lookback_days: Option<u32>) -> ServiceResult<SummaryResponse> {
        let lookback = lookback_days.unwrap_or(self.config.lookback_days);
        self.summary_as_of(lookback, Utc::now().date_naive()).await
    }

    /// Portfolio summary over `lookback_days` ending `today`.
    ///
    /// Providers without a store, a forecaster, history or any successful
    /// group are left out and listed as skipped. Fails only when every
    /// provider was skipped.
    pub async fn summary_as_of(
        &self,
        lookback_days: u32,
        today: NaiveDate,
    ) -> ServiceResult<SummaryResponse> {
        let mut portfolio = PortfolioSummary::new();

        for provider in CloudProvider::all() {
            match self.summarize_provider(provider, lookback_days, today).await {
                Ok(summary) => portfolio.insert(summary),
                Err(reason) => {
                    debug!("[{}] No summary: {}", provider.tag(), reason);
                    portfolio.skip(provider, reason);
                }
            }
        }

        if portfolio.is_empty() {
            warn!("No provider produced a summary (lookback {} days)", lookback_days);
            return Err(ServiceError::NoSummary);
        }

        Ok(SummaryResponse {
            as_of: today,
            lookback_days,
            reporting_currency: self.aggregator.converter().reporting_currency().to_string(),
            portfolio,
        })
    }

    async fn summarize_provider(
        &self,
        provider: CloudProvider,
        lookback_days: u32,
        today: NaiveDate,
    ) -> Result<ProviderSummary, ProviderSkip> {
        let tag = provider.tag();
        let store = self
            .stores
            .get(provider)
            .map_err(|_| ProviderSkip::NotConfigured)?;
        let forecaster: Arc<dyn Forecaster> = self
            .registry
            .resolve(provider)
            .map_err(|_| ProviderSkip::UnregisteredProvider)?;

        let rows = match store.fetch(provider, lookback_days, today).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!("[{}] Cost store {} failed: {}", tag, store.describe(), e);
                return Err(ProviderSkip::Unavailable {
                    reason: e.to_string(),
                });
            }
        };
        if rows.is_empty() {
            return Err(ProviderSkip::NoHistory { lookback_days });
        }

        // Model calls may block on compute.
        let aggregator = self.aggregator.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            aggregator.summarize_provider(provider, &rows, forecaster.as_ref())
        })
        .await
        .map_err(|e| {
            warn!("[{}] Summary task failed: {}", tag, e);
            ProviderSkip::TaskFailed {
                reason: e.to_string(),
            }
        })?;

        outcome.summary.ok_or(ProviderSkip::AllGroupsFailed {
            failures: outcome.failures.len(),
        })
    }
}

impl std::fmt::Debug for ForecastService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForecastService")
            .field("registry", &self.registry)
            .field("stores", &self.stores)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cast_forecast::{MockForecaster, ModelMetadata};
    use cast_series::CostObservation;
    use cast_store::MemoryCostStore;
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 10, 31).unwrap()
    }

    fn mock() -> Arc<dyn Forecaster> {
        Arc::new(
            MockForecaster::new(ModelMetadata::new(None, 3, 2).with_quantiles(vec![0.1, 0.5, 0.9]))
                .with_steps(vec![10.0, 20.0]),
        )
    }

    fn request(provider: &str, costs: Vec<f64>) -> ForecastRequest {
        ForecastRequest {
            provider: provider.to_string(),
            service: "compute".to_string(),
            region: "us".to_string(),
            currency: "INR".to_string(),
            recent_costs: costs,
            time_idx_start: 0,
        }
    }

    fn history(provider: CloudProvider, service: &str) -> Vec<CostObservation> {
        (0..5)
            .map(|d| {
                CostObservation::new(today() - Duration::days(d), provider, service, 1.0)
                    .with_currency("INR")
            })
            .collect()
    }

    fn service(stores: ProviderStores) -> ForecastService {
        let registry = ForecasterRegistry::builder()
            .register(CloudProvider::Gcp, mock())
            .build();
        ForecastService::new(registry, stores, CloudcastConfig::default()).unwrap()
    }

    #[test]
    fn test_forecast_keyed_by_quantile() {
        let service = service(ProviderStores::new());
        let response = service.forecast(&request("GCP", vec![1.0, 2.0])).unwrap();

        assert_eq!(response.forecast.len(), 3);
        assert_eq!(response.forecast["0.5"], vec![10.0, 20.0]);
    }

    #[test]
    fn test_unknown_provider_is_not_found() {
        let service = service(ProviderStores::new());
        let err = service.forecast(&request("azure", vec![1.0])).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_non_finite_costs_are_rejected() {
        let service = service(ProviderStores::new());
        let err = service
            .forecast(&request("gcp", vec![1.0, f64::NAN]))
            .unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_health() {
        let health = service(ProviderStores::new()).health();
        assert_eq!(health.providers, vec!["gcp"]);
        assert!(health.model_loaded);
    }

    #[tokio::test]
    async fn test_summary_without_stores_is_unavailable() {
        let err = service(ProviderStores::new())
            .summary_as_of(30, today())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NoSummary));
    }

    #[tokio::test]
    async fn test_summary_skips_unregistered_provider() {
        let gcp = MemoryCostStore::with_rows(history(CloudProvider::Gcp, "bq")).unwrap();
        let stores = ProviderStores::new()
            .with_store(CloudProvider::Gcp, Arc::new(gcp))
            .with_store(CloudProvider::Azure, Arc::new(MemoryCostStore::new()));

        let response = service(stores).summary_as_of(30, today()).await.unwrap();
        let gcp = response.portfolio.get(CloudProvider::Gcp).unwrap();
        assert_eq!(gcp.weekly_total, 30.0);
        assert!(response.portfolio.get(CloudProvider::Azure).is_none());
        assert_eq!(
            response.portfolio.skipped[&CloudProvider::Azure],
            ProviderSkip::UnregisteredProvider
        );
        assert_eq!(response.portfolio.skipped[&CloudProvider::Aws], ProviderSkip::NotConfigured);
    }

    #[tokio::test]
    async fn test_summary_skips_provider_without_history() {
        let gcp = MemoryCostStore::with_rows(history(CloudProvider::Gcp, "bq")).unwrap();
        let stores = ProviderStores::new()
            .with_store(CloudProvider::Gcp, Arc::new(gcp))
            .with_store(CloudProvider::Azure, Arc::new(MemoryCostStore::new()));
        let registry = ForecasterRegistry::builder()
            .register(CloudProvider::Gcp, mock())
            .with_default(mock())
            .build();
        let service = ForecastService::new(registry, stores, CloudcastConfig::default()).unwrap();

        let response = service.summary_as_of(14, today()).await.unwrap();
        assert_eq!(
            response.portfolio.skipped[&CloudProvider::Azure],
            ProviderSkip::NoHistory { lookback_days: 14 }
        );
    }

    #[tokio::test]
    async fn test_summary_survives_store_outage() {
        let azure = MemoryCostStore::with_rows(history(CloudProvider::Azure, "sql")).unwrap();
        azure.simulate_unavailable(true);
        let stores = ProviderStores::new()
            .with_store(
                CloudProvider::Gcp,
                Arc::new(MemoryCostStore::with_rows(history(CloudProvider::Gcp, "bq")).unwrap()),
            )
            .with_store(CloudProvider::Azure, Arc::new(azure.clone()));
        let registry = ForecasterRegistry::builder()
            .register(CloudProvider::Gcp, mock())
            .register(CloudProvider::Azure, mock())
            .build();
        let service = ForecastService::new(registry, stores, CloudcastConfig::default()).unwrap();

        let response = service.summary_as_of(30, today()).await.unwrap();

        assert_eq!(response.portfolio.get(CloudProvider::Gcp).unwrap().weekly_total, 30.0);
        assert!(response.portfolio.get(CloudProvider::Azure).is_none());
        assert!(matches!(
            response.portfolio.skipped[&CloudProvider::Azure],
            ProviderSkip::Unavailable { .. }
        ));
        assert_eq!(response.portfolio.skipped[&CloudProvider::Aws], ProviderSkip::NotConfigured);
        assert_eq!(azure.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_summary_survives_provider_whose_groups_all_fail() {
        let stores = ProviderStores::new()
            .with_store(
                CloudProvider::Gcp,
                Arc::new(MemoryCostStore::with_rows(history(CloudProvider::Gcp, "bq")).unwrap()),
            )
            .with_store(
                CloudProvider::Azure,
                Arc::new(MemoryCostStore::with_rows(history(CloudProvider::Azure, "sql")).unwrap()),
            );
        let failing = MockForecaster::new(ModelMetadata::new(None, 3, 2).with_quantiles(vec![0.5]))
            .fail_for_service("sql");
        let registry = ForecasterRegistry::builder()
            .register(CloudProvider::Gcp, mock())
            .register(CloudProvider::Azure, Arc::new(failing.clone()))
            .build();
        let service = ForecastService::new(registry, stores, CloudcastConfig::default()).unwrap();

        let response = service.summary_as_of(30, today()).await.unwrap();

        assert_eq!(response.portfolio.len(), 1);
        assert_eq!(response.portfolio.get(CloudProvider::Gcp).unwrap().weekly_total, 30.0);
        assert_eq!(
            response.portfolio.skipped[&CloudProvider::Azure],
            ProviderSkip::AllGroupsFailed { failures: 1 }
        );
        assert_eq!(failing.call_count(), 1);
    }
}
