//! Training runs: history from the store, a fitted baseline model on disk.

use std::path::PathBuf;

use cast_forecast::{
    artifact_path, BaselineForecaster, Forecaster, ValidationMetrics, DEFAULT_MODEL_KEY,
    DEFAULT_QUANTILES,
};
use cast_series::{prepare_training_set, CloudProvider, CostObservation, WindowPlan};
use cast_store::ProviderStores;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::CloudcastConfig;
use crate::error::{ServiceError, ServiceResult};

/// What one provider's training run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainReport {
    pub provider: CloudProvider,
    pub rows: usize,
    pub series: usize,
    /// Services left out for being too short
    pub dropped: Vec<String>,
    pub plan: WindowPlan,
    pub cutoff: i64,
    pub validation: Option<ValidationMetrics>,
    pub artifacts: Vec<PathBuf>,
}

/// Trains and saves one model per provider.
pub struct Trainer<'a> {
    config: &'a CloudcastConfig,
    stores: &'a ProviderStores,
}

impl<'a> Trainer<'a> {
    pub fn new(config: &'a CloudcastConfig, stores: &'a ProviderStores) -> Self {
        Self { config, stores }
    }

    /// Train `provider` on its configured store's recent history.
    ///
    /// With `as_default` the artifact is also saved as the fallback model.
    pub async fn train(
        &self,
        provider: CloudProvider,
        today: NaiveDate,
        as_default: bool,
    ) -> ServiceResult<TrainReport> {
        let store = self.stores.get(provider)?;
        let rows = store
            .fetch(provider, self.config.training_lookback_days, today)
            .await?;
        info!(
            "[{}] Loaded {} row(s) from {} for training",
            provider.tag(),
            rows.len(),
            store.describe()
        );

        // Fitting and artifact writes block.
        let config = self.config.clone();
        tokio::task::spawn_blocking(move || fit_and_save(&config, provider, &rows, as_default))
            .await
            .map_err(|e| ServiceError::Task(e.to_string()))?
    }

    /// Train `provider` on the given rows, blocking the caller.
    pub fn train_rows(
        &self,
        provider: CloudProvider,
        rows: &[CostObservation],
        as_default: bool,
    ) -> ServiceResult<TrainReport> {
        fit_and_save(self.config, provider, rows, as_default)
    }
}

fn fit_and_save(
    config: &CloudcastConfig,
    provider: CloudProvider,
    rows: &[CostObservation],
    as_default: bool,
) -> ServiceResult<TrainReport> {
    let set = prepare_training_set(provider, rows, &config.training_settings())?;
    let model = BaselineForecaster::fit(&set, &DEFAULT_QUANTILES)?;

    let mut artifacts = vec![artifact_path(&config.model_dir, provider.as_str())];
    if as_default {
        artifacts.push(artifact_path(&config.model_dir, DEFAULT_MODEL_KEY));
    }
    for path in &artifacts {
        model.save(path)?;
    }

    let validation = model.metadata().validation;
    if let Some(v) = &validation {
        info!(
            "[{}] Validation MAE {:.4}, RMSE {:.4} over {} point(s)",
            provider.tag(),
            v.mae,
            v.rmse,
            v.points
        );
    }

    Ok(TrainReport {
        provider,
        rows: rows.iter().filter(|r| r.provider == provider).count(),
        series: set.series.len(),
        dropped: set.dropped.iter().map(|k| k.service.clone()).collect(),
        plan: set.plan,
        cutoff: set.cutoff,
        validation,
        artifacts,
    })
}
