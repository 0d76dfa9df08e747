//! A deterministic baseline forecaster.
//!
//! Predicts a flat level (the mean of the most recent days) and spreads the
//! quantile rows using relative one-step errors measured on the training
//! partition. The fitted state is small enough to persist as JSON beside its
//! metadata.

use std::fs;
use std::path::Path;

use cast_series::{GroupKey, TimeSeries, TrainingSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ForecastError, ForecastResult};
use crate::forecaster::{Forecaster, QuantileForecast};
use crate::metadata::{ModelMetadata, ValidationMetrics};
use crate::request::{build_request, ForecastInput};

/// Number of most recent days averaged into the level.
pub const LEVEL_SPAN: usize = 7;

const MIN_LEVEL: f64 = 1e-9;

/// Level-plus-residual-spread forecaster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineForecaster {
    metadata: ModelMetadata,
    /// Relative error at each quantile level, aligned with `metadata.quantiles`
    residual_quantiles: Vec<f64>,
}

impl BaselineForecaster {
    pub fn new(metadata: ModelMetadata, residual_quantiles: Vec<f64>) -> ForecastResult<Self> {
        metadata.validate()?;
        if residual_quantiles.len() != metadata.quantiles.len().max(1) {
            return Err(ForecastError::InvalidMetadata(format!(
                "{} residual quantile(s) for {} level(s)",
                residual_quantiles.len(),
                metadata.quantiles.len()
            )));
        }
        Ok(Self {
            metadata,
            residual_quantiles,
        })
    }

    /// Fit residual quantiles on the training partition and score the
    /// validation windows.
    pub fn fit(set: &TrainingSet, quantiles: &[f64]) -> ForecastResult<Self> {
        let encoder_length = set.plan.encoder_length;
        let mut residuals: Vec<f64> = set
            .training_series()
            .iter()
            .flat_map(|s| one_step_residuals(&s.costs(), encoder_length))
            .collect();
        residuals.sort_by(|a, b| a.total_cmp(b));
        debug!(
            "[{}] Fitting baseline on {} residual(s)",
            set.provider.tag(),
            residuals.len()
        );

        let residual_quantiles = if quantiles.is_empty() {
            vec![empirical_quantile(&residuals, 0.5)]
        } else {
            quantiles
                .iter()
                .map(|q| empirical_quantile(&residuals, *q))
                .collect()
        };

        let metadata = ModelMetadata::new(
            Some(set.provider),
            encoder_length,
            set.plan.prediction_length,
        )
        .with_quantiles(quantiles.to_vec())
        .with_vocabulary(set.vocabulary())
        .with_training_cutoff(set.cutoff);

        let mut model = Self::new(metadata, residual_quantiles)?;
        model.metadata.validation = model.evaluate(set.validation_series())?;
        Ok(model)
    }

    /// MAE/RMSE of the median over the last horizon of each series.
    ///
    /// Series no longer than one horizon are skipped; `None` when none remain.
    pub fn evaluate(&self, series: &[TimeSeries]) -> ForecastResult<Option<ValidationMetrics>> {
        let horizon = self.metadata.prediction_length;
        let mut abs_sum = 0.0;
        let mut sq_sum = 0.0;
        let mut points = 0usize;

        for s in series.iter().filter(|s| s.len() > horizon) {
            let costs = s.costs();
            let split = costs.len() - horizon;
            let Some(first) = s.first() else { continue };
            let group = GroupKey::new(
                s.key.provider,
                s.key.service.clone(),
                first.region.clone(),
                first.currency.clone(),
            );
            let input = ForecastInput {
                group,
                window: build_request(&costs[..split], self.metadata.encoder_length),
                time_idx_start: first.time_idx,
            };
            let forecast = self.predict(&input)?;
            for (predicted, actual) in forecast.median().iter().zip(&costs[split..]) {
                let err = predicted - actual;
                abs_sum += err.abs();
                sq_sum += err * err;
                points += 1;
            }
        }

        if points == 0 {
            return Ok(None);
        }
        Ok(Some(ValidationMetrics {
            mae: abs_sum / points as f64,
            rmse: (sq_sum / points as f64).sqrt(),
            points,
        }))
    }

    pub fn residual_quantiles(&self) -> &[f64] {
        &self.residual_quantiles
    }

    /// Load a saved model, rejecting unsupported metadata.
    pub fn load(path: impl AsRef<Path>) -> ForecastResult<Self> {
        let path = path.as_ref();
        debug!("Loading baseline model from {:?}", path);
        let content = fs::read_to_string(path)?;
        let model: Self = serde_json::from_str(&content)?;
        Self::new(model.metadata, model.residual_quantiles)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> ForecastResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        info!("Saved model artifact to {:?}", path);
        Ok(())
    }
}

impl Forecaster for BaselineForecaster {
    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    fn predict(&self, input: &ForecastInput) -> ForecastResult<QuantileForecast> {
        if input.window.len() != self.metadata.encoder_length {
            return Err(ForecastError::InvalidInput(format!(
                "window for {} has {} value(s), model expects {}",
                input.group,
                input.window.len(),
                self.metadata.encoder_length
            )));
        }
        if input.window.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::InvalidInput(format!(
                "window for {} contains a non-finite value",
                input.group
            )));
        }

        let base = level(&input.window);
        let horizon = self.metadata.prediction_length;
        let values = self
            .residual_quantiles
            .iter()
            .map(|r| vec![base * (1.0 + r); horizon])
            .collect();
        QuantileForecast::new(self.metadata.quantiles.clone(), values)
    }

    fn name(&self) -> &str {
        "baseline"
    }
}

/// Mean of the last [`LEVEL_SPAN`] values (all of them if fewer).
pub fn level(window: &[f64]) -> f64 {
    let span = window.len().min(LEVEL_SPAN);
    if span == 0 {
        return 0.0;
    }
    window[window.len() - span..].iter().sum::<f64>() / span as f64
}

/// Relative errors of predicting each day from the window before it.
fn one_step_residuals(costs: &[f64], encoder_length: usize) -> Vec<f64> {
    (1..costs.len())
        .filter_map(|t| {
            let start = t.saturating_sub(encoder_length.max(1));
            let lvl = level(&costs[start..t]);
            if lvl.abs() > MIN_LEVEL {
                Some((costs[t] - lvl) / lvl)
            } else {
                None
            }
        })
        .collect()
}

/// Linear-interpolated quantile of sorted values; `0.0` when empty.
fn empirical_quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let weight = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * weight
}

#[cfg(test)]
mod tests {
    use super::*;
    use cast_series::{prepare_training_set, CloudProvider, CostObservation, TrainingSettings};
    use chrono::{Duration, NaiveDate};

    fn rows(costs: &[f64]) -> Vec<CostObservation> {
        let start = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        costs
            .iter()
            .enumerate()
            .map(|(i, c)| {
                CostObservation::new(start + Duration::days(i as i64), CloudProvider::Gcp, "bq", *c)
                    .with_region("us")
                    .with_currency("USD")
            })
            .collect()
    }

    fn group() -> GroupKey {
        GroupKey::new(CloudProvider::Gcp, "bq", "us", "USD")
    }

    #[test]
    fn test_level_uses_recent_span() {
        let window: Vec<f64> = (1..=10).map(|v| v as f64).collect();
        // mean of 4..=10
        assert!((level(&window) - 7.0).abs() < 1e-12);
        assert_eq!(level(&[2.0, 4.0]), 3.0);
        assert_eq!(level(&[]), 0.0);
    }

    #[test]
    fn test_empirical_quantile_interpolates() {
        let sorted = [0.0, 1.0, 2.0, 3.0];
        assert_eq!(empirical_quantile(&sorted, 0.0), 0.0);
        assert_eq!(empirical_quantile(&sorted, 1.0), 3.0);
        assert!((empirical_quantile(&sorted, 0.5) - 1.5).abs() < 1e-12);
        assert_eq!(empirical_quantile(&[], 0.5), 0.0);
    }

    #[test]
    fn test_flat_history_predicts_flat_level() {
        let set = prepare_training_set(
            CloudProvider::Gcp,
            &rows(&[10.0; 40]),
            &TrainingSettings::default(),
        )
        .unwrap();
        let model = BaselineForecaster::fit(&set, &[0.1, 0.5, 0.9]).unwrap();

        assert!(model.residual_quantiles().iter().all(|r| r.abs() < 1e-12));
        let input = ForecastInput::from_recent(
            group(),
            &[10.0; 40],
            model.metadata().encoder_length,
            0,
        )
        .unwrap();
        let forecast = model.predict(&input).unwrap();
        assert_eq!(forecast.horizon(), model.metadata().prediction_length);
        assert!(forecast.median().iter().all(|v| (v - 10.0).abs() < 1e-9));

        let validation = model.metadata().validation.unwrap();
        assert!(validation.mae < 1e-9);
        assert!(validation.points > 0);
    }

    #[test]
    fn test_quantile_rows_are_ordered() {
        let costs: Vec<f64> = (0..60).map(|i| 10.0 + (i % 5) as f64).collect();
        let set =
            prepare_training_set(CloudProvider::Gcp, &rows(&costs), &TrainingSettings::default())
                .unwrap();
        let model = BaselineForecaster::fit(&set, &[0.1, 0.5, 0.9]).unwrap();
        let input =
            ForecastInput::from_recent(group(), &costs, model.metadata().encoder_length, 0).unwrap();
        let forecast = model.predict(&input).unwrap();

        let low = forecast.row(0).unwrap()[0];
        let mid = forecast.row(1).unwrap()[0];
        let high = forecast.row(2).unwrap()[0];
        assert!(low <= mid && mid <= high);
        assert_eq!(crate::quantile::median_index(&model.metadata().quantiles), 1);
    }

    #[test]
    fn test_rejects_wrong_window_length() {
        let model = BaselineForecaster::new(
            ModelMetadata::new(None, 5, 2).with_quantiles(vec![0.5]),
            vec![0.0],
        )
        .unwrap();
        let input = ForecastInput {
            group: group(),
            window: vec![1.0],
            time_idx_start: 0,
        };
        let err = model.predict(&input).unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gcp").join("model.json");
        let model = BaselineForecaster::new(
            ModelMetadata::new(Some(CloudProvider::Gcp), 3, 2).with_quantiles(vec![0.1, 0.5, 0.9]),
            vec![-0.2, 0.0, 0.3],
        )
        .unwrap();

        model.save(&path).unwrap();
        let loaded = BaselineForecaster::load(&path).unwrap();
        assert_eq!(loaded, model);
    }
}
