//! Versioned metadata stored next to every trained model.
//!
//! Serving reads window lengths and quantile levels from this record instead
//! of inspecting the model itself.

use cast_series::{CloudProvider, Vocabulary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, ForecastResult};

/// Current metadata schema version.
pub const METADATA_SCHEMA_VERSION: u32 = 1;

/// Quantile levels produced by default.
pub const DEFAULT_QUANTILES: [f64; 7] = [0.02, 0.1, 0.25, 0.5, 0.75, 0.9, 0.98];

/// Error measures from the validation window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidationMetrics {
    pub mae: f64,
    pub rmse: f64,
    /// Number of predicted points the measures cover
    pub points: usize,
}

/// Metadata describing a trained forecaster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub schema_version: u32,
    /// Provider the model was trained for; `None` for a default model
    pub provider: Option<CloudProvider>,
    pub encoder_length: usize,
    pub prediction_length: usize,
    /// Ascending quantile levels, one output row per level
    pub quantiles: Vec<f64>,
    #[serde(default)]
    pub vocabulary: Vocabulary,
    pub trained_at: DateTime<Utc>,
    #[serde(default)]
    pub training_cutoff: Option<i64>,
    #[serde(default)]
    pub validation: Option<ValidationMetrics>,
}

impl ModelMetadata {
    pub fn new(
        provider: Option<CloudProvider>,
        encoder_length: usize,
        prediction_length: usize,
    ) -> Self {
        Self {
            schema_version: METADATA_SCHEMA_VERSION,
            provider,
            encoder_length,
            prediction_length,
            quantiles: DEFAULT_QUANTILES.to_vec(),
            vocabulary: Vocabulary::default(),
            trained_at: Utc::now(),
            training_cutoff: None,
            validation: None,
        }
    }

    pub fn with_quantiles(mut self, quantiles: Vec<f64>) -> Self {
        self.quantiles = quantiles;
        self
    }

    pub fn with_vocabulary(mut self, vocabulary: Vocabulary) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    pub fn with_training_cutoff(mut self, cutoff: i64) -> Self {
        self.training_cutoff = Some(cutoff);
        self
    }

    /// Check the record is one this build can serve.
    pub fn validate(&self) -> ForecastResult<()> {
        if self.schema_version != METADATA_SCHEMA_VERSION {
            return Err(ForecastError::UnsupportedSchema {
                found: self.schema_version,
                expected: METADATA_SCHEMA_VERSION,
            });
        }
        if self.encoder_length == 0 || self.prediction_length == 0 {
            return Err(ForecastError::InvalidMetadata(format!(
                "window lengths must be positive (encoder={}, prediction={})",
                self.encoder_length, self.prediction_length
            )));
        }
        if self.quantiles.iter().any(|q| !(0.0..=1.0).contains(q)) {
            return Err(ForecastError::InvalidMetadata(
                "quantile levels must lie in [0, 1]".to_string(),
            ));
        }
        if self.quantiles.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ForecastError::InvalidMetadata(
                "quantile levels must be strictly ascending".to_string(),
            ));
        }
        Ok(())
    }

    /// Display label for each quantile level, e.g. `"0.5"`.
    pub fn quantile_labels(&self) -> Vec<String> {
        self.quantiles.iter().map(|q| crate::quantile::quantile_label(*q)).collect()
    }
}
