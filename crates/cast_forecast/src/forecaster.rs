//! The forecaster capability.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, ForecastResult};
use crate::metadata::ModelMetadata;
use crate::quantile::{median_index, quantile_label};
use crate::request::ForecastInput;

/// Per-quantile predictions for one group.
///
/// `values[i]` holds one value per future day for `quantiles[i]`. A
/// forecaster with no configured levels returns a single row and an empty
/// level list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantileForecast {
    pub quantiles: Vec<f64>,
    pub values: Vec<Vec<f64>>,
}

impl QuantileForecast {
    /// Build a forecast, checking every row has the same horizon.
    pub fn new(quantiles: Vec<f64>, values: Vec<Vec<f64>>) -> ForecastResult<Self> {
        let expected_rows = quantiles.len().max(1);
        if values.len() != expected_rows {
            return Err(ForecastError::Model(format!(
                "expected {} output row(s), got {}",
                expected_rows,
                values.len()
            )));
        }
        let horizon = values.first().map(|v| v.len()).unwrap_or(0);
        if horizon == 0 || values.iter().any(|row| row.len() != horizon) {
            return Err(ForecastError::Model(
                "output rows must share a non-empty horizon".to_string(),
            ));
        }
        Ok(Self { quantiles, values })
    }

    /// Number of future days predicted.
    pub fn horizon(&self) -> usize {
        self.values.first().map(|v| v.len()).unwrap_or(0)
    }

    pub fn row(&self, index: usize) -> Option<&[f64]> {
        self.values.get(index).map(|v| v.as_slice())
    }

    /// The median row, or the closest available.
    pub fn median(&self) -> &[f64] {
        self.row(median_index(&self.quantiles))
            .unwrap_or_default()
    }

    /// Rows keyed by quantile label (`"0.5"` etc.); a level-less forecast
    /// is keyed `"point"`.
    pub fn by_label(&self) -> BTreeMap<String, Vec<f64>> {
        if self.quantiles.is_empty() {
            return self
                .values
                .first()
                .map(|row| BTreeMap::from([("point".to_string(), row.clone())]))
                .unwrap_or_default();
        }
        self.quantiles
            .iter()
            .zip(&self.values)
            .map(|(q, row)| (quantile_label(*q), row.clone()))
            .collect()
    }
}

/// A trained model that predicts future daily costs from a fixed window.
///
/// Calls are synchronous and may block on compute; implementations hold no
/// per-request state, so one instance serves concurrent requests.
pub trait Forecaster: Send + Sync {
    /// Window lengths and quantile levels the model was trained with.
    fn metadata(&self) -> &ModelMetadata;

    /// Predict `prediction_length` days for every quantile level.
    fn predict(&self, input: &ForecastInput) -> ForecastResult<QuantileForecast>;

    /// Short name used in logs.
    fn name(&self) -> &str {
        "forecaster"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_checks_row_count() {
        let err = QuantileForecast::new(vec![0.1, 0.5, 0.9], vec![vec![1.0]]).unwrap_err();
        assert!(matches!(err, ForecastError::Model(_)));
    }

    #[test]
    fn test_new_checks_horizon() {
        let err =
            QuantileForecast::new(vec![0.1, 0.9], vec![vec![1.0, 2.0], vec![1.0]]).unwrap_err();
        assert!(matches!(err, ForecastError::Model(_)));
    }

    #[test]
    fn test_median_and_labels() {
        let forecast = QuantileForecast::new(
            vec![0.1, 0.5, 0.9],
            vec![vec![1.0, 1.0], vec![2.0, 3.0], vec![4.0, 5.0]],
        )
        .unwrap();

        assert_eq!(forecast.horizon(), 2);
        assert_eq!(forecast.median(), &[2.0, 3.0]);

        let labeled = forecast.by_label();
        assert_eq!(labeled.len(), 3);
        assert_eq!(labeled["0.9"], vec![4.0, 5.0]);
    }

    #[test]
    fn test_single_output_forecast() {
        let forecast = QuantileForecast::new(vec![], vec![vec![7.0, 8.0]]).unwrap();
        assert_eq!(forecast.median(), &[7.0, 8.0]);
        assert_eq!(forecast.by_label()["point"], vec![7.0, 8.0]);
    }
}
