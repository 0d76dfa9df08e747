//! Mock forecaster for testing.
//!
//! Returns scripted predictions, captures every input it receives and can be
//! told to fail for particular services.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{ForecastError, ForecastResult};
use crate::forecaster::{Forecaster, QuantileForecast};
use crate::metadata::ModelMetadata;
use crate::request::ForecastInput;

/// Scriptable [`Forecaster`] double.
///
/// Every quantile row of a prediction is the same scripted step sequence:
/// the per-service script when one is set, otherwise the default script,
/// otherwise `1.0` for each day of the horizon.
#[derive(Clone)]
pub struct MockForecaster {
    metadata: ModelMetadata,
    default_steps: Arc<RwLock<Option<Vec<f64>>>>,
    service_steps: Arc<RwLock<HashMap<String, Vec<f64>>>>,
    failing_services: Arc<RwLock<Vec<String>>>,
    captured_inputs: Arc<RwLock<Vec<ForecastInput>>>,
}

impl MockForecaster {
    pub fn new(metadata: ModelMetadata) -> Self {
        Self {
            metadata,
            default_steps: Arc::new(RwLock::new(None)),
            service_steps: Arc::new(RwLock::new(HashMap::new())),
            failing_services: Arc::new(RwLock::new(Vec::new())),
            captured_inputs: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Predict `steps` for every group without its own script.
    pub fn with_steps(self, steps: Vec<f64>) -> Self {
        *self.default_steps.write() = Some(steps);
        self
    }

    /// Predict `steps` for one service.
    pub fn with_service_steps(self, service: impl Into<String>, steps: Vec<f64>) -> Self {
        self.service_steps.write().insert(service.into(), steps);
        self
    }

    /// Fail every prediction for `service`.
    pub fn fail_for_service(self, service: impl Into<String>) -> Self {
        self.failing_services.write().push(service.into());
        self
    }

    /// Inputs received so far, in call order.
    pub fn get_inputs(&self) -> Vec<ForecastInput> {
        self.captured_inputs.read().clone()
    }

    pub fn call_count(&self) -> usize {
        self.captured_inputs.read().len()
    }

    pub fn clear_calls(&self) {
        self.captured_inputs.write().clear();
    }

    fn steps_for(&self, service: &str) -> Vec<f64> {
        if let Some(steps) = self.service_steps.read().get(service) {
            return steps.clone();
        }
        self.default_steps
            .read()
            .clone()
            .unwrap_or_else(|| vec![1.0; self.metadata.prediction_length])
    }
}

impl Forecaster for MockForecaster {
    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    fn predict(&self, input: &ForecastInput) -> ForecastResult<QuantileForecast> {
        self.captured_inputs.write().push(input.clone());

        if self
            .failing_services
            .read()
            .iter()
            .any(|s| s == &input.group.service)
        {
            return Err(ForecastError::Model(format!(
                "simulated failure for {}",
                input.group
            )));
        }

        let steps = self.steps_for(&input.group.service);
        let rows = self.metadata.quantiles.len().max(1);
        QuantileForecast::new(self.metadata.quantiles.clone(), vec![steps; rows])
    }

    fn name(&self) -> &str {
        "mock"
    }
}
