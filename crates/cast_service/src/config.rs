//! Environment-driven configuration.
//!
//! | variable                          | default           |
//! |-----------------------------------|-------------------|
//! | `CLOUDCAST_LOOKBACK_DAYS`         | `30`              |
//! | `CLOUDCAST_TRAINING_LOOKBACK_DAYS`| `180`             |
//! | `CLOUDCAST_REPORTING_CURRENCY`    | `INR`             |
//! | `CLOUDCAST_LOCAL_CURRENCY`        | `INR`             |
//! | `CLOUDCAST_USD_TO_LOCAL_RATE`     | `88.67`           |
//! | `CLOUDCAST_MIN_SERIES_POINTS`     | `1`               |
//! | `CLOUDCAST_MAX_ENCODER_LENGTH`    | `30`              |
//! | `CLOUDCAST_MAX_PREDICTION_LENGTH` | `7`               |
//! | `CLOUDCAST_MODEL_DIR`             | `artifacts/model` |
//! | `CLOUDCAST_<PROVIDER>_STORE`      | unset             |
//! | `HOST` / `PORT`                   | `0.0.0.0` / `8000`|

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use cast_series::{CloudProvider, TrainingSettings, WindowLimits};
use cast_summary::{CurrencyConverter, SummaryResult};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Runtime configuration for training, serving and summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudcastConfig {
    /// Default summary lookback, in days
    pub lookback_days: u32,
    /// History loaded for training, in days
    pub training_lookback_days: u32,
    pub reporting_currency: String,
    /// Local side of the USD exchange pair
    pub local_currency: String,
    pub usd_to_local_rate: f64,
    pub min_series_points: usize,
    pub max_encoder_length: usize,
    pub max_prediction_length: usize,
    pub model_dir: PathBuf,
    /// Cost store path per provider; absent providers have no store
    #[serde(default)]
    pub store_paths: BTreeMap<CloudProvider, PathBuf>,
    pub host: String,
    pub port: u16,
}

impl Default for CloudcastConfig {
    fn default() -> Self {
        Self {
            lookback_days: 30,
            training_lookback_days: 180,
            reporting_currency: "INR".to_string(),
            local_currency: "INR".to_string(),
            usd_to_local_rate: 88.67,
            min_series_points: 1,
            max_encoder_length: 30,
            max_prediction_length: 7,
            model_dir: PathBuf::from("artifacts/model"),
            store_paths: BTreeMap::new(),
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl CloudcastConfig {
    /// Load from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from any key lookup; unset keys keep their defaults and
    /// unparseable values fall back with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let read = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mut store_paths = BTreeMap::new();
        for provider in CloudProvider::all() {
            let key = format!("CLOUDCAST_{}_STORE", provider.tag());
            if let Some(path) = read(&key) {
                store_paths.insert(provider, PathBuf::from(path));
            }
        }

        Self {
            lookback_days: parse_or(
                read("CLOUDCAST_LOOKBACK_DAYS"),
                "CLOUDCAST_LOOKBACK_DAYS",
                defaults.lookback_days,
            ),
            training_lookback_days: parse_or(
                read("CLOUDCAST_TRAINING_LOOKBACK_DAYS"),
                "CLOUDCAST_TRAINING_LOOKBACK_DAYS",
                defaults.training_lookback_days,
            ),
            reporting_currency: read("CLOUDCAST_REPORTING_CURRENCY")
                .map(|v| v.to_ascii_uppercase())
                .unwrap_or(defaults.reporting_currency),
            local_currency: read("CLOUDCAST_LOCAL_CURRENCY")
                .map(|v| v.to_ascii_uppercase())
                .unwrap_or(defaults.local_currency),
            usd_to_local_rate: parse_or(
                read("CLOUDCAST_USD_TO_LOCAL_RATE"),
                "CLOUDCAST_USD_TO_LOCAL_RATE",
                defaults.usd_to_local_rate,
            ),
            min_series_points: parse_or(
                read("CLOUDCAST_MIN_SERIES_POINTS"),
                "CLOUDCAST_MIN_SERIES_POINTS",
                defaults.min_series_points,
            ),
            max_encoder_length: parse_or(
                read("CLOUDCAST_MAX_ENCODER_LENGTH"),
                "CLOUDCAST_MAX_ENCODER_LENGTH",
                defaults.max_encoder_length,
            ),
            max_prediction_length: parse_or(
                read("CLOUDCAST_MAX_PREDICTION_LENGTH"),
                "CLOUDCAST_MAX_PREDICTION_LENGTH",
                defaults.max_prediction_length,
            ),
            model_dir: read("CLOUDCAST_MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_dir),
            store_paths,
            host: read("HOST").unwrap_or(defaults.host),
            port: parse_or(read("PORT"), "PORT", defaults.port),
        }
    }

    pub fn with_lookback_days(mut self, days: u32) -> Self {
        self.lookback_days = days;
        self
    }

    pub fn with_training_lookback_days(mut self, days: u32) -> Self {
        self.training_lookback_days = days;
        self
    }

    pub fn with_reporting_currency(mut self, currency: impl Into<String>) -> Self {
        self.reporting_currency = currency.into();
        self
    }

    pub fn with_exchange(mut self, local_currency: impl Into<String>, usd_to_local_rate: f64) -> Self {
        self.local_currency = local_currency.into();
        self.usd_to_local_rate = usd_to_local_rate;
        self
    }

    pub fn with_min_series_points(mut self, points: usize) -> Self {
        self.min_series_points = points;
        self
    }

    pub fn with_window_limits(mut self, max_encoder_length: usize, max_prediction_length: usize) -> Self {
        self.max_encoder_length = max_encoder_length;
        self.max_prediction_length = max_prediction_length;
        self
    }

    pub fn with_model_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.model_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn with_store_path(mut self, provider: CloudProvider, path: impl AsRef<Path>) -> Self {
        self.store_paths.insert(provider, path.as_ref().to_path_buf());
        self
    }

    pub fn with_bind(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port;
        self
    }

    /// Training-set preparation settings.
    pub fn training_settings(&self) -> TrainingSettings {
        TrainingSettings::default()
            .with_limits(WindowLimits::new(self.max_encoder_length, self.max_prediction_length))
            .with_min_series_points(self.min_series_points)
    }

    pub fn currency_converter(&self) -> SummaryResult<CurrencyConverter> {
        CurrencyConverter::new(
            self.reporting_currency.clone(),
            self.local_currency.clone(),
            self.usd_to_local_rate,
        )
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match raw {
        None => default,
        Some(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                warn!("Ignoring {}={:?}: not a valid value; using {}", key, raw, default);
                default
            }
        },
    }
}
