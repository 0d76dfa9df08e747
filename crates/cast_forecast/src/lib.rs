//! # cast_forecast
//!
//! The forecasting boundary for cloudcast.
//!
//! A forecaster takes a fixed-length window of daily costs and returns one
//! predicted sequence per quantile level. This crate defines that capability,
//! the metadata that travels with every trained model, and the pieces that
//! sit right in front of and behind a model call.
//!
//! # Features
//!
//! - **Request shaping**: `build_request` fits any history to the encoder length
//! - **Quantile selection**: picks the median row, or the closest available
//! - **Registry**: immutable provider-to-forecaster mapping with an optional default
//! - **Baseline model**: a deterministic level-plus-spread forecaster with JSON artifacts
//! - **Mock forecaster**: scripted predictions and failures for tests
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cast_forecast::{ForecastInput, ForecasterRegistry};
//!
//! let registry = ForecasterRegistry::load_dir("artifacts/model")?;
//! let (provider, forecaster) = registry.resolve_key("gcp")?;
//! let input = ForecastInput::from_recent(
//!     group,
//!     &recent_costs,
//!     forecaster.metadata().encoder_length,
//!     time_idx_start,
//! )?;
//! let forecast = forecaster.predict(&input)?;
//! println!("median: {:?}", forecast.median());
//! ```

pub mod baseline;
pub mod error;
pub mod forecaster;
pub mod metadata;
pub mod mock;
pub mod quantile;
pub mod registry;
pub mod request;

pub use baseline::{level, BaselineForecaster, LEVEL_SPAN};
pub use error::{ForecastError, ForecastResult};
pub use forecaster::{Forecaster, QuantileForecast};
pub use metadata::{ModelMetadata, ValidationMetrics, DEFAULT_QUANTILES, METADATA_SCHEMA_VERSION};
pub use mock::MockForecaster;
pub use quantile::{median_index, quantile_label, select_quantile_index, MEDIAN};
pub use registry::{artifact_path, ForecasterRegistry, RegistryBuilder, DEFAULT_MODEL_KEY, MODEL_FILE_NAME};
pub use request::{build_request, ForecastInput};
