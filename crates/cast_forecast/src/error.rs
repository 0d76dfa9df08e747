//! Error types for forecasting.

use thiserror::Error;

/// Result type alias for forecasting operations.
pub type ForecastResult<T> = Result<T, ForecastError>;

/// Errors that can occur while shaping inputs or calling a forecaster.
#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("No forecaster registered for provider: {0}")]
    UnregisteredProvider(String),

    #[error("Invalid forecast input: {0}")]
    InvalidInput(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Invalid model metadata: {0}")]
    InvalidMetadata(String),

    #[error("Unsupported metadata schema version {found} (expected {expected})")]
    UnsupportedSchema { found: u32, expected: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ForecastError {
    /// Whether the caller sent something the forecaster cannot use.
    pub fn is_client_error(&self) -> bool {
        matches!(self, ForecastError::InvalidInput(_))
    }
}
