//! Error types for the serving layer.

use axum::http::StatusCode;
use cast_forecast::ForecastError;
use cast_series::SeriesError;
use cast_store::StoreError;
use cast_summary::SummaryError;
use thiserror::Error;

/// Result type alias for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced to callers of the serving layer.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("No provider produced a summary")]
    NoSummary,

    #[error("Background task failed: {0}")]
    Task(String),

    #[error(transparent)]
    Forecast(#[from] ForecastError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Series(#[from] SeriesError),

    #[error(transparent)]
    Summary(#[from] SummaryError),
}

impl ServiceError {
    /// HTTP status equivalent of this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::NoSummary => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::Forecast(e) => match e {
                ForecastError::UnregisteredProvider(_) => StatusCode::NOT_FOUND,
                ForecastError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                ForecastError::Model(_) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ServiceError::Store(e) if e.is_unavailable() => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::Store(StoreError::InvalidRecord(_)) => StatusCode::BAD_REQUEST,
            ServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::Series(e) if e.is_insufficient_data() => StatusCode::BAD_REQUEST,
            ServiceError::Series(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::Summary(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the provider has no storage connection configured.
    pub fn is_configuration(&self) -> bool {
        match self {
            ServiceError::Store(e) => e.is_not_configured(),
            ServiceError::Summary(_) => true,
            _ => false,
        }
    }

    /// Whether there was not enough history to proceed.
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, ServiceError::Series(e) if e.is_insufficient_data())
    }
}
