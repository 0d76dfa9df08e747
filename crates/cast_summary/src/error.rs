//! Error types for summaries.

use thiserror::Error;

/// Result type alias for summary operations.
pub type SummaryResult<T> = Result<T, SummaryError>;

/// Errors that can occur while setting up summaries.
#[derive(Error, Debug)]
pub enum SummaryError {
    #[error("Invalid exchange rate: {0}")]
    InvalidRate(f64),

    #[error("Invalid currency code: '{0}'")]
    InvalidCurrency(String),
}
