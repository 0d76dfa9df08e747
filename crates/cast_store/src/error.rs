//! Error types for cost storage.

use cast_series::CloudProvider;
use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while reading or writing cost rows.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("No cost store configured for provider: {0}")]
    NotConfigured(CloudProvider),

    #[error("Cost store unavailable: {0}")]
    Unavailable(String),

    #[error("Corrupt record on line {line}: {message}")]
    Corrupt { line: usize, message: String },

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    /// Whether the provider simply has no store set up.
    pub fn is_not_configured(&self) -> bool {
        matches!(self, StoreError::NotConfigured(_))
    }

    /// Whether the backing store could not be read or written.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            StoreError::Unavailable(_) | StoreError::Corrupt { .. } | StoreError::Io(_)
        )
    }
}
