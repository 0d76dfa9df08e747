//! Error types for series preparation.

use thiserror::Error;

use crate::provider::CloudProvider;

/// Result type alias for series operations.
pub type SeriesResult<T> = Result<T, SeriesError>;

/// Errors that can occur while preparing cost series.
#[derive(Error, Debug)]
pub enum SeriesError {
    #[error("[{provider}] No historical points available to train")]
    NoHistory { provider: CloudProvider },

    #[error("[{provider}] Not enough history per service to train. Need at least {required} points per service")]
    DataInsufficient {
        provider: CloudProvider,
        required: usize,
    },

    #[error("Series too short to plan windows: {0} points (need at least 2)")]
    SeriesTooShort(usize),

    #[error("Invalid observation: {0}")]
    InvalidObservation(String),
}

impl SeriesError {
    /// Whether this error means the provider cannot be trained with the data at hand.
    pub fn is_insufficient_data(&self) -> bool {
        matches!(
            self,
            SeriesError::NoHistory { .. } | SeriesError::DataInsufficient { .. }
        )
    }
}
