//! Encoder and prediction window planning.
//!
//! The planner sizes windows from however much history exists: with plenty of
//! data the configured maxima apply, with scarce data both windows shrink
//! until the shortest retained series can still be split into an encoder
//! window followed by a prediction window.

use serde::{Deserialize, Serialize};

use crate::error::{SeriesError, SeriesResult};

/// Upper bounds for the planned windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowLimits {
    pub max_encoder_length: usize,
    pub max_prediction_length: usize,
}

impl Default for WindowLimits {
    fn default() -> Self {
        Self {
            max_encoder_length: 30,
            max_prediction_length: 7,
        }
    }
}

impl WindowLimits {
    pub fn new(max_encoder_length: usize, max_prediction_length: usize) -> Self {
        Self {
            max_encoder_length: max_encoder_length.max(1),
            max_prediction_length: max_prediction_length.max(1),
        }
    }
}

/// Encoder and prediction lengths for one training run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowPlan {
    pub encoder_length: usize,
    pub prediction_length: usize,
}

impl WindowPlan {
    /// Plan windows for a history spanning `total_periods` days.
    ///
    /// The horizon takes a third of the span up to the limit, the encoder
    /// takes what is left, and the encoder is always strictly longer than
    /// the horizon.
    pub fn plan(total_periods: usize, limits: &WindowLimits) -> Self {
        let total = total_periods as i64;
        let max_encoder = limits.max_encoder_length.max(1) as i64;
        let max_prediction = limits.max_prediction_length.max(1) as i64;

        let prediction_length = max_prediction.min((total / 3).max(1));
        let mut encoder_length = max_encoder.min((total - prediction_length - 1).max(2));
        encoder_length = encoder_length.min((total - 1).max(1));
        if encoder_length <= prediction_length {
            encoder_length = prediction_length + 1;
        }

        Self {
            encoder_length: encoder_length as usize,
            prediction_length: prediction_length as usize,
        }
    }

    /// Shrink the plan so that a series of `shortest` points fits one full
    /// encoder window plus one full prediction window.
    ///
    /// Fails when `shortest < 2`, since no split exists; pad first.
    pub fn refine(self, shortest: usize) -> SeriesResult<Self> {
        if shortest < 2 {
            return Err(SeriesError::SeriesTooShort(shortest));
        }

        let mut prediction_length = self.prediction_length;
        let mut encoder_length = self.encoder_length;

        if shortest <= prediction_length {
            prediction_length = shortest.saturating_sub(1).max(1);
        }
        let max_encoder_allowed = shortest.saturating_sub(prediction_length).max(1);
        encoder_length = encoder_length.min(max_encoder_allowed);
        if encoder_length + prediction_length > shortest {
            prediction_length = shortest.saturating_sub(encoder_length).max(1);
        }

        Ok(Self {
            encoder_length,
            prediction_length,
        })
    }

    /// Points a series needs to yield one full window pair.
    pub fn min_series_length(&self) -> usize {
        self.encoder_length + self.prediction_length
    }
}

/// Point count a series needs to be retained for training.
///
/// Starts from the plan's window pair, capped at the longest series, then
/// raised to `configured_min`. When even the longest series is below
/// `configured_min` the threshold degrades to that longest length, so an
/// over-ambitious minimum keeps the best available series instead of
/// discarding everything.
pub fn effective_min_series_length(
    plan: &WindowPlan,
    configured_min: usize,
    max_points: usize,
) -> usize {
    let capped = plan.min_series_length().min(max_points);
    let threshold = if max_points >= configured_min {
        configured_min.max(capped)
    } else {
        max_points
    };
    threshold.max(1)
}

/// Last `time_idx` included in the training partition.
///
/// Holds back one horizon for validation; when that would leave no history
/// before the cutoff, trains on everything.
pub fn training_cutoff(min_time_idx: i64, max_time_idx: i64, prediction_length: usize) -> i64 {
    let cutoff = max_time_idx - prediction_length as i64;
    if cutoff <= min_time_idx {
        max_time_idx
    } else {
        cutoff
    }
}
