//! Shaping arbitrary-length cost history into fixed-length model inputs.

use cast_series::GroupKey;
use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, ForecastResult};

/// Fit `costs` to exactly `encoder_length` values.
///
/// Longer histories keep their most recent `encoder_length` values. Shorter
/// ones are left-padded by repeating the first value, never with zeros, so
/// the model does not see an artificial cost cliff. An empty history yields
/// a single `0.0`.
pub fn build_request(costs: &[f64], encoder_length: usize) -> Vec<f64> {
    let Some(&first) = costs.first() else {
        return vec![0.0];
    };

    if costs.len() >= encoder_length {
        return costs[costs.len() - encoder_length..].to_vec();
    }

    let mut window = vec![first; encoder_length - costs.len()];
    window.extend_from_slice(costs);
    window
}

/// One model call's input: a fixed window for one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastInput {
    pub group: GroupKey,
    /// Daily costs, oldest first
    pub window: Vec<f64>,
    /// `time_idx` of the first window value
    pub time_idx_start: i64,
}

impl ForecastInput {
    /// Build an input from recent costs starting at `time_idx_start`.
    ///
    /// The start index moves with the window: forward when history is cut,
    /// backward over padded values.
    pub fn from_recent(
        group: GroupKey,
        recent_costs: &[f64],
        encoder_length: usize,
        time_idx_start: i64,
    ) -> ForecastResult<Self> {
        if let Some(bad) = recent_costs.iter().find(|c| !c.is_finite()) {
            return Err(ForecastError::InvalidInput(format!(
                "recent costs for {} contain a non-finite value ({})",
                group, bad
            )));
        }

        let window = build_request(recent_costs, encoder_length);
        let shift = recent_costs.len() as i64 - window.len() as i64;
        Ok(Self {
            group,
            window,
            time_idx_start: time_idx_start + shift,
        })
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }
}
