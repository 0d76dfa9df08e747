//! Request and response shapes of the serving surface.

use std::collections::BTreeMap;

use cast_summary::PortfolioSummary;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Body of `POST /forecast`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRequest {
    pub provider: String,
    pub service: String,
    pub region: String,
    pub currency: String,
    /// Most recent daily costs, oldest first
    pub recent_costs: Vec<f64>,
    /// `time_idx` of the first entry of `recent_costs`
    #[serde(default)]
    pub time_idx_start: i64,
}

/// Predicted sequences keyed by quantile label (`"0.5"` etc.).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub forecast: BTreeMap<String, Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub providers: Vec<String>,
    pub model_loaded: bool,
}

/// Query string of `GET /forecast/summary`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummaryQuery {
    pub lookback_days: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub as_of: NaiveDate,
    pub lookback_days: u32,
    pub reporting_currency: String,
    #[serde(flatten)]
    pub portfolio: PortfolioSummary,
}

/// Error body returned with every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}
