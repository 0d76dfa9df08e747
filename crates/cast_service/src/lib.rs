//! # cast_service
//!
//! Configuration and serving for cloudcast.
//!
//! [`ForecastService`] answers single-group forecasts from caller-supplied
//! recent costs and builds portfolio summaries from the provider stores.
//! [`Trainer`] fits and saves the per-provider models the service loads.
//! [`http::router`] exposes the service over axum.

pub mod api;
pub mod config;
pub mod error;
pub mod http;
pub mod service;
pub mod trainer;

pub use api::{
    ErrorResponse, ForecastRequest, ForecastResponse, HealthResponse, SummaryQuery,
    SummaryResponse,
};
pub use config::CloudcastConfig;
pub use error::{ServiceError, ServiceResult};
pub use http::{router, ApiError, AppState};
pub use service::ForecastService;
pub use trainer::{TrainReport, Trainer};
