//! HTTP routes over [`ForecastService`].

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::api::{
    ErrorResponse, ForecastRequest, ForecastResponse, HealthResponse, SummaryQuery,
    SummaryResponse,
};
use crate::error::ServiceError;
use crate::service::ForecastService;

/// State shared across handlers.
#[derive(Clone)]
pub struct AppState {
    service: Arc<ForecastService>,
}

impl AppState {
    pub fn new(service: Arc<ForecastService>) -> Self {
        Self { service }
    }
}

/// Build the router with tracing and permissive CORS.
pub fn router(service: Arc<ForecastService>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/forecast", post(forecast))
        .route("/forecast/summary", get(summary))
        .route("/providers", get(providers))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(AppState::new(service))
}

/// A [`ServiceError`] rendered as `{"detail": ...}` with its status code.
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl<E> From<E> for ApiError
where
    E: Into<ServiceError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        } else {
            warn!("Request rejected ({}): {}", status.as_u16(), self.0);
        }
        let body = ErrorResponse {
            detail: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Malformed bodies are answered with 400 and a `detail` body.
pub async fn forecast(
    State(state): State<AppState>,
    payload: Result<Json<ForecastRequest>, JsonRejection>,
) -> Result<Json<ForecastResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ServiceError::InvalidRequest(e.body_text()))?;
    let service = state.service.clone();
    let response = tokio::task::spawn_blocking(move || service.forecast(&request))
        .await
        .map_err(|e| ServiceError::Task(e.to_string()))??;
    Ok(Json(response))
}

pub async fn summary(
    State(state): State<AppState>,
    query: Result<Query<SummaryQuery>, QueryRejection>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let Query(query) = query.map_err(|e| ServiceError::InvalidRequest(e.body_text()))?;
    let response = state.service.summary(query.lookback_days).await?;
    Ok(Json(response))
}

pub async fn providers(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.service.providers())
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    (StatusCode::OK, Json(state.service.health()))
}
