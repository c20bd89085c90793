use std::sync::Arc;

use axum::{extract::State, http::header, response::IntoResponse, Json};
use serde::Serialize;
use quickeats_core::{SanitizedConfig, StatusProjection};

use super::error::ApiError;
use crate::metrics::encode_metrics;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

/// Chef availability, as shown on the status dashboard.
pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusProjection>, ApiError> {
    Ok(Json(state.engine().status()?))
}

/// Prometheus scrape endpoint.
pub async fn get_metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
