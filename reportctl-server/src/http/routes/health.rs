//! Datasource endpoints: health check and data queries

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::datasource::{HealthCheck, HealthStatus, QueryDataRequest, QueryDataResponse};
use crate::http::extractors::ValidJson;
use crate::http::server::AppState;
use crate::http::ApiError;

/// GET /health
async fn check_health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthCheck>) {
    let result = state.datasource.check_health().await;
    let status = match result.status {
        HealthStatus::Ok => StatusCode::OK,
        HealthStatus::Error => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, Json(result))
}

/// POST /query
async fn query_data(
    State(state): State<Arc<AppState>>,
    ValidJson(request): ValidJson<QueryDataRequest>,
) -> Result<Json<QueryDataResponse>, ApiError> {
    if state.log_queries {
        tracing::info!(request = ?request, "QueryData");
    }
    Ok(Json(state.datasource.query_data(&request)))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(check_health))
        .route("/query", post(query_data))
}
