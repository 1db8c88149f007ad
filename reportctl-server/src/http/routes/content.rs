//! Report content endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};

use crate::db::{ReportContent, ReportContentInput, ReportContentRepo, ScheduleRepo};
use crate::http::extractors::ValidJson;
use crate::http::server::AppState;
use crate::http::ApiError;

/// GET /schedules/{id}/content
async fn list_content(
    State(state): State<Arc<AppState>>,
    Path(schedule_id): Path<String>,
) -> Result<Json<Vec<ReportContent>>, ApiError> {
    // 404 for an unknown schedule rather than an empty list
    ScheduleRepo::new(state.pool()).get(&schedule_id).await?;
    let content = ReportContentRepo::new(state.pool())
        .list_for_schedule(&schedule_id)
        .await?;
    Ok(Json(content))
}

/// POST /schedules/{id}/content
async fn create_content(
    State(state): State<Arc<AppState>>,
    Path(schedule_id): Path<String>,
    ValidJson(input): ValidJson<ReportContentInput>,
) -> Result<(StatusCode, Json<ReportContent>), ApiError> {
    input.validate()?;
    let content = ReportContentRepo::new(state.pool())
        .create(&schedule_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(content)))
}

/// PUT /report-content/{id}
async fn update_content(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ValidJson(input): ValidJson<ReportContentInput>,
) -> Result<Json<ReportContent>, ApiError> {
    input.validate()?;
    Ok(Json(ReportContentRepo::new(state.pool()).update(&id, input).await?))
}

/// DELETE /report-content/{id}
async fn delete_content(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    ReportContentRepo::new(state.pool()).delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/schedules/{id}/content",
            get(list_content).post(create_content),
        )
        .route(
            "/report-content/{id}",
            put(update_content).delete(delete_content),
        )
}
