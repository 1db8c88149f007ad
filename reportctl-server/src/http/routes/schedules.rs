//! Schedule endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::db::{Schedule, ScheduleInput, ScheduleRepo};
use crate::http::extractors::ValidJson;
use crate::http::server::AppState;
use crate::http::ApiError;

/// GET /schedules
async fn list_schedules(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Schedule>>, ApiError> {
    Ok(Json(ScheduleRepo::new(state.pool()).list().await?))
}

/// POST /schedules
async fn create_schedule(
    State(state): State<Arc<AppState>>,
    ValidJson(input): ValidJson<ScheduleInput>,
) -> Result<(StatusCode, Json<Schedule>), ApiError> {
    input.validate()?;
    let schedule = ScheduleRepo::new(state.pool()).create(input).await?;
    tracing::info!(schedule_id = %schedule.id, name = %schedule.name, "Schedule created");
    Ok((StatusCode::CREATED, Json(schedule)))
}

/// GET /schedules/{id}
async fn get_schedule(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Schedule>, ApiError> {
    Ok(Json(ScheduleRepo::new(state.pool()).get(&id).await?))
}

/// PUT /schedules/{id}
async fn update_schedule(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ValidJson(input): ValidJson<ScheduleInput>,
) -> Result<Json<Schedule>, ApiError> {
    input.validate()?;
    Ok(Json(ScheduleRepo::new(state.pool()).update(&id, input).await?))
}

/// DELETE /schedules/{id}
async fn delete_schedule(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    ScheduleRepo::new(state.pool()).delete(&id).await?;
    tracing::info!(schedule_id = %id, "Schedule deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/schedules", get(list_schedules).post(create_schedule))
        .route(
            "/schedules/{id}",
            get(get_schedule).put(update_schedule).delete(delete_schedule),
        )
}
