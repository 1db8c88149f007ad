//! Report group and membership endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde::Deserialize;

use reportctl_core::validation;

use crate::db::{Membership, MembershipRepo, ReportGroup, ReportGroupInput, ReportGroupRepo};
use crate::http::extractors::ValidJson;
use crate::http::server::AppState;
use crate::http::ApiError;

/// Add member request
#[derive(Deserialize)]
pub struct AddMemberRequest {
    #[serde(rename = "userID")]
    pub user_id: String,
}

/// GET /report-groups
async fn list_groups(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ReportGroup>>, ApiError> {
    Ok(Json(ReportGroupRepo::new(state.pool()).list().await?))
}

/// POST /report-groups
async fn create_group(
    State(state): State<Arc<AppState>>,
    ValidJson(input): ValidJson<ReportGroupInput>,
) -> Result<(StatusCode, Json<ReportGroup>), ApiError> {
    input.validate()?;
    let group = ReportGroupRepo::new(state.pool()).create(input).await?;
    Ok((StatusCode::CREATED, Json(group)))
}

/// GET /report-groups/{id}
async fn get_group(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ReportGroup>, ApiError> {
    Ok(Json(ReportGroupRepo::new(state.pool()).get(&id).await?))
}

/// PUT /report-groups/{id}
async fn update_group(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ValidJson(input): ValidJson<ReportGroupInput>,
) -> Result<Json<ReportGroup>, ApiError> {
    input.validate()?;
    Ok(Json(ReportGroupRepo::new(state.pool()).update(&id, input).await?))
}

/// DELETE /report-groups/{id}
async fn delete_group(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    ReportGroupRepo::new(state.pool()).delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /report-groups/{id}/members
async fn list_members(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<String>,
) -> Result<Json<Vec<Membership>>, ApiError> {
    ReportGroupRepo::new(state.pool()).get(&group_id).await?;
    let members = MembershipRepo::new(state.pool())
        .list_for_group(&group_id)
        .await?;
    Ok(Json(members))
}

/// POST /report-groups/{id}/members
async fn add_member(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<String>,
    ValidJson(req): ValidJson<AddMemberRequest>,
) -> Result<(StatusCode, Json<Membership>), ApiError> {
    validation::non_empty("userID", &req.user_id)?;
    let membership = MembershipRepo::new(state.pool())
        .create(&group_id, &req.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(membership)))
}

/// DELETE /memberships/{id}
async fn remove_member(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    MembershipRepo::new(state.pool()).delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/report-groups", get(list_groups).post(create_group))
        .route(
            "/report-groups/{id}",
            get(get_group).put(update_group).delete(delete_group),
        )
        .route(
            "/report-groups/{id}/members",
            get(list_members).post(add_member),
        )
        .route("/memberships/{id}", delete(remove_member))
}
