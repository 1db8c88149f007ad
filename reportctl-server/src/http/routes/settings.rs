//! Settings endpoints

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};

use crate::db::{Settings, SettingsRepo};
use crate::http::extractors::ValidJson;
use crate::http::server::AppState;
use crate::http::ApiError;

/// GET /settings
async fn get_settings(State(state): State<Arc<AppState>>) -> Result<Json<Settings>, ApiError> {
    Ok(Json(SettingsRepo::new(state.pool()).get().await?))
}

/// PUT /settings
async fn put_settings(
    State(state): State<Arc<AppState>>,
    ValidJson(settings): ValidJson<Settings>,
) -> Result<Json<Settings>, ApiError> {
    settings.validate()?;
    SettingsRepo::new(state.pool()).upsert(&settings).await?;
    Ok(Json(settings))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/settings", get(get_settings).put(put_settings))
}
