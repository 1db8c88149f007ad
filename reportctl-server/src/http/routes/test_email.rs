//! Test email trigger: build and send a schedule's report immediately

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};

use crate::db::{ScheduleRepo, SettingsRepo};
use crate::http::server::AppState;
use crate::http::ApiError;
use crate::report::{Report, ReportEmailer};

/// POST /test-email/{schedule_id}
async fn test_email(
    State(state): State<Arc<AppState>>,
    Path(schedule_id): Path<String>,
) -> Result<Json<Report>, ApiError> {
    let settings = SettingsRepo::new(state.pool()).get().await.map_err(|e| {
        tracing::error!(error = %e, "testEmail: could not load settings");
        ApiError::from(e)
    })?;
    let email_config = settings.email_config()?;
    let auth_config = settings.auth_config();

    let schedule = ScheduleRepo::new(state.pool()).get(&schedule_id).await?;

    let report = ReportEmailer::new(state.pool())
        .create_report(
            &schedule,
            &auth_config,
            settings.datasource_id,
            &email_config,
            state.mailer.as_ref(),
        )
        .await?;

    Ok(Json(report))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/test-email/{schedule_id}", post(test_email))
}
