//! API error type with IntoResponse
//!
//! Every failure is reported once, as `{ "error": code, "message": text }`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use reportctl_core::ValidationError;

use crate::db::DbError;
use crate::report::{MailError, ReportError};

#[derive(Debug)]
pub enum ApiError {
    /// Validation failed (400)
    Validation(ValidationError),

    /// Malformed request body (400)
    BadRequest { message: String },

    /// Resource not found (404)
    NotFound { resource: &'static str, id: String },

    /// Blocked by referencing rows (409)
    Conflict { reason: String },

    /// Report could not be addressed to anyone (422)
    NoRecipients { schedule_id: String },

    /// Mail transport failure (502)
    Mail(MailError),

    /// Database error (500, logged)
    Database(DbError),

    /// Misconfiguration or other internal failure (500, logged)
    Internal { message: String },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::Validation(e) => (StatusCode::BAD_REQUEST, "validation_error", e.to_string()),
            Self::BadRequest { message } => (StatusCode::BAD_REQUEST, "bad_request", message),
            Self::NotFound { resource, id } => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!("{} '{}' not found", resource, id),
            ),
            Self::Conflict { reason } => (StatusCode::CONFLICT, "conflict", reason),
            Self::NoRecipients { schedule_id } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "no_recipients",
                format!("schedule '{}' has no recipients", schedule_id),
            ),
            Self::Mail(e) => {
                tracing::error!("Mail error: {}", e);
                (StatusCode::BAD_GATEWAY, "mail_error", e.to_string())
            }
            Self::Database(e) => {
                // Log the actual error, return generic message
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "an internal error occurred".to_string(),
                )
            }
            Self::Internal { message } => {
                tracing::error!("Internal error: {}", message);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };

        (status, Json(json!({ "error": code, "message": message }))).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound { resource, id } => Self::NotFound { resource, id },
            DbError::Conflict { reason } => Self::Conflict { reason },
            _ => Self::Database(e),
        }
    }
}

impl From<ReportError> for ApiError {
    fn from(e: ReportError) -> Self {
        match e {
            ReportError::Db(e) => e.into(),
            ReportError::Mail(e) => Self::Mail(e),
            ReportError::NoRecipients { schedule_id } => Self::NoRecipients { schedule_id },
            other @ (ReportError::Auth(_) | ReportError::InvalidUrl { .. }) => Self::Internal {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use reportctl_core::AuthError;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_error_is_400() {
        let err = ApiError::Validation(ValidationError::Empty { field: "name" });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["message"], "name cannot be empty");
    }

    #[tokio::test]
    async fn not_found_is_404() {
        let err: ApiError = DbError::NotFound {
            resource: "schedule",
            id: "abc".into(),
        }
        .into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["message"], "schedule 'abc' not found");
    }

    #[tokio::test]
    async fn conflict_is_409() {
        let err: ApiError = DbError::Conflict {
            reason: "in use".into(),
        }
        .into();
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn database_error_is_hidden() {
        let err: ApiError = DbError::Sqlx(sqlx::Error::PoolClosed).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["message"], "an internal error occurred");
    }

    #[tokio::test]
    async fn report_errors_map_to_status() {
        let no_recipients: ApiError = ReportError::NoRecipients {
            schedule_id: "s".into(),
        }
        .into();
        assert_eq!(
            no_recipients.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );

        let auth: ApiError = ReportError::Auth(AuthError::MissingScheme { url: "x".into() }).into();
        assert_eq!(auth.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);

        let mail: ApiError = ReportError::Mail(MailError::Rejected("550".into())).into();
        assert_eq!(mail.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
