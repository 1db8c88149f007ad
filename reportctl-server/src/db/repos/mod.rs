//! Repository implementations for database access
//!
//! Each repository borrows the pool and follows the same patterns:
//! - IDs are generated here (UUID v4)
//! - Missing rows surface as `DbError::NotFound`
//! - Foreign key violations are mapped instead of pre-checked

pub mod memberships;
pub mod report_content;
pub mod report_groups;
pub mod schedules;
pub mod settings;

pub use memberships::{Membership, MembershipRepo};
pub use report_content::{ReportContent, ReportContentInput, ReportContentRepo};
pub use report_groups::{ReportGroup, ReportGroupInput, ReportGroupRepo};
pub use schedules::{Schedule, ScheduleInput, ScheduleRepo};
pub use settings::{Settings, SettingsRepo, SETTINGS_ROW_ID};

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    #[error("conflict: {reason}")]
    Conflict { reason: String },
}

impl DbError {
    pub(crate) fn not_found(resource: &'static str, id: &str) -> Self {
        Self::NotFound {
            resource,
            id: id.to_owned(),
        }
    }
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_foreign_key_violation(),
        _ => false,
    }
}
