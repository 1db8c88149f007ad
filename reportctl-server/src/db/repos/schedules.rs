//! Schedule repository
//!
//! - create/update: a `reportGroupID` that names no group is reported as NotFound
//! - delete: removes the schedule's report content in the same transaction

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use reportctl_core::validation::{self, ValidationError};

use super::{is_foreign_key_violation, new_id, DbError};

// Columns are nullable in existing databases; NULL reads back as the default.
const SELECT_SCHEDULE: &str = r#"
    SELECT id,
           COALESCE(interval, 0) AS interval,
           COALESCE(nextReportTime, 0) AS nextReportTime,
           COALESCE(name, '') AS name,
           COALESCE(description, '') AS description,
           COALESCE(lookback, 0) AS lookback,
           reportGroupID,
           COALESCE(time, '') AS time,
           COALESCE(day, 0) AS day
    FROM Schedule
"#;

/// Schedule record
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: String,
    /// Recurrence interval in seconds
    pub interval: i64,
    /// Unix timestamp (seconds) of the next run
    #[sqlx(rename = "nextReportTime")]
    pub next_report_time: i64,
    pub name: String,
    pub description: String,
    /// Report window in seconds
    pub lookback: i64,
    #[sqlx(rename = "reportGroupID")]
    #[serde(rename = "reportGroupID")]
    pub report_group_id: Option<String>,
    /// Time of day, `HH:MM`
    pub time: String,
    pub day: i64,
}

/// Writable schedule fields; omitted fields take their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScheduleInput {
    pub interval: i64,
    pub next_report_time: i64,
    pub name: String,
    pub description: String,
    pub lookback: i64,
    #[serde(rename = "reportGroupID")]
    pub report_group_id: Option<String>,
    pub time: String,
    pub day: i64,
}

impl ScheduleInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::name("name", &self.name)?;
        validation::non_negative("interval", self.interval)?;
        validation::non_negative("lookback", self.lookback)?;
        validation::non_negative("nextReportTime", self.next_report_time)?;
        Ok(())
    }

    /// The UI sends `""` for "no group"; store that as NULL.
    fn group_id(&self) -> Option<&str> {
        self.report_group_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
    }
}

/// Schedule repository
pub struct ScheduleRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ScheduleRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, input: ScheduleInput) -> Result<Schedule, DbError> {
        let id = new_id();
        sqlx::query(
            r#"
            INSERT INTO Schedule
                (id, interval, nextReportTime, name, description, lookback, reportGroupID, time, day)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(input.interval)
        .bind(input.next_report_time)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.lookback)
        .bind(input.group_id())
        .bind(&input.time)
        .bind(input.day)
        .execute(self.pool)
        .await
        .map_err(|e| group_error(e, &input))?;

        tracing::debug!(schedule_id = %id, "Schedule created");
        self.get(&id).await
    }

    pub async fn get(&self, id: &str) -> Result<Schedule, DbError> {
        sqlx::query_as::<_, Schedule>(&format!("{SELECT_SCHEDULE} WHERE id = ?"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("schedule", id))
    }

    pub async fn list(&self) -> Result<Vec<Schedule>, DbError> {
        let schedules = sqlx::query_as::<_, Schedule>(&format!("{SELECT_SCHEDULE} ORDER BY name, id"))
            .fetch_all(self.pool)
            .await?;
        Ok(schedules)
    }

    pub async fn update(&self, id: &str, input: ScheduleInput) -> Result<Schedule, DbError> {
        let result = sqlx::query(
            r#"
            UPDATE Schedule SET
                interval = ?, nextReportTime = ?, name = ?, description = ?,
                lookback = ?, reportGroupID = ?, time = ?, day = ?
            WHERE id = ?
            "#,
        )
        .bind(input.interval)
        .bind(input.next_report_time)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.lookback)
        .bind(input.group_id())
        .bind(&input.time)
        .bind(input.day)
        .bind(id)
        .execute(self.pool)
        .await
        .map_err(|e| group_error(e, &input))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("schedule", id));
        }
        self.get(id).await
    }

    /// Delete a schedule together with its report content.
    pub async fn delete(&self, id: &str) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM ReportContent WHERE scheduleID = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM Schedule WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            // dropping tx rolls back
            return Err(DbError::not_found("schedule", id));
        }

        tx.commit().await?;
        tracing::debug!(schedule_id = %id, "Schedule deleted");
        Ok(())
    }
}

fn group_error(err: sqlx::Error, input: &ScheduleInput) -> DbError {
    if is_foreign_key_violation(&err) {
        DbError::not_found("report group", input.group_id().unwrap_or_default())
    } else {
        DbError::Sqlx(err)
    }
}
