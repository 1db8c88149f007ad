//! Report content repository - the dashboard panels included in a schedule's report

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use reportctl_core::validation::{self, ValidationError};

use super::{is_foreign_key_violation, new_id, DbError};

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct ReportContent {
    pub id: String,
    #[sqlx(rename = "scheduleID")]
    #[serde(rename = "scheduleID")]
    pub schedule_id: String,
    #[sqlx(rename = "panelID")]
    #[serde(rename = "panelID")]
    pub panel_id: i64,
    #[sqlx(rename = "dashboardID")]
    #[serde(rename = "dashboardID")]
    pub dashboard_id: String,
    /// Overrides the schedule's lookback when greater than zero
    pub lookback: i64,
    /// JSON object of dashboard variable values, or empty
    pub variables: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReportContentInput {
    #[serde(rename = "panelID")]
    pub panel_id: i64,
    #[serde(rename = "dashboardID")]
    pub dashboard_id: String,
    pub lookback: i64,
    pub variables: String,
}

impl ReportContentInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::non_empty("dashboardID", &self.dashboard_id)?;
        validation::non_negative("lookback", self.lookback)?;
        validation::variables(&self.variables)
    }
}

pub struct ReportContentRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ReportContentRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Attach a panel to a schedule; an unknown schedule is NotFound.
    pub async fn create(
        &self,
        schedule_id: &str,
        input: ReportContentInput,
    ) -> Result<ReportContent, DbError> {
        let content = ReportContent {
            id: new_id(),
            schedule_id: schedule_id.to_owned(),
            panel_id: input.panel_id,
            dashboard_id: input.dashboard_id,
            lookback: input.lookback,
            variables: input.variables,
        };

        sqlx::query(
            r#"
            INSERT INTO ReportContent (id, scheduleID, panelID, dashboardID, lookback, variables)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&content.id)
        .bind(&content.schedule_id)
        .bind(content.panel_id)
        .bind(&content.dashboard_id)
        .bind(content.lookback)
        .bind(&content.variables)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                DbError::not_found("schedule", schedule_id)
            } else {
                DbError::Sqlx(e)
            }
        })?;

        Ok(content)
    }

    pub async fn get(&self, id: &str) -> Result<ReportContent, DbError> {
        sqlx::query_as::<_, ReportContent>(
            r#"
            SELECT id, COALESCE(scheduleID, '') AS scheduleID, COALESCE(panelID, 0) AS panelID,
                   COALESCE(dashboardID, '') AS dashboardID, COALESCE(lookback, 0) AS lookback,
                   COALESCE(variables, '') AS variables
            FROM ReportContent
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("report content", id))
    }

    pub async fn list_for_schedule(&self, schedule_id: &str) -> Result<Vec<ReportContent>, DbError> {
        let content = sqlx::query_as::<_, ReportContent>(
            r#"
            SELECT id, COALESCE(scheduleID, '') AS scheduleID, COALESCE(panelID, 0) AS panelID,
                   COALESCE(dashboardID, '') AS dashboardID, COALESCE(lookback, 0) AS lookback,
                   COALESCE(variables, '') AS variables
            FROM ReportContent
            WHERE scheduleID = ?
            ORDER BY dashboardID, panelID, id
            "#,
        )
        .bind(schedule_id)
        .fetch_all(self.pool)
        .await?;
        Ok(content)
    }

    pub async fn update(
        &self,
        id: &str,
        input: ReportContentInput,
    ) -> Result<ReportContent, DbError> {
        let result = sqlx::query(
            r#"
            UPDATE ReportContent SET panelID = ?, dashboardID = ?, lookback = ?, variables = ?
            WHERE id = ?
            "#,
        )
        .bind(input.panel_id)
        .bind(&input.dashboard_id)
        .bind(input.lookback)
        .bind(&input.variables)
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("report content", id));
        }
        self.get(id).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM ReportContent WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("report content", id));
        }
        Ok(())
    }
}
