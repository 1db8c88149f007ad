//! Report group repository
//!
//! Deleting a group drops its memberships; schedules still pointing at the
//! group block the delete.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use reportctl_core::validation::{self, ValidationError};

use super::{is_foreign_key_violation, new_id, DbError};

/// Report group record
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct ReportGroup {
    pub id: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReportGroupInput {
    pub name: String,
    pub description: String,
}

impl ReportGroupInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::name("name", &self.name)
    }
}

/// Report group repository
pub struct ReportGroupRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ReportGroupRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, input: ReportGroupInput) -> Result<ReportGroup, DbError> {
        let group = ReportGroup {
            id: new_id(),
            name: input.name,
            description: input.description,
        };

        sqlx::query("INSERT INTO ReportGroup (id, name, description) VALUES (?, ?, ?)")
            .bind(&group.id)
            .bind(&group.name)
            .bind(&group.description)
            .execute(self.pool)
            .await?;

        Ok(group)
    }

    pub async fn get(&self, id: &str) -> Result<ReportGroup, DbError> {
        sqlx::query_as::<_, ReportGroup>(
            r#"
            SELECT id, COALESCE(name, '') AS name, COALESCE(description, '') AS description
            FROM ReportGroup
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("report group", id))
    }

    pub async fn list(&self) -> Result<Vec<ReportGroup>, DbError> {
        let groups = sqlx::query_as::<_, ReportGroup>(
            r#"
            SELECT id, COALESCE(name, '') AS name, COALESCE(description, '') AS description
            FROM ReportGroup
            ORDER BY name, id
            "#,
        )
        .fetch_all(self.pool)
        .await?;
        Ok(groups)
    }

    pub async fn update(&self, id: &str, input: ReportGroupInput) -> Result<ReportGroup, DbError> {
        let result = sqlx::query("UPDATE ReportGroup SET name = ?, description = ? WHERE id = ?")
            .bind(&input.name)
            .bind(&input.description)
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("report group", id));
        }

        Ok(ReportGroup {
            id: id.to_owned(),
            name: input.name,
            description: input.description,
        })
    }

    /// Delete a group and its memberships.
    pub async fn delete(&self, id: &str) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM ReportGroupMembership WHERE reportGroupID = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM ReportGroup WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    DbError::Conflict {
                        reason: format!("report group '{}' is still used by schedules", id),
                    }
                } else {
                    DbError::Sqlx(e)
                }
            })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("report group", id));
        }

        tx.commit().await?;
        Ok(())
    }
}
