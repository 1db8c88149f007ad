//! Report group membership repository

use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

use super::{is_foreign_key_violation, new_id, DbError};

/// A Grafana user belonging to a report group
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Membership {
    pub id: String,
    #[sqlx(rename = "userID")]
    #[serde(rename = "userID")]
    pub user_id: String,
    #[sqlx(rename = "reportGroupID")]
    #[serde(rename = "reportGroupID")]
    pub report_group_id: String,
}

pub struct MembershipRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> MembershipRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Add a user to a group; an unknown group is NotFound.
    pub async fn create(&self, group_id: &str, user_id: &str) -> Result<Membership, DbError> {
        let membership = Membership {
            id: new_id(),
            user_id: user_id.to_owned(),
            report_group_id: group_id.to_owned(),
        };

        sqlx::query("INSERT INTO ReportGroupMembership (id, userID, reportGroupID) VALUES (?, ?, ?)")
            .bind(&membership.id)
            .bind(&membership.user_id)
            .bind(&membership.report_group_id)
            .execute(self.pool)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    DbError::not_found("report group", group_id)
                } else {
                    DbError::Sqlx(e)
                }
            })?;

        Ok(membership)
    }

    pub async fn list_for_group(&self, group_id: &str) -> Result<Vec<Membership>, DbError> {
        let members = sqlx::query_as::<_, Membership>(
            r#"
            SELECT id, COALESCE(userID, '') AS userID, reportGroupID
            FROM ReportGroupMembership
            WHERE reportGroupID = ?
            ORDER BY userID, id
            "#,
        )
        .bind(group_id)
        .fetch_all(self.pool)
        .await?;
        Ok(members)
    }

    /// Distinct user IDs of a group, used as report recipients.
    pub async fn user_ids_for_group(&self, group_id: &str) -> Result<Vec<String>, DbError> {
        let ids = sqlx::query_scalar(
            r#"
            SELECT DISTINCT userID
            FROM ReportGroupMembership
            WHERE reportGroupID = ? AND userID IS NOT NULL
            ORDER BY userID
            "#,
        )
        .bind(group_id)
        .fetch_all(self.pool)
        .await?;
        Ok(ids)
    }

    pub async fn delete(&self, id: &str) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM ReportGroupMembership WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("membership", id));
        }
        Ok(())
    }
}
