//! The SQLite datasource
//!
//! Owns the pool for the database file and answers the two calls Grafana
//! makes against a datasource: health checks and data queries. Data queries
//! are not supported; every query gets an error response.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::db::{self, schema};

pub const QUERIES_NOT_SUPPORTED: &str = "Queries are not supported!";
pub const HEALTH_OK_MESSAGE: &str = "Yeah, nah, All good";

#[derive(Debug, Clone)]
pub struct Datasource {
    pool: SqlitePool,
    path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthStatus {
    Ok,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: HealthStatus,
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct QueryDataRequest {
    #[serde(default)]
    pub queries: Vec<DataQuery>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DataQuery {
    #[serde(rename = "refId")]
    pub ref_id: String,
    /// Remaining query model fields, passed through untouched
    #[serde(flatten)]
    pub model: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataResponse {
    pub error: Option<String>,
}

/// Responses keyed by query `refId`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryDataResponse {
    pub results: BTreeMap<String, DataResponse>,
}

impl Datasource {
    /// Open the database file and make sure every table exists.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, sqlx::Error> {
        let path = path.as_ref().to_path_buf();
        tracing::info!(path = %path.display(), "Initializing Database");

        let pool = db::create_pool(&path).await.map_err(|e| {
            tracing::error!(error = %e, "Could not open database");
            e
        })?;
        let datasource = Self { pool, path };

        datasource.ping().await.map_err(|e| {
            tracing::error!(error = %e, "Could not ping database");
            e
        })?;
        schema::init(&datasource.pool).await?;

        tracing::info!("Database initialized!");
        Ok(datasource)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        tracing::debug!("Pinging Database");
        db::ping(&self.pool).await
    }

    pub async fn check_health(&self) -> HealthCheck {
        match self.ping().await {
            Ok(()) => HealthCheck {
                status: HealthStatus::Ok,
                message: HEALTH_OK_MESSAGE.to_string(),
            },
            Err(e) => {
                tracing::warn!(error = %e, "Health check failed");
                HealthCheck {
                    status: HealthStatus::Error,
                    message: format!("Could not ping the database: {}", e),
                }
            }
        }
    }

    /// Answer each query with the not-supported error.
    pub fn query_data(&self, request: &QueryDataRequest) -> QueryDataResponse {
        let results = request
            .queries
            .iter()
            .map(|query| {
                (
                    query.ref_id.clone(),
                    DataResponse {
                        error: Some(QUERIES_NOT_SUPPORTED.to_string()),
                    },
                )
            })
            .collect();

        QueryDataResponse { results }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
