//! reportctl-server: SQLite-backed report scheduling backend
//!
//! Layers, bottom-up:
//! - `db`: connection pool, schema and repositories
//! - `datasource`: database lifecycle plus the health/query calls Grafana makes
//! - `report`: report assembly and the mail transport seam
//! - `http`: axum routes

pub mod datasource;
pub mod db;
pub mod http;
pub mod report;

pub use datasource::{Datasource, HealthStatus};
pub use http::{build_router, run_server, AppState, ServerConfig};
