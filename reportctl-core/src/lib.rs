//! reportctl-core: shared building blocks for the report scheduler
//!
//! - `config`: layered configuration (defaults, TOML, environment)
//! - `validation`: input validation for user-supplied fields
//! - `auth`: Grafana credential injection and email settings

pub mod auth;
pub mod config;
pub mod validation;

pub use auth::{AuthConfig, AuthError, EmailConfig};
pub use config::{ConfigError, ReportctlConfig};
pub use validation::ValidationError;
