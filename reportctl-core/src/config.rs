//! Configuration for reportctl
//!
//! Sources, lowest precedence first:
//! 1. Built-in defaults
//! 2. TOML file (`--config`, `REPORTCTL_CONFIG`, or `./reportctl.toml`)
//! 3. Environment: `REPORTCTL_BIND`, `REPORTCTL_DB_PATH`,
//!    `REPORTCTL_CORS_PERMISSIVE`, `APP_ENV`
//!
//! Command-line flags are applied on top by the binary.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "reportctl.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid TOML in {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid value for {key}: '{value}'")]
    InvalidEnv { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportctlConfig {
    pub server: ServerSection,
    pub database: DatabaseSection,
    /// Deployment environment; request payloads are only logged outside `production`
    pub app_env: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind: SocketAddr,
    pub cors_permissive: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub path: PathBuf,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 3030)),
            cors_permissive: false,
        }
    }
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            path: Path::new("..").join("data").join("msupply.db"),
        }
    }
}

impl Default for ReportctlConfig {
    fn default() -> Self {
        Self {
            server: ServerSection::default(),
            database: DatabaseSection::default(),
            app_env: "development".to_string(),
        }
    }
}

impl ReportctlConfig {
    /// Load defaults, the config file (if any) and environment overrides.
    ///
    /// An explicitly named file must exist; the implicit `reportctl.toml`
    /// is skipped when absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var("REPORTCTL_CONFIG").ok().map(PathBuf::from));

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Apply environment overrides using the given lookup.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("REPORTCTL_BIND") {
            self.server.bind = value.parse().map_err(|_| ConfigError::InvalidEnv {
                key: "REPORTCTL_BIND",
                value,
            })?;
        }

        if let Some(value) = lookup("REPORTCTL_DB_PATH") {
            self.database.path = PathBuf::from(value);
        }

        if let Some(value) = lookup("REPORTCTL_CORS_PERMISSIVE") {
            self.server.cors_permissive = match value.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    return Err(ConfigError::InvalidEnv {
                        key: "REPORTCTL_CORS_PERMISSIVE",
                        value,
                    })
                }
            };
        }

        if let Some(value) = lookup("APP_ENV") {
            self.app_env = value;
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }
}
