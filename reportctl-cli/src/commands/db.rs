//! Database maintenance commands

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use reportctl_core::ReportctlConfig;
use reportctl_server::{Datasource, HealthStatus};

#[derive(Parser, Debug)]
pub struct DbArgs {
    /// SQLite database file (overrides config/environment)
    #[arg(long)]
    pub db_path: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

impl DbArgs {
    fn path(&self, config: &ReportctlConfig) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| config.database.path.clone())
    }
}

/// Create the database file and every table.
pub async fn run_init(args: DbArgs, config: ReportctlConfig) -> Result<()> {
    let path = args.path(&config);
    let datasource = Datasource::open(&path)
        .await
        .with_context(|| format!("Failed to initialize database at {}", path.display()))?;
    datasource.close().await;

    if args.json {
        println!("{}", serde_json::json!({ "initialized": path.display().to_string() }));
    } else {
        println!("Database initialized at {}", path.display());
    }
    Ok(())
}

/// Open the database and report its health.
pub async fn run_check(args: DbArgs, config: ReportctlConfig) -> Result<()> {
    let path = args.path(&config);
    let datasource = Datasource::open(&path)
        .await
        .with_context(|| format!("Failed to open database at {}", path.display()))?;

    let health = datasource.check_health().await;
    datasource.close().await;

    if args.json {
        println!("{}", serde_json::to_string(&health)?);
    } else {
        println!("{}", health.message);
    }

    if health.status != HealthStatus::Ok {
        bail!("health check failed");
    }
    Ok(())
}
