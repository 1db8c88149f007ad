//! reportctl - report scheduling backend for Grafana
//!
//! Subcommands:
//! - `serve`: run the HTTP API over the SQLite store
//! - `init-db`: create the database file and its tables
//! - `check`: run the datasource health check

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use reportctl_core::ReportctlConfig;

mod commands;
mod tracing_setup;

#[derive(Parser, Debug)]
#[command(
    name = "reportctl",
    author,
    version,
    about = "Scheduled Grafana reports backed by a local SQLite database"
)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file (TOML); defaults to ./reportctl.toml when present
    #[arg(long, short = 'c', global = true, env = "REPORTCTL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(commands::serve::ServeArgs),
    /// Create the database file and tables, then exit
    InitDb(commands::db::DbArgs),
    /// Check that the database answers (exit code 1 when it doesn't)
    Check(commands::db::DbArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Optional .env next to the binary's working directory
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    tracing_setup::init(&tracing_setup::TracingConfig { debug: cli.debug })?;

    let config = ReportctlConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Serve(args) => commands::serve::run_serve(args, config).await,
        Commands::InitDb(args) => commands::db::run_init(args, config).await,
        Commands::Check(args) => commands::db::run_check(args, config).await,
    }
}
