//! HTTP server command

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use reportctl_core::ReportctlConfig;
use reportctl_server::{run_server, Datasource, ServerConfig};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to (overrides config/environment)
    #[arg(long, short = 'b')]
    pub bind: Option<SocketAddr>,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// SQLite database file (overrides config/environment)
    #[arg(long)]
    pub db_path: Option<PathBuf>,
}

fn server_config(args: &ServeArgs, config: &ReportctlConfig) -> ServerConfig {
    ServerConfig {
        bind_addr: args.bind.unwrap_or(config.server.bind),
        cors_permissive: args.cors_permissive || config.server.cors_permissive,
        log_queries: !config.is_production(),
    }
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs, config: ReportctlConfig) -> Result<()> {
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| config.database.path.clone());
    let server_config = server_config(&args, &config);

    tracing::info!(
        bind = %server_config.bind_addr,
        db = %db_path.display(),
        env = %config.app_env,
        "Starting reportctl server"
    );

    // The server cannot run without its schema
    let datasource = Datasource::open(&db_path)
        .await
        .with_context(|| format!("Failed to initialize database at {}", db_path.display()))?;

    run_server(datasource, server_config)
        .await
        .context("Server error")?;

    Ok(())
}
