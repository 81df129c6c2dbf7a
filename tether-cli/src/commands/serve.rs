//! HTTP server command
//!
//! Binds the database (with retries), serves the users API, and closes the
//! pool on Ctrl+C/SIGTERM.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tether_core::Database;
use tether_server::{run_server, ServerConfig};

use crate::config::{DbArgs, TetherConfig};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub db: DbArgs,

    /// Address to bind to (default: 127.0.0.1:5000)
    #[arg(long, short = 'b', env = "APP_BIND")]
    pub bind: Option<SocketAddr>,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let file = TetherConfig::load(args.db.config.as_deref())?;
    let db_config = args.db.resolve(&file)?;

    let defaults = ServerConfig::default();
    let config = ServerConfig {
        bind_addr: args.bind.or(file.server.bind).unwrap_or(defaults.bind_addr),
        cors_permissive: args.cors_permissive || file.server.cors_permissive.unwrap_or(false),
    };

    tracing::info!(
        database = %db_config.target,
        retry_limit = db_config.retry.limit,
        "Starting tether server on {}",
        config.bind_addr
    );

    // Run server (blocks until shutdown)
    run_server(Arc::new(Database::new(db_config)), config)
        .await
        .context("Server error")?;

    Ok(())
}
