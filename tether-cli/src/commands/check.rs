//! Reachability check: bind with the configured retry policy, report the
//! pool, then close it.

use anyhow::{Context, Result};
use clap::Parser;
use tether_core::Database;

use crate::config::{DbArgs, TetherConfig};

/// Arguments for the check command
#[derive(Parser, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub db: DbArgs,
}

pub async fn run_check(args: CheckArgs) -> Result<()> {
    let file = TetherConfig::load(args.db.config.as_deref())?;
    let config = args.db.resolve(&file)?;
    let target = config.target.to_string();

    let db = Database::new(config);
    let status = db
        .bind()
        .await
        .with_context(|| format!("Failed to connect to {target}"))?;

    println!("Database reachable: {target}");
    println!("Pool: {status}");

    db.unbind().await;
    Ok(())
}
