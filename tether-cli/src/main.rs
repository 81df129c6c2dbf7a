//! tether CLI - database lifecycle demo service
//!
//! - `serve`: run the users API with a bound, pooled database
//! - `check`: verify the database is reachable under the retry policy

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod config;
mod tracing_setup;

#[derive(Parser, Debug)]
#[command(
    name = "tether",
    author,
    version,
    about = "Pooled PostgreSQL lifecycle for async HTTP services"
)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API (binds the database first, closes it on shutdown)
    Serve(commands::serve::ServeArgs),
    /// Connect with the retry policy, print pool status, disconnect
    Check(commands::check::CheckArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    tracing_setup::init(&tracing_setup::TracingConfig { debug: cli.debug })?;

    match cli.command {
        Commands::Serve(args) => commands::serve::run_serve(args).await,
        Commands::Check(args) => commands::check::run_check(args).await,
    }
}
