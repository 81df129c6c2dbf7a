//! Configuration loading for the tether CLI
//!
//! Layers, lowest first: `~/.tether/config.toml` (or `--config`), `DB_*`
//! environment variables, command line flags.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde::Deserialize;
use tether_core::{DbConfig, DbSettings};

/// Contents of the config file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TetherConfig {
    #[serde(default)]
    pub database: DbSettings,
    #[serde(default)]
    pub server: ServerSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    pub bind: Option<SocketAddr>,
    pub cors_permissive: Option<bool>,
}

impl TetherConfig {
    /// Get config file path: ~/.tether/config.toml
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".tether/config.toml")
    }

    /// Load `path`, or the default path if it exists.
    ///
    /// An explicit path that does not exist is an error; a missing default
    /// file just means no file layer.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = Self::config_path();
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::parse(&content).with_context(|| format!("Invalid config file: {:?}", path))
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file (invalid TOML)")
    }
}

/// Database flags shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct DbArgs {
    /// Config file (default: ~/.tether/config.toml)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Connection URL; replaces host/port/user/database
    #[arg(long)]
    pub dsn: Option<String>,

    /// Database host
    #[arg(long)]
    pub host: Option<String>,

    /// Database port
    #[arg(long)]
    pub port: Option<u16>,

    /// Database user
    #[arg(long)]
    pub user: Option<String>,

    /// Database name
    #[arg(long)]
    pub database: Option<String>,

    /// Minimum pooled connections
    #[arg(long)]
    pub pool_min_size: Option<u32>,

    /// Maximum pooled connections
    #[arg(long)]
    pub pool_max_size: Option<u32>,

    /// Connection attempts before giving up
    #[arg(long)]
    pub retry_limit: Option<u32>,

    /// Seconds to wait between attempts
    #[arg(long)]
    pub retry_interval: Option<f64>,

    /// Log every SQL statement
    #[arg(long)]
    pub echo: bool,
}

impl DbArgs {
    fn settings(&self) -> DbSettings {
        DbSettings {
            dsn: self.dsn.clone(),
            host: self.host.clone(),
            port: self.port,
            user: self.user.clone(),
            database: self.database.clone(),
            pool_min_size: self.pool_min_size,
            pool_max_size: self.pool_max_size,
            retry_limit: self.retry_limit,
            retry_interval: self.retry_interval,
            echo: self.echo.then_some(true),
            ..Default::default()
        }
    }

    /// Merge file, environment and flags into a resolved config.
    pub fn resolve(&self, file: &TetherConfig) -> Result<DbConfig> {
        let env = DbSettings::from_env_prefixed("DB_").context("Invalid DB_* environment")?;
        let config = file
            .database
            .clone()
            .merge(env)
            .merge(self.settings())
            .resolve()
            .context("Invalid database configuration")?;
        Ok(config)
    }
}
