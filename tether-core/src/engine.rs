//! Engine and connector seams, plus the sqlx PostgreSQL implementation.
//!
//! An [`Engine`] is a cheaply clonable handle to a bounded connection pool.
//! A [`Connector`] builds one from a [`DbConfig`]; it is what the lifecycle
//! manager retries.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgPoolOptions, PgSslMode};
use sqlx::{ConnectOptions, Connection, PgPool, Postgres};

use crate::config::{ConnectTarget, DbConfig, SslMode};
use crate::error::{DbError, Result};

/// Pooled database engine.
#[async_trait]
pub trait Engine: Clone + Send + Sync + 'static {
    /// A borrowed connection; dropping it returns it to the pool.
    type Connection: Send + 'static;

    /// Borrow one connection, waiting for a free slot.
    async fn acquire(&self) -> Result<Self::Connection>;

    /// Close the pool, waiting for borrowed connections to come back.
    async fn close(&self);

    fn status(&self) -> PoolStatus;
}

/// Builds an engine from configuration. One call is one connection attempt.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Engine: Engine;

    async fn connect(&self, config: &DbConfig) -> Result<Self::Engine>;
}

/// Point-in-time view of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    pub kind: &'static str,
    pub max: u32,
    pub min: u32,
    /// Open connections, idle or borrowed
    pub size: u32,
    pub in_use: u32,
}

impl fmt::Display for PoolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{} max={} min={} cur={} use={}>",
            self.kind, self.max, self.min, self.size, self.in_use
        )
    }
}

#[async_trait]
impl Engine for PgPool {
    type Connection = PoolConnection<Postgres>;

    async fn acquire(&self) -> Result<Self::Connection> {
        Ok(sqlx::Pool::acquire(self).await?)
    }

    async fn close(&self) {
        sqlx::Pool::close(self).await;
    }

    fn status(&self) -> PoolStatus {
        let size = self.size();
        let idle = u32::try_from(self.num_idle()).unwrap_or(u32::MAX);
        PoolStatus {
            kind: "sqlx::PgPool",
            max: self.options().get_max_connections(),
            min: self.options().get_min_connections(),
            size,
            in_use: size.saturating_sub(idle),
        }
    }
}

/// Connects a [`PgPool`] with sqlx.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgConnector;

impl PgConnector {
    pub fn connect_options(config: &DbConfig) -> Result<PgConnectOptions> {
        let mut options = match &config.target {
            ConnectTarget::Dsn(dsn) => PgConnectOptions::from_str(dsn)
                .map_err(|e| DbError::config(format!("invalid dsn: {e}")))?,
            ConnectTarget::Discrete {
                host,
                port,
                user,
                password,
                database,
            } => PgConnectOptions::new()
                .host(host)
                .port(*port)
                .username(user)
                .password(password)
                .database(database),
        };

        if let Some(mode) = config.ssl {
            options = options.ssl_mode(mode.into());
        }
        if let Some(name) = &config.kwargs.application_name {
            options = options.application_name(name);
        }
        if let Some(capacity) = config.kwargs.statement_cache_capacity {
            options = options.statement_cache_capacity(capacity);
        }
        if config.echo {
            options = options.log_statements(log::LevelFilter::Info);
        }

        Ok(options)
    }

    pub fn pool_options(config: &DbConfig) -> PgPoolOptions {
        let mut pool = PgPoolOptions::new()
            .min_connections(config.pool_min_size)
            .max_connections(config.pool_max_size);

        if let Some(timeout) = config.kwargs.acquire_timeout {
            pool = pool.acquire_timeout(timeout);
        }
        if let Some(idle) = config.kwargs.max_inactive_connection_lifetime {
            pool = pool.idle_timeout(idle);
        }
        if let Some(lifetime) = config.kwargs.max_lifetime {
            pool = pool.max_lifetime(lifetime);
        }
        pool
    }
}

#[async_trait]
impl Connector for PgConnector {
    type Engine = PgPool;

    async fn connect(&self, config: &DbConfig) -> Result<PgPool> {
        let options = Self::connect_options(config)?;

        // The pool retries refused sockets internally until its acquire
        // timeout; a direct connection surfaces the refusal on this attempt.
        let probe = PgConnection::connect_with(&options).await?;
        probe.close().await?;

        let pool = Self::pool_options(config).connect_with(options).await?;
        Ok(pool)
    }
}

impl From<SslMode> for PgSslMode {
    fn from(mode: SslMode) -> Self {
        match mode {
            SslMode::Disable => PgSslMode::Disable,
            SslMode::Allow => PgSslMode::Allow,
            SslMode::Prefer => PgSslMode::Prefer,
            SslMode::Require => PgSslMode::Require,
            SslMode::VerifyCa => PgSslMode::VerifyCa,
            SslMode::VerifyFull => PgSslMode::VerifyFull,
        }
    }
}
