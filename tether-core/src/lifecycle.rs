//! Connection lifecycle manager
//!
//! `Unbound -> bind (with retries) -> Bound -> unbind -> Unbound`.
//!
//! The bound engine lives behind an async `RwLock`: requests take read locks
//! to clone the handle, bind and unbind take the write lock, so transitions
//! are serialized with respect to request traffic.

use std::str::FromStr;

use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::QueryAs;
use sqlx::{FromRow, PgPool, Postgres};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::config::DbConfig;
use crate::engine::{Connector, Engine, PgConnector, PoolStatus};
use crate::error::{DbError, Result};
use crate::query::OptionExt;
use crate::scoped::ScopedConnection;

/// How a new scoped connection borrows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AcquireMode {
    /// Borrow on first use
    #[default]
    Lazy,
    /// Borrow before returning
    Eager,
}

impl FromStr for AcquireMode {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "lazy" => Ok(Self::Lazy),
            "eager" => Ok(Self::Eager),
            other => Err(DbError::config(format!("unknown acquire mode '{other}'"))),
        }
    }
}

/// Owns at most one bound engine for the process.
pub struct Database<C: Connector = PgConnector> {
    connector: C,
    config: DbConfig,
    bound: RwLock<Option<C::Engine>>,
}

impl Database<PgConnector> {
    pub fn new(config: DbConfig) -> Self {
        Self::with_connector(PgConnector, config)
    }
}

impl<C: Connector> Database<C> {
    pub fn with_connector(connector: C, config: DbConfig) -> Self {
        Self {
            connector,
            config,
            bound: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub async fn is_bound(&self) -> bool {
        self.bound.read().await.is_some()
    }

    /// Handle to the bound engine.
    pub async fn engine(&self) -> Result<C::Engine> {
        self.bound.read().await.clone().ok_or(DbError::NotBound)
    }

    pub async fn status(&self) -> Option<PoolStatus> {
        self.bound.read().await.as_ref().map(Engine::status)
    }

    /// Connect, retrying refused attempts per the configured policy, and
    /// store the engine.
    ///
    /// # Errors
    ///
    /// - [`DbError::AlreadyBound`] if an engine is already bound
    /// - [`DbError::DatabaseUnavailable`] once the retry budget is spent
    /// - any non-retryable connect error, on the attempt that raised it
    pub async fn bind(&self) -> Result<PoolStatus> {
        let mut bound = self.bound.write().await;
        if bound.is_some() {
            return Err(DbError::AlreadyBound);
        }

        let engine = self.connect_with_retry().await?;
        let status = engine.status();
        info!(target_db = %self.config.target, "Database connected: {status}");
        *bound = Some(engine);
        Ok(status)
    }

    async fn connect_with_retry(&self) -> Result<C::Engine> {
        let limit = self.config.retry.limit;
        let interval = self.config.retry.interval;

        for attempt in 1..=limit {
            if attempt == 1 {
                info!(target_db = %self.config.target, "Connecting to database...");
            } else {
                info!(attempt, limit, "Retrying to connect to database...");
            }

            match self.connector.connect(&self.config).await {
                Ok(engine) => return Ok(engine),
                Err(err) if err.is_retryable() => {
                    warn!(attempt, limit, error = %err, "Database connection attempt failed");
                    if attempt < limit {
                        info!(attempt, "Waiting {:.1}s to reconnect...", interval.as_secs_f64());
                        tokio::time::sleep(interval).await;
                    }
                }
                Err(err) => {
                    error!(attempt, error = %err, "Database connection failed, not retrying");
                    return Err(err);
                }
            }
        }

        error!(attempts = limit, "Max retries reached.");
        Err(DbError::DatabaseUnavailable { attempts: limit })
    }

    /// Close the bound engine's pool. Returns `false` (and does nothing) when
    /// nothing is bound.
    ///
    /// The state lock is released before the pool drains.
    pub async fn unbind(&self) -> bool {
        let taken = self.bound.write().await.take();
        let Some(engine) = taken else {
            warn!("Unbind requested but no database is bound");
            return false;
        };

        info!("Closing database connection: {}", engine.status());
        engine.close().await;
        info!("Closed database connection: {}", engine.status());
        true
    }

    /// New request-scoped lease on the bound engine.
    pub async fn acquire(&self, mode: AcquireMode) -> Result<ScopedConnection<C::Engine>> {
        let engine = self.engine().await?;
        match mode {
            AcquireMode::Lazy => Ok(ScopedConnection::lazy(engine)),
            AcquireMode::Eager => ScopedConnection::eager(engine).await,
        }
    }
}

impl<C> Database<C>
where
    C: Connector<Engine = PgPool>,
{
    /// First row of `query` on a one-off borrow from the bound pool, or
    /// `NotFound`.
    pub async fn first_or_not_found<'q, O>(
        &self,
        query: QueryAs<'q, Postgres, O, PgArguments>,
    ) -> Result<O>
    where
        O: Send + Unpin + for<'r> FromRow<'r, PgRow>,
    {
        let pool = self.engine().await?;
        query
            .fetch_optional(&pool)
            .await?
            .or_not_found("No such data")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DbSettings;
    use crate::testing::ScriptedConnector;
    use proptest::prelude::*;
    use std::time::Duration;
    use tokio::time::Instant;

    fn config(limit: u32, interval: f64) -> DbConfig {
        DbSettings {
            retry_limit: Some(limit),
            retry_interval: Some(interval),
            ..Default::default()
        }
        .resolve()
        .unwrap()
    }

    fn paused_runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .start_paused(true)
            .build()
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn binds_on_first_attempt() {
        let db = Database::with_connector(ScriptedConnector::reachable(), config(3, 1.0));
        let status = db.bind().await.unwrap();
        assert_eq!(status.kind, "memory");
        assert!(db.is_bound().await);
        assert_eq!(db.connector().attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_target_binds_on_fourth_attempt() {
        let db = Database::with_connector(ScriptedConnector::refusing(3), config(4, 0.5));

        let started = Instant::now();
        db.bind().await.unwrap();

        assert!(db.is_bound().await);
        assert_eq!(db.connector().attempts(), 4);
        assert!(started.elapsed() >= Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn credential_errors_are_not_retried() {
        let db =
            Database::with_connector(ScriptedConnector::rejecting_credentials(), config(5, 1.0));

        let started = Instant::now();
        let err = db.bind().await.unwrap_err();

        assert!(matches!(err, DbError::Sqlx(_)));
        assert_eq!(db.connector().attempts(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert!(!db.is_bound().await);
    }

    #[tokio::test(start_paused = true)]
    async fn binding_twice_is_rejected() {
        let db = Database::with_connector(ScriptedConnector::reachable(), config(1, 0.0));
        db.bind().await.unwrap();
        assert!(matches!(db.bind().await, Err(DbError::AlreadyBound)));
        assert_eq!(db.connector().attempts(), 1);
    }

    #[tokio::test]
    async fn unbind_closes_pool_and_allows_rebind() {
        let db = Database::with_connector(ScriptedConnector::reachable(), config(1, 0.0));
        db.bind().await.unwrap();
        let engine = db.connector().last_engine().unwrap();

        assert!(db.unbind().await);
        assert!(engine.is_closed());
        assert!(!db.is_bound().await);
        assert!(matches!(db.engine().await, Err(DbError::NotBound)));

        db.bind().await.unwrap();
        assert!(db.is_bound().await);
    }

    #[tokio::test]
    async fn unbind_waits_for_borrowed_connection_without_blocking_readers() {
        let db = std::sync::Arc::new(Database::with_connector(
            ScriptedConnector::reachable(),
            config(1, 0.0),
        ));
        db.bind().await.unwrap();
        let engine = db.connector().last_engine().unwrap();

        let scoped = db.acquire(AcquireMode::Eager).await.unwrap();
        let unbinding = tokio::spawn({
            let db = std::sync::Arc::clone(&db);
            async move { db.unbind().await }
        });

        // state reads and new acquires still answer while the pool drains
        let settled = tokio::time::timeout(Duration::from_secs(1), async {
            while db.is_bound().await {
                tokio::task::yield_now().await;
            }
            db.status().await
        })
        .await
        .expect("state lock held across close");
        assert!(settled.is_none());
        assert!(matches!(
            db.acquire(AcquireMode::Lazy).await,
            Err(DbError::NotBound)
        ));
        assert!(!unbinding.is_finished());

        drop(scoped);
        assert!(unbinding.await.unwrap());
        assert!(engine.is_closed());
    }

    #[tokio::test]
    async fn unbind_without_bind_is_noop() {
        let db = Database::with_connector(ScriptedConnector::unreachable(), config(1, 0.0));
        assert!(!db.unbind().await);
        assert!(!db.unbind().await);
    }

    #[tokio::test]
    async fn acquire_requires_bound_engine() {
        let db = Database::with_connector(ScriptedConnector::reachable(), config(1, 0.0));
        assert!(matches!(
            db.acquire(AcquireMode::Lazy).await,
            Err(DbError::NotBound)
        ));

        db.bind().await.unwrap();
        let engine = db.connector().last_engine().unwrap();

        let lazy = db.acquire(AcquireMode::Lazy).await.unwrap();
        assert_eq!(engine.borrows(), 0);
        let eager = db.acquire(AcquireMode::Eager).await.unwrap();
        assert_eq!(engine.borrows(), 1);

        drop(lazy);
        drop(eager);
        assert_eq!(engine.available(), 4);
    }

    #[test]
    fn acquire_mode_parses() {
        assert_eq!("lazy".parse::<AcquireMode>().unwrap(), AcquireMode::Lazy);
        assert_eq!("eager".parse::<AcquireMode>().unwrap(), AcquireMode::Eager);
        assert!("sometimes".parse::<AcquireMode>().is_err());
    }

    proptest! {
        #[test]
        fn refusing_target_spends_whole_budget(limit in 1u32..8) {
            let db = Database::with_connector(ScriptedConnector::unreachable(), config(limit, 0.5));

            let (result, elapsed) = paused_runtime().block_on(async {
                let started = Instant::now();
                let result = db.bind().await;
                (result, started.elapsed())
            });

            let exhausted =
                matches!(result, Err(DbError::DatabaseUnavailable { attempts }) if attempts == limit);
            prop_assert!(exhausted);
            prop_assert_eq!(db.connector().attempts(), limit);
            // exactly limit - 1 waits of 0.5s each
            prop_assert_eq!(elapsed, Duration::from_millis(500) * (limit - 1));
            prop_assert!(db.bound.try_read().map(|b| b.is_none()).unwrap_or(false));
        }

        #[test]
        fn target_reachable_before_budget_binds(limit in 1u32..8, refusals in 0u32..8) {
            prop_assume!(refusals < limit);
            let db = Database::with_connector(ScriptedConnector::refusing(refusals), config(limit, 0.25));

            let result = paused_runtime().block_on(db.bind());

            prop_assert!(result.is_ok());
            prop_assert_eq!(db.connector().attempts(), refusals + 1);
        }
    }
}
