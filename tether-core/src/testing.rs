//! In-memory engine and scripted connector for exercising the lifecycle
//! without a PostgreSQL server. Enabled in tests and by the `test-util`
//! feature.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::DbConfig;
use crate::engine::{Connector, Engine, PoolStatus};
use crate::error::{DbError, Result};

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(1);

/// Fixed-size pool of numbered fake connections.
#[derive(Clone)]
pub struct MemoryEngine {
    inner: Arc<MemoryPool>,
}

struct MemoryPool {
    max: u32,
    permits: Arc<Semaphore>,
    borrows: AtomicU32,
    closed: AtomicBool,
}

/// A borrowed fake connection; the slot frees when this drops.
#[derive(Debug)]
pub struct MemoryConnection {
    id: u32,
    _permit: OwnedSemaphorePermit,
}

impl MemoryConnection {
    /// Sequence number of the borrow that produced this connection.
    pub fn id(&self) -> u32 {
        self.id
    }
}

impl MemoryEngine {
    pub fn new(max: u32) -> Self {
        Self {
            inner: Arc::new(MemoryPool {
                max,
                permits: Arc::new(Semaphore::new(max as usize)),
                borrows: AtomicU32::new(0),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Free slots right now.
    pub fn available(&self) -> usize {
        self.inner.permits.available_permits()
    }

    /// Total borrows since creation.
    pub fn borrows(&self) -> u32 {
        self.inner.borrows.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Engine for MemoryEngine {
    type Connection = MemoryConnection;

    async fn acquire(&self) -> Result<MemoryConnection> {
        if self.is_closed() {
            return Err(DbError::PoolClosed);
        }
        let permit = tokio::time::timeout(
            ACQUIRE_TIMEOUT,
            Arc::clone(&self.inner.permits).acquire_owned(),
        )
        .await
        .map_err(|_| DbError::PoolExhausted)?
        .map_err(|_| DbError::PoolClosed)?;

        let id = self.inner.borrows.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(MemoryConnection {
            id,
            _permit: permit,
        })
    }

    /// Waits for every borrowed connection to come back, as `PgPool::close`
    /// does.
    async fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        if let Ok(returned) = self.inner.permits.acquire_many(self.inner.max).await {
            drop(returned);
        }
        self.inner.permits.close();
    }

    fn status(&self) -> PoolStatus {
        let free = u32::try_from(self.available()).unwrap_or(u32::MAX);
        PoolStatus {
            kind: "memory",
            max: self.inner.max,
            min: 0,
            size: self.inner.max,
            in_use: self.inner.max.saturating_sub(free),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Script {
    /// Refuse the first `n` attempts, then connect
    RefuseFirst(u32),
    RefuseForever,
    /// Fail every attempt with a non-retryable error
    RejectCredentials,
}

/// Connector whose behavior per attempt is scripted up front.
pub struct ScriptedConnector {
    script: Script,
    pool_size: u32,
    attempts: AtomicU32,
    engines: std::sync::Mutex<Vec<MemoryEngine>>,
}

impl ScriptedConnector {
    fn new(script: Script) -> Self {
        Self {
            script,
            pool_size: 4,
            attempts: AtomicU32::new(0),
            engines: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn reachable() -> Self {
        Self::new(Script::RefuseFirst(0))
    }

    /// Refuses `refusals` attempts before becoming reachable.
    pub fn refusing(refusals: u32) -> Self {
        Self::new(Script::RefuseFirst(refusals))
    }

    pub fn unreachable() -> Self {
        Self::new(Script::RefuseForever)
    }

    pub fn rejecting_credentials() -> Self {
        Self::new(Script::RejectCredentials)
    }

    pub fn with_pool_size(mut self, pool_size: u32) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// Connection attempts made so far.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// The most recently created engine.
    pub fn last_engine(&self) -> Option<MemoryEngine> {
        self.engines
            .lock()
            .ok()
            .and_then(|engines| engines.last().cloned())
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    type Engine = MemoryEngine;

    async fn connect(&self, _config: &DbConfig) -> Result<MemoryEngine> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        match self.script {
            Script::RefuseFirst(n) if attempt > n => {
                let engine = MemoryEngine::new(self.pool_size);
                if let Ok(mut engines) = self.engines.lock() {
                    engines.push(engine.clone());
                }
                Ok(engine)
            }
            Script::RefuseFirst(_) | Script::RefuseForever => {
                Err(DbError::refused(io::ErrorKind::ConnectionRefused))
            }
            Script::RejectCredentials => Err(DbError::from(sqlx::Error::Protocol(
                "password authentication failed for user \"postgres\"".into(),
            ))),
        }
    }
}
