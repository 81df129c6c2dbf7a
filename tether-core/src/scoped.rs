//! Request-scoped connection lease
//!
//! A [`ScopedConnection`] is created per request. In lazy mode nothing is
//! borrowed until [`ScopedConnection::get`] is first awaited; after that the
//! same pooled connection is reused for the rest of the scope. Clones share
//! the lease, and the connection goes back to the pool on [`release`] or when
//! the last clone is dropped, whichever comes first.
//!
//! [`release`]: ScopedConnection::release

use std::sync::Arc;

use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::QueryAs;
use sqlx::{FromRow, PgPool, Postgres};
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};

use crate::engine::Engine;
use crate::error::Result;
use crate::query::OptionExt;

pub struct ScopedConnection<E: Engine> {
    engine: E,
    slot: Arc<Mutex<Option<E::Connection>>>,
}

impl<E: Engine> Clone for ScopedConnection<E> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<E: Engine> ScopedConnection<E> {
    /// Lease that borrows on first use.
    pub fn lazy(engine: E) -> Self {
        Self {
            engine,
            slot: Arc::new(Mutex::new(None)),
        }
    }

    /// Lease that borrows immediately.
    pub async fn eager(engine: E) -> Result<Self> {
        let scoped = Self::lazy(engine);
        drop(scoped.get().await?);
        Ok(scoped)
    }

    /// The leased connection, borrowing it from the pool if this scope has
    /// not done so yet.
    ///
    /// The guard serializes use within the scope; drop it before awaiting
    /// another `get` on the same scope.
    pub async fn get(&self) -> Result<MappedMutexGuard<'_, E::Connection>> {
        let mut slot = self.slot.lock().await;
        let conn = match slot.take() {
            Some(conn) => conn,
            None => {
                tracing::trace!("borrowing pooled connection for request scope");
                self.engine.acquire().await?
            }
        };
        Ok(MutexGuard::map(slot, |slot| slot.insert(conn)))
    }

    /// Whether a connection is currently borrowed by this scope.
    pub async fn is_acquired(&self) -> bool {
        self.slot.lock().await.is_some()
    }

    /// Return the connection to the pool now. A later [`Self::get`] borrows
    /// again. Returns `false` if nothing was borrowed.
    pub async fn release(&self) -> bool {
        let released = self.slot.lock().await.take().is_some();
        if released {
            tracing::trace!("returned request-scoped connection to pool");
        }
        released
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }
}

impl ScopedConnection<PgPool> {
    /// First row of `query` on the scoped connection, or `NotFound`.
    pub async fn first_or_not_found<'q, O>(
        &self,
        query: QueryAs<'q, Postgres, O, PgArguments>,
    ) -> Result<O>
    where
        O: Send + Unpin + for<'r> FromRow<'r, PgRow>,
    {
        let mut conn = self.get().await?;
        query
            .fetch_optional(&mut **conn)
            .await?
            .or_not_found("No such data")
    }
}
