//! Startup and shutdown hooks
//!
//! The host server calls [`on_startup`] before accepting traffic and
//! [`on_shutdown`] after the listener has drained.

use tether_core::{Database, DbError};

use crate::db::migrations;

/// Bind the database (retrying while it refuses connections) and create the
/// demo tables.
///
/// If anything after the bind fails, the pool is closed again before the
/// error is returned, leaving the manager unbound.
pub async fn on_startup(db: &Database) -> Result<(), DbError> {
    db.bind().await?;

    if let Err(err) = create_tables(db).await {
        tracing::error!(error = %err, "Startup failed after bind, closing pool");
        db.unbind().await;
        return Err(err);
    }
    Ok(())
}

async fn create_tables(db: &Database) -> Result<(), DbError> {
    let pool = db.engine().await?;
    migrations::create_all(&pool).await?;
    Ok(())
}

/// Close the pool. Safe to call when startup never bound.
pub async fn on_shutdown(db: &Database) {
    if !db.unbind().await {
        tracing::debug!("Shutdown hook ran with no bound database");
    }
}
