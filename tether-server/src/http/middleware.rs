//! Per-request connection middleware
//!
//! Installs a lazy [`ScopedConnection`] in the request extensions before the
//! handler runs and returns it to the pool once the handler is done. If the
//! request future is dropped mid-flight, the lease is released when its last
//! clone drops.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tether_core::{AcquireMode, Connector, Database, ScopedConnection};

use super::error::ApiError;

/// Use with `axum::middleware::from_fn_with_state(db, scoped_connection::<C>)`.
pub async fn scoped_connection<C: Connector>(
    State(db): State<Arc<Database<C>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let connection: ScopedConnection<C::Engine> = db.acquire(AcquireMode::Lazy).await?;
    request.extensions_mut().insert(connection.clone());

    let response = next.run(request).await;

    if connection.release().await {
        tracing::trace!(status = %response.status(), "request connection released");
    }
    Ok(response)
}
