//! Custom Axum extractors

use std::ops::Deref;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use sqlx::PgPool;
use tether_core::{Engine, ScopedConnection};

use super::error::ApiError;

/// The request's scoped connection, installed by
/// [`scoped_connection`](super::middleware::scoped_connection).
pub struct DbConn<E: Engine = PgPool>(pub ScopedConnection<E>);

impl<S, E> FromRequestParts<S> for DbConn<E>
where
    S: Send + Sync,
    E: Engine,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ScopedConnection<E>>()
            .cloned()
            .map(Self)
            .ok_or_else(|| ApiError::Internal {
                message: "scoped connection middleware is not installed".into(),
            })
    }
}

impl<E: Engine> Deref for DbConn<E> {
    type Target = ScopedConnection<E>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
