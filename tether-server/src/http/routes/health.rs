//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::http::error::ApiError;
use crate::http::extractors::DbConn;
use crate::state::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Pool status after the ping, e.g. `<sqlx::PgPool max=10 min=5 cur=5 use=1>`
    pub pool: String,
}

/// GET /health - round trip through the request's scoped connection
async fn health(
    State(state): State<AppState>,
    conn: DbConn,
) -> Result<Json<HealthResponse>, ApiError> {
    {
        let mut raw = conn.get().await?;
        sqlx::query("SELECT 1")
            .execute(&mut **raw)
            .await
            .map_err(tether_core::DbError::from)?;
    }

    let pool = state
        .db()
        .status()
        .await
        .map(|status| status.to_string())
        .unwrap_or_default();

    Ok(Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        pool,
    }))
}

/// Health routes
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
