//! HTTP server layer
//!
//! Axum server with:
//! - Per-request scoped database connection
//! - Database bind/unbind around the serve loop
//! - CORS (localhost only by default)
//! - Request tracing
//! - Graceful shutdown
//! - JSON error responses

pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use extractors::DbConn;
pub use server::{build_router, run_server, ServerConfig, ServerError};
