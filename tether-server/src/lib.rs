//! tether-server: axum integration for the tether lifecycle manager
//!
//! Binds the database before serving, gives each request a lazily borrowed
//! connection, and closes the pool after shutdown. Ships a small users API
//! that exercises the whole path.

pub mod db;
pub mod http;
pub mod lifecycle;
pub mod models;
pub mod state;

pub use http::{build_router, run_server, ApiError, DbConn, ServerConfig, ServerError};
pub use state::AppState;
