//! tether-core: database connection lifecycle management
//!
//! Binds a pooled PostgreSQL engine to a service process (retrying while the
//! server refuses connections), hands out request-scoped lazy connections,
//! and closes the pool on shutdown.

pub mod config;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod query;
pub mod scoped;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use config::{ConnectTarget, DbConfig, DbSettings, DialectOptions, RetryPolicy, SslMode};
pub use engine::{Connector, Engine, PgConnector, PoolStatus};
pub use error::{DbError, Result};
pub use lifecycle::{AcquireMode, Database};
pub use query::OptionExt;
pub use scoped::ScopedConnection;
