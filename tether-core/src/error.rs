/// Structured error types for tether-core.
///
/// The variants double as the retry signal for binding: only
/// [`DbError::ConnectionRefused`] is retried, everything else propagates.
/// Binary crates (tether-cli) wrap these in `anyhow` with context.

use std::io;
use thiserror::Error;

/// Main error type for database lifecycle operations
#[derive(Error, Debug)]
pub enum DbError {
    /// Bad or unrecognized configuration option
    #[error("Configuration error: {reason}")]
    Config { reason: String },

    /// Target refused or dropped the connection (transient)
    #[error("Connection refused: {source}")]
    ConnectionRefused {
        #[source]
        source: io::Error,
    },

    /// Retry budget exhausted while binding
    #[error("Database unavailable after {attempts} attempt(s)")]
    DatabaseUnavailable { attempts: u32 },

    /// Expected absence of a row
    #[error("{what}")]
    NotFound { what: String },

    /// No free connection within the pool's acquire timeout
    #[error("No free connection available in the pool")]
    PoolExhausted,

    /// The pool was closed while a borrow was pending
    #[error("Connection pool is closed")]
    PoolClosed,

    /// Bind called while an engine is already bound
    #[error("Database is already bound")]
    AlreadyBound,

    /// Operation needs a bound engine but none is present
    #[error("Database is not bound")]
    NotBound,

    /// Any other driver or query failure
    #[error("Database error: {0}")]
    Sqlx(#[source] sqlx::Error),
}

/// Result type alias for tether-core operations
pub type Result<T> = std::result::Result<T, DbError>;

impl DbError {
    /// Create a config error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Create a not-found error
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Create a connection-refused error of the given kind
    pub fn refused(kind: io::ErrorKind) -> Self {
        Self::ConnectionRefused {
            source: io::Error::from(kind),
        }
    }

    /// Whether a bind attempt that failed with this error may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConnectionRefused { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// The `ConnectionError` family: the socket never came up or was torn down
/// by the peer. DNS and TLS failures fall outside it.
fn is_refusal(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::NotConnected
    )
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(source) if is_refusal(source.kind()) => {
                Self::ConnectionRefused { source }
            }
            sqlx::Error::Configuration(reason) => Self::Config {
                reason: reason.to_string(),
            },
            sqlx::Error::PoolTimedOut => Self::PoolExhausted,
            sqlx::Error::PoolClosed => Self::PoolClosed,
            other => Self::Sqlx(other),
        }
    }
}
