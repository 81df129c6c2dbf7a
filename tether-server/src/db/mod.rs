//! Database layer - schema setup and repositories
//!
//! Repositories run on the request's [`ScopedConnection`], so every query a
//! handler issues shares the one connection borrowed for that request.
//!
//! [`ScopedConnection`]: tether_core::ScopedConnection

pub mod migrations;
pub mod users;

pub use users::UserRepo;
