//! Demo domain models

pub mod user;

pub use user::{Nickname, User, ValidationError};
