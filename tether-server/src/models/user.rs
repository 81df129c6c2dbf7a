//! User model for the demo API

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::{FromRow, Postgres};

/// Table backing [`User`].
pub const USERS_TABLE: &str = "tether_users";

/// Maximum length for nicknames
const MAX_NICKNAME_LEN: usize = 128;

/// User row. The `name` column is exposed as `nickname`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    #[sqlx(rename = "name")]
    pub nickname: String,
}

impl User {
    /// `SELECT` of one user by primary key.
    pub fn by_id<'q>(id: i64) -> QueryAs<'q, Postgres, User, PgArguments> {
        sqlx::query_as("SELECT id, name FROM tether_users WHERE id = $1").bind(id)
    }
}

/// Input validation failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    #[error("{field} exceeds maximum length of {max}")]
    TooLong { field: &'static str, max: usize },
}

/// Validated nickname
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nickname(String);

impl Nickname {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: "name" });
        }
        if trimmed.chars().count() > MAX_NICKNAME_LEN {
            return Err(ValidationError::TooLong {
                field: "name",
                max: MAX_NICKNAME_LEN,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nickname_is_trimmed() {
        assert_eq!(Nickname::new("  fantix ").unwrap().as_str(), "fantix");
    }

    #[test]
    fn rejects_blank_nickname() {
        let err = Nickname::new("   ").unwrap_err();
        assert!(matches!(err, ValidationError::Empty { .. }));
    }

    #[test]
    fn max_length() {
        assert!(Nickname::new(&"a".repeat(128)).is_ok());
        let err = Nickname::new(&"a".repeat(129)).unwrap_err();
        assert!(matches!(err, ValidationError::TooLong { max: 128, .. }));
    }

    #[test]
    fn serializes_as_id_and_nickname() {
        let user = User {
            id: 1,
            nickname: "fantix".into(),
        };
        assert_eq!(
            serde_json::to_value(&user).unwrap(),
            serde_json::json!({ "id": 1, "nickname": "fantix" })
        );
    }
}
