//! User repository

use sqlx::PgPool;
use tether_core::{OptionExt, Result, ScopedConnection};

use crate::models::{Nickname, User};

/// User repository bound to one request scope
pub struct UserRepo<'a> {
    conn: &'a ScopedConnection<PgPool>,
}

impl<'a> UserRepo<'a> {
    pub fn new(conn: &'a ScopedConnection<PgPool>) -> Self {
        Self { conn }
    }

    /// Insert a user. Without a nickname the column default applies.
    pub async fn create(&self, nickname: Option<&Nickname>) -> Result<User> {
        let mut conn = self.conn.get().await?;
        let user = match nickname {
            Some(name) => {
                sqlx::query_as::<_, User>(
                    "INSERT INTO tether_users (name) VALUES ($1) RETURNING id, name",
                )
                .bind(name.as_str())
                .fetch_one(&mut **conn)
                .await?
            }
            None => {
                sqlx::query_as::<_, User>(
                    "INSERT INTO tether_users DEFAULT VALUES RETURNING id, name",
                )
                .fetch_one(&mut **conn)
                .await?
            }
        };

        tracing::debug!(user_id = user.id, "user created");
        Ok(user)
    }

    pub async fn get(&self, id: i64) -> Result<Option<User>> {
        let mut conn = self.conn.get().await?;
        Ok(User::by_id(id).fetch_optional(&mut **conn).await?)
    }

    /// Fetch a user or fail with `NotFound`.
    pub async fn get_or_not_found(&self, id: i64) -> Result<User> {
        self.get(id)
            .await?
            .or_not_found(format!("User {id} is not found"))
    }
}
