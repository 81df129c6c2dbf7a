//! Schema setup for the demo tables

use sqlx::PgPool;

use crate::models::user::USERS_TABLE;

/// Create all demo tables (idempotent).
pub async fn create_all(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Creating demo tables...");

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {USERS_TABLE} (
            id BIGSERIAL PRIMARY KEY,
            name TEXT NOT NULL DEFAULT 'noname'
        )
        "#
    ))
    .execute(pool)
    .await?;

    Ok(())
}

/// Drop all demo tables.
pub async fn drop_all(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Dropping demo tables...");

    sqlx::query(&format!("DROP TABLE IF EXISTS {USERS_TABLE}"))
        .execute(pool)
        .await?;

    Ok(())
}
