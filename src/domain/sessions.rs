//! Session domain - DB queries for the server-side session table
//!
//! The session id doubles as the opaque token handed to the client. Expiry
//! is enforced by the auth gate; expired rows are left in place for an
//! external cleanup job, per the operational split.

use chrono::{DateTime, Utc};
use sqlx::{Executor, Postgres};

/// Session joined with its owning user, as resolved by the auth gate.
#[derive(Debug, sqlx::FromRow)]
pub struct SessionUserRow {
    pub user_id: i64,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

pub async fn insert<'e, E>(
    executor: E,
    token: &str,
    user_id: i64,
    expires_at: DateTime<Utc>,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        r#"
        INSERT INTO sessions (id, user_id, expires_at)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(token)
    .bind(user_id)
    .bind(expires_at)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn get_with_user<'e, E>(
    executor: E,
    token: &str,
) -> Result<Option<SessionUserRow>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
        SELECT s.user_id, u.username, s.expires_at
        FROM sessions s
        JOIN users u ON u.id = s.user_id
        WHERE s.id = $1
        "#,
    )
    .bind(token)
    .fetch_optional(executor)
    .await
}

pub async fn delete<'e, E>(executor: E, token: &str) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query("DELETE FROM sessions WHERE id = $1")
        .bind(token)
        .execute(executor)
        .await?;
    Ok(())
}
