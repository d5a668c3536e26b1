//! User domain - DB queries for dashboard operators

use sqlx::{Executor, Postgres};

/// Credential row used by login and password changes. Never serialized.
#[derive(Debug, sqlx::FromRow)]
pub struct UserAuthRow {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
}

pub async fn get_by_username<'e, E>(
    executor: E,
    username: &str,
) -> Result<Option<UserAuthRow>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as("SELECT id, username, password_hash FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(executor)
        .await
}

pub async fn get_by_id<'e, E>(executor: E, id: i64) -> Result<Option<UserAuthRow>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as("SELECT id, username, password_hash FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// Insert a user unless the username is already taken. Returns `true` when
/// a row was created. Used to seed the default admin at startup.
pub async fn insert_if_absent<'e, E>(
    executor: E,
    username: &str,
    password_hash: &str,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO users (username, password_hash)
        VALUES ($1, $2)
        ON CONFLICT (username) DO NOTHING
        "#,
    )
    .bind(username)
    .bind(password_hash)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn set_password_hash<'e, E>(
    executor: E,
    id: i64,
    password_hash: &str,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
        .bind(password_hash)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}
