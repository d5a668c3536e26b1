//! Account registry domain - DB queries for linked Instagram accounts
//!
//! `access_token` is deliberately absent from `AccountRow`: the credential
//! is written on create/update but never read back into an API response.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{Executor, Postgres};

const ACCOUNT_COLUMNS: &str = "id, username, platform_user_id, is_active, \
     follower_count, bio, profile_picture_url, created_at, updated_at";

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct AccountRow {
    pub id: i64,
    pub username: String,
    pub platform_user_id: Option<String>,
    pub is_active: bool,
    pub follower_count: Option<i64>,
    pub bio: Option<String>,
    pub profile_picture_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// List accounts ordered by username. `active = None` means no filter.
pub async fn list<'e, E>(executor: E, active: Option<bool>) -> Result<Vec<AccountRow>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        r#"
        SELECT {ACCOUNT_COLUMNS} FROM accounts
        WHERE ($1::boolean IS NULL OR is_active = $1)
        ORDER BY username ASC
        "#
    );
    sqlx::query_as(&sql).bind(active).fetch_all(executor).await
}

/// Get a single account by id.
pub async fn get<'e, E>(executor: E, id: i64) -> Result<Option<AccountRow>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1");
    sqlx::query_as(&sql).bind(id).fetch_optional(executor).await
}

/// Insert a new account. A duplicate username surfaces as a database
/// unique-violation error, which the route layer maps to a conflict.
pub async fn insert<'e, E>(
    executor: E,
    username: &str,
    access_token: &str,
    platform_user_id: Option<&str>,
    bio: Option<&str>,
    profile_picture_url: Option<&str>,
) -> Result<AccountRow, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        r#"
        INSERT INTO accounts (username, access_token, platform_user_id, bio, profile_picture_url)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {ACCOUNT_COLUMNS}
        "#
    );
    sqlx::query_as(&sql)
        .bind(username)
        .bind(access_token)
        .bind(platform_user_id)
        .bind(bio)
        .bind(profile_picture_url)
        .fetch_one(executor)
        .await
}

/// Partial field merge; `None` fields keep their current value.
#[allow(clippy::too_many_arguments)]
pub async fn update<'e, E>(
    executor: E,
    id: i64,
    platform_user_id: Option<String>,
    access_token: Option<String>,
    is_active: Option<bool>,
    follower_count: Option<i64>,
    bio: Option<String>,
    profile_picture_url: Option<String>,
) -> Result<Option<AccountRow>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        r#"
        UPDATE accounts
        SET platform_user_id = COALESCE($2, platform_user_id),
            access_token = COALESCE($3, access_token),
            is_active = COALESCE($4, is_active),
            follower_count = COALESCE($5, follower_count),
            bio = COALESCE($6, bio),
            profile_picture_url = COALESCE($7, profile_picture_url),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {ACCOUNT_COLUMNS}
        "#
    );
    sqlx::query_as(&sql)
        .bind(id)
        .bind(platform_user_id)
        .bind(access_token)
        .bind(is_active)
        .bind(follower_count)
        .bind(bio)
        .bind(profile_picture_url)
        .fetch_optional(executor)
        .await
}

/// Hard delete. Returns `false` when no such account existed.
pub async fn delete<'e, E>(executor: E, id: i64) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Flip `is_active` and return the new row.
pub async fn toggle<'e, E>(executor: E, id: i64) -> Result<Option<AccountRow>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        r#"
        UPDATE accounts
        SET is_active = NOT is_active,
            updated_at = NOW()
        WHERE id = $1
        RETURNING {ACCOUNT_COLUMNS}
        "#
    );
    sqlx::query_as(&sql).bind(id).fetch_optional(executor).await
}
