//! Approval queue domain - DB queries for the review workflow
//!
//! The approve/reject/edit statements all carry `AND status = 'pending'` in
//! their WHERE clause. That conditional write is the only concurrency
//! control in the workflow: of N concurrent decisions against the same row,
//! exactly one matches, the rest see zero rows and surface a conflict.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{Executor, Postgres};

use crate::models::ApprovalStatus;

/// A queued video awaiting (or past) its posting decision. Also the API
/// representation; `serde` serializes it verbatim into response envelopes.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ApprovalRow {
    pub id: i64,
    pub account_id: i64,
    pub video_path: String,
    pub caption: String,
    pub hashtags: Vec<String>,
    pub music_track: Option<String>,
    pub status: ApprovalStatus,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub priority: i32,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// List approvals, newest first, optionally filtered by status.
pub async fn list<'e, E>(
    executor: E,
    status: Option<ApprovalStatus>,
    limit: i64,
    offset: i64,
) -> Result<Vec<ApprovalRow>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
        SELECT * FROM approvals
        WHERE ($1::approval_status IS NULL OR status = $1)
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(status)
    .bind(limit)
    .bind(offset)
    .fetch_all(executor)
    .await
}

/// Get a single approval by id.
pub async fn get<'e, E>(executor: E, id: i64) -> Result<Option<ApprovalRow>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as("SELECT * FROM approvals WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// Transition `pending -> approved`, stamping the reviewer.
///
/// Returns `None` when the row is absent or no longer pending; the caller
/// decides between not-found and conflict.
pub async fn approve<'e, E>(
    executor: E,
    id: i64,
    reviewer: &str,
) -> Result<Option<ApprovalRow>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
        UPDATE approvals
        SET status = 'approved',
            reviewed_by = $2,
            reviewed_at = NOW(),
            updated_at = NOW()
        WHERE id = $1 AND status = 'pending'
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(reviewer)
    .fetch_optional(executor)
    .await
}

/// Transition `pending -> rejected`, stamping reviewer and reason.
///
/// `reason` is always stored, even when blank, so rejected rows are
/// distinguishable from approved ones without consulting the status alone.
pub async fn reject<'e, E>(
    executor: E,
    id: i64,
    reviewer: &str,
    reason: &str,
) -> Result<Option<ApprovalRow>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
        UPDATE approvals
        SET status = 'rejected',
            reviewed_by = $2,
            reviewed_at = NOW(),
            rejection_reason = $3,
            updated_at = NOW()
        WHERE id = $1 AND status = 'pending'
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(reviewer)
    .bind(reason)
    .fetch_optional(executor)
    .await
}

/// Partial edit of a row that is still pending. `None` fields keep their
/// current value.
pub async fn edit<'e, E>(
    executor: E,
    id: i64,
    caption: Option<String>,
    hashtags: Option<Vec<String>>,
    scheduled_for: Option<DateTime<Utc>>,
    priority: Option<i32>,
) -> Result<Option<ApprovalRow>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
        UPDATE approvals
        SET caption = COALESCE($2, caption),
            hashtags = COALESCE($3, hashtags),
            scheduled_for = COALESCE($4, scheduled_for),
            priority = COALESCE($5, priority),
            updated_at = NOW()
        WHERE id = $1 AND status = 'pending'
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(caption)
    .bind(hashtags)
    .bind(scheduled_for)
    .bind(priority)
    .fetch_optional(executor)
    .await
}

/// Counts by status over a trailing window, plus the grand total.
#[derive(Debug, Default, Serialize, sqlx::FromRow)]
pub struct StatusCounts {
    pub total: i64,
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
}

/// Count approvals created after `cutoff`, grouped by status. An empty
/// window yields all zeros.
pub async fn stats_since<'e, E>(
    executor: E,
    cutoff: DateTime<Utc>,
) -> Result<StatusCounts, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
        SELECT
            COUNT(*) AS total,
            COUNT(*) FILTER (WHERE status = 'pending') AS pending,
            COUNT(*) FILTER (WHERE status = 'approved') AS approved,
            COUNT(*) FILTER (WHERE status = 'rejected') AS rejected
        FROM approvals
        WHERE created_at > $1
        "#,
    )
    .bind(cutoff)
    .fetch_one(executor)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sqlx::PgPool;

    async fn seed_account(pool: &PgPool) -> i64 {
        sqlx::query_scalar(
            "INSERT INTO accounts (username, access_token) VALUES ('queue_fixture', 't') RETURNING id",
        )
        .fetch_one(pool)
        .await
        .unwrap()
    }

    async fn seed_approval(pool: &PgPool, account_id: i64, age: Duration) -> i64 {
        sqlx::query_scalar(
            r#"
            INSERT INTO approvals (account_id, video_path, caption, hashtags, created_at)
            VALUES ($1, 'clips/reel.mp4', 'first cut', ARRAY['fyp','funny'], $2)
            RETURNING id
            "#,
        )
        .bind(account_id)
        .bind(Utc::now() - age)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    #[sqlx::test]
    async fn test_approve_stamps_reviewer_once(pool: PgPool) {
        let account = seed_account(&pool).await;
        let id = seed_approval(&pool, account, Duration::zero()).await;

        let row = approve(&pool, id, "admin")
            .await
            .unwrap()
            .expect("pending row should transition");
        assert_eq!(row.status, ApprovalStatus::Approved);
        assert_eq!(row.reviewed_by.as_deref(), Some("admin"));
        assert!(row.reviewed_at.is_some());

        // Terminal: neither decision matches the row again.
        assert!(approve(&pool, id, "admin").await.unwrap().is_none());
        assert!(reject(&pool, id, "admin", "late").await.unwrap().is_none());
    }

    #[sqlx::test]
    async fn test_concurrent_decisions_have_one_winner(pool: PgPool) {
        let account = seed_account(&pool).await;
        let id = seed_approval(&pool, account, Duration::zero()).await;

        let (a, b) = tokio::join!(
            approve(&pool, id, "alice"),
            reject(&pool, id, "bob", "duplicate"),
        );
        let wins = [a.unwrap().is_some(), b.unwrap().is_some()];
        assert_eq!(wins.iter().filter(|w| **w).count(), 1);
    }

    #[sqlx::test]
    async fn test_reject_stores_blank_reason(pool: PgPool) {
        let account = seed_account(&pool).await;
        let id = seed_approval(&pool, account, Duration::zero()).await;

        let row = reject(&pool, id, "admin", "").await.unwrap().unwrap();
        assert_eq!(row.status, ApprovalStatus::Rejected);
        assert_eq!(row.rejection_reason.as_deref(), Some(""));
    }

    #[sqlx::test]
    async fn test_edit_only_touches_provided_fields(pool: PgPool) {
        let account = seed_account(&pool).await;
        let id = seed_approval(&pool, account, Duration::zero()).await;

        let row = edit(&pool, id, Some("recut".to_string()), None, None, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.caption, "recut");
        assert_eq!(row.hashtags, ["fyp", "funny"]);
        assert_eq!(row.priority, 0);
        assert_eq!(row.scheduled_for, None);
    }

    #[sqlx::test]
    async fn test_edit_refused_after_decision(pool: PgPool) {
        let account = seed_account(&pool).await;
        let id = seed_approval(&pool, account, Duration::zero()).await;
        approve(&pool, id, "admin").await.unwrap().unwrap();

        let edited = edit(&pool, id, Some("too late".to_string()), None, None, None)
            .await
            .unwrap();
        assert!(edited.is_none());
    }

    #[sqlx::test]
    async fn test_list_filters_and_orders_newest_first(pool: PgPool) {
        let account = seed_account(&pool).await;
        let oldest = seed_approval(&pool, account, Duration::days(2)).await;
        let middle = seed_approval(&pool, account, Duration::days(1)).await;
        let newest = seed_approval(&pool, account, Duration::zero()).await;
        approve(&pool, middle, "admin").await.unwrap().unwrap();

        let all = list(&pool, None, 50, 0).await.unwrap();
        let ids: Vec<i64> = all.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![newest, middle, oldest]);

        let pending = list(&pool, Some(ApprovalStatus::Pending), 50, 0)
            .await
            .unwrap();
        let ids: Vec<i64> = pending.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![newest, oldest]);

        let page = list(&pool, None, 1, 1).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, middle);
    }

    #[sqlx::test]
    async fn test_stats_counts_within_window(pool: PgPool) {
        let account = seed_account(&pool).await;
        let recent = seed_approval(&pool, account, Duration::days(1)).await;
        seed_approval(&pool, account, Duration::days(2)).await;
        seed_approval(&pool, account, Duration::days(90)).await;
        approve(&pool, recent, "admin").await.unwrap().unwrap();

        let counts = stats_since(&pool, Utc::now() - Duration::days(30))
            .await
            .unwrap();
        assert_eq!(counts.total, 2);
        assert_eq!(counts.pending, 1);
        assert_eq!(counts.approved, 1);
        assert_eq!(counts.rejected, 0);

        let empty = stats_since(&pool, Utc::now()).await.unwrap();
        assert_eq!(empty.total, 0);
    }
}
