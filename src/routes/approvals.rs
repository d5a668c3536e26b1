//! Approval queue endpoints (/approvals/*)

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;

use super::auth::AuthUser;
use crate::AppState;
use crate::domain::approvals;
use crate::domain::approvals::{ApprovalRow, StatusCounts};
use crate::models::ApprovalStatus;
use crate::services::{error::ApiError, publish};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/approvals", get(list_approvals))
        .route("/approvals/stats/overview", get(stats_overview))
        .route("/approvals/{id}", get(get_approval).patch(edit_approval))
        .route("/approvals/{id}/approve", post(approve_approval))
        .route("/approvals/{id}/reject", post(reject_approval))
}

const DEFAULT_LIST_LIMIT: i64 = 50;
const DEFAULT_STATS_WINDOW_DAYS: i64 = 30;

// ============================================================================
// DTOs
// ============================================================================

#[derive(Serialize)]
struct ApprovalsResponse {
    approvals: Vec<ApprovalRow>,
    count: usize,
}

#[derive(Serialize)]
struct ApprovalResponse {
    approval: ApprovalRow,
}

#[derive(Serialize)]
struct StatsResponse {
    stats: StatusCounts,
}

// limit/offset/days arrive as strings so that a non-numeric value surfaces
// as the crate's own 400 envelope rather than the extractor's rejection.
#[derive(Debug, Deserialize)]
struct ListQuery {
    status: Option<String>,
    limit: Option<String>,
    offset: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RejectRequest {
    #[serde(default)]
    reason: String,
}

#[derive(Debug, Deserialize)]
struct EditApprovalRequest {
    caption: Option<String>,
    hashtags: Option<Vec<String>>,
    scheduled_for: Option<DateTime<Utc>>,
    priority: Option<i32>,
}

impl EditApprovalRequest {
    fn is_empty(&self) -> bool {
        self.caption.is_none()
            && self.hashtags.is_none()
            && self.scheduled_for.is_none()
            && self.priority.is_none()
    }
}

#[derive(Debug, Deserialize)]
struct StatsQuery {
    days: Option<String>,
}

// ============================================================================
// Validation helpers
// ============================================================================

fn non_negative(name: &str, value: Option<&str>) -> Result<Option<i64>, ApiError> {
    let Some(raw) = value else { return Ok(None) };
    match raw.trim().parse::<i64>() {
        Ok(n) if n >= 0 => Ok(Some(n)),
        _ => Err(ApiError::InvalidArgument(format!(
            "{name} must be a non-negative integer"
        ))),
    }
}

fn pagination(limit: Option<&str>, offset: Option<&str>) -> Result<(i64, i64), ApiError> {
    let limit = non_negative("limit", limit)?.unwrap_or(DEFAULT_LIST_LIMIT);
    let offset = non_negative("offset", offset)?.unwrap_or(0);
    Ok((limit, offset))
}

fn status_filter(status: Option<&str>) -> Result<Option<ApprovalStatus>, ApiError> {
    match status {
        None => Ok(None),
        Some(s) => ApprovalStatus::parse(s)
            .map(Some)
            .ok_or_else(|| ApiError::InvalidArgument(format!("unknown status: {s}"))),
    }
}

fn stats_window_days(days: Option<&str>) -> Result<i64, ApiError> {
    let Some(raw) = days else {
        return Ok(DEFAULT_STATS_WINDOW_DAYS);
    };
    match raw.trim().parse::<i64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ApiError::InvalidArgument(
            "days must be a positive integer".to_string(),
        )),
    }
}

/// Distinguish a missing row from an already-decided one after a
/// conditional update matched nothing. The follow-up read only picks the
/// status code; the conditional update already settled the race.
async fn decision_conflict(db: &PgPool, id: i64) -> Result<ApiError, ApiError> {
    match approvals::get(db, id).await? {
        Some(_) => Ok(ApiError::Conflict(
            "approval has already been reviewed".to_string(),
        )),
        None => Ok(ApiError::NotFound("approval")),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /approvals - List approvals, newest first, optional status filter
async fn list_approvals(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApprovalsResponse>, ApiError> {
    let status = status_filter(query.status.as_deref())?;
    let (limit, offset) = pagination(query.limit.as_deref(), query.offset.as_deref())?;

    let rows = approvals::list(&state.db, status, limit, offset).await?;
    Ok(Json(ApprovalsResponse {
        count: rows.len(),
        approvals: rows,
    }))
}

/// GET /approvals/:id - Single approval detail
async fn get_approval(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ApprovalResponse>, ApiError> {
    let approval = approvals::get(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("approval"))?;
    Ok(Json(ApprovalResponse { approval }))
}

/// POST /approvals/:id/approve - Clear a pending video for posting
async fn approve_approval(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ApprovalResponse>, ApiError> {
    match approvals::approve(&state.db, id, &auth.username).await? {
        Some(approval) => {
            tracing::info!("approval {id} approved by {}", auth.username);
            if let Some(url) = &state.publish_webhook_url {
                publish::notify_approved(state.http.clone(), url.clone(), &approval);
            }
            Ok(Json(ApprovalResponse { approval }))
        }
        None => Err(decision_conflict(&state.db, id).await?),
    }
}

/// POST /approvals/:id/reject - Reject a pending video with a reason
async fn reject_approval(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
    body: Option<Json<RejectRequest>>,
) -> Result<Json<ApprovalResponse>, ApiError> {
    // Reason is always stamped, blank when the body omits it.
    let reason = body.map(|Json(req)| req.reason).unwrap_or_default();

    match approvals::reject(&state.db, id, &auth.username, &reason).await? {
        Some(approval) => {
            tracing::info!("approval {id} rejected by {}", auth.username);
            Ok(Json(ApprovalResponse { approval }))
        }
        None => Err(decision_conflict(&state.db, id).await?),
    }
}

/// PATCH /approvals/:id - Partial edit of a still-pending approval
async fn edit_approval(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<EditApprovalRequest>,
) -> Result<Json<ApprovalResponse>, ApiError> {
    if req.is_empty() {
        return Err(ApiError::InvalidArgument(
            "at least one of caption, hashtags, scheduled_for, priority is required".to_string(),
        ));
    }

    match approvals::edit(
        &state.db,
        id,
        req.caption,
        req.hashtags,
        req.scheduled_for,
        req.priority,
    )
    .await?
    {
        Some(approval) => Ok(Json(ApprovalResponse { approval })),
        None => Err(decision_conflict(&state.db, id).await?),
    }
}

/// GET /approvals/stats/overview - Counts by status over a trailing window
async fn stats_overview(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Query(query): Query<StatsQuery>,
) -> Result<Json<StatsResponse>, ApiError> {
    let days = stats_window_days(query.days.as_deref())?;
    let cutoff = Utc::now() - Duration::days(days);
    let stats = approvals::stats_since(&state.db, cutoff).await?;
    Ok(Json(StatsResponse { stats }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        assert_eq!(pagination(None, None).unwrap(), (50, 0));
        assert_eq!(pagination(Some("10"), Some("20")).unwrap(), (10, 20));
    }

    #[test]
    fn test_pagination_rejects_negative() {
        assert!(pagination(Some("-1"), None).is_err());
        assert!(pagination(None, Some("-5")).is_err());
    }

    #[test]
    fn test_pagination_rejects_non_numeric() {
        let err = pagination(Some("abc"), None).unwrap_err();
        assert!(matches!(err, ApiError::InvalidArgument(_)));
        assert!(pagination(None, Some("12.5")).is_err());
        assert!(pagination(Some(""), None).is_err());
    }

    #[test]
    fn test_status_filter() {
        assert_eq!(status_filter(None).unwrap(), None);
        assert_eq!(
            status_filter(Some("pending")).unwrap(),
            Some(ApprovalStatus::Pending)
        );
        assert!(status_filter(Some("posted")).is_err());
    }

    #[test]
    fn test_stats_window() {
        assert_eq!(stats_window_days(None).unwrap(), 30);
        assert_eq!(stats_window_days(Some("7")).unwrap(), 7);
        assert!(stats_window_days(Some("0")).is_err());
        assert!(stats_window_days(Some("-3")).is_err());
    }

    #[test]
    fn test_stats_window_rejects_non_numeric() {
        let err = stats_window_days(Some("soon")).unwrap_err();
        assert!(matches!(err, ApiError::InvalidArgument(_)));
    }

    #[test]
    fn test_edit_request_empty_detection() {
        let empty = EditApprovalRequest {
            caption: None,
            hashtags: None,
            scheduled_for: None,
            priority: None,
        };
        assert!(empty.is_empty());

        let caption_only = EditApprovalRequest {
            caption: Some("X".to_string()),
            ..empty
        };
        assert!(!caption_only.is_empty());
    }
}
