//! Account registry endpoints (/accounts/*)

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::auth::AuthUser;
use crate::AppState;
use crate::domain::accounts;
use crate::domain::accounts::AccountRow;
use crate::services::error::ApiError;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/accounts", get(list_accounts).post(create_account))
        .route(
            "/accounts/{id}",
            get(get_account).patch(update_account).delete(delete_account),
        )
        .route("/accounts/{id}/toggle", post(toggle_account))
}

// ============================================================================
// DTOs
// ============================================================================

#[derive(Serialize)]
struct AccountsResponse {
    accounts: Vec<AccountRow>,
    count: usize,
}

#[derive(Serialize)]
struct AccountResponse {
    account: AccountRow,
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreateAccountRequest {
    username: String,
    access_token: String,
    platform_user_id: Option<String>,
    bio: Option<String>,
    profile_picture_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpdateAccountRequest {
    platform_user_id: Option<String>,
    access_token: Option<String>,
    is_active: Option<bool>,
    follower_count: Option<i64>,
    bio: Option<String>,
    profile_picture_url: Option<String>,
}

impl UpdateAccountRequest {
    fn is_empty(&self) -> bool {
        self.platform_user_id.is_none()
            && self.access_token.is_none()
            && self.is_active.is_none()
            && self.follower_count.is_none()
            && self.bio.is_none()
            && self.profile_picture_url.is_none()
    }
}

// ============================================================================
// Validation helpers
// ============================================================================

fn active_filter(status: Option<&str>) -> Result<Option<bool>, ApiError> {
    match status {
        None | Some("all") => Ok(None),
        Some("active") => Ok(Some(true)),
        Some("inactive") => Ok(Some(false)),
        Some(other) => Err(ApiError::InvalidArgument(format!(
            "unknown status filter: {other}"
        ))),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /accounts - List accounts, optional active/inactive filter
async fn list_accounts(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<AccountsResponse>, ApiError> {
    let active = active_filter(query.status.as_deref())?;
    let rows = accounts::list(&state.db, active).await?;
    Ok(Json(AccountsResponse {
        count: rows.len(),
        accounts: rows,
    }))
}

/// GET /accounts/:id - Single account detail
async fn get_account(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<AccountResponse>, ApiError> {
    let account = accounts::get(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("account"))?;
    Ok(Json(AccountResponse { account }))
}

/// POST /accounts - Link a new account
async fn create_account(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Json(req): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), ApiError> {
    if req.username.trim().is_empty() || req.access_token.is_empty() {
        return Err(ApiError::InvalidArgument(
            "username and access_token are required".to_string(),
        ));
    }

    let account = accounts::insert(
        &state.db,
        req.username.trim(),
        &req.access_token,
        req.platform_user_id.as_deref(),
        req.bio.as_deref(),
        req.profile_picture_url.as_deref(),
    )
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            ApiError::Conflict("username already exists".to_string())
        } else {
            err.into()
        }
    })?;

    tracing::info!("new account added: {}", account.username);
    Ok((StatusCode::CREATED, Json(AccountResponse { account })))
}

/// PATCH /accounts/:id - Partial update of account settings
async fn update_account(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateAccountRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    if req.is_empty() {
        return Err(ApiError::InvalidArgument("no fields to update".to_string()));
    }

    let account = accounts::update(
        &state.db,
        id,
        req.platform_user_id,
        req.access_token,
        req.is_active,
        req.follower_count,
        req.bio,
        req.profile_picture_url,
    )
    .await?
    .ok_or(ApiError::NotFound("account"))?;

    tracing::info!("account {id} updated");
    Ok(Json(AccountResponse { account }))
}

/// DELETE /accounts/:id - Remove an account
async fn delete_account(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if !accounts::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("account"));
    }
    tracing::info!("account {id} deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /accounts/:id/toggle - Flip the active flag
async fn toggle_account(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<AccountResponse>, ApiError> {
    let account = accounts::toggle(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("account"))?;

    tracing::info!(
        "account {id} toggled to {}",
        if account.is_active { "active" } else { "inactive" }
    );
    Ok(Json(AccountResponse { account }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_filter() {
        assert_eq!(active_filter(None).unwrap(), None);
        assert_eq!(active_filter(Some("all")).unwrap(), None);
        assert_eq!(active_filter(Some("active")).unwrap(), Some(true));
        assert_eq!(active_filter(Some("inactive")).unwrap(), Some(false));
        assert!(active_filter(Some("banana")).is_err());
    }

    #[test]
    fn test_update_request_empty_detection() {
        let empty = UpdateAccountRequest {
            platform_user_id: None,
            access_token: None,
            is_active: None,
            follower_count: None,
            bio: None,
            profile_picture_url: None,
        };
        assert!(empty.is_empty());

        let toggled = UpdateAccountRequest {
            is_active: Some(false),
            ..empty
        };
        assert!(!toggled.is_empty());
    }
}
