//! Authentication endpoints and the session auth gate

use axum::{
    Json, Router,
    extract::{FromRequestParts, State},
    http::{HeaderMap, StatusCode, header, header::SET_COOKIE, request::Parts},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor,
};

use crate::AppState;
use crate::domain::users;
use crate::services::{cookies, error::ApiError, password, session};

pub fn routes() -> Router<Arc<AppState>> {
    // Rate limit auth endpoints to slow down credential brute force
    let rate_limit_config = GovernorConfigBuilder::default()
        .per_second(6)
        .burst_size(10)
        .key_extractor(SmartIpKeyExtractor)
        .finish()
        .expect("Failed to build rate limit config");

    let rate_limit_layer = GovernorLayer {
        config: rate_limit_config.into(),
    };

    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(get_me))
        .route("/auth/change-password", post(change_password))
        .layer(rate_limit_layer)
}

// ============================================================================
// Auth gate - resolves a session token before any handler logic runs
// ============================================================================

/// Extractor that validates the presented session token (bearer header or
/// cookie) and attaches the resolved user identity.
pub struct AuthUser {
    pub user_id: i64,
    pub username: String,
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = match bearer_token(&parts.headers) {
            Some(token) => token.to_string(),
            None => {
                let jar = CookieJar::from_request_parts(parts, state)
                    .await
                    .map_err(|e| ApiError::internal("cookie extraction", e))?;
                jar.get(cookies::config::SESSION_COOKIE_NAME)
                    .map(|c| c.value().to_string())
                    .ok_or(ApiError::Unauthorized)?
            }
        };

        let user = session::resolve_session(&state.db, &token)
            .await?
            .ok_or(ApiError::Unauthorized)?;

        Ok(AuthUser {
            user_id: user.user_id,
            username: user.username,
        })
    }
}

// ============================================================================
// Session endpoints
// ============================================================================

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize)]
struct UserResponse {
    id: i64,
    username: String,
}

#[derive(Serialize)]
struct LoginResponse {
    token: String,
    user: UserResponse,
}

/// POST /auth/login - Verify credentials, create a session, set the cookie
async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    if req.username.is_empty() || req.password.is_empty() {
        return Err(ApiError::InvalidArgument(
            "username and password are required".to_string(),
        ));
    }

    // Unknown user and wrong password are indistinguishable to the caller.
    let user = match users::get_by_username(&state.db, &req.username).await? {
        Some(user) if password::verify(&req.password, &user.password_hash) => user,
        _ => {
            tracing::warn!("failed login attempt for user: {}", req.username);
            return Err(ApiError::Unauthorized);
        }
    };

    let token = session::create_session(&state.db, user.id).await?;
    tracing::info!("user logged in: {}", user.username);

    let body = Json(LoginResponse {
        token: token.clone(),
        user: UserResponse {
            id: user.id,
            username: user.username,
        },
    });
    let mut response = body.into_response();
    response
        .headers_mut()
        .append(SET_COOKIE, cookies::build_session_cookie(&token)?);
    Ok(response)
}

/// POST /auth/logout - Revoke the session and clear the cookie
async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Response {
    let token = bearer_token(&headers)
        .map(str::to_string)
        .or_else(|| {
            jar.get(cookies::config::SESSION_COOKIE_NAME)
                .map(|c| c.value().to_string())
        });

    if let Some(token) = token {
        // Log but don't fail logout - the cookie is cleared regardless
        if let Err(err) = session::revoke_session(&state.db, &token).await {
            tracing::warn!("failed to revoke session during logout: {err}");
        }
    }

    let mut response = StatusCode::NO_CONTENT.into_response();
    response
        .headers_mut()
        .append(SET_COOKIE, cookies::build_clear_session_cookie());
    response
}

#[derive(Serialize)]
struct MeResponse {
    user: UserResponse,
}

/// GET /auth/me - Identity behind the current session
async fn get_me(user: AuthUser) -> Json<MeResponse> {
    Json(MeResponse {
        user: UserResponse {
            id: user.user_id,
            username: user.username,
        },
    })
}

#[derive(Debug, Deserialize)]
struct ChangePasswordRequest {
    old_password: String,
    new_password: String,
}

/// POST /auth/change-password - Verify the old password, store a new hash
async fn change_password(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    if req.new_password.len() < 8 {
        return Err(ApiError::InvalidArgument(
            "new password must be at least 8 characters".to_string(),
        ));
    }

    let user = users::get_by_id(&state.db, auth.user_id)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    if !password::verify(&req.old_password, &user.password_hash) {
        return Err(ApiError::Unauthorized);
    }

    let hash = password::hash(&req.new_password)
        .map_err(|e| ApiError::internal("hash password", e))?;
    users::set_password_hash(&state.db, user.id, &hash).await?;

    tracing::info!("password changed for user: {}", user.username);
    Ok(StatusCode::NO_CONTENT)
}
