//! Session management: opaque store-backed tokens
//!
//! Tokens are random 32-byte hex strings whose only meaning is the row they
//! name in the `sessions` table. The gate treats a session as expired the
//! moment `now > expires_at`; expired rows are not deleted here - that is a
//! cleanup job's concern, not the request path's.

use chrono::{Duration, Utc};
use sqlx::PgPool;

use crate::domain::sessions;

const SESSION_EXPIRY_HOURS: i64 = 24;

/// Identity resolved from a valid session, attached to the request.
#[derive(Debug, Clone)]
pub struct AuthedUser {
    pub user_id: i64,
    pub username: String,
}

/// Generate a random 32-byte token as hex.
pub fn generate_token() -> String {
    use rand::Rng;
    let bytes: [u8; 32] = rand::rng().random();
    hex::encode(bytes)
}

/// Create a session for `user_id` and return its token.
pub async fn create_session(db: &PgPool, user_id: i64) -> Result<String, sqlx::Error> {
    let token = generate_token();
    let expires_at = Utc::now() + Duration::hours(SESSION_EXPIRY_HOURS);
    sessions::insert(db, &token, user_id, expires_at).await?;
    Ok(token)
}

/// Resolve a presented token to its user, or `None` when the token is
/// unknown or the session has expired.
pub async fn resolve_session(db: &PgPool, token: &str) -> Result<Option<AuthedUser>, sqlx::Error> {
    let Some(row) = sessions::get_with_user(db, token).await? else {
        return Ok(None);
    };
    if row.expires_at < Utc::now() {
        return Ok(None);
    }
    Ok(Some(AuthedUser {
        user_id: row.user_id,
        username: row.username,
    }))
}

/// Delete a session (logout). Unknown tokens are a no-op.
pub async fn revoke_session(db: &PgPool, token: &str) -> Result<(), sqlx::Error> {
    sessions::delete(db, token).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token_shape() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        // Two draws should not collide.
        assert_ne!(token, generate_token());
    }
}
