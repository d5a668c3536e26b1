//! Cookie building utilities for session management
//!
//! Centralizes cookie formatting so login and logout stay consistent.

use axum::http::HeaderValue;

use super::error::ApiError;

/// Cookie configuration constants
pub mod config {
    /// Session token cookie name
    pub const SESSION_COOKIE_NAME: &str = "session_token";
    /// Session cookie max-age in seconds (24 hours, matching session expiry)
    pub const SESSION_MAX_AGE_SECS: u32 = 24 * 60 * 60;
    /// Path for the session cookie (all routes)
    pub const SESSION_COOKIE_PATH: &str = "/";
}

fn is_dev() -> bool {
    std::env::var("ENV").as_deref() != Ok("prod")
}

fn cookie_same_site() -> &'static str {
    match std::env::var("COOKIE_SAMESITE")
        .unwrap_or_else(|_| "Lax".to_string())
        .to_lowercase()
        .as_str()
    {
        "none" => "None",
        "strict" => "Strict",
        _ => "Lax",
    }
}

/// Build the session Set-Cookie header value
pub fn build_session_cookie(token: &str) -> Result<HeaderValue, ApiError> {
    let same_site = cookie_same_site();
    let secure = if is_dev() { "" } else { " Secure;" };
    let cookie = format!(
        "{}={}; HttpOnly;{} SameSite={}; Path={}; Max-Age={}",
        config::SESSION_COOKIE_NAME,
        token,
        secure,
        same_site,
        config::SESSION_COOKIE_PATH,
        config::SESSION_MAX_AGE_SECS
    );
    cookie
        .parse()
        .map_err(|e| ApiError::internal("build session cookie", e))
}

/// Build a Set-Cookie header that clears the session cookie
pub fn build_clear_session_cookie() -> HeaderValue {
    format!(
        "{}=; HttpOnly; SameSite=Lax; Path={}; Max-Age=0",
        config::SESSION_COOKIE_NAME,
        config::SESSION_COOKIE_PATH
    )
    .parse()
    .expect("static cookie string should always parse")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let value = build_session_cookie("abc123").unwrap();
        let cookie = value.to_str().unwrap();
        assert!(cookie.starts_with("session_token=abc123;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=86400"));
    }

    #[test]
    fn test_clear_cookie_zeroes_max_age() {
        let value = build_clear_session_cookie();
        assert!(value.to_str().unwrap().contains("Max-Age=0"));
    }
}
