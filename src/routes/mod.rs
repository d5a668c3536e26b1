pub mod accounts;
pub mod approvals;
pub mod auth;
pub mod videos;

use axum::{Json, Router, routing::get};
use std::sync::Arc;

use crate::AppState;

/// Build all routes for the API
pub fn build_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .merge(auth::routes())
        .merge(approvals::routes())
        .merge(accounts::routes())
        .merge(videos::routes())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
