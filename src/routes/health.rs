use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{Value, json};

use crate::server::AppState;

/// Liveness check.
///
/// # Route
/// - **Method**: GET
/// - **Path**: `/ping`
/// - **Response**: `{"status": "pong"}`
pub async fn ping() -> Json<Value> {
    Json(json!({ "status": "pong" }))
}

/// Readiness check: answers 200 only when the account store responds.
///
/// # Route
/// - **Method**: GET
/// - **Path**: `/health`
/// - **Response**: `{"status": "ok"}` or 503 `{"status": "unavailable"}`
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.accounts.store().ping().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok" }))),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "status": "unavailable" })))
        }
    }
}
