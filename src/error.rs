//! HTTP API Error Types
//!
//! Every failure that reaches a client goes through [`ApiError`]. Internal
//! details are logged server-side and replaced by a generic message.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::auth::jwt::TokenError;
use crate::database::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed input or missing required fields
    #[error("{0}")]
    Validation(String),
    /// Duplicate e-mail
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    /// Logged, never shown to the client
    #[error("internal error: {0:#}")]
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            // registration answers a taken e-mail with 400
            ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-safe message
    pub fn message(&self) -> &str {
        match self {
            ApiError::Validation(msg)
            | ApiError::Conflict(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::NotFound(msg) => msg,
            ApiError::Internal(_) => "Server error",
        }
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        ApiError::Unauthorized(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(e) = &self {
            tracing::error!("Request failed: {:#}", e);
        }
        let body = json!({
            "success": false,
            "message": self.message(),
        });
        (self.status_code(), Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::DuplicateEmail => ApiError::Conflict("User already exists".to_string()),
            StoreError::NotFound => ApiError::NotFound("User not found".to_string()),
            StoreError::Storage(e) => ApiError::Internal(e),
            StoreError::Hashing(e) => ApiError::Internal(e.into()),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(error: TokenError) -> Self {
        match error {
            TokenError::Invalid | TokenError::Expired => {
                ApiError::Unauthorized("Not authorized - Invalid token".to_string())
            }
            TokenError::Encode(e) => ApiError::Internal(e.into()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}
