//! Auth routes for registration, login, and profile access

use axum::{
    Extension, Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    middleware,
    routing::{get, post},
};

use crate::auth::{
    AuthMiddleware,
    models::{AuthUser, LoginRequest, RegisterRequest, TokenResponse, UserSummary},
};
use crate::database::ProfileUpdate;
use crate::error::ApiError;
use crate::server::AppState;

/// `POST /api/auth/register`
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    let Json(payload) = payload?;
    let outcome = state.accounts.register(payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(TokenResponse::new(
            "User registered successfully",
            outcome.token,
            UserSummary::from(&outcome.account),
        )),
    ))
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Json(payload) = payload?;
    let outcome = state.accounts.login(payload).await?;

    Ok(Json(TokenResponse::new(
        "Login successful",
        outcome.token,
        UserSummary::from(&outcome.account),
    )))
}

/// `GET /api/auth/profile` (protected)
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Json<AuthUser> {
    Json(state.accounts.get_profile(&user))
}

/// `PUT /api/auth/profile` (protected)
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Json<AuthUser>, ApiError> {
    let Json(update) = payload?;
    let updated = state.accounts.update_profile(user.id, update).await?;
    Ok(Json(updated))
}

pub fn create_auth_routes(state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .layer(middleware::from_fn_with_state(
            state.authenticator.clone(),
            AuthMiddleware::validate_token,
        ));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .merge(protected)
}
