//! Authentication Middleware
//!
//! Axum middleware for bearer-token validation and account resolution.
//! [`Authenticator::authorize`] holds the whole decision and knows nothing
//! about axum; [`AuthMiddleware::validate_token`] adapts it to a layer.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use thiserror::Error;

use crate::auth::{
    jwt::{JwtService, TokenError},
    models::AuthUser,
};
use crate::database::{CredentialStore, StoreError};
use crate::error::ApiError;

/// Why a protected request was turned away
#[derive(Debug, Error)]
pub enum AuthRejection {
    #[error("no bearer token presented")]
    MissingToken,
    #[error("token rejected: {0}")]
    InvalidToken(#[from] TokenError),
    #[error("token subject has no account")]
    AccountNotFound,
    #[error(transparent)]
    Storage(StoreError),
}

impl From<AuthRejection> for ApiError {
    fn from(rejection: AuthRejection) -> Self {
        match rejection {
            AuthRejection::MissingToken => ApiError::unauthorized("Not authorized - No token provided"),
            AuthRejection::InvalidToken(TokenError::Encode(e)) => ApiError::Internal(e.into()),
            AuthRejection::InvalidToken(_) => ApiError::unauthorized("Not authorized - Invalid token"),
            AuthRejection::AccountNotFound => ApiError::unauthorized("User not found"),
            AuthRejection::Storage(e) => e.into(),
        }
    }
}

/// Resolves the account behind a request's bearer token
#[derive(Clone)]
pub struct Authenticator {
    tokens: Arc<JwtService>,
    store: CredentialStore,
}

impl Authenticator {
    pub fn new(tokens: Arc<JwtService>, store: CredentialStore) -> Self {
        Self { tokens, store }
    }

    /// Extract, verify, resolve. Any failure short-circuits.
    pub async fn authorize(&self, headers: &HeaderMap) -> Result<AuthUser, AuthRejection> {
        let token = bearer_token(headers).ok_or(AuthRejection::MissingToken)?;
        let account_id = self.tokens.verify(token)?;

        match self.store.find_by_id(account_id).await {
            Ok(account) => Ok(AuthUser::from(&account)),
            Err(StoreError::NotFound) => Err(AuthRejection::AccountNotFound),
            Err(e) => Err(AuthRejection::Storage(e)),
        }
    }
}

/// Token from an `Authorization: Bearer <token>` header
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Authentication middleware that validates tokens and injects the account
pub struct AuthMiddleware;

impl AuthMiddleware {
    /// Middleware function for protected routes
    pub async fn validate_token(
        State(authenticator): State<Arc<Authenticator>>,
        mut req: Request,
        next: Next,
    ) -> Result<Response, ApiError> {
        match authenticator.authorize(req.headers()).await {
            Ok(auth_user) => {
                tracing::debug!(
                    "[AuthMiddleware] authorized account {} for {} {}",
                    auth_user.id,
                    req.method(),
                    req.uri().path()
                );
                req.extensions_mut().insert(auth_user);
                Ok(next.run(req).await)
            }
            Err(rejection) => {
                tracing::warn!(
                    "[AuthMiddleware] {} {} rejected: {}",
                    req.method(),
                    req.uri().path(),
                    rejection
                );
                Err(rejection.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::test_token_config;
    use crate::database::{ProfileFields, store::memory_store};
    use axum::http::HeaderValue;
    use uuid::Uuid;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    async fn setup() -> (Authenticator, Arc<JwtService>, CredentialStore) {
        let tokens = Arc::new(JwtService::new(&test_token_config()));
        let store = memory_store();
        (Authenticator::new(tokens.clone(), store.clone()), tokens, store)
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(bearer_token(&headers_with("Bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(&headers_with("Basic abc")), None);
        assert_eq!(bearer_token(&headers_with("Bearer")), None);
        assert_eq!(bearer_token(&headers_with("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[tokio::test]
    async fn resolves_account_for_valid_token() {
        let (authenticator, tokens, store) = setup().await;
        let account = store
            .create_account("a@x.com", "secret123", ProfileFields::default())
            .await
            .unwrap();
        let issued = tokens.issue(account.id).unwrap();

        let user = authenticator
            .authorize(&headers_with(&format!("Bearer {}", issued.token)))
            .await
            .unwrap();
        assert_eq!(user.id, account.id);
        assert_eq!(user.email, "a@x.com");
    }

    #[tokio::test]
    async fn missing_header_is_rejected() {
        let (authenticator, _, _) = setup().await;
        let rejection = authenticator.authorize(&HeaderMap::new()).await.unwrap_err();
        assert!(matches!(rejection, AuthRejection::MissingToken));
    }

    #[tokio::test]
    async fn bad_token_is_rejected() {
        let (authenticator, _, _) = setup().await;
        let rejection = authenticator
            .authorize(&headers_with("Bearer not-a-jwt"))
            .await
            .unwrap_err();
        assert!(matches!(rejection, AuthRejection::InvalidToken(TokenError::Invalid)));
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let (authenticator, tokens, store) = setup().await;
        let account = store
            .create_account("a@x.com", "secret123", ProfileFields::default())
            .await
            .unwrap();
        let issued = tokens
            .issue_at(account.id, chrono::Utc::now() - chrono::Duration::hours(2))
            .unwrap();

        let rejection = authenticator
            .authorize(&headers_with(&format!("Bearer {}", issued.token)))
            .await
            .unwrap_err();
        assert!(matches!(rejection, AuthRejection::InvalidToken(TokenError::Expired)));
    }

    #[tokio::test]
    async fn token_for_unknown_account_is_rejected() {
        let (authenticator, tokens, _) = setup().await;
        let issued = tokens.issue(Uuid::new_v4()).unwrap();
        let rejection = authenticator
            .authorize(&headers_with(&format!("Bearer {}", issued.token)))
            .await
            .unwrap_err();
        assert!(matches!(rejection, AuthRejection::AccountNotFound));
    }
}
