//! Account Operations
//!
//! Registration, login and profile management. This is the only layer that
//! turns store and token errors into client-facing [`ApiError`]s.

use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{JwtService, models::{AuthUser, LoginRequest, RegisterRequest}};
use crate::database::{Account, CredentialStore, ProfileUpdate, StoreError, is_valid_email, normalize_email};
use crate::error::ApiError;

/// An account together with a freshly issued token
#[derive(Debug, Clone)]
pub struct AuthOutcome {
    pub account: Account,
    pub token: String,
}

#[derive(Clone)]
pub struct AccountService {
    store: CredentialStore,
    tokens: Arc<JwtService>,
}

impl AccountService {
    pub fn new(store: CredentialStore, tokens: Arc<JwtService>) -> Self {
        Self { store, tokens }
    }

    /// Create an account and sign the caller in immediately
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthOutcome, ApiError> {
        let email = normalize_email(&request.email);
        if email.is_empty() || request.password.is_empty() {
            return Err(ApiError::validation("Email and password are required"));
        }
        if !is_valid_email(&email) {
            return Err(ApiError::validation("Invalid email address"));
        }

        let account = self
            .store
            .create_account(&email, &request.password, request.profile_fields())
            .await
            .map_err(|e| {
                if matches!(e, StoreError::DuplicateEmail) {
                    tracing::info!("registration refused: email already registered");
                }
                ApiError::from(e)
            })?;

        let issued = self.tokens.issue(account.id)?;
        Ok(AuthOutcome {
            account,
            token: issued.token,
        })
    }

    pub async fn login(&self, request: LoginRequest) -> Result<AuthOutcome, ApiError> {
        if request.email.trim().is_empty() || request.password.is_empty() {
            return Err(ApiError::validation("Email and password are required"));
        }

        let account = match self.store.find_by_email(&request.email).await {
            Ok(account) => account,
            Err(StoreError::NotFound) => {
                tracing::info!("login refused: unknown email");
                return Err(ApiError::unauthorized("Email not registered"));
            }
            Err(e) => return Err(e.into()),
        };

        if !self.store.verify_password(&account, &request.password).await? {
            tracing::info!(account_id = %account.id, "login refused: password mismatch");
            return Err(ApiError::unauthorized("Incorrect password"));
        }

        let issued = self.tokens.issue(account.id)?;
        tracing::info!(account_id = %account.id, expires_at = issued.expires_at, "login succeeded");
        Ok(AuthOutcome {
            account,
            token: issued.token,
        })
    }

    /// Profile of an already authenticated account
    pub fn get_profile(&self, user: &AuthUser) -> AuthUser {
        user.clone()
    }

    pub async fn update_profile(&self, account_id: Uuid, update: ProfileUpdate) -> Result<AuthUser, ApiError> {
        if let Some(email) = &update.email {
            if !is_valid_email(&normalize_email(email)) {
                return Err(ApiError::validation("Invalid email address"));
            }
        }

        let account = self.store.update_profile(account_id, update).await?;
        Ok(AuthUser::from(&account))
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }
}

#[cfg(test)]
pub(crate) fn test_service() -> AccountService {
    use crate::auth::jwt::test_token_config;
    use crate::database::store::memory_store;

    AccountService::new(memory_store(), Arc::new(JwtService::new(&test_token_config())))
}
