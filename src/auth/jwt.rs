//! JWT Token Service
//!
//! Issues and verifies signed, time-bounded session tokens. Nothing is stored
//! server-side: a token is valid exactly when its signature checks out and
//! its absolute expiry has not passed.

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::config::TokenConfig;

/// JWT Claims structure containing the account identifier and token metadata
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Account unique identifier
    pub sub: Uuid,
    /// Token issued at timestamp (Unix seconds)
    pub iat: i64,
    /// Token expiration timestamp (Unix seconds)
    pub exp: i64,
    /// Token issuer
    pub iss: String,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token is malformed or its signature is invalid")]
    Invalid,
    #[error("token has expired")]
    Expired,
    #[error("failed to encode token: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),
}

/// A freshly signed token and its absolute expiry
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: i64,
}

/// JWT Service for token operations
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    ttl: Duration,
}

impl JwtService {
    /// Create a new JWT service from the token configuration
    pub fn new(config: &TokenConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        // Expiry is checked in `verify_at` against an explicit clock
        let mut validation = Validation::default();
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            encoding_key,
            decoding_key,
            validation,
            issuer: config.issuer.clone(),
            ttl: config.ttl,
        }
    }

    /// Generate a token for an account, valid from now for the configured TTL
    pub fn issue(&self, account_id: Uuid) -> Result<IssuedToken, TokenError> {
        self.issue_at(account_id, Utc::now())
    }

    pub fn issue_at(&self, account_id: Uuid, now: DateTime<Utc>) -> Result<IssuedToken, TokenError> {
        let iat = now.timestamp();
        // the configured TTL is range-checked at startup
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let exp = iat.saturating_add(ttl);

        let claims = Claims {
            sub: account_id,
            iat,
            exp,
            iss: self.issuer.clone(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key).map_err(TokenError::Encode)?;
        Ok(IssuedToken {
            token,
            expires_at: exp,
        })
    }

    /// Validate a token and return its subject
    pub fn verify(&self, token: &str) -> Result<Uuid, TokenError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Uuid, TokenError> {
        let claims = self.decode_claims(token)?;
        if now.timestamp() > claims.exp {
            return Err(TokenError::Expired);
        }
        Ok(claims.sub)
    }

    /// Check structure, signature and issuer. Expiry is not checked here.
    fn decode_claims(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}

#[cfg(test)]
pub(crate) fn test_token_config() -> TokenConfig {
    TokenConfig {
        secret: crate::config::JwtSecret::new("test_secret"),
        issuer: "account-server".to_string(),
        ttl: Duration::from_secs(3600),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    #[test]
    fn test_jwt_roundtrip() {
        let jwt_service = JwtService::new(&test_token_config());
        let account_id = Uuid::new_v4();

        let issued = jwt_service.issue(account_id).unwrap();
        let subject = jwt_service.verify(&issued.token).unwrap();

        assert_eq!(subject, account_id);
    }

    #[test]
    fn expiry_is_one_ttl_after_issuance() {
        let jwt_service = JwtService::new(&test_token_config());
        let now = Utc::now();
        let issued = jwt_service.issue_at(Uuid::new_v4(), now).unwrap();
        assert_eq!(issued.expires_at, now.timestamp() + 3600);
    }

    #[test]
    fn oversized_ttl_never_produces_an_expired_token() {
        let jwt_service = JwtService::new(&TokenConfig {
            ttl: Duration::from_secs(u64::MAX),
            ..test_token_config()
        });
        let account_id = Uuid::new_v4();
        let issued = jwt_service.issue(account_id).unwrap();

        assert!(issued.expires_at > Utc::now().timestamp());
        assert_eq!(jwt_service.verify(&issued.token).unwrap(), account_id);
    }

    #[test]
    fn expiry_boundary() {
        let jwt_service = JwtService::new(&test_token_config());
        let issued_at = Utc::now();
        let account_id = Uuid::new_v4();
        let issued = jwt_service.issue_at(account_id, issued_at).unwrap();
        let expiry = DateTime::<Utc>::from_timestamp(issued.expires_at, 0).unwrap();

        let before = jwt_service.verify_at(&issued.token, expiry - ChronoDuration::seconds(1));
        assert_eq!(before.unwrap(), account_id);

        let after = jwt_service.verify_at(&issued.token, expiry + ChronoDuration::seconds(1));
        assert!(matches!(after, Err(TokenError::Expired)));
    }

    #[test]
    fn token_signed_with_another_secret_is_invalid() {
        let issuer = JwtService::new(&TokenConfig {
            secret: crate::config::JwtSecret::new("other_secret"),
            ..test_token_config()
        });
        let verifier = JwtService::new(&test_token_config());

        let issued = issuer.issue(Uuid::new_v4()).unwrap();
        assert!(matches!(verifier.verify(&issued.token), Err(TokenError::Invalid)));
    }

    #[test]
    fn token_from_another_issuer_is_invalid() {
        let issuer = JwtService::new(&TokenConfig {
            issuer: "someone-else".to_string(),
            ..test_token_config()
        });
        let verifier = JwtService::new(&test_token_config());

        let issued = issuer.issue(Uuid::new_v4()).unwrap();
        assert!(matches!(verifier.verify(&issued.token), Err(TokenError::Invalid)));
    }

    #[test]
    fn garbage_and_tampered_tokens_are_invalid() {
        let jwt_service = JwtService::new(&test_token_config());
        assert!(matches!(jwt_service.verify("not.a.token"), Err(TokenError::Invalid)));
        assert!(matches!(jwt_service.verify(""), Err(TokenError::Invalid)));

        let issued = jwt_service.issue(Uuid::new_v4()).unwrap();
        let mut tampered = issued.token.clone();
        let last = tampered.pop().unwrap();
        tampered.push(if last == 'A' { 'B' } else { 'A' });
        assert!(matches!(jwt_service.verify(&tampered), Err(TokenError::Invalid)));
    }
}
