//! Authentication Models
//!
//! Data structures for authentication requests, responses, and the
//! authenticated account attached to a request.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::{Account, ProfileFields};

/// Non-secret view of the account resolved for a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
    pub address: Option<String>,
    pub gender: Option<String>,
}

impl From<&Account> for AuthUser {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            name: account.name.clone(),
            email: account.email.clone(),
            address: account.address.clone(),
            gender: account.gender.clone(),
        }
    }
}

/// Registration request payload
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: String,
    pub password: String,
    pub address: Option<String>,
    pub gender: Option<String>,
}

impl RegisterRequest {
    pub fn profile_fields(&self) -> ProfileFields {
        ProfileFields {
            name: self.name.clone(),
            address: self.address.clone(),
            gender: self.gender.clone(),
        }
    }
}

/// Login request payload
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Account summary embedded in register/login responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
}

impl From<&Account> for UserSummary {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            name: account.name.clone(),
            email: account.email.clone(),
        }
    }
}

/// Token response after successful registration or login
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub user: UserSummary,
}

impl TokenResponse {
    pub fn new(message: &str, token: String, user: UserSummary) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            token,
            user,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::HashedPassword;
    use chrono::Utc;

    #[test]
    fn auth_user_excludes_credentials() {
        let account = Account {
            id: Uuid::new_v4(),
            email: "a@x.com".to_string(),
            password_hash: HashedPassword::new("$argon2id$hash".to_string()),
            name: Some("Ada".to_string()),
            address: None,
            gender: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(AuthUser::from(&account)).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys.len(), 5);
        for key in ["id", "name", "email", "address", "gender"] {
            assert!(keys.contains(&key), "missing {key}");
        }
        assert!(!json.to_string().contains("argon2"));
    }

    #[test]
    fn register_request_tolerates_missing_optional_fields() {
        let request: RegisterRequest =
            serde_json::from_str(r#"{"email":"a@x.com","password":"secret123"}"#).unwrap();
        assert_eq!(request.email, "a@x.com");
        assert_eq!(request.profile_fields(), ProfileFields::default());
    }
}
