// Database Models
//
// Account records and the row conversions used by the PostgreSQL repository.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;
use tokio_postgres::Row;
use uuid::Uuid;

/// Trait for converting from tokio-postgres Row
pub trait FromRow {
    fn from_row(row: &Row) -> Result<Self, tokio_postgres::Error>
    where
        Self: Sized;
}

/// Argon2 PHC string for an account. Never serialized, redacted in `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword(String);

impl HashedPassword {
    pub fn new(phc: String) -> Self {
        Self(phc)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HashedPassword([REDACTED])")
    }
}

/// Durable identity record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: Uuid,
    /// Normalized (trimmed, lower-cased) login key
    pub email: String,
    pub password_hash: HashedPassword,
    pub name: Option<String>,
    pub address: Option<String>,
    pub gender: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromRow for Account {
    fn from_row(row: &Row) -> Result<Self, tokio_postgres::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            password_hash: HashedPassword::new(row.try_get("password_hash")?),
            name: row.try_get("name")?,
            address: row.try_get("address")?,
            gender: row.try_get("gender")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Optional profile attributes supplied at registration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProfileFields {
    pub name: Option<String>,
    pub address: Option<String>,
    pub gender: Option<String>,
}

/// Partial update of the non-credential fields.
///
/// `None` leaves the stored value untouched; `Some` replaces it, including
/// with an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub gender: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.address.is_none() && self.gender.is_none()
    }

    /// Apply the update to an in-memory record
    pub fn apply_to(&self, account: &mut Account) {
        if let Some(name) = &self.name {
            account.name = Some(name.clone());
        }
        if let Some(email) = &self.email {
            account.email = email.clone();
        }
        if let Some(address) = &self.address {
            account.address = Some(address.clone());
        }
        if let Some(gender) = &self.gender {
            account.gender = Some(gender.clone());
        }
    }
}

/// Case-normalize an e-mail address for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Minimal shape check: a local part and a domain around a single `@`
pub fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_account() -> Account {
        Account {
            id: Uuid::new_v4(),
            email: "a@x.com".to_string(),
            password_hash: HashedPassword::new("$argon2id$v=19$secret".to_string()),
            name: Some("Ada".to_string()),
            address: Some("1 Main St".to_string()),
            gender: Some("female".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn email_shape() {
        assert!(is_valid_email("a@x.com"));
        assert!(!is_valid_email("ax.com"));
        assert!(!is_valid_email("@x.com"));
        assert!(!is_valid_email("a@"));
        assert!(!is_valid_email("a@b@c"));
        assert!(!is_valid_email("a b@x.com"));
    }

    #[test]
    fn debug_never_prints_the_hash() {
        let account = sample_account();
        assert!(!format!("{:?}", account).contains("secret"));
    }

    #[test]
    fn update_keeps_absent_fields_and_applies_empty_ones() {
        let mut account = sample_account();
        let update = ProfileUpdate {
            name: Some(String::new()),
            gender: Some("other".to_string()),
            ..Default::default()
        };
        update.apply_to(&mut account);

        assert_eq!(account.name.as_deref(), Some(""));
        assert_eq!(account.gender.as_deref(), Some("other"));
        assert_eq!(account.address.as_deref(), Some("1 Main St"));
        assert_eq!(account.email, "a@x.com");
    }
}
