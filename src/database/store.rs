//! Credential Store
//!
//! Owns account identity records and password verification. Raw passwords
//! only ever pass through here on their way into the hasher.

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::password::PasswordService;
use crate::database::models::{Account, ProfileFields, ProfileUpdate, normalize_email};
use crate::database::repository::{AccountRepository, StoreError};

#[derive(Clone)]
pub struct CredentialStore {
    repository: Arc<dyn AccountRepository>,
    passwords: PasswordService,
}

impl CredentialStore {
    pub fn new(repository: Arc<dyn AccountRepository>, passwords: PasswordService) -> Self {
        Self {
            repository,
            passwords,
        }
    }

    /// Hash the password and persist a new account. Uniqueness is decided by
    /// the repository's insert, so two racing registrations cannot both win.
    pub async fn create_account(
        &self,
        email: &str,
        raw_password: &str,
        profile: ProfileFields,
    ) -> Result<Account, StoreError> {
        let email = normalize_email(email);
        let password_hash = self.passwords.hash(raw_password).await?;
        let now = Utc::now();

        let account = Account {
            id: Uuid::new_v4(),
            email,
            password_hash,
            name: profile.name,
            address: profile.address,
            gender: profile.gender,
            created_at: now,
            updated_at: now,
        };

        let stored = self.repository.insert(account).await?;
        tracing::info!(account_id = %stored.id, "account created");
        Ok(stored)
    }

    /// Case-insensitive lookup
    pub async fn find_by_email(&self, email: &str) -> Result<Account, StoreError> {
        self.repository
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or(StoreError::NotFound)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Account, StoreError> {
        self.repository.find_by_id(id).await?.ok_or(StoreError::NotFound)
    }

    pub async fn verify_password(&self, account: &Account, raw_password: &str) -> Result<bool, StoreError> {
        Ok(self.passwords.verify(&account.password_hash, raw_password).await?)
    }

    /// Update name, address, gender and e-mail. Absent fields stay as they are.
    pub async fn update_profile(&self, id: Uuid, mut update: ProfileUpdate) -> Result<Account, StoreError> {
        if let Some(email) = update.email.as_mut() {
            *email = normalize_email(email);
        }
        if update.is_empty() {
            return self.find_by_id(id).await;
        }

        let updated = self
            .repository
            .update_profile(id, &update)
            .await?
            .ok_or(StoreError::NotFound)?;
        tracing::info!(account_id = %id, "profile updated");
        Ok(updated)
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        self.repository.ping().await
    }
}

#[cfg(test)]
pub(crate) fn memory_store() -> CredentialStore {
    use crate::auth::password::test_password_config;
    use crate::database::repository::MemoryAccountRepository;

    let passwords = PasswordService::new(&test_password_config()).expect("test argon2 params");
    CredentialStore::new(Arc::new(MemoryAccountRepository::new()), passwords)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_normalizes_email_and_hashes_password() {
        let store = memory_store();
        let account = store
            .create_account(" A@X.com ", "secret123", ProfileFields::default())
            .await
            .unwrap();

        assert_eq!(account.email, "a@x.com");
        assert_ne!(account.password_hash.as_str(), "secret123");
        assert!(store.verify_password(&account, "secret123").await.unwrap());
        assert!(!store.verify_password(&account, "wrong").await.unwrap());
    }

    #[tokio::test]
    async fn lookup_by_email_ignores_case() {
        let store = memory_store();
        let created = store
            .create_account("a@x.com", "secret123", ProfileFields::default())
            .await
            .unwrap();

        let found = store.find_by_email("A@X.COM").await.unwrap();
        assert_eq!(found.id, created.id);
        assert!(matches!(store.find_by_email("b@x.com").await, Err(StoreError::NotFound)));
        assert!(matches!(store.find_by_id(Uuid::new_v4()).await, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn duplicate_email_differing_only_in_case_conflicts() {
        let store = memory_store();
        store
            .create_account("a@x.com", "secret123", ProfileFields::default())
            .await
            .unwrap();
        let err = store
            .create_account("A@x.COM", "other", ProfileFields::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));
    }

    #[tokio::test]
    async fn update_leaves_id_and_password_untouched() {
        let store = memory_store();
        let created = store
            .create_account(
                "a@x.com",
                "secret123",
                ProfileFields {
                    name: Some("Ada".to_string()),
                    address: Some("1 Main St".to_string()),
                    gender: None,
                },
            )
            .await
            .unwrap();

        let updated = store
            .update_profile(
                created.id,
                ProfileUpdate {
                    email: Some("ADA@X.com".to_string()),
                    address: Some(String::new()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.email, "ada@x.com");
        assert_eq!(updated.name.as_deref(), Some("Ada"));
        assert_eq!(updated.address.as_deref(), Some(""));
        assert_eq!(updated.password_hash, created.password_hash);
        assert!(store.verify_password(&updated, "secret123").await.unwrap());
    }

    #[tokio::test]
    async fn empty_update_returns_current_record() {
        let store = memory_store();
        let created = store
            .create_account("a@x.com", "secret123", ProfileFields::default())
            .await
            .unwrap();
        let same = store.update_profile(created.id, ProfileUpdate::default()).await.unwrap();
        assert_eq!(same, created);
    }
}
