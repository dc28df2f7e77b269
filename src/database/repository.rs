//! Account Repositories
//!
//! Persistence of account records behind [`AccountRepository`]. E-mail
//! uniqueness is always enforced by the store itself: a unique index in
//! PostgreSQL, a single write section in memory.

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use deadpool_postgres::Pool;
use parking_lot::RwLock;
use std::collections::HashMap;
use thiserror::Error;
use tokio_postgres::error::SqlState;
use uuid::Uuid;

use crate::auth::password::PasswordError;
use crate::database::models::{Account, FromRow, ProfileUpdate};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("an account with this email already exists")]
    DuplicateEmail,
    #[error("account not found")]
    NotFound,
    #[error("storage error: {0:#}")]
    Storage(anyhow::Error),
    #[error(transparent)]
    Hashing(#[from] PasswordError),
}

#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Persist a new record; fails with `DuplicateEmail` if the e-mail is taken
    async fn insert(&self, account: Account) -> Result<Account, StoreError>;

    /// Exact lookup on an already normalized e-mail
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError>;

    /// Apply a partial update, returning the new record or `None` for an unknown id
    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> Result<Option<Account>, StoreError>;

    /// Cheap round trip used by the health endpoint
    async fn ping(&self) -> Result<(), StoreError>;
}

// ============================================================================
// POSTGRES
// ============================================================================

pub struct PgAccountRepository {
    pool: Pool,
}

impl PgAccountRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    async fn client(&self) -> Result<deadpool_postgres::Object, StoreError> {
        self.pool
            .get()
            .await
            .map_err(|e| StoreError::Storage(anyhow!("Failed to get DB connection: {}", e)))
    }
}

fn map_pg_error(error: tokio_postgres::Error, action: &'static str) -> StoreError {
    if error.code() == Some(&SqlState::UNIQUE_VIOLATION) {
        StoreError::DuplicateEmail
    } else {
        StoreError::Storage(anyhow::Error::new(error).context(action))
    }
}

fn decode_row(row: &tokio_postgres::Row) -> Result<Account, StoreError> {
    Account::from_row(row).map_err(|e| map_pg_error(e, "Failed to decode account row"))
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    async fn insert(&self, account: Account) -> Result<Account, StoreError> {
        let client = self.client().await?;
        let row = client
            .query_one(
                "INSERT INTO accounts (id, email, password_hash, name, address, gender, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
                &[
                    &account.id,
                    &account.email,
                    &account.password_hash.as_str(),
                    &account.name,
                    &account.address,
                    &account.gender,
                    &account.created_at,
                    &account.updated_at,
                ],
            )
            .await
            .map_err(|e| map_pg_error(e, "Failed to insert account"))?;
        decode_row(&row)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let client = self.client().await?;
        let row = client
            .query_opt("SELECT * FROM accounts WHERE lower(email) = lower($1)", &[&email])
            .await
            .map_err(|e| map_pg_error(e, "Failed to query account by email"))?;
        row.as_ref().map(decode_row).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        let client = self.client().await?;
        let row = client
            .query_opt("SELECT * FROM accounts WHERE id = $1", &[&id])
            .await
            .map_err(|e| map_pg_error(e, "Failed to query account by id"))?;
        row.as_ref().map(decode_row).transpose()
    }

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> Result<Option<Account>, StoreError> {
        let client = self.client().await?;
        let row = client
            .query_opt(
                "UPDATE accounts SET \
                    name = COALESCE($2, name), \
                    email = COALESCE($3, email), \
                    address = COALESCE($4, address), \
                    gender = COALESCE($5, gender), \
                    updated_at = NOW() \
                 WHERE id = $1 RETURNING *",
                &[&id, &update.name, &update.email, &update.address, &update.gender],
            )
            .await
            .map_err(|e| map_pg_error(e, "Failed to update account profile"))?;
        row.as_ref().map(decode_row).transpose()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let client = self.client().await?;
        client
            .query("SELECT 1", &[])
            .await
            .map_err(|e| map_pg_error(e, "Database health check failed"))?;
        Ok(())
    }
}

// ============================================================================
// IN-MEMORY
// ============================================================================

#[derive(Default)]
struct MemoryTables {
    accounts: HashMap<Uuid, Account>,
    /// Unique secondary index: normalized e-mail -> id
    emails: HashMap<String, Uuid>,
}

/// Volatile repository for local development and tests
#[derive(Default)]
pub struct MemoryAccountRepository {
    tables: RwLock<MemoryTables>,
}

impl MemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountRepository for MemoryAccountRepository {
    async fn insert(&self, account: Account) -> Result<Account, StoreError> {
        let mut tables = self.tables.write();
        if tables.emails.contains_key(&account.email) {
            return Err(StoreError::DuplicateEmail);
        }
        tables.emails.insert(account.email.clone(), account.id);
        tables.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let tables = self.tables.read();
        Ok(tables
            .emails
            .get(email)
            .and_then(|id| tables.accounts.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        Ok(self.tables.read().accounts.get(&id).cloned())
    }

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> Result<Option<Account>, StoreError> {
        let mut tables = self.tables.write();
        let Some(current) = tables.accounts.get(&id).cloned() else {
            return Ok(None);
        };

        if let Some(email) = &update.email {
            if *email != current.email && tables.emails.contains_key(email) {
                return Err(StoreError::DuplicateEmail);
            }
        }

        let mut updated = current.clone();
        update.apply_to(&mut updated);
        updated.updated_at = Utc::now();

        if updated.email != current.email {
            tables.emails.remove(&current.email);
            tables.emails.insert(updated.email.clone(), id);
        }
        tables.accounts.insert(id, updated.clone());
        Ok(Some(updated))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
