//! # Database Module
//!
//! Account persistence using tokio-postgres with a deadpool connection pool,
//! plus a volatile in-memory repository. Includes connection management,
//! models, migrations and the credential store built on top of them.

pub mod connection;
pub mod migrations;
pub mod models;
pub mod repository;
pub mod store;

pub use connection::{DatabaseConfig, DatabaseConnection, StoreBackend};
pub use models::*;
pub use repository::{AccountRepository, MemoryAccountRepository, PgAccountRepository, StoreError};
pub use store::CredentialStore;
