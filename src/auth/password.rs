//! Password Hashing
//!
//! Argon2id hashing in PHC string format. Both hashing and verification are
//! CPU-bound, so they run on tokio's blocking pool under a time limit.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use std::time::Duration;
use thiserror::Error;

use crate::config::PasswordConfig;
use crate::database::HashedPassword;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(#[from] argon2::password_hash::Error),
    #[error("invalid argon2 parameters: {0}")]
    Params(argon2::Error),
    #[error("password hashing exceeded {0:?}")]
    Timeout(Duration),
    #[error("password hashing worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

#[derive(Clone)]
pub struct PasswordService {
    argon2: Argon2<'static>,
    timeout: Duration,
}

impl PasswordService {
    pub fn new(config: &PasswordConfig) -> Result<Self, PasswordError> {
        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(PasswordError::Params)?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            timeout: config.timeout,
        })
    }

    /// Derive a salted hash. The salt is fresh per call and is embedded in
    /// the returned PHC string.
    pub async fn hash(&self, raw_password: &str) -> Result<HashedPassword, PasswordError> {
        let argon2 = self.argon2.clone();
        let raw_password = raw_password.to_owned();

        self.run_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            let phc = argon2.hash_password(raw_password.as_bytes(), &salt)?.to_string();
            Ok(HashedPassword::new(phc))
        })
        .await
    }

    /// Recompute with the stored salt and parameters and compare in constant
    /// time. A malformed stored hash is an error, a mismatch is `Ok(false)`.
    pub async fn verify(&self, hash: &HashedPassword, raw_password: &str) -> Result<bool, PasswordError> {
        let argon2 = self.argon2.clone();
        let phc = hash.as_str().to_owned();
        let raw_password = raw_password.to_owned();

        self.run_blocking(move || {
            let parsed = PasswordHash::new(&phc)?;
            match argon2.verify_password(raw_password.as_bytes(), &parsed) {
                Ok(()) => Ok(true),
                Err(argon2::password_hash::Error::Password) => Ok(false),
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    async fn run_blocking<T, F>(&self, work: F) -> Result<T, PasswordError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, PasswordError> + Send + 'static,
    {
        match tokio::time::timeout(self.timeout, tokio::task::spawn_blocking(work)).await {
            Ok(joined) => joined?,
            Err(_) => Err(PasswordError::Timeout(self.timeout)),
        }
    }
}

#[cfg(test)]
pub(crate) fn test_password_config() -> PasswordConfig {
    PasswordConfig {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
        timeout: Duration::from_secs(30),
    }
}
