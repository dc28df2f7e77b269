//! Configuration module for environment variables and application settings
//!
//! The configuration is loaded once in `main` and handed to every component
//! that needs it. Nothing here is stored in a global.

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::database::DatabaseConfig;

/// Shared HMAC secret used to sign session tokens.
///
/// `Debug` is redacted so the secret cannot end up in logs by accident.
#[derive(Clone)]
pub struct JwtSecret(String);

impl JwtSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("JwtSecret([REDACTED])")
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Database / store configuration
    pub database: DatabaseConfig,

    /// Server configuration
    pub server: ServerConfig,

    /// Token issuance configuration
    pub token: TokenConfig,

    /// Password hashing cost configuration
    pub password: PasswordConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed by the CORS layer
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub secret: JwtSecret,
    pub issuer: String,
    /// Validity window of an issued token
    pub ttl: Duration,
}

#[derive(Debug, Clone)]
pub struct PasswordConfig {
    /// Argon2 memory cost in KiB
    pub memory_kib: u32,
    /// Argon2 iteration count
    pub iterations: u32,
    /// Argon2 lanes
    pub parallelism: u32,
    /// Upper bound on a single hash or verify computation
    pub timeout: Duration,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_kib: 19_456,
            iterations: 2,
            parallelism: 1,
            timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow!("JWT_SECRET environment variable is required"))?;
        if secret.trim().is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow!("DATABASE_URL environment variable is required"))?;
        let mut database = DatabaseConfig::from_url(&database_url)?;
        database.max_size = parse_var("DATABASE_MAX_CONNECTIONS", database.max_size)?;
        database.tls = parse_var("DATABASE_TLS", database.tls)?;
        database.statement_timeout = Duration::from_millis(parse_var(
            "DATABASE_STATEMENT_TIMEOUT_MS",
            database.statement_timeout.as_millis() as u64,
        )?);
        database.pool_timeout = Duration::from_secs(parse_var(
            "DATABASE_POOL_TIMEOUT_SECS",
            database.pool_timeout.as_secs(),
        )?);

        let defaults = PasswordConfig::default();

        Ok(Self {
            database,

            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_var("PORT", 5000)?,
                cors_origins: env::var("CORS_ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| "http://localhost:5173".to_string())
                    .split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_string)
                    .collect(),
            },

            token: TokenConfig {
                secret: JwtSecret::new(secret),
                issuer: env::var("TOKEN_ISSUER").unwrap_or_else(|_| "account-server".to_string()),
                ttl: token_ttl(parse_var("TOKEN_TTL_SECS", 3600)?)?,
            },

            password: PasswordConfig {
                memory_kib: parse_var("PASSWORD_HASH_MEMORY_KIB", defaults.memory_kib)?,
                iterations: parse_var("PASSWORD_HASH_ITERATIONS", defaults.iterations)?,
                parallelism: parse_var("PASSWORD_HASH_PARALLELISM", defaults.parallelism)?,
                timeout: Duration::from_secs(parse_var(
                    "PASSWORD_HASH_TIMEOUT_SECS",
                    defaults.timeout.as_secs(),
                )?),
            },
        })
    }
}

/// Token lifetimes must be positive and fit the signed Unix-seconds claims
fn token_ttl(secs: u64) -> Result<Duration> {
    let signed = i64::try_from(secs).with_context(|| format!("TOKEN_TTL_SECS {secs} is out of range"))?;
    if signed == 0 || Utc::now().timestamp().checked_add(signed).is_none() {
        anyhow::bail!("TOKEN_TTL_SECS {secs} is out of range");
    }
    Ok(Duration::from_secs(secs))
}

/// Read an optional variable, falling back to `default` when it is unset.
/// A value that is set but does not parse is an error.
fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} has an invalid value")),
        Err(_) => Ok(default),
    }
}
