//! # Account Server
//!
//! Credential and session-management service built with Axum and Tokio:
//! account registration, password verification, signed-token issuance and
//! per-request token validation for protected endpoints.
//!
//! ## Architecture
//! - `config`: environment configuration, loaded once at startup
//! - `database`: PostgreSQL / in-memory account repositories and the credential store
//! - `auth`: token service, password hashing and the access-control middleware
//! - `services`: account operations (register, login, profile)
//! - `routes`: HTTP handlers
//! - `server`: component wiring and the listener
//!
//! ## Environment Setup
//! `JWT_SECRET` and `DATABASE_URL` are required; everything else has a
//! default. A `.env` file in the working directory is honoured.
//!
//! ## Running the Server
//! ```bash
//! JWT_SECRET=change-me DATABASE_URL=memory:// cargo run
//! curl http://localhost:5000/ping
//! ```

mod auth;
mod config;
mod database;
mod error;
mod routes;
mod server;
mod services;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Application entry point.
///
/// Initializes logging, loads configuration and runs the HTTP server until
/// the process is interrupted.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false) // Don't show module targets for cleaner output
                .compact(),
        )
        .init();

    tracing::info!("🏁 Starting account server...");
    tracing::info!("📦 Package: {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    tracing::info!("🏗️  Build profile: {}", if cfg!(debug_assertions) { "debug" } else { "release" });

    let config = config::Config::from_env()?;
    tracing::info!("🗄️  Account store: {:?}", config.database.backend);

    server::start(config).await
}
