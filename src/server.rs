//! # Server Module
//!
//! Component wiring, route configuration and the HTTP listener.

use anyhow::{Context, Result};
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::get,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::{Authenticator, JwtService, PasswordService};
use crate::config::Config;
use crate::database::{
    AccountRepository, CredentialStore, DatabaseConnection, MemoryAccountRepository, PgAccountRepository,
    StoreBackend, migrations,
};
use crate::routes::{auth, health};
use crate::services::AccountService;

/// Application state shared across all route handlers
#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountService,
    pub authenticator: Arc<Authenticator>,
}

impl AppState {
    pub fn new(store: CredentialStore, tokens: JwtService) -> Self {
        let tokens = Arc::new(tokens);
        Self {
            accounts: AccountService::new(store.clone(), tokens.clone()),
            authenticator: Arc::new(Authenticator::new(tokens, store)),
        }
    }

    /// Build every component from the startup configuration
    pub async fn from_config(config: &Config) -> Result<Self> {
        let repository: Arc<dyn AccountRepository> = match config.database.backend {
            StoreBackend::Postgres => {
                let db = DatabaseConnection::new(config.database.clone())
                    .await
                    .context("Failed to connect to database")?;
                migrations::run_migrations(db.pool()).await?;
                Arc::new(PgAccountRepository::new(db.pool().clone()))
            }
            StoreBackend::Memory => {
                tracing::warn!("⚠️  Using in-memory account store, accounts are lost on restart");
                Arc::new(MemoryAccountRepository::new())
            }
        };

        let passwords = PasswordService::new(&config.password).context("Invalid password hashing parameters")?;
        let store = CredentialStore::new(repository, passwords);

        Ok(Self::new(store, JwtService::new(&config.token)))
    }
}

/// Assemble the router with CORS and request tracing
pub fn build_router(state: AppState, cors_origins: &[String]) -> Result<Router> {
    let origins = cors_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("Invalid CORS origin '{origin}'"))
        })
        .collect::<Result<Vec<_>>>()?;

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
        ])
        .allow_credentials(true);

    let app = Router::new()
        .route("/ping", get(health::ping))
        .route("/health", get(health::health))
        .nest("/api/auth", auth::create_auth_routes(&state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state);

    Ok(app)
}

/// Starts the account HTTP server and runs until Ctrl+C.
pub async fn start(config: Config) -> Result<()> {
    let state = AppState::from_config(&config).await?;
    let app = build_router(state, &config.server.cors_origins)?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr} - port may already be in use"))?;

    tracing::info!("🚀 Account server starting...");
    tracing::info!("📡 Listening on http://{}", addr);
    tracing::info!("🏥 Health check available at http://{}/ping", addr);
    tracing::info!("🔐 Auth endpoints available at http://{}/api/auth/*", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("👋 Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
