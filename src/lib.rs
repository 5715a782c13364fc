//! FoundIt Backend
//!
//! Layered architecture:
//! - domain: lost/found items, users and matches
//! - repository: SQLite pool, item store and the match registry
//! - auth: bearer token verification against the identity provider
//! - commands: HTTP handlers and router

use anyhow::Context;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

pub mod auth;
pub mod commands;
pub mod config;
pub mod domain;
pub mod repository;

#[cfg(test)]
mod test_support;

use auth::{IdentityVerifier, JwksCache, JwtVerifier};
use config::Config;
use repository::{init_db, MatchRegistry, MatchStore};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub matches: Arc<dyn MatchStore>,
    pub verifier: Arc<dyn IdentityVerifier>,
}

/// Start the server and block until shutdown.
///
/// The connection pool is created here, shared by every request and closed
/// once the server has drained.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let pool = init_db(&config.database.path, config.database.options())
        .await
        .context("failed to initialize database")?;

    let keys = JwksCache::remote(&config.auth.domain, &config.auth.jwks_options())
        .context("failed to build signing key client")?;

    let state = AppState {
        matches: Arc::new(MatchRegistry::new(pool.clone())),
        verifier: Arc::new(JwtVerifier::new(keys, config.auth.settings())),
    };

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!(addr = %addr, jwks = %config.auth.jwks_url(), "Backend listening");

    axum::serve(listener, commands::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    pool.close();
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            warn!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
