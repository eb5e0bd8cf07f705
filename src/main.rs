// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tokengate API Server
//!
//! Issues and verifies bearer tokens for password and Google accounts.

use anyhow::Context;
use std::sync::Arc;
use tokengate::{
    config::Config,
    db::{MemoryUserStore, PgUserStore, UserStore},
    services::GoogleOAuthClient,
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        application = %config.application_name,
        hostname = %config.hostname,
        port = config.port,
        state_mode = ?config.oauth_state_mode,
        "Starting tokengate"
    );

    let users: Arc<dyn UserStore> = match &config.database {
        Some(db) => {
            let store = PgUserStore::connect(db, &config.application_name)
                .await
                .context("Failed to connect to Postgres")?;
            tracing::info!(host = %db.host, database = %db.name, "Postgres user store ready");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DB_HOST not set, users are kept in memory only");
            Arc::new(MemoryUserStore::new())
        }
    };

    let google =
        GoogleOAuthClient::new(&config.google).context("Failed to build Google OAuth2 client")?;

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), users, Arc::new(google)));

    // Build router
    let app = tokengate::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tokengate=debug,info"));

    tracing_subscriber::registry().with(filter).with(format).init();
}
