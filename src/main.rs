// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! RPG auth API server
//!
//! Registers players, logs them in, and rotates their session tokens.

use rpg_auth::{
    config::{Config, StoreBackend},
    db::{FirestoreDb, UserStore},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment. A missing signing key is fatal:
    // the server must never issue tokens it cannot sign.
    let config = Config::from_env().inspect_err(|e| {
        tracing::error!(error = %e, "Invalid configuration, refusing to start");
    })?;
    tracing::info!(port = config.port, "Starting RPG auth API");

    let store = match config.store_backend {
        StoreBackend::Firestore => {
            UserStore::firestore(FirestoreDb::new(&config.gcp_project_id).await?)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory user store; data is lost on restart");
            UserStore::in_memory()
        }
    };

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), store));

    // Build router
    let app = rpg_auth::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rpg_auth=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
