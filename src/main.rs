// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Kindred API Server
//!
//! Serves account, session and nearby-search endpoints for the dating app.

use kindred_api::{
    config::{Config, StorageBackend},
    db::{FirestoreDb, MemoryDb, UserRepository},
    services::{MemoryRevocationRegistry, RedisRevocationRegistry, RevocationRegistry},
    time_utils::system_clock,
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        environment = ?config.environment,
        storage = ?config.storage_backend,
        "Starting Kindred API"
    );

    let users: Arc<dyn UserRepository> = match config.storage_backend {
        StorageBackend::Firestore => {
            let db = FirestoreDb::new(&config.gcp_project_id).await?;
            tracing::info!(project = %config.gcp_project_id, "Firestore connected");
            Arc::new(db)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory user store; data is lost on restart");
            Arc::new(MemoryDb::new())
        }
    };

    let revocations: Arc<dyn RevocationRegistry> = match &config.redis_url {
        Some(url) => {
            let registry = RedisRevocationRegistry::new(url).await?;
            tracing::info!("Redis token blacklist connected");
            Arc::new(registry)
        }
        None => {
            tracing::warn!("REDIS_URL not set; token blacklist is per-process");
            Arc::new(MemoryRevocationRegistry::default())
        }
    };

    // Build shared state
    let state = Arc::new(AppState::new(
        config.clone(),
        users,
        revocations,
        system_clock(),
    ));

    // Build router
    let app = kindred_api::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("kindred_api=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
