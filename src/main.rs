// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! DogoWalker API Server
//!
//! Accounts, profiles and the explore map for a dog-walking community.

use dogowalker::{
    backend::{FirebaseAuthClient, FirebaseStorageClient},
    config::{BackendKind, Config},
    db::FirestoreDb,
    services::SessionService,
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, backend = ?config.backend, "Starting DogoWalker API");

    let state = match config.backend {
        BackendKind::Memory => {
            tracing::warn!("Using in-memory backend; data is lost on restart");
            AppState::in_memory(config.clone())
        }
        BackendKind::Firebase => {
            let db = FirestoreDb::new(&config.gcp_project_id).await?;
            let identity = FirebaseAuthClient::new(config.firebase_api_key.clone());
            let storage = FirebaseStorageClient::new(config.storage_bucket.clone());
            tracing::info!(bucket = %config.storage_bucket, "Firebase backends initialized");

            let sessions = SessionService::new(
                Arc::new(identity),
                Arc::new(db),
                Arc::new(storage),
                config.photo,
            );
            AppState {
                config: config.clone(),
                sessions,
            }
        }
    };

    // Build router
    let app = dogowalker::routes::create_router(Arc::new(state));

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("dogowalker=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
