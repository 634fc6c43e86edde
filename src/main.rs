//! Evolvr Engine - Persistent creature life-cycle and evolution service
//!
//! The Engine is the backend server that:
//! - Tracks one growing creature per user (optionally per group)
//! - Applies emotion deltas and turn volume reported by the chat layer
//! - Decides evolutions, including the final-form rebirth loop
//! - Serves status, admin and catalog endpoints over HTTP

mod application;
mod domain;
mod infrastructure;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::infrastructure::config::AppConfig;
use crate::infrastructure::event_bus::run_event_logger;
use crate::infrastructure::http;
use crate::infrastructure::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "evolvr_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Evolvr Engine");

    // Load configuration
    let config = AppConfig::load()?;
    tracing::info!("Configuration loaded");
    tracing::info!("  Store: {:?} ({})", config.store.backend, config.store.sqlite_path);
    tracing::info!("  Catalog: {}", config.catalog.path);
    tracing::info!("  Group mode: {:?}", config.lifecycle.group_mode);

    let port = config.server.port;

    // Initialize application state
    let state = AppState::new(config).await?;
    let state = Arc::new(state);
    tracing::info!("Application state initialized");

    // Lifecycle event logger
    let event_logger = {
        let receiver = state.event_bus.subscribe();
        tokio::spawn(async move {
            tracing::info!("Starting lifecycle event logger");
            run_event_logger(receiver).await;
        })
    };

    // Build the router
    let app = Router::new()
        .route("/health", get(health_check))
        // Merge REST API routes
        .merge(http::create_routes())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start the server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Run server with graceful shutdown
    let server = axum::serve(listener, app);

    // Wait for shutdown signal (Ctrl+C)
    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received, stopping event logger...");
            event_logger.abort();
            tracing::info!("Event logger stopped");
        }
    }

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}
