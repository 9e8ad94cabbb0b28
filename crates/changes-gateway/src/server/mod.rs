//! Gateway server setup
//!
//! Routes, state construction and the serve loop.

mod config;
mod handler;
mod state;

pub use config::{config_handler, stats_handler, ApiError, ConfigQuery, StatsResponse};
pub use handler::{events_handler, EventsQuery};
pub use state::GatewayState;

use crate::broadcast::IdleSweeper;
use crate::connection::TransportRegistry;
use crate::expiry::TimeSensitiveStore;
use axum::{routing::get, Router};
use changes_common::{AppConfig, AppError};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Create the gateway router
pub fn create_router() -> Router<GatewayState> {
    Router::new()
        .route("/changes/events", get(events_handler))
        .route("/changes/config", get(config_handler).post(config_handler))
        .route("/changes/stats", get(stats_handler))
        .route("/health", get(health_check))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Build the complete application
pub fn create_app(state: GatewayState) -> Router {
    create_router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Build the registry and start its idle sweeper
///
/// Must be called from within a tokio runtime.
pub fn create_gateway_state(config: &AppConfig) -> GatewayState {
    let changes = config.changes.clone();

    let expiry = Arc::new(TimeSensitiveStore::new(changes.expiry()));
    let registry = TransportRegistry::new_shared(expiry);

    let sweeper = Arc::new(IdleSweeper::new(
        Arc::clone(&registry),
        changes.idle_interval(),
    ));
    sweeper.start();

    tracing::info!(
        expiry_secs = changes.expiry_secs,
        idle_interval_secs = changes.idle_interval_secs,
        "Transport registry ready"
    );

    GatewayState::new(registry, sweeper, changes)
}

/// Run the gateway server
pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), AppError> {
    tracing::info!("Starting changes gateway on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::server(format!("Failed to bind to {addr}: {e}")))?;

    tracing::info!("Listening on ws://{}/changes/events", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::server(format!("Server error: {e}")))?;

    Ok(())
}

/// Run the complete gateway server with configuration
///
/// The registry is not reachable from outside; embedders that publish
/// changes should build the state with `create_gateway_state` and serve
/// `create_app` themselves.
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr: SocketAddr = config
        .gateway
        .address()
        .parse()
        .map_err(|e| AppError::InvalidInput(format!("Invalid gateway address: {e}")))?;

    let state = create_gateway_state(&config);
    let sweeper = Arc::clone(state.sweeper());

    let result = run_server(create_app(state), addr).await;
    sweeper.stop();
    result
}
