//! Switchboard API Server Entry Point
//!
//! Bootstraps configuration, builds the shared application state, spawns
//! the idle-session sweeper, and starts the Axum HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tracing_subscriber::EnvFilter;

use switchboard_api::{create_api_router, ApiConfig, ApiError, ApiResult, AppState};
use switchboard_core::SwitchboardConfig;

#[tokio::main]
async fn main() -> ApiResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = SwitchboardConfig::from_env();
    config
        .validate()
        .map_err(|e| ApiError::invalid_input(e.to_string()))?;

    let sweep_interval = config.sweep_interval;
    let state = AppState::new(config);

    // Agent types are registered here by the embedding application;
    // the bare binary serves an empty registry.

    spawn_idle_sweeper(Arc::clone(&state.sessions), sweep_interval);

    let api_config = ApiConfig::from_env();
    let app: Router = create_api_router(state);

    let addr = resolve_bind_addr(&api_config)?;
    tracing::info!(%addr, "Starting Switchboard API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

/// Periodically evict sessions idle past the configured timeout.
fn spawn_idle_sweeper(
    sessions: Arc<switchboard_agents::SessionStore>,
    interval: std::time::Duration,
) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let evicted = sessions.sweep_idle();
            if evicted > 0 {
                tracing::debug!(evicted, "idle session sweep");
            }
        }
    });
}

fn resolve_bind_addr(config: &ApiConfig) -> ApiResult<SocketAddr> {
    let addr = config.bind_addr();
    addr.parse::<SocketAddr>()
        .map_err(|e| ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e)))
}
