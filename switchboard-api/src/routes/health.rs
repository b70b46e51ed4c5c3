//! Health Check Routes
//!
//! Liveness and readiness style reporting for load balancers and
//! operators: uptime, registered agent types, and live session count.

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

// ============================================================================
// RESPONSE TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_secs: i64,
    pub registered_agent_types: usize,
    pub active_sessions: usize,
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /health - Service health summary
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service health summary", body = HealthResponse),
    )
))]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let uptime = chrono::Utc::now() - state.start_time;
    let registered = state.registry.list_agent_types().len();

    // No agents registered means the server cannot route anything yet.
    let status = if registered > 0 {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: uptime.num_seconds(),
        registered_agent_types: registered,
        active_sessions: state.sessions.session_count(),
    })
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    Router::new().route("/", get(health)).with_state(state)
}
