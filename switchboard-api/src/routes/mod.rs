//! REST API Routes Module
//!
//! Route handlers organized by concern:
//! - Chat: conversational turns with trigger-driven handoffs
//! - Sessions: inspection, explicit agent assignment, deletion
//! - Agents: registry discovery
//! - Workflows: declared multi-step pipelines
//! - Orchestration: one-shot strategy execution and telemetry
//! - Health: liveness reporting

pub mod agent;
pub mod chat;
pub mod health;
pub mod orchestrate;
pub mod session;
pub mod workflow;

use axum::Router;

use crate::state::AppState;

// ============================================================================
// OPENAPI ENDPOINT
// ============================================================================

/// Handler for /openapi.json endpoint.
#[cfg(feature = "openapi")]
async fn openapi_json() -> axum::Json<utoipa::openapi::OpenApi> {
    use utoipa::OpenApi;
    axum::Json(crate::openapi::ApiDoc::openapi())
}

// ============================================================================
// ROUTER ASSEMBLY
// ============================================================================

/// Create the complete API router.
///
/// Routes:
/// - `POST /api/v1/chat`
/// - `GET|DELETE /api/v1/sessions/{id}`, `PUT /api/v1/sessions/{id}/agent`
/// - `GET /api/v1/agents`, `GET /api/v1/agents/{id}`
/// - `GET /api/v1/workflows`, `GET /api/v1/workflows/{id}`
/// - `POST /api/v1/orchestrate`, `GET /api/v1/orchestrate/telemetry`
/// - `GET /health`
/// - `GET /openapi.json` (when the openapi feature is enabled)
pub fn create_api_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .nest("/chat", chat::create_router(state.clone()))
        .nest("/sessions", session::create_router(state.clone()))
        .nest("/agents", agent::create_router(state.clone()))
        .nest("/workflows", workflow::create_router(state.clone()))
        .nest("/orchestrate", orchestrate::create_router(state.clone()));

    let router = Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health::create_router(state));

    #[cfg(feature = "openapi")]
    let router = router.route("/openapi.json", axum::routing::get(openapi_json));

    router
}

// =============================================================================
// TESTS
// =============================================================================
