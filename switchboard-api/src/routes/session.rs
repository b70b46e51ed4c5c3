//! Session REST API Routes
//!
//! Inspection and lifecycle management for live sessions: snapshots with
//! handoff history, explicit agent assignment, and deletion.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use switchboard_core::SessionSnapshot;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

// ============================================================================
// REQUEST TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AssignAgentRequest {
    /// Agent type to make the session's active agent.
    pub agent_id: String,

    /// Reason recorded in the handoff audit log.
    #[serde(default)]
    pub reason: Option<String>,
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /api/v1/sessions/{id} - Inspect a live session
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/sessions/{id}",
    tag = "Sessions",
    params(
        ("id" = String, Path, description = "Session ID")
    ),
    responses(
        (status = 200, description = "Session snapshot", body = SessionSnapshot),
        (status = 404, description = "Session not found", body = ApiError),
    )
))]
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let snapshot = state
        .sessions
        .snapshot(&id)
        .await
        .ok_or_else(|| ApiError::session_not_found(&id))?;

    Ok(Json(snapshot))
}

/// PUT /api/v1/sessions/{id}/agent - Explicitly assign the active agent
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/api/v1/sessions/{id}/agent",
    tag = "Sessions",
    params(
        ("id" = String, Path, description = "Session ID")
    ),
    request_body = AssignAgentRequest,
    responses(
        (status = 200, description = "Agent assigned", body = SessionSnapshot),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 404, description = "Agent not registered", body = ApiError),
    )
))]
pub async fn assign_agent(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AssignAgentRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.agent_id.trim().is_empty() {
        return Err(ApiError::missing_field("agent_id"));
    }

    let reason = req
        .reason
        .unwrap_or_else(|| "Explicit assignment".to_string());
    state
        .sessions
        .set_active_agent(&id, &req.agent_id, &reason)
        .await?;

    let snapshot = state
        .sessions
        .snapshot(&id)
        .await
        .ok_or_else(|| ApiError::session_not_found(&id))?;

    Ok(Json(snapshot))
}

/// DELETE /api/v1/sessions/{id} - Delete a session and its handoff history
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/api/v1/sessions/{id}",
    tag = "Sessions",
    params(
        ("id" = String, Path, description = "Session ID")
    ),
    responses(
        (status = 204, description = "Session deleted"),
        (status = 404, description = "Session not found", body = ApiError),
    )
))]
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    if state.sessions.delete_session(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::session_not_found(&id))
    }
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/:id", get(get_session))
        .route("/:id", delete(delete_session))
        .route("/:id/agent", put(assign_agent))
        .with_state(state)
}
