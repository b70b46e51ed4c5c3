//! Workflow REST API Routes
//!
//! Registration-free inspection of configured workflows and a run
//! endpoint that executes one over a fresh context.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use switchboard_core::Workflow;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /api/v1/workflows - List registered workflows
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/workflows",
    tag = "Workflows",
    responses(
        (status = 200, description = "Registered workflows", body = Vec<Workflow>),
    )
))]
pub async fn list_workflows(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.registry.list_workflows())
}

/// GET /api/v1/workflows/{id} - One workflow definition
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/workflows/{id}",
    tag = "Workflows",
    params(
        ("id" = String, Path, description = "Workflow ID")
    ),
    responses(
        (status = 200, description = "Workflow definition", body = Workflow),
        (status = 404, description = "Workflow not found", body = ApiError),
    )
))]
pub async fn get_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let workflow = state
        .registry
        .get_workflow(&id)
        .ok_or_else(|| ApiError::workflow_not_found(&id))?;

    Ok(Json(workflow))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_workflows))
        .route("/:id", get(get_workflow))
        .with_state(state)
}
