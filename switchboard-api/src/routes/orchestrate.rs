//! Orchestration REST API Routes
//!
//! One-shot pipeline execution: a query runs through agents under a
//! named strategy and the resulting context comes back with results,
//! citations, and any per-agent errors. Also exposes accumulated
//! execution telemetry.

use std::collections::BTreeMap;

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use switchboard_core::{Citation, Context, ContextError};
use switchboard_orchestrator::{StrategyArgs, TelemetrySnapshot};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

// ============================================================================
// REQUEST/RESPONSE TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct OrchestrateRequest {
    /// Strategy name: single, sequential, parallel, workflow, or dynamic.
    pub strategy: String,

    /// The query the pipeline operates on.
    pub query: String,

    /// Agent for the single strategy.
    #[serde(default)]
    pub agent_id: Option<String>,

    /// Agents for the sequential and parallel strategies, in order.
    #[serde(default)]
    pub agent_ids: Vec<String>,

    /// Workflow for the workflow strategy.
    #[serde(default)]
    pub workflow_id: Option<String>,

    /// Seed metadata for the context.
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub metadata: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct OrchestrateResponse {
    pub conversation_id: String,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub results: BTreeMap<String, Value>,
    pub citations: Vec<Citation>,
    pub errors: Vec<ContextError>,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub metadata: BTreeMap<String, Value>,
}

impl From<Context> for OrchestrateResponse {
    fn from(ctx: Context) -> Self {
        OrchestrateResponse {
            conversation_id: ctx.conversation_id,
            results: ctx.results,
            citations: ctx.citations,
            errors: ctx.errors,
            metadata: ctx.metadata,
        }
    }
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// POST /api/v1/orchestrate - Run a query through an agent pipeline
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/v1/orchestrate",
    tag = "Orchestration",
    request_body = OrchestrateRequest,
    responses(
        (status = 200, description = "Pipeline result", body = OrchestrateResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 404, description = "Unknown workflow", body = ApiError),
    )
))]
pub async fn orchestrate(
    State(state): State<AppState>,
    Json(req): Json<OrchestrateRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.query.trim().is_empty() {
        return Err(ApiError::missing_field("query"));
    }

    let mut ctx = Context::new(&req.query);
    for (key, value) in req.metadata {
        ctx.metadata.insert(key, value);
    }

    let args = StrategyArgs {
        agent_id: req.agent_id,
        agent_ids: req.agent_ids,
        workflow_id: req.workflow_id,
    };

    state
        .orchestrator
        .execute_strategy(&req.strategy, &mut ctx, args)
        .await?;

    Ok(Json(OrchestrateResponse::from(ctx)))
}

/// GET /api/v1/orchestrate/telemetry - Execution statistics
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/orchestrate/telemetry",
    tag = "Orchestration",
    responses(
        (status = 200, description = "Per-agent execution statistics", body = TelemetrySnapshot),
    )
))]
pub async fn telemetry(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.orchestrator.telemetry())
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", post(orchestrate))
        .route("/telemetry", get(telemetry))
        .with_state(state)
}
