//! Agent REST API Routes
//!
//! Read-only discovery endpoints over the agent registry: list registered
//! agent types, inspect one, and filter by capability.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use switchboard_core::{AgentMetadata, AgentRole, CapabilityType};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

// ============================================================================
// RESPONSE TYPES
// ============================================================================

/// Condensed view of a registered agent type for list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AgentSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub version: String,
    pub role: AgentRole,
    pub singleton: bool,
    pub priority: i32,
    pub capabilities: Vec<String>,
    pub handoff_targets: Vec<String>,
}

impl From<&AgentMetadata> for AgentSummary {
    fn from(metadata: &AgentMetadata) -> Self {
        AgentSummary {
            id: metadata.id.clone(),
            name: metadata.name.clone(),
            description: metadata.description.clone(),
            version: metadata.version.clone(),
            role: metadata.role,
            singleton: metadata.singleton,
            priority: metadata.priority,
            capabilities: metadata.capabilities.keys().cloned().collect(),
            handoff_targets: metadata
                .handoff_triggers
                .iter()
                .map(|t| t.target_agent_id.clone())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct ListAgentsQuery {
    /// Only list agents advertising this capability type.
    #[serde(default)]
    pub capability: Option<String>,
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /api/v1/agents - List registered agent types
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/agents",
    tag = "Agents",
    params(ListAgentsQuery),
    responses(
        (status = 200, description = "Registered agent types", body = Vec<AgentSummary>),
        (status = 400, description = "Unknown capability filter", body = ApiError),
    )
))]
pub async fn list_agents(
    State(state): State<AppState>,
    Query(query): Query<ListAgentsQuery>,
) -> ApiResult<impl IntoResponse> {
    let types = match query.capability.as_deref() {
        Some(raw) => {
            let capability = CapabilityType::from_str(raw)
                .map_err(|_| ApiError::invalid_input(format!("Unknown capability: {}", raw)))?;
            state.registry.agents_by_capability(capability)
        }
        None => state.registry.list_agent_types(),
    };

    let summaries: Vec<AgentSummary> = types.iter().map(AgentSummary::from).collect();
    Ok(Json(summaries))
}

/// GET /api/v1/agents/{id} - Full metadata for one agent type
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/agents/{id}",
    tag = "Agents",
    params(
        ("id" = String, Path, description = "Agent type ID")
    ),
    responses(
        (status = 200, description = "Agent metadata", body = AgentMetadata),
        (status = 404, description = "Agent not found", body = ApiError),
    )
))]
pub async fn get_agent(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let metadata = state
        .registry
        .get_agent_type(&id)
        .ok_or_else(|| ApiError::agent_not_found(&id))?;

    Ok(Json(metadata))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_agents))
        .route("/:id", get(get_agent))
        .with_state(state)
}
