//! Chat REST API Routes
//!
//! The conversational entry point. One POST per user turn: the message is
//! routed through the session's active agent, handoff triggers run first,
//! and the reply carries any announcement, collected data, and UI
//! instruction the agent produced.

use std::collections::BTreeMap;

use axum::{extract::State, response::IntoResponse, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use switchboard_core::{new_conversation_id, SessionResponse};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

// ============================================================================
// REQUEST/RESPONSE TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ChatRequest {
    /// Existing session to continue; omitted to start a new one.
    #[serde(default)]
    pub session_id: Option<String>,

    /// The user's message for this turn.
    pub message: String,

    /// Per-turn caller fields. An `intents` array of strings feeds
    /// intent-based handoff triggers.
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub meta: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ChatResponse {
    /// Session id to use on subsequent turns.
    pub session_id: String,

    /// The turn result, including any handoff announcement.
    #[serde(flatten)]
    pub response: SessionResponse,
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// POST /api/v1/chat - Send a message to a conversational session
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/v1/chat",
    tag = "Chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Turn processed", body = ChatResponse),
        (status = 400, description = "Invalid request", body = ApiError),
    )
))]
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.message.trim().is_empty() {
        return Err(ApiError::missing_field("message"));
    }

    let session_id = req
        .session_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(new_conversation_id);

    let mut response = state
        .sessions
        .handle_message(&session_id, &req.message, req.meta)
        .await?;

    // A UI instruction only leaves the server when it is complete and its
    // emitting agent is registered for that instruction type.
    if let Some(instruction) = response.ui_instruction.take() {
        let emitter = instruction
            .metadata
            .agent_id
            .clone()
            .or_else(|| response.agent_type.clone());
        let authorized = emitter.as_deref().is_some_and(|agent_id| {
            state
                .registry
                .is_authorized_for_ui_instruction(agent_id, instruction.instruction_type)
        });

        match instruction.validate() {
            Ok(()) if authorized => response.ui_instruction = Some(instruction),
            Ok(()) => {
                warn!(
                    session_id = %session_id,
                    agent_id = emitter.as_deref().unwrap_or("unknown"),
                    instruction_type = %instruction.instruction_type.as_str(),
                    "dropping unauthorized UI instruction"
                );
            }
            Err(e) => {
                warn!(
                    session_id = %session_id,
                    error = %e,
                    "dropping malformed UI instruction"
                );
            }
        }
    }

    Ok(Json(ChatResponse {
        session_id,
        response,
    }))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    Router::new().route("/", post(chat)).with_state(state)
}
