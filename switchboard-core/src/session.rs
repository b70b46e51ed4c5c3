//! Session-facing data types: conversation messages, handoff records,
//! agent replies, and the evaluation context handed to triggers and
//! conversational agents.

use crate::ui::UiInstruction;
use crate::Timestamp;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// ============================================================================
// MESSAGES
// ============================================================================

/// Who authored a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

/// One entry in a session's message history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SessionMessage {
    pub role: MessageRole,
    pub content: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub timestamp: Timestamp,
}

impl SessionMessage {
    pub fn user(content: impl Into<String>) -> Self {
        SessionMessage {
            role: MessageRole::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        SessionMessage {
            role: MessageRole::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

// ============================================================================
// HANDOFF RECORDS
// ============================================================================

/// Audit record of a completed agent-to-agent transfer within a session.
///
/// Carries a snapshot of the conversation so the receiving agent can pick
/// up without re-asking questions the user already answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HandoffRecord {
    pub session_id: String,
    pub source_agent_id: String,
    pub target_agent_id: String,
    pub reason: String,
    #[serde(default)]
    pub message_history: Vec<SessionMessage>,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub collected_data: BTreeMap<String, Value>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub timestamp: Timestamp,
}

impl HandoffRecord {
    pub fn new(
        session_id: impl Into<String>,
        source_agent_id: impl Into<String>,
        target_agent_id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        HandoffRecord {
            session_id: session_id.into(),
            source_agent_id: source_agent_id.into(),
            target_agent_id: target_agent_id.into(),
            reason: reason.into(),
            message_history: Vec::new(),
            collected_data: BTreeMap::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_history(mut self, history: Vec<SessionMessage>) -> Self {
        self.message_history = history;
        self
    }

    pub fn with_collected_data(mut self, data: BTreeMap<String, Value>) -> Self {
        self.collected_data = data;
        self
    }
}

/// Wire-facing announcement that a handoff happened, included in the
/// response for the turn that triggered it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HandoffAnnouncement {
    /// Absent for the initial assignment of a fresh session.
    #[serde(default)]
    pub from: Option<String>,
    pub to: String,
    pub reason: String,
}

// ============================================================================
// EVALUATION CONTEXT
// ============================================================================

/// Read-only view of a session turn, handed to handoff predicates and to
/// conversational agents processing a message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct EvalContext {
    pub message: String,
    pub session_id: String,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub collected_data: BTreeMap<String, Value>,
    #[serde(default)]
    pub message_history: Vec<SessionMessage>,
    /// Intent labels attached by an upstream classifier, if any.
    #[serde(default)]
    pub intents: Vec<String>,
    /// Extra per-turn fields supplied by the caller.
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub extra: BTreeMap<String, Value>,
    /// Set when this turn is the continuation of a just-performed handoff.
    #[serde(default)]
    pub handoff: Option<HandoffRecord>,
}

impl EvalContext {
    pub fn new(message: impl Into<String>, session_id: impl Into<String>) -> Self {
        EvalContext {
            message: message.into(),
            session_id: session_id.into(),
            ..EvalContext::default()
        }
    }

    pub fn with_intents(mut self, intents: Vec<String>) -> Self {
        self.intents = intents;
        self
    }

    pub fn has_intent(&self, name: &str) -> bool {
        self.intents.iter().any(|i| i == name)
    }
}

// ============================================================================
// AGENT REPLIES AND SESSION RESPONSES
// ============================================================================

/// What a conversational agent returns for one message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AgentReply {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub ui_instruction: Option<UiInstruction>,
    /// Structured fields the agent collected this turn, merged into the
    /// session's collected data.
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub data: BTreeMap<String, Value>,
    /// Agent-requested handoff target; evaluated after the reply.
    #[serde(default)]
    pub handoff_to: Option<String>,
    #[serde(default)]
    pub handoff_reason: Option<String>,
    /// Whether the agent considers its task complete.
    #[serde(default)]
    pub done: bool,
    /// Task progress in `0.0..=1.0` when the agent tracks it.
    #[serde(default)]
    pub progress: Option<f32>,
}

impl AgentReply {
    pub fn text(message: impl Into<String>) -> Self {
        AgentReply {
            message: Some(message.into()),
            ..AgentReply::default()
        }
    }

    pub fn with_ui_instruction(mut self, instruction: UiInstruction) -> Self {
        self.ui_instruction = Some(instruction);
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    pub fn with_handoff(mut self, target: impl Into<String>, reason: impl Into<String>) -> Self {
        self.handoff_to = Some(target.into());
        self.handoff_reason = Some(reason.into());
        self
    }

    pub fn with_progress(mut self, progress: f32) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn finished(mut self) -> Self {
        self.done = true;
        self
    }
}

/// What the session layer returns to the transport for one turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SessionResponse {
    #[serde(default)]
    pub message: Option<String>,
    /// Agent type that produced (or now owns) the conversation.
    #[serde(default)]
    pub agent_type: Option<String>,
    #[serde(default)]
    pub handoff: Option<HandoffAnnouncement>,
    #[serde(default)]
    pub ui_instruction: Option<UiInstruction>,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub data: BTreeMap<String, Value>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub progress: Option<f32>,
    /// Set when the turn failed; `message` still carries a user-safe reply.
    #[serde(default)]
    pub error: Option<String>,
}

/// Read-only summary of a live session for inspection endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SessionSnapshot {
    pub session_id: String,
    #[serde(default)]
    pub active_agent_id: Option<String>,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub collected_data: BTreeMap<String, Value>,
    pub message_count: usize,
    #[serde(default)]
    pub handoff_history: Vec<HandoffRecord>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub last_activity: Timestamp,
}

// =============================================================================
// TESTS
// =============================================================================
