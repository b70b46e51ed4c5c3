//! Switchboard Core - Data Types
//!
//! Shared data structures for the Switchboard agent orchestration framework:
//! agent metadata, handoff triggers, execution contexts, session messages,
//! UI instructions, and workflow definitions. Crates with behavior
//! (registries, evaluators, orchestrators) build on top of this one.

pub mod config;
pub mod context;
pub mod error;
pub mod metadata;
pub mod session;
pub mod ui;
pub mod workflow;

use chrono::{DateTime, Utc};
use uuid::Uuid;

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Generate a new UUIDv7 (timestamp-sortable) as a string, used for
/// conversation and session identifiers.
pub fn new_conversation_id() -> String {
    Uuid::now_v7().to_string()
}

/// Generate an agent instance identifier of the form `{agent_id}-{uuid}`.
/// The UUIDv7 suffix keeps instance ids of the same type creation-ordered.
pub fn new_instance_id(agent_id: &str) -> String {
    format!("{}-{}", agent_id, Uuid::now_v7())
}

// Re-export the main types at the crate root.
pub use config::SwitchboardConfig;
pub use context::{Citation, Context, ContextError, MemoryEntry};
pub use error::{
    ConfigError, ExecutionError, InstructionError, NotFoundError, SwitchboardError,
    SwitchboardResult,
};
pub use metadata::{
    AgentCapability, AgentMetadata, AgentRole, AgentSpawnConfig, CapabilityType, HandoffTrigger,
    TriggerCondition,
};
pub use session::{
    AgentReply, EvalContext, HandoffAnnouncement, HandoffRecord, MessageRole, SessionMessage,
    SessionResponse, SessionSnapshot,
};
pub use ui::{InstructionPriority, UiInstruction, UiInstructionMetadata, UiInstructionType};
pub use workflow::{Workflow, WorkflowStep};
