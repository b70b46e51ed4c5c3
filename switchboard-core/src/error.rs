//! Error types for Switchboard operations

use thiserror::Error;

/// Registration and configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Circular dependency detected: registering {agent_id} would close a requires cycle")]
    CircularRequires { agent_id: String },

    #[error("Agent {agent_id} declares a handoff trigger targeting itself")]
    SelfHandoff { agent_id: String },

    #[error("Unknown predicate '{name}' referenced by agent {agent_id}")]
    UnknownPredicate { agent_id: String, name: String },

    #[error("Invalid keyword pattern '{pattern}' on agent {agent_id}: {reason}")]
    InvalidPattern {
        agent_id: String,
        pattern: String,
        reason: String,
    },

    #[error("Agent instance id already in use: {instance_id}")]
    InstanceIdInUse { instance_id: String },

    #[error("Failed to construct agent {agent_id}: {reason}")]
    ConstructionFailed { agent_id: String, reason: String },

    #[error("Unknown orchestration strategy: {name}")]
    UnknownStrategy { name: String },

    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Lookup failures for registered entities.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotFoundError {
    #[error("Agent type not registered: {0}")]
    AgentType(String),

    #[error("Agent instance does not exist: {0}")]
    AgentInstance(String),

    #[error("Workflow not registered: {0}")]
    Workflow(String),

    #[error("Session does not exist: {0}")]
    Session(String),
}

/// Errors raised while running agents.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("Agent {agent_id} failed: {reason}")]
    AgentFailed { agent_id: String, reason: String },

    #[error("Agent {agent_id} declined to handle the context")]
    Declined { agent_id: String },

    #[error("No active agent for session {session_id} and no default agent configured")]
    NoActiveAgent { session_id: String },

    #[error("Handoff failed for session {session_id}: {reason}")]
    HandoffFailed { session_id: String, reason: String },
}

/// UI instruction validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InstructionError {
    #[error("Invalid instruction type: {0}")]
    InvalidType(String),

    #[error("Missing required parameter '{parameter}' for {instruction_type} instruction")]
    MissingParameter {
        instruction_type: String,
        parameter: String,
    },

    #[error("Agent {agent_id} is not authorized to emit {instruction_type} instructions")]
    Unauthorized {
        agent_id: String,
        instruction_type: String,
    },
}

/// Master error type for all Switchboard errors.
#[derive(Debug, Clone, Error)]
pub enum SwitchboardError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Not found: {0}")]
    NotFound(#[from] NotFoundError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Instruction error: {0}")]
    Instruction(#[from] InstructionError),
}

/// Result type alias for Switchboard operations.
pub type SwitchboardResult<T> = Result<T, SwitchboardError>;

// =============================================================================
// TESTS
// =============================================================================
