//! OpenAPI Specification for the Switchboard API
//!
//! Generates the OpenAPI document from route annotations and the shared
//! domain types.

use utoipa::OpenApi;

use crate::error::{ApiError, ErrorCode};
use crate::routes::{agent, chat, health, orchestrate, session, workflow};

use switchboard_core::{
    AgentCapability, AgentMetadata, AgentRole, AgentSpawnConfig, CapabilityType, Citation,
    ContextError, HandoffAnnouncement, HandoffRecord, HandoffTrigger, InstructionPriority,
    MessageRole,
    SessionMessage, SessionResponse, SessionSnapshot, TriggerCondition, UiInstruction,
    UiInstructionMetadata, UiInstructionType, Workflow, WorkflowStep,
};
use switchboard_orchestrator::{AgentStats, StrategyArgs, TelemetrySnapshot, WorkflowProgress};

/// OpenAPI document for the Switchboard API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Switchboard API",
        version = "0.3.0",
        description = "Agent orchestration and handoff framework",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local Development")
    ),
    tags(
        (name = "Chat", description = "Conversational sessions with trigger-driven handoffs"),
        (name = "Sessions", description = "Session inspection and lifecycle"),
        (name = "Agents", description = "Agent type discovery"),
        (name = "Workflows", description = "Declared multi-step workflows"),
        (name = "Orchestration", description = "One-shot pipeline execution"),
        (name = "Health", description = "Service health")
    ),
    paths(
        chat::chat,
        session::get_session,
        session::assign_agent,
        session::delete_session,
        agent::list_agents,
        agent::get_agent,
        workflow::list_workflows,
        workflow::get_workflow,
        orchestrate::orchestrate,
        orchestrate::telemetry,
        health::health,
    ),
    components(schemas(
        ApiError,
        ErrorCode,
        AgentMetadata,
        AgentCapability,
        AgentRole,
        AgentSpawnConfig,
        CapabilityType,
        TriggerCondition,
        HandoffTrigger,
        HandoffRecord,
        HandoffAnnouncement,
        SessionMessage,
        MessageRole,
        SessionResponse,
        SessionSnapshot,
        UiInstruction,
        UiInstructionMetadata,
        UiInstructionType,
        InstructionPriority,
        Citation,
        ContextError,
        Workflow,
        WorkflowStep,
        WorkflowProgress,
        StrategyArgs,
        TelemetrySnapshot,
        AgentStats,
        chat::ChatRequest,
        chat::ChatResponse,
        session::AssignAgentRequest,
        agent::AgentSummary,
        orchestrate::OrchestrateRequest,
        orchestrate::OrchestrateResponse,
        health::HealthResponse,
        health::HealthStatus,
    ))
)]
pub struct ApiDoc;
