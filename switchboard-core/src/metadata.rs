//! Agent type metadata: capability declarations, handoff triggers, and
//! spawn configuration.
//!
//! Metadata describes what an agent *is* (identity, capabilities, routing
//! rules). The live trait objects that *do* the work live in
//! `switchboard-agents`; the registry there validates this metadata at
//! registration time.

use crate::error::ConfigError;
use crate::ui::UiInstructionType;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ============================================================================
// CAPABILITY AND ROLE ENUMS
// ============================================================================

/// Functional capability an agent advertises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum CapabilityType {
    Conversational,
    FormCollection,
    DataExtraction,
    EmailVerification,
    TicketCreation,
    FileProcessing,
    UiInteraction,
    Retrieval,
    Reasoning,
    Synthesis,
}

impl CapabilityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CapabilityType::Conversational => "conversational",
            CapabilityType::FormCollection => "form_collection",
            CapabilityType::DataExtraction => "data_extraction",
            CapabilityType::EmailVerification => "email_verification",
            CapabilityType::TicketCreation => "ticket_creation",
            CapabilityType::FileProcessing => "file_processing",
            CapabilityType::UiInteraction => "ui_interaction",
            CapabilityType::Retrieval => "retrieval",
            CapabilityType::Reasoning => "reasoning",
            CapabilityType::Synthesis => "synthesis",
        }
    }
}

impl fmt::Display for CapabilityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CapabilityType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "conversational" => Ok(CapabilityType::Conversational),
            "form_collection" => Ok(CapabilityType::FormCollection),
            "data_extraction" => Ok(CapabilityType::DataExtraction),
            "email_verification" => Ok(CapabilityType::EmailVerification),
            "ticket_creation" => Ok(CapabilityType::TicketCreation),
            "file_processing" => Ok(CapabilityType::FileProcessing),
            "ui_interaction" => Ok(CapabilityType::UiInteraction),
            "retrieval" => Ok(CapabilityType::Retrieval),
            "reasoning" => Ok(CapabilityType::Reasoning),
            "synthesis" => Ok(CapabilityType::Synthesis),
            other => Err(ConfigError::InvalidValue {
                field: "capability_type".to_string(),
                value: other.to_string(),
                reason: "not a known capability".to_string(),
            }),
        }
    }
}

/// Pipeline role an agent plays during dynamic orchestration.
///
/// `execution_rank` drives the ordering of a dynamically assembled
/// pipeline: information gathering first, response shaping last. Roles
/// outside the pipeline sort after every ranked role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Research,
    Retrieval,
    Planning,
    Reasoning,
    Synthesis,
    Response,
    Reflection,
    Support,
}

impl AgentRole {
    /// Position of this role in a dynamically ordered pipeline.
    pub fn execution_rank(&self) -> i32 {
        match self {
            AgentRole::Research | AgentRole::Retrieval => 1,
            AgentRole::Planning => 2,
            AgentRole::Reasoning => 3,
            AgentRole::Synthesis => 4,
            AgentRole::Response => 5,
            AgentRole::Reflection | AgentRole::Support => 99,
        }
    }
}

// ============================================================================
// CAPABILITIES
// ============================================================================

/// A single capability entry in an agent's metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AgentCapability {
    pub capability_type: CapabilityType,
    pub description: String,
    /// Free-form capability parameters (limits, formats, endpoints).
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub parameters: BTreeMap<String, Value>,
    /// UI instruction types this capability authorizes the agent to emit.
    #[serde(default)]
    pub ui_instructions: Vec<UiInstructionType>,
}

impl AgentCapability {
    pub fn new(capability_type: CapabilityType, description: impl Into<String>) -> Self {
        AgentCapability {
            capability_type,
            description: description.into(),
            parameters: BTreeMap::new(),
            ui_instructions: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    pub fn with_ui_instruction(mut self, instruction: UiInstructionType) -> Self {
        self.ui_instructions.push(instruction);
        self
    }
}

// ============================================================================
// HANDOFF TRIGGERS
// ============================================================================

/// Condition under which a handoff trigger fires.
///
/// Exactly one condition kind per trigger; the enum makes a trigger with
/// zero or several conditions unrepresentable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum TriggerCondition {
    /// Named predicate resolved against the predicate registry.
    Predicate { name: String },
    /// Case-insensitive regex patterns matched against the user message.
    Keywords { patterns: Vec<String> },
    /// Fires when any of these intent labels is present on the context.
    Intents { names: Vec<String> },
}

/// Declarative rule routing a conversation to another agent type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HandoffTrigger {
    pub target_agent_id: String,
    /// Human-readable reason, surfaced in handoff records and logs.
    pub description: String,
    /// Higher priority triggers are evaluated first. Defaults to 1.
    #[serde(default = "default_trigger_priority")]
    pub priority: i32,
    pub condition: TriggerCondition,
}

fn default_trigger_priority() -> i32 {
    1
}

impl HandoffTrigger {
    pub fn new(
        target_agent_id: impl Into<String>,
        description: impl Into<String>,
        condition: TriggerCondition,
    ) -> Self {
        HandoffTrigger {
            target_agent_id: target_agent_id.into(),
            description: description.into(),
            priority: default_trigger_priority(),
            condition,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

// ============================================================================
// AGENT METADATA
// ============================================================================

/// Full declarative description of an agent type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AgentMetadata {
    /// Stable identifier used for registration, handoff targets, and
    /// `requires` edges.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub version: String,
    /// Capabilities keyed by a caller-chosen capability id.
    #[serde(default)]
    pub capabilities: BTreeMap<String, AgentCapability>,
    #[serde(default)]
    pub handoff_triggers: Vec<HandoffTrigger>,
    /// Relative priority among agents competing for the same work.
    #[serde(default = "default_trigger_priority")]
    pub priority: i32,
    /// Agent type ids this agent depends on. Must stay acyclic.
    #[serde(default)]
    pub requires: Vec<String>,
    /// Singleton types get at most one live instance.
    #[serde(default = "default_singleton")]
    pub singleton: bool,
    /// Pipeline role for dynamic orchestration ordering.
    #[serde(default = "default_role")]
    pub role: AgentRole,
}

fn default_singleton() -> bool {
    true
}

fn default_role() -> AgentRole {
    AgentRole::Support
}

impl AgentMetadata {
    pub fn new(id: impl Into<String>, name: impl Into<String>, version: impl Into<String>) -> Self {
        AgentMetadata {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            version: version.into(),
            capabilities: BTreeMap::new(),
            handoff_triggers: Vec::new(),
            priority: 1,
            requires: Vec::new(),
            singleton: true,
            role: AgentRole::Support,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_capability(mut self, id: impl Into<String>, capability: AgentCapability) -> Self {
        self.capabilities.insert(id.into(), capability);
        self
    }

    pub fn with_trigger(mut self, trigger: HandoffTrigger) -> Self {
        self.handoff_triggers.push(trigger);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_requires(mut self, agent_id: impl Into<String>) -> Self {
        self.requires.push(agent_id.into());
        self
    }

    pub fn with_role(mut self, role: AgentRole) -> Self {
        self.role = role;
        self
    }

    /// Allow multiple live instances of this type.
    pub fn multi_instance(mut self) -> Self {
        self.singleton = false;
        self
    }

    pub fn has_capability(&self, capability_type: CapabilityType) -> bool {
        self.capabilities
            .values()
            .any(|c| c.capability_type == capability_type)
    }

    /// Union of UI instruction types across all capabilities.
    pub fn ui_instruction_types(&self) -> BTreeSet<UiInstructionType> {
        self.capabilities
            .values()
            .flat_map(|c| c.ui_instructions.iter().copied())
            .collect()
    }

    /// Whether any capability authorizes emitting this instruction type.
    pub fn authorizes_ui_instruction(&self, instruction: UiInstructionType) -> bool {
        self.capabilities
            .values()
            .any(|c| c.ui_instructions.contains(&instruction))
    }
}

// ============================================================================
// SPAWN CONFIGURATION
// ============================================================================

/// Configuration passed to an agent factory when instantiating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AgentSpawnConfig {
    pub agent_id: String,
    /// Explicit instance id; generated from the agent id when absent.
    #[serde(default)]
    pub instance_id: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub params: BTreeMap<String, Value>,
}

fn default_enabled() -> bool {
    true
}

impl AgentSpawnConfig {
    pub fn new(agent_id: impl Into<String>) -> Self {
        AgentSpawnConfig {
            agent_id: agent_id.into(),
            instance_id: None,
            enabled: true,
            params: BTreeMap::new(),
        }
    }

    pub fn with_instance_id(mut self, instance_id: impl Into<String>) -> Self {
        self.instance_id = Some(instance_id.into());
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_metadata_builder_defaults() {
        let meta = AgentMetadata::new("triage", "Triage Agent", "1.0.0");
        assert_eq!(meta.id, "triage");
        assert!(meta.singleton);
        assert_eq!(meta.priority, 1);
        assert!(meta.capabilities.is_empty());
        assert_eq!(meta.role, AgentRole::Support);
    }

    #[test]
    fn test_capability_lookup() {
        let meta = AgentMetadata::new("forms", "Form Agent", "1.0.0").with_capability(
            "collect",
            AgentCapability::new(CapabilityType::FormCollection, "Collects intake forms")
                .with_parameter("max_fields", json!(12))
                .with_ui_instruction(UiInstructionType::DisplayForm),
        );

        assert!(meta.has_capability(CapabilityType::FormCollection));
        assert!(!meta.has_capability(CapabilityType::Retrieval));
        assert!(meta.authorizes_ui_instruction(UiInstructionType::DisplayForm));
        assert!(!meta.authorizes_ui_instruction(UiInstructionType::RequestEmail));
    }

    #[test]
    fn test_ui_instruction_types_union() {
        let meta = AgentMetadata::new("uploads", "Upload Agent", "1.0.0")
            .with_capability(
                "upload",
                AgentCapability::new(CapabilityType::FileProcessing, "Handles uploads")
                    .with_ui_instruction(UiInstructionType::ShowFileUpload)
                    .with_ui_instruction(UiInstructionType::ShowProgressIndicator),
            )
            .with_capability(
                "confirm",
                AgentCapability::new(CapabilityType::UiInteraction, "Confirms actions")
                    .with_ui_instruction(UiInstructionType::ShowConfirmationDialog)
                    .with_ui_instruction(UiInstructionType::ShowProgressIndicator),
            );

        let types = meta.ui_instruction_types();
        assert_eq!(types.len(), 3);
        assert!(types.contains(&UiInstructionType::ShowFileUpload));
        assert!(types.contains(&UiInstructionType::ShowConfirmationDialog));
    }

    #[test]
    fn test_trigger_default_priority() {
        let trigger = HandoffTrigger::new(
            "billing",
            "Billing question detected",
            TriggerCondition::Keywords {
                patterns: vec![r"\binvoice\b".to_string()],
            },
        );
        assert_eq!(trigger.priority, 1);
        assert_eq!(trigger.with_priority(10).priority, 10);
    }

    #[test]
    fn test_trigger_condition_serde_shape() {
        let condition = TriggerCondition::Intents {
            names: vec!["refund_request".to_string()],
        };
        let json = serde_json::to_value(&condition).unwrap();
        assert_eq!(json["intents"]["names"][0], "refund_request");

        let back: TriggerCondition = serde_json::from_value(json).unwrap();
        assert_eq!(back, condition);
    }

    #[test]
    fn test_role_execution_rank_ordering() {
        assert!(AgentRole::Retrieval.execution_rank() < AgentRole::Planning.execution_rank());
        assert!(AgentRole::Planning.execution_rank() < AgentRole::Reasoning.execution_rank());
        assert!(AgentRole::Synthesis.execution_rank() < AgentRole::Response.execution_rank());
        assert!(AgentRole::Support.execution_rank() > AgentRole::Response.execution_rank());
    }

    #[test]
    fn test_spawn_config_builder() {
        let config = AgentSpawnConfig::new("triage")
            .with_instance_id("triage-main")
            .with_param("model", json!("small"));
        assert_eq!(config.instance_id.as_deref(), Some("triage-main"));
        assert!(config.enabled);
        assert_eq!(config.params["model"], "small");
    }
}
