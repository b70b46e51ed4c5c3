//! Structured UI instructions agents send to the frontend.
//!
//! An instruction is a typed request for the client to render something
//! (upload widget, email prompt, form, progress bar). Parameters are
//! validated per instruction type before an instruction leaves the server.

use crate::error::InstructionError;
use crate::Timestamp;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Wire version for UI instruction payloads.
pub const UI_INSTRUCTION_VERSION: &str = "1.0";

// ============================================================================
// INSTRUCTION TYPE
// ============================================================================

/// Kinds of UI instructions the protocol supports.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum UiInstructionType {
    ShowFileUpload,
    RequestEmail,
    DisplayForm,
    ShowAuthPrompt,
    ShowSelectionMenu,
    ShowProgressIndicator,
    ShowConfirmationDialog,
}

impl UiInstructionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UiInstructionType::ShowFileUpload => "show_file_upload",
            UiInstructionType::RequestEmail => "request_email",
            UiInstructionType::DisplayForm => "display_form",
            UiInstructionType::ShowAuthPrompt => "show_auth_prompt",
            UiInstructionType::ShowSelectionMenu => "show_selection_menu",
            UiInstructionType::ShowProgressIndicator => "show_progress_indicator",
            UiInstructionType::ShowConfirmationDialog => "show_confirmation_dialog",
        }
    }

    /// Parameter names that must be present for this instruction type.
    pub fn required_parameters(&self) -> &'static [&'static str] {
        match self {
            UiInstructionType::ShowFileUpload => {
                &["max_files", "max_size_mb", "accepted_types", "upload_url"]
            }
            UiInstructionType::RequestEmail => &["prompt"],
            _ => &[],
        }
    }
}

impl fmt::Display for UiInstructionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UiInstructionType {
    type Err = InstructionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "show_file_upload" => Ok(UiInstructionType::ShowFileUpload),
            "request_email" => Ok(UiInstructionType::RequestEmail),
            "display_form" => Ok(UiInstructionType::DisplayForm),
            "show_auth_prompt" => Ok(UiInstructionType::ShowAuthPrompt),
            "show_selection_menu" => Ok(UiInstructionType::ShowSelectionMenu),
            "show_progress_indicator" => Ok(UiInstructionType::ShowProgressIndicator),
            "show_confirmation_dialog" => Ok(UiInstructionType::ShowConfirmationDialog),
            other => Err(InstructionError::InvalidType(other.to_string())),
        }
    }
}

// ============================================================================
// METADATA
// ============================================================================

/// Rendering priority hint for the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum InstructionPriority {
    Low,
    #[default]
    Normal,
    High,
}

/// Envelope metadata attached to every instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UiInstructionMetadata {
    #[serde(default)]
    pub priority: InstructionPriority,
    /// Ordering hint when several instructions arrive in one response.
    #[serde(default)]
    pub sequence: Option<i32>,
    pub version: String,
    /// Agent that emitted the instruction, for authorization auditing.
    #[serde(default)]
    pub agent_id: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

impl Default for UiInstructionMetadata {
    fn default() -> Self {
        UiInstructionMetadata {
            priority: InstructionPriority::Normal,
            sequence: None,
            version: UI_INSTRUCTION_VERSION.to_string(),
            agent_id: None,
            created_at: Utc::now(),
        }
    }
}

// ============================================================================
// INSTRUCTION
// ============================================================================

/// A typed UI instruction with parameters and envelope metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UiInstruction {
    pub instruction_type: UiInstructionType,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub parameters: BTreeMap<String, Value>,
    #[serde(default)]
    pub metadata: UiInstructionMetadata,
}

impl UiInstruction {
    pub fn new(instruction_type: UiInstructionType) -> Self {
        UiInstruction {
            instruction_type,
            parameters: BTreeMap::new(),
            metadata: UiInstructionMetadata::default(),
        }
    }

    /// File upload widget request.
    pub fn file_upload(
        max_files: u32,
        max_size_mb: u32,
        accepted_types: &[&str],
        upload_url: impl Into<String>,
    ) -> Self {
        UiInstruction::new(UiInstructionType::ShowFileUpload)
            .with_parameter("max_files", json!(max_files))
            .with_parameter("max_size_mb", json!(max_size_mb))
            .with_parameter("accepted_types", json!(accepted_types))
            .with_parameter("upload_url", json!(upload_url.into()))
    }

    /// Email collection prompt.
    pub fn email_request(prompt: impl Into<String>) -> Self {
        UiInstruction::new(UiInstructionType::RequestEmail)
            .with_parameter("prompt", json!(prompt.into()))
    }

    /// Progress indicator; `progress` is a percentage when determinate.
    pub fn progress_indicator(message: impl Into<String>, progress: Option<u8>) -> Self {
        let mut instruction = UiInstruction::new(UiInstructionType::ShowProgressIndicator)
            .with_parameter("message", json!(message.into()));
        if let Some(pct) = progress {
            instruction = instruction.with_parameter("progress", json!(pct));
        }
        instruction
    }

    /// Confirmation dialog with a title and body.
    pub fn confirmation_dialog(title: impl Into<String>, message: impl Into<String>) -> Self {
        UiInstruction::new(UiInstructionType::ShowConfirmationDialog)
            .with_parameter("title", json!(title.into()))
            .with_parameter("message", json!(message.into()))
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    pub fn with_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.metadata.agent_id = Some(agent_id.into());
        self
    }

    pub fn with_priority(mut self, priority: InstructionPriority) -> Self {
        self.metadata.priority = priority;
        self
    }

    pub fn with_sequence(mut self, sequence: i32) -> Self {
        self.metadata.sequence = Some(sequence);
        self
    }

    /// Check that all required parameters for this instruction type are set.
    pub fn validate(&self) -> Result<(), InstructionError> {
        for parameter in self.instruction_type.required_parameters() {
            if !self.parameters.contains_key(*parameter) {
                return Err(InstructionError::MissingParameter {
                    instruction_type: self.instruction_type.as_str().to_string(),
                    parameter: (*parameter).to_string(),
                });
            }
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_type_string_roundtrip() {
        for ty in [
            UiInstructionType::ShowFileUpload,
            UiInstructionType::RequestEmail,
            UiInstructionType::DisplayForm,
            UiInstructionType::ShowAuthPrompt,
            UiInstructionType::ShowSelectionMenu,
            UiInstructionType::ShowProgressIndicator,
            UiInstructionType::ShowConfirmationDialog,
        ] {
            let parsed: UiInstructionType = ty.as_str().parse().unwrap();
            assert_eq!(parsed, ty);
        }
    }

    #[test]
    fn test_invalid_instruction_type() {
        let err = "launch_rocket".parse::<UiInstructionType>().unwrap_err();
        assert!(matches!(err, InstructionError::InvalidType(ref s) if s == "launch_rocket"));
    }

    #[test]
    fn test_file_upload_validates() {
        let instruction = UiInstruction::file_upload(3, 25, &["pdf", "png"], "/api/v1/uploads");
        assert!(instruction.validate().is_ok());
        assert_eq!(instruction.parameters["max_files"], 3);
        assert_eq!(instruction.parameters["accepted_types"][1], "png");
    }

    #[test]
    fn test_file_upload_missing_parameter_rejected() {
        let mut instruction = UiInstruction::file_upload(3, 25, &["pdf"], "/api/v1/uploads");
        instruction.parameters.remove("upload_url");

        let err = instruction.validate().unwrap_err();
        assert_eq!(
            err,
            InstructionError::MissingParameter {
                instruction_type: "show_file_upload".to_string(),
                parameter: "upload_url".to_string(),
            }
        );
    }

    #[test]
    fn test_email_request_requires_prompt() {
        let ok = UiInstruction::email_request("What's your email?");
        assert!(ok.validate().is_ok());

        let bare = UiInstruction::new(UiInstructionType::RequestEmail);
        assert!(bare.validate().is_err());
    }

    #[test]
    fn test_types_without_required_parameters() {
        // A bare selection menu is structurally valid even with no params.
        let instruction = UiInstruction::new(UiInstructionType::ShowSelectionMenu);
        assert!(instruction.validate().is_ok());
    }

    #[test]
    fn test_metadata_defaults() {
        let instruction = UiInstruction::progress_indicator("Working...", Some(40))
            .with_agent("uploads")
            .with_sequence(2);
        assert_eq!(instruction.metadata.version, UI_INSTRUCTION_VERSION);
        assert_eq!(instruction.metadata.priority, InstructionPriority::Normal);
        assert_eq!(instruction.metadata.agent_id.as_deref(), Some("uploads"));
        assert_eq!(instruction.metadata.sequence, Some(2));
    }

    #[test]
    fn test_serde_snake_case_wire_shape() {
        let instruction = UiInstruction::email_request("Your email, please")
            .with_priority(InstructionPriority::High);
        let json = serde_json::to_value(&instruction).unwrap();
        assert_eq!(json["instruction_type"], "request_email");
        assert_eq!(json["metadata"]["priority"], "high");
    }
}
