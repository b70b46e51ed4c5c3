//! Error Types for the Switchboard API
//!
//! Defines the structured error envelope returned by every endpoint:
//! - ApiError struct for structured error responses
//! - ErrorCode enum for categorizing errors
//! - IntoResponse implementation for Axum HTTP responses
//!
//! All errors are serialized as JSON with appropriate HTTP status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use switchboard_core::{ExecutionError, NotFoundError, SwitchboardError};

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
///
/// Each error code maps to a specific HTTP status code and represents
/// a category of error that can occur during API operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================================================
    // Validation Errors (400)
    // ========================================================================
    /// Request validation failed
    ValidationFailed,

    /// Request contains invalid input data
    InvalidInput,

    /// Required field is missing from request
    MissingField,

    // ========================================================================
    // Not Found Errors (404)
    // ========================================================================
    /// Requested agent type does not exist
    AgentNotFound,

    /// Requested session does not exist
    SessionNotFound,

    /// Requested workflow does not exist
    WorkflowNotFound,

    // ========================================================================
    // Conflict Errors (409)
    // ========================================================================
    /// Entity with the same identifier already exists
    EntityAlreadyExists,

    // ========================================================================
    // Server Errors (500, 503)
    // ========================================================================
    /// Internal server error
    InternalError,

    /// Agent execution failed
    ExecutionFailed,

    /// Service is temporarily unavailable
    ServiceUnavailable,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationFailed | ErrorCode::InvalidInput | ErrorCode::MissingField => {
                StatusCode::BAD_REQUEST
            }

            ErrorCode::AgentNotFound
            | ErrorCode::SessionNotFound
            | ErrorCode::WorkflowNotFound => StatusCode::NOT_FOUND,

            ErrorCode::EntityAlreadyExists => StatusCode::CONFLICT,

            ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,

            ErrorCode::InternalError | ErrorCode::ExecutionFailed => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get a default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::ValidationFailed => "Request validation failed",
            ErrorCode::InvalidInput => "Invalid input data",
            ErrorCode::MissingField => "Required field is missing",
            ErrorCode::AgentNotFound => "Agent not found",
            ErrorCode::SessionNotFound => "Session not found",
            ErrorCode::WorkflowNotFound => "Workflow not found",
            ErrorCode::EntityAlreadyExists => "Entity already exists",
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::ExecutionFailed => "Agent execution failed",
            ErrorCode::ServiceUnavailable => "Service temporarily unavailable",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// Structured error response for API operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details (field errors, etc.)
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Create a new API error with the given code, using the default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self {
            code,
            message: code.default_message().to_string(),
            details: None,
        }
    }

    /// Add additional details to the error.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    // ========================================================================
    // Convenience constructors for common errors
    // ========================================================================

    /// Create a ValidationFailed error.
    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    /// Create an InvalidInput error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Create a MissingField error.
    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingField,
            format!("Required field '{}' is missing", field),
        )
    }

    /// Create an AgentNotFound error.
    pub fn agent_not_found(agent_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::AgentNotFound,
            format!("Agent {} not found", agent_id),
        )
    }

    /// Create a SessionNotFound error.
    pub fn session_not_found(session_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::SessionNotFound,
            format!("Session {} not found", session_id),
        )
    }

    /// Create a WorkflowNotFound error.
    pub fn workflow_not_found(workflow_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::WorkflowNotFound,
            format!("Workflow {} not found", workflow_id),
        )
    }

    /// Create an EntityAlreadyExists error.
    pub fn entity_already_exists(entity_type: &str, id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::EntityAlreadyExists,
            format!("{} with id {} already exists", entity_type, id),
        )
    }

    /// Create an InternalError.
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Create an ExecutionFailed error.
    pub fn execution_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ExecutionFailed, message)
    }

    /// Create a ServiceUnavailable error.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }
}

/// Implement IntoResponse for ApiError to enable automatic error handling
/// in Axum: handlers can return `Result<Json<T>, ApiError>` directly.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self);
        (status, body).into_response()
    }
}

// ============================================================================
// CONVERSIONS FROM CORE ERRORS
// ============================================================================

impl From<SwitchboardError> for ApiError {
    fn from(err: SwitchboardError) -> Self {
        match &err {
            SwitchboardError::NotFound(not_found) => match not_found {
                NotFoundError::AgentType(id) | NotFoundError::AgentInstance(id) => {
                    ApiError::agent_not_found(id)
                }
                NotFoundError::Workflow(id) => ApiError::workflow_not_found(id),
                NotFoundError::Session(id) => ApiError::session_not_found(id),
            },
            SwitchboardError::Config(config) => ApiError::invalid_input(config.to_string()),
            SwitchboardError::Execution(execution) => match execution {
                ExecutionError::NoActiveAgent { .. } => {
                    ApiError::invalid_input(execution.to_string())
                }
                _ => ApiError::execution_failed(execution.to_string()),
            },
            SwitchboardError::Instruction(instruction) => {
                ApiError::validation_failed(instruction.to_string())
            }
        }
    }
}

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use switchboard_core::ConfigError;

    #[test]
    fn test_status_code_mapping() {
        assert_eq!(
            ErrorCode::InvalidInput.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::SessionNotFound.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ErrorCode::InternalError.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ErrorCode::ServiceUnavailable.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_from_code_uses_default_message() {
        let err = ApiError::from_code(ErrorCode::SessionNotFound);
        assert_eq!(err.message, "Session not found");
    }

    #[test]
    fn test_core_error_conversions() {
        let not_found: ApiError = SwitchboardError::NotFound(NotFoundError::Workflow(
            "onboarding".to_string(),
        ))
        .into();
        assert_eq!(not_found.code, ErrorCode::WorkflowNotFound);
        assert!(not_found.message.contains("onboarding"));

        let config: ApiError = SwitchboardError::Config(ConfigError::MissingRequired {
            field: "agent_id".to_string(),
        })
        .into();
        assert_eq!(config.code, ErrorCode::InvalidInput);

        let execution: ApiError = SwitchboardError::Execution(ExecutionError::AgentFailed {
            agent_id: "triage".to_string(),
            reason: "timeout".to_string(),
        })
        .into();
        assert_eq!(execution.code, ErrorCode::ExecutionFailed);

        let no_agent: ApiError = SwitchboardError::Execution(ExecutionError::NoActiveAgent {
            session_id: "s1".to_string(),
        })
        .into();
        assert_eq!(no_agent.code, ErrorCode::InvalidInput);
    }

    #[test]
    fn test_error_serialization_shape() {
        let err = ApiError::missing_field("message");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "MISSING_FIELD");
        assert!(json["message"].as_str().unwrap().contains("message"));
        assert!(json.get("details").is_none());
    }
}
