//! Configuration types

use crate::error::{ConfigError, SwitchboardResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Runtime configuration for the session and orchestration layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SwitchboardConfig {
    /// Agent type assigned to fresh sessions. When `None`, the first
    /// message of a session must be routed by a handoff trigger or an
    /// explicit assignment.
    pub default_agent_id: Option<String>,
    /// Sessions idle longer than this are eligible for eviction.
    #[cfg_attr(feature = "openapi", schema(value_type = u64))]
    pub session_idle_timeout: Duration,
    /// How often the background sweep scans for idle sessions.
    #[cfg_attr(feature = "openapi", schema(value_type = u64))]
    pub sweep_interval: Duration,
    /// Most recent messages carried in a handoff's history snapshot.
    pub handoff_history_limit: usize,
}

impl Default for SwitchboardConfig {
    fn default() -> Self {
        SwitchboardConfig {
            default_agent_id: None,
            session_idle_timeout: Duration::from_secs(1800),
            sweep_interval: Duration::from_secs(60),
            handoff_history_limit: 50,
        }
    }
}

impl SwitchboardConfig {
    /// Create from environment variables with fallback to defaults.
    ///
    /// Environment variables:
    /// - `SWITCHBOARD_DEFAULT_AGENT`: Agent type for fresh sessions
    /// - `SWITCHBOARD_SESSION_IDLE_SECS`: Idle timeout in seconds (default: 1800)
    /// - `SWITCHBOARD_SWEEP_INTERVAL_SECS`: Sweep interval in seconds (default: 60)
    /// - `SWITCHBOARD_HANDOFF_HISTORY_LIMIT`: History snapshot size (default: 50)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        SwitchboardConfig {
            default_agent_id: std::env::var("SWITCHBOARD_DEFAULT_AGENT")
                .ok()
                .filter(|s| !s.is_empty()),
            session_idle_timeout: std::env::var("SWITCHBOARD_SESSION_IDLE_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.session_idle_timeout),
            sweep_interval: std::env::var("SWITCHBOARD_SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.sweep_interval),
            handoff_history_limit: std::env::var("SWITCHBOARD_HANDOFF_HISTORY_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.handoff_history_limit),
        }
    }

    pub fn with_default_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.default_agent_id = Some(agent_id.into());
        self
    }

    /// Validate the configuration.
    ///
    /// Validates:
    /// - session_idle_timeout is positive
    /// - sweep_interval is positive
    /// - handoff_history_limit > 0
    pub fn validate(&self) -> SwitchboardResult<()> {
        if self.session_idle_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "session_idle_timeout".to_string(),
                value: format!("{:?}", self.session_idle_timeout),
                reason: "session_idle_timeout must be positive".to_string(),
            }
            .into());
        }

        if self.sweep_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "sweep_interval".to_string(),
                value: format!("{:?}", self.sweep_interval),
                reason: "sweep_interval must be positive".to_string(),
            }
            .into());
        }

        if self.handoff_history_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "handoff_history_limit".to_string(),
                value: "0".to_string(),
                reason: "handoff_history_limit must be greater than 0".to_string(),
            }
            .into());
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
    fn test_default_config_is_valid() {
        let config = SwitchboardConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.default_agent_id.is_none());
    }

    #[test]
    fn test_zero_idle_timeout_rejected() {
        let config = SwitchboardConfig {
            session_idle_timeout: Duration::ZERO,
            ..SwitchboardConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(format!("{}", err).contains("session_idle_timeout"));
    }

    #[test]
    fn test_zero_history_limit_rejected() {
        let config = SwitchboardConfig {
            handoff_history_limit: 0,
            ..SwitchboardConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_with_default_agent() {
        let config = SwitchboardConfig::default().with_default_agent("triage");
        assert_eq!(config.default_agent_id.as_deref(), Some("triage"));
    }
}
