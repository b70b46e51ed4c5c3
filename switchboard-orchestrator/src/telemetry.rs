//! Per-agent execution statistics.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Accumulated statistics for one agent type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AgentStats {
    pub executions: u64,
    pub successful: u64,
    pub failed: u64,
    /// Total wall-clock time across executions, in milliseconds.
    pub total_duration_ms: u64,
    /// Mean wall-clock time per execution, in milliseconds.
    pub avg_duration_ms: u64,
}

/// Point-in-time view of all agent statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TelemetrySnapshot {
    pub total_executions: u64,
    pub agent_stats: BTreeMap<String, AgentStats>,
}

/// Lock-free accumulator of execution telemetry.
#[derive(Default)]
pub struct TelemetryLog {
    stats: DashMap<String, AgentStats>,
}

impl TelemetryLog {
    pub fn new() -> Self {
        TelemetryLog::default()
    }

    /// Record one execution of an agent.
    pub fn record(&self, agent_id: &str, duration: Duration, success: bool) {
        let mut entry = self.stats.entry(agent_id.to_string()).or_default();
        entry.executions += 1;
        if success {
            entry.successful += 1;
        } else {
            entry.failed += 1;
        }
        entry.total_duration_ms += duration.as_millis() as u64;
        entry.avg_duration_ms = entry.total_duration_ms / entry.executions;
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        let agent_stats: BTreeMap<String, AgentStats> = self
            .stats
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        TelemetrySnapshot {
            total_executions: agent_stats.values().map(|s| s.executions).sum(),
            agent_stats,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
