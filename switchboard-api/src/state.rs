//! Shared Application State
//!
//! AppState wires the registry, session store, and orchestrator together
//! and is cloned into every route handler via Axum's State extractor.

use std::sync::Arc;
use switchboard_agents::{AgentRegistry, PredicateRegistry, SessionStore};
use switchboard_core::{SwitchboardConfig, Timestamp};
use switchboard_orchestrator::Orchestrator;

/// Shared state for all API routes.
#[derive(Clone)]
pub struct AppState {
    /// Agent type, instance, and workflow registry
    pub registry: Arc<AgentRegistry>,

    /// Conversational session store
    pub sessions: Arc<SessionStore>,

    /// Pipeline orchestrator
    pub orchestrator: Arc<Orchestrator>,

    /// Server start time, for health reporting
    pub start_time: Timestamp,
}

impl AppState {
    /// Build the full application state from a runtime config.
    ///
    /// Callers register agent types and predicates on the returned
    /// state's registry before serving traffic.
    pub fn new(config: SwitchboardConfig) -> Self {
        let predicates = Arc::new(PredicateRegistry::new());
        let registry = Arc::new(AgentRegistry::new(predicates));
        let sessions = Arc::new(SessionStore::new(Arc::clone(&registry), config));
        let orchestrator = Arc::new(Orchestrator::new(Arc::clone(&registry)));

        Self {
            registry,
            sessions,
            orchestrator,
            start_time: chrono::Utc::now(),
        }
    }
}
