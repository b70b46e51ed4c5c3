//! Session state machine: one active agent per conversation, with
//! trigger-driven and agent-requested handoffs between turns.
//!
//! Message flow for a turn: evaluate the active agent's handoff triggers
//! first; only when none fires does the active agent process the message.
//! An agent may still request a handoff in its reply, which is performed
//! after the reply is merged.

use crate::handoff::{HandoffDecision, HandoffEvaluator, HandoffManager};
use crate::registry::AgentRegistry;
use chrono::Utc;
use dashmap::DashMap;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use switchboard_core::{
    EvalContext, ExecutionError, HandoffAnnouncement, HandoffRecord, SessionMessage,
    SessionResponse, SessionSnapshot, SwitchboardConfig, SwitchboardResult, Timestamp,
};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// User-facing fallback when a handoff target greets without a reply.
const HANDOFF_GREETING: &str = "I'll help you with that.";
/// User-facing reply for the initial assignment of a fresh session.
const INITIAL_GREETING: &str = "Let me help you with that.";
/// User-safe reply when a turn fails internally.
const ERROR_REPLY: &str = "Sorry, there was an error processing your request.";

/// Mutable state of one conversation.
#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: String,
    pub active_agent_id: Option<String>,
    pub collected_data: BTreeMap<String, Value>,
    pub message_history: Vec<SessionMessage>,
    pub created_at: Timestamp,
    pub last_activity: Timestamp,
}

impl Session {
    fn new(session_id: String, active_agent_id: Option<String>) -> Self {
        let now = Utc::now();
        Session {
            session_id,
            active_agent_id,
            collected_data: BTreeMap::new(),
            message_history: Vec::new(),
            created_at: now,
            last_activity: now,
        }
    }

    fn touch(&mut self) {
        self.last_activity = Utc::now();
    }
}

/// Owns all live sessions and routes their turns.
pub struct SessionStore {
    sessions: DashMap<String, Arc<Mutex<Session>>>,
    registry: Arc<AgentRegistry>,
    evaluator: HandoffEvaluator,
    handoffs: Arc<HandoffManager>,
    config: SwitchboardConfig,
}

impl SessionStore {
    pub fn new(registry: Arc<AgentRegistry>, config: SwitchboardConfig) -> Self {
        let evaluator = HandoffEvaluator::new(Arc::clone(&registry));
        SessionStore {
            sessions: DashMap::new(),
            registry,
            evaluator,
            handoffs: Arc::new(HandoffManager::new()),
            config,
        }
    }

    pub fn handoffs(&self) -> &Arc<HandoffManager> {
        &self.handoffs
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Route one user message through the session's active agent.
    ///
    /// `extra` carries per-turn caller fields; an `intents` array of
    /// strings inside it feeds intent-based triggers.
    pub async fn handle_message(
        &self,
        session_id: &str,
        message: &str,
        extra: BTreeMap<String, Value>,
    ) -> SwitchboardResult<SessionResponse> {
        let session = self.get_or_create(session_id);
        let mut session = session.lock().await;

        let active_agent_id = match session.active_agent_id.clone() {
            Some(id) => id,
            None => {
                return Err(ExecutionError::NoActiveAgent {
                    session_id: session_id.to_string(),
                }
                .into())
            }
        };

        session.message_history.push(SessionMessage::user(message));
        session.touch();

        let eval = self.build_eval_context(&session, message, &extra);

        // Triggers run before the active agent sees the message.
        if let Some(decision) = self.evaluator.evaluate(&active_agent_id, &eval) {
            return Ok(self
                .perform_handoff(&mut session, decision, Some(message), &extra)
                .await);
        }

        let instance = match self.registry.resolve_agent(&active_agent_id) {
            Ok(instance) => instance,
            Err(e) => {
                error!(
                    session_id = %session_id,
                    agent_id = %active_agent_id,
                    error = %e,
                    "failed to resolve active agent"
                );
                return Ok(error_response(e));
            }
        };

        match instance.agent.process_message(message, &eval).await {
            Ok(reply) => {
                session.collected_data.extend(reply.data.clone());
                if let Some(text) = &reply.message {
                    session
                        .message_history
                        .push(SessionMessage::assistant(text));
                }
                session.touch();

                if let Some(target) = reply.handoff_to {
                    let reason = reply
                        .handoff_reason
                        .unwrap_or_else(|| "Agent requested handoff".to_string());
                    let decision = HandoffDecision {
                        target_agent_id: target,
                        reason,
                    };
                    return Ok(self
                        .perform_handoff(&mut session, decision, Some(message), &extra)
                        .await);
                }

                Ok(SessionResponse {
                    message: reply.message,
                    agent_type: Some(active_agent_id),
                    handoff: None,
                    ui_instruction: reply.ui_instruction,
                    data: reply.data,
                    done: reply.done,
                    progress: reply.progress,
                    error: None,
                })
            }
            Err(e) => {
                error!(
                    session_id = %session_id,
                    agent_id = %active_agent_id,
                    error = %e,
                    "agent failed to process message"
                );
                Ok(error_response(e))
            }
        }
    }

    /// Transfer the session to the decision's target agent and let it
    /// take over the turn.
    ///
    /// The target processes the triggering message immediately so the
    /// user gets a substantive reply from the new agent rather than a
    /// bare announcement; its failure degrades to a canned greeting.
    async fn perform_handoff(
        &self,
        session: &mut Session,
        decision: HandoffDecision,
        message: Option<&str>,
        extra: &BTreeMap<String, Value>,
    ) -> SessionResponse {
        let target = decision.target_agent_id;
        let reason = decision.reason;

        if !self.registry.is_registered(&target) {
            error!(
                session_id = %session.session_id,
                target = %target,
                "handoff target is not a registered agent type"
            );
            return error_response(
                ExecutionError::HandoffFailed {
                    session_id: session.session_id.clone(),
                    reason: format!("target agent {target} is not registered"),
                }
                .into(),
            );
        }

        // Initial assignment of a fresh session: no source, no record.
        let source = match session.active_agent_id.clone() {
            Some(source) if source != target => source,
            Some(_) => {
                warn!(
                    session_id = %session.session_id,
                    target = %target,
                    "ignoring handoff to the already-active agent"
                );
                return SessionResponse {
                    message: Some(HANDOFF_GREETING.to_string()),
                    agent_type: Some(target),
                    ..SessionResponse::default()
                };
            }
            None => {
                session.active_agent_id = Some(target.clone());
                session.touch();
                info!(
                    session_id = %session.session_id,
                    agent_id = %target,
                    "assigned initial agent"
                );
                return SessionResponse {
                    message: Some(INITIAL_GREETING.to_string()),
                    agent_type: Some(target.clone()),
                    handoff: Some(HandoffAnnouncement {
                        from: None,
                        to: target,
                        reason,
                    }),
                    ..SessionResponse::default()
                };
            }
        };

        // The audit snapshot is bounded to the most recent
        // `handoff_history_limit` turns; the session keeps the full
        // history.
        let history_start = session
            .message_history
            .len()
            .saturating_sub(self.config.handoff_history_limit);
        let record = HandoffRecord::new(&session.session_id, &source, &target, &reason)
            .with_history(session.message_history[history_start..].to_vec())
            .with_collected_data(session.collected_data.clone());
        self.handoffs.record(record.clone());

        session.active_agent_id = Some(target.clone());
        session.touch();
        info!(
            session_id = %session.session_id,
            from = %source,
            to = %target,
            reason = %reason,
            "performed handoff"
        );

        let announcement = HandoffAnnouncement {
            from: Some(source),
            to: target.clone(),
            reason,
        };

        let Some(message) = message else {
            return SessionResponse {
                message: Some(HANDOFF_GREETING.to_string()),
                agent_type: Some(target),
                handoff: Some(announcement),
                ..SessionResponse::default()
            };
        };

        let instance = match self.registry.resolve_agent(&target) {
            Ok(instance) => Some(instance),
            Err(e) => {
                error!(
                    session_id = %session.session_id,
                    agent_id = %target,
                    error = %e,
                    "failed to resolve handoff target"
                );
                None
            }
        };

        if let Some(instance) = instance {
            let mut eval = self.build_eval_context(session, message, extra);
            eval.handoff = Some(record);

            match instance.agent.process_message(message, &eval).await {
                Ok(reply) => {
                    session.collected_data.extend(reply.data.clone());
                    if let Some(text) = &reply.message {
                        session
                            .message_history
                            .push(SessionMessage::assistant(text));
                    }
                    session.touch();
                    return SessionResponse {
                        message: Some(
                            reply
                                .message
                                .unwrap_or_else(|| HANDOFF_GREETING.to_string()),
                        ),
                        agent_type: Some(target),
                        handoff: Some(announcement),
                        ui_instruction: reply.ui_instruction,
                        data: reply.data,
                        done: reply.done,
                        progress: reply.progress,
                        error: None,
                    };
                }
                Err(e) => {
                    error!(
                        session_id = %session.session_id,
                        agent_id = %target,
                        error = %e,
                        "handoff target failed to process message"
                    );
                }
            }
        }

        // The handoff itself succeeded; only the takeover reply failed.
        SessionResponse {
            message: Some(HANDOFF_GREETING.to_string()),
            agent_type: Some(target),
            handoff: Some(announcement),
            ..SessionResponse::default()
        }
    }

    /// Explicitly assign the session's active agent, creating the session
    /// if needed. Routed through the same path as trigger handoffs.
    pub async fn set_active_agent(
        &self,
        session_id: &str,
        agent_id: &str,
        reason: impl Into<String>,
    ) -> SwitchboardResult<SessionResponse> {
        if !self.registry.is_registered(agent_id) {
            return Err(switchboard_core::NotFoundError::AgentType(agent_id.to_string()).into());
        }

        let session = self.get_or_create(session_id);
        let mut session = session.lock().await;
        let decision = HandoffDecision {
            target_agent_id: agent_id.to_string(),
            reason: reason.into(),
        };
        Ok(self
            .perform_handoff(&mut session, decision, None, &BTreeMap::new())
            .await)
    }

    /// Read-only summary of a session, including its handoff history.
    pub async fn snapshot(&self, session_id: &str) -> Option<SessionSnapshot> {
        let session = self.sessions.get(session_id).map(|e| Arc::clone(&e))?;
        let session = session.lock().await;
        Some(SessionSnapshot {
            session_id: session.session_id.clone(),
            active_agent_id: session.active_agent_id.clone(),
            collected_data: session.collected_data.clone(),
            message_count: session.message_history.len(),
            handoff_history: self.handoffs.history(session_id),
            created_at: session.created_at,
            last_activity: session.last_activity,
        })
    }

    /// Delete a session and its handoff history.
    pub fn delete_session(&self, session_id: &str) -> bool {
        let removed = self.sessions.remove(session_id).is_some();
        if removed {
            self.handoffs.clear(session_id);
            info!(session_id = %session_id, "deleted session");
        }
        removed
    }

    /// Evict sessions idle past the configured timeout. Sessions whose
    /// lock is held are mid-turn and skipped. Returns how many were
    /// evicted.
    pub fn sweep_idle(&self) -> usize {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(self.config.session_idle_timeout)
                .unwrap_or_else(|_| chrono::Duration::seconds(1800));

        let expired: Vec<String> = self
            .sessions
            .iter()
            .filter_map(|entry| {
                let session = entry.value().try_lock().ok()?;
                (session.last_activity < cutoff).then(|| session.session_id.clone())
            })
            .collect();

        for session_id in &expired {
            self.sessions.remove(session_id);
            self.handoffs.clear(session_id);
        }
        if !expired.is_empty() {
            info!(evicted = expired.len(), "swept idle sessions");
        }
        expired.len()
    }

    fn get_or_create(&self, session_id: &str) -> Arc<Mutex<Session>> {
        Arc::clone(
            &self
                .sessions
                .entry(session_id.to_string())
                .or_insert_with(|| {
                    info!(session_id = %session_id, "creating session");
                    Arc::new(Mutex::new(Session::new(
                        session_id.to_string(),
                        self.config.default_agent_id.clone(),
                    )))
                }),
        )
    }

    fn build_eval_context(
        &self,
        session: &Session,
        message: &str,
        extra: &BTreeMap<String, Value>,
    ) -> EvalContext {
        let intents = extra
            .get("intents")
            .and_then(Value::as_array)
            .map(|values| {
                values
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        EvalContext {
            message: message.to_string(),
            session_id: session.session_id.clone(),
            collected_data: session.collected_data.clone(),
            message_history: session.message_history.clone(),
            intents,
            extra: extra.clone(),
            handoff: None,
        }
    }
}

fn error_response(error: switchboard_core::SwitchboardError) -> SessionResponse {
    SessionResponse {
        message: Some(ERROR_REPLY.to_string()),
        error: Some(error.to_string()),
        ..SessionResponse::default()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{Agent, AgentFactory};
    use crate::predicate::PredicateRegistry;
    use async_trait::async_trait;
    use serde_json::json;
    use switchboard_core::{
        AgentMetadata, AgentReply, AgentSpawnConfig, Context, HandoffTrigger, TriggerCondition,
    };

    /// Replies with a fixed prefix; optionally requests a handoff when the
    /// message contains "escalate".
    struct EchoAgent {
        agent_id: String,
        escalate_to: Option<String>,
        fail: bool,
    }

    #[async_trait]
    impl Agent for EchoAgent {
        fn agent_type(&self) -> &str {
            &self.agent_id
        }

        async fn can_handle(&self, _ctx: &Context) -> bool {
            true
        }

        async fn process(&self, _ctx: &mut Context) -> SwitchboardResult<()> {
            Ok(())
        }

        async fn process_message(
            &self,
            message: &str,
            eval: &EvalContext,
        ) -> SwitchboardResult<AgentReply> {
            if self.fail {
                return Err(ExecutionError::AgentFailed {
                    agent_id: self.agent_id.clone(),
                    reason: "synthetic failure".to_string(),
                }
                .into());
            }
            if let (Some(target), true) = (&self.escalate_to, message.contains("escalate")) {
                return Ok(AgentReply::default().with_handoff(target.clone(), "agent escalated"));
            }
            let mut reply = AgentReply::text(format!("{}: {}", self.agent_id, message));
            if eval.handoff.is_some() {
                reply = reply.with_data("took_over", json!(true));
            }
            Ok(reply)
        }
    }

    fn echo_factory(escalate_to: Option<&str>, fail: bool) -> AgentFactory {
        let escalate_to = escalate_to.map(str::to_string);
        Arc::new(move |config: &AgentSpawnConfig| {
            Ok(Arc::new(EchoAgent {
                agent_id: config.agent_id.clone(),
                escalate_to: escalate_to.clone(),
                fail,
            }) as Arc<dyn Agent>)
        })
    }

    fn store_with_agents() -> SessionStore {
        let registry = Arc::new(AgentRegistry::new(Arc::new(PredicateRegistry::new())));
        registry
            .register_agent_type(
                AgentMetadata::new("triage", "Triage", "1.0.0").with_trigger(HandoffTrigger::new(
                    "billing",
                    "billing keywords matched",
                    TriggerCondition::Keywords {
                        patterns: vec![r"\binvoice\b".to_string()],
                    },
                )),
                echo_factory(Some("support"), false),
            )
            .unwrap();
        registry
            .register_agent_type(
                AgentMetadata::new("billing", "Billing", "1.0.0"),
                echo_factory(None, false),
            )
            .unwrap();
        registry
            .register_agent_type(
                AgentMetadata::new("support", "Support", "1.0.0"),
                echo_factory(None, false),
            )
            .unwrap();

        let config = SwitchboardConfig::default().with_default_agent("triage");
        SessionStore::new(registry, config)
    }

    #[tokio::test]
    async fn test_plain_turn_with_default_agent() {
        let store = store_with_agents();
        let response = store
            .handle_message("s1", "hello there", BTreeMap::new())
            .await
            .unwrap();

        assert_eq!(response.agent_type.as_deref(), Some("triage"));
        assert_eq!(response.message.as_deref(), Some("triage: hello there"));
        assert!(response.handoff.is_none());

        let snapshot = store.snapshot("s1").await.unwrap();
        assert_eq!(snapshot.message_count, 2); // user + assistant
        assert_eq!(snapshot.active_agent_id.as_deref(), Some("triage"));
    }

    #[tokio::test]
    async fn test_trigger_handoff_runs_before_agent() {
        let store = store_with_agents();
        let response = store
            .handle_message("s1", "where is my invoice?", BTreeMap::new())
            .await
            .unwrap();

        // The trigger fired, so billing (not triage) answered the turn.
        let handoff = response.handoff.unwrap();
        assert_eq!(handoff.from.as_deref(), Some("triage"));
        assert_eq!(handoff.to, "billing");
        assert_eq!(
            response.message.as_deref(),
            Some("billing: where is my invoice?")
        );
        assert_eq!(response.agent_type.as_deref(), Some("billing"));

        // Audited, and the session now belongs to billing.
        let records = store.handoffs().history("s1");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source_agent_id, "triage");
        assert!(!records[0].message_history.is_empty());

        let snapshot = store.snapshot("s1").await.unwrap();
        assert_eq!(snapshot.active_agent_id.as_deref(), Some("billing"));
    }

    #[tokio::test]
    async fn test_handoff_snapshot_bounded_by_history_limit() {
        let registry = Arc::new(AgentRegistry::new(Arc::new(PredicateRegistry::new())));
        registry
            .register_agent_type(
                AgentMetadata::new("triage", "Triage", "1.0.0").with_trigger(HandoffTrigger::new(
                    "billing",
                    "billing keywords matched",
                    TriggerCondition::Keywords {
                        patterns: vec![r"\binvoice\b".to_string()],
                    },
                )),
                echo_factory(None, false),
            )
            .unwrap();
        registry
            .register_agent_type(
                AgentMetadata::new("billing", "Billing", "1.0.0"),
                echo_factory(None, false),
            )
            .unwrap();
        let mut config = SwitchboardConfig::default().with_default_agent("triage");
        config.handoff_history_limit = 3;
        let store = SessionStore::new(registry, config);

        for i in 0..5 {
            store
                .handle_message("s1", &format!("turn {i}"), BTreeMap::new())
                .await
                .unwrap();
        }
        store
            .handle_message("s1", "where is my invoice?", BTreeMap::new())
            .await
            .unwrap();

        // The audit snapshot carries only the bounded tail; the session
        // itself keeps every turn.
        let records = store.handoffs().history("s1");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message_history.len(), 3);
        let snapshot = store.snapshot("s1").await.unwrap();
        assert!(snapshot.message_count > 3);
    }

    #[tokio::test]
    async fn test_takeover_turn_sees_handoff_record() {
        let store = store_with_agents();
        let response = store
            .handle_message("s1", "invoice please", BTreeMap::new())
            .await
            .unwrap();
        // EchoAgent marks turns where eval.handoff was set.
        assert_eq!(response.data.get("took_over"), Some(&json!(true)));
    }

    #[tokio::test]
    async fn test_agent_requested_handoff() {
        let store = store_with_agents();
        let response = store
            .handle_message("s1", "please escalate this", BTreeMap::new())
            .await
            .unwrap();

        let handoff = response.handoff.unwrap();
        assert_eq!(handoff.to, "support");
        assert_eq!(handoff.reason, "agent escalated");
        assert_eq!(
            response.message.as_deref(),
            Some("support: please escalate this")
        );
    }

    #[tokio::test]
    async fn test_no_active_agent_errors() {
        let registry = Arc::new(AgentRegistry::new(Arc::new(PredicateRegistry::new())));
        let store = SessionStore::new(registry, SwitchboardConfig::default());

        let err = store
            .handle_message("s1", "hello", BTreeMap::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            switchboard_core::SwitchboardError::Execution(ExecutionError::NoActiveAgent { .. })
        ));
    }

    #[tokio::test]
    async fn test_failing_agent_degrades_to_error_reply() {
        let registry = Arc::new(AgentRegistry::new(Arc::new(PredicateRegistry::new())));
        registry
            .register_agent_type(
                AgentMetadata::new("flaky", "Flaky", "1.0.0"),
                echo_factory(None, true),
            )
            .unwrap();
        let store = SessionStore::new(
            registry,
            SwitchboardConfig::default().with_default_agent("flaky"),
        );

        let response = store
            .handle_message("s1", "hello", BTreeMap::new())
            .await
            .unwrap();
        assert_eq!(response.message.as_deref(), Some(ERROR_REPLY));
        assert!(response.error.unwrap().contains("synthetic failure"));
    }

    #[tokio::test]
    async fn test_handoff_to_unregistered_target_keeps_session() {
        let registry = Arc::new(AgentRegistry::new(Arc::new(PredicateRegistry::new())));
        registry
            .register_agent_type(
                AgentMetadata::new("triage", "Triage", "1.0.0").with_trigger(HandoffTrigger::new(
                    "ghost",
                    "routes to a missing type",
                    TriggerCondition::Keywords {
                        patterns: vec!["ghost".to_string()],
                    },
                )),
                echo_factory(None, false),
            )
            .unwrap();
        let store = SessionStore::new(
            registry,
            SwitchboardConfig::default().with_default_agent("triage"),
        );

        let response = store
            .handle_message("s1", "summon the ghost", BTreeMap::new())
            .await
            .unwrap();
        assert!(response.error.is_some());

        // The session still belongs to triage and keeps working.
        let snapshot = store.snapshot("s1").await.unwrap();
        assert_eq!(snapshot.active_agent_id.as_deref(), Some("triage"));
        let ok = store
            .handle_message("s1", "hello again", BTreeMap::new())
            .await
            .unwrap();
        assert_eq!(ok.message.as_deref(), Some("triage: hello again"));
    }

    #[tokio::test]
    async fn test_set_active_agent_records_handoff() {
        let store = store_with_agents();
        store
            .handle_message("s1", "hello", BTreeMap::new())
            .await
            .unwrap();

        let response = store
            .set_active_agent("s1", "support", "operator transfer")
            .await
            .unwrap();
        assert_eq!(response.message.as_deref(), Some(HANDOFF_GREETING));
        assert_eq!(response.handoff.unwrap().to, "support");
        assert_eq!(store.handoffs().last("s1").unwrap().reason, "operator transfer");
    }

    #[tokio::test]
    async fn test_set_active_agent_unknown_type() {
        let store = store_with_agents();
        let err = store
            .set_active_agent("s1", "ghost", "transfer")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            switchboard_core::SwitchboardError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_initial_assignment_greeting() {
        let registry = Arc::new(AgentRegistry::new(Arc::new(PredicateRegistry::new())));
        registry
            .register_agent_type(
                AgentMetadata::new("triage", "Triage", "1.0.0"),
                echo_factory(None, false),
            )
            .unwrap();
        // No default agent: the first assignment is the initial one.
        let store = SessionStore::new(registry, SwitchboardConfig::default());

        let response = store
            .set_active_agent("s1", "triage", "bootstrap")
            .await
            .unwrap();
        assert_eq!(response.message.as_deref(), Some(INITIAL_GREETING));
        assert!(response.handoff.unwrap().from.is_none());
        // Initial assignment is not an agent-to-agent transfer: no record.
        assert!(store.handoffs().history("s1").is_empty());
    }

    #[tokio::test]
    async fn test_delete_session_clears_handoffs() {
        let store = store_with_agents();
        store
            .handle_message("s1", "invoice please", BTreeMap::new())
            .await
            .unwrap();
        assert_eq!(store.handoffs().history("s1").len(), 1);

        assert!(store.delete_session("s1"));
        assert!(store.handoffs().history("s1").is_empty());
        assert!(store.snapshot("s1").await.is_none());
        assert!(!store.delete_session("s1"));
    }

    #[tokio::test]
    async fn test_sweep_idle_evicts_stale_sessions() {
        let registry = Arc::new(AgentRegistry::new(Arc::new(PredicateRegistry::new())));
        registry
            .register_agent_type(
                AgentMetadata::new("triage", "Triage", "1.0.0"),
                echo_factory(None, false),
            )
            .unwrap();
        let config = SwitchboardConfig::default().with_default_agent("triage");
        let store = SessionStore::new(registry, config);

        store
            .handle_message("stale", "hello", BTreeMap::new())
            .await
            .unwrap();
        store
            .handle_message("fresh", "hello", BTreeMap::new())
            .await
            .unwrap();

        // Backdate the stale session past the idle timeout.
        {
            let entry = store.sessions.get("stale").unwrap();
            let mut session = entry.value().try_lock().unwrap();
            session.last_activity = Utc::now() - chrono::Duration::hours(2);
        }

        assert_eq!(store.sweep_idle(), 1);
        assert!(store.snapshot("stale").await.is_none());
        assert!(store.snapshot("fresh").await.is_some());
    }

    #[tokio::test]
    async fn test_intents_flow_into_triggers() {
        let registry = Arc::new(AgentRegistry::new(Arc::new(PredicateRegistry::new())));
        registry
            .register_agent_type(
                AgentMetadata::new("triage", "Triage", "1.0.0").with_trigger(HandoffTrigger::new(
                    "billing",
                    "refund intent",
                    TriggerCondition::Intents {
                        names: vec!["refund_request".to_string()],
                    },
                )),
                echo_factory(None, false),
            )
            .unwrap();
        registry
            .register_agent_type(
                AgentMetadata::new("billing", "Billing", "1.0.0"),
                echo_factory(None, false),
            )
            .unwrap();
        let store = SessionStore::new(
            registry,
            SwitchboardConfig::default().with_default_agent("triage"),
        );

        let extra = BTreeMap::from([("intents".to_string(), json!(["refund_request"]))]);
        let response = store
            .handle_message("s1", "about my order", extra)
            .await
            .unwrap();
        assert_eq!(response.handoff.unwrap().to, "billing");
    }
}
