//! Handoff trigger evaluation and the per-session handoff audit log.

use crate::predicate::PredicateRegistry;
use crate::registry::AgentRegistry;
use dashmap::DashMap;
use regex::RegexBuilder;
use std::cmp::Reverse;
use std::sync::Arc;
use switchboard_core::{EvalContext, HandoffRecord, TriggerCondition};
use tracing::{debug, info, warn};

/// Outcome of trigger evaluation: where to route and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoffDecision {
    pub target_agent_id: String,
    pub reason: String,
}

/// Evaluates an agent's handoff triggers against the current turn.
pub struct HandoffEvaluator {
    registry: Arc<AgentRegistry>,
    predicates: Arc<PredicateRegistry>,
}

impl HandoffEvaluator {
    pub fn new(registry: Arc<AgentRegistry>) -> Self {
        let predicates = Arc::clone(registry.predicates());
        HandoffEvaluator {
            registry,
            predicates,
        }
    }

    /// Evaluate the current agent's triggers, highest priority first.
    ///
    /// The first matching trigger wins; ties on priority resolve in the
    /// order the triggers were declared. Returns `None` when nothing
    /// matched or the agent type is unknown.
    pub fn evaluate(&self, current_agent_id: &str, eval: &EvalContext) -> Option<HandoffDecision> {
        let metadata = match self.registry.get_agent_type(current_agent_id) {
            Some(m) => m,
            None => {
                warn!(agent_id = %current_agent_id, "evaluating triggers for unknown agent type");
                return None;
            }
        };

        let mut triggers = metadata.handoff_triggers;
        // Stable sort keeps declaration order within a priority tier.
        triggers.sort_by_key(|t| Reverse(t.priority));

        for trigger in &triggers {
            if self.condition_matches(current_agent_id, &trigger.condition, eval) {
                info!(
                    from = %current_agent_id,
                    to = %trigger.target_agent_id,
                    priority = trigger.priority,
                    reason = %trigger.description,
                    "handoff trigger matched"
                );
                return Some(HandoffDecision {
                    target_agent_id: trigger.target_agent_id.clone(),
                    reason: trigger.description.clone(),
                });
            }
        }
        None
    }

    /// A failing condition never aborts the turn: broken predicates and
    /// patterns are logged and treated as non-matches.
    fn condition_matches(
        &self,
        agent_id: &str,
        condition: &TriggerCondition,
        eval: &EvalContext,
    ) -> bool {
        match condition {
            TriggerCondition::Predicate { name } => match self.predicates.get(name) {
                Some(predicate) => predicate(eval),
                None => {
                    // Predicates are resolved at registration; reaching this
                    // means one was dropped afterwards.
                    warn!(agent_id = %agent_id, predicate = %name, "predicate vanished after registration");
                    false
                }
            },
            TriggerCondition::Keywords { patterns } => patterns.iter().any(|pattern| {
                match RegexBuilder::new(pattern).case_insensitive(true).build() {
                    Ok(re) => re.is_match(&eval.message),
                    Err(e) => {
                        warn!(agent_id = %agent_id, pattern = %pattern, error = %e, "keyword pattern failed to compile");
                        false
                    }
                }
            }),
            TriggerCondition::Intents { names } => names.iter().any(|name| eval.has_intent(name)),
        }
    }
}

/// Append-only audit log of handoffs, keyed by session.
#[derive(Default)]
pub struct HandoffManager {
    history: DashMap<String, Vec<HandoffRecord>>,
}

impl HandoffManager {
    pub fn new() -> Self {
        HandoffManager::default()
    }

    /// Record a performed handoff.
    pub fn record(&self, record: HandoffRecord) {
        debug!(
            session_id = %record.session_id,
            from = %record.source_agent_id,
            to = %record.target_agent_id,
            "recording handoff"
        );
        self.history
            .entry(record.session_id.clone())
            .or_default()
            .push(record);
    }

    /// Full handoff history for a session, oldest first.
    pub fn history(&self, session_id: &str) -> Vec<HandoffRecord> {
        self.history
            .get(session_id)
            .map(|entry| entry.clone())
            .unwrap_or_default()
    }

    /// Most recent handoff for a session.
    pub fn last(&self, session_id: &str) -> Option<HandoffRecord> {
        self.history
            .get(session_id)
            .and_then(|entry| entry.last().cloned())
    }

    /// Drop a session's history, e.g. when the session is deleted.
    pub fn clear(&self, session_id: &str) {
        self.history.remove(session_id);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{Agent, AgentFactory};
    use async_trait::async_trait;
    use switchboard_core::{
        AgentMetadata, AgentSpawnConfig, Context, HandoffTrigger, SwitchboardResult,
    };

    struct InertAgent;

    #[async_trait]
    impl Agent for InertAgent {
        fn agent_type(&self) -> &str {
            "inert"
        }

        async fn can_handle(&self, _ctx: &Context) -> bool {
            true
        }

        async fn process(&self, _ctx: &mut Context) -> SwitchboardResult<()> {
            Ok(())
        }
    }

    fn inert_factory() -> AgentFactory {
        Arc::new(|_config: &AgentSpawnConfig| Ok(Arc::new(InertAgent) as Arc<dyn Agent>))
    }

    fn build_registry() -> Arc<AgentRegistry> {
        let predicates = Arc::new(PredicateRegistry::new());
        predicates.register("wants_human", |ctx: &EvalContext| {
            ctx.message.to_lowercase().contains("human")
        });
        Arc::new(AgentRegistry::new(predicates))
    }

    #[test]
    fn test_keyword_trigger_case_insensitive() {
        let registry = build_registry();
        registry
            .register_agent_type(
                AgentMetadata::new("triage", "Triage", "1.0.0").with_trigger(HandoffTrigger::new(
                    "billing",
                    "Billing keywords matched",
                    TriggerCondition::Keywords {
                        patterns: vec![r"\binvoice\b".to_string()],
                    },
                )),
                inert_factory(),
            )
            .unwrap();

        let evaluator = HandoffEvaluator::new(Arc::clone(&registry));
        let hit = evaluator.evaluate("triage", &EvalContext::new("Where is my INVOICE?", "s"));
        assert_eq!(hit.unwrap().target_agent_id, "billing");

        let miss = evaluator.evaluate("triage", &EvalContext::new("invoices are plural", "s"));
        assert!(miss.is_none()); // word boundary respected
    }

    #[test]
    fn test_priority_order_and_declaration_tiebreak() {
        let registry = build_registry();
        registry
            .register_agent_type(
                AgentMetadata::new("triage", "Triage", "1.0.0")
                    .with_trigger(
                        HandoffTrigger::new(
                            "low",
                            "low priority catch-all",
                            TriggerCondition::Keywords {
                                patterns: vec!["help".to_string()],
                            },
                        )
                        .with_priority(1),
                    )
                    .with_trigger(
                        HandoffTrigger::new(
                            "first_tie",
                            "declared first in tier",
                            TriggerCondition::Keywords {
                                patterns: vec!["help".to_string()],
                            },
                        )
                        .with_priority(5),
                    )
                    .with_trigger(
                        HandoffTrigger::new(
                            "second_tie",
                            "declared second in tier",
                            TriggerCondition::Keywords {
                                patterns: vec!["help".to_string()],
                            },
                        )
                        .with_priority(5),
                    ),
                inert_factory(),
            )
            .unwrap();

        let evaluator = HandoffEvaluator::new(registry);
        let decision = evaluator
            .evaluate("triage", &EvalContext::new("help me", "s"))
            .unwrap();
        // Highest priority tier wins; within the tier, declaration order.
        assert_eq!(decision.target_agent_id, "first_tie");
    }

    #[test]
    fn test_predicate_trigger() {
        let registry = build_registry();
        registry
            .register_agent_type(
                AgentMetadata::new("triage", "Triage", "1.0.0").with_trigger(HandoffTrigger::new(
                    "support",
                    "user asked for a human",
                    TriggerCondition::Predicate {
                        name: "wants_human".to_string(),
                    },
                )),
                inert_factory(),
            )
            .unwrap();

        let evaluator = HandoffEvaluator::new(registry);
        assert!(evaluator
            .evaluate("triage", &EvalContext::new("get me a HUMAN", "s"))
            .is_some());
        assert!(evaluator
            .evaluate("triage", &EvalContext::new("all good thanks", "s"))
            .is_none());
    }

    #[test]
    fn test_intent_trigger() {
        let registry = build_registry();
        registry
            .register_agent_type(
                AgentMetadata::new("triage", "Triage", "1.0.0").with_trigger(HandoffTrigger::new(
                    "refunds",
                    "refund intent detected",
                    TriggerCondition::Intents {
                        names: vec!["refund_request".to_string()],
                    },
                )),
                inert_factory(),
            )
            .unwrap();

        let evaluator = HandoffEvaluator::new(registry);
        let eval = EvalContext::new("about my last order", "s")
            .with_intents(vec!["refund_request".to_string()]);
        assert!(evaluator.evaluate("triage", &eval).is_some());

        let no_intent = EvalContext::new("about my last order", "s");
        assert!(evaluator.evaluate("triage", &no_intent).is_none());
    }

    #[test]
    fn test_unknown_agent_type_yields_none() {
        let registry = build_registry();
        let evaluator = HandoffEvaluator::new(registry);
        assert!(evaluator
            .evaluate("ghost", &EvalContext::new("hello", "s"))
            .is_none());
    }

    #[test]
    fn test_manager_history_per_session() {
        let manager = HandoffManager::new();
        manager.record(HandoffRecord::new("s1", "triage", "billing", "invoices"));
        manager.record(HandoffRecord::new("s1", "billing", "refunds", "refund"));
        manager.record(HandoffRecord::new("s2", "triage", "support", "human"));

        let s1 = manager.history("s1");
        assert_eq!(s1.len(), 2);
        assert_eq!(s1[0].target_agent_id, "billing");
        assert_eq!(manager.last("s1").unwrap().target_agent_id, "refunds");
        assert_eq!(manager.history("s2").len(), 1);
        assert!(manager.history("s3").is_empty());

        manager.clear("s1");
        assert!(manager.history("s1").is_empty());
        assert_eq!(manager.history("s2").len(), 1);
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use crate::agent::{Agent, AgentFactory};
    use async_trait::async_trait;
    use proptest::prelude::*;
    use switchboard_core::{
        AgentMetadata, AgentSpawnConfig, Context, HandoffTrigger, SwitchboardResult,
    };

    struct InertAgent;

    #[async_trait]
    impl Agent for InertAgent {
        fn agent_type(&self) -> &str {
            "inert"
        }

        async fn can_handle(&self, _ctx: &Context) -> bool {
            true
        }

        async fn process(&self, _ctx: &mut Context) -> SwitchboardResult<()> {
            Ok(())
        }
    }

    fn inert_factory() -> AgentFactory {
        Arc::new(|_config: &AgentSpawnConfig| Ok(Arc::new(InertAgent) as Arc<dyn Agent>))
    }

    proptest! {
        /// Among always-matching triggers, the winner is always one with
        /// the maximum priority.
        #[test]
        fn highest_priority_always_wins(priorities in proptest::collection::vec(0i32..100, 1..10)) {
            let registry = Arc::new(AgentRegistry::new(Arc::new(PredicateRegistry::new())));
            let mut metadata = AgentMetadata::new("triage", "Triage", "1.0.0");
            for (i, priority) in priorities.iter().enumerate() {
                metadata = metadata.with_trigger(
                    HandoffTrigger::new(
                        format!("target_{i}"),
                        format!("trigger {i}"),
                        TriggerCondition::Keywords { patterns: vec![".*".to_string()] },
                    )
                    .with_priority(*priority),
                );
            }
            registry.register_agent_type(metadata, inert_factory()).unwrap();

            let evaluator = HandoffEvaluator::new(registry);
            let decision = evaluator
                .evaluate("triage", &EvalContext::new("anything", "s"))
                .unwrap();

            let max = priorities.iter().copied().max().unwrap();
            let winner: usize = decision
                .target_agent_id
                .strip_prefix("target_")
                .unwrap()
                .parse()
                .unwrap();
            prop_assert_eq!(priorities[winner], max);
            // Within the max tier, the earliest declared trigger wins.
            let first_max = priorities.iter().position(|p| *p == max).unwrap();
            prop_assert_eq!(winner, first_max);
        }
    }
}
