//! Named handoff predicates.
//!
//! Trigger conditions of kind `Predicate` reference predicates by name;
//! the registry resolves those names at agent registration time, so a
//! typo fails registration instead of silently never firing.

use dashmap::DashMap;
use std::sync::Arc;
use switchboard_core::EvalContext;
use tracing::warn;

/// A handoff condition evaluated against the current turn.
pub type HandoffPredicate = Arc<dyn Fn(&EvalContext) -> bool + Send + Sync>;

/// Registry of named predicates shared by all agent types.
#[derive(Default)]
pub struct PredicateRegistry {
    predicates: DashMap<String, HandoffPredicate>,
}

impl PredicateRegistry {
    pub fn new() -> Self {
        PredicateRegistry::default()
    }

    /// Register a predicate under a name, replacing any previous one.
    pub fn register<F>(&self, name: impl Into<String>, predicate: F)
    where
        F: Fn(&EvalContext) -> bool + Send + Sync + 'static,
    {
        let name = name.into();
        if self.predicates.insert(name.clone(), Arc::new(predicate)).is_some() {
            warn!(predicate = %name, "replacing existing handoff predicate");
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.predicates.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<HandoffPredicate> {
        self.predicates.get(name).map(|entry| Arc::clone(&entry))
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_evaluate() {
        let registry = PredicateRegistry::new();
        registry.register("mentions_refund", |ctx: &EvalContext| {
            ctx.message.to_lowercase().contains("refund")
        });

        assert!(registry.contains("mentions_refund"));
        let predicate = registry.get("mentions_refund").unwrap();
        assert!(predicate(&EvalContext::new("I want a REFUND", "s")));
        assert!(!predicate(&EvalContext::new("all good", "s")));
    }

    #[test]
    fn test_missing_predicate() {
        let registry = PredicateRegistry::new();
        assert!(!registry.contains("nope"));
        assert!(registry.get("nope").is_none());
    }

    #[test]
    fn test_reregistration_replaces() {
        let registry = PredicateRegistry::new();
        registry.register("always", |_: &EvalContext| true);
        registry.register("always", |_: &EvalContext| false);
        assert_eq!(registry.len(), 1);

        let predicate = registry.get("always").unwrap();
        assert!(!predicate(&EvalContext::default()));
    }
}
