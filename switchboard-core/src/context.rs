//! Shared execution context threaded through agent pipelines.
//!
//! A `Context` carries the user query plus everything agents accumulate
//! while working on it: per-agent results, citations, errors, and a memory
//! log. Parallel execution forks the context per branch; the orchestrator
//! merges branches back in declared agent order.

use crate::{new_conversation_id, Timestamp};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// ============================================================================
// SUPPORTING RECORDS
// ============================================================================

/// A source citation attached to the context.
///
/// Citation ids are 1-indexed and dense: after any sequence of additions
/// and merges, the ids are exactly `1..=citations.len()` in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Citation {
    pub id: usize,
    pub source: String,
    pub content: String,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub metadata: BTreeMap<String, Value>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

/// A non-fatal error recorded by an agent while processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ContextError {
    pub agent_id: String,
    pub message: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub timestamp: Timestamp,
}

/// One entry in the context's append-only memory log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MemoryEntry {
    pub agent_id: String,
    /// Caller-chosen kind label ("observation", "plan", "tool_call", ...).
    pub kind: String,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub content: Value,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub timestamp: Timestamp,
}

// ============================================================================
// CONTEXT
// ============================================================================

/// Mutable state shared by agents working on one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Context {
    pub conversation_id: String,
    pub query: String,
    /// Cross-cutting flags and settings (e.g. `terminate_workflow`).
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub metadata: BTreeMap<String, Value>,
    /// Results keyed by agent-chosen names; parallel merges prefix keys
    /// with the producing agent id.
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub results: BTreeMap<String, Value>,
    #[serde(default)]
    pub citations: Vec<Citation>,
    #[serde(default)]
    pub errors: Vec<ContextError>,
    #[serde(default)]
    pub memory: Vec<MemoryEntry>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

impl Context {
    /// Create a context for a query with a fresh conversation id.
    pub fn new(query: impl Into<String>) -> Self {
        let now = Utc::now();
        Context {
            conversation_id: new_conversation_id(),
            query: query.into(),
            metadata: BTreeMap::new(),
            results: BTreeMap::new(),
            citations: Vec::new(),
            errors: Vec::new(),
            memory: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_conversation_id(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = conversation_id.into();
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Store a named result, overwriting any previous value for the key.
    pub fn set_result(&mut self, key: impl Into<String>, value: Value) {
        self.results.insert(key.into(), value);
        self.touch();
    }

    pub fn get_result(&self, key: &str) -> Option<&Value> {
        self.results.get(key)
    }

    /// Attach a citation and return its 1-indexed id.
    pub fn add_citation(
        &mut self,
        source: impl Into<String>,
        content: impl Into<String>,
        metadata: BTreeMap<String, Value>,
    ) -> usize {
        let id = self.citations.len() + 1;
        self.citations.push(Citation {
            id,
            source: source.into(),
            content: content.into(),
            metadata,
            created_at: Utc::now(),
        });
        self.touch();
        id
    }

    /// Adopt a citation produced on another context branch, re-issuing its
    /// id so the dense `1..=n` numbering holds after a merge.
    pub fn adopt_citation(&mut self, mut citation: Citation) -> usize {
        let id = self.citations.len() + 1;
        citation.id = id;
        self.citations.push(citation);
        self.touch();
        id
    }

    /// Record a non-fatal agent error.
    pub fn add_error(&mut self, agent_id: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ContextError {
            agent_id: agent_id.into(),
            message: message.into(),
            timestamp: Utc::now(),
        });
        self.touch();
    }

    /// Append an entry to the memory log.
    pub fn record_memory(
        &mut self,
        agent_id: impl Into<String>,
        kind: impl Into<String>,
        content: Value,
    ) {
        self.memory.push(MemoryEntry {
            agent_id: agent_id.into(),
            kind: kind.into(),
            content,
            timestamp: Utc::now(),
        });
        self.touch();
    }

    /// Create an independent branch for parallel execution.
    ///
    /// The branch shares the conversation id and query, clones metadata and
    /// the memory log, and starts with empty results, citations, and errors
    /// so that merging never double-counts pre-existing state.
    pub fn fork(&self) -> Context {
        let now = Utc::now();
        Context {
            conversation_id: self.conversation_id.clone(),
            query: self.query.clone(),
            metadata: self.metadata.clone(),
            results: BTreeMap::new(),
            citations: Vec::new(),
            errors: Vec::new(),
            memory: self.memory.clone(),
            created_at: self.created_at,
            updated_at: now,
        }
    }

    /// Whether any agent recorded an error on this context.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
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
    fn test_new_context_has_fresh_conversation_id() {
        let a = Context::new("find my invoice");
        let b = Context::new("find my invoice");
        assert_ne!(a.conversation_id, b.conversation_id);
        assert_eq!(a.query, "find my invoice");
        assert!(a.results.is_empty());
    }

    #[test]
    fn test_citation_ids_are_one_indexed_and_dense() {
        let mut ctx = Context::new("q");
        let first = ctx.add_citation("kb://article/1", "excerpt one", BTreeMap::new());
        let second = ctx.add_citation("kb://article/2", "excerpt two", BTreeMap::new());
        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(ctx.citations[0].id, 1);
        assert_eq!(ctx.citations[1].id, 2);
    }

    #[test]
    fn test_adopt_citation_reissues_id() {
        let mut ctx = Context::new("q");
        ctx.add_citation("kb://a", "a", BTreeMap::new());

        let mut branch = ctx.fork();
        let branch_id = branch.add_citation("kb://b", "b", BTreeMap::new());
        assert_eq!(branch_id, 1); // branch numbering starts fresh

        let adopted = ctx.adopt_citation(branch.citations[0].clone());
        assert_eq!(adopted, 2);
        assert_eq!(ctx.citations[1].source, "kb://b");
    }

    #[test]
    fn test_fork_shares_history_but_not_outputs() {
        let mut ctx = Context::new("q");
        ctx.set_result("summary", json!("partial"));
        ctx.record_memory("triage", "observation", json!("user is asking about billing"));
        ctx.add_error("triage", "transient lookup failure");

        let branch = ctx.fork();
        assert_eq!(branch.conversation_id, ctx.conversation_id);
        assert_eq!(branch.memory.len(), 1);
        assert!(branch.results.is_empty());
        assert!(branch.citations.is_empty());
        assert!(branch.errors.is_empty());
    }

    #[test]
    fn test_set_result_overwrites() {
        let mut ctx = Context::new("q");
        ctx.set_result("answer", json!(1));
        ctx.set_result("answer", json!(2));
        assert_eq!(ctx.get_result("answer"), Some(&json!(2)));
    }

    #[test]
    fn test_has_errors() {
        let mut ctx = Context::new("q");
        assert!(!ctx.has_errors());
        ctx.add_error("triage", "boom");
        assert!(ctx.has_errors());
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Interleaving additions and adoptions keeps citation ids dense.
        #[test]
        fn citation_ids_stay_dense(ops in proptest::collection::vec(any::<bool>(), 1..40)) {
            let mut ctx = Context::new("q");
            let mut donor = Context::new("q");
            donor.add_citation("kb://donor", "seed", BTreeMap::new());

            for (i, adopt) in ops.iter().enumerate() {
                if *adopt {
                    ctx.adopt_citation(donor.citations[0].clone());
                } else {
                    ctx.add_citation(format!("kb://{i}"), "text", BTreeMap::new());
                }
            }

            for (idx, citation) in ctx.citations.iter().enumerate() {
                prop_assert_eq!(citation.id, idx + 1);
            }
        }

        /// Memory entries are append-only: earlier entries never change.
        #[test]
        fn memory_log_append_only(kinds in proptest::collection::vec("[a-z]{1,8}", 1..20)) {
            let mut ctx = Context::new("q");
            let mut seen: Vec<String> = Vec::new();
            for kind in &kinds {
                ctx.record_memory("agent", kind.clone(), serde_json::json!(null));
                seen.push(kind.clone());
                let logged: Vec<_> = ctx.memory.iter().map(|m| m.kind.clone()).collect();
                prop_assert_eq!(&logged, &seen);
            }
        }
    }
}
