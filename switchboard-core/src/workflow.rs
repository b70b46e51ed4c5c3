//! Declarative multi-step workflow definitions.

use crate::Timestamp;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// One step of a workflow: a set of agents run sequentially or in
/// parallel over the shared context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct WorkflowStep {
    pub id: String,
    /// Agent type ids executed in this step, in declared order.
    pub agents: Vec<String>,
    /// Run the step's agents concurrently over forked contexts.
    #[serde(default)]
    pub parallel: bool,
    /// Stop the workflow after this step completes.
    #[serde(default)]
    pub terminal: bool,
}

impl WorkflowStep {
    pub fn new(id: impl Into<String>, agents: Vec<String>) -> Self {
        WorkflowStep {
            id: id.into(),
            agents,
            parallel: false,
            terminal: false,
        }
    }

    pub fn parallel(mut self) -> Self {
        self.parallel = true;
        self
    }

    pub fn terminal(mut self) -> Self {
        self.terminal = true;
        self
    }
}

/// A named, ordered sequence of workflow steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Workflow {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub steps: Vec<WorkflowStep>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

impl Workflow {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Workflow {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            steps: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_step(mut self, step: WorkflowStep) -> Self {
        self.steps.push(step);
        self
    }

    /// All agent ids referenced anywhere in the workflow.
    pub fn referenced_agents(&self) -> Vec<&str> {
        self.steps
            .iter()
            .flat_map(|s| s.agents.iter().map(String::as_str))
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workflow_builder() {
        let workflow = Workflow::new("research_pipeline", "Research Pipeline")
            .with_description("Gather, reason, respond")
            .with_step(
                WorkflowStep::new(
                    "gather",
                    vec!["web_search".to_string(), "kb_lookup".to_string()],
                )
                .parallel(),
            )
            .with_step(WorkflowStep::new("respond", vec!["responder".to_string()]));

        assert_eq!(workflow.steps.len(), 2);
        assert!(workflow.steps[0].parallel);
        assert!(!workflow.steps[0].terminal);
        assert!(!workflow.steps[1].parallel);
    }

    #[test]
    fn test_referenced_agents_flattens_steps() {
        let workflow = Workflow::new("w", "W")
            .with_step(WorkflowStep::new("a", vec!["x".to_string(), "y".to_string()]))
            .with_step(WorkflowStep::new("b", vec!["z".to_string()]).terminal());

        assert_eq!(workflow.referenced_agents(), vec!["x", "y", "z"]);
        assert!(workflow.steps[1].terminal);
    }
}
