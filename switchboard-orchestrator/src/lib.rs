//! Switchboard Orchestrator - Multi-Agent Execution
//!
//! Runs registered agents over a shared `Context` under several
//! strategies: single agent, sequential and parallel groups, declared
//! workflows, and dynamic role-ordered pipelines. Parallel groups fork
//! the context per branch and merge results deterministically in the
//! declared agent order, regardless of completion order.

pub mod telemetry;

use dashmap::DashMap;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use switchboard_agents::{AgentInstance, AgentRegistry};
use switchboard_core::{ConfigError, Context, SwitchboardResult, Timestamp};
use tracing::{debug, error, info, warn};

pub use telemetry::{AgentStats, TelemetryLog, TelemetrySnapshot};

/// Context metadata key an agent sets to stop a running workflow.
pub const TERMINATE_WORKFLOW_KEY: &str = "terminate_workflow";
/// Context metadata key an agent sets to stop a dynamic pipeline.
pub const TERMINATE_ORCHESTRATION_KEY: &str = "terminate_orchestration";

// ============================================================================
// STRATEGIES
// ============================================================================

/// Available execution strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    SingleAgent,
    Sequential,
    Parallel,
    Workflow,
    Dynamic,
}

impl FromStr for Strategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" | "single_agent" => Ok(Strategy::SingleAgent),
            "sequential" => Ok(Strategy::Sequential),
            "parallel" => Ok(Strategy::Parallel),
            "workflow" => Ok(Strategy::Workflow),
            "dynamic" => Ok(Strategy::Dynamic),
            other => Err(ConfigError::UnknownStrategy {
                name: other.to_string(),
            }),
        }
    }
}

/// Arguments for `execute_strategy`; which fields are required depends
/// on the strategy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StrategyArgs {
    pub agent_id: Option<String>,
    #[serde(default)]
    pub agent_ids: Vec<String>,
    pub workflow_id: Option<String>,
}

/// Progress of a workflow run, keyed by conversation id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct WorkflowProgress {
    pub workflow_id: String,
    pub steps_completed: usize,
    pub steps_total: usize,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub started_at: Timestamp,
}

// ============================================================================
// ORCHESTRATOR
// ============================================================================

/// Executes agents resolved through a shared registry.
pub struct Orchestrator {
    registry: Arc<AgentRegistry>,
    telemetry: TelemetryLog,
    active_runs: DashMap<String, WorkflowProgress>,
}

impl Orchestrator {
    pub fn new(registry: Arc<AgentRegistry>) -> Self {
        Orchestrator {
            registry,
            telemetry: TelemetryLog::new(),
            active_runs: DashMap::new(),
        }
    }

    /// Run one agent over the context.
    ///
    /// An unwilling or failing agent records an error on the context and
    /// execution continues; only the context tells the caller what went
    /// wrong. Failures additionally run the agent's `on_error` hook.
    pub async fn execute_single_agent(&self, instance: &AgentInstance, ctx: &mut Context) {
        let agent_id = instance.agent_id.as_str();

        if !instance.agent.can_handle(ctx).await {
            warn!(agent_id = %agent_id, conversation_id = %ctx.conversation_id, "agent declined context");
            ctx.add_error(agent_id, format!("Agent {agent_id} declined to handle the context"));
            return;
        }

        let started = Instant::now();
        match instance.agent.process(ctx).await {
            Ok(()) => {
                self.telemetry.record(agent_id, started.elapsed(), true);
                debug!(
                    agent_id = %agent_id,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "agent completed"
                );
            }
            Err(e) => {
                self.telemetry.record(agent_id, started.elapsed(), false);
                error!(agent_id = %agent_id, error = %e, "agent failed");
                if let Err(hook_err) = instance.agent.on_error(ctx, &e).await {
                    // Both the original failure and the hook failure are kept.
                    ctx.add_error(agent_id, format!("error hook failed: {hook_err} (after: {e})"));
                }
            }
        }
    }

    /// Run a group of agents, sequentially or in parallel.
    ///
    /// Unknown agent ids are recorded as context errors and skipped. In
    /// parallel mode each agent gets a fork of the context; branches are
    /// merged back in declared order with result keys prefixed by the
    /// producing agent id.
    pub async fn execute_agents(&self, agent_ids: &[String], ctx: &mut Context, parallel: bool) {
        let mut instances: Vec<AgentInstance> = Vec::with_capacity(agent_ids.len());
        for agent_id in agent_ids {
            match self.registry.resolve_agent(agent_id) {
                Ok(instance) => instances.push(instance),
                Err(e) => {
                    warn!(agent_id = %agent_id, error = %e, "skipping unresolvable agent");
                    ctx.add_error("orchestrator", format!("agent {agent_id} not available: {e}"));
                }
            }
        }

        if !parallel {
            for instance in &instances {
                self.execute_single_agent(instance, ctx).await;
            }
            return;
        }

        // Forks carry the memory log; entries past this point are new.
        let base_memory = ctx.memory.len();
        let branches = join_all(instances.iter().map(|instance| {
            let mut branch = ctx.fork();
            async move {
                self.execute_single_agent(instance, &mut branch).await;
                (instance.agent_id.clone(), branch)
            }
        }))
        .await;

        // join_all preserves input order, so the merge is deterministic
        // in declared agent order whatever the completion order was.
        for (agent_id, branch) in branches {
            for entry in branch.memory.into_iter().skip(base_memory) {
                ctx.memory.push(entry);
            }
            for error in branch.errors {
                ctx.errors.push(error);
            }
            for citation in branch.citations {
                ctx.adopt_citation(citation);
            }
            for (key, value) in branch.results {
                ctx.set_result(format!("{agent_id}_{key}"), value);
            }
        }
    }

    /// Run a registered workflow over the context.
    ///
    /// An unknown workflow id records a context error and leaves the
    /// context otherwise unchanged. Stops early after a terminal step or
    /// when an agent sets the `terminate_workflow` metadata flag.
    pub async fn execute_workflow(&self, workflow_id: &str, ctx: &mut Context) {
        let Some(workflow) = self.registry.get_workflow(workflow_id) else {
            error!(
                workflow_id = %workflow_id,
                conversation_id = %ctx.conversation_id,
                "workflow not found"
            );
            ctx.add_error("orchestrator", format!("Workflow {workflow_id} not found"));
            return;
        };

        info!(
            workflow_id = %workflow_id,
            conversation_id = %ctx.conversation_id,
            steps = workflow.steps.len(),
            "starting workflow"
        );
        self.active_runs.insert(
            ctx.conversation_id.clone(),
            WorkflowProgress {
                workflow_id: workflow_id.to_string(),
                steps_completed: 0,
                steps_total: workflow.steps.len(),
                started_at: chrono::Utc::now(),
            },
        );

        for step in &workflow.steps {
            debug!(workflow_id = %workflow_id, step_id = %step.id, parallel = step.parallel, "executing step");
            self.execute_agents(&step.agents, ctx, step.parallel).await;

            if let Some(mut run) = self.active_runs.get_mut(&ctx.conversation_id) {
                run.steps_completed += 1;
            }

            if step.terminal {
                info!(workflow_id = %workflow_id, step_id = %step.id, "terminal step reached");
                break;
            }
            if flag_set(ctx, TERMINATE_WORKFLOW_KEY) {
                info!(workflow_id = %workflow_id, step_id = %step.id, "workflow terminated by agent");
                break;
            }
        }

        self.active_runs.remove(&ctx.conversation_id);
        ctx.metadata.insert(
            "completed_workflow".to_string(),
            serde_json::json!(workflow_id),
        );
        ctx.metadata.insert(
            "workflow_completed_at".to_string(),
            serde_json::json!(chrono::Utc::now()),
        );
    }

    /// Assemble and run a pipeline from every registered agent willing to
    /// handle the context, ordered by role rank (ties by agent id).
    ///
    /// Stops early when an agent sets the `terminate_orchestration`
    /// metadata flag.
    pub async fn dynamic_orchestration(&self, ctx: &mut Context) {
        let mut pipeline: Vec<(i32, AgentInstance)> = Vec::new();
        for metadata in self.registry.list_agent_types() {
            let instance = match self.registry.resolve_agent(&metadata.id) {
                Ok(instance) => instance,
                Err(e) => {
                    warn!(agent_id = %metadata.id, error = %e, "skipping unresolvable agent");
                    continue;
                }
            };
            if instance.agent.can_handle(ctx).await {
                pipeline.push((metadata.role.execution_rank(), instance));
            }
        }

        if pipeline.is_empty() {
            warn!(conversation_id = %ctx.conversation_id, "no agent can handle this context");
            ctx.add_error("orchestrator", "No agents can handle this context");
            return;
        }

        // list_agent_types is id-ordered, so a stable sort on rank keeps
        // id order within each rank tier.
        pipeline.sort_by_key(|(rank, _)| *rank);
        debug!(
            conversation_id = %ctx.conversation_id,
            pipeline = ?pipeline.iter().map(|(_, i)| i.agent_id.as_str()).collect::<Vec<_>>(),
            "assembled dynamic pipeline"
        );

        for (_, instance) in &pipeline {
            self.execute_single_agent(instance, ctx).await;
            if flag_set(ctx, TERMINATE_ORCHESTRATION_KEY) {
                info!(
                    conversation_id = %ctx.conversation_id,
                    agent_id = %instance.agent_id,
                    "dynamic pipeline terminated by agent"
                );
                break;
            }
        }
    }

    /// Dispatch to a strategy by name.
    pub async fn execute_strategy(
        &self,
        strategy: &str,
        ctx: &mut Context,
        args: StrategyArgs,
    ) -> SwitchboardResult<()> {
        let strategy = Strategy::from_str(strategy)?;
        match strategy {
            Strategy::SingleAgent => {
                let agent_id = args.agent_id.ok_or_else(|| ConfigError::MissingRequired {
                    field: "agent_id".to_string(),
                })?;
                let instance = self.registry.resolve_agent(&agent_id)?;
                self.execute_single_agent(&instance, ctx).await;
                Ok(())
            }
            Strategy::Sequential | Strategy::Parallel => {
                if args.agent_ids.is_empty() {
                    return Err(ConfigError::MissingRequired {
                        field: "agent_ids".to_string(),
                    }
                    .into());
                }
                let parallel = strategy == Strategy::Parallel;
                self.execute_agents(&args.agent_ids, ctx, parallel).await;
                Ok(())
            }
            Strategy::Workflow => {
                let workflow_id =
                    args.workflow_id.ok_or_else(|| ConfigError::MissingRequired {
                        field: "workflow_id".to_string(),
                    })?;
                self.execute_workflow(&workflow_id, ctx).await;
                Ok(())
            }
            Strategy::Dynamic => {
                self.dynamic_orchestration(ctx).await;
                Ok(())
            }
        }
    }

    /// Progress of the workflow currently running for a conversation.
    pub fn active_workflow(&self, conversation_id: &str) -> Option<WorkflowProgress> {
        self.active_runs.get(conversation_id).map(|e| e.clone())
    }

    /// Execution statistics accumulated so far.
    pub fn telemetry(&self) -> TelemetrySnapshot {
        self.telemetry.snapshot()
    }
}

fn flag_set(ctx: &Context, key: &str) -> bool {
    ctx.metadata
        .get(key)
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false)
}

// =============================================================================
// TESTS
// =============================================================================
