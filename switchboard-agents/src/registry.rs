//! Agent type, instance, and workflow registry.
//!
//! Registration is the validation boundary: metadata that references an
//! unknown predicate, carries a broken keyword pattern, targets itself in
//! a handoff trigger, or closes a `requires` cycle is rejected before it
//! can ever route a conversation.

use crate::agent::{AgentFactory, AgentInstance};
use crate::predicate::PredicateRegistry;
use dashmap::DashMap;
use regex::RegexBuilder;
use std::collections::BTreeSet;
use std::sync::Arc;
use switchboard_core::{
    new_instance_id, AgentMetadata, AgentSpawnConfig, CapabilityType, ConfigError, NotFoundError,
    SwitchboardResult, TriggerCondition, UiInstructionType, Workflow,
};
use tracing::{debug, info, warn};

struct RegisteredType {
    metadata: AgentMetadata,
    factory: AgentFactory,
}

/// Shared registry of agent types, live instances, and workflows.
pub struct AgentRegistry {
    types: DashMap<String, RegisteredType>,
    instances: DashMap<String, AgentInstance>,
    workflows: DashMap<String, Workflow>,
    predicates: Arc<PredicateRegistry>,
}

impl AgentRegistry {
    pub fn new(predicates: Arc<PredicateRegistry>) -> Self {
        AgentRegistry {
            types: DashMap::new(),
            instances: DashMap::new(),
            workflows: DashMap::new(),
            predicates,
        }
    }

    pub fn predicates(&self) -> &Arc<PredicateRegistry> {
        &self.predicates
    }

    // ========================================================================
    // AGENT TYPES
    // ========================================================================

    /// Register an agent type with its factory.
    ///
    /// Re-registering an existing id replaces the previous entry (with a
    /// warning); live instances of the old registration keep running.
    pub fn register_agent_type(
        &self,
        metadata: AgentMetadata,
        factory: AgentFactory,
    ) -> SwitchboardResult<()> {
        self.validate_metadata(&metadata)?;

        let agent_id = metadata.id.clone();
        if self
            .types
            .insert(agent_id.clone(), RegisteredType { metadata, factory })
            .is_some()
        {
            warn!(agent_id = %agent_id, "replacing existing agent type registration");
        } else {
            info!(agent_id = %agent_id, "registered agent type");
        }
        Ok(())
    }

    /// Remove an agent type and all of its live instances.
    ///
    /// Returns `false` when the type was not registered. Types that other
    /// registered agents `require` are removed with a warning rather than
    /// rejected; dependents keep their (now dangling) edge.
    pub fn unregister_agent_type(&self, agent_id: &str) -> bool {
        if !self.types.contains_key(agent_id) {
            return false;
        }

        let dependents: Vec<String> = self
            .types
            .iter()
            .filter(|entry| entry.metadata.requires.iter().any(|r| r == agent_id))
            .map(|entry| entry.metadata.id.clone())
            .collect();
        if !dependents.is_empty() {
            warn!(
                agent_id = %agent_id,
                dependents = ?dependents,
                "unregistering agent type that other agents require"
            );
        }

        let stale: Vec<String> = self
            .instances
            .iter()
            .filter(|entry| entry.agent_id == agent_id)
            .map(|entry| entry.instance_id.clone())
            .collect();
        for instance_id in &stale {
            self.instances.remove(instance_id);
        }

        self.types.remove(agent_id);
        info!(agent_id = %agent_id, removed_instances = stale.len(), "unregistered agent type");
        true
    }

    pub fn get_agent_type(&self, agent_id: &str) -> Option<AgentMetadata> {
        self.types.get(agent_id).map(|entry| entry.metadata.clone())
    }

    pub fn is_registered(&self, agent_id: &str) -> bool {
        self.types.contains_key(agent_id)
    }

    /// All registered agent types, ordered by id.
    pub fn list_agent_types(&self) -> Vec<AgentMetadata> {
        let mut types: Vec<AgentMetadata> = self
            .types
            .iter()
            .map(|entry| entry.metadata.clone())
            .collect();
        types.sort_by(|a, b| a.id.cmp(&b.id));
        types
    }

    /// Agent types advertising a capability, ordered by id.
    pub fn agents_by_capability(&self, capability: CapabilityType) -> Vec<AgentMetadata> {
        let mut matches: Vec<AgentMetadata> = self
            .types
            .iter()
            .filter(|entry| entry.metadata.has_capability(capability))
            .map(|entry| entry.metadata.clone())
            .collect();
        matches.sort_by(|a, b| a.id.cmp(&b.id));
        matches
    }

    /// Agent types authorized to emit a UI instruction type, ordered by id.
    pub fn agents_by_ui_instruction(&self, instruction: UiInstructionType) -> Vec<AgentMetadata> {
        let mut matches: Vec<AgentMetadata> = self
            .types
            .iter()
            .filter(|entry| entry.metadata.authorizes_ui_instruction(instruction))
            .map(|entry| entry.metadata.clone())
            .collect();
        matches.sort_by(|a, b| a.id.cmp(&b.id));
        matches
    }

    /// Whether the agent type may emit the given UI instruction type.
    /// Unknown agent ids are not authorized for anything.
    pub fn is_authorized_for_ui_instruction(
        &self,
        agent_id: &str,
        instruction: UiInstructionType,
    ) -> bool {
        self.types
            .get(agent_id)
            .map(|entry| entry.metadata.authorizes_ui_instruction(instruction))
            .unwrap_or(false)
    }

    fn validate_metadata(&self, metadata: &AgentMetadata) -> SwitchboardResult<()> {
        for trigger in &metadata.handoff_triggers {
            if trigger.target_agent_id == metadata.id {
                return Err(ConfigError::SelfHandoff {
                    agent_id: metadata.id.clone(),
                }
                .into());
            }

            match &trigger.condition {
                TriggerCondition::Predicate { name } => {
                    if !self.predicates.contains(name) {
                        return Err(ConfigError::UnknownPredicate {
                            agent_id: metadata.id.clone(),
                            name: name.clone(),
                        }
                        .into());
                    }
                }
                TriggerCondition::Keywords { patterns } => {
                    for pattern in patterns {
                        if let Err(e) = RegexBuilder::new(pattern).case_insensitive(true).build() {
                            return Err(ConfigError::InvalidPattern {
                                agent_id: metadata.id.clone(),
                                pattern: pattern.clone(),
                                reason: e.to_string(),
                            }
                            .into());
                        }
                    }
                }
                TriggerCondition::Intents { .. } => {}
            }
        }

        if self.closes_requires_cycle(metadata) {
            return Err(ConfigError::CircularRequires {
                agent_id: metadata.id.clone(),
            }
            .into());
        }

        // Requires edges may point at not-yet-registered types; that is
        // legal during bootstrap and only logged.
        for dep in &metadata.requires {
            if !self.types.contains_key(dep) {
                debug!(agent_id = %metadata.id, requires = %dep, "dependency not registered yet");
            }
        }

        Ok(())
    }

    /// DFS over the `requires` graph: would adding this metadata create a
    /// path from one of its dependencies back to itself?
    fn closes_requires_cycle(&self, metadata: &AgentMetadata) -> bool {
        let mut stack: Vec<String> = metadata.requires.clone();
        let mut visited: BTreeSet<String> = BTreeSet::new();

        while let Some(dep) = stack.pop() {
            if dep == metadata.id {
                return true;
            }
            if !visited.insert(dep.clone()) {
                continue;
            }
            if let Some(entry) = self.types.get(&dep) {
                stack.extend(entry.metadata.requires.iter().cloned());
            }
        }
        false
    }

    // ========================================================================
    // AGENT INSTANCES
    // ========================================================================

    /// Spawn an instance of a registered type, returning its instance id.
    ///
    /// For singleton types an existing live instance is returned instead
    /// of spawning a second one.
    pub fn instantiate_agent(&self, config: &AgentSpawnConfig) -> SwitchboardResult<String> {
        let (metadata, factory) = {
            let entry = self
                .types
                .get(&config.agent_id)
                .ok_or_else(|| NotFoundError::AgentType(config.agent_id.clone()))?;
            (entry.metadata.clone(), Arc::clone(&entry.factory))
        };

        if metadata.singleton {
            if let Some(existing) = self.find_instance_of_type(&config.agent_id) {
                debug!(
                    agent_id = %config.agent_id,
                    instance_id = %existing,
                    "singleton type already instantiated"
                );
                return Ok(existing);
            }
        }

        let instance_id = config
            .instance_id
            .clone()
            .unwrap_or_else(|| new_instance_id(&config.agent_id));
        if self.instances.contains_key(&instance_id) {
            return Err(ConfigError::InstanceIdInUse { instance_id }.into());
        }

        let agent = factory(config)?;
        self.instances.insert(
            instance_id.clone(),
            AgentInstance {
                instance_id: instance_id.clone(),
                agent_id: config.agent_id.clone(),
                agent,
            },
        );
        info!(agent_id = %config.agent_id, instance_id = %instance_id, "spawned agent instance");
        Ok(instance_id)
    }

    pub fn get_agent_instance(&self, instance_id: &str) -> SwitchboardResult<AgentInstance> {
        self.instances
            .get(instance_id)
            .map(|entry| entry.clone())
            .ok_or_else(|| NotFoundError::AgentInstance(instance_id.to_string()).into())
    }

    pub fn remove_agent_instance(&self, instance_id: &str) -> bool {
        self.instances.remove(instance_id).is_some()
    }

    /// All live instances, ordered by instance id. UUIDv7 suffixes make
    /// this creation order within each type.
    pub fn list_agent_instances(&self) -> Vec<AgentInstance> {
        let mut instances: Vec<AgentInstance> =
            self.instances.iter().map(|entry| entry.clone()).collect();
        instances.sort_by(|a, b| a.instance_id.cmp(&b.instance_id));
        instances
    }

    /// Resolve an agent type id to a live instance, spawning one with a
    /// default configuration when none exists yet.
    pub fn resolve_agent(&self, agent_id: &str) -> SwitchboardResult<AgentInstance> {
        if let Some(instance_id) = self.find_instance_of_type(agent_id) {
            return self.get_agent_instance(&instance_id);
        }
        let instance_id = self.instantiate_agent(&AgentSpawnConfig::new(agent_id))?;
        self.get_agent_instance(&instance_id)
    }

    /// Earliest-created live instance of a type, if any.
    fn find_instance_of_type(&self, agent_id: &str) -> Option<String> {
        self.instances
            .iter()
            .filter(|entry| entry.agent_id == agent_id)
            .map(|entry| entry.instance_id.clone())
            .min()
    }

    // ========================================================================
    // WORKFLOWS
    // ========================================================================

    /// Register a workflow. Steps may reference agent types that are not
    /// registered yet; those are logged, not rejected.
    pub fn register_workflow(&self, workflow: Workflow) {
        for agent_id in workflow.referenced_agents() {
            if !self.types.contains_key(agent_id) {
                warn!(
                    workflow_id = %workflow.id,
                    agent_id = %agent_id,
                    "workflow references unregistered agent type"
                );
            }
        }

        let workflow_id = workflow.id.clone();
        if self.workflows.insert(workflow_id.clone(), workflow).is_some() {
            warn!(workflow_id = %workflow_id, "replacing existing workflow");
        } else {
            info!(workflow_id = %workflow_id, "registered workflow");
        }
    }

    pub fn get_workflow(&self, workflow_id: &str) -> Option<Workflow> {
        self.workflows.get(workflow_id).map(|entry| entry.clone())
    }

    pub fn unregister_workflow(&self, workflow_id: &str) -> bool {
        self.workflows.remove(workflow_id).is_some()
    }

    /// All registered workflows, ordered by id.
    pub fn list_workflows(&self) -> Vec<Workflow> {
        let mut workflows: Vec<Workflow> =
            self.workflows.iter().map(|entry| entry.clone()).collect();
        workflows.sort_by(|a, b| a.id.cmp(&b.id));
        workflows
    }
}

// =============================================================================
// TESTS
// =============================================================================
