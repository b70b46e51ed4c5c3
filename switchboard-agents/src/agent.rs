//! The agent trait and live instance wrapper.
//!
//! Agents come in two flavors: pipeline agents that transform a shared
//! `Context`, and conversational agents that answer one message at a time
//! inside a session. `Agent` unifies both; conversational behavior has a
//! default adapter over the pipeline flavor, so a pipeline-only agent can
//! still be placed in a session and vice versa.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use switchboard_core::{
    AgentReply, AgentRole, AgentSpawnConfig, Context, EvalContext, SwitchboardError,
    SwitchboardResult,
};

/// A live agent.
///
/// Implementations must be cheap to share (`Arc`) and safe to call
/// concurrently; any per-conversation state belongs in the `Context` or
/// the session, not in the agent itself.
#[async_trait]
pub trait Agent: Send + Sync {
    /// The agent type id this instance was registered under.
    fn agent_type(&self) -> &str;

    /// Pipeline role, used to order dynamically assembled pipelines.
    fn role(&self) -> AgentRole {
        AgentRole::Support
    }

    /// Whether this agent is willing to work on the given context.
    async fn can_handle(&self, ctx: &Context) -> bool;

    /// Pipeline flavor: transform the shared context in place.
    async fn process(&self, ctx: &mut Context) -> SwitchboardResult<()>;

    /// Conversational flavor: answer one message within a session.
    ///
    /// The default implementation adapts `process`: it runs the pipeline
    /// over a one-shot context seeded with the message and returns the
    /// last result value as the reply text.
    async fn process_message(
        &self,
        message: &str,
        eval: &EvalContext,
    ) -> SwitchboardResult<AgentReply> {
        let mut ctx = Context::new(message).with_conversation_id(eval.session_id.clone());
        self.process(&mut ctx).await?;

        let text = ctx
            .results
            .values()
            .last()
            .and_then(|v| v.as_str())
            .map(str::to_string);
        Ok(AgentReply {
            message: text,
            ..AgentReply::default()
        })
    }

    /// Hook invoked after `process` fails. The default records the error
    /// on the context; overrides may also attempt recovery.
    async fn on_error(&self, ctx: &mut Context, error: &SwitchboardError) -> SwitchboardResult<()> {
        ctx.add_error(
            self.agent_type(),
            format!("Error in {} agent: {error}", self.agent_type()),
        );
        Ok(())
    }
}

/// Constructor invoked by the registry when spawning an instance.
pub type AgentFactory =
    Arc<dyn Fn(&AgentSpawnConfig) -> SwitchboardResult<Arc<dyn Agent>> + Send + Sync>;

/// A spawned agent together with its registry identity.
#[derive(Clone)]
pub struct AgentInstance {
    pub instance_id: String,
    pub agent_id: String,
    pub agent: Arc<dyn Agent>,
}

impl fmt::Debug for AgentInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentInstance")
            .field("instance_id", &self.instance_id)
            .field("agent_id", &self.agent_id)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// TESTS
// =============================================================================
