//! Switchboard Agents - Registry, Handoff, and Sessions
//!
//! The behavioral layer of Switchboard: the agent trait and factories,
//! the type/instance registry with registration-time validation, the
//! handoff trigger evaluator, the per-session handoff audit log, and the
//! session manager that routes conversation turns.

pub mod agent;
pub mod handoff;
pub mod predicate;
pub mod registry;
pub mod session;

pub use agent::{Agent, AgentFactory, AgentInstance};
pub use handoff::{HandoffDecision, HandoffEvaluator, HandoffManager};
pub use predicate::{HandoffPredicate, PredicateRegistry};
pub use registry::AgentRegistry;
pub use session::{Session, SessionStore};
