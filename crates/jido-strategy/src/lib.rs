//! Strategies — pure functions `(agent, instructions, ctx) → (agent', directives)`
//! (spec §4.5). Strategies never perform IO; all effects are requested via
//! directives for the agent server to execute.

pub mod direct;
pub mod fsm;

pub use direct::Direct;
pub use fsm::{Fsm, FsmDefinition, Transition};

use jido_core::{Agent, Directive, Error};
use serde_json::Value;

/// One unit of work produced by the router for a strategy to act on: an
/// action tag plus its parameters (spec §4.2 step 3).
#[derive(Debug, Clone)]
pub struct Instruction {
    pub action: String,
    pub params: Value,
}

impl Instruction {
    pub fn new(action: impl Into<String>, params: Value) -> Self {
        Self {
            action: action.into(),
            params,
        }
    }
}

/// Read-only context handed to a strategy alongside the agent and its
/// instructions: the input signal's id (for trace-context propagation at
/// the strategy's emission points) and the agent's own id.
#[derive(Debug, Clone)]
pub struct StrategyContext {
    pub agent_id: String,
    pub input_signal_id: String,
}

/// A strategy turns `(agent, instructions, ctx)` into `(agent', directives)`.
/// Implementations must be pure: no IO, no blocking, no side effects beyond
/// returning directives for the server to execute.
pub trait Strategy: Send + Sync {
    /// One-time setup of strategy-local state on an agent that has none yet.
    fn init(&self, agent: &mut Agent);

    /// The pure transition. Must not perform IO.
    fn cmd(
        &self,
        agent: Agent,
        instructions: Vec<Instruction>,
        ctx: &StrategyContext,
    ) -> (Agent, Vec<Directive>);

    /// An opaque status snapshot exposed via the agent server's `status()`.
    fn snapshot(&self, agent: &Agent) -> Value;
}

/// Build an `Error` directive carrying `kind`/`reason`, matching the shape
/// spec §4.7 describes for a trapped strategy failure.
pub fn error_directive(kind: &str, reason: impl Into<String>) -> Directive {
    Directive::Error {
        error: Error::strategy(kind, reason).to_string(),
        context: Value::Null,
    }
}
