//! Direct strategy: runs all instructions in order, accumulating directives,
//! with no gating (spec §4.5).

use crate::{Instruction, Strategy, StrategyContext};
use jido_core::{Agent, Directive};
use serde_json::Value;
use std::sync::Arc;

/// An action handler bound to one instruction tag: the pure per-instruction
/// transition a `Direct` strategy dispatches to.
pub type ActionFn = Arc<dyn Fn(Agent, &Value, &StrategyContext) -> (Agent, Vec<Directive>) + Send + Sync>;

/// Pass-through strategy. Holds a table of `action → handler` and, for each
/// instruction in order, looks up and runs the handler, threading the agent
/// through and accumulating every directive produced.
#[derive(Clone, Default)]
pub struct Direct {
    actions: std::collections::HashMap<String, ActionFn>,
}

impl Direct {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_action(mut self, action: impl Into<String>, handler: ActionFn) -> Self {
        self.actions.insert(action.into(), handler);
        self
    }
}

impl Strategy for Direct {
    fn init(&self, _agent: &mut Agent) {}

    fn cmd(
        &self,
        mut agent: Agent,
        instructions: Vec<Instruction>,
        ctx: &StrategyContext,
    ) -> (Agent, Vec<Directive>) {
        let mut directives = Vec::new();
        for instruction in instructions {
            let Some(handler) = self.actions.get(&instruction.action) else {
                directives.push(crate::error_directive(
                    "unknown_action",
                    format!("no action bound for '{}'", instruction.action),
                ));
                continue;
            };
            let (next_agent, mut produced) = handler(agent, &instruction.params, ctx);
            agent = next_agent;
            directives.append(&mut produced);
        }
        (agent, directives)
    }

    fn snapshot(&self, agent: &Agent) -> Value {
        Value::Object(agent.state.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jido_core::Signal;

    fn ctx() -> StrategyContext {
        StrategyContext {
            agent_id: "echo".into(),
            input_signal_id: "sig-1".into(),
        }
    }

    #[test]
    fn runs_instructions_in_order_and_accumulates_directives() {
        let strategy = Direct::new().with_action(
            "ping",
            Arc::new(|agent, params, _ctx| {
                let n = params.get("n").and_then(Value::as_i64).unwrap_or(0);
                let directive = Directive::Emit {
                    signal: Signal::new("pong", &agent.id, serde_json::json!({"n": n})),
                    dispatch: None,
                };
                (agent, vec![directive])
            }),
        );
        let agent = Agent::new("echo", "Echo");
        let (agent, directives) = strategy.cmd(
            agent,
            vec![Instruction::new("ping", serde_json::json!({"n": 7}))],
            &ctx(),
        );
        assert_eq!(agent.id, "echo");
        assert_eq!(directives.len(), 1);
    }

    #[test]
    fn unknown_action_yields_error_directive_without_panicking() {
        let strategy = Direct::new();
        let agent = Agent::new("echo", "Echo");
        let (_, directives) = strategy.cmd(
            agent,
            vec![Instruction::new("missing", Value::Null)],
            &ctx(),
        );
        assert_eq!(directives.len(), 1);
        assert!(matches!(directives[0], Directive::Error { .. }));
    }
}
