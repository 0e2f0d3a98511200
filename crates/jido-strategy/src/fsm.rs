//! FSM strategy: state-gated transitions over a declared state/transition
//! table (spec §4.5). Mirrors a tagged-variant workflow-state machine, with
//! the state kept in the agent's `__strategy__` map so the core `Agent`
//! type stays state-machine-agnostic.

use crate::{Instruction, Strategy, StrategyContext};
use jido_core::{Agent, Directive};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// A guard rejects a transition with a reason; guards must be pure.
pub type Guard = Arc<dyn Fn(&Agent, &Value) -> Result<(), String> + Send + Sync>;

/// One legal edge in the transition table: fire `on` while in `from`, land
/// in `to`, optionally emitting directives and subject to `guard`.
#[derive(Clone)]
pub struct Transition {
    pub from: String,
    pub on: String,
    pub to: String,
    pub guard: Option<Guard>,
    pub on_enter: Option<Arc<dyn Fn(&Agent, &Value) -> Vec<Directive> + Send + Sync>>,
}

impl Transition {
    pub fn new(from: impl Into<String>, on: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            on: on.into(),
            to: to.into(),
            guard: None,
            on_enter: None,
        }
    }

    pub fn with_guard(mut self, guard: Guard) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn with_on_enter(
        mut self,
        on_enter: Arc<dyn Fn(&Agent, &Value) -> Vec<Directive> + Send + Sync>,
    ) -> Self {
        self.on_enter = Some(on_enter);
        self
    }
}

/// Declares the state machine: legal states, the state to start in, the
/// transition table, and which states are terminal.
#[derive(Clone)]
pub struct FsmDefinition {
    pub initial_state: String,
    pub terminal_states: Vec<String>,
    transitions: HashMap<(String, String), Transition>,
}

impl FsmDefinition {
    pub fn new(initial_state: impl Into<String>) -> Self {
        Self {
            initial_state: initial_state.into(),
            terminal_states: Vec::new(),
            transitions: HashMap::new(),
        }
    }

    pub fn with_terminal_states(mut self, states: impl IntoIterator<Item = String>) -> Self {
        self.terminal_states = states.into_iter().collect();
        self
    }

    pub fn with_transition(mut self, transition: Transition) -> Self {
        self.transitions.insert(
            (transition.from.clone(), transition.on.clone()),
            transition,
        );
        self
    }

    fn find(&self, from: &str, on: &str) -> Option<&Transition> {
        self.transitions.get(&(from.to_string(), on.to_string()))
    }
}

const CURRENT_STATE: &str = "current_state";
const HISTORY: &str = "history";

/// What an instruction ignored by a terminal state should do.
#[derive(Debug, Clone, Copy, Default)]
pub enum TerminalPolicy {
    /// Produce an `Error` directive (default).
    #[default]
    Error,
    /// Silently ignore.
    Noop,
}

/// State-gated strategy: each instruction names a transition (`action` is
/// the `on` label); it fires only if `(current_state, on)` has a legal edge
/// whose guard (if any) accepts. Terminal states refuse further transitions.
#[derive(Clone)]
pub struct Fsm {
    definition: FsmDefinition,
    terminal_policy: TerminalPolicy,
}

impl Fsm {
    pub fn new(definition: FsmDefinition) -> Self {
        Self {
            definition,
            terminal_policy: TerminalPolicy::default(),
        }
    }

    pub fn with_terminal_policy(mut self, policy: TerminalPolicy) -> Self {
        self.terminal_policy = policy;
        self
    }

    fn current_state(agent: &Agent) -> String {
        agent
            .strategy_state()
            .and_then(|s| s.get(CURRENT_STATE))
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string()
    }

    fn set_state(agent: &mut Agent, state: &str) {
        let mut strategy_state = agent.strategy_state().cloned().unwrap_or_default();
        let mut history = strategy_state
            .get(HISTORY)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        if let Some(prev) = strategy_state.get(CURRENT_STATE) {
            history.push(prev.clone());
        }
        strategy_state.insert(CURRENT_STATE.to_string(), Value::String(state.to_string()));
        strategy_state.insert(HISTORY.to_string(), Value::Array(history));
        agent.set_strategy_state(strategy_state);
    }
}

impl Strategy for Fsm {
    fn init(&self, agent: &mut Agent) {
        if agent.strategy_state().is_none() {
            Self::set_state(agent, &self.definition.initial_state);
        }
    }

    fn cmd(
        &self,
        mut agent: Agent,
        instructions: Vec<Instruction>,
        _ctx: &StrategyContext,
    ) -> (Agent, Vec<Directive>) {
        self.init(&mut agent);
        let mut directives = Vec::new();

        for instruction in instructions {
            let current = Self::current_state(&agent);

            if self.definition.terminal_states.contains(&current) {
                if matches!(self.terminal_policy, TerminalPolicy::Error) {
                    directives.push(crate::error_directive(
                        "terminal_state",
                        format!("agent is in terminal state '{current}'; no further transitions"),
                    ));
                }
                continue;
            }

            let Some(transition) = self.definition.find(&current, &instruction.action).cloned()
            else {
                directives.push(crate::error_directive(
                    "invalid_transition",
                    format!(
                        "no transition '{}' from state '{current}'",
                        instruction.action
                    ),
                ));
                continue;
            };

            if let Some(guard) = &transition.guard {
                if let Err(reason) = guard(&agent, &instruction.params) {
                    directives.push(crate::error_directive("guard_rejected", reason));
                    continue;
                }
            }

            if let Some(on_enter) = &transition.on_enter {
                directives.extend(on_enter(&agent, &instruction.params));
            }

            Self::set_state(&mut agent, &transition.to);
        }

        (agent, directives)
    }

    fn snapshot(&self, agent: &Agent) -> Value {
        let current = Self::current_state(agent);
        let mut out = Map::new();
        out.insert("current_state".to_string(), Value::String(current.clone()));
        out.insert(
            "terminal".to_string(),
            Value::Bool(self.definition.terminal_states.contains(&current)),
        );
        Value::Object(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> StrategyContext {
        StrategyContext {
            agent_id: "wf".into(),
            input_signal_id: "sig-1".into(),
        }
    }

    fn idle_running_done() -> Fsm {
        let def = FsmDefinition::new("idle")
            .with_terminal_states(["done".to_string()])
            .with_transition(Transition::new("idle", "start", "running"))
            .with_transition(Transition::new("running", "finish", "done"));
        Fsm::new(def)
    }

    #[test]
    fn legal_transition_advances_state() {
        let fsm = idle_running_done();
        let agent = Agent::new("wf", "Workflow");
        let (agent, directives) = fsm.cmd(
            agent,
            vec![Instruction::new("start", Value::Null)],
            &ctx(),
        );
        assert!(directives.is_empty());
        assert_eq!(fsm.snapshot(&agent)["current_state"], "running");
    }

    #[test]
    fn finish_while_idle_is_rejected_and_state_is_unchanged() {
        let fsm = idle_running_done();
        let agent = Agent::new("wf", "Workflow");
        let (agent, directives) = fsm.cmd(
            agent,
            vec![Instruction::new("finish", Value::Null)],
            &ctx(),
        );
        assert_eq!(directives.len(), 1);
        assert!(matches!(directives[0], Directive::Error { .. }));
        assert_eq!(fsm.snapshot(&agent)["current_state"], "idle");
    }

    #[test]
    fn terminal_state_ignores_further_instructions() {
        let fsm = idle_running_done();
        let agent = Agent::new("wf", "Workflow");
        let (agent, _) = fsm.cmd(agent, vec![Instruction::new("start", Value::Null)], &ctx());
        let (agent, _) = fsm.cmd(agent, vec![Instruction::new("finish", Value::Null)], &ctx());
        assert_eq!(fsm.snapshot(&agent)["current_state"], "done");
        let (agent, directives) = fsm.cmd(agent, vec![Instruction::new("start", Value::Null)], &ctx());
        assert_eq!(directives.len(), 1);
        assert_eq!(fsm.snapshot(&agent)["current_state"], "done");
    }

    #[test]
    fn guard_can_reject_a_transition() {
        let def = FsmDefinition::new("idle").with_transition(
            Transition::new("idle", "start", "running")
                .with_guard(Arc::new(|_agent, params| {
                    if params.get("authorized").and_then(Value::as_bool) == Some(true) {
                        Ok(())
                    } else {
                        Err("not authorized".to_string())
                    }
                })),
        );
        let fsm = Fsm::new(def);
        let agent = Agent::new("wf", "Workflow");
        let (agent, directives) = fsm.cmd(
            agent,
            vec![Instruction::new("start", serde_json::json!({"authorized": false}))],
            &ctx(),
        );
        assert_eq!(directives.len(), 1);
        assert_eq!(fsm.snapshot(&agent)["current_state"], "idle");
    }
}
