//! Stop — cease draining and terminate this agent (spec §4.3).

use crate::registry::{DirectiveExecutor, ExecutionContext};
use jido_core::{Directive, DirectiveOutcome, Signal};

pub struct StopExecutor;

#[async_trait::async_trait]
impl DirectiveExecutor for StopExecutor {
    fn kind(&self) -> &'static str {
        "stop"
    }

    async fn execute(
        &self,
        directive: &Directive,
        _input_signal: &Signal,
        state: serde_json::Map<String, serde_json::Value>,
        _ctx: &ExecutionContext<'_>,
    ) -> DirectiveOutcome {
        let Directive::Stop { reason } = directive else {
            unreachable!("ExecutorRegistry only routes Stop directives here")
        };
        DirectiveOutcome::Stop {
            reason: reason.clone(),
            state,
        }
    }
}
