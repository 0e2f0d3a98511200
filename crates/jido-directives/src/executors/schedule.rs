//! Schedule — send `message` to self after `delay_ms` (spec §4.3).

use super::propagate_trace;
use crate::registry::{DirectiveExecutor, ExecutionContext};
use jido_core::{Directive, DirectiveOutcome, Signal};
use std::time::Duration;

pub struct ScheduleExecutor;

#[async_trait::async_trait]
impl DirectiveExecutor for ScheduleExecutor {
    fn kind(&self) -> &'static str {
        "schedule"
    }

    async fn execute(
        &self,
        directive: &Directive,
        input_signal: &Signal,
        state: serde_json::Map<String, serde_json::Value>,
        ctx: &ExecutionContext<'_>,
    ) -> DirectiveOutcome {
        let Directive::Schedule { delay_ms, message } = directive else {
            unreachable!("ExecutorRegistry only routes Schedule directives here")
        };

        let mut outgoing = message.clone();
        propagate_trace(input_signal, &mut outgoing);

        let agent_id = ctx.agent_id.to_string();
        let registry = ctx.instance.registry();
        let delay = Duration::from_millis(*delay_ms);
        let Some(handle) = registry.whereis(&agent_id) else {
            tracing::warn!(agent_id, "schedule target no longer registered");
            return DirectiveOutcome::Async(state);
        };

        ctx.instance.task_pool().spawn(Box::pin(async move {
            tokio::time::sleep(delay).await;
            if let Err(err) = handle.cast(outgoing).await {
                tracing::warn!(error = %err, "scheduled delivery failed");
            }
        }));

        DirectiveOutcome::Async(state)
    }
}
