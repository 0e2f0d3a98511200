//! StopChild — terminate a tracked child looked up by tag or pid
//! (spec §4.2, §4.3). The monitor, not this call, reconciles `children`.
//!
//! The agent server resolves `tag` against its own `children` map before
//! dispatching here, filling in `pid`; the deterministic-id fallback below
//! only fires if a raw `tag` reaches the executor directly (e.g. a
//! hand-built directive in a test).

use crate::registry::{DirectiveExecutor, ExecutionContext};
use jido_core::{Directive, DirectiveOutcome, Signal};

pub struct StopChildExecutor;

#[async_trait::async_trait]
impl DirectiveExecutor for StopChildExecutor {
    fn kind(&self) -> &'static str {
        "stop_child"
    }

    async fn execute(
        &self,
        directive: &Directive,
        _input_signal: &Signal,
        state: serde_json::Map<String, serde_json::Value>,
        ctx: &ExecutionContext<'_>,
    ) -> DirectiveOutcome {
        let Directive::StopChild { tag, pid, reason } = directive else {
            unreachable!("ExecutorRegistry only routes StopChild directives here")
        };

        let target = pid
            .clone()
            .or_else(|| tag.as_ref().map(|t| super::spawn_agent::child_id(ctx.agent_id, t, &serde_json::Value::Null)));

        match target {
            Some(id) => {
                if let Err(err) = ctx.instance.stop_agent(&id).await {
                    tracing::warn!(error = %err, id, reason, "stop_child failed");
                }
            }
            None => tracing::warn!("stop_child directive named neither tag nor pid"),
        }

        DirectiveOutcome::Ok(state)
    }
}
