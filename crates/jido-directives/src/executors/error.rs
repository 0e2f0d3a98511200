//! Error — surface a structured error to the configured error policy
//! (spec §4.3, §7).
//!
//! The policy itself (`log_only`/`stop_on_error`/`emit_signal`/
//! `max_errors`/custom) is server-level configuration (`error_policy`,
//! `error_count` live on the agent server, spec §3), so the agent server
//! applies the policy around this executor's result. This executor's own
//! job is just the `emit_signal`-equivalent telemetry: publish
//! `jido.agent.error` into the agent's own intake so it is observable the
//! same way any other signal is.

use crate::registry::{DirectiveExecutor, ExecutionContext};
use jido_core::{lifecycle, Directive, DirectiveOutcome, Signal};

pub struct ErrorExecutor;

#[async_trait::async_trait]
impl DirectiveExecutor for ErrorExecutor {
    fn kind(&self) -> &'static str {
        "error"
    }

    async fn execute(
        &self,
        directive: &Directive,
        _input_signal: &Signal,
        state: serde_json::Map<String, serde_json::Value>,
        ctx: &ExecutionContext<'_>,
    ) -> DirectiveOutcome {
        let Directive::Error { error, context } = directive else {
            unreachable!("ExecutorRegistry only routes Error directives here")
        };

        tracing::warn!(agent_id = ctx.agent_id, error, "agent error directive");

        let telemetry = Signal::new(
            lifecycle::ERROR,
            ctx.agent_id,
            serde_json::json!({"error": error, "context": context}),
        );
        if let Some(handle) = ctx.instance.registry().whereis(ctx.agent_id) {
            if let Err(err) = handle.cast(telemetry).await {
                tracing::warn!(error = %err, "failed to deliver error telemetry signal");
            }
        }

        DirectiveOutcome::Ok(state)
    }
}
