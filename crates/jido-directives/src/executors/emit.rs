//! Emit — publish a signal via the directive's dispatch override or the
//! server's default (spec §4.3).

use super::propagate_trace;
use crate::registry::{DirectiveExecutor, ExecutionContext};
use jido_core::{Directive, DirectiveOutcome, Signal};

pub struct EmitExecutor;

#[async_trait::async_trait]
impl DirectiveExecutor for EmitExecutor {
    fn kind(&self) -> &'static str {
        "emit"
    }

    async fn execute(
        &self,
        directive: &Directive,
        input_signal: &Signal,
        state: serde_json::Map<String, serde_json::Value>,
        ctx: &ExecutionContext<'_>,
    ) -> DirectiveOutcome {
        let Directive::Emit {
            signal,
            dispatch: _dispatch,
        } = directive
        else {
            unreachable!("ExecutorRegistry only routes Emit directives here")
        };

        let mut outgoing = signal.clone();
        propagate_trace(input_signal, &mut outgoing);

        // Resolving an arbitrary dispatch target (message bus, HTTP hook,
        // pub/sub fanout) is an external collaborator's concern (spec §1).
        // The built-in mechanism supports direct intra-instance delivery:
        // `dispatch = {"to": "<agent_id>"}` casts straight into that
        // agent's intake. Anything else is published nowhere by the core.
        let target = directive_target(directive);
        let registry = ctx.instance.registry();
        let task_pool_job: std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>> =
            match target.and_then(|id| registry.whereis(&id)) {
                Some(handle) => Box::pin(async move {
                    if let Err(err) = handle.cast(outgoing).await {
                        tracing::warn!(error = %err, "emit dispatch failed");
                    }
                }),
                None => {
                    tracing::warn!(signal_type = %outgoing.kind, "emit has no resolvable dispatch target");
                    Box::pin(async {})
                }
            };
        ctx.instance.task_pool().spawn(task_pool_job);

        DirectiveOutcome::Async(state)
    }
}

fn directive_target(directive: &Directive) -> Option<String> {
    let Directive::Emit { dispatch, .. } = directive else {
        return None;
    };
    dispatch
        .as_ref()
        .and_then(|d| d.get("to"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_target_reads_dispatch_to_field() {
        let d = Directive::Emit {
            signal: Signal::bare("pong"),
            dispatch: Some(serde_json::json!({"to": "echo"})),
        };
        assert_eq!(directive_target(&d), Some("echo".to_string()));
    }

    #[test]
    fn directive_target_is_none_without_dispatch() {
        let d = Directive::Emit {
            signal: Signal::bare("pong"),
            dispatch: None,
        };
        assert_eq!(directive_target(&d), None);
    }
}
