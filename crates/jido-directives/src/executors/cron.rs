//! Cron — upsert a scheduler job that casts `message` to this agent on each
//! tick (spec §4.3, §6 cron job naming).

use super::propagate_trace;
use crate::registry::{DirectiveExecutor, ExecutionContext};
use jido_core::{cron_expr, Directive, DirectiveOutcome, Signal};
use std::str::FromStr;

pub struct CronExecutor;

/// `jido_cron:<agent_id>:<job_id>` — guarantees global uniqueness per
/// instance (spec §6).
pub fn job_name(agent_id: &str, job_id: &str) -> String {
    format!("jido_cron:{agent_id}:{job_id}")
}

#[async_trait::async_trait]
impl DirectiveExecutor for CronExecutor {
    fn kind(&self) -> &'static str {
        "cron"
    }

    async fn execute(
        &self,
        directive: &Directive,
        input_signal: &Signal,
        state: serde_json::Map<String, serde_json::Value>,
        ctx: &ExecutionContext<'_>,
    ) -> DirectiveOutcome {
        let Directive::Cron {
            job_id,
            expression,
            message,
            timezone,
        } = directive
        else {
            unreachable!("ExecutorRegistry only routes Cron directives here")
        };

        let normalized = match cron_expr::normalize(expression) {
            Ok(normalized) => normalized,
            Err(reason) => return invalid_expression(job_id, expression, &reason, state),
        };
        if let Err(err) = cron::Schedule::from_str(&normalized) {
            return invalid_expression(job_id, expression, &err.to_string(), state);
        }

        let mut outgoing = message.clone();
        propagate_trace(input_signal, &mut outgoing);

        let name = job_name(ctx.agent_id, job_id);
        let agent_id = ctx.agent_id.to_string();

        let task_name = name.clone();
        let instance_for_task = ctx.instance.clone();
        let task: jido_core::CronTask = std::sync::Arc::new(move || {
            let agent_id = agent_id.clone();
            let outgoing = outgoing.clone();
            let task_name = task_name.clone();
            let instance = instance_for_task.clone();
            Box::pin(async move {
                match instance.registry().whereis(&agent_id) {
                    Some(handle) => {
                        if let Err(err) = handle.cast(outgoing).await {
                            tracing::warn!(job = %task_name, error = %err, "cron delivery failed");
                        }
                    }
                    None => tracing::warn!(job = %task_name, "cron fired for an agent no longer registered"),
                }
            })
        });

        let result = ctx
            .instance
            .scheduler()
            .upsert_job(name, normalized, timezone.clone(), task);

        match result {
            Ok(()) => DirectiveOutcome::Ok(state),
            Err(err) => DirectiveOutcome::Failed {
                error: format!("cron upsert failed: {err}"),
                context: serde_json::json!({"job_id": job_id, "expression": expression}),
                state,
            },
        }
    }
}

/// Spec §4.3: "Invalid expressions yield `Error`" — surfaced through
/// `DirectiveOutcome::Failed` rather than a silent no-op, so the server's
/// `error_policy` sees it the same as any other directive failure.
fn invalid_expression(
    job_id: &str,
    expression: &str,
    reason: &str,
    state: serde_json::Map<String, serde_json::Value>,
) -> DirectiveOutcome {
    tracing::warn!(job_id, expression, reason, "invalid cron expression, job not registered");
    DirectiveOutcome::Failed {
        error: format!("invalid cron expression '{expression}': {reason}"),
        context: serde_json::json!({"job_id": job_id, "expression": expression}),
        state,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_name_matches_the_documented_scheme() {
        assert_eq!(job_name("echo", "hb"), "jido_cron:echo:hb");
    }

    #[test]
    fn invalid_expression_yields_a_failed_outcome_not_a_silent_ok() {
        let state = serde_json::Map::new();
        let outcome = invalid_expression("hb", "not a cron expression", "bad field count", state);
        assert!(matches!(outcome, DirectiveOutcome::Failed { .. }));
    }
}
