//! CronCancel — remove a cron job by logical id (spec §4.3). Unknown ids
//! are a no-op (spec §8 idempotence).

use crate::executors::cron::job_name;
use crate::registry::{DirectiveExecutor, ExecutionContext};
use jido_core::{Directive, DirectiveOutcome, Signal};

pub struct CronCancelExecutor;

#[async_trait::async_trait]
impl DirectiveExecutor for CronCancelExecutor {
    fn kind(&self) -> &'static str {
        "cron_cancel"
    }

    async fn execute(
        &self,
        directive: &Directive,
        _input_signal: &Signal,
        state: serde_json::Map<String, serde_json::Value>,
        ctx: &ExecutionContext<'_>,
    ) -> DirectiveOutcome {
        let Directive::CronCancel { job_id } = directive else {
            unreachable!("ExecutorRegistry only routes CronCancel directives here")
        };

        let name = job_name(ctx.agent_id, job_id);
        ctx.instance.scheduler().delete_job(&name);
        DirectiveOutcome::Ok(state)
    }
}
