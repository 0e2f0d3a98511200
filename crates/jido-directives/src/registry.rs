//! Directive executor dispatch: tag → executor, mirroring the teacher's
//! `Tool`/`ToolRegistry` name-keyed dispatch (spec §4.3, §9 "dynamic
//! dispatch on directives").

use jido_core::{Directive, DirectiveOutcome, InstanceHandle, Signal};
use std::collections::HashMap;
use std::sync::Arc;

/// The owning agent server's identity and its instance-level services,
/// handed to every executor so it can name cron jobs, spawn children under
/// the right parent, and deliver scheduled messages back to itself.
///
/// `instance` is an `Arc` rather than a borrow because executors that
/// register recurring work (cron jobs) must capture it in a `'static`
/// closure that outlives this call.
pub struct ExecutionContext<'a> {
    pub agent_id: &'a str,
    pub instance: Arc<dyn InstanceHandle>,
}

/// A handler for one directive kind: `(directive, input_signal, state) →
/// ok(state') | async(state') | stop(reason, state')`.
#[async_trait::async_trait]
pub trait DirectiveExecutor: Send + Sync {
    /// The tag this executor handles, matching `Directive::kind()`.
    fn kind(&self) -> &'static str;

    async fn execute(
        &self,
        directive: &Directive,
        input_signal: &Signal,
        state: serde_json::Map<String, serde_json::Value>,
        ctx: &ExecutionContext<'_>,
    ) -> DirectiveOutcome;
}

/// Registers one executor per directive kind. New directive kinds (built-in
/// or third-party) are added without touching the agent server.
#[derive(Clone, Default)]
pub struct ExecutorRegistry {
    executors: HashMap<&'static str, Arc<dyn DirectiveExecutor>>,
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an executor. Replaces any existing executor for the same
    /// kind.
    pub fn register(&mut self, executor: impl DirectiveExecutor + 'static) {
        self.executors.insert(executor.kind(), Arc::new(executor));
    }

    pub fn get(&self, kind: &str) -> Option<Arc<dyn DirectiveExecutor>> {
        self.executors.get(kind).cloned()
    }

    /// Dispatch one directive to its executor. Unregistered kinds log and
    /// fall through as a no-op commit, matching spec §4.7's "never poisons
    /// the queue" guarantee.
    pub async fn execute(
        &self,
        directive: &Directive,
        input_signal: &Signal,
        state: serde_json::Map<String, serde_json::Value>,
        ctx: &ExecutionContext<'_>,
    ) -> DirectiveOutcome {
        match self.executors.get(directive.kind()) {
            Some(executor) => executor.execute(directive, input_signal, state, ctx).await,
            None => {
                tracing::warn!(kind = directive.kind(), "no executor registered for directive kind");
                DirectiveOutcome::Ok(state)
            }
        }
    }

    /// Install every built-in executor (spec §4.3). The default set any
    /// instance should start with.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(crate::executors::emit::EmitExecutor);
        registry.register(crate::executors::schedule::ScheduleExecutor);
        registry.register(crate::executors::cron::CronExecutor);
        registry.register(crate::executors::cron_cancel::CronCancelExecutor);
        registry.register(crate::executors::spawn_agent::SpawnAgentExecutor);
        registry.register(crate::executors::stop_child::StopChildExecutor);
        registry.register(crate::executors::stop::StopExecutor);
        registry.register(crate::executors::error::ErrorExecutor);
        registry
    }
}
