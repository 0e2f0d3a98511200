//! Instance Supervisor — the root supervision scope wiring a Registry, Task
//! Pool, Scheduler, and a dynamic supervisor of Agent Servers (spec §2,
//! §4.1). Each test or tenant gets its own `Instance`; there is no ambient
//! default (spec §9 "Global state").

pub mod registry;
pub mod scheduler;
pub mod supervisor;
pub mod task_pool;

pub use registry::DashMapRegistry;
pub use scheduler::TokioCronScheduler;
pub use supervisor::AgentSupervisor;
pub use task_pool::SemaphoreTaskPool;

use async_trait::async_trait;
use jido_core::{
    AgentHandle, AgentOptions, AgentRegistry, CronScheduler, Error, InstanceHandle,
    InstanceOptions, Result, TaskPool,
};
use jido_directives::ExecutorRegistry;
use jido_runtime::ModuleRegistry;
use serde_json::Value;
use std::sync::{Arc, OnceLock, Weak};

/// Telemetry snapshot exposed by `Instance::metrics()` (spec §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceMetrics {
    pub agent_count: usize,
    pub restarts_total: u64,
}

/// A user-owned supervision scope hosting many agent servers. Derives its
/// four children's names from `options.name` (spec §4.1).
pub struct Instance {
    options: InstanceOptions,
    registry: Arc<DashMapRegistry>,
    task_pool: Arc<SemaphoreTaskPool>,
    scheduler: Arc<TokioCronScheduler>,
    executors: Arc<ExecutorRegistry>,
    modules: ModuleRegistry,
    supervisor: Arc<AgentSupervisor>,
    weak_self: OnceLock<Weak<Instance>>,
}

impl Instance {
    /// Stand up the four named children. Register every agent module the
    /// instance should be able to `start_agent` before handing out the
    /// returned handle.
    pub fn new(options: InstanceOptions, modules: ModuleRegistry) -> Arc<Self> {
        let restart_budget = options.restart_budget;
        let instance = Arc::new(Self {
            registry: Arc::new(DashMapRegistry::new()),
            task_pool: Arc::new(SemaphoreTaskPool::new(options.task_pool_capacity)),
            scheduler: Arc::new(TokioCronScheduler::new()),
            executors: Arc::new(ExecutorRegistry::with_builtins()),
            modules,
            supervisor: Arc::new(AgentSupervisor::new(restart_budget)),
            weak_self: OnceLock::new(),
            options,
        });
        instance
            .weak_self
            .set(Arc::downgrade(&instance))
            .unwrap_or(());
        instance
    }

    /// An `Arc<dyn InstanceHandle>` pointing back at this same instance, the
    /// shape directive executors and agent servers need (spec §4.1, `handle.rs`
    /// "breaks the circular dependency").
    fn self_handle(&self) -> Arc<dyn InstanceHandle> {
        self.weak_self
            .get()
            .and_then(Weak::upgrade)
            .expect("Instance is only ever constructed via Instance::new, which sets weak_self")
    }

    pub fn name(&self) -> &str {
        &self.options.name
    }

    /// Deterministic per-instance child name (spec §4.1: "derive names
    /// deterministically from the instance name").
    pub fn child_name(&self, child: &str) -> String {
        self.options.child_name(child)
    }

    /// Start an agent under this instance. Auto-generates an id when
    /// `opts.id` is absent; fails with `already_started` on a collision
    /// (spec §6, §8 invariant 3).
    pub async fn start_agent(
        &self,
        module: impl Into<String>,
        opts: AgentOptions,
    ) -> Result<Arc<dyn AgentHandle>> {
        let module_name = module.into();
        let module_impl = self
            .modules
            .get(&module_name)
            .ok_or_else(|| Error::not_found(format!("module '{module_name}'")))?;

        let id = opts
            .id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        if self.registry.contains(&id) {
            return Err(Error::already_started(id));
        }

        let mut opts = opts;
        opts.id = Some(id.clone());

        let (handle, join) = jido_runtime::spawn(
            id.clone(),
            module_impl,
            opts.clone(),
            self.executors.clone(),
            self.self_handle(),
        );
        self.registry.insert(id.clone(), handle.clone());

        self.supervisor.clone().watch(
            id,
            module_name,
            opts,
            join,
            self.registry.clone(),
            self.modules.clone(),
            self.executors.clone(),
            self.self_handle(),
        );

        Ok(handle)
    }

    /// Stop an agent by id. `{error, not_found}` if no such agent is live
    /// (spec §6, §8 idempotence).
    pub async fn stop_agent(&self, id: &str) -> Result<()> {
        let Some(handle) = self.registry.whereis(id) else {
            return Err(Error::not_found(id.to_string()));
        };
        handle.stop("stop_agent".to_string()).await?;
        self.registry.remove(id);
        Ok(())
    }

    pub fn whereis(&self, id: &str) -> Option<Arc<dyn AgentHandle>> {
        self.registry.whereis(id)
    }

    pub fn list_agents(&self) -> Vec<String> {
        self.registry.list_agents()
    }

    pub fn agent_count(&self) -> usize {
        self.registry.agent_count()
    }

    /// Telemetry counters for this instance (spec §4.1: "agent_count,
    /// dropped_directives_total, restarts_total exposed via
    /// Instance::metrics()"). Per-agent dropped-directive counts live on
    /// each agent server's own `status()`; this aggregates the counters an
    /// `Instance` itself owns.
    pub fn metrics(&self) -> InstanceMetrics {
        InstanceMetrics {
            agent_count: self.agent_count(),
            restarts_total: self.supervisor.total_restarts(),
        }
    }

    /// Tear down every running agent, best-effort, in no particular order
    /// (spec §4.1: "Instance::shutdown() tears down all four children").
    /// Agents that are already mid-exit are tolerated: a `not_found` from a
    /// racing `stop_agent` is not an error during shutdown.
    pub async fn shutdown(&self) {
        for id in self.registry.list_agents() {
            if let Err(err) = self.stop_agent(&id).await {
                tracing::debug!(agent_id = %id, %err, "shutdown: agent already gone");
            }
        }
    }
}

#[async_trait]
impl InstanceHandle for Instance {
    fn registry(&self) -> &dyn AgentRegistry {
        self.registry.as_ref()
    }

    fn task_pool(&self) -> &dyn TaskPool {
        self.task_pool.as_ref()
    }

    fn scheduler(&self) -> &dyn CronScheduler {
        self.scheduler.as_ref()
    }

    async fn start_agent(&self, module: String, opts: Value) -> Result<Arc<dyn AgentHandle>> {
        let opts: AgentOptions = if opts.is_null() {
            AgentOptions::default()
        } else {
            serde_json::from_value(opts)?
        };
        Instance::start_agent(self, module, opts).await
    }

    async fn stop_agent(&self, id: &str) -> Result<()> {
        Instance::stop_agent(self, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jido_core::Signal;
    use jido_runtime::GenericModule;
    use jido_strategy::Direct;
    use std::sync::Arc as StdArc;

    fn echo_modules() -> ModuleRegistry {
        let mut modules = ModuleRegistry::new();
        let strategy = StdArc::new(Direct::new().with_action(
            "ping",
            StdArc::new(|agent, params, _ctx| {
                let n = params.get("n").cloned().unwrap_or(Value::Null);
                let directive = jido_core::Directive::Emit {
                    signal: Signal::new("pong", &agent.id, serde_json::json!({"n": n})),
                    dispatch: None,
                };
                (agent, vec![directive])
            }),
        ));
        modules.register(
            GenericModule::new("Echo", strategy).with_route("ping", "ping"),
        );
        modules
    }

    #[tokio::test]
    async fn start_agent_auto_generates_an_id_and_registers_it() {
        let instance = Instance::new(InstanceOptions::default(), echo_modules());
        let handle = instance
            .start_agent("Echo", AgentOptions::default())
            .await
            .unwrap();
        assert_eq!(instance.agent_count(), 1);
        assert!(instance.whereis(handle.id()).is_some());
    }

    #[tokio::test]
    async fn start_agent_with_a_duplicate_id_fails_already_started() {
        let instance = Instance::new(InstanceOptions::default(), echo_modules());
        let opts = AgentOptions {
            id: Some("echo-1".into()),
            ..Default::default()
        };
        instance.start_agent("Echo", opts.clone()).await.unwrap();
        let result = instance.start_agent("Echo", opts).await;
        assert!(matches!(result, Err(Error::AlreadyStarted(_))));
    }

    #[tokio::test]
    async fn stop_agent_on_an_unknown_id_is_not_found() {
        let instance = Instance::new(InstanceOptions::default(), echo_modules());
        let result = instance.stop_agent("never-started").await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn ping_pong_round_trip_through_call() {
        let instance = Instance::new(InstanceOptions::default(), echo_modules());
        let opts = AgentOptions {
            id: Some("echo".into()),
            ..Default::default()
        };
        let handle = instance.start_agent("Echo", opts).await.unwrap();

        let ping = Signal::new("ping", "test", serde_json::json!({"n": 7}));
        let result = handle.call(ping, 200).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn metrics_reports_agent_count_and_zero_restarts_when_healthy() {
        let instance = Instance::new(InstanceOptions::default(), echo_modules());
        instance
            .start_agent("Echo", AgentOptions::default())
            .await
            .unwrap();

        let metrics = instance.metrics();
        assert_eq!(metrics.agent_count, 1);
        assert_eq!(metrics.restarts_total, 0);
    }

    #[tokio::test]
    async fn shutdown_stops_every_running_agent() {
        let instance = Instance::new(InstanceOptions::default(), echo_modules());
        instance
            .start_agent("Echo", AgentOptions::default())
            .await
            .unwrap();
        instance
            .start_agent("Echo", AgentOptions::default())
            .await
            .unwrap();
        assert_eq!(instance.agent_count(), 2);

        instance.shutdown().await;
        assert_eq!(instance.agent_count(), 0);
    }
}
