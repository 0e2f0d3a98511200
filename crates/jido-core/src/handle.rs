//! Trait abstractions that let directive executors and agent servers call
//! back into instance-level services (registry, task pool, scheduler,
//! supervisor) without `jido-runtime` or `jido-directives` depending on
//! `jido-instance`.
//!
//! This breaks the circular dependency: executors need the instance,
//! the instance needs executors.

use crate::agent::Agent;
use crate::error::Result;
use crate::signal::Signal;
use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A live reference to a running agent server, opaque outside `jido-runtime`.
#[async_trait]
pub trait AgentHandle: Send + Sync {
    fn id(&self) -> &str;

    /// Fire-and-forget delivery into the agent's intake.
    async fn cast(&self, signal: Signal) -> Result<()>;

    /// Synchronous call: waits for the pure transition to commit.
    async fn call(&self, signal: Signal, timeout_ms: u64) -> Result<Agent>;

    /// Request termination with the given reason.
    async fn stop(&self, reason: String) -> Result<()>;
}

/// Unique-key name service mapping agent ids to live handles within an
/// instance (spec §4.1 `Registry`).
pub trait AgentRegistry: Send + Sync {
    fn whereis(&self, id: &str) -> Option<Arc<dyn AgentHandle>>;
    fn list_agents(&self) -> Vec<String>;
    fn agent_count(&self) -> usize;
}

/// Bounded worker pool for asynchronous work spawned by directive executors
/// (spec §4.1 `TaskPool`). Guarantees release of the slot regardless of how
/// the future completes.
pub trait TaskPool: Send + Sync {
    /// Submit `task` for execution; returns immediately. The task runs to
    /// completion or crash; it is never cancelled by the pool.
    fn spawn(&self, task: Pin<Box<dyn Future<Output = ()> + Send>>);
}

/// Produces a fresh task future on every tick; a plain one-shot future
/// cannot be re-run, so the scheduler needs a factory rather than a value.
pub type CronTask = Arc<dyn Fn() -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Cron/timer service used by time-based directives, one per instance
/// (spec §4.1 `Scheduler`).
pub trait CronScheduler: Send + Sync {
    /// Upsert a job: compile `expression` (5-field cron or `@daily` etc.),
    /// and arrange for `task()` to run at every tick until deleted or
    /// replaced.
    fn upsert_job(
        &self,
        name: String,
        expression: String,
        timezone: Option<String>,
        task: CronTask,
    ) -> Result<()>;

    /// Delete a job by name; unknown names are a no-op.
    fn delete_job(&self, name: &str);
}

/// The instance-level surface a directive executor needs: start/stop agents,
/// reach the registry, task pool, and scheduler (spec §4.1, §4.3).
#[async_trait]
pub trait InstanceHandle: Send + Sync {
    fn registry(&self) -> &dyn AgentRegistry;
    fn task_pool(&self) -> &dyn TaskPool;
    fn scheduler(&self) -> &dyn CronScheduler;

    /// Start a child agent under this instance, auto-generating an id when
    /// `opts["id"]` is absent.
    async fn start_agent(
        &self,
        module: String,
        opts: Value,
    ) -> Result<Arc<dyn AgentHandle>>;

    /// Stop an agent by id; `{error, not_found}` if no such agent is live.
    async fn stop_agent(&self, id: &str) -> Result<()>;
}
