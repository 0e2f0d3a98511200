//! Agent supervisor — restarts agent server tasks that crash, rate-limited
//! (spec §4.1 "AgentSupervisor": "restarting agent servers with rate-limit
//! (e.g. 1000 restarts / 5 s)").
//!
//! A plain tokio task has no restart concept of its own, unlike the
//! supervision trees this spec's source system assumes. This watches each
//! server's `JoinHandle` and only respawns on a panic — a deliberate
//! `Stop`/`stop_agent` exit is a normal completion, not a crash, and is never
//! restarted (spec §8 scenario 4's termination is exactly such a case).

use jido_core::{AgentOptions, InstanceHandle, RestartBudget};
use jido_directives::ExecutorRegistry;
use jido_runtime::ModuleRegistry;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::registry::DashMapRegistry;

/// Tracks recent restarts against a sliding-window budget and respawns
/// panicked agent server tasks under it. One per `Instance`.
pub struct AgentSupervisor {
    budget: RestartBudget,
    recent_restarts: Mutex<VecDeque<Instant>>,
    total_restarts: AtomicU64,
}

impl AgentSupervisor {
    pub fn new(budget: RestartBudget) -> Self {
        Self {
            budget,
            recent_restarts: Mutex::new(VecDeque::new()),
            total_restarts: AtomicU64::new(0),
        }
    }

    /// Lifetime restart count, exposed via `Instance::metrics()` (spec §4.1).
    pub fn total_restarts(&self) -> u64 {
        self.total_restarts.load(Ordering::Relaxed)
    }

    /// Record a restart attempt and report whether the budget still allows
    /// one (spec §4.1's "1000 restarts / 5 s" default, sliding window).
    async fn try_consume_restart(&self) -> bool {
        let now = Instant::now();
        let window = Duration::from_secs(self.budget.within_secs);
        let mut restarts = self.recent_restarts.lock().await;
        while let Some(&front) = restarts.front() {
            if now.duration_since(front) > window {
                restarts.pop_front();
            } else {
                break;
            }
        }
        if restarts.len() as u32 >= self.budget.max_restarts {
            false
        } else {
            restarts.push_back(now);
            true
        }
    }

    /// Watch a freshly spawned agent server. On normal completion, just
    /// deregisters it. On a panic, deregisters, consumes one unit of the
    /// restart budget, and — if the budget and the module registration both
    /// still allow it — respawns an identical agent under the same id.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn watch(
        self: Arc<Self>,
        id: String,
        module: String,
        opts: AgentOptions,
        mut join: tokio::task::JoinHandle<()>,
        registry: Arc<DashMapRegistry>,
        modules: ModuleRegistry,
        executors: Arc<ExecutorRegistry>,
        instance: Arc<dyn InstanceHandle>,
    ) {
        tokio::spawn(async move {
            loop {
                let result = (&mut join).await;
                registry.remove(&id);

                match result {
                    Ok(()) => {
                        tracing::info!(agent_id = %id, "agent server exited normally");
                        break;
                    }
                    Err(join_err) if join_err.is_panic() => {
                        tracing::warn!(agent_id = %id, "agent server panicked");

                        if !self.try_consume_restart().await {
                            tracing::error!(agent_id = %id, "restart budget exhausted, not restarting");
                            break;
                        }

                        let Some(module_impl) = modules.get(&module) else {
                            tracing::error!(
                                agent_id = %id,
                                module = %module,
                                "cannot restart: module no longer registered"
                            );
                            break;
                        };

                        let (handle, new_join) = jido_runtime::spawn(
                            id.clone(),
                            module_impl,
                            opts.clone(),
                            executors.clone(),
                            instance.clone(),
                        );
                        registry.insert(id.clone(), handle);
                        self.total_restarts.fetch_add(1, Ordering::Relaxed);
                        join = new_join;
                    }
                    Err(_cancelled) => {
                        tracing::info!(agent_id = %id, "agent server task was cancelled");
                        break;
                    }
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn restart_budget_allows_up_to_max_restarts_then_blocks() {
        let supervisor = AgentSupervisor::new(RestartBudget {
            max_restarts: 2,
            within_secs: 5,
        });
        assert!(supervisor.try_consume_restart().await);
        assert!(supervisor.try_consume_restart().await);
        assert!(!supervisor.try_consume_restart().await);
    }

    #[tokio::test]
    async fn restart_budget_resets_after_the_window_elapses() {
        let supervisor = AgentSupervisor::new(RestartBudget {
            max_restarts: 1,
            within_secs: 0,
        });
        assert!(supervisor.try_consume_restart().await);
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(supervisor.try_consume_restart().await);
    }

    #[test]
    fn total_restarts_starts_at_zero() {
        let supervisor = AgentSupervisor::new(RestartBudget::default());
        assert_eq!(supervisor.total_restarts(), 0);
    }
}
