//! Agent and instance configuration (spec §6 `opts`, §4.1, §4.7).

use crate::directive::Directive;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Outcome of a user-supplied error handler (spec §7: "A user-supplied
/// callable receiving `(error_directive, state)` and returning
/// `ok(state′) | stop(reason, state′)`").
pub enum ErrorHandlerOutcome {
    Ok(Map<String, Value>),
    Stop {
        reason: String,
        state: Map<String, Value>,
    },
}

/// A user-supplied error policy callable (spec §7's fifth policy kind).
pub type ErrorHandler =
    Arc<dyn Fn(&Directive, &Map<String, Value>) -> ErrorHandlerOutcome + Send + Sync>;

/// Wraps an [`ErrorHandler`] so `AgentOptions` can still derive `Debug`; a
/// bare `Arc<dyn Fn>` has no `Debug` impl of its own. Kept out of
/// `ErrorPolicy` itself (and excluded from (de)serialization) because a
/// closure cannot round-trip through `serde` the way the other four,
/// config-loadable policies do — this one is set programmatically only.
#[derive(Clone)]
pub struct CustomErrorHandler(pub ErrorHandler);

impl std::fmt::Debug for CustomErrorHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CustomErrorHandler(..)")
    }
}

/// What an agent server does when its registered parent process exits
/// (spec §4.2 "Hierarchy").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnParentDeath {
    Stop,
    Continue,
    EmitOrphan,
}

impl Default for OnParentDeath {
    fn default() -> Self {
        Self::Stop
    }
}

/// The error policy an agent server applies to internal (`strategy`,
/// `directive`) errors (spec §7).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ErrorPolicy {
    LogOnly,
    StopOnError,
    EmitSignal { dispatch: Value },
    MaxErrors { n: u64 },
}

impl Default for ErrorPolicy {
    fn default() -> Self {
        Self::LogOnly
    }
}

/// Options accepted by `start_agent` (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentOptions {
    pub id: Option<String>,
    pub initial_state: Map<String, Value>,
    pub parent: Option<ParentRef>,
    pub on_parent_death: OnParentDeath,
    pub default_dispatch: Option<Value>,
    pub error_policy: ErrorPolicy,
    pub max_queue_size: usize,
    /// Overrides `error_policy` with a programmatic callable when set
    /// (spec §7's fifth policy kind). Never (de)serialized.
    #[serde(skip)]
    pub custom_error_handler: Option<CustomErrorHandler>,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            id: None,
            initial_state: Map::new(),
            parent: None,
            on_parent_death: OnParentDeath::default(),
            default_dispatch: None,
            error_policy: ErrorPolicy::default(),
            max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
            custom_error_handler: None,
        }
    }
}

/// Default `max_queue_size` (spec §6).
pub const DEFAULT_MAX_QUEUE_SIZE: usize = 10_000;

/// Default `call` timeout in milliseconds (spec §6).
pub const DEFAULT_CALL_TIMEOUT_MS: u64 = 5_000;

/// Restart rate-limit applied by the `AgentSupervisor` (spec §4.1): at most
/// `max_restarts` within `within_secs`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RestartBudget {
    pub max_restarts: u32,
    pub within_secs: u64,
}

impl Default for RestartBudget {
    fn default() -> Self {
        Self {
            max_restarts: 1000,
            within_secs: 5,
        }
    }
}

/// `{pid, id, tag, meta}` reference to a registered parent agent (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParentRef {
    pub id: String,
    pub tag: String,
    #[serde(default)]
    pub meta: Value,
}

/// Options for an Instance Supervisor (spec §4.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceOptions {
    pub name: String,
    pub task_pool_capacity: usize,
    pub restart_budget: RestartBudget,
}

impl Default for InstanceOptions {
    fn default() -> Self {
        Self {
            name: "jido".to_string(),
            task_pool_capacity: DEFAULT_TASK_POOL_CAPACITY,
            restart_budget: RestartBudget::default(),
        }
    }
}

/// Default bound on the instance-wide task pool.
pub const DEFAULT_TASK_POOL_CAPACITY: usize = 64;

impl InstanceOptions {
    /// Derive the deterministic child name for one of the instance's four
    /// named children (spec §4.1: "derive names deterministically from the
    /// instance name").
    pub fn child_name(&self, child: &str) -> String {
        format!("{}.{}", self.name, child)
    }

    /// Overlay values supplied via `JIDO_*` environment variables onto a set
    /// of already-constructed defaults, matching the `JIDO_TASK_POOL_CAPACITY`
    /// / `JIDO_INSTANCE_NAME` style used for ambient deployment config.
    pub fn from_env_overlay(mut self) -> Self {
        if let Ok(name) = std::env::var("JIDO_INSTANCE_NAME") {
            self.name = name;
        }
        if let Ok(cap) = std::env::var("JIDO_TASK_POOL_CAPACITY") {
            if let Ok(cap) = cap.parse() {
                self.task_pool_capacity = cap;
            }
        }
        if let Ok(max) = std::env::var("JIDO_MAX_RESTARTS") {
            if let Ok(max) = max.parse() {
                self.restart_budget.max_restarts = max;
            }
        }
        self
    }

    /// Load instance options from a JSON file, falling back to defaults for
    /// any field the file omits (spec §6 "config loaders").
    pub fn from_file(path: impl AsRef<std::path::Path>) -> std::io::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_options_default_matches_spec() {
        let opts = AgentOptions::default();
        assert_eq!(opts.max_queue_size, 10_000);
        assert_eq!(opts.on_parent_death, OnParentDeath::Stop);
    }

    #[test]
    fn restart_budget_default_is_1000_per_5s() {
        let budget = RestartBudget::default();
        assert_eq!(budget.max_restarts, 1000);
        assert_eq!(budget.within_secs, 5);
    }

    #[test]
    fn child_name_is_deterministic() {
        let opts = InstanceOptions {
            name: "checkout".into(),
            ..Default::default()
        };
        assert_eq!(opts.child_name("registry"), "checkout.registry");
    }

    #[test]
    fn from_file_overlays_onto_defaults() {
        let mut path = std::env::temp_dir();
        path.push(format!("jido-config-test-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"name": "billing", "task_pool_capacity": 8}"#).unwrap();

        let opts = InstanceOptions::from_file(&path).unwrap();
        assert_eq!(opts.name, "billing");
        assert_eq!(opts.task_pool_capacity, 8);
        assert_eq!(opts.restart_budget.max_restarts, 1000);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn from_file_missing_path_is_an_io_error() {
        let result = InstanceOptions::from_file("/nonexistent/jido-config.json");
        assert!(result.is_err());
    }
}
