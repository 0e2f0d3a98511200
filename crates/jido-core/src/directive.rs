//! Directive — pure description of a side effect, emitted by a strategy and
//! carried out by a directive executor (spec §3, §4.3).

use crate::signal::Signal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Dispatch configuration for an `Emit` directive. Opaque to the core:
/// executors interpret it, the default comes from the server's
/// `default_dispatch` option.
pub type Dispatch = Value;

/// Pure data describing a side effect to perform after the pure transition.
/// New variants outside this built-in set are dispatched the same way by an
/// `ExecutorRegistry` keyed on `kind()`; the built-in set is closed here, as
/// spec §9 requires ("keep the built-in set closed at the core").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Directive {
    /// Publish `signal` via `dispatch` (or the server's default).
    Emit {
        signal: Signal,
        #[serde(default)]
        dispatch: Option<Dispatch>,
    },

    /// Send `message` to self after `delay_ms`.
    Schedule { delay_ms: u64, message: Signal },

    /// Upsert a cron job that casts `message` to this agent on each tick.
    Cron {
        job_id: String,
        expression: String,
        message: Signal,
        #[serde(default)]
        timezone: Option<String>,
    },

    /// Remove a cron job by logical id; unknown ids are a no-op.
    CronCancel { job_id: String },

    /// Start a child agent under the same Instance, recorded under `tag`.
    SpawnAgent {
        module: String,
        tag: String,
        #[serde(default)]
        opts: Value,
        #[serde(default)]
        parent_meta: Value,
    },

    /// Terminate a tracked child, looked up by tag or pid.
    StopChild {
        #[serde(default)]
        tag: Option<String>,
        #[serde(default)]
        pid: Option<String>,
        reason: String,
    },

    /// Stop this agent.
    Stop { reason: String },

    /// Surface a structured error to the configured error policy.
    Error {
        error: String,
        #[serde(default)]
        context: Value,
    },
}

impl Directive {
    /// The dispatch tag this directive carries, used by the executor
    /// registry to route to a handler.
    pub fn kind(&self) -> &'static str {
        match self {
            Directive::Emit { .. } => "emit",
            Directive::Schedule { .. } => "schedule",
            Directive::Cron { .. } => "cron",
            Directive::CronCancel { .. } => "cron_cancel",
            Directive::SpawnAgent { .. } => "spawn_agent",
            Directive::StopChild { .. } => "stop_child",
            Directive::Stop { .. } => "stop",
            Directive::Error { .. } => "error",
        }
    }
}

/// The result of running one directive through its executor (spec §4.2,
/// drain step).
#[derive(Debug, Clone)]
pub enum DirectiveOutcome {
    /// Committed state; continue draining.
    Ok(serde_json::Map<String, Value>),
    /// Committed state; an async task was started in the task pool. Its
    /// completion re-enters the agent's intake as a fresh signal rather
    /// than resolving this outcome directly.
    Async(serde_json::Map<String, Value>),
    /// The directive itself could not be carried out (e.g. a malformed
    /// cron expression, spec §4.3 "Invalid expressions yield `Error`").
    /// State is unchanged; the server routes `error` through the same
    /// `error_policy` machinery as an explicit `Directive::Error`.
    Failed {
        error: String,
        context: Value,
        state: serde_json::Map<String, Value>,
    },
    /// Cease draining and terminate the server with `reason`.
    Stop {
        reason: String,
        state: serde_json::Map<String, Value>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_wire_tag() {
        let d = Directive::Stop {
            reason: "done".into(),
        };
        assert_eq!(d.kind(), "stop");
        let v = serde_json::to_value(&d).unwrap();
        assert_eq!(v["kind"], "stop");
    }

    #[test]
    fn cron_cancel_round_trips_through_json() {
        let d = Directive::CronCancel {
            job_id: "hb".into(),
        };
        let v = serde_json::to_value(&d).unwrap();
        let back: Directive = serde_json::from_value(v).unwrap();
        assert_eq!(back.kind(), "cron_cancel");
    }
}
