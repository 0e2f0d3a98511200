//! Signal — the immutable structured message every agent consumes and emits
//! (spec §3, §6).

use crate::trace::TraceContext;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Extension key under which trace context travels inside [`Signal::extensions`].
pub const CORRELATION_EXTENSION: &str = "correlation";

/// Dotted, namespaced lifecycle signal types the runtime itself emits.
pub mod lifecycle {
    pub const CHILD_STARTED: &str = "jido.agent.child.started";
    pub const CHILD_EXIT: &str = "jido.agent.child.exit";
    pub const ORPHANED: &str = "jido.agent.orphaned";
    pub const ERROR: &str = "jido.agent.error";
    pub const CRON_TICK: &str = "jido.agent.cron.tick";
}

/// An immutable structured message: `{ id, type, source, data, extensions }`.
///
/// `type` is a non-empty dotted identifier (e.g. `user.message`,
/// `jido.agent.child.exit`). `extensions` carries opaque per-plugin maps,
/// including the `correlation` extension holding trace context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub source: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub extensions: Map<String, Value>,
}

impl Signal {
    /// Build a new signal with a fresh uuid v4 id and empty extensions.
    pub fn new(kind: impl Into<String>, source: impl Into<String>, data: Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind: kind.into(),
            source: source.into(),
            data,
            extensions: Map::new(),
        }
    }

    /// A signal carrying no payload, useful for pings/casts.
    pub fn bare(kind: impl Into<String>) -> Self {
        Self::new(kind, "jido", Value::Null)
    }

    /// Reject malformed signals at intake (spec §4.2 step 2): `type` must be
    /// a non-empty dotted identifier and `id`/`source` must be non-empty.
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.id.is_empty() {
            return Err(crate::Error::validation("signal id must not be empty"));
        }
        if self.kind.is_empty() {
            return Err(crate::Error::validation("signal type must not be empty"));
        }
        if self.source.is_empty() {
            return Err(crate::Error::validation("signal source must not be empty"));
        }
        Ok(())
    }

    pub fn trace_context(&self) -> Option<TraceContext> {
        self.extensions
            .get(CORRELATION_EXTENSION)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn with_trace_context(mut self, ctx: &TraceContext) -> Self {
        self.set_trace_context(ctx);
        self
    }

    pub fn set_trace_context(&mut self, ctx: &TraceContext) {
        self.extensions.insert(
            CORRELATION_EXTENSION.to_string(),
            serde_json::to_value(ctx).expect("TraceContext always serializes"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_empty_type() {
        let mut s = Signal::new("ping", "test", Value::Null);
        s.kind.clear();
        assert!(s.validate().is_err());
    }

    #[test]
    fn validate_accepts_well_formed_signal() {
        let s = Signal::new("user.message", "test", serde_json::json!({"n": 7}));
        assert!(s.validate().is_ok());
    }

    #[test]
    fn trace_context_round_trips_through_extensions() {
        let ctx = TraceContext::root();
        let signal = Signal::new("ping", "test", Value::Null).with_trace_context(&ctx);
        let recovered = signal.trace_context().unwrap();
        assert_eq!(recovered.trace_id, ctx.trace_id);
        assert_eq!(recovered.span_id, ctx.span_id);
    }
}
