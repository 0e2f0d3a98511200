//! W3C traceparent-compatible correlation context (spec §6).

use serde::{Deserialize, Serialize};

/// Carried on every signal via the `correlation` extension and propagated
/// unchanged to every directive and child signal a handler produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceContext {
    pub trace_id: String,
    pub span_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub causation_id: Option<String>,
}

impl TraceContext {
    /// Start a new trace: fresh trace_id, fresh span_id, no parent.
    pub fn root() -> Self {
        Self {
            trace_id: new_id(32),
            span_id: new_id(16),
            parent_span_id: None,
            causation_id: None,
        }
    }

    /// Derive the context for a signal caused by this one: same trace,
    /// new span, this span becomes the parent, this signal the cause.
    pub fn child(&self, causing_signal_id: impl Into<String>) -> Self {
        Self {
            trace_id: self.trace_id.clone(),
            span_id: new_id(16),
            parent_span_id: Some(self.span_id.clone()),
            causation_id: Some(causing_signal_id.into()),
        }
    }

    /// Format as a W3C `traceparent` header value: `version-trace_id-span_id-flags`.
    pub fn to_traceparent(&self) -> String {
        format!("00-{}-{}-01", self.trace_id, self.span_id)
    }

    /// Parse a W3C `traceparent` header value, ignoring the version and flags
    /// fields. Returns `None` if the value isn't shaped like a traceparent.
    pub fn from_traceparent(value: &str) -> Option<Self> {
        let mut parts = value.split('-');
        let _version = parts.next()?;
        let trace_id = parts.next()?;
        let span_id = parts.next()?;
        let _flags = parts.next()?;
        if trace_id.len() != 32 || span_id.len() != 16 {
            return None;
        }
        Some(Self {
            trace_id: trace_id.to_string(),
            span_id: span_id.to_string(),
            parent_span_id: None,
            causation_id: None,
        })
    }
}

fn new_id(hex_chars: usize) -> String {
    let bytes_needed = hex_chars.div_ceil(2);
    let mut out = String::with_capacity(hex_chars);
    let mut remaining = bytes_needed;
    while remaining > 0 {
        let chunk = uuid::Uuid::new_v4();
        let hex = chunk.simple().to_string();
        let take = hex.len().min(remaining * 2);
        out.push_str(&hex[..take]);
        remaining = remaining.saturating_sub(take / 2);
    }
    out.truncate(hex_chars);
    out
}

tokio::task_local! {
    /// Ambient trace context for the signal currently being processed by an
    /// agent server task, so that `tracing` spans opened deeper in the call
    /// stack (inside a strategy or directive executor) can pick it up
    /// without threading it through every function signature.
    pub static CURRENT: TraceContext;
}

/// Run `f` with `ctx` installed as the ambient trace context.
pub async fn with_context<F, Fut, T>(ctx: TraceContext, f: F) -> T
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = T>,
{
    CURRENT.scope(ctx, f()).await
}

/// The ambient trace context, if one is installed on the current task.
pub fn current() -> Option<TraceContext> {
    CURRENT.try_with(|ctx| ctx.clone()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traceparent_round_trips() {
        let ctx = TraceContext::root();
        let formatted = ctx.to_traceparent();
        let parsed = TraceContext::from_traceparent(&formatted).unwrap();
        assert_eq!(parsed.trace_id, ctx.trace_id);
        assert_eq!(parsed.span_id, ctx.span_id);
    }

    #[test]
    fn from_traceparent_rejects_malformed_value() {
        assert!(TraceContext::from_traceparent("not-a-traceparent").is_none());
    }

    #[test]
    fn child_keeps_trace_id_but_new_span() {
        let root = TraceContext::root();
        let child = root.child("sig-1");
        assert_eq!(child.trace_id, root.trace_id);
        assert_ne!(child.span_id, root.span_id);
        assert_eq!(child.parent_span_id.as_deref(), Some(root.span_id.as_str()));
        assert_eq!(child.causation_id.as_deref(), Some("sig-1"));
    }

    #[tokio::test]
    async fn ambient_context_is_scoped_to_the_task() {
        let ctx = TraceContext::root();
        let trace_id = ctx.trace_id.clone();
        with_context(ctx, || async move {
            assert_eq!(current().unwrap().trace_id, trace_id);
        })
        .await;
        assert!(current().is_none());
    }
}
