//! Observability tracer seam (spec §1: "assumed: a pluggable interface
//! emitting start/stop/exception spans"). The core only defines the trait
//! and a `tracing`-delegating default; a real backend (OTel exporter, a
//! vendor SDK) is an external collaborator.

use crate::trace::TraceContext;

/// Emits spans for an agent server's directive execution (spec §4.6). Wired
/// in alongside a `Validator`: a module that wants real span export supplies
/// its own impl.
pub trait Tracer: Send + Sync {
    fn on_start(&self, ctx: &TraceContext, name: &str);
    fn on_stop(&self, ctx: &TraceContext, name: &str);
    fn on_exception(&self, ctx: &TraceContext, name: &str, error: &str);
}

/// The default tracer: delegates to `tracing`'s own span machinery.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTracer;

impl Tracer for TracingTracer {
    fn on_start(&self, ctx: &TraceContext, name: &str) {
        tracing::debug!(trace_id = %ctx.trace_id, span_id = %ctx.span_id, name, "span start");
    }

    fn on_stop(&self, ctx: &TraceContext, name: &str) {
        tracing::debug!(trace_id = %ctx.trace_id, span_id = %ctx.span_id, name, "span stop");
    }

    fn on_exception(&self, ctx: &TraceContext, name: &str, error: &str) {
        tracing::warn!(trace_id = %ctx.trace_id, span_id = %ctx.span_id, name, error, "span exception");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracing_tracer_does_not_panic_on_any_call() {
        let ctx = TraceContext::root();
        let tracer = TracingTracer;
        tracer.on_start(&ctx, "directive.emit");
        tracer.on_stop(&ctx, "directive.emit");
        tracer.on_exception(&ctx, "directive.emit", "boom");
    }
}
