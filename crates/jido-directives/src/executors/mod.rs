//! One handler module per built-in directive kind (spec §4.3).

pub mod cron;
pub mod cron_cancel;
pub mod emit;
pub mod error;
pub mod schedule;
pub mod spawn_agent;
pub mod stop;
pub mod stop_child;

/// Propagate trace context from the input signal onto an outgoing signal:
/// same `trace_id`, new child `span_id`, `parent_span_id` = input's
/// `span_id`, `causation_id` = input signal's id (spec §4.3, §4.6).
pub(crate) fn propagate_trace(input_signal: &jido_core::Signal, outgoing: &mut jido_core::Signal) {
    let parent_ctx = input_signal
        .trace_context()
        .unwrap_or_else(jido_core::TraceContext::root);
    let child_ctx = parent_ctx.child(input_signal.id.clone());
    outgoing.set_trace_context(&child_ctx);
}
