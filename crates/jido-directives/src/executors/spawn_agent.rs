//! SpawnAgent — start a child agent under the same Instance, recorded under
//! `tag` (spec §4.2 "Hierarchy", §4.3).

use super::propagate_trace;
use crate::registry::{DirectiveExecutor, ExecutionContext};
use jido_core::{lifecycle, Directive, DirectiveOutcome, Signal};

/// Deterministic child id: `parent_id/tag` unless `opts.id` overrides it
/// (spec §4.2).
pub fn child_id(parent_id: &str, tag: &str, opts: &serde_json::Value) -> String {
    opts.get("id")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("{parent_id}/{tag}"))
}

pub struct SpawnAgentExecutor;

#[async_trait::async_trait]
impl DirectiveExecutor for SpawnAgentExecutor {
    fn kind(&self) -> &'static str {
        "spawn_agent"
    }

    async fn execute(
        &self,
        directive: &Directive,
        input_signal: &Signal,
        state: serde_json::Map<String, serde_json::Value>,
        ctx: &ExecutionContext<'_>,
    ) -> DirectiveOutcome {
        let Directive::SpawnAgent {
            module,
            tag,
            opts,
            parent_meta,
        } = directive
        else {
            unreachable!("ExecutorRegistry only routes SpawnAgent directives here")
        };

        let id = child_id(ctx.agent_id, tag, opts);
        let mut child_opts = if opts.is_object() {
            opts.clone()
        } else {
            serde_json::Value::Object(serde_json::Map::new())
        };
        child_opts["id"] = serde_json::Value::String(id.clone());
        // Give the child a `ParentRef` back to us so its own `terminate()`
        // can cast `jido.agent.child.exit` into our intake (spec §4.2).
        child_opts["parent"] = serde_json::json!({
            "id": ctx.agent_id,
            "tag": tag,
            "meta": parent_meta,
        });

        match ctx.instance.start_agent(module.clone(), child_opts).await {
            Ok(_handle) => {
                let mut started = Signal::new(
                    lifecycle::CHILD_STARTED,
                    ctx.agent_id,
                    serde_json::json!({"tag": tag, "id": id}),
                );
                propagate_trace(input_signal, &mut started);
                if let Some(parent) = ctx.instance.registry().whereis(ctx.agent_id) {
                    if let Err(err) = parent.cast(started).await {
                        tracing::warn!(error = %err, "failed to notify parent of spawned child");
                    }
                }
                DirectiveOutcome::Ok(state)
            }
            Err(err) => {
                tracing::warn!(error = %err, tag, "spawn_agent failed");
                DirectiveOutcome::Ok(state)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_id_defaults_to_parent_slash_tag() {
        assert_eq!(child_id("orchestrator", "w1", &serde_json::Value::Null), "orchestrator/w1");
    }

    #[test]
    fn child_id_honors_explicit_override() {
        let opts = serde_json::json!({"id": "custom"});
        assert_eq!(child_id("orchestrator", "w1", &opts), "custom");
    }

    /// Regression test for the `child_opts["parent"]` wiring the executor
    /// builds inline in `execute` (spec §4.2): without it, a spawned child
    /// never has a `ParentRef` and so never tells its parent it exited.
    #[test]
    fn child_opts_parent_shape_matches_parent_ref_fields() {
        let parent_meta = serde_json::json!({"note": "hi"});
        let child_opts = serde_json::json!({
            "id": "orchestrator/w1",
            "parent": {"id": "orchestrator", "tag": "w1", "meta": parent_meta},
        });
        let parsed: jido_core::AgentOptions = serde_json::from_value(child_opts).unwrap();
        let parent = parsed.parent.expect("parent ref should deserialize");
        assert_eq!(parent.id, "orchestrator");
        assert_eq!(parent.tag, "w1");
    }
}
