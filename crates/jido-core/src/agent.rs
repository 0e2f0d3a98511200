//! Agent — identified, versioned state owned by an agent server (spec §3).

use serde_json::{Map, Value};

/// Reserved key under which a strategy keeps its own state (e.g. FSM's
/// `{current_state, history}`), opaque to everything but the strategy.
pub const STRATEGY_KEY: &str = "__strategy__";

/// Reserved key under which plugins may keep per-key private state.
pub const PLUGINS_KEY: &str = "plugins";

/// `{ id, module, state }`. `module` identifies the behavior (strategy +
/// routes + actions) bound to this agent; it is opaque to the runtime beyond
/// being a stable string tag used for deterministic child ids and logging.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Agent {
    pub id: String,
    pub module: String,
    #[serde(default)]
    pub state: Map<String, Value>,
}

impl Agent {
    pub fn new(id: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            module: module.into(),
            state: Map::new(),
        }
    }

    pub fn with_initial_state(mut self, initial: Map<String, Value>) -> Self {
        self.state = initial;
        self
    }

    /// The strategy-local sub-map, if present.
    pub fn strategy_state(&self) -> Option<&Map<String, Value>> {
        self.state.get(STRATEGY_KEY).and_then(Value::as_object)
    }

    /// Replace the strategy-local sub-map.
    pub fn set_strategy_state(&mut self, strategy_state: Map<String, Value>) {
        self.state
            .insert(STRATEGY_KEY.to_string(), Value::Object(strategy_state));
    }

    /// The plugin-local sub-map keyed by plugin name, if present.
    pub fn plugin_state(&self, key: &str) -> Option<&Value> {
        self.state.get(PLUGINS_KEY).and_then(|v| v.get(key))
    }

    pub fn set_plugin_state(&mut self, key: &str, value: Value) {
        let plugins = self
            .state
            .entry(PLUGINS_KEY.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Some(obj) = plugins.as_object_mut() {
            obj.insert(key.to_string(), value);
        }
    }

    /// Deterministic child id derived from this agent and a spawn tag,
    /// matching the `parent_id/tag` convention from spec §4.2.
    pub fn child_id(&self, tag: &str) -> String {
        format!("{}/{}", self.id, tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_id_follows_parent_slash_tag_convention() {
        let agent = Agent::new("orchestrator", "Orchestrator");
        assert_eq!(agent.child_id("w1"), "orchestrator/w1");
    }

    #[test]
    fn strategy_state_round_trips() {
        let mut agent = Agent::new("a1", "Fsm");
        let mut s = Map::new();
        s.insert("current_state".into(), Value::String("idle".into()));
        agent.set_strategy_state(s.clone());
        assert_eq!(agent.strategy_state(), Some(&s));
    }

    #[test]
    fn plugin_state_is_scoped_by_key() {
        let mut agent = Agent::new("a1", "M");
        agent.set_plugin_state("logger", Value::String("verbose".into()));
        assert_eq!(
            agent.plugin_state("logger"),
            Some(&Value::String("verbose".into()))
        );
        assert_eq!(agent.plugin_state("missing"), None);
    }
}
