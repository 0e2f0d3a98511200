//! An agent module binds a strategy to a set of signal routes: the unit
//! `start_agent` instantiates (spec §3 "module:ref", §6 Strategy interface).

use crate::router::Router;
use jido_strategy::Strategy;
use std::collections::HashMap;
use std::sync::Arc;

/// `init/2`, `cmd/3` (via its `Strategy`), optional `snapshot/1`, optional
/// `signal_routes/1` (spec §6).
pub trait AgentModule: Send + Sync {
    /// Stable name used for deterministic child ids and logging.
    fn name(&self) -> &str;

    fn strategy(&self) -> Arc<dyn Strategy>;

    /// `(type_pattern, action)` bindings compiled into this agent's
    /// `Router` at init (spec §4.4).
    fn routes(&self) -> Vec<(String, String)>;
}

/// A generic module: any strategy plus a route table, with no module-
/// specific Rust type required. Covers the common case where the routing
/// table and strategy fully describe the agent's behavior.
pub struct GenericModule {
    name: String,
    strategy: Arc<dyn Strategy>,
    routes: Vec<(String, String)>,
}

impl GenericModule {
    pub fn new(name: impl Into<String>, strategy: Arc<dyn Strategy>) -> Self {
        Self {
            name: name.into(),
            strategy,
            routes: Vec::new(),
        }
    }

    pub fn with_route(mut self, pattern: impl Into<String>, action: impl Into<String>) -> Self {
        self.routes.push((pattern.into(), action.into()));
        self
    }
}

impl AgentModule for GenericModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn strategy(&self) -> Arc<dyn Strategy> {
        self.strategy.clone()
    }

    fn routes(&self) -> Vec<(String, String)> {
        self.routes.clone()
    }
}

pub(crate) fn build_router(module: &dyn AgentModule) -> Router {
    let mut router = Router::new();
    for (pattern, action) in module.routes() {
        router.bind(pattern, action);
    }
    router
}

/// Maps module names to the `AgentModule` implementation `start_agent`
/// should instantiate, one per Instance.
#[derive(Clone, Default)]
pub struct ModuleRegistry {
    modules: HashMap<String, Arc<dyn AgentModule>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, module: impl AgentModule + 'static) {
        self.modules.insert(module.name().to_string(), Arc::new(module));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn AgentModule>> {
        self.modules.get(name).cloned()
    }
}
