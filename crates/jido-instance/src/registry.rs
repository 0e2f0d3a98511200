//! Agent registry — id-keyed lookup of every live agent in an Instance
//! (spec §4.1 "Registry").

use dashmap::DashMap;
use jido_core::{AgentHandle, AgentRegistry};
use std::sync::Arc;

/// Concurrent, id-keyed table of running agent handles. One per `Instance`.
#[derive(Default)]
pub struct DashMapRegistry {
    agents: DashMap<String, Arc<dyn AgentHandle>>,
}

impl DashMapRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: String, handle: Arc<dyn AgentHandle>) {
        self.agents.insert(id, handle);
    }

    pub fn remove(&self, id: &str) {
        self.agents.remove(id);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.agents.contains_key(id)
    }
}

impl AgentRegistry for DashMapRegistry {
    fn whereis(&self, id: &str) -> Option<Arc<dyn AgentHandle>> {
        self.agents.get(id).map(|entry| entry.value().clone())
    }

    fn list_agents(&self) -> Vec<String> {
        self.agents.iter().map(|entry| entry.key().clone()).collect()
    }

    fn agent_count(&self) -> usize {
        self.agents.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jido_core::{Agent, Error, Result, Signal};

    struct StubHandle(String);

    #[async_trait::async_trait]
    impl AgentHandle for StubHandle {
        fn id(&self) -> &str {
            &self.0
        }
        async fn cast(&self, _signal: Signal) -> Result<()> {
            Ok(())
        }
        async fn call(&self, _signal: Signal, _timeout_ms: u64) -> Result<Agent> {
            Err(Error::not_found(self.0.clone()))
        }
        async fn stop(&self, _reason: String) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn insert_and_whereis_round_trip() {
        let registry = DashMapRegistry::new();
        registry.insert("a".into(), Arc::new(StubHandle("a".into())));
        assert!(registry.whereis("a").is_some());
        assert!(registry.whereis("b").is_none());
        assert_eq!(registry.agent_count(), 1);
    }

    #[test]
    fn remove_drops_the_entry() {
        let registry = DashMapRegistry::new();
        registry.insert("a".into(), Arc::new(StubHandle("a".into())));
        registry.remove("a");
        assert!(registry.whereis("a").is_none());
        assert_eq!(registry.agent_count(), 0);
    }

    #[test]
    fn list_agents_returns_every_id() {
        let registry = DashMapRegistry::new();
        registry.insert("a".into(), Arc::new(StubHandle("a".into())));
        registry.insert("b".into(), Arc::new(StubHandle("b".into())));
        let mut ids = registry.list_agents();
        ids.sort();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
    }
}
