//! Concurrent registry of log agents keyed by agent id.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::agent::LogAgent;
use crate::error::LogError;

/// Thread-safe map of registered agents.
///
/// Registration and removal may happen from any thread while the worker is
/// dispatching. Dispatch works on a [`snapshot`](Self::snapshot), so agents
/// are never called while a map shard is locked.
#[derive(Default)]
pub struct AgentRegistry {
    agents: DashMap<String, Arc<dyn LogAgent>>,
}

impl AgentRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `agent` under its `agent_id`.
    ///
    /// # Errors
    ///
    /// Returns `LogError::DuplicateAgent` if the id is already taken; the
    /// existing agent stays registered.
    pub fn register(&self, agent: Arc<dyn LogAgent>) -> Result<(), LogError> {
        match self.agents.entry(agent.agent_id().to_string()) {
            Entry::Occupied(entry) => Err(LogError::DuplicateAgent {
                agent_id: entry.key().clone(),
            }),
            Entry::Vacant(entry) => {
                entry.insert(agent);
                Ok(())
            }
        }
    }

    /// Removes and returns the agent registered under `agent_id`.
    pub fn unregister(&self, agent_id: &str) -> Option<Arc<dyn LogAgent>> {
        self.agents.remove(agent_id).map(|(_, agent)| agent)
    }

    #[must_use]
    pub fn contains(&self, agent_id: &str) -> bool {
        self.agents.contains_key(agent_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Registered agent ids, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.agents.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Current agents ordered by id.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Arc<dyn LogAgent>> {
        let mut agents: Vec<Arc<dyn LogAgent>> =
            self.agents.iter().map(|e| Arc::clone(e.value())).collect();
        agents.sort_by(|a, b| a.agent_id().cmp(b.agent_id()));
        agents
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::testing::MemoryAgent;

    fn agent(id: &str) -> Arc<dyn LogAgent> {
        Arc::new(MemoryAgent::new(id))
    }

    #[test]
    fn register_and_lookup() {
        let registry = AgentRegistry::new();
        assert!(registry.is_empty());

        registry.register(agent("console")).unwrap();
        assert!(registry.contains("console"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let registry = AgentRegistry::new();
        registry.register(agent("console")).unwrap();

        let err = registry.register(agent("console")).unwrap_err();
        assert!(matches!(err, LogError::DuplicateAgent { ref agent_id } if agent_id == "console"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unregister_returns_agent() {
        let registry = AgentRegistry::new();
        registry.register(agent("file")).unwrap();

        let removed = registry.unregister("file").unwrap();
        assert_eq!(removed.agent_id(), "file");
        assert!(registry.unregister("file").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn snapshot_is_sorted_by_id() {
        let registry = AgentRegistry::new();
        registry.register(agent("zeta")).unwrap();
        registry.register(agent("alpha")).unwrap();
        registry.register(agent("mid")).unwrap();

        let ids: Vec<String> = registry
            .snapshot()
            .iter()
            .map(|a| a.agent_id().to_string())
            .collect();
        assert_eq!(ids, vec!["alpha", "mid", "zeta"]);
        assert_eq!(registry.ids(), ids);
    }

    #[test]
    fn concurrent_registration_keeps_every_agent() {
        let registry = Arc::new(AgentRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    for i in 0..50 {
                        registry.register(agent(&format!("agent-{t}-{i}"))).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.len(), 400);
    }
}
