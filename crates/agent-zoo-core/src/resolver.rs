//! Agent resolver shared by REST and MCP.
//!
//! Operations that take an optional agent id go through [`AgentResolver`] so
//! REST and MCP report the same errors for a missing agent or a missing
//! current pointer.

use crate::error::ResolveError;
use crate::models::Agent;
use crate::storage::AgentStore;

/// Resolves an optional agent id to a stored agent.
pub struct AgentResolver<'a> {
    store: &'a dyn AgentStore,
}

impl<'a> AgentResolver<'a> {
    pub fn new(store: &'a dyn AgentStore) -> Self {
        Self { store }
    }

    /// Look up `agent_id`, or the current agent when it is absent or blank.
    ///
    /// An explicit id that does not exist fails with `AgentNotFound` whatever
    /// the current pointer says.
    pub async fn resolve(&self, agent_id: Option<&str>) -> Result<Agent, ResolveError> {
        if let Some(id) = agent_id.map(str::trim).filter(|id| !id.is_empty()) {
            return self.require(id).await;
        }

        let current = self
            .store
            .get_current_id()
            .await?
            .ok_or(ResolveError::NoCurrentAgent)?;
        self.require(&current).await
    }

    async fn require(&self, id: &str) -> Result<Agent, ResolveError> {
        self.store
            .get_by_id(id)
            .await?
            .ok_or_else(|| ResolveError::AgentNotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateAgentInput;
    use crate::storage::JsonFileStore;
    use tempfile::{TempDir, tempdir};

    async fn create_test_store() -> (JsonFileStore, TempDir) {
        let temp_dir = tempdir().unwrap();
        let store = JsonFileStore::new(temp_dir.path().join("agents.json"));
        store
            .create(CreateAgentInput {
                id: Some("sage".to_string()),
                ..CreateAgentInput::named("Sage")
            })
            .await
            .unwrap();
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_explicit_id() {
        let (store, _tmp) = create_test_store().await;
        let agent = AgentResolver::new(&store)
            .resolve(Some(" sage "))
            .await
            .unwrap();
        assert_eq!(agent.id, "sage");
    }

    #[tokio::test]
    async fn test_explicit_missing_id_ignores_current_pointer() {
        let (store, _tmp) = create_test_store().await;
        store.set_current_id(Some("sage".to_string())).await.unwrap();

        let err = AgentResolver::new(&store)
            .resolve(Some("ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::AgentNotFound(id) if id == "ghost"));
    }

    #[tokio::test]
    async fn test_falls_back_to_current_agent() {
        let (store, _tmp) = create_test_store().await;
        store.set_current_id(Some("sage".to_string())).await.unwrap();

        let resolver = AgentResolver::new(&store);
        assert_eq!(resolver.resolve(None).await.unwrap().id, "sage");
        assert_eq!(resolver.resolve(Some("  ")).await.unwrap().id, "sage");
    }

    #[tokio::test]
    async fn test_no_current_agent() {
        let (store, _tmp) = create_test_store().await;
        let err = AgentResolver::new(&store).resolve(None).await.unwrap_err();
        assert!(matches!(err, ResolveError::NoCurrentAgent));
    }

    #[tokio::test]
    async fn test_dangling_current_pointer() {
        let (store, _tmp) = create_test_store().await;
        store.set_current_id(Some("gone".to_string())).await.unwrap();

        let err = AgentResolver::new(&store).resolve(None).await.unwrap_err();
        assert!(matches!(err, ResolveError::AgentNotFound(id) if id == "gone"));
    }
}
