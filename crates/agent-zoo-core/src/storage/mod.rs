//! Persistence layer for agents, brain entries and the current-agent pointer.
//!
//! The REST API and the MCP server talk to the [`AgentStore`] trait;
//! [`JsonFileStore`] is the only implementation and keeps the whole store in
//! one JSON document.

pub mod json_file;
pub mod migration;
pub mod query;

pub use json_file::JsonFileStore;
pub use query::{BrainEntryFilter, BrainQuery};

use crate::error::StoreError;
use crate::models::{
    Agent, AgentPatch, BrainEntry, BrainEntryPatch, CreateAgentInput, NewBrainEntry,
};

/// How strictly a current-agent pointer is checked when it is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CurrentPointerPolicy {
    /// Store whatever id is given, even if no such agent exists
    #[default]
    Verbatim,
    /// Reject ids that do not name an existing agent
    RequireExisting,
}

#[async_trait::async_trait]
pub trait AgentStore: Send + Sync {
    async fn get_all(&self) -> Result<Vec<Agent>, StoreError>;
    async fn get_by_id(&self, id: &str) -> Result<Option<Agent>, StoreError>;
    /// `None` when no pointer is set or the pointer is dangling.
    async fn get_current(&self) -> Result<Option<Agent>, StoreError>;
    async fn get_current_id(&self) -> Result<Option<String>, StoreError>;
    /// Store the pointer verbatim without checking that the agent exists.
    async fn set_current_id(&self, id: Option<String>) -> Result<(), StoreError>;
    /// Store the pointer after checking that the agent exists.
    async fn set_current_id_checked(&self, id: Option<String>) -> Result<(), StoreError>;

    async fn create(&self, input: CreateAgentInput) -> Result<Agent, StoreError>;
    async fn update(&self, id: &str, patch: AgentPatch) -> Result<Option<Agent>, StoreError>;
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;

    async fn get_brain_entries(&self, agent_id: &str) -> Result<Vec<BrainEntry>, StoreError>;
    async fn create_brain_entry(
        &self,
        agent_id: &str,
        entry: NewBrainEntry,
    ) -> Result<BrainEntry, StoreError>;
    async fn update_brain_entry(
        &self,
        agent_id: &str,
        entry_id: &str,
        patch: BrainEntryPatch,
    ) -> Result<Option<BrainEntry>, StoreError>;
    /// Flip `pinned` in a single read-modify-write.
    async fn toggle_brain_entry_pin(
        &self,
        agent_id: &str,
        entry_id: &str,
    ) -> Result<Option<BrainEntry>, StoreError>;
    async fn delete_brain_entry(&self, agent_id: &str, entry_id: &str) -> Result<bool, StoreError>;
    async fn query_brain_entries(
        &self,
        agent_id: &str,
        filter: &BrainEntryFilter,
    ) -> Result<Vec<BrainEntry>, StoreError>;

    /// Set the pointer under the given policy.
    async fn set_current_with_policy(
        &self,
        id: Option<String>,
        policy: CurrentPointerPolicy,
    ) -> Result<(), StoreError> {
        match policy {
            CurrentPointerPolicy::Verbatim => self.set_current_id(id).await,
            CurrentPointerPolicy::RequireExisting => self.set_current_id_checked(id).await,
        }
    }
}
