pub mod agent;
pub mod brain;

pub use agent::{Agent, AgentPatch, CreateAgentInput, DEFAULT_CATEGORY_ID, Skill, SkillCategory};
pub use brain::{
    BrainEntry, BrainEntryMetadata, BrainEntryPatch, BrainEntryType, EntrySource,
    InvalidEntryType, NewBrainEntry, normalize_tags, now_iso,
};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// The whole persisted document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, PartialEq)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StoreShape {
    #[serde(default)]
    pub agents: Vec<Agent>,
    #[serde(default)]
    pub current_agent_id: Option<String>,
}
