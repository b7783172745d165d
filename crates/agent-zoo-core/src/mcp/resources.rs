//! Read-only resources under the `agent-zoo://` scheme.
//!
//! ```text
//! agent-zoo://agents                          [{id, name}, ...]
//! agent-zoo://agents/current                  current agent or {}
//! agent-zoo://agents/{id}                     full agent
//! agent-zoo://agents/{id}/brain?type=note     filtered brain entries
//! agent-zoo://agents/{id}/brain/{entryId}     single brain entry
//! ```

use serde_json::{Value, json};
use url::Url;

use crate::AppCore;
use crate::error::StoreError;
use crate::models::{Agent, InvalidEntryType};
use crate::storage::BrainQuery;

pub const SCHEME: &str = "agent-zoo";
pub const MIME_TYPE: &str = "application/json";

#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("Invalid resource URI '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    #[error("Agent with id '{0}' not found.")]
    AgentNotFound(String),

    #[error("Brain entry '{entry_id}' not found for agent '{agent_id}'.")]
    EntryNotFound { agent_id: String, entry_id: String },

    #[error(transparent)]
    InvalidQuery(#[from] InvalidEntryType),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A parsed resource address.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourcePath {
    Agents,
    CurrentAgent,
    Agent(String),
    Brain { agent_id: String, query: BrainQuery },
    BrainEntry { agent_id: String, entry_id: String },
}

pub fn agents_uri() -> String {
    format!("{}://agents", SCHEME)
}

pub fn current_agent_uri() -> String {
    format!("{}://agents/current", SCHEME)
}

pub fn agent_uri(agent_id: &str) -> String {
    format!("{}://agents/{}", SCHEME, urlencoding::encode(agent_id))
}

impl ResourcePath {
    pub fn parse(uri: &str) -> Result<Self, ResourceError> {
        let invalid = |reason: String| ResourceError::InvalidUri {
            uri: uri.to_string(),
            reason,
        };
        let url = Url::parse(uri).map_err(|e| invalid(e.to_string()))?;
        if url.scheme() != SCHEME {
            return Err(invalid(format!("unknown scheme '{}'", url.scheme())));
        }

        let mut segments: Vec<String> = Vec::new();
        if let Some(host) = url.host_str() {
            segments.push(host.to_string());
        }
        for segment in url.path_segments().into_iter().flatten() {
            if segment.is_empty() {
                continue;
            }
            let decoded = urlencoding::decode(segment).map_err(|e| invalid(e.to_string()))?;
            segments.push(decoded.into_owned());
        }

        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();
        let path = match segments.as_slice() {
            ["agents"] => Self::Agents,
            ["agents", "current"] => Self::CurrentAgent,
            ["agents", id] => Self::Agent(id.to_string()),
            ["agents", id, "brain"] => Self::Brain {
                agent_id: id.to_string(),
                query: BrainQuery::from_pairs(url.query_pairs()),
            },
            ["agents", id, "brain", entry_id] => Self::BrainEntry {
                agent_id: id.to_string(),
                entry_id: entry_id.to_string(),
            },
            _ => return Err(ResourceError::UnknownResource(uri.to_string())),
        };
        Ok(path)
    }
}

/// Read `uri` and return its JSON body.
pub async fn read(core: &AppCore, uri: &str) -> Result<Value, ResourceError> {
    let store = core.store.as_ref();
    match ResourcePath::parse(uri)? {
        ResourcePath::Agents => {
            let agents = store.get_all().await?;
            Ok(Value::Array(
                agents
                    .iter()
                    .map(|agent| json!({ "id": agent.id, "name": agent.name }))
                    .collect(),
            ))
        }
        ResourcePath::CurrentAgent => match store.get_current().await? {
            Some(agent) => Ok(serde_json::to_value(agent).map_err(StoreError::from)?),
            None => Ok(json!({})),
        },
        ResourcePath::Agent(agent_id) => {
            let agent = require_agent(core, &agent_id).await?;
            Ok(serde_json::to_value(agent).map_err(StoreError::from)?)
        }
        ResourcePath::Brain { agent_id, query } => {
            let filter = query.into_filter()?;
            require_agent(core, &agent_id).await?;
            let entries = store.query_brain_entries(&agent_id, &filter).await?;
            Ok(serde_json::to_value(entries).map_err(StoreError::from)?)
        }
        ResourcePath::BrainEntry { agent_id, entry_id } => {
            let agent = require_agent(core, &agent_id).await?;
            let entry = agent
                .brain_entries
                .into_iter()
                .find(|entry| entry.id == entry_id)
                .ok_or(ResourceError::EntryNotFound { agent_id, entry_id })?;
            Ok(serde_json::to_value(entry).map_err(StoreError::from)?)
        }
    }
}

async fn require_agent(core: &AppCore, agent_id: &str) -> Result<Agent, ResourceError> {
    core.store
        .get_by_id(agent_id)
        .await?
        .ok_or_else(|| ResourceError::AgentNotFound(agent_id.to_string()))
}
