//! Tool calls: decode once into a typed [`ToolCall`], validate, execute.
//!
//! Every failure a caller can cause is returned as a [`ToolError`] with a
//! stable code, which the server wraps into an `isError` tool result.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tracing::debug;

use super::params::{
    AgentRefParams, CreateBrainEntryParams, EntryRefParams, InjectParams,
    QueryBrainEntriesParams, SetCurrentAgentParams, UpdateBrainEntryParams,
};
use crate::AppCore;
use crate::error::{ResolveError, StoreError};
use crate::models::{
    Agent, BrainEntryMetadata, BrainEntryPatch, BrainEntryType, EntrySource, NewBrainEntry,
};
use crate::persona::compiled_persona;
use crate::storage::BrainEntryFilter;

pub const LIST_AGENTS: &str = "agent_zoo_list_agents";
pub const GET_AGENT: &str = "agent_zoo_get_agent";
pub const CREATE_BRAIN_ENTRY: &str = "agent_zoo_create_brain_entry";
pub const UPDATE_BRAIN_ENTRY: &str = "agent_zoo_update_brain_entry";
pub const DELETE_BRAIN_ENTRY: &str = "agent_zoo_delete_brain_entry";
pub const QUERY_BRAIN_ENTRIES: &str = "agent_zoo_query_brain_entries";
pub const INJECT: &str = "agent_zoo_inject";
pub const SET_CURRENT_AGENT: &str = "agent_zoo_set_current_agent";
pub const GET_CURRENT_AGENT: &str = "agent_zoo_get_current_agent";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ToolErrorCode {
    InvalidArguments,
    AgentNotFound,
    NoCurrentAgent,
    NotFound,
    InvalidFormat,
    UnknownTool,
    InternalError,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ToolError {
    pub code: ToolErrorCode,
    pub message: String,
}

impl ToolError {
    pub fn new(code: ToolErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self::new(ToolErrorCode::InvalidArguments, message)
    }

    /// The `isError` payload sent back to the client.
    pub fn payload(&self) -> Value {
        json!({
            "error": true,
            "code": self.code,
            "message": self.message,
        })
    }
}

impl From<ResolveError> for ToolError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::AgentNotFound(_) => Self::new(ToolErrorCode::AgentNotFound, err.to_string()),
            ResolveError::NoCurrentAgent => Self::new(ToolErrorCode::NoCurrentAgent, err.to_string()),
            ResolveError::Store(store) => store.into(),
        }
    }
}

impl From<StoreError> for ToolError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AgentNotFound(_) => Self::new(ToolErrorCode::AgentNotFound, err.to_string()),
            other => Self::new(ToolErrorCode::InternalError, other.to_string()),
        }
    }
}

/// A decoded tool invocation.
#[derive(Debug)]
pub enum ToolCall {
    ListAgents,
    GetAgent(AgentRefParams),
    CreateBrainEntry(CreateBrainEntryParams),
    UpdateBrainEntry(UpdateBrainEntryParams),
    DeleteBrainEntry(EntryRefParams),
    QueryBrainEntries(QueryBrainEntriesParams),
    Inject(InjectParams),
    SetCurrentAgent(SetCurrentAgentParams),
    GetCurrentAgent,
}

impl ToolCall {
    pub fn decode(name: &str, arguments: Map<String, Value>) -> Result<Self, ToolError> {
        let call = match name {
            LIST_AGENTS => Self::ListAgents,
            GET_AGENT => Self::GetAgent(parse(name, arguments)?),
            CREATE_BRAIN_ENTRY => Self::CreateBrainEntry(parse(name, arguments)?),
            UPDATE_BRAIN_ENTRY => Self::UpdateBrainEntry(parse(name, arguments)?),
            DELETE_BRAIN_ENTRY => Self::DeleteBrainEntry(parse(name, arguments)?),
            QUERY_BRAIN_ENTRIES => Self::QueryBrainEntries(parse(name, arguments)?),
            INJECT => Self::Inject(parse(name, arguments)?),
            SET_CURRENT_AGENT => Self::SetCurrentAgent(parse(name, arguments)?),
            GET_CURRENT_AGENT => Self::GetCurrentAgent,
            _ => {
                return Err(ToolError::new(
                    ToolErrorCode::UnknownTool,
                    format!("Unknown tool: {}", name),
                ));
            }
        };
        Ok(call)
    }
}

fn parse<P: DeserializeOwned>(tool: &str, arguments: Map<String, Value>) -> Result<P, ToolError> {
    serde_json::from_value(Value::Object(arguments))
        .map_err(|e| ToolError::invalid_arguments(format!("Invalid arguments for {}: {}", tool, e)))
}

/// Trim, treating blank as absent.
fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_entry_type(value: Option<String>) -> Result<Option<BrainEntryType>, ToolError> {
    let Some(value) = trimmed(value) else {
        return Ok(None);
    };
    value.parse::<BrainEntryType>().map(Some).map_err(|_| {
        let allowed: Vec<&str> = BrainEntryType::ALL.iter().map(|t| t.as_str()).collect();
        ToolError::invalid_arguments(format!(
            "Invalid entry type '{}'. Expected one of: {}.",
            value,
            allowed.join(", ")
        ))
    })
}

fn parse_metadata(value: Option<Value>) -> Result<Option<BrainEntryMetadata>, ToolError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| ToolError::invalid_arguments(format!("Invalid metadata: {}", e))),
    }
}

fn require_entry_id(value: Option<String>) -> Result<String, ToolError> {
    trimmed(value).ok_or_else(|| ToolError::invalid_arguments("entryId is required."))
}

fn entry_not_found(agent: &Agent, entry_id: &str) -> ToolError {
    ToolError::new(
        ToolErrorCode::NotFound,
        format!(
            "Brain entry '{}' not found for agent '{}'.",
            entry_id, agent.id
        ),
    )
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, ToolError> {
    serde_json::to_value(value)
        .map_err(|e| ToolError::new(ToolErrorCode::InternalError, e.to_string()))
}

/// Run a decoded tool call against `core`.
pub async fn execute(core: &AppCore, call: ToolCall) -> Result<Value, ToolError> {
    let store = core.store.as_ref();
    match call {
        ToolCall::ListAgents => {
            let agents = store.get_all().await?;
            let summaries: Vec<Value> = agents
                .iter()
                .map(|agent| json!({ "id": agent.id, "name": agent.name }))
                .collect();
            Ok(Value::Array(summaries))
        }

        ToolCall::GetAgent(params) => {
            let agent = core.resolver().resolve(params.agent_id.as_deref()).await?;
            to_value(&agent)
        }

        ToolCall::CreateBrainEntry(params) => {
            let agent = core.resolver().resolve(params.agent_id.as_deref()).await?;
            let entry_type = parse_entry_type(params.entry_type)?
                .ok_or_else(|| ToolError::invalid_arguments("Entry type is required."))?;
            let content = trimmed(params.content)
                .ok_or_else(|| ToolError::invalid_arguments("Entry content is required."))?;
            let metadata = parse_metadata(params.metadata)?.unwrap_or(BrainEntryMetadata {
                source: EntrySource::Mcp,
                ..Default::default()
            });

            let entry = NewBrainEntry::new(entry_type, content)
                .with_tags(params.tags.unwrap_or_default())
                .pinned(params.pinned.unwrap_or(false))
                .with_metadata(metadata);
            let created = store.create_brain_entry(&agent.id, entry).await?;
            debug!(agent_id = %agent.id, entry_id = %created.id, "Brain entry created via MCP");
            to_value(&created)
        }

        ToolCall::UpdateBrainEntry(params) => {
            let agent = core.resolver().resolve(params.agent_id.as_deref()).await?;
            let entry_id = require_entry_id(params.entry_id)?;
            let entry_type = parse_entry_type(params.entry_type)?;
            let content = match params.content {
                Some(content) => Some(trimmed(Some(content)).ok_or_else(|| {
                    ToolError::invalid_arguments("Entry content must not be empty.")
                })?),
                None => None,
            };
            let patch = BrainEntryPatch {
                entry_type,
                content,
                pinned: params.pinned,
                tags: params.tags,
                metadata: parse_metadata(params.metadata)?,
            };

            let updated = store
                .update_brain_entry(&agent.id, &entry_id, patch)
                .await?
                .ok_or_else(|| entry_not_found(&agent, &entry_id))?;
            to_value(&updated)
        }

        ToolCall::DeleteBrainEntry(params) => {
            let agent = core.resolver().resolve(params.agent_id.as_deref()).await?;
            let entry_id = require_entry_id(params.entry_id)?;
            if !store.delete_brain_entry(&agent.id, &entry_id).await? {
                return Err(entry_not_found(&agent, &entry_id));
            }
            Ok(json!({ "deleted": true, "agentId": agent.id, "entryId": entry_id }))
        }

        ToolCall::QueryBrainEntries(params) => {
            let agent = core.resolver().resolve(params.agent_id.as_deref()).await?;
            let filter = BrainEntryFilter {
                entry_type: parse_entry_type(params.entry_type)?,
                tags: params.tags,
                date_from: trimmed(params.date_from),
                date_to: trimmed(params.date_to),
                pinned: params.pinned,
            };
            let entries = store.query_brain_entries(&agent.id, &filter).await?;
            Ok(json!({ "agentId": agent.id, "entries": entries }))
        }

        ToolCall::Inject(params) => {
            let agent = core.resolver().resolve(params.agent_id.as_deref()).await?;
            let format = trimmed(params.format).unwrap_or_else(|| "compiled".to_string());
            match format.as_str() {
                "structured" => {
                    let skills: Vec<Value> = agent
                        .enabled_skills()
                        .into_iter()
                        .map(|skill| {
                            json!({
                                "id": skill.id,
                                "name": skill.name,
                                "description": skill.description,
                            })
                        })
                        .collect();
                    Ok(json!({
                        "agentId": agent.id,
                        "agentName": agent.name,
                        "systemPrompt": agent.system_prompt,
                        "skills": skills,
                    }))
                }
                "compiled" => Ok(json!({
                    "agentId": agent.id,
                    "agentName": agent.name,
                    "prompt": compiled_persona(&agent),
                })),
                other => Err(ToolError::new(
                    ToolErrorCode::InvalidFormat,
                    format!(
                        "Invalid format '{}'. Expected \"compiled\" or \"structured\".",
                        other
                    ),
                )),
            }
        }

        ToolCall::SetCurrentAgent(params) => {
            let agent_id = trimmed(params.agent_id);
            store.set_current_id_checked(agent_id.clone()).await?;
            Ok(json!({ "currentAgentId": agent_id }))
        }

        ToolCall::GetCurrentAgent => {
            let current_agent_id = store.get_current_id().await?;
            let agent = store.get_current().await?;
            Ok(json!({ "currentAgentId": current_agent_id, "agent": agent }))
        }
    }
}
