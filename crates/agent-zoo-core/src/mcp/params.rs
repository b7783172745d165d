//! Tool parameter types.
//!
//! Every tool argument object decodes into one of these structs. Strings stay
//! raw here; trimming and enum validation happen in [`super::tools`].

use rmcp::schemars::{self, JsonSchema};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Parameters for tools that take no arguments
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct EmptyParams {}

/// Parameters for agent_zoo_get_agent
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgentRefParams {
    /// Agent id. Defaults to the current agent when omitted.
    #[serde(default)]
    pub agent_id: Option<String>,
}

/// Parameters for agent_zoo_create_brain_entry
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBrainEntryParams {
    /// Agent id. Defaults to the current agent when omitted.
    #[serde(default)]
    pub agent_id: Option<String>,
    /// One of: decision, milestone, note, summary
    #[serde(default, rename = "type")]
    pub entry_type: Option<String>,
    /// Entry text; must not be blank
    #[serde(default)]
    pub content: Option<String>,
    /// Free-form tags
    #[serde(default, deserialize_with = "string_elements")]
    #[schemars(with = "Option<Vec<String>>")]
    pub tags: Option<Vec<String>>,
    /// Pin the entry (default false)
    #[serde(default)]
    pub pinned: Option<bool>,
    /// Provenance, e.g. `{"source": "mcp", "sessionId": "..."}`
    #[serde(default)]
    pub metadata: Option<Value>,
}

/// Parameters for agent_zoo_update_brain_entry
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBrainEntryParams {
    /// Agent id. Defaults to the current agent when omitted.
    #[serde(default)]
    pub agent_id: Option<String>,
    /// Id of the entry to update
    #[serde(default)]
    pub entry_id: Option<String>,
    /// New type (optional)
    #[serde(default, rename = "type")]
    pub entry_type: Option<String>,
    /// New content (optional)
    #[serde(default)]
    pub content: Option<String>,
    /// Replacement tags (optional)
    #[serde(default, deserialize_with = "string_elements")]
    #[schemars(with = "Option<Vec<String>>")]
    pub tags: Option<Vec<String>>,
    /// New pinned state (optional)
    #[serde(default)]
    pub pinned: Option<bool>,
    /// Replacement metadata (optional)
    #[serde(default)]
    pub metadata: Option<Value>,
}

/// Parameters for agent_zoo_delete_brain_entry
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntryRefParams {
    /// Agent id. Defaults to the current agent when omitted.
    #[serde(default)]
    pub agent_id: Option<String>,
    /// Id of the entry
    #[serde(default)]
    pub entry_id: Option<String>,
}

/// Parameters for agent_zoo_query_brain_entries
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueryBrainEntriesParams {
    /// Agent id. Defaults to the current agent when omitted.
    #[serde(default)]
    pub agent_id: Option<String>,
    /// Only entries of this type
    #[serde(default, rename = "type")]
    pub entry_type: Option<String>,
    /// Entries carrying any of these tags
    #[serde(default, deserialize_with = "string_elements")]
    #[schemars(with = "Option<Vec<String>>")]
    pub tags: Option<Vec<String>>,
    /// Inclusive lower bound (ISO date or date-time)
    #[serde(default)]
    pub date_from: Option<String>,
    /// Inclusive upper bound (ISO date or date-time)
    #[serde(default)]
    pub date_to: Option<String>,
    /// Only pinned (true) or unpinned (false) entries
    #[serde(default)]
    pub pinned: Option<bool>,
}

/// Parameters for agent_zoo_inject
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InjectParams {
    /// Agent id. Defaults to the current agent when omitted.
    #[serde(default)]
    pub agent_id: Option<String>,
    /// "compiled" (default) or "structured"
    #[serde(default)]
    pub format: Option<String>,
}

/// Parameters for agent_zoo_set_current_agent
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetCurrentAgentParams {
    /// Agent to make current; omit or pass null to clear
    #[serde(default)]
    pub agent_id: Option<String>,
}

/// Keep the string elements of an array argument. Anything that is not an
/// array counts as absent.
fn string_elements<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(tag) => Some(tag),
                    _ => None,
                })
                .collect(),
        ),
        _ => None,
    })
}
