//! Brain entries: the timestamped journal attached to each agent.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

/// Kind of journal record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS, PartialEq, Eq, Hash)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum BrainEntryType {
    Decision,
    Milestone,
    Note,
    Summary,
}

impl BrainEntryType {
    pub const ALL: [BrainEntryType; 4] = [
        BrainEntryType::Decision,
        BrainEntryType::Milestone,
        BrainEntryType::Note,
        BrainEntryType::Summary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BrainEntryType::Decision => "decision",
            BrainEntryType::Milestone => "milestone",
            BrainEntryType::Note => "note",
            BrainEntryType::Summary => "summary",
        }
    }
}

impl fmt::Display for BrainEntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not one of the four entry types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid entry type '{0}', expected one of: decision, milestone, note, summary")]
pub struct InvalidEntryType(pub String);

impl FromStr for BrainEntryType {
    type Err = InvalidEntryType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        BrainEntryType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| InvalidEntryType(value.to_string()))
    }
}

/// Where an entry came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS, PartialEq, Eq, Default)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum EntrySource {
    #[default]
    Manual,
    Auto,
    Mcp,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, PartialEq, Eq, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BrainEntryMetadata {
    pub source: EntrySource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub workspace_id: Option<String>,
}

/// A journal record. `id`, `agent_id` and `timestamp` are fixed at creation.
#[derive(Debug, Clone, Serialize, Deserialize, TS, PartialEq)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BrainEntry {
    pub id: String,
    pub agent_id: String,
    #[serde(rename = "type")]
    pub entry_type: BrainEntryType,
    pub content: String,
    /// ISO-8601 UTC timestamp with millisecond precision
    pub timestamp: String,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub metadata: Option<BrainEntryMetadata>,
}

/// Fields supplied when creating an entry.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBrainEntry {
    pub entry_type: BrainEntryType,
    pub content: String,
    pub pinned: bool,
    pub tags: Vec<String>,
    pub metadata: Option<BrainEntryMetadata>,
}

impl NewBrainEntry {
    pub fn new(entry_type: BrainEntryType, content: impl Into<String>) -> Self {
        Self {
            entry_type,
            content: content.into(),
            pinned: false,
            tags: Vec::new(),
            metadata: None,
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn pinned(mut self, pinned: bool) -> Self {
        self.pinned = pinned;
        self
    }

    pub fn with_metadata(mut self, metadata: BrainEntryMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Materialize the entry for `agent_id` with a fresh id and timestamp.
    pub fn into_entry(self, agent_id: &str) -> BrainEntry {
        BrainEntry {
            id: uuid::Uuid::new_v4().to_string(),
            agent_id: agent_id.to_string(),
            entry_type: self.entry_type,
            content: self.content,
            timestamp: now_iso(),
            pinned: self.pinned,
            tags: normalize_tags(&self.tags),
            metadata: self.metadata,
        }
    }
}

/// Partial entry update. `id`, `agentId` and `timestamp` cannot be patched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrainEntryPatch {
    pub entry_type: Option<BrainEntryType>,
    pub content: Option<String>,
    pub pinned: Option<bool>,
    pub tags: Option<Vec<String>>,
    pub metadata: Option<BrainEntryMetadata>,
}

impl BrainEntryPatch {
    pub fn pin(pinned: bool) -> Self {
        Self {
            pinned: Some(pinned),
            ..Default::default()
        }
    }

    pub fn apply_to(self, entry: &mut BrainEntry) {
        if let Some(entry_type) = self.entry_type {
            entry.entry_type = entry_type;
        }
        if let Some(content) = self.content {
            entry.content = content;
        }
        if let Some(pinned) = self.pinned {
            entry.pinned = pinned;
        }
        if let Some(tags) = self.tags {
            entry.tags = normalize_tags(&tags);
        }
        if let Some(metadata) = self.metadata {
            entry.metadata = Some(metadata);
        }
    }
}

/// Trim tags, drop blanks and duplicates. `None` when nothing is left.
pub fn normalize_tags<S: AsRef<str>>(tags: &[S]) -> Option<Vec<String>> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.as_ref().trim();
        if !tag.is_empty() && !normalized.iter().any(|existing| existing == tag) {
            normalized.push(tag.to_string());
        }
    }
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

/// Current time in the persisted timestamp format, e.g. `2025-01-31T09:15:02.113Z`.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
