//! Agent persona models.
//!
//! An agent is a named persona: a system prompt, a set of categorized skills,
//! free-text context references and a journal of brain entries. These types
//! are the persisted shape and the wire shape for both the REST API and MCP.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::brain::BrainEntry;

/// Id of the category every agent starts with.
pub const DEFAULT_CATEGORY_ID: &str = "general";
const DEFAULT_CATEGORY_NAME: &str = "General";
const DEFAULT_CATEGORY_COLOR: &str = "#61988E";

/// Display group for skills.
#[derive(Debug, Clone, Serialize, Deserialize, TS, PartialEq, Eq)]
#[ts(export)]
pub struct SkillCategory {
    pub id: String,
    pub name: String,
    pub color: String,
}

impl Default for SkillCategory {
    fn default() -> Self {
        Self {
            id: DEFAULT_CATEGORY_ID.to_string(),
            name: DEFAULT_CATEGORY_NAME.to_string(),
            color: DEFAULT_CATEGORY_COLOR.to_string(),
        }
    }
}

/// A single persona skill. Only enabled skills are injected.
#[derive(Debug, Clone, Serialize, Deserialize, TS, PartialEq, Eq)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category_id: String,
    #[serde(default)]
    pub enabled: bool,
}

/// A persisted agent persona.
#[derive(Debug, Clone, Serialize, Deserialize, TS, PartialEq)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    /// Unique, immutable identifier
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Persona text injected ahead of the skills
    #[serde(default)]
    pub system_prompt: String,
    #[serde(default)]
    pub skill_categories: Vec<SkillCategory>,
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub context_refs: Vec<String>,
    /// Journal entries in insertion order
    #[serde(default)]
    pub brain_entries: Vec<BrainEntry>,
    /// Seed for the UI sprite generator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub appearance_seed: Option<String>,
}

impl Agent {
    /// Skills that take part in persona injection, in stored order.
    pub fn enabled_skills(&self) -> Vec<&Skill> {
        self.skills.iter().filter(|skill| skill.enabled).collect()
    }

    /// Reassign skills pointing at an unknown category to the first category.
    ///
    /// Returns true when any skill was moved.
    pub fn normalize_skill_categories(&mut self) -> bool {
        let Some(fallback) = self.skill_categories.first().map(|c| c.id.clone()) else {
            return false;
        };
        let mut changed = false;
        for skill in &mut self.skills {
            if !self
                .skill_categories
                .iter()
                .any(|category| category.id == skill.category_id)
            {
                skill.category_id = fallback.clone();
                changed = true;
            }
        }
        changed
    }
}

/// Input for creating an agent. Missing collections get defaults in the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAgentInput {
    /// Requested id; deduplicated with a numeric suffix when taken
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub system_prompt: String,
    #[serde(default)]
    pub skill_categories: Option<Vec<SkillCategory>>,
    #[serde(default)]
    pub skills: Option<Vec<Skill>>,
    #[serde(default)]
    pub context_refs: Option<Vec<String>>,
    #[serde(default)]
    pub brain_entries: Option<Vec<BrainEntry>>,
    #[serde(default)]
    pub appearance_seed: Option<String>,
}

impl CreateAgentInput {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Partial agent update. The id is not part of the patch and never changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AgentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub system_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub skill_categories: Option<Vec<SkillCategory>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub skills: Option<Vec<Skill>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub context_refs: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub brain_entries: Option<Vec<BrainEntry>>,
    /// `null` clears the seed; an absent key keeps it.
    #[serde(
        default,
        deserialize_with = "deserialize_nullable",
        skip_serializing_if = "Option::is_none"
    )]
    #[ts(optional)]
    pub appearance_seed: Option<Option<String>>,
}

fn deserialize_nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl AgentPatch {
    /// Shallow-merge the provided fields over `agent`.
    pub fn apply_to(self, agent: &mut Agent) {
        if let Some(name) = self.name {
            agent.name = name;
        }
        if let Some(description) = self.description {
            agent.description = description;
        }
        if let Some(system_prompt) = self.system_prompt {
            agent.system_prompt = system_prompt;
        }
        if let Some(skill_categories) = self.skill_categories {
            agent.skill_categories = skill_categories;
        }
        if let Some(skills) = self.skills {
            agent.skills = skills;
        }
        if let Some(context_refs) = self.context_refs {
            agent.context_refs = context_refs;
        }
        if let Some(brain_entries) = self.brain_entries {
            agent.brain_entries = brain_entries;
        }
        if let Some(appearance_seed) = self.appearance_seed {
            agent.appearance_seed = appearance_seed;
        }
    }
}
