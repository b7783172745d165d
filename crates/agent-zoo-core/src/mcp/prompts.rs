//! One prompt per agent, named `agent_zoo_use_{urlencoded agent id}`.
//!
//! Getting the prompt returns the injection message for exactly that agent.
//! There is no fallback to the current agent.

use crate::AppCore;
use crate::error::StoreError;
use crate::models::Agent;
use crate::persona::compile_injection_message;

pub const PROMPT_PREFIX: &str = "agent_zoo_use_";

#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("Unknown prompt: {0}")]
    UnknownPrompt(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub fn prompt_name(agent_id: &str) -> String {
    format!("{}{}", PROMPT_PREFIX, urlencoding::encode(agent_id))
}

/// Agent id encoded in a prompt name, if the name has the right shape.
pub fn agent_id_from_prompt(name: &str) -> Option<String> {
    let encoded = name.strip_prefix(PROMPT_PREFIX)?;
    if encoded.is_empty() {
        return None;
    }
    urlencoding::decode(encoded).ok().map(|id| id.into_owned())
}

pub fn prompt_description(agent: &Agent) -> String {
    format!("Adopt the persona and skills of {}", agent.name)
}

/// Resolve a prompt name to its agent and injection text.
pub async fn render(core: &AppCore, name: &str) -> Result<(Agent, String), PromptError> {
    let agent_id =
        agent_id_from_prompt(name).ok_or_else(|| PromptError::UnknownPrompt(name.to_string()))?;
    let agent = core
        .store
        .get_by_id(&agent_id)
        .await?
        .ok_or_else(|| PromptError::UnknownPrompt(name.to_string()))?;
    let text = compile_injection_message(&agent, &agent.enabled_skills());
    Ok((agent, text))
}
