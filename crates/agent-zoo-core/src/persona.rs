//! Persona compilation.
//!
//! Turns an agent's system prompt and enabled skills into the text handed to
//! an LLM. The layout (prompt, `---` divider, `## Active Skills`, one `###`
//! block per skill) is consumed verbatim by clients and must stay stable.

use crate::models::{Agent, Skill};

/// First line of every injection message.
pub const INJECTION_INTRO: &str =
    "Adopt the following agent persona and skills for this conversation.";

const SKILLS_HEADING: &str = "## Active Skills";
const DIVIDER: &str = "---";

/// Combine a system prompt with skill blocks.
///
/// Callers pass only enabled skills; see [`Agent::enabled_skills`].
pub fn compile_prompt(system_prompt: &str, skills: &[&Skill]) -> String {
    let prompt = system_prompt.trim();
    let blocks: Vec<String> = skills.iter().map(|skill| skill_block(skill)).collect();

    let skills_section = if blocks.is_empty() {
        None
    } else {
        Some(format!("{}\n\n{}", SKILLS_HEADING, blocks.join("\n\n")))
    };

    match (prompt.is_empty(), skills_section) {
        (false, Some(section)) => format!("{}\n\n{}\n\n{}", prompt, DIVIDER, section),
        (false, None) => prompt.to_string(),
        (true, Some(section)) => section,
        (true, None) => String::new(),
    }
}

fn skill_block(skill: &Skill) -> String {
    let description = skill.description.trim();
    if description.is_empty() {
        format!("### {}", skill.name)
    } else {
        format!("### {}\n{}", skill.name, description)
    }
}

/// Tell the model which agent it is speaking as.
pub fn usage_instruction(agent: &Agent) -> String {
    format!(
        "You are acting as the agent \"{}\" (id: {}). Follow its persona and use its skills until told otherwise.",
        agent.name, agent.id
    )
}

/// Full injection text: intro, usage instruction, compiled persona.
pub fn compile_injection_message(agent: &Agent, skills: &[&Skill]) -> String {
    let sections = [
        INJECTION_INTRO.to_string(),
        usage_instruction(agent),
        compile_prompt(&agent.system_prompt, skills),
    ];
    sections
        .into_iter()
        .filter(|section| !section.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Usage instruction followed by the compiled persona of `agent`'s enabled skills.
pub fn compiled_persona(agent: &Agent) -> String {
    let compiled = compile_prompt(&agent.system_prompt, &agent.enabled_skills());
    let usage = usage_instruction(agent);
    if compiled.is_empty() {
        usage
    } else {
        format!("{}\n\n{}", usage, compiled)
    }
}
