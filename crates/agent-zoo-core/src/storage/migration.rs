//! Upgrade persisted agents written by older versions.
//!
//! Migration works on the raw JSON document before it is decoded into typed
//! models, because the legacy shapes (object-map `skills`, `personality`
//! instead of `systemPrompt`) do not fit the current types.

use serde_json::{Map, Value, json};

use crate::models::SkillCategory;

/// Migrate every agent in the document in place.
///
/// Returns true when the document needs to be written back.
pub fn migrate_store(document: &mut Value) -> bool {
    let Some(root) = document.as_object_mut() else {
        return false;
    };
    let Some(agents) = root.get_mut("agents").and_then(Value::as_array_mut) else {
        return false;
    };

    let mut changed = false;
    for agent in agents.iter_mut() {
        if migrate_agent(agent) {
            changed = true;
        }
    }
    changed
}

/// Migrate a single agent record in place. Idempotent.
///
/// Agents that already carry array `skills`, `skillCategories` and
/// `brainEntries` only get `contextRefs` backfilled, which is not reported as
/// a change. Anything else goes through the legacy upgrade and is reported.
pub fn migrate_agent(agent: &mut Value) -> bool {
    let Some(obj) = agent.as_object_mut() else {
        return false;
    };

    let has_skill_array = obj.get("skills").is_some_and(Value::is_array);
    let has_category_array = obj.get("skillCategories").is_some_and(Value::is_array);
    let has_brain_entries = obj.get("brainEntries").is_some_and(Value::is_array);

    if has_skill_array && has_category_array && has_brain_entries {
        backfill_context_refs(obj);
        return false;
    }

    let categories = match obj.get("skillCategories") {
        Some(Value::Array(categories)) if !categories.is_empty() => categories.clone(),
        _ => vec![json!(SkillCategory::default())],
    };
    let fallback_category = categories
        .first()
        .and_then(|category| category.get("id"))
        .and_then(Value::as_str)
        .unwrap_or(crate::models::DEFAULT_CATEGORY_ID)
        .to_string();
    let known_categories: Vec<&str> = categories
        .iter()
        .filter_map(|category| category.get("id").and_then(Value::as_str))
        .collect();

    let skills = match obj.get("skills") {
        Some(Value::Array(skills)) => skills.clone(),
        Some(Value::Object(legacy)) => legacy
            .iter()
            .map(|(id, enabled)| {
                json!({
                    "id": id,
                    "name": title_case(id),
                    "description": "",
                    "categoryId": fallback_category,
                    "enabled": is_truthy(enabled),
                })
            })
            .collect(),
        _ => Vec::new(),
    };
    let skills: Vec<Value> = skills
        .into_iter()
        .map(|mut skill| {
            let known = skill
                .get("categoryId")
                .and_then(Value::as_str)
                .is_some_and(|id| known_categories.contains(&id));
            if !known && let Some(skill_obj) = skill.as_object_mut() {
                skill_obj.insert("categoryId".to_string(), json!(fallback_category));
            }
            skill
        })
        .collect();

    let system_prompt_missing = !obj.get("systemPrompt").is_some_and(Value::is_string);
    if system_prompt_missing
        && let Some(personality) = obj.get("personality").and_then(Value::as_str)
    {
        let personality = personality.to_string();
        obj.insert("systemPrompt".to_string(), Value::String(personality));
    }

    obj.insert("skillCategories".to_string(), Value::Array(categories));
    obj.insert("skills".to_string(), Value::Array(skills));
    backfill_context_refs(obj);
    if !has_brain_entries {
        obj.insert("brainEntries".to_string(), Value::Array(Vec::new()));
    }
    true
}

fn backfill_context_refs(obj: &mut Map<String, Value>) {
    if !obj.get("contextRefs").is_some_and(Value::is_array) {
        obj.insert("contextRefs".to_string(), Value::Array(Vec::new()));
    }
}

/// `web-search_tool` becomes `Web Search Tool`.
fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut previous_is_word = false;
    let mut in_separator = false;

    for ch in value.chars() {
        if ch == '-' || ch == '_' {
            if !in_separator {
                out.push(' ');
                in_separator = true;
            }
            previous_is_word = false;
            continue;
        }
        in_separator = false;

        let is_word = ch.is_ascii_alphanumeric();
        if is_word && !previous_is_word {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        previous_is_word = is_word;
    }
    out
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
