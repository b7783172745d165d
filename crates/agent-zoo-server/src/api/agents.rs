use crate::api::{ApiError, ApiResult, JsonBody, state::AppState};
use agent_zoo_core::{Agent, AgentPatch, CreateAgentInput, Skill, SkillCategory};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

const DEFAULT_AGENT_NAME: &str = "Unnamed";

/// Body of `POST /api/agents`. Brain entries are never accepted here, and an
/// empty body creates an agent with every default.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAgentRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub skill_categories: Option<Vec<SkillCategory>>,
    #[serde(default)]
    pub skills: Option<Vec<Skill>>,
    #[serde(default)]
    pub context_refs: Option<Vec<String>>,
    #[serde(default)]
    pub appearance_seed: Option<String>,
}

impl From<CreateAgentRequest> for CreateAgentInput {
    fn from(request: CreateAgentRequest) -> Self {
        Self {
            id: request.id,
            name: request
                .name
                .unwrap_or_else(|| DEFAULT_AGENT_NAME.to_string()),
            description: request.description.unwrap_or_default(),
            system_prompt: request.system_prompt.unwrap_or_default(),
            skill_categories: Some(request.skill_categories.unwrap_or_default()),
            skills: Some(request.skills.unwrap_or_default()),
            context_refs: Some(request.context_refs.unwrap_or_default()),
            brain_entries: None,
            appearance_seed: request.appearance_seed,
        }
    }
}

// GET /api/agents
pub async fn list_agents(State(state): State<AppState>) -> ApiResult<Json<Vec<Agent>>> {
    Ok(Json(state.store().get_all().await?))
}

// GET /api/agents/{id}
pub async fn get_agent(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Agent>> {
    state
        .store()
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(ApiError::agent_not_found)
}

// POST /api/agents
pub async fn create_agent(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CreateAgentRequest>,
) -> ApiResult<(StatusCode, Json<Agent>)> {
    let agent = state.store().create(request.into()).await?;
    Ok((StatusCode::CREATED, Json(agent)))
}

// PUT /api/agents/{id}
pub async fn update_agent(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<JsonBody<AgentPatch>, ApiError>,
) -> ApiResult<Json<Agent>> {
    if state.store().get_by_id(&id).await?.is_none() {
        return Err(ApiError::agent_not_found());
    }
    let JsonBody(patch) = body?;
    state
        .store()
        .update(&id, patch)
        .await?
        .map(Json)
        .ok_or_else(ApiError::agent_not_found)
}

// DELETE /api/agents/{id}
pub async fn delete_agent(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    if state.store().delete(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::agent_not_found())
    }
}
