use crate::api::{ApiResult, JsonBody, state::AppState};
use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

/// `{"currentAgentId": ..}`. An empty body clears the pointer.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentAgentBody {
    #[serde(default)]
    pub current_agent_id: Option<String>,
}

// GET /api/current
pub async fn get_current(State(state): State<AppState>) -> ApiResult<Json<CurrentAgentBody>> {
    let current_agent_id = state.store().get_current_id().await?;
    Ok(Json(CurrentAgentBody { current_agent_id }))
}

// PUT /api/current
pub async fn set_current(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CurrentAgentBody>,
) -> ApiResult<Json<CurrentAgentBody>> {
    state
        .store()
        .set_current_with_policy(body.current_agent_id.clone(), state.current_policy)
        .await?;
    tracing::debug!(current_agent_id = ?body.current_agent_id, "Current agent updated");
    Ok(Json(body))
}
