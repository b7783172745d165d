use crate::api::{ApiError, ApiResult, JsonBody, state::AppState};
use agent_zoo_core::storage::BrainQuery;
use agent_zoo_core::{
    BrainEntry, BrainEntryMetadata, BrainEntryPatch, BrainEntryType, NewBrainEntry,
};
use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/agents/{id}/brain`.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBrainEntryRequest {
    #[serde(default, rename = "type")]
    pub entry_type: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub pinned: Option<bool>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub metadata: Option<BrainEntryMetadata>,
}

/// Body of `PUT /api/agents/{id}/brain/{entry_id}`. `id`, `agentId` and
/// `timestamp` are not part of the request and are dropped if sent.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBrainEntryRequest {
    #[serde(default, rename = "type")]
    pub entry_type: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub pinned: Option<bool>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub metadata: Option<BrainEntryMetadata>,
}

fn parse_type(value: &str) -> ApiResult<BrainEntryType> {
    value
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid entry type"))
}

async fn require_agent(state: &AppState, id: &str) -> ApiResult<()> {
    match state.store().get_by_id(id).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::agent_not_found()),
    }
}

// GET /api/agents/{id}/brain?type&tags&dateFrom&dateTo&pinned
pub async fn list_brain_entries(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: Result<Query<BrainQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<BrainEntry>>> {
    require_agent(&state, &id).await?;
    let Query(query) = query.map_err(|err| ApiError::bad_request(err.body_text()))?;
    let filter = query
        .into_filter()
        .map_err(|_| ApiError::bad_request("Invalid entry type"))?;
    Ok(Json(state.store().query_brain_entries(&id, &filter).await?))
}

// POST /api/agents/{id}/brain
pub async fn create_brain_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<JsonBody<CreateBrainEntryRequest>, ApiError>,
) -> ApiResult<(StatusCode, Json<BrainEntry>)> {
    require_agent(&state, &id).await?;
    let JsonBody(request) = body?;

    let entry_type = match request.entry_type.as_deref() {
        None | Some("") => return Err(ApiError::bad_request("Entry type is required")),
        Some(value) => parse_type(value)?,
    };
    let content = request.content.as_deref().map(str::trim).unwrap_or_default();
    if content.is_empty() {
        return Err(ApiError::bad_request("Entry content is required"));
    }

    let mut entry = NewBrainEntry::new(entry_type, content)
        .pinned(request.pinned.unwrap_or(false))
        .with_tags(request.tags.unwrap_or_default());
    if let Some(metadata) = request.metadata {
        entry = entry.with_metadata(metadata);
    }

    let created = state.store().create_brain_entry(&id, entry).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

// PUT /api/agents/{id}/brain/{entry_id}
pub async fn update_brain_entry(
    State(state): State<AppState>,
    Path((id, entry_id)): Path<(String, String)>,
    body: Result<JsonBody<UpdateBrainEntryRequest>, ApiError>,
) -> ApiResult<Json<BrainEntry>> {
    require_agent(&state, &id).await?;
    let JsonBody(request) = body?;

    let entry_type = match request.entry_type.as_deref() {
        None | Some("") => None,
        Some(value) => Some(parse_type(value)?),
    };
    let content = match request.content {
        Some(content) => {
            let trimmed = content.trim();
            if trimmed.is_empty() {
                return Err(ApiError::bad_request("Entry content is required"));
            }
            Some(trimmed.to_string())
        }
        None => None,
    };
    let patch = BrainEntryPatch {
        entry_type,
        content,
        pinned: request.pinned,
        tags: request.tags,
        metadata: request.metadata,
    };

    state
        .store()
        .update_brain_entry(&id, &entry_id, patch)
        .await?
        .map(Json)
        .ok_or_else(ApiError::entry_not_found)
}

// DELETE /api/agents/{id}/brain/{entry_id}
pub async fn delete_brain_entry(
    State(state): State<AppState>,
    Path((id, entry_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    require_agent(&state, &id).await?;
    if state.store().delete_brain_entry(&id, &entry_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::entry_not_found())
    }
}

// PATCH /api/agents/{id}/brain/{entry_id}/pin
pub async fn toggle_brain_entry_pin(
    State(state): State<AppState>,
    Path((id, entry_id)): Path<(String, String)>,
) -> ApiResult<Json<BrainEntry>> {
    require_agent(&state, &id).await?;
    state
        .store()
        .toggle_brain_entry_pin(&id, &entry_id)
        .await?
        .map(Json)
        .ok_or_else(ApiError::entry_not_found)
}
