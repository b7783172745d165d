pub mod agents;
pub mod brain;
pub mod current;
pub mod extract;
pub mod response;
pub mod state;

pub use extract::JsonBody;
pub use response::{ApiError, ApiResult};
pub use state::AppState;

use axum::{
    Json, Router,
    routing::{get, patch, put},
};
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Build the HTTP router: `/health` plus the `/api` routes.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        // Agents
        .route(
            "/api/agents",
            get(agents::list_agents).post(agents::create_agent),
        )
        .route(
            "/api/agents/{id}",
            get(agents::get_agent)
                .put(agents::update_agent)
                .delete(agents::delete_agent),
        )
        // Brain entries
        .route(
            "/api/agents/{id}/brain",
            get(brain::list_brain_entries).post(brain::create_brain_entry),
        )
        .route(
            "/api/agents/{id}/brain/{entry_id}",
            put(brain::update_brain_entry).delete(brain::delete_brain_entry),
        )
        .route(
            "/api/agents/{id}/brain/{entry_id}/pin",
            patch(brain::toggle_brain_entry_pin),
        )
        // Current agent pointer
        .route(
            "/api/current",
            get(current::get_current).put(current::set_current),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
