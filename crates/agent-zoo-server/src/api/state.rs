use agent_zoo_core::{AgentStore, AppCore, CurrentPointerPolicy};
use std::sync::Arc;

/// Application state shared across all API handlers
#[derive(Clone)]
pub struct AppState {
    pub core: Arc<AppCore>,
    pub current_policy: CurrentPointerPolicy,
}

impl AppState {
    pub fn new(core: Arc<AppCore>, current_policy: CurrentPointerPolicy) -> Self {
        Self {
            core,
            current_policy,
        }
    }

    pub fn store(&self) -> &dyn AgentStore {
        self.core.store.as_ref()
    }
}
