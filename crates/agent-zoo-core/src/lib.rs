pub mod error;
pub mod mcp;
pub mod models;
pub mod paths;
pub mod persona;
pub mod resolver;
pub mod storage;

pub use error::{ResolveError, StoreError};
pub use models::*;
pub use resolver::AgentResolver;
pub use storage::{AgentStore, CurrentPointerPolicy, JsonFileStore};

use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Core application state shared by the REST API and the MCP server
///
/// Holds the one store instance for the process; both servers receive an
/// `Arc<AppCore>` and never construct their own.
pub struct AppCore {
    pub store: Arc<dyn AgentStore>,
}

impl AppCore {
    /// Open the JSON store at `store_path`. The file is read lazily.
    pub fn new(store_path: impl Into<PathBuf>) -> Self {
        let store_path = store_path.into();
        info!(path = %store_path.display(), "Initializing Agent Zoo store");
        Self::with_store(Arc::new(JsonFileStore::new(store_path)))
    }

    pub fn with_store(store: Arc<dyn AgentStore>) -> Self {
        Self { store }
    }

    /// Resolver over this core's store.
    pub fn resolver(&self) -> AgentResolver<'_> {
        AgentResolver::new(self.store.as_ref())
    }
}
