use anyhow::Result;
use std::path::PathBuf;

const AGENT_ZOO_DIR: &str = ".agent-zoo";
const STORE_FILE: &str = "agents.json";

/// Environment variable to override the Agent Zoo directory.
const AGENT_ZOO_DIR_ENV: &str = "AGENT_ZOO_DIR";
/// Environment variable pointing straight at the store file.
const STORE_PATH_ENV: &str = "AGENT_ZOO_STORE_PATH";

/// Resolve the Agent Zoo data directory.
/// Priority: AGENT_ZOO_DIR env var > ~/.agent-zoo/
pub fn resolve_agent_zoo_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(AGENT_ZOO_DIR_ENV)
        && !dir.trim().is_empty()
    {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|h| h.join(AGENT_ZOO_DIR))
        .ok_or_else(|| anyhow::anyhow!("Failed to determine home directory"))
}

/// Get the store path.
/// Priority: AGENT_ZOO_STORE_PATH env var > <agent zoo dir>/agents.json
pub fn store_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(STORE_PATH_ENV)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }
    Ok(resolve_agent_zoo_dir()?.join(STORE_FILE))
}
