use agent_zoo_core::{CurrentPointerPolicy, paths};
use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_ENV: &str = "AGENT_ZOO_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "agent-zoo.toml";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub store_path: PathBuf,
    /// Serve the MCP server on stdio next to the HTTP API
    pub mcp_enabled: bool,
    /// How `PUT /api/current` treats unknown agent ids
    pub current_policy: CurrentPointerPolicy,
}

#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    #[serde(default)]
    server: ServerSection,
    #[serde(default)]
    store: StoreSection,
    #[serde(default)]
    mcp: McpSection,
    #[serde(default)]
    policy: PolicySection,
}

#[derive(Debug, Deserialize)]
struct ServerSection {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct StoreSection {
    #[serde(default)]
    path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct McpSection {
    #[serde(default = "default_mcp_enabled")]
    enabled: bool,
}

impl Default for McpSection {
    fn default() -> Self {
        Self {
            enabled: default_mcp_enabled(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct PolicySection {
    #[serde(default)]
    validate_current_pointer: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3912
}

fn default_mcp_enabled() -> bool {
    true
}

fn policy_for(validate: bool) -> CurrentPointerPolicy {
    if validate {
        CurrentPointerPolicy::RequireExisting
    } else {
        CurrentPointerPolicy::Verbatim
    }
}

/// `1`/`true`/`yes`/`on` and `0`/`false`/`no`/`off`, any case.
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn env_flag(name: &str) -> Option<bool> {
    env::var(name).ok().and_then(|value| parse_flag(&value))
}

impl ServerConfig {
    pub fn load() -> anyhow::Result<Self> {
        if let Some(file_config) = load_from_file()? {
            return Self::from_file(file_config);
        }

        Self::from_env()
    }

    fn from_file(file_config: FileConfig) -> anyhow::Result<Self> {
        let store_path = match file_config.store.path {
            Some(path) => path,
            None => paths::store_path()?,
        };
        Ok(Self {
            host: file_config.server.host,
            port: file_config.server.port,
            store_path,
            mcp_enabled: file_config.mcp.enabled,
            current_policy: policy_for(file_config.policy.validate_current_pointer),
        })
    }

    fn from_env() -> anyhow::Result<Self> {
        let host = env::var("AGENT_ZOO_HOST").unwrap_or_else(|_| default_host());
        let port = env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or_else(default_port);
        let store_path = paths::store_path()?;
        let mcp_enabled = env_flag("AGENT_ZOO_MCP").unwrap_or_else(default_mcp_enabled);
        let current_policy = policy_for(env_flag("AGENT_ZOO_VALIDATE_CURRENT").unwrap_or(false));

        Ok(Self {
            host,
            port,
            store_path,
            mcp_enabled,
            current_policy,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn load_from_file() -> anyhow::Result<Option<FileConfig>> {
    let path = if let Ok(path) = env::var(CONFIG_ENV) {
        Some(path)
    } else if Path::new(DEFAULT_CONFIG_FILE).exists() {
        Some(DEFAULT_CONFIG_FILE.to_string())
    } else {
        None
    };

    let Some(path) = path else {
        return Ok(None);
    };

    let contents =
        fs::read_to_string(&path).with_context(|| format!("Failed to read config {}", path))?;
    let parsed = parse_file_config(&contents)
        .with_context(|| format!("Failed to parse config {}", path))?;
    Ok(Some(parsed))
}

fn parse_file_config(contents: &str) -> anyhow::Result<FileConfig> {
    Ok(toml::from_str(contents)?)
}
