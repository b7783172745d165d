//! MCP server implementation for Agent Zoo
//!
//! Exposes agents as resources, one persona prompt per agent, and the
//! brain/persona tools over the stdio transport.

use crate::AppCore;
use crate::mcp::params::{
    AgentRefParams, CreateBrainEntryParams, EmptyParams, EntryRefParams, InjectParams,
    QueryBrainEntriesParams, SetCurrentAgentParams, UpdateBrainEntryParams,
};
use crate::mcp::prompts::{self, PromptError};
use crate::mcp::resources::{self, ResourceError};
use crate::mcp::tools::{self, ToolCall, ToolError};
use rmcp::{
    ErrorData as McpError, ServerHandler, ServiceExt,
    handler::server::tool::schema_for_type,
    model::{
        AnnotateAble, CallToolRequestParams, CallToolResult, Content, GetPromptRequestParams,
        GetPromptResult, Implementation, ListPromptsResult, ListResourcesResult, ListToolsResult,
        PaginatedRequestParams, Prompt, PromptMessage, PromptMessageRole, RawResource,
        ReadResourceRequestParams, ReadResourceResult, Resource, ResourceContents,
        ServerCapabilities, ServerInfo, Tool,
    },
    service::{RequestContext, RoleServer},
};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::io::{stdin, stdout};
use tracing::{debug, warn};

/// Agent Zoo MCP Server
///
/// Shares its [`AppCore`] (and therefore its store) with the REST API.
#[derive(Clone)]
pub struct AgentZooMcpServer {
    core: Arc<AppCore>,
}

impl AgentZooMcpServer {
    pub fn new(core: Arc<AppCore>) -> Self {
        Self { core }
    }

    /// Run the MCP server using stdio transport
    pub async fn run(self) -> anyhow::Result<()> {
        tracing::info!("Starting Agent Zoo MCP server...");
        let server = self.serve(stdio()).await?;
        tracing::info!("MCP server initialized, waiting for requests...");
        server.waiting().await?;
        Ok(())
    }

    /// Decode and execute a tool call.
    pub async fn dispatch_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<Value, ToolError> {
        let call = ToolCall::decode(name, arguments)?;
        debug!(tool = %name, "Executing tool");
        tools::execute(&self.core, call).await
    }

    fn tool_definitions() -> Vec<Tool> {
        vec![
            Tool::new(
                tools::LIST_AGENTS,
                "List all agents in the zoo. Returns the id and name of each agent.",
                schema_for_type::<EmptyParams>(),
            ),
            Tool::new(
                tools::GET_AGENT,
                "Get the full configuration of an agent: system prompt, skills, context references and brain entries. Uses the current agent when agentId is omitted.",
                schema_for_type::<AgentRefParams>(),
            ),
            Tool::new(
                tools::CREATE_BRAIN_ENTRY,
                "Record a decision, milestone, note or summary in an agent's brain. Provide a type and non-empty content; tags, pinned and metadata are optional.",
                schema_for_type::<CreateBrainEntryParams>(),
            ),
            Tool::new(
                tools::UPDATE_BRAIN_ENTRY,
                "Update an existing brain entry. Provide the entryId and the fields to change. The entry id, agent id and timestamp never change.",
                schema_for_type::<UpdateBrainEntryParams>(),
            ),
            Tool::new(
                tools::DELETE_BRAIN_ENTRY,
                "Delete a brain entry by entryId.",
                schema_for_type::<EntryRefParams>(),
            ),
            Tool::new(
                tools::QUERY_BRAIN_ENTRIES,
                "Query an agent's brain entries by type, tags (any match), date range and pinned state. Returns {agentId, entries} in insertion order.",
                schema_for_type::<QueryBrainEntriesParams>(),
            ),
            Tool::new(
                tools::INJECT,
                "Get an agent's persona for this conversation. format \"compiled\" (default) returns ready-to-use prompt text; \"structured\" returns the system prompt and enabled skills separately.",
                schema_for_type::<InjectParams>(),
            ),
            Tool::new(
                tools::SET_CURRENT_AGENT,
                "Set the current agent used when agentId is omitted. Omit agentId to clear it.",
                schema_for_type::<SetCurrentAgentParams>(),
            ),
            Tool::new(
                tools::GET_CURRENT_AGENT,
                "Get the current agent id and, if it exists, the agent.",
                schema_for_type::<EmptyParams>(),
            ),
        ]
    }

    /// Resources advertised by `resources/list`.
    pub async fn resource_list(&self) -> Result<Vec<Resource>, McpError> {
        let agents = self.core.store.get_all().await.map_err(internal_error)?;

        let mut listed = vec![
            json_resource(
                resources::agents_uri(),
                "Agent list",
                "All agents".to_string(),
            ),
            json_resource(
                resources::current_agent_uri(),
                "Current agent",
                "Config for the current agent".to_string(),
            ),
        ];
        listed.extend(agents.iter().map(|agent| {
            json_resource(
                resources::agent_uri(&agent.id),
                &agent.name,
                format!("Agent: {}", agent.name),
            )
        }));
        Ok(listed)
    }

    /// Read a resource and return its JSON text.
    pub async fn read_resource_text(&self, uri: &str) -> Result<String, McpError> {
        let value = resources::read(&self.core, uri)
            .await
            .map_err(|err| match err {
                ResourceError::InvalidUri { .. }
                | ResourceError::UnknownResource(_)
                | ResourceError::AgentNotFound(_)
                | ResourceError::EntryNotFound { .. } => {
                    McpError::resource_not_found(err.to_string(), None)
                }
                ResourceError::InvalidQuery(_) => McpError::invalid_params(err.to_string(), None),
                ResourceError::Store(store) => internal_error(store),
            })?;
        serde_json::to_string_pretty(&value).map_err(internal_error)
    }

    /// Prompts advertised by `prompts/list`.
    pub async fn prompt_list(&self) -> Result<Vec<Prompt>, McpError> {
        let agents = self.core.store.get_all().await.map_err(internal_error)?;
        Ok(agents
            .iter()
            .map(|agent| {
                Prompt::new(
                    prompts::prompt_name(&agent.id),
                    Some(prompts::prompt_description(agent)),
                    None,
                )
            })
            .collect())
    }

    /// Render a prompt to its description and injection text.
    pub async fn prompt_text(&self, name: &str) -> Result<(String, String), McpError> {
        let (agent, text) = prompts::render(&self.core, name)
            .await
            .map_err(|err| match err {
                PromptError::UnknownPrompt(_) => McpError::invalid_params(err.to_string(), None),
                PromptError::Store(store) => internal_error(store),
            })?;
        Ok((prompts::prompt_description(&agent), text))
    }
}

/// Create stdio transport for MCP communication
fn stdio() -> (tokio::io::Stdin, tokio::io::Stdout) {
    (stdin(), stdout())
}

fn internal_error(err: impl std::fmt::Display) -> McpError {
    McpError::internal_error(err.to_string(), None)
}

fn json_resource(uri: String, name: &str, description: String) -> Resource {
    let mut raw = RawResource::new(uri, name.to_string());
    raw.description = Some(description);
    raw.mime_type = Some(resources::MIME_TYPE.to_string());
    raw.no_annotation()
}

impl ServerHandler for AgentZooMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder()
                .enable_prompts()
                .enable_resources()
                .enable_tools()
                .build(),
            server_info: Implementation {
                name: "agent-zoo".to_string(),
                title: Some("Agent Zoo MCP Server".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Agent Zoo MCP Server - Manage agent personas and their brain journals. \
                Read agent-zoo://agents resources for configuration, use the agent_zoo_use_* prompts \
                or agent_zoo_inject to adopt a persona, and the agent_zoo_*_brain_entry tools to \
                record decisions, milestones, notes and summaries."
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            meta: None,
            tools: Self::tool_definitions(),
            next_cursor: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let arguments = request.arguments.unwrap_or_default();
        match self.dispatch_tool(request.name.as_ref(), arguments).await {
            Ok(value) => {
                let text = serde_json::to_string_pretty(&value).map_err(internal_error)?;
                Ok(CallToolResult::success(vec![Content::text(text)]))
            }
            Err(err) => {
                warn!(tool = %request.name, code = ?err.code, "Tool call failed: {}", err.message);
                Ok(CallToolResult::error(vec![Content::text(
                    err.payload().to_string(),
                )]))
            }
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        Ok(ListResourcesResult::with_all_items(
            self.resource_list().await?,
        ))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        let text = self.read_resource_text(&request.uri).await?;
        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(text, request.uri)],
        })
    }

    async fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListPromptsResult, McpError> {
        Ok(ListPromptsResult::with_all_items(self.prompt_list().await?))
    }

    async fn get_prompt(
        &self,
        request: GetPromptRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<GetPromptResult, McpError> {
        let (description, text) = self.prompt_text(&request.name).await?;
        Ok(GetPromptResult {
            description: Some(description),
            messages: vec![PromptMessage::new_text(PromptMessageRole::User, text)],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::tools::ToolErrorCode;
    use crate::models::{CreateAgentInput, Skill};
    use crate::persona::INJECTION_INTRO;
    use serde_json::json;
    use tempfile::TempDir;

    // =========================================================================
    // Test Utilities
    // =========================================================================

    /// Create a test server over a temporary store file
    fn create_test_server() -> (AgentZooMcpServer, Arc<AppCore>, TempDir) {
        let temp_dir = tempfile::tempdir().unwrap();
        let core = Arc::new(AppCore::new(temp_dir.path().join("agents.json")));
        (AgentZooMcpServer::new(core.clone()), core, temp_dir)
    }

    async fn create_test_agent(core: &AppCore, id: &str, name: &str) {
        core.store
            .create(CreateAgentInput {
                id: Some(id.to_string()),
                system_prompt: format!("You are {}.", name),
                skills: Some(vec![
                    Skill {
                        id: "research".to_string(),
                        name: "Research".to_string(),
                        description: "Find things".to_string(),
                        category_id: "general".to_string(),
                        enabled: true,
                    },
                    Skill {
                        id: "juggling".to_string(),
                        name: "Juggling".to_string(),
                        description: "Off duty".to_string(),
                        category_id: "general".to_string(),
                        enabled: false,
                    },
                ]),
                ..CreateAgentInput::named(name)
            })
            .await
            .unwrap();
    }

    fn args(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("arguments must be an object"),
        }
    }

    async fn call(server: &AgentZooMcpServer, name: &str, value: Value) -> Value {
        server.dispatch_tool(name, args(value)).await.unwrap()
    }

    async fn call_err(server: &AgentZooMcpServer, name: &str, value: Value) -> ToolError {
        server.dispatch_tool(name, args(value)).await.unwrap_err()
    }

    // =========================================================================
    // Server Info / Listing
    // =========================================================================

    #[test]
    fn test_server_info() {
        let (server, _core, _tmp) = create_test_server();
        let info = server.get_info();
        assert_eq!(info.server_info.name, "agent-zoo");
        assert!(info.capabilities.tools.is_some());
        assert!(info.capabilities.resources.is_some());
        assert!(info.capabilities.prompts.is_some());
    }

    #[test]
    fn test_tool_definitions_share_prefix() {
        let tools = AgentZooMcpServer::tool_definitions();
        assert_eq!(tools.len(), 9);
        assert!(tools.iter().all(|t| t.name.starts_with("agent_zoo_")));
    }

    #[tokio::test]
    async fn test_resource_list() {
        let (server, core, _tmp) = create_test_server();
        create_test_agent(&core, "sage", "Sage").await;

        let listed = server.resource_list().await.unwrap();
        let uris: Vec<&str> = listed.iter().map(|r| r.raw.uri.as_str()).collect();
        assert_eq!(
            uris,
            vec![
                "agent-zoo://agents",
                "agent-zoo://agents/current",
                "agent-zoo://agents/sage"
            ]
        );
        assert_eq!(listed[2].raw.description.as_deref(), Some("Agent: Sage"));
        assert_eq!(listed[2].raw.mime_type.as_deref(), Some("application/json"));
    }

    // =========================================================================
    // Resource Tests
    // =========================================================================

    #[tokio::test]
    async fn test_read_agents_resource() {
        let (server, core, _tmp) = create_test_server();
        create_test_agent(&core, "sage", "Sage").await;

        let text = server.read_resource_text("agent-zoo://agents").await.unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, json!([{ "id": "sage", "name": "Sage" }]));

        let text = server
            .read_resource_text("agent-zoo://agents/sage")
            .await
            .unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["systemPrompt"], "You are Sage.");
    }

    #[tokio::test]
    async fn test_read_current_agent_resource() {
        let (server, core, _tmp) = create_test_server();
        create_test_agent(&core, "sage", "Sage").await;

        let text = server
            .read_resource_text("agent-zoo://agents/current")
            .await
            .unwrap();
        assert_eq!(serde_json::from_str::<Value>(&text).unwrap(), json!({}));

        core.store.set_current_id(Some("sage".into())).await.unwrap();
        let text = server
            .read_resource_text("agent-zoo://agents/current")
            .await
            .unwrap();
        assert_eq!(serde_json::from_str::<Value>(&text).unwrap()["id"], "sage");
    }

    #[tokio::test]
    async fn test_read_brain_resources() {
        let (server, core, _tmp) = create_test_server();
        create_test_agent(&core, "sage", "Sage").await;
        let created = call(
            &server,
            tools::CREATE_BRAIN_ENTRY,
            json!({ "agentId": "sage", "type": "decision", "content": "Use Rust", "pinned": true }),
        )
        .await;
        call(
            &server,
            tools::CREATE_BRAIN_ENTRY,
            json!({ "agentId": "sage", "type": "note", "content": "Later" }),
        )
        .await;

        let text = server
            .read_resource_text("agent-zoo://agents/sage/brain?pinned=true")
            .await
            .unwrap();
        let entries: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(entries.as_array().unwrap().len(), 1);
        assert_eq!(entries[0]["content"], "Use Rust");

        let entry_id = created["id"].as_str().unwrap();
        let text = server
            .read_resource_text(&format!("agent-zoo://agents/sage/brain/{}", entry_id))
            .await
            .unwrap();
        assert_eq!(serde_json::from_str::<Value>(&text).unwrap()["id"], entry_id);
    }

    #[tokio::test]
    async fn test_read_unknown_resources() {
        let (server, core, _tmp) = create_test_server();
        create_test_agent(&core, "sage", "Sage").await;

        assert!(server.read_resource_text("agent-zoo://skills").await.is_err());
        assert!(server.read_resource_text("file:///etc/passwd").await.is_err());
        assert!(server.read_resource_text("agent-zoo://agents/ghost").await.is_err());
        assert!(
            server
                .read_resource_text("agent-zoo://agents/sage/brain/missing")
                .await
                .is_err()
        );
        assert!(
            server
                .read_resource_text("agent-zoo://agents/sage/brain?type=idea")
                .await
                .is_err()
        );
    }

    // =========================================================================
    // Prompt Tests
    // =========================================================================

    #[tokio::test]
    async fn test_prompt_list_and_get() {
        let (server, core, _tmp) = create_test_server();
        create_test_agent(&core, "sage", "Sage").await;

        let listed = server.prompt_list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "agent_zoo_use_sage");

        let (_description, text) = server.prompt_text("agent_zoo_use_sage").await.unwrap();
        assert!(text.starts_with(INJECTION_INTRO));
        assert!(text.contains("You are Sage.\n\n---\n\n## Active Skills\n\n### Research\nFind things"));
        assert!(!text.contains("Juggling"));
    }

    #[tokio::test]
    async fn test_prompt_requires_existing_agent() {
        let (server, core, _tmp) = create_test_server();
        create_test_agent(&core, "sage", "Sage").await;
        core.store.set_current_id(Some("sage".into())).await.unwrap();

        assert!(server.prompt_text("agent_zoo_use_ghost").await.is_err());
        assert!(server.prompt_text("agent_zoo_use_").await.is_err());
        assert!(server.prompt_text("something_else").await.is_err());
    }

    // =========================================================================
    // Tool Tests
    // =========================================================================

    #[tokio::test]
    async fn test_list_and_get_agent() {
        let (server, core, _tmp) = create_test_server();
        create_test_agent(&core, "sage", "Sage").await;

        let listed = call(&server, tools::LIST_AGENTS, json!({})).await;
        assert_eq!(listed, json!([{ "id": "sage", "name": "Sage" }]));

        let agent = call(&server, tools::GET_AGENT, json!({ "agentId": " sage " })).await;
        assert_eq!(agent["name"], "Sage");

        let err = call_err(&server, tools::GET_AGENT, json!({ "agentId": "ghost" })).await;
        assert_eq!(err.code, ToolErrorCode::AgentNotFound);
    }

    #[tokio::test]
    async fn test_optional_agent_falls_back_to_current() {
        let (server, core, _tmp) = create_test_server();
        create_test_agent(&core, "sage", "Sage").await;

        let err = call_err(&server, tools::GET_AGENT, json!({})).await;
        assert_eq!(err.code, ToolErrorCode::NoCurrentAgent);

        call(&server, tools::SET_CURRENT_AGENT, json!({ "agentId": "sage" })).await;
        let agent = call(&server, tools::GET_AGENT, json!({ "agentId": "" })).await;
        assert_eq!(agent["id"], "sage");
    }

    #[tokio::test]
    async fn test_create_brain_entry_validation() {
        let (server, core, _tmp) = create_test_server();
        create_test_agent(&core, "sage", "Sage").await;

        let err = call_err(
            &server,
            tools::CREATE_BRAIN_ENTRY,
            json!({ "agentId": "sage", "content": "x" }),
        )
        .await;
        assert_eq!(err.code, ToolErrorCode::InvalidArguments);

        let err = call_err(
            &server,
            tools::CREATE_BRAIN_ENTRY,
            json!({ "agentId": "sage", "type": "idea", "content": "x" }),
        )
        .await;
        assert_eq!(err.code, ToolErrorCode::InvalidArguments);

        let err = call_err(
            &server,
            tools::CREATE_BRAIN_ENTRY,
            json!({ "agentId": "sage", "type": "note", "content": "   " }),
        )
        .await;
        assert_eq!(err.code, ToolErrorCode::InvalidArguments);

        let err = call_err(
            &server,
            tools::CREATE_BRAIN_ENTRY,
            json!({ "agentId": "ghost", "type": "note", "content": "x" }),
        )
        .await;
        assert_eq!(err.code, ToolErrorCode::AgentNotFound);
    }

    #[tokio::test]
    async fn test_create_brain_entry() {
        let (server, core, _tmp) = create_test_server();
        create_test_agent(&core, "sage", "Sage").await;

        let entry = call(
            &server,
            tools::CREATE_BRAIN_ENTRY,
            json!({
                "agentId": "sage",
                "type": " milestone ",
                "content": "  Shipped v1  ",
                "tags": ["  release ", "", 7, "release"]
            }),
        )
        .await;

        assert_eq!(entry["agentId"], "sage");
        assert_eq!(entry["type"], "milestone");
        assert_eq!(entry["content"], "Shipped v1");
        assert_eq!(entry["tags"], json!(["release"]));
        assert_eq!(entry["pinned"], false);
        assert_eq!(entry["metadata"], json!({ "source": "mcp" }));
    }

    #[tokio::test]
    async fn test_update_and_delete_brain_entry() {
        let (server, core, _tmp) = create_test_server();
        create_test_agent(&core, "sage", "Sage").await;
        let entry = call(
            &server,
            tools::CREATE_BRAIN_ENTRY,
            json!({ "agentId": "sage", "type": "note", "content": "Draft" }),
        )
        .await;
        let entry_id = entry["id"].as_str().unwrap();

        let err = call_err(&server, tools::UPDATE_BRAIN_ENTRY, json!({ "agentId": "sage" })).await;
        assert_eq!(err.code, ToolErrorCode::InvalidArguments);

        let updated = call(
            &server,
            tools::UPDATE_BRAIN_ENTRY,
            json!({ "agentId": "sage", "entryId": entry_id, "type": "summary", "pinned": true }),
        )
        .await;
        assert_eq!(updated["type"], "summary");
        assert_eq!(updated["pinned"], true);
        assert_eq!(updated["timestamp"], entry["timestamp"]);

        let err = call_err(
            &server,
            tools::UPDATE_BRAIN_ENTRY,
            json!({ "agentId": "sage", "entryId": "missing", "content": "x" }),
        )
        .await;
        assert_eq!(err.code, ToolErrorCode::NotFound);

        let deleted = call(
            &server,
            tools::DELETE_BRAIN_ENTRY,
            json!({ "agentId": "sage", "entryId": entry_id }),
        )
        .await;
        assert_eq!(deleted["deleted"], true);

        let err = call_err(
            &server,
            tools::DELETE_BRAIN_ENTRY,
            json!({ "agentId": "sage", "entryId": entry_id }),
        )
        .await;
        assert_eq!(err.code, ToolErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_query_brain_entries() {
        let (server, core, _tmp) = create_test_server();
        create_test_agent(&core, "sage", "Sage").await;
        for (kind, tags, pinned) in [
            ("decision", json!(["a"]), true),
            ("note", json!(["b"]), false),
            ("note", json!([]), false),
        ] {
            call(
                &server,
                tools::CREATE_BRAIN_ENTRY,
                json!({ "agentId": "sage", "type": kind, "content": kind, "tags": tags, "pinned": pinned }),
            )
            .await;
        }

        let result = call(
            &server,
            tools::QUERY_BRAIN_ENTRIES,
            json!({ "agentId": "sage", "type": "note", "pinned": false }),
        )
        .await;
        assert_eq!(result["agentId"], "sage");
        assert_eq!(result["entries"].as_array().unwrap().len(), 2);

        let result = call(
            &server,
            tools::QUERY_BRAIN_ENTRIES,
            json!({ "agentId": "sage", "tags": ["a", "z"] }),
        )
        .await;
        assert_eq!(result["entries"].as_array().unwrap().len(), 1);
        assert_eq!(result["entries"][0]["type"], "decision");

        let err = call_err(
            &server,
            tools::QUERY_BRAIN_ENTRIES,
            json!({ "agentId": "sage", "type": "idea" }),
        )
        .await;
        assert_eq!(err.code, ToolErrorCode::InvalidArguments);
    }

    #[tokio::test]
    async fn test_inject_formats() {
        let (server, core, _tmp) = create_test_server();
        create_test_agent(&core, "sage", "Sage").await;

        let structured = call(
            &server,
            tools::INJECT,
            json!({ "agentId": "sage", "format": "structured" }),
        )
        .await;
        assert_eq!(
            structured,
            json!({
                "agentId": "sage",
                "agentName": "Sage",
                "systemPrompt": "You are Sage.",
                "skills": [{ "id": "research", "name": "Research", "description": "Find things" }]
            })
        );

        let compiled = call(&server, tools::INJECT, json!({ "agentId": "sage" })).await;
        let prompt = compiled["prompt"].as_str().unwrap();
        assert!(prompt.contains("id: sage"));
        assert!(prompt.ends_with("### Research\nFind things"));

        let err = call_err(
            &server,
            tools::INJECT,
            json!({ "agentId": "sage", "format": "yaml" }),
        )
        .await;
        assert_eq!(err.code, ToolErrorCode::InvalidFormat);
    }

    #[tokio::test]
    async fn test_set_and_get_current_agent() {
        let (server, core, _tmp) = create_test_server();
        create_test_agent(&core, "sage", "Sage").await;

        let err = call_err(&server, tools::SET_CURRENT_AGENT, json!({ "agentId": "ghost" })).await;
        assert_eq!(err.code, ToolErrorCode::AgentNotFound);

        let set = call(&server, tools::SET_CURRENT_AGENT, json!({ "agentId": "sage" })).await;
        assert_eq!(set, json!({ "currentAgentId": "sage" }));

        let current = call(&server, tools::GET_CURRENT_AGENT, json!({})).await;
        assert_eq!(current["currentAgentId"], "sage");
        assert_eq!(current["agent"]["name"], "Sage");

        let cleared = call(&server, tools::SET_CURRENT_AGENT, json!({ "agentId": null })).await;
        assert_eq!(cleared, json!({ "currentAgentId": null }));
        let current = call(&server, tools::GET_CURRENT_AGENT, json!({})).await;
        assert_eq!(current, json!({ "currentAgentId": null, "agent": null }));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_structured_error() {
        let (server, _core, _tmp) = create_test_server();
        let err = call_err(&server, "agent_zoo_teleport", json!({})).await;
        assert_eq!(err.code, ToolErrorCode::UnknownTool);
        assert_eq!(err.payload()["error"], true);
    }
}
