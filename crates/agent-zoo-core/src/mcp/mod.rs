//! MCP (Model Context Protocol) server for Agent Zoo
//!
//! Lets an LLM client read agents as resources, adopt a persona through a
//! prompt, and keep an agent's brain journal up to date through tools.

pub mod params;
pub mod prompts;
pub mod resources;
pub mod server;
pub mod tools;

pub use server::AgentZooMcpServer;
pub use tools::{ToolCall, ToolError, ToolErrorCode};
