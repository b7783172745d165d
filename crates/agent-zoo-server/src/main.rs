#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

mod api;
mod config;

use agent_zoo_core::AppCore;
use agent_zoo_core::mcp::AgentZooMcpServer;
use anyhow::Context;
use api::AppState;
use config::ServerConfig;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout belongs to the MCP transport, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,agent_zoo_server=debug,agent_zoo_core=debug".into()),
        )
        .with_target(false)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting Agent Zoo server");

    let config = ServerConfig::load()?;
    let core = Arc::new(AppCore::new(config.store_path.clone()));

    if config.mcp_enabled {
        let mcp = AgentZooMcpServer::new(core.clone());
        tokio::spawn(async move {
            if let Err(err) = mcp.run().await {
                tracing::error!(error = %err, "MCP server stopped");
            }
        });
        tracing::info!("MCP server listening on stdio");
    }

    let state = AppState::new(core, config.current_policy);
    let app = api::router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!(address = %addr, "HTTP API listening");
    axum::serve(listener, app)
        .await
        .context("HTTP server error")?;

    Ok(())
}
