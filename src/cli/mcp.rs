//! `taxonomy mcp`: serve the tool set over stdio.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use rmcp::ServiceExt;

use crate::mcp::McpServer;

use super::{connect, App};

impl App {
    /// Serves MCP on stdin/stdout until the client disconnects.
    ///
    /// Logs go to stderr so they never interleave with protocol frames.
    pub async fn run_mcp(&self) -> Result<()> {
        let ctx = connect().await?;
        tracing::info!(
            default_limit = ctx.config.pagination.default_limit,
            max_limit = ctx.config.pagination.max_limit,
            "Starting taxonomy MCP server"
        );

        let running = McpServer::new(ctx)
            .serve(rmcp::transport::stdio())
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "MCP handshake failed");
                eyre!("MCP handshake failed: {}", e)
            })?;

        let reason = running.waiting().await.map_err(|e| {
            tracing::error!(error = %e, "MCP server task failed");
            eyre!("MCP server task failed: {}", e)
        })?;

        tracing::info!(reason = ?reason, "MCP session closed");
        Ok(())
    }
}
