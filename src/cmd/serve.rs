//! MCP stdio server: `manta-review serve`.

use anyhow::Result;
use manta_review::mcp::{McpServer, ToolHandler};
use manta_review::orchestrator::ReviewOrchestrator;
use manta_review::review_config::ReviewConfig;
use std::path::PathBuf;
use std::sync::Arc;

use crate::Cli;

pub async fn cmd_serve(cli: &Cli, project_dir: PathBuf) -> Result<()> {
    let config = ReviewConfig::with_cli_args(project_dir, cli.verbose, cli.serial.clone())?;
    for warning in config.validate() {
        tracing::warn!("{}", warning);
    }

    // No progress UI: stdout belongs to the protocol.
    let orchestrator = ReviewOrchestrator::from_config(&config);
    let server = McpServer::new(ToolHandler::new(Arc::new(orchestrator)));
    server.run().await
}
