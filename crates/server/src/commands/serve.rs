//! Handler for the `serve` command.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use rmcp::service::serve_server;
use rmcp::transport::stdio;
use tokio::runtime::Runtime;

use slackbridge_gateway::{HttpTransport, SlackGateway};

use crate::cli::ServeArgs;
use crate::config::ServerConfig;
use crate::dispatcher::{ToolDispatcher, ToolTable};
use crate::handler::SlackBridgeService;
use crate::tool_schemas::all_tools;

/// Handle the `serve` command.
pub(crate) fn handle_serve_command(args: ServeArgs) -> Result<()> {
    if args.list_tools {
        let catalog =
            serde_json::to_string_pretty(&all_tools()).context("failed to render tool catalog")?;
        println!("{catalog}");
        return Ok(());
    }

    let config = ServerConfig::from_env()
        .context("invalid Slack configuration")?
        .with_overrides(args.timeout_ms, args.user_page_cap);
    let service = build_service(config)?;

    let rt = Runtime::new()?;
    tracing::info!(
        target: "slackbridge::server",
        tools = service.dispatcher().tools().len(),
        "starting MCP server on stdio"
    );
    let running = rt.block_on(async {
        serve_server(service, stdio())
            .await
            .map_err(|e| anyhow!("failed to start server: {e}"))
    })?;
    rt.block_on(async {
        running
            .waiting()
            .await
            .map_err(|e| anyhow!("server task ended: {e}"))
    })?;
    Ok(())
}

/// Wire the HTTP transport, gateway and dispatcher together.
pub(crate) fn build_service(config: ServerConfig) -> Result<SlackBridgeService> {
    let transport =
        HttpTransport::new(config.transport).context("failed to build Slack HTTP client")?;
    let gateway = SlackGateway::new(Arc::new(transport), config.gateway);
    Ok(SlackBridgeService::new(ToolDispatcher::new(
        Arc::new(gateway),
        ToolTable::slack(),
    )))
}
