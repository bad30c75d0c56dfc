//! MCP `ServerHandler` implementation for [`SlackBridgeService`].
//!
//! - `list_tools()` returns the fixed Slack tool catalog
//! - `call_tool()` routes through [`ToolDispatcher`]; every failure, including
//!   unknown tools and missing arguments, comes back as an error envelope
//!   rather than a protocol error

use std::sync::Arc;

use rmcp::model::{
    CallToolRequestParam, CallToolResult, InitializeResult, ListToolsResult,
    PaginatedRequestParam, ServerCapabilities,
};
use rmcp::ServerHandler;

use crate::dispatcher::{error_envelope, ToolDispatcher};

/// The MCP-facing service. Cheap to clone.
#[derive(Clone)]
pub struct SlackBridgeService {
    dispatcher: Arc<ToolDispatcher>,
}

impl SlackBridgeService {
    pub fn new(dispatcher: ToolDispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
        }
    }

    pub fn dispatcher(&self) -> &ToolDispatcher {
        &self.dispatcher
    }

    /// Dispatch a call, folding dispatch failures into an error envelope.
    pub async fn handle_call(&self, request: CallToolRequestParam) -> CallToolResult {
        let name = request.name.to_string();
        match self
            .dispatcher
            .call(&name, request.arguments.as_ref())
            .await
        {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(target: "slackbridge::dispatch", tool = %name, error = %e, "rejected tool call");
                error_envelope(e.to_string())
            }
        }
    }
}

impl ServerHandler for SlackBridgeService {
    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, rmcp::ErrorData>> + Send + '_
    {
        std::future::ready(Ok(ListToolsResult {
            tools: self.dispatcher.tools().to_vec(),
            next_cursor: None,
        }))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, rmcp::ErrorData>> + Send + '_
    {
        Box::pin(async move { Ok(self.handle_call(request).await) })
    }

    fn get_info(&self) -> InitializeResult {
        InitializeResult {
            capabilities: ServerCapabilities {
                tools: Some(Default::default()),
                ..Default::default()
            },
            instructions: Some(
                "Slack workspace bridge: read channels, threads and users; post, reply, edit and react."
                    .into(),
            ),
            ..Default::default()
        }
    }
}
