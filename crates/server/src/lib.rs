//! MCP server for the slackbridge application.
//!
//! Exposes nine Slack tools over stdio. Tool calls are validated and routed
//! by [`dispatcher::ToolDispatcher`]; every outbound request goes through
//! [`slackbridge_gateway::SlackGateway`], which applies rate limiting and
//! text sanitization.
//!
//! The main entry point is [`run`].

mod app;
pub mod cli;
mod commands;
pub mod config;
pub mod dispatcher;
pub mod handler;
pub mod tool_schemas;

pub use app::run;
pub use config::{ConfigError, ServerConfig};
pub use dispatcher::{DispatchError, ToolDispatcher, ToolError, ToolHandler, ToolTable};
pub use handler::SlackBridgeService;
