use clap::{Args, Parser, Subcommand};

use crate::config::{API_TIMEOUT_VAR, USER_PAGE_CAP_VAR};

/// Command-line interface for the `slackbridge` application.
#[derive(Debug, Parser)]
#[command(
    name = "slackbridge",
    about = "MCP server exposing a Slack workspace as tools"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available `slackbridge` commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Runs as an MCP server over stdio.
    Serve(ServeArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct ServeArgs {
    /// Prints the tool catalog as JSON and exits.
    #[arg(long, default_value_t = false)]
    pub list_tools: bool,
    /// Slack API request timeout in milliseconds.
    #[arg(long, value_name = "MILLIS", env = API_TIMEOUT_VAR)]
    pub timeout_ms: Option<u64>,
    /// Maximum `users.list` pages fetched when rebuilding the user directory.
    #[arg(long, value_name = "PAGES", env = USER_PAGE_CAP_VAR)]
    pub user_page_cap: Option<usize>,
}
