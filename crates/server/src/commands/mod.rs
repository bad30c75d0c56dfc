//! CLI command handlers for the slackbridge application.

mod serve;

pub(crate) use serve::handle_serve_command;
