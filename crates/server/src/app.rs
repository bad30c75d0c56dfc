//! Process entry point: logging setup, argument parsing, command dispatch.

use anyhow::Result;
use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::commands::handle_serve_command;

/// Parse the command line and run the selected command.
///
/// Logs go to stderr; stdout carries the MCP stream.
pub fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Serve(args)) => handle_serve_command(args),
        None => handle_serve_command(Default::default()),
    }
}
