//! Command-line interface for the `slackbridge` application.
//!
//! This crate serves as the main entry point for the executable, delegating
//! its core functionality to the `slackbridge-server` crate.

fn main() -> anyhow::Result<()> {
    slackbridge_server::run()
}
