//! CLI integration tests for `slackbridge serve`.

use std::process::Command;

use anyhow::{Context, Result};
use serde_json::Value;

#[test]
fn given_list_tools_flag_when_serving_then_catalog_is_printed_without_credentials() -> Result<()> {
    let output = Command::new(env!("CARGO_BIN_EXE_slackbridge"))
        .args(["serve", "--list-tools"])
        .env_remove("SLACK_BOT_TOKEN")
        .env_remove("SLACK_TEAM_ID")
        .output()
        .context("failed to run slackbridge")?;

    assert!(output.status.success(), "{output:?}");
    let catalog: Value = serde_json::from_slice(&output.stdout)?;
    let names: Vec<&str> = catalog
        .as_array()
        .context("catalog is an array")?
        .iter()
        .filter_map(|t| t["name"].as_str())
        .collect();
    assert_eq!(names.len(), 9);
    assert!(names.contains(&"reply_to_thread"));
    Ok(())
}

#[test]
fn given_missing_token_when_serving_then_process_fails_and_names_variable() -> Result<()> {
    let output = Command::new(env!("CARGO_BIN_EXE_slackbridge"))
        .arg("serve")
        .env_remove("SLACK_BOT_TOKEN")
        .env("SLACK_TEAM_ID", "T1")
        .output()
        .context("failed to run slackbridge")?;

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("SLACK_BOT_TOKEN"), "{stderr}");
    Ok(())
}
