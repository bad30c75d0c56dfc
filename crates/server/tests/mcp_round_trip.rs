//! Drives `SlackBridgeService` through a real MCP client over an in-memory pipe.

use std::sync::Arc;

use rmcp::model::{CallToolRequestParam, CallToolResult};
use rmcp::service::{serve_client, serve_server, RunningService};
use rmcp::RoleClient;
use serde_json::{json, Value};
use slackbridge_gateway::{GatewayConfig, SlackGateway};
use slackbridge_server::{SlackBridgeService, ToolDispatcher, ToolTable};
use slackbridge_test_utils::{user, user_page, RecordingTransport};

struct Harness {
    client: RunningService<RoleClient, ()>,
    transport: Arc<RecordingTransport>,
}

async fn start() -> anyhow::Result<Harness> {
    let transport = RecordingTransport::new();
    let gateway = SlackGateway::new(transport.clone(), GatewayConfig::new("T1"));
    let service =
        SlackBridgeService::new(ToolDispatcher::new(Arc::new(gateway), ToolTable::slack()));

    let (server_io, client_io) = tokio::io::duplex(64 * 1024);
    tokio::spawn(async move {
        if let Ok(running) = serve_server(service, server_io).await {
            let _ = running.waiting().await;
        }
    });
    let client = serve_client((), client_io).await?;
    Ok(Harness { client, transport })
}

async fn call(harness: &Harness, name: &str, args: Value) -> anyhow::Result<CallToolResult> {
    Ok(harness
        .client
        .peer()
        .call_tool(CallToolRequestParam {
            name: name.to_string().into(),
            arguments: args.as_object().cloned(),
        })
        .await?)
}

fn text_of(result: &CallToolResult) -> String {
    result.content[0]
        .as_text()
        .map(|t| t.text.clone())
        .unwrap_or_default()
}

#[tokio::test]
async fn given_client_when_listing_tools_then_full_catalog_is_returned() -> anyhow::Result<()> {
    let harness = start().await?;

    let tools = harness.client.peer().list_all_tools().await?;
    let mut names: Vec<String> = tools.iter().map(|t| t.name.to_string()).collect();
    names.sort();

    assert_eq!(
        names,
        vec![
            "add_reaction",
            "edit_message",
            "get_channel_history",
            "get_thread_replies",
            "get_user_profile",
            "get_users",
            "list_channels",
            "post_message",
            "reply_to_thread",
        ]
    );
    Ok(())
}

#[tokio::test]
async fn given_post_without_text_when_called_then_error_names_field_and_nothing_is_sent(
) -> anyhow::Result<()> {
    let harness = start().await?;

    let result = call(&harness, "post_message", json!({"channel_id": "C1"})).await?;

    assert_eq!(result.is_error, Some(true));
    assert_eq!(text_of(&result), "Missing required arguments: text");
    assert_eq!(harness.transport.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn given_unknown_tool_when_called_then_error_envelope_and_nothing_is_sent(
) -> anyhow::Result<()> {
    let harness = start().await?;

    let result = call(&harness, "archive_channel", json!({})).await?;

    assert_eq!(result.is_error, Some(true));
    assert!(text_of(&result).contains("unknown tool"));
    assert_eq!(harness.transport.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn given_oversized_limit_when_listing_channels_then_request_is_clamped(
) -> anyhow::Result<()> {
    let harness = start().await?;

    let result = call(&harness, "list_channels", json!({"limit": 500})).await?;

    assert_eq!(result.is_error, Some(false));
    let sent = harness.transport.calls_to("conversations.list");
    assert_eq!(sent[0].params["limit"], json!(200));
    Ok(())
}

#[tokio::test]
async fn given_defaults_when_reading_then_documented_limits_are_sent() -> anyhow::Result<()> {
    let harness = start().await?;

    call(&harness, "get_users", json!({})).await?;
    call(&harness, "get_channel_history", json!({"channel_id": "C1"})).await?;

    assert_eq!(
        harness.transport.calls_to("users.list")[0].params["limit"],
        json!(100)
    );
    assert_eq!(
        harness.transport.calls_to("conversations.history")[0].params["limit"],
        json!(10)
    );
    Ok(())
}

#[tokio::test]
async fn given_punctuated_reaction_when_added_then_sanitized_name_is_sent() -> anyhow::Result<()> {
    let harness = start().await?;

    let result = call(
        &harness,
        "add_reaction",
        json!({"channel_id": "C1", "timestamp": "111.222", "reaction": "thumbs-up!!"}),
    )
    .await?;

    assert_eq!(result.is_error, Some(false));
    let sent = harness.transport.calls_to("reactions.add");
    assert_eq!(sent[0].params["name"], json!("thumbsup"));
    assert_eq!(sent[0].params["timestamp"], json!("111.222"));
    Ok(())
}

#[tokio::test]
async fn given_reply_with_mention_when_called_then_text_is_resolved_and_ts_returned(
) -> anyhow::Result<()> {
    let harness = start().await?;
    harness.transport.respond(
        "users.list",
        user_page(json!([user("U1", "jane.d", "Jane Doe", "Jane")]), ""),
    );
    harness.transport.respond(
        "chat.postMessage",
        json!({"ok": true, "channel": "C1", "ts": "222.333"}),
    );

    let result = call(
        &harness,
        "reply_to_thread",
        json!({
            "channel_id": "C1",
            "thread_ts": "111.222",
            "text": "cc @Jane Doe for review",
            "broadcast": true
        }),
    )
    .await?;

    assert_eq!(result.is_error, Some(false));
    let body: Value = serde_json::from_str(&text_of(&result))?;
    assert_eq!(body["ts"], json!("222.333"));

    let sent = &harness.transport.calls_to("chat.postMessage")[0];
    assert_eq!(sent.params["text"], json!("cc @jane.d for review"));
    assert_eq!(sent.params["reply_broadcast"], json!(true));
    Ok(())
}

#[tokio::test]
async fn given_remote_error_when_posting_then_payload_passes_through() -> anyhow::Result<()> {
    let harness = start().await?;
    harness.transport.respond(
        "chat.postMessage",
        json!({"ok": false, "error": "not_in_channel"}),
    );

    let result = call(
        &harness,
        "post_message",
        json!({"channel_id": "C1", "text": "hello"}),
    )
    .await?;

    assert_eq!(result.is_error, Some(false));
    let body: Value = serde_json::from_str(&text_of(&result))?;
    assert_eq!(body, json!({"ok": false, "error": "not_in_channel"}));
    Ok(())
}
