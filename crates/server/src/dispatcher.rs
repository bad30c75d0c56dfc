//! Tool dispatch: argument validation, defaults, and envelope shaping.
//!
//! [`ToolTable`] is a fixed name-to-handler map built once and injected into
//! [`ToolDispatcher`]. Handlers validate their own required arguments, call
//! the gateway, and hand back a JSON value; the dispatcher wraps every
//! outcome, success or failure, in the same single-text-block envelope.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use rmcp::model::{CallToolResult, Content, JsonObject, Tool};
use serde_json::Value;
use thiserror::Error;

use slackbridge_gateway::{GatewayError, SlackGateway, MAX_HISTORY_LIMIT, MAX_LIST_LIMIT};

use crate::tool_schemas::{self, DEFAULT_HISTORY_LIMIT, DEFAULT_LIST_LIMIT};

/// Failures raised before a handler runs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("arguments are required to call {tool}")]
    MissingArguments { tool: String },

    #[error("unknown tool: {tool}")]
    UnknownTool { tool: String },
}

/// Failures raised inside a handler.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Missing required arguments: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

pub type ToolResult = Result<Value, ToolError>;

/// A registered tool implementation.
pub type ToolHandler = for<'a> fn(&'a SlackGateway, &'a JsonObject) -> BoxFuture<'a, ToolResult>;

/// Immutable name-to-handler registry.
#[derive(Clone)]
pub struct ToolTable {
    handlers: BTreeMap<&'static str, ToolHandler>,
}

impl ToolTable {
    pub fn new(entries: impl IntoIterator<Item = (&'static str, ToolHandler)>) -> Self {
        Self {
            handlers: entries.into_iter().collect(),
        }
    }

    /// The nine Slack tools.
    pub fn slack() -> Self {
        let entries: [(&'static str, ToolHandler); 9] = [
            (tool_schemas::ADD_REACTION, add_reaction),
            (tool_schemas::EDIT_MESSAGE, edit_message),
            (tool_schemas::GET_CHANNEL_HISTORY, get_channel_history),
            (tool_schemas::GET_THREAD_REPLIES, get_thread_replies),
            (tool_schemas::GET_USER_PROFILE, get_user_profile),
            (tool_schemas::GET_USERS, get_users),
            (tool_schemas::LIST_CHANNELS, list_channels),
            (tool_schemas::POST_MESSAGE, post_message),
            (tool_schemas::REPLY_TO_THREAD, reply_to_thread),
        ];
        Self::new(entries)
    }

    pub fn get(&self, name: &str) -> Option<ToolHandler> {
        self.handlers.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.handlers.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Routes tool calls to handlers and normalizes their results.
pub struct ToolDispatcher {
    gateway: Arc<SlackGateway>,
    table: ToolTable,
    catalog: Vec<Tool>,
}

impl ToolDispatcher {
    pub fn new(gateway: Arc<SlackGateway>, table: ToolTable) -> Self {
        Self {
            gateway,
            table,
            catalog: tool_schemas::all_tools(),
        }
    }

    pub fn tools(&self) -> &[Tool] {
        &self.catalog
    }

    pub fn gateway(&self) -> &SlackGateway {
        &self.gateway
    }

    /// Invoke `name` with `args`.
    ///
    /// Handler failures come back as error envelopes; only a missing argument
    /// map or an unregistered name is an `Err`.
    pub async fn call(
        &self,
        name: &str,
        args: Option<&JsonObject>,
    ) -> Result<CallToolResult, DispatchError> {
        let args = args.ok_or_else(|| DispatchError::MissingArguments {
            tool: name.to_string(),
        })?;
        let handler = self
            .table
            .get(name)
            .ok_or_else(|| DispatchError::UnknownTool {
                tool: name.to_string(),
            })?;

        tracing::debug!(target: "slackbridge::dispatch", tool = name, "dispatching tool call");
        match handler(&self.gateway, args).await {
            Ok(value) => Ok(success_envelope(value)),
            Err(e) => {
                tracing::warn!(target: "slackbridge::dispatch", tool = name, error = %e, "tool call failed");
                Ok(error_envelope(e.to_string()))
            }
        }
    }
}

/// Wrap a handler result. Strings pass through; anything else is compact JSON.
pub fn success_envelope(value: Value) -> CallToolResult {
    let text = match value {
        Value::String(s) => s,
        other => other.to_string(),
    };
    CallToolResult {
        content: vec![Content::text(text)],
        structured_content: None,
        is_error: Some(false),
        meta: None,
    }
}

pub fn error_envelope(message: impl Into<String>) -> CallToolResult {
    CallToolResult {
        content: vec![Content::text(message.into())],
        structured_content: None,
        is_error: Some(true),
        meta: None,
    }
}

/// Non-empty string argument.
fn str_arg<'a>(args: &'a JsonObject, key: &str) -> Option<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// All of `keys` as non-empty strings, or every missing key at once.
fn required<'a, const N: usize>(
    args: &'a JsonObject,
    keys: [&'static str; N],
) -> Result<[&'a str; N], ToolError> {
    let missing: Vec<&'static str> = keys
        .iter()
        .copied()
        .filter(|k| str_arg(args, k).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(ToolError::MissingFields(missing));
    }
    Ok(keys.map(|k| str_arg(args, k).unwrap_or_default()))
}

/// Page size from a number or numeric string, defaulted and clamped to `1..=max`.
fn limit_arg(args: &JsonObject, key: &str, default: u32, max: u32) -> u32 {
    let raw = match args.get(key) {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    match raw {
        Some(n) => n.clamp(1, i64::from(max)) as u32,
        None => default.min(max),
    }
}

fn bool_arg(args: &JsonObject, key: &str, default: bool) -> bool {
    match args.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        _ => default,
    }
}

fn add_reaction<'a>(gateway: &'a SlackGateway, args: &'a JsonObject) -> BoxFuture<'a, ToolResult> {
    Box::pin(async move {
        let [channel_id, timestamp, reaction] =
            required(args, ["channel_id", "timestamp", "reaction"])?;
        Ok(gateway
            .add_reaction(channel_id, timestamp, reaction)
            .await?)
    })
}

fn edit_message<'a>(gateway: &'a SlackGateway, args: &'a JsonObject) -> BoxFuture<'a, ToolResult> {
    Box::pin(async move {
        let [channel_id, timestamp, text] = required(args, ["channel_id", "timestamp", "text"])?;
        Ok(gateway.edit_message(channel_id, timestamp, text).await?)
    })
}

fn get_channel_history<'a>(
    gateway: &'a SlackGateway,
    args: &'a JsonObject,
) -> BoxFuture<'a, ToolResult> {
    Box::pin(async move {
        let [channel_id] = required(args, ["channel_id"])?;
        let limit = limit_arg(args, "limit", DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT);
        Ok(gateway.get_channel_history(channel_id, limit).await?)
    })
}

fn get_thread_replies<'a>(
    gateway: &'a SlackGateway,
    args: &'a JsonObject,
) -> BoxFuture<'a, ToolResult> {
    Box::pin(async move {
        let [channel_id, thread_ts] = required(args, ["channel_id", "thread_ts"])?;
        Ok(gateway.get_thread_replies(channel_id, thread_ts).await?)
    })
}

fn get_user_profile<'a>(
    gateway: &'a SlackGateway,
    args: &'a JsonObject,
) -> BoxFuture<'a, ToolResult> {
    Box::pin(async move {
        let [user_id] = required(args, ["user_id"])?;
        Ok(gateway.get_user_profile(user_id).await?)
    })
}

fn get_users<'a>(gateway: &'a SlackGateway, args: &'a JsonObject) -> BoxFuture<'a, ToolResult> {
    Box::pin(async move {
        let limit = limit_arg(args, "limit", DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT);
        Ok(gateway.get_users(limit, str_arg(args, "cursor")).await?)
    })
}

fn list_channels<'a>(gateway: &'a SlackGateway, args: &'a JsonObject) -> BoxFuture<'a, ToolResult> {
    Box::pin(async move {
        let limit = limit_arg(args, "limit", DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT);
        Ok(gateway.list_channels(limit, str_arg(args, "cursor")).await?)
    })
}

fn post_message<'a>(gateway: &'a SlackGateway, args: &'a JsonObject) -> BoxFuture<'a, ToolResult> {
    Box::pin(async move {
        let [channel_id, text] = required(args, ["channel_id", "text"])?;
        Ok(gateway.post_message(channel_id, text).await?)
    })
}

fn reply_to_thread<'a>(
    gateway: &'a SlackGateway,
    args: &'a JsonObject,
) -> BoxFuture<'a, ToolResult> {
    Box::pin(async move {
        let [channel_id, thread_ts, text] = required(args, ["channel_id", "thread_ts", "text"])?;
        let broadcast = bool_arg(args, "broadcast", false);
        Ok(gateway
            .post_reply(channel_id, thread_ts, text, broadcast)
            .await?)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::object;
    use serde_json::json;

    fn args(v: Value) -> JsonObject {
        object(v)
    }

    fn text_of(result: &CallToolResult) -> String {
        result.content[0]
            .as_text()
            .map(|t| t.text.clone())
            .unwrap_or_default()
    }

    #[test]
    fn given_catalog_and_table_when_compared_then_names_match_one_to_one() {
        let table = ToolTable::slack();
        let mut catalog: Vec<String> = tool_schemas::all_tools()
            .iter()
            .map(|t| t.name.to_string())
            .collect();
        catalog.sort();
        let handlers: Vec<String> = table.names().map(str::to_string).collect();
        assert_eq!(catalog, handlers);
        assert_eq!(table.len(), 9);
    }

    #[test]
    fn given_catalog_required_fields_when_missing_then_handler_names_them() {
        // Every declared required field is enforced by the handler's own check.
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let gateway = SlackGateway::new(
            Arc::new(NeverTransport),
            slackbridge_gateway::GatewayConfig::new("T1"),
        );
        let table = ToolTable::slack();
        for tool in tool_schemas::all_tools() {
            let required = tool_schemas::required_fields(&tool);
            if required.is_empty() {
                continue;
            }
            let handler = table.get(&tool.name).unwrap();
            let empty = JsonObject::new();
            let err = rt.block_on(handler(&gateway, &empty)).unwrap_err();
            assert_eq!(
                err.to_string(),
                format!("Missing required arguments: {}", required.join(", ")),
                "{}",
                tool.name
            );
        }
    }

    struct NeverTransport;

    #[async_trait::async_trait]
    impl slackbridge_gateway::SlackTransport for NeverTransport {
        async fn call(
            &self,
            request: &slackbridge_gateway::ApiRequest,
        ) -> Result<Value, GatewayError> {
            panic!("unexpected network call to {}", request.method)
        }
    }

    #[test]
    fn given_missing_and_blank_fields_when_required_then_all_are_reported_in_order() {
        let a = args(json!({"channel_id": "C1", "text": "  "}));
        let err = required(&a, ["channel_id", "thread_ts", "text"]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required arguments: thread_ts, text"
        );
    }

    #[test]
    fn given_non_string_field_when_required_then_it_counts_as_missing() {
        let a = args(json!({"channel_id": 42}));
        assert!(required(&a, ["channel_id"]).is_err());
    }

    #[test]
    fn given_limit_variants_when_parsed_then_defaulted_and_clamped() {
        let cases = [
            (json!({}), 100),
            (json!({"limit": 500}), 200),
            (json!({"limit": "500"}), 200),
            (json!({"limit": " 25 "}), 25),
            (json!({"limit": 0}), 1),
            (json!({"limit": -3}), 1),
            (json!({"limit": 12.7}), 12),
            (json!({"limit": "lots"}), 100),
            (json!({"limit": null}), 100),
        ];
        for (input, expected) in cases {
            assert_eq!(
                limit_arg(&args(input.clone()), "limit", 100, 200),
                expected,
                "{input}"
            );
        }
        assert_eq!(limit_arg(&args(json!({"limit": 5000})), "limit", 10, 1000), 1000);
    }

    #[test]
    fn given_broadcast_variants_when_parsed_then_default_is_false() {
        assert!(!bool_arg(&args(json!({})), "broadcast", false));
        assert!(bool_arg(&args(json!({"broadcast": true})), "broadcast", false));
        assert!(bool_arg(&args(json!({"broadcast": "TRUE"})), "broadcast", false));
        assert!(!bool_arg(&args(json!({"broadcast": "no"})), "broadcast", false));
    }

    #[test]
    fn given_values_when_enveloped_then_strings_pass_through_and_objects_are_compact() {
        let plain = success_envelope(json!("done"));
        assert_eq!(text_of(&plain), "done");
        assert_eq!(plain.is_error, Some(false));

        let structured = success_envelope(json!({"ts": "1.2"}));
        assert_eq!(text_of(&structured), r#"{"ts":"1.2"}"#);
        assert_eq!(structured.content.len(), 1);

        let failed = error_envelope("nope");
        assert_eq!(text_of(&failed), "nope");
        assert_eq!(failed.is_error, Some(true));
    }

    #[tokio::test]
    async fn given_no_argument_map_when_called_then_missing_arguments() {
        let dispatcher = ToolDispatcher::new(
            Arc::new(SlackGateway::new(
                Arc::new(NeverTransport),
                slackbridge_gateway::GatewayConfig::new("T1"),
            )),
            ToolTable::slack(),
        );
        let err = dispatcher.call("list_channels", None).await.unwrap_err();
        assert_eq!(
            err,
            DispatchError::MissingArguments {
                tool: "list_channels".into()
            }
        );
    }

    #[tokio::test]
    async fn given_unregistered_name_when_called_then_unknown_tool() {
        let dispatcher = ToolDispatcher::new(
            Arc::new(SlackGateway::new(
                Arc::new(NeverTransport),
                slackbridge_gateway::GatewayConfig::new("T1"),
            )),
            ToolTable::slack(),
        );
        let err = dispatcher
            .call("delete_workspace", Some(&JsonObject::new()))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            DispatchError::UnknownTool {
                tool: "delete_workspace".into()
            }
        );
    }

    #[tokio::test]
    async fn given_substitute_table_when_called_then_injected_handler_runs() {
        fn canned<'a>(_: &'a SlackGateway, _: &'a JsonObject) -> BoxFuture<'a, ToolResult> {
            Box::pin(async { Ok(json!("canned")) })
        }
        let dispatcher = ToolDispatcher::new(
            Arc::new(SlackGateway::new(
                Arc::new(NeverTransport),
                slackbridge_gateway::GatewayConfig::new("T1"),
            )),
            ToolTable::new([("post_message", canned as ToolHandler)]),
        );
        let result = dispatcher
            .call("post_message", Some(&JsonObject::new()))
            .await
            .unwrap();
        assert_eq!(text_of(&result), "canned");
        assert!(dispatcher
            .call("get_users", Some(&JsonObject::new()))
            .await
            .is_err());
    }
}
