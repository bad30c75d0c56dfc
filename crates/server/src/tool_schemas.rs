//! MCP tool schema definitions for the Slack tools.
//!
//! The catalog here and the handler table in [`crate::dispatcher`] must name
//! the same tools; a test in the dispatcher keeps them in lockstep.

use std::sync::Arc;

use rmcp::model::{object, JsonObject, Tool, ToolAnnotations};
use serde_json::json;

use slackbridge_gateway::{MAX_HISTORY_LIMIT, MAX_LIST_LIMIT};

pub const ADD_REACTION: &str = "add_reaction";
pub const EDIT_MESSAGE: &str = "edit_message";
pub const GET_CHANNEL_HISTORY: &str = "get_channel_history";
pub const GET_THREAD_REPLIES: &str = "get_thread_replies";
pub const GET_USER_PROFILE: &str = "get_user_profile";
pub const GET_USERS: &str = "get_users";
pub const LIST_CHANNELS: &str = "list_channels";
pub const POST_MESSAGE: &str = "post_message";
pub const REPLY_TO_THREAD: &str = "reply_to_thread";

/// Default page size for `list_channels` and `get_users`.
pub const DEFAULT_LIST_LIMIT: u32 = 100;
/// Default page size for `get_channel_history`.
pub const DEFAULT_HISTORY_LIMIT: u32 = 10;

fn channel_id() -> serde_json::Value {
    json!({"type": "string", "description": "The ID of the channel"})
}

fn add_reaction_schema() -> Arc<JsonObject> {
    Arc::new(object(json!({
        "type": "object",
        "required": ["channel_id", "timestamp", "reaction"],
        "properties": {
            "channel_id": channel_id(),
            "timestamp": {"type": "string", "description": "The timestamp of the message to react to"},
            "reaction": {"type": "string", "description": "The name of the emoji reaction (without ::)"}
        }
    })))
}

fn edit_message_schema() -> Arc<JsonObject> {
    Arc::new(object(json!({
        "type": "object",
        "required": ["channel_id", "timestamp", "text"],
        "properties": {
            "channel_id": channel_id(),
            "timestamp": {"type": "string", "description": "The timestamp of the message to edit"},
            "text": {"type": "string", "description": "The new message text; markdown is converted to Slack mrkdwn"}
        }
    })))
}

fn channel_history_schema() -> Arc<JsonObject> {
    Arc::new(object(json!({
        "type": "object",
        "required": ["channel_id"],
        "properties": {
            "channel_id": channel_id(),
            "limit": {
                "type": "number",
                "description": "Number of messages to retrieve",
                "default": DEFAULT_HISTORY_LIMIT,
                "minimum": 1,
                "maximum": MAX_HISTORY_LIMIT
            }
        }
    })))
}

fn thread_replies_schema() -> Arc<JsonObject> {
    Arc::new(object(json!({
        "type": "object",
        "required": ["channel_id", "thread_ts"],
        "properties": {
            "channel_id": channel_id(),
            "thread_ts": {
                "type": "string",
                "description": "The timestamp of the parent message in the format '1234567890.123456'"
            }
        }
    })))
}

fn user_profile_schema() -> Arc<JsonObject> {
    Arc::new(object(json!({
        "type": "object",
        "required": ["user_id"],
        "properties": {
            "user_id": {"type": "string", "description": "The ID of the user"}
        }
    })))
}

fn paged_list_schema(limit_description: &str) -> Arc<JsonObject> {
    Arc::new(object(json!({
        "type": "object",
        "properties": {
            "limit": {
                "type": "number",
                "description": limit_description,
                "default": DEFAULT_LIST_LIMIT,
                "minimum": 1,
                "maximum": MAX_LIST_LIMIT
            },
            "cursor": {"type": "string", "description": "Pagination cursor for next page of results"}
        }
    })))
}

fn post_message_schema() -> Arc<JsonObject> {
    Arc::new(object(json!({
        "type": "object",
        "required": ["channel_id", "text"],
        "properties": {
            "channel_id": channel_id(),
            "text": {"type": "string", "description": "The message text; markdown is converted to Slack mrkdwn"}
        }
    })))
}

fn reply_schema() -> Arc<JsonObject> {
    Arc::new(object(json!({
        "type": "object",
        "required": ["channel_id", "thread_ts", "text"],
        "properties": {
            "channel_id": channel_id(),
            "thread_ts": {
                "type": "string",
                "description": "The timestamp of the parent message in the format '1234567890.123456'"
            },
            "text": {"type": "string", "description": "The reply text; markdown is converted to Slack mrkdwn"},
            "broadcast": {
                "type": "boolean",
                "description": "Also send the reply to the channel",
                "default": false
            }
        }
    })))
}

fn tool(
    name: &'static str,
    title: &'static str,
    description: &'static str,
    input_schema: Arc<JsonObject>,
    read_only: bool,
) -> Tool {
    Tool {
        name: name.into(),
        title: Some(title.into()),
        description: Some(description.into()),
        input_schema,
        output_schema: None,
        annotations: Some(ToolAnnotations {
            read_only_hint: Some(read_only),
            open_world_hint: Some(true),
            ..Default::default()
        }),
        icons: None,
        meta: None,
    }
}

/// Build all Slack tools with their schemas.
pub fn all_tools() -> Vec<Tool> {
    vec![
        tool(
            ADD_REACTION,
            "Add a reaction",
            "Add a reaction emoji to a message",
            add_reaction_schema(),
            false,
        ),
        tool(
            EDIT_MESSAGE,
            "Edit a message",
            "Replace the text of an existing message",
            edit_message_schema(),
            false,
        ),
        tool(
            GET_CHANNEL_HISTORY,
            "Channel history",
            "Get recent messages from a channel",
            channel_history_schema(),
            true,
        ),
        tool(
            GET_THREAD_REPLIES,
            "Thread replies",
            "Get all replies in a message thread",
            thread_replies_schema(),
            true,
        ),
        tool(
            GET_USER_PROFILE,
            "User profile",
            "Get detailed profile information for a specific user",
            user_profile_schema(),
            true,
        ),
        tool(
            GET_USERS,
            "List users",
            "Get a list of all users in the workspace with their basic profile information",
            paged_list_schema("Maximum number of users to return"),
            true,
        ),
        tool(
            LIST_CHANNELS,
            "List channels",
            "List public or pre-defined channels in the workspace with pagination",
            paged_list_schema("Maximum number of channels to return"),
            true,
        ),
        tool(
            POST_MESSAGE,
            "Post a message",
            "Post a new message to a Slack channel",
            post_message_schema(),
            false,
        ),
        tool(
            REPLY_TO_THREAD,
            "Reply to a thread",
            "Reply to a specific message thread in Slack",
            reply_schema(),
            false,
        ),
    ]
}

/// Required argument names declared by a tool's schema.
pub fn required_fields(tool: &Tool) -> Vec<String> {
    tool.input_schema
        .get("required")
        .and_then(|v| v.as_array())
        .map(|fields| {
            fields
                .iter()
                .filter_map(|f| f.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find(name: &str) -> Tool {
        all_tools()
            .into_iter()
            .find(|t| t.name == name)
            .unwrap_or_else(|| panic!("missing tool {name}"))
    }

    #[test]
    fn given_catalog_when_listed_then_nine_unique_tools() {
        let tools = all_tools();
        let mut names: Vec<_> = tools.iter().map(|t| t.name.to_string()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 9);
    }

    #[test]
    fn given_every_tool_when_inspected_then_schema_is_typed_object() {
        for tool in all_tools() {
            assert_eq!(
                tool.input_schema.get("type"),
                Some(&json!("object")),
                "{} lacks a type",
                tool.name
            );
            assert!(tool.description.is_some());
        }
    }

    #[test]
    fn given_write_tools_when_required_fields_read_then_they_match_the_contract() {
        assert_eq!(
            required_fields(&find(ADD_REACTION)),
            vec!["channel_id", "timestamp", "reaction"]
        );
        assert_eq!(
            required_fields(&find(EDIT_MESSAGE)),
            vec!["channel_id", "timestamp", "text"]
        );
        assert_eq!(
            required_fields(&find(POST_MESSAGE)),
            vec!["channel_id", "text"]
        );
        assert_eq!(
            required_fields(&find(REPLY_TO_THREAD)),
            vec!["channel_id", "thread_ts", "text"]
        );
    }

    #[test]
    fn given_list_tools_when_inspected_then_nothing_is_required_and_defaults_are_declared() {
        for name in [GET_USERS, LIST_CHANNELS] {
            let tool = find(name);
            assert!(required_fields(&tool).is_empty());
            assert_eq!(
                tool.input_schema["properties"]["limit"]["default"],
                json!(DEFAULT_LIST_LIMIT)
            );
            assert_eq!(
                tool.input_schema["properties"]["limit"]["maximum"],
                json!(MAX_LIST_LIMIT)
            );
        }
        let history = find(GET_CHANNEL_HISTORY);
        assert_eq!(
            history.input_schema["properties"]["limit"]["default"],
            json!(DEFAULT_HISTORY_LIMIT)
        );
        let reply = find(REPLY_TO_THREAD);
        assert_eq!(
            reply.input_schema["properties"]["broadcast"]["default"],
            json!(false)
        );
    }
}
