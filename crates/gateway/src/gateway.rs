//! The request gateway: one method per Slack Web API operation.
//!
//! Every operation passes the per-endpoint rate limit before anything else.
//! Operations that carry user-authored text then run the sanitization
//! pipeline (URL screening, markdown conversion, script removal, mention
//! resolution) before the request is built. Remote `ok: false` responses are
//! logged and handed back unchanged; nothing is retried.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::clock::{Clock, SystemClock};
use crate::config::GatewayConfig;
use crate::directory::{SlackUser, UserDirectory};
use crate::error::{GatewayError, Result};
use crate::rate_limit::RateLimiter;
use crate::sanitize::{self, mentions};
use crate::transport::{ApiRequest, SlackTransport};

pub const MAX_HISTORY_LIMIT: u32 = 1000;
pub const MAX_LIST_LIMIT: u32 = 200;
const USER_PAGE_SIZE: u32 = 200;

/// Rate-limit bucket names. `post_reply` gets its own bucket even though it
/// shares a wire method with `post_message`.
pub mod endpoints {
    pub const ADD_REACTION: &str = "reactions.add";
    pub const EDIT_MESSAGE: &str = "chat.update";
    pub const POST_MESSAGE: &str = "chat.postMessage";
    pub const POST_REPLY: &str = "chat.postMessage.reply";
    pub const CHANNEL_HISTORY: &str = "conversations.history";
    pub const CHANNEL_INFO: &str = "conversations.info";
    pub const LIST_CHANNELS: &str = "conversations.list";
    pub const THREAD_REPLIES: &str = "conversations.replies";
    pub const USER_INFO: &str = "users.info";
    pub const USER_PROFILE: &str = "users.profile.get";
    pub const LIST_USERS: &str = "users.list";
}

/// Outbound gateway to one Slack workspace.
pub struct SlackGateway {
    transport: Arc<dyn SlackTransport>,
    config: GatewayConfig,
    clock: Arc<dyn Clock>,
    limiter: Mutex<RateLimiter>,
    directory: tokio::sync::Mutex<UserDirectory>,
}

impl SlackGateway {
    pub fn new(transport: Arc<dyn SlackTransport>, config: GatewayConfig) -> Self {
        Self::with_clock(transport, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        transport: Arc<dyn SlackTransport>,
        config: GatewayConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            transport,
            config,
            clock,
            limiter: Mutex::new(RateLimiter::default()),
            directory: tokio::sync::Mutex::new(UserDirectory::empty()),
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Calls recorded against `endpoint` in the current window.
    pub fn calls_in_window(&self, endpoint: &str) -> u32 {
        self.limiter.lock().count(endpoint, self.clock.now_ms())
    }

    pub async fn add_reaction(
        &self,
        channel_id: &str,
        timestamp: &str,
        reaction: &str,
    ) -> Result<Value> {
        self.acquire(endpoints::ADD_REACTION)?;
        let name = sanitize::sanitize_reaction_name(reaction);
        if name.is_empty() {
            return Err(GatewayError::EmptyReaction {
                original: reaction.to_string(),
            });
        }
        let request = ApiRequest::post("reactions.add")
            .param("channel", channel_id)
            .param("timestamp", timestamp)
            .param("name", name);
        self.send(request).await
    }

    pub async fn edit_message(&self, channel_id: &str, ts: &str, text: &str) -> Result<Value> {
        self.acquire(endpoints::EDIT_MESSAGE)?;
        let text = self.prepare_text(text).await?;
        let request = text_flags(
            ApiRequest::post("chat.update")
                .param("channel", channel_id)
                .param("ts", ts)
                .param("text", text),
        );
        self.send(request).await
    }

    pub async fn post_message(&self, channel_id: &str, text: &str) -> Result<Value> {
        self.acquire(endpoints::POST_MESSAGE)?;
        let text = self.prepare_text(text).await?;
        let request = text_flags(
            ApiRequest::post("chat.postMessage")
                .param("channel", channel_id)
                .param("text", text),
        );
        self.send(request).await
    }

    pub async fn post_reply(
        &self,
        channel_id: &str,
        thread_ts: &str,
        text: &str,
        broadcast: bool,
    ) -> Result<Value> {
        self.acquire(endpoints::POST_REPLY)?;
        let text = self.prepare_text(text).await?;
        let mut request = text_flags(
            ApiRequest::post("chat.postMessage")
                .param("channel", channel_id)
                .param("thread_ts", thread_ts)
                .param("text", text),
        );
        if broadcast {
            request = request.param("reply_broadcast", true);
        }
        self.send(request).await
    }

    pub async fn get_channel_history(&self, channel_id: &str, limit: u32) -> Result<Value> {
        self.acquire(endpoints::CHANNEL_HISTORY)?;
        let request = ApiRequest::get("conversations.history")
            .param("channel", channel_id)
            .param("limit", limit.min(MAX_HISTORY_LIMIT));
        self.send(request).await
    }

    /// Channel object, or `None` when Slack does not return one.
    pub async fn get_channel_info(&self, channel_id: &str) -> Result<Option<Value>> {
        self.acquire(endpoints::CHANNEL_INFO)?;
        let request = ApiRequest::get("conversations.info").param("channel", channel_id);
        let body = self.send(request).await?;
        Ok(is_ok(&body).then(|| body.get("channel").cloned()).flatten())
    }

    /// Public, non-archived channels. With a configured channel allowlist the
    /// result is assembled from per-channel lookups instead.
    pub async fn list_channels(&self, limit: u32, cursor: Option<&str>) -> Result<Value> {
        self.acquire(endpoints::LIST_CHANNELS)?;

        if !self.config.channel_ids.is_empty() {
            let mut channels = Vec::new();
            for id in &self.config.channel_ids {
                match self.get_channel_info(id).await? {
                    Some(channel) if !is_archived(&channel) => channels.push(channel),
                    Some(_) => {}
                    None => tracing::debug!(
                        target: "slackbridge::gateway",
                        channel = %id,
                        "configured channel not visible; skipping"
                    ),
                }
            }
            return Ok(json!({
                "ok": true,
                "channels": channels,
                "response_metadata": {"next_cursor": ""}
            }));
        }

        let request = ApiRequest::get("conversations.list")
            .param("types", "public_channel")
            .param("exclude_archived", true)
            .param("limit", limit.min(MAX_LIST_LIMIT))
            .param("team_id", self.config.team_id.as_str())
            .param_opt("cursor", non_empty(cursor));
        self.send(request).await
    }

    pub async fn get_thread_replies(&self, channel_id: &str, thread_ts: &str) -> Result<Value> {
        self.acquire(endpoints::THREAD_REPLIES)?;
        let request = ApiRequest::get("conversations.replies")
            .param("channel", channel_id)
            .param("ts", thread_ts);
        self.send(request).await
    }

    /// User object, or `None` when Slack does not return one.
    pub async fn get_user_info(&self, user_id: &str) -> Result<Option<Value>> {
        self.acquire(endpoints::USER_INFO)?;
        let request = ApiRequest::get("users.info").param("user", user_id);
        let body = self.send(request).await?;
        Ok(is_ok(&body).then(|| body.get("user").cloned()).flatten())
    }

    pub async fn get_user_profile(&self, user_id: &str) -> Result<Value> {
        self.acquire(endpoints::USER_PROFILE)?;
        let request = ApiRequest::get("users.profile.get")
            .param("user", user_id)
            .param("include_labels", true);
        self.send(request).await
    }

    pub async fn get_users(&self, limit: u32, cursor: Option<&str>) -> Result<Value> {
        self.acquire(endpoints::LIST_USERS)?;
        let request = ApiRequest::get("users.list")
            .param("limit", limit.min(MAX_LIST_LIMIT))
            .param("team_id", self.config.team_id.as_str())
            .param_opt("cursor", non_empty(cursor));
        self.send(request).await
    }

    /// Run the outbound text pipeline.
    ///
    /// URL screening sees the caller's original text; the remaining stages
    /// each consume the previous stage's output.
    pub async fn prepare_text(&self, text: &str) -> Result<String> {
        sanitize::validate_urls(text, &self.config.domain_policy)?;
        let converted = sanitize::to_mrkdwn(text);
        let scrubbed = sanitize::strip_malicious(&converted);
        Ok(self.resolve_mentions(&scrubbed).await)
    }

    /// Rewrite `@Display Name` mentions, rebuilding the directory if needed.
    ///
    /// A failed rebuild leaves the text as it was.
    pub async fn resolve_mentions(&self, text: &str) -> String {
        if !mentions::has_mention_candidates(text) {
            return text.to_string();
        }

        // Held across the rebuild so concurrent callers wait for one refresh.
        let mut directory = self.directory.lock().await;
        let now = self.clock.now_ms();
        if directory.is_stale(now) {
            match self.fetch_all_users().await {
                Ok(users) => {
                    *directory = UserDirectory::build(users, now, self.config.directory_ttl_ms);
                    tracing::debug!(
                        target: "slackbridge::directory",
                        names = directory.len(),
                        "rebuilt user directory"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        target: "slackbridge::directory",
                        error = %e,
                        "user directory rebuild failed; mentions left unresolved"
                    );
                    return text.to_string();
                }
            }
        }

        mentions::resolve_mentions(text, |name| directory.lookup(name).map(|u| u.name.clone()))
    }

    async fn fetch_all_users(&self) -> Result<Vec<SlackUser>> {
        let mut users = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..self.config.user_page_cap {
            let page = self.get_users(USER_PAGE_SIZE, cursor.as_deref()).await?;
            if !is_ok(&page) {
                return Err(GatewayError::Decode {
                    method: "users.list".into(),
                    message: remote_error(&page),
                });
            }
            let members = page.get("members").cloned().unwrap_or(Value::Array(Vec::new()));
            let mut batch: Vec<SlackUser> =
                serde_json::from_value(members).map_err(|e| GatewayError::Decode {
                    method: "users.list".into(),
                    message: e.to_string(),
                })?;
            users.append(&mut batch);

            cursor = page
                .pointer("/response_metadata/next_cursor")
                .and_then(Value::as_str)
                .filter(|c| !c.is_empty())
                .map(str::to_string);
            if cursor.is_none() {
                break;
            }
        }
        Ok(users)
    }

    fn acquire(&self, endpoint: &str) -> Result<()> {
        let now = self.clock.now_ms();
        if self.limiter.lock().try_acquire(endpoint, now) {
            return Ok(());
        }
        tracing::warn!(target: "slackbridge::gateway", endpoint, "rate limit exceeded");
        Err(GatewayError::RateLimited {
            endpoint: endpoint.to_string(),
        })
    }

    async fn send(&self, request: ApiRequest) -> Result<Value> {
        tracing::debug!(
            target: "slackbridge::gateway",
            method = request.method,
            "calling Slack API"
        );
        let body = self.transport.call(&request).await?;
        if !is_ok(&body) {
            tracing::warn!(
                target: "slackbridge::gateway",
                method = request.method,
                error = %remote_error(&body),
                "Slack API returned an error"
            );
        }
        Ok(body)
    }
}

fn text_flags(request: ApiRequest) -> ApiRequest {
    request
        .param("unfurl_links", false)
        .param("unfurl_media", false)
        .param("parse", "full")
        .param("link_names", false)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Slack's `ok` flag.
pub fn is_ok(body: &Value) -> bool {
    body.get("ok").and_then(Value::as_bool).unwrap_or(false)
}

fn is_archived(channel: &Value) -> bool {
    channel
        .get("is_archived")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

fn remote_error(body: &Value) -> String {
    body.get("error")
        .and_then(Value::as_str)
        .unwrap_or("unknown_error")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_flags_disable_unfurling_and_name_parsing() {
        let req = text_flags(ApiRequest::post("chat.postMessage"));
        assert_eq!(req.params["unfurl_links"], json!(false));
        assert_eq!(req.params["unfurl_media"], json!(false));
        assert_eq!(req.params["parse"], json!("full"));
        assert_eq!(req.params["link_names"], json!(false));
    }

    #[test]
    fn ok_flag_defaults_to_false() {
        assert!(is_ok(&json!({"ok": true})));
        assert!(!is_ok(&json!({"ok": false})));
        assert!(!is_ok(&json!({})));
    }

    #[test]
    fn empty_cursor_is_dropped() {
        assert_eq!(non_empty(Some("")), None);
        assert_eq!(non_empty(Some("abc")), Some("abc"));
        assert_eq!(non_empty(None), None);
    }
}
