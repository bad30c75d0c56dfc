//! Shared test utilities for slackbridge crates.
//!
//! This crate provides the fake Slack transport, gateway fixtures and
//! environment guards used across the workspace's tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::{json, Value};
use slackbridge_gateway::{
    ApiRequest, GatewayConfig, GatewayError, ManualClock, SlackGateway, SlackTransport,
};

/// Serialize tests that mutate process-global state (env vars, cwd, etc).
///
/// Acquire this guard at the start of any test that modifies environment
/// variables to prevent race conditions between parallel tests.
pub fn env_guard() -> MutexGuard<'static, ()> {
    static TEST_SERIAL: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
    TEST_SERIAL.lock().unwrap_or_else(|e| e.into_inner())
}

/// RAII guard for environment variables - restores original value on drop.
pub struct EnvVarGuard {
    key: &'static str,
    previous: Option<String>,
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        if let Some(v) = &self.previous {
            std::env::set_var(self.key, v);
        } else {
            std::env::remove_var(self.key);
        }
    }
}

/// Set an environment variable and return a guard that restores the original on drop.
///
/// # Example
/// ```
/// let _guard = slackbridge_test_utils::set_env_var("MY_VAR", Some("value"));
/// // MY_VAR is set to "value"
/// // When _guard drops, MY_VAR is restored to its original value
/// ```
pub fn set_env_var(key: &'static str, value: Option<&str>) -> EnvVarGuard {
    let previous = std::env::var(key).ok();
    if let Some(val) = value {
        std::env::set_var(key, val);
    } else {
        std::env::remove_var(key);
    }
    EnvVarGuard { key, previous }
}

/// In-memory [`SlackTransport`] that records every request.
///
/// Responses are looked up by wire method: queued one-shot responses first,
/// then a sticky response, then `{"ok": true}`.
#[derive(Default)]
pub struct RecordingTransport {
    calls: Mutex<Vec<ApiRequest>>,
    queued: Mutex<HashMap<String, VecDeque<Value>>>,
    sticky: Mutex<HashMap<String, Value>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a single response for `method`.
    pub fn respond_once(&self, method: &str, body: Value) -> &Self {
        lock(&self.queued)
            .entry(method.to_string())
            .or_default()
            .push_back(body);
        self
    }

    /// Answer every call to `method` with `body` once the queue is drained.
    pub fn respond(&self, method: &str, body: Value) -> &Self {
        lock(&self.sticky).insert(method.to_string(), body);
        self
    }

    /// Make calls to `method` fail with a transport error.
    pub fn fail(&self, method: &str) -> &Self {
        lock(&self.failing).insert(method.to_string());
        self
    }

    pub fn calls(&self) -> Vec<ApiRequest> {
        lock(&self.calls).clone()
    }

    pub fn calls_to(&self, method: &str) -> Vec<ApiRequest> {
        lock(&self.calls)
            .iter()
            .filter(|r| r.method == method)
            .cloned()
            .collect()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }
}

#[async_trait]
impl SlackTransport for RecordingTransport {
    async fn call(&self, request: &ApiRequest) -> Result<Value, GatewayError> {
        lock(&self.calls).push(request.clone());
        if lock(&self.failing).contains(request.method) {
            return Err(GatewayError::Transport {
                method: request.method.to_string(),
                message: "connection refused".into(),
            });
        }
        if let Some(body) = lock(&self.queued)
            .get_mut(request.method)
            .and_then(VecDeque::pop_front)
        {
            return Ok(body);
        }
        Ok(lock(&self.sticky)
            .get(request.method)
            .cloned()
            .unwrap_or_else(|| json!({"ok": true})))
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// A gateway wired to a [`RecordingTransport`] and a [`ManualClock`].
pub struct GatewayFixture {
    pub transport: Arc<RecordingTransport>,
    pub clock: ManualClock,
    pub gateway: Arc<SlackGateway>,
}

/// Window-aligned start instant for fixtures.
pub const FIXTURE_START_MS: u64 = 1_700_000_040_000;

impl GatewayFixture {
    pub fn new() -> Self {
        Self::with_config(GatewayConfig::new("T0001"))
    }

    pub fn with_config(config: GatewayConfig) -> Self {
        let transport = RecordingTransport::new();
        let clock = ManualClock::new(FIXTURE_START_MS);
        let gateway = Arc::new(SlackGateway::with_clock(
            transport.clone(),
            config,
            Arc::new(clock.clone()),
        ));
        Self {
            transport,
            clock,
            gateway,
        }
    }
}

impl Default for GatewayFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A `users.list` page in Slack's response shape.
pub fn user_page(members: Value, next_cursor: &str) -> Value {
    json!({
        "ok": true,
        "members": members,
        "response_metadata": {"next_cursor": next_cursor}
    })
}

/// A minimal Slack user record.
pub fn user(id: &str, handle: &str, real_name: &str, display_name: &str) -> Value {
    json!({
        "id": id,
        "name": handle,
        "real_name": real_name,
        "deleted": false,
        "profile": {"real_name": real_name, "display_name": display_name}
    })
}
