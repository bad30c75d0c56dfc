//! Per-endpoint fixed-window rate limiting.
//!
//! Counts are bucketed by `(endpoint, now_ms / WINDOW_MS)`. Every check drops
//! buckets from windows older than the current one, so the map never holds
//! more than one live window per endpoint (plus any window a skewed clock
//! placed ahead of us).

use std::collections::HashMap;

/// Width of one rate-limit window.
pub const WINDOW_MS: u64 = 60_000;
/// Calls allowed per endpoint per window.
pub const MAX_CALLS_PER_WINDOW: u32 = 60;

/// Bucket key: endpoint name and window index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WindowKey {
    pub endpoint: String,
    pub window: u64,
}

/// Tracks call counts per endpoint per window.
///
/// Not synchronized; the gateway wraps it in a `parking_lot::Mutex` so that
/// check-and-increment is a single critical section.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    counts: HashMap<WindowKey, u32>,
    window_ms: u64,
    max_calls: u32,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(WINDOW_MS, MAX_CALLS_PER_WINDOW)
    }
}

impl RateLimiter {
    pub fn new(window_ms: u64, max_calls: u32) -> Self {
        Self {
            counts: HashMap::new(),
            window_ms: window_ms.max(1),
            max_calls,
        }
    }

    /// Index of the window containing `now_ms`.
    pub fn window_index(&self, now_ms: u64) -> u64 {
        now_ms / self.window_ms
    }

    /// Record one call for `endpoint` at `now_ms`.
    ///
    /// Returns `false` without recording anything when the endpoint has
    /// already used its allowance for the current window.
    pub fn try_acquire(&mut self, endpoint: &str, now_ms: u64) -> bool {
        let window = self.window_index(now_ms);
        self.prune_before(window);

        let key = WindowKey {
            endpoint: endpoint.to_string(),
            window,
        };
        let count = self.counts.entry(key).or_insert(0);
        if *count >= self.max_calls {
            return false;
        }
        *count += 1;
        true
    }

    /// Calls recorded for `endpoint` in the window containing `now_ms`.
    pub fn count(&self, endpoint: &str, now_ms: u64) -> u32 {
        let key = WindowKey {
            endpoint: endpoint.to_string(),
            window: self.window_index(now_ms),
        };
        self.counts.get(&key).copied().unwrap_or(0)
    }

    /// Snapshot of the tracked keys.
    pub fn keys(&self) -> Vec<WindowKey> {
        self.counts.keys().cloned().collect()
    }

    fn prune_before(&mut self, window: u64) {
        self.counts.retain(|key, _| key.window >= window);
    }
}
