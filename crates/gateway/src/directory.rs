//! Time-boxed index of workspace users for mention resolution.
//!
//! The directory is a plain value: build it from a user list, ask whether it
//! is stale at a given instant, look names up. The gateway owns the only
//! instance (behind an async mutex) and decides when to rebuild it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The subset of a Slack user record used for name matching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackUser {
    pub id: String,
    /// The user's handle.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub real_name: Option<String>,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub profile: SlackUserProfile,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackUserProfile {
    #[serde(default)]
    pub real_name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl SlackUser {
    /// Every name this user can be mentioned by, lowercased and deduplicated.
    pub fn lookup_keys(&self) -> Vec<String> {
        let candidates = [
            self.real_name.as_deref(),
            self.profile.real_name.as_deref(),
            self.profile.display_name.as_deref(),
            Some(self.name.as_str()),
        ];
        let mut keys: Vec<String> = Vec::new();
        for key in candidates
            .into_iter()
            .flatten()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
        {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }
}

/// Snapshot of the user list with an expiry instant.
#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    index: HashMap<String, SlackUser>,
    expires_at_ms: u64,
}

impl UserDirectory {
    /// An empty directory; always stale.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Index `users`, valid until `now_ms + ttl_ms`.
    ///
    /// Deleted users are skipped. When two users share a name the first one
    /// listed keeps it.
    pub fn build<I>(users: I, now_ms: u64, ttl_ms: u64) -> Self
    where
        I: IntoIterator<Item = SlackUser>,
    {
        let mut index = HashMap::new();
        for user in users.into_iter().filter(|u| !u.deleted) {
            for key in user.lookup_keys() {
                index.entry(key).or_insert_with(|| user.clone());
            }
        }
        Self {
            index,
            expires_at_ms: now_ms.saturating_add(ttl_ms),
        }
    }

    pub fn is_stale(&self, now_ms: u64) -> bool {
        self.index.is_empty() || now_ms >= self.expires_at_ms
    }

    /// Find a user by lowercased name.
    pub fn lookup(&self, name: &str) -> Option<&SlackUser> {
        self.index.get(name)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn expires_at_ms(&self) -> u64 {
        self.expires_at_ms
    }
}
