use std::time::Duration;

use url::Url;

use crate::sanitize::DomainPolicy;

pub const DEFAULT_API_BASE: &str = "https://slack.com/api/";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_USER_PAGE_CAP: usize = 10;
pub const DIRECTORY_TTL_MS: u64 = 10 * 60 * 1000;

/// Policy knobs for [`crate::SlackGateway`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub team_id: String,
    /// When non-empty, `list_channels` reports only these channels.
    pub channel_ids: Vec<String>,
    pub domain_policy: DomainPolicy,
    /// Maximum `users.list` pages fetched when rebuilding the user directory.
    pub user_page_cap: usize,
    pub directory_ttl_ms: u64,
}

impl GatewayConfig {
    pub fn new(team_id: impl Into<String>) -> Self {
        Self {
            team_id: team_id.into(),
            channel_ids: Vec::new(),
            domain_policy: DomainPolicy::default(),
            user_page_cap: DEFAULT_USER_PAGE_CAP,
            directory_ttl_ms: DIRECTORY_TTL_MS,
        }
    }

    pub fn with_channel_ids(mut self, ids: Vec<String>) -> Self {
        self.channel_ids = ids;
        self
    }

    pub fn with_domain_policy(mut self, policy: DomainPolicy) -> Self {
        self.domain_policy = policy;
        self
    }

    pub fn with_user_page_cap(mut self, cap: usize) -> Self {
        self.user_page_cap = cap.max(1);
        self
    }
}

/// Connection settings for [`crate::HttpTransport`].
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub token: String,
    pub base_url: Url,
    pub timeout: Duration,
}

impl TransportConfig {
    pub fn new(token: impl Into<String>, base_url: Url) -> Self {
        Self {
            token: token.into(),
            base_url,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Parse a comma-separated id list, dropping blanks.
pub fn parse_id_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_list_ignores_blanks_and_whitespace() {
        assert_eq!(parse_id_list(" C1, ,C2,"), vec!["C1", "C2"]);
        assert!(parse_id_list("").is_empty());
    }

    #[test]
    fn page_cap_is_at_least_one() {
        assert_eq!(GatewayConfig::new("T1").with_user_page_cap(0).user_page_cap, 1);
    }
}
