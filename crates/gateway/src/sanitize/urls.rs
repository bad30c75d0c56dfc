//! URL threat screening for outbound text.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::error::{GatewayError, Result};

/// Link shorteners hide the real destination, so they are blocked unless the
/// operator configures a different list.
pub const DEFAULT_BLOCKED_DOMAINS: &[&str] = &[
    "bit.ly",
    "tinyurl.com",
    "goo.gl",
    "ow.ly",
    "is.gd",
    "buff.ly",
    "adf.ly",
    "shorte.st",
    "rebrand.ly",
    "cutt.ly",
];

/// Ports a link may name explicitly.
pub const ALLOWED_PORTS: &[u16] = &[80, 443, 8080, 8443];

static BARE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>()\[\]"'|`]+"#).expect("bare url regex"));

static MARKDOWN_LINK_TARGET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]\(\s*([^)\s]+)").expect("markdown link regex"));

/// Blocked-domain policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainPolicy {
    blocked: Vec<String>,
}

impl Default for DomainPolicy {
    fn default() -> Self {
        Self {
            blocked: DEFAULT_BLOCKED_DOMAINS
                .iter()
                .map(|d| d.to_string())
                .collect(),
        }
    }
}

impl DomainPolicy {
    /// Build from the raw `SLACK_BLOCKED_DOMAINS` value.
    ///
    /// `None` keeps the defaults; an empty (or all-blank) string disables
    /// domain blocking entirely.
    pub fn from_setting(raw: Option<&str>) -> Self {
        match raw {
            None => Self::default(),
            Some(list) => Self {
                blocked: list
                    .split(',')
                    .map(|d| d.trim().to_ascii_lowercase())
                    .filter(|d| !d.is_empty())
                    .collect(),
            },
        }
    }

    pub fn blocked(&self) -> &[String] {
        &self.blocked
    }

    fn blocked_match(&self, host: &str) -> Option<&str> {
        let host = host.to_ascii_lowercase();
        self.blocked
            .iter()
            .find(|needle| host.contains(needle.as_str()))
            .map(String::as_str)
    }
}

/// Every URL in `text`: bare http(s) URLs first, then markdown link targets.
pub fn extract_urls(text: &str) -> Vec<String> {
    let mut urls: Vec<String> = BARE_URL
        .find_iter(text)
        .map(|m| trim_trailing_punctuation(m.as_str()).to_string())
        .collect();
    for caps in MARKDOWN_LINK_TARGET.captures_iter(text) {
        let target = caps[1].to_string();
        if !urls.contains(&target) {
            urls.push(target);
        }
    }
    urls
}

fn trim_trailing_punctuation(url: &str) -> &str {
    url.trim_end_matches(['.', ',', ';', ':', '!', '?'])
}

/// Check one URL against the domain and port policy.
pub fn validate_url(raw: &str, policy: &DomainPolicy) -> Result<()> {
    let parsed = Url::parse(raw).map_err(|_| GatewayError::InvalidUrl {
        url: raw.to_string(),
    })?;

    if let Some(host) = parsed.host_str() {
        if let Some(blocked) = policy.blocked_match(host) {
            tracing::warn!(
                target: "slackbridge::sanitize",
                host,
                blocked,
                "rejecting link to blocked domain"
            );
            return Err(GatewayError::SuspiciousDomain {
                domain: host.to_string(),
            });
        }
    }

    // `Url::port` is None when the port is absent or the scheme default.
    if let Some(port) = parsed.port() {
        if !ALLOWED_PORTS.contains(&port) {
            return Err(GatewayError::InvalidPort {
                port,
                url: raw.to_string(),
            });
        }
    }
    Ok(())
}

/// Validate every URL found in `text`. The first failure aborts.
pub fn validate_urls(text: &str, policy: &DomainPolicy) -> Result<()> {
    for url in extract_urls(text) {
        validate_url(&url, policy)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortener_link_is_rejected_regardless_of_surrounding_text() {
        let err = validate_urls(
            "Totally fine text, see http://bit.ly/x for details",
            &DomainPolicy::default(),
        )
        .unwrap_err();
        assert!(matches!(err, GatewayError::SuspiciousDomain { ref domain } if domain == "bit.ly"));
    }

    #[test]
    fn non_allowed_port_is_rejected() {
        let err = validate_urls("go to http://example.com:9999", &DomainPolicy::default())
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidPort { port: 9999, .. }));
    }

    #[test]
    fn explicit_https_default_port_passes() {
        validate_urls("see https://example.com:443/path", &DomainPolicy::default()).unwrap();
    }

    #[test]
    fn alternate_web_ports_pass() {
        let policy = DomainPolicy::default();
        validate_urls("http://example.com:8080/a and https://example.com:8443/b", &policy)
            .unwrap();
        validate_urls("https://example.com:80/", &policy).unwrap();
    }

    #[test]
    fn markdown_link_targets_are_checked() {
        let err = validate_urls("[click](https://tinyurl.com/abc)", &DomainPolicy::default())
            .unwrap_err();
        assert!(matches!(err, GatewayError::SuspiciousDomain { .. }));
    }

    #[test]
    fn unparseable_markdown_target_is_invalid_url() {
        let err = validate_urls("[bad](relative/path)", &DomainPolicy::default()).unwrap_err();
        assert!(matches!(err, GatewayError::InvalidUrl { .. }));
    }

    #[test]
    fn host_match_is_case_insensitive() {
        let err = validate_urls("https://BIT.LY/x", &DomainPolicy::default()).unwrap_err();
        assert!(matches!(err, GatewayError::SuspiciousDomain { .. }));
    }

    #[test]
    fn empty_setting_disables_domain_blocking() {
        let policy = DomainPolicy::from_setting(Some(""));
        assert!(policy.blocked().is_empty());
        validate_urls("http://bit.ly/x", &policy).unwrap();
    }

    #[test]
    fn custom_setting_replaces_defaults() {
        let policy = DomainPolicy::from_setting(Some(" evil.example , Other.test "));
        assert_eq!(policy.blocked(), &["evil.example", "other.test"]);
        validate_urls("http://bit.ly/x", &policy).unwrap();
        assert!(validate_urls("https://cdn.evil.example/a", &policy).is_err());
    }

    #[test]
    fn trailing_sentence_punctuation_is_not_part_of_url() {
        let urls = extract_urls("Read https://example.com/docs. Then http://example.org!");
        assert_eq!(urls, vec!["https://example.com/docs", "http://example.org"]);
    }

    #[test]
    fn scheme_without_host_skips_domain_check() {
        validate_urls("[x](mailto:someone@example.com)", &DomainPolicy::default()).unwrap();
    }
}
