//! Removal of executable content from outbound text.

use std::sync::LazyLock;

use regex::Regex;

pub const SCRIPT_PLACEHOLDER: &str = "[removed script]";
pub const JAVASCRIPT_PLACEHOLDER: &str = "[removed javascript link]";
pub const DATA_HTML_PLACEHOLDER: &str = "[removed data link]";

const LOG_PREVIEW_CHARS: usize = 100;

// Closed script blocks first, then any stray opening tag left behind.
static SCRIPT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("script regex"));
static SCRIPT_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</?script\b[^>]*>").expect("script tag regex"));
static JAVASCRIPT_URI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)javascript:[^\s<>|]*").expect("javascript uri regex"));
static DATA_HTML_URI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)data:text/html[^\s<>|]*").expect("data uri regex"));

/// Replace script tags and script-bearing URIs with visible placeholders.
pub fn strip_malicious(text: &str) -> String {
    let sanitized = SCRIPT_BLOCK.replace_all(text, SCRIPT_PLACEHOLDER);
    let sanitized = SCRIPT_TAG.replace_all(&sanitized, SCRIPT_PLACEHOLDER);
    let sanitized = JAVASCRIPT_URI.replace_all(&sanitized, JAVASCRIPT_PLACEHOLDER);
    let sanitized = DATA_HTML_URI
        .replace_all(&sanitized, DATA_HTML_PLACEHOLDER)
        .into_owned();

    if sanitized != text {
        tracing::warn!(
            target: "slackbridge::sanitize",
            original = %preview(text),
            sanitized = %preview(&sanitized),
            "removed potentially malicious content from outbound text"
        );
    }
    sanitized
}

fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(LOG_PREVIEW_CHARS).collect();
    if text.chars().count() > LOG_PREVIEW_CHARS {
        out.push_str("...");
    }
    out
}
