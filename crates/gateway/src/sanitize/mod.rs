//! Outbound text sanitization.
//!
//! The gateway applies these stages in a fixed order to every piece of
//! user-authored text:
//!
//! 1. [`validate_urls`] on the original text (hard failure)
//! 2. [`to_mrkdwn`] markdown conversion
//! 3. [`strip_malicious`] script removal
//! 4. mention resolution against the user directory (see [`resolve_mentions`])

pub mod markdown;
pub mod mentions;
pub mod scrub;
pub mod urls;

pub use markdown::to_mrkdwn;
pub use mentions::resolve_mentions;
pub use scrub::strip_malicious;
pub use urls::{validate_urls, DomainPolicy, ALLOWED_PORTS, DEFAULT_BLOCKED_DOMAINS};

/// Keep only `[A-Za-z0-9_]` from an emoji reaction name.
pub fn sanitize_reaction_name(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}
