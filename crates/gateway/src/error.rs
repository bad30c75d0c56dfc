//! Error types for gateway operations.

use thiserror::Error;

/// Errors raised before or while talking to the Slack Web API.
///
/// Everything except [`GatewayError::Transport`] and [`GatewayError::Decode`]
/// is raised locally and guarantees that no request left the process.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("rate limit exceeded for {endpoint}; try again in the next minute")]
    RateLimited { endpoint: String },

    #[error("suspicious domain detected: {domain}")]
    SuspiciousDomain { domain: String },

    #[error("invalid port {port} in URL {url}")]
    InvalidPort { port: u16, url: String },

    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    #[error("reaction name {original:?} contains no usable characters")]
    EmptyReaction { original: String },

    #[error("Slack API request to {method} failed: {message}")]
    Transport { method: String, message: String },

    #[error("Slack API returned an unreadable response for {method}: {message}")]
    Decode { method: String, message: String },
}

impl GatewayError {
    /// True for the security gates of the sanitization pipeline.
    pub fn is_security_rejection(&self) -> bool {
        matches!(
            self,
            Self::SuspiciousDomain { .. } | Self::InvalidPort { .. } | Self::InvalidUrl { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
