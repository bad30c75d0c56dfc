//! Environment-sourced server configuration.

use std::time::Duration;

use thiserror::Error;
use url::Url;

use slackbridge_gateway::config::{DEFAULT_API_BASE, DEFAULT_TIMEOUT_MS, DEFAULT_USER_PAGE_CAP};
use slackbridge_gateway::{parse_id_list, DomainPolicy, GatewayConfig, TransportConfig};

pub const BOT_TOKEN_VAR: &str = "SLACK_BOT_TOKEN";
pub const TEAM_ID_VAR: &str = "SLACK_TEAM_ID";
pub const CHANNEL_IDS_VAR: &str = "SLACK_CHANNEL_IDS";
pub const BLOCKED_DOMAINS_VAR: &str = "SLACK_BLOCKED_DOMAINS";
pub const API_BASE_URL_VAR: &str = "SLACK_API_BASE_URL";
pub const API_TIMEOUT_VAR: &str = "SLACK_API_TIMEOUT_MS";
pub const USER_PAGE_CAP_VAR: &str = "SLACK_USER_PAGE_CAP";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    MissingVar(&'static str),

    #[error("invalid {var}: {message}")]
    InvalidValue { var: &'static str, message: String },
}

/// Everything needed to build the gateway and its transport.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub transport: TransportConfig,
    pub gateway: GatewayConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = required(&lookup, BOT_TOKEN_VAR)?;
        let team_id = required(&lookup, TEAM_ID_VAR)?;

        let base = lookup(API_BASE_URL_VAR)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let base_url = parse_base_url(&base)?;

        let timeout_ms = parsed(&lookup, API_TIMEOUT_VAR)?.unwrap_or(DEFAULT_TIMEOUT_MS);
        let page_cap = parsed(&lookup, USER_PAGE_CAP_VAR)?.unwrap_or(DEFAULT_USER_PAGE_CAP);

        let channel_ids = lookup(CHANNEL_IDS_VAR)
            .map(|raw| parse_id_list(&raw))
            .unwrap_or_default();
        let domain_policy = DomainPolicy::from_setting(lookup(BLOCKED_DOMAINS_VAR).as_deref());

        Ok(Self {
            transport: TransportConfig::new(token, base_url)
                .with_timeout(Duration::from_millis(timeout_ms)),
            gateway: GatewayConfig::new(team_id)
                .with_channel_ids(channel_ids)
                .with_domain_policy(domain_policy)
                .with_user_page_cap(page_cap),
        })
    }

    /// Apply command-line overrides on top of the environment.
    pub fn with_overrides(mut self, timeout_ms: Option<u64>, user_page_cap: Option<usize>) -> Self {
        if let Some(ms) = timeout_ms {
            self.transport = self.transport.with_timeout(Duration::from_millis(ms));
        }
        if let Some(cap) = user_page_cap {
            self.gateway = self.gateway.with_user_page_cap(cap);
        }
        self
    }
}

fn required<F>(lookup: &F, var: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingVar(var))
}

fn parsed<F, T>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var).filter(|v| !v.trim().is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                var,
                message: format!("{raw:?}: {e}"),
            }),
    }
}

/// Parse the API base, making sure it ends in `/` so method names join onto it.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let mut normalized = raw.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    Url::parse(&normalized).map_err(|e| ConfigError::InvalidValue {
        var: API_BASE_URL_VAR,
        message: format!("{raw:?}: {e}"),
    })
}
