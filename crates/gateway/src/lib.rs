//! Outbound request shaping for the slackbridge MCP server.
//!
//! [`SlackGateway`] owns every call the server makes to the Slack Web API.
//! Before a request leaves the process it passes:
//!
//! - a per-endpoint fixed-window rate limit ([`rate_limit`])
//! - for message text, the [`sanitize`] pipeline: URL screening, markdown to
//!   `mrkdwn` conversion, script removal, and `@Name` mention resolution
//!   backed by a time-boxed [`directory`] of workspace users
//!
//! The network itself sits behind [`SlackTransport`]; [`HttpTransport`] is
//! the reqwest implementation.

pub mod clock;
pub mod config;
pub mod directory;
pub mod error;
pub mod gateway;
pub mod rate_limit;
pub mod sanitize;
pub mod transport;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{parse_id_list, GatewayConfig, TransportConfig};
pub use directory::{SlackUser, UserDirectory};
pub use error::GatewayError;
pub use gateway::{endpoints, is_ok, SlackGateway, MAX_HISTORY_LIMIT, MAX_LIST_LIMIT};
pub use rate_limit::{RateLimiter, MAX_CALLS_PER_WINDOW, WINDOW_MS};
pub use sanitize::DomainPolicy;
pub use transport::{ApiRequest, HttpMethod, HttpTransport, SlackTransport};
