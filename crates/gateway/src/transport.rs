//! Slack Web API transport.
//!
//! The gateway only needs "send method + params, get a JSON object back".
//! [`SlackTransport`] is that seam; [`HttpTransport`] is the reqwest
//! implementation used in production.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde_json::{Map as JsonMap, Value};

use crate::config::TransportConfig;
use crate::error::{GatewayError, Result};

/// How parameters travel on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// Parameters as a query string.
    Get,
    /// Parameters as a JSON body.
    Post,
}

/// One Slack Web API call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// Wire method name, e.g. `chat.postMessage`.
    pub method: &'static str,
    pub http: HttpMethod,
    pub params: JsonMap<String, Value>,
}

impl ApiRequest {
    pub fn get(method: &'static str) -> Self {
        Self {
            method,
            http: HttpMethod::Get,
            params: JsonMap::new(),
        }
    }

    pub fn post(method: &'static str) -> Self {
        Self {
            method,
            http: HttpMethod::Post,
            params: JsonMap::new(),
        }
    }

    pub fn param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    pub fn param_opt(self, key: &str, value: Option<impl Into<Value>>) -> Self {
        match value {
            Some(v) => self.param(key, v),
            None => self,
        }
    }

    /// Parameters flattened to strings for a query string.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.params
            .iter()
            .map(|(k, v)| {
                let value = match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.clone(), value)
            })
            .collect()
    }
}

#[async_trait]
pub trait SlackTransport: Send + Sync {
    /// Perform the call and return the decoded JSON body, whatever its `ok`.
    async fn call(&self, request: &ApiRequest) -> Result<Value>;
}

/// reqwest-backed transport with bearer-token auth.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    config: TransportConfig,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: TransportConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Transport {
                method: "client".into(),
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { config, client })
    }

    fn endpoint(&self, method: &str) -> Result<reqwest::Url> {
        self.config
            .base_url
            .join(method)
            .map_err(|e| GatewayError::Transport {
                method: method.to_string(),
                message: format!("invalid API url: {e}"),
            })
    }
}

#[async_trait]
impl SlackTransport for HttpTransport {
    async fn call(&self, request: &ApiRequest) -> Result<Value> {
        let url = self.endpoint(request.method)?;
        let builder = match request.http {
            HttpMethod::Get => self.client.get(url).query(&request.query_pairs()),
            HttpMethod::Post => self
                .client
                .post(url)
                .header(CONTENT_TYPE, "application/json; charset=utf-8")
                .json(&request.params),
        };

        let resp = builder
            .bearer_auth(&self.config.token)
            .send()
            .await
            .map_err(|e| GatewayError::Transport {
                method: request.method.to_string(),
                message: e.to_string(),
            })?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| GatewayError::Transport {
            method: request.method.to_string(),
            message: e.to_string(),
        })?;

        match serde_json::from_str::<Value>(&text) {
            Ok(body @ Value::Object(_)) => Ok(body),
            Ok(_) | Err(_) if !status.is_success() => Err(GatewayError::Transport {
                method: request.method.to_string(),
                message: format!("HTTP {status}"),
            }),
            Ok(other) => Err(GatewayError::Decode {
                method: request.method.to_string(),
                message: format!("expected a JSON object, got {other}"),
            }),
            Err(e) => Err(GatewayError::Decode {
                method: request.method.to_string(),
                message: e.to_string(),
            }),
        }
    }
}
