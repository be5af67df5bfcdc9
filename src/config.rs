//! Process-start configuration: endpoint address and shared secret.

use crate::error::ConfigError;
use crate::network::{DEFAULT_WS_URL, ENDPOINT_ENV, SECRET_ENV};
use crate::ws::WsConfig;

/// Connection settings supplied at process start.
#[derive(Clone, PartialEq)]
pub struct FeedConfig {
    pub endpoint: String,
    pub secret: String,
}

impl FeedConfig {
    pub fn new(endpoint: impl Into<String>, secret: impl Into<String>) -> Result<Self, ConfigError> {
        let endpoint = endpoint.into();
        let secret = secret.into();

        if !(endpoint.starts_with("ws://") || endpoint.starts_with("wss://")) {
            return Err(ConfigError::InvalidEndpoint(endpoint));
        }
        if secret.is_empty() {
            return Err(ConfigError::Missing(SECRET_ENV));
        }
        Ok(Self { endpoint, secret })
    }

    /// Read `CHARTFEED_ENDPOINT` (optional) and `CHARTFEED_SECRET` (required).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup, e.g. a map in tests.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let endpoint = lookup(ENDPOINT_ENV)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_WS_URL.to_string());
        let secret = lookup(SECRET_ENV).ok_or(ConfigError::Missing(SECRET_ENV))?;
        Self::new(endpoint.trim(), secret)
    }

    /// Transport settings for this endpoint, with default reconnect policy.
    pub fn ws_config(&self) -> WsConfig {
        WsConfig {
            url: self.endpoint.clone(),
            secret: Some(self.secret.clone()),
            ..Default::default()
        }
    }
}

// Keeps the secret out of logs.
impl std::fmt::Debug for FeedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedConfig")
            .field("endpoint", &self.endpoint)
            .field("secret", &"<redacted>")
            .finish()
    }
}
