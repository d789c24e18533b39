// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Realtime client configuration.
//!
//! Configuration is read from a TOML file; every field has a default, so an
//! empty file is a valid configuration:
//!
//! ```toml
//! base_url = "wss://transit.example.com"
//! hydration_retry_ms = 2000
//!
//! [reconnect]
//! base_delay_ms = 1000
//! max_attempts = 5
//!
//! [[endpoints]]
//! path = "/ws/bus-tracking/"
//! token_param = "token"
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::retry::ReconnectPolicy;

/// One candidate WebSocket endpoint, relative to the base URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Path appended to the base URL.
    pub path: String,
    /// Query parameter that carries the bearer token.
    pub token_param: String,
}

impl Endpoint {
    pub fn new(path: impl Into<String>, token_param: impl Into<String>) -> Self {
        Endpoint {
            path: path.into(),
            token_param: token_param.into(),
        }
    }
}

/// Reconnect backoff settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    /// Delay before the first retry, doubled on every further attempt.
    pub base_delay_ms: u64,
    /// Consecutive failures before automatic reconnection gives up.
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        ReconnectConfig {
            base_delay_ms: 1000,
            max_attempts: 5,
        }
    }
}

/// Configuration for the realtime client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeConfig {
    /// `ws://` or `wss://` origin of the backend.
    pub base_url: String,
    /// Candidate endpoints in priority order.
    pub endpoints: Vec<Endpoint>,
    /// Backoff for unexpected disconnects.
    pub reconnect: ReconnectConfig,
    /// Delay before retrying while the credential store is still hydrating.
    pub hydration_retry_ms: u64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        RealtimeConfig {
            base_url: "ws://localhost:8000".to_string(),
            endpoints: default_endpoints(),
            reconnect: ReconnectConfig::default(),
            hydration_retry_ms: 2000,
        }
    }
}

fn default_endpoints() -> Vec<Endpoint> {
    vec![
        Endpoint::new("/ws/bus-tracking/", "token"),
        Endpoint::new("/ws/", "token"),
        Endpoint::new("/ws/", "access_token"),
    ]
}

impl RealtimeConfig {
    /// Creates a config for the given base URL with default endpoints.
    pub fn new(base_url: impl Into<String>) -> Self {
        RealtimeConfig {
            base_url: base_url.into(),
            ..RealtimeConfig::default()
        }
    }

    /// Loads and validates configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: RealtimeConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the configuration can produce connections.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_url.starts_with("ws://") || self.base_url.starts_with("wss://")) {
            return Err(ConfigError::Invalid(format!(
                "base_url '{}' must start with ws:// or wss://",
                self.base_url
            )));
        }
        if self.endpoints.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one endpoint is required".to_string(),
            ));
        }
        if let Some(endpoint) = self.endpoints.iter().find(|e| e.token_param.is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "endpoint '{}' has an empty token_param",
                endpoint.path
            )));
        }
        if self.reconnect.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "reconnect.max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Builds the URL for the endpoint at `index` (wrapping), carrying `token`.
    pub fn endpoint_url(&self, index: usize, token: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let Some(endpoint) = self.endpoints.get(index % self.endpoints.len().max(1)) else {
            return base.to_string();
        };
        let path = endpoint.path.trim_start_matches('/');
        format!(
            "{}/{}?{}={}",
            base,
            path,
            endpoint.token_param,
            urlencoding::encode(token)
        )
    }

    /// Returns the reconnect policy.
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            base_delay: Duration::from_millis(self.reconnect.base_delay_ms),
            max_attempts: self.reconnect.max_attempts,
        }
    }

    /// Returns the delay before retrying while credentials hydrate.
    pub fn hydration_retry(&self) -> Duration {
        Duration::from_millis(self.hydration_retry_ms)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
