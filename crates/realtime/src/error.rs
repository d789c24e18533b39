// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for transit-realtime.
//!
//! None of these cross the client's connection API: transport failures become
//! state transitions and events. They surface only from configuration
//! loading, notification persistence and client construction.

use thiserror::Error;

/// Error type for transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The endpoint URL cannot be used to build a connection.
    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(String),

    /// The WebSocket handshake failed.
    #[error("connection failed: {0}")]
    ConnectFailed(String),

    /// The session is unknown or already closed.
    #[error("session {0} is not open")]
    NotOpen(u64),

    /// Send failed.
    #[error("send failed: {0}")]
    SendFailed(String),
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Error type for notification persistence.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error type for client construction.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("no tokio runtime available\n  hint: spawn the client from inside a tokio runtime")]
    NoRuntime,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
