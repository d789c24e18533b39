// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for transit-core operations.

use thiserror::Error;

/// All possible errors that can occur in transit-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed frame: {0}")]
    Frame(#[from] FrameError),

    #[error("unknown event kind: '{0}'\n  hint: valid kinds are: {valid}", valid = crate::event::EventKind::names())]
    UnknownEventKind(String),
}

/// Why an inbound frame was dropped instead of producing events.
///
/// Frame errors never terminate a session; the caller logs them and moves
/// on to the next frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("frame has no string `type` field")]
    MissingType,

    #[error("`{kind}` frame is missing `{field}`")]
    MissingField { kind: String, field: &'static str },

    #[error("`{kind}` frame has an invalid payload: {detail}")]
    InvalidPayload { kind: String, detail: String },
}

/// A specialized Result type for transit-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
