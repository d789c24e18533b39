// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;
use transit_realtime::{ClientError, ConfigError, PersistenceError};

/// Errors that stop `transit-track` before it starts streaming.
#[derive(Debug, Error)]
pub enum Error {
    #[error("no auth token\n  hint: pass --token or set TRANSIT_TOKEN")]
    MissingToken,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("failed to load notifications: {0}")]
    Notifications(#[from] PersistenceError),
}

pub type Result<T> = std::result::Result<T, Error>;
