// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! transit-realtime: WebSocket client for live bus tracking.
//!
//! Keeps one authenticated session open to the tracking backend, reconnects
//! with backoff, fans inbound events out to subscribers by kind, and feeds
//! pushed notifications into a de-duplicated shared list.
//!
//! ```no_run
//! # async fn example() -> Result<(), transit_realtime::ClientError> {
//! use std::sync::Arc;
//! use transit_realtime::{EventKind, RealtimeClient, RealtimeConfig, SessionStore};
//!
//! let store = Arc::new(SessionStore::hydrated(Some("token".into())));
//! let client = RealtimeClient::builder(RealtimeConfig::new("wss://transit.example.com"), store)
//!     .spawn()?;
//! let _sub = client.on(EventKind::BusLocationUpdate, |event| println!("{:?}", event));
//! client.start();
//! # Ok(())
//! # }
//! ```

pub mod bus;
pub mod client;
pub mod config;
pub mod connection;
pub mod credentials;
pub mod error;
pub mod retry;
pub mod signal;
pub mod sink;
pub mod timer;
pub mod tracker;
pub mod transport;

#[cfg(test)]
mod test_helpers;

pub use bus::{EventBus, Subscription};
pub use client::{ClientParts, RealtimeClient, RealtimeClientBuilder};
pub use config::{Endpoint, RealtimeConfig, ReconnectConfig};
pub use connection::{ConnectionManager, ConnectionState, Emission, HydrationHook};
pub use credentials::{AuthCredential, CredentialSource, HydrationWatcher, SessionStore};
pub use error::{ClientError, ConfigError, PersistenceError, TransportError, TransportResult};
pub use retry::{ReconnectPolicy, RetryDecision, RetryState};
pub use signal::Signal;
pub use sink::{
    JsonFilePersistence, MemoryPersistence, NotificationList, NotificationPersistence,
    NotificationPort, NotificationSink,
};
pub use timer::{TimerId, Timers, TokioTimers};
pub use tracker::{BusTracker, TrackedBus};
pub use transport::{SessionId, Transport, TransportEvent, WebSocketTransport};
pub use transit_core::{DomainEvent, EventKind};
