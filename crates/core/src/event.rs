// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Domain events delivered to subscribers.
//!
//! Every inbound frame that survives decoding becomes one or more
//! [`DomainEvent`]s, and connection lifecycle transitions produce the
//! `connect`, `disconnect` and `error` events. Subscribers register by
//! [`EventKind`], and an event is only ever delivered under its own kind.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::notification::Notification;

/// Name under which subscribers register interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    BusLocationUpdate,
    BusStatusUpdate,
    BusRouteUpdate,
    NotificationReceived,
    ChatMessageReceived,
    IncidentReported,
    Connect,
    Disconnect,
    Error,
}

impl EventKind {
    /// Every kind, in declaration order.
    pub const ALL: [EventKind; 9] = [
        EventKind::BusLocationUpdate,
        EventKind::BusStatusUpdate,
        EventKind::BusRouteUpdate,
        EventKind::NotificationReceived,
        EventKind::ChatMessageReceived,
        EventKind::IncidentReported,
        EventKind::Connect,
        EventKind::Disconnect,
        EventKind::Error,
    ];

    /// Returns the kebab-case name used on the subscription API.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::BusLocationUpdate => "bus-location-update",
            EventKind::BusStatusUpdate => "bus-status-update",
            EventKind::BusRouteUpdate => "bus-route-update",
            EventKind::NotificationReceived => "notification-received",
            EventKind::ChatMessageReceived => "chat-message-received",
            EventKind::IncidentReported => "incident-reported",
            EventKind::Connect => "connect",
            EventKind::Disconnect => "disconnect",
            EventKind::Error => "error",
        }
    }

    /// Comma-separated list of every kind name (for hints).
    pub fn names() -> String {
        EventKind::ALL
            .iter()
            .map(EventKind::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| Error::UnknownEventKind(s.to_string()))
    }
}

/// Normalized live position of a single bus.
///
/// Both backend location formats decode into this one shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusLocation {
    pub bus_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub heading: f64,
    pub speed: f64,
    pub timestamp: String,
    pub status: String,
    pub next_stop: String,
    pub eta: f64,
}

/// Why the current session ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum DisconnectReason {
    /// The transport closed with the given close code.
    Closed { code: u16, reason: String },
    /// Automatic reconnection gave up; only a manual reconnect recovers.
    RetriesExhausted { attempts: u32 },
}

impl DisconnectReason {
    /// Returns true if no automatic reconnect will follow.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DisconnectReason::RetriesExhausted { .. })
    }
}

/// Raw transport error surfaced to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocketError {
    pub message: String,
}

/// A typed event delivered to subscribers of the matching [`EventKind`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "payload", rename_all = "kebab-case")]
pub enum DomainEvent {
    BusLocationUpdate(BusLocation),
    /// Pass-through of the server's `data` payload.
    BusStatusUpdate(serde_json::Value),
    /// Pass-through of the server's `data` payload.
    BusRouteUpdate(serde_json::Value),
    NotificationReceived(Notification),
    ChatMessageReceived(Notification),
    IncidentReported(Notification),
    Connect,
    Disconnect(DisconnectReason),
    Error(SocketError),
}

impl DomainEvent {
    /// Returns the kind this event is delivered under.
    pub fn kind(&self) -> EventKind {
        match self {
            DomainEvent::BusLocationUpdate(_) => EventKind::BusLocationUpdate,
            DomainEvent::BusStatusUpdate(_) => EventKind::BusStatusUpdate,
            DomainEvent::BusRouteUpdate(_) => EventKind::BusRouteUpdate,
            DomainEvent::NotificationReceived(_) => EventKind::NotificationReceived,
            DomainEvent::ChatMessageReceived(_) => EventKind::ChatMessageReceived,
            DomainEvent::IncidentReported(_) => EventKind::IncidentReported,
            DomainEvent::Connect => EventKind::Connect,
            DomainEvent::Disconnect(_) => EventKind::Disconnect,
            DomainEvent::Error(_) => EventKind::Error,
        }
    }

    /// Creates an `error` event from any displayable transport error.
    pub fn error(message: impl fmt::Display) -> Self {
        DomainEvent::Error(SocketError {
            message: message.to_string(),
        })
    }

    /// Serializes the event to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
