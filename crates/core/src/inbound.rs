// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Inbound frame decoding.
//!
//! The backend is not consistent about message shapes. A bus location update
//! arrives either as `bus:location:update` with the fields nested under
//! `data`, or as `bus_location_update` with flat snake_case fields and a
//! nested `location` object. [`decode`] detects the format and normalizes
//! both into a single [`BusLocation`]; a new backend format only needs a new
//! arm in [`decode`] and a new source struct feeding [`LocationFields`].
//!
//! Decoding never fails the session. Frames that cannot be understood come
//! back as a [`FrameError`] for the caller to log and drop.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::FrameError;
use crate::event::{BusLocation, DomainEvent};
use crate::id;
use crate::notification::{Notification, NotificationType};
use crate::outbound::Coordinates;

/// Status reported when the server omits one.
pub const DEFAULT_STATUS: &str = "on-time";

/// Next stop reported when the server omits one.
pub const DEFAULT_NEXT_STOP: &str = "Unknown";

/// Result of decoding one inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Events to deliver to subscribers.
    Events(Vec<DomainEvent>),
    /// A pushed notification: the raw payload for the notification sink,
    /// plus the events to deliver to subscribers.
    Notification {
        notification: Notification,
        events: Vec<DomainEvent>,
    },
    /// Server keepalive; the client answers with a pong.
    Ping,
    /// Keepalive answer; not surfaced.
    Pong,
    /// Session acknowledgment; not surfaced.
    Authenticated,
    /// A `type` this client does not handle.
    Unknown(String),
}

/// Decodes one text frame.
pub fn decode(text: &str) -> Result<Inbound, FrameError> {
    let frame: Value =
        serde_json::from_str(text).map_err(|e| FrameError::InvalidJson(e.to_string()))?;
    let kind = frame
        .get("type")
        .and_then(Value::as_str)
        .ok_or(FrameError::MissingType)?;

    match kind {
        "bus:location:update" => {
            let nested: NestedLocation = payload(kind, nested_data(kind, &frame)?)?;
            Ok(location_event(LocationFields::from(nested)))
        }
        "bus_location_update" => {
            let flat: FlatLocation = payload(kind, &frame)?;
            Ok(location_event(flat.into_fields(kind)?))
        }
        "bus:status:update" => Ok(Inbound::Events(vec![DomainEvent::BusStatusUpdate(
            nested_data(kind, &frame)?.clone(),
        )])),
        "bus:route:update" => Ok(Inbound::Events(vec![DomainEvent::BusRouteUpdate(
            nested_data(kind, &frame)?.clone(),
        )])),
        "notification" => {
            let raw = frame
                .get("notification")
                .ok_or_else(|| FrameError::MissingField {
                    kind: kind.to_string(),
                    field: "notification",
                })?;
            let notification: Notification = payload(kind, raw)?;
            let events = notification_events(&notification);
            Ok(Inbound::Notification {
                notification,
                events,
            })
        }
        "ping" => Ok(Inbound::Ping),
        "pong" => Ok(Inbound::Pong),
        "authenticated" => Ok(Inbound::Authenticated),
        other => Ok(Inbound::Unknown(other.to_string())),
    }
}

/// Events a pushed notification fans out to, by notification type.
///
/// Incident reports are also general notifications, so they produce both.
pub fn notification_events(notification: &Notification) -> Vec<DomainEvent> {
    match notification.kind() {
        NotificationType::ChatMessage => {
            vec![DomainEvent::ChatMessageReceived(notification.clone())]
        }
        NotificationType::IncidentReported => vec![
            DomainEvent::IncidentReported(notification.clone()),
            DomainEvent::NotificationReceived(notification.clone()),
        ],
        _ => vec![DomainEvent::NotificationReceived(notification.clone())],
    }
}

fn nested_data<'a>(kind: &str, frame: &'a Value) -> Result<&'a Value, FrameError> {
    frame.get("data").ok_or_else(|| FrameError::MissingField {
        kind: kind.to_string(),
        field: "data",
    })
}

fn payload<T: DeserializeOwned>(kind: &str, value: &Value) -> Result<T, FrameError> {
    T::deserialize(value).map_err(|e| FrameError::InvalidPayload {
        kind: kind.to_string(),
        detail: e.to_string(),
    })
}

fn location_event(fields: LocationFields) -> Inbound {
    Inbound::Events(vec![DomainEvent::BusLocationUpdate(fields.normalize())])
}

/// Location fields common to every backend format, before defaults.
#[derive(Debug)]
struct LocationFields {
    bus_id: String,
    latitude: f64,
    longitude: f64,
    heading: Option<f64>,
    speed: Option<f64>,
    timestamp: Option<String>,
    status: Option<String>,
    next_stop: Option<String>,
    eta: Option<f64>,
}

impl LocationFields {
    fn normalize(self) -> BusLocation {
        BusLocation {
            bus_id: self.bus_id,
            latitude: self.latitude,
            longitude: self.longitude,
            heading: self.heading.unwrap_or(0.0),
            speed: self.speed.unwrap_or(0.0),
            timestamp: self
                .timestamp
                .unwrap_or_else(|| chrono::Utc::now().to_rfc3339()),
            status: self.status.unwrap_or_else(|| DEFAULT_STATUS.to_string()),
            next_stop: self
                .next_stop
                .unwrap_or_else(|| DEFAULT_NEXT_STOP.to_string()),
            eta: self.eta.unwrap_or(0.0),
        }
    }
}

/// `bus:location:update` data object.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NestedLocation {
    #[serde(alias = "bus_id", deserialize_with = "id::string_or_number")]
    bus_id: String,
    latitude: f64,
    longitude: f64,
    heading: Option<f64>,
    speed: Option<f64>,
    timestamp: Option<String>,
    status: Option<String>,
    #[serde(alias = "next_stop")]
    next_stop: Option<String>,
    eta: Option<f64>,
}

impl From<NestedLocation> for LocationFields {
    fn from(n: NestedLocation) -> Self {
        LocationFields {
            bus_id: n.bus_id,
            latitude: n.latitude,
            longitude: n.longitude,
            heading: n.heading,
            speed: n.speed,
            timestamp: n.timestamp,
            status: n.status,
            next_stop: n.next_stop,
            eta: n.eta,
        }
    }
}

/// `bus_location_update` frame, flat at the top level.
#[derive(Debug, Deserialize)]
struct FlatLocation {
    #[serde(default, deserialize_with = "id::opt_string_or_number")]
    bus_id: Option<String>,
    location: Option<Coordinates>,
    heading: Option<f64>,
    speed: Option<f64>,
    timestamp: Option<String>,
    status: Option<String>,
    next_stop: Option<String>,
    eta: Option<f64>,
}

impl FlatLocation {
    fn into_fields(self, kind: &str) -> Result<LocationFields, FrameError> {
        let missing = |field| FrameError::MissingField {
            kind: kind.to_string(),
            field,
        };
        let bus_id = self.bus_id.ok_or_else(|| missing("bus_id"))?;
        let location = self.location.ok_or_else(|| missing("location"))?;
        Ok(LocationFields {
            bus_id,
            latitude: location.latitude,
            longitude: location.longitude,
            heading: self.heading,
            speed: self.speed,
            timestamp: self.timestamp,
            status: self.status,
            next_stop: self.next_stop,
            eta: self.eta,
        })
    }
}

#[cfg(test)]
#[path = "inbound_tests.rs"]
mod tests;
