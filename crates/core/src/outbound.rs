// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Commands sent from the client to the server.
//!
//! Every command travels as `{"type": ..., "data": {...}}`. Commands are
//! fire-and-forget: the server never acknowledges them, and nothing here
//! correlates a command with a later response.

use serde::{Deserialize, Serialize};

/// A latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Geographic bounding box for area subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

/// Position report sent by a driver's device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverLocation {
    pub bus_id: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    pub timestamp: String,
}

/// Chat channel a message is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChatType {
    Direct,
    Group,
    #[default]
    Support,
}

/// Outgoing chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_id: Option<String>,
    #[serde(default)]
    pub chat_type: ChatType,
}

/// Incident reported from the field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentReport {
    pub description: String,
    pub incident_type: String,
    pub severity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Coordinates>,
}

/// Messages sent from client to server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OutboundCommand {
    /// Receive location updates for every bus.
    #[serde(rename = "subscribe:all:buses")]
    SubscribeAllBuses {},

    /// Receive notifications addressed to the authenticated user.
    #[serde(rename = "subscribe:notifications")]
    SubscribeNotifications {},

    /// Receive updates for buses inside a bounding box.
    #[serde(rename = "subscribe:area")]
    SubscribeArea(AreaBounds),

    #[serde(rename = "join:bus:tracking")]
    JoinBusTracking { bus_id: String },

    #[serde(rename = "leave:bus:tracking")]
    LeaveBusTracking { bus_id: String },

    #[serde(rename = "join:route:tracking")]
    JoinRouteTracking { route_id: String },

    #[serde(rename = "leave:route:tracking")]
    LeaveRouteTracking { route_id: String },

    #[serde(rename = "driver:location:update")]
    DriverLocation(DriverLocation),

    #[serde(rename = "chat:message:send")]
    ChatMessage(ChatMessage),

    #[serde(rename = "incident:report")]
    IncidentReport(IncidentReport),

    /// Reply to a server `ping`.
    #[serde(rename = "pong")]
    Pong {},
}

impl OutboundCommand {
    /// Creates a subscribe-all-buses command.
    pub fn subscribe_all_buses() -> Self {
        OutboundCommand::SubscribeAllBuses {}
    }

    /// Creates a subscribe-notifications command.
    pub fn subscribe_notifications() -> Self {
        OutboundCommand::SubscribeNotifications {}
    }

    /// Creates a subscribe-area command.
    pub fn subscribe_area(bounds: AreaBounds) -> Self {
        OutboundCommand::SubscribeArea(bounds)
    }

    pub fn join_bus_tracking(bus_id: impl Into<String>) -> Self {
        OutboundCommand::JoinBusTracking {
            bus_id: bus_id.into(),
        }
    }

    pub fn leave_bus_tracking(bus_id: impl Into<String>) -> Self {
        OutboundCommand::LeaveBusTracking {
            bus_id: bus_id.into(),
        }
    }

    pub fn join_route_tracking(route_id: impl Into<String>) -> Self {
        OutboundCommand::JoinRouteTracking {
            route_id: route_id.into(),
        }
    }

    pub fn leave_route_tracking(route_id: impl Into<String>) -> Self {
        OutboundCommand::LeaveRouteTracking {
            route_id: route_id.into(),
        }
    }

    /// Creates a driver location report.
    pub fn driver_location(location: DriverLocation) -> Self {
        OutboundCommand::DriverLocation(location)
    }

    /// Creates a chat message. `chat_type` defaults to [`ChatType::Support`].
    pub fn chat_message(
        message: impl Into<String>,
        recipient_id: Option<String>,
        chat_type: Option<ChatType>,
    ) -> Self {
        OutboundCommand::ChatMessage(ChatMessage {
            message: message.into(),
            recipient_id,
            chat_type: chat_type.unwrap_or_default(),
        })
    }

    /// Creates an incident report.
    pub fn incident_report(
        description: impl Into<String>,
        incident_type: impl Into<String>,
        severity: impl Into<String>,
        location: Option<Coordinates>,
    ) -> Self {
        OutboundCommand::IncidentReport(IncidentReport {
            description: description.into(),
            incident_type: incident_type.into(),
            severity: severity.into(),
            location,
        })
    }

    /// Creates a pong reply.
    pub fn pong() -> Self {
        OutboundCommand::Pong {}
    }

    /// Returns the wire `type` of this command.
    pub fn type_name(&self) -> &'static str {
        match self {
            OutboundCommand::SubscribeAllBuses {} => "subscribe:all:buses",
            OutboundCommand::SubscribeNotifications {} => "subscribe:notifications",
            OutboundCommand::SubscribeArea(_) => "subscribe:area",
            OutboundCommand::JoinBusTracking { .. } => "join:bus:tracking",
            OutboundCommand::LeaveBusTracking { .. } => "leave:bus:tracking",
            OutboundCommand::JoinRouteTracking { .. } => "join:route:tracking",
            OutboundCommand::LeaveRouteTracking { .. } => "leave:route:tracking",
            OutboundCommand::DriverLocation(_) => "driver:location:update",
            OutboundCommand::ChatMessage(_) => "chat:message:send",
            OutboundCommand::IncidentReport(_) => "incident:report",
            OutboundCommand::Pong {} => "pong",
        }
    }

    /// Serializes the command to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes a command from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
#[path = "outbound_tests.rs"]
mod tests;
