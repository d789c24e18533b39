// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Server-pushed notifications and the records the app stores for them.
//!
//! [`Notification`] is the payload as the backend sends it under an inbound
//! `notification` frame. [`NotificationRecord`] is the folded form kept in the
//! shared notification list, keyed by `id`.

use serde::{Deserialize, Serialize};

use crate::id;

/// Backend notification categories.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NotificationType {
    ReallocationRequestSubmitted,
    RouteReallocation,
    General,
    ChatMessage,
    IncidentReported,
    /// Any type this client does not know about.
    Other(String),
}

impl NotificationType {
    /// Returns the wire name.
    pub fn as_str(&self) -> &str {
        match self {
            NotificationType::ReallocationRequestSubmitted => "REALLOCATION_REQUEST_SUBMITTED",
            NotificationType::RouteReallocation => "ROUTE_REALLOCATION",
            NotificationType::General => "GENERAL",
            NotificationType::ChatMessage => "CHAT_MESSAGE",
            NotificationType::IncidentReported => "INCIDENT_REPORTED",
            NotificationType::Other(s) => s,
        }
    }
}

impl From<&str> for NotificationType {
    fn from(s: &str) -> Self {
        match s {
            "REALLOCATION_REQUEST_SUBMITTED" => NotificationType::ReallocationRequestSubmitted,
            "ROUTE_REALLOCATION" => NotificationType::RouteReallocation,
            "GENERAL" => NotificationType::General,
            "CHAT_MESSAGE" => NotificationType::ChatMessage,
            "INCIDENT_REPORTED" => NotificationType::IncidentReported,
            other => NotificationType::Other(other.to_string()),
        }
    }
}

/// Reference to the entity a notification is about, as sent by the server.
///
/// Role-specific fields beyond the known ids are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RelatedEntityRef {
    #[serde(default)]
    pub entity_type: String,
    #[serde(
        default,
        deserialize_with = "id::opt_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub request_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "id::opt_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub bus_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "id::opt_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub chat_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "id::opt_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub incident_id: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RelatedEntityRef {
    /// Resolves the entity id: the first of request, bus or chat id, falling
    /// back to the entity type.
    pub fn entity_id(&self) -> String {
        self.request_id
            .as_ref()
            .or(self.bus_id.as_ref())
            .or(self.chat_id.as_ref())
            .cloned()
            .unwrap_or_else(|| self.entity_type.clone())
    }
}

/// A notification exactly as the backend pushes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(deserialize_with = "id::string_or_number")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub notification_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_entity: Option<RelatedEntityRef>,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub is_read: bool,
}

impl Notification {
    /// Returns the parsed notification type.
    pub fn kind(&self) -> NotificationType {
        NotificationType::from(self.notification_type.as_str())
    }
}

/// Category the app uses to style a stored notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AppNotificationType {
    Alert,
    Info,
    System,
}

impl From<&NotificationType> for AppNotificationType {
    fn from(kind: &NotificationType) -> Self {
        match kind {
            NotificationType::ReallocationRequestSubmitted
            | NotificationType::RouteReallocation
            | NotificationType::IncidentReported => AppNotificationType::Alert,
            NotificationType::ChatMessage => AppNotificationType::Info,
            NotificationType::General => AppNotificationType::System,
            NotificationType::Other(_) => AppNotificationType::Info,
        }
    }
}

/// Resolved entity reference on a stored record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedEntity {
    pub entity_type: String,
    pub entity_id: String,
}

/// A notification as kept in the shared list. Unique by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub id: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: AppNotificationType,
    pub is_read: bool,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_entity: Option<RelatedEntity>,
}

impl From<&Notification> for NotificationRecord {
    fn from(n: &Notification) -> Self {
        NotificationRecord {
            id: n.id.clone(),
            title: n.title.clone(),
            message: n.message.clone(),
            kind: AppNotificationType::from(&n.kind()),
            is_read: n.is_read,
            created_at: n.timestamp.clone(),
            related_entity: n.related_entity.as_ref().map(|related| RelatedEntity {
                entity_type: related.entity_type.clone(),
                entity_id: related.entity_id(),
            }),
        }
    }
}

#[cfg(test)]
#[path = "notification_tests.rs"]
mod tests;
