// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! transit-core: wire protocol for the realtime bus-tracking backend.
//!
//! This crate owns everything that touches the wire format: outbound
//! commands, inbound frame decoding and normalization, the domain event
//! vocabulary handed to subscribers, and the notification record model.
//! It performs no I/O.

pub mod error;
pub mod event;
mod id;
pub mod inbound;
pub mod notification;
pub mod outbound;

pub use error::{Error, FrameError, Result};
pub use event::{BusLocation, DisconnectReason, DomainEvent, EventKind, SocketError};
pub use inbound::{decode, Inbound};
pub use notification::{
    AppNotificationType, Notification, NotificationRecord, NotificationType, RelatedEntity,
    RelatedEntityRef,
};
pub use outbound::{
    AreaBounds, ChatMessage, ChatType, Coordinates, DriverLocation, IncidentReport,
    OutboundCommand,
};
