// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Wiring between the client and stdout.

use std::io::Write;

use tracing::warn;
use transit_core::{AreaBounds, DomainEvent, EventKind};
use transit_realtime::{RealtimeClient, Subscription};

/// Rooms to (re)join every time the connection opens.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rooms {
    pub buses: Vec<String>,
    pub routes: Vec<String>,
    pub area: Option<AreaBounds>,
}

impl Rooms {
    pub fn is_empty(&self) -> bool {
        self.buses.is_empty() && self.routes.is_empty() && self.area.is_none()
    }

    /// Sends the join commands for every room.
    pub fn join(&self, client: &RealtimeClient) {
        if let Some(area) = self.area {
            client.subscribe_area(area);
        }
        for bus in &self.buses {
            client.join_bus_tracking(bus.as_str());
        }
        for route in &self.routes {
            client.join_route_tracking(route.as_str());
        }
    }
}

/// Joins `rooms` after each successful connect.
pub fn rejoin_on_connect(client: &RealtimeClient, rooms: Rooms) -> Option<Subscription> {
    if rooms.is_empty() {
        return None;
    }
    let handle = client.clone();
    Some(client.on(EventKind::Connect, move |_| rooms.join(&handle)))
}

/// One JSON line per event.
pub fn event_line(event: &DomainEvent) -> serde_json::Result<String> {
    event.to_json()
}

/// Prints every event of the given kinds to stdout.
pub fn print_events(client: &RealtimeClient, kinds: &[EventKind]) -> Vec<Subscription> {
    kinds
        .iter()
        .map(|&kind| {
            client.on(kind, |event| match event_line(event) {
                Ok(line) => {
                    let mut out = std::io::stdout().lock();
                    if let Err(e) = writeln!(out, "{}", line).and_then(|()| out.flush()) {
                        warn!(error = %e, "failed to write event");
                    }
                }
                Err(e) => warn!(kind = %event.kind(), error = %e, "failed to encode event"),
            })
        })
        .collect()
}

#[cfg(test)]
#[path = "stream_tests.rs"]
mod tests;
