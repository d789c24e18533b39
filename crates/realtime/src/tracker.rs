// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Live bus collection for map views.
//!
//! A [`BusTracker`] starts from a snapshot fetched elsewhere and merges
//! `bus-location-update` events into it as they arrive.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use transit_core::{AreaBounds, BusLocation, DomainEvent, EventKind};

use crate::bus::Subscription;
use crate::client::RealtimeClient;
use crate::connection::ConnectionState;

/// A bus as shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedBus {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_id: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub heading: f64,
    pub speed: f64,
    pub status: String,
    pub next_stop: String,
    pub eta: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    /// True once a live update has been applied.
    #[serde(default)]
    pub is_real_time: bool,
}

impl TrackedBus {
    /// Entry for a bus first seen through a live update.
    pub fn placeholder(location: &BusLocation) -> Self {
        let mut bus = TrackedBus {
            id: location.bus_id.clone(),
            label: None,
            route_id: None,
            latitude: 0.0,
            longitude: 0.0,
            heading: 0.0,
            speed: 0.0,
            status: String::new(),
            next_stop: String::new(),
            eta: 0.0,
            last_updated: None,
            is_real_time: true,
        };
        bus.apply(location);
        bus
    }

    /// Overwrites the live fields from `location`.
    pub fn apply(&mut self, location: &BusLocation) {
        self.latitude = location.latitude;
        self.longitude = location.longitude;
        self.heading = location.heading;
        self.speed = location.speed;
        self.status = location.status.clone();
        self.next_stop = location.next_stop.clone();
        self.eta = location.eta;
        self.last_updated = Some(location.timestamp.clone());
        self.is_real_time = true;
    }
}

type BusMap = Arc<Mutex<BTreeMap<String, TrackedBus>>>;

fn lock(buses: &BusMap) -> MutexGuard<'_, BTreeMap<String, TrackedBus>> {
    buses.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Bus collection kept current by the realtime client.
pub struct BusTracker {
    client: RealtimeClient,
    buses: BusMap,
    subscription: Subscription,
}

impl BusTracker {
    /// Seeds the collection and starts merging live updates.
    ///
    /// Seeded entries are marked not real-time until their first update.
    pub fn attach(client: &RealtimeClient, seed: impl IntoIterator<Item = TrackedBus>) -> Self {
        let initial = seed
            .into_iter()
            .map(|mut bus| {
                bus.is_real_time = false;
                (bus.id.clone(), bus)
            })
            .collect();
        let buses: BusMap = Arc::new(Mutex::new(initial));

        let target = Arc::clone(&buses);
        let subscription = client.on(EventKind::BusLocationUpdate, move |event| {
            if let DomainEvent::BusLocationUpdate(location) = event {
                let mut buses = lock(&target);
                match buses.get_mut(&location.bus_id) {
                    Some(bus) => bus.apply(location),
                    None => {
                        buses.insert(location.bus_id.clone(), TrackedBus::placeholder(location));
                    }
                }
            }
        });

        BusTracker {
            client: client.clone(),
            buses,
            subscription,
        }
    }

    /// Every tracked bus, ordered by id.
    pub fn buses(&self) -> Vec<TrackedBus> {
        lock(&self.buses).values().cloned().collect()
    }

    pub fn bus(&self, id: &str) -> Option<TrackedBus> {
        lock(&self.buses).get(id).cloned()
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_connected()
    }

    pub fn connection_status(&self) -> ConnectionState {
        self.client.connection_status()
    }

    pub fn join_area_tracking(&self, bounds: AreaBounds) {
        self.client.subscribe_area(bounds);
    }

    pub fn join_bus_tracking(&self, bus_id: impl Into<String>) {
        self.client.join_bus_tracking(bus_id);
    }

    pub fn leave_bus_tracking(&self, bus_id: impl Into<String>) {
        self.client.leave_bus_tracking(bus_id);
    }

    /// Stops merging updates.
    pub fn detach(self) {
        self.subscription.unsubscribe();
    }
}

#[cfg(test)]
#[path = "tracker_tests.rs"]
mod tests;
