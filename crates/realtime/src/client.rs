// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Realtime client handle and event loop.
//!
//! A [`RealtimeClient`] wraps the connection manager, the event bus and the
//! optional notification port behind one cloneable handle. Transport, timer
//! and hydration signals are consumed by a single task in arrival order, so
//! a frame is fully dispatched before the next one is processed.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::runtime::Handle;
use tracing::debug;
use transit_core::{
    AreaBounds, ChatType, Coordinates, DomainEvent, DriverLocation, EventKind, OutboundCommand,
};

use crate::bus::{EventBus, Subscription};
use crate::config::RealtimeConfig;
use crate::connection::{ConnectionManager, ConnectionState, Emission, HydrationHook};
use crate::credentials::CredentialSource;
use crate::error::ClientError;
use crate::signal::{self, Signal, SignalReceiver};
use crate::sink::NotificationPort;
use crate::timer::{Timers, TokioTimers};
use crate::transport::{Transport, WebSocketTransport};

struct Shared {
    manager: Mutex<ConnectionManager>,
    bus: EventBus,
    notifications: Option<Arc<dyn NotificationPort>>,
}

/// Custom seams for a client that is driven by the caller.
pub struct ClientParts {
    pub transport: Box<dyn Transport>,
    pub timers: Box<dyn Timers>,
    pub on_hydrated: HydrationHook,
}

/// Configures and creates a [`RealtimeClient`].
pub struct RealtimeClientBuilder {
    config: RealtimeConfig,
    credentials: Arc<dyn CredentialSource>,
    notifications: Option<Arc<dyn NotificationPort>>,
}

impl RealtimeClientBuilder {
    /// Forwards pushed notifications to `port` before subscribers see them.
    pub fn notification_port(mut self, port: Arc<dyn NotificationPort>) -> Self {
        self.notifications = Some(port);
        self
    }

    /// Creates the client on the current tokio runtime with the WebSocket
    /// transport, and spawns its event loop. Does not connect; call
    /// [`RealtimeClient::start`].
    pub fn spawn(self) -> Result<RealtimeClient, ClientError> {
        self.config.validate()?;
        let runtime = Handle::try_current().map_err(|_| ClientError::NoRuntime)?;
        let (tx, rx) = signal::channel();

        let hook_tx = tx.clone();
        let parts = ClientParts {
            transport: Box::new(WebSocketTransport::new(tx.clone(), runtime.clone())),
            timers: Box::new(TokioTimers::new(tx, runtime.clone())),
            on_hydrated: Arc::new(move || {
                let _ = hook_tx.send(Signal::Hydrated);
            }),
        };
        let client = self.with_parts(parts);
        runtime.spawn(run_event_loop(Arc::downgrade(&client.shared), rx));
        Ok(client)
    }

    /// Creates a client over custom seams. The caller feeds signals in with
    /// [`RealtimeClient::process`].
    pub fn with_parts(self, parts: ClientParts) -> RealtimeClient {
        let manager = ConnectionManager::new(
            self.config,
            self.credentials,
            parts.transport,
            parts.timers,
            parts.on_hydrated,
        );
        RealtimeClient {
            shared: Arc::new(Shared {
                manager: Mutex::new(manager),
                bus: EventBus::new(),
                notifications: self.notifications,
            }),
        }
    }
}

async fn run_event_loop(shared: Weak<Shared>, mut signals: SignalReceiver) {
    while let Some(signal) = signals.recv().await {
        let Some(shared) = shared.upgrade() else {
            break;
        };
        RealtimeClient { shared }.process(signal);
    }
    debug!("realtime event loop stopped");
}

/// Handle to the realtime connection. Clones share one connection.
#[derive(Clone)]
pub struct RealtimeClient {
    shared: Arc<Shared>,
}

impl RealtimeClient {
    pub fn builder(
        config: RealtimeConfig,
        credentials: Arc<dyn CredentialSource>,
    ) -> RealtimeClientBuilder {
        RealtimeClientBuilder {
            config,
            credentials,
            notifications: None,
        }
    }

    /// Feeds one signal to the connection manager and dispatches the result.
    pub fn process(&self, signal: Signal) {
        self.with_manager(|manager| match signal {
            Signal::Transport { session, event } => manager.handle_transport(session, event),
            Signal::Timer(id) => manager.handle_timer(id),
            Signal::Hydrated => manager.handle_hydrated(),
        });
    }

    /// Registers `callback` for events of `kind`.
    pub fn on<F>(&self, kind: EventKind, callback: F) -> Subscription
    where
        F: Fn(&DomainEvent) + Send + Sync + 'static,
    {
        self.shared.bus.on(kind, callback)
    }

    pub fn start(&self) {
        self.with_manager(ConnectionManager::start);
    }

    pub fn retry_with_auth(&self) {
        self.with_manager(ConnectionManager::retry_with_auth);
    }

    pub fn force_reconnect(&self) {
        self.with_manager(ConnectionManager::force_reconnect);
    }

    /// Closes the connection and drops every subscription.
    pub fn disconnect(&self) {
        self.with_manager(ConnectionManager::disconnect);
        self.shared.bus.clear();
    }

    pub fn is_connected(&self) -> bool {
        self.lock().is_connected()
    }

    pub fn connection_status(&self) -> ConnectionState {
        self.lock().state()
    }

    /// The client has no fallback transport.
    pub fn is_using_fallback(&self) -> bool {
        false
    }

    pub fn subscribe_all_buses(&self) {
        self.send(OutboundCommand::subscribe_all_buses());
    }

    pub fn subscribe_notifications(&self) {
        self.send(OutboundCommand::subscribe_notifications());
    }

    pub fn subscribe_area(&self, bounds: AreaBounds) {
        self.send(OutboundCommand::subscribe_area(bounds));
    }

    pub fn join_bus_tracking(&self, bus_id: impl Into<String>) {
        self.send(OutboundCommand::join_bus_tracking(bus_id));
    }

    pub fn leave_bus_tracking(&self, bus_id: impl Into<String>) {
        self.send(OutboundCommand::leave_bus_tracking(bus_id));
    }

    pub fn join_route_tracking(&self, route_id: impl Into<String>) {
        self.send(OutboundCommand::join_route_tracking(route_id));
    }

    pub fn leave_route_tracking(&self, route_id: impl Into<String>) {
        self.send(OutboundCommand::leave_route_tracking(route_id));
    }

    pub fn send_driver_location(&self, location: DriverLocation) {
        self.send(OutboundCommand::driver_location(location));
    }

    pub fn send_chat_message(
        &self,
        message: impl Into<String>,
        recipient_id: Option<String>,
        chat_type: Option<ChatType>,
    ) {
        self.send(OutboundCommand::chat_message(message, recipient_id, chat_type));
    }

    pub fn send_incident_report(
        &self,
        description: impl Into<String>,
        incident_type: impl Into<String>,
        severity: impl Into<String>,
        location: Option<Coordinates>,
    ) {
        self.send(OutboundCommand::incident_report(
            description,
            incident_type,
            severity,
            location,
        ));
    }

    fn send(&self, cmd: OutboundCommand) {
        self.with_manager(|manager| {
            manager.send(&cmd);
        });
    }

    fn lock(&self) -> MutexGuard<'_, ConnectionManager> {
        self.shared
            .manager
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` on the manager, then dispatches what it emitted with the
    /// manager unlocked, so subscribers may call back into the client.
    fn with_manager<R>(&self, f: impl FnOnce(&mut ConnectionManager) -> R) -> R {
        let (result, emissions) = {
            let mut manager = self.lock();
            let result = f(&mut *manager);
            (result, manager.drain())
        };
        for emission in emissions {
            match emission {
                Emission::Notification(notification) => {
                    if let Some(port) = &self.shared.notifications {
                        port.ingest(&notification);
                    }
                }
                Emission::Event(event) => {
                    self.shared.bus.emit(&event);
                }
            }
        }
        result
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
