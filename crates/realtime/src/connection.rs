// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connection manager.
//!
//! Owns the single transport session and its lifecycle:
//! - Gates connecting on the credential store being hydrated
//! - Sends the default subscriptions once a session opens
//! - Reconnects with exponential backoff after unexpected closures,
//!   rotating endpoints when a session fails before it opens
//!
//! The manager is synchronous. Transport, timer and hydration events are
//! fed in through the `handle_*` methods, and everything subscribers should
//! see is queued as [`Emission`]s for the caller to [`drain`] and dispatch
//! once it no longer holds the manager.
//!
//! [`drain`]: ConnectionManager::drain

use std::fmt;
use std::mem;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use transit_core::{decode, DisconnectReason, DomainEvent, Inbound, Notification, OutboundCommand};

use crate::config::RealtimeConfig;
use crate::credentials::CredentialSource;
use crate::retry::{ReconnectPolicy, RetryDecision, RetryState};
use crate::timer::{TimerId, Timers};
use crate::transport::{SessionId, Transport, TransportEvent, NORMAL_CLOSURE};

/// Connection status as seen by consumers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        }
    }

    /// Returns true if moving from `self` to `next` is allowed.
    ///
    /// `connected` is only reachable from `connecting`.
    pub fn can_transition_to(&self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, next),
            (Disconnected, Connecting)
                | (Connecting, Connected)
                | (Connecting, Disconnected)
                | (Connected, Disconnected)
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of the manager, in the order it must be dispatched.
#[derive(Debug, Clone, PartialEq)]
pub enum Emission {
    /// Deliver to event bus subscribers.
    Event(DomainEvent),
    /// Hand to the notification sink.
    Notification(Notification),
}

/// Called when the credential store finishes hydrating. Must not call back
/// into the manager; the driver uses it to enqueue a hydration signal.
pub type HydrationHook = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Copy)]
struct ActiveSession {
    id: SessionId,
    opened: bool,
}

pub struct ConnectionManager {
    config: RealtimeConfig,
    policy: ReconnectPolicy,
    credentials: Arc<dyn CredentialSource>,
    transport: Box<dyn Transport>,
    timers: Box<dyn Timers>,
    on_hydrated: HydrationHook,
    state: ConnectionState,
    retry: RetryState,
    session: Option<ActiveSession>,
    next_session: u64,
    next_timer: u64,
    reconnect_timer: Option<TimerId>,
    hydration_timer: Option<TimerId>,
    hydration_retry_spent: bool,
    awaiting_hydration: bool,
    outbox: Vec<Emission>,
}

impl ConnectionManager {
    pub fn new(
        config: RealtimeConfig,
        credentials: Arc<dyn CredentialSource>,
        transport: Box<dyn Transport>,
        timers: Box<dyn Timers>,
        on_hydrated: HydrationHook,
    ) -> Self {
        let policy = config.reconnect_policy();
        ConnectionManager {
            config,
            policy,
            credentials,
            transport,
            timers,
            on_hydrated,
            state: ConnectionState::Disconnected,
            retry: RetryState::new(),
            session: None,
            next_session: 0,
            next_timer: 0,
            reconnect_timer: None,
            hydration_timer: None,
            hydration_retry_spent: false,
            awaiting_hydration: false,
            outbox: Vec::new(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn retry_state(&self) -> RetryState {
        self.retry
    }

    /// Takes everything emitted since the last drain.
    pub fn drain(&mut self) -> Vec<Emission> {
        mem::take(&mut self.outbox)
    }

    /// Begins connecting, or defers until the credential store hydrates.
    pub fn start(&mut self) {
        if self.session.is_some() {
            debug!(state = %self.state, "start ignored, session already active");
            return;
        }
        self.hydration_retry_spent = false;
        if self.credentials.snapshot().hydrated {
            self.connect_now();
        } else {
            debug!("credential store not hydrated, deferring connect");
            self.await_hydration();
        }
    }

    /// Resets retry bookkeeping and reconnects with the current credentials.
    pub fn retry_with_auth(&mut self) {
        info!("reconnecting with current credentials");
        self.retry.reset();
        self.hydration_retry_spent = false;
        self.cancel_timers();
        self.teardown(NORMAL_CLOSURE);
        self.connect_now();
    }

    /// Manual recovery, typically after retries were exhausted.
    pub fn force_reconnect(&mut self) {
        self.retry_with_auth();
    }

    /// Closes the session cleanly and cancels pending retries.
    pub fn disconnect(&mut self) {
        info!("disconnecting");
        self.cancel_timers();
        self.awaiting_hydration = false;
        self.teardown(NORMAL_CLOSURE);
    }

    /// Sends `cmd` if a session is open; otherwise drops it with a warning.
    pub fn send(&mut self, cmd: &OutboundCommand) -> bool {
        let session = match self.session {
            Some(active) if self.state == ConnectionState::Connected => active.id,
            _ => {
                warn!(command = cmd.type_name(), state = %self.state, "not connected, dropping command");
                return false;
            }
        };
        let text = match cmd.to_json() {
            Ok(text) => text,
            Err(e) => {
                warn!(command = cmd.type_name(), error = %e, "failed to encode command");
                return false;
            }
        };
        match self.transport.send(session, text) {
            Ok(()) => {
                debug!(%session, command = cmd.type_name(), "sent");
                true
            }
            Err(e) => {
                warn!(%session, command = cmd.type_name(), error = %e, "send failed");
                false
            }
        }
    }

    pub fn handle_transport(&mut self, session: SessionId, event: TransportEvent) {
        let Some(active) = self.session.filter(|active| active.id == session) else {
            debug!(%session, ?event, "ignoring event for stale session");
            return;
        };

        match event {
            TransportEvent::Opened => {
                self.session = Some(ActiveSession {
                    opened: true,
                    ..active
                });
                if self.state == ConnectionState::Disconnected {
                    self.set_state(ConnectionState::Connecting);
                }
                self.set_state(ConnectionState::Connected);
                self.retry.record_connected();
                info!(%session, endpoint = self.retry.endpoint(), "connected");
                self.send(&OutboundCommand::subscribe_all_buses());
                self.send(&OutboundCommand::subscribe_notifications());
                self.outbox.push(Emission::Event(DomainEvent::Connect));
            }
            TransportEvent::Frame(text) => self.handle_frame(&text),
            TransportEvent::Error(message) => {
                error!(%session, error = %message, "transport error");
                self.set_state(ConnectionState::Disconnected);
                self.outbox
                    .push(Emission::Event(DomainEvent::error(message)));
            }
            TransportEvent::Closed { code, reason } => {
                self.session = None;
                self.set_state(ConnectionState::Disconnected);
                info!(%session, code, reason = %reason, "disconnected");
                self.outbox
                    .push(Emission::Event(DomainEvent::Disconnect(DisconnectReason::Closed {
                        code,
                        reason,
                    })));
                if code != NORMAL_CLOSURE {
                    if !active.opened {
                        self.retry.rotate_endpoint(self.config.endpoints.len());
                    }
                    self.schedule_reconnect();
                }
            }
        }
    }

    pub fn handle_timer(&mut self, id: TimerId) {
        if self.reconnect_timer == Some(id) {
            self.reconnect_timer = None;
        } else if self.hydration_timer == Some(id) {
            self.hydration_timer = None;
        } else {
            debug!(timer = id.0, "ignoring stale timer");
            return;
        }
        if self.session.is_none() {
            self.connect_now();
        }
    }

    pub fn handle_hydrated(&mut self) {
        if !self.awaiting_hydration {
            return;
        }
        self.awaiting_hydration = false;
        debug!("credential store hydrated");
        if self.session.is_none() {
            self.connect_now();
        }
    }

    fn connect_now(&mut self) {
        self.cancel_timers();
        let credential = self.credentials.snapshot();
        let Some(token) = credential.token else {
            self.set_state(ConnectionState::Disconnected);
            warn!(
                hydrated = credential.hydrated,
                "no auth token available, not connecting"
            );
            if !credential.hydrated {
                self.await_hydration();
                if !self.hydration_retry_spent {
                    self.hydration_retry_spent = true;
                    let id = self.next_timer_id();
                    self.timers.schedule(id, self.config.hydration_retry());
                    self.hydration_timer = Some(id);
                }
            }
            return;
        };

        self.next_session += 1;
        let session = SessionId(self.next_session);
        let endpoint = self.retry.endpoint();
        let url = self.config.endpoint_url(endpoint, &token);
        self.set_state(ConnectionState::Connecting);
        info!(%session, endpoint, attempt = self.retry.attempt(), "connecting");

        match self.transport.open(session, &url) {
            Ok(()) => {
                self.session = Some(ActiveSession {
                    id: session,
                    opened: false,
                });
            }
            Err(e) => {
                error!(%session, error = %e, "failed to open transport");
                self.set_state(ConnectionState::Disconnected);
                self.retry.rotate_endpoint(self.config.endpoints.len());
                self.schedule_reconnect();
            }
        }
    }

    fn handle_frame(&mut self, text: &str) {
        match decode(text) {
            Ok(Inbound::Events(events)) => {
                self.outbox.extend(events.into_iter().map(Emission::Event));
            }
            Ok(Inbound::Notification {
                notification,
                events,
            }) => {
                self.outbox.push(Emission::Notification(notification));
                self.outbox.extend(events.into_iter().map(Emission::Event));
            }
            Ok(Inbound::Ping) => {
                self.send(&OutboundCommand::pong());
            }
            Ok(Inbound::Pong) => debug!("pong received"),
            Ok(Inbound::Authenticated) => info!("session authenticated"),
            Ok(Inbound::Unknown(kind)) => debug!(kind = %kind, "ignoring unrecognized message"),
            Err(e) => warn!(error = %e, "dropping malformed frame"),
        }
    }

    fn schedule_reconnect(&mut self) {
        if let Some(previous) = self.reconnect_timer.take() {
            self.timers.cancel(previous);
        }
        match self.retry.record_failure(&self.policy) {
            RetryDecision::Retry { attempt, delay } => {
                let id = self.next_timer_id();
                self.timers.schedule(id, delay);
                self.reconnect_timer = Some(id);
                info!(
                    attempt,
                    max_attempts = self.policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "reconnect scheduled"
                );
            }
            RetryDecision::Exhausted { attempts } => {
                warn!(attempts, "reconnect attempts exhausted, manual reconnect required");
                self.outbox
                    .push(Emission::Event(DomainEvent::Disconnect(
                        DisconnectReason::RetriesExhausted { attempts },
                    )));
            }
        }
    }

    fn await_hydration(&mut self) {
        if self.awaiting_hydration {
            return;
        }
        self.awaiting_hydration = true;
        let hook = Arc::clone(&self.on_hydrated);
        self.credentials.watch_hydration(Box::new(move || hook()));
    }

    fn teardown(&mut self, code: u16) {
        if let Some(active) = self.session.take() {
            debug!(session = %active.id, code, "closing session");
            self.transport.close(active.id, code);
        }
        self.set_state(ConnectionState::Disconnected);
    }

    fn cancel_timers(&mut self) {
        if let Some(id) = self.reconnect_timer.take() {
            self.timers.cancel(id);
        }
        if let Some(id) = self.hydration_timer.take() {
            self.timers.cancel(id);
        }
    }

    fn next_timer_id(&mut self) -> TimerId {
        self.next_timer += 1;
        TimerId(self.next_timer)
    }

    fn set_state(&mut self, next: ConnectionState) {
        if self.state == next {
            return;
        }
        if !self.state.can_transition_to(next) {
            warn!(from = %self.state, to = %next, "illegal state transition ignored");
            return;
        }
        debug!(from = %self.state, to = %next, "state change");
        self.state = next;
    }
}

#[cfg(test)]
#[path = "connection_tests.rs"]
mod tests;
