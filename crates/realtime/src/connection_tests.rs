// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use super::*;
use crate::credentials::SessionStore;
use crate::test_helpers::{MockTimers, MockTransport};
use crate::transport::ABNORMAL_CLOSURE;
use std::sync::atomic::{AtomicUsize, Ordering};
use transit_core::EventKind;
use yare::parameterized;

struct Harness {
    manager: ConnectionManager,
    transport: MockTransport,
    timers: MockTimers,
    store: Arc<SessionStore>,
    hydrations: Arc<AtomicUsize>,
}

impl Harness {
    fn new(store: SessionStore) -> Self {
        let transport = MockTransport::new();
        let timers = MockTimers::new();
        let store = Arc::new(store);
        let hydrations = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hydrations);
        let manager = ConnectionManager::new(
            RealtimeConfig::default(),
            store.clone(),
            Box::new(transport.clone()),
            Box::new(timers.clone()),
            Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        Harness {
            manager,
            transport,
            timers,
            store,
            hydrations,
        }
    }

    fn with_token() -> Self {
        Self::new(SessionStore::hydrated(Some("tok".into())))
    }

    fn session(&self) -> SessionId {
        self.transport.last_open().unwrap().0
    }

    fn last_url(&self) -> String {
        self.transport.last_open().unwrap().1
    }

    fn deliver(&mut self, event: TransportEvent) {
        let session = self.session();
        self.manager.handle_transport(session, event);
    }

    fn open(&mut self) {
        self.deliver(TransportEvent::Opened);
    }

    fn close(&mut self, code: u16) {
        self.deliver(TransportEvent::Closed {
            code,
            reason: String::new(),
        });
    }

    fn fire_last_timer(&mut self) {
        let id = self.timers.last_scheduled().unwrap();
        self.manager.handle_timer(id);
    }

    fn event_kinds(&mut self) -> Vec<EventKind> {
        self.manager
            .drain()
            .into_iter()
            .filter_map(|emission| match emission {
                Emission::Event(event) => Some(event.kind()),
                Emission::Notification(_) => None,
            })
            .collect()
    }
}

#[test]
fn start_opens_primary_endpoint_with_token() {
    let mut h = Harness::with_token();
    h.manager.start();

    assert_eq!(h.manager.state(), ConnectionState::Connecting);
    assert_eq!(h.last_url(), "ws://localhost:8000/ws/bus-tracking/?token=tok");
}

#[test]
fn open_sends_default_subscriptions_and_emits_connect() {
    let mut h = Harness::with_token();
    h.manager.start();
    h.open();

    assert!(h.manager.is_connected());
    assert_eq!(
        h.transport.sent_types(),
        vec!["subscribe:all:buses", "subscribe:notifications"]
    );
    assert_eq!(h.event_kinds(), vec![EventKind::Connect]);
}

#[test]
fn start_twice_opens_once() {
    let mut h = Harness::with_token();
    h.manager.start();
    h.manager.start();
    assert_eq!(h.transport.open_count(), 1);
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Open,
    Error,
    Close(u16),
    FireTimer,
    Retry,
    Disconnect,
}

// Connected must only ever be entered from connecting.
#[parameterized(
    happy_path = { vec![Step::Open, Step::Close(1000)] },
    reconnect_cycle = { vec![Step::Open, Step::Close(1006), Step::FireTimer, Step::Open] },
    error_close_retry = { vec![Step::Open, Step::Error, Step::Close(1006), Step::FireTimer, Step::Open] },
    failed_handshake = { vec![Step::Error, Step::Close(1006), Step::FireTimer, Step::Open] },
    manual_retry = { vec![Step::Close(1011), Step::Retry, Step::Open, Step::Disconnect, Step::Retry, Step::Open] },
    open_after_disconnect = { vec![Step::Disconnect, Step::Open] },
)]
fn connected_is_only_entered_from_connecting(steps: Vec<Step>) {
    let mut h = Harness::with_token();
    let mut states = vec![h.manager.state()];
    h.manager.start();
    states.push(h.manager.state());

    for step in steps {
        match step {
            Step::Open => h.open(),
            Step::Error => h.deliver(TransportEvent::Error("boom".into())),
            Step::Close(code) => h.close(code),
            Step::FireTimer => h.fire_last_timer(),
            Step::Retry => h.manager.retry_with_auth(),
            Step::Disconnect => h.manager.disconnect(),
        }
        states.push(h.manager.state());
    }

    for pair in states.windows(2) {
        assert!(
            !(pair[0] == ConnectionState::Disconnected && pair[1] == ConnectionState::Connected),
            "illegal transition in {:?}",
            states
        );
    }
}

#[test]
fn five_unexpected_closures_back_off_then_give_up() {
    let mut h = Harness::with_token();
    h.manager.start();
    h.open();
    h.manager.drain();

    for _ in 0..5 {
        h.close(ABNORMAL_CLOSURE);
        h.fire_last_timer();
    }
    assert_eq!(h.timers.delays_ms(), vec![1000, 2000, 4000, 8000, 16000]);
    assert_eq!(h.transport.open_count(), 6);

    h.manager.drain();
    h.close(ABNORMAL_CLOSURE);
    assert_eq!(h.timers.delays_ms().len(), 5, "no sixth retry");

    let emissions = h.manager.drain();
    assert_eq!(
        emissions,
        vec![
            Emission::Event(DomainEvent::Disconnect(DisconnectReason::Closed {
                code: ABNORMAL_CLOSURE,
                reason: String::new(),
            })),
            Emission::Event(DomainEvent::Disconnect(
                DisconnectReason::RetriesExhausted { attempts: 5 }
            )),
        ]
    );
    assert_eq!(h.manager.state(), ConnectionState::Disconnected);
}

#[test]
fn successful_open_resets_backoff() {
    let mut h = Harness::with_token();
    h.manager.start();
    h.open();
    h.close(ABNORMAL_CLOSURE);
    h.fire_last_timer();
    h.close(ABNORMAL_CLOSURE);
    h.fire_last_timer();
    h.open();
    assert_eq!(h.manager.retry_state().attempt(), 0);

    h.close(ABNORMAL_CLOSURE);
    assert_eq!(h.timers.delays_ms(), vec![1000, 2000, 1000]);
}

#[test]
fn normal_closure_does_not_reconnect() {
    let mut h = Harness::with_token();
    h.manager.start();
    h.open();
    h.close(NORMAL_CLOSURE);

    assert!(h.timers.delays_ms().is_empty());
    assert_eq!(h.manager.state(), ConnectionState::Disconnected);
}

#[test]
fn transport_error_emits_error_without_reconnect() {
    let mut h = Harness::with_token();
    h.manager.start();
    h.open();
    h.manager.drain();

    h.deliver(TransportEvent::Error("reset by peer".into()));

    assert_eq!(h.manager.state(), ConnectionState::Disconnected);
    assert!(h.timers.delays_ms().is_empty());
    assert_eq!(
        h.manager.drain(),
        vec![Emission::Event(DomainEvent::error("reset by peer"))]
    );
}

#[parameterized(
    before_start = { false, false },
    while_connecting = { true, false },
    after_close = { true, true },
)]
fn commands_are_dropped_unless_connected(started: bool, closed: bool) {
    let mut h = Harness::with_token();
    if started {
        h.manager.start();
    }
    if closed {
        h.open();
        h.close(NORMAL_CLOSURE);
    }
    let sends_before = h.transport.log().sends.len();

    assert!(!h.manager.send(&OutboundCommand::join_bus_tracking("B1")));
    assert_eq!(h.transport.log().sends.len(), sends_before);
}

#[test]
fn ping_is_answered_with_pong() {
    let mut h = Harness::with_token();
    h.manager.start();
    h.open();
    h.manager.drain();

    h.deliver(TransportEvent::Frame(r#"{"type":"ping"}"#.into()));

    assert_eq!(h.transport.sent_types().last().unwrap(), "pong");
    assert!(h.manager.drain().is_empty());
}

#[test]
fn incident_notification_is_ingested_once_and_emitted_twice() {
    let mut h = Harness::with_token();
    h.manager.start();
    h.open();
    h.manager.drain();

    h.deliver(TransportEvent::Frame(
        r#"{"type":"notification","notification":{"id":"n1","title":"Crash","message":"Road blocked","notification_type":"INCIDENT_REPORTED","timestamp":"2024-01-01T00:00:00Z","is_read":false}}"#.into(),
    ));

    let emissions = h.manager.drain();
    let notifications = emissions
        .iter()
        .filter(|e| matches!(e, Emission::Notification(_)))
        .count();
    let kinds: Vec<EventKind> = emissions
        .iter()
        .filter_map(|e| match e {
            Emission::Event(event) => Some(event.kind()),
            Emission::Notification(_) => None,
        })
        .collect();
    assert_eq!(notifications, 1);
    assert!(matches!(emissions[0], Emission::Notification(_)));
    assert_eq!(
        kinds,
        vec![EventKind::IncidentReported, EventKind::NotificationReceived]
    );
}

#[parameterized(
    not_json = { "not json" },
    missing_location = { r#"{"type":"bus_location_update","bus_id":"B1"}"# },
    unknown_type = { r#"{"type":"weather"}"# },
    authenticated = { r#"{"type":"authenticated"}"# },
)]
fn unusable_frames_are_dropped(frame: &str) {
    let mut h = Harness::with_token();
    h.manager.start();
    h.open();
    h.manager.drain();

    h.deliver(TransportEvent::Frame(frame.into()));

    assert!(h.manager.drain().is_empty());
    assert!(h.manager.is_connected());
}

#[test]
fn location_frame_becomes_event() {
    let mut h = Harness::with_token();
    h.manager.start();
    h.open();
    h.manager.drain();

    h.deliver(TransportEvent::Frame(
        r#"{"type":"bus:location:update","data":{"busId":"B1","latitude":1.0,"longitude":2.0}}"#
            .into(),
    ));
    assert_eq!(h.event_kinds(), vec![EventKind::BusLocationUpdate]);
}

#[test]
fn unhydrated_store_defers_until_hydrated() {
    let mut h = Harness::new(SessionStore::new());
    h.manager.start();
    assert_eq!(h.transport.open_count(), 0);
    assert_eq!(h.hydrations.load(Ordering::SeqCst), 0);

    h.store.hydrate(Some("late".into()));
    assert_eq!(h.hydrations.load(Ordering::SeqCst), 1);

    h.manager.handle_hydrated();
    assert_eq!(h.transport.open_count(), 1);
    assert!(h.last_url().ends_with("?token=late"));

    h.manager.handle_hydrated();
    assert_eq!(h.transport.open_count(), 1);
}

#[test]
fn hydrated_without_token_stays_disconnected() {
    let mut h = Harness::new(SessionStore::hydrated(None));
    h.manager.start();

    assert_eq!(h.manager.state(), ConnectionState::Disconnected);
    assert_eq!(h.transport.open_count(), 0);
    assert!(h.timers.delays_ms().is_empty());

    h.store.set_token("now");
    h.manager.retry_with_auth();
    assert_eq!(h.transport.open_count(), 1);
}

#[test]
fn connect_before_hydration_retries_once_after_delay() {
    let mut h = Harness::new(SessionStore::new());
    h.manager.retry_with_auth();
    assert_eq!(h.timers.delays_ms(), vec![2000]);

    h.fire_last_timer();
    assert_eq!(h.transport.open_count(), 0);
    assert_eq!(h.timers.delays_ms(), vec![2000], "retried only once");
}

#[test]
fn failure_before_open_rotates_endpoint() {
    let mut h = Harness::with_token();
    h.manager.start();
    h.close(ABNORMAL_CLOSURE);
    h.fire_last_timer();
    assert_eq!(h.last_url(), "ws://localhost:8000/ws/?token=tok");

    h.close(ABNORMAL_CLOSURE);
    h.fire_last_timer();
    assert_eq!(h.last_url(), "ws://localhost:8000/ws/?access_token=tok");

    h.open();
    h.close(ABNORMAL_CLOSURE);
    h.fire_last_timer();
    assert_eq!(
        h.last_url(),
        "ws://localhost:8000/ws/?access_token=tok",
        "a session that opened keeps its endpoint"
    );

    h.manager.retry_with_auth();
    assert_eq!(h.last_url(), "ws://localhost:8000/ws/bus-tracking/?token=tok");
}

#[test]
fn open_failure_rotates_and_schedules_retry() {
    let mut h = Harness::with_token();
    h.transport.set_fail_open(true);
    h.manager.start();

    assert_eq!(h.manager.state(), ConnectionState::Disconnected);
    assert_eq!(h.manager.retry_state().endpoint(), 1);
    assert_eq!(h.timers.delays_ms(), vec![1000]);

    h.transport.set_fail_open(false);
    h.fire_last_timer();
    assert_eq!(h.last_url(), "ws://localhost:8000/ws/?token=tok");
}

#[test]
fn events_from_replaced_session_are_ignored() {
    let mut h = Harness::with_token();
    h.manager.start();
    let old = h.session();
    h.manager.retry_with_auth();
    h.manager.drain();

    assert_eq!(h.transport.closes(), vec![(old, NORMAL_CLOSURE)]);
    h.manager.handle_transport(old, TransportEvent::Opened);
    h.manager.handle_transport(
        old,
        TransportEvent::Closed {
            code: NORMAL_CLOSURE,
            reason: String::new(),
        },
    );

    assert_eq!(h.manager.state(), ConnectionState::Connecting);
    assert!(h.manager.drain().is_empty());
}

#[test]
fn disconnect_closes_cleanly_and_cancels_retry() {
    let mut h = Harness::with_token();
    h.manager.start();
    h.open();
    h.close(ABNORMAL_CLOSURE);
    let pending = h.timers.last_scheduled().unwrap();
    h.fire_last_timer();
    h.open();
    h.close(ABNORMAL_CLOSURE);
    let pending_after = h.timers.last_scheduled().unwrap();
    assert_ne!(pending, pending_after);

    h.manager.disconnect();
    assert!(h.timers.was_cancelled(pending_after));

    h.manager.handle_timer(pending_after);
    assert_eq!(h.transport.open_count(), 2);
    assert_eq!(h.manager.state(), ConnectionState::Disconnected);
}

#[test]
fn disconnect_sends_normal_closure() {
    let mut h = Harness::with_token();
    h.manager.start();
    h.open();
    let session = h.session();

    h.manager.disconnect();

    assert_eq!(h.transport.closes(), vec![(session, NORMAL_CLOSURE)]);
    assert!(!h.manager.is_connected());
}

#[parameterized(
    connect = { ConnectionState::Disconnected, ConnectionState::Connecting, true },
    open = { ConnectionState::Connecting, ConnectionState::Connected, true },
    fail = { ConnectionState::Connecting, ConnectionState::Disconnected, true },
    lose = { ConnectionState::Connected, ConnectionState::Disconnected, true },
    skip = { ConnectionState::Disconnected, ConnectionState::Connected, false },
    backwards = { ConnectionState::Connected, ConnectionState::Connecting, false },
)]
fn state_transitions(from: ConnectionState, to: ConnectionState, allowed: bool) {
    assert_eq!(from.can_transition_to(to), allowed);
}

#[test]
fn state_names_are_lowercase() {
    assert_eq!(ConnectionState::Connecting.to_string(), "connecting");
    assert_eq!(
        serde_json::to_string(&ConnectionState::Disconnected).unwrap(),
        "\"disconnected\""
    );
}
