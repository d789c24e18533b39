// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use super::*;
use crate::event::EventKind;
use serde_json::json;
use yare::parameterized;

fn single_location(text: &str) -> BusLocation {
    match decode(text).unwrap() {
        Inbound::Events(events) => match events.as_slice() {
            [DomainEvent::BusLocationUpdate(location)] => location.clone(),
            other => panic!("expected one location event, got {:?}", other),
        },
        other => panic!("expected events, got {:?}", other),
    }
}

fn kinds(events: &[DomainEvent]) -> Vec<EventKind> {
    events.iter().map(DomainEvent::kind).collect()
}

#[test]
fn flat_backend_location_gets_defaults() {
    let location = single_location(
        r#"{"type":"bus_location_update","bus_id":"B1","location":{"latitude":9.03,"longitude":38.76},"heading":45,"speed":10,"timestamp":"2024-01-01T00:00:00Z"}"#,
    );
    assert_eq!(
        location,
        BusLocation {
            bus_id: "B1".into(),
            latitude: 9.03,
            longitude: 38.76,
            heading: 45.0,
            speed: 10.0,
            timestamp: "2024-01-01T00:00:00Z".into(),
            status: "on-time".into(),
            next_stop: "Unknown".into(),
            eta: 0.0,
        }
    );
}

// Every known location shape, with the same field values, must normalize to
// the same event payload.
#[parameterized(
    nested_camel = { json!({
        "type": "bus:location:update",
        "data": {"busId": "B7", "latitude": 9.01, "longitude": 38.74, "heading": 180, "speed": 22.5,
                 "timestamp": "2024-05-05T10:00:00Z", "status": "delayed", "nextStop": "Piassa", "eta": 6}
    }) },
    nested_snake = { json!({
        "type": "bus:location:update",
        "data": {"bus_id": "B7", "latitude": 9.01, "longitude": 38.74, "heading": 180, "speed": 22.5,
                 "timestamp": "2024-05-05T10:00:00Z", "status": "delayed", "next_stop": "Piassa", "eta": 6}
    }) },
    flat_backend = { json!({
        "type": "bus_location_update", "bus_id": "B7",
        "location": {"latitude": 9.01, "longitude": 38.74}, "heading": 180, "speed": 22.5,
        "timestamp": "2024-05-05T10:00:00Z", "status": "delayed", "next_stop": "Piassa", "eta": 6
    }) },
)]
fn location_formats_normalize_identically(frame: serde_json::Value) {
    let location = single_location(&frame.to_string());
    assert_eq!(
        location,
        BusLocation {
            bus_id: "B7".into(),
            latitude: 9.01,
            longitude: 38.74,
            heading: 180.0,
            speed: 22.5,
            timestamp: "2024-05-05T10:00:00Z".into(),
            status: "delayed".into(),
            next_stop: "Piassa".into(),
            eta: 6.0,
        }
    );
}

#[test]
fn numeric_bus_ids_become_strings() {
    let location = single_location(
        r#"{"type":"bus_location_update","bus_id":7,"location":{"latitude":1.0,"longitude":2.0},"timestamp":"t"}"#,
    );
    assert_eq!(location.bus_id, "7");
}

#[test]
fn nested_and_flat_minimal_frames_match() {
    let nested = single_location(
        r#"{"type":"bus:location:update","data":{"busId":"B1","latitude":1.5,"longitude":2.5,"timestamp":"t"}}"#,
    );
    let flat = single_location(
        r#"{"type":"bus_location_update","bus_id":"B1","location":{"latitude":1.5,"longitude":2.5},"timestamp":"t"}"#,
    );
    assert_eq!(nested, flat);
}

#[test]
fn missing_timestamp_is_stamped_now() {
    let location = single_location(
        r#"{"type":"bus_location_update","bus_id":"B1","location":{"latitude":1.0,"longitude":2.0}}"#,
    );
    assert!(chrono::DateTime::parse_from_rfc3339(&location.timestamp).is_ok());
}

#[parameterized(
    no_bus_id_or_location = { r#"{"type":"bus_location_update","heading":0}"#, "bus_id" },
    no_location = { r#"{"type":"bus_location_update","bus_id":"B1"}"#, "location" },
    no_bus_id = { r#"{"type":"bus_location_update","location":{"latitude":1,"longitude":2}}"#, "bus_id" },
    nested_without_data = { r#"{"type":"bus:location:update"}"#, "data" },
    status_without_data = { r#"{"type":"bus:status:update"}"#, "data" },
    notification_without_payload = { r#"{"type":"notification"}"#, "notification" },
)]
fn frames_missing_required_fields_are_rejected(text: &str, field: &str) {
    match decode(text) {
        Err(FrameError::MissingField { field: missing, .. }) => assert_eq!(missing, field),
        other => panic!("expected missing {}, got {:?}", field, other),
    }
}

#[parameterized(
    not_json = { "{not json" },
    truncated = { r#"{"type":"ping""# },
)]
fn invalid_json_is_rejected(text: &str) {
    assert!(matches!(decode(text), Err(FrameError::InvalidJson(_))));
}

#[parameterized(
    no_type = { r#"{"data":{}}"# },
    numeric_type = { r#"{"type":3}"# },
    array = { r#"[1,2]"# },
)]
fn frames_without_type_are_rejected(text: &str) {
    assert_eq!(decode(text), Err(FrameError::MissingType));
}

#[test]
fn nested_location_with_bad_coordinates_is_invalid_payload() {
    let result = decode(r#"{"type":"bus:location:update","data":{"busId":"B1","latitude":"north"}}"#);
    assert!(matches!(result, Err(FrameError::InvalidPayload { .. })));
}

#[parameterized(
    status = { "bus:status:update", EventKind::BusStatusUpdate },
    route = { "bus:route:update", EventKind::BusRouteUpdate },
)]
fn status_and_route_updates_pass_data_through(kind: &str, expected: EventKind) {
    let data = json!({"busId": "B1", "status": "out-of-service", "extra": [1, 2]});
    let text = json!({"type": kind, "data": data}).to_string();
    match decode(&text).unwrap() {
        Inbound::Events(events) => {
            assert_eq!(kinds(&events), vec![expected]);
            match &events[0] {
                DomainEvent::BusStatusUpdate(v) | DomainEvent::BusRouteUpdate(v) => {
                    assert_eq!(v, &data)
                }
                other => panic!("unexpected {:?}", other),
            }
        }
        other => panic!("expected events, got {:?}", other),
    }
}

#[parameterized(
    ping = { r#"{"type":"ping"}"#, Inbound::Ping },
    pong = { r#"{"type":"pong","data":{}}"#, Inbound::Pong },
    authenticated = { r#"{"type":"authenticated","user_id":5}"#, Inbound::Authenticated },
    unknown = { r#"{"type":"weather:update","data":{}}"#, Inbound::Unknown("weather:update".into()) },
)]
fn control_frames(text: &str, expected: Inbound) {
    assert_eq!(decode(text).unwrap(), expected);
}

fn notification_frame(kind: &str) -> String {
    json!({
        "type": "notification",
        "notification": {
            "id": "n-9",
            "title": "Update",
            "message": "Details",
            "notification_type": kind,
            "related_entity": {"entity_type": "incident", "incident_id": 3},
            "timestamp": "2024-01-01T00:00:00Z",
            "is_read": false
        }
    })
    .to_string()
}

#[parameterized(
    chat = { "CHAT_MESSAGE", vec![EventKind::ChatMessageReceived] },
    incident = { "INCIDENT_REPORTED", vec![EventKind::IncidentReported, EventKind::NotificationReceived] },
    general = { "GENERAL", vec![EventKind::NotificationReceived] },
    reallocation = { "ROUTE_REALLOCATION", vec![EventKind::NotificationReceived] },
    unknown = { "SOMETHING_NEW", vec![EventKind::NotificationReceived] },
)]
fn notification_fan_out_by_type(kind: &str, expected: Vec<EventKind>) {
    match decode(&notification_frame(kind)).unwrap() {
        Inbound::Notification {
            notification,
            events,
        } => {
            assert_eq!(notification.id, "n-9");
            assert_eq!(notification.notification_type, kind);
            assert_eq!(kinds(&events), expected);
        }
        other => panic!("expected notification, got {:?}", other),
    }
}

#[test]
fn notification_without_id_is_invalid_payload() {
    let text = r#"{"type":"notification","notification":{"title":"x"}}"#;
    assert!(matches!(decode(text), Err(FrameError::InvalidPayload { .. })));
}
