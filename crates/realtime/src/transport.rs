// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Transport abstraction for WebSocket communication.
//!
//! The connection manager never awaits. It asks a [`Transport`] to open,
//! send on or close a session, and the transport reports what happened
//! later as [`TransportEvent`]s tagged with the session id. This keeps
//! the manager synchronous, so tests drive it with a mock transport and
//! no sockets.

use std::collections::HashMap;
use std::fmt;

use futures_util::{SinkExt, StreamExt};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

use crate::error::{TransportError, TransportResult};
use crate::signal::{Signal, SignalSender};

/// Clean close code; closing with it never triggers a reconnect.
pub const NORMAL_CLOSURE: u16 = 1000;

/// The peer sent a close frame without a status code.
pub const NO_STATUS_RECEIVED: u16 = 1005;

/// The connection dropped without a close frame.
pub const ABNORMAL_CLOSURE: u16 = 1006;

/// Identifies one connection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Something that happened on a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The handshake completed.
    Opened,
    /// A text frame arrived.
    Frame(String),
    /// The transport reported an error. A `Closed` normally follows.
    Error(String),
    /// The session ended. Always the last event for a session.
    Closed { code: u16, reason: String },
}

/// Transport trait for WebSocket-like communication.
pub trait Transport: Send {
    /// Starts connecting `session` to `url`.
    ///
    /// An error means the connection could not even be attempted; no events
    /// follow for that session.
    fn open(&mut self, session: SessionId, url: &str) -> TransportResult<()>;

    /// Queues a text frame on an open session.
    fn send(&mut self, session: SessionId, text: String) -> TransportResult<()>;

    /// Closes the session with `code`. Unknown sessions are ignored.
    fn close(&mut self, session: SessionId, code: u16);
}

enum Outgoing {
    Text(String),
    Close(u16),
}

/// WebSocket transport implementation using tokio-tungstenite.
///
/// Each session runs on its own task and reports back through the signal
/// queue.
pub struct WebSocketTransport {
    signals: SignalSender,
    runtime: Handle,
    sessions: HashMap<SessionId, mpsc::UnboundedSender<Outgoing>>,
}

impl WebSocketTransport {
    pub fn new(signals: SignalSender, runtime: Handle) -> Self {
        WebSocketTransport {
            signals,
            runtime,
            sessions: HashMap::new(),
        }
    }
}

impl Transport for WebSocketTransport {
    fn open(&mut self, session: SessionId, url: &str) -> TransportResult<()> {
        if !(url.starts_with("ws://") || url.starts_with("wss://")) {
            return Err(TransportError::InvalidUrl(redact_query(url)));
        }
        let request = url
            .into_client_request()
            .map_err(|e| TransportError::InvalidUrl(e.to_string()))?;

        self.sessions.retain(|_, tx| !tx.is_closed());
        let (tx, rx) = mpsc::unbounded_channel();
        self.sessions.insert(session, tx);
        self.runtime
            .spawn(run_session(session, request, rx, self.signals.clone()));
        Ok(())
    }

    fn send(&mut self, session: SessionId, text: String) -> TransportResult<()> {
        let tx = self
            .sessions
            .get(&session)
            .ok_or(TransportError::NotOpen(session.0))?;
        tx.send(Outgoing::Text(text))
            .map_err(|_| TransportError::NotOpen(session.0))
    }

    fn close(&mut self, session: SessionId, code: u16) {
        if let Some(tx) = self.sessions.remove(&session) {
            let _ = tx.send(Outgoing::Close(code));
        }
    }
}

/// Strips the query string, which carries the token.
fn redact_query(url: &str) -> String {
    match url.split_once('?') {
        Some((base, _)) => format!("{}?<redacted>", base),
        None => url.to_string(),
    }
}

async fn run_session(
    session: SessionId,
    request: tokio_tungstenite::tungstenite::handshake::client::Request,
    mut outgoing: mpsc::UnboundedReceiver<Outgoing>,
    signals: SignalSender,
) {
    let emit = |event: TransportEvent| {
        let _ = signals.send(Signal::Transport { session, event });
    };

    let connect = tokio_tungstenite::connect_async(request);
    tokio::pin!(connect);
    let ws = loop {
        tokio::select! {
            result = &mut connect => match result {
                Ok((ws, _)) => break ws,
                Err(e) => {
                    debug!(%session, error = %e, "handshake failed");
                    emit(TransportEvent::Error(
                        TransportError::ConnectFailed(e.to_string()).to_string(),
                    ));
                    emit(TransportEvent::Closed {
                        code: ABNORMAL_CLOSURE,
                        reason: String::new(),
                    });
                    return;
                }
            },
            msg = outgoing.recv() => match msg {
                // Sends before open are rejected upstream; nothing to buffer.
                Some(Outgoing::Text(_)) => continue,
                Some(Outgoing::Close(code)) => {
                    emit(TransportEvent::Closed { code, reason: String::new() });
                    return;
                }
                None => return,
            },
        }
    };

    emit(TransportEvent::Opened);
    let (mut sink, mut stream) = ws.split();

    loop {
        tokio::select! {
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    emit(TransportEvent::Frame(text.as_str().to_owned()));
                }
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => emit(TransportEvent::Frame(text)),
                    Err(_) => warn!(%session, "dropping non-UTF-8 binary frame"),
                },
                Some(Ok(Message::Close(frame))) => {
                    let (code, reason) = match frame {
                        Some(frame) => (u16::from(frame.code), frame.reason.as_str().to_owned()),
                        None => (NO_STATUS_RECEIVED, String::new()),
                    };
                    emit(TransportEvent::Closed { code, reason });
                    return;
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    emit(TransportEvent::Error(e.to_string()));
                    emit(TransportEvent::Closed {
                        code: ABNORMAL_CLOSURE,
                        reason: String::new(),
                    });
                    return;
                }
                None => {
                    emit(TransportEvent::Closed {
                        code: ABNORMAL_CLOSURE,
                        reason: String::new(),
                    });
                    return;
                }
            },
            msg = outgoing.recv() => match msg {
                Some(Outgoing::Text(text)) => {
                    if let Err(e) = sink.send(Message::Text(text.into())).await {
                        warn!(%session, error = %e, "send failed");
                    }
                }
                Some(Outgoing::Close(code)) => {
                    let frame = CloseFrame {
                        code: CloseCode::from(code),
                        reason: String::new().into(),
                    };
                    if let Err(e) = sink.send(Message::Close(Some(frame))).await {
                        debug!(%session, error = %e, "close frame not sent");
                    }
                    emit(TransportEvent::Closed { code, reason: String::new() });
                    return;
                }
                None => return,
            },
        }
    }
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
