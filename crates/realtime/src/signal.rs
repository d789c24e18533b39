// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Inputs to the client's event loop.

use tokio::sync::mpsc;

use crate::timer::TimerId;
use crate::transport::{SessionId, TransportEvent};

/// Something the connection manager must react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// A transport session produced an event.
    Transport {
        session: SessionId,
        event: TransportEvent,
    },
    /// A scheduled timer fired.
    Timer(TimerId),
    /// The credential store finished hydrating.
    Hydrated,
}

/// Sending half of the event loop's queue.
pub type SignalSender = mpsc::UnboundedSender<Signal>;

/// Receiving half of the event loop's queue.
pub type SignalReceiver = mpsc::UnboundedReceiver<Signal>;

/// Creates the event loop's queue.
pub fn channel() -> (SignalSender, SignalReceiver) {
    mpsc::unbounded_channel()
}
