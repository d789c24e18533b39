// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Recording mocks for the transport and timer seams.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::error::{TransportError, TransportResult};
use crate::timer::{TimerId, Timers};
use crate::transport::{SessionId, Transport};

#[derive(Default)]
pub struct TransportLog {
    pub opens: Vec<(SessionId, String)>,
    pub sends: Vec<(SessionId, String)>,
    pub closes: Vec<(SessionId, u16)>,
    pub fail_open: bool,
}

/// Transport that records every call. Clones share the same log.
#[derive(Clone, Default)]
pub struct MockTransport {
    log: Arc<Mutex<TransportLog>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> MutexGuard<'_, TransportLog> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_fail_open(&self, fail: bool) {
        self.log().fail_open = fail;
    }

    pub fn open_count(&self) -> usize {
        self.log().opens.len()
    }

    /// Session id and URL of the most recent open.
    pub fn last_open(&self) -> Option<(SessionId, String)> {
        self.log().opens.last().cloned()
    }

    /// The `type` field of every frame sent, in order.
    pub fn sent_types(&self) -> Vec<String> {
        self.log()
            .sends
            .iter()
            .filter_map(|(_, text)| {
                let value: serde_json::Value = serde_json::from_str(text).ok()?;
                value.get("type")?.as_str().map(str::to_string)
            })
            .collect()
    }

    pub fn closes(&self) -> Vec<(SessionId, u16)> {
        self.log().closes.clone()
    }
}

impl Transport for MockTransport {
    fn open(&mut self, session: SessionId, url: &str) -> TransportResult<()> {
        let mut log = self.log();
        if log.fail_open {
            return Err(TransportError::InvalidUrl(url.to_string()));
        }
        log.opens.push((session, url.to_string()));
        Ok(())
    }

    fn send(&mut self, session: SessionId, text: String) -> TransportResult<()> {
        self.log().sends.push((session, text));
        Ok(())
    }

    fn close(&mut self, session: SessionId, code: u16) {
        self.log().closes.push((session, code));
    }
}

#[derive(Default)]
pub struct TimerLog {
    pub scheduled: Vec<(TimerId, Duration)>,
    pub cancelled: Vec<TimerId>,
}

/// Timers that never fire on their own; tests deliver them explicitly.
#[derive(Clone, Default)]
pub struct MockTimers {
    log: Arc<Mutex<TimerLog>>,
}

impl MockTimers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> MutexGuard<'_, TimerLog> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every scheduled delay in milliseconds, in order.
    pub fn delays_ms(&self) -> Vec<u64> {
        self.log()
            .scheduled
            .iter()
            .map(|(_, delay)| delay.as_millis() as u64)
            .collect()
    }

    pub fn last_scheduled(&self) -> Option<TimerId> {
        self.log().scheduled.last().map(|(id, _)| *id)
    }

    pub fn was_cancelled(&self, id: TimerId) -> bool {
        self.log().cancelled.contains(&id)
    }
}

impl Timers for MockTimers {
    fn schedule(&mut self, id: TimerId, delay: Duration) {
        self.log().scheduled.push((id, delay));
    }

    fn cancel(&mut self, id: TimerId) {
        self.log().cancelled.push(id);
    }
}
