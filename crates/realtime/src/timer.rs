// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Deferred wakeups for reconnect backoff and hydration retries.

use std::collections::HashMap;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::signal::{Signal, SignalSender};

/// Identifies one scheduled wakeup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// Schedules [`Signal::Timer`] deliveries.
pub trait Timers: Send {
    /// Fires `id` once after `delay`.
    fn schedule(&mut self, id: TimerId, delay: Duration);

    /// Cancels `id` if it has not fired. Unknown ids are ignored.
    fn cancel(&mut self, id: TimerId);
}

/// Timers backed by `tokio::time::sleep` tasks.
pub struct TokioTimers {
    signals: SignalSender,
    runtime: Handle,
    pending: HashMap<TimerId, JoinHandle<()>>,
}

impl TokioTimers {
    pub fn new(signals: SignalSender, runtime: Handle) -> Self {
        TokioTimers {
            signals,
            runtime,
            pending: HashMap::new(),
        }
    }
}

impl Timers for TokioTimers {
    fn schedule(&mut self, id: TimerId, delay: Duration) {
        self.pending.retain(|_, task| !task.is_finished());
        let signals = self.signals.clone();
        let task = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = signals.send(Signal::Timer(id));
        });
        if let Some(previous) = self.pending.insert(id, task) {
            previous.abort();
        }
    }

    fn cancel(&mut self, id: TimerId) {
        if let Some(task) = self.pending.remove(&id) {
            task.abort();
        }
    }
}

impl Drop for TokioTimers {
    fn drop(&mut self) {
        for (_, task) in self.pending.drain() {
            task.abort();
        }
    }
}

#[cfg(test)]
#[path = "timer_tests.rs"]
mod tests;
