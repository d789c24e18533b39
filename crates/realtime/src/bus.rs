// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Subscription registry with fan-out by event kind.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::error;
use transit_core::{DomainEvent, EventKind};

type Callback = Arc<dyn Fn(&DomainEvent) + Send + Sync>;

struct Handler {
    id: u64,
    callback: Callback,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: HashMap<EventKind, Vec<Handler>>,
}

type SharedRegistry = Arc<Mutex<Registry>>;

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Many-to-many event fan-out.
///
/// Callbacks for a kind run synchronously in registration order. A callback
/// that panics is logged and skipped; the rest still run.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: SharedRegistry,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` for events of `kind`.
    pub fn on<F>(&self, kind: EventKind, callback: F) -> Subscription
    where
        F: Fn(&DomainEvent) + Send + Sync + 'static,
    {
        let mut registry = lock(&self.registry);
        registry.next_id += 1;
        let id = registry.next_id;
        registry.handlers.entry(kind).or_default().push(Handler {
            id,
            callback: Arc::new(callback),
        });
        Subscription {
            registry: Arc::downgrade(&self.registry),
            kind,
            id,
        }
    }

    /// Delivers `event` to every callback registered for its kind.
    ///
    /// Returns the number of callbacks invoked. Callbacks run without the
    /// registry lock held, so they may subscribe or unsubscribe.
    pub fn emit(&self, event: &DomainEvent) -> usize {
        let kind = event.kind();
        let callbacks: Vec<Callback> = lock(&self.registry)
            .handlers
            .get(&kind)
            .map(|handlers| handlers.iter().map(|h| Arc::clone(&h.callback)).collect())
            .unwrap_or_default();

        for callback in &callbacks {
            if panic::catch_unwind(AssertUnwindSafe(|| callback(event))).is_err() {
                error!(kind = %kind, "subscriber panicked");
            }
        }
        callbacks.len()
    }

    /// Removes every subscription.
    pub fn clear(&self) {
        lock(&self.registry).handlers.clear();
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        lock(&self.registry)
            .handlers
            .get(&kind)
            .map_or(0, Vec::len)
    }
}

/// Handle returned by [`EventBus::on`].
///
/// Dropping it keeps the callback registered; call
/// [`unsubscribe`](Subscription::unsubscribe) to remove it.
#[must_use = "keep the subscription to be able to unsubscribe"]
#[derive(Debug, Clone)]
pub struct Subscription {
    registry: Weak<Mutex<Registry>>,
    kind: EventKind,
    id: u64,
}

impl Subscription {
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Removes exactly this callback. Safe to call more than once.
    pub fn unsubscribe(&self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let mut registry = lock(&registry);
        if let Some(handlers) = registry.handlers.get_mut(&self.kind) {
            handlers.retain(|h| h.id != self.id);
            if handlers.is_empty() {
                registry.handlers.remove(&self.kind);
            }
        }
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
