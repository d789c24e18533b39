// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Access to the bearer token used to authenticate the WebSocket.

use std::fmt;
use std::mem;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Current token plus whether the backing store has finished loading.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AuthCredential {
    pub token: Option<String>,
    pub hydrated: bool,
}

impl fmt::Debug for AuthCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthCredential")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("hydrated", &self.hydrated)
            .finish()
    }
}

/// One-shot callback run when the credential store finishes hydrating.
pub type HydrationWatcher = Box<dyn FnOnce() + Send>;

/// Source of the current auth credential.
pub trait CredentialSource: Send + Sync {
    /// Returns the credential as of now.
    fn snapshot(&self) -> AuthCredential;

    /// Runs `watcher` once hydration completes, immediately if it already has.
    fn watch_hydration(&self, watcher: HydrationWatcher);
}

#[derive(Default)]
struct StoreState {
    credential: AuthCredential,
    watchers: Vec<HydrationWatcher>,
}

/// In-memory credential store.
///
/// Starts unhydrated; the application calls [`SessionStore::hydrate`] once
/// the persisted session has been read.
#[derive(Default)]
pub struct SessionStore {
    state: Mutex<StoreState>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that is already hydrated with `token`.
    pub fn hydrated(token: Option<String>) -> Self {
        let store = Self::new();
        store.hydrate(token);
        store
    }

    /// Marks the store hydrated and fires pending watchers.
    pub fn hydrate(&self, token: Option<String>) {
        let watchers = {
            let mut state = self.lock();
            state.credential.token = token;
            state.credential.hydrated = true;
            mem::take(&mut state.watchers)
        };
        for watcher in watchers {
            watcher();
        }
    }

    pub fn set_token(&self, token: impl Into<String>) {
        self.lock().credential.token = Some(token.into());
    }

    /// Signs out: drops the token but stays hydrated.
    pub fn clear(&self) {
        self.lock().credential.token = None;
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CredentialSource for SessionStore {
    fn snapshot(&self) -> AuthCredential {
        self.lock().credential.clone()
    }

    fn watch_hydration(&self, watcher: HydrationWatcher) {
        let mut state = self.lock();
        if state.credential.hydrated {
            drop(state);
            watcher();
        } else {
            state.watchers.push(watcher);
        }
    }
}

#[cfg(test)]
#[path = "credentials_tests.rs"]
mod tests;
