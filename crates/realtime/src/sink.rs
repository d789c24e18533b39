// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! De-duplicated notification list.
//!
//! Pushed notifications flow in through [`NotificationSink`], the only
//! writer of new records. The rest of the application shares the same list
//! through [`NotificationList`] handles to read it and mark entries read.
//! Every mutation reads, modifies and writes the current list under one
//! lock, then persists it.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};
use transit_core::{Notification, NotificationRecord};

use crate::error::PersistenceError;

/// Ingest port for pushed notifications.
pub trait NotificationPort: Send + Sync {
    /// Stores `notification` unless its id is already present.
    ///
    /// Returns true if a new record was added.
    fn ingest(&self, notification: &Notification) -> bool;
}

/// Backing store for the notification list.
pub trait NotificationPersistence: Send {
    fn load(&mut self) -> Result<Vec<NotificationRecord>, PersistenceError>;
    fn save(&mut self, records: &[NotificationRecord]) -> Result<(), PersistenceError>;
}

/// Keeps nothing beyond the in-memory list.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    saved: Vec<NotificationRecord>,
}

impl NotificationPersistence for MemoryPersistence {
    fn load(&mut self) -> Result<Vec<NotificationRecord>, PersistenceError> {
        Ok(self.saved.clone())
    }

    fn save(&mut self, records: &[NotificationRecord]) -> Result<(), PersistenceError> {
        self.saved = records.to_vec();
        Ok(())
    }
}

/// Stores the list as a pretty-printed JSON array.
///
/// Writes go to a sibling temp file that is synced and renamed over the
/// target, so readers never see a partial file.
#[derive(Debug, Clone)]
pub struct JsonFilePersistence {
    path: PathBuf,
}

impl JsonFilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFilePersistence { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl NotificationPersistence for JsonFilePersistence {
    fn load(&mut self) -> Result<Vec<NotificationRecord>, PersistenceError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&mut self, records: &[NotificationRecord]) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let temp = self.temp_path();
        let json = serde_json::to_string_pretty(records)?;
        let mut file = File::create(&temp)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

struct ListState {
    records: Vec<NotificationRecord>,
    persistence: Box<dyn NotificationPersistence>,
}

impl ListState {
    fn persist(&mut self) {
        if let Err(e) = self.persistence.save(&self.records) {
            warn!(error = %e, "failed to persist notifications");
        }
    }
}

/// Shared handle to the notification list, most recent first.
#[derive(Clone)]
pub struct NotificationList {
    state: Arc<Mutex<ListState>>,
}

impl NotificationList {
    /// Loads the list from `persistence`.
    pub fn open(
        mut persistence: Box<dyn NotificationPersistence>,
    ) -> Result<Self, PersistenceError> {
        let records = persistence.load()?;
        debug!(count = records.len(), "loaded notifications");
        Ok(NotificationList {
            state: Arc::new(Mutex::new(ListState {
                records,
                persistence,
            })),
        })
    }

    /// An empty list that is never written anywhere.
    pub fn in_memory() -> Self {
        NotificationList {
            state: Arc::new(Mutex::new(ListState {
                records: Vec::new(),
                persistence: Box::new(MemoryPersistence::default()),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ListState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn records(&self) -> Vec<NotificationRecord> {
        self.lock().records.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().records.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().records.iter().any(|r| r.id == id)
    }

    pub fn unread_count(&self) -> usize {
        self.lock().records.iter().filter(|r| !r.is_read).count()
    }

    /// Marks one record read. Returns false if no record has that id.
    pub fn mark_as_read(&self, id: &str) -> bool {
        let mut state = self.lock();
        let Some(record) = state.records.iter_mut().find(|r| r.id == id) else {
            return false;
        };
        if !record.is_read {
            record.is_read = true;
            state.persist();
        }
        true
    }

    /// Marks every record read.
    pub fn mark_all_as_read(&self) {
        let mut state = self.lock();
        if state.records.iter().all(|r| r.is_read) {
            return;
        }
        for record in &mut state.records {
            record.is_read = true;
        }
        state.persist();
    }

    fn insert_if_absent(&self, record: NotificationRecord) -> bool {
        let mut state = self.lock();
        if state.records.iter().any(|r| r.id == record.id) {
            return false;
        }
        state.records.insert(0, record);
        state.persist();
        true
    }
}

/// The writer side of the list, fed by the client.
#[derive(Clone)]
pub struct NotificationSink {
    list: NotificationList,
}

impl NotificationSink {
    pub fn new(list: NotificationList) -> Self {
        NotificationSink { list }
    }

    pub fn list(&self) -> &NotificationList {
        &self.list
    }
}

impl NotificationPort for NotificationSink {
    fn ingest(&self, notification: &Notification) -> bool {
        let added = self
            .list
            .insert_if_absent(NotificationRecord::from(notification));
        if added {
            debug!(id = %notification.id, "notification stored");
        } else {
            debug!(id = %notification.id, "duplicate notification ignored");
        }
        added
    }
}

#[cfg(test)]
#[path = "sink_tests.rs"]
mod tests;
