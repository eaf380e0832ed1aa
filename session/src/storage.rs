//! Key/value storage capability.
//!
//! SYSTEM CONTEXT
//! ==============
//! In the browser this is `localStorage`; during server rendering or in a
//! headless process there is no such thing. Callers pick an implementation at
//! startup instead of checking the environment at every read.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 64;

/// String key/value store shared by everything running in one origin.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// Change notification, the in-process analogue of a browser `storage` event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    /// `None` when the key was removed.
    pub new_value: Option<String>,
}

/// In-memory storage. Clones share the same map and event stream.
#[derive(Clone)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
    events: broadcast::Sender<StorageEvent>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { entries: Arc::new(Mutex::new(HashMap::new())), events }
    }

    /// Receive every subsequent write and removal.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn emit(&self, key: &str, new_value: Option<String>) {
        if self.events.receiver_count() == 0 {
            return;
        }
        if let Err(err) = self.events.send(StorageEvent { key: key.to_owned(), new_value }) {
            tracing::trace!(key = %err.0.key, "storage event dropped");
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
        self.emit(key, Some(value.to_owned()));
    }

    fn remove(&self, key: &str) {
        let removed = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        if removed.is_some() {
            self.emit(key, None);
        }
    }
}

/// Storage for contexts without one. Reads are always empty.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopStorage;

impl Storage for NoopStorage {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn set(&self, _key: &str, _value: &str) {}

    fn remove(&self, _key: &str) {}
}

#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;
