//! Navigation capability.

use std::sync::{Mutex, PoisonError};

/// Moves the app to another path.
pub trait Navigator: Send + Sync {
    /// Replace the current location with `path_and_query`.
    fn navigate(&self, path_and_query: &str);
    /// The current location, if known.
    fn current(&self) -> Option<String>;
}

/// Navigator that only records where it was sent.
#[derive(Debug, Default)]
pub struct HistoryNavigator {
    history: Mutex<Vec<String>>,
}

impl HistoryNavigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every location visited, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Navigator for HistoryNavigator {
    fn navigate(&self, path_and_query: &str) {
        tracing::debug!(to = path_and_query, "navigate");
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path_and_query.to_owned());
    }

    fn current(&self) -> Option<String> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}
