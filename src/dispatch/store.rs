use dashmap::DashMap;

use crate::models::StoredState;

/// Key prefix for per-session state entries.
pub const SESSION_KEY_PREFIX: &str = "ws:";

/// Store key for a session id.
pub fn session_key(session_id: &str) -> String {
    format!("{SESSION_KEY_PREFIX}{session_id}")
}

/// Shared key-value store holding the last message seen per connection.
///
/// Behind a trait so the in-process map can be swapped for an addressable
/// remote store when routing scales across server processes: a socket
/// stays pinned to its process, its last-known state does not.
pub trait StateStore: Send + Sync {
    /// Overwrite the stored state for a key.
    fn set(&self, key: &str, state: StoredState);
    fn get(&self, key: &str) -> Option<StoredState>;
    /// Remove the entry if present. Missing keys are not an error.
    fn delete(&self, key: &str);
    /// Snapshot of all entries under a key prefix. This is a linear scan,
    /// not an indexed lookup: cost grows with the total number of
    /// connected sessions.
    fn scan_by_prefix(&self, prefix: &str) -> Vec<(String, StoredState)>;
}

/// In-process store over a concurrent map.
#[derive(Default)]
pub struct MemoryStateStore {
    entries: DashMap<String, StoredState>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStateStore {
    fn set(&self, key: &str, state: StoredState) {
        self.entries.insert(key.to_owned(), state);
    }

    fn get(&self, key: &str) -> Option<StoredState> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn delete(&self, key: &str) {
        self.entries.remove(key);
    }

    fn scan_by_prefix(&self, prefix: &str) -> Vec<(String, StoredState)> {
        self.entries
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }
}
