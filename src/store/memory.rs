//! In-memory store for tests and embedding

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::warn;

use super::TimerStore;
use crate::state::{snapshot, TimerSnapshot};

/// Store keeping encoded payloads in a mutex-guarded map.
///
/// Payloads go through the same encode/decode path as the file store so
/// sanitization behaves identically across backends.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, for test assertions
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TimerStore for MemoryStore {
    fn load(&self, key: &str) -> TimerSnapshot {
        match self.entries.lock() {
            Ok(entries) => entries
                .get(key)
                .map(|payload| snapshot::decode(payload))
                .unwrap_or_else(TimerSnapshot::empty),
            Err(e) => {
                warn!("Failed to lock memory store for load: {}", e);
                TimerSnapshot::empty()
            }
        }
    }

    fn save(&self, key: &str, snapshot: &TimerSnapshot) {
        match self.entries.lock() {
            Ok(mut entries) => {
                entries.insert(key.to_string(), snapshot::encode(snapshot));
            }
            Err(e) => warn!("Failed to lock memory store for save: {}", e),
        }
    }

    fn clear(&self, key: &str) {
        match self.entries.lock() {
            Ok(mut entries) => {
                entries.remove(key);
            }
            Err(e) => warn!("Failed to lock memory store for clear: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_loads_empty() {
        let store = MemoryStore::new();
        assert_eq!(store.load("nope"), TimerSnapshot::empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let store = MemoryStore::new();
        let snapshot = TimerSnapshot {
            attempt_id: Some("a1".into()),
            total_seconds: 120,
            remaining_seconds: 45,
            is_running: true,
            ..TimerSnapshot::empty()
        };

        store.save("quiz", &snapshot);
        assert_eq!(store.load("quiz"), snapshot);
    }

    #[test]
    fn keys_are_independent() {
        let store = MemoryStore::new();
        let snapshot = TimerSnapshot {
            total_seconds: 10,
            remaining_seconds: 10,
            ..TimerSnapshot::empty()
        };

        store.save("practice", &snapshot);
        assert_eq!(store.load("exam"), TimerSnapshot::empty());
        assert_eq!(store.load("practice"), snapshot);
    }

    #[test]
    fn clear_removes_the_entry() {
        let store = MemoryStore::new();
        let snapshot = TimerSnapshot {
            total_seconds: 10,
            remaining_seconds: 5,
            ..TimerSnapshot::empty()
        };

        store.save("quiz", &snapshot);
        store.clear("quiz");
        assert!(store.is_empty());
        assert_eq!(store.load("quiz"), TimerSnapshot::empty());
    }
}
