//! Persistence port for timer snapshots
//!
//! The in-memory state machine owns all transitions; a store is a durability
//! sink consulted only at cold start. Every implementation is infallible from
//! the caller's point of view: load failures degrade to the canonical empty
//! snapshot and write failures are logged and swallowed, so a broken store
//! never blocks the surrounding quiz flow.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::state::TimerSnapshot;

/// Key-value durability sink for timer snapshots.
///
/// The key namespaces the stored snapshot so independent timers (e.g. one per
/// quiz attempt type) do not collide.
pub trait TimerStore: Send + Sync {
    /// Load the snapshot stored under `key`.
    ///
    /// Never fails: a missing key, unreadable backend, corrupt payload, or
    /// schema version mismatch all return the canonical empty snapshot.
    fn load(&self, key: &str) -> TimerSnapshot;

    /// Persist `snapshot` under `key`, best-effort
    fn save(&self, key: &str, snapshot: &TimerSnapshot);

    /// Remove any snapshot stored under `key`, best-effort
    fn clear(&self, key: &str);
}
