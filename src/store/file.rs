//! File-backed store: one JSON payload per key under a data directory

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::TimerStore;
use crate::state::{snapshot, TimerSnapshot};

/// Store writing each key's payload to `<dir>/<key>.json`.
///
/// Writes go through a temp file and rename so a crash mid-write leaves the
/// previous payload intact rather than a torn one.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys are caller-supplied strings; flatten anything that would
        // escape the data directory into a plain file name.
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
            .collect();
        self.dir.join(format!("{}.json", name))
    }

    fn write_atomic(&self, path: &Path, payload: &str) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, payload)?;
        fs::rename(&tmp, path)
    }
}

impl TimerStore for FileStore {
    fn load(&self, key: &str) -> TimerSnapshot {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(payload) => snapshot::decode(&payload),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No persisted timer at {}", path.display());
                TimerSnapshot::empty()
            }
            Err(e) => {
                warn!("Failed to read timer payload {}: {}", path.display(), e);
                TimerSnapshot::empty()
            }
        }
    }

    fn save(&self, key: &str, snapshot_value: &TimerSnapshot) {
        let path = self.path_for(key);
        let payload = snapshot::encode(snapshot_value);
        if let Err(e) = self.write_atomic(&path, &payload) {
            warn!("Failed to persist timer to {}: {}", path.display(), e);
        }
    }

    fn clear(&self, key: &str) {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to clear timer payload {}: {}", path.display(), e),
        }
    }
}
