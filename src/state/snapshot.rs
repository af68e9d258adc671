//! Timer snapshot structure and persisted payload codec

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Version tag written into every persisted payload. Payloads carrying a
/// different version are discarded on load.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete, serializable state of a quiz countdown timer at an instant
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub attempt_id: Option<String>,
    pub total_seconds: u64,
    pub remaining_seconds: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub last_paused_at: Option<DateTime<Utc>>,
    pub is_running: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TimerSnapshot {
    /// Create the canonical empty snapshot
    pub fn empty() -> Self {
        Self::default()
    }

    /// Check if this snapshot is in the idle (never started / reset) state
    pub fn is_idle(&self) -> bool {
        self.total_seconds == 0
    }

    /// Whether the countdown ran its budget down to zero
    pub fn is_expired(&self) -> bool {
        self.total_seconds > 0 && self.remaining_seconds == 0
    }

    /// Seconds consumed so far, or 0 if the timer was never started
    pub fn time_taken_seconds(&self) -> u64 {
        if self.started_at.is_some() {
            self.total_seconds.saturating_sub(self.remaining_seconds)
        } else {
            0
        }
    }
}

/// On-disk shape: the snapshot fields plus the schema version tag.
///
/// Numeric fields are read as `f64` so payloads hand-edited or written by an
/// older client (fractional or negative values) still parse; they are floored
/// and clamped during sanitization rather than rejected.
#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(default)]
struct PersistedSnapshot {
    version: u32,
    attempt_id: Option<String>,
    total_seconds: f64,
    remaining_seconds: f64,
    started_at: Option<DateTime<Utc>>,
    last_paused_at: Option<DateTime<Utc>>,
    is_running: bool,
    completed_at: Option<DateTime<Utc>>,
}

/// Serialize a snapshot to its persisted JSON payload
pub fn encode(snapshot: &TimerSnapshot) -> String {
    let persisted = PersistedSnapshot {
        version: SCHEMA_VERSION,
        attempt_id: snapshot.attempt_id.clone(),
        total_seconds: snapshot.total_seconds as f64,
        remaining_seconds: snapshot.remaining_seconds as f64,
        started_at: snapshot.started_at,
        last_paused_at: snapshot.last_paused_at,
        is_running: snapshot.is_running,
        completed_at: snapshot.completed_at,
    };
    // Serialization of a plain struct with no map keys cannot fail
    serde_json::to_string(&persisted).unwrap_or_else(|e| {
        warn!("Failed to encode timer snapshot: {}", e);
        String::from("{}")
    })
}

/// Parse a persisted payload back into a snapshot.
///
/// Never fails: a malformed payload or a schema version mismatch yields the
/// canonical empty snapshot, and out-of-range fields are clamped so a timer
/// can never be restored "running" with zero time left.
pub fn decode(payload: &str) -> TimerSnapshot {
    let persisted: PersistedSnapshot = match serde_json::from_str(payload) {
        Ok(p) => p,
        Err(e) => {
            warn!("Discarding corrupt timer payload: {}", e);
            return TimerSnapshot::empty();
        }
    };

    if persisted.version != SCHEMA_VERSION {
        warn!(
            "Discarding timer payload with schema version {} (expected {})",
            persisted.version, SCHEMA_VERSION
        );
        return TimerSnapshot::empty();
    }

    let total_seconds = clamp_seconds(persisted.total_seconds);
    let remaining_seconds = clamp_seconds(persisted.remaining_seconds).min(total_seconds);

    TimerSnapshot {
        attempt_id: persisted.attempt_id,
        total_seconds,
        remaining_seconds,
        started_at: persisted.started_at,
        last_paused_at: persisted.last_paused_at,
        is_running: persisted.is_running && remaining_seconds > 0,
        completed_at: persisted.completed_at,
    }
}

/// Floor to an integer and clamp to a non-negative count of seconds
pub fn clamp_seconds(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.floor() as u64
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_preserves_fields() {
        let snapshot = TimerSnapshot {
            attempt_id: Some("attempt-A".to_string()),
            total_seconds: 90,
            remaining_seconds: 30,
            started_at: Some(Utc::now()),
            last_paused_at: None,
            is_running: true,
            completed_at: None,
        };

        assert_eq!(decode(&encode(&snapshot)), snapshot);
    }

    #[test]
    fn corrupt_payload_yields_empty_snapshot() {
        assert_eq!(decode("not json at all"), TimerSnapshot::empty());
        assert_eq!(decode("{\"version\": \"nope\"}"), TimerSnapshot::empty());
        assert_eq!(decode(""), TimerSnapshot::empty());
    }

    #[test]
    fn version_mismatch_yields_empty_snapshot() {
        let payload = r#"{"version":99,"total_seconds":60,"remaining_seconds":60,"is_running":true}"#;
        assert_eq!(decode(payload), TimerSnapshot::empty());
    }

    #[test]
    fn restored_running_with_zero_remaining_is_coerced_stopped() {
        let payload = r#"{"version":1,"total_seconds":60,"remaining_seconds":0,"is_running":true}"#;
        let snapshot = decode(payload);
        assert!(!snapshot.is_running);
        assert_eq!(snapshot.remaining_seconds, 0);
        assert!(snapshot.is_expired());
    }

    #[test]
    fn out_of_range_fields_are_clamped_on_load() {
        let payload =
            r#"{"version":1,"total_seconds":-5,"remaining_seconds":12.7,"is_running":true}"#;
        let snapshot = decode(payload);
        assert_eq!(snapshot.total_seconds, 0);
        // remaining can never exceed the total budget
        assert_eq!(snapshot.remaining_seconds, 0);
        assert!(!snapshot.is_running);
    }

    #[test]
    fn remaining_is_capped_by_total() {
        let payload =
            r#"{"version":1,"total_seconds":10,"remaining_seconds":500,"is_running":true}"#;
        let snapshot = decode(payload);
        assert_eq!(snapshot.total_seconds, 10);
        assert_eq!(snapshot.remaining_seconds, 10);
        assert!(snapshot.is_running);
    }

    #[test]
    fn time_taken_is_zero_before_first_start() {
        let snapshot = TimerSnapshot::empty();
        assert_eq!(snapshot.time_taken_seconds(), 0);
        assert!(!snapshot.is_expired());
    }
}
