//! Quiz countdown state machine
//!
//! States: Idle (total budget 0) -> Running -> Paused <-> Running -> Expired
//! (remaining hits 0) or Stopped (explicit stop). Idle and post-reset are the
//! same state. Wall-clock time while paused or hidden is never deducted; only
//! delivered ticks count against the budget.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use super::snapshot::{clamp_seconds, TimerSnapshot};
use crate::store::TimerStore;

/// Input to the state machine. The caller stamps `now`; the machine itself
/// never reads the clock, which keeps transitions deterministic under test.
#[derive(Debug, Clone)]
pub enum TimerEvent {
    Start {
        total_seconds: f64,
        attempt_id: Option<String>,
    },
    Tick,
    Pause,
    Resume,
    Stop,
    Reset,
    Visibility { visible: bool },
    Unload,
}

/// What a delivered event did to the snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The event was a no-op in the current state
    Unchanged,
    /// The snapshot changed without completing the countdown
    Updated,
    /// The countdown reached zero on this event; expiry must be signaled
    /// exactly once, after the new snapshot is observable
    Expired,
}

/// The countdown state machine plus its durability sink.
///
/// Every mutation persists the new snapshot (best-effort) before returning,
/// so a cold start restores the latest committed state. The persisted copy is
/// a cache, never a source of truth for a live session.
pub struct QuizTimer {
    key: String,
    store: Arc<dyn TimerStore>,
    snapshot: TimerSnapshot,
}

impl std::fmt::Debug for QuizTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuizTimer")
            .field("key", &self.key)
            .field("snapshot", &self.snapshot)
            .finish_non_exhaustive()
    }
}

impl QuizTimer {
    /// Restore a timer from the store, or begin idle if nothing usable is
    /// persisted under `key`
    pub fn restore(store: Arc<dyn TimerStore>, key: impl Into<String>) -> Self {
        let key = key.into();
        let snapshot = store.load(&key);
        if !snapshot.is_idle() {
            info!(
                "Restored timer for attempt {:?}: {}s of {}s remaining",
                snapshot.attempt_id, snapshot.remaining_seconds, snapshot.total_seconds
            );
        }
        Self { key, store, snapshot }
    }

    pub fn snapshot(&self) -> &TimerSnapshot {
        &self.snapshot
    }

    pub fn time_taken_seconds(&self) -> u64 {
        self.snapshot.time_taken_seconds()
    }

    pub fn is_expired(&self) -> bool {
        self.snapshot.is_expired()
    }

    /// Apply one event at the given instant, persist the result, and report
    /// what happened
    pub fn apply(&mut self, event: TimerEvent, now: DateTime<Utc>) -> Transition {
        let transition = match event {
            TimerEvent::Start {
                total_seconds,
                attempt_id,
            } => self.start(total_seconds, attempt_id, now),
            TimerEvent::Tick => self.tick(now),
            TimerEvent::Pause => self.pause(now),
            TimerEvent::Resume => self.resume(),
            TimerEvent::Stop => self.stop(now),
            TimerEvent::Reset => {
                self.snapshot = TimerSnapshot::empty();
                self.store.clear(&self.key);
                return Transition::Updated;
            }
            TimerEvent::Visibility { visible } => {
                if visible {
                    self.resume()
                } else {
                    self.pause(now)
                }
            }
            TimerEvent::Unload => self.unload(now),
        };

        if transition != Transition::Unchanged {
            self.store.save(&self.key, &self.snapshot);
        }
        transition
    }

    /// Begin a fresh attempt, discarding any prior in-flight one.
    ///
    /// The budget is floored and clamped to a non-negative integer; a budget
    /// that normalizes to zero resets to idle rather than producing a timer
    /// that is born expired.
    fn start(
        &mut self,
        total_seconds: f64,
        attempt_id: Option<String>,
        now: DateTime<Utc>,
    ) -> Transition {
        let budget = clamp_seconds(total_seconds);
        if budget == 0 {
            debug!("start with empty budget, resetting to idle");
            self.snapshot = TimerSnapshot::empty();
            return Transition::Updated;
        }

        let attempt_id = attempt_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        info!("Starting attempt {} with {}s budget", attempt_id, budget);
        self.snapshot = TimerSnapshot {
            attempt_id: Some(attempt_id),
            total_seconds: budget,
            remaining_seconds: budget,
            started_at: Some(now),
            last_paused_at: None,
            is_running: true,
            completed_at: None,
        };
        Transition::Updated
    }

    /// One delivered one-second decrement. No-op unless running with time
    /// left; reaching zero completes the attempt.
    fn tick(&mut self, now: DateTime<Utc>) -> Transition {
        if !self.snapshot.is_running || self.snapshot.remaining_seconds == 0 {
            return Transition::Unchanged;
        }

        self.snapshot.remaining_seconds -= 1;
        if self.snapshot.remaining_seconds == 0 {
            info!(
                "Timer expired for attempt {:?} after {}s",
                self.snapshot.attempt_id, self.snapshot.total_seconds
            );
            self.snapshot.is_running = false;
            self.snapshot.completed_at = Some(now);
            Transition::Expired
        } else {
            Transition::Updated
        }
    }

    fn pause(&mut self, now: DateTime<Utc>) -> Transition {
        if !self.snapshot.is_running {
            return Transition::Unchanged;
        }
        self.snapshot.is_running = false;
        self.snapshot.last_paused_at = Some(now);
        Transition::Updated
    }

    fn resume(&mut self) -> Transition {
        // An expired or stopped timer (remaining 0) can never resume
        if self.snapshot.is_running || self.snapshot.remaining_seconds == 0 {
            return Transition::Unchanged;
        }
        self.snapshot.is_running = true;
        self.snapshot.last_paused_at = None;
        Transition::Updated
    }

    /// Force completion without signaling expiry. The completion marker is
    /// idempotent: it is stamped only if unset.
    fn stop(&mut self, now: DateTime<Utc>) -> Transition {
        let was_settled = !self.snapshot.is_running
            && self.snapshot.remaining_seconds == 0
            && self.snapshot.completed_at.is_some();
        if was_settled {
            return Transition::Unchanged;
        }

        self.snapshot.is_running = false;
        self.snapshot.remaining_seconds = 0;
        if self.snapshot.completed_at.is_none() {
            self.snapshot.completed_at = Some(now);
        }
        Transition::Updated
    }

    /// Host shutdown: park a running timer so a restart never resurrects a
    /// countdown whose clock silently advanced while unloaded
    fn unload(&mut self, now: DateTime<Utc>) -> Transition {
        if !self.snapshot.is_running {
            // Persist as-is so the latest state is on disk at exit
            self.store.save(&self.key, &self.snapshot);
            return Transition::Unchanged;
        }
        self.pause(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap()
    }

    fn timer() -> (QuizTimer, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let timer = QuizTimer::restore(store.clone() as Arc<dyn TimerStore>, "quiz");
        (timer, store)
    }

    fn tick_n(timer: &mut QuizTimer, n: u64) -> usize {
        let mut expiries = 0;
        for _ in 0..n {
            if timer.apply(TimerEvent::Tick, now()) == Transition::Expired {
                expiries += 1;
            }
        }
        expiries
    }

    #[test]
    fn full_countdown_expires_exactly_once() {
        let (mut timer, _) = timer();
        timer.apply(
            TimerEvent::Start { total_seconds: 5.0, attempt_id: None },
            now(),
        );

        let expiries = tick_n(&mut timer, 5);
        assert_eq!(expiries, 1);
        assert_eq!(timer.snapshot().remaining_seconds, 0);
        assert!(!timer.snapshot().is_running);
        assert!(timer.snapshot().completed_at.is_some());

        // Ticks past zero stay silent
        assert_eq!(tick_n(&mut timer, 3), 0);
        assert_eq!(timer.snapshot().remaining_seconds, 0);
    }

    #[test]
    fn start_assigns_attempt_id_when_absent() {
        let (mut timer, _) = timer();
        timer.apply(
            TimerEvent::Start { total_seconds: 10.0, attempt_id: None },
            now(),
        );
        assert!(timer.snapshot().attempt_id.is_some());

        timer.apply(
            TimerEvent::Start {
                total_seconds: 10.0,
                attempt_id: Some("attempt-A".into()),
            },
            now(),
        );
        assert_eq!(timer.snapshot().attempt_id.as_deref(), Some("attempt-A"));
    }

    #[test]
    fn start_discards_the_prior_attempt() {
        let (mut timer, _) = timer();
        timer.apply(
            TimerEvent::Start { total_seconds: 30.0, attempt_id: Some("a1".into()) },
            now(),
        );
        tick_n(&mut timer, 30);
        assert!(timer.snapshot().completed_at.is_some());

        timer.apply(
            TimerEvent::Start { total_seconds: 20.0, attempt_id: Some("a2".into()) },
            now(),
        );
        let s = timer.snapshot();
        assert_eq!(s.attempt_id.as_deref(), Some("a2"));
        assert_eq!(s.remaining_seconds, 20);
        assert!(s.is_running);
        assert!(s.completed_at.is_none());
        assert!(s.last_paused_at.is_none());
    }

    #[test]
    fn start_zero_yields_idle_not_expired() {
        let (mut timer, _) = timer();
        timer.apply(
            TimerEvent::Start { total_seconds: 0.0, attempt_id: None },
            now(),
        );
        let s = timer.snapshot();
        assert_eq!(*s, TimerSnapshot::empty());
        assert!(!s.is_expired());
    }

    #[test]
    fn start_input_is_normalized() {
        let (mut timer, _) = timer();

        timer.apply(
            TimerEvent::Start { total_seconds: 5.9, attempt_id: None },
            now(),
        );
        assert_eq!(timer.snapshot().total_seconds, 5);

        for bad in [-30.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            timer.apply(
                TimerEvent::Start { total_seconds: bad, attempt_id: None },
                now(),
            );
            assert_eq!(*timer.snapshot(), TimerSnapshot::empty());
        }
    }

    #[test]
    fn pause_is_idempotent() {
        let (mut timer, _) = timer();
        timer.apply(
            TimerEvent::Start { total_seconds: 60.0, attempt_id: None },
            now(),
        );

        assert_eq!(timer.apply(TimerEvent::Pause, now()), Transition::Updated);
        let after_first = timer.snapshot().clone();
        assert_eq!(timer.apply(TimerEvent::Pause, now()), Transition::Unchanged);
        assert_eq!(*timer.snapshot(), after_first);
    }

    #[test]
    fn resume_cannot_revive_an_expired_timer() {
        let (mut timer, _) = timer();
        timer.apply(
            TimerEvent::Start { total_seconds: 2.0, attempt_id: None },
            now(),
        );
        tick_n(&mut timer, 2);

        assert_eq!(timer.apply(TimerEvent::Resume, now()), Transition::Unchanged);
        assert!(!timer.snapshot().is_running);
    }

    #[test]
    fn pause_resume_full_scenario() {
        let (mut timer, _) = timer();
        timer.apply(
            TimerEvent::Start { total_seconds: 90.0, attempt_id: None },
            now(),
        );
        assert_eq!(tick_n(&mut timer, 30), 0);

        timer.apply(TimerEvent::Pause, now());
        // Ticks while paused must not be deducted
        assert_eq!(tick_n(&mut timer, 10), 0);
        assert_eq!(timer.snapshot().remaining_seconds, 60);

        timer.apply(TimerEvent::Resume, now());
        assert!(timer.snapshot().last_paused_at.is_none());

        let expiries = tick_n(&mut timer, 60);
        assert_eq!(expiries, 1);
        assert_eq!(timer.snapshot().remaining_seconds, 0);
        assert!(timer.snapshot().completed_at.is_some());
        assert_eq!(timer.time_taken_seconds(), 90);
    }

    #[test]
    fn hidden_page_does_not_consume_budget() {
        let (mut timer, _) = timer();
        timer.apply(
            TimerEvent::Start {
                total_seconds: 10.0,
                attempt_id: Some("attempt-A".into()),
            },
            now(),
        );

        timer.apply(TimerEvent::Visibility { visible: false }, now());
        assert!(!timer.snapshot().is_running);
        assert!(timer.snapshot().last_paused_at.is_some());
        // Wall-clock seconds elapse with no ticks delivered

        timer.apply(TimerEvent::Visibility { visible: true }, now());
        assert!(timer.snapshot().is_running);

        assert_eq!(tick_n(&mut timer, 10), 1);
        assert_eq!(timer.snapshot().remaining_seconds, 0);
    }

    #[test]
    fn visibility_return_also_resumes_a_manual_pause() {
        // Faithful quirk: manual and visibility pauses share one
        // representation, so becoming visible re-arms either.
        let (mut timer, _) = timer();
        timer.apply(
            TimerEvent::Start { total_seconds: 60.0, attempt_id: None },
            now(),
        );
        timer.apply(TimerEvent::Pause, now());
        timer.apply(TimerEvent::Visibility { visible: true }, now());
        assert!(timer.snapshot().is_running);
    }

    #[test]
    fn visibility_does_not_start_an_idle_timer() {
        let (mut timer, _) = timer();
        assert_eq!(
            timer.apply(TimerEvent::Visibility { visible: true }, now()),
            Transition::Unchanged
        );
        assert_eq!(*timer.snapshot(), TimerSnapshot::empty());
    }

    #[test]
    fn stop_completes_without_expiry_signal() {
        let (mut timer, _) = timer();
        timer.apply(
            TimerEvent::Start { total_seconds: 60.0, attempt_id: None },
            now(),
        );
        tick_n(&mut timer, 10);

        assert_eq!(timer.apply(TimerEvent::Stop, now()), Transition::Updated);
        let s = timer.snapshot().clone();
        assert!(!s.is_running);
        assert_eq!(s.remaining_seconds, 0);
        let completed_at = s.completed_at.expect("stop stamps completion");

        // Second stop keeps the original completion timestamp
        let later = now() + chrono::Duration::seconds(30);
        timer.apply(TimerEvent::Stop, later);
        assert_eq!(timer.snapshot().completed_at, Some(completed_at));
    }

    #[test]
    fn reset_clears_memory_and_storage() {
        let (mut timer, store) = timer();
        timer.apply(
            TimerEvent::Start { total_seconds: 45.0, attempt_id: None },
            now(),
        );
        tick_n(&mut timer, 5);
        assert!(!store.is_empty());

        timer.apply(TimerEvent::Reset, now());
        assert_eq!(*timer.snapshot(), TimerSnapshot::empty());
        assert!(store.is_empty());
        assert_eq!(store.load("quiz"), TimerSnapshot::empty());
    }

    #[test]
    fn unload_parks_a_running_timer() {
        let (mut timer, store) = timer();
        timer.apply(
            TimerEvent::Start { total_seconds: 60.0, attempt_id: Some("a1".into()) },
            now(),
        );
        tick_n(&mut timer, 15);

        timer.apply(TimerEvent::Unload, now());
        assert!(!timer.snapshot().is_running);
        assert!(timer.snapshot().last_paused_at.is_some());

        let restored = QuizTimer::restore(store as Arc<dyn TimerStore>, "quiz");
        let s = restored.snapshot();
        assert!(!s.is_running);
        assert_eq!(s.remaining_seconds, 45);
        assert_eq!(s.attempt_id.as_deref(), Some("a1"));
    }

    #[test]
    fn every_mutation_is_persisted() {
        let (mut timer, store) = timer();
        timer.apply(
            TimerEvent::Start { total_seconds: 30.0, attempt_id: Some("a1".into()) },
            now(),
        );
        tick_n(&mut timer, 7);
        timer.apply(TimerEvent::Pause, now());

        let restored = QuizTimer::restore(store as Arc<dyn TimerStore>, "quiz");
        assert_eq!(restored.snapshot(), timer.snapshot());
        assert_eq!(restored.time_taken_seconds(), 7);
    }

    #[test]
    fn restore_from_cold_start_is_idle() {
        let (timer, _) = timer();
        assert_eq!(*timer.snapshot(), TimerSnapshot::empty());
        assert_eq!(timer.time_taken_seconds(), 0);
        assert!(!timer.is_expired());
    }
}
