//! Main application state management

use std::{
    sync::{Arc, Mutex},
    time::Instant,
};

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use super::{QuizTimer, TimerEvent, TimerSnapshot, Transition};
use crate::store::TimerStore;

/// Shared state wrapping the timer state machine for the HTTP surface.
///
/// All mutations lock the timer, apply one event, drop the lock, and only
/// then notify observers. Expiry is broadcast after the snapshot update is
/// visible on the watch channel, so no observer ever sees the notification
/// before the completed state.
#[derive(Debug)]
pub struct AppState {
    timer: Arc<Mutex<QuizTimer>>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Arc<Mutex<Option<String>>>,
    pub last_action_time: Arc<Mutex<Option<DateTime<Utc>>>>,
    /// Snapshot published after every state change
    pub snapshot_tx: watch::Sender<TimerSnapshot>,
    /// Attempt id of each completed countdown, sent exactly once per expiry
    pub expiry_tx: broadcast::Sender<Option<String>>,
    /// Keep the receiver alive to prevent channel closure
    _snapshot_rx: watch::Receiver<TimerSnapshot>,
}

impl AppState {
    /// Create the application state, restoring any persisted timer
    pub fn new(port: u16, host: String, store: Arc<dyn TimerStore>, key: String) -> Self {
        let timer = QuizTimer::restore(store, key);
        let (snapshot_tx, snapshot_rx) = watch::channel(timer.snapshot().clone());
        let (expiry_tx, _) = broadcast::channel(16);

        Self {
            timer: Arc::new(Mutex::new(timer)),
            start_time: Instant::now(),
            port,
            host,
            last_action: Arc::new(Mutex::new(None)),
            last_action_time: Arc::new(Mutex::new(None)),
            snapshot_tx,
            expiry_tx,
            _snapshot_rx: snapshot_rx,
        }
    }

    /// Apply one timer event, publish the new snapshot, then broadcast
    /// expiry if the countdown completed on this event
    fn apply(&self, action: &str, event: TimerEvent) -> Result<TimerSnapshot, String> {
        let mut timer = self
            .timer
            .lock()
            .map_err(|e| format!("Failed to lock timer state: {}", e))?;

        let transition = timer.apply(event, Utc::now());
        let snapshot = timer.snapshot().clone();
        drop(timer); // Release the lock before notifying

        // Update last action tracking
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }

        if transition != Transition::Unchanged {
            if let Err(e) = self.snapshot_tx.send(snapshot.clone()) {
                warn!("Failed to publish timer snapshot: {}", e);
            }
        }

        if transition == Transition::Expired {
            // No subscribers is normal when embedding without the HTTP layer
            if self.expiry_tx.send(snapshot.attempt_id.clone()).is_err() {
                debug!("Timer expired with no expiry subscribers");
            }
        }

        Ok(snapshot)
    }

    /// Start a fresh attempt, discarding any in-flight one
    pub fn start(
        &self,
        total_seconds: f64,
        attempt_id: Option<String>,
    ) -> Result<TimerSnapshot, String> {
        self.apply(
            "start",
            TimerEvent::Start {
                total_seconds,
                attempt_id,
            },
        )
    }

    /// Deliver one countdown tick (called by the countdown task)
    pub fn tick(&self) -> Result<TimerSnapshot, String> {
        self.apply("tick", TimerEvent::Tick)
    }

    pub fn pause(&self) -> Result<TimerSnapshot, String> {
        self.apply("pause", TimerEvent::Pause)
    }

    pub fn resume(&self) -> Result<TimerSnapshot, String> {
        self.apply("resume", TimerEvent::Resume)
    }

    pub fn stop(&self) -> Result<TimerSnapshot, String> {
        self.apply("stop", TimerEvent::Stop)
    }

    pub fn reset(&self) -> Result<TimerSnapshot, String> {
        self.apply("reset", TimerEvent::Reset)
    }

    /// Inject the page-visibility signal: hidden auto-pauses a running timer,
    /// visible auto-resumes a paused one with time left
    pub fn set_visibility(&self, visible: bool) -> Result<TimerSnapshot, String> {
        self.apply(
            if visible { "visible" } else { "hidden" },
            TimerEvent::Visibility { visible },
        )
    }

    /// Park the timer on host shutdown so a restart never resurrects a
    /// running countdown
    pub fn handle_unload(&self) -> Result<TimerSnapshot, String> {
        info!("Parking timer for shutdown");
        self.apply("unload", TimerEvent::Unload)
    }

    /// Get the current timer snapshot
    pub fn get_snapshot(&self) -> Result<TimerSnapshot, String> {
        self.timer
            .lock()
            .map(|timer| timer.snapshot().clone())
            .map_err(|e| format!("Failed to lock timer state: {}", e))
    }

    /// Seconds consumed by the current attempt
    pub fn time_taken_seconds(&self) -> Result<u64, String> {
        self.timer
            .lock()
            .map(|timer| timer.time_taken_seconds())
            .map_err(|e| format!("Failed to lock timer state: {}", e))
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }
}
