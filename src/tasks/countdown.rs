//! Countdown background task
//!
//! Owns the single 1-second tick interval. The interval exists only while the
//! published snapshot says the timer is running and is dropped on any
//! transition out of that state, so there is no scenario where two tick
//! sources race on the same snapshot.

use std::{sync::Arc, time::Duration};

use tracing::{debug, error, info};

use crate::state::AppState;

/// Background task delivering one tick per second while the timer runs
pub async fn countdown_task(state: Arc<AppState>) {
    info!("Starting countdown task");

    let mut snapshot_rx = state.snapshot_tx.subscribe();

    loop {
        // Park until the timer enters the running state
        while !snapshot_rx.borrow_and_update().is_running {
            if snapshot_rx.changed().await.is_err() {
                debug!("Snapshot channel closed, countdown task exiting");
                return;
            }
        }

        debug!("Timer running, arming 1-second tick interval");
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        // The first tick completes immediately; consume it so the first
        // decrement lands a full second after arming
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match state.tick() {
                        Ok(snapshot) => {
                            if !snapshot.is_running {
                                // Expired on this tick; expiry was already
                                // broadcast by the state layer
                                break;
                            }
                        }
                        Err(e) => {
                            error!("Failed to deliver tick: {}", e);
                            break;
                        }
                    }
                }
                changed = snapshot_rx.changed() => {
                    if changed.is_err() {
                        debug!("Snapshot channel closed, countdown task exiting");
                        return;
                    }
                    if !snapshot_rx.borrow_and_update().is_running {
                        debug!("Timer left the running state, cancelling tick interval");
                        break;
                    }
                }
            }
        }
        // The interval is dropped here, so at most one tick registration is
        // ever active regardless of how many times start/resume are called
    }
}
