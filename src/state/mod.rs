//! State management module
//!
//! This module contains the timer snapshot, the countdown state machine, and
//! the shared application state wrapping them for the HTTP surface.

pub mod app_state;
pub mod quiz_timer;
pub mod snapshot;

// Re-export main types
pub use app_state::AppState;
pub use quiz_timer::{QuizTimer, TimerEvent, Transition};
pub use snapshot::{TimerSnapshot, SCHEMA_VERSION};
