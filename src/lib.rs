//! Quiz Timer - A persisted, pausable countdown timer for quiz attempts
//!
//! This library provides a countdown state machine driving a quiz attempt's
//! time budget, with pluggable snapshot persistence, automatic pause/resume
//! on page-visibility signals, and an HTTP surface for hosting it.

pub mod api;
pub mod config;
pub mod state;
pub mod store;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use state::{AppState, QuizTimer, TimerEvent, TimerSnapshot};
pub use store::{FileStore, MemoryStore, TimerStore};
pub use utils::signals::shutdown_signal;
