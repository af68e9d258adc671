//! Utility functions module
//!
//! Signal handling for graceful shutdown, which also serves as the timer's
//! host-unload notification.

pub mod signals;

// Re-export main functions
pub use signals::shutdown_signal;
