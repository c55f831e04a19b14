//! Utility functions module
//!
//! Formatting helpers and process signal handling.

pub mod format;
pub mod signals;

pub use format::{format_clock, format_duration};
pub use signals::shutdown_signal;
