//! Background tasks module
//!
//! This module contains background tasks that run alongside the HTTP server.

pub mod phase_watcher;
pub mod ticker;

pub use phase_watcher::{describe_change, phase_watcher_task};
pub use ticker::{tick_task, Ticker, TICK_PERIOD};
