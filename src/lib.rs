//! Simple Pomodoro - A Pomodoro timer server with a persistent work log
//!
//! This library provides the work/rest timer state machine, the 1 Hz tick task
//! that drives it, a work log of finished sessions, and monthly statistics
//! over that log, all exposed through an HTTP API.

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use error::{AppError, EngineError, StoreError};
pub use state::{AppState, SessionConfig, TimerEngine};
pub use utils::signals::shutdown_signal;
