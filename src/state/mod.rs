//! State management module
//!
//! The timer state machine, its configuration, and the shared application
//! state that owns both.

pub mod app_state;
pub mod session_config;
pub mod timer_state;

// Re-export main types
pub use app_state::AppState;
pub use session_config::{FieldInput, SessionConfig, SessionConfigInput};
pub use timer_state::{Effect, TimerEngine, TimerMode, TimerSnapshot, TimerState, TimerStatus};
