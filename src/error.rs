//! Error types shared across the timer, the work log and the HTTP layer

use thiserror::Error;

use crate::state::TimerStatus;

/// Errors raised by the timer state machine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// An operation was called outside the states it is defined for
    #[error("cannot {operation} while timer is {status}")]
    InvalidStateTransition {
        operation: &'static str,
        status: TimerStatus,
    },
}

/// Errors raised by a work log store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("work log I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("work log is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Durations must be strictly positive whole seconds
    #[error("invalid duration: {0}")]
    InvalidDuration(String),

    #[error("work log lock poisoned")]
    Poisoned,
}

/// Top-level application error, mapped onto HTTP status codes by the API layer
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to lock {0}")]
    Poisoned(&'static str),

    #[error("bad request: {0}")]
    BadRequest(String),
}
