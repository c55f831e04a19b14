//! Pomodoro timer state machine
//!
//! The engine never touches a clock. Every operation mutates the state in place
//! and returns the side effects the host has to carry out (schedule or cancel
//! the 1 Hz tick, hand a finished duration to the work log).
//!
//! ```text
//! Idle -> Running <-> Paused
//!            |          |
//!            +-> Finished <-+
//! Finished -> Idle (reset)
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::SessionConfig;
use crate::{error::EngineError, utils::format_clock};

/// The rest after every `LONG_REST_EVERY`-th loop is a long rest
pub const LONG_REST_EVERY: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    Idle,
    Running,
    Paused,
    Finished,
}

impl fmt::Display for TimerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimerStatus::Idle => "idle",
            TimerStatus::Running => "running",
            TimerStatus::Paused => "paused",
            TimerStatus::Finished => "finished",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    Work,
    Rest,
}

/// Side effects requested by a state transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Start the repeating 1 second tick
    ScheduleTick,
    /// Stop the repeating tick; no further tick may be applied
    CancelTick,
    /// Persist a finished session's worked seconds
    EmitLog { duration_seconds: u64 },
}

/// Mutable counters of the active session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub status: TimerStatus,
    pub mode: TimerMode,
    pub current_loop: u32,
    pub time_left_seconds: u64,
    pub total_phase_seconds: u64,
    pub accumulated_work_seconds: u64,
}

impl TimerState {
    /// Fresh idle state previewing the first work phase
    pub fn idle(config: &SessionConfig) -> Self {
        let preview = config.work_seconds();
        Self {
            status: TimerStatus::Idle,
            mode: TimerMode::Work,
            current_loop: 1,
            time_left_seconds: preview,
            total_phase_seconds: preview,
            accumulated_work_seconds: 0,
        }
    }

    fn set_phase(&mut self, mode: TimerMode, seconds: u64) {
        self.mode = mode;
        self.total_phase_seconds = seconds;
        self.time_left_seconds = seconds;
    }
}

/// Point-in-time view of the engine for clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    #[serde(flatten)]
    pub state: TimerState,
    pub config: SessionConfig,
    /// Fraction of the current phase already elapsed, `0.0..=1.0`
    pub progress: f64,
    /// True while a session is in progress
    pub locked: bool,
    pub time_left_label: String,
}

/// Pomodoro phase and loop sequencer
#[derive(Debug, Clone)]
pub struct TimerEngine {
    config: SessionConfig,
    state: TimerState,
}

impl TimerEngine {
    pub fn new(config: SessionConfig) -> Self {
        let config = config.clamped();
        Self {
            state: TimerState::idle(&config),
            config,
        }
    }

    // Queries

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn status(&self) -> TimerStatus {
        self.state.status
    }

    pub fn progress(&self) -> f64 {
        match self.state.status {
            TimerStatus::Idle => 0.0,
            TimerStatus::Finished => 1.0,
            _ if self.state.total_phase_seconds == 0 => 0.0,
            _ => 1.0 - self.state.time_left_seconds as f64 / self.state.total_phase_seconds as f64,
        }
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            state: self.state.clone(),
            config: self.config,
            progress: self.progress(),
            locked: matches!(self.state.status, TimerStatus::Running | TimerStatus::Paused),
            time_left_label: format_clock(self.state.time_left_seconds),
        }
    }

    // Commands

    /// Replace the configuration. Only allowed while idle.
    pub fn configure(&mut self, config: SessionConfig) -> Result<Vec<Effect>, EngineError> {
        self.require("configure", &[TimerStatus::Idle])?;
        self.config = config.clamped();
        self.refresh_preview();
        debug!("Timer configured: {:?}", self.config);
        Ok(Vec::new())
    }

    pub fn start(&mut self) -> Result<Vec<Effect>, EngineError> {
        self.require("start", &[TimerStatus::Idle])?;
        self.config = self.config.clamped();

        self.state.set_phase(TimerMode::Work, self.config.work_seconds());
        self.state.accumulated_work_seconds = 0;
        self.state.current_loop = 1;
        self.state.status = TimerStatus::Running;

        info!(
            "Session started: {} loops of {}min work / {}min rest",
            self.config.target_loops, self.config.work_minutes, self.config.rest_minutes
        );
        Ok(vec![Effect::ScheduleTick])
    }

    pub fn pause(&mut self) -> Result<Vec<Effect>, EngineError> {
        self.require("pause", &[TimerStatus::Running])?;
        self.state.status = TimerStatus::Paused;
        debug!("Timer paused with {}s left", self.state.time_left_seconds);
        Ok(vec![Effect::CancelTick])
    }

    pub fn resume(&mut self) -> Result<Vec<Effect>, EngineError> {
        self.require("resume", &[TimerStatus::Paused])?;
        self.state.status = TimerStatus::Running;
        debug!("Timer resumed with {}s left", self.state.time_left_seconds);
        Ok(vec![Effect::ScheduleTick])
    }

    /// Apply one logical second
    pub fn tick(&mut self) -> Result<Vec<Effect>, EngineError> {
        self.require("tick", &[TimerStatus::Running])?;

        self.state.time_left_seconds = self.state.time_left_seconds.saturating_sub(1);
        if self.state.mode == TimerMode::Work {
            self.state.accumulated_work_seconds += 1;
        }

        if self.state.time_left_seconds == 0 {
            Ok(self.advance_phase())
        } else {
            Ok(Vec::new())
        }
    }

    /// Jump to the next phase, discarding the rest of the current one
    pub fn skip(&mut self) -> Result<Vec<Effect>, EngineError> {
        self.require("skip", &[TimerStatus::Running, TimerStatus::Paused])?;
        debug!(
            "Skipping {:?} phase with {}s left",
            self.state.mode, self.state.time_left_seconds
        );
        Ok(self.advance_phase())
    }

    /// End the session early or after its final rest
    pub fn finish(&mut self) -> Result<Vec<Effect>, EngineError> {
        self.require("finish", &[TimerStatus::Running, TimerStatus::Paused])?;

        let mut effects = Vec::new();
        if self.state.status == TimerStatus::Running {
            effects.push(Effect::CancelTick);
        }
        self.state.status = TimerStatus::Finished;

        let worked = self.state.accumulated_work_seconds;
        info!("Session finished after {} loop(s), {}s worked", self.state.current_loop, worked);
        if worked > 0 {
            effects.push(Effect::EmitLog { duration_seconds: worked });
        }
        Ok(effects)
    }

    /// Discard the session and go back to idle. Accepted from any state.
    pub fn reset_to_idle(&mut self) -> Vec<Effect> {
        let was_running = self.state.status == TimerStatus::Running;
        self.state = TimerState::idle(&self.config);
        self.refresh_preview();

        if was_running {
            vec![Effect::CancelTick]
        } else {
            Vec::new()
        }
    }

    fn advance_phase(&mut self) -> Vec<Effect> {
        match self.state.mode {
            TimerMode::Work => {
                let long_break = self.config.supports_long_rest
                    && self.state.current_loop % LONG_REST_EVERY == 0;
                let seconds = if long_break {
                    self.config.long_rest_seconds()
                } else {
                    self.config.rest_seconds()
                };
                self.state.set_phase(TimerMode::Rest, seconds);
                debug!(
                    "Loop {} work done, {} rest for {}s",
                    self.state.current_loop,
                    if long_break { "long" } else { "short" },
                    seconds
                );
                Vec::new()
            }
            TimerMode::Rest if self.state.current_loop < self.config.target_loops => {
                self.state.current_loop += 1;
                self.state.set_phase(TimerMode::Work, self.config.work_seconds());
                debug!("Starting work loop {}", self.state.current_loop);
                Vec::new()
            }
            // Preconditions of finish hold: advance only happens while running or paused.
            TimerMode::Rest => self.finish().unwrap_or_default(),
        }
    }

    fn refresh_preview(&mut self) {
        let preview = match self.state.mode {
            TimerMode::Work => self.config.work_seconds(),
            TimerMode::Rest => self.config.rest_seconds(),
        };
        self.state.time_left_seconds = preview;
        self.state.total_phase_seconds = preview;
    }

    fn require(&self, operation: &'static str, allowed: &[TimerStatus]) -> Result<(), EngineError> {
        if allowed.contains(&self.state.status) {
            Ok(())
        } else {
            Err(EngineError::InvalidStateTransition {
                operation,
                status: self.state.status,
            })
        }
    }
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
