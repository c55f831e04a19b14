//! Cancellable 1 Hz tick task driving the timer engine

use std::{sync::Arc, time::Duration};

use tokio::{
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::{debug, error};

use crate::state::AppState;

/// Logical length of one timer second
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Handle to the single running tick task.
///
/// The epoch identifies this task to `AppState::tick`; once a ticker has been
/// replaced or cancelled its epoch no longer matches and its ticks are ignored,
/// even one that was already waiting on the session lock.
#[derive(Debug)]
pub struct Ticker {
    epoch: u64,
    handle: JoinHandle<()>,
}

impl Ticker {
    /// Spawn a new tick task on the current tokio runtime
    pub fn spawn(state: Arc<AppState>, epoch: u64) -> Self {
        debug!("Spawning ticker #{}", epoch);
        let handle = tokio::spawn(tick_task(state, epoch, TICK_PERIOD));
        Self { epoch, handle }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Stop the task. Safe to call from inside the task itself.
    pub fn cancel(self) {
        debug!("Cancelling ticker #{}", self.epoch);
        self.handle.abort();
    }
}

/// Tick once per `period` until the state rejects this ticker's epoch
pub async fn tick_task(state: Arc<AppState>, epoch: u64, period: Duration) {
    // The first tick lands one full period after start, not immediately.
    let mut interval = interval_at(Instant::now() + period, period);
    // No catch-up burst after a stall; the countdown is a logical counter.
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        match state.tick(epoch) {
            Ok(true) => {}
            Ok(false) => {
                debug!("Ticker #{} is no longer current, stopping", epoch);
                break;
            }
            Err(e) => {
                error!("Ticker #{} failed: {}", epoch, e);
                break;
            }
        }
    }
}
