//! Logs phase changes published by the timer

use tokio::sync::watch;
use tracing::{info, warn};

use crate::state::{TimerMode, TimerSnapshot, TimerStatus};

/// Describe what changed between two snapshots, ignoring plain countdown ticks
pub fn describe_change(previous: &TimerSnapshot, current: &TimerSnapshot) -> Option<String> {
    let (before, after) = (&previous.state, &current.state);

    if before.status != after.status {
        return Some(match after.status {
            TimerStatus::Finished => format!(
                "Session finished with {}s of work",
                after.accumulated_work_seconds
            ),
            status => format!("Timer {}", status),
        });
    }

    if before.mode != after.mode || before.current_loop != after.current_loop {
        let phase = match after.mode {
            TimerMode::Work => "work",
            TimerMode::Rest => "rest",
        };
        return Some(format!(
            "Loop {}/{}: {} phase for {}s",
            after.current_loop,
            current.config.target_loops,
            phase,
            after.total_phase_seconds
        ));
    }

    None
}

/// Follow the snapshot channel until it closes, logging each phase change
pub async fn phase_watcher_task(mut rx: watch::Receiver<TimerSnapshot>) {
    info!("Starting phase watcher task");
    let mut previous = rx.borrow_and_update().clone();

    while rx.changed().await.is_ok() {
        let current = rx.borrow_and_update().clone();
        if let Some(change) = describe_change(&previous, &current) {
            info!("{}", change);
        }
        previous = current;
    }

    warn!("Timer update channel closed, phase watcher stopping");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{SessionConfig, TimerEngine};

    #[test]
    fn test_plain_tick_is_not_reported() {
        let mut engine = TimerEngine::new(SessionConfig::default());
        engine.start().unwrap();
        let before = engine.snapshot();
        engine.tick().unwrap();

        assert_eq!(describe_change(&before, &engine.snapshot()), None);
    }

    #[test]
    fn test_phase_and_status_changes_are_reported() {
        let mut engine = TimerEngine::new(SessionConfig::new(2, 25, 5, 15, false));
        let idle = engine.snapshot();
        engine.start().unwrap();
        let running = engine.snapshot();
        assert_eq!(describe_change(&idle, &running).as_deref(), Some("Timer running"));

        engine.skip().unwrap();
        let rest = engine.snapshot();
        assert_eq!(
            describe_change(&running, &rest).as_deref(),
            Some("Loop 1/2: rest phase for 300s")
        );

        engine.finish().unwrap();
        assert_eq!(
            describe_change(&rest, &engine.snapshot()).as_deref(),
            Some("Session finished with 0s of work")
        );
    }
}
