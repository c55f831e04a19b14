//! Main application state management

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Instant,
};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{error, info, warn};

use super::{Effect, SessionConfig, SessionConfigInput, TimerEngine, TimerSnapshot};
use crate::{
    error::{AppError, EngineError},
    services::{LogEntry, WorkLogStore},
    tasks::Ticker,
    utils::format_duration,
};

/// Most recent errors kept for `GET /timer`
pub const MAX_ERRORS: usize = 20;

/// Everything guarded by the single session lock: the engine and its ticker
#[derive(Debug)]
struct Session {
    engine: TimerEngine,
    ticker: Option<Ticker>,
    next_epoch: u64,
}

impl Session {
    fn ticker_epoch(&self) -> Option<u64> {
        self.ticker.as_ref().map(Ticker::epoch)
    }
}

/// Shared state behind the HTTP handlers and the tick task
pub struct AppState {
    /// Timer engine and the tick task driving it
    session: Mutex<Session>,
    /// Destination for finished sessions
    store: Arc<dyn WorkLogStore>,
    /// Failures that happened outside a request, for client visibility
    errors: Mutex<Vec<String>>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    last_action: Mutex<Option<(String, DateTime<Utc>)>>,
    /// Channel for timer updates
    pub timer_update_tx: watch::Sender<TimerSnapshot>,
    /// Keep the receiver alive to prevent channel closure
    pub _timer_update_rx: watch::Receiver<TimerSnapshot>,
}

impl AppState {
    pub fn new(port: u16, host: String, config: SessionConfig, store: Arc<dyn WorkLogStore>) -> Self {
        let engine = TimerEngine::new(config);
        let (timer_update_tx, timer_update_rx) = watch::channel(engine.snapshot());

        Self {
            session: Mutex::new(Session {
                engine,
                ticker: None,
                next_epoch: 0,
            }),
            store,
            errors: Mutex::new(Vec::new()),
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
            timer_update_tx,
            _timer_update_rx: timer_update_rx,
        }
    }

    fn lock_session(&self) -> Result<MutexGuard<'_, Session>, AppError> {
        self.session.lock().map_err(|_| AppError::Poisoned("timer session"))
    }

    /// Run one engine operation under the session lock and carry out its effects
    fn transition<F>(self: &Arc<Self>, action: &str, op: F) -> Result<TimerSnapshot, AppError>
    where
        F: FnOnce(&mut TimerEngine) -> Result<Vec<Effect>, EngineError>,
    {
        let (snapshot, emissions) = {
            let mut session = self.lock_session()?;
            let effects = op(&mut session.engine).map_err(|e| {
                warn!("Rejected {}: {}", action, e);
                e
            })?;
            let emissions = self.apply_effects(&mut session, effects);
            let snapshot = session.engine.snapshot();
            // Publish under the lock so concurrent updates reach the channel in order.
            self.publish(&snapshot);
            (snapshot, emissions)
        };

        self.note_action(action);
        for duration_seconds in emissions {
            self.record_work(duration_seconds);
        }

        Ok(snapshot)
    }

    /// Schedule or cancel the ticker; hand back durations to persist once unlocked
    fn apply_effects(self: &Arc<Self>, session: &mut Session, effects: Vec<Effect>) -> Vec<u64> {
        let mut emissions = Vec::new();

        for effect in effects {
            match effect {
                Effect::ScheduleTick => {
                    if let Some(previous) = session.ticker.take() {
                        warn!("Replacing ticker #{} that was still active", previous.epoch());
                        previous.cancel();
                    }
                    session.next_epoch += 1;
                    session.ticker = Some(Ticker::spawn(Arc::clone(self), session.next_epoch));
                }
                Effect::CancelTick => {
                    if let Some(ticker) = session.ticker.take() {
                        ticker.cancel();
                    }
                }
                Effect::EmitLog { duration_seconds } => emissions.push(duration_seconds),
            }
        }

        emissions
    }

    /// Apply one tick on behalf of the ticker with `epoch`.
    ///
    /// Returns `Ok(false)` when that ticker is stale or was cancelled by this
    /// tick, telling the task to stop.
    pub fn tick(self: &Arc<Self>, epoch: u64) -> Result<bool, AppError> {
        let (emissions, still_current) = {
            let mut session = self.lock_session()?;
            if session.ticker_epoch() != Some(epoch) {
                return Ok(false);
            }

            let effects = session.engine.tick()?;
            let emissions = self.apply_effects(&mut session, effects);
            let still_current = session.ticker_epoch() == Some(epoch);
            self.publish(&session.engine.snapshot());
            (emissions, still_current)
        };

        for duration_seconds in emissions {
            self.record_work(duration_seconds);
        }

        Ok(still_current)
    }

    /// Update the session configuration from raw client input
    pub fn configure(self: &Arc<Self>, input: &SessionConfigInput) -> Result<TimerSnapshot, AppError> {
        self.transition("configure", |engine| {
            let config = engine.config().merged(input);
            engine.configure(config)
        })
    }

    pub fn start(self: &Arc<Self>) -> Result<TimerSnapshot, AppError> {
        self.transition("start", TimerEngine::start)
    }

    pub fn pause(self: &Arc<Self>) -> Result<TimerSnapshot, AppError> {
        self.transition("pause", TimerEngine::pause)
    }

    pub fn resume(self: &Arc<Self>) -> Result<TimerSnapshot, AppError> {
        self.transition("resume", TimerEngine::resume)
    }

    pub fn skip(self: &Arc<Self>) -> Result<TimerSnapshot, AppError> {
        self.transition("skip", TimerEngine::skip)
    }

    pub fn finish(self: &Arc<Self>) -> Result<TimerSnapshot, AppError> {
        self.transition("finish", TimerEngine::finish)
    }

    pub fn reset(self: &Arc<Self>) -> Result<TimerSnapshot, AppError> {
        self.transition("reset", |engine| Ok(engine.reset_to_idle()))
    }

    /// Get current timer snapshot
    pub fn snapshot(&self) -> Result<TimerSnapshot, AppError> {
        Ok(self.lock_session()?.engine.snapshot())
    }

    /// Subscribe to snapshots published on every transition and tick
    pub fn subscribe(&self) -> watch::Receiver<TimerSnapshot> {
        self.timer_update_tx.subscribe()
    }

    /// True while a tick task is attached to the session
    pub fn has_active_ticker(&self) -> Result<bool, AppError> {
        Ok(self.lock_session()?.ticker.is_some())
    }

    pub fn work_log(&self) -> Result<Vec<LogEntry>, AppError> {
        Ok(self.store.list()?)
    }

    /// Append an entry to the work log directly
    pub fn append_work(&self, duration_seconds: u64) -> Result<LogEntry, AppError> {
        let entry = self.store.append(duration_seconds, Utc::now())?;
        info!("Logged {} of work (entry #{})", format_duration(duration_seconds), entry.id);
        Ok(entry)
    }

    /// Persist a finished session. Failures are reported, never propagated,
    /// so the timer stays finished regardless.
    fn record_work(&self, duration_seconds: u64) {
        if let Err(e) = self.append_work(duration_seconds) {
            error!("Failed to log {}s of finished work: {}", duration_seconds, e);
            self.add_error(format!("Failed to save work log: {}", e));
        }
    }

    fn publish(&self, snapshot: &TimerSnapshot) {
        if let Err(e) = self.timer_update_tx.send(snapshot.clone()) {
            warn!("Failed to send timer update: {}", e);
        }
    }

    fn note_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some((action.to_string(), Utc::now()));
        }
    }

    /// Add an error to the state, dropping the oldest beyond `MAX_ERRORS`
    pub fn add_error(&self, error: String) {
        if let Ok(mut errors) = self.errors.lock() {
            errors.push(error);
            let excess = errors.len().saturating_sub(MAX_ERRORS);
            errors.drain(..excess);
        }
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        match self.last_action.lock().ok().and_then(|a| a.clone()) {
            Some((action, at)) => (Some(action), Some(at)),
            None => (None, None),
        }
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        format_duration(self.start_time.elapsed().as_secs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::StoreError,
        services::MemoryStore,
        state::{TimerMode, TimerStatus},
    };
    use std::time::Duration;
    use tokio::time::sleep;

    struct FailingStore;

    impl WorkLogStore for FailingStore {
        fn list(&self) -> Result<Vec<LogEntry>, StoreError> {
            Ok(Vec::new())
        }

        fn append(&self, _: u64, _: DateTime<Utc>) -> Result<LogEntry, StoreError> {
            Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "store unreachable",
            )))
        }
    }

    fn app(config: SessionConfig) -> (Arc<AppState>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let state = Arc::new(AppState::new(0, "127.0.0.1".to_string(), config, store.clone()));
        (state, store)
    }

    fn millis(ms: u64) -> Duration {
        Duration::from_millis(ms)
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_counts_down_once_per_second() {
        let (state, _) = app(SessionConfig::default());
        state.start().unwrap();

        sleep(millis(3_500)).await;
        let snapshot = state.snapshot().unwrap();
        assert_eq!(snapshot.state.time_left_seconds, 1497);
        assert_eq!(snapshot.state.accumulated_work_seconds, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_stops_ticking_and_resume_continues() {
        let (state, _) = app(SessionConfig::default());
        state.start().unwrap();
        sleep(millis(2_500)).await;

        state.pause().unwrap();
        assert!(!state.has_active_ticker().unwrap());
        sleep(millis(10_000)).await;
        assert_eq!(state.snapshot().unwrap().state.time_left_seconds, 1498);

        state.resume().unwrap();
        sleep(millis(1_500)).await;
        assert_eq!(state.snapshot().unwrap().state.accumulated_work_seconds, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_pause_resume_keeps_single_ticker() {
        let (state, _) = app(SessionConfig::default());
        state.start().unwrap();
        for _ in 0..5 {
            state.pause().unwrap();
            state.resume().unwrap();
        }

        sleep(millis(2_500)).await;
        assert_eq!(state.snapshot().unwrap().state.accumulated_work_seconds, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_epoch_is_ignored() {
        let (state, _) = app(SessionConfig::default());
        state.start().unwrap();

        assert!(!state.tick(999).unwrap());
        assert_eq!(state.snapshot().unwrap().state.time_left_seconds, 1500);
    }

    #[tokio::test(start_paused = true)]
    async fn test_completed_session_is_logged_once() {
        let (state, store) = app(SessionConfig::new(1, 1, 1, 1, false));
        state.start().unwrap();

        sleep(millis(60_500)).await;
        assert_eq!(state.snapshot().unwrap().state.mode, TimerMode::Rest);

        sleep(millis(60_000)).await;
        let snapshot = state.snapshot().unwrap();
        assert_eq!(snapshot.state.status, TimerStatus::Finished);
        assert!(!state.has_active_ticker().unwrap());

        sleep(millis(5_000)).await;
        let entries = store.list().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].duration_seconds, 60);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_finish_logs_worked_seconds() {
        let (state, store) = app(SessionConfig::default());
        state.start().unwrap();
        sleep(millis(5_500)).await;

        let snapshot = state.finish().unwrap();
        assert_eq!(snapshot.state.status, TimerStatus::Finished);
        assert_eq!(store.list().unwrap()[0].duration_seconds, 5);

        sleep(millis(3_000)).await;
        assert_eq!(state.snapshot().unwrap().state.accumulated_work_seconds, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_duration_finish_logs_nothing() {
        let (state, store) = app(SessionConfig::default());
        state.start().unwrap();
        state.finish().unwrap();
        assert!(store.list().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_failure_does_not_block_finish() {
        let state = Arc::new(AppState::new(
            0,
            "127.0.0.1".to_string(),
            SessionConfig::default(),
            Arc::new(FailingStore),
        ));
        state.start().unwrap();
        sleep(millis(1_500)).await;

        let snapshot = state.finish().unwrap();
        assert_eq!(snapshot.state.status, TimerStatus::Finished);
        assert_eq!(state.errors().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_transition_is_reported() {
        let (state, _) = app(SessionConfig::default());
        assert!(matches!(state.pause(), Err(AppError::Engine(_))));
        assert_eq!(state.get_last_action(), (None, None));
    }

    #[tokio::test(start_paused = true)]
    async fn test_updates_are_published() {
        let (state, _) = app(SessionConfig::default());
        let mut rx = state.subscribe();
        state.start().unwrap();

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().state.status, TimerStatus::Running);

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().state.time_left_seconds, 1499);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_published_snapshot_matches_engine_under_contention() {
        let (state, _) = app(SessionConfig::new(99, 99, 99, 99, false));

        for _ in 0..100 {
            state.reset().unwrap();
            state.start().unwrap();
            let epoch = state.lock_session().unwrap().ticker_epoch().unwrap();

            let ticking = {
                let state = Arc::clone(&state);
                std::thread::spawn(move || {
                    for _ in 0..200 {
                        let _ = state.tick(epoch);
                    }
                })
            };
            let skipping = {
                let state = Arc::clone(&state);
                std::thread::spawn(move || while state.skip().is_ok() {})
            };
            ticking.join().unwrap();
            skipping.join().unwrap();

            assert_eq!(*state.subscribe().borrow(), state.snapshot().unwrap());
        }
    }

    #[test]
    fn test_error_list_keeps_most_recent() {
        let (state, _) = app(SessionConfig::default());
        for i in 0..MAX_ERRORS + 5 {
            state.add_error(format!("failure {}", i));
        }

        let errors = state.errors();
        assert_eq!(errors.len(), MAX_ERRORS);
        assert_eq!(errors[0], "failure 5");
        assert_eq!(errors[MAX_ERRORS - 1], format!("failure {}", MAX_ERRORS + 4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_while_running_stops_ticker() {
        let (state, _) = app(SessionConfig::default());
        state.start().unwrap();
        sleep(millis(2_500)).await;

        let snapshot = state.reset().unwrap();
        assert_eq!(snapshot.state.status, TimerStatus::Idle);
        assert!(!state.has_active_ticker().unwrap());

        sleep(millis(3_000)).await;
        assert_eq!(state.snapshot().unwrap().state.time_left_seconds, 1500);
    }
}
