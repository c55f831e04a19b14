//! Simple Pomodoro - A Pomodoro timer server with a persistent work log
//!
//! This is the main entry point for the simple-pomodoro application.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use simple_pomodoro::{
    api::create_router,
    config::Config,
    services::JsonFileStore,
    state::AppState,
    tasks::phase_watcher_task,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("simple_pomodoro={},tower_http=info", config.log_level()))
        .init();

    info!("Starting simple-pomodoro server v{}", env!("CARGO_PKG_VERSION"));

    let session = config.session_config();
    info!(
        "Configuration: host={}, port={}, loops={}, work={}min, rest={}min, long_rest={}",
        config.host,
        config.port,
        session.target_loops,
        session.work_minutes,
        session.rest_minutes,
        if session.supports_long_rest {
            format!("{}min", session.long_rest_minutes)
        } else {
            "off".to_string()
        }
    );

    let data_file = config.data_file();
    let store = JsonFileStore::open(&data_file)
        .with_context(|| format!("Failed to open work log {}", data_file.display()))?;
    info!("Work log: {}", store.path().display());

    // Create application state
    let state = Arc::new(AppState::new(
        config.port,
        config.host.clone(),
        session,
        Arc::new(store),
    ));

    // Log phase changes as the timer publishes them
    tokio::spawn(phase_watcher_task(state.subscribe()));

    // Create HTTP router with all endpoints
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET  /timer              - Timer status");
    info!("  PUT  /timer/config       - Configure the next session");
    info!("  POST /timer/start        - Start a session");
    info!("  POST /timer/pause        - Pause the countdown");
    info!("  POST /timer/resume       - Resume the countdown");
    info!("  POST /timer/skip         - Skip to the next phase");
    info!("  POST /timer/finish       - End the session and log worked time");
    info!("  POST /timer/reset        - Back to idle");
    info!("  GET  /worklog            - List logged sessions");
    info!("  POST /worklog            - Log a duration");
    info!("  GET  /stats[/:year/:month] - Monthly calendar");
    info!("  GET  /health             - Health check");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}
