//! HTTP endpoint handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::Json,
};
use chrono::{Datelike, Local};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use super::responses::{ApiResponse, HealthResponse, StatusResponse};
use crate::{
    error::{AppError, StoreError},
    services::{daily_total, monthly_calendar, LogEntry, MonthCalendar},
    state::{AppState, SessionConfigInput},
};

/// Body of POST /worklog
#[derive(Debug, Deserialize)]
pub struct WorkLogRequest {
    #[serde(default)]
    pub duration: Option<Value>,
}

/// Handle GET /timer - Current timer snapshot and server metadata
pub async fn timer_status_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusResponse>, AppError> {
    let timer = state.snapshot()?;
    let worked_today_seconds = daily_total(&state.work_log()?, Local::now().date_naive(), &Local);
    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        timer,
        errors: state.errors(),
        worked_today_seconds,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle PUT /timer/config - Change the session configuration while idle
pub async fn configure_handler(
    State(state): State<Arc<AppState>>,
    Json(input): Json<SessionConfigInput>,
) -> Result<Json<ApiResponse>, AppError> {
    let timer = state.configure(&input)?;
    Ok(Json(ApiResponse::new("Session configured", timer)))
}

/// Handle POST /timer/start - Start a new session
pub async fn start_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, AppError> {
    let timer = state.start()?;
    Ok(Json(ApiResponse::new("Session started", timer)))
}

/// Handle POST /timer/pause
pub async fn pause_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, AppError> {
    let timer = state.pause()?;
    Ok(Json(ApiResponse::new("Timer paused", timer)))
}

/// Handle POST /timer/resume
pub async fn resume_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, AppError> {
    let timer = state.resume()?;
    Ok(Json(ApiResponse::new("Timer resumed", timer)))
}

/// Handle POST /timer/skip - Move to the next phase
pub async fn skip_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, AppError> {
    let timer = state.skip()?;
    Ok(Json(ApiResponse::new("Phase skipped", timer)))
}

/// Handle POST /timer/finish - End the session and log the worked time
pub async fn finish_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, AppError> {
    let timer = state.finish()?;
    Ok(Json(ApiResponse::new("Session finished", timer)))
}

/// Handle POST /timer/reset - Back to an idle timer
pub async fn reset_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, AppError> {
    let timer = state.reset()?;
    Ok(Json(ApiResponse::new("Timer reset", timer)))
}

/// Handle GET /worklog - All entries, newest first
pub async fn list_work_log_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<LogEntry>>, AppError> {
    Ok(Json(state.work_log()?))
}

/// Handle POST /worklog - Record a duration in seconds
pub async fn append_work_log_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<WorkLogRequest>,
) -> Result<Json<LogEntry>, AppError> {
    let duration = request
        .duration
        .as_ref()
        .and_then(Value::as_u64)
        .filter(|&seconds| seconds > 0)
        .ok_or_else(|| StoreError::InvalidDuration("expected a positive whole number of seconds".to_string()))?;

    let entry = state.append_work(duration)?;
    info!("Work log entry #{} added via API", entry.id);
    Ok(Json(entry))
}

/// Handle GET /stats - Calendar for the current local month
pub async fn current_month_stats_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MonthCalendar>, AppError> {
    let today = Local::now().date_naive();
    month_stats(&state, today.year(), today.month())
}

/// Handle GET /stats/:year/:month - Calendar for a given local month
pub async fn month_stats_handler(
    State(state): State<Arc<AppState>>,
    Path((year, month)): Path<(i32, u32)>,
) -> Result<Json<MonthCalendar>, AppError> {
    month_stats(&state, year, month)
}

fn month_stats(state: &AppState, year: i32, month: u32) -> Result<Json<MonthCalendar>, AppError> {
    let entries = state.work_log()?;
    monthly_calendar(&entries, year, month, &Local)
        .map(Json)
        .ok_or_else(|| AppError::BadRequest(format!("no such month: {}-{}", year, month)))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
