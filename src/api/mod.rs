//! HTTP API module
//!
//! This module contains all HTTP endpoint handlers and response structures.

pub mod handlers;
pub mod responses;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/timer", get(timer_status_handler))
        .route("/timer/config", put(configure_handler))
        .route("/timer/start", post(start_handler))
        .route("/timer/pause", post(pause_handler))
        .route("/timer/resume", post(resume_handler))
        .route("/timer/skip", post(skip_handler))
        .route("/timer/finish", post(finish_handler))
        .route("/timer/reset", post(reset_handler))
        .route("/worklog", get(list_work_log_handler).post(append_work_log_handler))
        .route("/stats", get(current_month_stats_handler))
        .route("/stats/:year/:month", get(month_stats_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
