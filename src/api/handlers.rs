//! HTTP endpoint handlers

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Json};
use tracing::{error, info};

use super::responses::{
    ApiResponse, HealthResponse, StartRequest, StatusResponse, VisibilityRequest,
};
use crate::state::AppState;

/// Handle POST /start - Begin a fresh quiz attempt
pub async fn start_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StartRequest>,
) -> Result<Json<ApiResponse>, StatusCode> {
    match state.start(request.total_seconds, request.attempt_id) {
        Ok(timer) => {
            let message = if timer.is_idle() {
                "Empty budget, timer reset to idle".to_string()
            } else {
                format!("Attempt started with {}s budget", timer.total_seconds)
            };
            info!("Start endpoint called - {}", message);
            Ok(Json(ApiResponse::from_snapshot(message, timer)))
        }
        Err(e) => {
            error!("Failed to start timer: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /pause - Pause the running countdown
pub async fn pause_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    match state.pause() {
        Ok(timer) => {
            info!("Pause endpoint called");
            Ok(Json(ApiResponse::idle("Timer paused".to_string(), timer)))
        }
        Err(e) => {
            error!("Failed to pause timer: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /resume - Resume a paused countdown with time left
pub async fn resume_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    match state.resume() {
        Ok(timer) => {
            info!("Resume endpoint called");
            let message = if timer.is_running {
                "Timer resumed".to_string()
            } else {
                "Timer cannot resume".to_string()
            };
            Ok(Json(ApiResponse::from_snapshot(message, timer)))
        }
        Err(e) => {
            error!("Failed to resume timer: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /stop - Force completion of the current attempt
pub async fn stop_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    match state.stop() {
        Ok(timer) => {
            info!("Stop endpoint called");
            Ok(Json(ApiResponse::idle("Timer stopped".to_string(), timer)))
        }
        Err(e) => {
            error!("Failed to stop timer: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /reset - Clear the timer and its persisted state
pub async fn reset_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    match state.reset() {
        Ok(timer) => {
            info!("Reset endpoint called");
            Ok(Json(ApiResponse::idle("Timer reset".to_string(), timer)))
        }
        Err(e) => {
            error!("Failed to reset timer: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /visibility - Inject the page-visibility signal
pub async fn visibility_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<VisibilityRequest>,
) -> Result<Json<ApiResponse>, StatusCode> {
    match state.set_visibility(request.visible) {
        Ok(timer) => {
            info!(
                "Visibility endpoint called - page {}",
                if request.visible { "visible" } else { "hidden" }
            );
            let message = if request.visible {
                "Page visible".to_string()
            } else {
                "Page hidden".to_string()
            };
            Ok(Json(ApiResponse::from_snapshot(message, timer)))
        }
        Err(e) => {
            error!("Failed to apply visibility change: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle GET /status - Current snapshot plus derived readouts
pub async fn status_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusResponse>, StatusCode> {
    let timer = state.get_snapshot().map_err(|e| {
        error!("Failed to read timer state: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        time_taken_seconds: timer.time_taken_seconds(),
        is_expired: timer.is_expired(),
        timer,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
