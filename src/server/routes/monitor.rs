//! Watcher start/stop endpoints.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::monitor::WindowSnapshot;
use crate::server::routes::ApiError;
use crate::server::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorStatus {
    pub running: bool,
    pub poll_interval_ms: u64,
    /// Last reported window, if any.
    pub last: Option<WindowSnapshot>,
}

fn status_of(state: &AppState) -> MonitorStatus {
    MonitorStatus {
        running: state.watcher.is_running(),
        poll_interval_ms: state.watcher.poll_interval().as_millis() as u64,
        last: state.watcher.last_snapshot(),
    }
}

/// GET /api/monitor
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<MonitorStatus> {
    Json(status_of(&state))
}

/// POST /api/monitor/start - 409 when already running.
pub async fn start(State(state): State<Arc<AppState>>) -> Result<Json<MonitorStatus>, ApiError> {
    state.watcher.start()?;
    Ok(Json(status_of(&state)))
}

/// POST /api/monitor/stop - Always succeeds.
pub async fn stop(State(state): State<Arc<AppState>>) -> Result<Json<MonitorStatus>, ApiError> {
    // stop() joins the polling thread
    let watcher = state.watcher.clone();
    tokio::task::spawn_blocking(move || watcher.stop())
        .await
        .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(status_of(&state)))
}
