//! On-demand foreground window endpoint.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::monitor::WindowSnapshot;
use crate::server::routes::ApiError;
use crate::server::state::AppState;

/// GET /api/window - Current foreground window.
///
/// Performs a fresh OS query instead of returning the last reported window.
pub async fn get_active_window(
    State(state): State<Arc<AppState>>,
) -> Result<Json<WindowSnapshot>, ApiError> {
    let snapshot = state.watcher.get_active_window()?;
    Ok(Json(snapshot))
}
