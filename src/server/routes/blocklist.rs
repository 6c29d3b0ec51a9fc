//! Blocklist endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::monitor::BlockedApp;
use crate::server::routes::ApiError;
use crate::server::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddAppRequest {
    pub executable_name: String,
    #[serde(default)]
    pub display_name: String,
}

/// GET /api/blocklist - All entries, reloaded from disk.
pub async fn list_apps(State(state): State<Arc<AppState>>) -> Json<Vec<BlockedApp>> {
    Json(state.blocklist.apps())
}

/// POST /api/blocklist - Add an entry.
pub async fn add_app(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AddAppRequest>,
) -> Result<(StatusCode, Json<BlockedApp>), ApiError> {
    let app = state
        .blocklist
        .add_app(&request.executable_name, &request.display_name)?;
    Ok((StatusCode::CREATED, Json(app)))
}

/// DELETE /api/blocklist/:exe - Remove an entry.
pub async fn remove_app(
    State(state): State<Arc<AppState>>,
    Path(exe): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.blocklist.remove_app(&exe)?;
    Ok(StatusCode::NO_CONTENT)
}
