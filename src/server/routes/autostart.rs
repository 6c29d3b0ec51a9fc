//! Autostart endpoints (Windows only).

use axum::{http::StatusCode, Json};
use serde_json::{json, Value};

use crate::server::routes::ApiError;
use crate::winapi_utils::autostart;

fn internal(e: impl std::fmt::Display) -> ApiError {
    ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

/// GET /api/autostart
pub async fn get_status() -> Result<Json<Value>, ApiError> {
    let enabled = autostart::is_enabled().map_err(internal)?;
    Ok(Json(json!({ "enabled": enabled })))
}

/// POST /api/autostart - Register the running executable.
pub async fn enable() -> Result<Json<Value>, ApiError> {
    let exe = std::env::current_exe().map_err(internal)?;
    autostart::enable(&exe).map_err(internal)?;
    Ok(Json(json!({ "enabled": true })))
}

/// DELETE /api/autostart
pub async fn disable() -> Result<Json<Value>, ApiError> {
    autostart::disable().map_err(internal)?;
    Ok(Json(json!({ "enabled": false })))
}
