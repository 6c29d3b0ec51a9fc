//! Route handlers module.

#[cfg(windows)]
pub mod autostart;
pub mod blocklist;
pub mod config;
pub mod health;
pub mod monitor;
pub mod window;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::error::{BlocklistError, WatchError};

/// Error returned by API handlers as `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}

impl From<WatchError> for ApiError {
    fn from(e: WatchError) -> Self {
        let status = match e {
            WatchError::NoForegroundWindow | WatchError::QueryFailed(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            WatchError::AlreadyRunning => StatusCode::CONFLICT,
            WatchError::Spawn(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, e.to_string())
    }
}

impl From<BlocklistError> for ApiError {
    fn from(e: BlocklistError) -> Self {
        let status = match e {
            BlocklistError::AlreadyExists(_) => StatusCode::CONFLICT,
            BlocklistError::NotFound(_) => StatusCode::NOT_FOUND,
            BlocklistError::EmptyName => StatusCode::BAD_REQUEST,
            BlocklistError::Io { .. }
            | BlocklistError::Json(_)
            | BlocklistError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, e.to_string())
    }
}
