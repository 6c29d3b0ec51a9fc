//! Error types shared across the monitor.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the window watcher and the OS window query.
#[derive(Debug, Error)]
pub enum WatchError {
    /// The desktop has no focused window (lock screen, secure desktop).
    #[error("no foreground window")]
    NoForegroundWindow,

    /// An OS call failed while resolving the window title or owning process.
    #[error("window query failed: {0}")]
    QueryFailed(String),

    /// `start` was called while a polling loop is already active.
    #[error("monitoring already running")]
    AlreadyRunning,

    /// The polling thread could not be created.
    #[error("failed to spawn polling thread: {0}")]
    Spawn(#[source] io::Error),
}

/// Errors raised by the persisted blocklist.
#[derive(Debug, Error)]
pub enum BlocklistError {
    #[error("app '{0}' is already in the blocklist")]
    AlreadyExists(String),

    #[error("app '{0}' not found in blocklist")]
    NotFound(String),

    #[error("blocklist executable name is empty")]
    EmptyName,

    #[error("failed to access blocklist file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid blocklist file: {0}")]
    Json(#[from] serde_json::Error),

    /// Used by lookups backed by a store that is temporarily unavailable.
    #[error("blocklist unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised while loading the application configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Errors raised by the start-on-logon registration.
#[cfg(windows)]
#[derive(Debug, Error)]
pub enum AutostartError {
    #[error("executable not found: {}", .0.display())]
    ExecutableNotFound(PathBuf),

    #[error("failed to resolve executable path: {0}")]
    Path(#[from] io::Error),

    #[error("registry error: {0}")]
    Registry(#[from] windows::core::Error),
}
