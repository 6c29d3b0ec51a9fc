//! Window Monitor - foreground window watcher with blocklist warnings.
//!
//! The [`monitor`] module is platform independent. Everything touching the
//! Win32 API lives in [`winapi_utils`] and [`tray`] and is only built on
//! Windows.

pub mod config;
pub mod error;
pub mod monitor;
pub mod server;

#[cfg(windows)]
pub mod tray;
#[cfg(windows)]
pub mod winapi_utils;

pub use error::{BlocklistError, ConfigError, WatchError};
#[cfg(windows)]
pub use error::AutostartError;
