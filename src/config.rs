//! Application configuration.
//!
//! Settings live in `%APPDATA%/window-monitor/config.json`. Every field has a
//! default, so a missing file or a partial file is fine.

use crate::error::ConfigError;
use crate::monitor::{BlocklistManager, WatcherConfig};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "WINDOW_MONITOR_CONFIG";

/// Default HTTP/WebSocket port.
pub const DEFAULT_PORT: u16 = 13235;

const APP_DIR_NAME: &str = "window-monitor";

/// Returns the per-user application data directory.
pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Foreground window poll interval in milliseconds.
    pub poll_interval_ms: u64,

    /// Port of the local API and event bus.
    pub server_port: u16,

    /// Blocklist file. Defaults to `blocking_list.json` in the data directory.
    pub blocklist_path: Option<PathBuf>,

    /// Show a topmost message box when a blocked app takes focus.
    pub show_warning_dialog: bool,

    /// Log filter used when `RUST_LOG` is not set.
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            server_port: DEFAULT_PORT,
            blocklist_path: None,
            show_warning_dialog: true,
            log_filter: "window_monitor=info".to_string(),
        }
    }
}

impl AppConfig {
    /// Loads the config from `WINDOW_MONITOR_CONFIG` or the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_path);
        Self::load_from(&path)
    }

    /// Loads the config from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn default_path() -> PathBuf {
        data_dir().join("config.json")
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.server_port == 0 {
            return Err(ConfigError::Invalid(
                "server_port must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn watcher_config(&self) -> WatcherConfig {
        WatcherConfig {
            poll_interval: self.poll_interval(),
        }
    }

    pub fn blocklist_path(&self) -> PathBuf {
        self.blocklist_path
            .clone()
            .unwrap_or_else(BlocklistManager::default_path)
    }
}
