//! Blocklist of executables that trigger a warning when they take focus.
//!
//! The list is persisted as a JSON array next to the other application data
//! and loaded explicitly through [`BlocklistManager::open`]. The watcher only
//! depends on the [`BlocklistLookup`] trait, so tests can swap in any store.

use crate::error::BlocklistError;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// File name used when no explicit blocklist path is configured.
pub const BLOCKLIST_FILE_NAME: &str = "blocking_list.json";

/// A single blocked application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedApp {
    /// Normalized executable name (e.g., "chrome.exe").
    pub executable_name: String,

    /// Human readable name shown in warnings (e.g., "Google Chrome").
    #[serde(default)]
    pub display_name: String,
}

/// Read access to a blocklist, as consumed by the window watcher.
///
/// Implementations must be safe to call from the polling thread while other
/// threads mutate the underlying list, and must return promptly.
pub trait BlocklistLookup: Send + Sync {
    /// Returns whether the executable is blocked.
    fn is_blocked(&self, executable: &str) -> Result<bool, BlocklistError>;

    /// Returns the blocklist entry for the executable, if any.
    fn entry_for(&self, executable: &str) -> Result<Option<BlockedApp>, BlocklistError>;
}

/// Normalizes an executable name for comparison (trimmed, lower-case).
pub fn normalize_executable(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Normalizes a name supplied by a user when editing the list.
///
/// Adds the `.exe` suffix when it is missing, so "Chrome" and "chrome.exe"
/// refer to the same entry.
fn normalize_entry_name(name: &str) -> Result<String, BlocklistError> {
    let mut name = normalize_executable(name);
    if name.is_empty() {
        return Err(BlocklistError::EmptyName);
    }
    if !name.ends_with(".exe") {
        name.push_str(".exe");
    }
    Ok(name)
}

/// JSON-file backed blocklist.
pub struct BlocklistManager {
    path: PathBuf,
    apps: RwLock<Vec<BlockedApp>>,
}

impl BlocklistManager {
    /// Opens the blocklist stored at `path`.
    ///
    /// A missing or empty file yields an empty list. The file is only
    /// created on the first mutation.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, BlocklistError> {
        let path = path.into();
        let apps = read_file(&path)?;

        tracing::info!(path = %path.display(), count = apps.len(), "Blocklist loaded");

        Ok(Self {
            path,
            apps: RwLock::new(apps),
        })
    }

    /// Returns the default blocklist location.
    ///
    /// `%APPDATA%/window-monitor/blocking_list.json` on Windows.
    pub fn default_path() -> PathBuf {
        crate::config::data_dir().join(BLOCKLIST_FILE_NAME)
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-reads the file, replacing the in-memory list.
    ///
    /// On failure the current list is kept. The write lock is held across
    /// the read so a reload never observes a save in progress.
    pub fn reload(&self) -> Result<(), BlocklistError> {
        let mut apps = self.apps.write();
        *apps = read_file(&self.path)?;
        Ok(())
    }

    /// Adds an application to the list and persists it.
    pub fn add_app(
        &self,
        executable_name: &str,
        display_name: &str,
    ) -> Result<BlockedApp, BlocklistError> {
        let executable_name = normalize_entry_name(executable_name)?;
        let display_name = match display_name.trim() {
            "" => executable_name.clone(),
            name => name.to_string(),
        };

        let mut apps = self.apps.write();
        if apps.iter().any(|a| a.executable_name == executable_name) {
            return Err(BlocklistError::AlreadyExists(executable_name));
        }

        let app = BlockedApp {
            executable_name,
            display_name,
        };
        apps.push(app.clone());

        if let Err(e) = self.save(&apps) {
            apps.pop();
            return Err(e);
        }

        tracing::info!(
            exe = %app.executable_name,
            display = %app.display_name,
            total = apps.len(),
            "Added app to blocklist"
        );
        Ok(app)
    }

    /// Removes an application from the list and persists it.
    pub fn remove_app(&self, executable_name: &str) -> Result<(), BlocklistError> {
        let executable_name = normalize_entry_name(executable_name)?;

        let mut apps = self.apps.write();
        let Some(index) = apps
            .iter()
            .position(|a| a.executable_name == executable_name)
        else {
            return Err(BlocklistError::NotFound(executable_name));
        };

        let removed = apps.remove(index);
        if let Err(e) = self.save(&apps) {
            apps.insert(index, removed);
            return Err(e);
        }

        tracing::info!(exe = %executable_name, total = apps.len(), "Removed app from blocklist");
        Ok(())
    }

    /// Returns a copy of all entries, reloading from disk first so edits made
    /// by other processes are picked up.
    pub fn apps(&self) -> Vec<BlockedApp> {
        if let Err(e) = self.reload() {
            tracing::warn!(error = %e, "Failed to reload blocklist, using cached entries");
        }
        self.apps.read().clone()
    }

    /// Returns the executable names currently held in memory.
    pub fn executable_names(&self) -> Vec<String> {
        self.apps
            .read()
            .iter()
            .map(|a| a.executable_name.clone())
            .collect()
    }

    fn save(&self, apps: &[BlockedApp]) -> Result<(), BlocklistError> {
        let io_err = |source| BlocklistError::Io {
            path: self.path.clone(),
            source,
        };

        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent).map_err(io_err)?;

        // Written next to the target and renamed over it so the file is never
        // observed truncated.
        let data = serde_json::to_string_pretty(apps)?;
        let mut file = NamedTempFile::new_in(parent).map_err(io_err)?;
        file.write_all(data.as_bytes()).map_err(io_err)?;
        file.persist(&self.path).map_err(|e| io_err(e.error))?;

        tracing::debug!(path = %self.path.display(), "Blocklist written");
        Ok(())
    }
}

impl BlocklistLookup for BlocklistManager {
    fn is_blocked(&self, executable: &str) -> Result<bool, BlocklistError> {
        let executable = normalize_executable(executable);
        Ok(self
            .apps
            .read()
            .iter()
            .any(|a| a.executable_name == executable))
    }

    fn entry_for(&self, executable: &str) -> Result<Option<BlockedApp>, BlocklistError> {
        let executable = normalize_executable(executable);
        Ok(self
            .apps
            .read()
            .iter()
            .find(|a| a.executable_name == executable)
            .cloned())
    }
}

fn read_file(path: &Path) -> Result<Vec<BlockedApp>, BlocklistError> {
    let data = match std::fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(BlocklistError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    if data.trim().is_empty() {
        return Ok(Vec::new());
    }

    Ok(serde_json::from_str(&data)?)
}
