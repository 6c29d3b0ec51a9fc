//! Shared application state for the HTTP server.

use crate::config::AppConfig;
use crate::monitor::{BlocklistManager, WindowWatcher};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Broadcast channel carrying watcher events to WebSocket clients.
    pub broadcast_tx: broadcast::Sender<String>,

    pub watcher: WindowWatcher,

    pub blocklist: Arc<BlocklistManager>,

    pub config: AppConfig,
}

impl AppState {
    pub fn new(
        broadcast_tx: broadcast::Sender<String>,
        watcher: WindowWatcher,
        blocklist: Arc<BlocklistManager>,
        config: AppConfig,
    ) -> Self {
        Self {
            broadcast_tx,
            watcher,
            blocklist,
            config,
        }
    }

    /// Subscribe to the broadcast channel.
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.broadcast_tx.subscribe()
    }
}
