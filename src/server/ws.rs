//! WebSocket handler for real-time watcher events.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use crate::monitor::envelope;
use crate::server::state::AppState;

/// WebSocket upgrade handler.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handles an individual WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe before sending the initial state so no event is missed
    let mut rx = state.subscribe();

    if let Some(initial_state) = initial_state(&state) {
        if sender.send(Message::Text(initial_state)).await.is_err() {
            return;
        }
    }

    let send_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(msg) => {
                    if sender.send(Message::Text(msg)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "WebSocket client lagging, events dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    // Incoming messages are ignored apart from close
    let recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Close(_) = msg {
                break;
            }
        }
    });

    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    tracing::debug!("WebSocket connection closed");
}

/// Builds the message sent to a client right after it connects.
fn initial_state(state: &AppState) -> Option<String> {
    let data = serde_json::json!({
        "running": state.watcher.is_running(),
        "window": state.watcher.last_snapshot(),
        "blocklist": state.blocklist.executable_names(),
    });

    envelope("initial_state", &data).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::error::WatchError;
    use crate::monitor::{BlocklistManager, WatcherConfig, WindowQuery, WindowSnapshot, WindowWatcher};
    use tempfile::TempDir;

    struct NoWindow;

    impl WindowQuery for NoWindow {
        fn query(&self) -> Result<WindowSnapshot, WatchError> {
            Err(WatchError::NoForegroundWindow)
        }
    }

    #[test]
    fn test_initial_state_message() {
        let dir = TempDir::new().unwrap();
        let blocklist = Arc::new(BlocklistManager::open(dir.path().join("list.json")).unwrap());
        blocklist.add_app("chrome.exe", "Chrome").unwrap();

        let watcher = WindowWatcher::new(Arc::new(NoWindow), blocklist.clone(), WatcherConfig::default());
        let state = AppState::new(
            crate::server::event_channel(),
            watcher,
            blocklist,
            AppConfig::default(),
        );

        let message: serde_json::Value =
            serde_json::from_str(&initial_state(&state).unwrap()).unwrap();
        assert_eq!(message["type"], "initial_state");
        assert_eq!(message["data"]["running"], false);
        assert!(message["data"]["window"].is_null());
        assert_eq!(message["data"]["blocklist"][0], "chrome.exe");
    }
}
