//! Notification sinks receiving watcher events.
//!
//! The watcher emits named events with a JSON payload. Sinks decide where
//! they go: the WebSocket bus, a native dialog, a log, or several at once.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Event emitted whenever the reported foreground window changes.
pub const EVENT_WINDOW_CHANGED: &str = "window-changed";

/// Event emitted when a blocked application takes focus.
pub const EVENT_WARNING_DETECTED: &str = "warning-detected";

/// Receiver of watcher notifications.
///
/// `emit` is called from the polling thread and must not block for long.
pub trait NotificationSink: Send + Sync {
    fn emit(&self, event: &str, payload: &serde_json::Value);
}

/// Publishes events to the WebSocket broadcast channel.
///
/// Messages have the shape `{"type", "data", "timestamp"}`. Sending with no
/// connected client is not an error.
#[derive(Clone)]
pub struct BroadcastSink {
    tx: broadcast::Sender<String>,
}

impl BroadcastSink {
    pub fn new(tx: broadcast::Sender<String>) -> Self {
        Self { tx }
    }
}

impl NotificationSink for BroadcastSink {
    fn emit(&self, event: &str, payload: &serde_json::Value) {
        match envelope(event, payload) {
            Ok(json) => {
                // Err only means no receiver is subscribed right now
                let _ = self.tx.send(json);
            }
            Err(e) => tracing::warn!(event, error = %e, "Failed to serialize event"),
        }
    }
}

/// Wraps an event into the message format used on the bus.
pub fn envelope(event: &str, data: &impl Serialize) -> serde_json::Result<String> {
    serde_json::to_string(&serde_json::json!({
        "type": event,
        "data": data,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Forwards every event to each inner sink in order.
#[derive(Default, Clone)]
pub struct CompositeSink {
    sinks: Vec<Arc<dyn NotificationSink>>,
}

impl CompositeSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl NotificationSink for CompositeSink {
    fn emit(&self, event: &str, payload: &serde_json::Value) {
        for sink in &self.sinks {
            sink.emit(event, payload);
        }
    }
}

/// Writes events to the log. Stands in for the warning dialog when it is
/// disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn emit(&self, event: &str, payload: &serde_json::Value) {
        tracing::info!(event, %payload, "Watcher event");
    }
}
