//! Local HTTP API and WebSocket event bus.
//!
//! Exposes the watcher controls and the blocklist to a frontend, and pushes
//! every watcher event to connected WebSocket clients.

pub mod routes;
pub mod state;
pub mod ws;

use crate::server::routes::{blocklist, config, health, monitor, window};
use crate::server::state::AppState;
use crate::server::ws::ws_handler;

use axum::{
    routing::{delete, get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};

/// Capacity of the event broadcast channel.
pub const BROADCAST_CAPACITY: usize = 100;

/// Creates the channel the [`BroadcastSink`](crate::monitor::BroadcastSink)
/// publishes to.
pub fn event_channel() -> broadcast::Sender<String> {
    let (tx, _) = broadcast::channel::<String>(BROADCAST_CAPACITY);
    tx
}

/// Binds the API port and serves it on a background thread.
///
/// The socket is bound before returning, so a port already in use is
/// reported to the caller. Returns the bound address.
pub fn start_server(state: AppState) -> std::io::Result<SocketAddr> {
    let addr = SocketAddr::from(([127, 0, 0, 1], state.config.server_port));
    let listener = std::net::TcpListener::bind(addr)?;
    listener.set_nonblocking(true)?;
    let addr = listener.local_addr()?;

    let runtime = tokio::runtime::Runtime::new()?;
    std::thread::Builder::new()
        .name("http-server".to_string())
        .spawn(move || {
            runtime.block_on(async move {
                if let Err(e) = run_server(listener, state).await {
                    tracing::error!(%addr, error = %e, "HTTP server stopped");
                }
            });
        })?;

    tracing::info!("HTTP server listening on http://{}", addr);
    Ok(addr)
}

/// Builds the API router.
pub fn router(state: AppState) -> Router {
    // CORS layer for frontend
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health::health_check))
        // Window API
        .route("/api/window", get(window::get_active_window))
        // Monitor control
        .route("/api/monitor", get(monitor::get_status))
        .route("/api/monitor/start", post(monitor::start))
        .route("/api/monitor/stop", post(monitor::stop))
        // Blocklist API
        .route(
            "/api/blocklist",
            get(blocklist::list_apps).post(blocklist::add_app),
        )
        .route("/api/blocklist/:exe", delete(blocklist::remove_app))
        // Config API
        .route("/api/config", get(config::get_config))
        // WebSocket
        .route("/ws", get(ws_handler));

    #[cfg(windows)]
    let app = app.route(
        "/api/autostart",
        get(routes::autostart::get_status)
            .post(routes::autostart::enable)
            .delete(routes::autostart::disable),
    );

    app.layer(cors).with_state(Arc::new(state))
}

/// Runs the axum server on an already bound listener.
async fn run_server(listener: std::net::TcpListener, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::from_std(listener)?;
    axum::serve(listener, router(state)).await
}
