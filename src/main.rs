//! Window Monitor - foreground window watcher
//!
//! Runs in the system tray, reports foreground window changes over a local
//! WebSocket and warns when a blocklisted application takes focus.

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use window_monitor::config::AppConfig;

#[cfg(windows)]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_logging(&config);
    app::run(config)
}

#[cfg(not(windows))]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_logging(&config);
    tracing::error!("Window Monitor only runs on Windows");
    Ok(())
}

fn init_logging(config: &AppConfig) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .init();
}

#[cfg(windows)]
mod app {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use window_monitor::config::AppConfig;
    use window_monitor::monitor::{
        BlocklistManager, BroadcastSink, CompositeSink, LogSink, NotificationSink, WindowWatcher,
    };
    use window_monitor::server::{self, state::AppState};
    use window_monitor::tray::setup_tray;
    use window_monitor::winapi_utils::{
        post_quit_message, run_message_loop, ForegroundWindowQuery, WarningDialogSink,
    };
    use window_monitor::WatchError;

    pub fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
        println!("╔════════════════════════════════════════════════════════════╗");
        println!("║              Window Monitor                                ║");
        println!("╚════════════════════════════════════════════════════════════╝");
        println!();

        println!("🔧 Loading blocklist...");
        let blocklist = Arc::new(BlocklistManager::open(config.blocklist_path())?);
        println!("   ✓ {} blocked apps", blocklist.executable_names().len());

        let watcher = WindowWatcher::new(
            Arc::new(ForegroundWindowQuery),
            blocklist.clone(),
            config.watcher_config(),
        );

        // Event bus
        println!("🔧 Starting HTTP server...");
        let broadcast_tx = server::event_channel();
        let addr = server::start_server(AppState::new(
            broadcast_tx.clone(),
            watcher.clone(),
            blocklist.clone(),
            config.clone(),
        ))?;
        println!("   ✓ HTTP server listening on http://{}", addr);

        let mut sink = CompositeSink::new().with(Arc::new(BroadcastSink::new(broadcast_tx)));
        if config.show_warning_dialog {
            sink = sink.with(Arc::new(WarningDialogSink));
        } else {
            sink = sink.with(Arc::new(LogSink));
        }
        let sink: Arc<dyn NotificationSink> = Arc::new(sink);
        watcher.attach_sink(sink);

        let shutdown = Arc::new(AtomicBool::new(false));

        println!("🔧 Setting up system tray...");
        let _tray = match setup_tray(watcher.clone(), Arc::clone(&shutdown)) {
            Ok(tray) => {
                println!("   ✓ System tray icon created");
                Some(tray)
            }
            Err(e) => {
                println!("   ⚠ Failed to create system tray: {}", e);
                println!("   Continuing without tray...");
                None
            }
        };

        let shutdown_ctrlc = Arc::clone(&shutdown);
        let watcher_ctrlc = watcher.clone();
        ctrlc::set_handler(move || {
            println!("\n🛑 Shutdown signal received...");
            watcher_ctrlc.stop();
            shutdown_ctrlc.store(true, Ordering::SeqCst);
            post_quit_message(0);
        })?;

        println!("🔧 Starting window monitoring...");
        match watcher.start() {
            Ok(()) => println!("   ✓ Monitoring every {:?}", watcher.poll_interval()),
            // The tray or the API may have won the race
            Err(WatchError::AlreadyRunning) => println!("   ✓ Monitoring already running"),
            Err(e) => return Err(e.into()),
        }

        println!();
        println!("════════════════════════════════════════════════════════════════");
        println!("🎯 Window Monitor is now running in the system tray!");
        println!("   • Right-click the tray icon for options");
        println!("   • Select 'Quit' or press Ctrl+C to quit");
        println!();
        println!("🌐 API available at http://127.0.0.1:{}", config.server_port);
        println!("   • GET  /api/window     - Current foreground window");
        println!("   • GET  /api/blocklist  - Blocked applications");
        println!("   • POST /api/monitor/*  - Start / stop monitoring");
        println!("   • WS   /ws             - Real-time events");
        println!("════════════════════════════════════════════════════════════════");
        println!();

        tracing::info!("Running message loop...");
        run_message_loop();

        println!("\n⏳ Shutting down...");
        shutdown.store(true, Ordering::SeqCst);
        watcher.stop();
        watcher.detach_sink();

        println!("👋 Window Monitor has exited. Goodbye!");
        Ok(())
    }
}
