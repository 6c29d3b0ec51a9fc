//! System tray module.
//!
//! Tray icon and context menu: start/stop monitoring, toggle auto-start and
//! quit. The menu is one of several concurrent callers of the watcher.

pub mod icon;
pub mod menu;

pub use icon::*;
pub use menu::*;

use crate::error::WatchError;
use crate::monitor::WindowWatcher;
use crate::winapi_utils::{autostart, post_quit_message};
use crossbeam_channel::Receiver;
use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tray_icon::menu::{CheckMenuItem, MenuEvent};
use tray_icon::{TrayIcon, TrayIconBuilder};

// Menu items are bound to the thread that created them.
thread_local! {
    static AUTOSTART_ITEM: RefCell<Option<CheckMenuItem>> = const { RefCell::new(None) };
}

/// Sets up the system tray icon and menu.
///
/// Keep the returned `TrayIcon` alive for the tray to remain visible.
pub fn setup_tray(
    watcher: WindowWatcher,
    shutdown: Arc<AtomicBool>,
) -> Result<TrayIcon, Box<dyn std::error::Error>> {
    let autostart_enabled = autostart::is_enabled().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to read auto-start state");
        false
    });

    let icon = create_default_icon()?;
    let TrayMenu {
        menu,
        autostart: autostart_item,
    } = create_tray_menu(autostart_enabled);
    AUTOSTART_ITEM.with(|item| *item.borrow_mut() = Some(autostart_item));

    let tray = TrayIconBuilder::new()
        .with_tooltip("Window Monitor - Running")
        .with_icon(icon)
        .with_menu(Box::new(menu))
        .build()?;

    // The handler runs on the tray thread. Auto-start is handled there so the
    // check item can be touched; everything else goes to the worker thread.
    let (event_tx, event_rx) = crossbeam_channel::unbounded();
    MenuEvent::set_event_handler(Some(move |event: MenuEvent| {
        if event.id.0 == MENU_ID_AUTOSTART {
            toggle_autostart();
        } else if event_tx.send(event).is_err() {
            tracing::debug!("Menu handler thread gone");
        }
    }));

    spawn_menu_handler(event_rx, watcher, shutdown);

    tracing::info!("System tray initialized");
    Ok(tray)
}

/// Spawns a thread to handle menu events.
fn spawn_menu_handler(
    receiver: Receiver<MenuEvent>,
    watcher: WindowWatcher,
    shutdown: Arc<AtomicBool>,
) {
    std::thread::spawn(move || {
        while !shutdown.load(Ordering::Relaxed) {
            if let Ok(event) = receiver.recv_timeout(Duration::from_millis(100)) {
                handle_menu_event(&event.id.0, &watcher, &shutdown);
            }
        }
    });
}

/// Handles a menu item click.
fn handle_menu_event(menu_id: &str, watcher: &WindowWatcher, shutdown: &AtomicBool) {
    match menu_id {
        MENU_ID_START => match watcher.start() {
            Ok(()) => tracing::info!("Monitoring started from tray menu"),
            Err(WatchError::AlreadyRunning) => tracing::debug!("Monitoring already running"),
            Err(e) => tracing::error!(error = %e, "Failed to start monitoring"),
        },
        MENU_ID_STOP => {
            watcher.stop();
            tracing::info!("Monitoring stopped from tray menu");
        }
        MENU_ID_EXIT => {
            tracing::info!("Exit requested from tray menu");
            watcher.stop();
            shutdown.store(true, Ordering::SeqCst);
            post_quit_message(0);
        }
        _ => {
            tracing::debug!(menu_id, "Unknown menu event");
        }
    }
}

/// Flips the registry entry, then resyncs the check mark with the registry.
///
/// The check item toggles its own mark on click, which is wrong whenever the
/// registry write fails.
fn toggle_autostart() {
    let result = match autostart::is_enabled() {
        Ok(true) => autostart::disable(),
        Ok(false) => std::env::current_exe()
            .map_err(Into::into)
            .and_then(|exe| autostart::enable(&exe)),
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "Failed to toggle auto-start");
    }

    let enabled = autostart::is_enabled().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to read auto-start state");
        false
    });
    set_autostart_checked(enabled);
}

fn set_autostart_checked(enabled: bool) {
    AUTOSTART_ITEM.with(|item| match item.borrow().as_ref() {
        Some(item) => item.set_checked(enabled),
        None => tracing::debug!("Auto-start menu item not on this thread"),
    });
}
