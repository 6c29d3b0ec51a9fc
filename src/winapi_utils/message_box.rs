//! Topmost native warning dialog.

use crate::monitor::{NotificationSink, EVENT_WARNING_DETECTED};
use windows::core::PCWSTR;
use windows::Win32::UI::WindowsAndMessaging::{
    MessageBoxW, MB_ICONERROR, MB_OK, MB_SETFOREGROUND, MB_TOPMOST,
};

/// Shows a message box that stays above every other window.
///
/// Blocks until the user dismisses it and returns the clicked button
/// (`IDOK` = 1).
pub fn show_system_warning(title: &str, message: &str) -> windows::core::Result<i32> {
    let wide_title = to_wide(title);
    let wide_message = to_wide(message);

    let result = unsafe {
        MessageBoxW(
            None,
            PCWSTR(wide_message.as_ptr()),
            PCWSTR(wide_title.as_ptr()),
            MB_TOPMOST | MB_ICONERROR | MB_OK | MB_SETFOREGROUND,
        )
    };

    if result.0 == 0 {
        return Err(windows::core::Error::from_win32());
    }
    Ok(result.0)
}

fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Shows a warning dialog for every `warning-detected` event.
///
/// Each dialog runs on its own thread so the polling loop never waits for
/// the user.
#[derive(Debug, Default, Clone, Copy)]
pub struct WarningDialogSink;

impl NotificationSink for WarningDialogSink {
    fn emit(&self, event: &str, payload: &serde_json::Value) {
        if event != EVENT_WARNING_DETECTED {
            return;
        }

        let display_name = payload["displayName"].as_str().unwrap_or_default();
        let title = payload["title"].as_str().unwrap_or_default();
        let message = warning_message(display_name, title);

        let spawned = std::thread::Builder::new()
            .name("warning-dialog".to_string())
            .spawn(move || {
                if let Err(e) = show_system_warning("Blocked application", &message) {
                    tracing::error!(error = %e, "Failed to show warning dialog");
                }
            });

        if let Err(e) = spawned {
            tracing::error!(error = %e, "Failed to spawn warning dialog thread");
        }
    }
}

fn warning_message(display_name: &str, title: &str) -> String {
    if title.is_empty() {
        format!("{display_name} is on your blocklist.")
    } else {
        format!("{display_name} is on your blocklist.\n\n{title}")
    }
}
