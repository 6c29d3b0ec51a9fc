//! Window-related WinAPI wrappers.
//!
//! Provides safe abstractions for focus detection and window text retrieval,
//! and the [`ForegroundWindowQuery`] used by the watcher.

use crate::error::WatchError;
use crate::monitor::{WindowQuery, WindowSnapshot};
use crate::winapi_utils::get_process_name;
use windows::Win32::Foundation::{SetLastError, HWND, WIN32_ERROR};
use windows::Win32::UI::WindowsAndMessaging::{
    GetForegroundWindow, GetWindowTextLengthW, GetWindowTextW, GetWindowThreadProcessId,
};

/// Gets the handle of the currently focused (foreground) window.
///
/// Returns `None` if no window has focus (e.g., lock screen).
///
/// # Example
/// ```no_run
/// use window_monitor::winapi_utils::get_foreground_window;
///
/// if let Some(hwnd) = get_foreground_window() {
///     println!("Foreground window handle: {:?}", hwnd);
/// }
/// ```
pub fn get_foreground_window() -> Option<HWND> {
    let hwnd = unsafe { GetForegroundWindow() };
    if hwnd.0.is_null() {
        None
    } else {
        Some(hwnd)
    }
}

/// Gets the title text of a window, trimmed.
///
/// A window without a title yields an empty string. An error is returned
/// only when the OS reports a failure (e.g., the window was destroyed).
pub fn get_window_text(hwnd: HWND) -> windows::core::Result<String> {
    unsafe {
        // A zero length is ambiguous; the last error tells failures apart
        SetLastError(WIN32_ERROR(0));
        let len = GetWindowTextLengthW(hwnd);
        if len == 0 {
            return last_error_or(String::new());
        }

        // Allocate buffer with space for null terminator
        let mut buffer: Vec<u16> = vec![0; (len + 1) as usize];

        SetLastError(WIN32_ERROR(0));
        let copied = GetWindowTextW(hwnd, &mut buffer);
        if copied == 0 {
            return last_error_or(String::new());
        }

        Ok(String::from_utf16_lossy(&buffer[..copied as usize])
            .trim()
            .to_string())
    }
}

/// Gets the thread ID and process ID of the window's owner.
///
/// # Returns
/// A tuple of `(thread_id, process_id)`. Both will be 0 if the call fails.
pub fn get_window_thread_process_id(hwnd: HWND) -> (u32, u32) {
    let mut process_id: u32 = 0;
    let thread_id = unsafe { GetWindowThreadProcessId(hwnd, Some(&mut process_id)) };
    (thread_id, process_id)
}

fn last_error_or<T>(value: T) -> windows::core::Result<T> {
    let error = windows::core::Error::from_win32();
    if error.code().is_ok() {
        Ok(value)
    } else {
        Err(error)
    }
}

/// Queries the Win32 foreground window.
#[derive(Debug, Default, Clone, Copy)]
pub struct ForegroundWindowQuery;

impl WindowQuery for ForegroundWindowQuery {
    fn query(&self) -> Result<WindowSnapshot, WatchError> {
        let hwnd = get_foreground_window().ok_or(WatchError::NoForegroundWindow)?;

        let title = get_window_text(hwnd)
            .map_err(|e| WatchError::QueryFailed(format!("failed to get window title: {e}")))?;

        let (_, pid) = get_window_thread_process_id(hwnd);
        if pid == 0 {
            return Err(WatchError::QueryFailed("invalid process ID".to_string()));
        }

        let executable = get_process_name(pid)
            .map_err(|e| WatchError::QueryFailed(format!("failed to get process name: {e}")))?;

        Ok(WindowSnapshot::new(title, executable.trim().to_lowercase()))
    }
}
