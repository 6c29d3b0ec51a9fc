//! Windows message loop utilities.
//!
//! The tray icon needs a message pump on the thread that created it. The
//! loop runs on the main thread until [`post_quit_message`] is called from
//! any thread (tray menu, Ctrl+C handler).

use std::sync::atomic::{AtomicU32, Ordering};
use windows::Win32::Foundation::{LPARAM, WPARAM};
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::WindowsAndMessaging::{
    DispatchMessageW, GetMessageW, PostThreadMessageW, TranslateMessage, MSG, WM_QUIT,
};

/// Thread running the message loop, 0 until the loop starts.
static LOOP_THREAD_ID: AtomicU32 = AtomicU32::new(0);

/// Runs the Windows message loop until a WM_QUIT message is received.
///
/// Blocks the calling thread.
pub fn run_message_loop() {
    let thread_id = unsafe { GetCurrentThreadId() };
    LOOP_THREAD_ID.store(thread_id, Ordering::SeqCst);

    tracing::debug!(thread_id, "Message loop starting");

    let mut msg = MSG::default();

    unsafe {
        // 0 on WM_QUIT, -1 on error
        while GetMessageW(&mut msg, None, 0, 0).as_bool() {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }

    LOOP_THREAD_ID.store(0, Ordering::SeqCst);
    tracing::debug!("Message loop exited");
}

/// Posts WM_QUIT to the thread running [`run_message_loop`].
///
/// Safe to call from any thread. Does nothing if the loop is not running.
pub fn post_quit_message(exit_code: i32) {
    let thread_id = LOOP_THREAD_ID.load(Ordering::SeqCst);

    if thread_id == 0 {
        tracing::warn!("Message loop not running, cannot post quit message");
        return;
    }

    let result = unsafe {
        PostThreadMessageW(thread_id, WM_QUIT, WPARAM(exit_code as usize), LPARAM(0))
    };

    match result {
        Ok(()) => tracing::debug!(exit_code, thread_id, "Posted quit message"),
        Err(e) => tracing::error!(error = %e, "Failed to post quit message"),
    }
}
