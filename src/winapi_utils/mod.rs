//! Safe wrappers around Windows API calls.
//!
//! This module provides safe Rust abstractions over unsafe WinAPI functions
//! for foreground window queries, process information, the message loop,
//! the autostart registry entry and the topmost warning dialog.

pub mod autostart;
pub mod message_box;
pub mod message_loop;
pub mod process;
pub mod window;

pub use message_box::*;
pub use message_loop::*;
pub use process::*;
pub use window::*;
