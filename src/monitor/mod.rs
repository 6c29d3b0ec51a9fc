//! Core monitoring logic.
//!
//! This module contains the foreground window watcher, the blocklist it
//! consults and the sinks it reports to.

pub mod blocklist;
pub mod sink;
pub mod watcher;

pub use blocklist::*;
pub use sink::*;
pub use watcher::*;
