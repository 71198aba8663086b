//! GUI module for the application.
//!
//! Provides the control panel using egui/eframe: start/stop buttons, the
//! session log and the help link.

#[cfg(windows)]
mod app;
#[cfg(windows)]
pub mod render;
pub mod state;

#[cfg(windows)]
pub use app::{build_backend, run_gui};
