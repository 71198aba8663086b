//! Screen capture for the game window.
//!
//! This module provides:
//! - Window geometry and fractional regions (`geometry`)
//! - Window discovery by title (`WindowLocator`)
//! - Region capture with focus restoration (`RegionCapturer`)
//! - The Win32 screen grab (`screenshot`, Windows only)

pub mod geometry;
pub mod region;
#[cfg(windows)]
pub mod screenshot;
pub mod window;

pub use geometry::{Rect, RelativePoint, RelativeRect};
pub use region::RegionCapturer;
pub use window::WindowLocator;
