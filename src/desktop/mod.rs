//! The operating-system capability surface used by the polling loop.
//!
//! Everything the assistant needs from the OS goes through [`Desktop`]:
//! window lookup by title, window rectangle, focus restoration, screen grab
//! and synthetic mouse messages. The Win32 implementation lives behind
//! `cfg(windows)`; tests drive the controller through [`fake::FakeDesktop`].

#[cfg(test)]
pub mod fake;

use image::RgbaImage;

use crate::capture::geometry::Rect;
use crate::error::Result;

/// Opaque reference to a top-level window.
///
/// Stored as the raw handle value so it can cross thread boundaries; the
/// window is never owned and may disappear at any time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub isize);

/// Primary-button messages delivered directly to a window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MouseMessage {
    LeftDown,
    LeftUp,
}

/// OS operations needed by capture, input and window tracking.
pub trait Desktop: Send {
    /// Enumerates top-level windows and returns the first whose title contains `title`.
    fn find_window(&self, title: &str) -> Result<WindowHandle>;

    /// Outer rectangle of the window in screen coordinates.
    ///
    /// Fails with `InvalidHandle` when the handle no longer refers to a live window.
    fn window_rect(&self, hwnd: WindowHandle) -> Result<Rect>;

    /// Restores the window if minimized and brings it to the foreground.
    fn focus_window(&self, hwnd: WindowHandle) -> Result<()>;

    /// Grabs the pixels of a screen region.
    fn grab_screen(&self, rect: Rect) -> Result<RgbaImage>;

    /// Sends a mouse message at window-relative coordinates without moving the cursor.
    fn send_mouse(&self, hwnd: WindowHandle, message: MouseMessage, x: i32, y: i32) -> Result<()>;
}

/// The real desktop, backed by Win32.
#[cfg(windows)]
#[derive(Clone, Copy, Debug, Default)]
pub struct Win32Desktop;

#[cfg(windows)]
impl Desktop for Win32Desktop {
    fn find_window(&self, title: &str) -> Result<WindowHandle> {
        crate::capture::window::find_window_by_title(title)
    }

    fn window_rect(&self, hwnd: WindowHandle) -> Result<Rect> {
        crate::capture::window::get_window_rect(hwnd)
    }

    fn focus_window(&self, hwnd: WindowHandle) -> Result<()> {
        crate::capture::window::restore_and_focus(hwnd)
    }

    fn grab_screen(&self, rect: Rect) -> Result<RgbaImage> {
        crate::capture::screenshot::grab_screen_region(rect)
    }

    fn send_mouse(&self, hwnd: WindowHandle, message: MouseMessage, x: i32, y: i32) -> Result<()> {
        crate::automation::input::send_mouse_message(hwnd, message, x, y)
    }
}
