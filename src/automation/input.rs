//! Mouse input for the game window.
//!
//! Clicks are delivered as WM_LBUTTONDOWN / WM_LBUTTONUP messages sent
//! straight to the window, so the real cursor never moves and the game does
//! not need to be under the mouse.

use std::time::Duration;
use tracing::{debug, warn};

use crate::automation::config::AssistantConfig;
use crate::automation::stop::StopSignal;
use crate::capture::geometry::Rect;
use crate::desktop::{Desktop, MouseMessage, WindowHandle};
use crate::error::QuizError;

/// Window-relative screen position of the answer button for `letter`.
///
/// The letter is compared after trimming and upper-casing; anything other
/// than A or B has no position.
pub fn answer_point(window: &Rect, letter: &str, config: &AssistantConfig) -> Option<(i32, i32)> {
    match letter.trim().to_uppercase().as_str() {
        "A" => Some(config.answer_a.resolve(window)),
        "B" => Some(config.answer_b.resolve(window)),
        _ => None,
    }
}

/// Delivers synthetic clicks to the game window.
pub struct InputSynthesizer<'a> {
    desktop: &'a dyn Desktop,
    hold: Duration,
    stop: StopSignal,
}

impl<'a> InputSynthesizer<'a> {
    pub fn new(desktop: &'a dyn Desktop, hold: Duration, stop: StopSignal) -> Self {
        Self {
            desktop,
            hold,
            stop,
        }
    }

    /// Clicks at screen coordinates `(x, y)`.
    ///
    /// Coordinates are translated against the window's current outer
    /// rectangle. Returns `false` without delivering anything when a stop
    /// has been requested or the handle is stale. A press that was delivered
    /// is always followed by its release.
    pub fn click(&self, hwnd: WindowHandle, x: i32, y: i32) -> bool {
        if self.stop.is_stopped() {
            debug!("click suppressed: stop requested");
            return false;
        }

        let rect = match self.desktop.window_rect(hwnd) {
            Ok(rect) => rect,
            Err(QuizError::InvalidHandle) => {
                warn!("无效的窗口句柄");
                return false;
            }
            Err(e) => {
                warn!("点击操作失败: {}", e);
                return false;
            }
        };
        let (rel_x, rel_y) = (x - rect.left, y - rect.top);

        if let Err(e) = self.desktop.send_mouse(hwnd, MouseMessage::LeftDown, rel_x, rel_y) {
            warn!("点击操作失败: {}", e);
            return false;
        }
        std::thread::sleep(self.hold);
        if let Err(e) = self.desktop.send_mouse(hwnd, MouseMessage::LeftUp, rel_x, rel_y) {
            warn!("点击操作失败: {}", e);
            return false;
        }

        debug!(rel_x, rel_y, "click delivered");
        true
    }
}

/// Packs window-relative coordinates the way MAKELONG does: x low, y high.
pub fn pack_coordinates(x: i32, y: i32) -> isize {
    (((y as u16 as u32) << 16) | (x as u16 as u32)) as i32 as isize
}

#[cfg(windows)]
pub use win32::send_mouse_message;

#[cfg(windows)]
mod win32 {
    use windows::Win32::Foundation::{LPARAM, WPARAM};
    use windows::Win32::UI::WindowsAndMessaging::{
        IsWindow, SendMessageW, WM_LBUTTONDOWN, WM_LBUTTONUP,
    };

    use super::pack_coordinates;
    use crate::capture::window::to_hwnd;
    use crate::desktop::{MouseMessage, WindowHandle};
    use crate::error::{QuizError, Result};

    /// MK_LBUTTON: the primary button is down.
    const MK_LBUTTON: usize = 0x0001;

    /// Sends one mouse message synchronously to the window.
    pub fn send_mouse_message(
        handle: WindowHandle,
        message: MouseMessage,
        x: i32,
        y: i32,
    ) -> Result<()> {
        let hwnd = to_hwnd(handle);
        let msg = match message {
            MouseMessage::LeftDown => WM_LBUTTONDOWN,
            MouseMessage::LeftUp => WM_LBUTTONUP,
        };
        unsafe {
            if !IsWindow(hwnd).as_bool() {
                return Err(QuizError::InvalidHandle);
            }
            SendMessageW(hwnd, msg, WPARAM(MK_LBUTTON), LPARAM(pack_coordinates(x, y)));
        }
        Ok(())
    }
}
