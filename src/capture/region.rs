//! Region capture with best-effort window focus restoration.

use image::RgbaImage;
use std::time::Duration;
use tracing::{debug, warn};

use crate::capture::geometry::Rect;
use crate::desktop::{Desktop, WindowHandle};

/// Produces the pixels of a screen region belonging to the game window.
pub struct RegionCapturer<'a> {
    desktop: &'a dyn Desktop,
    settle: Duration,
}

impl<'a> RegionCapturer<'a> {
    pub fn new(desktop: &'a dyn Desktop, settle: Duration) -> Self {
        Self { desktop, settle }
    }

    /// Captures `rect`, never failing.
    ///
    /// The window is restored and focused first; errors there are ignored.
    /// If the grab itself fails, a black image of the requested size is
    /// returned so the caller sees "no information" and retries next tick.
    pub fn capture(&self, hwnd: WindowHandle, rect: Rect) -> RgbaImage {
        if let Err(e) = self.desktop.focus_window(hwnd) {
            debug!("focus restoration skipped: {}", e);
        }
        std::thread::sleep(self.settle);

        match self.desktop.grab_screen(rect) {
            Ok(img) => img,
            Err(e) => {
                warn!("截图失败: {}", e);
                RgbaImage::new(rect.width().max(0) as u32, rect.height().max(0) as u32)
            }
        }
    }
}
