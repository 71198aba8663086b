//! Window discovery for the game window, matched by title substring.

use tracing::debug;

use crate::capture::geometry::Rect;
use crate::desktop::{Desktop, WindowHandle};
use crate::error::Result;

/// Finds and tracks the target window.
///
/// Every call enumerates afresh: the game may be closed and reopened
/// between ticks, so handles are never cached here.
pub struct WindowLocator<'a> {
    desktop: &'a dyn Desktop,
}

impl<'a> WindowLocator<'a> {
    pub fn new(desktop: &'a dyn Desktop) -> Self {
        Self { desktop }
    }

    /// Returns the first top-level window whose title contains `title`.
    pub fn locate(&self, title: &str) -> Result<WindowHandle> {
        let hwnd = self.desktop.find_window(title)?;
        debug!(?hwnd, title, "located window");
        Ok(hwnd)
    }

    /// Current outer rectangle of the window.
    pub fn rectangle(&self, hwnd: WindowHandle) -> Result<Rect> {
        self.desktop.window_rect(hwnd)
    }

    /// Locates the window and reads its rectangle in one step.
    pub fn locate_with_rect(&self, title: &str) -> Result<(WindowHandle, Rect)> {
        let hwnd = self.locate(title)?;
        let rect = self.rectangle(hwnd)?;
        Ok((hwnd, rect))
    }
}

#[cfg(windows)]
pub use win32::{find_window_by_title, get_window_rect, restore_and_focus, to_hwnd};

#[cfg(windows)]
mod win32 {
    use std::ffi::OsString;
    use std::os::windows::ffi::OsStringExt;

    use windows::Win32::Foundation::{BOOL, HWND, LPARAM, RECT, TRUE};
    use windows::Win32::UI::WindowsAndMessaging::{
        EnumWindows, GetWindowPlacement, GetWindowRect, GetWindowTextLengthW, GetWindowTextW,
        IsWindow, SetForegroundWindow, ShowWindow, SW_RESTORE, SW_SHOWMINIMIZED, WINDOWPLACEMENT,
    };

    use crate::capture::geometry::Rect;
    use crate::desktop::WindowHandle;
    use crate::error::{QuizError, Result};

    /// Rebuilds the Win32 handle from its thread-safe raw value.
    pub fn to_hwnd(handle: WindowHandle) -> HWND {
        HWND(handle.0 as *mut std::ffi::c_void)
    }

    fn window_title(hwnd: HWND) -> String {
        unsafe {
            let title_len = GetWindowTextLengthW(hwnd);
            if title_len <= 0 {
                return String::new();
            }
            let mut title_buf: Vec<u16> = vec![0; (title_len + 1) as usize];
            let copied = GetWindowTextW(hwnd, &mut title_buf);
            if copied <= 0 {
                return String::new();
            }
            OsString::from_wide(&title_buf[..copied as usize])
                .to_string_lossy()
                .to_string()
        }
    }

    /// Enumerates all top-level windows and returns the first whose title
    /// contains `title`.
    pub fn find_window_by_title(title: &str) -> Result<WindowHandle> {
        struct EnumData<'a> {
            needle: &'a str,
            hwnd: Option<HWND>,
        }

        unsafe extern "system" fn enum_callback(hwnd: HWND, lparam: LPARAM) -> BOOL {
            unsafe {
                let data = &mut *(lparam.0 as *mut EnumData);
                let title = window_title(hwnd);
                if !title.is_empty() && title.contains(data.needle) {
                    data.hwnd = Some(hwnd);
                    return BOOL(0); // Stop enumeration
                }
                TRUE
            }
        }

        let mut data = EnumData {
            needle: title,
            hwnd: None,
        };
        unsafe {
            // EnumWindows reports FALSE when the callback stops it early
            let _ = EnumWindows(Some(enum_callback), LPARAM(&mut data as *mut _ as isize));
        }

        data.hwnd
            .map(|hwnd| WindowHandle(hwnd.0 as isize))
            .ok_or_else(|| QuizError::window_not_found(title))
    }

    /// Outer window rectangle, or `InvalidHandle` if the window is gone.
    pub fn get_window_rect(handle: WindowHandle) -> Result<Rect> {
        let hwnd = to_hwnd(handle);
        unsafe {
            if !IsWindow(hwnd).as_bool() {
                return Err(QuizError::InvalidHandle);
            }
            let mut rect = RECT::default();
            GetWindowRect(hwnd, &mut rect).map_err(|_| QuizError::InvalidHandle)?;
            Ok(Rect::new(rect.left, rect.top, rect.right, rect.bottom))
        }
    }

    /// Restores a minimized window and brings it to the foreground.
    pub fn restore_and_focus(handle: WindowHandle) -> Result<()> {
        let hwnd = to_hwnd(handle);
        unsafe {
            if !IsWindow(hwnd).as_bool() {
                return Err(QuizError::InvalidHandle);
            }
            let mut placement = WINDOWPLACEMENT {
                length: std::mem::size_of::<WINDOWPLACEMENT>() as u32,
                ..Default::default()
            };
            GetWindowPlacement(hwnd, &mut placement)
                .map_err(|e| QuizError::capture(format!("GetWindowPlacement: {}", e)))?;
            if placement.showCmd == SW_SHOWMINIMIZED.0 as u32 {
                let _ = ShowWindow(hwnd, SW_RESTORE);
            }
            if !SetForegroundWindow(hwnd).as_bool() {
                return Err(QuizError::capture("SetForegroundWindow refused"));
            }
        }
        Ok(())
    }
}
