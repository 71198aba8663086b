//! In-memory desktop used by the controller and runner tests.

use image::{Rgba, RgbaImage};
use std::sync::{Arc, Mutex};

use super::{Desktop, MouseMessage, WindowHandle};
use crate::capture::geometry::Rect;
use crate::error::{QuizError, Result};

/// A recorded call against the fake desktop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Find(String),
    Focus(WindowHandle),
    Grab(Rect),
    Mouse(MouseMessage, i32, i32),
}

#[derive(Debug)]
struct Inner {
    title: String,
    rect: Option<Rect>,
    fail_focus: bool,
    fail_grab: bool,
    fail_mouse: bool,
    calls: Vec<Call>,
}

/// Fake desktop with one window at a fixed rectangle.
///
/// Clones share state, so a test can keep a handle for assertions after
/// moving the desktop into a controller or worker thread.
#[derive(Clone, Debug)]
pub struct FakeDesktop {
    inner: Arc<Mutex<Inner>>,
}

pub const FAKE_HWND: WindowHandle = WindowHandle(0x1234);

impl FakeDesktop {
    pub fn new(title: &str, rect: Rect) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                title: title.to_string(),
                rect: Some(rect),
                fail_focus: false,
                fail_grab: false,
                fail_mouse: false,
                calls: Vec::new(),
            })),
        }
    }

    /// Closes the window: lookups fail and the handle becomes stale.
    pub fn close_window(&self) {
        self.inner.lock().unwrap().rect = None;
    }

    pub fn fail_focus(&self) {
        self.inner.lock().unwrap().fail_focus = true;
    }

    pub fn fail_grab(&self) {
        self.inner.lock().unwrap().fail_grab = true;
    }

    pub fn fail_mouse(&self) {
        self.inner.lock().unwrap().fail_mouse = true;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Window-relative mouse-down positions, in delivery order.
    pub fn clicks(&self) -> Vec<(i32, i32)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Mouse(MouseMessage::LeftDown, x, y) => Some((x, y)),
                _ => None,
            })
            .collect()
    }

    pub fn grabs(&self) -> Vec<Rect> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Grab(rect) => Some(rect),
                _ => None,
            })
            .collect()
    }
}

impl Desktop for FakeDesktop {
    fn find_window(&self, title: &str) -> Result<WindowHandle> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(Call::Find(title.to_string()));
        if inner.rect.is_some() && inner.title.contains(title) {
            Ok(FAKE_HWND)
        } else {
            Err(QuizError::window_not_found(title))
        }
    }

    fn window_rect(&self, hwnd: WindowHandle) -> Result<Rect> {
        let inner = self.inner.lock().unwrap();
        match inner.rect {
            Some(rect) if hwnd == FAKE_HWND => Ok(rect),
            _ => Err(QuizError::InvalidHandle),
        }
    }

    fn focus_window(&self, hwnd: WindowHandle) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(Call::Focus(hwnd));
        if inner.fail_focus {
            return Err(QuizError::capture("SetForegroundWindow refused"));
        }
        Ok(())
    }

    fn grab_screen(&self, rect: Rect) -> Result<RgbaImage> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(Call::Grab(rect));
        if inner.fail_grab {
            return Err(QuizError::capture("BitBlt failed"));
        }
        if rect.is_empty() {
            return Err(QuizError::capture("zero-size region"));
        }
        Ok(RgbaImage::from_pixel(
            rect.width() as u32,
            rect.height() as u32,
            Rgba([200, 200, 200, 255]),
        ))
    }

    fn send_mouse(&self, hwnd: WindowHandle, message: MouseMessage, x: i32, y: i32) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.rect.is_none() || hwnd != FAKE_HWND {
            return Err(QuizError::InvalidHandle);
        }
        if inner.fail_mouse {
            return Err(QuizError::input("SendMessageW failed"));
        }
        inner.calls.push(Call::Mouse(message, x, y));
        Ok(())
    }
}
