//! Screen-space geometry shared by capture, input and the controller.
//!
//! Regions are stored as fractions of the game window so they follow the
//! window when it is moved or resized; they are resolved to absolute screen
//! rectangles once per tick.

use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// Rectangle in absolute screen coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// True if the rectangle covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// Centre point, rounded towards negative infinity.
    pub fn center(&self) -> (i32, i32) {
        (
            (self.left + self.right).div_euclid(2),
            (self.top + self.bottom).div_euclid(2),
        )
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.left >= self.left
            && other.top >= self.top
            && other.right <= self.right
            && other.bottom <= self.bottom
    }

    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.left && x <= self.right && y >= self.top && y <= self.bottom
    }
}

/// A rectangle in relative coordinates (0.0 to 1.0) of the window rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelativeRect {
    /// Left edge (0.0 = window left, 1.0 = window right)
    pub left: f64,
    /// Top edge (0.0 = window top, 1.0 = window bottom)
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl RelativeRect {
    pub const fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Resolves the fractions against a window rectangle.
    ///
    /// Each edge is `int(origin + extent * fraction)`, truncated towards zero,
    /// which keeps the result inside `window` for any fraction in `[0, 1]`.
    pub fn resolve(&self, window: &Rect) -> Rect {
        let w = window.width() as f64;
        let h = window.height() as f64;
        Rect {
            left: (window.left as f64 + w * self.left) as i32,
            top: (window.top as f64 + h * self.top) as i32,
            right: (window.left as f64 + w * self.right) as i32,
            bottom: (window.top as f64 + h * self.bottom) as i32,
        }
    }

    /// Checks that every edge is a fraction and the edges are ordered.
    pub fn is_valid(&self) -> bool {
        let unit = 0.0..=1.0;
        unit.contains(&self.left)
            && unit.contains(&self.top)
            && unit.contains(&self.right)
            && unit.contains(&self.bottom)
            && self.left < self.right
            && self.top < self.bottom
    }
}

/// A point in relative coordinates for button centres.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelativePoint {
    /// X position (0.0 = left edge, 1.0 = right edge)
    pub x: f64,
    /// Y position (0.0 = top edge, 1.0 = bottom edge)
    pub y: f64,
}

impl RelativePoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// `origin + int(extent * fraction)` on each axis.
    pub fn resolve(&self, window: &Rect) -> (i32, i32) {
        (
            window.left + (window.width() as f64 * self.x) as i32,
            window.top + (window.height() as f64 * self.y) as i32,
        )
    }

    pub fn is_valid(&self) -> bool {
        (0.0..=1.0).contains(&self.x) && (0.0..=1.0).contains(&self.y)
    }
}

/// True if the image carries no information: empty or every channel zero.
pub fn is_blank(img: &RgbaImage) -> bool {
    img.width() == 0 || img.height() == 0 || img.pixels().all(|p| p[0] == 0 && p[1] == 0 && p[2] == 0)
}
