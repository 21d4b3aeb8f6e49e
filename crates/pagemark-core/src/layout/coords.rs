//! Mapping between render-time pixel space and native page space.
//!
//! Ink is captured in pixels relative to the page as rendered at the active
//! zoom, with the origin at the top-left. The PDF page has its own fixed size
//! with the origin at the bottom-left of its media box. The two axes are
//! scaled independently: stale cached dimensions or non-uniform zoom must
//! still map correctly.

use crate::models::{NativePageSize, PixelSize};

/// A point in either coordinate space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Per-axis affine map from rendered pixels to native page units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    rendered: PixelSize,
    native: NativePageSize,
    sx: f64,
    sy: f64,
}

impl CoordinateMapper {
    /// Create a mapper; `None` when the rendered size is not strictly positive.
    pub fn new(rendered: PixelSize, native: NativePageSize) -> Option<Self> {
        if !rendered.is_valid() {
            return None;
        }
        Some(Self {
            rendered,
            native,
            sx: native.width / rendered.width,
            sy: native.height / rendered.height,
        })
    }

    /// Horizontal scale factor (native units per pixel).
    pub fn sx(&self) -> f64 {
        self.sx
    }

    /// Vertical scale factor (native units per pixel).
    pub fn sy(&self) -> f64 {
        self.sy
    }

    pub fn rendered(&self) -> PixelSize {
        self.rendered
    }

    pub fn native(&self) -> NativePageSize {
        self.native
    }

    /// Target size of the ink image when placed on the native page.
    ///
    /// Always covers the whole native page regardless of the ink resolution.
    pub fn placed_size(&self) -> (f64, f64) {
        (self.rendered.width * self.sx, self.rendered.height * self.sy)
    }

    /// Lower-left corner of the placed ink image in native units.
    pub fn placed_origin(&self) -> Point {
        Point::new(self.native.origin_x, self.native.origin_y)
    }

    /// Map a top-left-origin pixel to a bottom-left-origin page point.
    pub fn screen_to_native(&self, p: Point) -> Point {
        Point::new(
            self.native.origin_x + p.x * self.sx,
            self.native.origin_y + self.native.height - p.y * self.sy,
        )
    }

    /// Inverse of [`screen_to_native`](Self::screen_to_native).
    pub fn native_to_screen(&self, p: Point) -> Point {
        Point::new(
            (p.x - self.native.origin_x) / self.sx,
            (self.native.origin_y + self.native.height - p.y) / self.sy,
        )
    }
}
