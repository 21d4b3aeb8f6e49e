//! Page-level data: rendered views, native page boxes and positioned text.

use serde::{Deserialize, Serialize};

/// Size of a rendered bitmap in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelSize {
    pub width: f64,
    pub height: f64,
}

impl PixelSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Width over height.
    pub fn aspect(&self) -> f64 {
        self.width / self.height
    }

    /// Both dimensions are finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// A page as it was last rendered.
///
/// Recomputed whenever the page index or scale changes; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageView {
    /// Page number (1-indexed).
    pub page: u32,
    /// Scale the page was rendered at.
    pub scale: f32,
    /// Rendered bitmap size.
    pub size: PixelSize,
}

/// The page's own coordinate box in PDF units (MediaBox).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NativePageSize {
    /// Lower-left x of the media box.
    pub origin_x: f64,
    /// Lower-left y of the media box.
    pub origin_y: f64,
    pub width: f64,
    pub height: f64,
}

impl NativePageSize {
    /// US Letter, used when a page carries no media box at all.
    pub const LETTER: NativePageSize = NativePageSize {
        origin_x: 0.0,
        origin_y: 0.0,
        width: 612.0,
        height: 792.0,
    };

    pub fn new(width: f64, height: f64) -> Self {
        Self {
            origin_x: 0.0,
            origin_y: 0.0,
            width,
            height,
        }
    }

    /// Build from a `[llx lly urx ury]` rectangle, normalizing swapped corners.
    pub fn from_rect(rect: [f64; 4]) -> Self {
        let (x0, x1) = if rect[0] <= rect[2] { (rect[0], rect[2]) } else { (rect[2], rect[0]) };
        let (y0, y1) = if rect[1] <= rect[3] { (rect[1], rect[3]) } else { (rect[3], rect[1]) };
        Self {
            origin_x: x0,
            origin_y: y0,
            width: x1 - x0,
            height: y1 - y0,
        }
    }
}

/// One run of extracted text with its position.
///
/// `x` and `y` are in native page units with the origin at the bottom-left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextGlyph {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
}

impl TextGlyph {
    pub fn new(text: impl Into<String>, x: f32, y: f32, width: f32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            width,
        }
    }
}
