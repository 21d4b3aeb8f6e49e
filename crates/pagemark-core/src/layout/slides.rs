//! Aspect-fit placement of page images onto presentation slides.

use tracing::debug;

use crate::models::config::{CanvasSize, SlideConfig};
use crate::models::PixelSize;

/// Canvas orientation chosen for a whole presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Tall,
    Wide,
}

/// Placement of one page image on its slide, in canvas units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlideBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Canvas plus one box per page.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideLayout {
    pub orientation: Orientation,
    pub canvas: CanvasSize,
    pub boxes: Vec<SlideBox>,
}

/// Computes slide placement for a sequence of page sizes.
///
/// The canvas orientation is decided once from the first page; later pages
/// of a different orientation are letterboxed into the same canvas.
#[derive(Debug, Clone)]
pub struct SlideLayoutEngine {
    tall: CanvasSize,
    wide: CanvasSize,
    margin: f64,
}

impl SlideLayoutEngine {
    pub fn new() -> Self {
        Self::from_config(&SlideConfig::default())
    }

    pub fn from_config(config: &SlideConfig) -> Self {
        Self {
            tall: config.tall,
            wide: config.wide,
            margin: config.margin,
        }
    }

    /// Set the margin applied on all four sides.
    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }

    /// Canvas for a presentation whose first page has the given size.
    pub fn choose_canvas(&self, first: PixelSize) -> (Orientation, CanvasSize) {
        if first.height >= first.width {
            (Orientation::Tall, self.tall)
        } else {
            (Orientation::Wide, self.wide)
        }
    }

    /// Fit one image into the canvas minus margins, centered.
    pub fn fit(&self, canvas: CanvasSize, image: PixelSize) -> SlideBox {
        let box_w = (canvas.width - 2.0 * self.margin).max(0.0);
        let box_h = (canvas.height - 2.0 * self.margin).max(0.0);

        let image_aspect = image.aspect();
        let box_aspect = box_w / box_h;

        let (width, height) = if image_aspect > box_aspect {
            (box_w, box_w / image_aspect)
        } else {
            (box_h * image_aspect, box_h)
        };

        SlideBox {
            x: (canvas.width - width) / 2.0,
            y: (canvas.height - height) / 2.0,
            width,
            height,
        }
    }

    /// Lay out every page; `None` for an empty page list.
    pub fn layout(&self, pages: &[PixelSize]) -> Option<SlideLayout> {
        let first = *pages.first()?;
        let (orientation, canvas) = self.choose_canvas(first);

        let boxes = pages.iter().map(|&page| self.fit(canvas, page)).collect();

        debug!(
            "Slide layout: {:?} canvas {}x{} for {} pages",
            orientation,
            canvas.width,
            canvas.height,
            pages.len()
        );

        Some(SlideLayout {
            orientation,
            canvas,
            boxes,
        })
    }
}

impl Default for SlideLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-6;

    fn assert_contained(layout: &SlideLayout, margin: f64) {
        for b in &layout.boxes {
            assert!(b.x >= margin - TOL, "x {} < margin", b.x);
            assert!(b.y >= margin - TOL, "y {} < margin", b.y);
            assert!(b.x + b.width <= layout.canvas.width - margin + TOL);
            assert!(b.y + b.height <= layout.canvas.height - margin + TOL);
        }
    }

    #[test]
    fn test_portrait_first_page_picks_tall_canvas() {
        let engine = SlideLayoutEngine::new();
        let layout = engine
            .layout(&[PixelSize::new(765.0, 990.0), PixelSize::new(990.0, 765.0)])
            .unwrap();

        assert_eq!(layout.orientation, Orientation::Tall);
        assert_eq!(layout.canvas, CanvasSize { width: 7.5, height: 13.33 });
        assert_contained(&layout, 0.25);
    }

    #[test]
    fn test_square_first_page_counts_as_tall() {
        let (orientation, _) = SlideLayoutEngine::new().choose_canvas(PixelSize::new(500.0, 500.0));
        assert_eq!(orientation, Orientation::Tall);
    }

    #[test]
    fn test_landscape_first_page_picks_wide_canvas() {
        let layout = SlideLayoutEngine::new()
            .layout(&[PixelSize::new(1200.0, 800.0)])
            .unwrap();
        assert_eq!(layout.orientation, Orientation::Wide);
        assert_eq!(layout.canvas.width, 13.33);
    }

    #[test]
    fn test_boxes_preserve_aspect_and_center() {
        let pages = [
            PixelSize::new(765.0, 990.0),
            PixelSize::new(2000.0, 100.0),
            PixelSize::new(100.0, 2000.0),
            PixelSize::new(640.0, 480.0),
        ];
        let layout = SlideLayoutEngine::new().layout(&pages).unwrap();

        for (page, b) in pages.iter().zip(&layout.boxes) {
            assert!((b.width / b.height - page.aspect()).abs() < TOL);
            assert!((b.x * 2.0 + b.width - layout.canvas.width).abs() < TOL);
            assert!((b.y * 2.0 + b.height - layout.canvas.height).abs() < TOL);
        }
        assert_contained(&layout, 0.25);
    }

    #[test]
    fn test_wide_image_fills_box_width() {
        let engine = SlideLayoutEngine::new();
        let canvas = CanvasSize { width: 13.33, height: 7.5 };
        let b = engine.fit(canvas, PixelSize::new(4000.0, 1000.0));
        assert!((b.width - 12.83).abs() < TOL);
        assert!((b.height - 12.83 / 4.0).abs() < TOL);
    }

    #[test]
    fn test_empty_input_has_no_layout() {
        assert!(SlideLayoutEngine::new().layout(&[]).is_none());
    }
}
