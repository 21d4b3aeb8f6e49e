//! Transparent raster layer holding a page's ink.
//!
//! Pixels are premultiplied while drawing (tiny-skia's native format) and
//! converted to straight RGBA on the way out.

use image::{imageops, RgbaImage};
use tiny_skia::{
    BlendMode, FillRule, FilterQuality, LineCap, LineJoin, Paint, PathBuilder, Pixmap,
    PixmapPaint, PremultipliedColorU8, Rect, Stroke, Transform,
};

use super::color::Color;
use crate::error::AnnotationError;
use crate::layout::Point;
use crate::models::PixelSize;

/// How a mark combines with ink already on the layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InkMode {
    /// Normal source-over painting.
    Paint,
    /// Removes existing ink under the mark.
    Erase,
    /// Multiplies with existing ink.
    Highlight,
}

impl InkMode {
    fn blend_mode(self) -> BlendMode {
        match self {
            InkMode::Paint => BlendMode::SourceOver,
            InkMode::Erase => BlendMode::DestinationOut,
            InkMode::Highlight => BlendMode::Multiply,
        }
    }
}

/// One page's ink, in rendered-pixel space.
#[derive(Debug, Clone)]
pub struct InkLayer {
    pixmap: Pixmap,
}

impl InkLayer {
    /// Fully transparent layer.
    pub fn new(width: u32, height: u32) -> Result<Self, AnnotationError> {
        let pixmap = Pixmap::new(width, height).ok_or(AnnotationError::Layer { width, height })?;
        Ok(Self { pixmap })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn size(&self) -> PixelSize {
        PixelSize::new(self.width() as f64, self.height() as f64)
    }

    /// True when no pixel carries any ink.
    pub fn is_blank(&self) -> bool {
        self.pixmap.pixels().iter().all(|p| p.alpha() == 0)
    }

    /// Remove all ink.
    pub fn clear(&mut self) {
        self.pixmap.fill(tiny_skia::Color::TRANSPARENT);
    }

    fn paint(color: Color, mode: InkMode) -> Paint<'static> {
        let mut paint = Paint::default();
        // Destination-out only looks at source alpha; an opaque source erases fully.
        let color = if mode == InkMode::Erase { Color::BLACK } else { color };
        paint.set_color(color.to_skia());
        paint.blend_mode = mode.blend_mode();
        paint.anti_alias = true;
        paint
    }

    /// Draw one segment of a freehand stroke with round caps and joins.
    ///
    /// A zero-length segment leaves a dot of the stroke width.
    pub fn stroke_segment(&mut self, from: Point, to: Point, color: Color, width: f32, mode: InkMode) {
        let paint = Self::paint(color, mode);
        let width = width.max(0.1);

        if from == to {
            if let Some(dot) = PathBuilder::from_circle(from.x as f32, from.y as f32, width / 2.0) {
                self.pixmap
                    .fill_path(&dot, &paint, FillRule::Winding, Transform::identity(), None);
            }
            return;
        }

        let mut pb = PathBuilder::new();
        pb.move_to(from.x as f32, from.y as f32);
        pb.line_to(to.x as f32, to.y as f32);
        let Some(path) = pb.finish() else {
            return;
        };

        let stroke = Stroke {
            width,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }

    /// Fill the rectangle spanned by two corners, in any order.
    pub fn fill_rect(&mut self, a: Point, b: Point, color: Color, mode: InkMode) {
        let left = a.x.min(b.x) as f32;
        let top = a.y.min(b.y) as f32;
        let width = (a.x - b.x).abs() as f32;
        let height = (a.y - b.y).abs() as f32;

        if let Some(rect) = Rect::from_xywh(left, top, width, height) {
            let paint = Self::paint(color, mode);
            self.pixmap.fill_rect(rect, &paint, Transform::identity(), None);
        }
    }

    /// Blend an 8-bit coverage mask (a rasterized glyph) in `color`.
    pub fn draw_coverage(&mut self, x: i32, y: i32, width: u32, height: u32, coverage: &[u8], color: Color) {
        let Some(mut glyph) = Pixmap::new(width, height) else {
            return;
        };
        for (px, &cov) in glyph.pixels_mut().iter_mut().zip(coverage) {
            let a = (color.a as u32 * cov as u32 / 255) as u8;
            let premul = |c: u8| (c as u32 * a as u32 / 255) as u8;
            if let Some(value) =
                PremultipliedColorU8::from_rgba(premul(color.r), premul(color.g), premul(color.b), a)
            {
                *px = value;
            }
        }
        self.pixmap.draw_pixmap(
            x,
            y,
            glyph.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }

    /// Copy of this layer stretched to a new pixel size.
    pub fn resampled(&self, width: u32, height: u32) -> Result<Self, AnnotationError> {
        let mut target = Self::new(width, height)?;
        let sx = width as f32 / self.width() as f32;
        let sy = height as f32 / self.height() as f32;
        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        target
            .pixmap
            .draw_pixmap(0, 0, self.pixmap.as_ref(), &paint, Transform::from_scale(sx, sy), None);
        Ok(target)
    }

    /// Straight-alpha copy of the layer.
    pub fn to_rgba_image(&self) -> RgbaImage {
        let mut data = Vec::with_capacity(self.pixmap.pixels().len() * 4);
        for px in self.pixmap.pixels() {
            let c = px.demultiply();
            data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        RgbaImage::from_raw(self.width(), self.height(), data)
            .unwrap_or_else(|| RgbaImage::new(self.width(), self.height()))
    }

    /// Draw this layer over a base render, stretched to the base size if needed.
    pub fn composite_onto(&self, base: &mut RgbaImage) {
        let mut ink = self.to_rgba_image();
        if ink.dimensions() != base.dimensions() {
            ink = imageops::resize(&ink, base.width(), base.height(), imageops::FilterType::Triangle);
        }
        imageops::overlay(base, &ink, 0, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const RED: Color = Color { r: 255, g: 0, b: 0, a: 255 };

    fn alpha_at(layer: &InkLayer, x: u32, y: u32) -> u8 {
        layer.to_rgba_image().get_pixel(x, y).0[3]
    }

    #[test]
    fn test_stroke_then_erase() {
        let mut layer = InkLayer::new(100, 100).unwrap();
        layer.stroke_segment(Point::new(10.0, 50.0), Point::new(90.0, 50.0), RED, 6.0, InkMode::Paint);
        assert_eq!(alpha_at(&layer, 50, 50), 255);
        assert_eq!(alpha_at(&layer, 50, 10), 0);

        layer.stroke_segment(Point::new(40.0, 50.0), Point::new(60.0, 50.0), RED, 18.0, InkMode::Erase);
        assert_eq!(alpha_at(&layer, 50, 50), 0);
        assert_eq!(alpha_at(&layer, 20, 50), 255);
    }

    #[test]
    fn test_erase_with_transparent_colour_still_erases() {
        let mut layer = InkLayer::new(20, 20).unwrap();
        layer.fill_rect(Point::new(0.0, 0.0), Point::new(20.0, 20.0), RED, InkMode::Paint);
        let transparent = Color::new(0, 0, 0, 0);
        layer.fill_rect(Point::new(0.0, 0.0), Point::new(10.0, 20.0), transparent, InkMode::Erase);

        assert_eq!(alpha_at(&layer, 5, 5), 0);
        assert_eq!(alpha_at(&layer, 15, 5), 255);
    }

    #[test]
    fn test_dot_for_zero_length_segment() {
        let mut layer = InkLayer::new(20, 20).unwrap();
        let p = Point::new(10.0, 10.0);
        layer.stroke_segment(p, p, RED, 6.0, InkMode::Paint);
        assert!(alpha_at(&layer, 10, 10) > 200);
    }

    #[test]
    fn test_highlight_rect_normalizes_corners() {
        let mut layer = InkLayer::new(50, 50).unwrap();
        let yellow = Color::rgb(255, 255, 0).with_alpha(0.2);
        layer.fill_rect(Point::new(40.0, 40.0), Point::new(10.0, 10.0), yellow, InkMode::Highlight);

        let px = layer.to_rgba_image().get_pixel(25, 25).0;
        assert_eq!(px[3], 51);
        assert_eq!(alpha_at(&layer, 5, 5), 0);
    }

    #[test]
    fn test_resampled_keeps_registration() {
        let mut layer = InkLayer::new(100, 100).unwrap();
        layer.fill_rect(Point::new(0.0, 0.0), Point::new(50.0, 100.0), RED, InkMode::Paint);

        let bigger = layer.resampled(200, 200).unwrap();
        assert_eq!(bigger.size(), PixelSize::new(200.0, 200.0));
        assert_eq!(alpha_at(&bigger, 20, 100), 255);
        assert_eq!(alpha_at(&bigger, 180, 100), 0);
    }

    #[test]
    fn test_composite_puts_ink_over_base() {
        let mut base = RgbaImage::from_pixel(10, 10, Rgba([255, 255, 255, 255]));
        let mut layer = InkLayer::new(10, 10).unwrap();
        layer.fill_rect(Point::new(0.0, 0.0), Point::new(5.0, 10.0), RED, InkMode::Paint);

        layer.composite_onto(&mut base);
        assert_eq!(base.get_pixel(2, 2).0, [255, 0, 0, 255]);
        assert_eq!(base.get_pixel(8, 2).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_blank_and_clear() {
        let mut layer = InkLayer::new(10, 10).unwrap();
        assert!(layer.is_blank());
        layer.stroke_segment(Point::new(1.0, 1.0), Point::new(8.0, 8.0), RED, 2.0, InkMode::Paint);
        assert!(!layer.is_blank());
        layer.clear();
        assert!(layer.is_blank());
    }

    #[test]
    fn test_zero_size_layer_is_an_error() {
        assert!(matches!(
            InkLayer::new(0, 10),
            Err(AnnotationError::Layer { width: 0, height: 10 })
        ));
    }
}
