//! Page rasterization.
//!
//! The core never parses drawing operators itself; a [`PageRasterizer`]
//! turns a page index and scale into a bitmap.

#[cfg(feature = "native")]
mod pdfium;
mod prerendered;

#[cfg(feature = "native")]
pub use pdfium::PdfiumRasterizer;
pub use prerendered::PrerenderedPages;

use image::RgbaImage;
use tracing::trace;

use crate::error::{PdfError, RenderError};
use crate::models::{PageView, PixelSize};

/// Result type for rasterization.
pub type Result<T> = std::result::Result<T, RenderError>;

/// Something that can produce a bitmap for one page.
pub trait PageRasterizer {
    /// Number of pages available.
    fn page_count(&self) -> u32;

    /// Render a 1-indexed page at `scale` (1.0 = one pixel per PDF unit).
    fn render(&self, page: u32, scale: f32) -> Result<RgbaImage>;
}

impl<R: PageRasterizer + ?Sized> PageRasterizer for &R {
    fn page_count(&self) -> u32 {
        (**self).page_count()
    }

    fn render(&self, page: u32, scale: f32) -> Result<RgbaImage> {
        (**self).render(page, scale)
    }
}

/// Render one page and describe the result.
///
/// Rejects pages outside `[1, page_count]` and non-positive scales before
/// the backend sees them.
pub fn render_view<R: PageRasterizer + ?Sized>(
    rasterizer: &R,
    page: u32,
    scale: f32,
) -> crate::Result<(RgbaImage, PageView)> {
    if page == 0 || page > rasterizer.page_count() {
        return Err(PdfError::InvalidPage(page).into());
    }
    if !(scale.is_finite() && scale > 0.0) {
        return Err(RenderError::Failed {
            page,
            reason: format!("invalid scale {}", scale),
        }
        .into());
    }

    let image = rasterizer.render(page, scale)?;
    let size = PixelSize::new(image.width() as f64, image.height() as f64);
    trace!("Rendered page {} at {}: {}x{}", page, scale, image.width(), image.height());

    Ok((image, PageView { page, scale, size }))
}
