//! Pages rasterized elsewhere (by a browser host, or a test) and handed in.

use std::collections::HashMap;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use tracing::debug;

use super::{PageRasterizer, Result};
use crate::error::RenderError;

#[derive(Debug, Clone)]
struct SuppliedPage {
    image: RgbaImage,
    scale: f32,
}

/// Host-supplied page bitmaps, resampled when asked for another scale.
#[derive(Debug, Clone, Default)]
pub struct PrerenderedPages {
    page_count: u32,
    pages: HashMap<u32, SuppliedPage>,
}

impl PrerenderedPages {
    pub fn new(page_count: u32) -> Self {
        Self {
            page_count,
            pages: HashMap::new(),
        }
    }

    /// White pages of one size at scale 1.0.
    pub fn blank(page_count: u32, width: u32, height: u32) -> Self {
        let mut pages = Self::new(page_count);
        for page in 1..=page_count {
            let image = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
            pages.pages.insert(page, SuppliedPage { image, scale: 1.0 });
        }
        pages
    }

    /// Store the bitmap of `page` as rendered at `scale`.
    pub fn supply(&mut self, page: u32, scale: f32, image: RgbaImage) -> Result<()> {
        if page == 0 || page > self.page_count {
            return Err(RenderError::Failed {
                page,
                reason: format!("document has {} pages", self.page_count),
            });
        }
        if !(scale.is_finite() && scale > 0.0) {
            return Err(RenderError::Failed {
                page,
                reason: format!("invalid scale {}", scale),
            });
        }
        debug!("Supplied page {} at {} ({}x{})", page, scale, image.width(), image.height());
        self.pages.insert(page, SuppliedPage { image, scale });
        Ok(())
    }

    /// Store a raw RGBA buffer; its length must match `width * height * 4`.
    pub fn supply_rgba(
        &mut self,
        page: u32,
        scale: f32,
        width: u32,
        height: u32,
        rgba: Vec<u8>,
    ) -> Result<()> {
        let expected = width as usize * height as usize * 4;
        let actual = rgba.len();
        let image = RgbaImage::from_raw(width, height, rgba)
            .ok_or(RenderError::BitmapSize { expected, actual })?;
        self.supply(page, scale, image)
    }

    pub fn has_page(&self, page: u32) -> bool {
        self.pages.contains_key(&page)
    }
}

impl PageRasterizer for PrerenderedPages {
    fn page_count(&self) -> u32 {
        self.page_count
    }

    fn render(&self, page: u32, scale: f32) -> Result<RgbaImage> {
        let supplied = self.pages.get(&page).ok_or(RenderError::NotRendered(page))?;
        if (supplied.scale - scale).abs() < 1e-6 {
            return Ok(supplied.image.clone());
        }

        let ratio = scale / supplied.scale;
        let width = ((supplied.image.width() as f32 * ratio).round() as u32).max(1);
        let height = ((supplied.image.height() as f32 * ratio).round() as u32).max(1);
        Ok(imageops::resize(&supplied.image, width, height, FilterType::Triangle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_resamples_to_requested_scale() {
        let mut pages = PrerenderedPages::new(2);
        pages.supply(1, 1.0, RgbaImage::new(612, 792)).unwrap();

        assert_eq!(pages.render(1, 1.0).unwrap().dimensions(), (612, 792));
        assert_eq!(pages.render(1, 0.5).unwrap().dimensions(), (306, 396));
        assert!(matches!(pages.render(2, 1.0), Err(RenderError::NotRendered(2))));
    }

    #[test]
    fn test_supply_rgba_checks_length() {
        let mut pages = PrerenderedPages::new(1);
        let err = pages.supply_rgba(1, 1.0, 2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(err, RenderError::BitmapSize { expected: 16, actual: 15 }));

        pages.supply_rgba(1, 1.0, 2, 2, vec![0; 16]).unwrap();
        assert!(pages.has_page(1));
    }

    #[test]
    fn test_supply_rejects_out_of_range_page() {
        let mut pages = PrerenderedPages::new(1);
        assert!(pages.supply(2, 1.0, RgbaImage::new(1, 1)).is_err());
        assert!(pages.supply(1, 0.0, RgbaImage::new(1, 1)).is_err());
    }
}
