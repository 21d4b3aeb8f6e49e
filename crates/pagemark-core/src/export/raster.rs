//! Raster exports: composited page images and the pages archive.

use std::io::{Cursor, Write};

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, RgbaImage};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::pipeline::PagePipeline;
use crate::annotate::AnnotationSurface;
use crate::error::ExportError;
use crate::models::PixelSize;
use crate::render::{render_view, PageRasterizer};

/// A composited page encoded as PNG.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub page: u32,
    pub size: PixelSize,
    pub png: Vec<u8>,
}

/// Render `page` and draw its ink, if any, on top.
pub fn render_composited<R: PageRasterizer + ?Sized>(
    rasterizer: &R,
    surface: &AnnotationSurface,
    page: u32,
    scale: f32,
) -> crate::Result<RgbaImage> {
    let (mut image, _) = render_view(rasterizer, page, scale)?;
    if surface.composite(page, &mut image) {
        debug!("Composited ink onto page {}", page);
    }
    Ok(image)
}

pub fn encode_png(image: &RgbaImage) -> crate::Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}

/// Encode as baseline JPEG; alpha is dropped.
pub fn encode_jpeg(image: &RgbaImage, quality: u8) -> crate::Result<Vec<u8>> {
    let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100)).encode_image(&rgb)?;
    Ok(buffer)
}

/// Render and encode every page, one at a time, in ascending order.
pub fn render_pages<R: PageRasterizer + ?Sized>(
    rasterizer: &R,
    surface: &AnnotationSurface,
    scale: f32,
    pipeline: &mut PagePipeline<'_>,
) -> crate::Result<Vec<RenderedPage>> {
    pipeline.run(1..=rasterizer.page_count(), |page| {
        let image = render_composited(rasterizer, surface, page, scale)?;
        Ok(RenderedPage {
            page,
            size: PixelSize::new(image.width() as f64, image.height() as f64),
            png: encode_png(&image)?,
        })
    })
}

/// ZIP archive with one `page-<i>.png` per page.
pub fn pages_zip<R: PageRasterizer + ?Sized>(
    rasterizer: &R,
    surface: &AnnotationSurface,
    scale: f32,
    pipeline: &mut PagePipeline<'_>,
) -> crate::Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    pipeline.run(1..=rasterizer.page_count(), |page| {
        let image = render_composited(rasterizer, surface, page, scale)?;
        let png = encode_png(&image)?;
        zip.start_file(format!("page-{}.png", page), options)
            .map_err(ExportError::from)?;
        zip.write_all(&png)?;
        Ok(())
    })?;

    let cursor = zip.finish().map_err(ExportError::from)?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::{PointerEvent, ToolSettings};
    use crate::layout::Point;
    use crate::models::LayerRetention;
    use crate::render::PrerenderedPages;
    use std::io::Read;

    fn drawn_surface(page: u32, size: PixelSize) -> AnnotationSurface {
        let mut surface = AnnotationSurface::new(ToolSettings::default(), LayerRetention::CurrentPage);
        surface.activate_page(page, size).unwrap();
        surface.handle(PointerEvent::Down(Point::new(0.0, 5.0)));
        surface.handle(PointerEvent::Move(Point::new(20.0, 5.0)));
        surface.handle(PointerEvent::Up(Point::new(20.0, 5.0)));
        surface
    }

    #[test]
    fn test_ink_only_on_annotated_page() {
        let pages = PrerenderedPages::blank(2, 20, 10);
        let surface = drawn_surface(2, PixelSize::new(20.0, 10.0));

        let first = render_composited(&pages, &surface, 1, 1.0).unwrap();
        let second = render_composited(&pages, &surface, 2, 1.0).unwrap();

        assert_eq!(first.get_pixel(10, 5).0, [255, 255, 255, 255]);
        assert_ne!(second.get_pixel(10, 5).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_zip_entries_named_by_page() {
        let pages = PrerenderedPages::blank(3, 8, 8);
        let surface = AnnotationSurface::default();
        let bytes = pages_zip(&pages, &surface, 1.0, &mut PagePipeline::new()).unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let names: Vec<String> = archive.file_names().map(str::to_string).collect();
        assert_eq!(names, vec!["page-1.png", "page-2.png", "page-3.png"]);

        let mut png = Vec::new();
        archive.by_name("page-2.png").unwrap().read_to_end(&mut png).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 8));
    }

    #[test]
    fn test_render_pages_resamples_to_scale() {
        let pages = PrerenderedPages::blank(2, 100, 50);
        let rendered =
            render_pages(&pages, &AnnotationSurface::default(), 0.5, &mut PagePipeline::new()).unwrap();

        assert_eq!(rendered.len(), 2);
        assert_eq!(rendered[1].page, 2);
        assert_eq!(rendered[1].size, PixelSize::new(50.0, 25.0));
    }

    #[test]
    fn test_jpeg_is_smaller_at_low_quality() {
        let image = RgbaImage::from_fn(64, 64, |x, y| image::Rgba([(x * 4) as u8, (y * 4) as u8, 128, 255]));
        let low = encode_jpeg(&image, 10).unwrap();
        let high = encode_jpeg(&image, 95).unwrap();

        assert_eq!(&low[..2], &[0xFF, 0xD8]);
        assert!(low.len() < high.len());
    }
}
