//! Exports that produce a PDF: ink overlay, merge, split, compress, watermark.
//!
//! Each returns `Ok(None)` when its precondition is absent so callers can
//! treat the request as a no-op.

use tracing::debug;

use super::pipeline::PagePipeline;
use super::raster::encode_jpeg;
use crate::annotate::{AnnotationSurface, Color};
use crate::layout::CoordinateMapper;
use crate::models::config::{CompressConfig, WatermarkConfig};
use crate::pdf::{
    build_image_pdf, merge_documents, parse_page_range, save_document, split_range, stamp_image,
    watermark_pages, InkStamp, JpegPage, PdfDocument, TextSource, WatermarkStyle,
};
use crate::render::{render_view, PageRasterizer};

/// Stamp the ink layer of each listed page onto a copy of the document.
///
/// Ink is stretched over the whole native page. A layer with no strokes is
/// stamped like any other, so a rendered page always yields a document.
/// Pages that were never rendered have no layer and are skipped; `None` when
/// no listed page has one.
pub fn overlay_pdf(
    document: &PdfDocument,
    surface: &AnnotationSurface,
    pages: &[u32],
) -> crate::Result<Option<Vec<u8>>> {
    let mut doc = document.to_document();
    let mut stamped = 0;

    for &page in pages {
        let Some(layer) = surface.layer(page) else {
            continue;
        };
        let Some(mapper) = CoordinateMapper::new(layer.size(), document.page_size(page)?) else {
            continue;
        };

        let ink = layer.to_rgba_image();
        stamp_image(&mut doc, page, &InkStamp::from_mapper(&ink, &mapper))?;
        debug!("Overlay page {}: sx {:.4}, sy {:.4}", page, mapper.sx(), mapper.sy());
        stamped += 1;
    }

    if stamped == 0 {
        debug!("No ink layer to overlay");
        return Ok(None);
    }
    Ok(Some(save_document(&mut doc)?))
}

/// Concatenate the current document (if any) and each file, in order.
pub fn merge_pdfs(current: Option<&PdfDocument>, files: &[Vec<u8>]) -> crate::Result<Option<Vec<u8>>> {
    let mut documents = Vec::with_capacity(files.len() + 1);
    if let Some(current) = current {
        documents.push(current.to_document());
    }
    for bytes in files {
        documents.push(PdfDocument::load(bytes)?.to_document());
    }

    match merge_documents(documents)? {
        Some(mut merged) => Ok(Some(save_document(&mut merged)?)),
        None => Ok(None),
    }
}

/// Keep the pages between two user-entered bounds, inclusive.
pub fn split_pdf(document: &PdfDocument, start: &str, end: &str) -> crate::Result<Option<Vec<u8>>> {
    let Some((start, end)) = parse_page_range(start, end, document.page_count()) else {
        debug!("Split range {:?}-{:?} is empty or invalid", start, end);
        return Ok(None);
    };

    let mut split = split_range(document.inner(), start, end)?;
    Ok(Some(save_document(&mut split)?))
}

/// Rebuild the document from JPEG page images.
///
/// Page boxes keep their native size; all vector content and text is lost.
pub fn compress_pdf<R: PageRasterizer + ?Sized>(
    document: &PdfDocument,
    rasterizer: &R,
    config: &CompressConfig,
    pipeline: &mut PagePipeline<'_>,
) -> crate::Result<Option<Vec<u8>>> {
    let page_count = document.page_count().min(rasterizer.page_count());
    if page_count == 0 {
        return Ok(None);
    }

    let pages = pipeline.run(1..=page_count, |page| {
        let (image, _) = render_view(rasterizer, page, config.scale)?;
        Ok(JpegPage {
            jpeg: encode_jpeg(&image, config.jpeg_quality)?,
            pixel_width: image.width(),
            pixel_height: image.height(),
            native: document.page_size(page)?,
        })
    })?;

    let mut rebuilt = build_image_pdf(&pages)?;
    let bytes = save_document(&mut rebuilt)?;
    debug!(
        "Compressed {} pages: {} -> {} bytes",
        page_count,
        document.bytes().len(),
        bytes.len()
    );
    Ok(Some(bytes))
}

/// Stamp style from configuration.
pub fn watermark_style(config: &WatermarkConfig) -> crate::Result<WatermarkStyle> {
    let (r, g, b, _) = Color::from_hex(&config.color)?.to_normalized();
    Ok(WatermarkStyle {
        text: config.text.clone(),
        number_pages: config.number_pages,
        font_size: config.font_size as f64,
        opacity: config.opacity.clamp(0.0, 1.0) as f64,
        angle_degrees: config.angle_degrees as f64,
        spacing: config.spacing as f64,
        color: [r as f64, g as f64, b as f64],
        footer_font_size: config.footer_font_size as f64,
        footer_margin: config.footer_margin as f64,
    })
}

/// Watermark and/or number every page; `None` when there is nothing to draw.
pub fn watermark_pdf(document: &PdfDocument, style: &WatermarkStyle) -> crate::Result<Option<Vec<u8>>> {
    let mut doc = document.to_document();
    if !watermark_pages(&mut doc, style)? {
        return Ok(None);
    }
    Ok(Some(save_document(&mut doc)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::{PointerEvent, ToolSettings};
    use crate::layout::Point;
    use crate::models::{LayerRetention, NativePageSize, PixelSize};
    use crate::pdf::testing::{build_pdf, PageSpec};
    use crate::render::PrerenderedPages;
    use pretty_assertions::assert_eq;

    fn letter_pdf(pages: usize) -> PdfDocument {
        let specs: Vec<PageSpec> = (0..pages).map(|_| PageSpec::sized(612.0, 792.0)).collect();
        PdfDocument::load(&build_pdf(&specs)).unwrap()
    }

    #[test]
    fn test_overlay_requires_a_layer() {
        let document = letter_pdf(2);
        let surface = AnnotationSurface::default();
        assert!(overlay_pdf(&document, &surface, &[1]).unwrap().is_none());
    }

    #[test]
    fn test_overlay_adds_image_to_page() {
        let document = letter_pdf(2);
        let mut surface = AnnotationSurface::new(ToolSettings::default(), LayerRetention::CurrentPage);
        surface.activate_page(2, PixelSize::new(765.0, 990.0)).unwrap();
        surface.handle(PointerEvent::Down(Point::new(10.0, 10.0)));
        surface.handle(PointerEvent::Move(Point::new(100.0, 100.0)));

        let bytes = overlay_pdf(&document, &surface, &[2]).unwrap().unwrap();
        let out = PdfDocument::load(&bytes).unwrap();
        assert_eq!(out.page_count(), 2);

        let page_id = out.page_id(2).unwrap();
        let page = out.inner().get_dictionary(page_id).unwrap();
        let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
        let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
        assert!(xobjects.iter().any(|(name, _)| name.starts_with(b"PmInk")));
    }

    #[test]
    fn test_overlay_stamps_blank_layer() {
        let document = letter_pdf(1);
        let mut surface = AnnotationSurface::new(ToolSettings::default(), LayerRetention::CurrentPage);
        surface.activate_page(1, PixelSize::new(612.0, 792.0)).unwrap();
        assert!(surface.layer(1).unwrap().is_blank());

        let bytes = overlay_pdf(&document, &surface, &[1]).unwrap().unwrap();
        let out = PdfDocument::load(&bytes).unwrap();
        let page = out.inner().get_dictionary(out.page_id(1).unwrap()).unwrap();
        let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
        let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
        assert_eq!(xobjects.iter().filter(|(name, _)| name.starts_with(b"PmInk")).count(), 1);
    }

    #[test]
    fn test_merge_without_current_document() {
        let a = build_pdf(&[PageSpec::sized(100.0, 100.0)]);
        let b = build_pdf(&[PageSpec::sized(200.0, 200.0), PageSpec::sized(300.0, 300.0)]);

        let merged = merge_pdfs(None, &[a, b]).unwrap().unwrap();
        let out = PdfDocument::load(&merged).unwrap();
        assert_eq!(out.page_count(), 3);
        assert_eq!(out.page_size(3).unwrap(), NativePageSize::new(300.0, 300.0));

        assert!(merge_pdfs(None, &[]).unwrap().is_none());
    }

    #[test]
    fn test_split_noops_on_reversed_range() {
        let document = letter_pdf(4);
        assert!(split_pdf(&document, "3", "2").unwrap().is_none());
        assert!(split_pdf(&document, "x", "2").unwrap().is_none());

        let bytes = split_pdf(&document, "0", "2").unwrap().unwrap();
        assert_eq!(PdfDocument::load(&bytes).unwrap().page_count(), 2);
    }

    #[test]
    fn test_compress_keeps_native_page_size() {
        let specs = vec![PageSpec::sized(612.0, 792.0), PageSpec::sized(842.0, 595.0)];
        let document = PdfDocument::load(&build_pdf(&specs)).unwrap();
        let mut pages = PrerenderedPages::new(2);
        pages
            .supply(1, 1.0, image::RgbaImage::from_pixel(612, 792, image::Rgba([200, 10, 10, 255])))
            .unwrap();
        pages
            .supply(2, 1.0, image::RgbaImage::from_pixel(842, 595, image::Rgba([10, 200, 10, 255])))
            .unwrap();

        let config = CompressConfig::default();
        let bytes = compress_pdf(&document, &pages, &config, &mut PagePipeline::new()).unwrap().unwrap();
        let out = PdfDocument::load(&bytes).unwrap();

        assert_eq!(out.page_count(), 2);
        assert_eq!(out.page_size(2).unwrap(), NativePageSize::new(842.0, 595.0));
    }

    #[test]
    fn test_watermark_style_from_config() {
        let config = WatermarkConfig {
            text: Some("DRAFT".to_string()),
            color: "#ff0000".to_string(),
            opacity: 3.0,
            ..WatermarkConfig::default()
        };
        let style = watermark_style(&config).unwrap();
        assert_eq!(style.color, [1.0, 0.0, 0.0]);
        assert_eq!(style.opacity, 1.0);

        let bad = WatermarkConfig {
            color: "blue".to_string(),
            ..WatermarkConfig::default()
        };
        assert!(watermark_style(&bad).is_err());
    }

    #[test]
    fn test_watermark_noop_without_text_or_numbers() {
        let document = letter_pdf(1);
        let style = watermark_style(&WatermarkConfig::default()).unwrap();
        assert!(watermark_pdf(&document, &style).unwrap().is_none());
    }
}
