//! Native rasterizer backed by the PDFium library.

use image::RgbaImage;
use pdfium_render::prelude::*;
use tracing::debug;

use super::{PageRasterizer, Result};
use crate::error::RenderError;

/// Renders pages with PDFium, loading the document per call.
///
/// PDFium documents borrow the library handle, so only the bytes are kept.
pub struct PdfiumRasterizer {
    pdfium: Pdfium,
    data: Vec<u8>,
    page_count: u32,
}

impl PdfiumRasterizer {
    /// Bind PDFium and open `data` once to learn its page count.
    pub fn new(data: Vec<u8>) -> Result<Self> {
        let pdfium = bind_pdfium()?;
        let page_count = {
            let document = pdfium
                .load_pdf_from_byte_slice(&data, None)
                .map_err(|e| RenderError::Unavailable(format!("failed to open document: {}", e)))?;
            document.pages().len() as u32
        };
        debug!("PDFium opened document with {} pages", page_count);

        Ok(Self {
            pdfium,
            data,
            page_count,
        })
    }
}

impl PageRasterizer for PdfiumRasterizer {
    fn page_count(&self) -> u32 {
        self.page_count
    }

    fn render(&self, page: u32, scale: f32) -> Result<RgbaImage> {
        let failed = |reason: String| RenderError::Failed { page, reason };
        if page == 0 || page > self.page_count {
            return Err(failed(format!("document has {} pages", self.page_count)));
        }

        let document = self
            .pdfium
            .load_pdf_from_byte_slice(&self.data, None)
            .map_err(|e| failed(e.to_string()))?;
        let pdf_page = document
            .pages()
            .get((page - 1) as u16)
            .map_err(|e| failed(e.to_string()))?;

        let config = PdfRenderConfig::new()
            .scale_page_by_factor(scale)
            .render_form_data(true)
            .render_annotations(true);
        let bitmap = pdf_page
            .render_with_config(&config)
            .map_err(|e| failed(e.to_string()))?;

        Ok(bitmap.as_image().to_rgba8())
    }
}

/// Look for PDFium next to the binary, then in /opt/pdfium/lib, then system-wide.
fn bind_pdfium() -> Result<Pdfium> {
    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                "/opt/pdfium/lib",
            ))
        })
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| RenderError::Unavailable(format!("failed to initialize PDFium: {}", e)))?;

    Ok(Pdfium::new(bindings))
}
