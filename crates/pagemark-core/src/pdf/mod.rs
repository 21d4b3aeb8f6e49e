//! PDF parsing and mutation.

mod compress;
mod document;
mod glyphs;
mod ops;
mod stamp;

pub use compress::{build_image_pdf, JpegPage};
pub use document::PdfDocument;
pub use glyphs::extract_glyphs;
pub use ops::{merge_documents, parse_page_range, split_range};
pub use stamp::{stamp_image, watermark_pages, InkStamp, WatermarkStyle};

use lopdf::{Document, Object};

use crate::error::PdfError;
use crate::models::{NativePageSize, TextGlyph};

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Read access to a document's pages for text-based exports.
pub trait TextSource {
    /// Number of pages in the document.
    fn page_count(&self) -> u32;

    /// Native page box of a 1-indexed page.
    fn page_size(&self, page: u32) -> Result<NativePageSize>;

    /// Plain text of a page.
    fn page_text(&self, page: u32) -> Result<String>;

    /// Positioned text runs of a page, bottom-origin native units.
    fn page_glyphs(&self, page: u32) -> Result<Vec<TextGlyph>>;
}

/// Serialize a document to bytes.
pub fn save_document(doc: &mut Document) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|e| PdfError::Write(e.to_string()))?;
    Ok(output)
}

/// Numeric value of an integer or real object.
pub(crate) fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}
