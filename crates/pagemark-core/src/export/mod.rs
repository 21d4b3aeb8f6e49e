//! Export formats and the per-page pipeline that drives them.

pub mod ooxml;
mod pdf;
mod pipeline;
mod raster;
mod text;

pub use pdf::{compress_pdf, merge_pdfs, overlay_pdf, split_pdf, watermark_pdf, watermark_style};
pub use pipeline::{CancellationToken, PagePipeline};
pub use raster::{encode_jpeg, encode_png, pages_zip, render_composited, render_pages, RenderedPage};
pub use text::{document_text, page_tables, text_blocks};

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const MIME_PNG: &str = "image/png";
pub const MIME_ZIP: &str = "application/zip";
pub const MIME_TEXT: &str = "text/plain;charset=utf-8";
pub const MIME_CSV: &str = "text/csv";
pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_PPTX: &str = "application/vnd.openxmlformats-officedocument.presentationml.presentation";
pub const MIME_XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

lazy_static! {
    static ref EXTENSION: Regex = Regex::new(r"\.[^.]+$").unwrap();
}

/// One produced file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportArtifact {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    pub fn new(file_name: impl Into<String>, mime_type: &str, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.to_string(),
            bytes,
        }
    }
}

/// Derive an output file name from the input name.
///
/// The last extension is replaced by `ext`; page-scoped outputs get a
/// `-p<N>` marker. An empty base becomes `file`.
pub fn output_name(input: &str, ext: &str, page: Option<u32>) -> String {
    let stripped = EXTENSION.replace(input, "");
    let base = if stripped.is_empty() { "file" } else { stripped.as_ref() };

    match page {
        Some(page) => format!("{}-p{}.{}", base, page, ext),
        None => format!("{}.{}", base, ext),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_name() {
        assert_eq!(output_name("report.pdf", "txt", None), "report.txt");
        assert_eq!(output_name("report.pdf", "png", Some(3)), "report-p3.png");
        assert_eq!(output_name("archive.v2.pdf", "pages.zip", None), "archive.v2.pages.zip");
        assert_eq!(output_name("noext", "docx", None), "noext.docx");
    }

    #[test]
    fn test_output_name_empty_base() {
        assert_eq!(output_name(".pdf", "txt", None), "file.txt");
        assert_eq!(output_name("", "edited.pdf", None), "file.edited.pdf");
    }
}
