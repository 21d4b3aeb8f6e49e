//! Error types for the pagemark-core library.

use thiserror::Error;

/// Main error type for the pagemark library.
#[derive(Error, Debug)]
pub enum PagemarkError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Page rasterization error.
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// Annotation layer error.
    #[error("annotation error: {0}")]
    Annotation(#[from] AnnotationError),

    /// Export error.
    #[error("export error: {0}")]
    Export(#[from] ExportError),

    /// Image processing error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF parsing and mutation.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),

    /// The page tree or a page object is malformed.
    #[error("malformed page tree: {0}")]
    Structure(String),

    /// Failed to serialize the document.
    #[error("failed to write PDF: {0}")]
    Write(String),
}

impl From<lopdf::Error> for PdfError {
    fn from(err: lopdf::Error) -> Self {
        PdfError::Parse(err.to_string())
    }
}

/// Errors related to page rasterization.
#[derive(Error, Debug)]
pub enum RenderError {
    /// No rasterizer backend could be initialised.
    #[error("rasterizer unavailable: {0}")]
    Unavailable(String),

    /// The backend failed to render a page.
    #[error("failed to render page {page}: {reason}")]
    Failed { page: u32, reason: String },

    /// The page has no bitmap available (host never supplied one).
    #[error("page {0} has not been rendered")]
    NotRendered(u32),

    /// Supplied pixel buffer does not match its declared size.
    #[error("bitmap size mismatch: expected {expected} bytes, got {actual}")]
    BitmapSize { expected: usize, actual: usize },
}

/// Errors related to the annotation surface.
#[derive(Error, Debug)]
pub enum AnnotationError {
    /// The text tool font could not be parsed.
    #[error("failed to load font: {0}")]
    Font(String),

    /// A colour string could not be parsed.
    #[error("invalid colour: {0}")]
    Color(String),

    /// Unknown tool name.
    #[error("unknown tool: {0}")]
    Tool(String),

    /// Ink layer could not be allocated at the requested size.
    #[error("cannot allocate ink layer of {width}x{height}")]
    Layer { width: u32, height: u32 },
}

/// Errors related to export serialization.
#[derive(Error, Debug)]
pub enum ExportError {
    /// The operation was cancelled between pages.
    #[error("export cancelled after {completed} of {total} pages")]
    Cancelled { completed: u32, total: u32 },

    /// ZIP container could not be written.
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Image encoding failed.
    #[error("encoding failed: {0}")]
    Encode(String),
}

/// Result type for the pagemark library.
pub type Result<T> = std::result::Result<T, PagemarkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_errors_convert() {
        let err: PagemarkError = PdfError::InvalidPage(7).into();
        assert_eq!(err.to_string(), "PDF error: invalid page number: 7");

        let err: PagemarkError = ExportError::Cancelled { completed: 2, total: 5 }.into();
        assert_eq!(err.to_string(), "export error: export cancelled after 2 of 5 pages");
    }
}
