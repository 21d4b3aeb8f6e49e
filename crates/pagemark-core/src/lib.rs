//! Core library for pagemark, a PDF viewer, annotator and exporter.
//!
//! This crate provides:
//! - PDF loading, text and glyph extraction, merge, split, stamping
//! - Page rasterization behind the `PageRasterizer` trait (PDFium natively,
//!   host-supplied bitmaps in the browser)
//! - Per-page ink layers driven by a pointer state machine
//! - Coordinate mapping, table reconstruction and slide layout
//! - Exports to PNG, ZIP, PDF, TXT, DOCX, PPTX and XLSX

pub mod annotate;
pub mod error;
pub mod export;
pub mod layout;
pub mod models;
pub mod pdf;
pub mod render;
pub mod session;

pub use annotate::{AnnotationSurface, Color, PointerEvent, Tool, ToolSettings};
pub use error::{PagemarkError, Result};
pub use export::{output_name, CancellationToken, ExportArtifact, PagePipeline};
pub use layout::{CoordinateMapper, Point, SlideLayoutEngine, TableGrid, TableReconstructor};
pub use models::{LayerRetention, NativePageSize, PageView, PagemarkConfig, PixelSize, TextGlyph};
pub use pdf::{PdfDocument, TextSource};
#[cfg(feature = "native")]
pub use render::PdfiumRasterizer;
pub use render::{PageRasterizer, PrerenderedPages};
pub use session::DocumentSession;
