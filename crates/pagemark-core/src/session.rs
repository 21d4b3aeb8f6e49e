//! Document session: the loaded file, the current page and zoom, the
//! annotation surface, and every export built on top of them.
//!
//! Exports whose preconditions are missing (nothing loaded, nothing
//! rendered yet, an empty range) return `Ok(None)`.

use image::RgbaImage;
use tracing::{debug, info};

use crate::annotate::{AnnotationSurface, PointerEvent};
use crate::error::PagemarkError;
use crate::export::ooxml::{self, DocxImage, Sheet};
use crate::export::{
    self, output_name, CancellationToken, ExportArtifact, PagePipeline, MIME_DOCX, MIME_PDF, MIME_PNG,
    MIME_PPTX, MIME_TEXT, MIME_XLSX, MIME_ZIP,
};
use crate::layout::{fit_within, SlideLayoutEngine, TableGrid, TableReconstructor};
use crate::models::config::WatermarkConfig;
use crate::models::{LayerRetention, PageView, PagemarkConfig};
use crate::pdf::{PdfDocument, TextSource};
use crate::render::{render_view, PageRasterizer};
use crate::Result;

/// Single source of truth for one open document.
pub struct DocumentSession {
    config: PagemarkConfig,
    file_name: String,
    document: Option<PdfDocument>,
    page: u32,
    scale: f32,
    view: Option<PageView>,
    surface: AnnotationSurface,
    token: CancellationToken,
}

impl DocumentSession {
    /// Create an empty session.
    ///
    /// Fails only when the annotation defaults in `config` are invalid.
    pub fn new(config: PagemarkConfig) -> Result<Self> {
        let surface = AnnotationSurface::from_config(&config.annotation, config.viewer.layer_retention)?;
        Ok(Self {
            scale: config.viewer.default_scale,
            config,
            file_name: String::new(),
            document: None,
            page: 1,
            view: None,
            surface,
            token: CancellationToken::new(),
        })
    }

    pub fn config(&self) -> &PagemarkConfig {
        &self.config
    }

    /// Replace the document. On error the previous document stays open.
    pub fn load(&mut self, file_name: impl Into<String>, bytes: &[u8]) -> Result<u32> {
        let document = PdfDocument::load(bytes)?;
        let page_count = document.page_count();

        self.file_name = file_name.into();
        self.document = Some(document);
        self.page = 1;
        self.scale = self.config.viewer.default_scale;
        self.view = None;
        self.surface.reset();
        self.token.reset();

        info!("Loaded {} ({} pages)", self.file_name, page_count);
        Ok(page_count)
    }

    /// Drop the document and all ink.
    pub fn close(&mut self) {
        self.document = None;
        self.file_name.clear();
        self.page = 1;
        self.view = None;
        self.surface.reset();
    }

    pub fn is_loaded(&self) -> bool {
        self.document.is_some()
    }

    pub fn document(&self) -> Option<&PdfDocument> {
        self.document.as_ref()
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn page_count(&self) -> u32 {
        self.document.as_ref().map(|d| d.page_count()).unwrap_or(0)
    }

    /// Current page, 1-indexed.
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// The page as last rendered, if it is still current.
    pub fn view(&self) -> Option<PageView> {
        self.view
    }

    pub fn surface(&self) -> &AnnotationSurface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut AnnotationSurface {
        &mut self.surface
    }

    /// Token that cancels pipelines started from this session.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Fresh pipeline bound to this session's token.
    ///
    /// A cancel requested before the pipeline exists stops it at its first
    /// page.
    pub fn pipeline<'a>(&self) -> PagePipeline<'a> {
        PagePipeline::new().with_token(self.token.clone())
    }

    /// Move to `page`, clamped to `[1, page_count]`. Returns the new page.
    pub fn go_to(&mut self, page: i64) -> u32 {
        let last = self.page_count().max(1) as i64;
        let target = page.clamp(1, last) as u32;
        if target != self.page {
            debug!("Page {} -> {}", self.page, target);
            self.page = target;
            self.view = None;
        }
        self.page
    }

    pub fn next_page(&mut self) -> u32 {
        self.go_to(self.page as i64 + 1)
    }

    pub fn prev_page(&mut self) -> u32 {
        self.go_to(self.page as i64 - 1)
    }

    /// Set the zoom, clamped to the configured range.
    ///
    /// Non-finite or non-positive values are ignored. Returns whether the
    /// scale changed.
    pub fn set_scale(&mut self, scale: f32) -> bool {
        if !(scale.is_finite() && scale > 0.0) {
            debug!("Ignoring invalid scale {}", scale);
            return false;
        }
        let viewer = &self.config.viewer;
        let clamped = scale.clamp(viewer.min_scale, viewer.max_scale);
        if clamped == self.scale {
            return false;
        }
        self.scale = clamped;
        self.view = None;
        true
    }

    pub fn zoom_in(&mut self) -> bool {
        self.set_scale(self.scale + self.config.viewer.scale_step)
    }

    pub fn zoom_out(&mut self) -> bool {
        self.set_scale(self.scale - self.config.viewer.scale_step)
    }

    pub fn set_layer_retention(&mut self, retention: LayerRetention) {
        self.config.viewer.layer_retention = retention;
        self.surface.set_retention(retention);
    }

    /// Render the current page and point the ink layer at it.
    ///
    /// Returns the base render without ink; `None` when nothing is loaded.
    pub fn render_current<R: PageRasterizer + ?Sized>(&mut self, rasterizer: &R) -> Result<Option<RgbaImage>> {
        if self.document.is_none() {
            return Ok(None);
        }
        let (image, view) = render_view(rasterizer, self.page, self.scale)?;
        self.surface.activate_page(view.page, view.size)?;
        self.view = Some(view);
        Ok(Some(image))
    }

    /// Feed a pointer event to the annotation surface.
    ///
    /// Ignored until the current page has been rendered.
    pub fn pointer(&mut self, event: PointerEvent) -> bool {
        if self.view.is_none() {
            return false;
        }
        self.surface.handle(event)
    }

    /// Clear the current page's ink.
    pub fn clear_ink(&mut self) {
        self.surface.clear();
    }

    fn name(&self, ext: &str, page: Option<u32>) -> String {
        output_name(&self.file_name, ext, page)
    }

    fn rendered(&self) -> Option<(&PdfDocument, PageView)> {
        match (&self.document, self.view) {
            (Some(document), Some(view)) => Some((document, view)),
            _ => {
                debug!("Export skipped: no rendered page");
                None
            }
        }
    }

    fn loaded(&self) -> Option<&PdfDocument> {
        if self.document.is_none() {
            debug!("Export skipped: no document loaded");
        }
        self.document.as_ref()
    }

    /// Current page with its ink as PNG.
    pub fn export_page_png<R: PageRasterizer + ?Sized>(&self, rasterizer: &R) -> Result<Option<ExportArtifact>> {
        let Some((_, view)) = self.rendered() else {
            return Ok(None);
        };
        let image = export::render_composited(rasterizer, &self.surface, view.page, view.scale)?;
        let png = export::encode_png(&image)?;
        Ok(Some(ExportArtifact::new(self.name("png", Some(view.page)), MIME_PNG, png)))
    }

    /// Every page as PNG in a ZIP archive.
    pub fn export_pages_zip<R: PageRasterizer + ?Sized>(
        &self,
        rasterizer: &R,
        pipeline: &mut PagePipeline<'_>,
    ) -> Result<Option<ExportArtifact>> {
        let Some((_, view)) = self.rendered() else {
            return Ok(None);
        };
        let bytes = export::pages_zip(rasterizer, &self.surface, view.scale, pipeline)?;
        Ok(Some(ExportArtifact::new(self.name("pages.zip", None), MIME_ZIP, bytes)))
    }

    /// Extracted text of every page.
    pub fn export_text(&self, pipeline: &mut PagePipeline<'_>) -> Result<Option<ExportArtifact>> {
        let Some(document) = self.loaded() else {
            return Ok(None);
        };
        let text = export::document_text(document, pipeline)?;
        Ok(Some(ExportArtifact::new(self.name("txt", None), MIME_TEXT, text.into_bytes())))
    }

    /// Extracted text as a word-processor document, one paragraph per block.
    pub fn export_docx_text(&self, pipeline: &mut PagePipeline<'_>) -> Result<Option<ExportArtifact>> {
        let Some(document) = self.loaded() else {
            return Ok(None);
        };
        let text = export::document_text(document, pipeline)?;
        let bytes = ooxml::text_document(&export::text_blocks(&text))?;
        Ok(Some(ExportArtifact::new(self.name("docx", None), MIME_DOCX, bytes)))
    }

    /// One fitted page image per paragraph.
    pub fn export_docx_images<R: PageRasterizer + ?Sized>(
        &self,
        rasterizer: &R,
        pipeline: &mut PagePipeline<'_>,
    ) -> Result<Option<ExportArtifact>> {
        let Some((_, view)) = self.rendered() else {
            return Ok(None);
        };
        let docx = &self.config.docx;
        let images: Vec<DocxImage> = export::render_pages(rasterizer, &self.surface, view.scale, pipeline)?
            .into_iter()
            .map(|page| {
                let (width_px, height_px) = fit_within(page.size, docx.max_width, docx.max_height);
                DocxImage { png: page.png, width_px, height_px }
            })
            .collect();

        let bytes = ooxml::image_document(&images)?;
        Ok(Some(ExportArtifact::new(self.name("pages.docx", None), MIME_DOCX, bytes)))
    }

    /// One slide per page on a canvas chosen from the first page.
    pub fn export_pptx<R: PageRasterizer + ?Sized>(
        &self,
        rasterizer: &R,
        pipeline: &mut PagePipeline<'_>,
    ) -> Result<Option<ExportArtifact>> {
        let Some((_, view)) = self.rendered() else {
            return Ok(None);
        };
        let pages = export::render_pages(rasterizer, &self.surface, view.scale, pipeline)?;
        let sizes: Vec<_> = pages.iter().map(|p| p.size).collect();
        let Some(layout) = SlideLayoutEngine::from_config(&self.config.slides).layout(&sizes) else {
            return Ok(None);
        };

        let images: Vec<Vec<u8>> = pages.into_iter().map(|p| p.png).collect();
        let bytes = ooxml::presentation(&layout, &images)?;
        Ok(Some(ExportArtifact::new(self.name("pptx", None), MIME_PPTX, bytes)))
    }

    /// Reconstructed tables for `pages` (all pages when empty).
    pub fn page_tables(&self, pages: &[u32], pipeline: &mut PagePipeline<'_>) -> Result<Option<Vec<(u32, TableGrid)>>> {
        let Some(document) = self.loaded() else {
            return Ok(None);
        };
        let count = document.page_count();
        let selected: Vec<u32> = if pages.is_empty() {
            (1..=count).collect()
        } else {
            pages.iter().copied().filter(|p| (1..=count).contains(p)).collect()
        };

        let reconstructor = TableReconstructor::from_config(&self.config.table);
        Ok(Some(export::page_tables(document, &reconstructor, selected, pipeline)?))
    }

    /// One worksheet per page.
    pub fn export_xlsx(&self, pipeline: &mut PagePipeline<'_>) -> Result<Option<ExportArtifact>> {
        let Some(tables) = self.page_tables(&[], pipeline)? else {
            return Ok(None);
        };
        let sheets: Vec<Sheet> = tables
            .into_iter()
            .map(|(page, grid)| Sheet::new(format!("Page {}", page), grid.rows))
            .collect();

        let bytes = ooxml::workbook(&sheets)?;
        Ok(Some(ExportArtifact::new(self.name("xlsx", None), MIME_XLSX, bytes)))
    }

    /// Original document with ink stamped on.
    ///
    /// Under current-page retention only the current page is stamped; under
    /// per-page retention every page carrying ink is.
    pub fn export_overlay_pdf(&self) -> Result<Option<ExportArtifact>> {
        let Some((document, view)) = self.rendered() else {
            return Ok(None);
        };
        let pages = match self.surface.retention() {
            LayerRetention::CurrentPage => vec![view.page],
            LayerRetention::PerPage => {
                let mut pages = self.surface.annotated_pages();
                if !pages.contains(&view.page) {
                    pages.push(view.page);
                }
                pages
            }
        };

        Ok(export::overlay_pdf(document, &self.surface, &pages)?
            .map(|bytes| ExportArtifact::new(self.name("edited.pdf", None), MIME_PDF, bytes)))
    }

    /// Current document (if any) followed by `files` in order.
    pub fn export_merged(&self, files: &[Vec<u8>]) -> Result<Option<ExportArtifact>> {
        let bytes = export::merge_pdfs(self.document.as_ref(), files)?;
        Ok(bytes.map(|bytes| ExportArtifact::new(self.name("merged.pdf", None), MIME_PDF, bytes)))
    }

    /// Pages `start..=end` as typed by the user.
    pub fn export_split(&self, start: &str, end: &str) -> Result<Option<ExportArtifact>> {
        let Some(document) = self.loaded() else {
            return Ok(None);
        };
        Ok(export::split_pdf(document, start, end)?
            .map(|bytes| ExportArtifact::new(self.name("split.pdf", None), MIME_PDF, bytes)))
    }

    /// Rasterize and re-encode every page.
    pub fn export_compressed<R: PageRasterizer + ?Sized>(
        &self,
        rasterizer: &R,
        pipeline: &mut PagePipeline<'_>,
    ) -> Result<Option<ExportArtifact>> {
        let Some(document) = self.loaded() else {
            return Ok(None);
        };
        Ok(export::compress_pdf(document, rasterizer, &self.config.compress, pipeline)?
            .map(|bytes| ExportArtifact::new(self.name("compressed.pdf", None), MIME_PDF, bytes)))
    }

    /// Watermark and/or number pages using `watermark` settings.
    pub fn export_watermarked(&self, watermark: &WatermarkConfig) -> Result<Option<ExportArtifact>> {
        let Some(document) = self.loaded() else {
            return Ok(None);
        };
        let style = export::watermark_style(watermark)?;
        Ok(export::watermark_pdf(document, &style)?
            .map(|bytes| ExportArtifact::new(self.name("watermarked.pdf", None), MIME_PDF, bytes)))
    }
}

impl std::fmt::Debug for DocumentSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentSession")
            .field("file_name", &self.file_name)
            .field("page_count", &self.page_count())
            .field("page", &self.page)
            .field("scale", &self.scale)
            .field("view", &self.view)
            .finish()
    }
}

impl TryFrom<PagemarkConfig> for DocumentSession {
    type Error = PagemarkError;

    fn try_from(config: PagemarkConfig) -> Result<Self> {
        Self::new(config)
    }
}
