//! WASM bindings for the in-browser pagemark viewer.
//!
//! The browser host rasterizes pages itself (pdf.js or a canvas) and hands
//! the RGBA pixels to [`Viewer::supply_page`]; everything else (navigation,
//! ink, exports) runs in Rust.

use js_sys::{Array, Object, Reflect, Uint8Array};
use wasm_bindgen::prelude::*;

use pagemark_core::annotate::TextStamper;
use pagemark_core::models::config::WatermarkConfig;
use pagemark_core::{
    Color, DocumentSession, ExportArtifact, LayerRetention, PagePipeline, PagemarkConfig, Point,
    PointerEvent, PrerenderedPages, TextSource, Tool,
};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn js_err(err: impl ToString) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// `{ fileName, mimeType, bytes }`, or `undefined` when there was nothing
/// to export.
fn artifact_to_js(artifact: Option<ExportArtifact>) -> Result<JsValue, JsValue> {
    let Some(artifact) = artifact else {
        return Ok(JsValue::UNDEFINED);
    };

    let object = Object::new();
    Reflect::set(&object, &"fileName".into(), &artifact.file_name.into())?;
    Reflect::set(&object, &"mimeType".into(), &artifact.mime_type.into())?;
    Reflect::set(&object, &"bytes".into(), &Uint8Array::from(artifact.bytes.as_slice()).into())?;
    Ok(object.into())
}

/// One open document plus the page bitmaps the host has supplied.
#[wasm_bindgen]
pub struct Viewer {
    session: DocumentSession,
    pages: PrerenderedPages,
}

impl Viewer {
    fn pipeline(&self) -> PagePipeline<'static> {
        self.session.pipeline()
    }
}

#[wasm_bindgen]
impl Viewer {
    /// Create a viewer; `config` is an optional partial configuration object.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<Viewer, JsValue> {
        let config: PagemarkConfig = if config.is_undefined() || config.is_null() {
            PagemarkConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)?
        };

        Ok(Self {
            session: DocumentSession::new(config).map_err(js_err)?,
            pages: PrerenderedPages::default(),
        })
    }

    /// Open a document, dropping the previous one with its ink and bitmaps.
    ///
    /// Returns the page count.
    #[wasm_bindgen]
    pub fn load(&mut self, name: &str, bytes: &[u8]) -> Result<u32, JsValue> {
        let count = self.session.load(name, bytes).map_err(js_err)?;
        self.pages = PrerenderedPages::new(count);
        Ok(count)
    }

    #[wasm_bindgen]
    pub fn close(&mut self) {
        self.session.close();
        self.pages = PrerenderedPages::default();
    }

    #[wasm_bindgen(js_name = fileName, getter)]
    pub fn file_name(&self) -> String {
        self.session.file_name().to_string()
    }

    #[wasm_bindgen(js_name = pageCount, getter)]
    pub fn page_count(&self) -> u32 {
        self.session.page_count()
    }

    #[wasm_bindgen(getter)]
    pub fn page(&self) -> u32 {
        self.session.page()
    }

    #[wasm_bindgen(getter)]
    pub fn scale(&self) -> f32 {
        self.session.scale()
    }

    /// Native size of `page` in points, as `{ width, height }`.
    #[wasm_bindgen(js_name = pageSize)]
    pub fn page_size(&self, page: u32) -> Result<JsValue, JsValue> {
        let document = self
            .session
            .document()
            .ok_or_else(|| js_err("no document loaded"))?;
        let size = document.page_size(page).map_err(js_err)?;
        Ok(serde_wasm_bindgen::to_value(&size)?)
    }

    /// Jump to `page` (clamped); returns the page now current.
    #[wasm_bindgen(js_name = goTo)]
    pub fn go_to(&mut self, page: f64) -> u32 {
        self.session.go_to(page as i64)
    }

    #[wasm_bindgen]
    pub fn next(&mut self) -> u32 {
        self.session.next_page()
    }

    #[wasm_bindgen]
    pub fn prev(&mut self) -> u32 {
        self.session.prev_page()
    }

    /// Returns false when the value was rejected.
    #[wasm_bindgen(js_name = setScale)]
    pub fn set_scale(&mut self, scale: f32) -> bool {
        self.session.set_scale(scale)
    }

    #[wasm_bindgen(js_name = zoomIn)]
    pub fn zoom_in(&mut self) -> bool {
        self.session.zoom_in()
    }

    #[wasm_bindgen(js_name = zoomOut)]
    pub fn zoom_out(&mut self) -> bool {
        self.session.zoom_out()
    }

    /// Keep ink on every page (`true`) or only on the current one.
    #[wasm_bindgen(js_name = setKeepAllPages)]
    pub fn set_keep_all_pages(&mut self, keep: bool) {
        let retention = if keep {
            LayerRetention::PerPage
        } else {
            LayerRetention::CurrentPage
        };
        self.session.set_layer_retention(retention);
    }

    /// Hand over the host's bitmap of `page` at the current scale.
    ///
    /// When `page` is the current page the ink layer is sized to it and
    /// pointer input starts being accepted.
    #[wasm_bindgen(js_name = supplyPage)]
    pub fn supply_page(&mut self, page: u32, width: u32, height: u32, rgba: Vec<u8>) -> Result<(), JsValue> {
        self.pages
            .supply_rgba(page, self.session.scale(), width, height, rgba)
            .map_err(js_err)?;
        if page == self.session.page() {
            self.session.render_current(&self.pages).map_err(js_err)?;
        }
        Ok(())
    }

    #[wasm_bindgen(js_name = setTool)]
    pub fn set_tool(&mut self, tool: &str) -> Result<(), JsValue> {
        let tool: Tool = tool.parse().map_err(js_err)?;
        self.session.surface_mut().set_tool(tool);
        Ok(())
    }

    #[wasm_bindgen(getter)]
    pub fn tool(&self) -> String {
        self.session.surface().tool().to_string()
    }

    /// Pen colour as `#rrggbb` or `#rrggbbaa`.
    #[wasm_bindgen(js_name = setColor)]
    pub fn set_color(&mut self, hex: &str) -> Result<(), JsValue> {
        let color = Color::from_hex(hex).map_err(js_err)?;
        self.session.surface_mut().set_color(color);
        Ok(())
    }

    #[wasm_bindgen(js_name = setStrokeWidth)]
    pub fn set_stroke_width(&mut self, width: f32) {
        self.session.surface_mut().set_stroke_width(width);
    }

    #[wasm_bindgen(js_name = setHighlightAlpha)]
    pub fn set_highlight_alpha(&mut self, alpha: f32) {
        self.session.surface_mut().set_highlight_alpha(alpha);
    }

    #[wasm_bindgen(js_name = setText)]
    pub fn set_text(&mut self, text: &str) {
        self.session.surface_mut().set_text(text);
    }

    /// TrueType/OpenType font used by the text tool.
    #[wasm_bindgen(js_name = loadFont)]
    pub fn load_font(&mut self, bytes: &[u8]) -> Result<(), JsValue> {
        let stamper = TextStamper::from_bytes(bytes).map_err(js_err)?;
        self.session.surface_mut().set_font(stamper);
        Ok(())
    }

    /// Pointer handlers take rendered-page pixels; each returns true when
    /// the ink changed.
    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&mut self, x: f64, y: f64) -> bool {
        self.session.pointer(PointerEvent::Down(Point::new(x, y)))
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&mut self, x: f64, y: f64) -> bool {
        self.session.pointer(PointerEvent::Move(Point::new(x, y)))
    }

    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&mut self, x: f64, y: f64) -> bool {
        self.session.pointer(PointerEvent::Up(Point::new(x, y)))
    }

    #[wasm_bindgen(js_name = pointerLeave)]
    pub fn pointer_leave(&mut self) -> bool {
        self.session.pointer(PointerEvent::Leave)
    }

    /// Clear the current page's ink.
    #[wasm_bindgen]
    pub fn clear(&mut self) {
        self.session.clear_ink();
    }

    /// Straight-alpha RGBA of the current ink layer, for an overlay canvas.
    #[wasm_bindgen(js_name = inkRgba)]
    pub fn ink_rgba(&self) -> Option<Vec<u8>> {
        self.session
            .surface()
            .active_layer()
            .map(|layer| layer.to_rgba_image().into_raw())
    }

    #[wasm_bindgen(js_name = inkWidth, getter)]
    pub fn ink_width(&self) -> u32 {
        self.session.surface().active_layer().map_or(0, |l| l.width())
    }

    #[wasm_bindgen(js_name = inkHeight, getter)]
    pub fn ink_height(&self) -> u32 {
        self.session.surface().active_layer().map_or(0, |l| l.height())
    }

    /// Stop the running, or next, multi-page export at its next page.
    #[wasm_bindgen]
    pub fn cancel(&self) {
        self.session.token().cancel();
    }

    #[wasm_bindgen(js_name = exportPng)]
    pub fn export_png(&self) -> Result<JsValue, JsValue> {
        artifact_to_js(self.session.export_page_png(&self.pages).map_err(js_err)?)
    }

    /// Every page must have been supplied.
    #[wasm_bindgen(js_name = exportZip)]
    pub fn export_zip(&self) -> Result<JsValue, JsValue> {
        let mut pipeline = self.pipeline();
        artifact_to_js(self.session.export_pages_zip(&self.pages, &mut pipeline).map_err(js_err)?)
    }

    #[wasm_bindgen(js_name = exportText)]
    pub fn export_text(&self) -> Result<JsValue, JsValue> {
        let mut pipeline = self.pipeline();
        artifact_to_js(self.session.export_text(&mut pipeline).map_err(js_err)?)
    }

    #[wasm_bindgen(js_name = exportDocx)]
    pub fn export_docx(&self) -> Result<JsValue, JsValue> {
        let mut pipeline = self.pipeline();
        artifact_to_js(self.session.export_docx_text(&mut pipeline).map_err(js_err)?)
    }

    /// Every page must have been supplied.
    #[wasm_bindgen(js_name = exportDocxImages)]
    pub fn export_docx_images(&self) -> Result<JsValue, JsValue> {
        let mut pipeline = self.pipeline();
        artifact_to_js(self.session.export_docx_images(&self.pages, &mut pipeline).map_err(js_err)?)
    }

    /// Every page must have been supplied.
    #[wasm_bindgen(js_name = exportPptx)]
    pub fn export_pptx(&self) -> Result<JsValue, JsValue> {
        let mut pipeline = self.pipeline();
        artifact_to_js(self.session.export_pptx(&self.pages, &mut pipeline).map_err(js_err)?)
    }

    #[wasm_bindgen(js_name = exportXlsx)]
    pub fn export_xlsx(&self) -> Result<JsValue, JsValue> {
        let mut pipeline = self.pipeline();
        artifact_to_js(self.session.export_xlsx(&mut pipeline).map_err(js_err)?)
    }

    #[wasm_bindgen(js_name = exportPdf)]
    pub fn export_pdf(&self) -> Result<JsValue, JsValue> {
        artifact_to_js(self.session.export_overlay_pdf().map_err(js_err)?)
    }

    /// Current document (if any) followed by each `Uint8Array` in `files`.
    #[wasm_bindgen(js_name = exportMerged)]
    pub fn export_merged(&self, files: Array) -> Result<JsValue, JsValue> {
        let files: Vec<Vec<u8>> = files
            .iter()
            .map(|file| Uint8Array::new(&file).to_vec())
            .collect();
        artifact_to_js(self.session.export_merged(&files).map_err(js_err)?)
    }

    /// Pages `start..=end`, both as typed by the user.
    #[wasm_bindgen(js_name = exportSplit)]
    pub fn export_split(&self, start: &str, end: &str) -> Result<JsValue, JsValue> {
        artifact_to_js(self.session.export_split(start, end).map_err(js_err)?)
    }

    /// Every page must have been supplied.
    #[wasm_bindgen(js_name = exportCompressed)]
    pub fn export_compressed(&self) -> Result<JsValue, JsValue> {
        let mut pipeline = self.pipeline();
        artifact_to_js(self.session.export_compressed(&self.pages, &mut pipeline).map_err(js_err)?)
    }

    /// `options` is a partial watermark configuration, e.g.
    /// `{ text: "DRAFT", number_pages: true }`.
    #[wasm_bindgen(js_name = exportWatermarked)]
    pub fn export_watermarked(&self, options: JsValue) -> Result<JsValue, JsValue> {
        let mut watermark = self.session.config().watermark.clone();
        if !(options.is_undefined() || options.is_null()) {
            watermark = serde_wasm_bindgen::from_value(options)?;
        }
        artifact_to_js(self.session.export_watermarked(&watermark).map_err(js_err)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn blank_pdf(pages: u32) -> Vec<u8> {
        let kids: Vec<String> = (0..pages).map(|i| format!("{} 0 R", i + 3)).collect();
        let mut body = String::from("%PDF-1.4\n");
        let mut offsets = Vec::new();
        let mut push = |body: &mut String, obj: String| {
            offsets.push(body.len());
            body.push_str(&obj);
        };

        push(&mut body, "1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n".to_string());
        push(
            &mut body,
            format!("2 0 obj << /Type /Pages /Kids [{}] /Count {} >> endobj\n", kids.join(" "), pages),
        );
        for i in 0..pages {
            push(
                &mut body,
                format!("{} 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 100 200] >> endobj\n", i + 3),
            );
        }

        let xref = body.len();
        body.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", offsets.len() + 1));
        for offset in &offsets {
            body.push_str(&format!("{:010} 00000 n \n", offset));
        }
        body.push_str(&format!(
            "trailer << /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            offsets.len() + 1,
            xref
        ));
        body.into_bytes()
    }

    fn loaded_viewer(pages: u32) -> Viewer {
        let mut viewer = Viewer::new(JsValue::UNDEFINED).unwrap();
        viewer.load("doc.pdf", &blank_pdf(pages)).unwrap();
        viewer
    }

    #[wasm_bindgen_test]
    fn test_navigation_clamps() {
        let mut viewer = loaded_viewer(3);
        assert_eq!(viewer.page_count(), 3);
        assert_eq!(viewer.go_to(9.0), 3);
        assert_eq!(viewer.prev(), 2);
        assert_eq!(viewer.go_to(-4.0), 1);
    }

    #[wasm_bindgen_test]
    fn test_ink_after_supplied_page() {
        let mut viewer = loaded_viewer(1);
        assert!(!viewer.pointer_down(5.0, 5.0));

        viewer.set_scale(1.0);
        viewer.supply_page(1, 100, 200, vec![255; 100 * 200 * 4]).unwrap();
        viewer.set_tool("draw").unwrap();
        viewer.pointer_down(10.0, 10.0);
        viewer.pointer_move(60.0, 80.0);
        viewer.pointer_up(60.0, 80.0);

        assert_eq!(viewer.ink_width(), 100);
        let ink = viewer.ink_rgba().unwrap();
        assert!(ink.chunks(4).any(|px| px[3] > 0));
    }

    #[wasm_bindgen_test]
    fn test_supply_rejects_short_buffer() {
        let mut viewer = loaded_viewer(1);
        assert!(viewer.supply_page(1, 10, 10, vec![0; 12]).is_err());
    }

    #[wasm_bindgen_test]
    fn test_split_noop_is_undefined() {
        let viewer = loaded_viewer(4);
        assert!(viewer.export_split("3", "2").unwrap().is_undefined());
        assert!(!viewer.export_split("2", "3").unwrap().is_undefined());
    }

    #[wasm_bindgen_test]
    fn test_unknown_tool_is_an_error() {
        let mut viewer = loaded_viewer(1);
        assert!(viewer.set_tool("lasso").is_err());
        assert_eq!(viewer.tool(), "draw");
    }
}
