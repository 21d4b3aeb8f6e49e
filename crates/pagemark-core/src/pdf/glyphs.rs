//! Positioned text runs collected from pdf-extract's content interpreter.
//!
//! pdf-extract resolves fonts, widths and the full `Tsm x Tm x CTM` chain, so
//! runs land in page user space even when content is scaled or translated
//! with `cm`.

use std::collections::BTreeMap;

use pdf_extract::{MediaBox, OutputDev, OutputError, Transform};
use tracing::{debug, trace};

use super::Result;
use crate::error::PdfError;
use crate::models::TextGlyph;

/// Largest gap between shows, in ems, that still continues a run.
const JOIN_GAP_EM: f64 = 0.25;

/// Baseline drift, in ems, tolerated within one run.
const BASELINE_EM: f64 = 0.5;

struct Run {
    text: String,
    x: f64,
    y: f64,
    end_x: f64,
    size: f64,
}

impl Run {
    fn continues(&self, x: f64, y: f64) -> bool {
        let em = self.size.max(f64::EPSILON);
        (y - self.y).abs() <= em * BASELINE_EM
            && x >= self.end_x - em * JOIN_GAP_EM
            && x - self.end_x <= em * JOIN_GAP_EM
    }
}

/// Collects text runs per page.
#[derive(Default)]
struct GlyphCollector {
    pages: BTreeMap<u32, Vec<TextGlyph>>,
    page: u32,
    run: Option<Run>,
}

impl GlyphCollector {
    fn flush(&mut self) {
        let Some(run) = self.run.take() else {
            return;
        };
        let text = run.text.trim_end();
        if text.is_empty() {
            return;
        }
        self.pages.entry(self.page).or_default().push(TextGlyph::new(
            text,
            run.x as f32,
            run.y as f32,
            (run.end_x - run.x).max(0.0) as f32,
        ));
    }
}

impl OutputDev for GlyphCollector {
    fn begin_page(
        &mut self,
        page_num: u32,
        _media_box: &MediaBox,
        _art_box: Option<(f64, f64, f64, f64)>,
    ) -> std::result::Result<(), OutputError> {
        self.page = page_num;
        self.pages.entry(page_num).or_default();
        Ok(())
    }

    fn end_page(&mut self) -> std::result::Result<(), OutputError> {
        self.flush();
        Ok(())
    }

    fn output_character(
        &mut self,
        trm: &Transform,
        width: f64,
        spacing: f64,
        font_size: f64,
        char: &str,
    ) -> std::result::Result<(), OutputError> {
        let (x, y) = (trm.m31, trm.m32);
        let size = font_size * trm.m11.hypot(trm.m12);
        let advance = (width * font_size + spacing) * trm.m11;

        if let Some(run) = self.run.as_mut().filter(|run| run.continues(x, y)) {
            run.text.push_str(char);
            run.end_x = x + advance;
            return Ok(());
        }

        self.flush();
        if char.trim().is_empty() {
            return Ok(());
        }
        self.run = Some(Run {
            text: char.to_string(),
            x,
            y,
            end_x: x + advance,
            size,
        });
        Ok(())
    }

    fn begin_word(&mut self) -> std::result::Result<(), OutputError> {
        Ok(())
    }

    fn end_word(&mut self) -> std::result::Result<(), OutputError> {
        Ok(())
    }

    fn end_line(&mut self) -> std::result::Result<(), OutputError> {
        self.flush();
        Ok(())
    }
}

/// Extract text runs for every page, keyed by 1-indexed page number.
///
/// `data` must already be decrypted.
pub fn extract_glyphs(data: &[u8]) -> Result<BTreeMap<u32, Vec<TextGlyph>>> {
    let doc = extract_lopdf::Document::load_mem(data)
        .map_err(|e| PdfError::TextExtraction(e.to_string()))?;

    let mut collector = GlyphCollector::default();
    pdf_extract::output_doc(&doc, &mut collector)
        .map_err(|e| PdfError::TextExtraction(e.to_string()))?;

    debug!("Collected text runs for {} pages", collector.pages.len());
    for (page, runs) in &collector.pages {
        trace!("Page {} has {} runs", page, runs.len());
    }
    Ok(collector.pages)
}
