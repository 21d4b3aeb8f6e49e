//! Text-based exports: plain text, paragraph blocks and reconstructed tables.

use lazy_static::lazy_static;
use regex::Regex;

use super::pipeline::PagePipeline;
use crate::layout::{TableGrid, TableReconstructor};
use crate::pdf::TextSource;

lazy_static! {
    static ref BLANK_LINES: Regex = Regex::new(r"\n{2,}").unwrap();
}

/// Every page's text, each followed by a blank line.
pub fn document_text<S: TextSource + ?Sized>(
    source: &S,
    pipeline: &mut PagePipeline<'_>,
) -> crate::Result<String> {
    let pages = pipeline.run(1..=source.page_count(), |page| Ok(source.page_text(page)?))?;

    let mut text = String::new();
    for page_text in pages {
        text.push_str(&page_text);
        text.push_str("\n\n");
    }
    Ok(text)
}

/// Split text into paragraphs on blank lines, dropping empty blocks.
pub fn text_blocks(text: &str) -> Vec<&str> {
    BLANK_LINES
        .split(text)
        .map(str::trim)
        .filter(|block| !block.is_empty())
        .collect()
}

/// Reconstruct one table grid per page.
pub fn page_tables<S: TextSource + ?Sized>(
    source: &S,
    reconstructor: &TableReconstructor,
    pages: impl IntoIterator<Item = u32>,
    pipeline: &mut PagePipeline<'_>,
) -> crate::Result<Vec<(u32, TableGrid)>> {
    pipeline.run(pages, |page| {
        let glyphs = source.page_glyphs(page)?;
        let height = source.page_size(page)?.height as f32;
        Ok((page, reconstructor.reconstruct(&glyphs, height)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NativePageSize, TextGlyph};
    use crate::pdf;
    use pretty_assertions::assert_eq;

    struct FakeSource {
        pages: Vec<(String, Vec<TextGlyph>)>,
    }

    impl TextSource for FakeSource {
        fn page_count(&self) -> u32 {
            self.pages.len() as u32
        }

        fn page_size(&self, _page: u32) -> pdf::Result<NativePageSize> {
            Ok(NativePageSize::new(600.0, 800.0))
        }

        fn page_text(&self, page: u32) -> pdf::Result<String> {
            Ok(self.pages[(page - 1) as usize].0.clone())
        }

        fn page_glyphs(&self, page: u32) -> pdf::Result<Vec<TextGlyph>> {
            Ok(self.pages[(page - 1) as usize].1.clone())
        }
    }

    #[test]
    fn test_document_text_separates_pages() {
        let source = FakeSource {
            pages: vec![("first page".to_string(), vec![]), ("second".to_string(), vec![])],
        };
        let text = document_text(&source, &mut PagePipeline::new()).unwrap();
        assert_eq!(text, "first page\n\nsecond\n\n");
    }

    #[test]
    fn test_text_blocks() {
        let blocks = text_blocks("Title\n\nBody line one\nline two\n\n\n\nEnd\n\n");
        assert_eq!(blocks, vec!["Title", "Body line one\nline two", "End"]);
        assert!(text_blocks("\n\n\n").is_empty());
    }

    #[test]
    fn test_page_tables_flip_with_native_height() {
        let glyphs = vec![
            TextGlyph::new("Qty", 200.0, 700.0, 15.0),
            TextGlyph::new("Item", 50.0, 700.0, 20.0),
            TextGlyph::new("2", 200.0, 680.0, 5.0),
            TextGlyph::new("Apple", 50.0, 680.0, 25.0),
        ];
        let source = FakeSource {
            pages: vec![(String::new(), vec![]), (String::new(), glyphs)],
        };

        let tables = page_tables(&source, &TableReconstructor::new(), 1..=2, &mut PagePipeline::new()).unwrap();
        assert_eq!(tables.len(), 2);
        assert!(tables[0].1.is_empty());

        let (page, grid) = &tables[1];
        assert_eq!(*page, 2);
        assert_eq!(grid.rows, vec![vec!["Item", "Qty"], vec!["Apple", "2"]]);
    }
}
