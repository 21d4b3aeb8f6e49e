//! Page-level document operations: merge and split.

use lopdf::{Document, Object, ObjectId};
use tracing::debug;

use super::document::{pages_root, push_down_inherited};
use super::Result;
use crate::error::PdfError;

/// Concatenate documents in order into the first one.
///
/// Returns `None` when no documents are given.
pub fn merge_documents(documents: Vec<Document>) -> Result<Option<Document>> {
    let mut iter = documents.into_iter();
    let Some(mut merged) = iter.next() else {
        return Ok(None);
    };

    let root = pages_root(&merged)?;
    let existing = merged.get_pages().len();
    let mut appended: Vec<ObjectId> = Vec::new();

    for mut next in iter {
        let page_ids: Vec<ObjectId> = next.get_pages().into_values().collect();
        for &page_id in &page_ids {
            push_down_inherited(&mut next, page_id)?;
        }

        next.renumber_objects_with(merged.max_id + 1);
        let page_ids: Vec<ObjectId> = next.get_pages().into_values().collect();

        let next_max = next.objects.keys().map(|(id, _)| *id).max().unwrap_or(0);
        merged.max_id = merged.max_id.max(next_max);
        merged.objects.extend(next.objects);

        for page_id in page_ids {
            let page = merged
                .get_dictionary_mut(page_id)
                .map_err(|e| PdfError::Structure(e.to_string()))?;
            page.set("Parent", root);
            appended.push(page_id);
        }
    }

    let pages = merged
        .get_dictionary_mut(root)
        .map_err(|e| PdfError::Structure(e.to_string()))?;
    match pages.get_mut(b"Kids") {
        Ok(Object::Array(kids)) => kids.extend(appended.iter().map(|&id| Object::Reference(id))),
        _ => return Err(PdfError::Structure("page tree root has no /Kids array".to_string())),
    }
    pages.set("Count", (existing + appended.len()) as i64);

    // Catalogs and page-tree nodes of the appended documents are now unreachable.
    merged.prune_objects();

    debug!("Merged {} + {} pages", existing, appended.len());
    Ok(Some(merged))
}

/// Parse user-entered bounds and clamp them to `[1, page_count]`.
///
/// `None` when either bound is not an integer, the document is empty, or
/// the clamped start lies after the clamped end.
pub fn parse_page_range(start: &str, end: &str, page_count: u32) -> Option<(u32, u32)> {
    if page_count == 0 {
        return None;
    }
    let start: i64 = start.trim().parse().ok()?;
    let end: i64 = end.trim().parse().ok()?;

    let clamp = |v: i64| v.clamp(1, page_count as i64) as u32;
    let (start, end) = (clamp(start), clamp(end));

    (start <= end).then_some((start, end))
}

/// Keep only pages `start..=end` (1-indexed, already clamped).
pub fn split_range(doc: &Document, start: u32, end: u32) -> Result<Document> {
    let page_count = doc.get_pages().len() as u32;
    if start == 0 || start > end || end > page_count {
        return Err(PdfError::InvalidPage(if start == 0 { start } else { end }));
    }

    let mut out = doc.clone();
    let drop: Vec<u32> = (1..=page_count).filter(|p| *p < start || *p > end).collect();
    out.delete_pages(&drop);
    out.prune_objects();

    debug!("Split pages {}-{} of {}", start, end, page_count);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NativePageSize;
    use crate::pdf::testing::{build_pdf, PageSpec};
    use crate::pdf::{PdfDocument, TextSource, save_document};
    use pretty_assertions::assert_eq;

    fn widths(doc: &mut Document) -> Vec<f64> {
        let bytes = save_document(doc).unwrap();
        let reloaded = PdfDocument::load(&bytes).unwrap();
        (1..=reloaded.page_count())
            .map(|p| reloaded.page_size(p).unwrap().width)
            .collect()
    }

    fn numbered(count: u32, base: f64) -> Document {
        let pages: Vec<_> = (0..count)
            .map(|i| PageSpec::sized(base + i as f64, 700.0))
            .collect();
        Document::load_mem(&build_pdf(&pages)).unwrap()
    }

    #[test]
    fn test_parse_page_range_clamps() {
        assert_eq!(parse_page_range("3", "7", 10), Some((3, 7)));
        assert_eq!(parse_page_range("0", "99", 10), Some((1, 10)));
        assert_eq!(parse_page_range(" 2 ", "2", 10), Some((2, 2)));
        assert_eq!(parse_page_range("-4", "1", 10), Some((1, 1)));
    }

    #[test]
    fn test_parse_page_range_noop_cases() {
        assert_eq!(parse_page_range("7", "3", 10), None);
        assert_eq!(parse_page_range("", "3", 10), None);
        assert_eq!(parse_page_range("two", "3", 10), None);
        assert_eq!(parse_page_range("1", "1", 0), None);
    }

    #[test]
    fn test_split_keeps_range_in_order() {
        let doc = numbered(10, 300.0);
        let mut out = split_range(&doc, 3, 7).unwrap();
        assert_eq!(widths(&mut out), vec![302.0, 303.0, 304.0, 305.0, 306.0]);
    }

    #[test]
    fn test_merge_appends_in_order() {
        let first = numbered(2, 100.0);
        let second = numbered(3, 200.0);

        let mut merged = merge_documents(vec![first, second]).unwrap().unwrap();
        assert_eq!(widths(&mut merged), vec![100.0, 101.0, 200.0, 201.0, 202.0]);
    }

    #[test]
    fn test_merge_pushes_down_inherited_media_box() {
        let first = numbered(1, 100.0);
        let second = Document::load_mem(&build_pdf(&[PageSpec::inherited()])).unwrap();

        let mut merged = merge_documents(vec![first, second]).unwrap().unwrap();
        let moved = *merged.get_pages().get(&2).unwrap();
        let page = merged.get_dictionary(moved).unwrap();
        assert!(page.has(b"MediaBox"));
        assert!(page.has(b"Resources"));

        let bytes = save_document(&mut merged).unwrap();
        let reloaded = PdfDocument::load(&bytes).unwrap();
        assert_eq!(reloaded.page_size(2).unwrap(), NativePageSize::new(500.0, 700.0));
    }

    #[test]
    fn test_merge_nothing_is_none() {
        assert!(merge_documents(Vec::new()).unwrap().is_none());
    }
}
