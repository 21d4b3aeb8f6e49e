//! Loaded PDF document: page tree access, native page boxes and text.

use std::cell::OnceCell;
use std::collections::BTreeMap;

use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, warn};

use super::glyphs::extract_glyphs;
use super::{Result, TextSource, number};
use crate::error::PdfError;
use crate::models::{NativePageSize, TextGlyph};

/// Attributes a page may inherit from its ancestors in the page tree.
pub(crate) const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic `Parent` chains in malformed files.
const MAX_TREE_DEPTH: usize = 64;

/// A parsed PDF plus the bytes it was loaded from.
pub struct PdfDocument {
    document: Document,
    raw_data: Vec<u8>,
    page_texts: OnceCell<Option<Vec<String>>>,
    page_glyphs: OnceCell<std::result::Result<BTreeMap<u32, Vec<TextGlyph>>, String>>,
}

impl PdfDocument {
    /// Parse a PDF from bytes, decrypting empty-password files.
    pub fn load(data: &[u8]) -> Result<Self> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        let raw_data = if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            // pdf-extract reads the bytes again, so keep the decrypted form.
            let mut decrypted = Vec::new();
            doc.save_to(&mut decrypted)
                .map_err(|e| PdfError::Write(format!("failed to save decrypted PDF: {}", e)))?;
            decrypted
        } else {
            data.to_vec()
        };

        debug!("Loaded PDF with {} pages", doc.get_pages().len());

        Ok(Self {
            document: doc,
            raw_data,
            page_texts: OnceCell::new(),
            page_glyphs: OnceCell::new(),
        })
    }

    /// Underlying lopdf document.
    pub fn inner(&self) -> &Document {
        &self.document
    }

    /// Bytes of the (decrypted) document.
    pub fn bytes(&self) -> &[u8] {
        &self.raw_data
    }

    /// Clone the parsed document for mutation.
    pub fn to_document(&self) -> Document {
        self.document.clone()
    }

    /// Object id of a 1-indexed page.
    pub fn page_id(&self, page: u32) -> Result<ObjectId> {
        self.document
            .get_pages()
            .get(&page)
            .copied()
            .ok_or(PdfError::InvalidPage(page))
    }

    fn extracted_texts(&self) -> Option<&Vec<String>> {
        self.page_texts
            .get_or_init(|| match pdf_extract::extract_text_from_mem_by_pages(&self.raw_data) {
                Ok(pages) => Some(pages),
                Err(e) => {
                    warn!("pdf-extract failed, falling back to glyph text: {}", e);
                    None
                }
            })
            .as_ref()
    }

    fn extracted_glyphs(&self) -> Result<&BTreeMap<u32, Vec<TextGlyph>>> {
        self.page_glyphs
            .get_or_init(|| extract_glyphs(&self.raw_data).map_err(|e| e.to_string()))
            .as_ref()
            .map_err(|e| PdfError::TextExtraction(e.clone()))
    }
}

impl TextSource for PdfDocument {
    fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    fn page_size(&self, page: u32) -> Result<NativePageSize> {
        let page_id = self.page_id(page)?;
        Ok(native_page_box(&self.document, page_id))
    }

    fn page_text(&self, page: u32) -> Result<String> {
        if page == 0 || page > self.page_count() {
            return Err(PdfError::InvalidPage(page));
        }

        if let Some(text) = self
            .extracted_texts()
            .and_then(|pages| pages.get((page - 1) as usize))
        {
            return Ok(text.trim_end().to_string());
        }

        let glyphs = self.page_glyphs(page)?;
        Ok(glyphs
            .iter()
            .map(|g| g.text.as_str())
            .collect::<Vec<_>>()
            .join(" "))
    }

    fn page_glyphs(&self, page: u32) -> Result<Vec<TextGlyph>> {
        if page == 0 || page > self.page_count() {
            return Err(PdfError::InvalidPage(page));
        }
        Ok(self
            .extracted_glyphs()?
            .get(&page)
            .cloned()
            .unwrap_or_default())
    }
}

/// Look up `key` on a page or the nearest ancestor that defines it.
///
/// Returns the dereferenced value.
pub(crate) fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut node_id = page_id;

    for _ in 0..MAX_TREE_DEPTH {
        let dict = doc.get_dictionary(node_id).ok()?;

        if let Ok(value) = dict.get(key) {
            if let Ok((_, resolved)) = doc.dereference(value) {
                return Some(resolved.clone());
            }
        }

        match dict.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => node_id = *parent_id,
            _ => return None,
        }
    }

    warn!("Page tree deeper than {} levels, giving up on {:?}", MAX_TREE_DEPTH, String::from_utf8_lossy(key));
    None
}

/// Copy inheritable attributes from ancestors onto the page itself.
///
/// Needed before a page is moved under a different parent.
pub(crate) fn push_down_inherited(doc: &mut Document, page_id: ObjectId) -> Result<()> {
    let mut inherited: Vec<(&[u8], Object)> = Vec::new();
    {
        let dict = doc
            .get_dictionary(page_id)
            .map_err(|e| PdfError::Structure(e.to_string()))?;
        for key in INHERITABLE_KEYS {
            if dict.has(key) {
                continue;
            }
            if let Some(value) = inherited_attribute(doc, page_id, key) {
                inherited.push((key, value));
            }
        }
    }

    let dict = doc
        .get_dictionary_mut(page_id)
        .map_err(|e| PdfError::Structure(e.to_string()))?;
    for (key, value) in inherited {
        dict.set(key.to_vec(), value);
    }
    Ok(())
}

/// MediaBox of a page, inherited if needed, defaulting to US Letter.
pub(crate) fn native_page_box(doc: &Document, page_id: ObjectId) -> NativePageSize {
    match inherited_attribute(doc, page_id, b"MediaBox").and_then(|obj| rect_from_object(doc, &obj)) {
        Some(rect) => NativePageSize::from_rect(rect),
        None => {
            debug!("Page {:?} has no MediaBox, assuming Letter", page_id);
            NativePageSize::LETTER
        }
    }
}

fn rect_from_object(doc: &Document, obj: &Object) -> Option<[f64; 4]> {
    let arr = obj.as_array().ok()?;
    if arr.len() < 4 {
        return None;
    }
    let mut rect = [0.0; 4];
    for (slot, item) in rect.iter_mut().zip(arr) {
        let (_, resolved) = doc.dereference(item).ok()?;
        *slot = number(resolved)?;
    }
    Some(rect)
}

/// Root of the page tree (`/Root /Pages`).
pub(crate) fn pages_root(doc: &Document) -> Result<ObjectId> {
    let catalog: &Dictionary = doc
        .catalog()
        .map_err(|e| PdfError::Structure(format!("missing catalog: {}", e)))?;
    match catalog.get(b"Pages") {
        Ok(Object::Reference(id)) => Ok(*id),
        _ => Err(PdfError::Structure("catalog has no /Pages reference".to_string())),
    }
}
