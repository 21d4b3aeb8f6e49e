//! Minimal Office Open XML packages (DOCX, PPTX, XLSX).
//!
//! Parts are streamed through a quick-xml writer into a ZIP container. Only
//! the parts each format requires to open are produced.

pub mod docx;
pub mod pptx;
pub mod xlsx;

pub use docx::{image_document, text_document, DocxImage};
pub use pptx::presentation;
pub use xlsx::{workbook, Sheet};

use std::io::{self, Cursor, Write};

use quick_xml::events::{BytesDecl, Event};
use quick_xml::Writer;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::Result;

const NS_RELATIONSHIPS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

const RELS_CONTENT_TYPE: &str = "application/vnd.openxmlformats-package.relationships+xml";
pub(crate) const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
pub(crate) const REL_IMAGE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

pub(crate) type XmlWriter = Writer<Cursor<Vec<u8>>>;

/// Serialize one part: the standalone declaration, then `content`.
pub(crate) fn xml_part<F>(content: F) -> Result<Vec<u8>>
where
    F: FnOnce(&mut XmlWriter) -> io::Result<()>,
{
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    content(&mut writer)?;
    Ok(writer.into_inner().into_inner())
}

/// One `<Relationship>` of a `.rels` part.
pub(crate) struct Relationship {
    pub id: String,
    pub rel_type: &'static str,
    pub target: String,
}

impl Relationship {
    pub fn new(id: impl Into<String>, rel_type: &'static str, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            rel_type,
            target: target.into(),
        }
    }
}

pub(crate) fn relationships_xml(rels: &[Relationship]) -> Result<Vec<u8>> {
    xml_part(|w| {
        w.create_element("Relationships")
            .with_attribute(("xmlns", NS_RELATIONSHIPS))
            .write_inner_content(|w| {
                for rel in rels {
                    w.create_element("Relationship")
                        .with_attribute(("Id", rel.id.as_str()))
                        .with_attribute(("Type", rel.rel_type))
                        .with_attribute(("Target", rel.target.as_str()))
                        .write_empty()?;
                }
                Ok(())
            })?;
        Ok(())
    })
}

/// ZIP container that tracks content types as parts are added.
pub(crate) struct Package {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
    defaults: Vec<(&'static str, &'static str)>,
    overrides: Vec<(String, &'static str)>,
}

impl Package {
    pub fn new() -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            options: SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
            defaults: vec![("rels", RELS_CONTENT_TYPE), ("xml", "application/xml")],
            overrides: Vec::new(),
        }
    }

    /// Register a content type for every part with `extension`.
    pub fn default_type(&mut self, extension: &'static str, content_type: &'static str) {
        if !self.defaults.iter().any(|(ext, _)| *ext == extension) {
            self.defaults.push((extension, content_type));
        }
    }

    /// Add a part whose content type is given explicitly.
    pub fn add_typed(&mut self, path: &str, content_type: &'static str, data: &[u8]) -> Result<()> {
        self.overrides.push((format!("/{}", path), content_type));
        self.add(path, data)
    }

    /// Add a part covered by a default content type.
    pub fn add(&mut self, path: &str, data: &[u8]) -> Result<()> {
        self.zip.start_file(path, self.options).map_err(crate::error::ExportError::from)?;
        self.zip.write_all(data)?;
        Ok(())
    }

    /// Write `[Content_Types].xml` and close the archive.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        let types = xml_part(|w| {
            w.create_element("Types")
                .with_attribute(("xmlns", NS_CONTENT_TYPES))
                .write_inner_content(|w| {
                    for (ext, content_type) in &self.defaults {
                        w.create_element("Default")
                            .with_attribute(("Extension", *ext))
                            .with_attribute(("ContentType", *content_type))
                            .write_empty()?;
                    }
                    for (part, content_type) in &self.overrides {
                        w.create_element("Override")
                            .with_attribute(("PartName", part.as_str()))
                            .with_attribute(("ContentType", *content_type))
                            .write_empty()?;
                    }
                    Ok(())
                })?;
            Ok(())
        })?;

        self.add("[Content_Types].xml", &types)?;
        let cursor = self.zip.finish().map_err(crate::error::ExportError::from)?;
        Ok(cursor.into_inner())
    }
}

/// Column name for a zero-based index: 0 -> A, 25 -> Z, 26 -> AA.
pub(crate) fn column_name(mut index: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Read;

    /// Read one part of a finished package as text.
    pub fn read_part(bytes: &[u8], path: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(path).unwrap();
        let mut text = String::new();
        file.read_to_string(&mut text).unwrap();
        text
    }

    pub fn part_names(bytes: &[u8]) -> Vec<String> {
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        archive.file_names().map(str::to_string).collect()
    }

    #[test]
    fn test_column_names() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(27), "AB");
        assert_eq!(column_name(701), "ZZ");
        assert_eq!(column_name(702), "AAA");
    }

    #[test]
    fn test_content_types_list_overrides() {
        let mut package = Package::new();
        package.default_type("png", "image/png");
        package.add_typed("word/document.xml", "application/test+xml", b"<x/>").unwrap();
        let bytes = package.finish().unwrap();

        let types = read_part(&bytes, "[Content_Types].xml");
        assert!(types.contains(r#"<Default Extension="png" ContentType="image/png"/>"#));
        assert!(types.contains(r#"<Override PartName="/word/document.xml" ContentType="application/test+xml"/>"#));
        assert_eq!(read_part(&bytes, "word/document.xml"), "<x/>");
    }

    #[test]
    fn test_relationship_attributes_are_escaped() {
        let xml = relationships_xml(&[Relationship::new("rId1", REL_IMAGE, "media/a&b.png")]).unwrap();
        let xml = String::from_utf8(xml).unwrap();

        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships "#));
        assert!(xml.contains(r#"Target="media/a&amp;b.png"/>"#));
        assert!(xml.ends_with("</Relationships>"));
    }
}
