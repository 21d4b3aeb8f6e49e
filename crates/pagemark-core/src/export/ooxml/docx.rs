//! Word-processor documents: text paragraphs or one image per page.

use std::io;

use quick_xml::events::BytesText;

use super::{relationships_xml, xml_part, Package, Relationship, XmlWriter, REL_IMAGE, REL_OFFICE_DOCUMENT};
use crate::Result;

const DOCUMENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";

/// EMUs per CSS pixel at 96 dpi.
const EMU_PER_PX: u64 = 9525;

const NAMESPACES: [(&str, &str); 5] = [
    ("xmlns:w", "http://schemas.openxmlformats.org/wordprocessingml/2006/main"),
    ("xmlns:r", "http://schemas.openxmlformats.org/officeDocument/2006/relationships"),
    ("xmlns:wp", "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing"),
    ("xmlns:a", "http://schemas.openxmlformats.org/drawingml/2006/main"),
    ("xmlns:pic", "http://schemas.openxmlformats.org/drawingml/2006/picture"),
];

const PICTURE_URI: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";

/// A PNG placed at a fixed display size.
#[derive(Debug, Clone)]
pub struct DocxImage {
    pub png: Vec<u8>,
    pub width_px: u32,
    pub height_px: u32,
}

/// US Letter with one-inch margins, in twentieths of a point.
fn write_section(w: &mut XmlWriter) -> io::Result<()> {
    w.create_element("w:sectPr").write_inner_content(|w| {
        w.create_element("w:pgSz")
            .with_attributes([("w:w", "12240"), ("w:h", "15840")])
            .write_empty()?;
        w.create_element("w:pgMar")
            .with_attributes([
                ("w:top", "1440"),
                ("w:right", "1440"),
                ("w:bottom", "1440"),
                ("w:left", "1440"),
                ("w:header", "720"),
                ("w:footer", "720"),
                ("w:gutter", "0"),
            ])
            .write_empty()?;
        Ok(())
    })?;
    Ok(())
}

fn document_xml<F>(body: F) -> Result<Vec<u8>>
where
    F: FnOnce(&mut XmlWriter) -> io::Result<()>,
{
    xml_part(|w| {
        w.create_element("w:document")
            .with_attributes(NAMESPACES)
            .write_inner_content(|w| {
                w.create_element("w:body").write_inner_content(|w| {
                    body(w)?;
                    write_section(w)
                })?;
                Ok(())
            })?;
        Ok(())
    })
}

fn write_text_paragraph(w: &mut XmlWriter, block: &str) -> io::Result<()> {
    w.create_element("w:p").write_inner_content(|w| {
        w.create_element("w:r").write_inner_content(|w| {
            for (i, line) in block.lines().enumerate() {
                if i > 0 {
                    w.create_element("w:br").write_empty()?;
                }
                w.create_element("w:t")
                    .with_attribute(("xml:space", "preserve"))
                    .write_text_content(BytesText::new(line))?;
            }
            Ok(())
        })?;
        Ok(())
    })?;
    Ok(())
}

fn write_image_paragraph(w: &mut XmlWriter, index: usize, rel_id: &str, image: &DocxImage) -> io::Result<()> {
    let cx = (image.width_px as u64 * EMU_PER_PX).to_string();
    let cy = (image.height_px as u64 * EMU_PER_PX).to_string();
    let id = (index + 1).to_string();
    let title = format!("Page {}", id);
    let file = format!("page-{}.png", id);
    let extent = [("cx", cx.as_str()), ("cy", cy.as_str())];

    w.create_element("w:p").write_inner_content(|w| {
        w.create_element("w:pPr").write_inner_content(|w| {
            w.create_element("w:jc").with_attribute(("w:val", "center")).write_empty()?;
            Ok(())
        })?;
        w.create_element("w:r").write_inner_content(|w| {
            w.create_element("w:drawing").write_inner_content(|w| {
                w.create_element("wp:inline")
                    .with_attributes([("distT", "0"), ("distB", "0"), ("distL", "0"), ("distR", "0")])
                    .write_inner_content(|w| {
                        w.create_element("wp:extent").with_attributes(extent).write_empty()?;
                        w.create_element("wp:docPr")
                            .with_attributes([("id", id.as_str()), ("name", title.as_str())])
                            .write_empty()?;
                        w.create_element("a:graphic").write_inner_content(|w| {
                            w.create_element("a:graphicData")
                                .with_attribute(("uri", PICTURE_URI))
                                .write_inner_content(|w| write_picture(w, &id, &file, rel_id, extent))?;
                            Ok(())
                        })?;
                        Ok(())
                    })?;
                Ok(())
            })?;
            Ok(())
        })?;
        Ok(())
    })?;
    Ok(())
}

fn write_picture(w: &mut XmlWriter, id: &str, file: &str, rel_id: &str, extent: [(&str, &str); 2]) -> io::Result<()> {
    w.create_element("pic:pic").write_inner_content(|w| {
        w.create_element("pic:nvPicPr").write_inner_content(|w| {
            w.create_element("pic:cNvPr")
                .with_attributes([("id", id), ("name", file)])
                .write_empty()?;
            w.create_element("pic:cNvPicPr").write_empty()?;
            Ok(())
        })?;
        w.create_element("pic:blipFill").write_inner_content(|w| {
            w.create_element("a:blip").with_attribute(("r:embed", rel_id)).write_empty()?;
            w.create_element("a:stretch").write_inner_content(|w| {
                w.create_element("a:fillRect").write_empty()?;
                Ok(())
            })?;
            Ok(())
        })?;
        w.create_element("pic:spPr").write_inner_content(|w| {
            w.create_element("a:xfrm").write_inner_content(|w| {
                w.create_element("a:off").with_attributes([("x", "0"), ("y", "0")]).write_empty()?;
                w.create_element("a:ext").with_attributes(extent).write_empty()?;
                Ok(())
            })?;
            w.create_element("a:prstGeom")
                .with_attribute(("prst", "rect"))
                .write_inner_content(|w| {
                    w.create_element("a:avLst").write_empty()?;
                    Ok(())
                })?;
            Ok(())
        })?;
        Ok(())
    })?;
    Ok(())
}

fn package_with(document: Vec<u8>, document_rels: &[Relationship], media: &[(String, &[u8])]) -> Result<Vec<u8>> {
    let mut package = Package::new();
    package.add(
        "_rels/.rels",
        &relationships_xml(&[Relationship::new("rId1", REL_OFFICE_DOCUMENT, "word/document.xml")])?,
    )?;
    package.add_typed("word/document.xml", DOCUMENT_TYPE, &document)?;
    package.add("word/_rels/document.xml.rels", &relationships_xml(document_rels)?)?;

    if !media.is_empty() {
        package.default_type("png", "image/png");
    }
    for (path, data) in media {
        package.add(path, data)?;
    }
    package.finish()
}

/// One paragraph per block; line breaks inside a block are kept.
pub fn text_document(blocks: &[&str]) -> Result<Vec<u8>> {
    let document = document_xml(|w| {
        for block in blocks {
            write_text_paragraph(w, block)?;
        }
        Ok(())
    })?;
    package_with(document, &[], &[])
}

/// One centered image paragraph per page.
pub fn image_document(images: &[DocxImage]) -> Result<Vec<u8>> {
    let mut rels = Vec::with_capacity(images.len());
    let mut media = Vec::with_capacity(images.len());

    for (i, image) in images.iter().enumerate() {
        let target = format!("media/image{}.png", i + 1);
        media.push((format!("word/{}", target), image.png.as_slice()));
        rels.push(Relationship::new(format!("rId{}", i + 1), REL_IMAGE, target));
    }

    let document = document_xml(|w| {
        for (i, (image, rel)) in images.iter().zip(&rels).enumerate() {
            write_image_paragraph(w, i, &rel.id, image)?;
        }
        Ok(())
    })?;
    package_with(document, &rels, &media)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::ooxml::tests::{part_names, read_part};

    #[test]
    fn test_text_paragraphs_are_escaped() {
        let bytes = text_document(&["Profit & Loss", "Line one\nLine <two>"]).unwrap();
        let document = read_part(&bytes, "word/document.xml");

        assert_eq!(document.matches("<w:p>").count(), 2);
        assert!(document.contains("Profit &amp; Loss"));
        assert!(document.contains(r#"Line one</w:t><w:br/><w:t xml:space="preserve">Line &lt;two&gt;"#));
    }

    #[test]
    fn test_image_pages_reference_media() {
        let images = vec![
            DocxImage { png: vec![1, 2, 3], width_px: 620, height_px: 802 },
            DocxImage { png: vec![4, 5], width_px: 215, height_px: 860 },
        ];
        let bytes = image_document(&images).unwrap();

        let names = part_names(&bytes);
        assert!(names.contains(&"word/media/image1.png".to_string()));
        assert!(names.contains(&"word/media/image2.png".to_string()));

        let document = read_part(&bytes, "word/document.xml");
        assert!(document.contains(r#"<wp:extent cx="5905500" cy="7639050"/>"#));
        assert!(document.contains(r#"<a:blip r:embed="rId2"/>"#));
        assert!(document.contains(r#"<w:jc w:val="center"/>"#));

        let rels = read_part(&bytes, "word/_rels/document.xml.rels");
        assert!(rels.contains(r#"Target="media/image2.png""#));

        let types = read_part(&bytes, "[Content_Types].xml");
        assert!(types.contains(r#"Extension="png""#));
    }
}
