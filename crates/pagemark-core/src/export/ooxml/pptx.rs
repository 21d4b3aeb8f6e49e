//! Presentations: one picture slide per page on a shared canvas.

use std::io;

use super::{relationships_xml, xml_part, Package, Relationship, XmlWriter, REL_IMAGE, REL_OFFICE_DOCUMENT};
use crate::layout::{SlideBox, SlideLayout};
use crate::Result;

/// EMUs per inch; slide layout units are inches.
const EMU_PER_INCH: f64 = 914_400.0;

const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NAMESPACES: [(&str, &str); 3] = [
    ("xmlns:a", NS_A),
    ("xmlns:r", "http://schemas.openxmlformats.org/officeDocument/2006/relationships"),
    ("xmlns:p", "http://schemas.openxmlformats.org/presentationml/2006/main"),
];

const PRESENTATION_TYPE: &str = "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";
const SLIDE_TYPE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
const MASTER_TYPE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml";
const LAYOUT_TYPE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml";
const THEME_TYPE: &str = "application/vnd.openxmlformats-officedocument.theme+xml";

const REL_SLIDE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
const REL_MASTER: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
const REL_LAYOUT: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
const REL_THEME: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";

const THEME_COLORS: [(&str, &str); 12] = [
    ("a:dk1", "000000"),
    ("a:lt1", "FFFFFF"),
    ("a:dk2", "1F2937"),
    ("a:lt2", "F3F4F6"),
    ("a:accent1", "0EA5E9"),
    ("a:accent2", "F97316"),
    ("a:accent3", "22C55E"),
    ("a:accent4", "EAB308"),
    ("a:accent5", "A855F7"),
    ("a:accent6", "EF4444"),
    ("a:hlink", "2563EB"),
    ("a:folHlink", "7C3AED"),
];

fn emu(inches: f64) -> String {
    ((inches * EMU_PER_INCH).round() as i64).to_string()
}

/// `<a:xfrm>` with an offset and extent, in EMUs.
fn write_xfrm(w: &mut XmlWriter, x: &str, y: &str, cx: &str, cy: &str, children: bool) -> io::Result<()> {
    w.create_element("a:xfrm").write_inner_content(|w| {
        w.create_element("a:off").with_attributes([("x", x), ("y", y)]).write_empty()?;
        w.create_element("a:ext").with_attributes([("cx", cx), ("cy", cy)]).write_empty()?;
        if children {
            w.create_element("a:chOff").with_attributes([("x", x), ("y", y)]).write_empty()?;
            w.create_element("a:chExt").with_attributes([("cx", cx), ("cy", cy)]).write_empty()?;
        }
        Ok(())
    })?;
    Ok(())
}

/// Group properties every shape tree starts with.
fn write_tree_header(w: &mut XmlWriter) -> io::Result<()> {
    w.create_element("p:nvGrpSpPr").write_inner_content(|w| {
        w.create_element("p:cNvPr").with_attributes([("id", "1"), ("name", "")]).write_empty()?;
        w.create_element("p:cNvGrpSpPr").write_empty()?;
        w.create_element("p:nvPr").write_empty()?;
        Ok(())
    })?;
    w.create_element("p:grpSpPr")
        .write_inner_content(|w| write_xfrm(w, "0", "0", "0", "0", true))?;
    Ok(())
}

fn write_master_mapping(w: &mut XmlWriter) -> io::Result<()> {
    w.create_element("p:clrMapOvr").write_inner_content(|w| {
        w.create_element("a:masterClrMapping").write_empty()?;
        Ok(())
    })?;
    Ok(())
}

fn presentation_xml(layout: &SlideLayout, slides: usize) -> Result<Vec<u8>> {
    let (cx, cy) = (emu(layout.canvas.width), emu(layout.canvas.height));
    xml_part(|w| {
        w.create_element("p:presentation")
            .with_attributes(NAMESPACES)
            .write_inner_content(|w| {
                w.create_element("p:sldMasterIdLst").write_inner_content(|w| {
                    w.create_element("p:sldMasterId")
                        .with_attributes([("id", "2147483648"), ("r:id", "rId1")])
                        .write_empty()?;
                    Ok(())
                })?;
                w.create_element("p:sldIdLst").write_inner_content(|w| {
                    for i in 0..slides {
                        let id = (256 + i).to_string();
                        let rel = format!("rId{}", i + 2);
                        w.create_element("p:sldId")
                            .with_attributes([("id", id.as_str()), ("r:id", rel.as_str())])
                            .write_empty()?;
                    }
                    Ok(())
                })?;
                w.create_element("p:sldSz")
                    .with_attributes([("cx", cx.as_str()), ("cy", cy.as_str())])
                    .write_empty()?;
                w.create_element("p:notesSz")
                    .with_attributes([("cx", "6858000"), ("cy", "9144000")])
                    .write_empty()?;
                Ok(())
            })?;
        Ok(())
    })
}

fn slide_xml(index: usize, placement: &SlideBox) -> Result<Vec<u8>> {
    let name = format!("Page {}", index + 1);
    let (x, y) = (emu(placement.x), emu(placement.y));
    let (cx, cy) = (emu(placement.width), emu(placement.height));

    xml_part(|w| {
        w.create_element("p:sld").with_attributes(NAMESPACES).write_inner_content(|w| {
            w.create_element("p:cSld").write_inner_content(|w| {
                w.create_element("p:spTree").write_inner_content(|w| {
                    write_tree_header(w)?;
                    w.create_element("p:pic").write_inner_content(|w| {
                        w.create_element("p:nvPicPr").write_inner_content(|w| {
                            w.create_element("p:cNvPr")
                                .with_attributes([("id", "2"), ("name", name.as_str())])
                                .write_empty()?;
                            w.create_element("p:cNvPicPr").write_inner_content(|w| {
                                w.create_element("a:picLocks")
                                    .with_attribute(("noChangeAspect", "1"))
                                    .write_empty()?;
                                Ok(())
                            })?;
                            w.create_element("p:nvPr").write_empty()?;
                            Ok(())
                        })?;
                        w.create_element("p:blipFill").write_inner_content(|w| {
                            w.create_element("a:blip").with_attribute(("r:embed", "rId2")).write_empty()?;
                            w.create_element("a:stretch").write_inner_content(|w| {
                                w.create_element("a:fillRect").write_empty()?;
                                Ok(())
                            })?;
                            Ok(())
                        })?;
                        w.create_element("p:spPr").write_inner_content(|w| {
                            write_xfrm(w, &x, &y, &cx, &cy, false)?;
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
                })?;
                Ok(())
            })?;
            write_master_mapping(w)
        })?;
        Ok(())
    })
}

fn master_xml() -> Result<Vec<u8>> {
    xml_part(|w| {
        w.create_element("p:sldMaster").with_attributes(NAMESPACES).write_inner_content(|w| {
            w.create_element("p:cSld").write_inner_content(|w| {
                w.create_element("p:spTree").write_inner_content(write_tree_header)?;
                Ok(())
            })?;
            w.create_element("p:clrMap")
                .with_attributes([
                    ("bg1", "lt1"),
                    ("tx1", "dk1"),
                    ("bg2", "lt2"),
                    ("tx2", "dk2"),
                    ("accent1", "accent1"),
                    ("accent2", "accent2"),
                    ("accent3", "accent3"),
                    ("accent4", "accent4"),
                    ("accent5", "accent5"),
                    ("accent6", "accent6"),
                    ("hlink", "hlink"),
                    ("folHlink", "folHlink"),
                ])
                .write_empty()?;
            w.create_element("p:sldLayoutIdLst").write_inner_content(|w| {
                w.create_element("p:sldLayoutId")
                    .with_attributes([("id", "2147483649"), ("r:id", "rId1")])
                    .write_empty()?;
                Ok(())
            })?;
            Ok(())
        })?;
        Ok(())
    })
}

fn layout_xml() -> Result<Vec<u8>> {
    xml_part(|w| {
        w.create_element("p:sldLayout")
            .with_attributes(NAMESPACES)
            .with_attributes([("type", "blank"), ("preserve", "1")])
            .write_inner_content(|w| {
                w.create_element("p:cSld")
                    .with_attribute(("name", "Blank"))
                    .write_inner_content(|w| {
                        w.create_element("p:spTree").write_inner_content(write_tree_header)?;
                        Ok(())
                    })?;
                write_master_mapping(w)
            })?;
        Ok(())
    })
}

fn write_font(w: &mut XmlWriter, name: &str) -> io::Result<()> {
    w.create_element(name).write_inner_content(|w| {
        w.create_element("a:latin").with_attribute(("typeface", "Calibri")).write_empty()?;
        w.create_element("a:ea").with_attribute(("typeface", "")).write_empty()?;
        w.create_element("a:cs").with_attribute(("typeface", "")).write_empty()?;
        Ok(())
    })?;
    Ok(())
}

fn write_placeholder_fill(w: &mut XmlWriter) -> io::Result<()> {
    w.create_element("a:solidFill").write_inner_content(|w| {
        w.create_element("a:schemeClr").with_attribute(("val", "phClr")).write_empty()?;
        Ok(())
    })?;
    Ok(())
}

/// Three identical entries, the minimum a style list accepts.
fn write_style_list<F>(w: &mut XmlWriter, name: &str, entry: F) -> io::Result<()>
where
    F: Fn(&mut XmlWriter) -> io::Result<()>,
{
    w.create_element(name).write_inner_content(|w| {
        for _ in 0..3 {
            entry(w)?;
        }
        Ok(())
    })?;
    Ok(())
}

fn theme_xml() -> Result<Vec<u8>> {
    xml_part(|w| {
        w.create_element("a:theme")
            .with_attributes([("xmlns:a", NS_A), ("name", "pagemark")])
            .write_inner_content(|w| {
                w.create_element("a:themeElements").write_inner_content(|w| {
                    w.create_element("a:clrScheme")
                        .with_attribute(("name", "pagemark"))
                        .write_inner_content(|w| {
                            for (slot, rgb) in THEME_COLORS {
                                w.create_element(slot).write_inner_content(|w| {
                                    w.create_element("a:srgbClr").with_attribute(("val", rgb)).write_empty()?;
                                    Ok(())
                                })?;
                            }
                            Ok(())
                        })?;
                    w.create_element("a:fontScheme")
                        .with_attribute(("name", "pagemark"))
                        .write_inner_content(|w| {
                            write_font(w, "a:majorFont")?;
                            write_font(w, "a:minorFont")
                        })?;
                    w.create_element("a:fmtScheme")
                        .with_attribute(("name", "pagemark"))
                        .write_inner_content(|w| {
                            write_style_list(w, "a:fillStyleLst", write_placeholder_fill)?;
                            write_style_list(w, "a:lnStyleLst", |w| {
                                w.create_element("a:ln")
                                    .with_attribute(("w", "9525"))
                                    .write_inner_content(write_placeholder_fill)?;
                                Ok(())
                            })?;
                            write_style_list(w, "a:effectStyleLst", |w| {
                                w.create_element("a:effectStyle").write_inner_content(|w| {
                                    w.create_element("a:effectLst").write_empty()?;
                                    Ok(())
                                })?;
                                Ok(())
                            })?;
                            write_style_list(w, "a:bgFillStyleLst", write_placeholder_fill)
                        })?;
                    Ok(())
                })?;
                Ok(())
            })?;
        Ok(())
    })
}

/// Build a presentation: slide `i` shows `images[i]` in `layout.boxes[i]`.
///
/// Extra images or boxes without a partner are ignored.
pub fn presentation(layout: &SlideLayout, images: &[Vec<u8>]) -> Result<Vec<u8>> {
    let slides = layout.boxes.len().min(images.len());
    let mut package = Package::new();
    package.default_type("png", "image/png");

    package.add(
        "_rels/.rels",
        &relationships_xml(&[Relationship::new("rId1", REL_OFFICE_DOCUMENT, "ppt/presentation.xml")])?,
    )?;
    package.add_typed(
        "ppt/presentation.xml",
        PRESENTATION_TYPE,
        &presentation_xml(layout, slides)?,
    )?;

    let mut rels = vec![Relationship::new("rId1", REL_MASTER, "slideMasters/slideMaster1.xml")];
    rels.extend((0..slides).map(|i| Relationship::new(format!("rId{}", i + 2), REL_SLIDE, format!("slides/slide{}.xml", i + 1))));
    rels.push(Relationship::new(format!("rId{}", slides + 2), REL_THEME, "theme/theme1.xml"));
    package.add("ppt/_rels/presentation.xml.rels", &relationships_xml(&rels)?)?;

    package.add_typed("ppt/slideMasters/slideMaster1.xml", MASTER_TYPE, &master_xml()?)?;
    package.add(
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        &relationships_xml(&[
            Relationship::new("rId1", REL_LAYOUT, "../slideLayouts/slideLayout1.xml"),
            Relationship::new("rId2", REL_THEME, "../theme/theme1.xml"),
        ])?,
    )?;
    package.add_typed("ppt/slideLayouts/slideLayout1.xml", LAYOUT_TYPE, &layout_xml()?)?;
    package.add(
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
        &relationships_xml(&[Relationship::new("rId1", REL_MASTER, "../slideMasters/slideMaster1.xml")])?,
    )?;
    package.add_typed("ppt/theme/theme1.xml", THEME_TYPE, &theme_xml()?)?;

    for (i, (placement, png)) in layout.boxes.iter().zip(images).enumerate() {
        let n = i + 1;
        package.add_typed(&format!("ppt/slides/slide{}.xml", n), SLIDE_TYPE, &slide_xml(i, placement)?)?;
        package.add(
            &format!("ppt/slides/_rels/slide{}.xml.rels", n),
            &relationships_xml(&[
                Relationship::new("rId1", REL_LAYOUT, "../slideLayouts/slideLayout1.xml"),
                Relationship::new("rId2", REL_IMAGE, format!("../media/image{}.png", n)),
            ])?,
        )?;
        package.add(&format!("ppt/media/image{}.png", n), png)?;
    }

    package.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::ooxml::tests::{part_names, read_part};
    use crate::layout::SlideLayoutEngine;
    use crate::models::PixelSize;

    #[test]
    fn test_wide_canvas_and_centered_picture() {
        let layout = SlideLayoutEngine::new()
            .layout(&[PixelSize::new(1000.0, 500.0), PixelSize::new(500.0, 1000.0)])
            .unwrap();
        let bytes = presentation(&layout, &[vec![0u8; 4], vec![1u8; 4]]).unwrap();

        let presentation = read_part(&bytes, "ppt/presentation.xml");
        assert!(presentation.contains(r#"<p:sldSz cx="12188952" cy="6858000"/>"#));
        assert_eq!(presentation.matches("<p:sldId ").count(), 2);

        // 12.83 x 6.415 inches, centered vertically on a 7.5 inch canvas.
        let slide = read_part(&bytes, "ppt/slides/slide1.xml");
        assert!(slide.contains(r#"<a:off x="228600" y="496062"/>"#));
        assert!(slide.contains(r#"<a:ext cx="11731752" cy="5865876"/>"#));

        let names = part_names(&bytes);
        for part in ["ppt/media/image2.png", "ppt/theme/theme1.xml", "ppt/slides/_rels/slide2.xml.rels"] {
            assert!(names.contains(&part.to_string()), "missing {}", part);
        }
    }

    #[test]
    fn test_slide_count_follows_shorter_input() {
        let layout = SlideLayoutEngine::new()
            .layout(&[PixelSize::new(10.0, 20.0); 3])
            .unwrap();
        let bytes = presentation(&layout, &[vec![0u8; 4]]).unwrap();

        let names = part_names(&bytes);
        assert!(names.contains(&"ppt/slides/slide1.xml".to_string()));
        assert!(!names.contains(&"ppt/slides/slide2.xml".to_string()));
    }
}
