//! Spreadsheets: one worksheet of inline-string cells per page.

use std::io;

use quick_xml::events::BytesText;

use super::{column_name, relationships_xml, xml_part, Package, Relationship, XmlWriter, REL_OFFICE_DOCUMENT};
use crate::Result;

const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const WORKBOOK_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
const SHEET_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";
const STYLES_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml";

const REL_SHEET: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
const REL_STYLES: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";

/// Sheet names are capped at 31 characters and may not contain these.
const FORBIDDEN: [char; 7] = ['\\', '/', '?', '*', '[', ']', ':'];

/// A named grid of cell strings.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }
}

fn sheet_name(name: &str, index: usize) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !FORBIDDEN.contains(c))
        .take(31)
        .collect();
    if cleaned.trim().is_empty() {
        format!("Sheet{}", index + 1)
    } else {
        cleaned
    }
}

fn sheet_xml(rows: &[Vec<String>]) -> Result<Vec<u8>> {
    xml_part(|w| {
        w.create_element("worksheet")
            .with_attribute(("xmlns", NS_MAIN))
            .write_inner_content(|w| {
                w.create_element("sheetData").write_inner_content(|w| {
                    for (r, row) in rows.iter().enumerate() {
                        write_row(w, r + 1, row)?;
                    }
                    Ok(())
                })?;
                Ok(())
            })?;
        Ok(())
    })
}

fn write_row(w: &mut XmlWriter, number: usize, cells: &[String]) -> io::Result<()> {
    let number_attr = number.to_string();
    w.create_element("row")
        .with_attribute(("r", number_attr.as_str()))
        .write_inner_content(|w| {
            for (c, cell) in cells.iter().enumerate() {
                let reference = format!("{}{}", column_name(c), number);
                let element = w.create_element("c").with_attribute(("r", reference.as_str()));
                if cell.is_empty() {
                    element.write_empty()?;
                    continue;
                }
                element
                    .with_attribute(("t", "inlineStr"))
                    .write_inner_content(|w| {
                        w.create_element("is").write_inner_content(|w| {
                            w.create_element("t")
                                .with_attribute(("xml:space", "preserve"))
                                .write_text_content(BytesText::new(cell))?;
                            Ok(())
                        })?;
                        Ok(())
                    })?;
            }
            Ok(())
        })?;
    Ok(())
}

fn workbook_xml(names: &[String]) -> Result<Vec<u8>> {
    xml_part(|w| {
        w.create_element("workbook")
            .with_attributes([("xmlns", NS_MAIN), ("xmlns:r", NS_R)])
            .write_inner_content(|w| {
                w.create_element("sheets").write_inner_content(|w| {
                    for (i, name) in names.iter().enumerate() {
                        let id = (i + 1).to_string();
                        let rel = format!("rId{}", i + 1);
                        w.create_element("sheet")
                            .with_attributes([("name", name.as_str()), ("sheetId", id.as_str()), ("r:id", rel.as_str())])
                            .write_empty()?;
                    }
                    Ok(())
                })?;
                Ok(())
            })?;
        Ok(())
    })
}

/// One font, the two mandatory fills, one border and one cell format.
fn styles_xml() -> Result<Vec<u8>> {
    const XF: [(&str, &str); 4] = [("numFmtId", "0"), ("fontId", "0"), ("fillId", "0"), ("borderId", "0")];

    xml_part(|w| {
        w.create_element("styleSheet")
            .with_attribute(("xmlns", NS_MAIN))
            .write_inner_content(|w| {
                w.create_element("fonts").with_attribute(("count", "1")).write_inner_content(|w| {
                    w.create_element("font").write_inner_content(|w| {
                        w.create_element("sz").with_attribute(("val", "11")).write_empty()?;
                        w.create_element("name").with_attribute(("val", "Calibri")).write_empty()?;
                        Ok(())
                    })?;
                    Ok(())
                })?;
                w.create_element("fills").with_attribute(("count", "2")).write_inner_content(|w| {
                    for pattern in ["none", "gray125"] {
                        w.create_element("fill").write_inner_content(|w| {
                            w.create_element("patternFill")
                                .with_attribute(("patternType", pattern))
                                .write_empty()?;
                            Ok(())
                        })?;
                    }
                    Ok(())
                })?;
                w.create_element("borders").with_attribute(("count", "1")).write_inner_content(|w| {
                    w.create_element("border").write_inner_content(|w| {
                        for side in ["left", "right", "top", "bottom", "diagonal"] {
                            w.create_element(side).write_empty()?;
                        }
                        Ok(())
                    })?;
                    Ok(())
                })?;
                w.create_element("cellStyleXfs").with_attribute(("count", "1")).write_inner_content(|w| {
                    w.create_element("xf").with_attributes(XF).write_empty()?;
                    Ok(())
                })?;
                w.create_element("cellXfs").with_attribute(("count", "1")).write_inner_content(|w| {
                    w.create_element("xf")
                        .with_attributes(XF)
                        .with_attribute(("xfId", "0"))
                        .write_empty()?;
                    Ok(())
                })?;
                Ok(())
            })?;
        Ok(())
    })
}

/// Write a workbook; empty sheets get one row holding one empty cell.
pub fn workbook(sheets: &[Sheet]) -> Result<Vec<u8>> {
    let names: Vec<String> = sheets.iter().enumerate().map(|(i, s)| sheet_name(&s.name, i)).collect();

    let mut package = Package::new();
    package.add(
        "_rels/.rels",
        &relationships_xml(&[Relationship::new("rId1", REL_OFFICE_DOCUMENT, "xl/workbook.xml")])?,
    )?;
    package.add_typed("xl/workbook.xml", WORKBOOK_TYPE, &workbook_xml(&names)?)?;

    let mut rels: Vec<Relationship> = (0..sheets.len())
        .map(|i| Relationship::new(format!("rId{}", i + 1), REL_SHEET, format!("worksheets/sheet{}.xml", i + 1)))
        .collect();
    rels.push(Relationship::new(format!("rId{}", sheets.len() + 1), REL_STYLES, "styles.xml"));
    package.add("xl/_rels/workbook.xml.rels", &relationships_xml(&rels)?)?;
    package.add_typed("xl/styles.xml", STYLES_TYPE, &styles_xml()?)?;

    let placeholder = vec![vec![String::new()]];
    for (i, sheet) in sheets.iter().enumerate() {
        let rows = if sheet.rows.is_empty() { &placeholder } else { &sheet.rows };
        package.add_typed(
            &format!("xl/worksheets/sheet{}.xml", i + 1),
            SHEET_TYPE,
            &sheet_xml(rows)?,
        )?;
    }

    package.finish()
}
