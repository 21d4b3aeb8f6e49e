//! Drawing onto existing pages: ink images, watermarks and page numbers.
//!
//! Existing page content is wrapped in `q ... Q` so whatever graphics state
//! it leaves behind cannot leak into the stamp.

use std::io::Write;

use encoding_rs::WINDOWS_1252;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::RgbaImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use tracing::debug;

use super::document::{inherited_attribute, native_page_box};
use super::Result;
use crate::error::PdfError;
use crate::layout::{CoordinateMapper, Point};

/// Approximate Helvetica advance as a fraction of the font size.
const HELVETICA_ADVANCE: f64 = 0.5;

/// An ink raster and where it lands on the native page.
#[derive(Debug, Clone, Copy)]
pub struct InkStamp<'a> {
    pub image: &'a RgbaImage,
    pub origin: Point,
    pub width: f64,
    pub height: f64,
}

impl<'a> InkStamp<'a> {
    /// Stretch `image` over the whole native page described by `mapper`.
    pub fn from_mapper(image: &'a RgbaImage, mapper: &CoordinateMapper) -> Self {
        let (width, height) = mapper.placed_size();
        Self {
            image,
            origin: mapper.placed_origin(),
            width,
            height,
        }
    }
}

/// Draw an RGBA image over a page, alpha preserved through a soft mask.
pub fn stamp_image(doc: &mut Document, page: u32, stamp: &InkStamp<'_>) -> Result<()> {
    let page_id = page_object(doc, page)?;
    let (w, h) = stamp.image.dimensions();

    let mut rgb = Vec::with_capacity((w * h * 3) as usize);
    let mut alpha = Vec::with_capacity((w * h) as usize);
    for px in stamp.image.pixels() {
        rgb.extend_from_slice(&px.0[..3]);
        alpha.push(px.0[3]);
    }

    let smask_id = doc.add_object(flate_stream(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => w as i64,
            "Height" => h as i64,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
        },
        &alpha,
    )?);
    let image_id = doc.add_object(flate_stream(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => w as i64,
            "Height" => h as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "SMask" => smask_id,
        },
        &rgb,
    )?);

    let name = add_page_resource(doc, page_id, b"XObject", "PmInk", image_id.into())?;
    let ops = vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                real(stamp.width),
                real(0.0),
                real(0.0),
                real(stamp.height),
                real(stamp.origin.x),
                real(stamp.origin.y),
            ],
        ),
        Operation::new("Do", vec![Object::Name(name)]),
        Operation::new("Q", vec![]),
    ];
    append_wrapped(doc, page_id, ops)?;

    debug!("Stamped {}x{} ink onto page {}", w, h, page);
    Ok(())
}

/// Appearance of the watermark and footer stamps.
#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkStyle {
    pub text: Option<String>,
    pub number_pages: bool,
    pub font_size: f64,
    pub opacity: f64,
    pub angle_degrees: f64,
    pub spacing: f64,
    pub color: [f64; 3],
    pub footer_font_size: f64,
    pub footer_margin: f64,
}

impl WatermarkStyle {
    fn watermark_text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.trim().is_empty())
    }

    /// True when the style would draw nothing.
    pub fn is_noop(&self) -> bool {
        self.watermark_text().is_none() && !self.number_pages
    }
}

/// Tile the watermark and/or draw `"i / n"` footers on every page.
///
/// Returns `false` without touching the document when there is nothing to draw.
pub fn watermark_pages(doc: &mut Document, style: &WatermarkStyle) -> Result<bool> {
    if style.is_noop() {
        return Ok(false);
    }

    let pages: Vec<(u32, ObjectId)> = doc.get_pages().into_iter().collect();
    let total = pages.len();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let gs_id = doc.add_object(dictionary! {
        "Type" => "ExtGState",
        "ca" => real(style.opacity),
        "CA" => real(style.opacity),
    });

    for (index, page_id) in pages {
        let page_box = native_page_box(doc, page_id);
        let font = add_page_resource(doc, page_id, b"Font", "PmFont", font_id.into())?;
        let mut ops = Vec::new();

        if let Some(text) = style.watermark_text() {
            let gs = add_page_resource(doc, page_id, b"ExtGState", "PmGs", gs_id.into())?;
            let (sin, cos) = style.angle_degrees.to_radians().sin_cos();
            let half = text_width(text, style.font_size) / 2.0;
            let step = style.spacing.max(1.0);

            ops.push(Operation::new("q", vec![]));
            ops.push(Operation::new("gs", vec![Object::Name(gs)]));
            ops.push(rgb_fill(style.color));
            ops.push(Operation::new("BT", vec![]));
            ops.push(Operation::new("Tf", vec![Object::Name(font.clone()), real(style.font_size)]));

            let mut y = page_box.origin_y + step / 2.0;
            while y < page_box.origin_y + page_box.height {
                let mut x = page_box.origin_x + step / 2.0;
                while x < page_box.origin_x + page_box.width {
                    // Start the run so that its midpoint sits on the grid point.
                    ops.push(Operation::new(
                        "Tm",
                        vec![
                            real(cos),
                            real(sin),
                            real(-sin),
                            real(cos),
                            real(x - half * cos),
                            real(y - half * sin),
                        ],
                    ));
                    ops.push(Operation::new("Tj", vec![win_ansi_string(text)]));
                    x += step;
                }
                y += step;
            }
            ops.push(Operation::new("ET", vec![]));
            ops.push(Operation::new("Q", vec![]));
        }

        if style.number_pages {
            let label = format!("{} / {}", index, total);
            let x = page_box.origin_x + (page_box.width - text_width(&label, style.footer_font_size)) / 2.0;
            let y = page_box.origin_y + style.footer_margin;

            ops.push(Operation::new("q", vec![]));
            ops.push(rgb_fill([0.0, 0.0, 0.0]));
            ops.push(Operation::new("BT", vec![]));
            ops.push(Operation::new("Tf", vec![Object::Name(font), real(style.footer_font_size)]));
            ops.push(Operation::new("Td", vec![real(x), real(y)]));
            ops.push(Operation::new("Tj", vec![win_ansi_string(&label)]));
            ops.push(Operation::new("ET", vec![]));
            ops.push(Operation::new("Q", vec![]));
        }

        append_wrapped(doc, page_id, ops)?;
    }

    debug!("Watermarked {} pages", total);
    Ok(true)
}

fn page_object(doc: &Document, page: u32) -> Result<ObjectId> {
    doc.get_pages()
        .get(&page)
        .copied()
        .ok_or(PdfError::InvalidPage(page))
}

fn real(v: f64) -> Object {
    Object::Real(v as f32)
}

fn rgb_fill(color: [f64; 3]) -> Operation {
    Operation::new("rg", color.iter().map(|&c| real(c)).collect())
}

/// Literal string in the stamp font's WinAnsiEncoding.
///
/// Characters outside the code page become `?`.
fn win_ansi_string(text: &str) -> Object {
    let mut bytes = Vec::with_capacity(text.len());
    let mut buf = [0u8; 4];
    for ch in text.chars() {
        let (encoded, _, unmappable) = WINDOWS_1252.encode(ch.encode_utf8(&mut buf));
        if unmappable || ch.is_control() {
            bytes.push(b'?');
        } else {
            bytes.extend_from_slice(&encoded);
        }
    }
    Object::String(bytes, StringFormat::Literal)
}

fn text_width(text: &str, size: f64) -> f64 {
    text.chars().count() as f64 * size * HELVETICA_ADVANCE
}

/// Zlib-compressed stream with `/Filter /FlateDecode`.
pub(crate) fn flate_stream(mut dict: Dictionary, data: &[u8]) -> Result<Stream> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| PdfError::Write(format!("deflate failed: {}", e)))?;
    let compressed = encoder
        .finish()
        .map_err(|e| PdfError::Write(format!("deflate failed: {}", e)))?;
    dict.set("Filter", "FlateDecode");
    Ok(Stream::new(dict, compressed))
}

/// Give the page its own resource dictionary holding `value` under a fresh
/// name in `category`, returning the name used.
///
/// Inherited or shared resource dictionaries are copied, never mutated.
fn add_page_resource(
    doc: &mut Document,
    page_id: ObjectId,
    category: &[u8],
    prefix: &str,
    value: Object,
) -> Result<Vec<u8>> {
    let mut resources = match inherited_attribute(doc, page_id, b"Resources") {
        Some(Object::Dictionary(dict)) => dict,
        _ => Dictionary::new(),
    };

    let mut entries = match resources.get(category).map(|obj| doc.dereference(obj)) {
        Ok(Ok((_, Object::Dictionary(dict)))) => dict.clone(),
        _ => Dictionary::new(),
    };

    let mut suffix = 0;
    let name = loop {
        let candidate = format!("{}{}", prefix, suffix).into_bytes();
        if !entries.has(&candidate) {
            break candidate;
        }
        suffix += 1;
    };

    entries.set(name.clone(), value);
    resources.set(category.to_vec(), Object::Dictionary(entries));

    doc.get_dictionary_mut(page_id)
        .map_err(|e| PdfError::Structure(e.to_string()))?
        .set("Resources", Object::Dictionary(resources));
    Ok(name)
}

/// Wrap the page's existing content in `q ... Q` and append `ops` after it.
fn append_wrapped(doc: &mut Document, page_id: ObjectId, ops: Vec<Operation>) -> Result<()> {
    let existing: Vec<Object> = {
        let page = doc
            .get_dictionary(page_id)
            .map_err(|e| PdfError::Structure(e.to_string()))?;
        match page.get(b"Contents") {
            Ok(Object::Reference(id)) => match doc.get_object(*id) {
                Ok(Object::Array(items)) => items.clone(),
                _ => vec![Object::Reference(*id)],
            },
            Ok(Object::Array(items)) => items.clone(),
            _ => Vec::new(),
        }
    };

    let stamp = Content { operations: ops }
        .encode()
        .map_err(|e| PdfError::Write(e.to_string()))?;
    let mut tail = b"\nQ\n".to_vec();
    tail.extend_from_slice(&stamp);

    let open_id = doc.add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
    let close_id = doc.add_object(flate_stream(dictionary! {}, &tail)?);

    let mut contents = Vec::with_capacity(existing.len() + 2);
    contents.push(Object::Reference(open_id));
    contents.extend(existing);
    contents.push(Object::Reference(close_id));

    doc.get_dictionary_mut(page_id)
        .map_err(|e| PdfError::Structure(e.to_string()))?
        .set("Contents", Object::Array(contents));
    Ok(())
}
