//! Text stamps rasterized with fontdue.

use std::path::Path;

use fontdue::{Font, FontSettings};
use tracing::debug;

use super::color::Color;
use super::ink::InkLayer;
use crate::error::AnnotationError;
use crate::layout::Point;

/// Sans-serif fonts tried, in order, when none is configured.
const SYSTEM_SANS: &[&str] = &[
    // Linux
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/liberation2/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/usr/share/fonts/opentype/urw-base35/NimbusSans-Regular.otf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    // macOS
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Helvetica.ttc",
    // Windows
    "C:\\Windows\\Fonts\\arial.ttf",
    "C:\\Windows\\Fonts\\segoeui.ttf",
];

/// A loaded font for the text tool.
pub struct TextStamper {
    font: Font,
}

impl TextStamper {
    /// Parse a TTF/OTF font.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AnnotationError> {
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|e| AnnotationError::Font(e.to_string()))?;
        Ok(Self { font })
    }

    pub fn from_file(path: &Path) -> Result<Self, AnnotationError> {
        let bytes = std::fs::read(path)
            .map_err(|e| AnnotationError::Font(format!("{}: {}", path.display(), e)))?;
        debug!("Loaded text font from {}", path.display());
        Self::from_bytes(&bytes)
    }

    /// First candidate that reads and parses as a font.
    pub fn first_available<P: AsRef<Path>>(candidates: &[P]) -> Option<Self> {
        candidates.iter().find_map(|path| {
            let path = path.as_ref();
            if !path.is_file() {
                return None;
            }
            match Self::from_file(path) {
                Ok(stamper) => Some(stamper),
                Err(e) => {
                    debug!("Skipping font candidate: {}", e);
                    None
                }
            }
        })
    }

    /// A sans-serif font from the usual system locations.
    pub fn system_sans() -> Option<Self> {
        let stamper = Self::first_available(SYSTEM_SANS);
        if stamper.is_none() {
            debug!("No system sans-serif font found");
        }
        stamper
    }

    /// Draw `text` with its baseline starting at `origin`.
    pub fn draw(&self, layer: &mut InkLayer, text: &str, origin: Point, size: f32, color: Color) {
        let baseline = origin.y as f32;
        let mut pen_x = origin.x as f32;

        for ch in text.chars() {
            let (metrics, coverage) = self.font.rasterize(ch, size);
            if metrics.width > 0 && metrics.height > 0 {
                let x = (pen_x + metrics.xmin as f32).round() as i32;
                let y = (baseline - (metrics.height as i32 + metrics.ymin) as f32).round() as i32;
                layer.draw_coverage(
                    x,
                    y,
                    metrics.width as u32,
                    metrics.height as u32,
                    &coverage,
                    color,
                );
            }
            pen_x += metrics.advance_width;
        }
    }
}

impl std::fmt::Debug for TextStamper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextStamper")
            .field("glyphs", &self.font.glyph_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_font_bytes_rejected() {
        let err = TextStamper::from_bytes(b"definitely not a font").unwrap_err();
        assert!(matches!(err, AnnotationError::Font(_)));
    }

    #[test]
    fn test_missing_font_file_rejected() {
        let err = TextStamper::from_file(Path::new("/nonexistent/font.ttf")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/font.ttf"));
    }

    #[test]
    fn test_first_available_skips_missing_and_unparsable() {
        let manifest = Path::new(env!("CARGO_MANIFEST_DIR")).join("Cargo.toml");
        let candidates = [Path::new("/nonexistent/a.ttf"), manifest.as_path()];
        assert!(TextStamper::first_available(&candidates).is_none());
    }
}
