//! Configuration structures for the viewer, annotation tools and exporters.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for pagemark.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PagemarkConfig {
    /// Viewer (zoom, navigation, layer lifetime) configuration.
    pub viewer: ViewerConfig,

    /// Annotation tool defaults.
    pub annotation: AnnotationConfig,

    /// Table reconstruction tolerances.
    pub table: TableConfig,

    /// Presentation canvas configuration.
    pub slides: SlideConfig,

    /// Word-processor image export configuration.
    pub docx: DocxConfig,

    /// Rasterize-compress configuration.
    pub compress: CompressConfig,

    /// Watermark and page numbering configuration.
    pub watermark: WatermarkConfig,
}

/// How ink layers live across page navigation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerRetention {
    /// Only the page that was active while drawing keeps a layer.
    #[default]
    CurrentPage,
    /// Every page keeps its own layer.
    PerPage,
}

/// Viewer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Scale used after loading a document.
    pub default_scale: f32,

    /// Smallest accepted render scale.
    pub min_scale: f32,

    /// Largest accepted render scale.
    pub max_scale: f32,

    /// Increment used by zoom in/out.
    pub scale_step: f32,

    /// Ink layer retention policy.
    pub layer_retention: LayerRetention,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            default_scale: 1.25,
            min_scale: 0.5,
            max_scale: 2.0,
            scale_step: 0.1,
            layer_retention: LayerRetention::CurrentPage,
        }
    }
}

/// Annotation tool defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationConfig {
    /// Stroke and text colour as a hex string.
    pub stroke_color: String,

    /// Stroke width in screen pixels.
    pub stroke_width: f32,

    /// Smallest stroke width accepted.
    pub min_stroke_width: f32,

    /// Largest stroke width accepted.
    pub max_stroke_width: f32,

    /// Alpha applied to the stroke colour for highlights (0.0 - 1.0).
    pub highlight_alpha: f32,

    /// Eraser width as a multiple of the stroke width.
    pub erase_width_factor: f32,

    /// Text size as a multiple of the stroke width.
    pub text_size_factor: f32,

    /// Smallest text size in pixels.
    pub min_text_size: f32,

    /// Text stamped when the text tool has no content.
    pub default_text: String,

    /// TTF/OTF font used by the text tool.
    pub font_path: Option<PathBuf>,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            stroke_color: "#0ea5e9".to_string(),
            stroke_width: 3.0,
            min_stroke_width: 1.0,
            max_stroke_width: 12.0,
            highlight_alpha: 0.2,
            erase_width_factor: 3.0,
            text_size_factor: 6.0,
            min_text_size: 12.0,
            default_text: "Text".to_string(),
            font_path: None,
        }
    }
}

/// Table reconstruction tolerances, in page units.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Maximum vertical distance for two glyphs to share a line.
    pub y_tolerance: f32,

    /// Maximum horizontal distance for two glyphs to share a column anchor.
    pub x_tolerance: f32,

    /// Number of leading lines sampled for column anchors.
    pub sample_lines: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            y_tolerance: 4.0,
            x_tolerance: 10.0,
            sample_lines: 8,
        }
    }
}

/// Presentation canvas sizes, in inches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlideConfig {
    /// Canvas used when the first page is portrait.
    pub tall: CanvasSize,

    /// Canvas used when the first page is landscape.
    pub wide: CanvasSize,

    /// Margin applied on every side.
    pub margin: f64,
}

/// Width and height of a slide canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

impl Default for SlideConfig {
    fn default() -> Self {
        Self {
            tall: CanvasSize { width: 7.5, height: 13.33 },
            wide: CanvasSize { width: 13.33, height: 7.5 },
            margin: 0.25,
        }
    }
}

/// Word-processor image export content box, in pixels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocxConfig {
    /// Content width within page margins.
    pub max_width: f64,

    /// Content height within page margins.
    pub max_height: f64,
}

impl Default for DocxConfig {
    fn default() -> Self {
        Self {
            max_width: 620.0,
            max_height: 860.0,
        }
    }
}

/// Rasterize-compress configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressConfig {
    /// Render scale used before re-encoding.
    pub scale: f32,

    /// JPEG quality (1 - 100).
    pub jpeg_quality: u8,
}

impl Default for CompressConfig {
    fn default() -> Self {
        Self {
            scale: 0.75,
            jpeg_quality: 60,
        }
    }
}

/// Watermark and page numbering configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkConfig {
    /// Watermark text; no watermark when absent or blank.
    pub text: Option<String>,

    /// Draw a centered "i / n" footer on every page.
    pub number_pages: bool,

    /// Watermark font size in points.
    pub font_size: f32,

    /// Watermark opacity (0.0 - 1.0).
    pub opacity: f32,

    /// Watermark rotation in degrees, counter-clockwise.
    pub angle_degrees: f32,

    /// Distance between repeated marks in points.
    pub spacing: f32,

    /// Watermark colour as a hex string.
    pub color: String,

    /// Footer font size in points.
    pub footer_font_size: f32,

    /// Footer baseline distance from the bottom edge in points.
    pub footer_margin: f32,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            text: None,
            number_pages: false,
            font_size: 48.0,
            opacity: 0.15,
            angle_degrees: 45.0,
            spacing: 200.0,
            color: "#888888".to_string(),
            footer_font_size: 10.0,
            footer_margin: 20.0,
        }
    }
}

impl PagemarkConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
