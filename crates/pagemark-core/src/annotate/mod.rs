//! Annotation surface: tools, the pointer state machine and ink layers.

mod color;
mod ink;
mod store;
mod text;

pub use color::Color;
pub use ink::{InkLayer, InkMode};
pub use store::LayerStore;
pub use text::TextStamper;

use std::fmt;
use std::str::FromStr;

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::error::AnnotationError;
use crate::layout::Point;
use crate::models::config::AnnotationConfig;
use crate::models::{LayerRetention, PixelSize};

/// Active drawing tool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    None,
    #[default]
    Draw,
    Text,
    Highlight,
    Erase,
}

impl FromStr for Tool {
    type Err = AnnotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Tool::None),
            "draw" | "pen" => Ok(Tool::Draw),
            "text" => Ok(Tool::Text),
            "highlight" => Ok(Tool::Highlight),
            "erase" | "eraser" => Ok(Tool::Erase),
            other => Err(AnnotationError::Tool(other.to_string())),
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tool::None => "none",
            Tool::Draw => "draw",
            Tool::Text => "text",
            Tool::Highlight => "highlight",
            Tool::Erase => "erase",
        };
        f.write_str(name)
    }
}

/// Where the pointer interaction currently stands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToolState {
    Idle,
    /// A freehand stroke is in progress; `last` is the previous point.
    Drawing { last: Point },
    /// A highlight rectangle is being dragged out from `start`.
    HighlightDragging { start: Point },
}

/// Pointer input in rendered-page pixels, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(Point),
    Move(Point),
    Up(Point),
    Leave,
}

/// Current pen settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSettings {
    pub color: Color,
    pub stroke_width: f32,
    pub min_stroke_width: f32,
    pub max_stroke_width: f32,
    pub highlight_alpha: f32,
    pub erase_width_factor: f32,
    pub text_size_factor: f32,
    pub min_text_size: f32,
    pub text: String,
    pub default_text: String,
}

impl ToolSettings {
    pub fn from_config(config: &AnnotationConfig) -> Result<Self, AnnotationError> {
        Ok(Self {
            color: Color::from_hex(&config.stroke_color)?,
            stroke_width: config
                .stroke_width
                .clamp(config.min_stroke_width, config.max_stroke_width),
            min_stroke_width: config.min_stroke_width,
            max_stroke_width: config.max_stroke_width,
            highlight_alpha: config.highlight_alpha.clamp(0.0, 1.0),
            erase_width_factor: config.erase_width_factor,
            text_size_factor: config.text_size_factor,
            min_text_size: config.min_text_size,
            text: String::new(),
            default_text: config.default_text.clone(),
        })
    }

    /// Text stamp size in pixels.
    pub fn text_size(&self) -> f32 {
        (self.stroke_width * self.text_size_factor).max(self.min_text_size)
    }

    /// Text the text tool stamps: the entered text, or the default when blank.
    pub fn stamp_text(&self) -> &str {
        if self.text.is_empty() { &self.default_text } else { &self.text }
    }
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            color: Color::rgb(0x0e, 0xa5, 0xe9),
            stroke_width: 3.0,
            min_stroke_width: 1.0,
            max_stroke_width: 12.0,
            highlight_alpha: 0.2,
            erase_width_factor: 3.0,
            text_size_factor: 6.0,
            min_text_size: 12.0,
            text: String::new(),
            default_text: "Text".to_string(),
        }
    }
}

/// Pointer-driven drawing onto per-page ink layers.
#[derive(Debug)]
pub struct AnnotationSurface {
    tool: Tool,
    settings: ToolSettings,
    state: ToolState,
    store: LayerStore,
    active_page: Option<u32>,
    stamper: Option<TextStamper>,
}

impl AnnotationSurface {
    pub fn new(settings: ToolSettings, retention: LayerRetention) -> Self {
        Self {
            tool: Tool::default(),
            settings,
            state: ToolState::Idle,
            store: LayerStore::new(retention),
            active_page: None,
            stamper: None,
        }
    }

    /// Build from configuration, loading the text font.
    ///
    /// The configured font wins; otherwise a system sans-serif is used. With
    /// neither available the text tool stamps nothing.
    pub fn from_config(config: &AnnotationConfig, retention: LayerRetention) -> Result<Self, AnnotationError> {
        let mut surface = Self::new(ToolSettings::from_config(config)?, retention);
        let configured = match &config.font_path {
            Some(path) => match TextStamper::from_file(path) {
                Ok(stamper) => Some(stamper),
                Err(e) => {
                    warn!("Configured font unusable, trying system fonts: {}", e);
                    None
                }
            },
            None => None,
        };
        surface.stamper = configured.or_else(TextStamper::system_sans);
        if surface.stamper.is_none() {
            warn!("No font available; text tool disabled");
        }
        Ok(surface)
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Switch tools, abandoning any gesture in progress.
    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
        self.state = ToolState::Idle;
    }

    pub fn state(&self) -> ToolState {
        self.state
    }

    pub fn settings(&self) -> &ToolSettings {
        &self.settings
    }

    pub fn set_color(&mut self, color: Color) {
        self.settings.color = color;
    }

    /// Set stroke width, clamped to the configured range.
    pub fn set_stroke_width(&mut self, width: f32) {
        if width.is_finite() {
            self.settings.stroke_width =
                width.clamp(self.settings.min_stroke_width, self.settings.max_stroke_width);
        }
    }

    pub fn set_highlight_alpha(&mut self, alpha: f32) {
        if alpha.is_finite() {
            self.settings.highlight_alpha = alpha.clamp(0.0, 1.0);
        }
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.settings.text = text.into();
    }

    pub fn set_font(&mut self, stamper: TextStamper) {
        self.stamper = Some(stamper);
    }

    pub fn has_font(&self) -> bool {
        self.stamper.is_some()
    }

    pub fn retention(&self) -> LayerRetention {
        self.store.retention()
    }

    pub fn set_retention(&mut self, retention: LayerRetention) {
        self.store.set_retention(retention, self.active_page);
    }

    /// Page currently receiving pointer input.
    pub fn active_page(&self) -> Option<u32> {
        self.active_page
    }

    /// Point drawing at `page`, rendered at `size`.
    pub fn activate_page(&mut self, page: u32, size: PixelSize) -> Result<(), AnnotationError> {
        self.store.activate(page, size)?;
        if self.active_page != Some(page) {
            self.state = ToolState::Idle;
        }
        self.active_page = Some(page);
        Ok(())
    }

    /// Feed one pointer event. Returns true when ink changed.
    pub fn handle(&mut self, event: PointerEvent) -> bool {
        let Some(page) = self.active_page else {
            trace!("Pointer event with no rendered page: {:?}", event);
            return false;
        };
        let Some(layer) = self.store.layer_mut(page) else {
            return false;
        };

        let settings = &self.settings;
        let (next, changed) = match (self.state, event) {
            (ToolState::Idle, PointerEvent::Down(p)) => match self.tool {
                Tool::Draw | Tool::Erase => (ToolState::Drawing { last: p }, false),
                Tool::Highlight => (ToolState::HighlightDragging { start: p }, false),
                Tool::Text => {
                    let stamped = match &self.stamper {
                        Some(stamper) => {
                            stamper.draw(layer, settings.stamp_text(), p, settings.text_size(), settings.color);
                            true
                        }
                        None => {
                            warn!("No font loaded; text stamp skipped");
                            false
                        }
                    };
                    (ToolState::Idle, stamped)
                }
                Tool::None => (ToolState::Idle, false),
            },
            (ToolState::Drawing { last }, PointerEvent::Move(p)) => {
                let (mode, width) = if self.tool == Tool::Erase {
                    (InkMode::Erase, settings.stroke_width * settings.erase_width_factor)
                } else {
                    (InkMode::Paint, settings.stroke_width)
                };
                layer.stroke_segment(last, p, settings.color, width, mode);
                (ToolState::Drawing { last: p }, true)
            }
            (ToolState::HighlightDragging { start }, PointerEvent::Up(p)) => {
                let color = settings.color.with_alpha(settings.highlight_alpha);
                layer.fill_rect(start, p, color, InkMode::Highlight);
                (ToolState::Idle, true)
            }
            (ToolState::Drawing { .. }, PointerEvent::Up(_) | PointerEvent::Leave)
            | (ToolState::HighlightDragging { .. }, PointerEvent::Leave) => (ToolState::Idle, false),
            (state, _) => (state, false),
        };

        self.state = next;
        changed
    }

    /// Erase all ink on the active page.
    pub fn clear(&mut self) {
        if let Some(page) = self.active_page {
            self.store.clear(page);
            debug!("Cleared ink on page {}", page);
        }
    }

    /// Forget every layer, e.g. when a new document is loaded.
    pub fn reset(&mut self) {
        self.store.reset();
        self.active_page = None;
        self.state = ToolState::Idle;
    }

    pub fn layer(&self, page: u32) -> Option<&InkLayer> {
        self.store.layer(page)
    }

    pub fn active_layer(&self) -> Option<&InkLayer> {
        self.active_page.and_then(|page| self.store.layer(page))
    }

    /// Pages carrying ink, ascending.
    pub fn annotated_pages(&self) -> Vec<u32> {
        self.store.annotated_pages()
    }

    /// Draw `page`'s ink over `base` if it has any. Returns whether it did.
    pub fn composite(&self, page: u32, base: &mut RgbaImage) -> bool {
        match self.store.layer(page) {
            Some(layer) if !layer.is_blank() => {
                layer.composite_onto(base);
                true
            }
            _ => false,
        }
    }
}

impl Default for AnnotationSurface {
    fn default() -> Self {
        Self::new(ToolSettings::default(), LayerRetention::default())
    }
}
