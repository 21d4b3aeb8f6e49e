//! Data models shared across the pipeline.

pub mod config;
pub mod page;

pub use config::{LayerRetention, PagemarkConfig};
pub use page::{NativePageSize, PageView, PixelSize, TextGlyph};
