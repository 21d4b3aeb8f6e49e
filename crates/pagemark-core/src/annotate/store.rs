//! Ownership of ink layers across page navigation.

use std::collections::BTreeMap;

use tracing::debug;

use super::ink::InkLayer;
use crate::error::AnnotationError;
use crate::models::{LayerRetention, PixelSize};

/// Ink layers keyed by page number.
#[derive(Debug, Clone, Default)]
pub struct LayerStore {
    retention: LayerRetention,
    layers: BTreeMap<u32, InkLayer>,
}

impl LayerStore {
    pub fn new(retention: LayerRetention) -> Self {
        Self {
            retention,
            layers: BTreeMap::new(),
        }
    }

    pub fn retention(&self) -> LayerRetention {
        self.retention
    }

    /// Change policy; switching to current-page keeps only `active`.
    pub fn set_retention(&mut self, retention: LayerRetention, active: Option<u32>) {
        self.retention = retention;
        if retention == LayerRetention::CurrentPage {
            self.layers.retain(|page, _| Some(*page) == active);
        }
    }

    /// Make `page` the drawing target at `size`.
    ///
    /// Creates a blank layer, or resamples an existing one rendered at a
    /// different size. Under current-page retention every other layer is
    /// dropped.
    pub fn activate(&mut self, page: u32, size: PixelSize) -> Result<&mut InkLayer, AnnotationError> {
        if self.retention == LayerRetention::CurrentPage {
            let before = self.layers.len();
            self.layers.retain(|p, _| *p == page);
            if self.layers.len() != before {
                debug!("Dropped ink of other pages on switching to page {}", page);
            }
        }

        let width = size.width.round().max(0.0) as u32;
        let height = size.height.round().max(0.0) as u32;

        let layer = match self.layers.remove(&page) {
            Some(existing) if existing.width() == width && existing.height() == height => existing,
            Some(existing) => {
                debug!(
                    "Resampling page {} ink from {}x{} to {}x{}",
                    page,
                    existing.width(),
                    existing.height(),
                    width,
                    height
                );
                existing.resampled(width, height)?
            }
            None => InkLayer::new(width, height)?,
        };

        Ok(self.layers.entry(page).or_insert(layer))
    }

    pub fn layer(&self, page: u32) -> Option<&InkLayer> {
        self.layers.get(&page)
    }

    pub fn layer_mut(&mut self, page: u32) -> Option<&mut InkLayer> {
        self.layers.get_mut(&page)
    }

    /// Clear one page's ink, keeping its layer.
    pub fn clear(&mut self, page: u32) {
        if let Some(layer) = self.layers.get_mut(&page) {
            layer.clear();
        }
    }

    /// Drop every layer.
    pub fn reset(&mut self) {
        self.layers.clear();
    }

    /// Pages carrying any ink, ascending.
    pub fn annotated_pages(&self) -> Vec<u32> {
        self.layers
            .iter()
            .filter(|(_, layer)| !layer.is_blank())
            .map(|(page, _)| *page)
            .collect()
    }
}
