//! Geometric reconstruction: coordinate mapping, tables, and page placement.

mod coords;
mod slides;
mod table;

pub use coords::{CoordinateMapper, Point};
pub use slides::{Orientation, SlideBox, SlideLayout, SlideLayoutEngine};
pub use table::{TableGrid, TableReconstructor, TextLine};

use crate::models::PixelSize;

/// Scale `image` to fit inside `max_width` x `max_height`, rounded to whole pixels.
///
/// Used for word-processor image pages, where the content box is fixed.
pub fn fit_within(image: PixelSize, max_width: f64, max_height: f64) -> (u32, u32) {
    let fit = (max_width / image.width).min(max_height / image.height);
    (
        (image.width * fit).round().max(1.0) as u32,
        (image.height * fit).round().max(1.0) as u32,
    )
}
