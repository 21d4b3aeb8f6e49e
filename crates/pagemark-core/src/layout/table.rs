//! Table reconstruction from positioned text.
//!
//! Turns a page's glyphs back into a grid of cell strings:
//! 1. glyphs are flipped to a top-left origin and sorted by `(y, x)`,
//! 2. a greedy single pass clusters them into lines by `y_tolerance`,
//! 3. column anchors are inferred from the first few lines only,
//! 4. every glyph is assigned to its nearest anchor.
//!
//! Both clustering steps are greedy, so the result depends on scan order.
//! Small tolerances keep this safe for ordinary line spacing. The output is a
//! layout approximation: glyphs sharing an anchor are concatenated into one
//! cell.

use std::cmp::Ordering;

use tracing::{debug, trace};

use crate::models::config::TableConfig;
use crate::models::TextGlyph;

/// Glyphs judged to share a baseline, in top-origin space.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    /// Representative `y` (the first glyph that opened the line).
    pub y: f32,
    /// Glyphs ordered left to right.
    pub glyphs: Vec<TextGlyph>,
}

impl TextLine {
    /// Glyph texts joined with single spaces.
    pub fn text(&self) -> String {
        self.glyphs
            .iter()
            .map(|g| g.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Reconstructed table: rows of equal width.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableGrid {
    /// Left edges of the inferred columns, ascending.
    pub anchors: Vec<f32>,
    /// Cell strings; every row has `num_cols()` entries.
    pub rows: Vec<Vec<String>>,
}

impl TableGrid {
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_cols(&self) -> usize {
        self.rows.first().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows for sinks that need at least one row (a single empty cell).
    pub fn rows_or_placeholder(&self) -> Vec<Vec<String>> {
        if self.rows.is_empty() {
            vec![vec![String::new()]]
        } else {
            self.rows.clone()
        }
    }
}

/// Rebuilds tables from glyph positions.
#[derive(Debug, Clone)]
pub struct TableReconstructor {
    y_tolerance: f32,
    x_tolerance: f32,
    sample_lines: usize,
}

impl TableReconstructor {
    /// Create a reconstructor with the default tolerances (y 4, x 10, 8 sample lines).
    pub fn new() -> Self {
        Self::from_config(&TableConfig::default())
    }

    pub fn from_config(config: &TableConfig) -> Self {
        Self {
            y_tolerance: config.y_tolerance,
            x_tolerance: config.x_tolerance,
            sample_lines: config.sample_lines,
        }
    }

    /// Set the line grouping tolerance.
    pub fn with_y_tolerance(mut self, tolerance: f32) -> Self {
        self.y_tolerance = tolerance;
        self
    }

    /// Set the column merge tolerance.
    pub fn with_x_tolerance(mut self, tolerance: f32) -> Self {
        self.x_tolerance = tolerance;
        self
    }

    /// Set how many leading lines are sampled for anchors.
    pub fn with_sample_lines(mut self, lines: usize) -> Self {
        self.sample_lines = lines;
        self
    }

    /// Reconstruct a grid from one page's glyphs.
    ///
    /// `page_height` flips the bottom-origin glyph `y` to top-origin.
    /// Zero glyphs yield an empty grid.
    pub fn reconstruct(&self, glyphs: &[TextGlyph], page_height: f32) -> TableGrid {
        let kept: Vec<TextGlyph> = glyphs
            .iter()
            .filter(|g| !g.text.trim().is_empty())
            .cloned()
            .collect();

        if kept.is_empty() {
            return TableGrid::default();
        }

        let flipped: Vec<TextGlyph> = kept
            .iter()
            .map(|g| TextGlyph {
                y: page_height - g.y,
                ..g.clone()
            })
            .collect();

        let lines = self.group_lines(flipped);
        let anchors = self.infer_anchors(&lines);

        if anchors.is_empty() {
            let joined = kept.iter().map(|g| g.text.as_str()).collect::<Vec<_>>().join(" ");
            return TableGrid {
                anchors,
                rows: vec![vec![joined]],
            };
        }

        let rows = lines
            .iter()
            .map(|line| assign_cells(line, &anchors))
            .collect::<Vec<_>>();

        debug!(
            "Reconstructed table: {} rows x {} columns from {} glyphs",
            rows.len(),
            anchors.len(),
            kept.len()
        );

        TableGrid { anchors, rows }
    }

    /// Greedy single-pass line clustering over glyphs in top-origin space.
    pub fn group_lines(&self, mut glyphs: Vec<TextGlyph>) -> Vec<TextLine> {
        glyphs.sort_by(|a, b| {
            a.y.partial_cmp(&b.y)
                .unwrap_or(Ordering::Equal)
                .then(a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal))
        });

        let mut lines: Vec<TextLine> = Vec::new();
        for glyph in glyphs {
            match lines
                .iter_mut()
                .find(|line| (line.y - glyph.y).abs() <= self.y_tolerance)
            {
                Some(line) => line.glyphs.push(glyph),
                None => lines.push(TextLine {
                    y: glyph.y,
                    glyphs: vec![glyph],
                }),
            }
        }

        for line in &mut lines {
            line.glyphs
                .sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal));
        }

        trace!("Grouped glyphs into {} lines", lines.len());
        lines
    }

    /// Column anchors from the leading sample lines, sorted and deduplicated.
    pub fn infer_anchors(&self, lines: &[TextLine]) -> Vec<f32> {
        let sample = self.sample_lines.min(lines.len());

        let mut anchors: Vec<f32> = Vec::new();
        for glyph in lines[..sample].iter().flat_map(|line| &line.glyphs) {
            if !anchors
                .iter()
                .any(|a| (a - glyph.x).abs() <= self.x_tolerance)
            {
                anchors.push(glyph.x);
            }
        }

        anchors.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

        let mut merged: Vec<f32> = Vec::with_capacity(anchors.len());
        for anchor in anchors {
            match merged.last() {
                Some(prev) if anchor - prev <= self.x_tolerance => {}
                _ => merged.push(anchor),
            }
        }

        merged
    }
}

impl Default for TableReconstructor {
    fn default() -> Self {
        Self::new()
    }
}

/// Index of the nearest anchor; ties go to the leftmost.
fn nearest_anchor(anchors: &[f32], x: f32) -> usize {
    let mut best = 0;
    let mut best_dist = f32::INFINITY;
    for (idx, anchor) in anchors.iter().enumerate() {
        let dist = (anchor - x).abs();
        if dist < best_dist {
            best = idx;
            best_dist = dist;
        }
    }
    best
}

fn assign_cells(line: &TextLine, anchors: &[f32]) -> Vec<String> {
    let mut cells = vec![String::new(); anchors.len()];
    for glyph in &line.glyphs {
        let cell = &mut cells[nearest_anchor(anchors, glyph.x)];
        if !cell.is_empty() {
            cell.push(' ');
        }
        cell.push_str(&glyph.text);
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAGE_HEIGHT: f32 = 792.0;

    /// Glyph placed by top-origin `y` for readability.
    fn g(text: &str, x: f32, top_y: f32) -> TextGlyph {
        TextGlyph::new(text, x, PAGE_HEIGHT - top_y, 20.0)
    }

    fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_simple_three_column_table() {
        let glyphs = vec![
            g("Name", 50.0, 100.0),
            g("Qty", 200.0, 100.0),
            g("Price", 300.0, 100.0),
            g("Apple", 50.0, 120.0),
            g("3", 202.0, 121.0),
            g("1.20", 298.0, 119.0),
            g("Pear", 51.0, 140.0),
            g("10", 200.0, 140.0),
            g("0.80", 300.0, 140.0),
        ];

        let result = TableReconstructor::new().reconstruct(&glyphs, PAGE_HEIGHT);

        assert_eq!(result.anchors, vec![50.0, 200.0, 300.0]);
        assert_eq!(
            result.rows,
            grid(&[
                &["Name", "Qty", "Price"],
                &["Apple", "3", "1.20"],
                &["Pear", "10", "0.80"],
            ])
        );
    }

    #[test]
    fn test_input_order_does_not_matter_for_rows() {
        let glyphs = vec![
            g("b2", 200.0, 50.0),
            g("a1", 50.0, 30.0),
            g("a2", 50.0, 50.0),
            g("b1", 200.0, 30.0),
        ];

        let result = TableReconstructor::new().reconstruct(&glyphs, PAGE_HEIGHT);
        assert_eq!(result.rows, grid(&[&["a1", "b1"], &["a2", "b2"]]));
    }

    #[test]
    fn test_empty_and_blank_glyphs_yield_empty_grid() {
        let reconstructor = TableReconstructor::new();
        assert!(reconstructor.reconstruct(&[], PAGE_HEIGHT).is_empty());

        let blanks = vec![g("  ", 10.0, 10.0), g("", 40.0, 10.0)];
        let result = reconstructor.reconstruct(&blanks, PAGE_HEIGHT);
        assert!(result.is_empty());
        assert_eq!(result.rows_or_placeholder(), vec![vec![String::new()]]);
    }

    #[test]
    fn test_same_x_collapses_to_single_column() {
        let glyphs = vec![
            g("first line", 72.0, 100.0),
            g("second line", 72.0, 120.0),
            g("third", 75.0, 140.0),
            g("line", 72.0, 141.0),
        ];

        let result = TableReconstructor::new().reconstruct(&glyphs, PAGE_HEIGHT);

        assert_eq!(result.num_cols(), 1);
        assert_eq!(
            result.rows,
            grid(&[&["first line"], &["second line"], &["line third"]])
        );
    }

    #[test]
    fn test_anchors_only_from_sample_lines() {
        let mut glyphs = Vec::new();
        for row in 0..3 {
            let y = 100.0 + row as f32 * 20.0;
            glyphs.push(g("left", 50.0, y));
            glyphs.push(g("right", 250.0, y));
        }
        // A ragged body line with an extra column past the sample.
        glyphs.push(g("body", 50.0, 200.0));
        glyphs.push(g("stray", 150.0, 200.0));

        let result = TableReconstructor::new()
            .with_sample_lines(3)
            .reconstruct(&glyphs, PAGE_HEIGHT);

        assert_eq!(result.anchors, vec![50.0, 250.0]);
        // 150 is equidistant from both anchors: leftmost wins.
        assert_eq!(result.rows[3], vec!["body stray".to_string(), String::new()]);
    }

    #[test]
    fn test_anchor_dedup_merges_within_tolerance() {
        let reconstructor = TableReconstructor::new().with_x_tolerance(10.0);
        // 100 registers; 115 registers (15 away); 108 is within 10 of 100 so skipped;
        // after sorting, 115 stays (15 > 10 from 100).
        let lines = vec![
            TextLine {
                y: 0.0,
                glyphs: vec![TextGlyph::new("a", 100.0, 0.0, 1.0), TextGlyph::new("b", 115.0, 0.0, 1.0)],
            },
            TextLine {
                y: 20.0,
                glyphs: vec![TextGlyph::new("c", 108.0, 20.0, 1.0), TextGlyph::new("d", 300.0, 20.0, 1.0)],
            },
        ];
        let anchors = reconstructor.infer_anchors(&lines);
        assert_eq!(anchors, vec![100.0, 115.0, 300.0]);

        for pair in anchors.windows(2) {
            assert!(pair[1] - pair[0] > 10.0);
        }
    }

    #[test]
    fn test_line_grouping_within_tolerance() {
        let reconstructor = TableReconstructor::new().with_y_tolerance(4.0);
        let lines = reconstructor.group_lines(vec![
            TextGlyph::new("b", 30.0, 103.5, 1.0),
            TextGlyph::new("a", 10.0, 100.0, 1.0),
            TextGlyph::new("c", 10.0, 104.5, 1.0),
        ]);

        // 103.5 joins the line opened at 100; 104.5 is 4.5 away and opens a new one.
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text(), "a b");
        assert_eq!(lines[1].text(), "c");
    }

    #[test]
    fn test_reconstruction_is_deterministic() {
        let glyphs = vec![
            g("x", 10.0, 10.0),
            g("y", 60.0, 12.0),
            g("z", 35.0, 30.0),
            g("w", 90.0, 31.0),
        ];
        let reconstructor = TableReconstructor::new();
        let first = reconstructor.reconstruct(&glyphs, PAGE_HEIGHT);
        for _ in 0..5 {
            assert_eq!(reconstructor.reconstruct(&glyphs, PAGE_HEIGHT), first);
        }
    }
}
