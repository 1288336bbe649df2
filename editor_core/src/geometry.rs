//! Pixel geometry: hit testing and caret/selection rectangles.
//!
//! Horizontal positions come from the host's text measurement function,
//! vertical positions from the line height index.

use crate::line_height::LineHeightIndex;
use crate::line_index::LineIndex;
use crate::viewport::Point;
use std::ops::Range;

/// Measures the advance width of a run of text.
pub trait TextMeasure {
    fn measure(&self, text: &str) -> f64;
}

impl<F> TextMeasure for F
where
    F: Fn(&str) -> f64,
{
    fn measure(&self, text: &str) -> f64 {
        self(text)
    }
}

/// Fixed advance per character, with East Asian wide characters counted
/// twice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceMeasure {
    pub char_width: f64,
}

impl MonospaceMeasure {
    pub fn new(char_width: f64) -> Self {
        Self { char_width }
    }
}

impl TextMeasure for MonospaceMeasure {
    fn measure(&self, text: &str) -> f64 {
        text.chars()
            .map(|ch| if is_wide(ch) { 2.0 } else { 1.0 })
            .sum::<f64>()
            * self.char_width
    }
}

fn is_wide(ch: char) -> bool {
    matches!(ch as u32,
        0x1100..=0x115F
        | 0x2E80..=0x303E
        | 0x3041..=0x33FF
        | 0x3400..=0x4DBF
        | 0x4E00..=0x9FFF
        | 0xA000..=0xA4CF
        | 0xAC00..=0xD7A3
        | 0xF900..=0xFAFF
        | 0xFE30..=0xFE4F
        | 0xFF00..=0xFF60
        | 0xFFE0..=0xFFE6)
}

/// An axis-aligned rectangle in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Returns the column in `line` nearest to horizontal position `x`.
pub fn column_at_x(measure: &dyn TextMeasure, line: &str, x: f64) -> usize {
    if x <= 0.0 {
        return 0;
    }
    let bounds: Vec<usize> = line
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(line.len()))
        .collect();
    let width = |col: usize| measure.measure(&line[..bounds[col]]);

    // Prefix widths never shrink, so the first column whose midpoint with
    // the next one lies past `x` can be bisected.
    let (mut lo, mut hi) = (0, bounds.len() - 1);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if x < (width(mid) + width(mid + 1)) / 2.0 {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    lo
}

/// Returns the document offset under a document-space point.
pub fn offset_at_point(
    index: &LineIndex,
    heights: &LineHeightIndex,
    measure: &dyn TextMeasure,
    point: Point,
) -> usize {
    let last_line = index.line_count().saturating_sub(1);
    let line = heights.find_line_by_offset(point.y).min(last_line);
    let text = index.line_text(line).unwrap_or_default();
    let col = column_at_x(measure, &text, point.x);
    index.offset_at_line_column(line, col)
}

fn x_at_column(index: &LineIndex, measure: &dyn TextMeasure, line: usize, col: usize) -> f64 {
    if col == 0 {
        return 0.0;
    }
    let start = index.line_start(line);
    measure.measure(&index.slice(start, start + col))
}

/// Returns the caret rectangle at `offset` (zero width).
pub fn cursor_rect(
    index: &LineIndex,
    heights: &LineHeightIndex,
    measure: &dyn TextMeasure,
    offset: usize,
) -> Rect {
    let (line, col) = index.line_col_at_offset(offset);
    Rect {
        x: x_at_column(index, measure, line, col),
        y: heights.prefix_sum(line),
        width: 0.0,
        height: heights.get(line),
    }
}

/// Returns one rectangle per line of the selection `[start, end)`, limited to
/// the lines in `clip`.
pub fn selection_rects(
    index: &LineIndex,
    heights: &LineHeightIndex,
    measure: &dyn TextMeasure,
    start: usize,
    end: usize,
    clip: Range<usize>,
) -> Vec<Rect> {
    let (start, end) = (start.min(end), start.max(end));
    if start == end {
        return Vec::new();
    }
    let (start_line, start_col) = index.line_col_at_offset(start);
    let (end_line, end_col) = index.line_col_at_offset(end);
    let first = start_line.max(clip.start);
    let last = end_line.min(clip.end.saturating_sub(1));
    if first > last || clip.is_empty() {
        return Vec::new();
    }

    let mut rects = Vec::with_capacity(last - first + 1);
    let mut y = heights.prefix_sum(first);
    for line in first..=last {
        let left = if line == start_line {
            x_at_column(index, measure, line, start_col)
        } else {
            0.0
        };
        let right = if line == end_line {
            x_at_column(index, measure, line, end_col)
        } else {
            x_at_column(index, measure, line, index.line_len_chars(line))
        };
        let height = heights.get(line);
        rects.push(Rect {
            x: left,
            y,
            width: (right - left).max(0.0),
            height,
        });
        y += height;
    }
    rects
}
