//! Viewport culling over variable-height lines.
//!
//! The scroller owns the line height index and a per-line width array. Given
//! a viewport it answers which lines must be painted and where, memoizing the
//! answer until either structure changes or the viewport moves.

use crate::line_height::LineHeightIndex;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

/// A point in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// The scroll offset and dimensions of the visible area.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    /// Document coordinate shown at the viewport's top-left corner.
    pub offset: Point,
    pub size: Size,
}

impl Viewport {
    pub fn new(offset: Point, size: Size) -> Self {
        Self { offset, size }
    }

    fn top(&self) -> f64 {
        self.offset.y
    }

    fn bottom(&self) -> f64 {
        self.offset.y + self.size.height
    }
}

/// How a line is clipped by the viewport edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Entirely inside the viewport.
    Full,
    /// Cut by the top edge (or entirely above it).
    PartialTop,
    /// Cut by the bottom edge (or entirely below it).
    PartialBottom,
    /// Taller than the viewport and cut by both edges.
    PartialBoth,
}

impl Visibility {
    fn classify(top: f64, bottom: f64, viewport: &Viewport) -> Self {
        let clipped_top = top < viewport.top();
        let clipped_bottom = bottom > viewport.bottom();
        match (clipped_top, clipped_bottom) {
            (true, true) => Visibility::PartialBoth,
            (true, false) => Visibility::PartialTop,
            (false, true) => Visibility::PartialBottom,
            (false, false) => Visibility::Full,
        }
    }
}

/// One line the renderer should paint.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleLineItem {
    pub index: usize,
    pub document_x: f64,
    pub document_y: f64,
    pub viewport_x: f64,
    pub viewport_y: f64,
    pub width: f64,
    pub height: f64,
    pub visibility: Visibility,
}

/// The window of lines to paint for one viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleLineRange {
    /// First line (inclusive).
    pub start_index: usize,
    /// Last line (exclusive).
    pub end_index: usize,
    pub items: Vec<VisibleLineItem>,
    pub document_height: f64,
    pub document_width: f64,
}

impl VisibleLineRange {
    /// Returns true if no line is in the window.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns true if `line` is inside the window.
    pub fn contains(&self, line: usize) -> bool {
        line >= self.start_index && line < self.end_index
    }
}

/// Alignment used when scrolling a line into view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollAlign {
    #[default]
    Start,
    Center,
    End,
}

/// Cache key: structure versions plus the viewport rounded to whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    height_version: u64,
    width_version: u64,
    x: i64,
    y: i64,
    width: i64,
    height: i64,
}

/// Bounded memo of computed ranges; the oldest insertion is evicted first.
#[derive(Debug)]
struct RangeCache {
    entries: HashMap<CacheKey, Rc<VisibleLineRange>>,
    order: VecDeque<CacheKey>,
    capacity: usize,
}

impl RangeCache {
    fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    fn get(&self, key: &CacheKey) -> Option<Rc<VisibleLineRange>> {
        self.entries.get(key).cloned()
    }

    fn insert(&mut self, key: CacheKey, range: Rc<VisibleLineRange>) {
        if self.entries.insert(key, range).is_some() {
            return;
        }
        self.order.push_back(key);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Visible-window computation over one document's line geometry.
#[derive(Debug)]
pub struct ViewportScroller {
    heights: LineHeightIndex,
    widths: Vec<f64>,
    width_version: u64,
    default_height: f64,
    overscan: usize,
    cache: RangeCache,
}

impl ViewportScroller {
    /// Creates a scroller for `line_count` lines of `default_height`.
    pub fn new(line_count: usize, default_height: f64, overscan: usize, cache_capacity: usize) -> Self {
        Self {
            heights: LineHeightIndex::new(line_count, default_height),
            widths: vec![0.0; line_count],
            width_version: 0,
            default_height,
            overscan,
            cache: RangeCache::new(cache_capacity),
        }
    }

    /// Returns the number of lines.
    pub fn line_count(&self) -> usize {
        self.heights.len()
    }

    /// Returns the underlying height index.
    pub fn heights(&self) -> &LineHeightIndex {
        &self.heights
    }

    /// Returns the stored width of a line, or 0 when out of range.
    pub fn line_width(&self, line: usize) -> f64 {
        self.widths.get(line).copied().unwrap_or(0.0)
    }

    /// Returns the total document height.
    pub fn document_height(&self) -> f64 {
        self.heights.total_height()
    }

    /// Returns the widest stored line width.
    pub fn document_width(&self) -> f64 {
        self.widths.iter().copied().fold(0.0, f64::max)
    }

    /// Returns the largest valid vertical scroll offset.
    pub fn max_scroll_y(&self, viewport_height: f64) -> f64 {
        (self.document_height() - viewport_height).max(0.0)
    }

    /// Returns the lines to paint for `viewport`.
    ///
    /// Identical viewports with no intervening mutation return the same `Rc`.
    pub fn get_visible_lines(&mut self, viewport: &Viewport) -> Rc<VisibleLineRange> {
        let key = CacheKey {
            height_version: self.heights.version(),
            width_version: self.width_version,
            x: viewport.offset.x.round() as i64,
            y: viewport.offset.y.round() as i64,
            width: viewport.size.width.round() as i64,
            height: viewport.size.height.round() as i64,
        };
        if let Some(hit) = self.cache.get(&key) {
            return hit;
        }

        log::trace!(
            "visible range miss at y={} h={} ({} cached)",
            key.y,
            key.height,
            self.cache.len()
        );
        let range = Rc::new(self.compute_visible_lines(viewport));
        self.cache.insert(key, Rc::clone(&range));
        range
    }

    fn compute_visible_lines(&self, viewport: &Viewport) -> VisibleLineRange {
        let line_count = self.heights.len();
        let first = self.heights.find_line_by_offset(viewport.top());
        let last = self.heights.find_line_by_offset(viewport.bottom());
        let start_index = first.saturating_sub(self.overscan);
        let end_index = (last + 1 + self.overscan).min(line_count);

        let mut items = Vec::with_capacity(end_index.saturating_sub(start_index));
        let mut document_y = self.heights.prefix_sum(start_index);
        for index in start_index..end_index {
            let height = self.heights.get(index);
            let document_x = 0.0;
            items.push(VisibleLineItem {
                index,
                document_x,
                document_y,
                viewport_x: document_x - viewport.offset.x,
                viewport_y: document_y - viewport.offset.y,
                width: self.line_width(index),
                height,
                visibility: Visibility::classify(document_y, document_y + height, viewport),
            });
            document_y += height;
        }

        VisibleLineRange {
            start_index: start_index.min(end_index),
            end_index,
            items,
            document_height: self.document_height(),
            document_width: self.document_width(),
        }
    }

    /// Records a measured line height. Returns true if it changed.
    pub fn update_line_height(&mut self, line: usize, height: f64) -> bool {
        self.heights.update(line, height)
    }

    /// Records a measured line width. Returns true if it changed.
    pub fn update_line_width(&mut self, line: usize, width: f64) -> bool {
        match self.widths.get_mut(line) {
            Some(current) if *current != width => {
                *current = width;
                self.width_version += 1;
                true
            }
            _ => false,
        }
    }

    /// Converts a viewport point to document coordinates.
    pub fn viewport_to_document(&self, point: Point, viewport: &Viewport) -> Point {
        Point::new(point.x + viewport.offset.x, point.y + viewport.offset.y)
    }

    /// Converts a document point to viewport coordinates.
    pub fn document_to_viewport(&self, point: Point, viewport: &Viewport) -> Point {
        Point::new(point.x - viewport.offset.x, point.y - viewport.offset.y)
    }

    /// Returns the scroll offset that aligns `line` with the viewport.
    pub fn get_scroll_target_y(&self, line: usize, align: ScrollAlign, viewport_height: f64) -> f64 {
        let line_count = self.heights.len();
        if line_count == 0 {
            return 0.0;
        }
        let line = line.min(line_count - 1);
        let top = self.heights.prefix_sum(line);
        let height = self.heights.get(line);
        let target = match align {
            ScrollAlign::Start => top,
            ScrollAlign::Center => top + height / 2.0 - viewport_height / 2.0,
            ScrollAlign::End => top + height - viewport_height,
        };
        target.clamp(0.0, self.max_scroll_y(viewport_height))
    }

    /// Grows or shrinks to `new_line_count` lines.
    pub fn resize(&mut self, new_line_count: usize) {
        log::debug!(
            "resizing scroller from {} to {} lines",
            self.heights.len(),
            new_line_count
        );
        self.heights.resize(new_line_count, self.default_height);
        self.widths.resize(new_line_count, 0.0);
        self.width_version += 1;
    }

    /// Replaces `removed` lines at `at` with `inserted` fresh lines.
    pub fn splice_lines(&mut self, at: usize, removed: usize, inserted: usize) {
        if removed == 0 && inserted == 0 {
            return;
        }
        self.heights.splice(at, removed, inserted, self.default_height);
        let at = at.min(self.widths.len());
        let end = (at + removed).min(self.widths.len());
        self.widths
            .splice(at..end, std::iter::repeat(0.0).take(inserted));
        self.width_version += 1;
    }

    /// Drops every memoized range.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}
