//! Cumulative line heights backed by a Fenwick (binary indexed) tree.
//!
//! Every visible-range computation asks "which line is at pixel Y?" and
//! "where does line N start?". Both are answered in logarithmic time from the
//! tree, while individual lines can be re-measured at any point.

/// Height deltas below this many pixels are treated as measurement noise.
pub const HEIGHT_EPSILON: f64 = 0.5;

/// Per-line pixel heights with O(log n) point update and prefix sum.
#[derive(Debug, Clone, Default)]
pub struct LineHeightIndex {
    /// Stored height of each line.
    heights: Vec<f64>,
    /// Fenwick array, 1-based (`tree[0]` is unused).
    tree: Vec<f64>,
    /// Bumped on every effective mutation.
    version: u64,
}

impl LineHeightIndex {
    /// Creates an index of `len` lines, all `default_height` tall.
    pub fn new(len: usize, default_height: f64) -> Self {
        Self::from_heights(std::iter::repeat(default_height).take(len))
    }

    /// Creates an index from explicit heights.
    pub fn from_heights<I: IntoIterator<Item = f64>>(heights: I) -> Self {
        let mut index = Self {
            heights: heights.into_iter().collect(),
            tree: Vec::new(),
            version: 0,
        };
        index.rebuild();
        index
    }

    /// Returns the number of lines.
    pub fn len(&self) -> usize {
        self.heights.len()
    }

    /// Returns true if there are no lines.
    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }

    /// Returns the mutation counter.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns the height of line `i`, or 0 when out of range.
    pub fn get(&self, i: usize) -> f64 {
        self.heights.get(i).copied().unwrap_or(0.0)
    }

    /// Sets the height of line `i`.
    ///
    /// Returns false (and changes nothing) when `i` is out of range or the
    /// change is smaller than [`HEIGHT_EPSILON`].
    pub fn update(&mut self, i: usize, height: f64) -> bool {
        let Some(current) = self.heights.get(i).copied() else {
            return false;
        };
        let delta = height - current;
        if delta.abs() < HEIGHT_EPSILON {
            return false;
        }

        self.heights[i] = height;
        let size = self.heights.len();
        let mut idx = i + 1;
        while idx <= size {
            self.tree[idx] += delta;
            idx += lowbit(idx);
        }
        self.version += 1;
        true
    }

    /// Returns the cumulative height of lines `[0, i)`.
    pub fn prefix_sum(&self, i: usize) -> f64 {
        let mut idx = i.min(self.heights.len());
        let mut sum = 0.0;
        while idx > 0 {
            sum += self.tree[idx];
            idx -= lowbit(idx);
        }
        sum
    }

    /// Returns the cumulative height of lines `[a, b)`.
    pub fn range_sum(&self, a: usize, b: usize) -> f64 {
        self.prefix_sum(b) - self.prefix_sum(a)
    }

    /// Returns the height of the whole document.
    pub fn total_height(&self) -> f64 {
        self.prefix_sum(self.heights.len())
    }

    /// Returns the line containing document offset `y`.
    ///
    /// Offsets at or above the total height map to `len()`. An offset exactly
    /// on a boundary belongs to the line starting there. Each probe of the
    /// binary search is a full prefix sum, so this is O(log² n).
    pub fn find_line_by_offset(&self, y: f64) -> usize {
        if y <= 0.0 {
            return 0;
        }
        if y >= self.total_height() {
            return self.heights.len();
        }

        let mut lo = 0;
        let mut hi = self.heights.len();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.prefix_sum(mid + 1) <= y {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }

    /// Truncates or extends to `new_size` lines and rebuilds the tree.
    pub fn resize(&mut self, new_size: usize, default_height: f64) {
        self.heights.resize(new_size, default_height);
        self.rebuild();
        self.version += 1;
    }

    /// Replaces `removed` lines at `at` with `inserted` lines of
    /// `default_height`, keeping the heights of the surrounding lines.
    pub fn splice(&mut self, at: usize, removed: usize, inserted: usize, default_height: f64) {
        let at = at.min(self.heights.len());
        let end = (at + removed).min(self.heights.len());
        self.heights
            .splice(at..end, std::iter::repeat(default_height).take(inserted));
        self.rebuild();
        self.version += 1;
    }

    /// Returns the stored heights.
    pub fn heights(&self) -> &[f64] {
        &self.heights
    }

    /// Linear-time Fenwick construction.
    fn rebuild(&mut self) {
        let size = self.heights.len();
        self.tree.clear();
        self.tree.resize(size + 1, 0.0);
        for i in 1..=size {
            self.tree[i] += self.heights[i - 1];
            let parent = i + lowbit(i);
            if parent <= size {
                let value = self.tree[i];
                self.tree[parent] += value;
            }
        }
    }
}

/// Lowest set bit (`i & -i`).
#[inline]
fn lowbit(i: usize) -> usize {
    i & i.wrapping_neg()
}
