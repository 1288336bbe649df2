//! Tunables for geometry, caching and history.

use crate::history::DEBOUNCE_WINDOW_MS;
use std::time::Duration;

/// Editor configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorConfig {
    /// Height assumed for a line until the renderer measures it.
    pub default_line_height: f64,
    /// Extra lines computed above and below the viewport.
    pub overscan: usize,
    /// Number of memoized visible ranges.
    pub cache_capacity: usize,
    /// Window in which consecutive edits merge into one undo step.
    pub debounce: Duration,
    /// Maximum number of undo levels.
    pub history_limit: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            default_line_height: 21.0,
            overscan: 5,
            cache_capacity: 100,
            debounce: Duration::from_millis(DEBOUNCE_WINDOW_MS),
            history_limit: 1000,
        }
    }
}

impl EditorConfig {
    pub fn with_default_line_height(mut self, height: f64) -> Self {
        self.default_line_height = height;
        self
    }

    pub fn with_overscan(mut self, lines: usize) -> Self {
        self.overscan = lines;
        self
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn with_debounce(mut self, window: Duration) -> Self {
        self.debounce = window;
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }
}
