//! IME (Input Method Editor) composition state.
//!
//! While composing, the pre-edit text lives only here; the document is not
//! touched until the composition ends.

use crate::cursor::{HighlightKind, HighlightRange};
use crate::line_index::LineIndex;

/// The pre-edit buffer of an active composition.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Composition {
    /// Whether IME composition is currently active.
    pub is_composing: bool,
    /// The current composition text (pre-edit text).
    pub text: String,
    /// Document offset where the composed text will be inserted.
    pub anchor_offset: usize,
    /// Caret position within the composition text, in characters.
    pub cursor: usize,
    /// End of the selection the composed text replaces.
    replace_end: usize,
    /// Caret offset captured just before composition began.
    cursor_before: usize,
}

/// A finished composition ready to be applied to the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedComposition {
    pub text: String,
    /// Replaced range start.
    pub start: usize,
    /// Replaced range end.
    pub end: usize,
    pub cursor_before: usize,
}

impl Composition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new composition replacing `[anchor, replace_end)`.
    pub fn start(&mut self, anchor: usize, replace_end: usize, cursor_before: usize) {
        self.is_composing = true;
        self.text.clear();
        self.anchor_offset = anchor;
        self.replace_end = replace_end.max(anchor);
        self.cursor = 0;
        self.cursor_before = cursor_before;
    }

    /// Updates the composition text. Ignored when not composing.
    pub fn update(&mut self, text: &str, cursor: Option<usize>) {
        if !self.is_composing {
            return;
        }
        self.text = text.to_string();
        let len = self.text.chars().count();
        self.cursor = cursor.unwrap_or(len).min(len);
    }

    /// Ends the composition and returns what to commit.
    ///
    /// `final_text` overrides the buffered text when the platform reports it.
    pub fn end(&mut self, final_text: Option<&str>) -> Option<CommittedComposition> {
        if !self.is_composing {
            return None;
        }
        let buffered = std::mem::take(&mut self.text);
        let committed = CommittedComposition {
            text: final_text.map(str::to_string).unwrap_or(buffered),
            start: self.anchor_offset,
            end: self.replace_end,
            cursor_before: self.cursor_before,
        };
        self.cancel();
        Some(committed)
    }

    /// Cancels the composition without committing.
    pub fn cancel(&mut self) {
        *self = Self::default();
    }

    /// Returns the range covered by the pre-edit text, as if it were
    /// inserted at the anchor.
    pub fn highlight(&self, index: &LineIndex) -> Option<HighlightRange> {
        if !self.is_composing || self.text.is_empty() {
            return None;
        }
        let (line, col) = index.line_col_at_offset(self.anchor_offset);
        let mut end_line = line;
        let mut end_col = col;
        for ch in self.text.chars() {
            if ch == '\n' {
                end_line += 1;
                end_col = 0;
            } else {
                end_col += 1;
            }
        }
        Some(HighlightRange {
            kind: HighlightKind::Composition,
            start_line: line + 1,
            start_column: col + 1,
            end_line: end_line + 1,
            end_column: end_col + 1,
        })
    }
}
