//! Cursor, selection and the highlight values handed to the renderer.

use crate::line_index::LineIndex;

/// A text selection with an anchor and a cursor position.
/// When anchor == cursor, there is no active selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    /// The anchor point (where selection started).
    pub anchor: usize,
    /// The cursor position (where selection ends / caret is).
    pub cursor: usize,
}

impl Selection {
    /// Creates a collapsed selection at `pos`.
    pub fn new(pos: usize) -> Self {
        Self {
            anchor: pos,
            cursor: pos,
        }
    }

    /// Creates a selection from anchor to cursor.
    pub fn with_range(anchor: usize, cursor: usize) -> Self {
        Self { anchor, cursor }
    }

    /// Returns true if anchor != cursor.
    pub fn has_selection(&self) -> bool {
        self.anchor != self.cursor
    }

    /// Returns the start and end of the selection (ordered).
    pub fn range(&self) -> (usize, usize) {
        (self.anchor.min(self.cursor), self.anchor.max(self.cursor))
    }

    /// Returns the selected range, or None if collapsed.
    pub fn selected_range(&self) -> Option<(usize, usize)> {
        self.has_selection().then(|| self.range())
    }

    /// Sets the cursor position, optionally extending the selection.
    pub fn set_cursor(&mut self, pos: usize, extend: bool) {
        self.cursor = pos;
        if !extend {
            self.anchor = pos;
        }
    }

    /// Clamps both ends to `max`.
    pub fn clamp(&mut self, max: usize) {
        self.anchor = self.anchor.min(max);
        self.cursor = self.cursor.min(max);
    }
}

/// Caret position for display. Line and column are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorState {
    pub line: usize,
    pub column: usize,
    pub visible: bool,
    pub blinking: bool,
}

impl Default for CursorState {
    fn default() -> Self {
        Self {
            line: 1,
            column: 1,
            visible: false,
            blinking: false,
        }
    }
}

impl CursorState {
    /// Builds the caret state for a character offset.
    pub fn at_offset(index: &LineIndex, offset: usize, visible: bool, blinking: bool) -> Self {
        let (line, col) = index.line_col_at_offset(offset);
        Self {
            line: line + 1,
            column: col + 1,
            visible,
            blinking: visible && blinking,
        }
    }
}

/// A selected region in (line, column) terms, 1-based, start before end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionHighlight {
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl SelectionHighlight {
    /// Builds the highlight between two offsets given in either order.
    /// Returns None when they are equal.
    pub fn from_offsets(index: &LineIndex, a: usize, b: usize) -> Option<Self> {
        let len = index.len_chars();
        let (start, end) = (a.min(b).min(len), a.max(b).min(len));
        if start == end {
            return None;
        }
        let (start_line, start_col) = index.line_col_at_offset(start);
        let (end_line, end_col) = index.line_col_at_offset(end);
        Some(Self {
            start_line: start_line + 1,
            start_column: start_col + 1,
            end_line: end_line + 1,
            end_column: end_col + 1,
        })
    }
}

/// What a highlight range represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightKind {
    Selection,
    Composition,
}

/// A range the renderer paints behind or under text. 1-based, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightRange {
    pub kind: HighlightKind,
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl HighlightRange {
    pub fn from_selection(highlight: SelectionHighlight) -> Self {
        Self {
            kind: HighlightKind::Selection,
            start_line: highlight.start_line,
            start_column: highlight.start_column,
            end_line: highlight.end_line,
            end_column: highlight.end_column,
        }
    }
}

/// Cursor movement relative to a line index.
#[derive(Debug, Clone, Default)]
pub struct Cursor {
    /// Current selection (includes cursor position).
    pub selection: Selection,
    /// Preferred column for vertical movement.
    /// This preserves the column when moving through lines of varying length.
    preferred_col: Option<usize>,
}

impl Cursor {
    /// Creates a new cursor at position 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the caret offset.
    pub fn position(&self) -> usize {
        self.selection.cursor
    }

    /// Sets the caret offset.
    pub fn set_position(&mut self, pos: usize, extend: bool) {
        self.selection.set_cursor(pos, extend);
        self.preferred_col = None;
    }

    /// Replaces the whole selection.
    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
        self.preferred_col = None;
    }

    pub fn has_selection(&self) -> bool {
        self.selection.has_selection()
    }

    pub fn selected_range(&self) -> Option<(usize, usize)> {
        self.selection.selected_range()
    }

    /// Moves cursor left by one character.
    /// Without `extend`, an active selection collapses to its start instead.
    pub fn move_left(&mut self, extend: bool) {
        match self.selected_range() {
            Some((start, _)) if !extend => self.set_position(start, false),
            _ => self.set_position(self.position().saturating_sub(1), extend),
        }
    }

    /// Moves cursor right by one character.
    pub fn move_right(&mut self, index: &LineIndex, extend: bool) {
        match self.selected_range() {
            Some((_, end)) if !extend => self.set_position(end, false),
            _ => {
                let pos = (self.position() + 1).min(index.len_chars());
                self.set_position(pos, extend);
            }
        }
    }

    pub fn move_word_left(&mut self, index: &LineIndex, extend: bool) {
        let pos = index.word_boundary_left(self.position());
        self.set_position(pos, extend);
    }

    pub fn move_word_right(&mut self, index: &LineIndex, extend: bool) {
        let pos = index.word_boundary_right(self.position());
        self.set_position(pos, extend);
    }

    /// Moves the caret `lines` up (negative) or down (positive).
    pub fn move_vertical(&mut self, index: &LineIndex, lines: isize, extend: bool) {
        let (line, col) = index.line_col_at_offset(self.position());
        let target_col = *self.preferred_col.get_or_insert(col);
        let last_line = index.line_count().saturating_sub(1);

        let new_pos = if lines < 0 && line == 0 {
            self.preferred_col = None;
            0
        } else if lines > 0 && line == last_line {
            self.preferred_col = None;
            index.len_chars()
        } else {
            let target_line = line.saturating_add_signed(lines).min(last_line);
            index.offset_at_line_column(target_line, target_col)
        };
        self.selection.set_cursor(new_pos, extend);
    }

    pub fn move_up(&mut self, index: &LineIndex, extend: bool) {
        self.move_vertical(index, -1, extend);
    }

    pub fn move_down(&mut self, index: &LineIndex, extend: bool) {
        self.move_vertical(index, 1, extend);
    }

    pub fn move_to_line_start(&mut self, index: &LineIndex, extend: bool) {
        let line = index.line_at_offset(self.position());
        self.set_position(index.line_start(line), extend);
    }

    pub fn move_to_line_end(&mut self, index: &LineIndex, extend: bool) {
        let line = index.line_at_offset(self.position());
        self.set_position(index.line_end(line), extend);
    }

    pub fn move_to_buffer_start(&mut self, extend: bool) {
        self.set_position(0, extend);
    }

    pub fn move_to_buffer_end(&mut self, index: &LineIndex, extend: bool) {
        self.set_position(index.len_chars(), extend);
    }

    /// Clamps the selection to the document length.
    pub fn clamp_to(&mut self, index: &LineIndex) {
        self.selection.clamp(index.len_chars());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_selection_range() {
        assert_eq!(Selection::with_range(5, 10).range(), (5, 10));
        assert_eq!(Selection::with_range(10, 5).range(), (5, 10));
        assert_eq!(Selection::new(3).selected_range(), None);
    }

    #[test]
    fn test_cursor_state_is_one_based() {
        let index = LineIndex::from_text("abc\ndef");
        let state = CursorState::at_offset(&index, 5, true, true);
        assert_eq!((state.line, state.column), (2, 2));
        assert!(state.blinking);

        let hidden = CursorState::at_offset(&index, 0, false, true);
        assert_eq!((hidden.line, hidden.column), (1, 1));
        assert!(!hidden.blinking);
    }

    #[test]
    fn test_highlight_normalizes() {
        let index = LineIndex::from_text("hello\nworld");
        let forward = SelectionHighlight::from_offsets(&index, 2, 8).unwrap();
        let backward = SelectionHighlight::from_offsets(&index, 8, 2).unwrap();
        assert_eq!(forward, backward);
        assert_eq!(
            forward,
            SelectionHighlight { start_line: 1, start_column: 3, end_line: 2, end_column: 3 }
        );
        assert!(SelectionHighlight::from_offsets(&index, 4, 4).is_none());
        assert!(SelectionHighlight::from_offsets(&index, 50, 90).is_none());
    }

    #[test]
    fn test_cursor_movement() {
        let index = LineIndex::from_text("hello\nworld");
        let mut cursor = Cursor::new();

        cursor.move_right(&index, false);
        assert_eq!(cursor.position(), 1);

        cursor.set_position(2, false);
        cursor.move_down(&index, false);
        assert_eq!(index.line_col_at_offset(cursor.position()), (1, 2));

        cursor.move_down(&index, false);
        assert_eq!(cursor.position(), 11);

        cursor.move_to_buffer_start(false);
        cursor.move_up(&index, false);
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_preferred_column() {
        let index = LineIndex::from_text("long line here\nshort\nanother long line");
        let mut cursor = Cursor::new();
        cursor.set_position(10, false);

        cursor.move_down(&index, false);
        assert_eq!(index.line_col_at_offset(cursor.position()), (1, 5));

        cursor.move_down(&index, false);
        assert_eq!(index.line_col_at_offset(cursor.position()), (2, 10));
    }

    #[test]
    fn test_collapse_on_plain_move() {
        let index = LineIndex::from_text("hello");
        let mut cursor = Cursor::new();
        cursor.move_right(&index, true);
        cursor.move_right(&index, true);
        cursor.move_right(&index, true);
        assert_eq!(cursor.selected_range(), Some((0, 3)));

        cursor.move_left(false);
        assert_eq!(cursor.position(), 0);
        assert!(!cursor.has_selection());
    }

    #[test]
    fn test_line_navigation() {
        let index = LineIndex::from_text("one\ntwo three");
        let mut cursor = Cursor::new();
        cursor.set_position(6, false);
        cursor.move_to_line_start(&index, false);
        assert_eq!(cursor.position(), 4);
        cursor.move_to_line_end(&index, true);
        assert_eq!(cursor.selected_range(), Some((4, 13)));
    }

    proptest! {
        #[test]
        fn prop_highlight_start_before_end(a in 0usize..60, b in 0usize..60) {
            let index = LineIndex::from_text("alpha\nbeta gamma\n\ndelta\nepsilon zeta eta");
            if let Some(h) = SelectionHighlight::from_offsets(&index, a, b) {
                prop_assert!((h.start_line, h.start_column) < (h.end_line, h.end_column));
                prop_assert_eq!(Some(h), SelectionHighlight::from_offsets(&index, b, a));
            }
        }
    }
}
