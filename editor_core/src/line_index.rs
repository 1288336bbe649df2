//! Line segmentation of the document text, backed by a rope.
//!
//! Offsets are character indices into the whole document. Lines and columns
//! are 0-indexed here; the editor converts to 1-based columns for display.

use ropey::Rope;

/// Line boundaries and offset conversions for one document text.
#[derive(Debug, Clone)]
pub struct LineIndex {
    rope: Rope,
}

impl Default for LineIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl LineIndex {
    /// Creates an index for an empty document (one empty line).
    pub fn new() -> Self {
        Self { rope: Rope::new() }
    }

    /// Builds the index for `text`.
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    /// Returns the total number of characters.
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// Returns the number of lines. An empty document has one line.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Returns true if the document is empty.
    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Returns the line containing `offset`, clamped to the document.
    pub fn line_at_offset(&self, offset: usize) -> usize {
        self.rope.char_to_line(offset.min(self.len_chars()))
    }

    /// Converts a character offset to a (line, column) pair.
    pub fn line_col_at_offset(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.len_chars());
        let line = self.rope.char_to_line(offset);
        (line, offset - self.rope.line_to_char(line))
    }

    /// Converts a (line, column) pair to a character offset.
    ///
    /// Lines past the end map to the end of the document; columns past the
    /// end of the line map to the line end.
    pub fn offset_at_line_column(&self, line: usize, col: usize) -> usize {
        if line >= self.line_count() {
            return self.len_chars();
        }
        self.rope.line_to_char(line) + col.min(self.line_len_chars(line))
    }

    /// Returns the length of a line in characters, excluding its line break.
    pub fn line_len_chars(&self, line: usize) -> usize {
        if line >= self.line_count() {
            return 0;
        }
        let slice = self.rope.line(line);
        let mut len = slice.len_chars();
        if len > 0 && is_line_break(slice.char(len - 1)) {
            let last = slice.char(len - 1);
            len -= 1;
            if last == '\n' && len > 0 && slice.char(len - 1) == '\r' {
                len -= 1;
            }
        }
        len
    }

    /// Returns the offset of the first character of `line`.
    pub fn line_start(&self, line: usize) -> usize {
        if line >= self.line_count() {
            self.len_chars()
        } else {
            self.rope.line_to_char(line)
        }
    }

    /// Returns the offset just before the line break of `line`.
    pub fn line_end(&self, line: usize) -> usize {
        if line >= self.line_count() {
            self.len_chars()
        } else {
            self.rope.line_to_char(line) + self.line_len_chars(line)
        }
    }

    /// Returns a line's text without its line break.
    pub fn line_text(&self, line: usize) -> Option<String> {
        if line >= self.line_count() {
            return None;
        }
        let start = self.line_start(line);
        Some(self.slice(start, start + self.line_len_chars(line)))
    }

    /// Returns the character at `offset`, if any.
    pub fn char_at(&self, offset: usize) -> Option<char> {
        (offset < self.len_chars()).then(|| self.rope.char(offset))
    }

    /// Returns the text between two offsets (clamped, order-insensitive).
    pub fn slice(&self, start: usize, end: usize) -> String {
        let len = self.len_chars();
        let (start, end) = (start.min(end).min(len), start.max(end).min(len));
        self.rope.slice(start..end).to_string()
    }

    /// Returns the whole document.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Replaces the characters `[start, end)` with `text`.
    pub fn replace(&mut self, start: usize, end: usize, text: &str) {
        let len = self.len_chars();
        let start = start.min(len);
        let end = end.clamp(start, len);
        if start < end {
            self.rope.remove(start..end);
        }
        if !text.is_empty() {
            self.rope.insert(start, text);
        }
    }

    /// Returns the offset of the previous word boundary.
    pub fn word_boundary_left(&self, offset: usize) -> usize {
        let mut pos = offset.min(self.len_chars());
        while pos > 0 && self.char_at(pos - 1).is_some_and(char::is_whitespace) {
            pos -= 1;
        }
        while pos > 0 && self.char_at(pos - 1).is_some_and(is_word_char) {
            pos -= 1;
        }
        if pos == offset && pos > 0 {
            pos -= 1;
        }
        pos
    }

    /// Returns the offset of the next word boundary.
    pub fn word_boundary_right(&self, offset: usize) -> usize {
        let len = self.len_chars();
        let mut pos = offset.min(len);
        while pos < len && self.char_at(pos).is_some_and(char::is_whitespace) {
            pos += 1;
        }
        while pos < len && self.char_at(pos).is_some_and(is_word_char) {
            pos += 1;
        }
        if pos == offset && pos < len {
            pos += 1;
        }
        pos
    }

    /// Returns the word around `offset` as a range, if the offset touches one.
    pub fn word_at(&self, offset: usize) -> Option<(usize, usize)> {
        let len = self.len_chars();
        let offset = offset.min(len);
        let mut start = offset;
        while start > 0 && self.char_at(start - 1).is_some_and(is_word_char) {
            start -= 1;
        }
        let mut end = offset;
        while end < len && self.char_at(end).is_some_and(is_word_char) {
            end += 1;
        }
        (start < end).then_some((start, end))
    }
}

/// Characters ropey treats as ending a line.
fn is_line_break(ch: char) -> bool {
    matches!(
        ch,
        '\n' | '\r' | '\u{000B}' | '\u{000C}' | '\u{0085}' | '\u{2028}' | '\u{2029}'
    )
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// The region that differs between two texts, in character offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextDiff {
    /// First differing character.
    pub start: usize,
    /// End of the replaced region in the old text.
    pub old_end: usize,
    /// End of the replacement in the new text.
    pub new_end: usize,
}

impl TextDiff {
    /// Returns true if the texts were identical.
    pub fn is_empty(&self) -> bool {
        self.start == self.old_end && self.start == self.new_end
    }
}

/// Computes the changed span between `old` and `new` by trimming the common
/// prefix and suffix.
pub fn diff_span(old: &str, new: &str) -> TextDiff {
    let old_chars: Vec<char> = old.chars().collect();
    let new_chars: Vec<char> = new.chars().collect();

    let prefix = old_chars
        .iter()
        .zip(&new_chars)
        .take_while(|(a, b)| a == b)
        .count();
    let max_suffix = old_chars.len().min(new_chars.len()) - prefix;
    let suffix = old_chars
        .iter()
        .rev()
        .zip(new_chars.iter().rev())
        .take(max_suffix)
        .take_while(|(a, b)| a == b)
        .count();

    TextDiff {
        start: prefix,
        old_end: old_chars.len() - suffix,
        new_end: new_chars.len() - suffix,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document() {
        let index = LineIndex::new();
        assert!(index.is_empty());
        assert_eq!(index.line_count(), 1);
        assert_eq!(index.line_text(0), Some(String::new()));
    }

    #[test]
    fn test_line_count_with_trailing_newline() {
        assert_eq!(LineIndex::from_text("hello\nworld").line_count(), 2);
        assert_eq!(LineIndex::from_text("abc\n").line_count(), 2);
    }

    #[test]
    fn test_line_col_round_trip() {
        let index = LineIndex::from_text("abc\ndefgh");
        assert_eq!(index.line_col_at_offset(0), (0, 0));
        assert_eq!(index.line_col_at_offset(3), (0, 3));
        assert_eq!(index.line_col_at_offset(4), (1, 0));
        assert_eq!(index.line_col_at_offset(6), (1, 2));
        assert_eq!(index.offset_at_line_column(1, 2), 6);
        assert_eq!(index.offset_at_line_column(0, 2), 2);
    }

    #[test]
    fn test_out_of_range_clamps() {
        let index = LineIndex::from_text("abc\ndefgh");
        assert_eq!(index.line_col_at_offset(100), (1, 5));
        assert_eq!(index.line_at_offset(100), 1);
        assert_eq!(index.offset_at_line_column(0, 99), 3);
        assert_eq!(index.offset_at_line_column(7, 0), 9);
        assert_eq!(index.line_len_chars(7), 0);
        assert_eq!(index.line_text(7), None);
        assert_eq!(index.slice(7, 100), "gh");
    }

    #[test]
    fn test_crlf_line_length() {
        let index = LineIndex::from_text("ab\r\ncd");
        assert_eq!(index.line_count(), 2);
        assert_eq!(index.line_len_chars(0), 2);
        assert_eq!(index.line_end(0), 2);
        assert_eq!(index.line_start(1), 4);
    }

    #[test]
    fn test_multibyte_offsets_are_chars() {
        let index = LineIndex::from_text("日本語\nテキスト");
        assert_eq!(index.len_chars(), 8);
        assert_eq!(index.line_col_at_offset(5), (1, 1));
        assert_eq!(index.line_text(1), Some("テキスト".to_string()));
    }

    #[test]
    fn test_replace() {
        let mut index = LineIndex::from_text("hello world");
        index.replace(5, 11, "\nthere");
        assert_eq!(index.text(), "hello\nthere");
        assert_eq!(index.line_count(), 2);
    }

    #[test]
    fn test_word_boundaries() {
        let index = LineIndex::from_text("foo bar_baz  qux");
        assert_eq!(index.word_boundary_right(0), 3);
        assert_eq!(index.word_boundary_right(3), 11);
        assert_eq!(index.word_boundary_left(11), 4);
        assert_eq!(index.word_boundary_left(4), 0);
        assert_eq!(index.word_at(5), Some((4, 11)));
        assert_eq!(index.word_at(12), None);
    }

    #[test]
    fn test_diff_span() {
        assert_eq!(
            diff_span("hello world", "hello brave world"),
            TextDiff { start: 6, old_end: 6, new_end: 12 }
        );
        assert_eq!(
            diff_span("aaa", "aa"),
            TextDiff { start: 2, old_end: 3, new_end: 2 }
        );
        assert!(diff_span("same", "same").is_empty());
        assert_eq!(
            diff_span("a\nb\nc", "a\nc"),
            TextDiff { start: 2, old_end: 4, new_end: 2 }
        );
    }
}
