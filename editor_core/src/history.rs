//! Undo/Redo history with debounced coalescing.
//!
//! Entries are whole-document snapshots. A burst of edits inside the debounce
//! window collapses into one pending entry that is committed when the window
//! closes, when a forced push arrives, or before an undo.

use std::time::{Duration, Instant};

/// Default debounce window for coalescing edits (in milliseconds).
pub const DEBOUNCE_WINDOW_MS: u64 = 300;

/// One undoable document state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Document text after the edit.
    pub text: String,
    /// Cursor offset after the edit.
    pub cursor_after: usize,
    /// Cursor offset before the edit (restored on undo).
    pub cursor_before: usize,
}

impl HistoryEntry {
    pub fn new(text: impl Into<String>, cursor_after: usize, cursor_before: usize) -> Self {
        Self {
            text: text.into(),
            cursor_after,
            cursor_before,
        }
    }
}

/// The state produced by an undo or redo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Restored {
    pub text: String,
    pub cursor_offset: usize,
}

/// An entry waiting for its debounce window to close.
#[derive(Debug, Clone)]
struct PendingEntry {
    entry: HistoryEntry,
    deadline: Instant,
}

/// Manages undo/redo history.
#[derive(Debug)]
pub struct History {
    /// The committed state the document is currently at.
    present: HistoryEntry,
    /// States that can be returned to with undo (oldest first).
    undo_stack: Vec<HistoryEntry>,
    /// States that can be returned to with redo (most recent last).
    redo_stack: Vec<HistoryEntry>,
    /// Open debounce window, if any.
    pending: Option<PendingEntry>,
    /// Maximum number of undo levels.
    max_size: usize,
    /// Debounce window length.
    debounce: Duration,
}

impl Default for History {
    fn default() -> Self {
        Self::new("", 1000)
    }
}

impl History {
    /// Creates a history whose baseline is `text`.
    pub fn new(text: impl Into<String>, max_size: usize) -> Self {
        Self {
            present: HistoryEntry::new(text, 0, 0),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            pending: None,
            max_size: max_size.max(1),
            debounce: Duration::from_millis(DEBOUNCE_WINDOW_MS),
        }
    }

    /// Sets the debounce window.
    pub fn set_debounce(&mut self, window: Duration) {
        self.debounce = window;
    }

    /// Returns the debounce window.
    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Records an edit, coalescing it with an open debounce window.
    ///
    /// The redo stack is discarded here, at push time.
    pub fn push(&mut self, text: impl Into<String>, cursor_after: usize, cursor_before: usize, now: Instant) {
        let text = text.into();
        self.redo_stack.clear();

        if let Some(pending) = self.pending.as_mut() {
            if now < pending.deadline {
                // Trailing edge: keep the burst's original cursor_before.
                pending.entry.text = text;
                pending.entry.cursor_after = cursor_after;
                pending.deadline = now + self.debounce;
                return;
            }
            self.flush();
        }

        self.pending = Some(PendingEntry {
            entry: HistoryEntry::new(text, cursor_after, cursor_before),
            deadline: now + self.debounce,
        });
    }

    /// Flushes any open window, then commits this edit as its own entry.
    pub fn push_forced(&mut self, text: impl Into<String>, cursor_after: usize, cursor_before: usize) {
        self.flush();
        self.redo_stack.clear();
        self.commit(HistoryEntry::new(text, cursor_after, cursor_before));
    }

    /// Commits the pending entry immediately. Returns true if one was pending.
    pub fn flush(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                self.commit(pending.entry);
                true
            }
            None => false,
        }
    }

    /// Fires the debounce timer if its deadline has passed.
    pub fn tick(&mut self, now: Instant) -> bool {
        match &self.pending {
            Some(pending) if now >= pending.deadline => self.flush(),
            _ => false,
        }
    }

    /// Cancels the debounce timer, discarding the pending entry.
    pub fn cancel_pending(&mut self) -> bool {
        self.pending.take().is_some()
    }

    /// Returns true while a debounce window is open.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    fn commit(&mut self, entry: HistoryEntry) {
        let previous = std::mem::replace(&mut self.present, entry);
        self.undo_stack.push(previous);
        if self.undo_stack.len() > self.max_size {
            let excess = self.undo_stack.len() - self.max_size;
            self.undo_stack.drain(..excess);
        }
    }

    /// Returns true if undo is available.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty() || self.pending.is_some()
    }

    /// Returns true if redo is available.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Steps back one entry.
    ///
    /// Returns the previous text and the cursor offset from before the undone
    /// edit, or None if there is nothing to undo.
    pub fn undo(&mut self) -> Option<Restored> {
        self.flush();

        let previous = self.undo_stack.pop()?;
        let undone = std::mem::replace(&mut self.present, previous);
        let restored = Restored {
            text: self.present.text.clone(),
            cursor_offset: undone.cursor_before,
        };
        self.redo_stack.push(undone);
        Some(restored)
    }

    /// Steps forward one entry.
    pub fn redo(&mut self) -> Option<Restored> {
        let next = self.redo_stack.pop()?;
        let restored = Restored {
            text: next.text.clone(),
            cursor_offset: next.cursor_after,
        };
        let previous = std::mem::replace(&mut self.present, next);
        self.undo_stack.push(previous);
        Some(restored)
    }

    /// Clears all history and sets a new baseline.
    pub fn reset(&mut self, text: impl Into<String>) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.pending = None;
        self.present = HistoryEntry::new(text, 0, 0);
    }
}
