//! Main editor logic.
//!
//! The editor owns the document's line index, history, geometry and input
//! state. Hosts feed it events and read back the visible range, caret and
//! highlights after each paint.

use crate::commands::{self, CommandId};
use crate::composition::Composition;
use crate::config::EditorConfig;
use crate::cursor::{Cursor, CursorState, HighlightRange, Selection, SelectionHighlight};
use crate::error::{EditorError, EditorResult};
use crate::geometry::{self, Rect, TextMeasure};
use crate::history::{History, Restored};
use crate::input::{self, EditorCommand, KeyEvent};
use crate::line_index::{self, LineIndex};
use crate::pointer::{PointerDrag, PointerEvent, PointerPhase};
use crate::scheduler::{Clock, DeferredQueue, SystemClock};
use crate::viewport::{Point, ScrollAlign, Size, Viewport, ViewportScroller, VisibleLineRange};
use std::rc::Rc;

/// Work deferred until after the next paint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameTask {
    /// Re-read the selection and rebuild the caret and highlights.
    RefreshCursor,
    /// Place the caret at an offset, then refresh.
    RestoreCursor(usize),
}

/// How an edit enters history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EditKind {
    /// Debounced; merges with neighbouring keystrokes.
    Typing,
    /// Flushes pending history and becomes its own entry.
    Discrete,
}

/// Builds an [`Editor`]. A text measurement function is required.
#[derive(Default)]
pub struct EditorBuilder {
    text: String,
    config: EditorConfig,
    viewport_size: Size,
    measure: Option<Box<dyn TextMeasure>>,
    clock: Option<Box<dyn Clock>>,
}

impl EditorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initial document text.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn config(mut self, config: EditorConfig) -> Self {
        self.config = config;
        self
    }

    /// Initial viewport dimensions.
    pub fn viewport_size(mut self, size: Size) -> Self {
        self.viewport_size = size;
        self
    }

    /// Text measurement used for widths, hit testing and caret placement.
    pub fn measure(mut self, measure: impl TextMeasure + 'static) -> Self {
        self.measure = Some(Box::new(measure));
        self
    }

    /// Time source for history debouncing. Defaults to the system clock.
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    /// Creates the editor.
    ///
    /// Fails only when no measurement function was supplied, since every
    /// horizontal coordinate depends on it.
    pub fn build(self) -> EditorResult<Editor> {
        let Some(measure) = self.measure else {
            log::error!("editor requires a text measurement function");
            return Err(EditorError::MissingTextMeasurement);
        };

        let index = LineIndex::from_text(&self.text);
        let config = self.config;
        let mut history = History::new(self.text, config.history_limit);
        history.set_debounce(config.debounce);
        let scroller = ViewportScroller::new(
            index.line_count(),
            config.default_line_height,
            config.overscan,
            config.cache_capacity,
        );

        let mut editor = Editor {
            index,
            cursor: Cursor::new(),
            history,
            scroller,
            viewport: Viewport::new(Point::default(), self.viewport_size),
            composition: Composition::new(),
            drag: PointerDrag::new(),
            frames: DeferredQueue::new(),
            refresh_queued: false,
            measure,
            clock: self.clock.unwrap_or_else(|| Box::new(SystemClock)),
            config,
            cursor_state: CursorState::default(),
            selection_highlight: None,
            focused: true,
            modified: false,
        };
        editor.measure_all_widths();
        editor.refresh_cursor_state();
        log::debug!("editor ready with {} lines", editor.index.line_count());
        Ok(editor)
    }
}

/// The editor state for one open document.
pub struct Editor {
    /// Line segmentation of the current text.
    index: LineIndex,
    /// Caret and selection.
    cursor: Cursor,
    /// Undo/redo history.
    history: History,
    /// Line geometry and visible-range memo.
    scroller: ViewportScroller,
    /// Current scroll offset and size.
    viewport: Viewport,
    /// IME pre-edit state.
    composition: Composition,
    /// Pointer drag anchor.
    drag: PointerDrag,
    /// Tasks waiting for the next paint.
    frames: DeferredQueue<FrameTask>,
    /// Set while a refresh is queued, so repeated edits in one frame refresh once.
    refresh_queued: bool,
    measure: Box<dyn TextMeasure>,
    clock: Box<dyn Clock>,
    config: EditorConfig,
    /// Last computed caret.
    cursor_state: CursorState,
    /// Last computed selection highlight.
    selection_highlight: Option<SelectionHighlight>,
    focused: bool,
    /// Whether the document changed since it was loaded.
    modified: bool,
}

impl Editor {
    /// Starts building an editor.
    pub fn builder() -> EditorBuilder {
        EditorBuilder::new()
    }

    // ==================== Accessors ====================

    /// Returns the document text.
    pub fn text(&self) -> String {
        self.index.text()
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.index
    }

    pub fn line_count(&self) -> usize {
        self.index.line_count()
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn scroller(&self) -> &ViewportScroller {
        &self.scroller
    }

    pub fn selection(&self) -> Selection {
        self.cursor.selection
    }

    /// Returns the caret offset.
    pub fn cursor_offset(&self) -> usize {
        self.cursor.position()
    }

    pub fn selected_text(&self) -> Option<String> {
        self.cursor
            .selected_range()
            .map(|(start, end)| self.index.slice(start, end))
    }

    pub fn composition(&self) -> &Composition {
        &self.composition
    }

    pub fn is_composing(&self) -> bool {
        self.composition.is_composing
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Returns the number of tasks waiting for the next paint.
    pub fn pending_frame_tasks(&self) -> usize {
        self.frames.len()
    }

    /// Returns true while a debounced history entry is waiting.
    pub fn has_pending_history(&self) -> bool {
        self.history.has_pending()
    }

    // ==================== Renderer output ====================

    /// Returns the lines to paint for the current viewport.
    pub fn visible_range(&mut self) -> Rc<VisibleLineRange> {
        self.scroller.get_visible_lines(&self.viewport)
    }

    /// Returns the caret as of the last refresh.
    pub fn cursor_state(&self) -> CursorState {
        self.cursor_state
    }

    /// Returns the selection highlight as of the last refresh.
    pub fn selection_highlight(&self) -> Option<SelectionHighlight> {
        self.selection_highlight
    }

    /// Returns selection and composition highlights, selection first.
    pub fn highlights(&self) -> Vec<HighlightRange> {
        let mut ranges: Vec<HighlightRange> = self
            .selection_highlight
            .map(HighlightRange::from_selection)
            .into_iter()
            .collect();
        ranges.extend(self.composition.highlight(&self.index));
        ranges
    }

    /// Returns the caret rectangle in document coordinates.
    pub fn cursor_rect(&self) -> Rect {
        geometry::cursor_rect(
            &self.index,
            self.scroller.heights(),
            self.measure.as_ref(),
            self.cursor.position(),
        )
    }

    /// Returns selection rectangles for the lines currently in view.
    pub fn selection_rects(&mut self) -> Vec<Rect> {
        if self.is_composing() {
            return Vec::new();
        }
        let Some((start, end)) = self.cursor.selected_range() else {
            return Vec::new();
        };
        let range = self.visible_range();
        geometry::selection_rects(
            &self.index,
            self.scroller.heights(),
            self.measure.as_ref(),
            start,
            end,
            range.start_index..range.end_index,
        )
    }

    // ==================== Host feedback ====================

    /// Records a renderer-measured line height. Returns true if the geometry
    /// changed. Measurements for lines that no longer exist are dropped.
    pub fn on_line_measured(&mut self, line: usize, height: f64) -> bool {
        if line >= self.scroller.line_count() {
            log::trace!("dropping height for stale line {}", line);
            return false;
        }
        self.scroller.update_line_height(line, height)
    }

    /// Applies a scroll offset, clamped to the document.
    pub fn on_scroll(&mut self, offset: Point) {
        let max_y = self.scroller.max_scroll_y(self.viewport.size.height);
        self.viewport.offset = Point::new(offset.x.max(0.0), offset.y.clamp(0.0, max_y));
    }

    /// Applies a new viewport size.
    ///
    /// Outstanding paint callbacks are cancelled and the pending history entry
    /// is committed; the caret is recomputed right away instead.
    pub fn on_resize(&mut self, size: Size) {
        self.viewport.size = size;
        let cancelled = self.frames.cancel_all();
        self.refresh_queued = false;
        self.history.flush();
        if cancelled > 0 {
            log::debug!("resize cancelled {} frame tasks", cancelled);
        }
        let offset = self.viewport.offset;
        self.on_scroll(offset);
        self.refresh_cursor_state();
    }

    pub fn set_focus(&mut self, focused: bool) {
        self.focused = focused;
        self.refresh_cursor_state();
    }

    /// Fires the history debounce timer if it has expired.
    pub fn tick(&mut self) -> bool {
        let fired = self.history.tick(self.clock.now());
        if fired {
            self.refresh_cursor_state();
        }
        fired
    }

    /// Runs the tasks queued for after the frame that was just painted.
    pub fn on_frame(&mut self) {
        self.refresh_queued = false;
        for task in self.frames.take_ready() {
            match task {
                FrameTask::RefreshCursor => self.refresh_cursor_state(),
                FrameTask::RestoreCursor(offset) => {
                    self.cursor
                        .set_position(offset.min(self.index.len_chars()), false);
                    self.refresh_cursor_state();
                }
            }
        }
    }

    /// Handles a native selection-change notification.
    pub fn on_selection_change(&mut self, anchor: usize, focus: usize) {
        let len = self.index.len_chars();
        self.cursor
            .set_selection(Selection::with_range(anchor.min(len), focus.min(len)));
        self.refresh_cursor_state();
    }

    /// Handles a full-text change reported by the host.
    ///
    /// During composition the document is left alone; the composed text is
    /// committed when the composition ends.
    pub fn on_text_change(&mut self, text: &str, cursor: usize) -> bool {
        if self.is_composing() {
            log::trace!("ignoring text change during composition");
            return false;
        }
        let cursor_before = self.cursor.position();
        if !self.set_text(text) {
            return false;
        }
        let cursor_after = cursor.min(self.index.len_chars());
        self.cursor.set_position(cursor_after, false);
        self.record(EditKind::Typing, cursor_after, cursor_before);
        true
    }

    // ==================== Keyboard ====================

    /// Handles a key press. Returns true if it was consumed.
    pub fn on_key(&mut self, event: &KeyEvent) -> bool {
        if self.is_composing() {
            return false;
        }
        match input::map_key(event) {
            Some(command) => {
                self.execute(command);
                true
            }
            None => false,
        }
    }

    /// Runs a mapped editor command. Ignored during composition.
    pub fn execute(&mut self, command: EditorCommand) {
        if self.is_composing() {
            return;
        }
        match command {
            EditorCommand::InsertChar(ch) => self.insert_text(ch.encode_utf8(&mut [0; 4])),
            EditorCommand::InsertNewline => self.insert_text("\n"),
            EditorCommand::DeleteBackward => self.delete_backward(),
            EditorCommand::DeleteForward => self.delete_forward(),
            EditorCommand::MoveLeft(extend) => {
                self.cursor.move_left(extend);
                self.after_move();
            }
            EditorCommand::MoveRight(extend) => {
                self.cursor.move_right(&self.index, extend);
                self.after_move();
            }
            EditorCommand::MoveWordLeft(extend) => {
                self.cursor.move_word_left(&self.index, extend);
                self.after_move();
            }
            EditorCommand::MoveWordRight(extend) => {
                self.cursor.move_word_right(&self.index, extend);
                self.after_move();
            }
            EditorCommand::MoveUp(extend) => {
                self.cursor.move_up(&self.index, extend);
                self.after_move();
            }
            EditorCommand::MoveDown(extend) => {
                self.cursor.move_down(&self.index, extend);
                self.after_move();
            }
            EditorCommand::MoveToLineStart(extend) => {
                self.cursor.move_to_line_start(&self.index, extend);
                self.after_move();
            }
            EditorCommand::MoveToLineEnd(extend) => {
                self.cursor.move_to_line_end(&self.index, extend);
                self.after_move();
            }
            EditorCommand::MovePageUp(extend) => {
                let page = self.page_lines() as isize;
                self.cursor.move_vertical(&self.index, -page, extend);
                self.after_move();
            }
            EditorCommand::MovePageDown(extend) => {
                let page = self.page_lines() as isize;
                self.cursor.move_vertical(&self.index, page, extend);
                self.after_move();
            }
            EditorCommand::MoveToBufferStart(extend) => {
                self.cursor.move_to_buffer_start(extend);
                self.after_move();
            }
            EditorCommand::MoveToBufferEnd(extend) => {
                self.cursor.move_to_buffer_end(&self.index, extend);
                self.after_move();
            }
            EditorCommand::SelectAll => self.select_all(),
            EditorCommand::ClearSelection => {
                let pos = self.cursor.position();
                self.cursor.set_position(pos, false);
                self.schedule_refresh();
            }
            EditorCommand::Undo => {
                self.undo();
            }
            EditorCommand::Redo => {
                self.redo();
            }
            EditorCommand::Format(id) => {
                self.execute_command(id.as_str());
            }
        }
    }

    fn after_move(&mut self) {
        self.schedule_refresh();
        self.scroll_to_cursor();
    }

    fn page_lines(&self) -> usize {
        let height = self.config.default_line_height.max(1.0);
        ((self.viewport.size.height / height).floor() as usize).max(1)
    }

    // ==================== Text Editing ====================

    /// Inserts text at the caret, replacing the selection.
    /// While composing, the text goes to the composition buffer instead.
    pub fn insert_text(&mut self, text: &str) {
        if self.is_composing() {
            let buffered = format!("{}{}", self.composition.text, text);
            self.composition.update(&buffered, None);
            return;
        }
        let (start, end) = self.cursor.selection.range();
        if text.is_empty() && start == end {
            return;
        }
        self.edit(start, end, text, EditKind::Typing);
    }

    /// Deletes the selection or the character before the caret.
    pub fn delete_backward(&mut self) {
        if self.is_composing() {
            return;
        }
        match self.cursor.selected_range() {
            Some((start, end)) => self.edit(start, end, "", EditKind::Typing),
            None => {
                let pos = self.cursor.position();
                if pos > 0 {
                    self.edit(pos - 1, pos, "", EditKind::Typing);
                }
            }
        }
    }

    /// Deletes the selection or the character after the caret.
    pub fn delete_forward(&mut self) {
        if self.is_composing() {
            return;
        }
        match self.cursor.selected_range() {
            Some((start, end)) => self.edit(start, end, "", EditKind::Typing),
            None => {
                let pos = self.cursor.position();
                if pos < self.index.len_chars() {
                    self.edit(pos, pos + 1, "", EditKind::Typing);
                }
            }
        }
    }

    /// Pastes clipboard text over the selection as its own undo step.
    pub fn paste(&mut self, text: &str) {
        if self.is_composing() || text.is_empty() {
            return;
        }
        let (start, end) = self.cursor.selection.range();
        self.edit(start, end, text, EditKind::Discrete);
    }

    /// Removes and returns the selected text as its own undo step.
    pub fn cut(&mut self) -> Option<String> {
        if self.is_composing() {
            return None;
        }
        let (start, end) = self.cursor.selected_range()?;
        let text = self.index.slice(start, end);
        self.edit(start, end, "", EditKind::Discrete);
        Some(text)
    }

    /// Returns the selected text.
    pub fn copy(&self) -> Option<String> {
        self.selected_text()
    }

    pub fn select_all(&mut self) {
        if self.is_composing() {
            return;
        }
        self.cursor
            .set_selection(Selection::with_range(0, self.index.len_chars()));
        self.schedule_refresh();
    }

    /// Replaces `[start, end)` with `text` and records it in history.
    /// Does nothing while composing, since the composition range must stay
    /// valid until it ends.
    fn edit(&mut self, start: usize, end: usize, text: &str, kind: EditKind) {
        if self.is_composing() {
            log::trace!("ignoring edit during composition");
            return;
        }
        let cursor_before = self.cursor.position();
        let start = self.splice_text(start, end, text);
        let cursor_after = start + text.chars().count();
        self.cursor.set_position(cursor_after, false);
        self.record(kind, cursor_after, cursor_before);
        self.scroll_to_cursor();
    }

    fn record(&mut self, kind: EditKind, cursor_after: usize, cursor_before: usize) {
        let snapshot = self.index.text();
        match kind {
            EditKind::Typing => {
                let now = self.clock.now();
                self.history.push(snapshot, cursor_after, cursor_before, now);
            }
            EditKind::Discrete => self.history.push_forced(snapshot, cursor_after, cursor_before),
        }
        self.schedule_refresh();
    }

    /// Replaces the whole document without touching history.
    fn set_text(&mut self, text: &str) -> bool {
        let old = self.index.text();
        let diff = line_index::diff_span(&old, text);
        if diff.is_empty() {
            return false;
        }
        let fragment: String = text
            .chars()
            .skip(diff.start)
            .take(diff.new_end - diff.start)
            .collect();
        self.splice_text(diff.start, diff.old_end, &fragment);
        true
    }

    /// Edits the line index and keeps the line geometry aligned with it.
    /// Returns the start offset clamped to the document.
    fn splice_text(&mut self, start: usize, end: usize, text: &str) -> usize {
        let start = start.min(self.index.len_chars());
        let first_line = self.index.line_at_offset(start);
        let old_last_line = self.index.line_at_offset(end.max(start));
        self.index.replace(start, end, text);
        let new_last_line = self.index.line_at_offset(start + text.chars().count());

        let removed = old_last_line - first_line;
        let inserted = new_last_line - first_line;
        if inserted > removed {
            self.scroller
                .splice_lines(first_line + 1, 0, inserted - removed);
        } else if removed > inserted {
            self.scroller
                .splice_lines(first_line + 1, removed - inserted, 0);
        }
        if self.scroller.line_count() != self.index.line_count() {
            self.scroller.resize(self.index.line_count());
        }

        for line in first_line..=new_last_line {
            self.measure_line(line);
        }
        self.cursor.clamp_to(&self.index);
        self.modified = true;
        start
    }

    fn measure_line(&mut self, line: usize) {
        if let Some(text) = self.index.line_text(line) {
            let width = self.measure.measure(&text);
            self.scroller.update_line_width(line, width);
        }
    }

    fn measure_all_widths(&mut self) {
        for line in 0..self.index.line_count() {
            self.measure_line(line);
        }
    }

    // ==================== Undo/Redo ====================

    /// Undoes the last edit. Ignored during composition.
    pub fn undo(&mut self) -> Option<Restored> {
        if self.is_composing() {
            return None;
        }
        let restored = self.history.undo()?;
        self.apply_restored(&restored);
        Some(restored)
    }

    /// Redoes the last undone edit. Ignored during composition.
    pub fn redo(&mut self) -> Option<Restored> {
        if self.is_composing() {
            return None;
        }
        let restored = self.history.redo()?;
        self.apply_restored(&restored);
        Some(restored)
    }

    fn apply_restored(&mut self, restored: &Restored) {
        self.set_text(&restored.text);
        self.frames
            .schedule(FrameTask::RestoreCursor(restored.cursor_offset));
    }

    // ==================== Composition ====================

    /// Begins IME composition at the current selection.
    pub fn composition_start(&mut self) {
        if self.is_composing() {
            return;
        }
        let (start, end) = self.cursor.selection.range();
        self.composition
            .start(start, end, self.cursor.position());
        self.drag.cancel();
        self.refresh_cursor_state();
    }

    /// Updates the pre-edit text.
    pub fn composition_update(&mut self, text: &str, cursor: Option<usize>) {
        self.composition.update(text, cursor);
    }

    /// Ends composition, committing the composed text as one undo step.
    /// An empty commit leaves the document alone. Returns true if the
    /// document changed.
    pub fn composition_end(&mut self, final_text: Option<&str>) -> bool {
        let Some(committed) = self.composition.end(final_text) else {
            return false;
        };
        if committed.text.is_empty() {
            self.refresh_cursor_state();
            return false;
        }

        let start = self.splice_text(committed.start, committed.end, &committed.text);
        let cursor_after = start + committed.text.chars().count();
        self.cursor.set_position(cursor_after, false);
        self.record(EditKind::Discrete, cursor_after, committed.cursor_before);
        self.refresh_cursor_state();
        self.scroll_to_cursor();
        true
    }

    /// Abandons composition without touching the document.
    pub fn composition_cancel(&mut self) {
        if self.is_composing() {
            self.composition.cancel();
            self.refresh_cursor_state();
        }
    }

    // ==================== Pointer ====================

    /// Handles a pointer event in viewport coordinates.
    /// Returns true if the selection changed.
    pub fn on_pointer(&mut self, event: PointerEvent) -> bool {
        if self.is_composing() {
            return false;
        }
        let offset = self.offset_at_viewport_point(event.position);
        let selection = match event.phase {
            PointerPhase::Down if event.shift => {
                let anchor = self.cursor.selection.anchor;
                Some(self.drag.down_extending(anchor, offset))
            }
            PointerPhase::Down => Some(self.drag.down(offset)),
            PointerPhase::Move => self.drag.move_to(offset),
            PointerPhase::Up => self.drag.up(offset),
        };
        match selection {
            Some(selection) if selection != self.cursor.selection => {
                self.cursor.set_selection(selection);
                self.schedule_refresh();
                true
            }
            _ => false,
        }
    }

    /// Returns the document offset under a viewport point.
    pub fn offset_at_viewport_point(&self, point: Point) -> usize {
        let document = self.scroller.viewport_to_document(point, &self.viewport);
        geometry::offset_at_point(
            &self.index,
            self.scroller.heights(),
            self.measure.as_ref(),
            document,
        )
    }

    // ==================== Scrolling ====================

    /// Scrolls so `line` is aligned with the viewport. Returns the new offset.
    pub fn scroll_to_index(&mut self, line: usize, align: ScrollAlign) -> f64 {
        let y = self
            .scroller
            .get_scroll_target_y(line, align, self.viewport.size.height);
        self.viewport.offset.y = y;
        y
    }

    pub fn scroll_to_top(&mut self) {
        self.viewport.offset.y = 0.0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.viewport.offset.y = self.scroller.max_scroll_y(self.viewport.size.height);
    }

    /// Scrolls the minimum amount needed to show the caret line.
    pub fn scroll_to_cursor(&mut self) {
        let rect = self.cursor_rect();
        let top = self.viewport.offset.y;
        let bottom = top + self.viewport.size.height;
        let line = self.index.line_at_offset(self.cursor.position());
        if rect.y < top {
            self.scroll_to_index(line, ScrollAlign::Start);
        } else if rect.y + rect.height > bottom && self.viewport.size.height > 0.0 {
            self.scroll_to_index(line, ScrollAlign::End);
        }
    }

    // ==================== Commands ====================

    /// Runs a named formatting command over the selection.
    ///
    /// Returns the new document text, or None if the id is unknown or the
    /// document did not change.
    pub fn execute_command(&mut self, id: &str) -> Option<String> {
        if self.is_composing() {
            return None;
        }
        let command = match id.parse::<CommandId>() {
            Ok(command) => command,
            Err(err) => {
                log::warn!("{}", err);
                return None;
            }
        };

        let edit = commands::apply(command, &self.index, self.cursor.selection);
        if self.index.slice(edit.start, edit.end) == edit.text {
            return None;
        }
        let cursor_before = self.cursor.position();
        self.splice_text(edit.start, edit.end, &edit.text);
        self.cursor.set_selection(edit.selection);
        self.record(EditKind::Discrete, edit.selection.cursor, cursor_before);
        Some(self.index.text())
    }

    // ==================== Lifecycle ====================

    /// Switches to a new document, dropping history and all deferred work.
    pub fn set_document(&mut self, text: &str) {
        self.cancel_deferred();
        self.history.reset(text);
        self.index = LineIndex::from_text(text);
        self.scroller = ViewportScroller::new(
            self.index.line_count(),
            self.config.default_line_height,
            self.config.overscan,
            self.config.cache_capacity,
        );
        self.cursor = Cursor::new();
        self.viewport.offset = Point::default();
        self.modified = false;
        self.measure_all_widths();
        self.refresh_cursor_state();
        log::debug!("switched document ({} lines)", self.index.line_count());
    }

    /// Tears down deferred work before the host drops the editor.
    pub fn unmount(&mut self) {
        self.cancel_deferred();
        self.focused = false;
        log::debug!("editor unmounted");
    }

    fn cancel_deferred(&mut self) {
        self.history.cancel_pending();
        self.frames.cancel_all();
        self.refresh_queued = false;
        self.composition.cancel();
        self.drag.cancel();
    }

    // ==================== Caret refresh ====================

    fn schedule_refresh(&mut self) {
        if !self.refresh_queued {
            self.frames.schedule(FrameTask::RefreshCursor);
            self.refresh_queued = true;
        }
    }

    /// Rebuilds the caret and selection highlight from the selection.
    fn refresh_cursor_state(&mut self) {
        let selection = self.cursor.selection;
        let composing = self.is_composing();
        let blinking = !composing && !selection.has_selection() && !self.history.has_pending();
        self.cursor_state =
            CursorState::at_offset(&self.index, selection.cursor, self.focused, blinking);
        self.selection_highlight = if composing {
            None
        } else {
            SelectionHighlight::from_offsets(&self.index, selection.anchor, selection.cursor)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::HighlightKind;
    use crate::geometry::MonospaceMeasure;
    use crate::input::{Key, Modifiers};
    use crate::scheduler::ManualClock;
    use std::time::Duration;

    fn editor_with(text: &str) -> (Editor, ManualClock) {
        let clock = ManualClock::new();
        let editor = Editor::builder()
            .text(text)
            .measure(MonospaceMeasure::new(10.0))
            .viewport_size(Size::new(400.0, 105.0))
            .clock(clock.clone())
            .build()
            .unwrap();
        (editor, clock)
    }

    fn pause(clock: &ManualClock) {
        clock.advance(Duration::from_millis(400));
    }

    #[test]
    fn test_missing_measure_is_fatal() {
        let result = Editor::builder().text("x").build();
        assert_eq!(result.err(), Some(EditorError::MissingTextMeasurement));
    }

    #[test]
    fn test_insert_and_delete() {
        let (mut editor, _) = editor_with("");
        editor.insert_text("hello");
        assert_eq!(editor.text(), "hello");
        assert_eq!(editor.cursor_offset(), 5);

        editor.delete_backward();
        assert_eq!(editor.text(), "hell");

        editor.execute(EditorCommand::MoveLeft(false));
        editor.delete_forward();
        assert_eq!(editor.text(), "hel");
        assert!(editor.is_modified());
    }

    #[test]
    fn test_cursor_refresh_waits_for_frame() {
        let (mut editor, _) = editor_with("");
        editor.insert_text("ab\ncd");
        assert_eq!(editor.cursor_state().line, 1);
        assert_eq!(editor.pending_frame_tasks(), 1);

        editor.on_frame();
        let state = editor.cursor_state();
        assert_eq!((state.line, state.column), (2, 3));
        assert!(!state.blinking);
        assert_eq!(editor.pending_frame_tasks(), 0);
    }

    #[test]
    fn test_blinking_resumes_after_debounce() {
        let (mut editor, clock) = editor_with("");
        editor.insert_text("a");
        editor.on_frame();
        assert!(!editor.cursor_state().blinking);

        pause(&clock);
        assert!(editor.tick());
        assert!(editor.cursor_state().blinking);
        assert!(!editor.tick());
    }

    #[test]
    fn test_undo_restores_cursor_on_frame() {
        let (mut editor, clock) = editor_with("hello");
        editor.on_selection_change(5, 5);
        editor.insert_text(" world");
        pause(&clock);

        let restored = editor.undo().unwrap();
        assert_eq!(restored.text, "hello");
        assert_eq!(restored.cursor_offset, 5);
        assert_eq!(editor.text(), "hello");

        editor.on_frame();
        assert_eq!(editor.cursor_offset(), 5);

        let redone = editor.redo().unwrap();
        assert_eq!(redone.cursor_offset, 11);
        editor.on_frame();
        assert_eq!(editor.text(), "hello world");
        assert_eq!(editor.cursor_offset(), 11);
    }

    #[test]
    fn test_selection_change_builds_highlight() {
        let (mut editor, _) = editor_with("hello\nworld");
        editor.on_selection_change(8, 2);
        let highlight = editor.selection_highlight().unwrap();
        assert_eq!((highlight.start_line, highlight.start_column), (1, 3));
        assert_eq!((highlight.end_line, highlight.end_column), (2, 3));
        assert_eq!(editor.cursor_state().line, 1);
        assert_eq!(editor.highlights().len(), 1);

        editor.on_selection_change(4, 4);
        assert!(editor.selection_highlight().is_none());
    }

    #[test]
    fn test_composition_single_entry() {
        let (mut editor, clock) = editor_with("ab");
        editor.on_selection_change(2, 2);

        editor.composition_start();
        editor.composition_update("n", None);
        editor.composition_update("に", None);
        editor.composition_update("にほ", None);
        editor.insert_text("ん");
        assert_eq!(editor.text(), "ab");
        assert!(!editor.can_undo());
        assert_eq!(editor.composition().text, "にほん");

        assert!(editor.composition_end(Some("日本")));
        assert_eq!(editor.text(), "ab日本");
        assert_eq!(editor.cursor_offset(), 4);
        assert!(!editor.is_composing());

        pause(&clock);
        let restored = editor.undo().unwrap();
        assert_eq!(restored.text, "ab");
        assert_eq!(restored.cursor_offset, 2);
        assert!(!editor.can_undo());
    }

    #[test]
    fn test_composition_suppresses_selection_highlight() {
        let (mut editor, _) = editor_with("hello world");
        editor.on_selection_change(0, 5);
        assert!(editor.selection_highlight().is_some());

        editor.composition_start();
        editor.composition_update("ka", None);
        assert!(editor.selection_highlight().is_none());
        let highlights = editor.highlights();
        assert_eq!(highlights.len(), 1);
        assert_eq!(highlights[0].kind, HighlightKind::Composition);

        assert!(editor.composition_end(None));
        assert_eq!(editor.text(), "ka world");
    }

    #[test]
    fn test_composition_blocks_keys_and_history() {
        let (mut editor, _) = editor_with("");
        editor.composition_start();
        assert!(!editor.on_key(&KeyEvent::plain(Key::Character('x'))));
        assert!(editor.undo().is_none());
        assert!(!editor.on_text_change("typed", 5));
        editor.composition_cancel();
        assert!(!editor.is_composing());
        assert_eq!(editor.text(), "");
        assert!(!editor.can_undo());
    }

    #[test]
    fn test_edits_ignored_while_composing() {
        let (mut editor, _) = editor_with("abc");
        editor.on_selection_change(3, 3);
        editor.composition_start();
        editor.composition_update("ka", None);

        editor.delete_backward();
        editor.delete_forward();
        editor.execute(EditorCommand::DeleteBackward);
        editor.execute(EditorCommand::InsertChar('z'));
        editor.select_all();
        assert_eq!(editor.text(), "abc");
        assert!(!editor.can_undo());
        assert!(!editor.selection().has_selection());

        assert!(editor.composition_end(None));
        assert_eq!(editor.text(), "abcka");
        assert_eq!(editor.cursor_offset(), 5);
        assert_eq!(editor.undo().unwrap().text, "abc");
        assert!(!editor.can_undo());
    }

    #[test]
    fn test_edit_past_end_keeps_cursor_in_document() {
        let (mut editor, _) = editor_with("abc");
        editor.edit(10, 12, "x", EditKind::Discrete);
        assert_eq!(editor.text(), "abcx");
        assert_eq!(editor.cursor_offset(), 4);
        editor.on_frame();
        assert_eq!(editor.cursor_state().column, 5);
    }

    #[test]
    fn test_empty_commit_keeps_selection_text() {
        let (mut editor, _) = editor_with("keep me");
        editor.on_selection_change(0, 4);
        editor.composition_start();
        editor.composition_update("k", None);
        assert!(!editor.composition_end(Some("")));
        assert_eq!(editor.text(), "keep me");
        assert!(!editor.can_undo());
    }

    #[test]
    fn test_pointer_drag_selects_from_anchor() {
        let (mut editor, _) = editor_with("hello world\nsecond line");
        assert!(editor.on_pointer(PointerEvent::new(51.0, 5.0, PointerPhase::Down)));
        assert_eq!(editor.selection(), Selection::new(5));

        editor.on_pointer(PointerEvent::new(1.0, 5.0, PointerPhase::Move));
        assert_eq!(editor.selection().range(), (0, 5));
        editor.on_pointer(PointerEvent::new(31.0, 25.0, PointerPhase::Move));
        assert_eq!(editor.selection().range(), (5, 15));
        assert!(editor.is_dragging());

        editor.on_pointer(PointerEvent::new(21.0, 25.0, PointerPhase::Up));
        assert_eq!(editor.selection().range(), (5, 14));
        assert!(!editor.is_dragging());

        assert!(!editor.on_pointer(PointerEvent::new(91.0, 5.0, PointerPhase::Move)));
        editor.on_frame();
        assert_eq!(editor.selected_text(), Some(" world\nse".to_string()));
    }

    #[test]
    fn test_pointer_uses_scroll_offset() {
        let (mut editor, _) = editor_with(&"line\n".repeat(50));
        editor.on_scroll(Point::new(0.0, 210.0));
        editor.on_pointer(PointerEvent::new(0.0, 5.0, PointerPhase::Down));
        assert_eq!(editor.line_index().line_at_offset(editor.cursor_offset()), 10);
    }

    #[test]
    fn test_shift_click_extends() {
        let (mut editor, _) = editor_with("hello world");
        editor.on_selection_change(2, 2);
        editor.on_pointer(PointerEvent::new(81.0, 5.0, PointerPhase::Down).with_shift());
        assert_eq!(editor.selection(), Selection::with_range(2, 8));
    }

    #[test]
    fn test_keys_drive_commands() {
        let (mut editor, _) = editor_with("");
        for ch in "hi".chars() {
            editor.on_key(&KeyEvent::plain(Key::Character(ch)));
        }
        editor.on_key(&KeyEvent::plain(Key::Enter));
        assert_eq!(editor.text(), "hi\n");

        editor.on_key(&KeyEvent::new(Key::Character('a'), Modifiers::PRIMARY));
        assert_eq!(editor.selected_text(), Some("hi\n".to_string()));

        editor.on_key(&KeyEvent::plain(Key::Escape));
        assert_eq!(editor.selection(), Selection::new(3));

        editor.on_key(&KeyEvent::new(Key::Character('z'), Modifiers::PRIMARY));
        assert_eq!(editor.text(), "");
    }

    #[test]
    fn test_execute_command_returns_changed_document() {
        let (mut editor, _) = editor_with("make this bold");
        editor.on_selection_change(10, 14);
        assert_eq!(editor.execute_command("bold"), Some("make this **bold**".to_string()));
        assert_eq!(editor.selected_text(), Some("bold".to_string()));

        assert_eq!(editor.execute_command("sparkle"), None);

        let restored = editor.undo().unwrap();
        assert_eq!(restored.text, "make this bold");
    }

    #[test]
    fn test_execute_command_on_empty_document() {
        let (mut editor, _) = editor_with("");
        assert_eq!(editor.execute_command("code"), Some("``".to_string()));
    }

    #[test]
    fn test_cut_and_paste_are_discrete() {
        let (mut editor, _) = editor_with("abc");
        editor.on_selection_change(0, 3);
        assert_eq!(editor.cut(), Some("abc".to_string()));
        editor.paste("xyz");
        editor.paste("!");
        assert_eq!(editor.text(), "xyz!");

        assert_eq!(editor.undo().unwrap().text, "xyz");
        assert_eq!(editor.undo().unwrap().text, "");
        assert_eq!(editor.undo().unwrap().text, "abc");
    }

    #[test]
    fn test_line_geometry_follows_edits() {
        let (mut editor, _) = editor_with("a\nb\nc");
        editor.on_line_measured(2, 40.0);
        editor.on_selection_change(1, 1);
        editor.insert_text("\nnew");
        assert_eq!(editor.line_count(), 4);
        assert_eq!(editor.scroller().line_count(), 4);
        assert_eq!(editor.scroller().heights().get(3), 40.0);
        assert_eq!(editor.scroller().line_width(1), 30.0);

        editor.on_selection_change(0, 5);
        editor.delete_backward();
        assert_eq!(editor.text(), "\nb\nc");
        assert_eq!(editor.scroller().line_count(), 3);
        assert_eq!(editor.scroller().heights().get(2), 40.0);
    }

    #[test]
    fn test_stale_measurement_dropped() {
        let (mut editor, _) = editor_with("one\ntwo");
        assert!(!editor.on_line_measured(5, 30.0));
        assert!(editor.on_line_measured(1, 30.0));
        assert!(!editor.on_line_measured(1, 30.2));
    }

    #[test]
    fn test_scroll_controls() {
        let (mut editor, _) = editor_with(&"x\n".repeat(99));
        assert_eq!(editor.scroller().document_height(), 2100.0);

        editor.scroll_to_bottom();
        assert_eq!(editor.viewport().offset.y, 1995.0);
        let range = editor.visible_range();
        assert_eq!(range.end_index, 100);

        editor.scroll_to_top();
        assert_eq!(editor.visible_range().start_index, 0);

        assert_eq!(editor.scroll_to_index(50, ScrollAlign::Start), 1050.0);
        editor.on_scroll(Point::new(-4.0, 1e9));
        assert_eq!(editor.viewport().offset, Point::new(0.0, 1995.0));
    }

    #[test]
    fn test_keyboard_scrolls_to_cursor() {
        let (mut editor, _) = editor_with(&"x\n".repeat(99));
        editor.execute(EditorCommand::MoveToBufferEnd(false));
        assert_eq!(editor.viewport().offset.y, 1995.0);
        editor.execute(EditorCommand::MoveToBufferStart(false));
        assert_eq!(editor.viewport().offset.y, 0.0);
    }

    #[test]
    fn test_resize_cancels_frame_tasks_and_flushes() {
        let (mut editor, _) = editor_with("");
        editor.insert_text("a");
        assert_eq!(editor.pending_frame_tasks(), 1);
        assert!(editor.has_pending_history());

        editor.on_resize(Size::new(300.0, 300.0));
        assert_eq!(editor.pending_frame_tasks(), 0);
        assert!(!editor.has_pending_history());
        assert_eq!(editor.cursor_state().column, 2);
        assert_eq!(editor.undo().unwrap().text, "");
    }

    #[test]
    fn test_set_document_drops_pending_work() {
        let (mut editor, _) = editor_with("old");
        editor.insert_text("!");
        editor.composition_start();
        editor.set_document("fresh\ntext");

        assert_eq!(editor.pending_frame_tasks(), 0);
        assert!(!editor.can_undo());
        assert!(!editor.is_composing());
        assert!(!editor.is_modified());
        assert_eq!(editor.scroller().line_count(), 2);
        assert_eq!(editor.cursor_offset(), 0);
    }

    #[test]
    fn test_unmount_cancels() {
        let (mut editor, _) = editor_with("");
        editor.insert_text("a");
        editor.unmount();
        assert_eq!(editor.pending_frame_tasks(), 0);
        assert!(!editor.can_undo());
        assert!(!editor.cursor_state().visible);
    }

    #[test]
    fn test_cursor_and_selection_rects() {
        let (mut editor, _) = editor_with("hello\nworld");
        editor.on_selection_change(2, 8);
        let caret = editor.cursor_rect();
        assert_eq!((caret.x, caret.y), (20.0, 21.0));

        let rects = editor.selection_rects();
        assert_eq!(rects.len(), 2);
        assert_eq!((rects[0].x, rects[0].width), (20.0, 30.0));
        assert_eq!((rects[1].x, rects[1].width), (0.0, 20.0));
    }

    #[test]
    fn test_host_text_change_is_debounced() {
        let (mut editor, clock) = editor_with("");
        assert!(editor.on_text_change("a", 1));
        assert!(editor.on_text_change("ab", 2));
        assert!(!editor.on_text_change("ab", 2));
        pause(&clock);
        assert!(editor.on_text_change("ab\nc", 4));
        assert_eq!(editor.line_count(), 2);

        assert_eq!(editor.undo().unwrap().text, "ab");
        assert_eq!(editor.undo().unwrap().text, "");
    }
}
