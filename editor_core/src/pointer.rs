//! Pointer-driven text selection.

use crate::cursor::Selection;
use crate::viewport::Point;

/// Phase of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
}

/// A raw pointer event in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub position: Point,
    pub phase: PointerPhase,
    /// Extend the existing selection instead of starting a new one.
    pub shift: bool,
}

impl PointerEvent {
    pub fn new(x: f64, y: f64, phase: PointerPhase) -> Self {
        Self {
            position: Point::new(x, y),
            phase,
            shift: false,
        }
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }
}

/// Drag tracking. The anchor is fixed at pointer-down; every move measures
/// against it rather than against the previous frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointerDrag {
    anchor: Option<usize>,
}

impl PointerDrag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the drag anchor while a drag is active.
    pub fn anchor(&self) -> Option<usize> {
        self.anchor
    }

    pub fn is_dragging(&self) -> bool {
        self.anchor.is_some()
    }

    /// Starts a drag at `offset` and returns the resulting selection.
    pub fn down(&mut self, offset: usize) -> Selection {
        self.anchor = Some(offset);
        Selection::new(offset)
    }

    /// Starts a drag from an existing anchor (shift-click).
    pub fn down_extending(&mut self, anchor: usize, offset: usize) -> Selection {
        self.anchor = Some(anchor);
        Selection::with_range(anchor, offset)
    }

    /// Returns the selection for the pointer at `offset`, or None outside a
    /// drag.
    pub fn move_to(&self, offset: usize) -> Option<Selection> {
        self.anchor.map(|anchor| Selection::with_range(anchor, offset))
    }

    /// Ends the drag, returning the final selection.
    pub fn up(&mut self, offset: usize) -> Option<Selection> {
        let selection = self.move_to(offset);
        self.anchor = None;
        selection
    }

    /// Forgets the drag without producing a selection.
    pub fn cancel(&mut self) {
        self.anchor = None;
    }
}
