//! Editor Core - Virtualized text editing engine.
//!
//! This crate contains the editor's state and behavior without any
//! dependency on a windowing or rendering system. The host measures text,
//! paints the lines returned by [`Editor::visible_range`] and forwards
//! input, timer and paint events back to the [`Editor`].

pub mod commands;
pub mod composition;
pub mod config;
pub mod cursor;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod history;
pub mod input;
pub mod line_height;
pub mod line_index;
pub mod pointer;
pub mod scheduler;
pub mod viewport;

pub use commands::CommandId;
pub use composition::Composition;
pub use config::EditorConfig;
pub use cursor::{Cursor, CursorState, HighlightKind, HighlightRange, Selection, SelectionHighlight};
pub use editor::{Editor, EditorBuilder, FrameTask};
pub use error::{EditorError, EditorResult};
pub use geometry::{MonospaceMeasure, Rect, TextMeasure};
pub use history::{History, Restored};
pub use input::{EditorCommand, Key, KeyEvent, Modifiers};
pub use line_height::LineHeightIndex;
pub use line_index::LineIndex;
pub use pointer::{PointerEvent, PointerPhase};
pub use scheduler::{Clock, ManualClock, SystemClock};
pub use viewport::{
    Point, ScrollAlign, Size, Viewport, ViewportScroller, Visibility, VisibleLineItem,
    VisibleLineRange,
};
