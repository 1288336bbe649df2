//! Keyboard events and key mapping.

use crate::commands::CommandId;

/// Keys the editor reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Character(char),
    Enter,
    Backspace,
    Delete,
    Tab,
    Escape,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    PageUp,
    PageDown,
}

/// Modifier state at the time of a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    /// Ctrl, or Cmd on macOS.
    pub primary: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        primary: false,
        alt: false,
    };
    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        primary: false,
        alt: false,
    };
    pub const PRIMARY: Modifiers = Modifiers {
        shift: false,
        primary: true,
        alt: false,
    };
    pub const PRIMARY_SHIFT: Modifiers = Modifiers {
        shift: true,
        primary: true,
        alt: false,
    };
}

/// A raw key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    pub fn plain(key: Key) -> Self {
        Self::new(key, Modifiers::NONE)
    }
}

/// Represents an editor command.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorCommand {
    // Text input
    InsertChar(char),
    InsertNewline,

    // Deletion
    DeleteBackward,
    DeleteForward,

    // Cursor movement; the flag extends the selection
    MoveLeft(bool),
    MoveRight(bool),
    MoveWordLeft(bool),
    MoveWordRight(bool),
    MoveUp(bool),
    MoveDown(bool),
    MoveToLineStart(bool),
    MoveToLineEnd(bool),
    MovePageUp(bool),
    MovePageDown(bool),
    MoveToBufferStart(bool),
    MoveToBufferEnd(bool),

    // Selection
    SelectAll,
    ClearSelection,

    // Undo/Redo
    Undo,
    Redo,

    // Named formatting
    Format(CommandId),
}

/// Maps a key press to a command.
pub fn map_key(event: &KeyEvent) -> Option<EditorCommand> {
    let Modifiers {
        shift,
        primary,
        alt,
    } = event.modifiers;
    let word = alt || primary;

    match &event.key {
        Key::Enter => Some(EditorCommand::InsertNewline),
        Key::Backspace => Some(EditorCommand::DeleteBackward),
        Key::Delete => Some(EditorCommand::DeleteForward),
        Key::Tab => Some(EditorCommand::InsertChar('\t')),
        Key::Escape => Some(EditorCommand::ClearSelection),
        Key::ArrowLeft if word => Some(EditorCommand::MoveWordLeft(shift)),
        Key::ArrowLeft => Some(EditorCommand::MoveLeft(shift)),
        Key::ArrowRight if word => Some(EditorCommand::MoveWordRight(shift)),
        Key::ArrowRight => Some(EditorCommand::MoveRight(shift)),
        Key::ArrowUp => Some(EditorCommand::MoveUp(shift)),
        Key::ArrowDown => Some(EditorCommand::MoveDown(shift)),
        Key::Home if primary => Some(EditorCommand::MoveToBufferStart(shift)),
        Key::Home => Some(EditorCommand::MoveToLineStart(shift)),
        Key::End if primary => Some(EditorCommand::MoveToBufferEnd(shift)),
        Key::End => Some(EditorCommand::MoveToLineEnd(shift)),
        Key::PageUp => Some(EditorCommand::MovePageUp(shift)),
        Key::PageDown => Some(EditorCommand::MovePageDown(shift)),

        // Character shortcuts
        Key::Character(ch) if primary => match ch.to_ascii_lowercase() {
            'z' if shift => Some(EditorCommand::Redo),
            'z' => Some(EditorCommand::Undo),
            'y' => Some(EditorCommand::Redo),
            'a' => Some(EditorCommand::SelectAll),
            'b' => Some(EditorCommand::Format(CommandId::Bold)),
            'i' => Some(EditorCommand::Format(CommandId::Italic)),
            'e' => Some(EditorCommand::Format(CommandId::Code)),
            'k' => Some(EditorCommand::Format(CommandId::Link)),
            'x' if shift => Some(EditorCommand::Format(CommandId::Strikethrough)),
            _ => None,
        },
        Key::Character(ch) if ch.is_control() => None,
        Key::Character(ch) => Some(EditorCommand::InsertChar(*ch)),
    }
}
