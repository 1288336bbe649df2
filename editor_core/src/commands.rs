//! Named formatting commands applied over the selection.

use crate::cursor::Selection;
use crate::line_index::LineIndex;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A formatting command that can be run by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandId {
    Bold,
    Italic,
    Strikethrough,
    Code,
    Link,
}

impl CommandId {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandId::Bold => "bold",
            CommandId::Italic => "italic",
            CommandId::Strikethrough => "strikethrough",
            CommandId::Code => "code",
            CommandId::Link => "link",
        }
    }

    /// Opening and closing markers.
    fn markers(&self) -> (&'static str, &'static str) {
        match self {
            CommandId::Bold => ("**", "**"),
            CommandId::Italic => ("_", "_"),
            CommandId::Strikethrough => ("~~", "~~"),
            CommandId::Code => ("`", "`"),
            CommandId::Link => ("[", "]()"),
        }
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing an id that names no command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown command '{0}'")]
pub struct UnknownCommand(pub String);

impl FromStr for CommandId {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bold" => Ok(CommandId::Bold),
            "italic" => Ok(CommandId::Italic),
            "strikethrough" | "strike" => Ok(CommandId::Strikethrough),
            "code" => Ok(CommandId::Code),
            "link" => Ok(CommandId::Link),
            _ => Err(UnknownCommand(s.to_string())),
        }
    }
}

/// A replacement produced by a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEdit {
    pub start: usize,
    pub end: usize,
    pub text: String,
    /// Selection after the edit is applied.
    pub selection: Selection,
}

/// Computes the edit for `command` over `selection`.
///
/// Wrapping toggles: a range already surrounded by (or starting and ending
/// with) the command's markers is unwrapped instead. With no selection the
/// word under the caret is used, or an empty marker pair is inserted.
pub fn apply(command: CommandId, index: &LineIndex, selection: Selection) -> CommandEdit {
    let (open, close) = command.markers();
    let (open_len, close_len) = (open.chars().count(), close.chars().count());

    let (start, end) = match selection.selected_range() {
        Some(range) => range,
        None => index
            .word_at(selection.cursor)
            .unwrap_or((selection.cursor, selection.cursor)),
    };
    let inner = index.slice(start, end);

    let outer_start = start.saturating_sub(open_len);
    if start >= open_len
        && index.slice(outer_start, start) == open
        && index.slice(end, end + close_len) == close
    {
        return CommandEdit {
            start: outer_start,
            end: end + close_len,
            text: inner,
            selection: Selection::with_range(outer_start, end - open_len),
        };
    }

    let inner_len = end - start;
    if inner_len >= open_len + close_len && inner.starts_with(open) && inner.ends_with(close) {
        let unwrapped: String = inner
            .chars()
            .skip(open_len)
            .take(inner_len - open_len - close_len)
            .collect();
        let new_end = start + unwrapped.chars().count();
        return CommandEdit {
            start,
            end,
            text: unwrapped,
            selection: Selection::with_range(start, new_end),
        };
    }

    CommandEdit {
        start,
        end,
        text: format!("{open}{inner}{close}"),
        selection: Selection::with_range(start + open_len, end + open_len),
    }
}
