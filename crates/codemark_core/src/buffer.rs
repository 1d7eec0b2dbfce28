//! Rope-backed document snapshots addressed by line/character positions.

use crate::models::{Position, Range};
use crate::reconcile::{DocumentText, TextEdit};
use ropey::Rope;

/// Document text used for reading highlight snapshots and applying edits.
///
/// Characters are Unicode scalar values; positions past the end of a line
/// clamp to the line end, and lines past the end of the document clamp to
/// the document end.
#[derive(Debug, Clone, Default)]
pub struct TextBuffer {
    rope: Rope,
}

impl TextBuffer {
    /// Create a buffer from UTF-8 text.
    pub fn new(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    /// Returns the character length of a line without trailing `\r?\n`.
    fn line_len_chars(&self, line: usize) -> usize {
        if line >= self.rope.len_lines() {
            return 0;
        }
        let line_slice = self.rope.line(line);
        let mut len = line_slice.len_chars();
        if len == 0 {
            return 0;
        }
        let last_char = line_slice.char(len - 1);
        if last_char == '\n' {
            len -= 1;
            if len > 0 && line_slice.char(len - 1) == '\r' {
                len -= 1;
            }
        } else if last_char == '\r' {
            len -= 1;
        }
        len
    }

    /// Convert a position into a global char index.
    fn char_index(&self, position: Position) -> usize {
        let line = position.line as usize;
        if line >= self.rope.len_lines() {
            return self.rope.len_chars();
        }
        let line_start = self.rope.line_to_char(line);
        line_start + (position.character as usize).min(self.line_len_chars(line))
    }

    /// Replace `edit.range` with `edit.text`.
    ///
    /// # Returns
    /// `false` when the edit was a no-op (empty range and empty text).
    pub fn apply(&mut self, edit: &TextEdit) -> bool {
        let start = self.char_index(edit.range.start);
        let end = self.char_index(edit.range.end).max(start);
        if start == end && edit.text.is_empty() {
            return false;
        }
        if start < end {
            self.rope.remove(start..end);
        }
        if !edit.text.is_empty() {
            self.rope.insert(start, &edit.text);
        }
        true
    }
}

impl DocumentText for TextBuffer {
    fn text_in(&self, range: &Range) -> String {
        let start = self.char_index(range.start);
        let end = self.char_index(range.end);
        if start >= end {
            return String::new();
        }
        self.rope.slice(start..end).to_string()
    }
}

impl std::fmt::Display for TextBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for chunk in self.rope.chunks() {
            f.write_str(chunk)?;
        }
        Ok(())
    }
}
