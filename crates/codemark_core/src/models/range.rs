//! Line/character positions and half-open ranges.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A 0-based `(line, character)` location. Ordering is lexicographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub const fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.character)
    }
}

/// Half-open span `[start, end)` between two positions.
///
/// `start <= end` always holds for ranges built through [`Range::new`].
/// Deserialized ranges are checked with [`Range::is_ordered`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    /// Build a range, swapping the endpoints when given in reverse order.
    pub fn new(a: Position, b: Position) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    /// Shorthand for `Range::new(Position::new(..), Position::new(..))`.
    pub fn from_coords(start_line: u32, start_char: u32, end_line: u32, end_char: u32) -> Self {
        Self::new(
            Position::new(start_line, start_char),
            Position::new(end_line, end_char),
        )
    }

    /// Collapsed range at `at`.
    pub const fn empty(at: Position) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn is_ordered(&self) -> bool {
        self.start <= self.end
    }

    /// Number of line breaks the range spans (`0` for a single-line range).
    pub fn line_span(&self) -> u32 {
        self.end.line.saturating_sub(self.start.line)
    }

    /// `start <= point < end`.
    pub fn contains(&self, point: Position) -> bool {
        self.start <= point && point < self.end
    }

    /// True when both ranges share at least one position.
    ///
    /// Ranges that only touch at a boundary do not intersect.
    pub fn intersects(&self, other: &Range) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Move every endpoint on or below `after_line` by `delta` lines.
    ///
    /// Line numbers saturate at zero and at `u32::MAX`.
    pub fn shift_lines(&mut self, delta: i64, after_line: u32) {
        for position in [&mut self.start, &mut self.end] {
            if position.line >= after_line {
                position.line = shift_line(position.line, delta);
            }
        }
    }
}

fn shift_line(line: u32, delta: i64) -> u32 {
    let shifted = i64::from(line).saturating_add(delta);
    shifted.clamp(0, i64::from(u32::MAX)) as u32
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Error returned when parsing `line:col` or `line:col-line:col` text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind} '{input}': expected {expected}")]
pub struct ParseRangeError {
    kind: &'static str,
    input: String,
    expected: &'static str,
}

impl FromStr for Position {
    type Err = ParseRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseRangeError {
            kind: "position",
            input: s.to_string(),
            expected: "LINE:COL",
        };
        let (line, character) = s.trim().split_once(':').ok_or_else(err)?;
        Ok(Self {
            line: line.trim().parse().map_err(|_| err())?,
            character: character.trim().parse().map_err(|_| err())?,
        })
    }
}

impl FromStr for Range {
    type Err = ParseRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseRangeError {
            kind: "range",
            input: s.to_string(),
            expected: "LINE:COL-LINE:COL",
        };
        let (start, end) = s.trim().split_once('-').ok_or_else(err)?;
        let start: Position = start.parse().map_err(|_| err())?;
        let end: Position = end.parse().map_err(|_| err())?;
        Ok(Self::new(start, end))
    }
}
