//! Protocol value types.
//!
//! [`Position`], [`Range`] and [`TextChange`] have the same JSON shape as the editor protocol's
//! `Position`, `Range` and `TextDocumentContentChangeEvent`, so a transport layer can
//! deserialize them directly. Note that `character` counts Unicode scalar values, not UTF-16
//! code units.

use serde::{Deserialize, Serialize};

/// A `(line, character)` address. Both are 0-based; `character` counts Unicode scalar values.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Position {
    /// Line number.
    pub line: u32,
    /// Scalar value offset within the line.
    pub character: u32,
}

impl Position {
    /// Create a new position.
    pub const fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// A half-open `[start, end)` range of positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Range {
    /// Range start (inclusive).
    pub start: Position,
    /// Range end (exclusive).
    pub end: Position,
}

impl Range {
    /// Create a new range.
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Create a range from raw line/character pairs.
    pub const fn from_coords(
        start_line: u32,
        start_character: u32,
        end_line: u32,
        end_character: u32,
    ) -> Self {
        Self {
            start: Position::new(start_line, start_character),
            end: Position::new(end_line, end_character),
        }
    }

    /// A zero-width range at `position` (a cursor).
    pub const fn at(position: Position) -> Self {
        Self {
            start: position,
            end: position,
        }
    }

    /// Returns `true` if start and end coincide.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A syntax-tree address: `column` is a **byte** offset within `row`.
///
/// Ordering is row-major, matching document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Point {
    /// Row (line) number.
    pub row: usize,
    /// Byte offset within the row.
    pub column: usize,
}

impl Point {
    /// Create a new point.
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

/// A single-range replacement, as delivered by incremental document sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChange {
    /// Range being replaced, in pre-edit coordinates.
    pub range: Range,
    /// Replacement text.
    pub text: String,
}

impl TextChange {
    /// Create a new change.
    pub fn new(range: Range, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
        }
    }

    /// A pure insertion at `position`.
    pub fn insert(position: Position, text: impl Into<String>) -> Self {
        Self::new(Range::at(position), text)
    }
}
