//! Text storage and coordinate conversion.
//!
//! [`TextBuffer`] keeps the text and its [`LineIndex`] consistent across replacements and
//! converts between positions, byte offsets and points.

use std::cell::Cell;
use std::ops;

use tracing::{debug, trace};

use crate::error::CoordinateError;
use crate::line_index::LineIndex;
use crate::position::{Point, Position, TextChange};

/// The rightmost column walk performed on a line, reused by the next lookup on the same line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LineOffsetColumn {
    line: usize,
    offset: usize,
    column: usize,
}

/// Byte offsets and points describing one applied replacement.
///
/// This is exactly the information an incremental parser needs to shift its tree
/// (`tree_sitter::InputEdit` has the same fields).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedEdit {
    /// Byte offset where the replaced span starts.
    pub start_byte: usize,
    /// End of the replaced span in the old text.
    pub old_end_byte: usize,
    /// End of the inserted text in the new text.
    pub new_end_byte: usize,
    /// Point of `start_byte` (same before and after the edit).
    pub start_point: Point,
    /// Point of `old_end_byte` in the old text.
    pub old_end_point: Point,
    /// Point of `new_end_byte` in the new text.
    pub new_end_point: Point,
}

/// A document's text plus its line index.
///
/// Conversions take `&self`; the single-entry column cache lives in a [`Cell`], so a buffer can
/// be shared by reference within one thread but is not `Sync`.
#[derive(Debug, Clone)]
pub struct TextBuffer {
    text: Vec<u8>,
    lines: LineIndex,
    last_line_offset: Cell<Option<LineOffsetColumn>>,
}

impl TextBuffer {
    /// Create a buffer from an initial text snapshot.
    pub fn new(text: impl Into<Vec<u8>>) -> Self {
        let text = text.into();
        let lines = LineIndex::from_text(&text);
        Self {
            text,
            lines,
            last_line_offset: Cell::new(None),
        }
    }

    /// Raw text bytes.
    pub fn text(&self) -> &[u8] {
        &self.text
    }

    /// The text as `&str`, failing if it is not valid UTF-8.
    pub fn as_str(&self) -> Result<&str, CoordinateError> {
        std::str::from_utf8(&self.text).map_err(|e| CoordinateError::Decode {
            offset: e.valid_up_to(),
        })
    }

    /// Total length in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Returns `true` if the text is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// The line index.
    pub fn line_index(&self) -> &LineIndex {
        &self.lines
    }

    /// Number of lines (`1 + number of '\n'`).
    pub fn line_count(&self) -> usize {
        self.lines.line_count()
    }

    /// Replace the whole text.
    pub fn set_text(&mut self, text: impl Into<Vec<u8>>) {
        self.text = text.into();
        self.rebuild_lines();
    }

    fn rebuild_lines(&mut self) {
        self.lines.rebuild(&self.text);
        self.last_line_offset.set(None);
    }

    /// Replace the byte span `range` with `replacement` and rebuild the line index.
    pub fn replace(
        &mut self,
        range: ops::Range<usize>,
        replacement: &str,
    ) -> Result<(), CoordinateError> {
        if range.end > self.text.len() || range.start > range.end {
            return Err(CoordinateError::ByteIndexOutOfRange {
                index: range.end.max(range.start),
                max: self.text.len(),
            });
        }

        self.text.splice(range, replacement.bytes());
        self.rebuild_lines();
        Ok(())
    }

    /// Apply a single-range replacement expressed in positions.
    ///
    /// Start and end are resolved against the pre-edit text; the new end point is resolved
    /// against the post-edit text. On error nothing is modified.
    pub fn apply_change(&mut self, change: &TextChange) -> Result<AppliedEdit, CoordinateError> {
        let start = change.range.start;
        let end = change.range.end;

        let start_byte = self.position_to_byte_offset(start)?;
        let old_end_byte = self.position_to_byte_offset(end)?;
        let start_point = self.point_in_line(start.line as usize, start_byte);
        let old_end_point = self.point_in_line(end.line as usize, old_end_byte);

        self.replace(start_byte..old_end_byte, &change.text)?;

        let new_end_byte = start_byte + change.text.len();
        let new_end_point = self.byte_offset_to_point(new_end_byte)?;

        debug!(
            start_byte,
            old_end_byte,
            new_end_byte,
            lines = self.lines.line_count(),
            "applied text change"
        );

        Ok(AppliedEdit {
            start_byte,
            old_end_byte,
            new_end_byte,
            start_point,
            old_end_point,
            new_end_point,
        })
    }

    /// `(min, max)` byte bounds of `line`; `max` is the offset of its terminator, or the text
    /// length for the last line.
    pub fn line_bounds(&self, line: usize) -> Result<(usize, usize), CoordinateError> {
        self.lines
            .line_bounds(line, self.text.len())
            .ok_or(CoordinateError::LineOutOfRange {
                line,
                line_count: self.lines.line_count(),
            })
    }

    fn point_in_line(&self, line: usize, offset: usize) -> Point {
        let start = self.lines.line_start(line).unwrap_or(0);
        Point::new(line, offset - start)
    }

    fn decode_at(&self, offset: usize) -> Result<(char, usize), CoordinateError> {
        decode_scalar(&self.text[offset..]).ok_or(CoordinateError::Decode { offset })
    }

    /// Convert a position to an absolute byte offset.
    ///
    /// Column 0 of the last line is always valid, including the empty line that follows a
    /// trailing `\n`.
    pub fn position_to_byte_offset(&self, position: Position) -> Result<usize, CoordinateError> {
        let line = position.line as usize;
        let target = position.character as usize;
        let (mut offset, max) = self.line_bounds(line)?;
        let mut character = 0;

        while character < target {
            if offset >= max {
                return Err(CoordinateError::CharacterOutOfRange {
                    line,
                    character: target,
                    available: character,
                });
            }

            let (_, size) = self.decode_at(offset)?;
            offset += size;
            character += 1;
        }

        Ok(offset)
    }

    /// The line owning byte `offset`.
    pub fn byte_offset_line(&self, offset: usize) -> Result<usize, CoordinateError> {
        if offset > self.text.len() {
            return Err(CoordinateError::ByteIndexOutOfRange {
                index: offset,
                max: self.text.len(),
            });
        }

        Ok(self.lines.line_of_offset(offset))
    }

    /// Convert an absolute byte offset to a position.
    pub fn byte_offset_to_position(&self, offset: usize) -> Result<Position, CoordinateError> {
        let line = self.byte_offset_line(offset)?;
        let start = self.lines.starts()[line];
        self.line_byte_offset_to_position(line, offset - start)
    }

    /// Convert an absolute byte offset to a point.
    pub fn byte_offset_to_point(&self, offset: usize) -> Result<Point, CoordinateError> {
        let line = self.byte_offset_line(offset)?;
        Ok(self.point_in_line(line, offset))
    }

    /// Convert a byte offset within `line` to a position.
    ///
    /// An offset inside a multi-byte scalar value rounds up to the next scalar boundary.
    /// Walks resume from the previous lookup when it was on the same line and not past the
    /// target, so ascending lookups are cheap.
    pub fn line_byte_offset_to_position(
        &self,
        line: usize,
        byte_in_line: usize,
    ) -> Result<Position, CoordinateError> {
        let (start, max) = self.line_bounds(line)?;
        let out_of_range = CoordinateError::ByteIndexOutOfRange {
            index: byte_in_line,
            max: max - start,
        };
        let target = start.checked_add(byte_in_line).ok_or(out_of_range.clone())?;

        let (mut offset, mut column) = match self.last_line_offset.get() {
            Some(last) if last.line == line && last.offset <= target => {
                trace!(line, from = last.offset, to = target, "resuming column walk");
                (last.offset, last.column)
            }
            _ => (start, 0),
        };

        while offset < target {
            if offset >= max {
                return Err(out_of_range);
            }

            let (_, size) = self.decode_at(offset)?;
            offset += size;
            column += 1;

            if offset > max {
                return Err(out_of_range);
            }
        }

        self.last_line_offset.set(Some(LineOffsetColumn {
            line,
            offset,
            column,
        }));

        Ok(Position::new(line as u32, column as u32))
    }

    /// Convert a point to a position.
    pub fn point_to_position(&self, point: Point) -> Result<Position, CoordinateError> {
        self.line_byte_offset_to_position(point.row, point.column)
    }

    /// Convert a position to a point.
    pub fn position_to_point(&self, position: Position) -> Result<Point, CoordinateError> {
        let offset = self.position_to_byte_offset(position)?;
        Ok(self.point_in_line(position.line as usize, offset))
    }

    /// The run of non-space text around `position` on its line.
    ///
    /// Extends left and right from the position until a `' '` or the line bounds.
    pub fn word_at_position(&self, position: Position) -> Result<&str, CoordinateError> {
        let cursor = self.position_to_byte_offset(position)?;
        let (min, max) = self.line_bounds(position.line as usize)?;

        let mut start = cursor;
        while start > min {
            let (ch, size) = decode_last_scalar(&self.text[min..start])
                .ok_or(CoordinateError::Decode { offset: start - 1 })?;
            if ch == ' ' {
                break;
            }
            start -= size;
        }

        let mut end = cursor;
        while end < max {
            let (ch, size) = decode_scalar(&self.text[end..max])
                .ok_or(CoordinateError::Decode { offset: end })?;
            if ch == ' ' {
                break;
            }
            end += size;
        }

        std::str::from_utf8(&self.text[start..end]).map_err(|e| CoordinateError::Decode {
            offset: start + e.valid_up_to(),
        })
    }
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// Decode the first scalar value of `bytes`, returning it with its encoded length.
fn decode_scalar(bytes: &[u8]) -> Option<(char, usize)> {
    let head = &bytes[..bytes.len().min(4)];
    let valid = match std::str::from_utf8(head) {
        Ok(s) => s,
        Err(e) => std::str::from_utf8(&head[..e.valid_up_to()]).ok()?,
    };
    valid.chars().next().map(|ch| (ch, ch.len_utf8()))
}

/// Decode the last scalar value of `bytes`, returning it with its encoded length.
fn decode_last_scalar(bytes: &[u8]) -> Option<(char, usize)> {
    // The shortest valid suffix is exactly the last scalar value.
    (1..=bytes.len().min(4)).find_map(|len| {
        let suffix = std::str::from_utf8(&bytes[bytes.len() - len..]).ok()?;
        suffix.chars().next().map(|ch| (ch, len))
    })
}
