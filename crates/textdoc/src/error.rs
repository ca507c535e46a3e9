//! Coordinate conversion errors.

use thiserror::Error;

/// Errors produced when a coordinate does not fit the document's current shape.
///
/// None of these mutate the document; they are returned to the immediate caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinateError {
    #[error("line {line} is out of range ({line_count} lines)")]
    /// The line does not exist.
    LineOutOfRange {
        /// Requested line.
        line: usize,
        /// Number of lines in the document.
        line_count: usize,
    },

    #[error("character {character} is out of range ({available}) for line {line}")]
    /// The line is shorter than the requested character count.
    CharacterOutOfRange {
        /// Line being walked.
        line: usize,
        /// Requested character (Unicode scalar value) count.
        character: usize,
        /// Characters actually available on the line.
        available: usize,
    },

    #[error("byte index {index} is out of range ({max})")]
    /// A byte offset lies past the end of the document or of its line.
    ///
    /// For line-relative lookups both values are relative to the line start.
    ByteIndexOutOfRange {
        /// Requested byte offset.
        index: usize,
        /// Largest valid offset.
        max: usize,
    },

    #[error("invalid UTF-8 sequence at byte {offset}")]
    /// The text could not be decoded while walking it. Treat as data corruption.
    Decode {
        /// Absolute byte offset of the undecodable sequence.
        offset: usize,
    },
}
