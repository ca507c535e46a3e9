#![warn(missing_docs)]
//! `textdoc` - a headless text document for editor-protocol servers.
//!
//! # Overview
//!
//! A [`TextBuffer`] owns the raw text of one document together with a [`LineIndex`] of line
//! start offsets, and converts between the three addressing schemes used around a language
//! server:
//!
//! - [`Position`]: `(line, character)`, where `character` counts Unicode scalar values
//! - byte offset: absolute offset in bytes from the start of the text
//! - [`Point`]: `(row, column)`, where `column` is a byte offset within the row (syntax trees)
//!
//! Byte → position conversions remember the last column walk, so ascending access patterns
//! (token encoding, highlight streaming) cost O(1) per adjacent query instead of rescanning the
//! line.
//!
//! # Quick Start
//!
//! ```rust
//! use textdoc::{Position, Range, TextBuffer, TextChange};
//!
//! let mut buffer = TextBuffer::new("⌘sd\nqwer\n⌘xc");
//!
//! assert_eq!(buffer.position_to_byte_offset(Position::new(0, 2)).unwrap(), 4);
//! assert_eq!(buffer.byte_offset_to_position(16).unwrap(), Position::new(2, 3));
//!
//! buffer
//!     .apply_change(&TextChange::new(Range::from_coords(0, 0, 2, 1), "TEST"))
//!     .unwrap();
//! assert_eq!(buffer.text(), b"TESTxc");
//! ```
//!
//! # Module Description
//!
//! - [`line_index`] - line start offsets
//! - [`buffer`] - text storage, coordinate conversion and single-range replacement
//! - [`position`] - protocol value types (positions, ranges, points, change events)
//! - [`error`] - coordinate errors

pub mod buffer;
pub mod error;
pub mod line_index;
pub mod position;

pub use buffer::{AppliedEdit, TextBuffer};
pub use error::CoordinateError;
pub use line_index::LineIndex;
pub use position::{Point, Position, Range, TextChange};
