#![warn(missing_docs)]
//! `textdoc-treesitter` - Tree-sitter synchronized documents for `textdoc`.
//!
//! A [`Document`] keeps a [`textdoc::TextBuffer`] and a `tree_sitter::Tree` consistent across
//! single-range replacements, answers "which nodes does this range touch" queries, and keeps a
//! highlight capture index that can be encoded into the relative semantic-token stream.
//!
//! ```rust
//! use textdoc::{Range, TextChange};
//! use textdoc_treesitter::{Document, HighlightConfig, TokenType, parser_for};
//!
//! let language: tree_sitter::Language = tree_sitter_rust::LANGUAGE.into();
//! let mut doc = Document::new("fn a() {}");
//! doc.set_parser(parser_for(&language).unwrap()).unwrap();
//! doc.set_highlight_query(HighlightConfig::new(&language, "(identifier) @variable").unwrap());
//!
//! doc.apply_change(&TextChange::new(Range::from_coords(0, 3, 0, 4), "abc")).unwrap();
//!
//! let legend = [TokenType::new(8, 0)];
//! assert_eq!(doc.encode_highlights(&legend).unwrap(), vec![0, 3, 3, 8, 0]);
//! ```

mod document;
mod error;
mod highlight;
mod parser;
mod query;
mod tokens;

pub use document::{Document, DocumentConfig, ReparsePolicy, UpdateMode};
pub use error::{DocumentError, ParseError};
pub use highlight::{
    ClosestCaptures, HighlightCapture, HighlightConfig, HighlightIndex, IgnoreFilter,
};
pub use parser::{CancellationFlag, SyntaxParser, parser_for};
pub use query::{NodeRelation, Span, classify, select_nodes};
pub use tokens::{Legend, Token, TokenType, bit_mask, encode_tokens};
