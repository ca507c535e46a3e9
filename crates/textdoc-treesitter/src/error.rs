use textdoc::CoordinateError;
use thiserror::Error;

/// Errors reported by a [`SyntaxParser`](crate::SyntaxParser).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("parser produced no tree")]
    /// The parser returned no tree (no language set, or it gave up).
    Failed,

    #[error("parse was cancelled")]
    /// The caller's [`CancellationFlag`](crate::CancellationFlag) was raised.
    Cancelled,

    #[error("tree-sitter language error: {0}")]
    /// Setting the parser language failed.
    Language(String),
}

/// Errors produced by [`Document`](crate::Document) operations.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error(transparent)]
    /// A coordinate did not fit the document.
    Coordinate(#[from] CoordinateError),

    #[error(transparent)]
    /// Re-parsing failed; the previous tree was kept.
    Parse(#[from] ParseError),

    #[error("tree-sitter query error: {0}")]
    /// Compiling a highlight query failed.
    Query(String),

    #[error("capture category {index} has no legend entry ({legend_len} entries)")]
    /// The legend is shorter than the highlight query's capture list.
    UnknownCategory {
        /// Capture category index.
        index: u32,
        /// Number of legend entries supplied.
        legend_len: usize,
    },
}
