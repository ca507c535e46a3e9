//! Logical line index.
//!
//! Stores the byte offset at which every line starts. Lines are split at `\n` only; a `\r`
//! before it is treated as ordinary line content.

use memchr::memchr_iter;

/// Line start offsets for a text.
///
/// Invariants:
/// - there is always at least one line, and line 0 starts at offset 0
/// - starts are strictly increasing
/// - `start(i + 1) - start(i) - 1` is the byte length of line `i` (without its `\n`)
/// - the last line has no terminator; its upper bound is the text length
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    /// Index of an empty text (one empty line).
    pub fn new() -> Self {
        Self { starts: vec![0] }
    }

    /// Build an index by scanning `text` once.
    pub fn from_text(text: &[u8]) -> Self {
        let mut index = Self::new();
        index.rebuild(text);
        index
    }

    /// Recompute all line starts from `text`.
    ///
    /// A trailing `\n` produces a final empty line, so the line count is always
    /// `1 + number of terminators`.
    pub fn rebuild(&mut self, text: &[u8]) {
        self.starts.clear();
        self.starts.push(0);
        self.starts
            .extend(memchr_iter(b'\n', text).map(|terminator| terminator + 1));
    }

    /// Number of lines.
    pub fn line_count(&self) -> usize {
        self.starts.len()
    }

    /// Byte offset where `line` starts.
    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.starts.get(line).copied()
    }

    /// `(start, max)` byte bounds of `line`, where `max` is the offset of its terminator (or
    /// `text_len` for the last line).
    pub fn line_bounds(&self, line: usize, text_len: usize) -> Option<(usize, usize)> {
        let start = self.line_start(line)?;
        let max = match self.starts.get(line + 1) {
            Some(next) => next - 1,
            None => text_len,
        };
        Some((start, max))
    }

    /// The line owning `offset`: the greatest line whose start is `<= offset`.
    ///
    /// Scans from the last line down. The caller validates `offset` against the text length.
    pub fn line_of_offset(&self, offset: usize) -> usize {
        self.starts
            .iter()
            .rposition(|&start| start <= offset)
            .unwrap_or(0)
    }

    /// All line starts.
    pub fn starts(&self) -> &[usize] {
        &self.starts
    }
}

impl Default for LineIndex {
    fn default() -> Self {
        Self::new()
    }
}
