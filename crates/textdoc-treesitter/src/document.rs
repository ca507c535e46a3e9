use serde::{Deserialize, Serialize};
use textdoc::{AppliedEdit, Point, Position, Range, TextBuffer, TextChange};
use tracing::{debug, warn};
use tree_sitter::{InputEdit, Node, Tree};

use crate::error::DocumentError;
use crate::highlight::{ClosestCaptures, HighlightCapture, HighlightConfig, HighlightIndex};
use crate::parser::{CancellationFlag, SyntaxParser};
use crate::query::select_nodes;
use crate::tokens::{Token, TokenType, encode_tokens};

/// Whether a re-parse hands the previous tree to the parser.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReparsePolicy {
    /// Always pass the previous tree.
    #[default]
    Incremental,
    /// Parse from scratch when the previous tree records no pending edits.
    FullWhenUnchanged,
}

/// How the last successful parse was performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// No tree existed yet (or the text was replaced wholesale).
    Initial,
    /// The edited previous tree was reused.
    Incremental,
    /// The previous tree was discarded by [`ReparsePolicy::FullWhenUnchanged`].
    Full,
}

/// Configuration for [`Document`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// Re-parse policy used after edits.
    pub reparse_policy: ReparsePolicy,
}

impl DocumentConfig {
    /// Default configuration (incremental re-parsing).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the re-parse policy.
    pub fn with_reparse_policy(mut self, policy: ReparsePolicy) -> Self {
        self.reparse_policy = policy;
        self
    }
}

/// A text buffer kept in sync with a tree-sitter tree and its highlight captures.
///
/// Nodes returned by queries borrow the document, so they cannot outlive the next edit.
pub struct Document {
    buffer: TextBuffer,
    tree: Option<Tree>,
    parser: Option<Box<dyn SyntaxParser>>,
    highlight: Option<HighlightConfig>,
    captures: HighlightIndex,
    config: DocumentConfig,
    last_update_mode: Option<UpdateMode>,
}

impl Document {
    /// Create a document without a parser.
    pub fn new(text: impl Into<Vec<u8>>) -> Self {
        Self::with_config(text, DocumentConfig::default())
    }

    /// Create a document with an explicit configuration.
    pub fn with_config(text: impl Into<Vec<u8>>, config: DocumentConfig) -> Self {
        Self {
            buffer: TextBuffer::new(text),
            tree: None,
            parser: None,
            highlight: None,
            captures: HighlightIndex::default(),
            config,
            last_update_mode: None,
        }
    }

    /// The underlying buffer (coordinate conversions live there).
    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    /// Current text bytes.
    pub fn text(&self) -> &[u8] {
        self.buffer.text()
    }

    /// Number of lines.
    pub fn line_count(&self) -> usize {
        self.buffer.line_count()
    }

    /// The configuration.
    pub fn config(&self) -> DocumentConfig {
        self.config
    }

    /// The current tree, if any parse has succeeded.
    pub fn tree(&self) -> Option<&Tree> {
        self.tree.as_ref()
    }

    /// Root node of the current tree.
    pub fn root_node(&self) -> Option<Node<'_>> {
        self.tree.as_ref().map(Tree::root_node)
    }

    /// How the current tree was produced. `None` until a parse succeeds.
    pub fn last_update_mode(&self) -> Option<UpdateMode> {
        self.last_update_mode
    }

    /// Attach a parser and parse the current text from scratch.
    pub fn set_parser(&mut self, parser: impl SyntaxParser + 'static) -> Result<(), DocumentError> {
        self.parser = Some(Box::new(parser));
        self.parse(UpdateMode::Initial, &CancellationFlag::new())
    }

    /// Replace the whole text and parse it from scratch.
    ///
    /// The text is replaced even if parsing fails.
    pub fn set_text(&mut self, text: impl Into<Vec<u8>>) -> Result<(), DocumentError> {
        self.buffer.set_text(text);
        self.parse(UpdateMode::Initial, &CancellationFlag::new())
    }

    /// Install a highlight query and recompute captures.
    pub fn set_highlight_query(&mut self, config: HighlightConfig) {
        self.highlight = Some(config);
        self.refresh_highlights();
    }

    /// The active highlight configuration.
    pub fn highlight_config(&self) -> Option<&HighlightConfig> {
        self.highlight.as_ref()
    }

    /// Apply a single-range replacement and re-parse.
    pub fn apply_change(&mut self, change: &TextChange) -> Result<(), DocumentError> {
        self.apply_change_with_cancel(change, &CancellationFlag::new())
    }

    /// Apply a single-range replacement and re-parse, honouring `cancel`.
    ///
    /// Invalid coordinates leave the document untouched. A failed or cancelled re-parse keeps
    /// the new text and the previous tree, and returns the error.
    pub fn apply_change_with_cancel(
        &mut self,
        change: &TextChange,
        cancel: &CancellationFlag,
    ) -> Result<(), DocumentError> {
        let edit = self.buffer.apply_change(change)?;

        match self.tree.as_mut() {
            Some(tree) => tree.edit(&input_edit(&edit)),
            None if self.parser.is_none() => return Ok(()),
            None => {}
        }

        self.update_tree(cancel)
    }

    /// Re-parse the current text according to the configured [`ReparsePolicy`].
    pub fn update_tree(&mut self, cancel: &CancellationFlag) -> Result<(), DocumentError> {
        let mode = match (&self.tree, self.config.reparse_policy) {
            (None, _) => UpdateMode::Initial,
            (Some(tree), ReparsePolicy::FullWhenUnchanged) if !tree.root_node().has_changes() => {
                UpdateMode::Full
            }
            (Some(_), _) => UpdateMode::Incremental,
        };
        self.parse(mode, cancel)
    }

    fn parse(&mut self, mode: UpdateMode, cancel: &CancellationFlag) -> Result<(), DocumentError> {
        let Some(parser) = self.parser.as_mut() else {
            return Ok(());
        };

        let old_tree = match mode {
            UpdateMode::Incremental => self.tree.as_ref(),
            UpdateMode::Initial | UpdateMode::Full => None,
        };

        match parser.parse(self.buffer.text(), old_tree, cancel) {
            Ok(tree) => {
                debug!(?mode, bytes = self.buffer.len(), "parsed document");
                self.tree = Some(tree);
                self.last_update_mode = Some(mode);
                self.refresh_highlights();
                Ok(())
            }
            Err(err) => {
                warn!(?mode, error = %err, "re-parse failed; keeping previous tree");
                Err(err.into())
            }
        }
    }

    /// Recompute highlight captures from the current tree.
    pub fn refresh_highlights(&mut self) {
        self.captures = match (&self.highlight, &self.tree) {
            (Some(config), Some(tree)) => {
                HighlightIndex::new(config.collect(tree.root_node(), self.buffer.text()))
            }
            _ => HighlightIndex::default(),
        };
        debug!(captures = self.captures.len(), "refreshed highlight captures");
    }

    /// All highlight captures, in document order.
    pub fn highlight_captures(&self) -> &HighlightIndex {
        &self.captures
    }

    /// Captures inside or overlapping `range`.
    pub fn captures_in_range(&self, range: Range) -> Result<Vec<&HighlightCapture>, DocumentError> {
        let (start, end) = self.range_points(range)?;
        Ok(self.captures.in_range(start, end))
    }

    /// The first capture touching `position`.
    pub fn capture_at_position(
        &self,
        position: Position,
    ) -> Result<Option<&HighlightCapture>, DocumentError> {
        let point = self.buffer.position_to_point(position)?;
        Ok(self.captures.at_point(point))
    }

    /// The captures before, at and after `position`.
    pub fn closest_captures(
        &self,
        position: Position,
    ) -> Result<ClosestCaptures<'_>, DocumentError> {
        let point = self.buffer.position_to_point(position)?;
        Ok(self.captures.closest(point))
    }

    /// Resolve a capture back to its node in the current tree.
    pub fn capture_node(&self, capture: &HighlightCapture) -> Option<Node<'_>> {
        let root = self.root_node()?;
        let mut node = root.descendant_for_byte_range(capture.start_byte, capture.end_byte);

        while let Some(candidate) = node {
            if candidate.kind_id() == capture.kind_id
                && candidate.start_byte() == capture.start_byte
                && candidate.end_byte() == capture.end_byte
            {
                return Some(candidate);
            }
            node = candidate.parent();
        }

        None
    }

    /// The minimal ordered set of nodes covering or touching `range`. Empty without a tree.
    pub fn nodes_in_range(&self, range: Range) -> Result<Vec<Node<'_>>, DocumentError> {
        let (start, end) = self.range_points(range)?;
        Ok(self
            .root_node()
            .map(|root| select_nodes(root, start, end))
            .unwrap_or_default())
    }

    /// The first node touching `position`.
    pub fn node_at_position(&self, position: Position) -> Result<Option<Node<'_>>, DocumentError> {
        Ok(self.nodes_in_range(Range::at(position))?.into_iter().next())
    }

    /// The smallest named node enclosing `position`.
    pub fn closest_node(&self, position: Position) -> Result<Option<Node<'_>>, DocumentError> {
        let point = ts_point(self.buffer.position_to_point(position)?);
        Ok(self
            .root_node()
            .and_then(|root| root.named_descendant_for_point_range(point, point)))
    }

    /// The span of `node` as a position range.
    pub fn node_range(&self, node: &Node<'_>) -> Result<Range, DocumentError> {
        let start = self.buffer.point_to_position(text_point(node.start_position()))?;
        let end = self.buffer.point_to_position(text_point(node.end_position()))?;
        Ok(Range::new(start, end))
    }

    /// Encode all captures into the relative token stream, looking each capture category up in
    /// `legend`.
    ///
    /// A capture spanning several lines is encoded up to the end of its first line.
    pub fn encode_highlights(&self, legend: &[TokenType]) -> Result<Vec<u32>, DocumentError> {
        let mut tokens = Vec::with_capacity(self.captures.len());

        for capture in &self.captures {
            let token_type = legend.get(capture.index as usize).copied().ok_or(
                DocumentError::UnknownCategory {
                    index: capture.index,
                    legend_len: legend.len(),
                },
            )?;

            let start = self.buffer.point_to_position(capture.start)?;
            let end = if capture.end.row == capture.start.row {
                self.buffer.point_to_position(capture.end)?
            } else {
                let (min, max) = self.buffer.line_bounds(capture.start.row)?;
                self.buffer
                    .line_byte_offset_to_position(capture.start.row, max - min)?
            };

            tokens.push(Token {
                line: start.line,
                character: start.character,
                length: end.character.saturating_sub(start.character),
                token_type,
            });
        }

        Ok(encode_tokens(tokens))
    }

    fn range_points(&self, range: Range) -> Result<(Point, Point), DocumentError> {
        Ok((
            self.buffer.position_to_point(range.start)?,
            self.buffer.position_to_point(range.end)?,
        ))
    }
}

fn ts_point(point: Point) -> tree_sitter::Point {
    tree_sitter::Point::new(point.row, point.column)
}

fn text_point(point: tree_sitter::Point) -> Point {
    Point::new(point.row, point.column)
}

fn input_edit(edit: &AppliedEdit) -> InputEdit {
    InputEdit {
        start_byte: edit.start_byte,
        old_end_byte: edit.old_end_byte,
        new_end_byte: edit.new_end_byte,
        start_position: ts_point(edit.start_point),
        old_end_position: ts_point(edit.old_end_point),
        new_end_position: ts_point(edit.new_end_point),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parser_for;
    use pretty_assertions::assert_eq;

    fn rust_document(text: &str) -> Document {
        let mut doc = Document::new(text);
        doc.set_parser(parser_for(&tree_sitter_rust::LANGUAGE.into()).unwrap())
            .unwrap();
        doc
    }

    #[test]
    fn test_without_parser_edits_text_only() {
        let mut doc = Document::new("abc");
        doc.apply_change(&TextChange::new(Range::from_coords(0, 1, 0, 2), "XY")).unwrap();
        assert_eq!(doc.text(), b"aXYc");
        assert!(doc.tree().is_none());
        assert!(doc.nodes_in_range(Range::from_coords(0, 0, 0, 1)).unwrap().is_empty());
    }

    #[test]
    fn test_set_parser_parses_immediately() {
        let doc = rust_document("fn main() {}");
        assert_eq!(doc.last_update_mode(), Some(UpdateMode::Initial));
        assert_eq!(doc.root_node().map(|n| n.kind()), Some("source_file"));
    }

    #[test]
    fn test_incremental_edit_keeps_tree_in_sync() {
        let mut doc = rust_document("fn main() {}");
        doc.apply_change(&TextChange::new(Range::from_coords(0, 3, 0, 7), "run")).unwrap();

        assert_eq!(doc.text(), b"fn run() {}");
        assert_eq!(doc.last_update_mode(), Some(UpdateMode::Incremental));
        let root = doc.root_node().unwrap();
        assert!(!root.has_error());
        assert_eq!(root.end_byte(), doc.text().len());
    }

    #[test]
    fn test_invalid_range_leaves_document_untouched() {
        let mut doc = rust_document("fn main() {}");
        let result = doc.apply_change(&TextChange::new(Range::from_coords(1, 0, 1, 0), "x"));
        assert!(matches!(result, Err(DocumentError::Coordinate(_))));
        assert_eq!(doc.text(), b"fn main() {}");
    }

    #[test]
    fn test_set_text_reparses_from_scratch() {
        let mut doc = rust_document("fn main() {}");
        doc.set_text("struct A;").unwrap();
        assert_eq!(doc.last_update_mode(), Some(UpdateMode::Initial));
        let root = doc.root_node().unwrap();
        assert_eq!(root.child(0).map(|n| n.kind()), Some("struct_item"));
    }

    #[test]
    fn test_node_range_counts_characters() {
        // '⌘' is 3 bytes, so the block ends at byte 17 but character 15.
        let doc = rust_document("fn a() { \"⌘\"; }");
        let block = doc.closest_node(Position::new(0, 7)).unwrap().unwrap();
        assert_eq!(block.kind(), "block");
        assert_eq!(block.end_byte(), 17);
        assert_eq!(doc.node_range(&block).unwrap(), Range::from_coords(0, 7, 0, 15));
    }

    #[test]
    fn test_closest_node_is_named() {
        let doc = rust_document("fn main() {}");
        let node = doc.closest_node(Position::new(0, 5)).unwrap().unwrap();
        assert_eq!(node.kind(), "identifier");
    }

    #[test]
    fn test_config_builder() {
        let config = DocumentConfig::new().with_reparse_policy(ReparsePolicy::FullWhenUnchanged);
        assert_eq!(config.reparse_policy, ReparsePolicy::FullWhenUnchanged);
        assert_eq!(DocumentConfig::default().reparse_policy, ReparsePolicy::Incremental);
    }
}
