//! Highlight captures: collection, filtering and point/range lookup.

use serde::{Deserialize, Serialize};
use streaming_iterator::StreamingIterator;
use textdoc::Point;
use tree_sitter::{Language, Node, Query, QueryCursor};

use crate::error::DocumentError;
use crate::query::{NodeRelation, Span, classify};

/// Which captured nodes to drop while collecting highlights. Flags OR together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnoreFilter {
    /// Drop nodes the parser inserted to recover from an error.
    pub missing: bool,
    /// Drop extra nodes (e.g. comments in grammars that mark them as extras).
    pub extra: bool,
    /// Drop every named node.
    pub named: bool,
    /// Drop `ERROR` nodes.
    pub error: bool,
    /// Drop zero-width nodes.
    ///
    /// Tree-sitter nodes are never null, so this matches on an empty byte span instead. Nodes
    /// inserted for error recovery are zero-width, so this also drops everything `missing` does.
    pub null: bool,
}

impl IgnoreFilter {
    /// A filter that keeps everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the `missing` flag.
    pub fn missing(mut self, on: bool) -> Self {
        self.missing = on;
        self
    }

    /// Set the `extra` flag.
    pub fn extra(mut self, on: bool) -> Self {
        self.extra = on;
        self
    }

    /// Set the `named` flag.
    pub fn named(mut self, on: bool) -> Self {
        self.named = on;
        self
    }

    /// Set the `error` flag.
    pub fn error(mut self, on: bool) -> Self {
        self.error = on;
        self
    }

    /// Set the `null` flag.
    pub fn null(mut self, on: bool) -> Self {
        self.null = on;
        self
    }

    /// Returns `true` if `node` should be dropped.
    pub fn matches(&self, node: &Node<'_>) -> bool {
        (self.missing && node.is_missing())
            || (self.extra && node.is_extra())
            || (self.error && node.is_error())
            || (self.null && node.start_byte() == node.end_byte())
            || (self.named && node.is_named())
    }
}

/// A compiled highlight query plus its ignore filter.
pub struct HighlightConfig {
    query: Query,
    ignore: IgnoreFilter,
}

impl HighlightConfig {
    /// Compile `source` (`.scm`) for `language`.
    pub fn new(language: &Language, source: &str) -> Result<Self, DocumentError> {
        let query = Query::new(language, source).map_err(|e| DocumentError::Query(e.to_string()))?;
        Ok(Self::from_query(query))
    }

    /// Wrap an already compiled query.
    pub fn from_query(query: Query) -> Self {
        Self {
            query,
            ignore: IgnoreFilter::default(),
        }
    }

    /// Set the ignore filter.
    pub fn with_ignore(mut self, ignore: IgnoreFilter) -> Self {
        self.ignore = ignore;
        self
    }

    /// The compiled query.
    pub fn query(&self) -> &Query {
        &self.query
    }

    /// The ignore filter.
    pub fn ignore(&self) -> IgnoreFilter {
        self.ignore
    }

    /// Capture names; a capture's category index points into this list.
    pub fn capture_names(&self) -> &[&str] {
        self.query.capture_names()
    }

    /// Run the query over `root` and keep every capture the filter does not drop, in document
    /// order.
    pub(crate) fn collect(&self, root: Node<'_>, text: &[u8]) -> Vec<HighlightCapture> {
        let mut cursor = QueryCursor::new();
        let mut out = Vec::new();

        let mut captures = cursor.captures(&self.query, root, text);
        while let Some((m, capture_idx)) = captures.next() {
            let capture = &m.captures[*capture_idx];
            if self.ignore.matches(&capture.node) {
                continue;
            }
            out.push(HighlightCapture::from_node(&capture.node, capture.index));
        }

        out
    }
}

/// A captured node, recorded by value so it can be stored next to the tree it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HighlightCapture {
    /// Start byte of the node.
    pub start_byte: usize,
    /// End byte of the node.
    pub end_byte: usize,
    /// Start point of the node.
    pub start: Point,
    /// End point of the node.
    pub end: Point,
    /// Node kind id.
    pub kind_id: u16,
    /// Capture category index (into [`HighlightConfig::capture_names`]).
    pub index: u32,
}

impl HighlightCapture {
    fn from_node(node: &Node<'_>, index: u32) -> Self {
        Self {
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
            start: node.start_point(),
            end: node.end_point(),
            kind_id: node.kind_id(),
            index,
        }
    }
}

impl Span for HighlightCapture {
    fn start_point(&self) -> Point {
        self.start
    }

    fn end_point(&self) -> Point {
        self.end
    }
}

/// The captures around a point: the nearest one strictly before it, the last one touching it,
/// and the nearest one strictly after it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClosestCaptures<'a> {
    /// Nearest capture ending at or before the point.
    pub prev: Option<&'a HighlightCapture>,
    /// Last capture touching or covering the point.
    pub target: Option<&'a HighlightCapture>,
    /// First capture starting after the point.
    pub next: Option<&'a HighlightCapture>,
}

/// Captures of the current tree, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HighlightIndex {
    captures: Vec<HighlightCapture>,
}

impl HighlightIndex {
    /// Wrap captures that are already in document order.
    pub fn new(captures: Vec<HighlightCapture>) -> Self {
        Self { captures }
    }

    /// All captures.
    pub fn as_slice(&self) -> &[HighlightCapture] {
        &self.captures
    }

    /// Iterate over all captures.
    pub fn iter(&self) -> std::slice::Iter<'_, HighlightCapture> {
        self.captures.iter()
    }

    /// Number of captures.
    pub fn len(&self) -> usize {
        self.captures.len()
    }

    /// Returns `true` if there are no captures.
    pub fn is_empty(&self) -> bool {
        self.captures.is_empty()
    }

    /// Captures inside or overlapping `[start, end]`.
    pub fn in_range(&self, start: Point, end: Point) -> Vec<&HighlightCapture> {
        let mut out = Vec::new();
        for capture in &self.captures {
            match classify(capture, start, end) {
                NodeRelation::After => break,
                relation if relation.touches() => out.push(capture),
                _ => {}
            }
        }
        out
    }

    /// The first capture touching `point`.
    pub fn at_point(&self, point: Point) -> Option<&HighlightCapture> {
        self.captures
            .iter()
            .take_while(|capture| classify(*capture, point, point) != NodeRelation::After)
            .find(|capture| classify(*capture, point, point).touches())
    }

    /// The captures closest to `point`.
    pub fn closest(&self, point: Point) -> ClosestCaptures<'_> {
        let mut closest = ClosestCaptures::default();

        for capture in &self.captures {
            match classify(capture, point, point) {
                NodeRelation::Before => closest.prev = Some(capture),
                NodeRelation::After => {
                    closest.next = Some(capture);
                    break;
                }
                _ => closest.target = Some(capture),
            }
        }

        closest
    }
}

impl<'a> IntoIterator for &'a HighlightIndex {
    type Item = &'a HighlightCapture;
    type IntoIter = std::slice::Iter<'a, HighlightCapture>;

    fn into_iter(self) -> Self::IntoIter {
        self.captures.iter()
    }
}
