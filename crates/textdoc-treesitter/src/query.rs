//! Classifying syntax spans against a point range, and selecting the nodes a range touches.

use textdoc::Point;
use tree_sitter::Node;

/// Where a span lies relative to a `[start, end]` point range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRelation {
    /// The span ends at or before the range start.
    Before,
    /// The span is fully contained in the range.
    Inside,
    /// The span partially intersects the range, or a zero-width range touches one of its ends.
    Overlapping,
    /// The range ends at or before the span start.
    After,
}

impl NodeRelation {
    /// `Inside` or `Overlapping`.
    pub fn touches(self) -> bool {
        matches!(self, Self::Inside | Self::Overlapping)
    }
}

/// Anything with a start and end point in the document.
pub trait Span {
    /// Start point (inclusive).
    fn start_point(&self) -> Point;
    /// End point (exclusive).
    fn end_point(&self) -> Point;
}

impl Span for Node<'_> {
    fn start_point(&self) -> Point {
        let p = self.start_position();
        Point::new(p.row, p.column)
    }

    fn end_point(&self) -> Point {
        let p = self.end_position();
        Point::new(p.row, p.column)
    }
}

/// Classify `span` against the range `[start, end]`.
///
/// A zero-width range that touches either end of the span is always `Overlapping`, so a cursor
/// at a token boundary reports the touching token rather than an enclosing ancestor.
pub fn classify<S: Span + ?Sized>(span: &S, start: Point, end: Point) -> NodeRelation {
    let span_start = span.start_point();
    let span_end = span.end_point();

    if start == end && (span_start == start || span_end == end) {
        return NodeRelation::Overlapping;
    }

    if span_end <= start {
        NodeRelation::Before
    } else if start <= span_start && span_end <= end {
        NodeRelation::Inside
    } else if end <= span_start {
        NodeRelation::After
    } else {
        NodeRelation::Overlapping
    }
}

/// Select the minimal ordered set of nodes under `root` that cover or touch `[start, end]`.
///
/// Pre-order walk: `Before` nodes are skipped, `Inside` nodes are taken whole, `Overlapping`
/// nodes are descended into (or taken if they are leaves), and the first `After` node ends the
/// walk.
pub fn select_nodes<'tree>(root: Node<'tree>, start: Point, end: Point) -> Vec<Node<'tree>> {
    if classify(&root, start, end) == NodeRelation::Inside {
        return vec![root];
    }

    let mut selected = Vec::new();
    let mut cursor = root.walk();

    'walk: loop {
        let node = cursor.node();
        let descend = match classify(&node, start, end) {
            NodeRelation::Before => false,
            NodeRelation::Inside => {
                selected.push(node);
                false
            }
            NodeRelation::Overlapping if node.child_count() > 0 => true,
            NodeRelation::Overlapping => {
                selected.push(node);
                false
            }
            NodeRelation::After => break,
        };

        if descend && cursor.goto_first_child() {
            continue;
        }

        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                break 'walk;
            }
        }
    }

    selected
}
