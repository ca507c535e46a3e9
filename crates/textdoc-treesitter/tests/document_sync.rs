use std::cell::{Cell, RefCell};
use std::rc::Rc;

use pretty_assertions::assert_eq;
use textdoc::{Range, TextChange};
use textdoc_treesitter::{
    CancellationFlag, Document, DocumentConfig, DocumentError, ParseError, ReparsePolicy,
    SyntaxParser, UpdateMode, parser_for,
};
use tree_sitter::{Parser, Tree};
use tree_sitter_rust::LANGUAGE;

fn rust_parser() -> Parser {
    parser_for(&LANGUAGE.into()).unwrap()
}

/// Records whether each parse was handed a previous tree.
struct SpyParser {
    inner: Parser,
    reused: Rc<RefCell<Vec<bool>>>,
}

impl SyntaxParser for SpyParser {
    fn parse(
        &mut self,
        text: &[u8],
        old_tree: Option<&Tree>,
        cancel: &CancellationFlag,
    ) -> Result<Tree, ParseError> {
        self.reused.borrow_mut().push(old_tree.is_some());
        SyntaxParser::parse(&mut self.inner, text, old_tree, cancel)
    }
}

/// Fails while its switch is on.
struct FlakyParser {
    inner: Parser,
    failing: Rc<Cell<bool>>,
}

impl SyntaxParser for FlakyParser {
    fn parse(
        &mut self,
        text: &[u8],
        old_tree: Option<&Tree>,
        cancel: &CancellationFlag,
    ) -> Result<Tree, ParseError> {
        if self.failing.get() {
            return Err(ParseError::Failed);
        }
        SyntaxParser::parse(&mut self.inner, text, old_tree, cancel)
    }
}

fn spy_document(text: &str, policy: ReparsePolicy) -> (Document, Rc<RefCell<Vec<bool>>>) {
    let reused = Rc::new(RefCell::new(Vec::new()));
    let mut doc = Document::with_config(text, DocumentConfig::new().with_reparse_policy(policy));
    doc.set_parser(SpyParser {
        inner: rust_parser(),
        reused: Rc::clone(&reused),
    })
    .unwrap();
    (doc, reused)
}

#[test]
fn test_incremental_policy_always_passes_previous_tree() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let (mut doc, reused) = spy_document("fn main() {}", ReparsePolicy::Incremental);
    doc.apply_change(&TextChange::new(Range::from_coords(0, 3, 0, 7), "run")).unwrap();
    doc.update_tree(&CancellationFlag::new()).unwrap();

    assert_eq!(*reused.borrow(), vec![false, true, true]);
    assert_eq!(doc.last_update_mode(), Some(UpdateMode::Incremental));
}

#[test]
fn test_full_when_unchanged_policy_drops_unedited_tree() {
    let (mut doc, reused) = spy_document("fn main() {}", ReparsePolicy::FullWhenUnchanged);
    doc.apply_change(&TextChange::new(Range::from_coords(0, 3, 0, 7), "run")).unwrap();
    assert_eq!(doc.last_update_mode(), Some(UpdateMode::Incremental));

    doc.update_tree(&CancellationFlag::new()).unwrap();
    assert_eq!(doc.last_update_mode(), Some(UpdateMode::Full));

    assert_eq!(*reused.borrow(), vec![false, true, false]);
}

#[test]
fn test_failed_reparse_keeps_previous_tree_and_new_text() {
    let failing = Rc::new(Cell::new(false));
    let mut doc = Document::new("fn main() {}");
    doc.set_parser(FlakyParser {
        inner: rust_parser(),
        failing: Rc::clone(&failing),
    })
    .unwrap();

    failing.set(true);
    let result = doc.apply_change(&TextChange::new(Range::from_coords(0, 3, 0, 7), "run"));

    assert!(matches!(
        result,
        Err(DocumentError::Parse(ParseError::Failed))
    ));
    assert_eq!(doc.text(), b"fn run() {}");
    let root = doc.root_node().unwrap();
    assert!(root.has_changes());
    assert_eq!(root.end_byte(), doc.text().len());

    failing.set(false);
    doc.update_tree(&CancellationFlag::new()).unwrap();
    let root = doc.root_node().unwrap();
    assert!(!root.has_changes());
    assert!(!root.has_error());
}

#[test]
fn test_cancelled_reparse_behaves_like_failure() {
    let mut doc = Document::new("fn main() {}");
    doc.set_parser(rust_parser()).unwrap();

    let cancel = CancellationFlag::new();
    cancel.cancel();
    let result = doc.apply_change_with_cancel(
        &TextChange::new(Range::from_coords(0, 12, 0, 12), "\nfn b() {}"),
        &cancel,
    );

    assert!(matches!(
        result,
        Err(DocumentError::Parse(ParseError::Cancelled))
    ));
    assert_eq!(doc.line_count(), 2);
    assert!(doc.root_node().unwrap().has_changes());
}

#[test]
fn test_append_and_whole_document_replacement() {
    let mut doc = Document::new("fn main() {}");
    doc.set_parser(rust_parser()).unwrap();

    doc.apply_change(&TextChange::new(Range::from_coords(0, 12, 0, 12), "\nfn b() {}")).unwrap();
    let root = doc.root_node().unwrap();
    assert_eq!(root.named_child_count(), 2);
    assert_eq!(root.end_byte(), doc.text().len());

    doc.apply_change(&TextChange::new(Range::from_coords(0, 0, 1, 9), "struct S;")).unwrap();
    assert_eq!(doc.text(), b"struct S;");
    let root = doc.root_node().unwrap();
    assert_eq!(root.named_child_count(), 1);
    assert_eq!(root.child(0).map(|n| n.kind()), Some("struct_item"));
}

#[test]
fn test_first_edit_without_tree_parses_fully() {
    let failing = Rc::new(Cell::new(true));
    let mut doc = Document::new("fn main() {}");
    let result = doc.set_parser(FlakyParser {
        inner: rust_parser(),
        failing: Rc::clone(&failing),
    });
    assert!(result.is_err());
    assert!(doc.tree().is_none());

    failing.set(false);
    doc.apply_change(&TextChange::insert(textdoc::Position::new(0, 0), "pub ")).unwrap();
    assert_eq!(doc.last_update_mode(), Some(UpdateMode::Initial));
    assert_eq!(doc.root_node().unwrap().end_byte(), doc.text().len());
}
