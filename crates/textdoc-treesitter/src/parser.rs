//! The parser capability consumed by [`Document`](crate::Document).

use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tree_sitter::{Language, ParseOptions, ParseState, Parser, Point, Tree};

use crate::error::ParseError;

/// A shared cancellation signal for in-flight parses.
///
/// Clones observe the same flag, so another thread can cancel a parse it did not start.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    /// A flag that is not raised.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Something that can (re-)parse a whole text into a tree.
///
/// `old_tree`, when given, has already been edited to match `text` and may be reused.
pub trait SyntaxParser {
    /// Parse `text`, honouring `cancel`.
    fn parse(
        &mut self,
        text: &[u8],
        old_tree: Option<&Tree>,
        cancel: &CancellationFlag,
    ) -> Result<Tree, ParseError>;
}

impl SyntaxParser for Parser {
    fn parse(
        &mut self,
        text: &[u8],
        old_tree: Option<&Tree>,
        cancel: &CancellationFlag,
    ) -> Result<Tree, ParseError> {
        parse_cancellable(self, text, old_tree, cancel, |_| {})
    }
}

/// Parse `text`, polling `cancel` from tree-sitter's progress callback so a raised flag aborts
/// the parse in flight. `on_progress` sees the byte offset of every poll.
fn parse_cancellable(
    parser: &mut Parser,
    text: &[u8],
    old_tree: Option<&Tree>,
    cancel: &CancellationFlag,
    mut on_progress: impl FnMut(usize),
) -> Result<Tree, ParseError> {
    if cancel.is_cancelled() {
        return Err(ParseError::Cancelled);
    }

    let mut read = |offset: usize, _: Point| text.get(offset..).unwrap_or_default();
    let mut progress = |state: &ParseState| {
        on_progress(state.current_byte_offset());
        if cancel.is_cancelled() {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    };
    let options = ParseOptions::new().progress_callback(&mut progress);

    match parser.parse_with_options(&mut read, old_tree, Some(options)) {
        // A tree finished after cancellation is discarded like any other failed parse.
        Some(_) if cancel.is_cancelled() => Err(ParseError::Cancelled),
        Some(tree) => Ok(tree),
        None if cancel.is_cancelled() => {
            // Otherwise the next call would resume the aborted parse.
            parser.reset();
            Err(ParseError::Cancelled)
        }
        None => Err(ParseError::Failed),
    }
}

/// Create a tree-sitter parser for `language`.
pub fn parser_for(language: &Language) -> Result<Parser, ParseError> {
    let mut parser = Parser::new();
    parser
        .set_language(language)
        .map_err(|e| ParseError::Language(e.to_string()))?;
    Ok(parser)
}
