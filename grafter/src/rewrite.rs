//! Thin rewriting builder over the edit buffer.

use tree_sitter::{Parser, Tree};

use crate::edit::{Edit, EditBuffer, EditPreview};
use crate::error::{Error, Result};
use crate::language::{reparse, tree_language};
use crate::span::Span;

/// Node- and range-addressed `replace` / `remove` / `insert_before` /
/// `insert_after` / `wrap` over one source, applied in a single pass.
///
/// Targets are anything convertible to a [`Span`]: a [`tree_sitter::Node`]
/// borrowed from the tree the source was parsed into, a `Range<usize>`, or
/// a `(start, end)` pair. Raw ranges are validated against the source;
/// nodes are trusted to come from the right tree.
pub struct Rewriter {
    source: String,
    language: tree_sitter::Language,
    parser: Option<Parser>,
    buffer: EditBuffer,
}

impl std::fmt::Debug for Rewriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rewriter")
            .field("source", &self.source)
            .field("buffer", &self.buffer)
            .finish()
    }
}

impl Rewriter {
    /// Create a builder for `source` as parsed into `tree`.
    #[must_use]
    pub fn new(source: impl Into<String>, tree: &Tree) -> Self {
        Self {
            source: source.into(),
            language: tree_language(tree),
            parser: None,
            buffer: EditBuffer::new(),
        }
    }

    /// Use an explicit parser for [`Rewriter::rewrite_with_tree`] instead
    /// of building one from the tree's grammar.
    #[must_use]
    pub fn with_parser(mut self, parser: Parser) -> Self {
        self.parser = Some(parser);
        self
    }

    /// The source being rewritten.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Replace the target's bytes with `replacement`.
    pub fn replace(
        &mut self,
        target: impl Into<Span>,
        replacement: impl Into<String>,
    ) -> Result<&mut Self> {
        let span = self.checked(target)?;
        self.buffer.add(span.start, span.end, replacement);
        Ok(self)
    }

    /// Remove the target's bytes.
    pub fn remove(&mut self, target: impl Into<Span>) -> Result<&mut Self> {
        let span = self.checked(target)?;
        self.buffer.push(Edit::delete(span.start, span.end));
        Ok(self)
    }

    /// Insert `content` immediately before the target.
    pub fn insert_before(
        &mut self,
        target: impl Into<Span>,
        content: impl Into<String>,
    ) -> Result<&mut Self> {
        let span = self.checked(target)?;
        self.buffer.push(Edit::insert(span.start, content));
        Ok(self)
    }

    /// Insert `content` immediately after the target.
    pub fn insert_after(
        &mut self,
        target: impl Into<Span>,
        content: impl Into<String>,
    ) -> Result<&mut Self> {
        let span = self.checked(target)?;
        self.buffer.push(Edit::insert(span.end, content));
        Ok(self)
    }

    /// Surround the target with `before` and `after`.
    ///
    /// The before-insert is queued first so it precedes the after-insert
    /// in the output even when the target is empty.
    pub fn wrap(
        &mut self,
        target: impl Into<Span>,
        before: impl Into<String>,
        after: impl Into<String>,
    ) -> Result<&mut Self> {
        let span = self.checked(target)?;
        self.buffer.push(Edit::insert(span.start, before));
        self.buffer.push(Edit::insert(span.end, after));
        Ok(self)
    }

    /// The edits queued so far, in call order.
    #[must_use]
    pub fn edits(&self) -> &[Edit] {
        self.buffer.edits()
    }

    /// Preview the queued edits against the source.
    #[must_use]
    pub fn preview_edits(&self) -> Vec<EditPreview> {
        self.buffer.previews(&self.source)
    }

    /// Apply the queued edits and return the new source.
    #[must_use]
    pub fn rewrite(&self) -> String {
        self.buffer.apply(&self.source)
    }

    /// Apply the queued edits, then parse the result.
    pub fn rewrite_with_tree(&mut self) -> Result<(String, Tree)> {
        let output = self.buffer.apply(&self.source);
        let tree = reparse(self.parser.as_mut(), &self.language, &output)?;
        Ok((output, tree))
    }

    fn checked(&self, target: impl Into<Span>) -> Result<Span> {
        let span = target.into();
        if span.start > span.end || span.end > self.source.len() {
            return Err(Error::invalid(format!(
                "range {}..{} does not lie within the source (length {})",
                span.start,
                span.end,
                self.source.len()
            )));
        }
        Ok(span)
    }
}
