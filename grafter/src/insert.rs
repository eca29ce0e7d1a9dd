//! Syntax-aware insertion at container boundaries.
//!
//! An inserter holds at most one insertion point at a time (an offset, a
//! context tag, and a target indentation level) plus a queue of pending
//! insertions. Content is re-indented to the point's level through the
//! indentation analyzer, and the surrounding newlines are chosen from the
//! point's context so inserted statements land on their own lines.
//!
//! The point locator is delimiter-based (`{` / `}`): it is exact for
//! brace-delimited grammars and degrades to the node's end otherwise.
//! Callers targeting brace-less grammars should prefer `before` / `after`
//! points with `insert_sibling`.

use log::debug;
use tree_sitter::{Node, Parser, Tree};

use crate::error::{Error, Result};
use crate::indent::{Indentation, IndentationAnalyzer};
use crate::language::{reparse, tree_language};

/// Where an insertion point sits relative to its anchor node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertContext {
    /// Inside the anchor, at its first child or just after its opening
    /// brace.
    InsideStart,
    /// Inside the anchor, just before its closing brace.
    InsideEnd,
    /// Immediately before the anchor.
    Before,
    /// Immediately after the anchor.
    After,
}

#[derive(Debug, Clone, Copy)]
struct InsertionPoint {
    offset: usize,
    context: InsertContext,
    level: usize,
}

#[derive(Debug)]
struct PendingInsertion {
    offset: usize,
    text: String,
    newline_before: bool,
    newline_after: bool,
}

/// Builder that places content at syntax-aware insertion points, adjusted
/// to the source's own indentation.
pub struct Inserter {
    analyzer: IndentationAnalyzer,
    language: tree_sitter::Language,
    parser: Option<Parser>,
    point: Option<InsertionPoint>,
    pending: Vec<PendingInsertion>,
}

impl std::fmt::Debug for Inserter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inserter")
            .field("analyzer", &self.analyzer)
            .field("point", &self.point)
            .field("pending", &self.pending)
            .finish()
    }
}

impl Inserter {
    /// Create a builder for `source` as parsed into `tree`.
    #[must_use]
    pub fn new(source: impl Into<String>, tree: &Tree) -> Self {
        Self {
            analyzer: IndentationAnalyzer::new(source),
            language: tree_language(tree),
            parser: None,
            point: None,
            pending: Vec::new(),
        }
    }

    /// Use an explicit parser for [`Inserter::rewrite_with_tree`].
    #[must_use]
    pub fn with_parser(mut self, parser: Parser) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Override the detected indentation descriptor.
    #[must_use]
    pub fn with_indentation(mut self, indentation: Indentation) -> Self {
        self.analyzer = self.analyzer.with_indentation(indentation);
        self
    }

    /// The source being extended.
    #[must_use]
    pub fn source(&self) -> &str {
        self.analyzer.source()
    }

    /// The indentation analyzer backing this inserter.
    #[must_use]
    pub fn analyzer(&self) -> &IndentationAnalyzer {
        &self.analyzer
    }

    /// The current insertion point as `(offset, context, level)`, if one
    /// is set.
    #[must_use]
    pub fn position(&self) -> Option<(usize, InsertContext, usize)> {
        self.point
            .map(|point| (point.offset, point.context, point.level))
    }

    /// Point inside `node`, before its first named child (or just after
    /// its opening brace).
    pub fn at_start_of(&mut self, node: Node<'_>) -> &mut Self {
        let level = self.analyzer.level_at_byte(node.start_byte()) + 1;
        let raw = node.named_child(0).map_or_else(
            || {
                let text = self.node_text(node);
                text.find('{')
                    .map_or(node.start_byte() + 1, |i| node.start_byte() + i + 1)
            },
            |child| child.start_byte(),
        );
        let offset = self
            .retreat_over_blank_prefix(raw)
            .min(self.source().len());
        self.point = Some(InsertionPoint {
            offset,
            context: InsertContext::InsideStart,
            level,
        });
        self
    }

    /// Point inside `node`, just before its closing brace (or at its
    /// end for brace-less nodes).
    pub fn at_end_of(&mut self, node: Node<'_>) -> &mut Self {
        let level = self.analyzer.level_at_byte(node.start_byte()) + 1;
        let raw = self
            .node_text(node)
            .rfind('}')
            .map_or(node.end_byte(), |i| node.start_byte() + i);
        let offset = self.retreat_over_blank_prefix(raw);
        self.point = Some(InsertionPoint {
            offset,
            context: InsertContext::InsideEnd,
            level,
        });
        self
    }

    /// Point immediately before `node`, at its own level.
    pub fn before(&mut self, node: Node<'_>) -> &mut Self {
        self.point = Some(InsertionPoint {
            offset: node.start_byte(),
            context: InsertContext::Before,
            level: self.analyzer.level_at_byte(node.start_byte()),
        });
        self
    }

    /// Point immediately after `node`, at its own level.
    pub fn after(&mut self, node: Node<'_>) -> &mut Self {
        self.point = Some(InsertionPoint {
            offset: node.end_byte(),
            context: InsertContext::After,
            level: self.analyzer.level_at_byte(node.start_byte()),
        });
        self
    }

    /// Forget the current insertion point so a new one may be chosen.
    pub fn reset_position(&mut self) -> &mut Self {
        self.point = None;
        self
    }

    /// Queue `content` as a statement at the point, re-indented to the
    /// point's level, with context-default newlines.
    pub fn insert_statement(&mut self, content: &str) -> Result<&mut Self> {
        self.insert_statement_with(content, None, true)
    }

    /// Queue `content` as a statement with explicit newline control.
    ///
    /// `newline_before` defaults per context: inside points take a leading
    /// newline only when they sit mid-line (avoiding doubled blank lines
    /// before a closing brace); before/after points take none.
    pub fn insert_statement_with(
        &mut self,
        content: &str,
        newline_before: Option<bool>,
        newline_after: bool,
    ) -> Result<&mut Self> {
        let point = self.current_point()?;
        let text = self
            .analyzer
            .adjust_indentation(content.trim(), point.level, None);
        let newline_before = newline_before.unwrap_or_else(|| self.default_newline_before(point));
        self.pending.push(PendingInsertion {
            offset: point.offset,
            text,
            newline_before,
            newline_after,
        });
        Ok(self)
    }

    /// Queue `content` verbatim at the point: no re-indent, no newlines.
    pub fn insert_raw(&mut self, content: &str) -> Result<&mut Self> {
        let point = self.current_point()?;
        self.pending.push(PendingInsertion {
            offset: point.offset,
            text: content.to_owned(),
            newline_before: false,
            newline_after: false,
        });
        Ok(self)
    }

    /// Queue `content` as a sibling of the point's anchor, re-indented to
    /// the point's level, with `sep` (default blank line) on the side
    /// facing the anchor.
    pub fn insert_sibling(&mut self, content: &str, sep: Option<&str>) -> Result<&mut Self> {
        let point = self.current_point()?;
        let sep = sep.unwrap_or("\n\n");
        let body = self
            .analyzer
            .adjust_indentation(content.trim(), point.level, None);
        let text = match point.context {
            InsertContext::Before | InsertContext::InsideStart => format!("{body}{sep}"),
            InsertContext::After | InsertContext::InsideEnd => format!("{sep}{body}"),
        };
        self.pending.push(PendingInsertion {
            offset: point.offset,
            text,
            newline_before: false,
            newline_after: false,
        });
        Ok(self)
    }

    /// Queue a braced block: header line, body one level deeper, closing
    /// line.
    pub fn insert_block(&mut self, header: &str, body: &str) -> Result<&mut Self> {
        self.insert_block_with(header, body, " {", "}")
    }

    /// Queue a block with explicit open/close delimiters.
    pub fn insert_block_with(
        &mut self,
        header: &str,
        body: &str,
        open: &str,
        close: &str,
    ) -> Result<&mut Self> {
        let point = self.current_point()?;
        let indent = self.analyzer.indent_string_for_level(point.level as isize);
        let body = self
            .analyzer
            .adjust_indentation(body.trim(), point.level + 1, None);
        let text = format!("{indent}{header}{open}\n{body}\n{indent}{close}");
        let newline_before = self.default_newline_before(point);
        self.pending.push(PendingInsertion {
            offset: point.offset,
            text,
            newline_before,
            newline_after: true,
        });
        Ok(self)
    }

    /// Splice the pending insertions into the source and return the new
    /// string.
    ///
    /// Insertions are applied in descending offset order; each splice
    /// leaves every lower offset untouched, so no adjustment is needed.
    /// Same-offset insertions keep their queueing order in the output.
    #[must_use]
    pub fn rewrite(&self) -> String {
        debug!("splicing {} insertions", self.pending.len());
        let mut order: Vec<usize> = (0..self.pending.len()).collect();
        order.sort_by_key(|&i| self.pending[i].offset);

        let mut output = self.source().to_owned();
        for &i in order.iter().rev() {
            let pending = &self.pending[i];
            let mut text =
                String::with_capacity(pending.text.len() + 2);
            if pending.newline_before {
                text.push('\n');
            }
            text.push_str(&pending.text);
            if pending.newline_after {
                text.push('\n');
            }
            output.insert_str(pending.offset.min(output.len()), &text);
        }
        output
    }

    /// Splice the pending insertions, then parse the result.
    pub fn rewrite_with_tree(&mut self) -> Result<(String, Tree)> {
        let output = self.rewrite();
        let tree = reparse(self.parser.as_mut(), &self.language, &output)?;
        Ok((output, tree))
    }

    fn current_point(&self) -> Result<InsertionPoint> {
        self.point.ok_or_else(|| {
            Error::precondition(
                "no insertion point set; call at_start_of, at_end_of, before, or after first",
            )
        })
    }

    /// True when the point sits mid-line: some non-blank character lies
    /// between the preceding newline and the point.
    fn default_newline_before(&self, point: InsertionPoint) -> bool {
        match point.context {
            InsertContext::Before | InsertContext::After => false,
            InsertContext::InsideStart | InsertContext::InsideEnd => {
                let source = self.source();
                let line_start = source[..point.offset].rfind('\n').map_or(0, |i| i + 1);
                !source[line_start..point.offset]
                    .chars()
                    .all(|c| c == ' ' || c == '\t')
            }
        }
    }

    /// When everything between the preceding newline and `offset` is
    /// blank, retreat to the line start so insertions land on their own
    /// line and the displaced neighbour keeps its indentation.
    fn retreat_over_blank_prefix(&self, offset: usize) -> usize {
        let source = self.source();
        let offset = offset.min(source.len());
        let line_start = source[..offset].rfind('\n').map_or(0, |i| i + 1);
        if line_start < offset
            && source[line_start..offset]
                .chars()
                .all(|c| c == ' ' || c == '\t')
        {
            line_start
        } else {
            offset
        }
    }

    fn node_text(&self, node: Node<'_>) -> &str {
        &self.source()[node.start_byte().min(self.source().len())
            ..node.end_byte().min(self.source().len())]
    }
}
