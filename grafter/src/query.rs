//! Query-driven bulk rewriting.
//!
//! One pattern, any number of conjunctive match filters, and per-capture
//! operations, compiled into a single edit pass: the query runs against
//! the tree's root, surviving matches contribute one edit (or two, for
//! wraps) per operation per same-named capture, and the edit buffer
//! applies them all against the original byte offsets.

use compact_str::CompactString;
use log::debug;
use rustc_hash::FxHashMap;
use tree_sitter::{Language, Node, Parser, Query, QueryCursor, StreamingIterator, Tree};

use crate::edit::{Edit, EditBuffer, EditPreview};
use crate::error::{Error, Result};
use crate::language::{reparse, LanguageSpec};

/// View of one captured node handed to content callbacks.
pub struct CaptureView<'a> {
    node: Node<'a>,
    source: &'a str,
}

impl<'a> CaptureView<'a> {
    /// The captured node.
    #[must_use]
    pub fn node(&self) -> Node<'a> {
        self.node
    }

    /// The capture's source text.
    #[must_use]
    pub fn text(&self) -> &'a str {
        &self.source[self.node.byte_range()]
    }

    /// The captured node's kind.
    #[must_use]
    pub fn kind(&self) -> &'a str {
        self.node.kind()
    }
}

/// A named capture inside a collected match.
#[derive(Debug, Clone)]
pub struct CapturedNode<'t> {
    name: CompactString,
    node: Node<'t>,
}

impl<'t> CapturedNode<'t> {
    /// The capture's name, without the leading `@`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The captured node.
    #[must_use]
    pub fn node(&self) -> Node<'t> {
        self.node
    }
}

/// A collected query match: pattern index plus ordered named captures.
#[derive(Debug, Clone)]
pub struct CollectedMatch<'t> {
    pattern_index: usize,
    captures: Vec<CapturedNode<'t>>,
}

impl<'t> CollectedMatch<'t> {
    /// Index of the pattern that produced this match.
    #[must_use]
    pub fn pattern_index(&self) -> usize {
        self.pattern_index
    }

    /// The match's captures, in capture order.
    #[must_use]
    pub fn captures(&self) -> &[CapturedNode<'t>] {
        &self.captures
    }

    /// First capture with the given name (leading `@` optional).
    #[must_use]
    pub fn capture(&self, name: &str) -> Option<Node<'t>> {
        let name = name.trim_start_matches('@');
        self.captures
            .iter()
            .find(|capture| capture.name.as_str() == name)
            .map(|capture| capture.node)
    }
}

/// Read-only view of a match handed to filter predicates.
pub struct MatchContext<'a> {
    pattern_index: usize,
    captures: &'a [CapturedNode<'a>],
    source: &'a str,
}

impl<'a> MatchContext<'a> {
    /// Index of the pattern that produced this match.
    #[must_use]
    pub fn pattern_index(&self) -> usize {
        self.pattern_index
    }

    /// The match's captures, in capture order.
    #[must_use]
    pub fn captures(&self) -> &'a [CapturedNode<'a>] {
        self.captures
    }

    /// First capture with the given name (leading `@` optional).
    #[must_use]
    pub fn capture(&self, name: &str) -> Option<Node<'a>> {
        let name = name.trim_start_matches('@');
        self.captures
            .iter()
            .find(|capture| capture.name.as_str() == name)
            .map(|capture| capture.node)
    }

    /// Source text of the first capture with the given name.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&'a str> {
        self.capture(name).map(|node| &self.source[node.byte_range()])
    }

    /// Source text of an arbitrary node of the same tree.
    #[must_use]
    pub fn node_text(&self, node: Node<'_>) -> &'a str {
        &self.source[node.byte_range()]
    }
}

type MatchPredicate = Box<dyn Fn(&MatchContext<'_>) -> bool>;
type ContentFn = Box<dyn Fn(&CaptureView<'_>) -> String>;
type WrapFn = Box<dyn Fn(&CaptureView<'_>) -> (String, String)>;

enum Content {
    Text(String),
    With(ContentFn),
}

impl Content {
    fn render(&self, view: &CaptureView<'_>) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::With(f) => f(view),
        }
    }
}

enum WrapKind {
    Fixed { before: String, after: String },
    With(WrapFn),
}

impl WrapKind {
    fn render(&self, view: &CaptureView<'_>) -> (String, String) {
        match self {
            Self::Fixed { before, after } => (before.clone(), after.clone()),
            Self::With(f) => f(view),
        }
    }
}

enum QueryOp {
    Replace { name: CompactString, content: Content },
    Remove { name: CompactString },
    InsertBefore { name: CompactString, content: Content },
    InsertAfter { name: CompactString, content: Content },
    Wrap { name: CompactString, kind: WrapKind },
}

impl QueryOp {
    fn name(&self) -> &str {
        match self {
            Self::Replace { name, .. }
            | Self::Remove { name }
            | Self::InsertBefore { name, .. }
            | Self::InsertAfter { name, .. }
            | Self::Wrap { name, .. } => name,
        }
    }
}

/// Query-driven bulk edit builder.
///
/// Pipeline: [`QueryRewriter::query`] sets the pattern,
/// [`QueryRewriter::filter`] adds conjunctive predicates, the operation
/// methods key edits to capture names, and the terminals
/// ([`QueryRewriter::rewrite`], [`QueryRewriter::rewrite_with_tree`],
/// [`QueryRewriter::matches`], [`QueryRewriter::preview_edits`]) run the
/// whole pipeline.
pub struct QueryRewriter<'t> {
    source: String,
    tree: &'t Tree,
    language: Language,
    parser: Option<Parser>,
    pattern: Option<String>,
    predicates: Vec<MatchPredicate>,
    ops: Vec<QueryOp>,
}

impl<'t> QueryRewriter<'t> {
    /// Create a builder for `source` as parsed into `tree`.
    ///
    /// `language` is a grammar handle or a name; it is normalized here, at
    /// the builder boundary.
    pub fn new(
        source: impl Into<String>,
        tree: &'t Tree,
        language: impl Into<LanguageSpec>,
    ) -> Result<Self> {
        let language = language.into().resolve(tree)?;
        Ok(Self {
            source: source.into(),
            tree,
            language,
            parser: None,
            pattern: None,
            predicates: Vec::new(),
            ops: Vec::new(),
        })
    }

    /// Use an explicit parser for [`QueryRewriter::rewrite_with_tree`].
    #[must_use]
    pub fn with_parser(mut self, parser: Parser) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Set the S-expression pattern to run. The last call wins.
    #[must_use]
    pub fn query(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Add a conjunctive predicate; matches failing it are dropped.
    #[must_use]
    pub fn filter(mut self, predicate: impl Fn(&MatchContext<'_>) -> bool + 'static) -> Self {
        self.predicates.push(Box::new(predicate));
        self
    }

    /// Replace each node captured as `name` with `text`.
    #[must_use]
    pub fn replace(mut self, name: &str, text: impl Into<String>) -> Self {
        self.ops.push(QueryOp::Replace {
            name: capture_name(name),
            content: Content::Text(text.into()),
        });
        self
    }

    /// Replace each node captured as `name` with the callback's output.
    #[must_use]
    pub fn replace_with(
        mut self,
        name: &str,
        f: impl Fn(&CaptureView<'_>) -> String + 'static,
    ) -> Self {
        self.ops.push(QueryOp::Replace {
            name: capture_name(name),
            content: Content::With(Box::new(f)),
        });
        self
    }

    /// Delete each node captured as `name`.
    #[must_use]
    pub fn remove(mut self, name: &str) -> Self {
        self.ops.push(QueryOp::Remove {
            name: capture_name(name),
        });
        self
    }

    /// Insert `text` before each node captured as `name`.
    #[must_use]
    pub fn insert_before(mut self, name: &str, text: impl Into<String>) -> Self {
        self.ops.push(QueryOp::InsertBefore {
            name: capture_name(name),
            content: Content::Text(text.into()),
        });
        self
    }

    /// Insert the callback's output before each node captured as `name`.
    #[must_use]
    pub fn insert_before_with(
        mut self,
        name: &str,
        f: impl Fn(&CaptureView<'_>) -> String + 'static,
    ) -> Self {
        self.ops.push(QueryOp::InsertBefore {
            name: capture_name(name),
            content: Content::With(Box::new(f)),
        });
        self
    }

    /// Insert `text` after each node captured as `name`.
    #[must_use]
    pub fn insert_after(mut self, name: &str, text: impl Into<String>) -> Self {
        self.ops.push(QueryOp::InsertAfter {
            name: capture_name(name),
            content: Content::Text(text.into()),
        });
        self
    }

    /// Insert the callback's output after each node captured as `name`.
    #[must_use]
    pub fn insert_after_with(
        mut self,
        name: &str,
        f: impl Fn(&CaptureView<'_>) -> String + 'static,
    ) -> Self {
        self.ops.push(QueryOp::InsertAfter {
            name: capture_name(name),
            content: Content::With(Box::new(f)),
        });
        self
    }

    /// Surround each node captured as `name` with `before` and `after`.
    ///
    /// The before-insert is emitted first, so it precedes the after-insert
    /// in the output even for empty captures.
    #[must_use]
    pub fn wrap(mut self, name: &str, before: impl Into<String>, after: impl Into<String>) -> Self {
        self.ops.push(QueryOp::Wrap {
            name: capture_name(name),
            kind: WrapKind::Fixed {
                before: before.into(),
                after: after.into(),
            },
        });
        self
    }

    /// Surround each captured node with the pair the callback returns.
    #[must_use]
    pub fn wrap_with(
        mut self,
        name: &str,
        f: impl Fn(&CaptureView<'_>) -> (String, String) + 'static,
    ) -> Self {
        self.ops.push(QueryOp::Wrap {
            name: capture_name(name),
            kind: WrapKind::With(Box::new(f)),
        });
        self
    }

    /// Run the query and return the filtered matches, for inspection.
    pub fn matches(&self) -> Result<Vec<CollectedMatch<'t>>> {
        self.collect_matches()
    }

    /// The edits the pipeline lowers to.
    pub fn edits(&self) -> Result<Vec<Edit>> {
        self.lower()
    }

    /// Per-edit previews, ordered by position, without mutation.
    pub fn preview_edits(&self) -> Result<Vec<EditPreview>> {
        let mut buffer = EditBuffer::new();
        buffer.extend(self.lower()?);
        Ok(buffer.previews(&self.source))
    }

    /// Run the pipeline and return the rewritten source.
    pub fn rewrite(&self) -> Result<String> {
        let mut buffer = EditBuffer::new();
        buffer.extend(self.lower()?);
        Ok(buffer.apply(&self.source))
    }

    /// Run the pipeline, then parse the result.
    pub fn rewrite_with_tree(&mut self) -> Result<(String, Tree)> {
        let output = self.rewrite()?;
        let tree = reparse(self.parser.as_mut(), &self.language, &output)?;
        Ok((output, tree))
    }

    fn collect_matches(&self) -> Result<Vec<CollectedMatch<'t>>> {
        let pattern = self.pattern.as_deref().ok_or_else(|| {
            Error::precondition("no query pattern set; call query(...) first")
        })?;
        let query = Query::new(&self.language, pattern)?;
        let names = query.capture_names();

        let mut cursor = QueryCursor::new();
        let mut raw = cursor.matches(&query, self.tree.root_node(), self.source.as_bytes());
        let mut collected = Vec::new();
        while let Some(found) = raw.next() {
            let captures = found
                .captures
                .iter()
                .map(|capture| CapturedNode {
                    name: CompactString::from(names[capture.index as usize]),
                    node: capture.node,
                })
                .collect();
            collected.push(CollectedMatch {
                pattern_index: found.pattern_index,
                captures,
            });
        }
        debug!("query produced {} matches", collected.len());

        Ok(collected
            .into_iter()
            .filter(|found| {
                let context = MatchContext {
                    pattern_index: found.pattern_index,
                    captures: &found.captures,
                    source: &self.source,
                };
                self.predicates.iter().all(|predicate| predicate(&context))
            })
            .collect())
    }

    fn lower(&self) -> Result<Vec<Edit>> {
        let matches = self.collect_matches()?;
        let mut edits = Vec::new();
        for found in &matches {
            let mut by_name: FxHashMap<&str, Vec<Node<'t>>> = FxHashMap::default();
            for capture in &found.captures {
                by_name
                    .entry(capture.name.as_str())
                    .or_default()
                    .push(capture.node);
            }
            for op in &self.ops {
                let Some(nodes) = by_name.get(op.name()) else {
                    continue;
                };
                for &node in nodes {
                    let view = CaptureView {
                        node,
                        source: &self.source,
                    };
                    match op {
                        QueryOp::Replace { content, .. } => edits.push(Edit::new(
                            node.start_byte(),
                            node.end_byte(),
                            content.render(&view),
                        )),
                        QueryOp::Remove { .. } => {
                            edits.push(Edit::delete(node.start_byte(), node.end_byte()));
                        }
                        QueryOp::InsertBefore { content, .. } => {
                            edits.push(Edit::insert(node.start_byte(), content.render(&view)));
                        }
                        QueryOp::InsertAfter { content, .. } => {
                            edits.push(Edit::insert(node.end_byte(), content.render(&view)));
                        }
                        QueryOp::Wrap { kind, .. } => {
                            let (before, after) = kind.render(&view);
                            edits.push(Edit::insert(node.start_byte(), before));
                            edits.push(Edit::insert(node.end_byte(), after));
                        }
                    }
                }
            }
        }
        debug!("lowered query operations into {} edits", edits.len());
        Ok(edits)
    }
}

/// Normalize a capture name, stripping the leading `@` if present.
fn capture_name(name: &str) -> CompactString {
    CompactString::from(name.trim_start_matches('@'))
}
