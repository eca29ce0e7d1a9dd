//! Structural transformations lowered to byte edits.
//!
//! Each operation is validated when it is queued and compiled into the
//! minimal set of independent edits at `rewrite` time: a swap is two
//! replacements, a move is a removal plus an insertion, a reorder is one
//! replacement per child whose text actually changes.

use smallvec::{smallvec, SmallVec};
use tree_sitter::{Node, Parser, Tree};

use crate::edit::{Edit, EditBuffer, EditPreview};
use crate::error::{Error, Result};
use crate::language::{reparse, tree_language};
use crate::span::Span;

/// Callback rewriting a node's text before it is re-inserted.
type TextFn = Box<dyn Fn(&str) -> String>;

/// Which side of the anchor an insertion lands on.
#[derive(Debug, Clone, Copy)]
enum Placement {
    Before,
    After,
}

enum Op {
    Swap {
        a: Span,
        b: Span,
    },
    Relocate {
        node: Span,
        at: usize,
        placement: Placement,
        sep: String,
        keep_original: bool,
    },
    Reorder {
        children: Vec<Span>,
        order: Vec<usize>,
    },
    Extract {
        node: Span,
        at: usize,
        reference: String,
        wrapper: Option<TextFn>,
    },
    Duplicate {
        node: Span,
        sep: String,
        transformer: Option<TextFn>,
    },
}

impl std::fmt::Debug for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Op::Swap { a, b } => f.debug_struct("Swap").field("a", a).field("b", b).finish(),
            Op::Relocate {
                node,
                at,
                placement,
                sep,
                keep_original,
            } => f
                .debug_struct("Relocate")
                .field("node", node)
                .field("at", at)
                .field("placement", placement)
                .field("sep", sep)
                .field("keep_original", keep_original)
                .finish(),
            Op::Reorder { children, order } => f
                .debug_struct("Reorder")
                .field("children", children)
                .field("order", order)
                .finish(),
            Op::Extract {
                node,
                at,
                reference,
                wrapper,
            } => f
                .debug_struct("Extract")
                .field("node", node)
                .field("at", at)
                .field("reference", reference)
                .field("wrapper", &wrapper.as_ref().map(|_| "Fn"))
                .finish(),
            Op::Duplicate {
                node,
                sep,
                transformer,
            } => f
                .debug_struct("Duplicate")
                .field("node", node)
                .field("sep", sep)
                .field("transformer", &transformer.as_ref().map(|_| "Fn"))
                .finish(),
        }
    }
}

/// Builder for structural operations (swap, move, copy, reorder, extract,
/// duplicate) over one source.
///
/// Node arguments contribute only their byte ranges, captured when the
/// operation is queued; the nodes themselves are not retained.
pub struct Transformer {
    source: String,
    language: tree_sitter::Language,
    parser: Option<Parser>,
    ops: Vec<Op>,
}

impl std::fmt::Debug for Transformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transformer")
            .field("source", &self.source)
            .field("ops", &self.ops)
            .finish()
    }
}

impl Transformer {
    /// Separator used by move, copy, and duplicate when none is given.
    pub const DEFAULT_SEP: &'static str = "\n";

    /// Create a builder for `source` as parsed into `tree`.
    #[must_use]
    pub fn new(source: impl Into<String>, tree: &Tree) -> Self {
        Self {
            source: source.into(),
            language: tree_language(tree),
            parser: None,
            ops: Vec::new(),
        }
    }

    /// Use an explicit parser for [`Transformer::rewrite_with_tree`].
    #[must_use]
    pub fn with_parser(mut self, parser: Parser) -> Self {
        self.parser = Some(parser);
        self
    }

    /// The source being transformed.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Exchange the texts of two nodes. Their byte ranges must be
    /// disjoint.
    pub fn swap(&mut self, a: Node<'_>, b: Node<'_>) -> Result<&mut Self> {
        let (a, b) = (Span::from(a), Span::from(b));
        if a.overlaps(&b) {
            return Err(Error::invalid(format!(
                "cannot swap overlapping ranges {}..{} and {}..{}",
                a.start, a.end, b.start, b.end
            )));
        }
        self.ops.push(Op::Swap { a, b });
        Ok(self)
    }

    /// Move `node` so its text lands immediately before `target`,
    /// followed by `sep` (default newline).
    pub fn move_before(&mut self, node: Node<'_>, target: Node<'_>, sep: Option<&str>) -> &mut Self {
        self.relocate(node, target.start_byte(), Placement::Before, sep, false)
    }

    /// Move `node` so its text lands immediately after `target`, preceded
    /// by `sep` (default newline).
    pub fn move_after(&mut self, node: Node<'_>, target: Node<'_>, sep: Option<&str>) -> &mut Self {
        self.relocate(node, target.end_byte(), Placement::After, sep, false)
    }

    /// Copy `node`'s text to immediately before `target`, followed by
    /// `sep` (default newline). The original stays in place.
    pub fn copy_before(&mut self, node: Node<'_>, target: Node<'_>, sep: Option<&str>) -> &mut Self {
        self.relocate(node, target.start_byte(), Placement::Before, sep, true)
    }

    /// Copy `node`'s text to immediately after `target`, preceded by
    /// `sep` (default newline). The original stays in place.
    pub fn copy_after(&mut self, node: Node<'_>, target: Node<'_>, sep: Option<&str>) -> &mut Self {
        self.relocate(node, target.end_byte(), Placement::After, sep, true)
    }

    /// Reorder `parent`'s named children: position `i` receives the text
    /// of child `order[i]`. `order` must be a permutation of the child
    /// indices. Positions whose text is unchanged contribute no edit.
    pub fn reorder(&mut self, parent: Node<'_>, order: &[usize]) -> Result<&mut Self> {
        let mut cursor = parent.walk();
        let children: Vec<Span> = parent.named_children(&mut cursor).map(Span::from).collect();
        if !is_permutation(order, children.len()) {
            return Err(Error::invalid(format!(
                "reorder sequence {order:?} is not a permutation of 0..{}",
                children.len()
            )));
        }
        self.ops.push(Op::Reorder {
            children,
            order: order.to_vec(),
        });
        Ok(self)
    }

    /// Replace `node` with `reference` and re-emit its text after `to`,
    /// separated by a blank line.
    pub fn extract(&mut self, node: Node<'_>, to: Node<'_>, reference: impl Into<String>) -> &mut Self {
        self.ops.push(Op::Extract {
            node: Span::from(node),
            at: to.end_byte(),
            reference: reference.into(),
            wrapper: None,
        });
        self
    }

    /// Like [`Transformer::extract`], but the re-emitted text is produced
    /// by `wrapper` from the node's original text.
    pub fn extract_with(
        &mut self,
        node: Node<'_>,
        to: Node<'_>,
        reference: impl Into<String>,
        wrapper: impl Fn(&str) -> String + 'static,
    ) -> &mut Self {
        self.ops.push(Op::Extract {
            node: Span::from(node),
            at: to.end_byte(),
            reference: reference.into(),
            wrapper: Some(Box::new(wrapper)),
        });
        self
    }

    /// Append a second copy of `node`'s text after it, preceded by `sep`
    /// (default newline).
    pub fn duplicate(&mut self, node: Node<'_>, sep: Option<&str>) -> &mut Self {
        self.ops.push(Op::Duplicate {
            node: Span::from(node),
            sep: sep.unwrap_or(Self::DEFAULT_SEP).to_owned(),
            transformer: None,
        });
        self
    }

    /// Like [`Transformer::duplicate`], but the copy is produced by
    /// `transformer` from the node's original text.
    pub fn duplicate_with(
        &mut self,
        node: Node<'_>,
        sep: Option<&str>,
        transformer: impl Fn(&str) -> String + 'static,
    ) -> &mut Self {
        self.ops.push(Op::Duplicate {
            node: Span::from(node),
            sep: sep.unwrap_or(Self::DEFAULT_SEP).to_owned(),
            transformer: Some(Box::new(transformer)),
        });
        self
    }

    /// The edits the queued operations lower to, in queueing order.
    #[must_use]
    pub fn edits(&self) -> Vec<Edit> {
        self.lower()
    }

    /// Preview the lowered edits against the source.
    #[must_use]
    pub fn preview_edits(&self) -> Vec<EditPreview> {
        let mut buffer = EditBuffer::new();
        buffer.extend(self.lower());
        buffer.previews(&self.source)
    }

    /// Lower every queued operation and apply the resulting edits.
    #[must_use]
    pub fn rewrite(&self) -> String {
        let mut buffer = EditBuffer::new();
        buffer.extend(self.lower());
        buffer.apply(&self.source)
    }

    /// Lower, apply, and parse the result.
    pub fn rewrite_with_tree(&mut self) -> Result<(String, Tree)> {
        let output = self.rewrite();
        let tree = reparse(self.parser.as_mut(), &self.language, &output)?;
        Ok((output, tree))
    }

    fn relocate(
        &mut self,
        node: Node<'_>,
        at: usize,
        placement: Placement,
        sep: Option<&str>,
        keep_original: bool,
    ) -> &mut Self {
        self.ops.push(Op::Relocate {
            node: Span::from(node),
            at,
            placement,
            sep: sep.unwrap_or(Self::DEFAULT_SEP).to_owned(),
            keep_original,
        });
        self
    }

    fn lower(&self) -> Vec<Edit> {
        let mut edits = Vec::new();
        for op in &self.ops {
            let lowered: SmallVec<[Edit; 2]> = match op {
                Op::Swap { a, b } => smallvec![
                    Edit::new(a.start, a.end, b.slice(&self.source)),
                    Edit::new(b.start, b.end, a.slice(&self.source)),
                ],
                Op::Relocate {
                    node,
                    at,
                    placement,
                    sep,
                    keep_original,
                } => {
                    let text = node.slice(&self.source);
                    let insertion = match placement {
                        Placement::Before => format!("{text}{sep}"),
                        Placement::After => format!("{sep}{text}"),
                    };
                    if *keep_original {
                        smallvec![Edit::insert(*at, insertion)]
                    } else {
                        smallvec![
                            Edit::delete(node.start, node.end),
                            Edit::insert(*at, insertion),
                        ]
                    }
                }
                Op::Reorder { children, order } => {
                    let mut lowered = SmallVec::new();
                    for (i, &from) in order.iter().enumerate() {
                        let old_text = children[i].slice(&self.source);
                        let new_text = children[from].slice(&self.source);
                        if old_text != new_text {
                            lowered.push(Edit::new(children[i].start, children[i].end, new_text));
                        }
                    }
                    lowered
                }
                Op::Extract {
                    node,
                    at,
                    reference,
                    wrapper,
                } => {
                    let body = node.slice(&self.source);
                    let body = wrapper
                        .as_ref()
                        .map_or_else(|| body.to_owned(), |wrap| wrap(body));
                    smallvec![
                        Edit::new(node.start, node.end, reference.clone()),
                        Edit::insert(*at, format!("\n\n{body}")),
                    ]
                }
                Op::Duplicate {
                    node,
                    sep,
                    transformer,
                } => {
                    let text = node.slice(&self.source);
                    let copy = transformer
                        .as_ref()
                        .map_or_else(|| text.to_owned(), |transform| transform(text));
                    smallvec![Edit::insert(node.end, format!("{sep}{copy}"))]
                }
            };
            edits.extend(lowered);
        }
        edits
    }
}

fn is_permutation(order: &[usize], len: usize) -> bool {
    if order.len() != len {
        return false;
    }
    let mut seen = vec![false; len];
    for &index in order {
        if index >= len || seen[index] {
            return false;
        }
        seen[index] = true;
    }
    true
}
