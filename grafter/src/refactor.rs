//! High-level refactoring recipes composed from the query and transform
//! builders.
//!
//! The recipes bind query patterns over tree-sitter-rust node kinds
//! (`function_item`, `let_declaration`, `field_identifier`); other
//! grammars go through [`QueryRewriter`] directly with their own
//! patterns.

use tree_sitter::{Node, Tree};

use crate::constants::identifier_re;
use crate::error::{Error, Result};
use crate::indent::IndentationAnalyzer;
use crate::language::LanguageSpec;
use crate::query::QueryRewriter;
use crate::span::Span;
use crate::transform::Transformer;

/// What a symbol rename should target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    /// Function definitions and direct calls.
    Function,
    /// Type names.
    Type,
    /// Variable identifiers.
    Variable,
    /// Any identifier-like leaf.
    Identifier,
}

impl SymbolKind {
    fn pattern(self) -> &'static str {
        match self {
            Self::Function => {
                "(function_item name: (identifier) @name) \
                 (call_expression function: (identifier) @name)"
            }
            Self::Type => "(type_identifier) @name",
            Self::Variable => "(identifier) @name",
            Self::Identifier => "[(identifier) (field_identifier)] @name",
        }
    }
}

/// Parent kinds under which an identifier is a binding site rather than a
/// usage; `inline_variable` leaves those alone.
const DECLARATION_PARENTS: [&str; 3] = ["let_declaration", "parameter", "function_item"];

/// Recipe facade over one parsed source.
pub struct Refactor<'t> {
    source: String,
    tree: &'t Tree,
    language: tree_sitter::Language,
}

impl<'t> Refactor<'t> {
    /// Create a facade for `source` as parsed into `tree`. The language is
    /// normalized at this boundary.
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
        })
    }

    /// The source the recipes rewrite.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Rename a symbol everywhere its kind's pattern matches.
    ///
    /// Matches are kept only when one of their captures reads exactly
    /// `from`; every `@name` capture of a kept match becomes `to`.
    pub fn rename_symbol(&self, from: &str, to: &str, kind: SymbolKind) -> Result<String> {
        ensure_identifier(to)?;
        let from = from.to_owned();
        self.rewriter()?
            .query(kind.pattern())
            .filter(move |found| {
                found
                    .captures()
                    .iter()
                    .any(|capture| found.node_text(capture.node()) == from)
            })
            .replace("name", to)
            .rewrite()
    }

    /// Rename a struct field at its declaration and every use.
    ///
    /// One `(field_identifier)` pattern covers declarations and field
    /// expressions; listing those positions separately would capture the
    /// same node twice and double-edit it.
    pub fn rename_field(&self, from: &str, to: &str) -> Result<String> {
        ensure_identifier(to)?;
        let from = from.to_owned();
        self.rewriter()?
            .query("(field_identifier) @name")
            .filter(move |found| {
                found
                    .captures()
                    .iter()
                    .any(|capture| found.node_text(capture.node()) == from)
            })
            .replace("name", to)
            .rewrite()
    }

    /// Insert `attribute` on its own line before every node the pattern
    /// captures as `@item`.
    pub fn add_attribute(&self, pattern: &str, attribute: &str) -> Result<String> {
        self.rewriter()?
            .query(pattern)
            .insert_before("item", format!("{attribute}\n"))
            .rewrite()
    }

    /// Remove every node the pattern captures as `@item`.
    pub fn remove_matching(&self, pattern: &str) -> Result<String> {
        self.remove_matching_capture(pattern, "item")
    }

    /// Remove every node captured under `capture_name`.
    pub fn remove_matching_capture(&self, pattern: &str, capture_name: &str) -> Result<String> {
        self.rewriter()?.query(pattern).remove(capture_name).rewrite()
    }

    /// Strip every line and block comment.
    pub fn remove_comments(&self) -> Result<String> {
        self.remove_matching_capture("[(line_comment) (block_comment)] @comment", "comment")
    }

    /// Replace `node` with a call to `name` and emit the extracted
    /// function after the enclosing `function_item` (or after
    /// `insert_after` when supplied).
    ///
    /// `parameters` are `(name, type)` pairs: the call reference uses the
    /// names, the definition uses `name: type`. The body is re-indented
    /// one level.
    pub fn extract_function(
        &self,
        node: Node<'t>,
        name: &str,
        parameters: &[(&str, &str)],
        insert_after: Option<Node<'t>>,
    ) -> Result<String> {
        ensure_identifier(name)?;
        let target = match insert_after {
            Some(target) => target,
            None => enclosing_function(node).ok_or_else(|| {
                Error::invalid("node has no enclosing function to extract after")
            })?,
        };

        let args = parameters
            .iter()
            .map(|(param, _)| *param)
            .collect::<Vec<_>>()
            .join(", ");
        let params = parameters
            .iter()
            .map(|(param, ty)| format!("{param}: {ty}"))
            .collect::<Vec<_>>()
            .join(", ");
        let reference = format!("{name}({args})");
        let header = format!("fn {name}({params})");

        let analyzer = IndentationAnalyzer::new(self.source.clone());
        let mut transformer = Transformer::new(self.source.clone(), self.tree);
        transformer.extract_with(node, target, reference, move |body| {
            let body = analyzer.adjust_indentation(body.trim(), 1, None);
            format!("{header} {{\n{body}\n}}")
        });
        Ok(transformer.rewrite())
    }

    /// Replace usages of `name` with the text of its `let` initializer.
    ///
    /// The first `let_declaration` binding `name` (inside `scope` when one
    /// is given) supplies the value text; identifiers whose parent kind is
    /// a binding site are left alone, as is the declaration itself.
    pub fn inline_variable(&self, name: &str, scope: Option<Node<'t>>) -> Result<String> {
        let scope_span = scope.map(Span::from);
        let wanted = name.to_owned();
        let declarations = self
            .rewriter()?
            .query("(let_declaration pattern: (identifier) @name value: (_) @value)")
            .filter(move |found| found.text("name") == Some(wanted.as_str()))
            .matches()?;

        let value = declarations
            .iter()
            .find_map(|declaration| {
                let ident = declaration.capture("name")?;
                if !within(ident, scope_span) {
                    return None;
                }
                declaration.capture("value")
            })
            .ok_or_else(|| Error::invalid(format!("no let binding found for `{name}`")))?;
        let value_text = self.source[value.byte_range()].to_owned();

        let wanted = name.to_owned();
        self.rewriter()?
            .query("(identifier) @id")
            .filter(move |found| {
                let Some(node) = found.capture("id") else {
                    return false;
                };
                if found.node_text(node) != wanted || !within(node, scope_span) {
                    return false;
                }
                node.parent()
                    .map_or(true, |parent| !DECLARATION_PARENTS.contains(&parent.kind()))
            })
            .replace("id", value_text)
            .rewrite()
    }

    fn rewriter(&self) -> Result<QueryRewriter<'t>> {
        QueryRewriter::new(self.source.clone(), self.tree, &self.language)
    }
}

fn ensure_identifier(name: &str) -> Result<()> {
    if identifier_re().is_match(name) {
        Ok(())
    } else {
        Err(Error::invalid(format!("`{name}` is not a valid identifier")))
    }
}

fn enclosing_function(node: Node<'_>) -> Option<Node<'_>> {
    let mut current = node.parent();
    while let Some(ancestor) = current {
        if ancestor.kind() == "function_item" {
            return Some(ancestor);
        }
        current = ancestor.parent();
    }
    None
}

fn within(node: Node<'_>, scope: Option<Span>) -> bool {
    scope.map_or(true, |span| {
        node.start_byte() >= span.start && node.end_byte() <= span.end
    })
}
