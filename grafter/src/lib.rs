//! Syntax-aware source rewriting over tree-sitter concrete syntax trees.
//!
//! Given a source string and the [`tree_sitter::Tree`] it was parsed
//! into, the builders in this crate queue replacements, removals,
//! insertions, structural transforms, and query-driven bulk edits, then
//! apply them in one deterministic pass against the original byte
//! offsets. The parser stays external: grammars are supplied by the
//! caller, and nothing here depends on any particular language beyond the
//! refactoring recipes, which bind Rust-grammar patterns.
//!
//! ```
//! use grafter::Rewriter;
//! use tree_sitter::Parser;
//!
//! let source = "fn main() {}";
//! let mut parser = Parser::new();
//! parser
//!     .set_language(&tree_sitter_rust::LANGUAGE.into())
//!     .unwrap();
//! let tree = parser.parse(source, None).unwrap();
//! let name = tree
//!     .root_node()
//!     .named_child(0)
//!     .unwrap()
//!     .child_by_field_name("name")
//!     .unwrap();
//!
//! let mut rewriter = Rewriter::new(source, &tree);
//! rewriter.replace(name, "run").unwrap();
//! assert_eq!(rewriter.rewrite(), "fn run() {}");
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

/// Module containing the byte-range edit primitives and the application
/// engine every other builder lowers into.
pub mod edit;

/// Module defining the crate-wide error taxonomy.
pub mod error;

/// Module for indentation detection, level queries, and content
/// re-indentation.
pub mod indent;

/// Module for syntax-aware insertion at container boundaries.
pub mod insert;

/// Module normalizing caller-supplied language handles and names.
pub mod language;

/// Module containing the query-driven bulk edit builder.
pub mod query;

/// Module containing the high-level refactoring recipes.
pub mod refactor;

/// Module containing the thin node/range rewriting builder.
pub mod rewrite;

/// Module defining the byte-range value type shared by every builder.
pub mod span;

/// Module containing the structural transformation builder.
pub mod transform;

/// Module containing shared constants and regex patterns.
pub mod constants;

pub use edit::{Edit, EditBuffer, EditPreview};
pub use error::{Error, Result};
pub use indent::{IndentStyle, Indentation, IndentationAnalyzer};
pub use insert::{InsertContext, Inserter};
pub use language::LanguageSpec;
pub use query::{CaptureView, CapturedNode, CollectedMatch, MatchContext, QueryRewriter};
pub use refactor::{Refactor, SymbolKind};
pub use rewrite::Rewriter;
pub use span::Span;
pub use transform::Transformer;
