//! Crate-wide error taxonomy.
//!
//! Every recoverable failure is surfaced synchronously by the call that
//! provoked it; nothing is retried. Edit application itself has no failure
//! mode, so the variants here cover argument validation, missing builder
//! state, and errors surfaced unchanged from the external parser and query
//! engine.

use thiserror::Error;

/// Convenience alias for fallible operations in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the rewriting builders.
#[derive(Debug, Error)]
pub enum Error {
    /// A caller-supplied argument is structurally invalid: a byte range
    /// outside the source, overlapping swap targets, a reorder sequence
    /// that is not a permutation, or a mismatched language name.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An operation was invoked before the state it depends on was
    /// established, such as inserting without an insertion point.
    #[error("missing precondition: {0}")]
    MissingPrecondition(String),

    /// The query engine rejected a pattern; surfaced unchanged.
    #[error(transparent)]
    Query(#[from] tree_sitter::QueryError),

    /// The parser rejected the language handle.
    #[error(transparent)]
    Language(#[from] tree_sitter::LanguageError),

    /// The parser returned no tree for the rewritten source.
    #[error("parser produced no tree")]
    ParseFailed,
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub(crate) fn precondition(msg: impl Into<String>) -> Self {
        Self::MissingPrecondition(msg.into())
    }
}
