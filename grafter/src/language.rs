//! Language handle normalization and parser plumbing.
//!
//! Builders accept a language either as a concrete grammar handle or as a
//! name; the tagged input is normalized at the builder boundary and the
//! internal representation is always a typed [`Language`].

use tree_sitter::{Language, Parser, Tree};

use crate::error::{Error, Result};

/// A caller-supplied language: a grammar handle, or a name checked against
/// the grammar the tree was parsed with.
#[derive(Debug, Clone)]
pub enum LanguageSpec {
    /// A concrete grammar handle.
    Handle(Language),
    /// A grammar name, resolved against the builder's tree.
    Name(String),
}

impl From<Language> for LanguageSpec {
    fn from(language: Language) -> Self {
        Self::Handle(language)
    }
}

impl From<&Language> for LanguageSpec {
    fn from(language: &Language) -> Self {
        Self::Handle(language.clone())
    }
}

impl From<&str> for LanguageSpec {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}

impl From<String> for LanguageSpec {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl LanguageSpec {
    /// Normalize to a concrete handle using the grammar `tree` was parsed
    /// with.
    ///
    /// A name is accepted when the tree's grammar carries no metadata name
    /// or reports the same name (ASCII case-insensitive); a mismatch is an
    /// invalid argument.
    pub(crate) fn resolve(self, tree: &Tree) -> Result<Language> {
        match self {
            Self::Handle(language) => Ok(language),
            Self::Name(name) => {
                let language = tree_language(tree);
                match language.name() {
                    Some(actual) if !actual.eq_ignore_ascii_case(&name) => {
                        Err(Error::invalid(format!(
                            "language `{name}` does not match the tree's grammar `{actual}`"
                        )))
                    }
                    _ => Ok(language),
                }
            }
        }
    }
}

/// Owned handle for the grammar a tree was parsed with.
pub(crate) fn tree_language(tree: &Tree) -> Language {
    tree.language().clone()
}

/// Build a parser configured for `language`.
pub(crate) fn parser_for(language: &Language) -> Result<Parser> {
    let mut parser = Parser::new();
    parser.set_language(language)?;
    Ok(parser)
}

/// Parse `source` with the supplied parser, or with a fresh one built for
/// `language` when none was injected. A fresh parser lives only for this
/// call.
pub(crate) fn reparse(parser: Option<&mut Parser>, language: &Language, source: &str) -> Result<Tree> {
    match parser {
        Some(parser) => parser.parse(source, None).ok_or(Error::ParseFailed),
        None => {
            let mut parser = parser_for(language)?;
            parser.parse(source, None).ok_or(Error::ParseFailed)
        }
    }
}
