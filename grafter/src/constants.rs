//! Shared lazily-built regular expressions.

use regex::Regex;
use std::sync::OnceLock;

/// Regex for plain identifiers: ASCII letters, digits, and underscores,
/// not starting with a digit.
///
/// # Panics
///
/// Panics if the regex pattern is invalid.
pub fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("Invalid identifier regex"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_re() {
        assert!(identifier_re().is_match("snake_case"));
        assert!(identifier_re().is_match("_private"));
        assert!(identifier_re().is_match("CamelCase9"));
        assert!(!identifier_re().is_match("9leading"));
        assert!(!identifier_re().is_match("kebab-case"));
        assert!(!identifier_re().is_match(""));
    }
}
