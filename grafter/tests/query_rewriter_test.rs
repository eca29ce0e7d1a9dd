//! Tests for the query-driven QueryRewriter.

use grafter::{Error, QueryRewriter};
use tree_sitter::{Language, Parser, Tree};

fn rust_language() -> Language {
    tree_sitter_rust::LANGUAGE.into()
}

fn parse(source: &str) -> Tree {
    let mut parser = Parser::new();
    parser
        .set_language(&rust_language())
        .expect("load rust grammar");
    parser.parse(source, None).expect("parse source")
}

#[test]
fn test_remove_line_comments() {
    let source = "// A\nfn main() {\n    // B\n    let x = 1;\n}\n";
    let tree = parse(source);
    let output = QueryRewriter::new(source, &tree, &rust_language())
        .unwrap()
        .query("(line_comment) @c")
        .remove("@c")
        .rewrite()
        .unwrap();

    assert!(!output.contains("A"));
    assert!(!output.contains("B"));
    assert!(output.contains("fn main()"));
    assert!(output.contains("let x = 1;"));
}

#[test]
fn test_wrap_function_name() {
    let source = "fn f() {}";
    let tree = parse(source);
    let output = QueryRewriter::new(source, &tree, &rust_language())
        .unwrap()
        .query("(function_item name: (identifier) @name)")
        .wrap("@name", "/*", "*/")
        .rewrite()
        .unwrap();
    assert!(output.contains("/*f*/"));
}

#[test]
fn test_replace_with_callback() {
    let source = "fn main() { alpha(); beta(); }";
    let tree = parse(source);
    let output = QueryRewriter::new(source, &tree, &rust_language())
        .unwrap()
        .query("(call_expression function: (identifier) @callee)")
        .replace_with("callee", |capture| capture.text().to_uppercase())
        .rewrite()
        .unwrap();
    assert!(output.contains("ALPHA();"));
    assert!(output.contains("BETA();"));
}

#[test]
fn test_filters_are_conjunctive() {
    let source = "// keep this\n// drop this\nfn main() {}\n";
    let tree = parse(source);

    let output = QueryRewriter::new(source, &tree, &rust_language())
        .unwrap()
        .query("(line_comment) @c")
        .filter(|found| found.text("c").is_some_and(|text| text.contains("drop")))
        .remove("c")
        .rewrite()
        .unwrap();
    assert!(output.contains("// keep this"));
    assert!(!output.contains("drop this"));

    let untouched = QueryRewriter::new(source, &tree, &rust_language())
        .unwrap()
        .query("(line_comment) @c")
        .filter(|found| found.text("c").is_some_and(|text| text.contains("drop")))
        .filter(|_| false)
        .remove("c")
        .rewrite()
        .unwrap();
    assert_eq!(untouched, source);
}

#[test]
fn test_insert_before_and_after_captures() {
    let source = "fn a() {}";
    let tree = parse(source);
    let output = QueryRewriter::new(source, &tree, &rust_language())
        .unwrap()
        .query("(function_item name: (identifier) @name)")
        .insert_before("name", "pre_")
        .insert_after_with("name", |capture| format!("_{}", capture.text().len()))
        .rewrite()
        .unwrap();
    assert_eq!(output, "fn pre_a_1() {}");
}

#[test]
fn test_matches_introspection() {
    let source = "fn a() {}\nfn b() {}\n";
    let tree = parse(source);
    let matches = QueryRewriter::new(source, &tree, &rust_language())
        .unwrap()
        .query("(function_item name: (identifier) @name) @item")
        .matches()
        .unwrap();

    assert_eq!(matches.len(), 2);
    let first = &matches[0];
    assert_eq!(first.pattern_index(), 0);
    assert!(first.capture("item").is_some());
    let name = first.capture("@name").unwrap();
    assert_eq!(&source[name.byte_range()], "a");
}

#[test]
fn test_preview_edits_reports_ranges_without_mutation() {
    let source = "// A\nfn main() {}\n";
    let tree = parse(source);
    let rewriter = QueryRewriter::new(source, &tree, &rust_language())
        .unwrap()
        .query("(line_comment) @c")
        .remove("c");

    let previews = rewriter.preview_edits().unwrap();
    assert_eq!(previews.len(), 1);
    assert_eq!(previews[0].original, "// A");
    assert_eq!(previews[0].replacement, "");

    let json = serde_json::to_string(&previews).expect("serialize previews");
    assert!(json.contains("\"original\""));
}

#[test]
fn test_missing_pattern_is_a_precondition_error() {
    let source = "fn main() {}";
    let tree = parse(source);
    let err = QueryRewriter::new(source, &tree, &rust_language())
        .unwrap()
        .remove("c")
        .rewrite()
        .unwrap_err();
    assert!(matches!(err, Error::MissingPrecondition(_)));
}

#[test]
fn test_malformed_pattern_surfaces_query_error() {
    let source = "fn main() {}";
    let tree = parse(source);
    let err = QueryRewriter::new(source, &tree, &rust_language())
        .unwrap()
        .query("(line_comment")
        .remove("c")
        .rewrite()
        .unwrap_err();
    assert!(matches!(err, Error::Query(_)));
}

#[test]
fn test_language_accepted_by_name() {
    let source = "// gone\nfn main() {}\n";
    let tree = parse(source);
    let output = QueryRewriter::new(source, &tree, "rust")
        .unwrap()
        .query("(line_comment) @c")
        .remove("c")
        .rewrite()
        .unwrap();
    assert!(!output.contains("gone"));
}

#[test]
fn test_rewrite_with_tree_reparses() {
    let source = "// A\nfn main() {}\n";
    let tree = parse(source);
    let mut rewriter = QueryRewriter::new(source, &tree, &rust_language())
        .unwrap()
        .query("(line_comment) @c")
        .remove("c");
    let (output, new_tree) = rewriter.rewrite_with_tree().unwrap();
    assert!(!output.contains("// A"));
    assert_eq!(new_tree.root_node().kind(), "source_file");
    assert!(!new_tree.root_node().has_error());
}
