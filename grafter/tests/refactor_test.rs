//! Tests for the high-level Refactor recipes.

use grafter::{Error, Refactor, SymbolKind};
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

fn refactor<'t>(source: &str, tree: &'t Tree) -> Refactor<'t> {
    Refactor::new(source, tree, &rust_language()).expect("build refactor facade")
}

#[test]
fn test_rename_function_definition_and_calls() {
    let source =
        "fn main() {\n    old();\n    old();\n    other();\n}\n\nfn old() {}\nfn other() {}";
    let tree = parse(source);
    let output = refactor(source, &tree)
        .rename_symbol("old", "new", SymbolKind::Function)
        .unwrap();

    assert_eq!(output.matches("old").count(), 0);
    assert_eq!(output.matches("new").count(), 3);
    assert_eq!(output.matches("other").count(), 2);
}

#[test]
fn test_rename_type() {
    let source = "struct Point { x: i32 }\nfn f(p: Point) -> Point { p }";
    let tree = parse(source);
    let output = refactor(source, &tree)
        .rename_symbol("Point", "Spot", SymbolKind::Type)
        .unwrap();

    assert_eq!(output.matches("Spot").count(), 3);
    assert!(!output.contains("Point"));
}

#[test]
fn test_rename_variable() {
    let source = "fn main() {\n    let count = 1;\n    print(count);\n}";
    let tree = parse(source);
    let output = refactor(source, &tree)
        .rename_symbol("count", "total", SymbolKind::Variable)
        .unwrap();

    assert!(!output.contains("count"));
    assert_eq!(output.matches("total").count(), 2);
}

#[test]
fn test_rename_identifier_covers_plain_and_field_identifiers() {
    let source = "struct S { data: i32 }\n\nfn get(s: &S) -> i32 {\n    let data = s.data;\n    data\n}";
    let tree = parse(source);
    let output = refactor(source, &tree)
        .rename_symbol("data", "payload", SymbolKind::Identifier)
        .unwrap();

    assert!(!output.contains("data"));
    assert_eq!(output.matches("payload").count(), 4);
    // Field declaration and field expression (field_identifier) plus the
    // let binding and trailing expression (identifier).
    assert!(output.contains("payload: i32"));
    assert!(output.contains("let payload = s.payload;"));
}

#[test]
fn test_rename_field() {
    let source = "struct P { x: i32 }\n\nfn get(p: &P) -> i32 {\n    p.x\n}";
    let tree = parse(source);
    let output = refactor(source, &tree).rename_field("x", "width").unwrap();

    assert!(output.contains("width: i32"));
    assert!(output.contains("p.width"));
    assert!(!output.contains("p.x"));
}

#[test]
fn test_rename_rejects_invalid_identifier() {
    let source = "fn main() {}";
    let tree = parse(source);
    let err = refactor(source, &tree)
        .rename_symbol("main", "not valid", SymbolKind::Function)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[test]
fn test_add_attribute() {
    let source = "struct A {}\n\nstruct B {}\n";
    let tree = parse(source);
    let output = refactor(source, &tree)
        .add_attribute("(struct_item) @item", "#[derive(Debug)]")
        .unwrap();

    assert_eq!(output.matches("#[derive(Debug)]\nstruct").count(), 2);
}

#[test]
fn test_remove_matching() {
    let source = "use std::fmt;\nuse std::io;\n\nfn main() {}\n";
    let tree = parse(source);
    let output = refactor(source, &tree)
        .remove_matching("(use_declaration) @item")
        .unwrap();

    assert!(!output.contains("use std::fmt;"));
    assert!(!output.contains("use std::io;"));
    assert!(output.contains("fn main() {}"));
}

#[test]
fn test_remove_comments() {
    let source = "// line\nfn main() {\n    /* block */\n    let x = 1;\n}\n";
    let tree = parse(source);
    let output = refactor(source, &tree).remove_comments().unwrap();

    assert!(!output.contains("line"));
    assert!(!output.contains("block"));
    assert!(output.contains("let x = 1;"));
}

#[test]
fn test_extract_function() {
    let source = "fn main() {\n    let total = 1 + 2;\n}";
    let tree = parse(source);
    let main_fn = tree.root_node().named_child(0).unwrap();
    let value = main_fn
        .child_by_field_name("body")
        .unwrap()
        .named_child(0)
        .unwrap()
        .child_by_field_name("value")
        .unwrap();

    let output = refactor(source, &tree)
        .extract_function(value, "compute", &[], None)
        .unwrap();
    assert_eq!(
        output,
        "fn main() {\n    let total = compute();\n}\n\nfn compute() {\n    1 + 2\n}"
    );
}

#[test]
fn test_extract_function_with_parameters() {
    let source = "fn main() {\n    let x = 2;\n    let total = x * 3;\n}";
    let tree = parse(source);
    let main_fn = tree.root_node().named_child(0).unwrap();
    let value = main_fn
        .child_by_field_name("body")
        .unwrap()
        .named_child(1)
        .unwrap()
        .child_by_field_name("value")
        .unwrap();

    let output = refactor(source, &tree)
        .extract_function(value, "scale", &[("x", "i32")], None)
        .unwrap();
    assert!(output.contains("let total = scale(x);"));
    assert!(output.contains("fn scale(x: i32) {\n    x * 3\n}"));
}

#[test]
fn test_extract_function_requires_a_target() {
    let source = "static X: i32 = 5;";
    let tree = parse(source);
    let value = tree
        .root_node()
        .named_child(0)
        .unwrap()
        .child_by_field_name("value")
        .unwrap();

    let err = refactor(source, &tree)
        .extract_function(value, "compute", &[], None)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[test]
fn test_inline_variable() {
    let source = "fn main() {\n    let x = 1 + 2;\n    let y = x * x;\n    print(x);\n}";
    let tree = parse(source);
    let output = refactor(source, &tree).inline_variable("x", None).unwrap();

    assert!(output.contains("let x = 1 + 2;"));
    assert!(output.contains("let y = 1 + 2 * 1 + 2;"));
    assert!(output.contains("print(1 + 2);"));
}

#[test]
fn test_inline_variable_respects_scope() {
    let source = "fn a() {\n    let x = 1;\n    use_it(x);\n}\n\nfn b() {\n    let x = 2;\n    use_it(x);\n}\n";
    let tree = parse(source);
    let first_fn = tree.root_node().named_child(0).unwrap();
    let output = refactor(source, &tree)
        .inline_variable("x", Some(first_fn))
        .unwrap();

    assert!(output.contains("fn a() {\n    let x = 1;\n    use_it(1);\n}"));
    assert!(output.contains("fn b() {\n    let x = 2;\n    use_it(x);\n}"));
}

#[test]
fn test_inline_variable_without_declaration_is_rejected() {
    let source = "fn main() {}";
    let tree = parse(source);
    let err = refactor(source, &tree)
        .inline_variable("missing", None)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}
