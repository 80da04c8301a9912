//! Tests for the parser
//!
//! Program-level behaviour, options and the ESTree JSON shape.

use jsparse::ast::{Expression, Program, SourceType, Statement};
use jsparse::{ErrorKind, Options};
use serde_json::{json, Value};

#[allow(clippy::unwrap_used)]
fn parse(source: &str) -> Program {
    jsparse::parse_script(source).unwrap()
}

#[allow(clippy::unwrap_used)]
fn to_json(source: &str, options: &Options) -> Value {
    let program = jsparse::parse(source, options).unwrap();
    serde_json::to_value(&program).unwrap()
}

fn parse_err(source: &str, options: &Options) -> Option<ErrorKind> {
    jsparse::parse(source, options).err().map(|e| e.kind)
}

#[test]
fn test_empty_program() {
    let prog = parse("");
    assert!(prog.body.is_empty());
    assert_eq!(prog.source_type, SourceType::Script);
}

#[test]
fn test_statement_count() {
    let prog = parse("var a = 1; a++\nfoo(a)");
    assert_eq!(prog.body.len(), 3);
}

#[test]
fn test_module_source_type() {
    let Ok(prog) = jsparse::parse_module("export const a = 1;") else {
        panic!("Expected module to parse");
    };
    assert_eq!(prog.source_type, SourceType::Module);
}

#[test]
fn test_estree_expression_statement() {
    let value = to_json("a + 1;", &Options::default());
    assert_eq!(
        value,
        json!({
            "type": "Program",
            "sourceType": "script",
            "body": [{
                "type": "ExpressionStatement",
                "expression": {
                    "type": "BinaryExpression",
                    "operator": "+",
                    "left": {"type": "Identifier", "name": "a"},
                    "right": {"type": "Literal", "value": 1}
                }
            }]
        })
    );
}

#[test]
fn test_estree_variable_declaration() {
    let value = to_json("let x = null;", &Options::default());
    assert_eq!(
        value["body"][0],
        json!({
            "type": "VariableDeclaration",
            "kind": "let",
            "declarations": [{
                "type": "VariableDeclarator",
                "id": {"type": "Identifier", "name": "x"},
                "init": {"type": "Literal", "value": null}
            }]
        })
    );
}

#[test]
fn test_ranges_option() {
    let value = to_json("  foo", &Options::new().ranges());
    assert_eq!(value["start"], json!(0));
    assert_eq!(value["end"], json!(5));
    let id = &value["body"][0]["expression"];
    assert_eq!(id["start"], json!(2));
    assert_eq!(id["end"], json!(5));
    assert!(id.get("loc").is_none());
}

#[test]
fn test_loc_option() {
    let value = to_json("a;\n  bb;", &Options::new().loc());
    let id = &value["body"][1]["expression"];
    assert_eq!(
        id["loc"],
        json!({"start": {"line": 2, "column": 2}, "end": {"line": 2, "column": 4}})
    );
    assert!(id.get("start").is_none());
}

#[test]
fn test_raw_option() {
    let value = to_json("0x10; 'a';", &Options::new().raw());
    assert_eq!(value["body"][0]["expression"]["raw"], json!("0x10"));
    assert_eq!(value["body"][0]["expression"]["value"], json!(16));
    assert_eq!(value["body"][1]["expression"]["raw"], json!("'a'"));
    let without = to_json("0x10;", &Options::default());
    assert!(without["body"][0]["expression"].get("raw").is_none());
}

#[test]
fn test_directive_in_json() {
    let value = to_json("'use strict'; 1;", &Options::default());
    assert_eq!(value["body"][0]["directive"], json!("use strict"));
    assert!(value["body"][1].get("directive").is_none());
}

#[test]
fn test_regexp_literal_json() {
    let value = to_json("/ab+c/gi;", &Options::default());
    let lit = &value["body"][0]["expression"];
    assert_eq!(lit["type"], json!("Literal"));
    assert_eq!(lit["regex"], json!({"pattern": "ab+c", "flags": "gi"}));
}

#[test]
fn test_tokens_in_program() {
    let value = to_json("a;", &Options::new().tokenize());
    assert_eq!(
        value["tokens"],
        json!([
            {"type": "Identifier", "value": "a"},
            {"type": "Punctuator", "value": ";"}
        ])
    );
}

#[test]
fn test_implied_strict() {
    assert_eq!(
        parse_err("with (a) {}", &Options::new().implied_strict()),
        Some(ErrorKind::StrictWith)
    );
    assert!(parse_err("with (a) {}", &Options::default()).is_none());
}

#[test]
fn test_global_return() {
    assert_eq!(parse_err("return 1;", &Options::default()), Some(ErrorKind::IllegalReturn));
    assert!(parse_err("return 1;", &Options::new().global_return()).is_none());
}

#[test]
fn test_jsx_is_reserved_for_extension() {
    assert_eq!(
        parse_err("<div />;", &Options::new().jsx()),
        Some(ErrorKind::JsxUnsupported)
    );
}

#[test]
fn test_options_from_json_config() {
    let Ok(options) = Options::from_json(r#"{"module": true, "next": true}"#) else {
        panic!("Expected valid config");
    };
    assert!(parse_err("await x;", &options).is_none());
    assert!(Options::from_json(r#"{"bogus": 1}"#).is_err());
}

#[test]
fn test_error_position_and_message() {
    let Err(err) = jsparse::parse_script("a +\n  ;") else {
        panic!("Expected a syntax error");
    };
    assert_eq!(err.kind, ErrorKind::UnexpectedToken);
    assert_eq!(err.line, 2);
    assert_eq!(err.column, 2);
    assert_eq!(err.index, 6);
    assert_eq!(err.to_string(), "SyntaxError: Unexpected token ';' (2:2)");
}

#[test]
fn test_deep_nesting_is_rejected() {
    let source = format!("{}a{}", "[".repeat(500), "]".repeat(500));
    assert_eq!(parse_err(&source, &Options::default()), Some(ErrorKind::NestingTooDeep));
}

/// Parse on a thread with a stack of `stack` bytes
fn parse_err_with_stack(source: String, options: Options, stack: usize) -> Option<ErrorKind> {
    let handle = std::thread::Builder::new()
        .stack_size(stack)
        .spawn(move || parse_err(&source, &options));
    match handle.map(|h| h.join()) {
        Ok(Ok(kind)) => kind,
        _ => panic!("parser thread did not finish"),
    }
}

#[test]
fn test_nesting_limit_covers_functions_and_classes() {
    let cases = [
        "function a(){".repeat(10_000),
        "x = class extends ".repeat(10_000),
        "x = function(){ return function(){ ".repeat(5_000),
        "({ m() { return { m() { ".repeat(5_000),
        "class A { m() { class B extends (class {}) { n() { ".repeat(3_000),
        "(".repeat(10_000),
        "{".repeat(10_000),
        "-".repeat(10_000),
    ];
    for source in cases {
        let prefix: String = source.chars().take(24).collect();
        assert_eq!(
            parse_err_with_stack(source, Options::default(), 2 * 1024 * 1024),
            Some(ErrorKind::NestingTooDeep),
            "source starting {:?}",
            prefix
        );
    }
}

#[test]
fn test_nesting_within_default_limit_parses() {
    let functions = format!("{}{}", "function a(){".repeat(20), "}".repeat(20));
    assert!(parse_err(&functions, &Options::default()).is_none());
    let classes = format!("x = {}Object{};", "class extends ".repeat(20), " {}".repeat(20));
    assert!(parse_err(&classes, &Options::default()).is_none());
}

#[test]
fn test_long_else_if_chain_is_not_nesting() {
    let mut source = String::from("if (a) x();");
    for _ in 0..1_000 {
        source.push_str(" else if (a) x();");
    }
    source.push_str(" else y();");
    let prog = parse(&source);
    assert_eq!(prog.body.len(), 1);

    let Some(Statement::If(first)) = prog.body.first() else {
        panic!("Expected IfStatement");
    };
    let Some(second) = first.alternate.as_deref() else {
        panic!("Expected else branch");
    };
    assert!(matches!(second, Statement::If(_)));
}

#[test]
fn test_raising_the_limit_allows_deeper_nesting() {
    let source = format!("{}a{}", "[".repeat(100), "]".repeat(100));
    assert_eq!(parse_err(&source, &Options::default()), Some(ErrorKind::NestingTooDeep));
    let raised = Options::new().max_depth(200);
    assert!(parse_err_with_stack(source, raised, 16 * 1024 * 1024).is_none());
}

#[test]
fn test_hashbang_and_comments() {
    let prog = parse("#!/usr/bin/env node\n// line\n/* block */ x <!-- html\n--> also html\n");
    assert_eq!(prog.body.len(), 1);
    assert!(matches!(
        prog.body.first(),
        Some(Statement::Expression(s)) if matches!(s.expression, Expression::Identifier(_))
    ));
}
