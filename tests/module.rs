//! Tests for module syntax: import and export declarations

use jsparse::ast::*;
use jsparse::{ErrorKind, Options};

#[allow(clippy::unwrap_used)]
fn parse_module(source: &str) -> Program {
    jsparse::parse_module(source).unwrap()
}

fn module_err(source: &str) -> Option<ErrorKind> {
    jsparse::parse_module(source).err().map(|e| e.kind)
}

fn local_name(clause: &ImportClause) -> &str {
    match clause {
        ImportClause::Named(s) => s.local.name.as_str(),
        ImportClause::Default(s) => s.local.name.as_str(),
        ImportClause::Namespace(s) => s.local.name.as_str(),
    }
}

// ============ IMPORTS ============

#[test]
fn test_import_forms() {
    let program = parse_module(
        "import 'side-effect';
         import a from 'a';
         import * as ns from 'ns';
         import b, { c, d as e } from 'bcd';
         import f, * as g from 'fg';",
    );
    assert_eq!(program.body.len(), 5);

    let Statement::Import(bare) = &program.body[0] else {
        panic!("Expected ImportDeclaration");
    };
    assert!(bare.specifiers.is_empty());
    assert!(matches!(&bare.source.value, LiteralValue::String(s) if s.as_str() == "side-effect"));

    let Statement::Import(mixed) = &program.body[3] else {
        panic!("Expected ImportDeclaration");
    };
    let locals: Vec<&str> = mixed.specifiers.iter().map(local_name).collect();
    assert_eq!(locals, vec!["b", "c", "e"]);
    assert!(matches!(&mixed.specifiers[0], ImportClause::Default(_)));

    let Statement::Import(namespace) = &program.body[4] else {
        panic!("Expected ImportDeclaration");
    };
    assert!(matches!(&namespace.specifiers[1], ImportClause::Namespace(_)));
}

#[test]
fn test_import_with_string_name() {
    let program = jsparse::parse("import { 'a-b' as ab } from 'm';", &Options::new().module());
    let Ok(program) = program else {
        panic!("Expected string import name to parse");
    };
    let Statement::Import(decl) = &program.body[0] else {
        panic!("Expected ImportDeclaration");
    };
    let ImportClause::Named(spec) = &decl.specifiers[0] else {
        panic!("Expected ImportSpecifier");
    };
    assert!(matches!(spec.imported, ModuleExportName::String(_)));
    assert_eq!(spec.local.name.as_str(), "ab");
}

#[test]
fn test_import_specifier_rules() {
    assert_eq!(module_err("import { if } from 'm';"), Some(ErrorKind::UnexpectedReserved));
    assert!(module_err("import { if as x } from 'm';").is_none());
    assert_eq!(module_err("import { 'a' } from 'm';"), Some(ErrorKind::ExpectedToken));
    assert_eq!(module_err("import { eval } from 'm';"), Some(ErrorKind::StrictEvalArguments));
}

#[test]
fn test_import_bindings_conflict() {
    assert_eq!(module_err("import a from 'a'; let a;"), Some(ErrorKind::DuplicateBinding));
    assert_eq!(
        module_err("import { a } from 'a'; import { a } from 'b';"),
        Some(ErrorKind::DuplicateBinding)
    );
}

#[test]
fn test_import_requires_module_top_level() {
    assert_eq!(
        jsparse::parse_script("import a from 'a';").err().map(|e| e.kind),
        Some(ErrorKind::ImportOutsideModule)
    );
    assert_eq!(module_err("{ import a from 'a'; }"), Some(ErrorKind::ImportOutsideModule));
    assert_eq!(
        module_err("function f() { import a from 'a'; }"),
        Some(ErrorKind::ImportOutsideModule)
    );
}

#[test]
fn test_import_call_is_an_expression_everywhere() {
    assert!(jsparse::parse_script("import('a').then(f);").is_ok());
    assert!(module_err("{ import('a'); }").is_none());
    assert!(module_err("import.meta.url;").is_none());
}

// ============ EXPORTS ============

#[test]
fn test_export_declarations() {
    let program = parse_module(
        "export var a = 1;
         export let b;
         export const c = 2;
         export function d() {}
         export async function e() {}
         export class F {}",
    );
    assert_eq!(program.body.len(), 6);
    assert!(program
        .body
        .iter()
        .all(|s| matches!(s, Statement::ExportNamed(e) if e.declaration.is_some())));
}

#[test]
fn test_export_clause() {
    let program = parse_module("let a, b; export { a, b as c };");
    let Statement::ExportNamed(decl) = &program.body[1] else {
        panic!("Expected ExportNamedDeclaration");
    };
    assert!(decl.declaration.is_none());
    assert!(decl.source.is_none());
    assert_eq!(decl.specifiers.len(), 2);
    assert_eq!(decl.specifiers[1].exported.name(), "c");
}

#[test]
fn test_reexports() {
    let program = parse_module(
        "export { a as default, 'x y' as z } from 'm';
         export * from 'n';
         export * as ns from 'o';",
    );
    let Statement::ExportNamed(named) = &program.body[0] else {
        panic!("Expected ExportNamedDeclaration");
    };
    assert!(named.source.is_some());
    let Statement::ExportAll(all) = &program.body[1] else {
        panic!("Expected ExportAllDeclaration");
    };
    assert!(all.exported.is_none());
    let Statement::ExportAll(aliased) = &program.body[2] else {
        panic!("Expected ExportAllDeclaration");
    };
    assert!(aliased.exported.as_ref().is_some_and(|n| n.name() == "ns"));
}

#[test]
fn test_export_default_forms() {
    let program = parse_module("export default function () {}");
    let Statement::ExportDefault(decl) = &program.body[0] else {
        panic!("Expected ExportDefaultDeclaration");
    };
    assert!(matches!(&decl.declaration, ExportDefaultKind::Function(f) if f.id.is_none()));

    let program = parse_module("export default class A {}");
    assert!(matches!(
        &program.body[0],
        Statement::ExportDefault(ExportDefaultDeclaration { declaration: ExportDefaultKind::Class(_), .. })
    ));

    let program = parse_module("export default a + 1;");
    assert!(matches!(
        &program.body[0],
        Statement::ExportDefault(ExportDefaultDeclaration { declaration: ExportDefaultKind::Expression(_), .. })
    ));

    let program = parse_module("export default async function f() {}");
    assert!(matches!(
        &program.body[0],
        Statement::ExportDefault(ExportDefaultDeclaration { declaration: ExportDefaultKind::Function(f), .. }) if f.is_async
    ));
}

#[test]
fn test_duplicate_exports() {
    assert_eq!(
        module_err("export default 1; export default 2;"),
        Some(ErrorKind::DuplicateExport)
    );
    assert_eq!(
        module_err("export var a; export { a };"),
        Some(ErrorKind::DuplicateExport)
    );
    assert_eq!(
        module_err("var a, b; export { a as c, b as c };"),
        Some(ErrorKind::DuplicateExport)
    );
    assert_eq!(
        module_err("export function f() {} export { g as f } from 'm';"),
        Some(ErrorKind::DuplicateExport)
    );
    assert!(module_err("var a; export { a, a as b };").is_none());
}

#[test]
fn test_undefined_export() {
    assert_eq!(module_err("export { missing };"), Some(ErrorKind::UndefinedExport));
    assert!(module_err("export { later }; var later;").is_none());
    assert!(module_err("export { f }; function f() {}").is_none());
    assert!(module_err("import x from 'x'; export { x };").is_none());
    assert_eq!(
        module_err("function f() { var inner; } export { inner };"),
        Some(ErrorKind::UndefinedExport)
    );
}

#[test]
fn test_export_local_must_be_a_binding_name() {
    assert_eq!(module_err("export { 'a' };"), Some(ErrorKind::InvalidExportLocal));
    assert!(module_err("export { 'a' } from 'm';").is_none());
    assert_eq!(module_err("export { if };"), Some(ErrorKind::UnexpectedReserved));
    assert!(module_err("export { if } from 'm';").is_none());
}

#[test]
fn test_export_requires_module_top_level() {
    assert_eq!(
        jsparse::parse_script("export var a;").err().map(|e| e.kind),
        Some(ErrorKind::ExportOutsideModule)
    );
    assert_eq!(module_err("{ export var a; }"), Some(ErrorKind::ExportOutsideModule));
}

#[test]
fn test_module_code_is_strict() {
    assert_eq!(module_err("var eval;"), Some(ErrorKind::StrictEvalArguments));
    assert!(module_err("var await;").is_some());
    assert!(module_err("<!-- comment").is_some());
}

#[test]
fn test_module_functions_are_lexical() {
    assert_eq!(module_err("function f() {} function f() {}"), Some(ErrorKind::DuplicateBinding));
    assert!(jsparse::parse_script("function f() {} function f() {}").is_ok());
}
