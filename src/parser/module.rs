//! Import and export declarations

use crate::ast::*;
use crate::context::Context;
use crate::error::{ErrorKind, ParseError};
use crate::lexer::{Span, TokenKind};
use crate::scope::BindingKind;
use crate::string_dict::JsString;

use super::Parser;
use super::function::DeclarationKind;

/// Local side of an export specifier, checked once we know whether the
/// clause re-exports from another module
struct ExportLocal {
    reserved: bool,
    span: Span,
}

impl<'a> Parser<'a> {
    // ============ IMPORTS ============

    pub(super) fn parse_import_declaration(&mut self, ctx: Context) -> Result<Statement, ParseError> {
        let start = self.current.span;
        self.expect(&TokenKind::Import)?;

        // import 'module';
        if let TokenKind::String(_) = self.current.kind {
            let source = self.parse_literal(ctx)?;
            self.consume_semicolon()?;
            return Ok(Statement::Import(ImportDeclaration {
                specifiers: Vec::new(),
                source,
                span: self.span_from(start),
            }));
        }

        let mut specifiers = Vec::new();
        if let TokenKind::Identifier(_) = self.current.kind {
            let local_start = self.current.span;
            let local = self.parse_binding_identifier(ctx, Some(BindingKind::Import))?;
            specifiers.push(ImportClause::Default(ImportDefaultSpecifier {
                local,
                span: self.span_from(local_start),
            }));
            if !self.eat(&TokenKind::Comma)? {
                return self.finish_import(ctx, start, specifiers);
            }
        }

        match self.current.kind {
            TokenKind::Star => {
                let namespace_start = self.current.span;
                self.advance()?;
                self.expect_contextual("as")?;
                let local = self.parse_binding_identifier(ctx, Some(BindingKind::Import))?;
                specifiers.push(ImportClause::Namespace(ImportNamespaceSpecifier {
                    local,
                    span: self.span_from(namespace_start),
                }));
            }
            TokenKind::LBrace => {
                self.advance()?;
                while !self.check(&TokenKind::RBrace) {
                    specifiers.push(ImportClause::Named(self.parse_import_specifier(ctx)?));
                    if !self.eat(&TokenKind::Comma)? {
                        break;
                    }
                }
                self.expect(&TokenKind::RBrace)?;
            }
            _ => return Err(self.unexpected()),
        }
        self.finish_import(ctx, start, specifiers)
    }

    /// `from 'module';`
    fn finish_import(
        &mut self,
        ctx: Context,
        start: Span,
        specifiers: Vec<ImportClause>,
    ) -> Result<Statement, ParseError> {
        self.expect_contextual("from")?;
        let source = self.parse_module_source(ctx)?;
        self.consume_semicolon()?;
        Ok(Statement::Import(ImportDeclaration {
            specifiers,
            source,
            span: self.span_from(start),
        }))
    }

    fn parse_import_specifier(&mut self, ctx: Context) -> Result<ImportSpecifier, ParseError> {
        let start = self.current.span;
        let reserved = self.current.kind.is_reserved();
        let imported = self.parse_module_export_name(ctx)?;

        let local = if self.eat_contextual("as")? {
            self.parse_binding_identifier(ctx, Some(BindingKind::Import))?
        } else {
            // `import { x }` binds `x` itself, which must then be a valid binding
            let id = match &imported {
                ModuleExportName::Identifier(id) if !reserved => id.clone(),
                ModuleExportName::Identifier(id) => {
                    return Err(self.error_at(ErrorKind::UnexpectedReserved, &[id.name.as_str()], id.span));
                }
                ModuleExportName::String(lit) => {
                    return Err(self.error_at(ErrorKind::ExpectedToken, &["as", "}"], lit.span));
                }
            };
            self.validate_reference_name(ctx, id.name.as_str(), id.span)?;
            self.check_binding_name(ctx, id.name.as_str(), Some(BindingKind::Import), id.span)?;
            self.declare(ctx, &id, BindingKind::Import)?;
            id
        };

        Ok(ImportSpecifier {
            imported,
            local,
            span: self.span_from(start),
        })
    }

    /// IdentifierName or string literal
    fn parse_module_export_name(&mut self, ctx: Context) -> Result<ModuleExportName, ParseError> {
        if let TokenKind::String(_) = self.current.kind {
            return self.parse_literal(ctx).map(ModuleExportName::String);
        }
        self.parse_identifier_name().map(ModuleExportName::Identifier)
    }

    fn parse_module_source(&mut self, ctx: Context) -> Result<Literal, ParseError> {
        match self.current.kind {
            TokenKind::String(_) => self.parse_literal(ctx),
            _ => Err(self.unexpected()),
        }
    }

    // ============ EXPORTS ============

    pub(super) fn parse_export_declaration(&mut self, ctx: Context) -> Result<Statement, ParseError> {
        let start = self.current.span;
        self.expect(&TokenKind::Export)?;

        match self.current.kind {
            TokenKind::Star => self.parse_export_all(ctx, start),
            TokenKind::Default => self.parse_export_default(ctx, start),
            TokenKind::LBrace => self.parse_export_clause(ctx, start),
            _ => self.parse_export_named_declaration(ctx, start),
        }
    }

    /// `export * from 'm'` and `export * as name from 'm'`
    fn parse_export_all(&mut self, ctx: Context, start: Span) -> Result<Statement, ParseError> {
        self.expect(&TokenKind::Star)?;
        let exported = if self.eat_contextual("as")? {
            let name = self.parse_module_export_name(ctx)?;
            self.declare_export(&name)?;
            Some(name)
        } else {
            None
        };
        self.expect_contextual("from")?;
        let source = self.parse_module_source(ctx)?;
        self.consume_semicolon()?;
        Ok(Statement::ExportAll(ExportAllDeclaration {
            exported,
            source,
            span: self.span_from(start),
        }))
    }

    fn parse_export_default(&mut self, ctx: Context, start: Span) -> Result<Statement, ParseError> {
        let default_span = self.current.span;
        self.expect(&TokenKind::Default)?;
        let declaration_start = self.current.span;

        let async_function = if self.is_contextual("async") {
            let (next, newline) = self.peek()?;
            next.kind == TokenKind::Function && !newline
        } else {
            false
        };

        let declaration = match self.current.kind {
            TokenKind::Function => {
                let function =
                    self.parse_function_declaration(ctx, declaration_start, false, DeclarationKind::DefaultExport)?;
                ExportDefaultKind::Function(Box::new(function))
            }
            TokenKind::Class => {
                let class = self.parse_class(ctx, declaration_start, DeclarationKind::DefaultExport, Vec::new())?;
                ExportDefaultKind::Class(Box::new(class))
            }
            TokenKind::At => {
                let decorators = self.parse_decorators(ctx)?;
                if !self.check(&TokenKind::Class) {
                    return Err(self.unexpected());
                }
                let class = self.parse_class(ctx, declaration_start, DeclarationKind::DefaultExport, decorators)?;
                ExportDefaultKind::Class(Box::new(class))
            }
            _ if async_function => {
                self.advance()?;
                let function =
                    self.parse_function_declaration(ctx, declaration_start, true, DeclarationKind::DefaultExport)?;
                ExportDefaultKind::Function(Box::new(function))
            }
            _ => {
                let expression = self.parse_assignment_expression(ctx.with_in())?;
                self.consume_semicolon()?;
                ExportDefaultKind::Expression(expression)
            }
        };

        let name = self.intern("default");
        if self.scopes.declare_export(&name).is_err() {
            return Err(self.error_at(ErrorKind::DuplicateExport, &["default"], default_span));
        }
        Ok(Statement::ExportDefault(ExportDefaultDeclaration {
            declaration,
            span: self.span_from(start),
        }))
    }

    /// `export { a, b as c }` with an optional `from` clause
    fn parse_export_clause(&mut self, ctx: Context, start: Span) -> Result<Statement, ParseError> {
        self.expect(&TokenKind::LBrace)?;
        let mut specifiers = Vec::new();
        let mut locals = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            let spec_start = self.current.span;
            locals.push(ExportLocal {
                reserved: self.current.kind.is_reserved(),
                span: spec_start,
            });
            let local = self.parse_module_export_name(ctx)?;
            let exported = if self.eat_contextual("as")? {
                self.parse_module_export_name(ctx)?
            } else {
                local.clone()
            };
            self.declare_export(&exported)?;
            specifiers.push(ExportSpecifier {
                local,
                exported,
                span: self.span_from(spec_start),
            });
            if !self.eat(&TokenKind::Comma)? {
                break;
            }
        }
        self.expect(&TokenKind::RBrace)?;

        let source = if self.eat_contextual("from")? {
            Some(self.parse_module_source(ctx)?)
        } else {
            // Without `from`, every local must name a binding of this module
            for (specifier, local) in specifiers.iter().zip(&locals) {
                let id = match &specifier.local {
                    ModuleExportName::String(_) => {
                        return Err(self.error_at(ErrorKind::InvalidExportLocal, &[], local.span));
                    }
                    ModuleExportName::Identifier(id) => id,
                };
                if local.reserved {
                    return Err(self.error_at(ErrorKind::UnexpectedReserved, &[id.name.as_str()], local.span));
                }
                self.validate_reference_name(ctx, id.name.as_str(), local.span)?;
                self.scopes.reference_export(&id.name, local.span);
            }
            None
        };
        self.consume_semicolon()?;

        Ok(Statement::ExportNamed(ExportNamedDeclaration {
            declaration: None,
            specifiers,
            source,
            span: self.span_from(start),
        }))
    }

    /// `export var|let|const|function|class ...`
    fn parse_export_named_declaration(&mut self, ctx: Context, start: Span) -> Result<Statement, ParseError> {
        let declaration_start = self.current.span;
        let declaration = match self.current.kind {
            TokenKind::Var => self.parse_variable_statement(ctx, VariableKind::Var)?,
            TokenKind::Const => self.parse_variable_statement(ctx, VariableKind::Const)?,
            TokenKind::Identifier(_) if self.is_contextual("let") => {
                self.parse_variable_statement(ctx, VariableKind::Let)?
            }
            TokenKind::Function => {
                let function =
                    self.parse_function_declaration(ctx, declaration_start, false, DeclarationKind::Statement)?;
                Statement::FunctionDeclaration(Box::new(function))
            }
            TokenKind::Class | TokenKind::At => {
                let decorators = if self.check(&TokenKind::At) {
                    self.parse_decorators(ctx)?
                } else {
                    Vec::new()
                };
                if !self.check(&TokenKind::Class) {
                    return Err(self.unexpected());
                }
                let class = self.parse_class(ctx, declaration_start, DeclarationKind::Statement, decorators)?;
                Statement::ClassDeclaration(Box::new(class))
            }
            TokenKind::Identifier(_) if self.is_contextual("async") => {
                let (next, newline) = self.peek()?;
                if next.kind != TokenKind::Function || newline {
                    return Err(self.unexpected());
                }
                self.advance()?;
                let function =
                    self.parse_function_declaration(ctx, declaration_start, true, DeclarationKind::Statement)?;
                Statement::FunctionDeclaration(Box::new(function))
            }
            _ => return Err(self.unexpected()),
        };

        let mut names: Vec<(JsString, Span)> = Vec::new();
        match &declaration {
            Statement::VariableDeclaration(var) => {
                let mut ids = Vec::new();
                for declarator in &var.declarations {
                    declarator.id.bound_names(&mut ids);
                }
                names.extend(ids.into_iter().map(|id| (id.name.clone(), id.span)));
            }
            Statement::FunctionDeclaration(function) => {
                if let Some(id) = &function.id {
                    names.push((id.name.clone(), id.span));
                }
            }
            Statement::ClassDeclaration(class) => {
                if let Some(id) = &class.id {
                    names.push((id.name.clone(), id.span));
                }
            }
            _ => {}
        }
        for (name, span) in names {
            if self.scopes.declare_export(&name).is_err() {
                return Err(self.error_at(ErrorKind::DuplicateExport, &[name.as_str()], span));
            }
        }

        Ok(Statement::ExportNamed(ExportNamedDeclaration {
            declaration: Some(Box::new(declaration)),
            specifiers: Vec::new(),
            source: None,
            span: self.span_from(start),
        }))
    }

    /// Record an exported name, failing on duplicates
    fn declare_export(&mut self, name: &ModuleExportName) -> Result<(), ParseError> {
        let exported = self.intern(name.name());
        if self.scopes.declare_export(&exported).is_err() {
            Err(self.error_at(ErrorKind::DuplicateExport, &[exported.as_str()], name.span()))
        } else {
            Ok(())
        }
    }
}
