//! Functions, arrow functions, methods and classes

use rustc_hash::{FxHashMap, FxHashSet};

use crate::ast::*;
use crate::context::Context;
use crate::error::{ErrorKind, ParseError};
use crate::lexer::{is_strict_reserved, Span, TokenKind};
use crate::scope::{BindingKind, ScopeKind};
use crate::string_dict::JsString;

use super::Parser;

/// Where a function or class is being parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum DeclarationKind {
    Expression,
    Statement,
    /// `export default function` / `export default class`: the name is optional
    DefaultExport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum MethodFlavor {
    Method,
    Getter,
    Setter,
    Constructor,
    /// Constructor of a class with `extends`: `super()` is legal
    DerivedConstructor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PrivateKind {
    Field,
    Method,
    Getter,
    Setter,
    /// Getter and setter pair
    Accessor,
}

/// Private names of one class body
#[derive(Debug, Default)]
pub(super) struct PrivateScope {
    declared: FxHashMap<JsString, (PrivateKind, bool)>,
    /// References not yet matched to a declaration
    unresolved: Vec<(JsString, Span)>,
}

impl PrivateScope {
    /// Record a declaration; a getter and setter of the same name pair up
    fn declare(&mut self, name: &JsString, kind: PrivateKind, is_static: bool) -> bool {
        match self.declared.get_mut(name) {
            None => {
                self.declared.insert(name.clone(), (kind, is_static));
                true
            }
            Some((existing, existing_static)) => {
                let pairs = matches!(
                    (*existing, kind),
                    (PrivateKind::Getter, PrivateKind::Setter) | (PrivateKind::Setter, PrivateKind::Getter)
                );
                if pairs && *existing_static == is_static {
                    *existing = PrivateKind::Accessor;
                    true
                } else {
                    false
                }
            }
        }
    }
}

/// Parameter list properties that decide which duplicate rules apply
#[derive(Debug, Clone, Copy)]
struct ParamRules {
    /// Arrow functions and methods never allow duplicates
    unique: bool,
}

impl<'a> Parser<'a> {
    // ============ FUNCTIONS ============

    /// `function` expression; `start` is the `function` (or `async`) token
    pub(super) fn parse_function_expression(
        &mut self,
        ctx: Context,
        start: Span,
        is_async: bool,
    ) -> Result<Function, ParseError> {
        self.expect(&TokenKind::Function)?;
        let generator = self.eat(&TokenKind::Star)?;
        let id = if matches!(self.current.kind, TokenKind::Identifier(_)) {
            // The name of a function expression lives in the function's own scope
            let name_ctx = ctx.with(Context::YIELD, generator).with(Context::AWAIT, is_async);
            Some(self.parse_binding_identifier(name_ctx, None)?)
        } else {
            None
        };
        self.parse_function_rest(ctx, start, id, is_async, generator, false)
    }

    /// Function declaration; the name is bound in the enclosing scope
    pub(super) fn parse_function_declaration(
        &mut self,
        ctx: Context,
        start: Span,
        is_async: bool,
        kind: DeclarationKind,
    ) -> Result<Function, ParseError> {
        self.expect(&TokenKind::Function)?;
        let generator = self.eat(&TokenKind::Star)?;
        let id = if kind == DeclarationKind::DefaultExport && self.check(&TokenKind::LParen) {
            None
        } else {
            Some(self.parse_binding_identifier(ctx, Some(BindingKind::Function))?)
        };
        self.parse_function_rest(ctx, start, id, is_async, generator, true)
    }

    fn parse_function_rest(
        &mut self,
        ctx: Context,
        start: Span,
        id: Option<Identifier>,
        is_async: bool,
        generator: bool,
        declaration: bool,
    ) -> Result<Function, ParseError> {
        self.nested(|p| p.parse_function_tail(ctx, start, id, is_async, generator, declaration))
    }

    fn parse_function_tail(
        &mut self,
        ctx: Context,
        start: Span,
        id: Option<Identifier>,
        is_async: bool,
        generator: bool,
        declaration: bool,
    ) -> Result<Function, ParseError> {
        let state = self.enter_function_state();
        self.scopes.push(ScopeKind::Function);

        let fn_ctx = ctx.enter_function(is_async, generator);
        let params = self.parse_formal_parameters(fn_ctx)?;
        let body = self.parse_function_body(fn_ctx, &params, ParamRules { unique: false }, id.as_ref())?;

        self.scopes.pop();
        self.leave_function_state(state);
        Ok(Function {
            id,
            params,
            body,
            generator,
            is_async,
            declaration,
            span: self.span_from(start),
        })
    }

    /// `( FormalParameters )`
    fn parse_formal_parameters(&mut self, ctx: Context) -> Result<Vec<Pattern>, ParseError> {
        self.expect(&TokenKind::LParen)?;
        let ctx = ctx | Context::IN_PARAMETERS;
        let mut params = Vec::new();
        while !self.check(&TokenKind::RParen) {
            if self.check(&TokenKind::DotDotDot) {
                params.push(self.parse_rest_element(ctx, None)?);
                break;
            }
            params.push(self.parse_binding_element(ctx, None)?);
            if !self.check(&TokenKind::RParen) {
                self.expect(&TokenKind::Comma)?;
            }
        }
        self.expect(&TokenKind::RParen)?;
        Ok(params)
    }

    /// `{ FunctionBody }`. Parameter rules are applied after the directive
    /// prologue, since a `"use strict"` there covers the parameters too.
    fn parse_function_body(
        &mut self,
        ctx: Context,
        params: &[Pattern],
        rules: ParamRules,
        id: Option<&Identifier>,
    ) -> Result<BlockStatement, ParseError> {
        let start = self.current.span;
        self.expect(&TokenKind::LBrace)?;

        let mut body = Vec::new();
        let (body_ctx, use_strict) = self.parse_directives(ctx, &mut body)?;
        if use_strict && !params.iter().all(Pattern::is_simple) {
            return Err(self.error_at(ErrorKind::IllegalUseStrict, &[], start));
        }
        if use_strict && !ctx.is_strict() {
            if let Some(id) = id {
                self.check_strict_name(&id.name, id.span)?;
            }
        }
        let simple = params.iter().all(Pattern::is_simple);
        self.declare_params(body_ctx, params, rules.unique || !simple)?;

        while !self.check(&TokenKind::RBrace) {
            if self.is_at_end() {
                return Err(self.error(ErrorKind::UnexpectedEof, &[]));
            }
            body.push(self.parse_statement_list_item(body_ctx, false)?);
        }
        self.expect(&TokenKind::RBrace)?;
        Ok(BlockStatement {
            body,
            span: self.span_from(start),
        })
    }

    /// Names that a strict body forbids retroactively
    fn check_strict_name(&self, name: &str, span: Span) -> Result<(), ParseError> {
        if name == "eval" || name == "arguments" {
            return Err(self.error_at(ErrorKind::StrictEvalArguments, &[], span));
        }
        if is_strict_reserved(name) {
            return Err(self.error_at(ErrorKind::UnexpectedStrictReserved, &[name], span));
        }
        Ok(())
    }

    /// Validate parameter names and bind them in the function scope
    fn declare_params(
        &mut self,
        ctx: Context,
        params: &[Pattern],
        unique: bool,
    ) -> Result<(), ParseError> {
        let mut names = Vec::new();
        for param in params {
            param.bound_names(&mut names);
        }
        let mut seen = FxHashSet::default();
        for id in names {
            if ctx.is_strict() {
                self.check_strict_name(&id.name, id.span)?;
            }
            if !seen.insert(id.name.clone()) {
                if ctx.is_strict() {
                    return Err(self.error_at(ErrorKind::StrictParamDuplicate, &[], id.span));
                }
                if unique {
                    return Err(self.error_at(ErrorKind::DuplicateParameter, &[id.name.as_str()], id.span));
                }
            }
            self.declare(ctx, id, BindingKind::Param)?;
        }
        Ok(())
    }

    /// Rest of an arrow function once its parameters are known. The current
    /// token is `=>`.
    pub(super) fn parse_arrow_function(
        &mut self,
        ctx: Context,
        start: Span,
        params: Vec<Pattern>,
        is_async: bool,
    ) -> Result<Expression, ParseError> {
        self.expect(&TokenKind::Arrow)?;
        let state = self.enter_function_state();
        self.scopes.push(ScopeKind::Function);
        let arrow_ctx = ctx.enter_arrow(is_async);

        let (body, expression) = if self.check(&TokenKind::LBrace) {
            let block = self.parse_function_body(arrow_ctx, &params, ParamRules { unique: true }, None)?;
            (ArrowBody::Block(block), false)
        } else {
            self.declare_params(arrow_ctx, &params, true)?;
            let expr = self.parse_assignment_expression(arrow_ctx)?;
            (ArrowBody::Expression(Box::new(expr)), true)
        };

        self.scopes.pop();
        self.leave_function_state(state);
        Ok(Expression::ArrowFunction(Box::new(ArrowFunctionExpression {
            params,
            body,
            is_async,
            expression,
            span: self.span_from(start),
        })))
    }

    /// Parameters and body of an object or class method, starting at `(`
    pub(super) fn parse_method(
        &mut self,
        ctx: Context,
        flavor: MethodFlavor,
        is_async: bool,
        generator: bool,
    ) -> Result<Function, ParseError> {
        let start = self.current.span;
        let state = self.enter_function_state();
        self.scopes.push(ScopeKind::Function);

        let mut method_ctx = ctx.enter_function(is_async, generator) | Context::SUPER_PROPERTY;
        if flavor == MethodFlavor::DerivedConstructor {
            method_ctx |= Context::SUPER_CALL;
        }
        let params = self.parse_formal_parameters(method_ctx)?;
        match flavor {
            MethodFlavor::Getter if !params.is_empty() => {
                return Err(self.error_at(ErrorKind::GetterArity, &[], start));
            }
            MethodFlavor::Setter => {
                if params.len() != 1 {
                    return Err(self.error_at(ErrorKind::SetterArity, &[], start));
                }
                if matches!(params.first(), Some(Pattern::Rest(_))) {
                    return Err(self.error_at(ErrorKind::SetterRest, &[], start));
                }
            }
            _ => {}
        }
        let body = self.parse_function_body(method_ctx, &params, ParamRules { unique: true }, None)?;

        self.scopes.pop();
        self.leave_function_state(state);
        Ok(Function {
            id: None,
            params,
            body,
            generator,
            is_async,
            declaration: false,
            span: self.span_from(start),
        })
    }

    // ============ CLASSES ============

    /// `@expr` decorators in front of a class or class member
    pub(super) fn parse_decorators(&mut self, ctx: Context) -> Result<Vec<Decorator>, ParseError> {
        let mut decorators = Vec::new();
        while self.check(&TokenKind::At) {
            if !ctx.has_experimental() {
                return Err(self.error(ErrorKind::FeatureRequiresExperimental, &["Decorators"]));
            }
            let start = self.current.span;
            self.advance()?;
            let expression = self.parse_lhs(ctx)?;
            decorators.push(Decorator {
                expression,
                span: self.span_from(start),
            });
        }
        Ok(decorators)
    }

    /// Class declaration or expression; `start` is the first decorator or `class`
    pub(super) fn parse_class(
        &mut self,
        ctx: Context,
        start: Span,
        kind: DeclarationKind,
        decorators: Vec<Decorator>,
    ) -> Result<Class, ParseError> {
        self.nested(|p| p.parse_class_inner(ctx, start, kind, decorators))
    }

    fn parse_class_inner(
        &mut self,
        ctx: Context,
        start: Span,
        kind: DeclarationKind,
        decorators: Vec<Decorator>,
    ) -> Result<Class, ParseError> {
        self.expect(&TokenKind::Class)?;
        let class_ctx = ctx | Context::STRICT;

        let id = if matches!(self.current.kind, TokenKind::Identifier(_)) {
            let binding = (kind != DeclarationKind::Expression).then_some(BindingKind::Class);
            Some(self.parse_binding_identifier(class_ctx, binding)?)
        } else if kind == DeclarationKind::Statement {
            return Err(self.unexpected());
        } else {
            None
        };

        let super_class = if self.eat(&TokenKind::Extends)? {
            Some(Box::new(self.parse_lhs(class_ctx)?))
        } else {
            None
        };
        let body = self.parse_class_body(class_ctx, super_class.is_some())?;

        Ok(Class {
            id,
            super_class,
            body,
            decorators,
            declaration: kind != DeclarationKind::Expression,
            span: self.span_from(start),
        })
    }

    fn parse_class_body(&mut self, ctx: Context, derived: bool) -> Result<ClassBody, ParseError> {
        let start = self.current.span;
        self.expect(&TokenKind::LBrace)?;
        self.private_scopes.push(PrivateScope::default());

        let mut body = Vec::new();
        let mut has_constructor = false;
        while !self.check(&TokenKind::RBrace) {
            if self.eat(&TokenKind::Semicolon)? {
                continue;
            }
            if self.is_at_end() {
                return Err(self.error(ErrorKind::UnexpectedEof, &[]));
            }
            body.push(self.parse_class_element(ctx, derived, &mut has_constructor)?);
        }
        self.expect(&TokenKind::RBrace)?;
        self.leave_private_scope()?;

        Ok(ClassBody {
            body,
            span: self.span_from(start),
        })
    }

    /// Resolve the closing class's private references; leftovers move outward
    fn leave_private_scope(&mut self) -> Result<(), ParseError> {
        let Some(scope) = self.private_scopes.pop() else {
            return Ok(());
        };
        for (name, span) in scope.unresolved {
            if scope.declared.contains_key(&name) {
                continue;
            }
            match self.private_scopes.last_mut() {
                Some(outer) => outer.unresolved.push((name, span)),
                None => {
                    return Err(self.error_at(ErrorKind::UndefinedPrivateName, &[name.as_str()], span));
                }
            }
        }
        Ok(())
    }

    /// Record a `#name` reference (`this.#x`, `#x in o`)
    pub(super) fn use_private_name(&mut self, name: &JsString, span: Span) -> Result<(), ParseError> {
        match self.private_scopes.last_mut() {
            Some(scope) => {
                scope.unresolved.push((name.clone(), span));
                Ok(())
            }
            None => Err(self.error_at(ErrorKind::UndefinedPrivateName, &[name.as_str()], span)),
        }
    }

    fn declare_private_name(
        &mut self,
        name: &JsString,
        kind: PrivateKind,
        is_static: bool,
        span: Span,
    ) -> Result<(), ParseError> {
        if name == "constructor" {
            return Err(self.error_at(ErrorKind::PrivateConstructor, &[], span));
        }
        let declared = self
            .private_scopes
            .last_mut()
            .is_some_and(|scope| scope.declare(name, kind, is_static));
        if !declared {
            return Err(self.error_at(ErrorKind::DuplicatePrivateName, &[name.as_str()], span));
        }
        Ok(())
    }

    fn parse_class_element(
        &mut self,
        ctx: Context,
        derived: bool,
        has_constructor: &mut bool,
    ) -> Result<ClassElement, ParseError> {
        let start = self.current.span;
        let decorators = self.parse_decorators(ctx)?;

        let mut is_static = false;
        if self.is_contextual("static") && self.modifier_applies(true)? {
            self.advance()?;
            if self.check(&TokenKind::LBrace) {
                if !decorators.is_empty() {
                    return Err(self.unexpected());
                }
                return self.parse_static_block(ctx, start);
            }
            is_static = true;
        }

        let mut is_async = false;
        if self.is_contextual("async") && self.modifier_applies(false)? {
            self.advance()?;
            is_async = true;
        }
        let generator = self.eat(&TokenKind::Star)?;
        let mut kind = MethodKind::Method;
        if !is_async && !generator && (self.is_contextual("get") || self.is_contextual("set")) {
            if self.modifier_applies(true)? {
                kind = if self.is_contextual("get") {
                    MethodKind::Get
                } else {
                    MethodKind::Set
                };
                self.advance()?;
            }
        }

        let key_span = self.current.span;
        let (key, computed, private) = match self.current.kind.clone() {
            TokenKind::PrivateName(name) => {
                if !ctx.has_next() {
                    return Err(self.error(ErrorKind::FeatureRequiresNext, &["Private names"]));
                }
                self.advance()?;
                let key = Expression::PrivateIdentifier(PrivateIdentifier {
                    name: name.clone(),
                    span: self.with_metadata(key_span),
                });
                (key, false, Some(name))
            }
            _ => {
                let (key, computed) = self.parse_property_key(ctx)?;
                (key, computed, None)
            }
        };
        let named = |word: &str| !computed && private.is_none() && is_key_named(&key, word);

        let is_method = kind != MethodKind::Method || is_async || generator || self.check(&TokenKind::LParen);
        if is_method {
            let mut flavor = match kind {
                MethodKind::Get => MethodFlavor::Getter,
                MethodKind::Set => MethodFlavor::Setter,
                _ => MethodFlavor::Method,
            };
            if !is_static && named("constructor") {
                if kind != MethodKind::Method || is_async || generator {
                    return Err(self.error_at(ErrorKind::ConstructorSpecialMethod, &[], key_span));
                }
                if *has_constructor {
                    return Err(self.error_at(ErrorKind::DuplicateConstructor, &[], key_span));
                }
                *has_constructor = true;
                kind = MethodKind::Constructor;
                flavor = if derived {
                    MethodFlavor::DerivedConstructor
                } else {
                    MethodFlavor::Constructor
                };
            }
            if is_static && named("prototype") {
                return Err(self.error_at(ErrorKind::StaticPrototype, &[], key_span));
            }
            if let Some(name) = &private {
                let private_kind = match kind {
                    MethodKind::Get => PrivateKind::Getter,
                    MethodKind::Set => PrivateKind::Setter,
                    _ => PrivateKind::Method,
                };
                self.declare_private_name(name, private_kind, is_static, key_span)?;
            }
            let value = self.parse_method(ctx, flavor, is_async, generator)?;
            return Ok(ClassElement::Method(MethodDefinition {
                key,
                value: Box::new(value),
                kind,
                computed,
                is_static,
                decorators,
                span: self.span_from(start),
            }));
        }

        if !ctx.has_next() {
            return Err(self.error_at(ErrorKind::FeatureRequiresNext, &["Class fields"], key_span));
        }
        if named("constructor") {
            return Err(self.error_at(ErrorKind::ConstructorField, &[], key_span));
        }
        if is_static && named("prototype") {
            return Err(self.error_at(ErrorKind::StaticPrototype, &[], key_span));
        }
        if let Some(name) = &private {
            self.declare_private_name(name, PrivateKind::Field, is_static, key_span)?;
        }
        let value = if self.eat(&TokenKind::Eq)? {
            Some(self.parse_field_initializer(ctx)?)
        } else {
            None
        };
        self.consume_semicolon()?;
        Ok(ClassElement::Property(PropertyDefinition {
            key,
            value,
            computed,
            is_static,
            decorators,
            span: self.span_from(start),
        }))
    }

    /// Field initialisers behave like the body of a method with no parameters
    fn parse_field_initializer(&mut self, ctx: Context) -> Result<Expression, ParseError> {
        let state = self.enter_function_state();
        self.scopes.push(ScopeKind::Function);
        let field_ctx = (ctx - Context::FUNCTION_BOUNDARY - Context::RETURN)
            | Context::SUPER_PROPERTY
            | Context::NEW_TARGET
            | Context::ALLOW_IN;
        let value = self.parse_assignment_expression(field_ctx)?;
        self.scopes.pop();
        self.leave_function_state(state);
        Ok(value)
    }

    /// `static { ... }`; the current token is `{`
    fn parse_static_block(&mut self, ctx: Context, start: Span) -> Result<ClassElement, ParseError> {
        if !ctx.has_next() {
            return Err(self.error(ErrorKind::FeatureRequiresNext, &["Class static blocks"]));
        }
        self.expect(&TokenKind::LBrace)?;
        let state = self.enter_function_state();
        self.scopes.push(ScopeKind::ClassStaticBlock);
        let block_ctx = (ctx - Context::FUNCTION_BOUNDARY - Context::RETURN)
            | Context::SUPER_PROPERTY
            | Context::NEW_TARGET;

        let mut body = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            if self.is_at_end() {
                return Err(self.error(ErrorKind::UnexpectedEof, &[]));
            }
            body.push(self.parse_statement_list_item(block_ctx, false)?);
        }
        self.expect(&TokenKind::RBrace)?;

        self.scopes.pop();
        self.leave_function_state(state);
        Ok(ClassElement::StaticBlock(StaticBlock {
            body,
            span: self.span_from(start),
        }))
    }
}

/// Non-computed key spelled `word`, as an identifier or a string
fn is_key_named(key: &Expression, word: &str) -> bool {
    match key {
        Expression::Identifier(id) => id.name == word,
        Expression::Literal(Literal {
            value: LiteralValue::String(s),
            ..
        }) => s == word,
        _ => false,
    }
}
