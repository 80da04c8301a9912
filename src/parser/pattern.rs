//! Binding patterns and the expression-to-pattern reinterpretation
//!
//! Declarations and parameter lists parse patterns directly. Everything
//! written in expression position (`[a, b] = c`, `({ x }) => x`,
//! `for ([k, v] of m)`) is parsed as an expression first and rewritten here.

use crate::ast::*;
use crate::context::{Context, Flags};
use crate::error::{ErrorKind, ParseError};
use crate::lexer::TokenKind;
use crate::scope::BindingKind;

use super::Parser;

/// What the rewritten pattern will be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum PatternMode {
    /// Assignment target: member expressions allowed
    Assign,
    /// Parameters: identifiers and nested patterns only
    Binding,
}

impl<'a> Parser<'a> {
    // ============ REINTERPRETATION ============

    /// An array or object literal that was not wrapped in parentheses
    pub(super) fn is_pattern_candidate(&self, expr: &Expression) -> bool {
        matches!(expr, Expression::Array(_) | Expression::Object(_))
            && !self.is_parenthesized(expr.span())
    }

    /// Target of a plain `=` assignment
    pub(super) fn assignment_target(
        &mut self,
        ctx: Context,
        expr: Expression,
    ) -> Result<Pattern, ParseError> {
        if self.is_pattern_candidate(&expr) {
            self.discard_deferred(Flags::COVER_INIT | Flags::DUPLICATE_PROTO);
            return self.expression_to_pattern(ctx, expr, PatternMode::Assign);
        }
        self.raise_deferred(Flags::COVER_INIT | Flags::DUPLICATE_PROTO)?;
        self.simple_assignment_target(ctx, expr, ErrorKind::InvalidLhsAssignment)
    }

    /// Identifier or member expression; `kind` names the failing context
    pub(super) fn simple_assignment_target(
        &self,
        ctx: Context,
        expr: Expression,
        kind: ErrorKind,
    ) -> Result<Pattern, ParseError> {
        let span = expr.span();
        let parenthesized = self.is_parenthesized(span);
        match expr {
            Expression::Identifier(id) => {
                self.check_binding_name(ctx, &id.name, None, id.span)?;
                Ok(Pattern::Identifier(id))
            }
            Expression::Member(member) => Ok(Pattern::Member(member)),
            Expression::Chain(chain) => {
                Err(self.error_at(ErrorKind::InvalidOptionalChainTarget, &[], chain.span))
            }
            Expression::Array(_) | Expression::Object(_) if parenthesized => {
                Err(self.error_at(ErrorKind::ParenthesizedPattern, &[], span))
            }
            _ => Err(self.error_at(kind, &[], span)),
        }
    }

    /// Operand of `++` / `--`
    pub(super) fn update_target(
        &self,
        ctx: Context,
        expr: Expression,
        kind: ErrorKind,
    ) -> Result<Expression, ParseError> {
        match &expr {
            Expression::Identifier(id) => {
                self.check_binding_name(ctx, &id.name, None, id.span)?;
            }
            Expression::Member(_) => {}
            Expression::Chain(chain) => {
                return Err(self.error_at(ErrorKind::InvalidOptionalChainTarget, &[], chain.span));
            }
            other => return Err(self.error_at(kind, &[], other.span())),
        }
        Ok(expr)
    }

    /// Rewrite a finished expression tree as a pattern
    pub(super) fn expression_to_pattern(
        &self,
        ctx: Context,
        expr: Expression,
        mode: PatternMode,
    ) -> Result<Pattern, ParseError> {
        let span = expr.span();
        match expr {
            Expression::Identifier(id) => {
                if mode == PatternMode::Binding && self.is_parenthesized(id.span) {
                    return Err(self.error_at(ErrorKind::ParenthesizedPattern, &[], id.span));
                }
                self.check_binding_name(ctx, &id.name, None, id.span)?;
                Ok(Pattern::Identifier(id))
            }
            Expression::Member(member) if mode == PatternMode::Assign => Ok(Pattern::Member(member)),
            Expression::Chain(chain) if mode == PatternMode::Assign => {
                Err(self.error_at(ErrorKind::InvalidOptionalChainTarget, &[], chain.span))
            }
            Expression::Array(array) => {
                if self.is_parenthesized(span) {
                    return Err(self.error_at(ErrorKind::ParenthesizedPattern, &[], span));
                }
                self.array_to_pattern(ctx, array, mode)
            }
            Expression::Object(object) => {
                if self.is_parenthesized(span) {
                    return Err(self.error_at(ErrorKind::ParenthesizedPattern, &[], span));
                }
                self.object_to_pattern(ctx, object, mode)
            }
            Expression::Assignment(assign) if assign.operator == AssignmentOp::Assign => {
                if self.is_parenthesized(span) {
                    return Err(self.error_at(ErrorKind::ParenthesizedPattern, &[], span));
                }
                if mode == PatternMode::Binding {
                    self.check_binding_pattern(ctx, &assign.left)?;
                }
                Ok(Pattern::Assignment(AssignmentPattern {
                    left: assign.left,
                    right: assign.right,
                    span: assign.span,
                }))
            }
            _ => Err(self.error_at(ErrorKind::InvalidDestructuringTarget, &[], span)),
        }
    }

    fn array_to_pattern(
        &self,
        ctx: Context,
        array: ArrayExpression,
        mode: PatternMode,
    ) -> Result<Pattern, ParseError> {
        let count = array.elements.len();
        let mut elements = Vec::with_capacity(count);
        for (i, element) in array.elements.into_iter().enumerate() {
            let pattern = match element {
                None => None,
                Some(Expression::Spread(spread)) => {
                    if i + 1 != count {
                        return Err(self.error_at(ErrorKind::InvalidRestElement, &[], spread.span));
                    }
                    Some(self.spread_to_rest(ctx, spread, mode)?)
                }
                Some(expr) => Some(self.expression_to_pattern(ctx, expr, mode)?),
            };
            elements.push(pattern);
        }
        Ok(Pattern::Array(ArrayPattern {
            elements,
            span: array.span,
        }))
    }

    fn object_to_pattern(
        &self,
        ctx: Context,
        object: ObjectExpression,
        mode: PatternMode,
    ) -> Result<Pattern, ParseError> {
        let count = object.properties.len();
        let mut properties = Vec::with_capacity(count);
        for (i, member) in object.properties.into_iter().enumerate() {
            match member {
                ObjectMember::Spread(spread) => {
                    if i + 1 != count {
                        return Err(self.error_at(ErrorKind::InvalidRestElement, &[], spread.span));
                    }
                    let Pattern::Rest(rest) = self.spread_to_rest(ctx, spread, mode)? else {
                        return Err(self.error_at(ErrorKind::InvalidRestElement, &[], object.span));
                    };
                    if !matches!(*rest.argument, Pattern::Identifier(_) | Pattern::Member(_)) {
                        return Err(self.error_at(ErrorKind::InvalidRestElement, &[], rest.span));
                    }
                    properties.push(ObjectPatternMember::Rest(rest));
                }
                ObjectMember::Property(prop) => {
                    if prop.kind != PropertyKind::Init || prop.method {
                        return Err(self.error_at(
                            ErrorKind::InvalidDestructuringTarget,
                            &[],
                            prop.span,
                        ));
                    }
                    let value = self.expression_to_pattern(ctx, prop.value, mode)?;
                    properties.push(ObjectPatternMember::Property(AssignmentProperty {
                        key: prop.key,
                        value,
                        shorthand: prop.shorthand,
                        computed: prop.computed,
                        span: prop.span,
                    }));
                }
            }
        }
        Ok(Pattern::Object(ObjectPattern {
            properties,
            span: object.span,
        }))
    }

    fn spread_to_rest(
        &self,
        ctx: Context,
        spread: SpreadElement,
        mode: PatternMode,
    ) -> Result<Pattern, ParseError> {
        if self.spread_with_comma.contains(&spread.span.key()) {
            return Err(self.error_at(ErrorKind::RestTrailingComma, &[], spread.span));
        }
        if matches!(*spread.argument, Expression::Assignment(_)) {
            return Err(self.error_at(ErrorKind::RestDefault, &[], spread.argument.span()));
        }
        let argument = self.expression_to_pattern(ctx, *spread.argument, mode)?;
        Ok(Pattern::Rest(RestElement {
            argument: Box::new(argument),
            span: spread.span,
        }))
    }

    /// A pattern built as an assignment target, now used as a binding
    fn check_binding_pattern(&self, ctx: Context, pattern: &Pattern) -> Result<(), ParseError> {
        match pattern {
            Pattern::Identifier(id) => {
                if self.is_parenthesized(id.span) {
                    return Err(self.error_at(ErrorKind::ParenthesizedPattern, &[], id.span));
                }
                self.check_binding_name(ctx, &id.name, None, id.span)
            }
            Pattern::Member(member) => Err(self.error_at(
                ErrorKind::InvalidDestructuringTarget,
                &[],
                member.span,
            )),
            Pattern::Object(object) => {
                for member in &object.properties {
                    match member {
                        ObjectPatternMember::Property(prop) => {
                            self.check_binding_pattern(ctx, &prop.value)?
                        }
                        ObjectPatternMember::Rest(rest) => {
                            self.check_binding_pattern(ctx, &rest.argument)?
                        }
                    }
                }
                Ok(())
            }
            Pattern::Array(array) => {
                for element in array.elements.iter().flatten() {
                    self.check_binding_pattern(ctx, element)?;
                }
                Ok(())
            }
            Pattern::Rest(rest) => self.check_binding_pattern(ctx, &rest.argument),
            Pattern::Assignment(assign) => self.check_binding_pattern(ctx, &assign.left),
        }
    }

    /// Arguments of `async(...)` reinterpreted as arrow parameters
    pub(super) fn arguments_to_params(
        &self,
        ctx: Context,
        arguments: Vec<Expression>,
    ) -> Result<Vec<Pattern>, ParseError> {
        let count = arguments.len();
        let mut params = Vec::with_capacity(count);
        for (i, argument) in arguments.into_iter().enumerate() {
            let param = match argument {
                Expression::Spread(spread) => {
                    if i + 1 != count {
                        return Err(self.error_at(ErrorKind::InvalidRestElement, &[], spread.span));
                    }
                    self.spread_to_rest(ctx, spread, PatternMode::Binding)?
                }
                other => self.expression_to_pattern(ctx, other, PatternMode::Binding)?,
            };
            params.push(param);
        }
        Ok(params)
    }

    // ============ BINDING PATTERNS ============

    /// BindingIdentifier or BindingPattern. With `kind`, every bound name is
    /// declared in the current scope as it is parsed.
    pub(super) fn parse_binding_target(
        &mut self,
        ctx: Context,
        kind: Option<BindingKind>,
    ) -> Result<Pattern, ParseError> {
        match self.current.kind {
            TokenKind::LBracket => self.nested(|p| p.parse_array_binding(ctx, kind)),
            TokenKind::LBrace => self.nested(|p| p.parse_object_binding(ctx, kind)),
            _ => Ok(Pattern::Identifier(self.parse_binding_identifier(ctx, kind)?)),
        }
    }

    /// Binding target with an optional `= default`
    pub(super) fn parse_binding_element(
        &mut self,
        ctx: Context,
        kind: Option<BindingKind>,
    ) -> Result<Pattern, ParseError> {
        let start = self.current.span;
        let target = self.parse_binding_target(ctx, kind)?;
        if !self.eat(&TokenKind::Eq)? {
            return Ok(target);
        }
        let right = self.parse_assignment_expression(ctx.with_in())?;
        Ok(Pattern::Assignment(AssignmentPattern {
            left: Box::new(target),
            right: Box::new(right),
            span: self.span_from(start),
        }))
    }

    /// `...target`, which must close its list
    pub(super) fn parse_rest_element(
        &mut self,
        ctx: Context,
        kind: Option<BindingKind>,
    ) -> Result<Pattern, ParseError> {
        let start = self.current.span;
        self.expect(&TokenKind::DotDotDot)?;
        let argument = self.parse_binding_target(ctx, kind)?;
        self.check_rest_end()?;
        Ok(Pattern::Rest(RestElement {
            argument: Box::new(argument),
            span: self.span_from(start),
        }))
    }

    fn check_rest_end(&self) -> Result<(), ParseError> {
        match self.current.kind {
            TokenKind::Eq => Err(self.error(ErrorKind::RestDefault, &[])),
            TokenKind::Comma => Err(self.error(ErrorKind::RestTrailingComma, &[])),
            _ => Ok(()),
        }
    }

    fn parse_array_binding(
        &mut self,
        ctx: Context,
        kind: Option<BindingKind>,
    ) -> Result<Pattern, ParseError> {
        let start = self.current.span;
        self.expect(&TokenKind::LBracket)?;
        let mut elements = Vec::new();
        while !self.check(&TokenKind::RBracket) {
            if self.eat(&TokenKind::Comma)? {
                elements.push(None);
                continue;
            }
            if self.check(&TokenKind::DotDotDot) {
                elements.push(Some(self.parse_rest_element(ctx, kind)?));
                break;
            }
            elements.push(Some(self.parse_binding_element(ctx, kind)?));
            if !self.check(&TokenKind::RBracket) {
                self.expect(&TokenKind::Comma)?;
            }
        }
        self.expect(&TokenKind::RBracket)?;
        Ok(Pattern::Array(ArrayPattern {
            elements,
            span: self.span_from(start),
        }))
    }

    fn parse_object_binding(
        &mut self,
        ctx: Context,
        kind: Option<BindingKind>,
    ) -> Result<Pattern, ParseError> {
        let start = self.current.span;
        self.expect(&TokenKind::LBrace)?;
        let mut properties = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            if self.check(&TokenKind::DotDotDot) {
                let rest_start = self.current.span;
                self.advance()?;
                let id = self.parse_binding_identifier(ctx, kind)?;
                self.check_rest_end()?;
                properties.push(ObjectPatternMember::Rest(RestElement {
                    argument: Box::new(Pattern::Identifier(id)),
                    span: self.span_from(rest_start),
                }));
                break;
            }
            properties.push(ObjectPatternMember::Property(
                self.parse_binding_property(ctx, kind)?,
            ));
            if !self.check(&TokenKind::RBrace) {
                self.expect(&TokenKind::Comma)?;
            }
        }
        self.expect(&TokenKind::RBrace)?;
        Ok(Pattern::Object(ObjectPattern {
            properties,
            span: self.span_from(start),
        }))
    }

    fn parse_binding_property(
        &mut self,
        ctx: Context,
        kind: Option<BindingKind>,
    ) -> Result<AssignmentProperty, ParseError> {
        let start = self.current.span;
        let key_token = self.current.clone();
        let (key, computed) = self.parse_property_key(ctx)?;

        if self.eat(&TokenKind::Colon)? {
            let value = self.parse_binding_element(ctx, kind)?;
            return Ok(AssignmentProperty {
                key,
                value,
                shorthand: false,
                computed,
                span: self.span_from(start),
            });
        }

        // Shorthand `{ a }` / `{ a = 1 }`: the key doubles as the binding
        let Expression::Identifier(id) = &key else {
            return Err(self.unexpected());
        };
        if !matches!(key_token.kind, TokenKind::Identifier(_)) {
            return Err(self.error_at(ErrorKind::UnexpectedReserved, &[id.name.as_str()], id.span));
        }
        let id = id.clone();
        self.validate_reference_name(ctx, &id.name, id.span)?;
        self.check_binding_name(ctx, &id.name, kind, id.span)?;
        if let Some(kind) = kind {
            self.declare(ctx, &id, kind)?;
        }

        let mut value = Pattern::Identifier(id);
        if self.eat(&TokenKind::Eq)? {
            let right = self.parse_assignment_expression(ctx.with_in())?;
            value = Pattern::Assignment(AssignmentPattern {
                left: Box::new(value),
                right: Box::new(right),
                span: self.span_from(start),
            });
        }
        Ok(AssignmentProperty {
            key,
            value,
            shorthand: true,
            computed: false,
            span: self.span_from(start),
        })
    }
}
