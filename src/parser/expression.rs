//! Expression parsing
//!
//! Binary operators use precedence climbing driven by the precedence bits of
//! [`TokenClass`]. Array literals, object literals and parenthesised lists are
//! parsed as expressions and handed to the pattern module when a following
//! `=` or `=>` shows they were patterns.

use crate::ast::*;
use crate::context::{Context, Flags};
use crate::error::{ErrorKind, ParseError};
use crate::lexer::{Span, TemplatePart, TokenClass, TokenKind};

use super::function::{DeclarationKind, MethodFlavor};
use super::pattern::PatternMode;
use super::Parser;

impl<'a> Parser<'a> {
    // ============ EXPRESSIONS ============

    /// Expression : AssignmentExpression (`,` AssignmentExpression)*
    pub(super) fn parse_expression(&mut self, ctx: Context) -> Result<Expression, ParseError> {
        let start = self.current.span;
        let first = self.parse_assignment_expression(ctx)?;
        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }
        let mut expressions = vec![first];
        while self.eat(&TokenKind::Comma)? {
            expressions.push(self.parse_assignment_expression(ctx)?);
        }
        Ok(Expression::Sequence(SequenceExpression {
            expressions,
            span: self.span_from(start),
        }))
    }

    pub(super) fn parse_assignment_expression(
        &mut self,
        ctx: Context,
    ) -> Result<Expression, ParseError> {
        self.parse_assignment_cover(ctx, false)
    }

    /// Parse an AssignmentExpression in its own cover region.
    ///
    /// With `keep`, a bare array or object literal result keeps its pending
    /// cover errors: the caller may still turn it into a pattern.
    pub(super) fn parse_assignment_cover(
        &mut self,
        ctx: Context,
        keep: bool,
    ) -> Result<Expression, ParseError> {
        self.nested(|p| {
            let saved = p.take_cover();
            let expr = p.parse_assignment_inner(ctx)?;
            if !(keep && p.is_pattern_candidate(&expr)) {
                p.raise_deferred(Flags::COVER_INIT | Flags::DUPLICATE_PROTO)?;
            }
            p.restore_cover(saved);
            Ok(expr)
        })
    }

    fn parse_assignment_inner(&mut self, ctx: Context) -> Result<Expression, ParseError> {
        if ctx.has_yield() && self.is_contextual("yield") {
            return self.parse_yield(ctx);
        }

        let start = self.current.span;
        let left = self.parse_conditional(ctx)?;
        let Some(operator) = assignment_op(&self.current.kind) else {
            return Ok(left);
        };
        if self.is_bare_arrow(&left) {
            return Err(self.error_at(ErrorKind::InvalidLhsAssignment, &[], left.span()));
        }

        let target = if operator == AssignmentOp::Assign {
            self.assignment_target(ctx, left)?
        } else {
            self.raise_deferred(Flags::COVER_INIT | Flags::DUPLICATE_PROTO)?;
            self.simple_assignment_target(ctx, left, ErrorKind::InvalidLhsAssignment)?
        };
        self.advance()?;
        let right = self.parse_assignment_expression(ctx)?;
        Ok(Expression::Assignment(AssignmentExpression {
            operator,
            left: Box::new(target),
            right: Box::new(right),
            span: self.span_from(start),
        }))
    }

    fn parse_yield(&mut self, ctx: Context) -> Result<Expression, ParseError> {
        let start = self.current.span;
        if ctx.contains(Context::IN_PARAMETERS) {
            return Err(self.error(ErrorKind::YieldInParameter, &[]));
        }
        let err = self.error(ErrorKind::YieldInParameter, &[]);
        self.defer(Flags::SEEN_YIELD, err);
        self.advance()?;

        let mut delegate = false;
        let argument = if self.has_newline() {
            None
        } else if self.eat(&TokenKind::Star)? {
            delegate = true;
            Some(Box::new(self.parse_assignment_expression(ctx)?))
        } else if self.starts_expression() {
            Some(Box::new(self.parse_assignment_expression(ctx)?))
        } else {
            None
        };
        Ok(Expression::Yield(YieldExpression {
            argument,
            delegate,
            span: self.span_from(start),
        }))
    }

    /// Whether the current token can begin an AssignmentExpression
    fn starts_expression(&self) -> bool {
        self.current.kind.class().contains(TokenClass::EXPRESSION_START)
            || matches!(self.current.kind, TokenKind::Slash | TokenKind::SlashEq)
    }

    /// An arrow function not wrapped in parentheses ends its expression
    pub(super) fn is_bare_arrow(&self, expr: &Expression) -> bool {
        matches!(expr, Expression::ArrowFunction(_)) && !self.is_parenthesized(expr.span())
    }

    /// Operands of unary and binary operators cannot be arrow functions
    fn operand(&self, expr: Expression) -> Result<Expression, ParseError> {
        if self.is_bare_arrow(&expr) {
            return Err(self.error_at(ErrorKind::UnexpectedToken, &["=>"], expr.span()));
        }
        Ok(expr)
    }

    fn parse_conditional(&mut self, ctx: Context) -> Result<Expression, ParseError> {
        let start = self.current.span;
        let test = self.parse_binary(ctx, 0)?;
        if !self.check(&TokenKind::Question) || self.is_bare_arrow(&test) {
            return Ok(test);
        }
        self.advance()?;
        let consequent = self.parse_assignment_expression(ctx.with_in())?;
        self.expect(&TokenKind::Colon)?;
        let alternate = self.parse_assignment_expression(ctx)?;
        Ok(Expression::Conditional(ConditionalExpression {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
            span: self.span_from(start),
        }))
    }

    /// Precedence climbing: consume operators binding tighter than `min_prec`
    fn parse_binary(&mut self, ctx: Context, min_prec: u8) -> Result<Expression, ParseError> {
        let start = self.current.span;
        let mut left = if matches!(self.current.kind, TokenKind::PrivateName(_)) {
            self.parse_private_in(ctx, min_prec)?
        } else {
            self.parse_unary(ctx)?
        };

        loop {
            let class = self.current.kind.class();
            if !class.contains(TokenClass::BINARY) {
                break;
            }
            if class.contains(TokenClass::IN) && !ctx.has_in() {
                break;
            }
            let prec = class.precedence();
            if prec <= min_prec || self.is_bare_arrow(&left) {
                break;
            }
            if self.current.escaped {
                return Err(self.error(ErrorKind::EscapedKeyword, &[]));
            }

            let op = self.current.kind.clone();
            if op == TokenKind::StarStar && self.is_unparenthesized_unary(&left) {
                return Err(self.error_at(ErrorKind::UnaryBeforeExponent, &[], left.span()));
            }
            if matches!(left, Expression::PrivateIdentifier(_)) && op != TokenKind::In {
                return Err(self.unexpected());
            }
            self.advance()?;

            // `**` is right-associative: the right operand may hold another `**`
            let next_prec = if class.contains(TokenClass::RIGHT_ASSOC) {
                prec - 1
            } else {
                prec
            };
            let right = self.parse_binary(ctx, next_prec)?;
            let right = self.operand(right)?;
            left = self.make_binary(&op, left, right, start)?;
        }

        Ok(left)
    }

    /// `#x in obj`
    fn parse_private_in(&mut self, ctx: Context, min_prec: u8) -> Result<Expression, ParseError> {
        let TokenKind::PrivateName(name) = self.current.kind.clone() else {
            return Err(self.unexpected());
        };
        let span = self.current.span;
        let (next, _) = self.peek()?;
        if next.kind != TokenKind::In || !ctx.has_in() || min_prec >= TokenKind::In.class().precedence() {
            return Err(self.unexpected());
        }
        self.advance()?;
        self.use_private_name(&name, span)?;
        Ok(Expression::PrivateIdentifier(PrivateIdentifier {
            name,
            span: self.with_metadata(span),
        }))
    }

    fn is_unparenthesized_unary(&self, expr: &Expression) -> bool {
        matches!(expr, Expression::Unary(_) | Expression::Await(_))
            && !self.is_parenthesized(expr.span())
    }

    fn make_binary(
        &self,
        op: &TokenKind,
        left: Expression,
        right: Expression,
        start: Span,
    ) -> Result<Expression, ParseError> {
        let span = self.span_from(start);
        if let Some(operator) = logical_op(op) {
            for side in [&left, &right] {
                if let Expression::Logical(inner) = side {
                    let mixed = match operator {
                        LogicalOp::NullishCoalescing => inner.operator != LogicalOp::NullishCoalescing,
                        _ => inner.operator == LogicalOp::NullishCoalescing,
                    };
                    if mixed && !self.is_parenthesized(inner.span) {
                        let other = if operator == LogicalOp::NullishCoalescing {
                            inner.operator.as_str()
                        } else {
                            operator.as_str()
                        };
                        return Err(self.error_at(ErrorKind::MixedCoalesce, &[other], inner.span));
                    }
                }
            }
            return Ok(Expression::Logical(LogicalExpression {
                operator,
                left: Box::new(left),
                right: Box::new(right),
                span,
            }));
        }
        let Some(operator) = binary_op(op) else {
            return Err(self.unexpected());
        };
        Ok(Expression::Binary(BinaryExpression {
            operator,
            left: Box::new(left),
            right: Box::new(right),
            span,
        }))
    }

    fn parse_unary(&mut self, ctx: Context) -> Result<Expression, ParseError> {
        let start = self.current.span;
        if let Some(operator) = unary_op(&self.current.kind) {
            if self.current.escaped {
                return Err(self.error(ErrorKind::EscapedKeyword, &[]));
            }
            self.advance()?;
            let argument = self.nested(|p| p.parse_unary(ctx))?;
            let argument = self.operand(argument)?;
            if operator == UnaryOp::Delete
                && ctx.is_strict()
                && matches!(argument, Expression::Identifier(_))
            {
                return Err(self.error_at(ErrorKind::StrictDelete, &[], start));
            }
            return Ok(Expression::Unary(UnaryExpression {
                operator,
                prefix: true,
                argument: Box::new(argument),
                span: self.span_from(start),
            }));
        }

        if let Some(operator) = update_op(&self.current.kind) {
            self.advance()?;
            let argument = self.nested(|p| p.parse_unary(ctx))?;
            let argument = self.operand(argument)?;
            let argument = self.update_target(ctx, argument, ErrorKind::InvalidLhsPrefix)?;
            return Ok(Expression::Update(UpdateExpression {
                operator,
                prefix: true,
                argument: Box::new(argument),
                span: self.span_from(start),
            }));
        }

        if ctx.has_await() && self.is_contextual("await") {
            return self.parse_await(ctx);
        }

        self.parse_postfix(ctx)
    }

    fn parse_await(&mut self, ctx: Context) -> Result<Expression, ParseError> {
        let start = self.current.span;
        if ctx.contains(Context::IN_PARAMETERS) {
            return Err(self.error(ErrorKind::AwaitInParameter, &[]));
        }
        let err = self.error(ErrorKind::AwaitInParameter, &[]);
        self.defer(Flags::SEEN_AWAIT, err);
        self.advance()?;
        let argument = self.nested(|p| p.parse_unary(ctx))?;
        let argument = self.operand(argument)?;
        Ok(Expression::Await(AwaitExpression {
            argument: Box::new(argument),
            span: self.span_from(start),
        }))
    }

    fn parse_postfix(&mut self, ctx: Context) -> Result<Expression, ParseError> {
        let start = self.current.span;
        let expr = self.parse_lhs(ctx)?;
        let Some(operator) = update_op(&self.current.kind) else {
            return Ok(expr);
        };
        if self.has_newline() || self.is_bare_arrow(&expr) {
            return Ok(expr);
        }
        let argument = self.update_target(ctx, expr, ErrorKind::InvalidLhsPostfix)?;
        self.advance()?;
        Ok(Expression::Update(UpdateExpression {
            operator,
            prefix: false,
            argument: Box::new(argument),
            span: self.span_from(start),
        }))
    }

    // ============ CALLS AND MEMBERS ============

    /// LeftHandSideExpression: member accesses, calls, optional chains and
    /// tagged templates on top of a primary, `new`, `super` or `import`.
    pub(super) fn parse_lhs(&mut self, ctx: Context) -> Result<Expression, ParseError> {
        let start = self.current.span;
        let expr = match self.current.kind {
            TokenKind::New => self.parse_new(ctx)?,
            TokenKind::Super => self.parse_super(ctx)?,
            TokenKind::Import => self.parse_import_expression(ctx)?,
            _ => self.parse_primary(ctx)?,
        };
        if self.is_bare_arrow(&expr) {
            return Ok(expr);
        }
        if self.check(&TokenKind::LParen) && !self.has_newline() && self.is_async_identifier(&expr) {
            return self.parse_async_call_or_arrow(ctx, start, expr);
        }
        self.parse_call_tail(ctx, start, expr, true)
    }

    /// Unescaped identifier `async`
    fn is_async_identifier(&self, expr: &Expression) -> bool {
        matches!(expr, Expression::Identifier(id) if id.name == "async")
            && self.lexer.slice(expr.span()) == "async"
    }

    fn parse_call_tail(
        &mut self,
        ctx: Context,
        start: Span,
        mut expr: Expression,
        allow_call: bool,
    ) -> Result<Expression, ParseError> {
        let mut in_chain = false;
        loop {
            match self.current.kind {
                TokenKind::Dot => {
                    self.advance()?;
                    let property = self.parse_member_property()?;
                    expr = self.member(expr, property, false, false, start);
                }
                TokenKind::LBracket => {
                    self.advance()?;
                    let property = self.parse_expression(ctx.with_in())?;
                    self.expect(&TokenKind::RBracket)?;
                    expr = self.member(expr, property, true, false, start);
                }
                TokenKind::QuestionDot => {
                    if !allow_call {
                        return Err(self.error(ErrorKind::NewOptionalChain, &[]));
                    }
                    self.advance()?;
                    in_chain = true;
                    match self.current.kind {
                        TokenKind::LParen => {
                            let arguments = self.parse_arguments(ctx)?;
                            expr = Expression::Call(CallExpression {
                                callee: Box::new(expr),
                                arguments,
                                optional: true,
                                span: self.span_from(start),
                            });
                        }
                        TokenKind::LBracket => {
                            self.advance()?;
                            let property = self.parse_expression(ctx.with_in())?;
                            self.expect(&TokenKind::RBracket)?;
                            expr = self.member(expr, property, true, true, start);
                        }
                        TokenKind::TemplateNoSub(_) | TokenKind::TemplateHead(_) => {
                            return Err(self.error(ErrorKind::OptionalChainTemplate, &[]));
                        }
                        _ => {
                            let property = self.parse_member_property()?;
                            expr = self.member(expr, property, false, true, start);
                        }
                    }
                }
                TokenKind::TemplateNoSub(_) | TokenKind::TemplateHead(_) => {
                    if in_chain {
                        return Err(self.error(ErrorKind::OptionalChainTemplate, &[]));
                    }
                    let quasi = self.parse_template(ctx, true)?;
                    expr = Expression::TaggedTemplate(TaggedTemplateExpression {
                        tag: Box::new(expr),
                        quasi,
                        span: self.span_from(start),
                    });
                }
                TokenKind::LParen if allow_call => {
                    let arguments = self.parse_arguments(ctx)?;
                    expr = Expression::Call(CallExpression {
                        callee: Box::new(expr),
                        arguments,
                        optional: false,
                        span: self.span_from(start),
                    });
                }
                _ => break,
            }
        }

        if in_chain {
            expr = Expression::Chain(ChainExpression {
                expression: Box::new(expr),
                span: self.span_from(start),
            });
        }
        Ok(expr)
    }

    fn member(
        &self,
        object: Expression,
        property: Expression,
        computed: bool,
        optional: bool,
        start: Span,
    ) -> Expression {
        Expression::Member(MemberExpression {
            object: Box::new(object),
            property: Box::new(property),
            computed,
            optional,
            span: self.span_from(start),
        })
    }

    /// Name after `.` or `?.`: any identifier name or a private name
    fn parse_member_property(&mut self) -> Result<Expression, ParseError> {
        if let TokenKind::PrivateName(name) = self.current.kind.clone() {
            let span = self.current.span;
            self.advance()?;
            self.use_private_name(&name, span)?;
            return Ok(Expression::PrivateIdentifier(PrivateIdentifier {
                name,
                span: self.with_metadata(span),
            }));
        }
        Ok(Expression::Identifier(self.parse_identifier_name()?))
    }

    /// Arguments : `(` (`...`? AssignmentExpression `,`)* `)`
    pub(super) fn parse_arguments(&mut self, ctx: Context) -> Result<Vec<Expression>, ParseError> {
        self.parse_argument_list(ctx, false)
    }

    fn parse_argument_list(
        &mut self,
        ctx: Context,
        cover: bool,
    ) -> Result<Vec<Expression>, ParseError> {
        self.expect(&TokenKind::LParen)?;
        let ctx = ctx.with_in();
        let mut arguments = Vec::new();
        while !self.check(&TokenKind::RParen) {
            let argument = if self.check(&TokenKind::DotDotDot) {
                let start = self.current.span;
                self.advance()?;
                let argument = self.parse_assignment_cover(ctx, cover)?;
                let spread = SpreadElement {
                    argument: Box::new(argument),
                    span: self.span_from(start),
                };
                if self.check(&TokenKind::Comma) {
                    self.spread_with_comma.insert(spread.span.key());
                }
                Expression::Spread(spread)
            } else {
                self.parse_assignment_cover(ctx, cover)?
            };
            arguments.push(argument);
            if !self.check(&TokenKind::RParen) {
                self.expect(&TokenKind::Comma)?;
            }
        }
        self.expect(&TokenKind::RParen)?;
        Ok(arguments)
    }

    /// `async(...)`: a call, or the parameter list of an async arrow
    fn parse_async_call_or_arrow(
        &mut self,
        ctx: Context,
        start: Span,
        callee: Expression,
    ) -> Result<Expression, ParseError> {
        let saved = self.take_cover();
        let arguments = self.parse_argument_list(ctx, true)?;

        if self.check(&TokenKind::Arrow) {
            if self.has_newline() {
                return Err(self.error(ErrorKind::UnexpectedArrowNewline, &[]));
            }
            self.raise_deferred(Flags::SEEN_AWAIT | Flags::AWAIT_IDENT | Flags::SEEN_YIELD)?;
            self.discard_deferred(Flags::COVER);
            let params = self.arguments_to_params(ctx.with(Context::AWAIT, true), arguments)?;
            self.restore_cover(saved);
            return self.parse_arrow_function(ctx, start, params, true);
        }

        self.raise_deferred(Flags::COVER_INIT | Flags::DUPLICATE_PROTO)?;
        self.restore_cover(saved);
        let call = Expression::Call(CallExpression {
            callee: Box::new(callee),
            arguments,
            optional: false,
            span: self.span_from(start),
        });
        self.parse_call_tail(ctx, start, call, true)
    }

    fn parse_new(&mut self, ctx: Context) -> Result<Expression, ParseError> {
        let start = self.current.span;
        self.expect(&TokenKind::New)?;

        if self.check(&TokenKind::Dot) {
            self.advance()?;
            if !self.is_contextual("target") {
                return Err(self.unexpected());
            }
            if !ctx.contains(Context::NEW_TARGET) {
                return Err(self.error_at(ErrorKind::InvalidNewTarget, &[], start));
            }
            let new_name = self.intern("new");
            let meta = self.identifier_node(new_name, start);
            let property = self.parse_identifier_name()?;
            return Ok(Expression::MetaProperty(MetaProperty {
                meta,
                property,
                span: self.span_from(start),
            }));
        }

        let callee_start = self.current.span;
        let callee = match self.current.kind {
            TokenKind::New => self.nested(|p| p.parse_new(ctx))?,
            TokenKind::Super => self.parse_super(ctx)?,
            TokenKind::Import => {
                let expr = self.parse_import_expression(ctx)?;
                if matches!(expr, Expression::Import(_)) {
                    return Err(self.error_at(ErrorKind::UnexpectedToken, &["import"], callee_start));
                }
                expr
            }
            _ => self.parse_primary(ctx)?,
        };
        if matches!(callee, Expression::ArrowFunction(_)) {
            return Err(self.error_at(ErrorKind::UnexpectedToken, &["=>"], callee.span()));
        }
        let callee = self.parse_call_tail(ctx, callee_start, callee, false)?;
        if matches!(callee, Expression::Super(_)) {
            return Err(self.error_at(ErrorKind::InvalidSuperCall, &[], callee.span()));
        }
        let arguments = if self.check(&TokenKind::LParen) {
            self.parse_arguments(ctx)?
        } else {
            Vec::new()
        };
        Ok(Expression::New(NewExpression {
            callee: Box::new(callee),
            arguments,
            span: self.span_from(start),
        }))
    }

    /// `super` must be followed by a call (derived constructors) or a
    /// property access (methods)
    fn parse_super(&mut self, ctx: Context) -> Result<Expression, ParseError> {
        let start = self.current.span;
        self.expect(&TokenKind::Super)?;
        match self.current.kind {
            TokenKind::LParen => {
                if !ctx.contains(Context::SUPER_CALL) {
                    return Err(self.error_at(ErrorKind::InvalidSuperCall, &[], start));
                }
            }
            TokenKind::Dot | TokenKind::LBracket => {
                if !ctx.contains(Context::SUPER_PROPERTY) {
                    return Err(self.error_at(ErrorKind::InvalidSuperProperty, &[], start));
                }
            }
            _ => return Err(self.error_at(ErrorKind::InvalidSuperProperty, &[], start)),
        }
        Ok(Expression::Super(Super {
            span: self.with_metadata(start),
        }))
    }

    /// `import(source)` or `import.meta`
    pub(super) fn parse_import_expression(&mut self, ctx: Context) -> Result<Expression, ParseError> {
        let start = self.current.span;
        self.expect(&TokenKind::Import)?;

        if self.eat(&TokenKind::Dot)? {
            if !self.is_contextual("meta") {
                return Err(self.unexpected());
            }
            if !ctx.is_module() {
                return Err(self.error_at(ErrorKind::InvalidImportMeta, &[], start));
            }
            let import_name = self.intern("import");
            let meta = self.identifier_node(import_name, start);
            let property = self.parse_identifier_name()?;
            return Ok(Expression::MetaProperty(MetaProperty {
                meta,
                property,
                span: self.span_from(start),
            }));
        }

        if !self.check(&TokenKind::LParen) {
            return Err(self.unexpected());
        }
        self.advance()?;
        let source = self.parse_assignment_expression(ctx.with_in())?;
        self.eat(&TokenKind::Comma)?;
        self.expect(&TokenKind::RParen)?;
        Ok(Expression::Import(ImportExpression {
            source: Box::new(source),
            span: self.span_from(start),
        }))
    }

    // ============ PRIMARY ============

    fn parse_primary(&mut self, ctx: Context) -> Result<Expression, ParseError> {
        let start = self.current.span;
        match self.current.kind {
            TokenKind::Identifier(_) => {
                if self.is_contextual("async") {
                    if let Some(expr) = self.parse_async_primary(ctx, start)? {
                        return Ok(expr);
                    }
                }
                let id = self.parse_identifier_reference(ctx)?;
                if self.check(&TokenKind::Arrow) && !self.has_newline() {
                    self.check_binding_name(ctx, &id.name, None, id.span)?;
                    return self.parse_arrow_function(ctx, start, vec![Pattern::Identifier(id)], false);
                }
                Ok(Expression::Identifier(id))
            }
            TokenKind::Number(_)
            | TokenKind::BigInt(_)
            | TokenKind::String(_)
            | TokenKind::Null
            | TokenKind::True
            | TokenKind::False => Ok(Expression::Literal(self.parse_literal(ctx)?)),
            TokenKind::Slash | TokenKind::SlashEq => {
                self.current = self.lexer.rescan_as_regexp(self.current.span)?;
                Ok(Expression::Literal(self.parse_literal(ctx)?))
            }
            TokenKind::This => {
                self.expect(&TokenKind::This)?;
                Ok(Expression::This(ThisExpression {
                    span: self.with_metadata(start),
                }))
            }
            TokenKind::TemplateNoSub(_) | TokenKind::TemplateHead(_) => {
                Ok(Expression::Template(self.parse_template(ctx, false)?))
            }
            TokenKind::LParen => self.parse_paren_or_arrow(ctx),
            TokenKind::LBracket => self.parse_array_literal(ctx),
            TokenKind::LBrace => self.parse_object_literal(ctx),
            TokenKind::Function => {
                let function = self.parse_function_expression(ctx, start, false)?;
                Ok(Expression::Function(Box::new(function)))
            }
            TokenKind::Class => {
                let class = self.parse_class(ctx, start, DeclarationKind::Expression, Vec::new())?;
                Ok(Expression::Class(Box::new(class)))
            }
            TokenKind::At => {
                let decorators = self.parse_decorators(ctx)?;
                if !self.check(&TokenKind::Class) {
                    return Err(self.unexpected());
                }
                let class = self.parse_class(ctx, start, DeclarationKind::Expression, decorators)?;
                Ok(Expression::Class(Box::new(class)))
            }
            TokenKind::Do if ctx.has_experimental() => {
                self.advance()?;
                let body = self.parse_block(ctx)?;
                Ok(Expression::Do(DoExpression {
                    body,
                    span: self.span_from(start),
                }))
            }
            TokenKind::Lt if ctx.contains(Context::OPTION_JSX) => {
                Err(self.error(ErrorKind::JsxUnsupported, &[]))
            }
            _ => Err(self.unexpected()),
        }
    }

    /// `async function`, `async x => ...`; `None` when `async` is a plain identifier
    fn parse_async_primary(
        &mut self,
        ctx: Context,
        start: Span,
    ) -> Result<Option<Expression>, ParseError> {
        let (next, newline) = self.peek()?;
        if newline {
            return Ok(None);
        }
        match next.kind {
            TokenKind::Function => {
                self.advance()?;
                let function = self.parse_function_expression(ctx, start, true)?;
                Ok(Some(Expression::Function(Box::new(function))))
            }
            TokenKind::Identifier(_) => {
                self.advance()?;
                let param_ctx = ctx.with(Context::AWAIT, true);
                let id = self.parse_identifier_reference(param_ctx)?;
                self.check_binding_name(ctx, &id.name, None, id.span)?;
                if !self.check(&TokenKind::Arrow) || self.has_newline() {
                    return Err(self.unexpected());
                }
                let arrow = self.parse_arrow_function(ctx, start, vec![Pattern::Identifier(id)], true)?;
                Ok(Some(arrow))
            }
            _ => Ok(None),
        }
    }

    pub(super) fn parse_literal(&mut self, ctx: Context) -> Result<Literal, ParseError> {
        let token = &self.current;
        let value = match &token.kind {
            TokenKind::Number(n) => {
                if token.octal && ctx.is_strict() {
                    return Err(self.error(ErrorKind::StrictOctalLiteral, &[]));
                }
                LiteralValue::Number(*n)
            }
            TokenKind::String(s) => {
                if token.octal && ctx.is_strict() {
                    return Err(self.error(ErrorKind::LegacyOctalEscape, &[]));
                }
                LiteralValue::String(s.clone())
            }
            TokenKind::BigInt(digits) => LiteralValue::BigInt(digits.clone()),
            TokenKind::RegExp { pattern, flags } => LiteralValue::RegExp {
                pattern: pattern.clone(),
                flags: flags.clone(),
            },
            TokenKind::Null => LiteralValue::Null,
            TokenKind::True => LiteralValue::Boolean(true),
            TokenKind::False => LiteralValue::Boolean(false),
            _ => return Err(self.unexpected()),
        };
        if token.escaped {
            return Err(self.error(ErrorKind::EscapedKeyword, &[]));
        }
        let span = token.span;
        self.advance()?;
        let raw = self.raw_text(span);
        Ok(Literal {
            value,
            raw,
            span: self.with_metadata(span),
        })
    }

    // ============ TEMPLATES ============

    /// Template literal starting at the current `TemplateNoSub`/`TemplateHead`.
    /// Chunks with escapes that have no cooked value are only legal when tagged.
    pub(super) fn parse_template(
        &mut self,
        ctx: Context,
        tagged: bool,
    ) -> Result<TemplateLiteral, ParseError> {
        let start = self.current.span;
        let mut quasis = Vec::new();
        let mut expressions = Vec::new();

        loop {
            let token = self.current.clone();
            let (part, tail) = match token.kind {
                TokenKind::TemplateNoSub(part) | TokenKind::TemplateTail(part) => (part, true),
                TokenKind::TemplateHead(part) | TokenKind::TemplateMiddle(part) => (part, false),
                _ => return Err(self.unexpected()),
            };
            if part.cooked.is_none() && !tagged {
                let kind = if token.octal {
                    ErrorKind::TemplateOctalEscape
                } else {
                    ErrorKind::InvalidTemplateEscape
                };
                return Err(self.error(kind, &[]));
            }
            quasis.push(self.template_element(part, tail, token.span));
            self.advance()?;
            if tail {
                break;
            }

            expressions.push(self.parse_expression(ctx.with_in())?);
            if !self.check(&TokenKind::RBrace) {
                if self.is_at_end() {
                    return Err(self.error(ErrorKind::UnterminatedTemplate, &[]));
                }
                return Err(self.error(ErrorKind::UnterminatedTemplateSubstitution, &[]));
            }
            self.current = self.lexer.rescan_template_continuation(self.current.span)?;
        }

        Ok(TemplateLiteral {
            quasis,
            expressions,
            span: self.span_from(start),
        })
    }

    /// The element covers the chunk text without its delimiters
    fn template_element(&self, part: TemplatePart, tail: bool, span: Span) -> TemplateElement {
        let close = if tail { 1 } else { 2 };
        let start = (span.start + 1).min(span.end);
        let end = span.end.saturating_sub(close).max(start);
        let inner = Span {
            start,
            end,
            column: span.column + 1,
            end_column: span.end_column.saturating_sub(close as u32),
            ..span
        };
        TemplateElement {
            value: TemplateValue {
                raw: part.raw,
                cooked: part.cooked,
            },
            tail,
            span: self.with_metadata(inner),
        }
    }

    // ============ COVER GRAMMARS ============

    /// `( Expression )` or an arrow parameter list
    fn parse_paren_or_arrow(&mut self, ctx: Context) -> Result<Expression, ParseError> {
        let start = self.current.span;
        self.expect(&TokenKind::LParen)?;
        let saved = self.take_cover();
        let inner_ctx = ctx.with_in() | Context::IN_PARENTHESIS;

        let mut items = Vec::new();
        let mut rest = None;
        let mut trailing_comma = false;
        while !self.check(&TokenKind::RParen) {
            if self.check(&TokenKind::DotDotDot) {
                rest = Some(self.parse_rest_element(inner_ctx, None)?);
                break;
            }
            items.push(self.parse_assignment_cover(inner_ctx, true)?);
            if !self.check(&TokenKind::RParen) {
                self.expect(&TokenKind::Comma)?;
                trailing_comma = self.check(&TokenKind::RParen);
            }
        }
        let close = self.current.span;
        self.expect(&TokenKind::RParen)?;

        if self.check(&TokenKind::Arrow) {
            if self.has_newline() {
                return Err(self.error(ErrorKind::UnexpectedArrowNewline, &[]));
            }
            self.raise_deferred(Flags::SEEN_YIELD | Flags::SEEN_AWAIT)?;
            self.discard_deferred(Flags::COVER);
            let mut params = Vec::with_capacity(items.len() + 1);
            for item in items {
                params.push(self.expression_to_pattern(ctx, item, PatternMode::Binding)?);
            }
            params.extend(rest);
            self.restore_cover(saved);
            return self.parse_arrow_function(ctx, start, params, false);
        }

        if items.is_empty() || rest.is_some() || trailing_comma {
            return Err(self.error_at(ErrorKind::UnexpectedToken, &[")"], close));
        }
        self.raise_deferred(Flags::COVER_INIT | Flags::DUPLICATE_PROTO)?;
        self.restore_cover(saved);

        let expr = if items.len() == 1 {
            match items.pop() {
                Some(expr) => expr,
                None => return Err(self.error_at(ErrorKind::UnexpectedToken, &[")"], close)),
            }
        } else {
            let first = items.first().map(Expression::span).unwrap_or(start);
            let last = items.last().map(Expression::span).unwrap_or(close);
            Expression::Sequence(SequenceExpression {
                expressions: items,
                span: self.with_metadata(first.to(last)),
            })
        };
        self.mark_parenthesized(expr.span());
        Ok(expr)
    }

    fn parse_array_literal(&mut self, ctx: Context) -> Result<Expression, ParseError> {
        let start = self.current.span;
        self.expect(&TokenKind::LBracket)?;
        let ctx = ctx.with_in();
        let mut elements = Vec::new();

        while !self.check(&TokenKind::RBracket) {
            if self.eat(&TokenKind::Comma)? {
                elements.push(None);
                continue;
            }
            let element = if self.check(&TokenKind::DotDotDot) {
                let spread_start = self.current.span;
                self.advance()?;
                let argument = self.parse_assignment_cover(ctx, true)?;
                let spread = SpreadElement {
                    argument: Box::new(argument),
                    span: self.span_from(spread_start),
                };
                if self.check(&TokenKind::Comma) {
                    self.spread_with_comma.insert(spread.span.key());
                }
                Expression::Spread(spread)
            } else {
                self.parse_assignment_cover(ctx, true)?
            };
            elements.push(Some(element));
            if !self.check(&TokenKind::RBracket) {
                self.expect(&TokenKind::Comma)?;
            }
        }
        self.expect(&TokenKind::RBracket)?;

        Ok(Expression::Array(ArrayExpression {
            elements,
            span: self.span_from(start),
        }))
    }

    fn parse_object_literal(&mut self, ctx: Context) -> Result<Expression, ParseError> {
        let start = self.current.span;
        self.expect(&TokenKind::LBrace)?;
        let ctx = ctx.with_in();
        let mut properties = Vec::new();
        let mut has_proto = false;

        while !self.check(&TokenKind::RBrace) {
            if self.check(&TokenKind::DotDotDot) {
                let spread_start = self.current.span;
                self.advance()?;
                let argument = self.parse_assignment_cover(ctx, true)?;
                let spread = SpreadElement {
                    argument: Box::new(argument),
                    span: self.span_from(spread_start),
                };
                if self.check(&TokenKind::Comma) {
                    self.spread_with_comma.insert(spread.span.key());
                }
                properties.push(ObjectMember::Spread(spread));
            } else {
                let property = self.parse_object_property(ctx, &mut has_proto)?;
                properties.push(ObjectMember::Property(property));
            }
            if !self.check(&TokenKind::RBrace) {
                self.expect(&TokenKind::Comma)?;
            }
        }
        self.expect(&TokenKind::RBrace)?;

        Ok(Expression::Object(ObjectExpression {
            properties,
            span: self.span_from(start),
        }))
    }

    fn parse_object_property(
        &mut self,
        ctx: Context,
        has_proto: &mut bool,
    ) -> Result<Property, ParseError> {
        let start = self.current.span;
        let mut is_async = false;
        let mut kind = PropertyKind::Init;

        if self.is_contextual("async") && self.modifier_applies(false)? {
            self.advance()?;
            is_async = true;
        }
        let generator = self.eat(&TokenKind::Star)?;
        if !is_async && !generator && (self.is_contextual("get") || self.is_contextual("set")) {
            if self.modifier_applies(true)? {
                kind = if self.is_contextual("get") {
                    PropertyKind::Get
                } else {
                    PropertyKind::Set
                };
                self.advance()?;
            }
        }

        let key_token = self.current.clone();
        let (key, computed) = self.parse_property_key(ctx)?;

        if kind != PropertyKind::Init {
            let flavor = if kind == PropertyKind::Get {
                MethodFlavor::Getter
            } else {
                MethodFlavor::Setter
            };
            let value = self.parse_method(ctx, flavor, false, false)?;
            return Ok(Property {
                key,
                value: Expression::Function(Box::new(value)),
                kind,
                method: false,
                shorthand: false,
                computed,
                span: self.span_from(start),
            });
        }

        if is_async || generator || self.check(&TokenKind::LParen) {
            let value = self.parse_method(ctx, MethodFlavor::Method, is_async, generator)?;
            return Ok(Property {
                key,
                value: Expression::Function(Box::new(value)),
                kind,
                method: true,
                shorthand: false,
                computed,
                span: self.span_from(start),
            });
        }

        if self.eat(&TokenKind::Colon)? {
            if !computed && is_proto_key(&key) {
                if *has_proto {
                    let err = self.error_at(ErrorKind::DuplicateProto, &[], key.span());
                    self.defer(Flags::DUPLICATE_PROTO, err);
                }
                *has_proto = true;
            }
            let value = self.parse_assignment_cover(ctx, true)?;
            return Ok(Property {
                key,
                value,
                kind,
                method: false,
                shorthand: false,
                computed,
                span: self.span_from(start),
            });
        }

        // Shorthand `{ a }` or cover-initialised `{ a = 1 }`
        let Expression::Identifier(id) = &key else {
            return Err(self.unexpected());
        };
        if !matches!(key_token.kind, TokenKind::Identifier(_)) {
            return Err(self.error_at(ErrorKind::UnexpectedReserved, &[id.name.as_str()], id.span));
        }
        let id = id.clone();
        self.validate_reference_name(ctx, &id.name, id.span)?;

        let value = if self.check(&TokenKind::Eq) {
            let err = self.error(ErrorKind::InvalidCoverInitializedName, &[]);
            self.defer(Flags::COVER_INIT, err);
            self.advance()?;
            let right = self.parse_assignment_expression(ctx)?;
            Expression::Assignment(AssignmentExpression {
                operator: AssignmentOp::Assign,
                left: Box::new(Pattern::Identifier(id)),
                right: Box::new(right),
                span: self.span_from(start),
            })
        } else {
            Expression::Identifier(id)
        };
        Ok(Property {
            key,
            value,
            kind,
            method: false,
            shorthand: true,
            computed: false,
            span: self.span_from(start),
        })
    }

    /// Whether a contextual modifier (`async`, `get`, `set`, `static`) is
    /// followed by a property key rather than being the key itself
    pub(super) fn modifier_applies(&mut self, newline_ok: bool) -> Result<bool, ParseError> {
        let (next, newline) = self.peek()?;
        if newline && !newline_ok {
            return Ok(false);
        }
        Ok(!matches!(
            next.kind,
            TokenKind::LParen
                | TokenKind::Colon
                | TokenKind::Comma
                | TokenKind::RBrace
                | TokenKind::Eq
                | TokenKind::Semicolon
                | TokenKind::Eof
        ))
    }

    /// PropertyName: identifier name, string, number or `[computed]`
    pub(super) fn parse_property_key(&mut self, ctx: Context) -> Result<(Expression, bool), ParseError> {
        match self.current.kind {
            TokenKind::String(_) | TokenKind::Number(_) | TokenKind::BigInt(_) => {
                Ok((Expression::Literal(self.parse_literal(ctx)?), false))
            }
            TokenKind::LBracket => {
                self.advance()?;
                let key = self.parse_assignment_expression(ctx.with_in())?;
                self.expect(&TokenKind::RBracket)?;
                Ok((key, true))
            }
            _ if self.current.kind.is_identifier_name() => {
                Ok((Expression::Identifier(self.parse_identifier_name()?), false))
            }
            _ => Err(self.unexpected()),
        }
    }
}

fn is_proto_key(key: &Expression) -> bool {
    match key {
        Expression::Identifier(id) => id.name == "__proto__",
        Expression::Literal(Literal {
            value: LiteralValue::String(s),
            ..
        }) => s == "__proto__",
        _ => false,
    }
}

fn assignment_op(kind: &TokenKind) -> Option<AssignmentOp> {
    let op = match kind {
        TokenKind::Eq => AssignmentOp::Assign,
        TokenKind::PlusEq => AssignmentOp::AddAssign,
        TokenKind::MinusEq => AssignmentOp::SubAssign,
        TokenKind::StarEq => AssignmentOp::MulAssign,
        TokenKind::SlashEq => AssignmentOp::DivAssign,
        TokenKind::PercentEq => AssignmentOp::ModAssign,
        TokenKind::StarStarEq => AssignmentOp::ExpAssign,
        TokenKind::AmpEq => AssignmentOp::BitAndAssign,
        TokenKind::PipeEq => AssignmentOp::BitOrAssign,
        TokenKind::CaretEq => AssignmentOp::BitXorAssign,
        TokenKind::LtLtEq => AssignmentOp::LShiftAssign,
        TokenKind::GtGtEq => AssignmentOp::RShiftAssign,
        TokenKind::GtGtGtEq => AssignmentOp::URShiftAssign,
        TokenKind::AmpAmpEq => AssignmentOp::AndAssign,
        TokenKind::PipePipeEq => AssignmentOp::OrAssign,
        TokenKind::QuestionQuestionEq => AssignmentOp::NullishAssign,
        _ => return None,
    };
    Some(op)
}

fn logical_op(kind: &TokenKind) -> Option<LogicalOp> {
    match kind {
        TokenKind::AmpAmp => Some(LogicalOp::And),
        TokenKind::PipePipe => Some(LogicalOp::Or),
        TokenKind::QuestionQuestion => Some(LogicalOp::NullishCoalescing),
        _ => None,
    }
}

fn binary_op(kind: &TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Mod,
        TokenKind::StarStar => BinaryOp::Exp,
        TokenKind::EqEq => BinaryOp::Eq,
        TokenKind::BangEq => BinaryOp::NotEq,
        TokenKind::EqEqEq => BinaryOp::StrictEq,
        TokenKind::BangEqEq => BinaryOp::StrictNotEq,
        TokenKind::Lt => BinaryOp::Lt,
        TokenKind::LtEq => BinaryOp::LtEq,
        TokenKind::Gt => BinaryOp::Gt,
        TokenKind::GtEq => BinaryOp::GtEq,
        TokenKind::Amp => BinaryOp::BitAnd,
        TokenKind::Pipe => BinaryOp::BitOr,
        TokenKind::Caret => BinaryOp::BitXor,
        TokenKind::LtLt => BinaryOp::LShift,
        TokenKind::GtGt => BinaryOp::RShift,
        TokenKind::GtGtGt => BinaryOp::URShift,
        TokenKind::In => BinaryOp::In,
        TokenKind::Instanceof => BinaryOp::Instanceof,
        _ => return None,
    };
    Some(op)
}

fn unary_op(kind: &TokenKind) -> Option<UnaryOp> {
    let op = match kind {
        TokenKind::Minus => UnaryOp::Minus,
        TokenKind::Plus => UnaryOp::Plus,
        TokenKind::Bang => UnaryOp::Not,
        TokenKind::Tilde => UnaryOp::BitNot,
        TokenKind::Typeof => UnaryOp::Typeof,
        TokenKind::Void => UnaryOp::Void,
        TokenKind::Delete => UnaryOp::Delete,
        _ => return None,
    };
    Some(op)
}

fn update_op(kind: &TokenKind) -> Option<UpdateOp> {
    match kind {
        TokenKind::PlusPlus => Some(UpdateOp::Increment),
        TokenKind::MinusMinus => Some(UpdateOp::Decrement),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;
    use crate::string_dict::StringDict;

    fn with_parser<T>(source: &str, f: impl FnOnce(&mut Parser<'_>, Context) -> T) -> T {
        let mut dict = StringDict::with_common_strings();
        let Ok(mut parser) = Parser::new(source, &Options::default(), &mut dict) else {
            panic!("lexer rejected {:?}", source);
        };
        let ctx = parser.ctx;
        f(&mut parser, ctx)
    }

    #[test]
    fn test_bare_arrow_ends_the_expression() {
        with_parser("x => {} + 1", |p, ctx| {
            let Ok(expr) = p.parse_assignment_expression(ctx) else {
                panic!("Expected arrow to parse");
            };
            assert!(p.is_bare_arrow(&expr));
            assert_eq!(p.current.kind, TokenKind::Plus);
        });
    }

    #[test]
    fn test_parenthesized_arrow_is_not_bare() {
        with_parser("(x => 1)", |p, ctx| {
            let Ok(expr) = p.parse_expression(ctx) else {
                panic!("Expected arrow to parse");
            };
            assert!(matches!(expr, Expression::ArrowFunction(_)));
            assert!(!p.is_bare_arrow(&expr));
            assert!(p.operand(expr).is_ok());
        });
    }

    #[test]
    fn test_bare_arrow_is_not_an_operand() {
        with_parser("y => y", |p, ctx| {
            let Ok(expr) = p.parse_assignment_expression(ctx) else {
                panic!("Expected arrow to parse");
            };
            let err = p.operand(expr).err().map(|e| e.kind);
            assert_eq!(err, Some(ErrorKind::UnexpectedToken));
        });
    }

    #[test]
    fn test_binary_right_operand_checked() {
        with_parser("a - b => b", |p, ctx| {
            let err = p.parse_expression(ctx).err().map(|e| e.kind);
            assert_eq!(err, Some(ErrorKind::UnexpectedToken));
        });
    }
}
