//! Statement parsing, automatic semicolon insertion and label bookkeeping

use crate::ast::*;
use crate::context::{Context, Flags};
use crate::error::{ErrorKind, ParseError};
use crate::lexer::{Span, TokenKind};
use crate::scope::{BindingKind, ScopeKind};

use super::function::DeclarationKind;
use super::pattern::PatternMode;
use super::{Label, Parser};

impl<'a> Parser<'a> {
    // ============ STATEMENT LIST ITEMS ============

    /// StatementListItem: a declaration or a statement. `top_level` is true in
    /// the body of a script or module.
    pub(super) fn parse_statement_list_item(
        &mut self,
        ctx: Context,
        top_level: bool,
    ) -> Result<Statement, ParseError> {
        let start = self.current.span;
        if self.is_contextual("let") && self.is_let_declaration()? {
            return self.parse_variable_statement(ctx, VariableKind::Let);
        }
        if self.is_async_function()? {
            self.advance()?;
            let function = self.parse_function_declaration(ctx, start, true, DeclarationKind::Statement)?;
            return Ok(Statement::FunctionDeclaration(Box::new(function)));
        }
        let import_expression = self.check(&TokenKind::Import) && self.is_import_expression()?;

        match self.current.kind {
            TokenKind::Function => {
                let function = self.parse_function_declaration(ctx, start, false, DeclarationKind::Statement)?;
                Ok(Statement::FunctionDeclaration(Box::new(function)))
            }
            TokenKind::Class => {
                let class = self.parse_class(ctx, start, DeclarationKind::Statement, Vec::new())?;
                Ok(Statement::ClassDeclaration(Box::new(class)))
            }
            TokenKind::At => {
                let decorators = self.parse_decorators(ctx)?;
                if !self.check(&TokenKind::Class) {
                    return Err(self.unexpected());
                }
                let class = self.parse_class(ctx, start, DeclarationKind::Statement, decorators)?;
                Ok(Statement::ClassDeclaration(Box::new(class)))
            }
            TokenKind::Const => self.parse_variable_statement(ctx, VariableKind::Const),
            TokenKind::Import if !import_expression => {
                if !top_level || !ctx.is_module() {
                    return Err(self.error(ErrorKind::ImportOutsideModule, &[]));
                }
                self.parse_import_declaration(ctx)
            }
            TokenKind::Export => {
                if !top_level || !ctx.is_module() {
                    return Err(self.error(ErrorKind::ExportOutsideModule, &[]));
                }
                self.parse_export_declaration(ctx)
            }
            _ => self.parse_statement(ctx),
        }
    }

    /// `let` starts a declaration when followed by a binding name or pattern
    fn is_let_declaration(&mut self) -> Result<bool, ParseError> {
        let (next, _) = self.peek()?;
        Ok(matches!(
            next.kind,
            TokenKind::Identifier(_) | TokenKind::LBracket | TokenKind::LBrace
        ))
    }

    /// `async function` with no line break in between
    fn is_async_function(&mut self) -> Result<bool, ParseError> {
        if !self.is_contextual("async") {
            return Ok(false);
        }
        let (next, newline) = self.peek()?;
        Ok(next.kind == TokenKind::Function && !newline)
    }

    /// `import(` and `import.` begin expressions, not declarations
    fn is_import_expression(&mut self) -> Result<bool, ParseError> {
        let (next, _) = self.peek()?;
        Ok(matches!(next.kind, TokenKind::LParen | TokenKind::Dot))
    }

    // ============ STATEMENTS ============

    pub(super) fn parse_statement(&mut self, ctx: Context) -> Result<Statement, ParseError> {
        self.nested(|p| p.parse_statement_inner(ctx))
    }

    fn parse_statement_inner(&mut self, ctx: Context) -> Result<Statement, ParseError> {
        let start = self.current.span;
        if let TokenKind::Identifier(_) = self.current.kind {
            let (next, _) = self.peek()?;
            if next.kind == TokenKind::Colon {
                return self.parse_labeled_statement(ctx);
            }
        }
        // Only a label keeps the chain of labels attached to the next statement
        let chained = std::mem::replace(&mut self.label_chain, 0);
        if self.is_async_function()? {
            return Err(self.error(ErrorKind::LexicalInSingleStatement, &[]));
        }
        let import_expression = self.check(&TokenKind::Import) && self.is_import_expression()?;
        if self.current.escaped && self.current.kind.is_reserved() {
            return Err(self.error(ErrorKind::EscapedKeyword, &[]));
        }
        let let_lookahead = if self.is_contextual("let") {
            Some(self.peek()?)
        } else {
            None
        };

        match self.current.kind {
            TokenKind::LBrace => Ok(Statement::Block(self.parse_block(ctx)?)),
            TokenKind::Var => self.parse_variable_statement(ctx, VariableKind::Var),
            TokenKind::Semicolon => {
                self.advance()?;
                Ok(Statement::Empty(EmptyStatement {
                    span: self.span_from(start),
                }))
            }
            TokenKind::If => self.parse_if_statement(ctx),
            TokenKind::For => self.with_label_chain(chained, |p| p.parse_for_statement(ctx)),
            TokenKind::While => self.with_label_chain(chained, |p| p.parse_while_statement(ctx)),
            TokenKind::Do => self.with_label_chain(chained, |p| p.parse_do_while_statement(ctx)),
            TokenKind::Continue => self.parse_continue_statement(ctx),
            TokenKind::Break => self.parse_break_statement(ctx),
            TokenKind::Return => self.parse_return_statement(ctx),
            TokenKind::With => self.parse_with_statement(ctx),
            TokenKind::Switch => self.parse_switch_statement(ctx),
            TokenKind::Throw => self.parse_throw_statement(ctx),
            TokenKind::Try => self.parse_try_statement(ctx),
            TokenKind::Debugger => {
                self.advance()?;
                self.consume_semicolon()?;
                Ok(Statement::Debugger(DebuggerStatement {
                    span: self.span_from(start),
                }))
            }
            TokenKind::Function => {
                let kind = if ctx.is_strict() {
                    ErrorKind::StrictFunctionDeclaration
                } else {
                    ErrorKind::InvalidLabelledFunction
                };
                Err(self.error(kind, &[]))
            }
            TokenKind::Class | TokenKind::Const => {
                Err(self.error(ErrorKind::LexicalInSingleStatement, &[]))
            }
            TokenKind::Identifier(_) if let_lookahead.is_some() => {
                let lexical = match &let_lookahead {
                    Some((next, newline)) => match next.kind {
                        TokenKind::LBracket => true,
                        TokenKind::Identifier(_) | TokenKind::LBrace => !newline,
                        _ => false,
                    },
                    None => false,
                };
                if lexical {
                    return Err(self.error(ErrorKind::LexicalInSingleStatement, &[]));
                }
                Ok(Statement::Expression(self.parse_expression_statement(ctx)?))
            }
            TokenKind::Import if !import_expression => {
                Err(self.error(ErrorKind::ImportOutsideModule, &[]))
            }
            TokenKind::Export => Err(self.error(ErrorKind::ExportOutsideModule, &[])),
            _ => Ok(Statement::Expression(self.parse_expression_statement(ctx)?)),
        }
    }

    /// Mark the labels directly in front of a loop as iteration labels
    fn with_label_chain<T>(
        &mut self,
        chained: usize,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        let from = self.labels.len().saturating_sub(chained);
        if let Some(labels) = self.labels.get_mut(from..) {
            for label in labels {
                label.iteration = true;
            }
        }
        f(self)
    }

    pub(super) fn parse_expression_statement(
        &mut self,
        ctx: Context,
    ) -> Result<ExpressionStatement, ParseError> {
        let start = self.current.span;
        let expression = self.parse_expression(ctx.with_in())?;
        self.consume_semicolon()?;
        Ok(ExpressionStatement {
            expression,
            directive: None,
            span: self.span_from(start),
        })
    }

    /// `{ StatementList }` in a fresh block scope
    pub(super) fn parse_block(&mut self, ctx: Context) -> Result<BlockStatement, ParseError> {
        let start = self.current.span;
        self.expect(&TokenKind::LBrace)?;
        self.scopes.push(ScopeKind::Block);
        let mut body = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            if self.is_at_end() {
                return Err(self.error(ErrorKind::UnexpectedEof, &[]));
            }
            body.push(self.parse_statement_list_item(ctx, false)?);
        }
        self.expect(&TokenKind::RBrace)?;
        self.scopes.pop();
        Ok(BlockStatement {
            body,
            span: self.span_from(start),
        })
    }

    // ============ DECLARATIONS ============

    pub(super) fn parse_variable_statement(
        &mut self,
        ctx: Context,
        kind: VariableKind,
    ) -> Result<Statement, ParseError> {
        let start = self.current.span;
        let mut declaration = self.parse_variable_declaration(ctx.with_in(), kind)?;
        self.check_declaration_inits(&declaration)?;
        self.consume_semicolon()?;
        declaration.span = self.span_from(start);
        Ok(Statement::VariableDeclaration(declaration))
    }

    /// `var` / `let` / `const` and its declarators, without the terminator.
    /// Missing initialisers are checked by the caller: a `for-in`/`for-of`
    /// head has none.
    pub(super) fn parse_variable_declaration(
        &mut self,
        ctx: Context,
        kind: VariableKind,
    ) -> Result<VariableDeclaration, ParseError> {
        let start = self.current.span;
        if self.current.escaped {
            return Err(self.error(ErrorKind::EscapedKeyword, &[]));
        }
        self.advance()?;
        let binding = match kind {
            VariableKind::Var => BindingKind::Var,
            VariableKind::Let => BindingKind::Let,
            VariableKind::Const => BindingKind::Const,
        };

        let mut declarations = Vec::new();
        loop {
            let decl_start = self.current.span;
            let id = self.parse_binding_target(ctx, Some(binding))?;
            let init = if self.eat(&TokenKind::Eq)? {
                Some(self.parse_assignment_expression(ctx)?)
            } else {
                None
            };
            declarations.push(VariableDeclarator {
                id,
                init,
                span: self.span_from(decl_start),
            });
            if !self.eat(&TokenKind::Comma)? {
                break;
            }
        }

        Ok(VariableDeclaration {
            declarations,
            kind,
            span: self.span_from(start),
        })
    }

    fn check_declaration_inits(&self, declaration: &VariableDeclaration) -> Result<(), ParseError> {
        for declarator in &declaration.declarations {
            if declarator.init.is_some() {
                continue;
            }
            if declaration.kind == VariableKind::Const {
                return Err(self.error_at(ErrorKind::ConstWithoutInit, &[], declarator.span));
            }
            if !declarator.id.is_simple() {
                return Err(self.error_at(ErrorKind::DestructuringWithoutInit, &[], declarator.span));
            }
        }
        Ok(())
    }

    // ============ CONTROL FLOW ============

    /// `else if` chains are collected in a loop and folded from the back, so
    /// a long chain does not nest the call stack
    fn parse_if_statement(&mut self, ctx: Context) -> Result<Statement, ParseError> {
        let mut branches = Vec::new();
        let mut alternate = None;
        loop {
            let start = self.current.span;
            self.expect(&TokenKind::If)?;
            self.expect(&TokenKind::LParen)?;
            let test = self.parse_expression(ctx.with_in())?;
            self.expect(&TokenKind::RParen)?;
            let consequent = self.parse_if_body(ctx)?;
            branches.push((start, test, consequent));
            if !self.eat(&TokenKind::Else)? {
                break;
            }
            if !self.check(&TokenKind::If) || self.current.escaped {
                alternate = Some(self.parse_if_body(ctx)?);
                break;
            }
            self.label_chain = 0;
        }

        while let Some((start, test, consequent)) = branches.pop() {
            let statement = Statement::If(IfStatement {
                test,
                consequent: Box::new(consequent),
                alternate: alternate.take().map(Box::new),
                span: self.span_from(start),
            });
            alternate = Some(statement);
        }
        alternate.ok_or_else(|| self.unexpected())
    }

    /// Sloppy code may use a plain function declaration as an `if` branch; it
    /// behaves as if wrapped in a block.
    fn parse_if_body(&mut self, ctx: Context) -> Result<Statement, ParseError> {
        if !self.check(&TokenKind::Function) || ctx.is_strict() {
            return self.parse_statement(ctx);
        }
        let start = self.current.span;
        self.scopes.push(ScopeKind::Block);
        let function = self.parse_function_declaration(ctx, start, false, DeclarationKind::Statement)?;
        self.scopes.pop();
        if function.generator {
            return Err(self.error_at(ErrorKind::InvalidLabelledFunction, &[], start));
        }
        Ok(Statement::FunctionDeclaration(Box::new(function)))
    }

    /// Body of a loop, with `break` and `continue` enabled
    fn parse_loop_body(&mut self, ctx: Context) -> Result<Statement, ParseError> {
        let saved = self.flags & Flags::NESTING;
        self.flags |= Flags::IN_ITERATION;
        let body = self.parse_statement(ctx);
        self.flags -= Flags::NESTING;
        self.flags |= saved;
        body
    }

    fn parse_while_statement(&mut self, ctx: Context) -> Result<Statement, ParseError> {
        let start = self.current.span;
        self.expect(&TokenKind::While)?;
        self.expect(&TokenKind::LParen)?;
        let test = self.parse_expression(ctx.with_in())?;
        self.expect(&TokenKind::RParen)?;
        let body = self.parse_loop_body(ctx)?;
        Ok(Statement::While(WhileStatement {
            test,
            body: Box::new(body),
            span: self.span_from(start),
        }))
    }

    fn parse_do_while_statement(&mut self, ctx: Context) -> Result<Statement, ParseError> {
        let start = self.current.span;
        self.expect(&TokenKind::Do)?;
        let body = self.parse_loop_body(ctx)?;
        self.expect(&TokenKind::While)?;
        self.expect(&TokenKind::LParen)?;
        let test = self.parse_expression(ctx.with_in())?;
        self.expect(&TokenKind::RParen)?;
        // A semicolon is always inserted after `do ... while (...)`
        self.eat(&TokenKind::Semicolon)?;
        Ok(Statement::DoWhile(DoWhileStatement {
            body: Box::new(body),
            test,
            span: self.span_from(start),
        }))
    }

    fn parse_for_statement(&mut self, ctx: Context) -> Result<Statement, ParseError> {
        let start = self.current.span;
        self.expect(&TokenKind::For)?;
        let is_await = if self.is_contextual("await") {
            if !ctx.has_await() {
                return Err(self.error(ErrorKind::AwaitOutsideAsync, &[]));
            }
            self.advance()?;
            true
        } else {
            false
        };
        self.expect(&TokenKind::LParen)?;
        self.scopes.push(ScopeKind::For);
        let result = self.parse_for_rest(ctx, start, is_await);
        self.scopes.pop();
        result
    }

    fn parse_for_rest(
        &mut self,
        ctx: Context,
        start: Span,
        is_await: bool,
    ) -> Result<Statement, ParseError> {
        let head_ctx = ctx.without_in();

        let let_declaration = self.is_contextual("let") && self.is_let_declaration()?;
        let kind = match self.current.kind {
            TokenKind::Semicolon => None,
            TokenKind::Var => Some(VariableKind::Var),
            TokenKind::Const => Some(VariableKind::Const),
            TokenKind::Identifier(_) if let_declaration => Some(VariableKind::Let),
            _ => {
                return self.parse_for_expression_head(ctx, start, is_await);
            }
        };

        let init = match kind {
            Some(kind) => {
                let declaration = self.parse_variable_declaration(head_ctx, kind)?;
                if let Some(word) = self.for_in_of_keyword() {
                    return self.parse_for_in_of_declaration(ctx, start, is_await, declaration, word);
                }
                self.check_declaration_inits(&declaration)?;
                Some(ForInit::Variable(declaration))
            }
            None => None,
        };
        if is_await {
            return Err(self.unexpected());
        }
        self.parse_for_loop(ctx, start, init)
    }

    /// `in` / `of` at the current token
    fn for_in_of_keyword(&self) -> Option<&'static str> {
        if self.check(&TokenKind::In) {
            Some("in")
        } else if self.is_contextual("of") {
            Some("of")
        } else {
            None
        }
    }

    fn parse_for_in_of_declaration(
        &mut self,
        ctx: Context,
        start: Span,
        is_await: bool,
        declaration: VariableDeclaration,
        word: &str,
    ) -> Result<Statement, ParseError> {
        if declaration.declarations.len() != 1 {
            return Err(self.error_at(ErrorKind::ForInOfMultipleBindings, &[word], declaration.span));
        }
        if let Some(declarator) = declaration.declarations.first() {
            if declarator.init.is_some() {
                // Annex B: `for (var x = 1 in o)` in sloppy code
                let legacy = word == "in"
                    && !ctx.is_strict()
                    && declaration.kind == VariableKind::Var
                    && declarator.id.is_simple();
                if !legacy {
                    return Err(self.error_at(ErrorKind::ForInOfInitializer, &[word], declarator.span));
                }
            }
        }
        self.parse_for_in_of_rest(ctx, start, is_await, ForTarget::Variable(declaration), word)
    }

    /// Head starting with an expression: a plain `for`, or a `for-in`/`for-of`
    /// whose left side is reinterpreted as an assignment target
    fn parse_for_expression_head(
        &mut self,
        ctx: Context,
        start: Span,
        is_await: bool,
    ) -> Result<Statement, ParseError> {
        let head_ctx = ctx.without_in();
        let expr_start = self.current.span;
        let starts_with_let = self.is_contextual("let");
        let starts_with_async = self.is_contextual("async");

        let saved = self.take_cover();
        let expr = self.parse_assignment_cover(head_ctx, true)?;

        if let Some(word) = self.for_in_of_keyword() {
            if word == "of" {
                if starts_with_let {
                    return Err(self.error_at(ErrorKind::ForOfLet, &[], expr_start));
                }
                let is_bare_async = matches!(&expr, Expression::Identifier(id) if id.name == "async");
                if starts_with_async && is_bare_async && !is_await {
                    return Err(self.error_at(ErrorKind::ForOfAsync, &[], expr_start));
                }
            }
            let target = if self.is_pattern_candidate(&expr) {
                self.discard_deferred(Flags::COVER_INIT | Flags::DUPLICATE_PROTO);
                self.expression_to_pattern(ctx, expr, PatternMode::Assign)?
            } else {
                let kind = if word == "in" {
                    ErrorKind::InvalidLhsForIn
                } else {
                    ErrorKind::InvalidLhsForOf
                };
                self.simple_assignment_target(ctx, expr, kind)?
            };
            self.restore_cover(saved);
            return self.parse_for_in_of_rest(ctx, start, is_await, ForTarget::Pattern(target), word);
        }

        self.raise_deferred(Flags::COVER_INIT | Flags::DUPLICATE_PROTO)?;
        self.restore_cover(saved);
        if is_await {
            return Err(self.unexpected());
        }

        let init = if self.check(&TokenKind::Comma) {
            let mut expressions = vec![expr];
            while self.eat(&TokenKind::Comma)? {
                expressions.push(self.parse_assignment_expression(head_ctx)?);
            }
            Expression::Sequence(SequenceExpression {
                expressions,
                span: self.span_from(expr_start),
            })
        } else {
            expr
        };
        self.parse_for_loop(ctx, start, Some(ForInit::Expression(init)))
    }

    fn parse_for_in_of_rest(
        &mut self,
        ctx: Context,
        start: Span,
        is_await: bool,
        left: ForTarget,
        word: &str,
    ) -> Result<Statement, ParseError> {
        self.advance()?;
        if word == "in" {
            if is_await {
                return Err(self.error_at(ErrorKind::UnexpectedToken, &["in"], self.previous));
            }
            let right = self.parse_expression(ctx.with_in())?;
            self.expect(&TokenKind::RParen)?;
            let body = self.parse_loop_body(ctx)?;
            return Ok(Statement::ForIn(ForInStatement {
                left,
                right,
                body: Box::new(body),
                span: self.span_from(start),
            }));
        }

        let right = self.parse_assignment_expression(ctx.with_in())?;
        self.expect(&TokenKind::RParen)?;
        let body = self.parse_loop_body(ctx)?;
        Ok(Statement::ForOf(ForOfStatement {
            left,
            right,
            body: Box::new(body),
            is_await,
            span: self.span_from(start),
        }))
    }

    /// `; test ; update ) body` of a plain `for`
    fn parse_for_loop(
        &mut self,
        ctx: Context,
        start: Span,
        init: Option<ForInit>,
    ) -> Result<Statement, ParseError> {
        self.expect(&TokenKind::Semicolon)?;
        let test = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression(ctx.with_in())?)
        };
        self.expect(&TokenKind::Semicolon)?;
        let update = if self.check(&TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expression(ctx.with_in())?)
        };
        self.expect(&TokenKind::RParen)?;
        let body = self.parse_loop_body(ctx)?;
        Ok(Statement::For(ForStatement {
            init,
            test,
            update,
            body: Box::new(body),
            span: self.span_from(start),
        }))
    }

    fn parse_switch_statement(&mut self, ctx: Context) -> Result<Statement, ParseError> {
        let start = self.current.span;
        self.expect(&TokenKind::Switch)?;
        self.expect(&TokenKind::LParen)?;
        let discriminant = self.parse_expression(ctx.with_in())?;
        self.expect(&TokenKind::RParen)?;
        self.expect(&TokenKind::LBrace)?;

        self.scopes.push(ScopeKind::Switch);
        let saved = self.flags & Flags::NESTING;
        self.flags |= Flags::IN_SWITCH;
        let cases = self.parse_switch_cases(ctx);
        self.flags -= Flags::NESTING;
        self.flags |= saved;
        self.scopes.pop();
        let cases = cases?;

        self.expect(&TokenKind::RBrace)?;
        Ok(Statement::Switch(SwitchStatement {
            discriminant,
            cases,
            span: self.span_from(start),
        }))
    }

    fn parse_switch_cases(&mut self, ctx: Context) -> Result<Vec<SwitchCase>, ParseError> {
        let mut cases = Vec::new();
        let mut has_default = false;
        while !self.check(&TokenKind::RBrace) {
            let case_start = self.current.span;
            let test = if self.eat(&TokenKind::Case)? {
                Some(self.parse_expression(ctx.with_in())?)
            } else if self.check(&TokenKind::Default) {
                if has_default {
                    return Err(self.error(ErrorKind::MultipleDefaultsInSwitch, &[]));
                }
                has_default = true;
                self.advance()?;
                None
            } else {
                return Err(self.unexpected());
            };
            self.expect(&TokenKind::Colon)?;

            let mut consequent = Vec::new();
            while !matches!(
                self.current.kind,
                TokenKind::Case | TokenKind::Default | TokenKind::RBrace | TokenKind::Eof
            ) {
                consequent.push(self.parse_statement_list_item(ctx, false)?);
            }
            cases.push(SwitchCase {
                test,
                consequent,
                span: self.span_from(case_start),
            });
        }
        Ok(cases)
    }

    fn parse_try_statement(&mut self, ctx: Context) -> Result<Statement, ParseError> {
        let start = self.current.span;
        self.expect(&TokenKind::Try)?;
        let block = self.parse_block(ctx)?;

        let handler = if self.check(&TokenKind::Catch) {
            Some(self.parse_catch_clause(ctx)?)
        } else {
            None
        };
        let finalizer = if self.eat(&TokenKind::Finally)? {
            Some(self.parse_block(ctx)?)
        } else {
            None
        };
        if handler.is_none() && finalizer.is_none() {
            return Err(self.unexpected());
        }
        Ok(Statement::Try(TryStatement {
            block,
            handler,
            finalizer,
            span: self.span_from(start),
        }))
    }

    fn parse_catch_clause(&mut self, ctx: Context) -> Result<CatchClause, ParseError> {
        let start = self.current.span;
        self.expect(&TokenKind::Catch)?;
        self.scopes.push(ScopeKind::Catch);
        let param = if self.eat(&TokenKind::LParen)? {
            let kind = if matches!(self.current.kind, TokenKind::LBracket | TokenKind::LBrace) {
                BindingKind::CatchPattern
            } else {
                BindingKind::CatchParam
            };
            let param = self.parse_binding_target(ctx, Some(kind))?;
            self.expect(&TokenKind::RParen)?;
            Some(param)
        } else {
            None
        };
        let body = self.parse_block(ctx);
        self.scopes.pop();
        Ok(CatchClause {
            param,
            body: body?,
            span: self.span_from(start),
        })
    }

    fn parse_with_statement(&mut self, ctx: Context) -> Result<Statement, ParseError> {
        let start = self.current.span;
        if ctx.is_strict() {
            return Err(self.error(ErrorKind::StrictWith, &[]));
        }
        self.expect(&TokenKind::With)?;
        self.expect(&TokenKind::LParen)?;
        let object = self.parse_expression(ctx.with_in())?;
        self.expect(&TokenKind::RParen)?;
        let body = self.parse_statement(ctx)?;
        Ok(Statement::With(WithStatement {
            object,
            body: Box::new(body),
            span: self.span_from(start),
        }))
    }

    // ============ JUMPS ============

    /// Statements whose argument may not follow a line break
    fn has_statement_argument(&self) -> bool {
        !(self.check(&TokenKind::Semicolon)
            || self.check(&TokenKind::RBrace)
            || self.is_at_end()
            || self.has_newline())
    }

    fn parse_return_statement(&mut self, ctx: Context) -> Result<Statement, ParseError> {
        let start = self.current.span;
        if !ctx.contains(Context::RETURN) {
            return Err(self.error(ErrorKind::IllegalReturn, &[]));
        }
        self.expect(&TokenKind::Return)?;
        let argument = if self.has_statement_argument() {
            Some(self.parse_expression(ctx.with_in())?)
        } else {
            None
        };
        self.consume_semicolon()?;
        Ok(Statement::Return(ReturnStatement {
            argument,
            span: self.span_from(start),
        }))
    }

    fn parse_throw_statement(&mut self, ctx: Context) -> Result<Statement, ParseError> {
        let start = self.current.span;
        self.expect(&TokenKind::Throw)?;
        if self.has_newline() {
            return Err(self.error(ErrorKind::LineTerminatorAfterThrow, &[]));
        }
        let argument = self.parse_expression(ctx.with_in())?;
        self.consume_semicolon()?;
        Ok(Statement::Throw(ThrowStatement {
            argument,
            span: self.span_from(start),
        }))
    }

    /// Optional label after `break` / `continue` on the same line
    fn parse_jump_label(&mut self, ctx: Context) -> Result<Option<Identifier>, ParseError> {
        if self.has_newline() || !matches!(self.current.kind, TokenKind::Identifier(_)) {
            return Ok(None);
        }
        self.parse_identifier_reference(ctx).map(Some)
    }

    fn find_label(&self, name: &str) -> Option<&Label> {
        self.labels.iter().rev().find(|label| label.name == name)
    }

    fn parse_break_statement(&mut self, ctx: Context) -> Result<Statement, ParseError> {
        let start = self.current.span;
        self.expect(&TokenKind::Break)?;
        let label = self.parse_jump_label(ctx)?;
        match &label {
            Some(id) => {
                if self.find_label(id.name.as_str()).is_none() {
                    return Err(self.error_at(ErrorKind::UnknownLabel, &[id.name.as_str()], id.span));
                }
            }
            None => {
                if !self.flags.intersects(Flags::NESTING) {
                    return Err(self.error_at(ErrorKind::IllegalBreak, &[], start));
                }
            }
        }
        self.consume_semicolon()?;
        Ok(Statement::Break(BreakStatement {
            label,
            span: self.span_from(start),
        }))
    }

    fn parse_continue_statement(&mut self, ctx: Context) -> Result<Statement, ParseError> {
        let start = self.current.span;
        self.expect(&TokenKind::Continue)?;
        if !self.flags.contains(Flags::IN_ITERATION) {
            return Err(self.error_at(ErrorKind::IllegalContinue, &[], start));
        }
        let label = self.parse_jump_label(ctx)?;
        if let Some(id) = &label {
            match self.find_label(id.name.as_str()) {
                None => {
                    return Err(self.error_at(ErrorKind::UnknownLabel, &[id.name.as_str()], id.span));
                }
                Some(found) if !found.iteration => {
                    return Err(self.error_at(ErrorKind::IllegalContinue, &[], id.span));
                }
                Some(_) => {}
            }
        }
        self.consume_semicolon()?;
        Ok(Statement::Continue(ContinueStatement {
            label,
            span: self.span_from(start),
        }))
    }

    // ============ LABELS ============

    fn parse_labeled_statement(&mut self, ctx: Context) -> Result<Statement, ParseError> {
        let start = self.current.span;
        let label = self.parse_identifier_reference(ctx)?;
        if self.find_label(label.name.as_str()).is_some() {
            return Err(self.error_at(ErrorKind::DuplicateLabel, &[label.name.as_str()], label.span));
        }
        self.expect(&TokenKind::Colon)?;

        self.labels.push(Label {
            name: label.name.clone(),
            iteration: false,
        });
        self.label_chain += 1;
        let body = self.parse_labeled_body(ctx);
        self.labels.pop();
        self.label_chain = 0;

        Ok(Statement::Labeled(LabeledStatement {
            label,
            body: Box::new(body?),
            span: self.span_from(start),
        }))
    }

    /// Sloppy code allows a plain function declaration as a label body
    fn parse_labeled_body(&mut self, ctx: Context) -> Result<Statement, ParseError> {
        if !self.check(&TokenKind::Function) {
            return self.parse_statement(ctx);
        }
        let start = self.current.span;
        if ctx.is_strict() {
            return Err(self.error(ErrorKind::InvalidLabelledFunction, &[]));
        }
        self.label_chain = 0;
        let function = self.parse_function_declaration(ctx, start, false, DeclarationKind::Statement)?;
        if function.generator {
            return Err(self.error_at(ErrorKind::InvalidLabelledFunction, &[], start));
        }
        Ok(Statement::FunctionDeclaration(Box::new(function)))
    }
}
