//! Recursive-descent parser producing an ESTree [`Program`]
//!
//! One [`Parser`] is one parse session: it owns the lexer, the current token,
//! the session [`Flags`] and the scope stack. Grammar parameters travel as a
//! [`Context`] value argument instead, so a production never has to undo a
//! change it made for its children.
//!
//! Ambiguous productions are parsed with cover grammars. Parenthesised lists,
//! array and object literals are first parsed as expressions; when a later
//! token (`=>`, `=`, `of`, `in`) shows they were patterns, the finished
//! expression tree is converted by [`Parser::expression_to_pattern`]. Errors
//! that only apply to one reading are recorded as deferred errors tied to a
//! [`Flags`] bit and either raised or dropped once the reading is known.

mod expression;
mod function;
mod module;
mod pattern;
mod statement;

use std::mem;

use log::{debug, trace};
use rustc_hash::FxHashSet;

use crate::ast::*;
use crate::context::{Context, Flags};
use crate::error::{ErrorKind, ParseError};
use crate::lexer::{Lexer, Span, Token, TokenKind, TokenRecord};
use crate::options::Options;
use crate::scope::{BindingKind, ScopeKind, ScopeStack};
use crate::string_dict::{JsString, StringDict};

use function::PrivateScope;

/// Label in scope for `break` / `continue`
#[derive(Debug, Clone)]
struct Label {
    name: JsString,
    /// The label is attached (possibly through other labels) to a loop
    iteration: bool,
}

/// Deferred errors and cover flags saved across a disambiguation point
#[derive(Debug)]
pub(crate) struct CoverState {
    flags: Flags,
    deferred: Vec<(Flags, ParseError)>,
}

/// Statement nesting state saved across a function boundary
struct FunctionState {
    cover: CoverState,
    nesting: Flags,
    labels: Vec<Label>,
    label_chain: usize,
}

/// Parser for ECMAScript source text
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    previous: Span,
    ctx: Context,
    flags: Flags,
    /// First detection of each pending cover error, keyed by its flag
    deferred: Vec<(Flags, ParseError)>,
    scopes: ScopeStack,
    labels: Vec<Label>,
    /// Number of labels directly preceding the statement being parsed
    label_chain: usize,
    private_scopes: Vec<PrivateScope>,
    /// Spans of expressions that were written inside parentheses
    parenthesized: FxHashSet<(usize, usize)>,
    /// Spans of spread elements followed by a comma
    spread_with_comma: FxHashSet<(usize, usize)>,
    tokens: Option<Vec<TokenRecord>>,
    depth: u32,
    max_depth: u32,
}

impl<'a> Parser<'a> {
    pub fn new(
        source: &'a str,
        options: &Options,
        string_dict: &'a mut StringDict,
    ) -> Result<Self, ParseError> {
        options.validate()?;
        let ctx = Context::from_options(options);
        let mut lexer = Lexer::new(source, ctx, string_dict);
        let current = lexer.next_token()?;
        let mut flags = Flags::empty();
        flags.set(Flags::NEW_LINE, lexer.had_newline_before());
        let root = if ctx.is_module() {
            ScopeKind::Module
        } else {
            ScopeKind::Script
        };
        Ok(Self {
            lexer,
            current,
            previous: Span::default(),
            ctx,
            flags,
            deferred: Vec::new(),
            scopes: ScopeStack::new(root),
            labels: Vec::new(),
            label_chain: 0,
            private_scopes: Vec::new(),
            parenthesized: FxHashSet::default(),
            spread_with_comma: FxHashSet::default(),
            tokens: options.tokenize.then(Vec::new),
            depth: 0,
            max_depth: options.max_depth,
        })
    }

    /// Helper to intern a string in the dictionary
    #[inline]
    fn intern(&mut self, s: &str) -> JsString {
        self.lexer.string_dict().get_or_insert(s)
    }

    /// Parse a complete script or module
    pub fn parse_program(mut self) -> Result<Program, ParseError> {
        let ctx = self.ctx;
        let source_type = if ctx.is_module() {
            SourceType::Module
        } else {
            SourceType::Script
        };
        debug!(
            "parsing {} bytes as {:?}",
            self.lexer.source().len(),
            source_type
        );

        let mut body = Vec::new();
        let (ctx, _) = self.parse_directives(ctx, &mut body)?;
        while !self.is_at_end() {
            body.push(self.parse_statement_list_item(ctx, true)?);
        }

        if ctx.is_module() {
            if let Some((name, span)) = self.scopes.unresolved_export() {
                let name = name.to_string();
                return Err(self.error_at(ErrorKind::UndefinedExport, &[&name], span));
            }
        }

        let end = self.current.span;
        let span = Span {
            start: 0,
            end: end.end,
            line: 1,
            column: 0,
            end_line: end.end_line,
            end_column: end.end_column,
            ..Span::default()
        };
        debug!("parsed {} top-level statements", body.len());
        Ok(Program {
            body,
            source_type,
            tokens: self.tokens.take(),
            span: self.with_metadata(span),
        })
    }

    // ============ TOKEN STREAM ============

    fn record(&self, token: &Token) -> TokenRecord {
        TokenRecord {
            category: token.kind.category(),
            value: self.lexer.slice(token.span).to_string(),
            span: self.with_metadata(token.span),
        }
    }

    /// Move to the next token, recording the consumed one when tokenizing
    fn advance(&mut self) -> Result<(), ParseError> {
        if self.tokens.is_some() && self.current.kind != TokenKind::Eof {
            let record = self.record(&self.current);
            if let Some(tokens) = self.tokens.as_mut() {
                tokens.push(record);
            }
        }
        let next = self.lexer.next_token()?;
        self.previous = self.current.span;
        self.current = next;
        self.flags.set(Flags::NEW_LINE, self.lexer.had_newline_before());
        Ok(())
    }

    /// Look at the token after the current one without consuming anything.
    /// The flag tells whether a line terminator separates the two.
    fn peek(&mut self) -> Result<(Token, bool), ParseError> {
        let checkpoint = self.lexer.checkpoint();
        let result = self.lexer.next_token();
        let newline = self.lexer.had_newline_before();
        self.lexer.restore(checkpoint);
        result.map(|token| (token, newline))
    }

    /// Check if current token matches
    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current.kind) == std::mem::discriminant(kind)
    }

    /// Consume the current token if it matches
    fn eat(&mut self, kind: &TokenKind) -> Result<bool, ParseError> {
        if !self.check(kind) {
            return Ok(false);
        }
        if self.current.escaped && kind.is_reserved() {
            return Err(self.error(ErrorKind::EscapedKeyword, &[]));
        }
        self.advance()?;
        Ok(true)
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<(), ParseError> {
        if self.check(kind) {
            if self.current.escaped && kind.is_reserved() {
                return Err(self.error(ErrorKind::EscapedKeyword, &[]));
            }
            return self.advance();
        }
        if self.current.kind == TokenKind::Eof {
            return Err(self.error(ErrorKind::UnexpectedEof, &[]));
        }
        let expected = kind.as_str().unwrap_or("token");
        let found = self.lexer.slice(self.current.span);
        Err(self.error(ErrorKind::ExpectedToken, &[expected, found]))
    }

    fn is_contextual(&self, word: &str) -> bool {
        self.current.is_contextual(word)
    }

    fn eat_contextual(&mut self, word: &str) -> Result<bool, ParseError> {
        if self.is_contextual(word) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect_contextual(&mut self, word: &str) -> Result<(), ParseError> {
        if self.eat_contextual(word)? {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn is_at_end(&self) -> bool {
        self.current.kind == TokenKind::Eof
    }

    /// A line terminator precedes the current token
    #[inline]
    fn has_newline(&self) -> bool {
        self.flags.contains(Flags::NEW_LINE)
    }

    /// Automatic semicolon insertion: a real `;`, or `}`, end of input or a
    /// line break before the offending token.
    fn consume_semicolon(&mut self) -> Result<(), ParseError> {
        if self.eat(&TokenKind::Semicolon)? {
            return Ok(());
        }
        if self.check(&TokenKind::RBrace) || self.is_at_end() || self.has_newline() {
            return Ok(());
        }
        Err(self.unexpected())
    }

    // ============ SPANS ============

    fn with_metadata(&self, span: Span) -> Span {
        span.with_metadata(
            self.ctx.contains(Context::OPTION_RANGES),
            self.ctx.contains(Context::OPTION_LOC),
        )
    }

    /// Span from `start` to the end of the last consumed token
    fn span_from(&self, start: Span) -> Span {
        self.with_metadata(start.to(self.previous))
    }

    fn raw_text(&mut self, span: Span) -> Option<JsString> {
        if self.ctx.contains(Context::OPTION_RAW) {
            let text = self.lexer.slice(span);
            Some(self.intern(text))
        } else {
            None
        }
    }

    fn mark_parenthesized(&mut self, span: Span) {
        self.parenthesized.insert(span.key());
    }

    fn is_parenthesized(&self, span: Span) -> bool {
        self.parenthesized.contains(&span.key())
    }

    // ============ ERRORS ============

    fn error_at(&self, kind: ErrorKind, args: &[&str], span: Span) -> ParseError {
        ParseError::new(kind, args, span.start, span.line, span.column)
    }

    /// Error positioned at the current token
    fn error(&self, kind: ErrorKind, args: &[&str]) -> ParseError {
        self.error_at(kind, args, self.current.span)
    }

    /// Describe the current token as unexpected
    fn unexpected(&self) -> ParseError {
        match &self.current.kind {
            TokenKind::Eof => self.error(ErrorKind::UnexpectedEof, &[]),
            kind if kind.is_reserved() => {
                let text = self.lexer.slice(self.current.span);
                self.error(ErrorKind::UnexpectedReserved, &[text])
            }
            _ => {
                let text = self.lexer.slice(self.current.span);
                self.error(ErrorKind::UnexpectedToken, &[text])
            }
        }
    }

    /// Run `f` one nesting level deeper, failing once `max_depth` is exceeded
    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.depth >= self.max_depth {
            let limit = self.max_depth.to_string();
            return Err(self.error(ErrorKind::NestingTooDeep, &[&limit]));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    // ============ DEFERRED ERRORS ============

    /// Record `err` as the first detection of `flag` unless one is pending
    fn defer(&mut self, flag: Flags, err: ParseError) {
        if !self.flags.contains(flag) {
            trace!("deferring {:?} at {}:{}", err.kind, err.line, err.column);
            self.flags |= flag;
            self.deferred.push((flag, err));
        }
    }

    /// Raise the earliest pending error among `flags`
    fn raise_deferred(&mut self, flags: Flags) -> Result<(), ParseError> {
        if !self.flags.intersects(flags) {
            return Ok(());
        }
        match self.deferred.iter().find(|(flag, _)| flags.contains(*flag)) {
            Some((_, err)) => {
                trace!("raising deferred {:?}", err.kind);
                Err(err.clone())
            }
            None => Ok(()),
        }
    }

    /// Drop pending errors among `flags`: the construct was reinterpreted
    fn discard_deferred(&mut self, flags: Flags) {
        if self.flags.intersects(flags) {
            trace!("claiming deferred {:?}", self.flags & flags);
        }
        self.flags -= flags;
        self.deferred.retain(|(flag, _)| !flags.contains(*flag));
    }

    /// Start a fresh cover region, returning the enclosing one's state
    fn take_cover(&mut self) -> CoverState {
        let flags = self.flags & Flags::COVER;
        self.flags -= Flags::COVER;
        CoverState {
            flags,
            deferred: mem::take(&mut self.deferred),
        }
    }

    /// Merge the inner region's pending errors back into the enclosing one.
    /// Earlier detections win.
    fn restore_cover(&mut self, saved: CoverState) {
        let mut deferred = saved.deferred;
        for (flag, err) in self.deferred.drain(..) {
            if !saved.flags.contains(flag) {
                deferred.push((flag, err));
            }
        }
        self.deferred = deferred;
        self.flags |= saved.flags;
    }

    /// Reset per-function statement state; restored by [`leave_function`]
    fn enter_function_state(&mut self) -> FunctionState {
        let cover = self.take_cover();
        let nesting = self.flags & Flags::NESTING;
        self.flags -= Flags::NESTING;
        FunctionState {
            cover,
            nesting,
            labels: mem::take(&mut self.labels),
            label_chain: mem::replace(&mut self.label_chain, 0),
        }
    }

    fn leave_function_state(&mut self, state: FunctionState) {
        // Nothing inside a function body reinterprets the enclosing cover
        self.flags -= Flags::COVER;
        self.deferred.clear();
        self.restore_cover(state.cover);
        self.flags -= Flags::NESTING;
        self.flags |= state.nesting;
        self.labels = state.labels;
        self.label_chain = state.label_chain;
    }

    // ============ IDENTIFIERS ============

    fn identifier_node(&mut self, name: JsString, span: Span) -> Identifier {
        let raw = self.raw_text(span);
        Identifier {
            name,
            raw,
            span: self.with_metadata(span),
        }
    }

    /// Any identifier name, reserved words included (property keys, `a.if`)
    fn parse_identifier_name(&mut self) -> Result<Identifier, ParseError> {
        let span = self.current.span;
        let name = match &self.current.kind {
            TokenKind::Identifier(name) => name.clone(),
            kind if kind.is_reserved() => {
                let text = kind.as_str().unwrap_or("");
                self.intern(text)
            }
            _ => return Err(self.unexpected()),
        };
        self.advance()?;
        Ok(self.identifier_node(name, span))
    }

    /// Validate the current token as an identifier reference and return its name
    fn check_identifier_reference(&mut self, ctx: Context) -> Result<JsString, ParseError> {
        let name = match &self.current.kind {
            TokenKind::Identifier(name) => name.clone(),
            kind if kind.is_reserved() => {
                if self.current.escaped {
                    return Err(self.error(ErrorKind::EscapedKeyword, &[]));
                }
                return Err(self.unexpected());
            }
            _ => return Err(self.unexpected()),
        };
        self.validate_reference_name(ctx, &name, self.current.span)?;
        Ok(name)
    }

    /// `yield`, `await` and strict-mode reserved words used as identifiers
    fn validate_reference_name(
        &mut self,
        ctx: Context,
        name: &str,
        span: Span,
    ) -> Result<(), ParseError> {
        match name {
            "yield" => {
                if ctx.has_yield() {
                    return Err(self.error_at(ErrorKind::UnexpectedReserved, &["yield"], span));
                }
                if ctx.is_strict() {
                    return Err(self.error_at(ErrorKind::UnexpectedStrictReserved, &["yield"], span));
                }
            }
            "await" => {
                if ctx.has_await() || ctx.is_module() {
                    return Err(self.error_at(ErrorKind::UnexpectedReserved, &["await"], span));
                }
                let err = self.error_at(ErrorKind::AwaitInParameter, &[], span);
                self.defer(Flags::AWAIT_IDENT, err);
            }
            word if ctx.is_strict() && crate::lexer::is_strict_reserved(word) => {
                return Err(self.error_at(ErrorKind::UnexpectedStrictReserved, &[word], span));
            }
            _ => {}
        }
        Ok(())
    }

    fn parse_identifier_reference(&mut self, ctx: Context) -> Result<Identifier, ParseError> {
        let span = self.current.span;
        let name = self.check_identifier_reference(ctx)?;
        self.advance()?;
        Ok(self.identifier_node(name, span))
    }

    /// Parse a binding identifier and declare it in the current scope
    fn parse_binding_identifier(
        &mut self,
        ctx: Context,
        kind: Option<BindingKind>,
    ) -> Result<Identifier, ParseError> {
        let span = self.current.span;
        let name = self.check_identifier_reference(ctx)?;
        self.check_binding_name(ctx, &name, kind, span)?;
        self.advance()?;
        let id = self.identifier_node(name, span);
        if let Some(kind) = kind {
            self.declare(ctx, &id, kind)?;
        }
        Ok(id)
    }

    /// Rules for names that introduce a binding
    fn check_binding_name(
        &self,
        ctx: Context,
        name: &str,
        kind: Option<BindingKind>,
        span: Span,
    ) -> Result<(), ParseError> {
        if ctx.is_strict() && (name == "eval" || name == "arguments") {
            return Err(self.error_at(ErrorKind::StrictEvalArguments, &[], span));
        }
        if name == "let" && kind.is_some_and(BindingKind::is_lexical) {
            return Err(self.error_at(ErrorKind::LetInLexicalBinding, &[], span));
        }
        Ok(())
    }

    /// Record a binding with the scope collaborator
    fn declare(&mut self, ctx: Context, id: &Identifier, kind: BindingKind) -> Result<(), ParseError> {
        let sloppy_dup = !ctx.is_strict() && kind == BindingKind::Function;
        self.scopes
            .declare(&id.name, kind, sloppy_dup)
            .map_err(|_| self.error_at(ErrorKind::DuplicateBinding, &[id.name.as_str()], id.span))
    }

    /// Declare every name bound by `pattern`
    fn declare_pattern(
        &mut self,
        ctx: Context,
        pattern: &Pattern,
        kind: BindingKind,
    ) -> Result<(), ParseError> {
        let mut names = Vec::new();
        pattern.bound_names(&mut names);
        for id in names {
            self.declare(ctx, id, kind)?;
        }
        Ok(())
    }

    // ============ DIRECTIVES ============

    /// Parse a directive prologue into `body`. Returns the context for the
    /// rest of the body and whether a `"use strict"` directive was found.
    fn parse_directives(
        &mut self,
        ctx: Context,
        body: &mut Vec<Statement>,
    ) -> Result<(Context, bool), ParseError> {
        let mut ctx = ctx;
        let mut use_strict = false;
        let saved_octal = self.flags & Flags::OCTAL;
        self.flags -= Flags::OCTAL;

        while let TokenKind::String(_) = self.current.kind {
            let token = self.current.clone();
            if token.octal {
                self.flags |= Flags::OCTAL;
            }
            let mut expr_stmt = self.parse_expression_statement(ctx)?;
            let is_directive = matches!(
                &expr_stmt.expression,
                Expression::Literal(lit) if lit.span.key() == token.span.key() && lit.is_string()
            ) && !self.is_parenthesized(token.span);
            if !is_directive {
                body.push(Statement::Expression(expr_stmt));
                break;
            }

            let text = self.lexer.slice(token.span);
            let inner = text
                .get(1..text.len().saturating_sub(1))
                .unwrap_or("");
            if inner == "use strict" {
                if self.flags.contains(Flags::OCTAL) {
                    return Err(self.error_at(ErrorKind::StrictOctalLiteral, &[], token.span));
                }
                use_strict = true;
                ctx |= Context::STRICT;
            }
            expr_stmt.directive = Some(self.intern(inner));
            body.push(Statement::Expression(expr_stmt));
        }

        self.flags -= Flags::OCTAL;
        self.flags |= saved_octal;
        Ok((ctx, use_strict))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(clippy::unwrap_used)]
    fn parse(source: &str) -> Program {
        let mut dict = StringDict::with_common_strings();
        Parser::new(source, &Options::default(), &mut dict)
            .unwrap()
            .parse_program()
            .unwrap()
    }

    fn parse_err(source: &str, options: &Options) -> Option<ErrorKind> {
        let mut dict = StringDict::with_common_strings();
        Parser::new(source, options, &mut dict)
            .and_then(Parser::parse_program)
            .err()
            .map(|e| e.kind)
    }

    #[test]
    fn test_directive_marks_statement() {
        let program = parse("'use strict'; x;");
        let Some(Statement::Expression(first)) = program.body.first() else {
            return;
        };
        assert_eq!(first.directive.as_ref().map(|d| d.as_str()), Some("use strict"));
        let Some(Statement::Expression(second)) = program.body.get(1) else {
            return;
        };
        assert!(second.directive.is_none());
    }

    #[test]
    fn test_use_strict_applies_to_following_code() {
        assert_eq!(
            parse_err("'use strict'; with (a) {}", &Options::default()),
            Some(ErrorKind::StrictWith)
        );
    }

    #[test]
    fn test_octal_before_use_strict() {
        assert_eq!(
            parse_err("'\\01'; 'use strict';", &Options::default()),
            Some(ErrorKind::StrictOctalLiteral)
        );
    }

    #[test]
    fn test_parenthesized_string_is_not_a_directive() {
        let program = parse("('use strict'); with (a) {}");
        assert_eq!(program.body.len(), 2);
    }

    #[test]
    fn test_depth_limit() {
        let source = format!("{}1{}", "(".repeat(40), ")".repeat(40));
        assert_eq!(
            parse_err(&source, &Options::new().max_depth(16)),
            Some(ErrorKind::NestingTooDeep)
        );
    }
}
