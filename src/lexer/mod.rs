//! Lexer for ECMAScript source text
//!
//! The scanner is context-free apart from two switches it receives up front:
//! the Module goal (which disables HTML-like comments) and the `next` option
//! (numeric separators, BigInt). Whether a `/` starts a regular expression is
//! decided by the parser, which calls [`Lexer::rescan_as_regexp`].

mod chars;
mod literal;
mod token;

pub use chars::{is_id_continue, is_id_start, is_line_terminator, is_whitespace};
pub use token::{
    is_strict_reserved, keyword, Span, TemplatePart, Token, TokenClass, TokenKind, TokenRecord,
};

use crate::context::Context;
use crate::error::{ErrorKind, ParseError};
use crate::string_dict::StringDict;

/// First-character dispatch for ASCII input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lead {
    Invalid,
    Ident,
    Backslash,
    Digit,
    Quote,
    Backtick,
    Hash,
    Dot,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Equals,
    Bang,
    Less,
    Greater,
    Amp,
    Pipe,
    Caret,
    Question,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Semicolon,
    Tilde,
    At,
}

static LEAD: [Lead; 128] = build_lead_table();

#[allow(clippy::indexing_slicing)]
const fn build_lead_table() -> [Lead; 128] {
    let mut table = [Lead::Invalid; 128];
    let mut i = 0;
    while i < 128 {
        let b = i as u8;
        table[i] = match b {
            b'a'..=b'z' | b'A'..=b'Z' | b'$' | b'_' => Lead::Ident,
            b'0'..=b'9' => Lead::Digit,
            b'\\' => Lead::Backslash,
            b'"' | b'\'' => Lead::Quote,
            b'`' => Lead::Backtick,
            b'#' => Lead::Hash,
            b'.' => Lead::Dot,
            b'+' => Lead::Plus,
            b'-' => Lead::Minus,
            b'*' => Lead::Star,
            b'/' => Lead::Slash,
            b'%' => Lead::Percent,
            b'=' => Lead::Equals,
            b'!' => Lead::Bang,
            b'<' => Lead::Less,
            b'>' => Lead::Greater,
            b'&' => Lead::Amp,
            b'|' => Lead::Pipe,
            b'^' => Lead::Caret,
            b'?' => Lead::Question,
            b'(' => Lead::LParen,
            b')' => Lead::RParen,
            b'{' => Lead::LBrace,
            b'}' => Lead::RBrace,
            b'[' => Lead::LBracket,
            b']' => Lead::RBracket,
            b',' => Lead::Comma,
            b':' => Lead::Colon,
            b';' => Lead::Semicolon,
            b'~' => Lead::Tilde,
            b'@' => Lead::At,
            _ => Lead::Invalid,
        };
        i += 1;
    }
    table
}

/// Lexer state checkpoint for backtracking
#[derive(Debug, Clone, Copy)]
pub struct LexerCheckpoint {
    pos: usize,
    line: u32,
    column: u32,
    start_pos: usize,
    start_line: u32,
    start_column: u32,
    saw_newline: bool,
}

/// Per-token side information collected while scanning
#[derive(Debug, Default, Clone, Copy)]
struct TokenBits {
    escaped: bool,
    octal: bool,
}

pub struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    line: u32,
    column: u32,
    start_pos: usize,
    start_line: u32,
    start_column: u32,
    /// A line terminator was skipped before the current token
    saw_newline: bool,
    /// No token has been produced yet
    at_start: bool,
    module: bool,
    next: bool,
    bits: TokenBits,
    string_dict: &'a mut StringDict,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, ctx: Context, string_dict: &'a mut StringDict) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            column: 0,
            start_pos: 0,
            start_line: 1,
            start_column: 0,
            saw_newline: false,
            at_start: true,
            module: ctx.is_module(),
            next: ctx.has_next(),
            bits: TokenBits::default(),
            string_dict,
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Source text covered by `span`
    pub fn slice(&self, span: Span) -> &'a str {
        self.source.get(span.start..span.end).unwrap_or("")
    }

    pub fn string_dict(&mut self) -> &mut StringDict {
        self.string_dict
    }

    pub fn checkpoint(&self) -> LexerCheckpoint {
        LexerCheckpoint {
            pos: self.pos,
            line: self.line,
            column: self.column,
            start_pos: self.start_pos,
            start_line: self.start_line,
            start_column: self.start_column,
            saw_newline: self.saw_newline,
        }
    }

    pub fn restore(&mut self, checkpoint: LexerCheckpoint) {
        self.pos = checkpoint.pos;
        self.line = checkpoint.line;
        self.column = checkpoint.column;
        self.start_pos = checkpoint.start_pos;
        self.start_line = checkpoint.start_line;
        self.start_column = checkpoint.start_column;
        self.saw_newline = checkpoint.saw_newline;
    }

    /// Whether a line terminator preceded the last scanned token
    pub fn had_newline_before(&self) -> bool {
        self.saw_newline
    }

    /// Input remains after the last scanned token (trivia included)
    pub fn has_next(&self) -> bool {
        self.pos < self.source.len()
    }

    /// Rewind to the start of a `/` or `/=` token and scan it as a regular expression
    pub fn rescan_as_regexp(&mut self, span: Span) -> Result<Token, ParseError> {
        self.reset_to(span.start, span.line, span.column);
        self.begin_token();
        self.bump();
        let kind = self.scan_regexp_body()?;
        Ok(self.finish(kind))
    }

    /// Rewind to a `}` token closing a template substitution and scan the
    /// following template chunk.
    pub fn rescan_template_continuation(&mut self, rbrace: Span) -> Result<Token, ParseError> {
        self.reset_to(rbrace.start, rbrace.line, rbrace.column);
        self.begin_token();
        self.bump();
        let kind = self.scan_template_chunk(false)?;
        Ok(self.finish(kind))
    }

    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_trivia()?;
        self.begin_token();

        let Some(ch) = self.peek() else {
            return Ok(Token::eof(self.pos, self.line, self.column));
        };

        let lead = if ch.is_ascii() {
            LEAD.get(ch as usize).copied().unwrap_or(Lead::Invalid)
        } else if is_id_start(ch) {
            Lead::Ident
        } else {
            Lead::Invalid
        };

        let kind = match lead {
            Lead::Ident | Lead::Backslash => self.scan_identifier()?,
            Lead::Digit => self.scan_number()?,
            Lead::Quote => {
                self.bump();
                self.scan_string(ch)?
            }
            Lead::Backtick => {
                self.bump();
                self.scan_template_chunk(true)?
            }
            Lead::Hash => self.scan_private_name()?,
            Lead::Invalid => return Err(self.error_here(ErrorKind::InvalidCharacter, &[&ch.to_string()])),
            punct => {
                self.bump();
                self.scan_punctuator(punct)?
            }
        };

        Ok(self.finish(kind))
    }

    fn scan_punctuator(&mut self, lead: Lead) -> Result<TokenKind, ParseError> {
        let kind = match lead {
            Lead::LParen => TokenKind::LParen,
            Lead::RParen => TokenKind::RParen,
            Lead::LBrace => TokenKind::LBrace,
            Lead::RBrace => TokenKind::RBrace,
            Lead::LBracket => TokenKind::LBracket,
            Lead::RBracket => TokenKind::RBracket,
            Lead::Comma => TokenKind::Comma,
            Lead::Colon => TokenKind::Colon,
            Lead::Semicolon => TokenKind::Semicolon,
            Lead::Tilde => TokenKind::Tilde,
            Lead::At => TokenKind::At,
            Lead::Dot => return self.scan_dot(),
            Lead::Plus => self.scan_plus(),
            Lead::Minus => self.scan_minus(),
            Lead::Star => self.scan_star(),
            Lead::Slash => self.scan_slash(),
            Lead::Percent => self.scan_percent(),
            Lead::Equals => self.scan_equals(),
            Lead::Bang => self.scan_bang(),
            Lead::Less => self.scan_less_than(),
            Lead::Greater => self.scan_greater_than(),
            Lead::Amp => self.scan_ampersand(),
            Lead::Pipe => self.scan_pipe(),
            Lead::Caret => self.scan_caret(),
            Lead::Question => self.scan_question(),
            _ => return Err(self.error(ErrorKind::InvalidCharacter, &[self.current_text()])),
        };
        Ok(kind)
    }

    // Cursor primitives

    #[inline]
    fn peek(&self) -> Option<char> {
        self.source.get(self.pos..).and_then(|s| s.chars().next())
    }

    #[inline]
    fn peek_at(&self, n: usize) -> Option<char> {
        self.source.get(self.pos..).and_then(|s| s.chars().nth(n))
    }

    fn starts_with(&self, text: &str) -> bool {
        self.source
            .get(self.pos..)
            .is_some_and(|s| s.starts_with(text))
    }

    /// Consume one character, keeping line and column current. `\r\n` counts
    /// as a single line break.
    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        match ch {
            '\r' if self.peek() == Some('\n') => {}
            c if is_line_terminator(c) => {
                self.line += 1;
                self.column = 0;
            }
            _ => self.column += 1,
        }
        Some(ch)
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn reset_to(&mut self, pos: usize, line: u32, column: u32) {
        self.pos = pos;
        self.line = line;
        self.column = column;
    }

    fn begin_token(&mut self) {
        self.start_pos = self.pos;
        self.start_line = self.line;
        self.start_column = self.column;
        self.bits = TokenBits::default();
    }

    fn make_span(&self) -> Span {
        let mut span = Span::new(self.start_pos, self.pos, self.start_line, self.start_column);
        span.end_line = self.line;
        span.end_column = self.column;
        span
    }

    fn finish(&mut self, kind: TokenKind) -> Token {
        self.at_start = false;
        let mut token = Token::new(kind, self.make_span());
        token.escaped = self.bits.escaped;
        token.octal = self.bits.octal;
        token
    }

    fn current_text(&self) -> &'a str {
        self.source.get(self.start_pos..self.pos).unwrap_or("")
    }

    /// Error positioned at the start of the current token
    fn error(&self, kind: ErrorKind, args: &[&str]) -> ParseError {
        ParseError::new(kind, args, self.start_pos, self.start_line, self.start_column)
    }

    /// Error positioned at the cursor
    fn error_here(&self, kind: ErrorKind, args: &[&str]) -> ParseError {
        ParseError::new(kind, args, self.pos, self.line, self.column)
    }

    // Trivia

    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        self.saw_newline = false;
        loop {
            let Some(ch) = self.peek() else {
                return Ok(());
            };
            match ch {
                c if is_whitespace(c) => {
                    self.bump();
                }
                c if is_line_terminator(c) => {
                    self.saw_newline = true;
                    self.bump();
                }
                '/' => match self.peek_at(1) {
                    Some('/') => self.skip_line_comment(),
                    Some('*') => self.skip_block_comment()?,
                    _ => return Ok(()),
                },
                '#' if self.pos == 0 && self.peek_at(1) == Some('!') => self.skip_line_comment(),
                // <!-- opens a single line comment in scripts
                '<' if !self.module && self.starts_with("<!--") => self.skip_line_comment(),
                // --> is a comment only at the start of a line
                '-' if !self.module && self.at_line_start() && self.starts_with("-->") => {
                    self.skip_line_comment()
                }
                _ => return Ok(()),
            }
        }
    }

    fn at_line_start(&self) -> bool {
        self.saw_newline || self.at_start
    }

    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if is_line_terminator(ch) {
                break;
            }
            self.bump();
        }
    }

    fn skip_block_comment(&mut self) -> Result<(), ParseError> {
        let (pos, line, column) = (self.pos, self.line, self.column);
        self.bump();
        self.bump();
        loop {
            match self.bump() {
                Some('*') if self.peek() == Some('/') => {
                    self.bump();
                    return Ok(());
                }
                Some(c) if is_line_terminator(c) => self.saw_newline = true,
                Some(_) => {}
                None => {
                    return Err(ParseError::new(
                        ErrorKind::UnterminatedComment,
                        &[],
                        pos,
                        line,
                        column,
                    ));
                }
            }
        }
    }

    // Punctuators

    fn scan_dot(&mut self) -> Result<TokenKind, ParseError> {
        if self.peek().is_some_and(chars::is_digit) {
            return self.scan_decimal_after_dot();
        }
        if self.peek() == Some('.') && self.peek_at(1) == Some('.') {
            self.bump();
            self.bump();
            return Ok(TokenKind::DotDotDot);
        }
        Ok(TokenKind::Dot)
    }

    fn scan_plus(&mut self) -> TokenKind {
        if self.match_char('+') {
            TokenKind::PlusPlus
        } else if self.match_char('=') {
            TokenKind::PlusEq
        } else {
            TokenKind::Plus
        }
    }

    fn scan_minus(&mut self) -> TokenKind {
        if self.match_char('-') {
            TokenKind::MinusMinus
        } else if self.match_char('=') {
            TokenKind::MinusEq
        } else {
            TokenKind::Minus
        }
    }

    fn scan_star(&mut self) -> TokenKind {
        if self.match_char('*') {
            if self.match_char('=') {
                TokenKind::StarStarEq
            } else {
                TokenKind::StarStar
            }
        } else if self.match_char('=') {
            TokenKind::StarEq
        } else {
            TokenKind::Star
        }
    }

    fn scan_slash(&mut self) -> TokenKind {
        if self.match_char('=') {
            TokenKind::SlashEq
        } else {
            TokenKind::Slash
        }
    }

    fn scan_percent(&mut self) -> TokenKind {
        if self.match_char('=') {
            TokenKind::PercentEq
        } else {
            TokenKind::Percent
        }
    }

    fn scan_equals(&mut self) -> TokenKind {
        if self.match_char('=') {
            if self.match_char('=') {
                TokenKind::EqEqEq
            } else {
                TokenKind::EqEq
            }
        } else if self.match_char('>') {
            TokenKind::Arrow
        } else {
            TokenKind::Eq
        }
    }

    fn scan_bang(&mut self) -> TokenKind {
        if self.match_char('=') {
            if self.match_char('=') {
                TokenKind::BangEqEq
            } else {
                TokenKind::BangEq
            }
        } else {
            TokenKind::Bang
        }
    }

    fn scan_less_than(&mut self) -> TokenKind {
        if self.match_char('<') {
            if self.match_char('=') {
                TokenKind::LtLtEq
            } else {
                TokenKind::LtLt
            }
        } else if self.match_char('=') {
            TokenKind::LtEq
        } else {
            TokenKind::Lt
        }
    }

    fn scan_greater_than(&mut self) -> TokenKind {
        if self.match_char('>') {
            if self.match_char('>') {
                if self.match_char('=') {
                    TokenKind::GtGtGtEq
                } else {
                    TokenKind::GtGtGt
                }
            } else if self.match_char('=') {
                TokenKind::GtGtEq
            } else {
                TokenKind::GtGt
            }
        } else if self.match_char('=') {
            TokenKind::GtEq
        } else {
            TokenKind::Gt
        }
    }

    fn scan_ampersand(&mut self) -> TokenKind {
        if self.match_char('&') {
            if self.match_char('=') {
                TokenKind::AmpAmpEq
            } else {
                TokenKind::AmpAmp
            }
        } else if self.match_char('=') {
            TokenKind::AmpEq
        } else {
            TokenKind::Amp
        }
    }

    fn scan_pipe(&mut self) -> TokenKind {
        if self.match_char('|') {
            if self.match_char('=') {
                TokenKind::PipePipeEq
            } else {
                TokenKind::PipePipe
            }
        } else if self.match_char('=') {
            TokenKind::PipeEq
        } else {
            TokenKind::Pipe
        }
    }

    fn scan_caret(&mut self) -> TokenKind {
        if self.match_char('=') {
            TokenKind::CaretEq
        } else {
            TokenKind::Caret
        }
    }

    fn scan_question(&mut self) -> TokenKind {
        if self.match_char('?') {
            if self.match_char('=') {
                TokenKind::QuestionQuestionEq
            } else {
                TokenKind::QuestionQuestion
            }
        } else if self.peek() == Some('.') && !self.peek_at(1).is_some_and(chars::is_digit) {
            // `a?.5:b` is a conditional, not an optional chain
            self.bump();
            TokenKind::QuestionDot
        } else {
            TokenKind::Question
        }
    }

    // Names

    fn scan_identifier(&mut self) -> Result<TokenKind, ParseError> {
        let start = self.pos;
        let mut escaped_name: Option<String> = None;
        let mut first = true;

        loop {
            match self.peek() {
                Some('\\') => {
                    let escape_start = self.pos;
                    let code = self.scan_identifier_escape()?;
                    let valid = if first { is_id_start(code) } else { is_id_continue(code) };
                    if !valid {
                        return Err(self.error(ErrorKind::InvalidIdentifierEscape, &[]));
                    }
                    let buf = escaped_name.get_or_insert_with(|| {
                        self.source.get(start..escape_start).unwrap_or("").to_string()
                    });
                    buf.push(code);
                }
                Some(c) if (first && is_id_start(c)) || (!first && is_id_continue(c)) => {
                    self.bump();
                    if let Some(buf) = escaped_name.as_mut() {
                        buf.push(c);
                    }
                }
                _ => break,
            }
            first = false;
        }

        let name = match &escaped_name {
            Some(buf) => {
                self.bits.escaped = true;
                buf.as_str()
            }
            None => self.source.get(start..self.pos).unwrap_or(""),
        };

        if let Some(kind) = keyword(name) {
            return Ok(kind);
        }
        Ok(TokenKind::Identifier(self.string_dict.get_or_insert(name)))
    }

    /// `\uXXXX` or `\u{X...}` inside an identifier; the escape start is the cursor.
    /// The sequence is consumed up front so the returned character can be pushed
    /// without rescanning.
    fn scan_identifier_escape(&mut self) -> Result<char, ParseError> {
        let bad = self.error_here(ErrorKind::InvalidIdentifierEscape, &[]);
        self.bump();
        if !self.match_char('u') {
            return Err(bad);
        }
        self.scan_unicode_escape_body().ok_or(bad)
    }

    fn scan_private_name(&mut self) -> Result<TokenKind, ParseError> {
        self.bump();
        match self.peek() {
            Some(c) if is_id_start(c) || c == '\\' => match self.scan_identifier()? {
                TokenKind::Identifier(name) => Ok(TokenKind::PrivateName(name)),
                other => {
                    let text = other.as_str().unwrap_or("");
                    Ok(TokenKind::PrivateName(self.string_dict.get_or_insert(text)))
                }
            },
            _ => Err(self.error(ErrorKind::InvalidCharacter, &["#"])),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::string_dict::JsString;

    fn s(value: &str) -> JsString {
        JsString::from(value)
    }

    fn lex_with(source: &str, ctx: Context) -> Result<Vec<TokenKind>, ParseError> {
        let mut dict = StringDict::new();
        let mut lexer = Lexer::new(source, ctx, &mut dict);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token()?;
            if token.kind == TokenKind::Eof {
                break;
            }
            tokens.push(token.kind);
        }
        Ok(tokens)
    }

    #[allow(clippy::unwrap_used)]
    fn lex(source: &str) -> Vec<TokenKind> {
        lex_with(source, Context::empty()).unwrap()
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            lex("+ ++ += - -- -= ** **= >>>= ??= ?. ..."),
            vec![
                TokenKind::Plus,
                TokenKind::PlusPlus,
                TokenKind::PlusEq,
                TokenKind::Minus,
                TokenKind::MinusMinus,
                TokenKind::MinusEq,
                TokenKind::StarStar,
                TokenKind::StarStarEq,
                TokenKind::GtGtGtEq,
                TokenKind::QuestionQuestionEq,
                TokenKind::QuestionDot,
                TokenKind::DotDotDot,
            ]
        );
    }

    #[test]
    fn test_optional_chain_before_digit_is_conditional() {
        assert_eq!(
            lex("a?.5:b"),
            vec![
                TokenKind::Identifier(s("a")),
                TokenKind::Question,
                TokenKind::Number(0.5),
                TokenKind::Colon,
                TokenKind::Identifier(s("b")),
            ]
        );
    }

    #[test]
    fn test_keywords_and_contextual_words() {
        assert_eq!(
            lex("var let yield async"),
            vec![
                TokenKind::Var,
                TokenKind::Identifier(s("let")),
                TokenKind::Identifier(s("yield")),
                TokenKind::Identifier(s("async")),
            ]
        );
    }

    #[test]
    fn test_escaped_identifier() {
        let mut dict = StringDict::new();
        let mut lexer = Lexer::new("\\u0061b \\u{62}", Context::empty(), &mut dict);
        let first = lexer.next_token().ok();
        assert_eq!(first.as_ref().map(|t| t.kind.clone()), Some(TokenKind::Identifier(s("ab"))));
        assert_eq!(first.map(|t| t.escaped), Some(true));
        let second = lexer.next_token().ok().map(|t| t.kind);
        assert_eq!(second, Some(TokenKind::Identifier(s("b"))));
    }

    #[test]
    fn test_escaped_keyword_keeps_keyword_kind() {
        let mut dict = StringDict::new();
        let mut lexer = Lexer::new("v\\u0061r", Context::empty(), &mut dict);
        let token = lexer.next_token().ok();
        assert_eq!(token.as_ref().map(|t| t.kind.clone()), Some(TokenKind::Var));
        assert_eq!(token.map(|t| t.escaped), Some(true));
    }

    #[test]
    fn test_comments_and_newlines() {
        let mut dict = StringDict::new();
        let mut lexer = Lexer::new("a /* x\n */ b // c\n", Context::empty(), &mut dict);
        assert!(lexer.next_token().is_ok());
        assert!(!lexer.had_newline_before());
        assert!(lexer.next_token().is_ok());
        assert!(lexer.had_newline_before());
    }

    #[test]
    fn test_html_comments_only_in_scripts() {
        assert_eq!(lex("a <!-- b\n--> c\nd"), vec![
            TokenKind::Identifier(s("a")),
            TokenKind::Identifier(s("d")),
        ]);
        let module = lex_with("a <!-- b", Context::MODULE).ok();
        assert_eq!(module.map(|t| t.len()), Some(5));
    }

    #[test]
    fn test_hashbang() {
        assert_eq!(lex("#!/usr/bin/env node\nx"), vec![TokenKind::Identifier(s("x"))]);
    }

    #[test]
    fn test_unterminated_comment() {
        let err = lex_with("/* open", Context::empty()).err();
        assert_eq!(err.map(|e| e.kind), Some(ErrorKind::UnterminatedComment));
    }

    #[test]
    fn test_invalid_character() {
        let err = lex_with("a ¬", Context::empty()).err();
        assert_eq!(err.as_ref().map(|e| e.kind), Some(ErrorKind::InvalidCharacter));
        assert_eq!(err.map(|e| e.column), Some(2));
    }

    #[test]
    fn test_crlf_counts_one_line() {
        let mut dict = StringDict::new();
        let mut lexer = Lexer::new("a\r\nb\rc", Context::empty(), &mut dict);
        let lines: Vec<u32> = (0..3)
            .filter_map(|_| lexer.next_token().ok())
            .map(|t| t.span.line)
            .collect();
        assert_eq!(lines, vec![1, 2, 3]);
    }

    #[test]
    fn test_checkpoint_restore() {
        let mut dict = StringDict::new();
        let mut lexer = Lexer::new("a b c", Context::empty(), &mut dict);
        let _ = lexer.next_token();
        let checkpoint = lexer.checkpoint();
        let b = lexer.next_token().ok().map(|t| t.kind);
        lexer.restore(checkpoint);
        assert_eq!(lexer.next_token().ok().map(|t| t.kind), b);
    }

    #[test]
    fn test_private_name() {
        assert_eq!(lex("#x"), vec![TokenKind::PrivateName(s("x"))]);
    }
}
