//! Tokens, source spans and token classification bits

use bitflags::bitflags;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::string_dict::JsString;

/// Source span information.
///
/// `line` is 1-based, `column` is 0-based (in characters), `start`/`end` are
/// byte offsets. The `ranges`/`loc` switches decide which of those show up
/// when a node is serialized; the values are always tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub column: u32,
    pub end_line: u32,
    pub end_column: u32,
    pub(crate) ranges: bool,
    pub(crate) loc: bool,
}

impl Span {
    pub fn new(start: usize, end: usize, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
            end_line: line,
            end_column: column + (end.saturating_sub(start)) as u32,
            ranges: false,
            loc: false,
        }
    }

    /// Span covering `self` up to the end of `last`
    pub fn to(self, last: Span) -> Span {
        Span {
            end: last.end,
            end_line: last.end_line,
            end_column: last.end_column,
            ..self
        }
    }

    pub(crate) fn with_metadata(mut self, ranges: bool, loc: bool) -> Span {
        self.ranges = ranges;
        self.loc = loc;
        self
    }

    /// Key used by the parser's side tables
    pub(crate) fn key(&self) -> (usize, usize) {
        (self.start, self.end)
    }

    pub(crate) fn write_fields<M: SerializeMap>(&self, map: &mut M) -> Result<(), M::Error> {
        if self.ranges {
            map.serialize_entry("start", &self.start)?;
            map.serialize_entry("end", &self.end)?;
        }
        if self.loc {
            map.serialize_entry(
                "loc",
                &SourceLocation {
                    start: Position {
                        line: self.line,
                        column: self.column,
                    },
                    end: Position {
                        line: self.end_line,
                        column: self.end_column,
                    },
                },
            )?;
        }
        Ok(())
    }
}

impl Default for Span {
    fn default() -> Self {
        Span::new(0, 0, 1, 0)
    }
}

impl Serialize for Span {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        self.write_fields(&mut map)?;
        map.end()
    }
}

#[derive(Serialize)]
struct SourceLocation {
    start: Position,
    end: Position,
}

#[derive(Serialize)]
struct Position {
    line: u32,
    column: u32,
}

/// Cooked and raw text of one template literal chunk
#[derive(Debug, Clone, PartialEq)]
pub struct TemplatePart {
    /// `None` when the chunk holds an escape that is only legal in tagged templates
    pub cooked: Option<JsString>,
    pub raw: JsString,
}

/// Token types for ECMAScript.
///
/// Only unconditionally reserved words get their own variant. Contextual
/// keywords (`let`, `static`, `async`, `await`, `yield`, `of`, `get`, `set`,
/// `as`, `from`, ...) are `Identifier`s; the parser decides their role.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Number(f64),
    BigInt(JsString),
    String(JsString),
    RegExp { pattern: JsString, flags: JsString },
    TemplateNoSub(TemplatePart), // `...`
    TemplateHead(TemplatePart),  // `...${
    TemplateMiddle(TemplatePart), // }...${
    TemplateTail(TemplatePart),  // }...`

    // Names
    Identifier(JsString),
    PrivateName(JsString), // #name

    // Reserved words
    Break,
    Case,
    Catch,
    Class,
    Const,
    Continue,
    Debugger,
    Default,
    Delete,
    Do,
    Else,
    Enum,
    Export,
    Extends,
    False,
    Finally,
    For,
    Function,
    If,
    Import,
    In,
    Instanceof,
    New,
    Null,
    Return,
    Super,
    Switch,
    This,
    Throw,
    True,
    Try,
    Typeof,
    Var,
    Void,
    While,
    With,

    // Operators
    Plus,             // +
    Minus,            // -
    Star,             // *
    Slash,            // /
    Percent,          // %
    StarStar,         // **
    PlusPlus,         // ++
    MinusMinus,       // --
    Eq,               // =
    EqEq,             // ==
    EqEqEq,           // ===
    BangEq,           // !=
    BangEqEq,         // !==
    Lt,               // <
    LtEq,             // <=
    Gt,               // >
    GtEq,             // >=
    LtLt,             // <<
    GtGt,             // >>
    GtGtGt,           // >>>
    Amp,              // &
    AmpAmp,           // &&
    Pipe,             // |
    PipePipe,         // ||
    Caret,            // ^
    Tilde,            // ~
    Bang,             // !
    Question,         // ?
    QuestionQuestion, // ??
    QuestionDot,      // ?.

    // Assignment Operators
    PlusEq,             // +=
    MinusEq,            // -=
    StarEq,             // *=
    SlashEq,            // /=
    PercentEq,          // %=
    StarStarEq,         // **=
    AmpEq,              // &=
    PipeEq,             // |=
    CaretEq,            // ^=
    LtLtEq,             // <<=
    GtGtEq,             // >>=
    GtGtGtEq,           // >>>=
    AmpAmpEq,           // &&=
    PipePipeEq,         // ||=
    QuestionQuestionEq, // ??=

    // Punctuation
    LParen,    // (
    RParen,    // )
    LBrace,    // {
    RBrace,    // }
    LBracket,  // [
    RBracket,  // ]
    Dot,       // .
    DotDotDot, // ...
    Comma,     // ,
    Colon,     // :
    Semicolon, // ;
    Arrow,     // =>
    At,        // @

    Eof,
}

bitflags! {
    /// Classification bits answering several grammar questions at once.
    ///
    /// The low four bits hold the binary-operator precedence (0 = not binary).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TokenClass: u32 {
        const PRECEDENCE = 0xF;
        const BINARY = 1 << 4;
        const LOGICAL = 1 << 5;
        const ASSIGN = 1 << 6;
        const UNARY = 1 << 7;
        const UPDATE = 1 << 8;
        const RESERVED = 1 << 9;
        const LITERAL = 1 << 10;
        const TEMPLATE = 1 << 11;
        /// A token that may start an expression
        const EXPRESSION_START = 1 << 12;
        /// Binary operator that cannot be used inside a `for (... in` head
        const IN = 1 << 13;
        const RIGHT_ASSOC = 1 << 14;
    }
}

impl TokenClass {
    /// Binary precedence: 1 (`??`) .. 12 (`**`)
    #[inline]
    pub fn precedence(self) -> u8 {
        (self.bits() & Self::PRECEDENCE.bits()) as u8
    }

    const fn binary(prec: u32) -> TokenClass {
        TokenClass::from_bits_retain(prec | TokenClass::BINARY.bits())
    }
}

impl TokenKind {
    pub fn class(&self) -> TokenClass {
        use TokenKind::*;
        let expr = TokenClass::EXPRESSION_START;
        match self {
            QuestionQuestion => TokenClass::binary(1) | TokenClass::LOGICAL,
            PipePipe => TokenClass::binary(2) | TokenClass::LOGICAL,
            AmpAmp => TokenClass::binary(3) | TokenClass::LOGICAL,
            Pipe => TokenClass::binary(4),
            Caret => TokenClass::binary(5),
            Amp => TokenClass::binary(6),
            EqEq | BangEq | EqEqEq | BangEqEq => TokenClass::binary(7),
            Lt | LtEq | Gt | GtEq => TokenClass::binary(8),
            In => TokenClass::binary(8) | TokenClass::IN | TokenClass::RESERVED,
            Instanceof => TokenClass::binary(8) | TokenClass::RESERVED,
            LtLt | GtGt | GtGtGt => TokenClass::binary(9),
            Plus | Minus => TokenClass::binary(10) | TokenClass::UNARY | expr,
            Star | Slash | Percent => TokenClass::binary(11),
            StarStar => TokenClass::binary(12) | TokenClass::RIGHT_ASSOC,

            Eq | PlusEq | MinusEq | StarEq | SlashEq | PercentEq | StarStarEq | AmpEq | PipeEq
            | CaretEq | LtLtEq | GtGtEq | GtGtGtEq | AmpAmpEq | PipePipeEq
            | QuestionQuestionEq => TokenClass::ASSIGN,

            Bang | Tilde => TokenClass::UNARY | expr,
            Typeof | Void | Delete => TokenClass::UNARY | TokenClass::RESERVED | expr,
            PlusPlus | MinusMinus => TokenClass::UPDATE | expr,

            Number(_) | BigInt(_) | String(_) | RegExp { .. } => TokenClass::LITERAL | expr,
            True | False | Null => TokenClass::LITERAL | TokenClass::RESERVED | expr,
            TemplateNoSub(_) | TemplateHead(_) => TokenClass::TEMPLATE | expr,
            TemplateMiddle(_) | TemplateTail(_) => TokenClass::TEMPLATE,

            Identifier(_) | PrivateName(_) | LParen | LBracket | LBrace | At => expr,
            This | Super | New | Function | Class | Import => TokenClass::RESERVED | expr,

            Break | Case | Catch | Const | Continue | Debugger | Default | Do | Else | Enum
            | Export | Extends | Finally | For | If | Return | Switch | Throw | Try | Var
            | While | With => TokenClass::RESERVED,

            _ => TokenClass::empty(),
        }
    }

    #[inline]
    pub fn is_assign_op(&self) -> bool {
        self.class().contains(TokenClass::ASSIGN)
    }

    #[inline]
    pub fn is_reserved(&self) -> bool {
        self.class().contains(TokenClass::RESERVED)
    }

    /// Identifiers and reserved words: anything usable as a property name after `.`
    pub fn is_identifier_name(&self) -> bool {
        matches!(self, TokenKind::Identifier(_)) || self.is_reserved()
    }

    /// Source text of punctuators and reserved words
    pub fn as_str(&self) -> Option<&'static str> {
        use TokenKind::*;
        let s = match self {
            Break => "break",
            Case => "case",
            Catch => "catch",
            Class => "class",
            Const => "const",
            Continue => "continue",
            Debugger => "debugger",
            Default => "default",
            Delete => "delete",
            Do => "do",
            Else => "else",
            Enum => "enum",
            Export => "export",
            Extends => "extends",
            False => "false",
            Finally => "finally",
            For => "for",
            Function => "function",
            If => "if",
            Import => "import",
            In => "in",
            Instanceof => "instanceof",
            New => "new",
            Null => "null",
            Return => "return",
            Super => "super",
            Switch => "switch",
            This => "this",
            Throw => "throw",
            True => "true",
            Try => "try",
            Typeof => "typeof",
            Var => "var",
            Void => "void",
            While => "while",
            With => "with",
            Plus => "+",
            Minus => "-",
            Star => "*",
            Slash => "/",
            Percent => "%",
            StarStar => "**",
            PlusPlus => "++",
            MinusMinus => "--",
            Eq => "=",
            EqEq => "==",
            EqEqEq => "===",
            BangEq => "!=",
            BangEqEq => "!==",
            Lt => "<",
            LtEq => "<=",
            Gt => ">",
            GtEq => ">=",
            LtLt => "<<",
            GtGt => ">>",
            GtGtGt => ">>>",
            Amp => "&",
            AmpAmp => "&&",
            Pipe => "|",
            PipePipe => "||",
            Caret => "^",
            Tilde => "~",
            Bang => "!",
            Question => "?",
            QuestionQuestion => "??",
            QuestionDot => "?.",
            PlusEq => "+=",
            MinusEq => "-=",
            StarEq => "*=",
            SlashEq => "/=",
            PercentEq => "%=",
            StarStarEq => "**=",
            AmpEq => "&=",
            PipeEq => "|=",
            CaretEq => "^=",
            LtLtEq => "<<=",
            GtGtEq => ">>=",
            GtGtGtEq => ">>>=",
            AmpAmpEq => "&&=",
            PipePipeEq => "||=",
            QuestionQuestionEq => "??=",
            LParen => "(",
            RParen => ")",
            LBrace => "{",
            RBrace => "}",
            LBracket => "[",
            RBracket => "]",
            Dot => ".",
            DotDotDot => "...",
            Comma => ",",
            Colon => ":",
            Semicolon => ";",
            Arrow => "=>",
            At => "@",
            _ => return None,
        };
        Some(s)
    }

    /// ESTree token category used by the `tokenize` option
    pub fn category(&self) -> &'static str {
        use TokenKind::*;
        match self {
            Number(_) | BigInt(_) => "Numeric",
            String(_) => "String",
            RegExp { .. } => "RegularExpression",
            TemplateNoSub(_) | TemplateHead(_) | TemplateMiddle(_) | TemplateTail(_) => "Template",
            Identifier(_) => "Identifier",
            PrivateName(_) => "PrivateName",
            True | False => "Boolean",
            Null => "Null",
            Eof => "EOF",
            k if k.is_reserved() => "Keyword",
            _ => "Punctuator",
        }
    }
}

/// Look up a reserved word
pub fn keyword(name: &str) -> Option<TokenKind> {
    use TokenKind::*;
    let kind = match name {
        "break" => Break,
        "case" => Case,
        "catch" => Catch,
        "class" => Class,
        "const" => Const,
        "continue" => Continue,
        "debugger" => Debugger,
        "default" => Default,
        "delete" => Delete,
        "do" => Do,
        "else" => Else,
        "enum" => Enum,
        "export" => Export,
        "extends" => Extends,
        "false" => False,
        "finally" => Finally,
        "for" => For,
        "function" => Function,
        "if" => If,
        "import" => Import,
        "in" => In,
        "instanceof" => Instanceof,
        "new" => New,
        "null" => Null,
        "return" => Return,
        "super" => Super,
        "switch" => Switch,
        "this" => This,
        "throw" => Throw,
        "true" => True,
        "try" => Try,
        "typeof" => Typeof,
        "var" => Var,
        "void" => Void,
        "while" => While,
        "with" => With,
        _ => return None,
    };
    Some(kind)
}

/// Words reserved only in strict mode code
pub fn is_strict_reserved(name: &str) -> bool {
    matches!(
        name,
        "implements"
            | "interface"
            | "let"
            | "package"
            | "private"
            | "protected"
            | "public"
            | "static"
            | "yield"
    )
}

/// A token with its source location
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// The identifier was spelled with a `\u` escape
    pub escaped: bool,
    /// Legacy octal numeral (`017`, `08`) or octal string escape
    pub octal: bool,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self {
            kind,
            span,
            escaped: false,
            octal: false,
        }
    }

    pub fn eof(pos: usize, line: u32, column: u32) -> Self {
        Self::new(TokenKind::Eof, Span::new(pos, pos, line, column))
    }

    /// Identifier name if this is an unescaped identifier token
    pub fn identifier(&self) -> Option<&JsString> {
        match &self.kind {
            TokenKind::Identifier(name) => Some(name),
            _ => None,
        }
    }

    /// True for the contextual keyword `word` spelled without escapes
    pub fn is_contextual(&self, word: &str) -> bool {
        !self.escaped && matches!(&self.kind, TokenKind::Identifier(name) if name == word)
    }
}

/// Entry of the token list collected with the `tokenize` option
#[derive(Debug, Clone, PartialEq)]
pub struct TokenRecord {
    pub category: &'static str,
    pub value: String,
    pub span: Span,
}

impl Serialize for TokenRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", self.category)?;
        map.serialize_entry("value", &self.value)?;
        self.span.write_fields(&mut map)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence_bits() {
        assert_eq!(TokenKind::QuestionQuestion.class().precedence(), 1);
        assert_eq!(TokenKind::Star.class().precedence(), 11);
        assert_eq!(TokenKind::StarStar.class().precedence(), 12);
        assert_eq!(TokenKind::Eq.class().precedence(), 0);
    }

    #[test]
    fn test_one_lookup_answers_several_questions() {
        let class = TokenKind::Minus.class();
        assert!(class.contains(TokenClass::BINARY | TokenClass::UNARY));
        assert!(TokenKind::In.class().contains(TokenClass::IN | TokenClass::RESERVED));
        assert!(TokenKind::GtGtGtEq.is_assign_op());
    }

    #[test]
    fn test_span_serializes_only_requested_metadata() {
        let span = Span::new(0, 3, 1, 0);
        assert_eq!(serde_json::to_string(&span).ok().as_deref(), Some("{}"));
        let ranged = span.with_metadata(true, false);
        assert_eq!(
            serde_json::to_string(&ranged).ok().as_deref(),
            Some(r#"{"start":0,"end":3}"#)
        );
    }
}
