//! Error types for the parser
//!
//! Every failure is a single [`ParseError`]: there is no recovery, so the
//! first lexical, syntax or early error aborts the parse.

use std::fmt;

use thiserror::Error;

/// Broad classification of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed token (unterminated literal, bad escape, stray character)
    Lexical,
    /// Unexpected or missing token
    Syntax,
    /// Static semantic violation detected while parsing
    Early,
}

/// Closed set of diagnostics, each with a message template.
///
/// Templates use positional placeholders `%0`, `%1`, ... that are filled
/// from the arguments passed to [`ParseError::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    // Lexical
    InvalidCharacter,
    UnterminatedString,
    UnterminatedTemplate,
    UnterminatedComment,
    UnterminatedRegExp,
    InvalidRegExpFlag,
    DuplicateRegExpFlag,
    InvalidEscape,
    InvalidUnicodeEscape,
    InvalidHexEscape,
    InvalidIdentifierEscape,
    InvalidNumber,
    IdentifierAfterNumber,
    InvalidNumericSeparator,
    BigIntRequiresNext,
    LegacyOctal,
    LegacyOctalEscape,
    TemplateOctalEscape,
    InvalidTemplateEscape,

    // Syntax
    UnexpectedToken,
    UnexpectedEof,
    ExpectedToken,
    UnexpectedReserved,
    UnexpectedStrictReserved,
    EscapedKeyword,
    InvalidLhsAssignment,
    InvalidLhsPrefix,
    InvalidLhsPostfix,
    InvalidLhsForIn,
    InvalidLhsForOf,
    InvalidDestructuringTarget,
    InvalidRestElement,
    RestTrailingComma,
    RestDefault,
    InvalidCoverInitializedName,
    DuplicateProto,
    ParenthesizedPattern,
    UnexpectedArrowNewline,
    InvalidArrowParameters,
    MixedCoalesce,
    UnaryBeforeExponent,
    InvalidOptionalChainTarget,
    OptionalChainTemplate,
    NewOptionalChain,
    LineTerminatorAfterThrow,
    NestingTooDeep,
    JsxUnsupported,
    FeatureRequiresNext,
    FeatureRequiresExperimental,

    // Early
    StrictEvalArguments,
    StrictDelete,
    StrictWith,
    StrictOctalLiteral,
    StrictFunctionDeclaration,
    StrictParamDuplicate,
    DuplicateParameter,
    IllegalUseStrict,
    DuplicateBinding,
    LetInLexicalBinding,
    DuplicateConstructor,
    ConstructorSpecialMethod,
    StaticPrototype,
    ConstructorField,
    PrivateConstructor,
    DuplicatePrivateName,
    UndefinedPrivateName,
    InvalidSuperCall,
    InvalidSuperProperty,
    InvalidNewTarget,
    InvalidImportMeta,
    YieldInParameter,
    AwaitInParameter,
    AwaitOutsideAsync,
    YieldOutsideGenerator,
    GetterArity,
    SetterArity,
    SetterRest,
    IllegalReturn,
    IllegalBreak,
    IllegalContinue,
    UnknownLabel,
    DuplicateLabel,
    MultipleDefaultsInSwitch,
    ForInOfInitializer,
    ForInOfMultipleBindings,
    ForOfAsync,
    ForOfLet,
    ConstWithoutInit,
    DestructuringWithoutInit,
    LexicalInSingleStatement,
    InvalidLabelledFunction,
    ImportOutsideModule,
    ExportOutsideModule,
    DuplicateExport,
    UndefinedExport,
    InvalidExportLocal,
    UnterminatedTemplateSubstitution,
    AsyncArrowNewline,
}

impl ErrorKind {
    /// Message template with `%N` placeholders
    pub fn template(self) -> &'static str {
        use ErrorKind::*;
        match self {
            InvalidCharacter => "Invalid or unexpected token '%0'",
            UnterminatedString => "Unterminated string literal",
            UnterminatedTemplate => "Unterminated template literal",
            UnterminatedComment => "Unterminated multi-line comment",
            UnterminatedRegExp => "Unterminated regular expression",
            InvalidRegExpFlag => "Invalid regular expression flag '%0'",
            DuplicateRegExpFlag => "Duplicate regular expression flag '%0'",
            InvalidEscape => "Invalid escape sequence",
            InvalidUnicodeEscape => "Invalid Unicode escape sequence",
            InvalidHexEscape => "Invalid hexadecimal escape sequence",
            InvalidIdentifierEscape => "Invalid Unicode escape in identifier",
            InvalidNumber => "Invalid numeric literal",
            IdentifierAfterNumber => "Identifier starts immediately after numeric literal",
            InvalidNumericSeparator => "Numeric separators are not allowed here",
            BigIntRequiresNext => "BigInt literals require the 'next' option",
            LegacyOctal => "Octal literals are not allowed in strict mode",
            LegacyOctalEscape => "Octal escape sequences are not allowed in strict mode",
            TemplateOctalEscape => "Octal escape sequences are not allowed in template strings",
            InvalidTemplateEscape => "Invalid escape sequence in template",

            UnexpectedToken => "Unexpected token '%0'",
            UnexpectedEof => "Unexpected end of input",
            ExpectedToken => "Expected '%0' but found '%1'",
            UnexpectedReserved => "Unexpected reserved word '%0'",
            UnexpectedStrictReserved => "Unexpected strict mode reserved word '%0'",
            EscapedKeyword => "Keyword must not contain escaped characters",
            InvalidLhsAssignment => "Invalid left-hand side in assignment",
            InvalidLhsPrefix => "Invalid left-hand side expression in prefix operation",
            InvalidLhsPostfix => "Invalid left-hand side expression in postfix operation",
            InvalidLhsForIn => "Invalid left-hand side in for-in loop",
            InvalidLhsForOf => "Invalid left-hand side in for-of loop",
            InvalidDestructuringTarget => "Invalid destructuring assignment target",
            InvalidRestElement => "Rest element must be last element",
            RestTrailingComma => "A rest element may not have a trailing comma",
            RestDefault => "A rest element cannot have an initializer",
            InvalidCoverInitializedName => "Invalid shorthand property initializer",
            DuplicateProto => "Duplicate __proto__ fields are not allowed in object literals",
            ParenthesizedPattern => "Invalid parenthesized pattern",
            UnexpectedArrowNewline => "Line terminator not permitted before arrow",
            InvalidArrowParameters => "Malformed arrow function parameter list",
            MixedCoalesce => "Nullish coalescing cannot be mixed with '%0' without parentheses",
            UnaryBeforeExponent => {
                "Unary operator used immediately before exponentiation expression"
            }
            InvalidOptionalChainTarget => "Invalid optional chain from assignment target",
            OptionalChainTemplate => "Tagged template cannot be used in optional chain",
            NewOptionalChain => "Invalid optional chain from new expression",
            LineTerminatorAfterThrow => "Illegal newline after throw",
            NestingTooDeep => "Maximum nesting depth of %0 exceeded",
            JsxUnsupported => "JSX syntax is handled by an extension grammar",
            FeatureRequiresNext => "%0 requires the 'next' option",
            FeatureRequiresExperimental => "%0 requires the 'experimental' option",

            StrictEvalArguments => "Unexpected eval or arguments in strict mode",
            StrictDelete => "Delete of an unqualified identifier in strict mode",
            StrictWith => "Strict mode code may not include a with statement",
            StrictOctalLiteral => "Octal literals are not allowed in strict mode",
            StrictFunctionDeclaration => {
                "In strict mode code, functions can only be declared at top level or inside a block"
            }
            StrictParamDuplicate => "Duplicate parameter name not allowed in this context",
            DuplicateParameter => "Duplicate parameter name '%0'",
            IllegalUseStrict => {
                "Illegal 'use strict' directive in function with non-simple parameter list"
            }
            DuplicateBinding => "Identifier '%0' has already been declared",
            LetInLexicalBinding => "let is disallowed as a lexically bound name",
            DuplicateConstructor => "A class may only have one constructor",
            ConstructorSpecialMethod => "Class constructor may not be an accessor, generator or async",
            StaticPrototype => "Classes may not have a static property named 'prototype'",
            ConstructorField => "Classes may not have a field named 'constructor'",
            PrivateConstructor => "Classes may not have a private field named '#constructor'",
            DuplicatePrivateName => "Private field '#%0' has already been declared",
            UndefinedPrivateName => "Private field '#%0' must be declared in an enclosing class",
            InvalidSuperCall => "'super' keyword unexpected here",
            InvalidSuperProperty => "'super' keyword unexpected here",
            InvalidNewTarget => "new.target expression is not allowed here",
            InvalidImportMeta => "Cannot use 'import.meta' outside a module",
            YieldInParameter => "Yield expression not allowed in formal parameter",
            AwaitInParameter => "Await expression not allowed in formal parameter",
            AwaitOutsideAsync => "'await' is only valid in async functions",
            YieldOutsideGenerator => "'yield' is only valid in generator functions",
            GetterArity => "Getter must not have any formal parameters",
            SetterArity => "Setter must have exactly one formal parameter",
            SetterRest => "Setter function argument must not be a rest parameter",
            IllegalReturn => "Illegal return statement",
            IllegalBreak => "Illegal break statement",
            IllegalContinue => "Illegal continue statement: no surrounding iteration statement",
            UnknownLabel => "Undefined label '%0'",
            DuplicateLabel => "Label '%0' has already been declared",
            MultipleDefaultsInSwitch => "More than one default clause in switch statement",
            ForInOfInitializer => "for-%0 loop variable declaration may not have an initializer",
            ForInOfMultipleBindings => "Invalid left-hand side in for-%0 loop: must have a single binding",
            ForOfAsync => "The left-hand side of a for-of loop may not be 'async'",
            ForOfLet => "The left-hand side of a for-of loop may not start with 'let'",
            ConstWithoutInit => "Missing initializer in const declaration",
            DestructuringWithoutInit => "Missing initializer in destructuring declaration",
            LexicalInSingleStatement => "Lexical declaration cannot appear in a single-statement context",
            InvalidLabelledFunction => "Labelled function declarations are not allowed here",
            ImportOutsideModule => "Cannot use import statement outside a module",
            ExportOutsideModule => "Unexpected token 'export' outside a module",
            DuplicateExport => "Duplicate export of '%0'",
            UndefinedExport => "Export '%0' is not defined",
            InvalidExportLocal => "A string literal cannot be used as an exported binding without 'from'",
            UnterminatedTemplateSubstitution => "Missing '}' in template expression",
            AsyncArrowNewline => "No line break is allowed after 'async'",
        }
    }

    pub fn category(self) -> ErrorCategory {
        use ErrorKind::*;
        match self {
            InvalidCharacter | UnterminatedString | UnterminatedTemplate | UnterminatedComment
            | UnterminatedRegExp | InvalidRegExpFlag | DuplicateRegExpFlag | InvalidEscape
            | InvalidUnicodeEscape | InvalidHexEscape | InvalidIdentifierEscape | InvalidNumber
            | IdentifierAfterNumber | InvalidNumericSeparator | BigIntRequiresNext | LegacyOctal
            | LegacyOctalEscape | TemplateOctalEscape | InvalidTemplateEscape => {
                ErrorCategory::Lexical
            }
            UnexpectedToken | UnexpectedEof | ExpectedToken | UnexpectedReserved
            | UnexpectedStrictReserved | EscapedKeyword | InvalidLhsAssignment | InvalidLhsPrefix
            | InvalidLhsPostfix | InvalidLhsForIn | InvalidLhsForOf | InvalidDestructuringTarget
            | InvalidRestElement | RestTrailingComma | RestDefault | InvalidCoverInitializedName
            | DuplicateProto | ParenthesizedPattern | UnexpectedArrowNewline
            | InvalidArrowParameters | MixedCoalesce | UnaryBeforeExponent
            | InvalidOptionalChainTarget | OptionalChainTemplate | NewOptionalChain
            | LineTerminatorAfterThrow | NestingTooDeep | JsxUnsupported | FeatureRequiresNext
            | FeatureRequiresExperimental => ErrorCategory::Syntax,
            _ => ErrorCategory::Early,
        }
    }
}

/// A diagnostic with its source position
#[derive(Debug, Clone, PartialEq, Error)]
#[error("SyntaxError: {message} ({line}:{column})")]
pub struct ParseError {
    pub kind: ErrorKind,
    pub message: String,
    /// Byte offset into the source
    pub index: usize,
    pub line: u32,
    pub column: u32,
}

impl ParseError {
    pub fn new(kind: ErrorKind, args: &[&str], index: usize, line: u32, column: u32) -> Self {
        Self {
            kind,
            message: render_template(kind.template(), args),
            index,
            line,
            column,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }
}

/// Substitute `%0`..`%9` placeholders; missing arguments render as empty.
fn render_template(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '%' {
            if let Some(digit) = chars.peek().and_then(|d| d.to_digit(10)) {
                chars.next();
                if let Some(arg) = args.get(digit as usize) {
                    out.push_str(arg);
                }
                continue;
            }
        }
        out.push(c);
    }
    out
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Lexical => write!(f, "lexical"),
            ErrorCategory::Syntax => write!(f, "syntax"),
            ErrorCategory::Early => write!(f, "early"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_substitution() {
        let err = ParseError::new(ErrorKind::ExpectedToken, &[")", "}"], 4, 1, 5);
        assert_eq!(err.message, "Expected ')' but found '}'");
        assert_eq!(err.to_string(), "SyntaxError: Expected ')' but found '}' (1:5)");
    }

    #[test]
    fn test_missing_argument_renders_empty() {
        let err = ParseError::new(ErrorKind::UnexpectedToken, &[], 0, 1, 1);
        assert_eq!(err.message, "Unexpected token ''");
    }

    #[test]
    fn test_categories() {
        assert_eq!(ErrorKind::UnterminatedString.category(), ErrorCategory::Lexical);
        assert_eq!(ErrorKind::UnexpectedToken.category(), ErrorCategory::Syntax);
        assert_eq!(ErrorKind::StaticPrototype.category(), ErrorCategory::Early);
    }
}
