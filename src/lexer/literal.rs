//! Numeric, string, template and regular expression literals

use super::chars::{hex_value, is_digit, is_id_continue, is_id_start, is_octal_digit};
use super::{is_line_terminator, Lexer, TemplatePart, TokenKind};
use crate::error::{ErrorKind, ParseError};

/// What follows a backslash in a string or template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Escape {
    /// Single-character escape (`\n`, `\t`, ...) mapping to the given char
    Char(char),
    Hex,
    Unicode,
    Zero,
    /// `\1`..`\7`
    Octal,
    /// `\8` and `\9`
    NonOctalDecimal,
    LineTerminator,
    /// Any other character escapes to itself
    Identity,
}

static ESCAPES: [Escape; 128] = build_escape_table();

#[allow(clippy::indexing_slicing)]
const fn build_escape_table() -> [Escape; 128] {
    let mut table = [Escape::Identity; 128];
    let mut i = 0;
    while i < 128 {
        table[i] = match i as u8 {
            b'n' => Escape::Char('\n'),
            b'r' => Escape::Char('\r'),
            b't' => Escape::Char('\t'),
            b'b' => Escape::Char('\u{0008}'),
            b'f' => Escape::Char('\u{000C}'),
            b'v' => Escape::Char('\u{000B}'),
            b'x' => Escape::Hex,
            b'u' => Escape::Unicode,
            b'0' => Escape::Zero,
            b'1'..=b'7' => Escape::Octal,
            b'8' | b'9' => Escape::NonOctalDecimal,
            b'\n' | b'\r' => Escape::LineTerminator,
            _ => Escape::Identity,
        };
        i += 1;
    }
    table
}

fn classify_escape(c: char) -> Escape {
    if c.is_ascii() {
        ESCAPES.get(c as usize).copied().unwrap_or(Escape::Identity)
    } else if is_line_terminator(c) {
        Escape::LineTerminator
    } else {
        Escape::Identity
    }
}

/// Result of decoding one escape sequence
enum Cooked {
    Char(char),
    /// Line continuation, contributes nothing
    Nothing,
    Invalid(ErrorKind),
}

impl<'a> Lexer<'a> {
    // Numbers

    pub(super) fn scan_number(&mut self) -> Result<TokenKind, ParseError> {
        if self.peek() == Some('0') {
            let radix = match self.peek_at(1) {
                Some('x' | 'X') => Some(16),
                Some('o' | 'O') => Some(8),
                Some('b' | 'B') => Some(2),
                _ => None,
            };
            if let Some(radix) = radix {
                self.bump();
                self.bump();
                return self.scan_radix_number(radix);
            }
            if self.peek_at(1).is_some_and(|c| is_digit(c) || c == '_') {
                return self.scan_legacy_octal();
            }
        }

        let mut buf = String::new();
        let fast = self.scan_digits(10, &mut buf)?;
        let mut is_integer = true;
        if self.peek() == Some('.') {
            self.bump();
            buf.push('.');
            is_integer = false;
            if self.peek() == Some('_') {
                return Err(self.error_here(ErrorKind::InvalidNumericSeparator, &[]));
            }
            self.scan_digits(10, &mut buf)?;
        }
        if self.scan_exponent(&mut buf)? {
            is_integer = false;
        }

        if is_integer && self.peek() == Some('n') {
            return self.finish_bigint(buf);
        }
        self.check_number_end()?;

        let value = match fast {
            Some(v) if is_integer => v as f64,
            _ => self.parse_float(&buf)?,
        };
        Ok(TokenKind::Number(value))
    }

    /// Fraction that began with a `.` the caller already consumed
    pub(super) fn scan_decimal_after_dot(&mut self) -> Result<TokenKind, ParseError> {
        let mut buf = String::from("0.");
        self.scan_digits(10, &mut buf)?;
        self.scan_exponent(&mut buf)?;
        self.check_number_end()?;
        Ok(TokenKind::Number(self.parse_float(&buf)?))
    }

    /// Digits of `radix` with optional `_` separators (under `next`). Returns the
    /// integer value when it fits exactly, for the common short-integer case.
    fn scan_digits(&mut self, radix: u32, buf: &mut String) -> Result<Option<u64>, ParseError> {
        let mut value: Option<u64> = Some(0);
        let mut count = 0usize;
        loop {
            match self.peek() {
                Some('_') if self.next => {
                    let follows_digit = self.peek_at(1).is_some_and(|c| c.is_digit(radix));
                    if count == 0 || !follows_digit {
                        return Err(self.error_here(ErrorKind::InvalidNumericSeparator, &[]));
                    }
                    self.bump();
                }
                Some(c) => {
                    let Some(d) = c.to_digit(radix) else { break };
                    self.bump();
                    buf.push(c);
                    count += 1;
                    value = value
                        .and_then(|v| v.checked_mul(u64::from(radix)))
                        .and_then(|v| v.checked_add(u64::from(d)))
                        .filter(|v| *v < (1u64 << 53));
                }
                None => break,
            }
        }
        Ok(if count == 0 { None } else { value })
    }

    fn scan_exponent(&mut self, buf: &mut String) -> Result<bool, ParseError> {
        if !matches!(self.peek(), Some('e' | 'E')) {
            return Ok(false);
        }
        self.bump();
        buf.push('e');
        if let Some(sign @ ('+' | '-')) = self.peek() {
            self.bump();
            buf.push(sign);
        }
        if !self.peek().is_some_and(is_digit) {
            return Err(self.error(ErrorKind::InvalidNumber, &[]));
        }
        self.scan_digits(10, buf)?;
        Ok(true)
    }

    fn scan_radix_number(&mut self, radix: u32) -> Result<TokenKind, ParseError> {
        if self.peek() == Some('_') {
            return Err(self.error_here(ErrorKind::InvalidNumericSeparator, &[]));
        }
        let mut digits = String::new();
        self.scan_digits(radix, &mut digits)?;
        if digits.is_empty() {
            return Err(self.error(ErrorKind::InvalidNumber, &[]));
        }
        if self.peek() == Some('n') {
            let prefix = self.current_text().get(..2).unwrap_or("0x").to_string();
            return self.finish_bigint(prefix + &digits);
        }
        self.check_number_end()?;
        let value = digits.chars().fold(0f64, |acc, c| {
            acc * f64::from(radix) + f64::from(c.to_digit(radix).unwrap_or(0))
        });
        Ok(TokenKind::Number(value))
    }

    /// `017` is octal, `019` is decimal; both are legacy forms rejected in strict code
    fn scan_legacy_octal(&mut self) -> Result<TokenKind, ParseError> {
        self.bump();
        self.bits.octal = true;
        let mut digits = String::new();
        let mut octal = true;
        while let Some(c) = self.peek() {
            if !is_digit(c) {
                break;
            }
            octal &= is_octal_digit(c);
            self.bump();
            digits.push(c);
        }
        if octal {
            self.check_number_end()?;
            let value = digits
                .chars()
                .fold(0f64, |acc, c| acc * 8.0 + f64::from(c.to_digit(8).unwrap_or(0)));
            return Ok(TokenKind::Number(value));
        }

        if self.peek() == Some('.') {
            self.bump();
            digits.push('.');
            while let Some(c) = self.peek().filter(|c| is_digit(*c)) {
                self.bump();
                digits.push(c);
            }
        }
        self.scan_exponent(&mut digits)?;
        self.check_number_end()?;
        Ok(TokenKind::Number(self.parse_float(&digits)?))
    }

    fn finish_bigint(&mut self, digits: String) -> Result<TokenKind, ParseError> {
        if !self.next {
            return Err(self.error(ErrorKind::BigIntRequiresNext, &[]));
        }
        self.bump();
        self.check_number_end()?;
        Ok(TokenKind::BigInt(self.string_dict.get_or_insert(&digits)))
    }

    /// A numeric literal must not run straight into an identifier or digit
    fn check_number_end(&self) -> Result<(), ParseError> {
        match self.peek() {
            Some(c) if is_id_start(c) || is_digit(c) || c == '\\' => {
                Err(self.error_here(ErrorKind::IdentifierAfterNumber, &[]))
            }
            _ => Ok(()),
        }
    }

    fn parse_float(&self, text: &str) -> Result<f64, ParseError> {
        text.parse::<f64>()
            .map_err(|_| self.error(ErrorKind::InvalidNumber, &[]))
    }

    // Strings

    /// String body after the opening quote
    pub(super) fn scan_string(&mut self, quote: char) -> Result<TokenKind, ParseError> {
        let mut value = String::new();
        loop {
            match self.peek() {
                Some(c) if c == quote => {
                    self.bump();
                    break;
                }
                Some('\\') => {
                    self.bump();
                    match self.scan_escape(false) {
                        Cooked::Char(c) => value.push(c),
                        Cooked::Nothing => {}
                        Cooked::Invalid(kind) => return Err(self.error_here(kind, &[])),
                    }
                }
                Some('\n' | '\r') | None => {
                    return Err(self.error(ErrorKind::UnterminatedString, &[]));
                }
                Some(c) => {
                    self.bump();
                    value.push(c);
                }
            }
        }
        Ok(TokenKind::String(self.string_dict.get_or_insert(&value)))
    }

    /// Decode the escape after a consumed backslash. Legacy octal escapes are
    /// accepted in strings (and flagged for the strict-mode check) but are
    /// invalid in templates.
    fn scan_escape(&mut self, in_template: bool) -> Cooked {
        let Some(c) = self.bump() else {
            return Cooked::Invalid(ErrorKind::InvalidEscape);
        };
        match classify_escape(c) {
            Escape::Char(mapped) => Cooked::Char(mapped),
            Escape::Identity => Cooked::Char(c),
            Escape::LineTerminator => {
                if c == '\r' && self.peek() == Some('\n') {
                    self.bump();
                }
                Cooked::Nothing
            }
            Escape::Hex => match self.scan_hex_digits(2).and_then(char::from_u32) {
                Some(ch) => Cooked::Char(ch),
                None => Cooked::Invalid(ErrorKind::InvalidHexEscape),
            },
            Escape::Unicode => match self.scan_unicode_escape_body() {
                Some(ch) => Cooked::Char(ch),
                None => Cooked::Invalid(ErrorKind::InvalidUnicodeEscape),
            },
            Escape::Zero if !self.peek().is_some_and(is_digit) => Cooked::Char('\0'),
            Escape::Zero | Escape::Octal if in_template => {
                self.bits.octal = true;
                Cooked::Invalid(ErrorKind::TemplateOctalEscape)
            }
            Escape::NonOctalDecimal if in_template => {
                self.bits.octal = true;
                Cooked::Invalid(ErrorKind::TemplateOctalEscape)
            }
            Escape::Zero | Escape::Octal => {
                self.bits.octal = true;
                let mut code = c.to_digit(8).unwrap_or(0);
                // Up to three digits when the first is 0-3, otherwise two
                let max = if code <= 3 { 3 } else { 2 };
                let mut len = 1;
                while len < max {
                    let Some(d) = self.peek().and_then(|p| p.to_digit(8)) else { break };
                    self.bump();
                    code = code * 8 + d;
                    len += 1;
                }
                Cooked::Char(char::from_u32(code).unwrap_or('\u{FFFD}'))
            }
            Escape::NonOctalDecimal => {
                self.bits.octal = true;
                Cooked::Char(c)
            }
        }
    }

    fn scan_hex_digits(&mut self, count: usize) -> Option<u32> {
        let mut value = 0u32;
        for _ in 0..count {
            let d = self.peek().and_then(hex_value)?;
            self.bump();
            value = value * 16 + d;
        }
        Some(value)
    }

    /// `XXXX` or `{X...}` after `\u`. A surrogate pair written as two escapes
    /// decodes to one character; a lone surrogate becomes U+FFFD.
    pub(super) fn scan_unicode_escape_body(&mut self) -> Option<char> {
        let code = if self.match_char('{') {
            let mut value = 0u32;
            let mut count = 0;
            while let Some(d) = self.peek().and_then(hex_value) {
                self.bump();
                value = value.checked_mul(16)?.checked_add(d)?;
                if value > 0x10FFFF {
                    return None;
                }
                count += 1;
            }
            if count == 0 || !self.match_char('}') {
                return None;
            }
            value
        } else {
            self.scan_hex_digits(4)?
        };

        if (0xD800..=0xDBFF).contains(&code) && self.starts_with("\\u") {
            let checkpoint = self.checkpoint();
            self.bump();
            self.bump();
            match self.scan_hex_digits(4) {
                Some(low @ 0xDC00..=0xDFFF) => {
                    let combined = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
                    return char::from_u32(combined);
                }
                _ => self.restore(checkpoint),
            }
        }
        Some(char::from_u32(code).unwrap_or('\u{FFFD}'))
    }

    // Templates

    /// Template chunk after the opening backtick (`head`) or the `}` closing a
    /// substitution. Invalid escapes leave `cooked` empty; the parser rejects
    /// them outside tagged templates.
    pub(super) fn scan_template_chunk(&mut self, head: bool) -> Result<TokenKind, ParseError> {
        let content_start = self.pos;
        let mut cooked = Some(String::new());
        loop {
            let content_end = self.pos;
            match self.bump() {
                Some('`') => {
                    let part = self.template_part(cooked, content_start, content_end);
                    return Ok(if head {
                        TokenKind::TemplateNoSub(part)
                    } else {
                        TokenKind::TemplateTail(part)
                    });
                }
                Some('$') if self.peek() == Some('{') => {
                    self.bump();
                    let part = self.template_part(cooked, content_start, content_end);
                    return Ok(if head {
                        TokenKind::TemplateHead(part)
                    } else {
                        TokenKind::TemplateMiddle(part)
                    });
                }
                Some('\\') => match self.scan_escape(true) {
                    Cooked::Char(c) => {
                        if let Some(buf) = cooked.as_mut() {
                            buf.push(c);
                        }
                    }
                    Cooked::Nothing => {}
                    Cooked::Invalid(_) => cooked = None,
                },
                Some('\r') => {
                    if self.peek() == Some('\n') {
                        self.bump();
                    }
                    if let Some(buf) = cooked.as_mut() {
                        buf.push('\n');
                    }
                }
                Some(c) => {
                    if let Some(buf) = cooked.as_mut() {
                        buf.push(c);
                    }
                }
                None => return Err(self.error(ErrorKind::UnterminatedTemplate, &[])),
            }
        }
    }

    fn template_part(&mut self, cooked: Option<String>, start: usize, end: usize) -> TemplatePart {
        let raw_text = self.source.get(start..end).unwrap_or("");
        let raw = if raw_text.contains('\r') {
            let normalized = raw_text.replace("\r\n", "\n").replace('\r', "\n");
            self.string_dict.get_or_insert(&normalized)
        } else {
            self.string_dict.get_or_insert(raw_text)
        };
        TemplatePart {
            cooked: cooked.map(|c| self.string_dict.get_or_insert(&c)),
            raw,
        }
    }

    // Regular expressions

    /// Pattern and flags after the opening `/`. The pattern body is kept
    /// verbatim; only the literal's extent and its flags are validated here.
    pub(super) fn scan_regexp_body(&mut self) -> Result<TokenKind, ParseError> {
        let body_start = self.pos;
        let mut in_class = false;
        let body_end = loop {
            let here = self.pos;
            match self.bump() {
                Some('/') if !in_class => break here,
                Some('[') => in_class = true,
                Some(']') => in_class = false,
                Some('\\') => match self.bump() {
                    Some(c) if !is_line_terminator(c) => {}
                    _ => return Err(self.error(ErrorKind::UnterminatedRegExp, &[])),
                },
                Some(c) if is_line_terminator(c) => {
                    return Err(self.error(ErrorKind::UnterminatedRegExp, &[]));
                }
                Some(_) => {}
                None => return Err(self.error(ErrorKind::UnterminatedRegExp, &[])),
            }
        };

        let mut flags = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                return Err(self.error_here(ErrorKind::InvalidRegExpFlag, &["\\"]));
            }
            if !is_id_continue(c) {
                break;
            }
            let text = c.to_string();
            if !"dgimsuyv".contains(c) {
                return Err(self.error_here(ErrorKind::InvalidRegExpFlag, &[&text]));
            }
            if flags.contains(c) || (c == 'u' && flags.contains('v')) || (c == 'v' && flags.contains('u')) {
                return Err(self.error_here(ErrorKind::DuplicateRegExpFlag, &[&text]));
            }
            self.bump();
            flags.push(c);
        }

        let pattern = self.source.get(body_start..body_end).unwrap_or("");
        Ok(TokenKind::RegExp {
            pattern: self.string_dict.get_or_insert(pattern),
            flags: self.string_dict.get_or_insert(&flags),
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use crate::context::Context;
    use crate::error::ErrorKind;
    use crate::lexer::{Lexer, Token, TokenKind};
    use crate::string_dict::{JsString, StringDict};

    fn first(source: &str, ctx: Context) -> Result<Token, ErrorKind> {
        let mut dict = StringDict::new();
        let mut lexer = Lexer::new(source, ctx, &mut dict);
        lexer.next_token().map_err(|e| e.kind)
    }

    fn kind(source: &str) -> Result<TokenKind, ErrorKind> {
        first(source, Context::empty()).map(|t| t.kind)
    }

    fn next_kind(source: &str) -> Result<TokenKind, ErrorKind> {
        first(source, Context::OPTION_NEXT).map(|t| t.kind)
    }

    #[test]
    fn test_decimal_numbers() {
        assert_eq!(kind("42"), Ok(TokenKind::Number(42.0)));
        assert_eq!(kind("3.25"), Ok(TokenKind::Number(3.25)));
        assert_eq!(kind("1."), Ok(TokenKind::Number(1.0)));
        assert_eq!(kind(".5"), Ok(TokenKind::Number(0.5)));
        assert_eq!(kind("1e3"), Ok(TokenKind::Number(1000.0)));
        assert_eq!(kind("2E-2"), Ok(TokenKind::Number(0.02)));
        assert_eq!(kind("9007199254740993"), Ok(TokenKind::Number(9007199254740992.0)));
    }

    #[test]
    fn test_radix_numbers() {
        assert_eq!(kind("0xff"), Ok(TokenKind::Number(255.0)));
        assert_eq!(kind("0o17"), Ok(TokenKind::Number(15.0)));
        assert_eq!(kind("0B101"), Ok(TokenKind::Number(5.0)));
        assert_eq!(kind("0x"), Err(ErrorKind::InvalidNumber));
    }

    #[test]
    fn test_legacy_octal_is_flagged() {
        let token = first("017", Context::empty());
        assert_eq!(token.as_ref().map(|t| t.kind.clone()), Ok(TokenKind::Number(15.0)));
        assert_eq!(token.map(|t| t.octal), Ok(true));
        assert_eq!(kind("019"), Ok(TokenKind::Number(19.0)));
    }

    #[test]
    fn test_identifier_after_number() {
        assert_eq!(kind("3in"), Err(ErrorKind::IdentifierAfterNumber));
        assert_eq!(kind("1_000"), Err(ErrorKind::IdentifierAfterNumber));
        assert_eq!(kind("1e"), Err(ErrorKind::InvalidNumber));
    }

    #[test]
    fn test_numeric_separators() {
        assert_eq!(next_kind("1_000_000"), Ok(TokenKind::Number(1_000_000.0)));
        assert_eq!(next_kind("0xF_F"), Ok(TokenKind::Number(255.0)));
        assert_eq!(next_kind("1__0"), Err(ErrorKind::InvalidNumericSeparator));
        assert_eq!(next_kind("10_"), Err(ErrorKind::InvalidNumericSeparator));
        assert_eq!(next_kind("1._5"), Err(ErrorKind::InvalidNumericSeparator));
    }

    #[test]
    fn test_bigint() {
        assert_eq!(next_kind("10n"), Ok(TokenKind::BigInt(JsString::from("10"))));
        assert_eq!(next_kind("0x1fn"), Ok(TokenKind::BigInt(JsString::from("0x1f"))));
        assert_eq!(kind("10n"), Err(ErrorKind::BigIntRequiresNext));
        assert_eq!(next_kind("1.5n"), Err(ErrorKind::IdentifierAfterNumber));
    }

    #[test]
    fn test_string_escapes() {
        let s = |v: &str| Ok(TokenKind::String(JsString::from(v)));
        assert_eq!(kind(r#""a\nb""#), s("a\nb"));
        assert_eq!(kind(r"'\x41B\u{43}'"), s("ABC"));
        assert_eq!(kind(r"'😀'"), s("\u{1F600}"));
        assert_eq!(kind("'a\\\nb'"), s("ab"));
        assert_eq!(kind(r"'\q'"), s("q"));
        assert_eq!(kind(r"'\0'"), s("\0"));
    }

    #[test]
    fn test_string_octal_escape_is_flagged() {
        let token = first(r"'\101'", Context::empty());
        assert_eq!(token.as_ref().map(|t| t.kind.clone()), Ok(TokenKind::String(JsString::from("A"))));
        assert_eq!(token.map(|t| t.octal), Ok(true));
        assert_eq!(first(r"'\8'", Context::empty()).map(|t| t.octal), Ok(true));
    }

    #[test]
    fn test_string_errors() {
        assert_eq!(kind("'open"), Err(ErrorKind::UnterminatedString));
        assert_eq!(kind("'a\nb'"), Err(ErrorKind::UnterminatedString));
        assert_eq!(kind(r"'\x4'"), Err(ErrorKind::InvalidHexEscape));
        assert_eq!(kind(r"'\u{110000}'"), Err(ErrorKind::InvalidUnicodeEscape));
    }

    #[test]
    fn test_template_chunks() {
        match kind("`a${") {
            Ok(TokenKind::TemplateHead(part)) => {
                assert_eq!(part.raw, "a");
                assert_eq!(part.cooked.as_ref().map(|c| c.as_str()), Some("a"));
            }
            other => panic!("expected template head, got {other:?}"),
        }
        match kind("`\\unicode`") {
            Ok(TokenKind::TemplateNoSub(part)) => {
                assert!(part.cooked.is_none());
                assert_eq!(part.raw, "\\unicode");
            }
            other => panic!("expected template, got {other:?}"),
        }
    }

    #[test]
    fn test_template_normalizes_carriage_returns() {
        match kind("`a\r\nb`") {
            Ok(TokenKind::TemplateNoSub(part)) => {
                assert_eq!(part.raw, "a\nb");
                assert_eq!(part.cooked.as_ref().map(|c| c.as_str()), Some("a\nb"));
            }
            other => panic!("expected template, got {other:?}"),
        }
    }

    #[test]
    fn test_unterminated_template() {
        assert_eq!(kind("`abc"), Err(ErrorKind::UnterminatedTemplate));
    }

    fn regexp(source: &str) -> Result<TokenKind, ErrorKind> {
        let mut dict = StringDict::new();
        let mut lexer = Lexer::new(source, Context::empty(), &mut dict);
        let slash = lexer.next_token().map_err(|e| e.kind)?;
        lexer.rescan_as_regexp(slash.span).map(|t| t.kind).map_err(|e| e.kind)
    }

    #[test]
    fn test_regexp_rescan() {
        assert_eq!(
            regexp("/[/]\\//gi"),
            Ok(TokenKind::RegExp {
                pattern: JsString::from("[/]\\/"),
                flags: JsString::from("gi"),
            })
        );
        assert_eq!(regexp("/=/"), Ok(TokenKind::RegExp {
            pattern: JsString::from("="),
            flags: JsString::from(""),
        }));
    }

    #[test]
    fn test_regexp_errors() {
        assert_eq!(regexp("/a"), Err(ErrorKind::UnterminatedRegExp));
        assert_eq!(regexp("/a\n/"), Err(ErrorKind::UnterminatedRegExp));
        assert_eq!(regexp("/a/x"), Err(ErrorKind::InvalidRegExpFlag));
        assert_eq!(regexp("/a/gg"), Err(ErrorKind::DuplicateRegExpFlag));
        assert_eq!(regexp("/a/uv"), Err(ErrorKind::DuplicateRegExpFlag));
    }
}
