//! Character classification tables
//!
//! ASCII code points are answered from a 128-entry bitmask table; everything
//! else falls back to `unicode-xid` and the short list of non-ASCII
//! whitespace and line terminators.

use unicode_xid::UnicodeXID;

pub const ID_START: u8 = 1 << 0;
pub const ID_CONTINUE: u8 = 1 << 1;
pub const DIGIT: u8 = 1 << 2;
pub const HEX: u8 = 1 << 3;
pub const OCTAL: u8 = 1 << 4;
pub const WHITESPACE: u8 = 1 << 5;
pub const LINE_TERMINATOR: u8 = 1 << 6;

const ZWNJ: char = '\u{200C}';
const ZWJ: char = '\u{200D}';

static ASCII_CLASS: [u8; 128] = build_class_table();

#[allow(clippy::indexing_slicing)]
const fn build_class_table() -> [u8; 128] {
    let mut table = [0u8; 128];
    let mut i = 0;
    while i < 128 {
        let b = i as u8;
        let mut bits = 0;
        if b.is_ascii_alphabetic() || b == b'$' || b == b'_' {
            bits |= ID_START | ID_CONTINUE;
        }
        if b.is_ascii_digit() {
            bits |= DIGIT | ID_CONTINUE | HEX;
            if b <= b'7' {
                bits |= OCTAL;
            }
        }
        if matches!(b, b'a'..=b'f' | b'A'..=b'F') {
            bits |= HEX;
        }
        if matches!(b, b'\t' | 0x0B | 0x0C | b' ') {
            bits |= WHITESPACE;
        }
        if matches!(b, b'\n' | b'\r') {
            bits |= LINE_TERMINATOR;
        }
        table[i] = bits;
        i += 1;
    }
    table
}

/// Table bits for an ASCII character, 0 for anything else
#[inline]
pub fn ascii_class(c: char) -> u8 {
    ASCII_CLASS.get(c as usize).copied().unwrap_or(0)
}

#[inline]
pub fn is_id_start(c: char) -> bool {
    if c.is_ascii() {
        ascii_class(c) & ID_START != 0
    } else {
        c.is_xid_start()
    }
}

#[inline]
pub fn is_id_continue(c: char) -> bool {
    if c.is_ascii() {
        ascii_class(c) & ID_CONTINUE != 0
    } else {
        c.is_xid_continue() || c == ZWNJ || c == ZWJ
    }
}

#[inline]
pub fn is_whitespace(c: char) -> bool {
    if c.is_ascii() {
        return ascii_class(c) & WHITESPACE != 0;
    }
    matches!(
        c,
        '\u{00A0}'
            | '\u{FEFF}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
    )
}

#[inline]
pub fn is_line_terminator(c: char) -> bool {
    if c.is_ascii() {
        return ascii_class(c) & LINE_TERMINATOR != 0;
    }
    c == '\u{2028}' || c == '\u{2029}'
}

#[inline]
pub fn is_digit(c: char) -> bool {
    ascii_class(c) & DIGIT != 0
}

#[inline]
pub fn is_octal_digit(c: char) -> bool {
    ascii_class(c) & OCTAL != 0
}

#[inline]
pub fn hex_value(c: char) -> Option<u32> {
    if ascii_class(c) & HEX != 0 {
        c.to_digit(16)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_identifier_chars() {
        assert!(is_id_start('$'));
        assert!(is_id_start('_'));
        assert!(!is_id_start('1'));
        assert!(is_id_continue('1'));
        assert!(!is_id_continue('-'));
    }

    #[test]
    fn test_unicode_fallback() {
        assert!(is_id_start('ü'));
        assert!(is_id_start('π'));
        assert!(is_id_continue('\u{200D}'));
        assert!(!is_id_start('\u{200D}'));
    }

    #[test]
    fn test_whitespace_and_terminators() {
        assert!(is_whitespace('\u{3000}'));
        assert!(is_whitespace('\u{FEFF}'));
        assert!(!is_whitespace('\n'));
        assert!(is_line_terminator('\u{2029}'));
        assert!(is_line_terminator('\r'));
    }

    #[test]
    fn test_digit_classes() {
        assert!(is_octal_digit('7'));
        assert!(!is_octal_digit('8'));
        assert_eq!(hex_value('F'), Some(15));
        assert_eq!(hex_value('g'), None);
    }
}
