//! Conversion of quoted literal source text to its logical value.
//!
//! The lexer keeps string, symbol and quoted-identifier tokens as raw source
//! bytes; this module strips the surrounding quotes and processes escape
//! sequences. The output is never longer than the input.

use crate::Encoding;

/// Strip a surrounding quote pair (`"…"`, `'…'` or `` `…` ``) if present and
/// unescape the body. Double-quoted text gets the full escape table plus
/// octal, hex and unicode escapes; single-quoted and backquoted text only
/// recognizes `\\` and `\'`.
///
/// `\uHHHH` expands to UTF-8 only when the source encoding is UTF-8; in any
/// other encoding the escape is preserved verbatim.
pub fn unquote_string(input: &[u8], encoding: Encoding) -> Vec<u8> {
    if input.is_empty() {
        return Vec::new();
    }
    let first = input[0];
    let body = if matches!(first, b'"' | b'\'' | b'`') && input.len() >= 2 {
        &input[1..input.len() - 1]
    } else {
        input
    };
    unescape_string(body, first == b'"', encoding == Encoding::Utf8)
}

fn unescape_string(input: &[u8], is_double_quote: bool, is_unicode: bool) -> Vec<u8> {
    let mut output = Vec::with_capacity(input.len());
    let mut i = 0;
    while i < input.len() {
        if input[i] != b'\\' || i + 1 >= input.len() {
            output.push(input[i]);
            i += 1;
            continue;
        }
        if !is_double_quote {
            // Single quote: only \' and \\ are escapes.
            if input[i + 1] == b'\'' || input[i + 1] == b'\\' {
                output.push(input[i + 1]);
                i += 2;
            } else {
                output.push(input[i]);
                i += 1;
            }
            continue;
        }
        let c = input[i + 1];
        if c.is_ascii_digit() {
            // Octal escape, 1-3 digits.
            let mut len = 1;
            while len < 3 && i + 1 + len < input.len() && input[i + 1 + len].is_ascii_digit() {
                len += 1;
            }
            let value = input[i + 1..i + 1 + len]
                .iter()
                .fold(0u32, |acc, d| acc * 8 + u32::from(d - b'0'));
            output.push(value as u8);
            i += len + 1;
        } else if c == b'x' && i + 2 < input.len() && input[i + 2].is_ascii_hexdigit() {
            // Hex escape, 1-2 digits.
            let len = if i + 3 < input.len() && input[i + 3].is_ascii_hexdigit() {
                2
            } else {
                1
            };
            let value = hex_value(&input[i + 2..i + 2 + len]);
            output.push(value as u8);
            i += len + 2;
        } else if c == b'u' && i + 5 < input.len() && input[i + 2..i + 6].iter().all(u8::is_ascii_hexdigit) {
            if is_unicode {
                let value = hex_value(&input[i + 2..i + 6]);
                push_utf8(&mut output, value);
            } else {
                // Preserve the escape byte-for-byte in non-Unicode encodings.
                output.extend_from_slice(&input[i..i + 6]);
            }
            i += 6;
        } else if let Some(replacement) = escape_char(c) {
            output.push(replacement);
            i += 2;
        } else {
            // Unknown escape: the backslash is dropped, the character kept.
            i += 1;
        }
    }
    output
}

fn escape_char(c: u8) -> Option<u8> {
    let replacement = match c {
        b'a' => 0x07,
        b'b' => 0x08,
        b'e' => 0x1B,
        b'f' => 0x0C,
        b'n' => b'\n',
        b'r' => b'\r',
        b's' => b' ',
        b't' => b'\t',
        b'v' => 0x0B,
        b'"' => b'"',
        b'\'' => b'\'',
        b'\\' => b'\\',
        _ => return None,
    };
    Some(replacement)
}

fn hex_value(digits: &[u8]) -> u32 {
    digits.iter().fold(0u32, |acc, &d| {
        let v = match d {
            b'0'..=b'9' => d - b'0',
            b'a'..=b'f' => d - b'a' + 10,
            b'A'..=b'F' => d - b'A' + 10,
            _ => 0,
        };
        acc * 16 + u32::from(v)
    })
}

fn push_utf8(output: &mut Vec<u8>, code_point: u32) {
    if let Some(c) = char::from_u32(code_point) {
        let mut buf = [0u8; 4];
        output.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unquote(input: &str) -> Vec<u8> {
        unquote_string(input.as_bytes(), Encoding::Utf8)
    }

    #[test]
    fn plain_text_is_unchanged() {
        assert_eq!(unquote("hello"), b"hello");
        assert_eq!(unquote(r#""hello""#), b"hello");
        assert_eq!(unquote("'hello'"), b"hello");
        assert_eq!(unquote("`hello`"), b"hello");
    }

    #[test]
    fn double_quote_escapes() {
        assert_eq!(unquote(r#""a\nb""#), b"a\nb");
        assert_eq!(unquote(r#""a\tb""#), b"a\tb");
        assert_eq!(unquote(r#""a\sb""#), b"a b");
        assert_eq!(unquote(r#""a\"b""#), b"a\"b");
        assert_eq!(unquote(r#""a\\b""#), b"a\\b");
        assert_eq!(unquote(r#""\e""#), &[0x1B][..]);
    }

    #[test]
    fn octal_and_hex_escapes() {
        assert_eq!(unquote(r#""\101""#), b"A");
        assert_eq!(unquote(r#""\x41""#), b"A");
        assert_eq!(unquote(r#""\x4""#), &[0x04][..]);
        assert_eq!(unquote(r#""\0""#), &[0x00][..]);
    }

    #[test]
    fn unicode_escapes_expand_in_utf8() {
        assert_eq!(unquote(r#""\u3042""#), "\u{3042}".as_bytes());
        assert_eq!(unquote(r#""\u0041""#), b"A");
    }

    #[test]
    fn unicode_escapes_preserved_outside_utf8() {
        let out = unquote_string(br#""\u3042""#, Encoding::EucJp);
        assert_eq!(out, b"\\u3042");
    }

    #[test]
    fn single_quote_is_mostly_literal() {
        assert_eq!(unquote(r"'a\nb'"), br"a\nb");
        assert_eq!(unquote(r"'a\'b'"), b"a'b");
        assert_eq!(unquote(r"'a\\b'"), br"a\b");
    }

    #[test]
    fn output_never_longer_than_input() {
        for input in [r#""あ\n\t""#, r"'\\\\'", r#""\101\x41abc""#] {
            assert!(unquote(input).len() <= input.len());
        }
    }
}
