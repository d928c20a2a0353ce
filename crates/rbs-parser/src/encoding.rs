//! Source encodings supported by the lexer.
//!
//! The lexer scans bytes, not `char`s, so every encoding has to answer one
//! question cheaply: how many bytes does the character starting here take?
//! The alpha/alnum/uppercase probes classify that character for identifier
//! scanning without decoding the whole input up front.

/// A closed set of encodings a [`Buffer`](crate::Buffer) may declare.
///
/// `Utf8` is the default. The two Japanese encodings matter because RBS
/// files in the wild carry magic comments for them; for both, a valid
/// multibyte character counts as an (alphabetic, lowercase) identifier
/// character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    Utf8,
    UsAscii,
    Ascii8Bit,
    EucJp,
    Windows31J,
}

impl Default for Encoding {
    fn default() -> Self {
        Encoding::Utf8
    }
}

impl Encoding {
    /// Look up an encoding by its conventional name, case-insensitively
    /// (`"UTF-8"`, `"US-ASCII"`, `"ASCII-8BIT"`, `"EUC-JP"`, `"Windows-31J"`).
    pub fn for_name(name: &str) -> Option<Encoding> {
        let lower = name.to_ascii_lowercase();
        match lower.as_str() {
            "utf-8" => Some(Encoding::Utf8),
            "us-ascii" => Some(Encoding::UsAscii),
            "ascii-8bit" | "binary" => Some(Encoding::Ascii8Bit),
            "euc-jp" => Some(Encoding::EucJp),
            "windows-31j" | "shift_jis" | "cp932" => Some(Encoding::Windows31J),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Encoding::Utf8 => "UTF-8",
            Encoding::UsAscii => "US-ASCII",
            Encoding::Ascii8Bit => "ASCII-8BIT",
            Encoding::EucJp => "EUC-JP",
            Encoding::Windows31J => "Windows-31J",
        }
    }

    pub fn is_multibyte(self) -> bool {
        matches!(
            self,
            Encoding::Utf8 | Encoding::EucJp | Encoding::Windows31J
        )
    }

    /// Width in bytes of the character starting at `bytes[0]`, or 0 when the
    /// bytes are not a valid character in this encoding. `bytes` must be
    /// non-empty.
    pub fn char_width(self, bytes: &[u8]) -> usize {
        match self {
            Encoding::Utf8 => utf8_width(bytes),
            Encoding::UsAscii => {
                if bytes[0] < 0x80 {
                    1
                } else {
                    0
                }
            }
            Encoding::Ascii8Bit => 1,
            Encoding::EucJp => euc_jp_width(bytes),
            Encoding::Windows31J => windows_31j_width(bytes),
        }
    }

    /// Width of the character starting at `bytes[0]` if it is alphabetic or
    /// `_`, otherwise 0.
    pub fn alpha_char(self, bytes: &[u8]) -> usize {
        let b = bytes[0];
        if b.is_ascii() {
            return if b.is_ascii_alphabetic() || b == b'_' { 1 } else { 0 };
        }
        match self {
            Encoding::Utf8 => match utf8_decode(bytes) {
                Some((c, width)) if c.is_alphabetic() => width,
                _ => 0,
            },
            Encoding::UsAscii | Encoding::Ascii8Bit => 0,
            // Any valid multibyte character is treated as a letter.
            Encoding::EucJp | Encoding::Windows31J => {
                let width = self.char_width(bytes);
                if width > 1 {
                    width
                } else {
                    0
                }
            }
        }
    }

    /// Width of the character starting at `bytes[0]` if it is alphanumeric or
    /// `_`, otherwise 0.
    pub fn alnum_char(self, bytes: &[u8]) -> usize {
        let b = bytes[0];
        if b.is_ascii() {
            return if b.is_ascii_alphanumeric() || b == b'_' {
                1
            } else {
                0
            };
        }
        match self {
            Encoding::Utf8 => match utf8_decode(bytes) {
                Some((c, width)) if c.is_alphanumeric() => width,
                _ => 0,
            },
            _ => self.alpha_char(bytes),
        }
    }

    /// Whether the character starting at `bytes[0]` is uppercase.
    pub fn is_upper_char(self, bytes: &[u8]) -> bool {
        let b = bytes[0];
        if b.is_ascii() {
            return b.is_ascii_uppercase();
        }
        match self {
            Encoding::Utf8 => matches!(utf8_decode(bytes), Some((c, _)) if c.is_uppercase()),
            _ => false,
        }
    }
}

fn utf8_width(bytes: &[u8]) -> usize {
    let b = bytes[0];
    let width = match b {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => return 0,
    };
    if bytes.len() < width {
        return 0;
    }
    if bytes[1..width].iter().any(|&c| c & 0xC0 != 0x80) {
        return 0;
    }
    width
}

fn utf8_decode(bytes: &[u8]) -> Option<(char, usize)> {
    let width = utf8_width(bytes);
    if width == 0 {
        return None;
    }
    let s = std::str::from_utf8(&bytes[..width]).ok()?;
    s.chars().next().map(|c| (c, width))
}

fn euc_jp_width(bytes: &[u8]) -> usize {
    match bytes[0] {
        0x00..=0x7F => 1,
        // JIS X 0201 half-width katakana
        0x8E => {
            if bytes.len() >= 2 && (0xA1..=0xDF).contains(&bytes[1]) {
                2
            } else {
                0
            }
        }
        // JIS X 0212 supplementary plane
        0x8F => {
            if bytes.len() >= 3
                && (0xA1..=0xFE).contains(&bytes[1])
                && (0xA1..=0xFE).contains(&bytes[2])
            {
                3
            } else {
                0
            }
        }
        0xA1..=0xFE => {
            if bytes.len() >= 2 && (0xA1..=0xFE).contains(&bytes[1]) {
                2
            } else {
                0
            }
        }
        _ => 0,
    }
}

fn windows_31j_width(bytes: &[u8]) -> usize {
    match bytes[0] {
        0x00..=0x80 => 1,
        // half-width katakana
        0xA1..=0xDF => 1,
        0x81..=0x9F | 0xE0..=0xFC => {
            if bytes.len() >= 2
                && ((0x40..=0x7E).contains(&bytes[1]) || (0x80..=0xFC).contains(&bytes[1]))
            {
                2
            } else {
                0
            }
        }
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_name() {
        assert_eq!(Encoding::for_name("UTF-8"), Some(Encoding::Utf8));
        assert_eq!(Encoding::for_name("utf-8"), Some(Encoding::Utf8));
        assert_eq!(Encoding::for_name("Windows-31J"), Some(Encoding::Windows31J));
        assert_eq!(Encoding::for_name("EUC-JP"), Some(Encoding::EucJp));
        assert_eq!(Encoding::for_name("KOI8-R"), None);
    }

    #[test]
    fn utf8_widths() {
        assert_eq!(Encoding::Utf8.char_width(b"a"), 1);
        assert_eq!(Encoding::Utf8.char_width("é".as_bytes()), 2);
        assert_eq!(Encoding::Utf8.char_width("あ".as_bytes()), 3);
        assert_eq!(Encoding::Utf8.char_width("🚀".as_bytes()), 4);
        assert_eq!(Encoding::Utf8.char_width(&[0xFF]), 0);
        // truncated continuation
        assert_eq!(Encoding::Utf8.char_width(&[0xE3, 0x81]), 0);
    }

    #[test]
    fn utf8_classification() {
        assert_eq!(Encoding::Utf8.alpha_char("あ".as_bytes()), 3);
        assert_eq!(Encoding::Utf8.alnum_char(b"7"), 1);
        assert_eq!(Encoding::Utf8.alpha_char(b"+"), 0);
        assert!(Encoding::Utf8.is_upper_char("Ä".as_bytes()));
        assert!(!Encoding::Utf8.is_upper_char("ä".as_bytes()));
    }

    #[test]
    fn euc_jp_widths() {
        // "ル" in EUC-JP
        assert_eq!(Encoding::EucJp.char_width(&[0xA5, 0xEB]), 2);
        assert_eq!(Encoding::EucJp.char_width(&[0x8E, 0xB1]), 2);
        assert_eq!(Encoding::EucJp.char_width(&[0x8F, 0xA1, 0xA1]), 3);
        assert_eq!(Encoding::EucJp.char_width(&[0xA5]), 0);
        assert_eq!(Encoding::EucJp.alpha_char(&[0xA5, 0xEB]), 2);
    }

    #[test]
    fn windows_31j_widths() {
        // "ル" in Windows-31J
        assert_eq!(Encoding::Windows31J.char_width(&[0x83, 0x8B]), 2);
        // half-width katakana is a single byte
        assert_eq!(Encoding::Windows31J.char_width(&[0xB1]), 1);
        assert_eq!(Encoding::Windows31J.char_width(&[0x81]), 0);
    }

    #[test]
    fn ascii_is_strict() {
        assert_eq!(Encoding::UsAscii.char_width(&[0xE3]), 0);
        assert_eq!(Encoding::Ascii8Bit.char_width(&[0xE3]), 1);
        assert_eq!(Encoding::Ascii8Bit.alpha_char(&[0xE3]), 0);
    }
}
