use crate::lexer::TokenKind;
use crate::location::{Position, Range};

/// One lexed token: a kind plus the source range it covers.
///
/// Tokens carry no text; the range indexes back into the [`Buffer`]
/// (`buffer.slice(token.range)`), so the stream is cheap to copy around and
/// to keep for lookahead.
///
/// [`Buffer`]: crate::Buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub range: Range,
}

impl Token {
    pub(crate) fn new(kind: TokenKind, range: Range) -> Self {
        Token { kind, range }
    }

    /// Placeholder token used before the lookahead window is filled.
    pub(crate) fn null() -> Self {
        Token {
            kind: TokenKind::Eof,
            range: Range::new(Position::default(), Position::default()),
        }
    }

    pub fn bytes(&self) -> usize {
        self.range.bytes()
    }

    pub fn chars(&self) -> usize {
        self.range.chars()
    }
}
