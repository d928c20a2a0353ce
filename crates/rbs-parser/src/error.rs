use std::fmt;

use thiserror::Error;

use crate::lexer::TokenKind;
use crate::location::Range;

/// How a parse failed.
///
/// `Syntax` means the input does not match the grammar; it is the expected
/// failure mode and carries the offending token. `Runtime` means the parser
/// API was misused (e.g. an inverted span); it indicates a bug in the caller,
/// not in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Syntax,
    Runtime,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Syntax => f.write_str("Syntax error"),
            ErrorKind::Runtime => f.write_str("Runtime error"),
        }
    }
}

/// The single error value surfaced by every parse operation.
///
/// The first error is terminal: grammar productions propagate it outward with
/// `?` and no recovery is attempted. Rendered as
///
/// ```text
/// 1:8...1:11: Syntax error: expected a token `Colon`, token=`foo` (Lident)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{range}: {kind}: {message}, token=`{token_text}` ({token_kind:?})")]
pub struct ParseError {
    pub(crate) kind: ErrorKind,
    pub(crate) message: String,
    pub(crate) token_kind: TokenKind,
    pub(crate) token_text: String,
    pub(crate) range: Range,
}

impl ParseError {
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn is_syntax_error(&self) -> bool {
        self.kind == ErrorKind::Syntax
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Kind of the token the parser stopped on.
    pub fn token_kind(&self) -> TokenKind {
        self.token_kind
    }

    /// Source text of the offending token (lossily decoded for display).
    pub fn token_text(&self) -> &str {
        &self.token_text
    }

    pub fn range(&self) -> Range {
        self.range
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Position;

    #[test]
    fn renders_like_a_compiler_diagnostic() {
        let range = Range::new(
            Position {
                byte_pos: 7,
                char_pos: 7,
                line: 1,
                column: 7,
            },
            Position {
                byte_pos: 10,
                char_pos: 10,
                line: 1,
                column: 10,
            },
        );
        let error = ParseError {
            kind: ErrorKind::Syntax,
            message: "unexpected token for simple type".to_string(),
            token_kind: TokenKind::Comma,
            token_text: ",".to_string(),
            range,
        };
        assert_eq!(
            error.to_string(),
            "1:7...1:10: Syntax error: unexpected token for simple type, token=`,` (Comma)"
        );
        assert!(error.is_syntax_error());
    }
}
