use crate::ast;
use crate::lexer::Token;
use crate::location::{Location, Position, Range};
use crate::Buffer;

/// A run of consecutive whole-line comments, grown one line at a time as the
/// lexer emits `LineComment` tokens.
#[derive(Debug)]
pub(crate) struct CommentBlock {
    start: Position,
    end: Position,
    lines: Vec<Token>,
}

impl CommentBlock {
    fn new(token: Token) -> Self {
        CommentBlock {
            start: token.range.start,
            end: token.range.end,
            lines: vec![token],
        }
    }

    fn push(&mut self, token: Token) {
        self.end = token.range.end;
        self.lines.push(token);
    }
}

/// Collects line comments during parsing and hands them out when a
/// declaration asks for "the comment ending just above me".
#[derive(Debug, Default)]
pub(crate) struct CommentStore {
    blocks: Vec<CommentBlock>,
}

impl CommentStore {
    /// Record one `LineComment` token. A comment on the line directly below
    /// an open block extends that block; anything else opens a new one.
    pub(crate) fn insert(&mut self, token: Token) {
        let prev_line = token.range.start.line.saturating_sub(1);
        for block in self.blocks.iter_mut().rev() {
            if block.end.line == prev_line {
                block.push(token);
                return;
            }
            if block.end.line < prev_line {
                break;
            }
        }
        self.blocks.push(CommentBlock::new(token));
    }

    /// Build the comment attached to a subject on `subject_line`: the block
    /// whose last line is `subject_line - 1`, if any.
    pub(crate) fn comment_for(&self, buffer: &Buffer<'_>, subject_line: usize) -> Option<ast::Comment> {
        let comment_line = subject_line.checked_sub(1)?;
        let block = self
            .blocks
            .iter()
            .rev()
            .take_while(|block| block.end.line >= comment_line)
            .find(|block| block.end.line == comment_line)?;

        let mut text = Vec::new();
        for line in &block.lines {
            // Drop the leading `#` and at most one following space.
            let mut bytes = &buffer.slice(line.range)[1..];
            if bytes.first() == Some(&b' ') {
                bytes = &bytes[1..];
            }
            text.extend_from_slice(bytes);
            text.push(b'\n');
        }

        Some(ast::Comment {
            string: text.into_boxed_slice(),
            location: Location::new(Range::new(block.start, block.end)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::{lex, TokenKind};

    fn store_for<'a>(buffer: &Buffer<'a>) -> CommentStore {
        let mut store = CommentStore::default();
        for token in lex(*buffer, None) {
            if token.kind == TokenKind::LineComment {
                store.insert(token);
            }
        }
        store
    }

    #[test]
    fn consecutive_lines_merge() {
        let buffer = Buffer::from("# one\n# two\nclass Foo end");
        let store = store_for(&buffer);
        let comment = store.comment_for(&buffer, 3).unwrap();
        assert_eq!(&*comment.string, b"one\ntwo\n");
        assert_eq!(comment.location.range().start.line, 1);
        assert_eq!(comment.location.range().end.line, 2);
    }

    #[test]
    fn gap_breaks_attachment() {
        let buffer = Buffer::from("# far away\n\n\nclass Foo end");
        let store = store_for(&buffer);
        assert!(store.comment_for(&buffer, 4).is_none());
    }

    #[test]
    fn separate_blocks_stay_separate() {
        let buffer = Buffer::from("# a\n\n# b\nmodule M end");
        let store = store_for(&buffer);
        let comment = store.comment_for(&buffer, 4).unwrap();
        assert_eq!(&*comment.string, b"b\n");
        assert!(store.comment_for(&buffer, 2).unwrap().string.starts_with(b"a"));
    }

    #[test]
    fn hash_only_lines_are_kept_empty() {
        let buffer = Buffer::from("#\n# text\ndef x: () -> void");
        let store = store_for(&buffer);
        let comment = store.comment_for(&buffer, 3).unwrap();
        assert_eq!(&*comment.string, b"\ntext\n");
    }
}
