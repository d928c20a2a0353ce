use crate::location::Range;
use crate::Encoding;

/// Input to the lexer and parser: raw content bytes plus the encoding they
/// are written in.
///
/// Content is kept as bytes because only the UTF-8 and ASCII encodings can be
/// represented as `&str`; an EUC-JP or Windows-31J signature file cannot.
/// All positions produced by the lexer index into these bytes.
#[derive(Debug, Clone, Copy)]
pub struct Buffer<'a> {
    content: &'a [u8],
    encoding: Encoding,
}

impl<'a> Buffer<'a> {
    pub fn new(content: &'a [u8], encoding: Encoding) -> Self {
        Buffer { content, encoding }
    }

    pub fn content(&self) -> &'a [u8] {
        self.content
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// The bytes covered by a token or node range.
    pub fn slice(&self, range: Range) -> &'a [u8] {
        &self.content[range.start.byte_pos..range.end.byte_pos]
    }

    /// The bytes starting at a byte position, to the end of the buffer.
    pub(crate) fn bytes_from(&self, byte_pos: usize) -> &'a [u8] {
        &self.content[byte_pos..]
    }
}

impl<'a> From<&'a str> for Buffer<'a> {
    fn from(content: &'a str) -> Self {
        Buffer::new(content.as_bytes(), Encoding::Utf8)
    }
}
