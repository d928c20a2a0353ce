mod token;
mod token_kind;

pub use token::Token;
pub use token_kind::TokenKind;

pub(crate) use token_kind::keyword_kind;

use crate::location::{Position, Range};
use crate::Buffer;

/// Marker code point for a multibyte character. The scanner only ever
/// dispatches on ASCII; multibyte characters are classified through the
/// encoding probes instead.
const MULTIBYTE: u32 = u32::MAX;

/// Converts source bytes into a stream of [`Token`]s.
///
/// The lexer tracks byte, character and line/column positions at the same
/// time, one character ahead of the emitted tokens:
///
/// ```text
/// #.   0.1.2.3.4.5.6.7.8.9.0.1.2.3.4.5.6
/// ... " a   s t r i n g   t o k e n "
///    ^                                   start position (0)
///                ^                       current position (6)
///                 ^                      current character ('i')
///     ~~~~~~~~~~~                        token so far => "a str
/// ```
///
/// ASCII characters take a fast path; everything else goes through the
/// buffer's [`Encoding`](crate::Encoding) to find the character width.
/// Reaching the end of the scan window (or an embedded NUL byte) produces an
/// `Eof` token, and the lexer keeps producing `Eof` from then on.
#[derive(Debug, Clone)]
pub struct Lexer<'src> {
    buffer: Buffer<'src>,
    /// Character position at which scanning stops.
    end_pos: usize,
    /// Just before the current character.
    current: Position,
    /// Start of the token being scanned.
    start: Position,
    current_code_point: u32,
    current_char_width: usize,
    /// Set at every newline, cleared when a non-trivia token is emitted.
    /// Decides `LineComment` vs `Comment`.
    first_token_of_line: bool,
}

impl<'src> Lexer<'src> {
    /// A lexer over the character window `[start_pos, end_pos)` of the
    /// buffer. Positions are in characters, not bytes.
    pub fn new(buffer: Buffer<'src>, start_pos: usize, end_pos: usize) -> Self {
        let mut lexer = Lexer {
            buffer,
            end_pos,
            current: Position {
                byte_pos: 0,
                char_pos: 0,
                line: 1,
                column: 0,
            },
            start: Position::default(),
            current_code_point: 0,
            current_char_width: 1,
            first_token_of_line: true,
        };
        lexer.read_current_char();
        for _ in 0..start_pos {
            lexer.skip();
        }
        lexer.start = lexer.current;
        lexer
    }

    pub fn buffer(&self) -> Buffer<'src> {
        self.buffer
    }

    /// Source bytes of a token.
    pub fn token_bytes(&self, token: Token) -> &'src [u8] {
        self.buffer.slice(token.range)
    }

    fn read_current_char(&mut self) {
        let content = self.buffer.content();
        if self.current.char_pos >= self.end_pos || self.current.byte_pos >= content.len() {
            self.current_code_point = 0;
            self.current_char_width = 1;
            return;
        }
        let bytes = self.buffer.bytes_from(self.current.byte_pos);
        let byte = bytes[0];
        if byte < 0x80 {
            self.current_code_point = u32::from(byte);
            self.current_char_width = 1;
            return;
        }
        let width = self.buffer.encoding().char_width(bytes);
        if width <= 1 {
            // Single-byte character outside ASCII, or an invalid sequence;
            // either way no scanner rule starts with it.
            self.current_code_point = u32::from(byte);
            self.current_char_width = 1;
        } else {
            self.current_code_point = MULTIBYTE;
            self.current_char_width = width;
        }
    }

    /// Advances the current position by one character.
    fn skip(&mut self) {
        if self.current_code_point == 0 {
            return;
        }
        self.current.byte_pos += self.current_char_width;
        self.current.char_pos += 1;
        if self.current_code_point == u32::from(b'\n') {
            self.current.line += 1;
            self.current.column = 0;
            self.first_token_of_line = true;
        } else {
            self.current.column += 1;
        }
        self.read_current_char();
    }

    fn skip_n(&mut self, n: usize) {
        for _ in 0..n {
            self.skip();
        }
    }

    /// Byte `n` positions after the current character. Only meaningful while
    /// the preceding `n` characters are ASCII. Returns 0 beyond the window.
    fn peek_ascii(&self, n: usize) -> u8 {
        if self.current.char_pos + n >= self.end_pos {
            return 0;
        }
        self.buffer
            .content()
            .get(self.current.byte_pos + n)
            .copied()
            .unwrap_or(0)
    }

    /// Finish the token being scanned.
    fn token(&mut self, kind: TokenKind) -> Token {
        let token = Token::new(kind, Range::new(self.start, self.current));
        self.start = self.current;
        if kind != TokenKind::Trivia {
            self.first_token_of_line = false;
        }
        token
    }

    fn eof_token(&mut self) -> Token {
        Token::new(TokenKind::Eof, Range::new(self.start, self.start))
    }

    /// Consume one character and emit an `Error` token for it.
    fn error_char(&mut self) -> Token {
        self.skip();
        self.token(TokenKind::Error)
    }

    /// The next token, including trivia and comments. After the end of input
    /// this keeps returning `Eof`.
    pub fn next_token(&mut self) -> Token {
        let code_point = self.current_code_point;
        if code_point == 0 {
            return self.eof_token();
        }
        if code_point >= 128 {
            return self.error_char();
        }
        let c = code_point as u8;

        match c {
            b' ' | b'\t' | b'\r' | b'\n' | b'\x0C' => self.whitespace(),
            b'#' => self.comment(),

            b'(' => self.punct1(TokenKind::LParen),
            b')' => self.punct1(TokenKind::RParen),
            b'{' => self.punct1(TokenKind::LBrace),
            b'}' => self.punct1(TokenKind::RBrace),
            b']' => self.punct1(TokenKind::RBracket),
            b',' => self.punct1(TokenKind::Comma),
            b'|' => self.punct1(TokenKind::Bar),
            b'&' => self.punct1(TokenKind::Amp),
            b'^' => self.punct1(TokenKind::Hat),
            b'?' => self.punct1(TokenKind::Question),

            b'[' => {
                if self.peek_ascii(1) == b']' {
                    if self.peek_ascii(2) == b'=' {
                        self.punct(3, TokenKind::Operator)
                    } else {
                        self.punct(2, TokenKind::ArefOperator)
                    }
                } else {
                    self.punct1(TokenKind::LBracket)
                }
            }
            b':' => self.colon_or_symbol(),
            b'-' => match self.peek_ascii(1) {
                b'>' => self.punct(2, TokenKind::Arrow),
                b'@' => self.punct(2, TokenKind::Operator),
                b'0'..=b'9' => self.integer(),
                _ => self.punct1(TokenKind::Operator),
            },
            b'+' => match self.peek_ascii(1) {
                b'@' => self.punct(2, TokenKind::Operator),
                b'0'..=b'9' => self.integer(),
                _ => self.punct1(TokenKind::Operator),
            },
            b'=' => match self.peek_ascii(1) {
                b'>' => self.punct(2, TokenKind::FatArrow),
                b'~' => self.punct(2, TokenKind::Operator),
                b'=' => {
                    if self.peek_ascii(2) == b'=' {
                        self.punct(3, TokenKind::Operator)
                    } else {
                        self.punct(2, TokenKind::Operator)
                    }
                }
                _ => self.punct1(TokenKind::Eq),
            },
            b'!' => match self.peek_ascii(1) {
                b'=' | b'~' => self.punct(2, TokenKind::Operator),
                _ => self.punct1(TokenKind::Bang),
            },
            b'<' => match self.peek_ascii(1) {
                b'<' => self.punct(2, TokenKind::Operator),
                b'=' => {
                    if self.peek_ascii(2) == b'>' {
                        self.punct(3, TokenKind::Operator)
                    } else {
                        self.punct(2, TokenKind::Operator)
                    }
                }
                _ => self.punct1(TokenKind::Lt),
            },
            b'>' => match self.peek_ascii(1) {
                b'=' | b'>' => self.punct(2, TokenKind::Operator),
                _ => self.punct1(TokenKind::Operator),
            },
            b'.' => {
                if self.peek_ascii(1) == b'.' && self.peek_ascii(2) == b'.' {
                    self.punct(3, TokenKind::Dot3)
                } else {
                    self.punct1(TokenKind::Dot)
                }
            }
            b'*' => {
                if self.peek_ascii(1) == b'*' {
                    self.punct(2, TokenKind::Star2)
                } else {
                    self.punct1(TokenKind::Star)
                }
            }
            b'/' | b'~' => self.punct1(TokenKind::Operator),
            b'%' => self.annotation_or_operator(),

            b'`' => self.quoted_ident(),
            b'"' => self.quoted(b'"', TokenKind::DqString),
            b'\'' => self.quoted(b'\'', TokenKind::SqString),
            b'0'..=b'9' => self.integer(),
            b'a'..=b'z' => self.lower_ident(),
            b'A'..=b'Z' => self.upper_ident(),
            b'_' => self.underscore_ident(),
            b'$' => self.global_ident(),
            b'@' => self.at_ident(),

            _ => self.error_char(),
        }
    }

    fn punct1(&mut self, kind: TokenKind) -> Token {
        self.punct(1, kind)
    }

    fn punct(&mut self, chars: usize, kind: TokenKind) -> Token {
        self.skip_n(chars);
        self.token(kind)
    }

    fn whitespace(&mut self) -> Token {
        while matches!(
            self.current_code_point,
            0x09 | 0x0A | 0x0C | 0x0D | 0x20
        ) {
            self.skip();
        }
        self.token(TokenKind::Trivia)
    }

    fn comment(&mut self) -> Token {
        let first_of_line = self.first_token_of_line;
        while self.current_code_point != u32::from(b'\n') && self.current_code_point != 0 {
            self.skip();
        }
        self.token(if first_of_line {
            TokenKind::LineComment
        } else {
            TokenKind::Comment
        })
    }

    fn integer(&mut self) -> Token {
        if matches!(self.current_code_point, c if c == u32::from(b'-') || c == u32::from(b'+')) {
            self.skip();
        }
        while is_digit(self.current_code_point) || self.current_code_point == u32::from(b'_') {
            self.skip();
        }
        self.token(TokenKind::Integer)
    }

    /// Consume identifier characters: ASCII word characters plus anything
    /// the encoding classifies as alphanumeric.
    fn scan_word(&mut self) {
        loop {
            let code_point = self.current_code_point;
            if code_point == 0 {
                return;
            }
            if code_point < 128 {
                let b = code_point as u8;
                if b.is_ascii_alphanumeric() || b == b'_' {
                    self.skip();
                    continue;
                }
                return;
            }
            let bytes = self.buffer.bytes_from(self.current.byte_pos);
            if self.buffer.encoding().alnum_char(bytes) > 0 {
                self.skip();
            } else {
                return;
            }
        }
    }

    fn lexeme(&self) -> &'src [u8] {
        &self.buffer.content()[self.start.byte_pos..self.current.byte_pos]
    }

    fn lower_ident(&mut self) -> Token {
        self.scan_word();
        match self.current_code_point {
            c if c == u32::from(b'!') => {
                self.skip();
                self.token(TokenKind::BangIdent)
            }
            c if c == u32::from(b'=') => {
                self.skip();
                self.token(TokenKind::EqIdent)
            }
            _ => {
                let kind = keyword_kind(self.lexeme()).unwrap_or(TokenKind::Lident);
                self.token(kind)
            }
        }
    }

    fn upper_ident(&mut self) -> Token {
        self.scan_word();
        self.token(TokenKind::Uident)
    }

    fn underscore_ident(&mut self) -> Token {
        self.skip();
        let kind = match self.current_code_point {
            c if (u32::from(b'A')..=u32::from(b'Z')).contains(&c) => {
                self.scan_word();
                TokenKind::Ulident
            }
            _ => {
                self.scan_word();
                if self.lexeme() == b"__todo__" {
                    TokenKind::TodoKw
                } else {
                    TokenKind::Ullident
                }
            }
        };
        self.token(kind)
    }

    fn global_ident(&mut self) -> Token {
        self.skip();
        let before = self.current.char_pos;
        self.scan_word();
        if self.current.char_pos == before {
            return self.token(TokenKind::Error);
        }
        self.token(TokenKind::Gident)
    }

    fn at_ident(&mut self) -> Token {
        self.skip();
        let kind = if self.current_code_point == u32::from(b'@') {
            self.skip();
            TokenKind::A2ident
        } else {
            TokenKind::Aident
        };
        let before = self.current.char_pos;
        self.scan_word();
        if self.current.char_pos == before {
            return self.token(TokenKind::Error);
        }
        self.token(kind)
    }

    fn quoted_ident(&mut self) -> Token {
        self.skip();
        loop {
            match self.current_code_point {
                0 => return self.token(TokenKind::Error),
                c if c == u32::from(b'`') => {
                    self.skip();
                    return self.token(TokenKind::Qident);
                }
                _ => self.skip(),
            }
        }
    }

    /// Scan a quoted literal. The body is kept raw; escape processing is the
    /// parser's job, the lexer only needs `\"` not to terminate the string.
    fn quoted(&mut self, quote: u8, kind: TokenKind) -> Token {
        self.skip();
        loop {
            match self.current_code_point {
                0 => return self.token(TokenKind::Error),
                c if c == u32::from(b'\\') => {
                    self.skip();
                    if self.current_code_point != 0 {
                        self.skip();
                    }
                }
                c if c == u32::from(quote) => {
                    self.skip();
                    return self.token(kind);
                }
                _ => self.skip(),
            }
        }
    }

    fn annotation_or_operator(&mut self) -> Token {
        let close = match (self.peek_ascii(1), self.peek_ascii(2)) {
            (b'a', b'{') => b'}',
            (b'a', b'(') => b')',
            (b'a', b'[') => b']',
            (b'a', b'<') => b'>',
            (b'a', b'|') => b'|',
            _ => return self.punct1(TokenKind::Operator),
        };
        self.skip_n(3);
        loop {
            match self.current_code_point {
                0 => return self.token(TokenKind::Error),
                c if c == u32::from(close) => {
                    self.skip();
                    return self.token(TokenKind::Annotation);
                }
                _ => self.skip(),
            }
        }
    }

    fn colon_or_symbol(&mut self) -> Token {
        match self.peek_ascii(1) {
            b':' => self.punct(2, TokenKind::Colon2),
            b'"' => {
                self.skip();
                self.quoted(b'"', TokenKind::DqSymbol)
            }
            b'\'' => {
                self.skip();
                self.quoted(b'\'', TokenKind::SqSymbol)
            }
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                self.skip();
                self.scan_word();
                if matches!(
                    self.current_code_point,
                    c if c == u32::from(b'?') || c == u32::from(b'!') || c == u32::from(b'=')
                ) {
                    self.skip();
                }
                self.token(TokenKind::Symbol)
            }
            b'@' => {
                self.skip_n(2);
                if self.current_code_point == u32::from(b'@') {
                    self.skip();
                }
                let before = self.current.char_pos;
                self.scan_word();
                if self.current.char_pos == before {
                    return self.token(TokenKind::Error);
                }
                self.token(TokenKind::Symbol)
            }
            b'$' => {
                self.skip_n(2);
                let before = self.current.char_pos;
                self.scan_word();
                if self.current.char_pos == before {
                    return self.token(TokenKind::Error);
                }
                self.token(TokenKind::Symbol)
            }
            b'|' | b'&' | b'/' | b'%' | b'~' | b'^' | b'`' => self.punct(2, TokenKind::Symbol),
            b'+' | b'-' => {
                self.skip_n(2);
                if self.current_code_point == u32::from(b'@') {
                    self.skip();
                }
                self.token(TokenKind::Symbol)
            }
            b'*' => {
                self.skip_n(2);
                if self.current_code_point == u32::from(b'*') {
                    self.skip();
                }
                self.token(TokenKind::Symbol)
            }
            b'<' => {
                self.skip_n(2);
                if self.current_code_point == u32::from(b'<') {
                    self.skip();
                } else if self.current_code_point == u32::from(b'=') {
                    self.skip();
                    if self.current_code_point == u32::from(b'>') {
                        self.skip();
                    }
                }
                self.token(TokenKind::Symbol)
            }
            b'>' => {
                self.skip_n(2);
                if self.current_code_point == u32::from(b'=')
                    || self.current_code_point == u32::from(b'>')
                {
                    self.skip();
                }
                self.token(TokenKind::Symbol)
            }
            b'=' => match self.peek_ascii(2) {
                b'~' => self.punct(3, TokenKind::Symbol),
                b'=' => {
                    if self.peek_ascii(3) == b'=' {
                        self.punct(4, TokenKind::Symbol)
                    } else {
                        self.punct(3, TokenKind::Symbol)
                    }
                }
                _ => self.punct1(TokenKind::Colon),
            },
            b'!' => {
                self.skip_n(2);
                if self.current_code_point == u32::from(b'=')
                    || self.current_code_point == u32::from(b'~')
                {
                    self.skip();
                }
                self.token(TokenKind::Symbol)
            }
            b'[' => {
                if self.peek_ascii(2) == b']' {
                    if self.peek_ascii(3) == b'=' {
                        self.punct(4, TokenKind::Symbol)
                    } else {
                        self.punct(3, TokenKind::Symbol)
                    }
                } else {
                    self.punct1(TokenKind::Colon)
                }
            }
            _ => self.punct1(TokenKind::Colon),
        }
    }

}

fn is_digit(code_point: u32) -> bool {
    (u32::from(b'0')..=u32::from(b'9')).contains(&code_point)
}

/// Tokenize a whole buffer, trivia and comments included, up to and
/// including the final `Eof` token. `end_pos` limits the scan to the first
/// `end_pos` characters.
pub fn lex(buffer: Buffer<'_>, end_pos: Option<usize>) -> Vec<Token> {
    let mut lexer = Lexer::new(buffer, 0, end_pos.unwrap_or(usize::MAX));
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token();
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            break;
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(Buffer::from(source), None)
            .into_iter()
            .map(|t| t.kind)
            .filter(|k| !k.is_trivia())
            .collect()
    }

    fn texts(source: &str) -> Vec<String> {
        let buffer = Buffer::from(source);
        lex(buffer, None)
            .into_iter()
            .filter(|t| !t.kind.is_trivia() && t.kind != TokenKind::Eof)
            .map(|t| String::from_utf8_lossy(buffer.slice(t.range)).into_owned())
            .collect()
    }

    #[test]
    fn punctuation() {
        use TokenKind::*;
        assert_eq!(
            kinds("( ) [ ] { } ^ -> => , | & * ** . ... ! ? < ="),
            vec![
                LParen, RParen, LBracket, RBracket, LBrace, RBrace, Hat, Arrow, FatArrow, Comma,
                Bar, Amp, Star, Star2, Dot, Dot3, Bang, Question, Lt, Eq, Eof
            ]
        );
    }

    #[test]
    fn colons() {
        use TokenKind::*;
        assert_eq!(kinds(":: : "), vec![Colon2, Colon, Eof]);
    }

    #[test]
    fn keywords_and_identifiers() {
        use TokenKind::*;
        assert_eq!(
            kinds("class Foo end foo _Interface _private $stdout @ivar @@cvar"),
            vec![
                ClassKw, Uident, EndKw, Lident, Ulident, Ullident, Gident, Aident, A2ident, Eof
            ]
        );
        assert_eq!(kinds("__todo__"), vec![TodoKw, Eof]);
        assert_eq!(kinds("foo! foo="), vec![BangIdent, EqIdent, Eof]);
        assert_eq!(kinds("`quoted`"), vec![Qident, Eof]);
    }

    #[test]
    fn operators() {
        use TokenKind::*;
        assert_eq!(
            kinds("[] []= <=> == === =~ << <= >= >> / % ~ -@ +@"),
            vec![
                ArefOperator, Operator, Operator, Operator, Operator, Operator, Operator,
                Operator, Operator, Operator, Operator, Operator, Operator, Operator, Operator,
                Eof
            ]
        );
    }

    #[test]
    fn literals() {
        use TokenKind::*;
        assert_eq!(
            kinds(r#"123 -42 1_000 "str" 'str' :sym :"dq" :'sq' :+ :[]= :foo?"#),
            vec![
                Integer, Integer, Integer, DqString, SqString, Symbol, DqSymbol, SqSymbol,
                Symbol, Symbol, Symbol, Eof
            ]
        );
        assert_eq!(texts(":sym"), vec![":sym"]);
        assert_eq!(texts(r#""a\"b""#), vec![r#""a\"b""#]);
    }

    #[test]
    fn annotations() {
        use TokenKind::*;
        assert_eq!(kinds("%a{pure}"), vec![Annotation, Eof]);
        assert_eq!(kinds("%a(impl) %a[x] %a<y> %a|z|"), vec![Annotation, Annotation, Annotation, Annotation, Eof]);
        assert_eq!(texts("%a{pure}"), vec!["%a{pure}"]);
        // bare % is the modulo operator
        assert_eq!(kinds("%"), vec![Operator, Eof]);
    }

    #[test]
    fn comments() {
        use TokenKind::*;
        let tokens = lex(Buffer::from("# leading\nfoo # trailing\n# line2"), None);
        let kinds: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind != Trivia)
            .map(|t| t.kind)
            .collect();
        assert_eq!(kinds, vec![LineComment, Lident, Comment, LineComment, Eof]);
    }

    #[test]
    fn positions_track_lines_and_columns() {
        let tokens = lex(Buffer::from("foo\n  bar"), None);
        let bar = tokens
            .iter()
            .find(|t| t.kind == TokenKind::Lident && t.range.start.byte_pos == 6)
            .unwrap();
        assert_eq!(bar.range.start.line, 2);
        assert_eq!(bar.range.start.column, 2);
        assert_eq!(bar.range.end.column, 5);
    }

    #[test]
    fn multibyte_positions() {
        // "あ" is 3 bytes, 1 char
        let source = "\"あ\" :x";
        let tokens = lex(Buffer::from(source), None);
        let string = &tokens[0];
        assert_eq!(string.kind, TokenKind::DqString);
        assert_eq!(string.range.start.byte_pos, 0);
        assert_eq!(string.range.end.byte_pos, 5);
        assert_eq!(string.range.end.char_pos, 3);
        let symbol = tokens.iter().find(|t| t.kind == TokenKind::Symbol).unwrap();
        assert_eq!(symbol.range.start.char_pos, 4);
        assert_eq!(symbol.range.start.byte_pos, 6);
    }

    #[test]
    fn scan_window_limits_input() {
        let buffer = Buffer::from("foo bar");
        let mut lexer = Lexer::new(buffer, 0, 3);
        let token = lexer.next_token();
        assert_eq!(token.kind, TokenKind::Lident);
        assert_eq!(token.range.end.char_pos, 3);
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
    }

    #[test]
    fn unterminated_string_is_an_error() {
        use TokenKind::*;
        assert_eq!(kinds("\"abc"), vec![Error, Eof]);
        assert_eq!(kinds("%a{abc"), vec![Error, Eof]);
    }

    #[test]
    fn token_ranges_are_ordered_and_adjacent() {
        let tokens = lex(Buffer::from("class Foo[A] < Bar\nend"), None);
        let mut last_end = 0;
        for token in &tokens {
            assert!(token.range.start.byte_pos <= token.range.end.byte_pos);
            assert_eq!(token.range.start.byte_pos, last_end);
            last_end = token.range.end.byte_pos;
        }
    }
}
