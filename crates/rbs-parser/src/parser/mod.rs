mod comments;
mod type_variables;

pub(crate) mod grammar;

use crate::ast;
use crate::error::{ErrorKind, ParseError};
use crate::intern::{ConstantId, ConstantPool};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::limit::LimitTracker;
use crate::location::{Location, Range};
use crate::Buffer;

use comments::CommentStore;
use type_variables::TypeVarTable;

/// Deep enough for any signature written by a person, shallow enough that a
/// generated pathological input errors out long before the call stack is in
/// danger.
const DEFAULT_RECURSION_LIMIT: usize = 500;

/// Parse RBS type signatures into a typed AST.
///
/// The parser pulls tokens from its lexer on demand, keeping three tokens of
/// lookahead (`next`, `next2`, `next3`) beyond the current one; three is what
/// the grammar's ambiguities need (`self . foo` vs `self ? . foo`, keyword
/// arguments, strict `::` chains) and no production looks further.
///
/// ## Example
///
/// ```rust
/// use rbs_parser::{Buffer, Parser};
///
/// let buffer = Buffer::from("class Stack[T]\n  def push: (T) -> void\nend");
/// let mut parser = Parser::new(buffer);
/// let signature = parser.parse_signature().unwrap();
/// assert_eq!(signature.declarations.len(), 1);
/// ```
///
/// Identifier-like AST leaves hold ids into the parser's constant pool;
/// resolve them through [`constant_pool`](Parser::constant_pool) (or keep the
/// pool with [`into_constant_pool`](Parser::into_constant_pool) once parsing
/// is done).
#[derive(Debug)]
pub struct Parser<'src> {
    buffer: Buffer<'src>,
    lexer: Lexer<'src>,
    pub(crate) current_token: Token,
    pub(crate) next_token: Token,
    pub(crate) next_token2: Token,
    pub(crate) next_token3: Token,
    pub(crate) pool: ConstantPool,
    pub(crate) vars: TypeVarTable,
    pub(crate) recursion: LimitTracker,
    comments: CommentStore,
}

impl<'src> Parser<'src> {
    /// A parser over the whole buffer.
    pub fn new(buffer: Buffer<'src>) -> Self {
        Self::build(buffer, 0, usize::MAX)
    }

    /// A parser over the character window `[start_pos, end_pos)` of the
    /// buffer. An inverted window is API misuse and reports a runtime-kind
    /// error.
    pub fn with_span(
        buffer: Buffer<'src>,
        start_pos: usize,
        end_pos: usize,
    ) -> Result<Self, ParseError> {
        if start_pos > end_pos {
            return Err(ParseError {
                kind: ErrorKind::Runtime,
                message: format!("inverted position range: {start_pos}...{end_pos}"),
                token_kind: TokenKind::Eof,
                token_text: String::new(),
                range: Range::default(),
            });
        }
        Ok(Self::build(buffer, start_pos, end_pos))
    }

    fn build(buffer: Buffer<'src>, start_pos: usize, end_pos: usize) -> Self {
        let lexer = Lexer::new(buffer, start_pos, end_pos);
        let mut parser = Parser {
            buffer,
            lexer,
            current_token: Token::null(),
            next_token: Token::null(),
            next_token2: Token::null(),
            next_token3: Token::null(),
            // Most parses never bind a type variable, so the pool starts
            // small.
            pool: ConstantPool::with_capacity(2),
            vars: TypeVarTable::default(),
            recursion: LimitTracker::new(DEFAULT_RECURSION_LIMIT),
            comments: CommentStore::default(),
        };
        parser.next_token = parser.pull();
        parser.next_token2 = parser.pull();
        parser.next_token3 = parser.pull();
        parser
    }

    /// Configure the nesting-depth limit for type expressions.
    pub fn recursion_limit(mut self, limit: usize) -> Self {
        self.recursion = LimitTracker::new(limit);
        self
    }

    /// Pre-declare type variables visible to a subsequent
    /// [`parse_type`](Parser::parse_type) or
    /// [`parse_method_type`](Parser::parse_method_type), as if the parse
    /// happened inside a declaration binding them.
    pub fn declare_type_variables(&mut self, names: &[&str]) {
        self.vars.push(true);
        for name in names {
            let id = self.pool.intern(name.as_bytes());
            self.vars
                .insert(id)
                .expect("freshly pushed frame accepts inserts");
        }
    }

    pub fn buffer(&self) -> Buffer<'src> {
        self.buffer
    }

    pub fn constant_pool(&self) -> &ConstantPool {
        &self.pool
    }

    /// Give up the parser, keeping the pool the AST's ids resolve through.
    pub fn into_constant_pool(self) -> ConstantPool {
        self.pool
    }

    /// High-water mark of type-nesting depth reached so far.
    pub fn recursion_usage(&self) -> LimitTracker {
        self.recursion
    }

    // ---- public operations ---------------------------------------------

    /// Parse a single type expression, e.g. `Hash[Symbol, String?]`.
    pub fn parse_type(&mut self, require_eof: bool) -> Result<ast::Type, ParseError> {
        let ty = grammar::types::parse_type(self)?;
        if require_eof {
            self.expect_eof()?;
        }
        Ok(ty)
    }

    /// Parse a method type, e.g. `[T] (T) { (T) -> void } -> Array[T]`.
    pub fn parse_method_type(&mut self, require_eof: bool) -> Result<ast::MethodType, ParseError> {
        let method_type = grammar::function::parse_method_type(self)?;
        if require_eof {
            self.expect_eof()?;
        }
        Ok(method_type)
    }

    /// Parse a whole signature file.
    pub fn parse_signature(&mut self) -> Result<ast::Signature, ParseError> {
        grammar::decls::parse_signature(self)
    }

    /// Parse a standalone type-parameter list, e.g. `[unchecked out T < S]`.
    /// `module_type_params` enables variance, `unchecked` and defaults.
    pub fn parse_type_params(
        &mut self,
        module_type_params: bool,
    ) -> Result<Vec<ast::TypeParam>, ParseError> {
        if self.next_token.kind != TokenKind::LBracket {
            return Err(self.error_at(self.next_token, "expected a token `LBracket`"));
        }
        self.vars.push(true);
        let (params, _) = grammar::type_params::parse_type_params(self, module_type_params)?;
        self.vars.pop();
        self.expect_eof()?;
        Ok(params)
    }

    // ---- lookahead ------------------------------------------------------

    /// Pull the next grammar-relevant token from the lexer. Whitespace and
    /// trailing comments are dropped; whole-line comments feed the comment
    /// store.
    fn pull(&mut self) -> Token {
        loop {
            let token = self.lexer.next_token();
            match token.kind {
                TokenKind::Trivia | TokenKind::Comment => continue,
                TokenKind::LineComment => {
                    self.comments.insert(token);
                    continue;
                }
                _ => return token,
            }
        }
    }

    /// Rotate the lookahead window by one token.
    pub(crate) fn advance(&mut self) {
        self.current_token = self.next_token;
        self.next_token = self.next_token2;
        self.next_token2 = self.next_token3;
        if self.next_token3.kind != TokenKind::Eof {
            self.next_token3 = self.pull();
        }
    }

    /// Advance if the *next* token has the given kind. On `true` the token
    /// is current; otherwise nothing changed.
    pub(crate) fn advance_if(&mut self, kind: TokenKind) -> bool {
        if self.next_token.kind == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Advance only when the next token starts exactly where the current one
    /// ends; `Foo ::Bar` is not a qualified name.
    pub(crate) fn advance_no_gap(&mut self) -> Result<(), ParseError> {
        if self.current_token.range.end.byte_pos == self.next_token.range.start.byte_pos {
            self.advance();
            Ok(())
        } else {
            Err(self.error_at(self.next_token, "unexpected token"))
        }
    }

    /// Fail unless the current token has the given kind.
    pub(crate) fn expect_current(&self, kind: TokenKind) -> Result<(), ParseError> {
        if self.current_token.kind == kind {
            Ok(())
        } else {
            Err(self.error_at(
                self.current_token,
                format!("expected a token `{kind:?}`"),
            ))
        }
    }

    /// Advance, then fail unless the new current token has the given kind.
    pub(crate) fn advance_expect(&mut self, kind: TokenKind) -> Result<(), ParseError> {
        self.advance();
        self.expect_current(kind)
    }

    fn expect_eof(&mut self) -> Result<(), ParseError> {
        self.advance();
        self.expect_current(TokenKind::Eof)
    }

    // ---- errors ---------------------------------------------------------

    /// A syntax error blamed on `token`.
    pub(crate) fn error_at(&self, token: Token, message: impl Into<String>) -> ParseError {
        ParseError {
            kind: ErrorKind::Syntax,
            message: message.into(),
            token_kind: token.kind,
            token_text: String::from_utf8_lossy(self.buffer.slice(token.range)).into_owned(),
            range: token.range,
        }
    }

    fn runtime_error_at(&self, token: Token, message: impl Into<String>) -> ParseError {
        ParseError {
            kind: ErrorKind::Runtime,
            ..self.error_at(token, message)
        }
    }

    // ---- text and interning --------------------------------------------

    /// Source bytes of a token.
    pub(crate) fn token_bytes(&self, token: Token) -> &'src [u8] {
        self.buffer.slice(token.range)
    }

    pub(crate) fn intern_token(&mut self, token: Token) -> ConstantId {
        let bytes = self.buffer.slice(token.range);
        self.pool.intern(bytes)
    }

    pub(crate) fn intern_range(&mut self, range: Range) -> ConstantId {
        let bytes = &self.buffer.content()[range.start.byte_pos..range.end.byte_pos];
        self.pool.intern(bytes)
    }

    /// A [`Symbol`](ast::Symbol) for a token, interning its text as-is.
    pub(crate) fn symbol_from_token(&mut self, token: Token) -> ast::Symbol {
        ast::Symbol {
            name: self.intern_token(token),
            location: Location::new(token.range),
        }
    }

    // ---- type variables -------------------------------------------------

    pub(crate) fn push_typevars(&mut self, reset: bool) {
        self.vars.push(reset);
    }

    pub(crate) fn pop_typevars(&mut self) {
        self.vars.pop();
    }

    pub(crate) fn insert_typevar(&mut self, id: ConstantId) -> Result<(), ParseError> {
        self.vars
            .insert(id)
            .map_err(|message| self.runtime_error_at(self.current_token, message))
    }

    pub(crate) fn is_typevar(&self, id: ConstantId) -> bool {
        self.vars.member(id)
    }

    // ---- comments -------------------------------------------------------

    /// The comment block ending on the line above `subject_line`, if any.
    pub(crate) fn comment_for(&self, subject_line: usize) -> Option<ast::Comment> {
        self.comments.comment_for(&self.buffer, subject_line)
    }
}
