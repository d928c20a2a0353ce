/// Every kind of token the lexer can produce. The set is closed: the grammar
/// never sees anything outside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Eof,
    /// A byte sequence no rule matches, or an unterminated literal. Terminal
    /// for the parser.
    Error,

    LParen,       // (
    RParen,       // )
    Colon,        // :
    Colon2,       // ::
    LBracket,     // [
    RBracket,     // ]
    LBrace,       // {
    RBrace,       // }
    Hat,          // ^
    Arrow,        // ->
    FatArrow,     // =>
    Comma,        // ,
    Bar,          // |
    Amp,          // &
    Star,         // *
    Star2,        // **
    Dot,          // .
    Dot3,         // ...
    Bang,         // !
    Question,     // ?
    Lt,           // <
    Eq,           // =
    ArefOperator, // []
    /// Operator method names: `/ ~ != !~ - -@ + +@ == === =~ << <= <=> > >= >> % []=`
    Operator,

    AliasKw,
    AttrAccessorKw,
    AttrReaderKw,
    AttrWriterKw,
    BoolKw,
    BotKw,
    ClassKw,
    DefKw,
    EndKw,
    ExtendKw,
    FalseKw,
    InKw,
    IncludeKw,
    InstanceKw,
    InterfaceKw,
    ModuleKw,
    NilKw,
    OutKw,
    PrependKw,
    PrivateKw,
    PublicKw,
    SelfKw,
    SingletonKw,
    TopKw,
    TrueKw,
    TypeKw,
    UncheckedKw,
    UntypedKw,
    VoidKw,
    UseKw,
    AsKw,
    TodoKw, // __todo__

    /// Identifier starting with a lower-case letter.
    Lident,
    /// Identifier starting with an upper-case letter.
    Uident,
    /// Identifier starting with `_` followed by an upper-case letter.
    Ulident,
    /// Identifier starting with `_` followed by a lower-case letter.
    Ullident,
    /// Identifier starting with `$`.
    Gident,
    /// Identifier starting with `@`.
    Aident,
    /// Identifier starting with `@@`.
    A2ident,
    /// Identifier ending with `!`.
    BangIdent,
    /// Identifier ending with `=`.
    EqIdent,
    /// Backquoted identifier.
    Qident,

    Integer,
    DqString,
    SqString,
    Symbol,
    DqSymbol,
    SqSymbol,

    Comment,
    /// A comment that is the first non-trivia token on its line. Only these
    /// participate in comment-to-declaration attachment.
    LineComment,
    /// Whitespace.
    Trivia,

    /// `%a{...}` and friends.
    Annotation,
}

impl TokenKind {
    /// The reserved words, lexed as identifiers first and reclassified here.
    pub fn is_keyword(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            AliasKw
                | AttrAccessorKw
                | AttrReaderKw
                | AttrWriterKw
                | BoolKw
                | BotKw
                | ClassKw
                | DefKw
                | EndKw
                | ExtendKw
                | FalseKw
                | InKw
                | IncludeKw
                | InstanceKw
                | InterfaceKw
                | ModuleKw
                | NilKw
                | OutKw
                | PrependKw
                | PrivateKw
                | PublicKw
                | SelfKw
                | SingletonKw
                | TopKw
                | TrueKw
                | TypeKw
                | UncheckedKw
                | UntypedKw
                | VoidKw
                | UseKw
                | AsKw
                | TodoKw
        )
    }

    /// Tokens usable as a keyword-argument or record key (`foo:`), and as a
    /// method name.
    pub(crate) fn is_keyword_name(self) -> bool {
        use TokenKind::*;
        self.is_keyword()
            || matches!(
                self,
                Lident | Uident | Ulident | Ullident | Qident | BangIdent
            )
    }

    /// Whitespace and comments: emitted by the lexer, filtered out before
    /// the grammar sees them.
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Trivia | TokenKind::Comment | TokenKind::LineComment
        )
    }
}

/// Keyword lookup for a lower-case identifier lexeme.
pub(crate) fn keyword_kind(ident: &[u8]) -> Option<TokenKind> {
    use TokenKind::*;
    let kind = match ident {
        b"alias" => AliasKw,
        b"attr_accessor" => AttrAccessorKw,
        b"attr_reader" => AttrReaderKw,
        b"attr_writer" => AttrWriterKw,
        b"bool" => BoolKw,
        b"bot" => BotKw,
        b"class" => ClassKw,
        b"def" => DefKw,
        b"end" => EndKw,
        b"extend" => ExtendKw,
        b"false" => FalseKw,
        b"in" => InKw,
        b"include" => IncludeKw,
        b"instance" => InstanceKw,
        b"interface" => InterfaceKw,
        b"module" => ModuleKw,
        b"nil" => NilKw,
        b"out" => OutKw,
        b"prepend" => PrependKw,
        b"private" => PrivateKw,
        b"public" => PublicKw,
        b"self" => SelfKw,
        b"singleton" => SingletonKw,
        b"top" => TopKw,
        b"true" => TrueKw,
        b"type" => TypeKw,
        b"unchecked" => UncheckedKw,
        b"untyped" => UntypedKw,
        b"void" => VoidKw,
        b"use" => UseKw,
        b"as" => AsKw,
        b"__todo__" => TodoKw,
        _ => return None,
    };
    Some(kind)
}
