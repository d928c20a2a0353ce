//! The grammar productions, one module per syntactic area. Each function
//! documents the production it parses; `{}` marks the token the function is
//! entered on and `<>` the token it leaves as current.

pub(crate) mod decls;
pub(crate) mod directives;
pub(crate) mod function;
pub(crate) mod members;
pub(crate) mod name;
pub(crate) mod type_params;
pub(crate) mod types;

use crate::parser::Parser;
use crate::TokenKind;

/// Which identifier classes a type name may end in: `Foo` (class/module),
/// `_Foo` (interface), `foo` (type alias). Productions pass a union of the
/// kinds they accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TypeNameKind(u8);

impl TypeNameKind {
    pub(crate) const CLASS: TypeNameKind = TypeNameKind(1);
    pub(crate) const INTERFACE: TypeNameKind = TypeNameKind(2);
    pub(crate) const ALIAS: TypeNameKind = TypeNameKind(4);

    pub(crate) fn contains(self, other: TypeNameKind) -> bool {
        self.0 & other.0 != 0
    }
}

impl std::ops::BitOr for TypeNameKind {
    type Output = TypeNameKind;

    fn bitor(self, rhs: TypeNameKind) -> TypeNameKind {
        TypeNameKind(self.0 | rhs.0)
    }
}

/// True when the lookahead is a keyword argument or record key:
///
/// ```text
/// is_keyword === {} KEYWORD `:`
/// ```
///
/// The name and its `:` (and an interposed `?` for optional keywords) must
/// be adjacent; `foo : T` is a method-style annotation, not a keyword.
pub(crate) fn is_keyword(p: &Parser<'_>) -> bool {
    if !p.next_token.kind.is_keyword_name() {
        return false;
    }
    let name_end = p.next_token.range.end.byte_pos;
    if p.next_token2.kind == TokenKind::Colon && name_end == p.next_token2.range.start.byte_pos {
        return true;
    }
    p.next_token2.kind == TokenKind::Question
        && p.next_token3.kind == TokenKind::Colon
        && name_end == p.next_token2.range.start.byte_pos
        && p.next_token2.range.end.byte_pos == p.next_token3.range.start.byte_pos
}
