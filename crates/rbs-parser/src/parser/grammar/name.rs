use crate::ast;
use crate::error::ParseError;
use crate::location::{Location, Range};
use crate::parser::grammar::TypeNameKind;
use crate::parser::Parser;
use crate::TokenKind;

/// Which identifier class a parsed type name ended in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NameClass {
    Class,
    Interface,
    Alias,
}

/// ```text
/// type_name ::= {`::`} (tUIDENT `::`)* <tXIDENT>
///             | {(tUIDENT `::`)*} <tXIDENT>
///             | {<tXIDENT>}
/// ```
///
/// Entered with the first token of the name current. The `::` chain is
/// strict: an identifier, its `::` and the following identifier must be
/// written without gaps.
pub(crate) fn parse_type_name(
    p: &mut Parser<'_>,
    kind: TypeNameKind,
) -> Result<(ast::TypeName, Range, NameClass), ParseError> {
    let start = p.current_token.range.start;
    let mut absolute = false;

    if p.current_token.kind == TokenKind::Colon2 {
        absolute = true;
        p.advance_no_gap()?;
    }

    let mut path = Vec::new();
    let mut namespace_end = if absolute {
        Some(p.current_token.range.start)
    } else {
        None
    };

    while p.current_token.kind == TokenKind::Uident
        && p.next_token.kind == TokenKind::Colon2
        && p.current_token.range.end.byte_pos == p.next_token.range.start.byte_pos
        && p.next_token.range.end.byte_pos == p.next_token2.range.start.byte_pos
    {
        let segment = p.symbol_from_token(p.current_token);
        path.push(segment);
        p.advance();
        namespace_end = Some(p.current_token.range.end);
        p.advance();
    }

    let namespace = ast::Namespace {
        absolute,
        location: namespace_end.map(|end| Location::new(Range::new(start, end))),
        path,
    };

    let class = match p.current_token.kind {
        TokenKind::Lident if kind.contains(TypeNameKind::ALIAS) => NameClass::Alias,
        TokenKind::Ulident if kind.contains(TypeNameKind::INTERFACE) => NameClass::Interface,
        TokenKind::Uident if kind.contains(TypeNameKind::CLASS) => NameClass::Class,
        _ => {
            let expected = if kind.contains(TypeNameKind::CLASS) {
                "class/module/constant name"
            } else if kind.contains(TypeNameKind::INTERFACE) {
                "interface name"
            } else {
                "alias name"
            };
            return Err(p.error_at(p.current_token, format!("expected one of {expected}")));
        }
    };

    let name = p.symbol_from_token(p.current_token);
    let range = Range::new(start, p.current_token.range.end);
    let type_name = ast::TypeName {
        namespace,
        name,
        location: Location::new(range),
    };
    Ok((type_name, range, class))
}

/// ```text
/// namespace ::= {} (`::`)? (`tUIDENT` `::`)* <>
///             | {} <>                          (empty)
/// ```
///
/// Used by `use` directives, where the namespace is looked at through the
/// next tokens rather than the current one. Returns `None` for the range
/// when the namespace is empty.
pub(crate) fn parse_namespace(
    p: &mut Parser<'_>,
) -> Result<(ast::Namespace, Option<Range>), ParseError> {
    let mut absolute = false;
    let mut range: Option<Range> = None;

    if p.next_token.kind == TokenKind::Colon2 {
        range = Some(p.next_token.range);
        absolute = true;
        p.advance();
    }

    let mut path = Vec::new();
    while p.next_token.kind == TokenKind::Uident && p.next_token2.kind == TokenKind::Colon2 {
        let segment = p.symbol_from_token(p.next_token);
        path.push(segment);
        let start = range.map_or(p.next_token.range.start, |r| r.start);
        range = Some(Range::new(start, p.next_token2.range.end));
        p.advance();
        p.advance();
    }

    let namespace = ast::Namespace {
        absolute,
        location: range.map(Location::new),
        path,
    };
    Ok((namespace, range))
}
