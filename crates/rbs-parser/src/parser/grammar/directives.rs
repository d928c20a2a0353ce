use crate::ast;
use crate::error::ParseError;
use crate::location::{Location, Range};
use crate::parser::grammar::name::parse_namespace;
use crate::parser::Parser;
use crate::TokenKind;

/// ```text
/// use_clauses ::= {} use_clause `,` ... `,` <use_clause>
///
/// use_clause ::= {} namespace <tUIDENT>
///              | {} namespace tUIDENT `as` <tUIDENT>
///              | {} namespace <tSTAR>
/// ```
///
/// A renamed import keeps the identifier class of the original: a class can
/// only be renamed to a class name, an interface to an interface name, an
/// alias to an alias name.
fn parse_use_clauses(p: &mut Parser<'_>) -> Result<Vec<ast::UseClause>, ParseError> {
    let mut clauses = Vec::new();

    loop {
        let (namespace, namespace_range) = parse_namespace(p)?;

        match p.next_token.kind {
            TokenKind::Lident | TokenKind::Ulident | TokenKind::Uident => {
                p.advance();
                let ident_kind = p.current_token.kind;

                let type_name_range = match namespace_range {
                    Some(range) => Range::new(range.start, p.current_token.range.end),
                    None => p.current_token.range,
                };
                let name = p.symbol_from_token(p.current_token);
                let type_name = ast::TypeName {
                    namespace,
                    name,
                    location: Location::new(type_name_range),
                };

                let mut keyword_range = None;
                let mut new_name = None;
                let mut new_name_range = None;
                let mut clause_range = type_name_range;
                if p.next_token.kind == TokenKind::AsKw {
                    p.advance();
                    keyword_range = Some(p.current_token.range);

                    p.advance_expect(ident_kind)?;
                    new_name = Some(p.symbol_from_token(p.current_token));
                    new_name_range = Some(p.current_token.range);
                    clause_range.end = p.current_token.range.end;
                }

                let mut location = Location::with_children(clause_range, 3);
                location.add_required_child("type_name", type_name_range);
                location.add_optional_child("keyword", keyword_range);
                location.add_optional_child("new_name", new_name_range);

                clauses.push(ast::UseClause::Single(ast::SingleUse {
                    type_name,
                    new_name,
                    location,
                }));
            }
            TokenKind::Star => {
                p.advance();
                let star_range = p.current_token.range;
                let clause_range = match namespace_range {
                    Some(range) => Range::new(range.start, star_range.end),
                    None => star_range,
                };

                let mut location = Location::with_children(clause_range, 2);
                location.add_optional_child("namespace", namespace_range);
                location.add_required_child("star", star_range);

                clauses.push(ast::UseClause::Wildcard(ast::WildcardUse {
                    namespace,
                    location,
                }));
            }
            _ => {
                return Err(p.error_at(p.next_token, "use clause is expected"));
            }
        }

        if p.next_token.kind == TokenKind::Comma {
            p.advance();
        } else {
            break;
        }
    }

    Ok(clauses)
}

/// ```text
/// use_directive ::= {} `use` <clauses>
/// ```
pub(crate) fn parse_use_directive(p: &mut Parser<'_>) -> Result<ast::UseDirective, ParseError> {
    p.advance();
    p.expect_current(TokenKind::UseKw)?;
    let keyword_range = p.current_token.range;

    let clauses = parse_use_clauses(p)?;

    let directive_range = Range::new(keyword_range.start, p.current_token.range.end);
    let mut location = Location::with_children(directive_range, 1);
    location.add_required_child("keyword", keyword_range);

    Ok(ast::UseDirective { clauses, location })
}
