use crate::ast;
use crate::error::ParseError;
use crate::location::{Location, Range};
use crate::parser::grammar::types::parse_type;
use crate::parser::Parser;
use crate::TokenKind;

/// ```text
/// type_params ::= {} `[` type_param `,` ... <`]`>
///               | {<>}
///
/// type_param ::= kUNCHECKED? (kIN|kOUT|) tUIDENT upper_bound? default_type?
///                                               (module_type_params == true)
/// type_param ::= tUIDENT upper_bound? default_type?
///                                               (module_type_params == false)
/// ```
///
/// Every parsed parameter is bound as a type variable in the innermost
/// scope, visible to its own bound and default. Once a parameter has a
/// default, all following parameters must have one too.
///
/// Returns the parameters and the range of the whole `[...]` list, `None`
/// when there is no list.
pub(crate) fn parse_type_params(
    p: &mut Parser<'_>,
    module_type_params: bool,
) -> Result<(Vec<ast::TypeParam>, Option<Range>), ParseError> {
    let mut params = Vec::new();

    if p.next_token.kind != TokenKind::LBracket {
        return Ok((params, None));
    }
    p.advance();
    let list_start = p.current_token.range.start;

    let mut required_param_allowed = true;

    loop {
        let param_start = p.next_token.range.start;

        let mut unchecked = false;
        let mut unchecked_range = None;
        let mut variance = ast::Variance::Invariant;
        let mut variance_range = None;

        if module_type_params {
            if p.next_token.kind == TokenKind::UncheckedKw {
                unchecked = true;
                p.advance();
                unchecked_range = Some(p.current_token.range);
            }

            match p.next_token.kind {
                TokenKind::InKw => {
                    variance = ast::Variance::Contravariant;
                    p.advance();
                    variance_range = Some(p.current_token.range);
                }
                TokenKind::OutKw => {
                    variance = ast::Variance::Covariant;
                    p.advance();
                    variance_range = Some(p.current_token.range);
                }
                _ => {}
            }
        }

        p.advance_expect(TokenKind::Uident)?;
        let name_range = p.current_token.range;
        let name = p.symbol_from_token(p.current_token);
        p.insert_typevar(name.name)?;

        let mut upper_bound = None;
        let mut upper_bound_range = None;
        if p.next_token.kind == TokenKind::Lt {
            p.advance();
            let bound_start = p.next_token.range.start;
            upper_bound = Some(parse_type(p)?);
            upper_bound_range = Some(Range::new(bound_start, p.current_token.range.end));
        }

        let mut default_type = None;
        let mut default_type_range = None;
        if module_type_params {
            if p.next_token.kind == TokenKind::Eq {
                p.advance();
                let default_start = p.next_token.range.start;
                default_type = Some(parse_type(p)?);
                default_type_range = Some(Range::new(default_start, p.current_token.range.end));
                required_param_allowed = false;
            } else if !required_param_allowed {
                return Err(p.error_at(
                    p.current_token,
                    "required type parameter is not allowed after optional type parameter",
                ));
            }
        }

        let param_range = Range::new(param_start, p.current_token.range.end);
        let mut location = Location::with_children(param_range, 5);
        location.add_required_child("name", name_range);
        location.add_optional_child("variance", variance_range);
        location.add_optional_child("unchecked", unchecked_range);
        location.add_optional_child("upper_bound", upper_bound_range);
        location.add_optional_child("default", default_type_range);

        params.push(ast::TypeParam {
            name,
            variance,
            upper_bound,
            default_type,
            unchecked,
            location,
        });

        if p.next_token.kind == TokenKind::Comma {
            p.advance();
        }
        if p.next_token.kind == TokenKind::RBracket {
            break;
        }
    }

    p.advance_expect(TokenKind::RBracket)?;
    let list_range = Range::new(list_start, p.current_token.range.end);
    Ok((params, Some(list_range)))
}
