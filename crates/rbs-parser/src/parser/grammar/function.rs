use rustc_hash::FxHashSet;

use crate::ast;
use crate::error::ParseError;
use crate::intern::ConstantId;
use crate::location::{Location, Range};
use crate::parser::grammar::is_keyword;
use crate::parser::grammar::type_params::parse_type_params;
use crate::parser::grammar::types::{parse_optional, parse_type};
use crate::parser::Parser;
use crate::unescape::unquote_string;
use crate::TokenKind;

/// Parameters accumulated by [`parse_params`], in phase order. `untyped` is
/// the `(?)` form, which has no parameter list at all.
#[derive(Default)]
struct MethodParams {
    required_positionals: Vec<ast::FunctionParam>,
    optional_positionals: Vec<ast::FunctionParam>,
    rest_positionals: Option<ast::FunctionParam>,
    trailing_positionals: Vec<ast::FunctionParam>,
    required_keywords: Vec<(ast::Symbol, ast::FunctionParam)>,
    optional_keywords: Vec<(ast::Symbol, ast::FunctionParam)>,
    rest_keywords: Option<ast::FunctionParam>,
    untyped: bool,
}

/// ```text
/// function_param ::= {} <type>
///                  | {} type <param>
/// ```
fn parse_function_param(p: &mut Parser<'_>) -> Result<ast::FunctionParam, ParseError> {
    let type_start = p.next_token.range.start;
    let ty = parse_type(p)?;
    let type_end = p.current_token.range.end;

    if matches!(p.next_token.kind, TokenKind::Comma | TokenKind::RParen) {
        let mut location = Location::with_children(Range::new(type_start, type_end), 1);
        location.add_optional_child("name", None);
        return Ok(ast::FunctionParam {
            ty,
            name: None,
            location,
        });
    }

    let name_range = p.next_token.range;
    p.advance();

    if !p.current_token.kind.is_keyword_name() {
        return Err(p.error_at(
            p.current_token,
            "unexpected token for function parameter name",
        ));
    }

    // The name may be a quoted identifier; intern its unescaped form.
    let unquoted = unquote_string(p.token_bytes(p.current_token), p.buffer().encoding());
    let name_id = p.pool.intern_owned(unquoted);
    let name = ast::Symbol {
        name: name_id,
        location: Location::new(p.current_token.range),
    };

    let mut location = Location::with_children(Range::new(type_start, name_range.end), 1);
    location.add_optional_child("name", Some(name_range));
    Ok(ast::FunctionParam {
        ty,
        name: Some(name),
        location,
    })
}

/// ```text
/// keyword_key ::= {} <keyword> `:`
///               | {} keyword <`?`> `:`
/// ```
///
/// For optional keywords the interned name includes the `?`; the symbol's
/// location covers just the identifier.
pub(crate) fn parse_keyword_key(p: &mut Parser<'_>) -> Result<ast::Symbol, ParseError> {
    p.advance();
    let location = Location::new(p.current_token.range);

    let name = if p.next_token.kind == TokenKind::Question {
        let merged = Range::new(p.current_token.range.start, p.next_token.range.end);
        let id = p.intern_range(merged);
        p.advance();
        id
    } else {
        p.intern_token(p.current_token)
    };

    Ok(ast::Symbol { name, location })
}

/// ```text
/// keyword ::= {} keyword `:` <function_param>
/// ```
fn parse_keyword(
    p: &mut Parser<'_>,
    keywords: &mut Vec<(ast::Symbol, ast::FunctionParam)>,
    memo: &mut FxHashSet<ConstantId>,
) -> Result<(), ParseError> {
    let key = parse_keyword_key(p)?;
    if !memo.insert(key.name) {
        return Err(p.error_at(p.current_token, "duplicated keyword argument"));
    }

    p.advance_expect(TokenKind::Colon)?;
    let param = parse_function_param(p)?;
    keywords.push((key, param));
    Ok(())
}

/// The six-phase walk through a parameter list:
///
/// ```text
/// params ::= {} `)`
///          | {} `?` `)`               -- untyped function params
///          | <required_params> `)`
///          | <required_params> `,` `)`
///
/// required_params ::= function_param `,` ... | <optional_params>
/// optional_params ::= `?` function_param `,` ... | <rest_params>
/// rest_params     ::= `*` function_param `,`? | <trailing_params>
/// trailing_params ::= function_param `,` ... | <keywords>
/// keywords        ::= keyword | `?` keyword | `**` function_param
/// ```
///
/// Leaves the closing `)` as the next token. Duplicate keyword names fail.
fn parse_params(p: &mut Parser<'_>, params: &mut MethodParams) -> Result<(), ParseError> {
    if p.next_token.kind == TokenKind::Question && p.next_token2.kind == TokenKind::RParen {
        params.untyped = true;
        p.advance();
        return Ok(());
    }
    if p.next_token.kind == TokenKind::RParen {
        return Ok(());
    }

    let mut memo: FxHashSet<ConstantId> = FxHashSet::default();

    enum Phase {
        Required,
        Optional,
        Rest,
        Trailing,
        Keywords,
    }
    let mut phase = Phase::Required;

    loop {
        match phase {
            Phase::Required => match p.next_token.kind {
                TokenKind::Question => phase = Phase::Optional,
                TokenKind::Star => phase = Phase::Rest,
                TokenKind::Star2 => phase = Phase::Keywords,
                TokenKind::RParen => break,
                _ => {
                    if is_keyword(p) {
                        phase = Phase::Keywords;
                        continue;
                    }
                    let param = parse_function_param(p)?;
                    params.required_positionals.push(param);
                    if !p.advance_if(TokenKind::Comma) {
                        break;
                    }
                }
            },

            Phase::Optional => match p.next_token.kind {
                TokenKind::Question => {
                    p.advance();
                    if is_keyword(p) {
                        parse_keyword(p, &mut params.optional_keywords, &mut memo)?;
                        p.advance_if(TokenKind::Comma);
                        phase = Phase::Keywords;
                        continue;
                    }
                    let param = parse_function_param(p)?;
                    params.optional_positionals.push(param);
                    if !p.advance_if(TokenKind::Comma) {
                        break;
                    }
                }
                _ => phase = Phase::Rest,
            },

            Phase::Rest => {
                if p.next_token.kind == TokenKind::Star {
                    p.advance();
                    let param = parse_function_param(p)?;
                    params.rest_positionals = Some(param);
                    if !p.advance_if(TokenKind::Comma) {
                        break;
                    }
                }
                phase = Phase::Trailing;
            }

            Phase::Trailing => match p.next_token.kind {
                TokenKind::Question | TokenKind::Star2 => phase = Phase::Keywords,
                TokenKind::Star | TokenKind::RParen => break,
                _ => {
                    if is_keyword(p) {
                        phase = Phase::Keywords;
                        continue;
                    }
                    let param = parse_function_param(p)?;
                    params.trailing_positionals.push(param);
                    if !p.advance_if(TokenKind::Comma) {
                        break;
                    }
                }
            },

            Phase::Keywords => match p.next_token.kind {
                TokenKind::Question => {
                    p.advance();
                    if !is_keyword(p) {
                        return Err(p.error_at(
                            p.next_token,
                            "optional keyword argument type is expected",
                        ));
                    }
                    parse_keyword(p, &mut params.optional_keywords, &mut memo)?;
                    if !p.advance_if(TokenKind::Comma) {
                        break;
                    }
                }
                TokenKind::Star2 => {
                    p.advance();
                    let param = parse_function_param(p)?;
                    params.rest_keywords = Some(param);
                    if !p.advance_if(TokenKind::Comma) {
                        break;
                    }
                }
                kind if kind.is_keyword_name() => {
                    if !is_keyword(p) {
                        return Err(p.error_at(
                            p.next_token,
                            "required keyword argument type is expected",
                        ));
                    }
                    parse_keyword(p, &mut params.required_keywords, &mut memo)?;
                    if !p.advance_if(TokenKind::Comma) {
                        break;
                    }
                }
                _ => break,
            },
        }
    }

    if p.next_token.kind != TokenKind::RParen {
        return Err(p.error_at(p.next_token, "unexpected token for method type parameters"));
    }
    Ok(())
}

/// ```text
/// self_type_binding ::= {} <>
///                     | {} `[` `self` `:` type <`]`>
/// ```
fn parse_self_type_binding(p: &mut Parser<'_>) -> Result<Option<ast::Type>, ParseError> {
    if p.next_token.kind != TokenKind::LBracket {
        return Ok(None);
    }
    p.advance();
    p.advance_expect(TokenKind::SelfKw)?;
    p.advance_expect(TokenKind::Colon)?;
    let ty = parse_type(p)?;
    p.advance_expect(TokenKind::RBracket)?;
    Ok(Some(ty))
}

pub(crate) struct FunctionParts {
    pub(crate) function: ast::Function,
    pub(crate) block: Option<ast::Block>,
    pub(crate) self_type: Option<ast::Type>,
}

/// ```text
/// function ::= {} `(` params `)` self_type_binding? block? `->` <optional>
///            | {} self_type_binding? block? `->` <optional>
///
/// block ::= `{` `(` params `)` self_type_binding? `->` optional `}`
///         | `?` `{` ... `}`                                 -- optional block
/// ```
///
/// `accept_type_binding` is true for proc types, where the function itself
/// may bind `self`; method types reject it here and handle `self` per block.
fn parse_function(
    p: &mut Parser<'_>,
    accept_type_binding: bool,
) -> Result<FunctionParts, ParseError> {
    let function_start = p.next_token.range.start;

    let mut params = MethodParams::default();
    if p.next_token.kind == TokenKind::LParen {
        p.advance();
        parse_params(p, &mut params)?;
        p.advance_expect(TokenKind::RParen)?;
    }

    let mut self_type = None;
    if accept_type_binding {
        self_type = parse_self_type_binding(p)?;
    } else if params.untyped && p.next_token.kind != TokenKind::Arrow {
        return Err(p.error_at(
            p.next_token,
            "a method type with untyped method parameter cannot have block",
        ));
    }

    let mut required = true;
    let mut block_start = None;
    if p.next_token.kind == TokenKind::Question && p.next_token2.kind == TokenKind::LBrace {
        // Optional block
        block_start = Some(p.next_token.range.start);
        required = false;
        p.advance();
    } else if p.next_token.kind == TokenKind::LBrace {
        block_start = Some(p.next_token.range.start);
    }

    let mut block = None;
    if p.next_token.kind == TokenKind::LBrace {
        p.advance();

        let mut block_params = MethodParams::default();
        if p.next_token.kind == TokenKind::LParen {
            p.advance();
            parse_params(p, &mut block_params)?;
            p.advance_expect(TokenKind::RParen)?;
        }

        let block_self_type = parse_self_type_binding(p)?;

        p.advance_expect(TokenKind::Arrow)?;
        let block_return = parse_optional(p)?;
        p.advance_expect(TokenKind::RBrace)?;

        let block_range = Range::new(
            block_start.expect("a `{` was seen, so the block start is set"),
            p.current_token.range.end,
        );
        let block_function = build_function(block_params, block_return, block_range);
        block = Some(ast::Block {
            function: block_function,
            required,
            self_type: block_self_type,
            location: Location::new(block_range),
        });
    }

    p.advance_expect(TokenKind::Arrow)?;
    let return_type = parse_optional(p)?;

    let function_range = Range::new(function_start, p.current_token.range.end);
    let function = build_function(params, return_type, function_range);

    Ok(FunctionParts {
        function,
        block,
        self_type,
    })
}

fn build_function(params: MethodParams, return_type: ast::Type, range: Range) -> ast::Function {
    let location = Location::new(range);
    if params.untyped {
        return ast::Function::Untyped(ast::UntypedFunction {
            return_type: Box::new(return_type),
            location,
        });
    }
    ast::Function::Typed(ast::TypedFunction {
        required_positionals: params.required_positionals,
        optional_positionals: params.optional_positionals,
        rest_positionals: params.rest_positionals.map(Box::new),
        trailing_positionals: params.trailing_positionals,
        required_keywords: params.required_keywords,
        optional_keywords: params.optional_keywords,
        rest_keywords: params.rest_keywords.map(Box::new),
        return_type: Box::new(return_type),
        location,
    })
}

/// ```text
/// proc_type ::= {`^`} <function>
/// ```
pub(crate) fn parse_proc_type(p: &mut Parser<'_>) -> Result<ast::ProcType, ParseError> {
    let start = p.current_token.range.start;
    let parts = parse_function(p, true)?;
    let range = Range::new(start, p.current_token.range.end);
    Ok(ast::ProcType {
        function: parts.function,
        block: parts.block.map(Box::new),
        self_type: parts.self_type.map(Box::new),
        location: Location::new(range),
    })
}

/// ```text
/// method_type ::= {} type_params <function>
/// ```
///
/// Type variables bound by the `[...]` list are visible inside the function,
/// nested within whatever the surrounding declaration bound.
pub(crate) fn parse_method_type(p: &mut Parser<'_>) -> Result<ast::MethodType, ParseError> {
    p.push_typevars(false);

    let start = p.next_token.range.start;
    let (type_params, params_range) = parse_type_params(p, false)?;

    let type_start = p.next_token.range.start;
    let parts = parse_function(p, false)?;

    p.pop_typevars();

    let end = p.current_token.range.end;
    let mut location = Location::with_children(Range::new(start, end), 2);
    location.add_required_child("type", Range::new(type_start, end));
    location.add_optional_child("type_params", params_range);

    Ok(ast::MethodType {
        type_params,
        function: parts.function,
        block: parts.block,
        location,
    })
}
