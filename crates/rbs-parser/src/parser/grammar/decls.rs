use triomphe::Arc;

use crate::ast;
use crate::error::ParseError;
use crate::location::{Location, Position, Range};
use crate::parser::grammar::directives::parse_use_directive;
use crate::parser::grammar::members::{
    class_instance_name, parse_interface_members, parse_module_members,
};
use crate::parser::grammar::name::parse_type_name;
use crate::parser::grammar::type_params::parse_type_params;
use crate::parser::grammar::types::{parse_type, parse_type_list};
use crate::parser::grammar::TypeNameKind;
use crate::parser::Parser;
use crate::TokenKind;

/// ```text
/// annotation ::= {<tANNOTATION>}
/// ```
///
/// The token text is `%a` plus one of the delimiter pairs `{} () [] <> ||`;
/// the stored string is the trimmed body.
fn parse_annotation(p: &mut Parser<'_>) -> ast::Annotation {
    let token = p.current_token;
    let bytes = p.token_bytes(token);

    // %a{...}: two marker bytes, one opening and one closing delimiter.
    let body = &bytes[3..bytes.len() - 1];
    let trimmed = trim_ascii_whitespace(body);

    ast::Annotation {
        string: trimmed.to_vec().into_boxed_slice(),
        location: Location::new(token.range),
    }
}

fn trim_ascii_whitespace(mut bytes: &[u8]) -> &[u8] {
    while let [first, rest @ ..] = bytes {
        if first.is_ascii_whitespace() {
            bytes = rest;
        } else {
            break;
        }
    }
    while let [rest @ .., last] = bytes {
        if last.is_ascii_whitespace() {
            bytes = rest;
        } else {
            break;
        }
    }
    bytes
}

/// ```text
/// annotations ::= {} annotation ... <annotation>
///               | {<>}
/// ```
///
/// Also reports where the first annotation started, so comment attachment
/// can use the annotation line rather than the declaration line.
pub(crate) fn parse_annotations(
    p: &mut Parser<'_>,
) -> Result<(Vec<ast::Annotation>, Option<Position>), ParseError> {
    let mut annotations = Vec::new();
    let mut annot_pos = None;

    while p.next_token.kind == TokenKind::Annotation {
        p.advance();
        if annot_pos.is_none() {
            annot_pos = Some(p.current_token.range.start);
        }
        annotations.push(parse_annotation(p));
    }

    Ok((annotations, annot_pos))
}

/// ```text
/// global_decl ::= {tGIDENT} `:` <type>
/// ```
fn parse_global_decl(
    p: &mut Parser<'_>,
    annotations: Vec<ast::Annotation>,
) -> Result<ast::GlobalDecl, ParseError> {
    let decl_start = p.current_token.range.start;
    let comment = p.comment_for(decl_start.line);

    let name_range = p.current_token.range;
    let name = p.symbol_from_token(p.current_token);

    p.advance_expect(TokenKind::Colon)?;
    let colon_range = p.current_token.range;

    let ty = parse_type(p)?;
    let decl_range = Range::new(decl_start, p.current_token.range.end);

    let mut location = Location::with_children(decl_range, 2);
    location.add_required_child("name", name_range);
    location.add_required_child("colon", colon_range);

    Ok(ast::GlobalDecl {
        name,
        ty,
        annotations,
        comment,
        location,
    })
}

/// ```text
/// const_decl ::= {const_name} `:` <type>
/// ```
fn parse_const_decl(
    p: &mut Parser<'_>,
    annotations: Vec<ast::Annotation>,
) -> Result<ast::ConstantDecl, ParseError> {
    let decl_start = p.current_token.range.start;
    let comment = p.comment_for(decl_start.line);

    let (name, name_range, _) = parse_type_name(p, TypeNameKind::CLASS)?;

    p.advance_expect(TokenKind::Colon)?;
    let colon_range = p.current_token.range;

    let ty = parse_type(p)?;
    let decl_range = Range::new(decl_start, p.current_token.range.end);

    let mut location = Location::with_children(decl_range, 2);
    location.add_required_child("name", name_range);
    location.add_required_child("colon", colon_range);

    Ok(ast::ConstantDecl {
        name,
        ty,
        annotations,
        comment,
        location,
    })
}

/// ```text
/// type_decl ::= {kTYPE} alias_name type_params `=` <type>
/// ```
fn parse_type_decl(
    p: &mut Parser<'_>,
    comment_pos: Option<Position>,
    annotations: Vec<ast::Annotation>,
) -> Result<ast::TypeAliasDecl, ParseError> {
    p.push_typevars(true);

    let decl_start = p.current_token.range.start;
    let comment_pos = comment_pos.unwrap_or(decl_start);
    let keyword_range = p.current_token.range;

    p.advance();
    let (name, name_range, _) = parse_type_name(p, TypeNameKind::ALIAS)?;

    let (type_params, params_range) = parse_type_params(p, true)?;

    p.advance_expect(TokenKind::Eq)?;
    let eq_range = p.current_token.range;

    let ty = parse_type(p)?;
    let decl_range = Range::new(decl_start, p.current_token.range.end);

    let mut location = Location::with_children(decl_range, 4);
    location.add_required_child("keyword", keyword_range);
    location.add_required_child("name", name_range);
    location.add_optional_child("type_params", params_range);
    location.add_required_child("eq", eq_range);

    p.pop_typevars();

    let comment = p.comment_for(comment_pos.line);

    Ok(ast::TypeAliasDecl {
        name,
        type_params,
        ty,
        annotations,
        comment,
        location,
    })
}

/// ```text
/// interface_decl ::= {`interface`} interface_name module_type_params
///                    interface_members <kEND>
/// ```
fn parse_interface_decl(
    p: &mut Parser<'_>,
    comment_pos: Option<Position>,
    annotations: Vec<ast::Annotation>,
) -> Result<ast::InterfaceDecl, ParseError> {
    p.push_typevars(true);

    let decl_start = p.current_token.range.start;
    let comment_pos = comment_pos.unwrap_or(decl_start);
    let keyword_range = p.current_token.range;

    p.advance();
    let (name, name_range, _) = parse_type_name(p, TypeNameKind::INTERFACE)?;

    let (type_params, params_range) = parse_type_params(p, true)?;

    let members = parse_interface_members(p)?;

    p.advance_expect(TokenKind::EndKw)?;
    let end_range = p.current_token.range;
    let decl_range = Range::new(decl_start, end_range.end);

    p.pop_typevars();

    let mut location = Location::with_children(decl_range, 4);
    location.add_required_child("keyword", keyword_range);
    location.add_required_child("name", name_range);
    location.add_required_child("end", end_range);
    location.add_optional_child("type_params", params_range);

    let comment = p.comment_for(comment_pos.line);

    Ok(ast::InterfaceDecl {
        name,
        type_params,
        members,
        annotations,
        comment,
        location,
    })
}

/// ```text
/// module_self_types ::= {`:`} module_self_type `,` ... `,` <module_self_type>
///
/// module_self_type ::= <module_name>
///                    | module_name `[` type_list <`]`>
/// ```
fn parse_module_self_types(p: &mut Parser<'_>) -> Result<Vec<ast::ModuleSelf>, ParseError> {
    let mut self_types = Vec::new();

    loop {
        p.advance();

        let self_start = p.current_token.range.start;
        let (name, name_range, _) =
            parse_type_name(p, TypeNameKind::CLASS | TypeNameKind::INTERFACE)?;
        let mut self_end = name_range.end;

        let mut args = Vec::new();
        let mut args_range = None;
        if p.next_token.kind == TokenKind::LBracket {
            p.advance();
            let args_start = p.current_token.range.start;
            args = parse_type_list(p, TokenKind::RBracket)?;
            p.advance_expect(TokenKind::RBracket)?;
            let range = Range::new(args_start, p.current_token.range.end);
            args_range = Some(range);
            self_end = range.end;
        }

        let self_range = Range::new(self_start, self_end);
        let mut location = Location::with_children(self_range, 2);
        location.add_required_child("name", name_range);
        location.add_optional_child("args", args_range);

        self_types.push(ast::ModuleSelf {
            name,
            args,
            location,
        });

        if p.next_token.kind == TokenKind::Comma {
            p.advance();
        } else {
            break;
        }
    }

    Ok(self_types)
}

/// ```text
/// module_decl ::= {module_name} module_type_params module_members <kEND>
///               | {module_name} module_type_params `:` module_self_types
///                 module_members <kEND>
/// ```
fn parse_module_body(
    p: &mut Parser<'_>,
    keyword_range: Range,
    name: ast::TypeName,
    name_range: Range,
    comment: Option<ast::Comment>,
    annotations: Vec<ast::Annotation>,
) -> Result<ast::ModuleDecl, ParseError> {
    p.push_typevars(true);

    let (type_params, params_range) = parse_type_params(p, true)?;

    let mut self_types = Vec::new();
    let mut colon_range = None;
    let mut self_types_range = None;
    if p.next_token.kind == TokenKind::Colon {
        p.advance();
        colon_range = Some(p.current_token.range);
        let self_start = p.next_token.range.start;
        self_types = parse_module_self_types(p)?;
        self_types_range = Some(Range::new(self_start, p.current_token.range.end));
    }

    let members = parse_module_members(p)?;

    p.advance_expect(TokenKind::EndKw)?;
    let end_range = p.current_token.range;
    let decl_range = Range::new(keyword_range.start, end_range.end);

    let mut location = Location::with_children(decl_range, 6);
    location.add_required_child("keyword", keyword_range);
    location.add_required_child("name", name_range);
    location.add_required_child("end", end_range);
    location.add_optional_child("type_params", params_range);
    location.add_optional_child("colon", colon_range);
    location.add_optional_child("self_types", self_types_range);

    p.pop_typevars();

    Ok(ast::ModuleDecl {
        name,
        type_params,
        self_types,
        members,
        annotations,
        comment,
        location,
    })
}

/// ```text
/// module_decl ::= {`module`} module_name `=` old_module_name
///               | {`module`} module_name module_decl0 <kEND>
/// ```
fn parse_module_decl(
    p: &mut Parser<'_>,
    comment_pos: Option<Position>,
    annotations: Vec<ast::Annotation>,
) -> Result<ast::Declaration, ParseError> {
    let keyword_range = p.current_token.range;
    let comment_pos = comment_pos.unwrap_or(keyword_range.start);
    let comment = p.comment_for(comment_pos.line);

    p.advance();
    let (name, name_range, _) = parse_type_name(p, TypeNameKind::CLASS)?;

    if p.next_token.kind == TokenKind::Eq {
        let eq_range = p.next_token.range;
        p.advance();
        p.advance();

        let (old_name, old_name_range, _) = parse_type_name(p, TypeNameKind::CLASS)?;
        let decl_range = Range::new(keyword_range.start, old_name_range.end);

        let mut location = Location::with_children(decl_range, 4);
        location.add_required_child("keyword", keyword_range);
        location.add_required_child("new_name", name_range);
        location.add_required_child("eq", eq_range);
        location.add_optional_child("old_name", Some(old_name_range));

        Ok(ast::Declaration::ModuleAlias(ast::ModuleAliasDecl {
            new_name: name,
            old_name,
            annotations,
            comment,
            location,
        }))
    } else {
        let module = parse_module_body(p, keyword_range, name, name_range, comment, annotations)?;
        Ok(ast::Declaration::Module(module))
    }
}

/// ```text
/// class_decl_super ::= {} `<` <class_instance_name>
///                    | {<>}
/// ```
fn parse_class_super(
    p: &mut Parser<'_>,
) -> Result<(Option<ast::ClassSuper>, Option<Range>), ParseError> {
    if !p.advance_if(TokenKind::Lt) {
        return Ok((None, None));
    }
    let lt_range = p.current_token.range;

    let super_start = p.next_token.range.start;
    let (name, name_range, args, args_range) = class_instance_name(p, TypeNameKind::CLASS)?;
    let super_range = Range::new(super_start, p.current_token.range.end);

    let mut location = Location::with_children(super_range, 2);
    location.add_required_child("name", name_range);
    location.add_optional_child("args", args_range);

    Ok((
        Some(ast::ClassSuper {
            name,
            args,
            location,
        }),
        Some(lt_range),
    ))
}

/// ```text
/// class_decl ::= {class_name} type_params class_decl_super class_members
///                <`end`>
/// ```
fn parse_class_body(
    p: &mut Parser<'_>,
    keyword_range: Range,
    name: ast::TypeName,
    name_range: Range,
    comment: Option<ast::Comment>,
    annotations: Vec<ast::Annotation>,
) -> Result<ast::ClassDecl, ParseError> {
    p.push_typevars(true);

    let (type_params, params_range) = parse_type_params(p, true)?;
    let (super_class, lt_range) = parse_class_super(p)?;

    let members = parse_module_members(p)?;

    p.advance_expect(TokenKind::EndKw)?;
    let end_range = p.current_token.range;
    let decl_range = Range::new(keyword_range.start, end_range.end);

    p.pop_typevars();

    let mut location = Location::with_children(decl_range, 5);
    location.add_required_child("keyword", keyword_range);
    location.add_required_child("name", name_range);
    location.add_required_child("end", end_range);
    location.add_optional_child("type_params", params_range);
    location.add_optional_child("lt", lt_range);

    Ok(ast::ClassDecl {
        name,
        type_params,
        super_class,
        members,
        annotations,
        comment,
        location,
    })
}

/// ```text
/// class_decl ::= {`class`} class_name `=` <class_name>
///              | {`class`} class_name <class_decl0>
/// ```
fn parse_class_decl(
    p: &mut Parser<'_>,
    comment_pos: Option<Position>,
    annotations: Vec<ast::Annotation>,
) -> Result<ast::Declaration, ParseError> {
    let keyword_range = p.current_token.range;
    let comment_pos = comment_pos.unwrap_or(keyword_range.start);
    let comment = p.comment_for(comment_pos.line);

    p.advance();
    let (name, name_range, _) = parse_type_name(p, TypeNameKind::CLASS)?;

    if p.next_token.kind == TokenKind::Eq {
        let eq_range = p.next_token.range;
        p.advance();
        p.advance();

        let (old_name, old_name_range, _) = parse_type_name(p, TypeNameKind::CLASS)?;
        let decl_range = Range::new(keyword_range.start, old_name_range.end);

        let mut location = Location::with_children(decl_range, 4);
        location.add_required_child("keyword", keyword_range);
        location.add_required_child("new_name", name_range);
        location.add_required_child("eq", eq_range);
        location.add_optional_child("old_name", Some(old_name_range));

        Ok(ast::Declaration::ClassAlias(ast::ClassAliasDecl {
            new_name: name,
            old_name,
            annotations,
            comment,
            location,
        }))
    } else {
        let class = parse_class_body(p, keyword_range, name, name_range, comment, annotations)?;
        Ok(ast::Declaration::Class(class))
    }
}

/// ```text
/// nested_decl ::= {<const_decl>} | {<global_decl>} | {<type_decl>}
///               | {<interface_decl>} | {<module_decl>} | {<class_decl>}
/// ```
///
/// Nested declarations live in their own type-variable scope; the enclosing
/// declaration's variables are not visible inside.
pub(crate) fn parse_nested_decl(
    p: &mut Parser<'_>,
    annot_pos: Option<Position>,
    annotations: Vec<ast::Annotation>,
) -> Result<ast::Declaration, ParseError> {
    p.push_typevars(true);
    let decl = parse_current_decl(p, annot_pos, annotations)?;
    p.pop_typevars();
    Ok(decl)
}

fn parse_current_decl(
    p: &mut Parser<'_>,
    annot_pos: Option<Position>,
    annotations: Vec<ast::Annotation>,
) -> Result<ast::Declaration, ParseError> {
    match p.current_token.kind {
        TokenKind::Uident | TokenKind::Colon2 => {
            Ok(ast::Declaration::Constant(parse_const_decl(p, annotations)?))
        }
        TokenKind::Gident => Ok(ast::Declaration::Global(parse_global_decl(p, annotations)?)),
        TokenKind::TypeKw => Ok(ast::Declaration::TypeAlias(parse_type_decl(
            p,
            annot_pos,
            annotations,
        )?)),
        TokenKind::InterfaceKw => Ok(ast::Declaration::Interface(parse_interface_decl(
            p,
            annot_pos,
            annotations,
        )?)),
        TokenKind::ModuleKw => parse_module_decl(p, annot_pos, annotations),
        TokenKind::ClassKw => parse_class_decl(p, annot_pos, annotations),
        _ => Err(p.error_at(p.current_token, "cannot start a declaration")),
    }
}

/// ```text
/// decl ::= annotation* (const | global | alias | interface | module | class)
/// ```
fn parse_decl(p: &mut Parser<'_>) -> Result<ast::Declaration, ParseError> {
    let (annotations, annot_pos) = parse_annotations(p)?;
    p.advance();
    parse_current_decl(p, annot_pos, annotations)
}

/// ```text
/// signature ::= {} use_directive* decl* <pEOF>
/// ```
pub(crate) fn parse_signature(p: &mut Parser<'_>) -> Result<ast::Signature, ParseError> {
    let start = p.current_token.range.start;

    let mut directives = Vec::new();
    while p.next_token.kind == TokenKind::UseKw {
        directives.push(parse_use_directive(p)?);
    }

    let mut declarations = Vec::new();
    while p.next_token.kind != TokenKind::Eof {
        declarations.push(Arc::new(parse_decl(p)?));
    }

    let range = Range::new(start, p.current_token.range.end);
    Ok(ast::Signature {
        directives,
        declarations,
        location: Location::new(range),
    })
}
