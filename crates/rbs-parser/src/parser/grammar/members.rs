use triomphe::Arc;

use crate::ast;
use crate::error::ParseError;
use crate::location::{Location, Position, Range};
use crate::parser::grammar::decls::{parse_annotations, parse_nested_decl};
use crate::parser::grammar::function::parse_method_type;
use crate::parser::grammar::name::parse_type_name;
use crate::parser::grammar::types::{parse_type, parse_type_list};
use crate::parser::grammar::TypeNameKind;
use crate::parser::Parser;
use crate::TokenKind;

/// ```text
/// method_name ::= {} <IDENT | keyword | OPERATOR>
///               | {} (IDENT | keyword)~<`?`>
/// ```
///
/// A `?` glued to the identifier is folded into the name (`empty?`); quoted
/// names are unescaped before interning.
fn parse_method_name(p: &mut Parser<'_>) -> Result<(ast::Symbol, Range), ParseError> {
    p.advance();

    let token = p.current_token;
    match token.kind {
        kind if kind.is_keyword() || matches!(
            kind,
            TokenKind::Uident | TokenKind::Lident | TokenKind::Ulident | TokenKind::Ullident
        ) =>
        {
            if p.next_token.kind == TokenKind::Question
                && token.range.end.byte_pos == p.next_token.range.start.byte_pos
            {
                let range = Range::new(token.range.start, p.next_token.range.end);
                p.advance();
                let name = p.intern_range(range);
                let symbol = ast::Symbol {
                    name,
                    location: Location::new(range),
                };
                Ok((symbol, range))
            } else {
                Ok((p.symbol_from_token(token), token.range))
            }
        }
        TokenKind::BangIdent | TokenKind::EqIdent => Ok((p.symbol_from_token(token), token.range)),
        TokenKind::Qident => {
            let unquoted =
                crate::unescape::unquote_string(p.token_bytes(token), p.buffer().encoding());
            let name = p.pool.intern_owned(unquoted);
            let symbol = ast::Symbol {
                name,
                location: Location::new(token.range),
            };
            Ok((symbol, token.range))
        }
        TokenKind::Bar
        | TokenKind::Hat
        | TokenKind::Amp
        | TokenKind::Star
        | TokenKind::Star2
        | TokenKind::Lt
        | TokenKind::ArefOperator
        | TokenKind::Operator => Ok((p.symbol_from_token(token), token.range)),
        _ => Err(p.error_at(token, "unexpected token for method name")),
    }
}

/// ```text
/// instance_singleton_kind ::= {<>}
///                           | {} kSELF <`.`>
///                           | {} kSELF~`?` <`.`>
/// ```
///
/// `allow_selfq` accepts the `self?.` form, which is rejected after a
/// visibility modifier.
fn parse_instance_singleton_kind(
    p: &mut Parser<'_>,
    allow_selfq: bool,
) -> (ast::MethodKind, Option<Range>) {
    if p.next_token.kind != TokenKind::SelfKw {
        return (ast::MethodKind::Instance, None);
    }
    let self_start = p.next_token.range.start;

    if p.next_token2.kind == TokenKind::Dot {
        p.advance();
        p.advance();
        let range = Range::new(self_start, p.current_token.range.end);
        (ast::MethodKind::Singleton, Some(range))
    } else if allow_selfq
        && p.next_token2.kind == TokenKind::Question
        && p.next_token.range.end.char_pos == p.next_token2.range.start.char_pos
        && p.next_token3.kind == TokenKind::Dot
    {
        p.advance();
        p.advance();
        p.advance();
        let range = Range::new(self_start, p.current_token.range.end);
        (ast::MethodKind::SingletonInstance, Some(range))
    } else {
        (ast::MethodKind::Instance, None)
    }
}

/// ```text
/// def_member ::= {kDEF} method_name `:` <method_types>
///              | {kPRIVATE} kDEF method_name `:` <method_types>
///              | {kPUBLIC} kDEF method_name `:` <method_types>
///
/// method_types ::= {} <method_type>
///                | {} <`...`>
///                | {} method_type `|` <method_types>
/// ```
///
/// `instance_only` rejects `self.`/`self?.` kinds (interfaces);
/// `accept_overload` permits the trailing `...` open-overload marker.
pub(crate) fn parse_member_def(
    p: &mut Parser<'_>,
    instance_only: bool,
    accept_overload: bool,
    comment_pos: Option<Position>,
    annotations: Vec<ast::Annotation>,
) -> Result<ast::MethodDefinition, ParseError> {
    let mut member_start = p.current_token.range.start;
    let comment_pos = comment_pos.unwrap_or(member_start);
    let comment = p.comment_for(comment_pos.line);

    let mut visibility = None;
    let mut visibility_range = None;
    match p.current_token.kind {
        TokenKind::PrivateKw => {
            visibility = Some(ast::Visibility::Private);
            visibility_range = Some(p.current_token.range);
            member_start = p.current_token.range.start;
            p.advance();
        }
        TokenKind::PublicKw => {
            visibility = Some(ast::Visibility::Public);
            visibility_range = Some(p.current_token.range);
            member_start = p.current_token.range.start;
            p.advance();
        }
        _ => {}
    }

    let keyword_range = p.current_token.range;

    let (kind, kind_range) = if instance_only {
        (ast::MethodKind::Instance, None)
    } else {
        parse_instance_singleton_kind(p, visibility.is_none())
    };

    let (name, name_range) = parse_method_name(p)?;

    if p.next_token.kind == TokenKind::Dot && p.constant_pool().resolve(name.name) == b"self?" {
        return Err(p.error_at(p.next_token, "`self?` method cannot have visibility"));
    }
    p.advance_expect(TokenKind::Colon)?;

    p.push_typevars(kind != ast::MethodKind::Instance);

    let mut overloads = Vec::new();
    let mut overloading = false;
    let mut overloading_range = None;
    let mut member_end;
    loop {
        let (overload_annotations, _) = parse_annotations(p)?;
        let overload_start = p.next_token.range.start;

        match p.next_token.kind {
            TokenKind::LParen
            | TokenKind::Arrow
            | TokenKind::LBrace
            | TokenKind::LBracket
            | TokenKind::Question => {
                let method_type = parse_method_type(p)?;
                member_end = p.current_token.range.end;
                let overload_range = Range::new(overload_start, member_end);
                overloads.push(ast::Overload {
                    annotations: overload_annotations,
                    method_type,
                    location: Location::new(overload_range),
                });
            }
            TokenKind::Dot3 => {
                if !accept_overload {
                    return Err(
                        p.error_at(p.next_token, "unexpected overloading method definition")
                    );
                }
                overloading = true;
                p.advance();
                overloading_range = Some(p.current_token.range);
                member_end = p.current_token.range.end;
                break;
            }
            _ => {
                return Err(p.error_at(p.next_token, "unexpected token for method type"));
            }
        }

        if p.next_token.kind == TokenKind::Bar {
            p.advance();
        } else {
            break;
        }
    }

    p.pop_typevars();

    let member_range = Range::new(member_start, member_end);
    let mut location = Location::with_children(member_range, 5);
    location.add_required_child("keyword", keyword_range);
    location.add_required_child("name", name_range);
    location.add_optional_child("kind", kind_range);
    location.add_optional_child("overloading", overloading_range);
    location.add_optional_child("visibility", visibility_range);

    Ok(ast::MethodDefinition {
        name,
        kind,
        overloads,
        overloading,
        annotations,
        comment,
        visibility,
        location,
    })
}

/// ```text
/// class_instance_name ::= {} <class_name>
///                       | {} class_name `[` type args <`]`>
/// ```
pub(crate) fn class_instance_name(
    p: &mut Parser<'_>,
    kind: TypeNameKind,
) -> Result<(ast::TypeName, Range, Vec<ast::Type>, Option<Range>), ParseError> {
    p.advance();
    let (name, name_range, _) = parse_type_name(p, kind)?;

    let mut args = Vec::new();
    let mut args_range = None;
    if p.next_token.kind == TokenKind::LBracket {
        p.advance();
        let args_start = p.current_token.range.start;
        args = parse_type_list(p, TokenKind::RBracket)?;
        p.advance_expect(TokenKind::RBracket)?;
        args_range = Some(Range::new(args_start, p.current_token.range.end));
    }

    Ok((name, name_range, args, args_range))
}

/// ```text
/// mixin_member ::= {kINCLUDE} <class_instance_name>
///                | {kPREPEND} <class_instance_name>
///                | {kEXTEND} <class_instance_name>
/// ```
///
/// Interfaces only accept `include`. `extend` resolves its arguments outside
/// the declaration's type variables (they refer to the singleton).
pub(crate) fn parse_mixin_member(
    p: &mut Parser<'_>,
    from_interface: bool,
    comment_pos: Option<Position>,
    annotations: Vec<ast::Annotation>,
) -> Result<ast::Member, ParseError> {
    let member_start = p.current_token.range.start;
    let comment_pos = comment_pos.unwrap_or(member_start);
    let keyword = p.current_token.kind;
    let keyword_range = p.current_token.range;

    if from_interface && keyword != TokenKind::IncludeKw {
        return Err(p.error_at(
            p.current_token,
            "unexpected mixin in interface declaration",
        ));
    }

    let reset_typevar_scope = keyword == TokenKind::ExtendKw;
    p.push_typevars(reset_typevar_scope);

    let name_kind = if from_interface {
        TypeNameKind::INTERFACE
    } else {
        TypeNameKind::INTERFACE | TypeNameKind::CLASS
    };
    let (name, name_range, args, args_range) = class_instance_name(p, name_kind)?;

    p.pop_typevars();

    let member_range = Range::new(member_start, p.current_token.range.end);
    let mut location = Location::with_children(member_range, 3);
    location.add_required_child("name", name_range);
    location.add_required_child("keyword", keyword_range);
    location.add_optional_child("args", args_range);

    let comment = p.comment_for(comment_pos.line);
    let mixin = ast::Mixin {
        name,
        args,
        annotations,
        comment,
        location,
    };

    Ok(match keyword {
        TokenKind::IncludeKw => ast::Member::Include(mixin),
        TokenKind::ExtendKw => ast::Member::Extend(mixin),
        TokenKind::PrependKw => ast::Member::Prepend(mixin),
        _ => unreachable!("mixin members start with include/extend/prepend"),
    })
}

/// ```text
/// alias_member ::= {kALIAS} method_name <method_name>
///                | {kALIAS} kSELF `.` method_name kSELF `.` <method_name>
/// ```
pub(crate) fn parse_alias_member(
    p: &mut Parser<'_>,
    instance_only: bool,
    comment_pos: Option<Position>,
    annotations: Vec<ast::Annotation>,
) -> Result<ast::AliasMember, ParseError> {
    let member_start = p.current_token.range.start;
    let keyword_range = p.current_token.range;
    let comment_pos = comment_pos.unwrap_or(member_start);
    let comment = p.comment_for(comment_pos.line);

    let kind;
    let new_name;
    let old_name;
    let new_name_range;
    let old_name_range;
    let mut new_kind_range = None;
    let mut old_kind_range = None;

    if !instance_only && p.next_token.kind == TokenKind::SelfKw {
        kind = ast::MethodKind::Singleton;

        new_kind_range = Some(Range::new(
            p.next_token.range.start,
            p.next_token2.range.end,
        ));
        p.advance_expect(TokenKind::SelfKw)?;
        p.advance_expect(TokenKind::Dot)?;
        let (symbol, range) = parse_method_name(p)?;
        new_name = symbol;
        new_name_range = range;

        old_kind_range = Some(Range::new(
            p.next_token.range.start,
            p.next_token2.range.end,
        ));
        p.advance_expect(TokenKind::SelfKw)?;
        p.advance_expect(TokenKind::Dot)?;
        let (symbol, range) = parse_method_name(p)?;
        old_name = symbol;
        old_name_range = range;
    } else {
        kind = ast::MethodKind::Instance;
        let (symbol, range) = parse_method_name(p)?;
        new_name = symbol;
        new_name_range = range;
        let (symbol, range) = parse_method_name(p)?;
        old_name = symbol;
        old_name_range = range;
    }

    let member_range = Range::new(member_start, p.current_token.range.end);
    let mut location = Location::with_children(member_range, 5);
    location.add_required_child("keyword", keyword_range);
    location.add_required_child("new_name", new_name_range);
    location.add_required_child("old_name", old_name_range);
    location.add_optional_child("new_kind", new_kind_range);
    location.add_optional_child("old_kind", old_kind_range);

    Ok(ast::AliasMember {
        new_name,
        old_name,
        kind,
        annotations,
        comment,
        location,
    })
}

/// ```text
/// variable_member ::= {tAIDENT} `:` <type>
///                   | {tA2IDENT} `:` <type>
///                   | {kSELF} `.` tAIDENT `:` <type>
/// ```
///
/// Class variables and class-instance variables resolve their types outside
/// the declaration's type variables.
pub(crate) fn parse_variable_member(
    p: &mut Parser<'_>,
    comment_pos: Option<Position>,
    annotations: Vec<ast::Annotation>,
) -> Result<ast::Member, ParseError> {
    if !annotations.is_empty() {
        return Err(p.error_at(
            p.current_token,
            "annotation cannot be given to variable members",
        ));
    }

    let member_start = p.current_token.range.start;
    let comment_pos = comment_pos.unwrap_or(member_start);
    let comment = p.comment_for(comment_pos.line);

    match p.current_token.kind {
        TokenKind::Aident => {
            let name_range = p.current_token.range;
            let name = p.symbol_from_token(p.current_token);

            p.advance_expect(TokenKind::Colon)?;
            let colon_range = p.current_token.range;

            let ty = parse_type(p)?;
            let member_range = Range::new(member_start, p.current_token.range.end);

            let mut location = Location::with_children(member_range, 3);
            location.add_required_child("name", name_range);
            location.add_required_child("colon", colon_range);
            location.add_optional_child("kind", None);

            Ok(ast::Member::InstanceVariable(ast::VariableMember {
                name,
                ty,
                comment,
                location,
            }))
        }
        TokenKind::A2ident => {
            let name_range = p.current_token.range;
            let name = p.symbol_from_token(p.current_token);

            p.advance_expect(TokenKind::Colon)?;
            let colon_range = p.current_token.range;

            p.push_typevars(true);
            let ty = parse_type(p)?;
            p.pop_typevars();

            let member_range = Range::new(member_start, p.current_token.range.end);

            let mut location = Location::with_children(member_range, 3);
            location.add_required_child("name", name_range);
            location.add_required_child("colon", colon_range);
            location.add_optional_child("kind", None);

            Ok(ast::Member::ClassVariable(ast::VariableMember {
                name,
                ty,
                comment,
                location,
            }))
        }
        TokenKind::SelfKw => {
            let kind_range = Range::new(p.current_token.range.start, p.next_token.range.end);

            p.advance_expect(TokenKind::Dot)?;
            p.advance_expect(TokenKind::Aident)?;

            let name_range = p.current_token.range;
            let name = p.symbol_from_token(p.current_token);

            p.advance_expect(TokenKind::Colon)?;
            let colon_range = p.current_token.range;

            p.push_typevars(true);
            let ty = parse_type(p)?;
            p.pop_typevars();

            let member_range = Range::new(member_start, p.current_token.range.end);

            let mut location = Location::with_children(member_range, 3);
            location.add_required_child("name", name_range);
            location.add_required_child("colon", colon_range);
            location.add_optional_child("kind", Some(kind_range));

            Ok(ast::Member::ClassInstanceVariable(ast::VariableMember {
                name,
                ty,
                comment,
                location,
            }))
        }
        _ => unreachable!("variable members start with @x, @@x or self"),
    }
}

/// ```text
/// visibility_member ::= {<`public`>}
///                     | {<`private`>}
/// ```
pub(crate) fn parse_visibility_member(
    p: &mut Parser<'_>,
    annotations: &[ast::Annotation],
) -> Result<ast::Member, ParseError> {
    if !annotations.is_empty() {
        return Err(p.error_at(
            p.current_token,
            "annotation cannot be given to visibility members",
        ));
    }

    let member = ast::VisibilityMember {
        location: Location::new(p.current_token.range),
    };
    match p.current_token.kind {
        TokenKind::PublicKw => Ok(ast::Member::Public(member)),
        TokenKind::PrivateKw => Ok(ast::Member::Private(member)),
        _ => unreachable!("visibility members start with public/private"),
    }
}

/// ```text
/// attribute_member ::= {attr_keyword} attr_name attr_var `:` <type>
///                    | {visibility} attr_keyword attr_name attr_var `:` <type>
///                    | {attr_keyword} `self` `.` attr_name attr_var `:` <type>
///
/// attr_keyword ::= `attr_reader` | `attr_writer` | `attr_accessor`
///
/// attr_var ::=                    # empty
///            | `(` tAIDENT `)`    # ivar name
///            | `(` `)`            # no variable
/// ```
pub(crate) fn parse_attribute_member(
    p: &mut Parser<'_>,
    comment_pos: Option<Position>,
    annotations: Vec<ast::Annotation>,
) -> Result<ast::Member, ParseError> {
    let member_start = p.current_token.range.start;
    let comment_pos = comment_pos.unwrap_or(member_start);
    let comment = p.comment_for(comment_pos.line);

    let mut visibility = None;
    let mut visibility_range = None;
    match p.current_token.kind {
        TokenKind::PrivateKw => {
            visibility = Some(ast::Visibility::Private);
            visibility_range = Some(p.current_token.range);
            p.advance();
        }
        TokenKind::PublicKw => {
            visibility = Some(ast::Visibility::Public);
            visibility_range = Some(p.current_token.range);
            p.advance();
        }
        _ => {}
    }

    let attr_keyword = p.current_token.kind;
    let keyword_range = p.current_token.range;

    let (kind, kind_range) = parse_instance_singleton_kind(p, false);

    let (name, name_range) = parse_method_name(p)?;

    let mut ivar_name = ast::IvarName::Inferred;
    let mut ivar_range = None;
    let mut ivar_name_range = None;
    if p.next_token.kind == TokenKind::LParen {
        p.advance_expect(TokenKind::LParen)?;
        let ivar_start = p.current_token.range.start;

        if p.advance_if(TokenKind::Aident) {
            ivar_name = ast::IvarName::Named(p.symbol_from_token(p.current_token));
            ivar_name_range = Some(p.current_token.range);
        } else {
            ivar_name = ast::IvarName::Disabled;
        }

        p.advance_expect(TokenKind::RParen)?;
        ivar_range = Some(Range::new(ivar_start, p.current_token.range.end));
    }

    p.advance_expect(TokenKind::Colon)?;
    let colon_range = p.current_token.range;

    p.push_typevars(kind == ast::MethodKind::Singleton);
    let ty = parse_type(p)?;
    p.pop_typevars();

    let member_range = Range::new(member_start, p.current_token.range.end);
    let mut location = Location::with_children(member_range, 7);
    location.add_required_child("keyword", keyword_range);
    location.add_required_child("name", name_range);
    location.add_required_child("colon", colon_range);
    location.add_optional_child("kind", kind_range);
    location.add_optional_child("ivar", ivar_range);
    location.add_optional_child("ivar_name", ivar_name_range);
    location.add_optional_child("visibility", visibility_range);

    let attribute = ast::Attribute {
        name,
        ty,
        ivar_name,
        kind,
        annotations,
        comment,
        visibility,
        location,
    };

    Ok(match attr_keyword {
        TokenKind::AttrReaderKw => ast::Member::AttrReader(attribute),
        TokenKind::AttrWriterKw => ast::Member::AttrWriter(attribute),
        TokenKind::AttrAccessorKw => ast::Member::AttrAccessor(attribute),
        _ => {
            return Err(p.error_at(p.current_token, "unexpected token for attribute member"));
        }
    })
}

/// ```text
/// interface_members ::= {} ...<interface_member> kEND
///
/// interface_member ::= def_member     (instance methods only)
///                    | mixin_member   (interface mixins only)
///                    | alias_member   (instance aliases only)
/// ```
pub(crate) fn parse_interface_members(
    p: &mut Parser<'_>,
) -> Result<Vec<Arc<ast::Member>>, ParseError> {
    let mut members = Vec::new();

    while p.next_token.kind != TokenKind::EndKw {
        let (annotations, annot_pos) = parse_annotations(p)?;
        p.advance();

        let member = match p.current_token.kind {
            TokenKind::DefKw => {
                let def = parse_member_def(p, true, true, annot_pos, annotations)?;
                ast::Member::MethodDefinition(def)
            }
            TokenKind::IncludeKw | TokenKind::ExtendKw | TokenKind::PrependKw => {
                parse_mixin_member(p, true, annot_pos, annotations)?
            }
            TokenKind::AliasKw => {
                ast::Member::Alias(parse_alias_member(p, true, annot_pos, annotations)?)
            }
            _ => {
                return Err(p.error_at(
                    p.current_token,
                    "unexpected token for interface declaration member",
                ));
            }
        };
        members.push(Arc::new(member));
    }

    Ok(members)
}

/// ```text
/// module_members ::= {} ...<module_member> kEND
///
/// module_member ::= def_member | variable_member | mixin_member
///                 | alias_member | attribute_member
///                 | `public` | `private`
///                 | nested_decl
/// ```
pub(crate) fn parse_module_members(
    p: &mut Parser<'_>,
) -> Result<Vec<Arc<ast::Member>>, ParseError> {
    let mut members = Vec::new();

    while p.next_token.kind != TokenKind::EndKw {
        let (annotations, annot_pos) = parse_annotations(p)?;
        p.advance();

        let member = match p.current_token.kind {
            TokenKind::DefKw => {
                let def = parse_member_def(p, false, true, annot_pos, annotations)?;
                ast::Member::MethodDefinition(def)
            }
            TokenKind::IncludeKw | TokenKind::ExtendKw | TokenKind::PrependKw => {
                parse_mixin_member(p, false, annot_pos, annotations)?
            }
            TokenKind::AliasKw => {
                ast::Member::Alias(parse_alias_member(p, false, annot_pos, annotations)?)
            }
            TokenKind::Aident | TokenKind::A2ident | TokenKind::SelfKw => {
                parse_variable_member(p, annot_pos, annotations)?
            }
            TokenKind::AttrReaderKw | TokenKind::AttrWriterKw | TokenKind::AttrAccessorKw => {
                parse_attribute_member(p, annot_pos, annotations)?
            }
            TokenKind::PublicKw | TokenKind::PrivateKw => {
                // `private def foo: ...` modifies the next member; a `private`
                // alone on its line switches the default visibility.
                if p.next_token.range.start.line == p.current_token.range.start.line {
                    match p.next_token.kind {
                        TokenKind::DefKw => {
                            let def = parse_member_def(p, false, true, annot_pos, annotations)?;
                            ast::Member::MethodDefinition(def)
                        }
                        TokenKind::AttrReaderKw
                        | TokenKind::AttrWriterKw
                        | TokenKind::AttrAccessorKw => {
                            parse_attribute_member(p, annot_pos, annotations)?
                        }
                        _ => {
                            return Err(p.error_at(
                                p.next_token,
                                "method or attribute definition is expected after visibility modifier",
                            ));
                        }
                    }
                } else {
                    parse_visibility_member(p, &annotations)?
                }
            }
            _ => ast::Member::Declaration(parse_nested_decl(p, annot_pos, annotations)?),
        };
        members.push(Arc::new(member));
    }

    Ok(members)
}
