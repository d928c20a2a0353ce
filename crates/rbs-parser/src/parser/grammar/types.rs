use rustc_hash::FxHashSet;

use crate::ast;
use crate::error::ParseError;
use crate::intern::ConstantId;
use crate::location::{Location, Range};
use crate::parser::grammar::function::{parse_keyword_key, parse_proc_type};
use crate::parser::grammar::name::{parse_type_name, NameClass};
use crate::parser::grammar::{is_keyword, TypeNameKind};
use crate::parser::Parser;
use crate::unescape::unquote_string;
use crate::TokenKind;

/// ```text
/// union ::= {} intersection '|' ... '|' <intersection>
///         | {} <intersection>
/// ```
///
/// The entry point for every type expression. Nesting depth is bounded by
/// the parser's recursion limit.
pub(crate) fn parse_type(p: &mut Parser<'_>) -> Result<ast::Type, ParseError> {
    if p.recursion.check_and_increment() {
        p.recursion.decrement();
        return Err(p.error_at(p.next_token, "type nesting limit reached"));
    }
    let result = parse_union(p);
    p.recursion.decrement();
    result
}

fn parse_union(p: &mut Parser<'_>) -> Result<ast::Type, ParseError> {
    let start = p.next_token.range.start;
    let first = parse_intersection(p)?;

    if p.next_token.kind != TokenKind::Bar {
        return Ok(first);
    }

    let mut types = vec![first];
    while p.next_token.kind == TokenKind::Bar {
        p.advance();
        types.push(parse_intersection(p)?);
    }

    let range = Range::new(start, p.current_token.range.end);
    Ok(ast::Type::Union(ast::UnionType {
        types,
        location: Location::new(range),
    }))
}

/// ```text
/// intersection ::= {} optional `&` ... '&' <optional>
///                | {} <optional>
/// ```
fn parse_intersection(p: &mut Parser<'_>) -> Result<ast::Type, ParseError> {
    let start = p.next_token.range.start;
    let first = parse_optional(p)?;

    if p.next_token.kind != TokenKind::Amp {
        return Ok(first);
    }

    let mut types = vec![first];
    while p.next_token.kind == TokenKind::Amp {
        p.advance();
        types.push(parse_optional(p)?);
    }

    let range = Range::new(start, p.current_token.range.end);
    Ok(ast::Type::Intersection(ast::IntersectionType {
        types,
        location: Location::new(range),
    }))
}

/// ```text
/// optional ::= {} <simple_type>
///            | {} simple_type <`?`>
/// ```
pub(crate) fn parse_optional(p: &mut Parser<'_>) -> Result<ast::Type, ParseError> {
    let start = p.next_token.range.start;
    let ty = parse_simple(p)?;

    if p.next_token.kind != TokenKind::Question {
        return Ok(ty);
    }
    p.advance();
    let range = Range::new(start, p.current_token.range.end);
    Ok(ast::Type::Optional(ast::OptionalType {
        ty: Box::new(ty),
        location: Location::new(range),
    }))
}

/// ```text
/// simple ::= {} `(` type <`)`>
///          | {} <base type>
///          | {} <type_name>
///          | {} class_instance `[` type_list <`]`>
///          | {} `singleton` `(` type_name <`)`>
///          | {} `[` type_list <`]`>
///          | {} `{` record_attributes <`}`>
///          | {} `^` <function>
/// ```
fn parse_simple(p: &mut Parser<'_>) -> Result<ast::Type, ParseError> {
    p.advance();

    let location = Location::new(p.current_token.range);
    match p.current_token.kind {
        TokenKind::LParen => {
            let ty = parse_type(p)?;
            p.advance_expect(TokenKind::RParen)?;
            Ok(ty)
        }
        TokenKind::BoolKw => Ok(ast::Type::Bool { location }),
        TokenKind::BotKw => Ok(ast::Type::Bot { location }),
        TokenKind::ClassKw => Ok(ast::Type::Class { location }),
        TokenKind::InstanceKw => Ok(ast::Type::Instance { location }),
        TokenKind::NilKw => Ok(ast::Type::Nil { location }),
        TokenKind::SelfKw => Ok(ast::Type::SelfType { location }),
        TokenKind::TopKw => Ok(ast::Type::Top { location }),
        TokenKind::VoidKw => Ok(ast::Type::Void { location }),
        TokenKind::UntypedKw => Ok(ast::Type::Untyped {
            todo: false,
            location,
        }),
        TokenKind::TodoKw => Ok(ast::Type::Untyped {
            todo: true,
            location,
        }),
        TokenKind::Integer => {
            let literal = integer_literal(p, p.current_token);
            Ok(ast::Type::Literal(ast::LiteralType {
                literal: ast::Literal::Integer(literal),
                location,
            }))
        }
        TokenKind::TrueKw => Ok(bool_literal_type(true, location)),
        TokenKind::FalseKw => Ok(bool_literal_type(false, location)),
        TokenKind::SqString | TokenKind::DqString => {
            let value = unquote_string(p.token_bytes(p.current_token), p.buffer().encoding());
            Ok(ast::Type::Literal(ast::LiteralType {
                literal: ast::Literal::String(ast::StringLiteral {
                    value: value.into_boxed_slice(),
                    location: location.clone(),
                }),
                location,
            }))
        }
        TokenKind::Symbol | TokenKind::SqSymbol | TokenKind::DqSymbol => {
            parse_symbol_literal(p, location)
        }
        TokenKind::Uident => {
            let bytes = p.token_bytes(p.current_token);
            if let Some(id) = p.constant_pool().find(bytes) {
                if p.is_typevar(id) {
                    let name = ast::Symbol {
                        name: id,
                        location: location.clone(),
                    };
                    return Ok(ast::Type::Variable(ast::VariableType { name, location }));
                }
            }
            parse_instance_type(p, true)
        }
        TokenKind::Ulident | TokenKind::Lident | TokenKind::Colon2 => parse_instance_type(p, true),
        TokenKind::SingletonKw => parse_singleton_type(p),
        TokenKind::LBracket => {
            let start = p.current_token.range.start;
            let mut types = Vec::new();
            if p.next_token.kind != TokenKind::RBracket {
                types = parse_type_list(p, TokenKind::RBracket)?;
            }
            p.advance_expect(TokenKind::RBracket)?;
            let range = Range::new(start, p.current_token.range.end);
            Ok(ast::Type::Tuple(ast::TupleType {
                types,
                location: Location::new(range),
            }))
        }
        // `[]` lexes as one token; as a type it is the empty tuple.
        TokenKind::ArefOperator => Ok(ast::Type::Tuple(ast::TupleType {
            types: Vec::new(),
            location,
        })),
        TokenKind::LBrace => {
            let start = p.current_token.range.start;
            let fields = parse_record_attributes(p)?;
            p.advance_expect(TokenKind::RBrace)?;
            let range = Range::new(start, p.current_token.range.end);
            Ok(ast::Type::Record(ast::RecordType {
                fields,
                location: Location::new(range),
            }))
        }
        TokenKind::Hat => Ok(ast::Type::Proc(parse_proc_type(p)?)),
        _ => Err(p.error_at(p.current_token, "unexpected token for simple type")),
    }
}

fn bool_literal_type(value: bool, location: Location) -> ast::Type {
    ast::Type::Literal(ast::LiteralType {
        literal: ast::Literal::Bool(ast::BoolLiteral {
            value,
            location: location.clone(),
        }),
        location,
    })
}

fn integer_literal(p: &Parser<'_>, token: crate::lexer::Token) -> ast::IntegerLiteral {
    let bytes = p.token_bytes(token);
    let text: String = String::from_utf8_lossy(bytes)
        .trim_matches(|c: char| c.is_ascii_whitespace())
        .to_string();
    ast::IntegerLiteral {
        digits: text.into_boxed_str(),
        location: Location::new(token.range),
    }
}

/// ```text
/// symbol ::= {<tSYMBOL>}
/// ```
///
/// Plain symbols intern their text after the `:`; quoted symbols are
/// unescaped first.
fn parse_symbol_literal(
    p: &mut Parser<'_>,
    location: Location,
) -> Result<ast::Type, ParseError> {
    let token = p.current_token;
    let bytes = p.token_bytes(token);

    let name = match token.kind {
        TokenKind::Symbol => p.pool.intern(&bytes[1..]),
        TokenKind::SqSymbol | TokenKind::DqSymbol => {
            let unquoted = unquote_string(&bytes[1..], p.buffer().encoding());
            p.pool.intern_owned(unquoted)
        }
        _ => unreachable!("symbol literal entered on a non-symbol token"),
    };

    let symbol = ast::Symbol {
        name,
        location: location.clone(),
    };
    Ok(ast::Type::Literal(ast::LiteralType {
        literal: ast::Literal::Symbol(symbol),
        location,
    }))
}

/// ```text
/// instance_type ::= {type_name} <type_args>
///
/// type_args ::= {} <>
///             | {} `[` type_list <`]`>
/// ```
pub(crate) fn parse_instance_type(
    p: &mut Parser<'_>,
    parse_alias: bool,
) -> Result<ast::Type, ParseError> {
    let mut expected = TypeNameKind::CLASS | TypeNameKind::INTERFACE;
    if parse_alias {
        expected = expected | TypeNameKind::ALIAS;
    }

    let (name, name_range, class) = parse_type_name(p, expected)?;

    let mut args = Vec::new();
    let args_range = if p.next_token.kind == TokenKind::LBracket {
        p.advance();
        let args_start = p.current_token.range.start;
        args = parse_type_list(p, TokenKind::RBracket)?;
        p.advance_expect(TokenKind::RBracket)?;
        Some(Range::new(args_start, p.current_token.range.end))
    } else {
        None
    };

    let type_range = Range::new(
        name_range.start,
        args_range.map_or(name_range.end, |r| r.end),
    );
    let mut location = Location::with_children(type_range, 2);
    location.add_required_child("name", name_range);
    location.add_optional_child("args", args_range);

    Ok(match class {
        NameClass::Class => ast::Type::ClassInstance(ast::ClassInstanceType {
            name,
            args,
            location,
        }),
        NameClass::Interface => ast::Type::Interface(ast::InterfaceType {
            name,
            args,
            location,
        }),
        NameClass::Alias => ast::Type::Alias(ast::AliasType {
            name,
            args,
            location,
        }),
    })
}

/// ```text
/// singleton_type ::= {`singleton`} `(` type_name <`)`>
/// ```
fn parse_singleton_type(p: &mut Parser<'_>) -> Result<ast::Type, ParseError> {
    p.expect_current(TokenKind::SingletonKw)?;
    let start = p.current_token.range.start;

    p.advance_expect(TokenKind::LParen)?;
    p.advance();
    let (name, name_range, _) = parse_type_name(p, TypeNameKind::CLASS)?;
    p.advance_expect(TokenKind::RParen)?;

    let range = Range::new(start, p.current_token.range.end);
    let mut location = Location::with_children(range, 1);
    location.add_required_child("name", name_range);

    Ok(ast::Type::ClassSingleton(ast::ClassSingletonType {
        name,
        location,
    }))
}

/// ```text
/// type_list ::= {} type `,` ... <`,`> eol
///             | {} type `,` ... `,` <type> eol
/// ```
pub(crate) fn parse_type_list(
    p: &mut Parser<'_>,
    eol: TokenKind,
) -> Result<Vec<ast::Type>, ParseError> {
    let mut types = Vec::new();
    loop {
        types.push(parse_type(p)?);

        if p.next_token.kind == TokenKind::Comma {
            p.advance();
            if p.next_token.kind == eol {
                break;
            }
        } else if p.next_token.kind == eol {
            break;
        } else {
            return Err(p.error_at(p.next_token, "comma delimited type list is expected"));
        }
    }
    Ok(types)
}

/// Hashable identity of a record key, for duplicate detection.
#[derive(PartialEq, Eq, Hash)]
enum RecordKey {
    Symbol(ConstantId),
    String(Box<[u8]>),
    Integer(Box<str>),
    Bool(bool),
}

fn record_key(literal: &ast::Literal) -> RecordKey {
    match literal {
        ast::Literal::Symbol(s) => RecordKey::Symbol(s.name),
        ast::Literal::String(s) => RecordKey::String(s.value.clone()),
        ast::Literal::Integer(i) => RecordKey::Integer(i.digits.clone()),
        ast::Literal::Bool(b) => RecordKey::Bool(b.value),
    }
}

/// ```text
/// record_attributes ::= {`{`} record_attribute... <record_attribute> `}`
///
/// record_attribute ::= {} keyword_token `:` <type>
///                    | {} literal_type `=>` <type>
/// ```
fn parse_record_attributes(p: &mut Parser<'_>) -> Result<Vec<ast::RecordField>, ParseError> {
    let mut fields = Vec::new();
    if p.next_token.kind == TokenKind::RBrace {
        return Ok(fields);
    }

    let mut seen: FxHashSet<RecordKey> = FxHashSet::default();

    loop {
        let field_start = p.next_token.range.start;
        let mut required = true;

        if p.next_token.kind == TokenKind::Question {
            // { ?foo: type } syntax
            required = false;
            p.advance();
        }

        let key = if is_keyword(p) {
            // { foo: type } syntax
            let key = parse_keyword_key(p)?;
            if !seen.insert(RecordKey::Symbol(key.name)) {
                return Err(p.error_at(p.current_token, "duplicated record key"));
            }
            p.advance_expect(TokenKind::Colon)?;
            ast::Literal::Symbol(key)
        } else {
            // { key => type } syntax
            match p.next_token.kind {
                TokenKind::Symbol
                | TokenKind::SqSymbol
                | TokenKind::DqSymbol
                | TokenKind::SqString
                | TokenKind::DqString
                | TokenKind::Integer
                | TokenKind::TrueKw
                | TokenKind::FalseKw => {}
                _ => {
                    return Err(p.error_at(p.next_token, "unexpected record key token"));
                }
            }
            let key = match parse_simple(p)? {
                ast::Type::Literal(literal_type) => literal_type.literal,
                _ => unreachable!("record key tokens always parse to literals"),
            };
            if !seen.insert(record_key(&key)) {
                return Err(p.error_at(p.current_token, "duplicated record key"));
            }
            p.advance_expect(TokenKind::FatArrow)?;
            key
        };

        let ty = parse_type(p)?;
        let field_range = Range::new(field_start, p.current_token.range.end);
        fields.push(ast::RecordField {
            key,
            ty,
            required,
            location: Location::new(field_range),
        });

        if p.advance_if(TokenKind::Comma) {
            if p.next_token.kind == TokenKind::RBrace {
                break;
            }
        } else {
            break;
        }
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use crate::ast;
    use crate::{Buffer, Parser};

    fn parse(source: &str) -> ast::Type {
        Parser::new(Buffer::from(source)).parse_type(true).unwrap()
    }

    #[test]
    fn base_types() {
        assert!(matches!(parse("void"), ast::Type::Void { .. }));
        assert!(matches!(parse("untyped"), ast::Type::Untyped { todo: false, .. }));
        assert!(matches!(parse("__todo__"), ast::Type::Untyped { todo: true, .. }));
        assert!(matches!(parse("self"), ast::Type::SelfType { .. }));
    }

    #[test]
    fn union_binds_looser_than_intersection() {
        let ty = parse("Integer & String | Symbol");
        let ast::Type::Union(union) = ty else {
            panic!("expected a union");
        };
        assert_eq!(union.types.len(), 2);
        assert!(matches!(union.types[0], ast::Type::Intersection(_)));
        assert!(matches!(union.types[1], ast::Type::ClassInstance(_)));
    }

    #[test]
    fn optional_attaches_to_the_simple_type() {
        let ty = parse("Integer?");
        let ast::Type::Optional(optional) = ty else {
            panic!("expected an optional");
        };
        assert!(matches!(*optional.ty, ast::Type::ClassInstance(_)));
    }

    #[test]
    fn parenthesized_types() {
        let ty = parse("(Integer | String)");
        assert!(matches!(ty, ast::Type::Union(_)));
    }

    #[test]
    fn tuples_and_the_empty_tuple() {
        let ast::Type::Tuple(tuple) = parse("[Integer, String]") else {
            panic!("expected a tuple");
        };
        assert_eq!(tuple.types.len(), 2);
        let ast::Type::Tuple(empty) = parse("[]") else {
            panic!("expected a tuple");
        };
        assert!(empty.types.is_empty());
        let ast::Type::Tuple(empty_spaced) = parse("[ ]") else {
            panic!("expected a tuple");
        };
        assert!(empty_spaced.types.is_empty());
    }

    #[test]
    fn singleton_types() {
        let ast::Type::ClassSingleton(singleton) = parse("singleton(Foo)") else {
            panic!("expected a singleton type");
        };
        assert_eq!(singleton.location.child("name").unwrap().start.byte_pos, 10);
    }

    #[test]
    fn record_types_keep_field_order() {
        let ast::Type::Record(record) = parse("{ id: Integer, ?name: String, 1 => bool }") else {
            panic!("expected a record");
        };
        assert_eq!(record.fields.len(), 3);
        assert!(record.fields[0].required);
        assert!(!record.fields[1].required);
        assert!(matches!(record.fields[2].key, ast::Literal::Integer(_)));
    }

    #[test]
    fn duplicate_record_keys_fail() {
        let err = Parser::new(Buffer::from("{ x: Integer, x: String }"))
            .parse_type(true)
            .unwrap_err();
        assert_eq!(err.message(), "duplicated record key");
    }

    #[test]
    fn literal_types() {
        let ast::Type::Literal(int) = parse("123") else {
            panic!("expected a literal");
        };
        let ast::Literal::Integer(int) = int.literal else {
            panic!("expected an integer");
        };
        assert_eq!(&*int.digits, "123");

        let ast::Type::Literal(string) = parse(r#""hi\nthere""#) else {
            panic!("expected a literal");
        };
        let ast::Literal::String(string) = string.literal else {
            panic!("expected a string");
        };
        assert_eq!(&*string.value, b"hi\nthere");
    }

    #[test]
    fn symbol_literals_are_interned_without_the_colon() {
        let mut parser = Parser::new(Buffer::from(":hello"));
        let ty = parser.parse_type(true).unwrap();
        let ast::Type::Literal(lit) = ty else {
            panic!("expected a literal");
        };
        let ast::Literal::Symbol(sym) = lit.literal else {
            panic!("expected a symbol");
        };
        assert_eq!(parser.constant_pool().resolve(sym.name), b"hello");
    }

    #[test]
    fn type_variables_only_when_bound() {
        let mut parser = Parser::new(Buffer::from("T"));
        parser.declare_type_variables(&["T"]);
        assert!(matches!(
            parser.parse_type(true).unwrap(),
            ast::Type::Variable(_)
        ));

        // Unbound, the same name is a class reference.
        assert!(matches!(parse("T"), ast::Type::ClassInstance(_)));
    }

    #[test]
    fn interface_and_alias_names() {
        assert!(matches!(parse("_Each"), ast::Type::Interface(_)));
        assert!(matches!(parse("string"), ast::Type::Alias(_)));
        assert!(matches!(parse("::Foo::Bar"), ast::Type::ClassInstance(_)));
    }

    #[test]
    fn nesting_limit_is_enforced() {
        let source = format!("{}Integer{}", "Array[".repeat(600), "]".repeat(600));
        let err = Parser::new(Buffer::from(source.as_str()))
            .parse_type(true)
            .unwrap_err();
        assert_eq!(err.message(), "type nesting limit reached");
    }

    #[test]
    fn proc_types() {
        let ast::Type::Proc(proc) = parse("^(Integer) -> String") else {
            panic!("expected a proc type");
        };
        let ast::Function::Typed(function) = proc.function else {
            panic!("expected typed params");
        };
        assert_eq!(function.required_positionals.len(), 1);
        assert!(matches!(*function.return_type, ast::Type::ClassInstance(_)));
    }
}
