//! End-to-end parses of realistic signature sources, plus checks of the
//! structural properties every parse must uphold.

use pretty_assertions::assert_eq;
use unindent::unindent;

use rbs_parser::{ast, lex, Buffer, ErrorKind, Parser, Range, TokenKind};

fn contains(outer: Range, inner: Range) -> bool {
    outer.start.byte_pos <= inner.start.byte_pos && inner.end.byte_pos <= outer.end.byte_pos
}

#[test]
fn bare_class_name_parses_to_a_class_instance() {
    let mut parser = Parser::new(Buffer::from("String"));
    let ty = parser.parse_type(true).unwrap();

    let ast::Type::ClassInstance(class) = ty else {
        panic!("expected a class instance type");
    };
    assert_eq!(parser.constant_pool().resolve(class.name.name.name), b"String");
    assert!(!class.name.namespace.absolute);
    assert!(class.args.is_empty());
    assert_eq!(class.location.range().start.byte_pos, 0);
    assert_eq!(class.location.range().end.byte_pos, 6);
    assert_eq!(class.location.child("args"), None);
}

#[test]
fn generic_application_records_the_args_range() {
    let mut parser = Parser::new(Buffer::from("Array[Integer]"));
    let ty = parser.parse_type(true).unwrap();

    let ast::Type::ClassInstance(class) = ty else {
        panic!("expected a class instance type");
    };
    assert_eq!(parser.constant_pool().resolve(class.name.name.name), b"Array");
    assert_eq!(class.args.len(), 1);

    let args = class.location.child("args").unwrap();
    assert_eq!(args.start.byte_pos, 5);
    assert_eq!(args.end.byte_pos, 14);
    let name = class.location.child("name").unwrap();
    assert_eq!(name.start.byte_pos, 0);
    assert_eq!(name.end.byte_pos, 5);
}

#[test]
fn empty_method_type() {
    let mut parser = Parser::new(Buffer::from("() -> void"));
    let method_type = parser.parse_method_type(true).unwrap();

    assert!(method_type.type_params.is_empty());
    assert!(method_type.block.is_none());
    let ast::Function::Typed(function) = &method_type.function else {
        panic!("expected typed params");
    };
    assert!(function.required_positionals.is_empty());
    assert!(function.required_keywords.is_empty());
    assert!(matches!(*function.return_type, ast::Type::Void { .. }));
}

#[test]
fn generic_method_type_with_block() {
    let mut parser = Parser::new(Buffer::from("[T] (T) { (T) -> void } -> T"));
    let method_type = parser.parse_method_type(true).unwrap();

    assert_eq!(method_type.type_params.len(), 1);
    assert_eq!(
        parser
            .constant_pool()
            .resolve(method_type.type_params[0].name.name),
        b"T"
    );

    let ast::Function::Typed(function) = &method_type.function else {
        panic!("expected typed params");
    };
    assert_eq!(function.required_positionals.len(), 1);
    assert!(matches!(
        function.required_positionals[0].ty,
        ast::Type::Variable(_)
    ));
    assert!(matches!(*function.return_type, ast::Type::Variable(_)));

    let block = method_type.block.as_ref().unwrap();
    assert!(block.required);
    let ast::Function::Typed(block_fn) = &block.function else {
        panic!("expected typed block params");
    };
    assert_eq!(block_fn.required_positionals.len(), 1);
    assert!(matches!(*block_fn.return_type, ast::Type::Void { .. }));
}

#[test]
fn class_declaration_with_generics_and_super() {
    let source = "class Foo[A] < Bar[A]\n  def foo: () -> A\nend";
    let mut parser = Parser::new(Buffer::from(source));
    let signature = parser.parse_signature().unwrap();

    assert_eq!(signature.declarations.len(), 1);
    let ast::Declaration::Class(class) = &*signature.declarations[0] else {
        panic!("expected a class declaration");
    };
    assert_eq!(parser.constant_pool().resolve(class.name.name.name), b"Foo");
    assert_eq!(class.type_params.len(), 1);

    let super_class = class.super_class.as_ref().unwrap();
    assert_eq!(
        parser.constant_pool().resolve(super_class.name.name.name),
        b"Bar"
    );
    assert_eq!(super_class.args.len(), 1);
    assert!(matches!(super_class.args[0], ast::Type::Variable(_)));

    assert_eq!(class.members.len(), 1);
    let ast::Member::MethodDefinition(def) = &*class.members[0] else {
        panic!("expected a method definition");
    };
    assert_eq!(parser.constant_pool().resolve(def.name.name), b"foo");
    assert_eq!(def.kind, ast::MethodKind::Instance);
    assert_eq!(def.overloads.len(), 1);
    assert!(!def.overloading);

    // the class type variable is visible in the method's return type
    let ast::Function::Typed(function) = &def.overloads[0].method_type.function else {
        panic!("expected typed params");
    };
    assert!(matches!(*function.return_type, ast::Type::Variable(_)));
}

#[test]
fn use_directives_with_renames_and_wildcards() {
    let mut parser = Parser::new(Buffer::from("use Foo::Bar as Baz, Foo::*"));
    let signature = parser.parse_signature().unwrap();

    assert!(signature.declarations.is_empty());
    assert_eq!(signature.directives.len(), 1);
    let clauses = &signature.directives[0].clauses;
    assert_eq!(clauses.len(), 2);

    let ast::UseClause::Single(single) = &clauses[0] else {
        panic!("expected a single-import clause");
    };
    assert_eq!(
        parser.constant_pool().resolve(single.type_name.name.name),
        b"Bar"
    );
    assert_eq!(single.type_name.namespace.path.len(), 1);
    let renamed = single.new_name.as_ref().unwrap();
    assert_eq!(parser.constant_pool().resolve(renamed.name), b"Baz");

    let ast::UseClause::Wildcard(wildcard) = &clauses[1] else {
        panic!("expected a wildcard clause");
    };
    assert_eq!(wildcard.namespace.path.len(), 1);
    assert_eq!(
        parser
            .constant_pool()
            .resolve(wildcard.namespace.path[0].name),
        b"Foo"
    );
}

#[test]
fn full_signature_file() {
    let source = unindent(
        r#"
        use MyLib::_Serializable as _Ser

        # The version of the library.
        VERSION: String

        $stdout_hooks: Array[^(String) -> void]

        type MyLib::config = {
          name: String,
          ?timeout: Integer | Float,
          "env" => { RAILS_ENV: String }
        }

        interface _Callable[A]
          def call: (A) -> untyped
        end

        module MyLib : _Callable[String]
          type visibility = :public | :private

          @cache: Hash[Symbol, untyped]
          self.@instances: Integer
          @@registry: Array[String]

          def self?.build: (?String name, *untyped rest, **untyped opts) -> instance
                         | [T] (T) { (T) [self: T] -> void } -> T
                         | ...

          attr_reader name: String
          attr_writer height (@height): Integer
          attr_accessor self.weight (): Integer

          alias inspect_name name

          private

          def secret: () -> String?
        end

        class MyLib::Config[out Repr = untyped] < Hash[Symbol, Repr]
          include _Callable[String]
          extend ClassMethods

          def `quoted`: () -> bool
          def []: (Symbol) -> Repr
          def []=: (Symbol, Repr) -> Repr
          def ==: (untyped) -> bool

          class Error = StandardError
          module Helpers = MyLib
        end
        "#,
    );

    let mut parser = Parser::new(Buffer::from(source.as_str()));
    let signature = parser.parse_signature().unwrap();

    assert_eq!(signature.directives.len(), 1);
    assert_eq!(signature.declarations.len(), 6);

    let ast::Declaration::Constant(version) = &*signature.declarations[0] else {
        panic!("expected a constant");
    };
    let comment = version.comment.as_ref().unwrap();
    assert_eq!(&*comment.string, b"The version of the library.\n");

    let ast::Declaration::Global(hooks) = &*signature.declarations[1] else {
        panic!("expected a global");
    };
    assert!(matches!(hooks.ty, ast::Type::ClassInstance(_)));

    let ast::Declaration::TypeAlias(config) = &*signature.declarations[2] else {
        panic!("expected a type alias");
    };
    let ast::Type::Record(record) = &config.ty else {
        panic!("expected a record type");
    };
    assert_eq!(record.fields.len(), 3);
    assert!(matches!(record.fields[2].key, ast::Literal::String(_)));

    let ast::Declaration::Interface(callable) = &*signature.declarations[3] else {
        panic!("expected an interface");
    };
    assert_eq!(callable.type_params.len(), 1);
    assert_eq!(callable.members.len(), 1);

    let ast::Declaration::Module(module) = &*signature.declarations[4] else {
        panic!("expected a module");
    };
    assert_eq!(module.self_types.len(), 1);
    assert_eq!(module.members.len(), 11);

    let ast::Member::MethodDefinition(build) = &*module.members[4] else {
        panic!("expected the build method");
    };
    assert_eq!(build.kind, ast::MethodKind::SingletonInstance);
    assert!(build.overloading);
    assert_eq!(build.overloads.len(), 2);

    let ast::Member::AttrWriter(height) = &*module.members[6] else {
        panic!("expected attr_writer");
    };
    assert!(matches!(height.ivar_name, ast::IvarName::Named(_)));

    let ast::Member::AttrAccessor(weight) = &*module.members[7] else {
        panic!("expected attr_accessor");
    };
    assert_eq!(weight.kind, ast::MethodKind::Singleton);
    assert!(matches!(weight.ivar_name, ast::IvarName::Disabled));

    let ast::Member::Private(_) = &*module.members[9] else {
        panic!("expected a private marker");
    };

    let ast::Declaration::Class(config_class) = &*signature.declarations[5] else {
        panic!("expected a class");
    };
    assert_eq!(config_class.type_params.len(), 1);
    assert_eq!(config_class.type_params[0].variance, ast::Variance::Covariant);
    assert!(config_class.type_params[0].default_type.is_some());
    assert!(config_class.super_class.is_some());

    let nested: Vec<_> = config_class
        .members
        .iter()
        .filter(|m| matches!(&***m, ast::Member::Declaration(_)))
        .collect();
    assert_eq!(nested.len(), 2);
}

#[test]
fn operator_method_names() {
    let source = "class C\n  def []: () -> void\n  def []=: (untyped) -> void\n  def <=>: (untyped) -> Integer\n  def +: (C) -> C\nend";
    let mut parser = Parser::new(Buffer::from(source));
    let signature = parser.parse_signature().unwrap();
    let ast::Declaration::Class(class) = &*signature.declarations[0] else {
        panic!("expected a class");
    };
    let names: Vec<&[u8]> = class
        .members
        .iter()
        .map(|member| match &**member {
            ast::Member::MethodDefinition(def) => parser.constant_pool().resolve(def.name.name),
            _ => panic!("expected method definitions"),
        })
        .collect();
    assert_eq!(names, [&b"[]"[..], b"[]=", b"<=>", b"+"]);
}

#[test]
fn alias_members_instance_and_singleton() {
    let source = "class C\n  alias to_str to_s\n  alias self.make self.new\nend";
    let mut parser = Parser::new(Buffer::from(source));
    let signature = parser.parse_signature().unwrap();
    let ast::Declaration::Class(class) = &*signature.declarations[0] else {
        panic!("expected a class");
    };
    let ast::Member::Alias(instance) = &*class.members[0] else {
        panic!("expected an alias");
    };
    assert_eq!(instance.kind, ast::MethodKind::Instance);
    assert_eq!(parser.constant_pool().resolve(instance.new_name.name), b"to_str");

    let ast::Member::Alias(singleton) = &*class.members[1] else {
        panic!("expected an alias");
    };
    assert_eq!(singleton.kind, ast::MethodKind::Singleton);
}

#[test]
fn annotations_attach_to_declarations_and_overloads() {
    let source = "%a{deprecated}\n%a(preserve)\nclass Old\n  %a{pure}\n  def f: () -> void\n       | %a{impure} (Integer) -> void\nend";
    let mut parser = Parser::new(Buffer::from(source));
    let signature = parser.parse_signature().unwrap();
    let ast::Declaration::Class(class) = &*signature.declarations[0] else {
        panic!("expected a class");
    };
    assert_eq!(class.annotations.len(), 2);
    assert_eq!(&*class.annotations[0].string, b"deprecated");
    assert_eq!(&*class.annotations[1].string, b"preserve");

    let ast::Member::MethodDefinition(def) = &*class.members[0] else {
        panic!("expected a method");
    };
    assert_eq!(def.annotations.len(), 1);
    assert_eq!(def.overloads[1].annotations.len(), 1);
    assert_eq!(&*def.overloads[1].annotations[0].string, b"impure");
}

#[test]
fn interfaces_reject_foreign_members() {
    let source = "interface _Foo\n  @x: Integer\nend";
    let err = Parser::new(Buffer::from(source))
        .parse_signature()
        .unwrap_err();
    assert!(err.is_syntax_error());
    assert_eq!(err.message(), "unexpected token for interface declaration member");

    let source = "interface _Foo\n  extend Bar\nend";
    let err = Parser::new(Buffer::from(source))
        .parse_signature()
        .unwrap_err();
    assert_eq!(err.message(), "unexpected mixin in interface declaration");
}

#[test]
fn visibility_modifier_needs_method_or_attribute() {
    let source = "class C\n  private alias a b\nend";
    let err = Parser::new(Buffer::from(source))
        .parse_signature()
        .unwrap_err();
    assert_eq!(
        err.message(),
        "method or attribute definition is expected after visibility modifier"
    );
}

#[test]
fn nested_declarations_reset_type_variables() {
    // A in the nested class is not the outer A: it parses as a class name.
    let source = "class Outer[A]\n  class Inner\n    def f: () -> A\n  end\nend";
    let mut parser = Parser::new(Buffer::from(source));
    let signature = parser.parse_signature().unwrap();
    let ast::Declaration::Class(outer) = &*signature.declarations[0] else {
        panic!("expected a class");
    };
    let ast::Member::Declaration(ast::Declaration::Class(inner)) = &*outer.members[0] else {
        panic!("expected a nested class");
    };
    let ast::Member::MethodDefinition(def) = &*inner.members[0] else {
        panic!("expected a method");
    };
    let ast::Function::Typed(function) = &def.overloads[0].method_type.function else {
        panic!("expected typed params");
    };
    assert!(matches!(*function.return_type, ast::Type::ClassInstance(_)));
}

#[test]
fn pre_declared_type_variables() {
    let buffer = Buffer::from("Array[T]");
    let mut parser = Parser::new(buffer);
    parser.declare_type_variables(&["T"]);
    let ty = parser.parse_type(true).unwrap();
    let ast::Type::ClassInstance(array) = ty else {
        panic!("expected a class instance");
    };
    assert!(matches!(array.args[0], ast::Type::Variable(_)));
}

#[test]
fn sub_range_parsing() {
    // parse only the `Integer` out of a larger buffer
    let buffer = Buffer::from("x: Integer y");
    let mut parser = Parser::with_span(buffer, 3, 10).unwrap();
    let ty = parser.parse_type(true).unwrap();
    let ast::Type::ClassInstance(class) = ty else {
        panic!("expected a class instance");
    };
    assert_eq!(class.location.range().start.byte_pos, 3);
    assert_eq!(class.location.range().end.byte_pos, 10);
}

#[test]
fn inverted_span_is_a_runtime_error() {
    let buffer = Buffer::from("Integer");
    let err = Parser::with_span(buffer, 5, 2).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Runtime);
    assert!(!err.is_syntax_error());
}

#[test]
fn first_error_is_reported_with_token_and_range() {
    let err = Parser::new(Buffer::from("Array[Integer"))
        .parse_type(true)
        .unwrap_err();
    assert!(err.is_syntax_error());
    assert_eq!(err.token_kind(), TokenKind::Eof);
    let rendered = err.to_string();
    assert!(rendered.contains("Syntax error"), "got: {rendered}");
}

// ---- structural properties ---------------------------------------------

fn assert_type_ranges(ty: &ast::Type) {
    let range = ty.location().range();
    assert!(range.start.byte_pos <= range.end.byte_pos);

    let mut check_child = |child: &ast::Type| {
        assert!(
            contains(range, child.location().range()),
            "{range:?} does not contain {:?}",
            child.location().range()
        );
        assert_type_ranges(child);
    };

    match ty {
        ast::Type::Union(t) => t.types.iter().for_each(check_child),
        ast::Type::Intersection(t) => t.types.iter().for_each(check_child),
        ast::Type::Tuple(t) => t.types.iter().for_each(check_child),
        ast::Type::Optional(t) => check_child(&t.ty),
        ast::Type::ClassInstance(t) => t.args.iter().for_each(check_child),
        ast::Type::Interface(t) => t.args.iter().for_each(check_child),
        ast::Type::Alias(t) => t.args.iter().for_each(check_child),
        ast::Type::Record(t) => {
            for field in &t.fields {
                assert!(contains(range, field.location.range()));
                assert_type_ranges(&field.ty);
            }
        }
        ast::Type::Proc(t) => {
            assert_function_ranges(&t.function);
            if let Some(block) = &t.block {
                assert!(contains(range, block.location.range()));
                assert_function_ranges(&block.function);
            }
        }
        _ => {}
    }
}

fn assert_function_ranges(function: &ast::Function) {
    let range = function.location().range();
    if let ast::Function::Typed(f) = function {
        for param in f
            .required_positionals
            .iter()
            .chain(&f.optional_positionals)
            .chain(&f.trailing_positionals)
        {
            assert!(contains(range, param.location.range()));
            assert_type_ranges(&param.ty);
        }
        for (_, param) in f.required_keywords.iter().chain(&f.optional_keywords) {
            assert!(contains(range, param.location.range()));
        }
    }
    assert_type_ranges(function.return_type());
}

#[test]
fn node_ranges_enclose_child_ranges() {
    let sources = [
        "Array[Hash[Symbol, ^(Integer) -> void]]",
        "(A | B) & C?",
        "[Integer, { a: String, b: [bool?] }]",
        "^(String, ?Integer opt, *untyped, name: String) { () -> void } -> untyped",
    ];
    for source in sources {
        let ty = Parser::new(Buffer::from(source)).parse_type(true).unwrap();
        assert_type_ranges(&ty);
    }
}

#[test]
fn member_ranges_stay_inside_their_declaration() {
    let source = "class Foo[A] < Bar[A]\n  def foo: () -> A\n  include Baz\n  @x: Integer\nend";
    let signature = Parser::new(Buffer::from(source))
        .parse_signature()
        .unwrap();
    let decl = &signature.declarations[0];
    let decl_range = decl.location().range();
    assert!(contains(signature.location.range(), decl_range));

    let ast::Declaration::Class(class) = &**decl else {
        panic!("expected a class");
    };
    for member in &class.members {
        assert!(contains(decl_range, member.location().range()));
    }
}

#[test]
fn lexing_is_contiguous_and_parsing_agrees_with_it() {
    let source = "class Foo[A] < Bar[A]\n  # comment\n  def foo: () -> A\nend";
    let buffer = Buffer::from(source);

    let tokens = lex(buffer, None);
    assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);

    let mut last_end = 0;
    for token in &tokens {
        assert!(token.range.start.byte_pos <= token.range.end.byte_pos);
        assert_eq!(token.range.start.byte_pos, last_end);
        last_end = token.range.end.byte_pos;
    }
    assert_eq!(last_end, source.len());

    // the same source parses, and the declaration's range matches the
    // non-trivia token extent
    let signature = Parser::new(buffer).parse_signature().unwrap();
    let decl_range = signature.declarations[0].location().range();
    let first = tokens.iter().find(|t| !t.kind.is_trivia()).unwrap();
    assert_eq!(decl_range.start.byte_pos, first.range.start.byte_pos);
    let last = tokens
        .iter()
        .rev()
        .find(|t| !t.kind.is_trivia() && t.kind != TokenKind::Eof)
        .unwrap();
    assert_eq!(decl_range.end.byte_pos, last.range.end.byte_pos);
}

#[test]
fn constant_pool_round_trips_through_a_parse() {
    let mut parser = Parser::new(Buffer::from("Foo::Bar[baz, _Qux]"));
    parser.parse_type(true).unwrap();
    let pool = parser.into_constant_pool();
    for name in [&b"Foo"[..], b"Bar", b"baz", b"_Qux"] {
        let id = pool.find(name).unwrap();
        assert_eq!(pool.resolve(id), name);
    }
}
