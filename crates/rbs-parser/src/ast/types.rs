use crate::ast::Symbol;
use crate::ast::TypeName;
use crate::location::Location;

/// A type expression.
#[derive(Debug, Clone)]
pub enum Type {
    /// `bool`
    Bool { location: Location },
    /// `bot`
    Bot { location: Location },
    /// `class`
    Class { location: Location },
    /// `instance`
    Instance { location: Location },
    /// `nil`
    Nil { location: Location },
    /// `self`
    SelfType { location: Location },
    /// `top`
    Top { location: Location },
    /// `void`
    Void { location: Location },
    /// `untyped`, or `__todo__` when `todo` is set.
    Untyped { todo: bool, location: Location },
    /// `1`, `"str"`, `:sym`, `true`, `false`
    Literal(LiteralType),
    /// A type variable currently in scope, e.g. `T`.
    Variable(VariableType),
    /// `Integer`, `Array[String]`
    ClassInstance(ClassInstanceType),
    /// `_Each[String]`
    Interface(InterfaceType),
    /// `string`, `int_like[T]`
    Alias(AliasType),
    /// `singleton(Foo)`
    ClassSingleton(ClassSingletonType),
    /// `[Integer, String]`
    Tuple(TupleType),
    /// `{ id: Integer, name: String }`
    Record(RecordType),
    /// `A | B`
    Union(UnionType),
    /// `A & B`
    Intersection(IntersectionType),
    /// `A?`
    Optional(OptionalType),
    /// `^(A) -> B`
    Proc(ProcType),
}

impl Type {
    pub fn location(&self) -> &Location {
        match self {
            Type::Bool { location }
            | Type::Bot { location }
            | Type::Class { location }
            | Type::Instance { location }
            | Type::Nil { location }
            | Type::SelfType { location }
            | Type::Top { location }
            | Type::Void { location }
            | Type::Untyped { location, .. } => location,
            Type::Literal(t) => &t.location,
            Type::Variable(t) => &t.location,
            Type::ClassInstance(t) => &t.location,
            Type::Interface(t) => &t.location,
            Type::Alias(t) => &t.location,
            Type::ClassSingleton(t) => &t.location,
            Type::Tuple(t) => &t.location,
            Type::Record(t) => &t.location,
            Type::Union(t) => &t.location,
            Type::Intersection(t) => &t.location,
            Type::Optional(t) => &t.location,
            Type::Proc(t) => &t.location,
        }
    }
}

/// A literal value usable as a type or a record key.
#[derive(Debug, Clone)]
pub enum Literal {
    /// Digits as written, underscores included; kept textual so arbitrarily
    /// large integers round-trip.
    Integer(IntegerLiteral),
    /// Unescaped string value.
    String(StringLiteral),
    Symbol(Symbol),
    Bool(BoolLiteral),
}

#[derive(Debug, Clone)]
pub struct IntegerLiteral {
    pub digits: Box<str>,
    pub location: Location,
}

#[derive(Debug, Clone)]
pub struct StringLiteral {
    pub value: Box<[u8]>,
    pub location: Location,
}

#[derive(Debug, Clone)]
pub struct BoolLiteral {
    pub value: bool,
    pub location: Location,
}

#[derive(Debug, Clone)]
pub struct LiteralType {
    pub literal: Literal,
    pub location: Location,
}

#[derive(Debug, Clone)]
pub struct VariableType {
    pub name: Symbol,
    pub location: Location,
}

#[derive(Debug, Clone)]
pub struct ClassInstanceType {
    pub name: TypeName,
    pub args: Vec<Type>,
    pub location: Location,
}

#[derive(Debug, Clone)]
pub struct InterfaceType {
    pub name: TypeName,
    pub args: Vec<Type>,
    pub location: Location,
}

#[derive(Debug, Clone)]
pub struct AliasType {
    pub name: TypeName,
    pub args: Vec<Type>,
    pub location: Location,
}

#[derive(Debug, Clone)]
pub struct ClassSingletonType {
    pub name: TypeName,
    pub location: Location,
}

#[derive(Debug, Clone)]
pub struct TupleType {
    pub types: Vec<Type>,
    pub location: Location,
}

#[derive(Debug, Clone)]
pub struct RecordType {
    pub fields: Vec<RecordField>,
    pub location: Location,
}

/// One `key: Type` or `literal => Type` entry of a record type. `required`
/// is false for `?key: Type` entries.
#[derive(Debug, Clone)]
pub struct RecordField {
    pub key: Literal,
    pub ty: Type,
    pub required: bool,
    pub location: Location,
}

#[derive(Debug, Clone)]
pub struct UnionType {
    pub types: Vec<Type>,
    pub location: Location,
}

#[derive(Debug, Clone)]
pub struct IntersectionType {
    pub types: Vec<Type>,
    pub location: Location,
}

#[derive(Debug, Clone)]
pub struct OptionalType {
    pub ty: Box<Type>,
    pub location: Location,
}

#[derive(Debug, Clone)]
pub struct ProcType {
    pub function: Function,
    pub block: Option<Box<Block>>,
    pub self_type: Option<Box<Type>>,
    pub location: Location,
}

/// The callable part of a method type, proc type or block.
#[derive(Debug, Clone)]
pub enum Function {
    Typed(TypedFunction),
    /// Written `(?) -> T`: parameters are deliberately unspecified.
    Untyped(UntypedFunction),
}

impl Function {
    pub fn return_type(&self) -> &Type {
        match self {
            Function::Typed(f) => &f.return_type,
            Function::Untyped(f) => &f.return_type,
        }
    }

    pub fn location(&self) -> &Location {
        match self {
            Function::Typed(f) => &f.location,
            Function::Untyped(f) => &f.location,
        }
    }
}

/// Parameters in phase order: required, optional (`?`), rest (`*`),
/// trailing, then keywords (required, optional `?`, rest `**`).
#[derive(Debug, Clone)]
pub struct TypedFunction {
    pub required_positionals: Vec<FunctionParam>,
    pub optional_positionals: Vec<FunctionParam>,
    pub rest_positionals: Option<Box<FunctionParam>>,
    pub trailing_positionals: Vec<FunctionParam>,
    pub required_keywords: Vec<(Symbol, FunctionParam)>,
    pub optional_keywords: Vec<(Symbol, FunctionParam)>,
    pub rest_keywords: Option<Box<FunctionParam>>,
    pub return_type: Box<Type>,
    pub location: Location,
}

#[derive(Debug, Clone)]
pub struct UntypedFunction {
    pub return_type: Box<Type>,
    pub location: Location,
}

/// One parameter: a type with an optional name (`String name`).
#[derive(Debug, Clone)]
pub struct FunctionParam {
    pub ty: Type,
    pub name: Option<Symbol>,
    pub location: Location,
}

/// A block attached to a method type: `{ (X) -> Y }`, optional when written
/// `?{ ... }`.
#[derive(Debug, Clone)]
pub struct Block {
    pub function: Function,
    pub required: bool,
    pub self_type: Option<Type>,
    pub location: Location,
}

/// A full method type: `[U] (A, ?B) { (C) -> D } -> E`.
#[derive(Debug, Clone)]
pub struct MethodType {
    pub type_params: Vec<TypeParam>,
    pub function: Function,
    pub block: Option<Block>,
    pub location: Location,
}

/// Variance of a generic parameter: `out T` is covariant, `in T`
/// contravariant, plain `T` invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variance {
    Invariant,
    Covariant,
    Contravariant,
}

/// One generic parameter of a class, module, interface, type alias or method
/// type, e.g. `unchecked out Elem < Numeric = Integer`.
#[derive(Debug, Clone)]
pub struct TypeParam {
    pub name: Symbol,
    pub variance: Variance,
    pub upper_bound: Option<Type>,
    pub default_type: Option<Type>,
    pub unchecked: bool,
    pub location: Location,
}
