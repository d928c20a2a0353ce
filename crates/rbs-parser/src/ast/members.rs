use crate::ast::{Annotation, Comment, Declaration, MethodType, Symbol, Type, TypeName};
use crate::location::Location;

/// A member of a class, module or interface body.
#[derive(Debug, Clone)]
pub enum Member {
    /// `def foo: () -> void`
    MethodDefinition(MethodDefinition),
    /// `include Enumerable[Integer]`
    Include(Mixin),
    /// `extend ClassMethods`
    Extend(Mixin),
    /// `prepend Instrumentation`
    Prepend(Mixin),
    /// `alias new_name old_name`
    Alias(AliasMember),
    /// `@name: String`
    InstanceVariable(VariableMember),
    /// `@@count: Integer`
    ClassVariable(VariableMember),
    /// `self.@registry: Hash[Symbol, untyped]`
    ClassInstanceVariable(VariableMember),
    /// `attr_reader name: String`
    AttrReader(Attribute),
    /// `attr_writer name: String`
    AttrWriter(Attribute),
    /// `attr_accessor name: String`
    AttrAccessor(Attribute),
    /// A bare `public` changing default visibility.
    Public(VisibilityMember),
    /// A bare `private` changing default visibility.
    Private(VisibilityMember),
    /// A class, module, constant... declaration nested in the body.
    Declaration(Declaration),
}

impl Member {
    pub fn location(&self) -> &Location {
        match self {
            Member::MethodDefinition(m) => &m.location,
            Member::Include(m) | Member::Extend(m) | Member::Prepend(m) => &m.location,
            Member::Alias(m) => &m.location,
            Member::InstanceVariable(m)
            | Member::ClassVariable(m)
            | Member::ClassInstanceVariable(m) => &m.location,
            Member::AttrReader(m) | Member::AttrWriter(m) | Member::AttrAccessor(m) => &m.location,
            Member::Public(m) | Member::Private(m) => &m.location,
            Member::Declaration(d) => d.location(),
        }
    }
}

/// Whether a method or attribute lives on instances, on the singleton class
/// (`self.`), or both (`self?.`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Instance,
    Singleton,
    SingletonInstance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

#[derive(Debug, Clone)]
pub struct MethodDefinition {
    pub name: Symbol,
    pub kind: MethodKind,
    pub overloads: Vec<Overload>,
    /// True when the overload list ends with `...`, leaving the set open for
    /// later definitions to extend.
    pub overloading: bool,
    pub annotations: Vec<Annotation>,
    pub comment: Option<Comment>,
    pub visibility: Option<Visibility>,
    pub location: Location,
}

/// One `|`-separated alternative of a method definition.
#[derive(Debug, Clone)]
pub struct Overload {
    pub annotations: Vec<Annotation>,
    pub method_type: MethodType,
    pub location: Location,
}

/// An `include`, `extend` or `prepend` member.
#[derive(Debug, Clone)]
pub struct Mixin {
    pub name: TypeName,
    pub args: Vec<Type>,
    pub annotations: Vec<Annotation>,
    pub comment: Option<Comment>,
    pub location: Location,
}

#[derive(Debug, Clone)]
pub struct AliasMember {
    pub new_name: Symbol,
    pub old_name: Symbol,
    pub kind: MethodKind,
    pub annotations: Vec<Annotation>,
    pub comment: Option<Comment>,
    pub location: Location,
}

/// An instance/class/class-instance variable member; which one is encoded by
/// the [`Member`] variant wrapping it.
#[derive(Debug, Clone)]
pub struct VariableMember {
    pub name: Symbol,
    pub ty: Type,
    pub comment: Option<Comment>,
    pub location: Location,
}

/// The parenthesized instance-variable clause of an attribute:
/// absent (`Inferred`), explicitly disabled with `()`, or named with
/// `(@ivar)`.
#[derive(Debug, Clone)]
pub enum IvarName {
    Inferred,
    Disabled,
    Named(Symbol),
}

#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: Symbol,
    pub ty: Type,
    pub ivar_name: IvarName,
    pub kind: MethodKind,
    pub annotations: Vec<Annotation>,
    pub comment: Option<Comment>,
    pub visibility: Option<Visibility>,
    pub location: Location,
}

#[derive(Debug, Clone)]
pub struct VisibilityMember {
    pub location: Location,
}
