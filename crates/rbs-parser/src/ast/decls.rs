use triomphe::Arc;

use crate::ast::{Annotation, Comment, Member, Symbol, Type, TypeName, TypeParam};
use crate::location::Location;

/// A top-level (or nested) declaration.
#[derive(Debug, Clone)]
pub enum Declaration {
    /// `VERSION: String`
    Constant(ConstantDecl),
    /// `$stdout: IO`
    Global(GlobalDecl),
    /// `type json = ...`
    TypeAlias(TypeAliasDecl),
    /// `interface _Each ... end`
    Interface(InterfaceDecl),
    /// `module Enumerable ... end`
    Module(ModuleDecl),
    /// `module Foo = Bar`
    ModuleAlias(ModuleAliasDecl),
    /// `class Array ... end`
    Class(ClassDecl),
    /// `class Foo = Bar`
    ClassAlias(ClassAliasDecl),
}

impl Declaration {
    pub fn location(&self) -> &Location {
        match self {
            Declaration::Constant(d) => &d.location,
            Declaration::Global(d) => &d.location,
            Declaration::TypeAlias(d) => &d.location,
            Declaration::Interface(d) => &d.location,
            Declaration::Module(d) => &d.location,
            Declaration::ModuleAlias(d) => &d.location,
            Declaration::Class(d) => &d.location,
            Declaration::ClassAlias(d) => &d.location,
        }
    }

    pub fn comment(&self) -> Option<&Comment> {
        match self {
            Declaration::Constant(d) => d.comment.as_ref(),
            Declaration::Global(d) => d.comment.as_ref(),
            Declaration::TypeAlias(d) => d.comment.as_ref(),
            Declaration::Interface(d) => d.comment.as_ref(),
            Declaration::Module(d) => d.comment.as_ref(),
            Declaration::ModuleAlias(d) => d.comment.as_ref(),
            Declaration::Class(d) => d.comment.as_ref(),
            Declaration::ClassAlias(d) => d.comment.as_ref(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConstantDecl {
    pub name: TypeName,
    pub ty: Type,
    pub annotations: Vec<Annotation>,
    pub comment: Option<Comment>,
    pub location: Location,
}

#[derive(Debug, Clone)]
pub struct GlobalDecl {
    pub name: Symbol,
    pub ty: Type,
    pub annotations: Vec<Annotation>,
    pub comment: Option<Comment>,
    pub location: Location,
}

#[derive(Debug, Clone)]
pub struct TypeAliasDecl {
    pub name: TypeName,
    pub type_params: Vec<TypeParam>,
    pub ty: Type,
    pub annotations: Vec<Annotation>,
    pub comment: Option<Comment>,
    pub location: Location,
}

#[derive(Debug, Clone)]
pub struct InterfaceDecl {
    pub name: TypeName,
    pub type_params: Vec<TypeParam>,
    pub members: Vec<Arc<Member>>,
    pub annotations: Vec<Annotation>,
    pub comment: Option<Comment>,
    pub location: Location,
}

#[derive(Debug, Clone)]
pub struct ModuleDecl {
    pub name: TypeName,
    pub type_params: Vec<TypeParam>,
    /// The `: _Each[String]` part: interfaces/classes the module expects of
    /// its including class.
    pub self_types: Vec<ModuleSelf>,
    pub members: Vec<Arc<Member>>,
    pub annotations: Vec<Annotation>,
    pub comment: Option<Comment>,
    pub location: Location,
}

#[derive(Debug, Clone)]
pub struct ModuleSelf {
    pub name: TypeName,
    pub args: Vec<Type>,
    pub location: Location,
}

#[derive(Debug, Clone)]
pub struct ModuleAliasDecl {
    pub new_name: TypeName,
    pub old_name: TypeName,
    pub annotations: Vec<Annotation>,
    pub comment: Option<Comment>,
    pub location: Location,
}

#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub name: TypeName,
    pub type_params: Vec<TypeParam>,
    pub super_class: Option<ClassSuper>,
    pub members: Vec<Arc<Member>>,
    pub annotations: Vec<Annotation>,
    pub comment: Option<Comment>,
    pub location: Location,
}

/// The `< Base[Arg]` part of a class declaration.
#[derive(Debug, Clone)]
pub struct ClassSuper {
    pub name: TypeName,
    pub args: Vec<Type>,
    pub location: Location,
}

#[derive(Debug, Clone)]
pub struct ClassAliasDecl {
    pub new_name: TypeName,
    pub old_name: TypeName,
    pub annotations: Vec<Annotation>,
    pub comment: Option<Comment>,
    pub location: Location,
}
