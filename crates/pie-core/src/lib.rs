//! Pie Core
//!
//! The shared model of the Pie compiler: positions, faults, type
//! declarations, expressions, patterns, definitions, and symbol naming.
//!
//! ## Modules
//!
//! - [`span`]: Source positions
//! - [`error`]: [`CompilationError`] and the host-facing [`CompileError`]
//! - [`decl`]: [`UnboundDecl`] and [`BoundDecl`] type trees
//! - [`expr`]: [`UnboundExpr`], [`BoundExpr`], and match [`Pattern`]s
//! - [`definition`]: functions, structs, unions, and source files
//! - [`names`]: namespace search and mangled names
//! - [`type_hash`]: deterministic symbol keys

pub mod decl;
pub mod definition;
pub mod error;
pub mod expr;
pub mod names;
pub mod span;
pub mod type_hash;

pub use decl::{Atomic, BoundDecl, FuncType, SubstitutionMap, TypeRef, UnboundDecl};
pub use definition::{
    CaseDecl, Field, FieldDecl, Function, Namespace, SourceFile, Struct, StructDef, TypeDef, Union,
    UnionCase, UnionDef,
};
pub use error::{CompilationError, CompileError, CompileStage};
pub use expr::{BoundExpr, LoopClause, MatchCase, Param, Pattern, Primitive, UnboundExpr};
pub use names::{NameSearchSpace, qualify, type_instance_name, unique_name};
pub use span::Span;
pub use type_hash::TypeHash;
