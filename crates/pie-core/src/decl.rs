//! Type declarations, before and after binding.
//!
//! The parser produces [`UnboundDecl`] trees whose named types are plain
//! strings. Binding turns them into [`BoundDecl`] trees where every named type
//! is a [`TypeRef`] to a registered struct or union. The two are separate sum
//! types: binding never mutates an unbound tree, so generic templates stay
//! pristine and can be bound again under a different substitution.

use std::fmt;
use std::hash::{Hash, Hasher};

use rustc_hash::FxHashMap;

use crate::names::type_instance_name;
use crate::{Span, TypeHash};

/// Maps a generic's type-parameter names to the concrete types they stand for.
pub type SubstitutionMap = FxHashMap<String, BoundDecl>;

/// The built-in value types. Each one is a singleton, compared by identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Atomic {
    Unit,
    Bool,
    Int,
    String,
    /// The type of a `return` expression. Never declared in source.
    EarlyReturn,
}

impl Atomic {
    pub fn name(self) -> &'static str {
        match self {
            Atomic::Unit => "()",
            Atomic::Bool => "Bool",
            Atomic::Int => "Int",
            Atomic::String => "String",
            Atomic::EarlyReturn => "return",
        }
    }
}

impl fmt::Display for Atomic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Unbound
// ============================================================================

/// A type as written in source.
#[derive(Debug, Clone, PartialEq)]
pub enum UnboundDecl {
    Atomic(Atomic),
    /// `fn (Param -> Return)`. Multiple parameters are a tuple.
    Func {
        param: Box<UnboundDecl>,
        ret: Box<UnboundDecl>,
    },
    Tuple(Vec<UnboundDecl>),
    /// A user type or a type parameter, possibly with type arguments.
    Named {
        name: String,
        type_args: Vec<UnboundDecl>,
        span: Span,
    },
    Array {
        element: Box<UnboundDecl>,
        mutable: bool,
    },
    /// Named fields. Order is not significant; binding sorts them by name.
    Record(Vec<(String, UnboundDecl)>),
    /// An already-bound type. Binding returns it unchanged, which lets
    /// synthesized code mix bound types into unbound trees.
    Bound(BoundDecl),
}

impl UnboundDecl {
    pub const UNIT: UnboundDecl = UnboundDecl::Atomic(Atomic::Unit);
    pub const BOOL: UnboundDecl = UnboundDecl::Atomic(Atomic::Bool);
    pub const INT: UnboundDecl = UnboundDecl::Atomic(Atomic::Int);
    pub const STRING: UnboundDecl = UnboundDecl::Atomic(Atomic::String);

    pub fn named(name: impl Into<String>) -> Self {
        UnboundDecl::Named {
            name: name.into(),
            type_args: Vec::new(),
            span: Span::NONE,
        }
    }

    pub fn generic(name: impl Into<String>, type_args: Vec<UnboundDecl>) -> Self {
        UnboundDecl::Named {
            name: name.into(),
            type_args,
            span: Span::NONE,
        }
    }

    pub fn func(param: UnboundDecl, ret: UnboundDecl) -> Self {
        UnboundDecl::Func {
            param: Box::new(param),
            ret: Box::new(ret),
        }
    }

    pub fn array(element: UnboundDecl, mutable: bool) -> Self {
        UnboundDecl::Array {
            element: Box::new(element),
            mutable,
        }
    }

    /// The single declaration standing for a parameter list: Unit for none,
    /// the type itself for one, a tuple otherwise.
    pub fn from_params(mut params: Vec<UnboundDecl>) -> Self {
        match params.len() {
            0 => UnboundDecl::UNIT,
            1 => params.remove(0),
            _ => UnboundDecl::Tuple(params),
        }
    }
}

impl From<BoundDecl> for UnboundDecl {
    fn from(decl: BoundDecl) -> Self {
        match decl {
            BoundDecl::Atomic(atomic) => UnboundDecl::Atomic(atomic),
            other => UnboundDecl::Bound(other),
        }
    }
}

impl fmt::Display for UnboundDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnboundDecl::Atomic(atomic) => write!(f, "{atomic}"),
            UnboundDecl::Func { param, ret } => write!(f, "fn ({param} -> {ret})"),
            UnboundDecl::Tuple(fields) => {
                let fields: Vec<_> = fields.iter().map(|field| field.to_string()).collect();
                write!(f, "({})", fields.join(", "))
            }
            UnboundDecl::Named { name, type_args, .. } if type_args.is_empty() => f.write_str(name),
            UnboundDecl::Named { name, type_args, .. } => {
                let args: Vec<_> = type_args.iter().map(|arg| arg.to_string()).collect();
                write!(f, "{name}[{}]", args.join(", "))
            }
            UnboundDecl::Array { element, mutable: false } => write!(f, "Array[{element}]"),
            UnboundDecl::Array { element, mutable: true } => write!(f, "MutableArray[{element}]"),
            UnboundDecl::Record(fields) => {
                let fields: Vec<_> = fields.iter().map(|(name, ty)| format!("{name}: {ty}")).collect();
                write!(f, "{{{}}}", fields.join(", "))
            }
            UnboundDecl::Bound(bound) => write!(f, "{bound}"),
        }
    }
}

// ============================================================================
// Bound
// ============================================================================

/// A reference to a concrete, registered struct or union.
///
/// Compared and hashed by [`TypeHash`] only; the definition itself lives in
/// the type table, so recursive types never form ownership cycles.
#[derive(Debug, Clone)]
pub struct TypeRef {
    /// Fully qualified base name, e.g. `Collections::List`.
    pub name: String,
    /// Concrete type arguments for generic instances; empty otherwise.
    pub type_args: Vec<BoundDecl>,
    pub hash: TypeHash,
}

impl TypeRef {
    pub fn new(name: impl Into<String>, type_args: Vec<BoundDecl>) -> Self {
        let name = name.into();
        let hash = TypeHash::from_name(&type_instance_name(&name, &type_args));
        Self { name, type_args, hash }
    }

    /// Name including type arguments, e.g. `List[Int]`.
    pub fn full_name(&self) -> String {
        type_instance_name(&self.name, &self.type_args)
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for TypeRef {}

impl Hash for TypeRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())
    }
}

/// A bound function signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FuncType {
    pub param: BoundDecl,
    pub ret: BoundDecl,
}

impl FuncType {
    pub fn new(param: BoundDecl, ret: BoundDecl) -> Self {
        Self { param, ret }
    }

    /// Signature taking each of `params` as a separate argument.
    pub fn from_params(params: Vec<BoundDecl>, ret: BoundDecl) -> Self {
        Self::new(BoundDecl::from_params(params), ret)
    }

    /// The parameter types as they appear in a mangled name.
    pub fn param_types(&self) -> Vec<BoundDecl> {
        self.param.expand()
    }
}

impl fmt::Display for FuncType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn ({} -> {})", self.param, self.ret)
    }
}

/// A fully resolved type. Equality is structural, except that atomic types
/// compare by identity and named types by their [`TypeHash`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BoundDecl {
    Atomic(Atomic),
    Func(Box<FuncType>),
    Tuple(Vec<BoundDecl>),
    Array { element: Box<BoundDecl>, mutable: bool },
    /// Fields sorted by name.
    Record(Vec<(String, BoundDecl)>),
    Struct(TypeRef),
    Union(TypeRef),
}

impl BoundDecl {
    pub const UNIT: BoundDecl = BoundDecl::Atomic(Atomic::Unit);
    pub const BOOL: BoundDecl = BoundDecl::Atomic(Atomic::Bool);
    pub const INT: BoundDecl = BoundDecl::Atomic(Atomic::Int);
    pub const STRING: BoundDecl = BoundDecl::Atomic(Atomic::String);
    pub const EARLY_RETURN: BoundDecl = BoundDecl::Atomic(Atomic::EarlyReturn);

    pub fn func(param: BoundDecl, ret: BoundDecl) -> Self {
        BoundDecl::Func(Box::new(FuncType::new(param, ret)))
    }

    pub fn array(element: BoundDecl, mutable: bool) -> Self {
        BoundDecl::Array {
            element: Box::new(element),
            mutable,
        }
    }

    /// Builds a record type, sorting fields by name.
    pub fn record(mut fields: Vec<(String, BoundDecl)>) -> Self {
        fields.sort_by(|a, b| a.0.cmp(&b.0));
        BoundDecl::Record(fields)
    }

    /// Unit for no parameters, the type itself for one, a tuple otherwise.
    pub fn from_params(mut params: Vec<BoundDecl>) -> Self {
        match params.len() {
            0 => BoundDecl::UNIT,
            1 => params.remove(0),
            _ => BoundDecl::Tuple(params),
        }
    }

    /// Flattens an argument type into the list of types passed: Unit is
    /// nothing, a tuple is its fields, anything else is itself.
    pub fn expand(&self) -> Vec<BoundDecl> {
        match self {
            BoundDecl::Atomic(Atomic::Unit) => Vec::new(),
            BoundDecl::Tuple(fields) => fields.clone(),
            other => vec![other.clone()],
        }
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, BoundDecl::Atomic(Atomic::Unit))
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, BoundDecl::Atomic(Atomic::Bool))
    }

    pub fn as_func(&self) -> Option<&FuncType> {
        match self {
            BoundDecl::Func(func) => Some(func),
            _ => None,
        }
    }

    /// The referenced type for structs and unions.
    pub fn type_ref(&self) -> Option<&TypeRef> {
        match self {
            BoundDecl::Struct(ty) | BoundDecl::Union(ty) => Some(ty),
            _ => None,
        }
    }
}

impl fmt::Display for BoundDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundDecl::Atomic(atomic) => write!(f, "{atomic}"),
            BoundDecl::Func(func) => write!(f, "{func}"),
            BoundDecl::Tuple(fields) => {
                let fields: Vec<_> = fields.iter().map(|field| field.to_string()).collect();
                write!(f, "({})", fields.join(", "))
            }
            BoundDecl::Array { element, mutable: false } => write!(f, "Array[{element}]"),
            BoundDecl::Array { element, mutable: true } => write!(f, "MutableArray[{element}]"),
            BoundDecl::Record(fields) => {
                let fields: Vec<_> = fields.iter().map(|(name, ty)| format!("{name}: {ty}")).collect();
                write!(f, "{{{}}}", fields.join(", "))
            }
            BoundDecl::Struct(ty) | BoundDecl::Union(ty) => write!(f, "{ty}"),
        }
    }
}
