//! The table of callable symbols, keyed by mangled name.

use std::rc::Rc;

use log::trace;
use pie_core::{
    BoundDecl, BoundExpr, CompilationError, FuncType, Function, NameSearchSpace, Primitive, Span,
    SubstitutionMap, TypeHash, unique_name,
};
use rustc_hash::FxHashMap;

/// The body of a registered function.
#[derive(Debug, Clone)]
pub enum FunctionBody {
    /// Signature is bound, body is not yet.
    Pending(PendingBody),
    /// `locals` is the number of local slots the body needs.
    Bound { expr: BoundExpr, locals: usize },
}

/// Everything needed to bind a function body later.
#[derive(Debug, Clone)]
pub struct PendingBody {
    pub source: Rc<Function>,
    /// Type-parameter bindings; empty unless this is a generic instance.
    pub substitution: SubstitutionMap,
    /// Where names in the body are looked up. For generic instances this
    /// also includes the instantiating call site's namespaces.
    pub search_space: NameSearchSpace,
}

/// A user-defined, generated, or instantiated function.
#[derive(Debug, Clone)]
pub struct BoundFunction {
    /// Qualified base name.
    pub name: String,
    pub unique_name: String,
    pub type_args: Vec<BoundDecl>,
    pub ty: FuncType,
    pub span: Span,
    pub body: FunctionBody,
}

impl BoundFunction {
    pub fn new(name: impl Into<String>, type_args: Vec<BoundDecl>, ty: FuncType, span: Span, body: FunctionBody) -> Self {
        let name = name.into();
        let unique_name = unique_name(&name, &type_args, &ty.param_types());
        Self {
            name,
            unique_name,
            type_args,
            ty,
            span,
            body,
        }
    }

    pub fn is_bound(&self) -> bool {
        matches!(self.body, FunctionBody::Bound { .. })
    }

    /// The bound body and its locals count, once bound.
    pub fn bound_body(&self) -> Option<(&BoundExpr, usize)> {
        match &self.body {
            FunctionBody::Bound { expr, locals } => Some((expr, *locals)),
            FunctionBody::Pending(_) => None,
        }
    }

    pub fn func_ref(&self) -> BoundExpr {
        BoundExpr::FuncRef {
            unique_name: self.unique_name.clone(),
            ty: self.ty.clone(),
        }
    }
}

/// A built-in operation compiled inline to primitive opcodes.
#[derive(Debug, Clone, PartialEq)]
pub struct IntrinsicFunction {
    pub name: String,
    pub ops: Vec<Primitive>,
    pub ty: FuncType,
}

impl IntrinsicFunction {
    pub fn new(name: impl Into<String>, ops: &[Primitive], ty: FuncType) -> Self {
        Self {
            name: name.into(),
            ops: ops.to_vec(),
            ty,
        }
    }
}

/// A function supplied by the host and invoked through a foreign-call opcode.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignFunction {
    pub name: String,
    pub id: i32,
    pub params: Vec<BoundDecl>,
    pub ret: BoundDecl,
}

impl ForeignFunction {
    pub fn new(name: impl Into<String>, id: i32, params: Vec<BoundDecl>, ret: BoundDecl) -> Self {
        Self {
            name: name.into(),
            id,
            params,
            ret,
        }
    }

    pub fn ty(&self) -> FuncType {
        FuncType::from_params(self.params.clone(), self.ret.clone())
    }
}

/// Anything a name can resolve to and be called.
#[derive(Debug, Clone)]
pub enum Callable {
    Function(BoundFunction),
    Intrinsic(IntrinsicFunction),
    Foreign(ForeignFunction),
}

impl Callable {
    pub fn name(&self) -> &str {
        match self {
            Callable::Function(function) => &function.name,
            Callable::Intrinsic(intrinsic) => &intrinsic.name,
            Callable::Foreign(foreign) => &foreign.name,
        }
    }

    pub fn type_args(&self) -> &[BoundDecl] {
        match self {
            Callable::Function(function) => &function.type_args,
            Callable::Intrinsic(_) | Callable::Foreign(_) => &[],
        }
    }

    pub fn ty(&self) -> FuncType {
        match self {
            Callable::Function(function) => function.ty.clone(),
            Callable::Intrinsic(intrinsic) => intrinsic.ty.clone(),
            Callable::Foreign(foreign) => foreign.ty(),
        }
    }

    pub fn unique_name(&self) -> String {
        match self {
            Callable::Function(function) => function.unique_name.clone(),
            other => unique_name(other.name(), other.type_args(), &other.ty().param_types()),
        }
    }

    /// Builds the bound expression that calls this with `arg`.
    pub fn create_call(&self, arg: BoundExpr) -> BoundExpr {
        match self {
            Callable::Function(function) => BoundExpr::Call {
                target: Box::new(function.func_ref()),
                arg: Box::new(arg),
                ty: function.ty.ret.clone(),
            },
            Callable::Intrinsic(intrinsic) => BoundExpr::Intrinsic {
                ops: intrinsic.ops.clone(),
                arg: Box::new(arg),
                ty: intrinsic.ty.ret.clone(),
            },
            Callable::Foreign(foreign) => BoundExpr::ForeignCall {
                id: foreign.id,
                arity: foreign.params.len(),
                arg: Box::new(arg),
                ty: foreign.ret.clone(),
            },
        }
    }
}

/// Bound callables keyed by unique (mangled) name, in registration order.
///
/// Indexed by the [`TypeHash`] of the unique name. Holds at most one symbol
/// per key. Generic instances are added here before their bodies are bound,
/// so recursive instantiations find themselves.
#[derive(Debug, Default)]
pub struct FunctionTable {
    callables: Vec<Callable>,
    index: FxHashMap<TypeHash, usize>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a callable, rejecting a second symbol under the same key.
    pub fn add(&mut self, callable: Callable, span: Span) -> Result<(), CompilationError> {
        let key = callable.unique_name();
        let hash = TypeHash::from_function(&key);
        if self.index.contains_key(&hash) {
            return Err(CompilationError::DuplicateDefinition { name: key, span });
        }

        trace!("registered function {key}");
        self.index.insert(hash, self.callables.len());
        self.callables.push(callable);
        Ok(())
    }

    pub fn get(&self, unique_name: &str) -> Option<&Callable> {
        self.index
            .get(&TypeHash::from_function(unique_name))
            .map(|&i| &self.callables[i])
    }

    pub fn contains(&self, unique_name: &str) -> bool {
        self.index.contains_key(&TypeHash::from_function(unique_name))
    }

    /// Looks up the symbol for a fully-qualified name with the given type
    /// arguments and argument types.
    pub fn find(&self, name: &str, type_args: &[BoundDecl], arg_types: &[BoundDecl]) -> Option<&Callable> {
        self.get(&unique_name(name, type_args, arg_types))
    }

    pub fn function(&self, unique_name: &str) -> Option<&BoundFunction> {
        match self.get(unique_name) {
            Some(Callable::Function(function)) => Some(function),
            _ => None,
        }
    }

    /// The unique name and pending body of the first function still awaiting
    /// binding, in registration order.
    pub fn next_pending(&self) -> Option<(String, PendingBody)> {
        self.callables.iter().find_map(|callable| match callable {
            Callable::Function(BoundFunction {
                unique_name,
                body: FunctionBody::Pending(pending),
                ..
            }) => Some((unique_name.clone(), pending.clone())),
            _ => None,
        })
    }

    /// Stores the bound body of a pending function.
    ///
    /// # Panics
    ///
    /// If the function does not exist or was already bound. Both mean the
    /// binder lost track of its own work.
    pub fn set_body(&mut self, unique_name: &str, expr: BoundExpr, locals: usize) {
        let index = *self
            .index
            .get(&TypeHash::from_function(unique_name))
            .unwrap_or_else(|| panic!("no function {unique_name} to bind"));

        match &mut self.callables[index] {
            Callable::Function(function) if !function.is_bound() => {
                function.body = FunctionBody::Bound { expr, locals };
            }
            _ => panic!("function {unique_name} was bound twice"),
        }
    }

    /// Every user, generated, and instantiated function, in registration order.
    pub fn functions(&self) -> impl Iterator<Item = &BoundFunction> {
        self.callables.iter().filter_map(|callable| match callable {
            Callable::Function(function) => Some(function),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.callables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callables.is_empty()
    }
}
