//! Compilation context.
//!
//! [`CompilationContext`] is the per-compile-unit session: it owns every
//! symbol table, and each binding pass borrows it mutably. Nothing here is
//! global, so two compilers never share state.
//!
//! [`BindingContext`] is the lexical situation code is bound in: which
//! namespaces are visible and, inside a generic instance, what each type
//! parameter stands for.

use pie_core::{BoundDecl, NameSearchSpace, SubstitutionMap};
use pie_registry::{FunctionTable, InstanceCache, TemplateRegistry, TypeTable};

/// All symbol tables of one compile unit.
#[derive(Debug, Default)]
pub struct CompilationContext {
    pub functions: FunctionTable,
    pub types: TypeTable,
    pub templates: TemplateRegistry,
    pub instances: InstanceCache,
    generated_names: usize,
}

impl CompilationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh name for compiler-generated locals and functions. The space
    /// keeps it out of reach of user code.
    pub fn generate_name(&mut self, hint: &str) -> String {
        self.generated_names += 1;
        format!("{hint} {}", self.generated_names)
    }
}

/// Where a declaration or body is being bound.
#[derive(Debug, Clone, Default)]
pub struct BindingContext {
    pub search_space: NameSearchSpace,
    /// Type-parameter bindings. Empty outside of generic instances.
    pub substitution: SubstitutionMap,
}

impl BindingContext {
    pub fn new(search_space: NameSearchSpace) -> Self {
        Self {
            search_space,
            substitution: SubstitutionMap::default(),
        }
    }

    /// Context for binding a generic template under `type_args`.
    pub fn generic(search_space: NameSearchSpace, type_params: &[String], type_args: &[BoundDecl]) -> Self {
        let substitution = type_params.iter().cloned().zip(type_args.iter().cloned()).collect();
        Self {
            search_space,
            substitution,
        }
    }

    /// The concrete type a type parameter stands for, if `name` is one.
    pub fn substitute(&self, name: &str) -> Option<&BoundDecl> {
        self.substitution.get(name)
    }
}
