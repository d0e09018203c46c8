//! Registration: declare every type and function signature of a compile unit.
//!
//! Runs before any body is bound, in three steps over all source files:
//!
//! 1. Generic structs, unions, and functions go to the template registry;
//!    concrete structs and unions are declared so their names resolve.
//! 2. Concrete structs and unions are defined (fields and cases bound) and
//!    their companion functions registered.
//! 3. Concrete function signatures are bound and the functions registered
//!    with pending bodies.
//!
//! Declaring every type before defining any lets types refer to each other
//! regardless of order.

use std::rc::Rc;

use log::{debug, trace};
use pie_core::{
    BoundDecl, FuncType, Function, NameSearchSpace, Namespace, SourceFile, Struct, SubstitutionMap, TypeRef, Union,
    qualify,
};
use pie_registry::{BoundFunction, Callable, FunctionBody, FunctionTemplate, PendingBody, TypeTemplate};

use crate::Result;
use crate::context::{BindingContext, CompilationContext};

/// Counts of what a registration run added.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationOutput {
    pub types_registered: usize,
    pub functions_registered: usize,
    pub templates_registered: usize,
}

/// Declarations collected in the first step, waiting for the later ones.
#[derive(Default)]
struct Declared {
    structs: Vec<Struct>,
    unions: Vec<Union>,
    functions: Vec<Function>,
}

/// Registers the declarations of a set of source files.
pub struct RegistrationPass<'a> {
    ctx: &'a mut CompilationContext,
    declared: Declared,
    output: RegistrationOutput,
}

impl<'a> RegistrationPass<'a> {
    pub fn new(ctx: &'a mut CompilationContext) -> Self {
        Self {
            ctx,
            declared: Declared::default(),
            output: RegistrationOutput::default(),
        }
    }

    /// Runs all three steps over `sources`.
    pub fn run(mut self, sources: &[SourceFile]) -> Result<RegistrationOutput> {
        for file in sources {
            trace!("registering {}", file.path);
            self.visit_namespace(&file.root, "", &file.usings)?;
        }

        let Declared {
            structs,
            unions,
            functions,
        } = std::mem::take(&mut self.declared);

        for structure in &structs {
            let binding = BindingContext::new(structure.search_space.clone());
            self.ctx
                .define_struct(&binding, structure, TypeRef::new(structure.name.clone(), vec![]))?;
        }
        for union in &unions {
            let binding = BindingContext::new(union.search_space.clone());
            self.ctx
                .define_union(&binding, union, TypeRef::new(union.name.clone(), vec![]))?;
        }

        for function in functions {
            self.register_function(function)?;
        }

        debug!(
            "registered {} type(s), {} function(s), {} template(s)",
            self.output.types_registered, self.output.functions_registered, self.output.templates_registered
        );
        Ok(self.output)
    }

    // ==========================================================================
    // Declaration
    // ==========================================================================

    fn visit_namespace(&mut self, namespace: &Namespace, parent: &str, usings: &[String]) -> Result<()> {
        let name = if namespace.name.is_empty() {
            parent.to_string()
        } else {
            qualify(parent, &namespace.name)
        };
        let space = NameSearchSpace::new(name.clone(), usings.to_vec());

        for structure in &namespace.structs {
            self.declare_struct(structure.clone().qualified_in(&space))?;
        }
        for union in &namespace.unions {
            self.declare_union(union.clone().qualified_in(&space))?;
        }
        for function in &namespace.functions {
            self.declare_function(function.clone().qualified_in(&space));
        }

        for nested in &namespace.namespaces {
            self.visit_namespace(nested, &name, usings)?;
        }
        Ok(())
    }

    fn declare_struct(&mut self, structure: Struct) -> Result<()> {
        if !structure.type_params.is_empty() {
            self.output.templates_registered += 1;
            return self.ctx.add_type_template(TypeTemplate::Struct(Rc::new(structure)));
        }

        let ty = TypeRef::new(structure.name.clone(), vec![]);
        self.ctx.types.declare(BoundDecl::Struct(ty), structure.span)?;
        self.output.types_registered += 1;
        self.declared.structs.push(structure);
        Ok(())
    }

    fn declare_union(&mut self, union: Union) -> Result<()> {
        if !union.type_params.is_empty() {
            self.output.templates_registered += 1;
            return self.ctx.add_type_template(TypeTemplate::Union(Rc::new(union)));
        }

        let ty = TypeRef::new(union.name.clone(), vec![]);
        self.ctx.types.declare(BoundDecl::Union(ty), union.span)?;
        self.output.types_registered += 1;
        self.declared.unions.push(union);
        Ok(())
    }

    fn declare_function(&mut self, function: Function) {
        if function.is_generic() {
            self.output.templates_registered += 1;
            self.ctx
                .templates
                .add_function(FunctionTemplate::User(Rc::new(function)));
        } else {
            self.declared.functions.push(function);
        }
    }

    // ==========================================================================
    // Signatures
    // ==========================================================================

    fn register_function(&mut self, function: Function) -> Result<()> {
        let binding = BindingContext::new(function.search_space.clone());

        let mut params = Vec::with_capacity(function.params.len());
        for param in &function.params {
            params.push(self.ctx.bind_type(&binding, &param.ty)?);
        }
        let ret = self.ctx.bind_type(&binding, &function.ret)?;

        let span = function.span;
        let bound = BoundFunction::new(
            function.name.clone(),
            Vec::new(),
            FuncType::from_params(params, ret),
            span,
            FunctionBody::Pending(PendingBody {
                search_space: function.search_space.clone(),
                substitution: SubstitutionMap::default(),
                source: Rc::new(function),
            }),
        );
        self.ctx.functions.add(Callable::Function(bound), span)?;
        self.output.functions_registered += 1;
        Ok(())
    }
}
