//! Name resolution.
//!
//! A name in a function body is looked up, in order, among:
//!
//! 1. the function's parameters and the locals in scope
//! 2. bound functions, as written, in the current namespace, then in each
//!    `using` namespace, newest first
//! 3. array intrinsics matching the argument's shape
//! 4. generic templates with the candidate name, instantiated on demand
//! 5. fields of a record argument
//!
//! A name without an argument is called with `()`.

use log::trace;
use pie_core::{BoundDecl, BoundExpr, CompilationError, NameSearchSpace, Span, UnboundDecl, unique_name};
use pie_registry::{Callable, FunctionTemplate};

use crate::Result;
use crate::binder::FunctionBinder;
use crate::context::CompilationContext;
use crate::intrinsics::array_intrinsic;

impl CompilationContext {
    /// Finds or instantiates the function `name` callable with `arg_ty`.
    ///
    /// Returns its unique name. Array intrinsics are registered on first use
    /// so later lookups hit the table directly.
    pub fn find_function(
        &mut self,
        search_space: &NameSearchSpace,
        name: &str,
        type_args: &[BoundDecl],
        arg_ty: &BoundDecl,
        span: Span,
    ) -> Result<Option<String>> {
        let arg_types = arg_ty.expand();

        for candidate in search_space.search_for(name) {
            if let Some(callable) = self.functions.find(&candidate, type_args, &arg_types) {
                return Ok(Some(callable.unique_name()));
            }

            if type_args.is_empty()
                && let Some(intrinsic) = array_intrinsic(&candidate, arg_ty)
            {
                let callable = Callable::Intrinsic(intrinsic);
                let unique = callable.unique_name();
                trace!("array intrinsic {unique}");
                self.functions.add(callable, span)?;
                return Ok(Some(unique));
            }

            let templates = self.templates.functions_named(&candidate).to_vec();
            for template in &templates {
                let instance = match template {
                    FunctionTemplate::User(function) => {
                        self.instantiate_function(function, type_args, arg_ty, search_space, span)?
                    }
                    FunctionTemplate::Companion(companion) => {
                        self.instantiate_companion(companion, type_args, arg_ty, span)?
                    }
                };
                if instance.is_some() {
                    return Ok(instance);
                }
            }
        }

        Ok(None)
    }

    /// Whether any candidate for `name` is a generic function.
    pub fn has_template_named(&self, search_space: &NameSearchSpace, name: &str) -> bool {
        search_space
            .search_for(name)
            .any(|candidate| !self.templates.functions_named(&candidate).is_empty())
    }
}

impl FunctionBinder<'_> {
    /// Resolves `name`, optionally applied to `arg`, to a bound expression.
    pub fn resolve_name(
        &mut self,
        name: &str,
        type_args: &[UnboundDecl],
        arg: Option<BoundExpr>,
        span: Span,
    ) -> Result<BoundExpr> {
        if let Some(local) = self.lookup_local(name) {
            if !type_args.is_empty() {
                return Err(CompilationError::type_mismatch(
                    span,
                    format!("local {name} cannot take type arguments"),
                ));
            }
            return match arg {
                None => Ok(local),
                Some(arg) => self.call_value(local, arg, span),
            };
        }

        let type_args = self.bind_types(type_args)?;
        self.call_function(name, &type_args, arg.unwrap_or(BoundExpr::Unit), span)
    }

    /// Calls the function `name` with `arg`, falling back to a field read
    /// when `arg` is a record with a field called `name`.
    pub(crate) fn call_function(
        &mut self,
        name: &str,
        type_args: &[BoundDecl],
        arg: BoundExpr,
        span: Span,
    ) -> Result<BoundExpr> {
        let arg_ty = arg.ty();

        let found = self
            .ctx
            .find_function(&self.binding.search_space, name, type_args, &arg_ty, span)?;
        if let Some(callable) = found.and_then(|unique| self.ctx.functions.get(&unique)) {
            return Ok(callable.create_call(arg));
        }

        if type_args.is_empty()
            && let BoundDecl::Record(fields) = &arg_ty
            && let Some(index) = fields.iter().position(|(field, _)| field == name)
        {
            let ty = fields[index].1.clone();
            return Ok(BoundExpr::load(arg, index as u8, ty));
        }

        if self.ctx.has_template_named(&self.binding.search_space, name) {
            let args = arg_ty.expand().iter().map(ToString::to_string).collect::<Vec<_>>();
            return Err(CompilationError::InferenceFailed {
                name: name.to_string(),
                args: args.join(", "),
                span,
            });
        }

        Err(CompilationError::UnresolvedName {
            name: unique_name(name, type_args, &arg_ty.expand()),
            span,
        })
    }

    /// A parameter or local named `name`, as a load.
    fn lookup_local(&self, name: &str) -> Option<BoundExpr> {
        if let Some(index) = self.param_names.iter().position(|param| param == name) {
            return Some(self.load_param(index));
        }
        self.scope.get(name).map(|local| local.load())
    }
}
