//! Template instantiation logic.
//!
//! Instances are registered before anything inside them is bound, so a
//! generic that refers to itself, directly or through another generic, finds
//! its own half-built instance instead of instantiating again.

use std::rc::Rc;

use log::debug;
use pie_core::{
    BoundDecl, CompilationError, FuncType, Function, NameSearchSpace, Span, TypeRef, UnboundDecl, unique_name,
};
use pie_registry::{BoundFunction, Callable, CompanionTemplate, FunctionBody, FunctionTemplate, PendingBody, TypeTemplate};

use super::inference::infer_type_args;
use crate::Result;
use crate::context::{BindingContext, CompilationContext};

impl CompilationContext {
    /// Instantiate a generic struct or union with concrete type arguments.
    ///
    /// Returns the instance type. The instance is declared, then its fields
    /// or cases are bound and its companion functions registered. A second
    /// request for the same arguments returns the cached instance.
    pub fn instantiate_type(&mut self, name: &str, type_args: &[BoundDecl], span: Span) -> Result<BoundDecl> {
        let template = self
            .templates
            .type_template(name)
            .cloned()
            .ok_or_else(|| CompilationError::UnknownType {
                name: name.to_string(),
                span,
            })?;

        let as_decl = |ty: TypeRef| match &template {
            TypeTemplate::Struct(_) => BoundDecl::Struct(ty),
            TypeTemplate::Union(_) => BoundDecl::Union(ty),
        };

        if let Some(cached) = self.instances.get_type_instance(name, type_args) {
            return Ok(as_decl(cached.clone()));
        }

        let expected = template.type_params().len();
        if type_args.len() != expected {
            return Err(CompilationError::TypeArgCountMismatch {
                name: name.to_string(),
                expected,
                found: type_args.len(),
                span,
            });
        }

        let ty = TypeRef::new(name, type_args.to_vec());
        let decl = as_decl(ty.clone());
        self.types.declare(decl.clone(), span)?;
        self.instances.cache_type_instance(name, type_args, ty.clone());
        debug!("instantiated type {ty}");

        let binding = BindingContext::generic(template.search_space().clone(), template.type_params(), type_args);
        match &template {
            TypeTemplate::Struct(structure) => self.define_struct(&binding, structure, ty)?,
            TypeTemplate::Union(union) => self.define_union(&binding, union, ty)?,
        }

        Ok(decl)
    }

    /// Instantiate a generic function for a call with argument type `arg_ty`.
    ///
    /// Uses `explicit_args` when the call site wrote type arguments, otherwise
    /// infers them from `arg_ty`. Returns the instance's unique name, or
    /// `None` if this template does not fit the call. The instance's body is
    /// bound in the template's namespace combined with `call_space`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn instantiate_function(
        &mut self,
        template: &Rc<Function>,
        explicit_args: &[BoundDecl],
        arg_ty: &BoundDecl,
        call_space: &NameSearchSpace,
        span: Span,
    ) -> Result<Option<String>> {
        let Some(type_args) = template_args(&template.type_params, &template.param_type(), explicit_args, arg_ty)
        else {
            return Ok(None);
        };

        let key = FunctionTemplate::User(Rc::clone(template)).key();
        if let Some(cached) = self.cached_instance(&key, &type_args, arg_ty) {
            return Ok(Some(cached));
        }

        let binding = BindingContext::generic(
            template.search_space.combined(call_space),
            &template.type_params,
            &type_args,
        );

        let mut params = Vec::with_capacity(template.params.len());
        for param in &template.params {
            params.push(self.bind_type(&binding, &param.ty)?);
        }
        let ret = self.bind_type(&binding, &template.ret)?;
        let ty = FuncType::from_params(params, ret);

        if ty.param != *arg_ty {
            return Ok(None);
        }

        let unique = unique_name(&template.name, &type_args, &ty.param_types());
        if self.functions.contains(&unique) {
            return Ok(Some(unique));
        }

        let instance = BoundFunction::new(
            template.name.clone(),
            type_args.clone(),
            ty,
            template.span,
            FunctionBody::Pending(PendingBody {
                source: Rc::clone(template),
                substitution: binding.substitution,
                search_space: binding.search_space,
            }),
        );
        self.functions.add(Callable::Function(instance), span)?;
        self.instances.cache_function_instance(&key, &type_args, unique.clone());
        debug!("instantiated function {unique}");

        self.bind_function_body(&unique)?;
        Ok(Some(unique))
    }

    /// Resolve a companion of a generic type: instantiate the owning type
    /// for the inferred arguments and look up the concrete companion it
    /// registered.
    pub fn instantiate_companion(
        &mut self,
        template: &CompanionTemplate,
        explicit_args: &[BoundDecl],
        arg_ty: &BoundDecl,
        span: Span,
    ) -> Result<Option<String>> {
        let Some(type_args) = template_args(&template.type_params, &template.param, explicit_args, arg_ty) else {
            return Ok(None);
        };

        let key = format!("{}/{}", template.owner, template.name);
        if let Some(cached) = self.cached_instance(&key, &type_args, arg_ty) {
            return Ok(Some(cached));
        }

        self.instantiate_type(&template.owner, &type_args, span)?;

        let found = self
            .functions
            .find(&template.name, &type_args, &arg_ty.expand())
            .map(Callable::unique_name);
        if let Some(unique) = &found {
            self.instances.cache_function_instance(&key, &type_args, unique.clone());
        }
        Ok(found)
    }

    /// An instance of the template `key` already created for `type_args`
    /// that accepts `arg_ty`.
    pub(crate) fn cached_instance(&self, key: &str, type_args: &[BoundDecl], arg_ty: &BoundDecl) -> Option<String> {
        self.instances
            .function_instances(key, type_args)
            .iter()
            .find(|unique| {
                self.functions
                    .get(unique)
                    .is_some_and(|callable| callable.ty().param == *arg_ty)
            })
            .cloned()
    }
}

/// Explicit type arguments if given, inferred ones otherwise; `None` when
/// neither yields exactly one argument per parameter.
fn template_args(
    type_params: &[String],
    param: &UnboundDecl,
    explicit_args: &[BoundDecl],
    arg_ty: &BoundDecl,
) -> Option<Vec<BoundDecl>> {
    let type_args = if explicit_args.is_empty() {
        infer_type_args(type_params, param, arg_ty)?
    } else {
        explicit_args.to_vec()
    };

    (type_args.len() == type_params.len()).then_some(type_args)
}
