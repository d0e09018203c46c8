//! Type binding: [`UnboundDecl`] to [`BoundDecl`].
//!
//! Binding is a pure transform. Atomic and already-bound declarations come
//! back unchanged; composite declarations bind their children in order;
//! named declarations are looked up, instantiating a generic type on demand.

use pie_core::{BoundDecl, CompilationError, NameSearchSpace, Span, UnboundDecl, type_instance_name};

use crate::Result;
use crate::context::{BindingContext, CompilationContext};

impl CompilationContext {
    /// Bind a type declaration under `binding`.
    pub fn bind_type(&mut self, binding: &BindingContext, decl: &UnboundDecl) -> Result<BoundDecl> {
        match decl {
            UnboundDecl::Atomic(atomic) => Ok(BoundDecl::Atomic(*atomic)),
            UnboundDecl::Bound(bound) => Ok(bound.clone()),
            UnboundDecl::Func { param, ret } => {
                let param = self.bind_type(binding, param)?;
                let ret = self.bind_type(binding, ret)?;
                Ok(BoundDecl::func(param, ret))
            }
            UnboundDecl::Tuple(fields) => Ok(BoundDecl::Tuple(self.bind_types(binding, fields)?)),
            UnboundDecl::Array { element, mutable } => {
                let element = self.bind_type(binding, element)?;
                Ok(BoundDecl::array(element, *mutable))
            }
            UnboundDecl::Record(fields) => {
                let mut bound = Vec::with_capacity(fields.len());
                for (name, ty) in fields {
                    bound.push((name.clone(), self.bind_type(binding, ty)?));
                }
                Ok(BoundDecl::record(bound))
            }
            UnboundDecl::Named { name, type_args, span } => {
                if let Some(substituted) = binding.substitute(name) {
                    if !type_args.is_empty() {
                        return Err(CompilationError::type_mismatch(
                            *span,
                            format!("type parameter {name} cannot take type arguments"),
                        ));
                    }
                    return Ok(substituted.clone());
                }

                let type_args = self.bind_types(binding, type_args)?;
                self.find_type(&binding.search_space, name, &type_args, *span)
            }
        }
    }

    pub fn bind_types(&mut self, binding: &BindingContext, decls: &[UnboundDecl]) -> Result<Vec<BoundDecl>> {
        decls.iter().map(|decl| self.bind_type(binding, decl)).collect()
    }

    /// Find a named type through `search_space`, instantiating a generic
    /// type template if one matches and the instance does not exist yet.
    pub fn find_type(
        &mut self,
        search_space: &NameSearchSpace,
        name: &str,
        type_args: &[BoundDecl],
        span: Span,
    ) -> Result<BoundDecl> {
        for candidate in search_space.search_for(name) {
            if let Some(found) = self.types.find(&type_instance_name(&candidate, type_args)) {
                return Ok(found.clone());
            }

            if self.templates.type_template(&candidate).is_some() {
                return self.instantiate_type(&candidate, type_args, span);
            }
        }

        Err(CompilationError::UnknownType {
            name: type_instance_name(name, type_args),
            span,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pie_core::TypeRef;

    #[test]
    fn atomic_and_bound_are_unchanged() {
        let mut context = CompilationContext::new();
        let binding = BindingContext::default();

        assert_eq!(context.bind_type(&binding, &UnboundDecl::INT).unwrap(), BoundDecl::INT);

        let point = BoundDecl::Struct(TypeRef::new("Point", vec![]));
        let bound = context.bind_type(&binding, &UnboundDecl::Bound(point.clone())).unwrap();
        assert_eq!(bound, point);
    }

    #[test]
    fn type_parameters_are_substituted() {
        let mut context = CompilationContext::new();
        let binding = BindingContext::generic(NameSearchSpace::global(), &["T".to_string()], &[BoundDecl::STRING]);

        let decl = UnboundDecl::func(
            UnboundDecl::Tuple(vec![UnboundDecl::named("T"), UnboundDecl::INT]),
            UnboundDecl::array(UnboundDecl::named("T"), false),
        );
        let bound = context.bind_type(&binding, &decl).unwrap();
        assert_eq!(
            bound,
            BoundDecl::func(
                BoundDecl::Tuple(vec![BoundDecl::STRING, BoundDecl::INT]),
                BoundDecl::array(BoundDecl::STRING, false)
            )
        );
    }

    #[test]
    fn type_parameters_reject_type_arguments() {
        let mut context = CompilationContext::new();
        let binding = BindingContext::generic(NameSearchSpace::global(), &["T".to_string()], &[BoundDecl::INT]);
        let decl = UnboundDecl::generic("T", vec![UnboundDecl::INT]);
        assert!(context.bind_type(&binding, &decl).is_err());
    }

    #[test]
    fn named_types_search_namespaces() {
        let mut context = CompilationContext::new();
        let point = BoundDecl::Struct(TypeRef::new("Geometry::Point", vec![]));
        context.types.declare(point.clone(), Span::NONE).unwrap();

        let binding = BindingContext::new(NameSearchSpace::new("App", vec!["Geometry".into()]));
        assert_eq!(context.bind_type(&binding, &UnboundDecl::named("Point")).unwrap(), point);

        let err = context
            .bind_type(&BindingContext::default(), &UnboundDecl::named("Point"))
            .unwrap_err();
        assert!(matches!(err, CompilationError::UnknownType { .. }));
    }

    #[test]
    fn records_are_sorted() {
        let mut context = CompilationContext::new();
        let decl = UnboundDecl::Record(vec![("b".into(), UnboundDecl::INT), ("a".into(), UnboundDecl::BOOL)]);
        let bound = context.bind_type(&BindingContext::default(), &decl).unwrap();
        assert_eq!(
            bound,
            BoundDecl::Record(vec![("a".into(), BoundDecl::BOOL), ("b".into(), BoundDecl::INT)])
        );
    }
}
