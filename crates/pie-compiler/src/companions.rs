//! Struct and union definition binding, and their companion functions.
//!
//! Every struct gets a constructor named after the struct, a getter per
//! field, and a setter `field<-` per mutable field. Every union gets, per
//! case, a constructor named after the case, a `Case?` predicate, and a
//! `CaseValue` accessor when the case carries a value.
//!
//! Companions are built directly in bound form. For generic types the same
//! set is registered as [`CompanionTemplate`]s, so a call such as `Some 3`
//! can infer `Option[Int]` and instantiate it.

use std::rc::Rc;

use log::trace;
use pie_core::{
    BoundDecl, BoundExpr, CompilationError, Field, FuncType, Primitive, Span, Struct, StructDef, TypeDef, TypeRef,
    UnboundDecl, Union, UnionCase, UnionDef, qualify,
};
use pie_registry::{BoundFunction, Callable, CompanionTemplate, FunctionBody, FunctionTemplate, TypeTemplate};

use crate::Result;
use crate::context::{BindingContext, CompilationContext};
use crate::scope::load_param;

impl CompilationContext {
    /// Registers a generic struct or union along with templates for its
    /// companion functions.
    pub fn add_type_template(&mut self, template: TypeTemplate) -> Result<()> {
        let owner = template.name().to_string();
        let type_params = template.type_params().to_vec();
        let search_space = template.search_space().clone();
        let namespace = search_space.namespace.clone();

        let this = UnboundDecl::generic(
            owner.clone(),
            type_params.iter().map(UnboundDecl::named).collect(),
        );

        let mut companions = Vec::new();
        match &template {
            TypeTemplate::Struct(structure) => {
                let fields = structure.fields.iter().map(|field| field.ty.clone()).collect();
                companions.push((owner.clone(), UnboundDecl::from_params(fields)));
                for field in &structure.fields {
                    companions.push((qualify(&namespace, &field.name), this.clone()));
                    if field.mutable {
                        companions.push((
                            qualify(&namespace, &format!("{}<-", field.name)),
                            UnboundDecl::Tuple(vec![this.clone(), field.ty.clone()]),
                        ));
                    }
                }
            }
            TypeTemplate::Union(union) => {
                for case in &union.cases {
                    let payload = case.payload.clone().unwrap_or(UnboundDecl::UNIT);
                    companions.push((qualify(&namespace, &case.name), payload));
                    companions.push((qualify(&namespace, &format!("{}?", case.name)), this.clone()));
                    if case.payload.is_some() {
                        companions.push((qualify(&namespace, &format!("{}Value", case.name)), this.clone()));
                    }
                }
            }
        }

        self.templates.add_type(template)?;

        for (name, param) in companions {
            self.templates
                .add_function(FunctionTemplate::Companion(Rc::new(CompanionTemplate {
                    name,
                    owner: owner.clone(),
                    type_params: type_params.clone(),
                    param,
                    search_space: search_space.clone(),
                })));
        }
        Ok(())
    }

    /// Binds the fields of a declared struct, defines it, and registers its
    /// companions.
    pub fn define_struct(&mut self, binding: &BindingContext, structure: &Struct, ty: TypeRef) -> Result<()> {
        let mut fields = Vec::with_capacity(structure.fields.len());
        for (index, field) in structure.fields.iter().enumerate() {
            let index = u8::try_from(index)
                .map_err(|_| CompilationError::other(structure.span, format!("struct {} has too many fields", ty)))?;
            fields.push(Field {
                name: field.name.clone(),
                ty: self.bind_type(binding, &field.ty)?,
                mutable: field.mutable,
                index,
            });
        }

        let def = StructDef {
            ty,
            fields,
            span: structure.span,
            search_space: binding.search_space.clone(),
        };
        self.types.define(TypeDef::Struct(def.clone()));
        self.add_struct_companions(&def)
    }

    /// Binds the cases of a declared union, defines it, and registers its
    /// companions.
    pub fn define_union(&mut self, binding: &BindingContext, union: &Union, ty: TypeRef) -> Result<()> {
        let mut cases = Vec::with_capacity(union.cases.len());
        for (index, case) in union.cases.iter().enumerate() {
            let payload = match &case.payload {
                Some(payload) => self.bind_type(binding, payload)?,
                None => BoundDecl::UNIT,
            };
            cases.push(UnionCase {
                name: case.name.clone(),
                payload,
                index: index as i32,
            });
        }

        let def = UnionDef {
            ty,
            cases,
            span: union.span,
            search_space: binding.search_space.clone(),
        };
        self.types.define(TypeDef::Union(def.clone()));
        self.add_union_companions(&def)
    }

    fn add_struct_companions(&mut self, def: &StructDef) -> Result<()> {
        let this = BoundDecl::Struct(def.ty.clone());
        let namespace = &def.search_space.namespace;
        let type_args = &def.ty.type_args;

        let params: Vec<BoundDecl> = def.fields.iter().map(|field| field.ty.clone()).collect();
        let construct = BoundExpr::Construct {
            fields: (0..params.len()).map(|i| load_param(&params, i)).collect(),
            ty: this.clone(),
        };
        self.add_companion(&def.ty.name, type_args, params, this.clone(), construct, def.span)?;

        for field in &def.fields {
            let getter = BoundExpr::load(BoundExpr::local(0, this.clone()), field.index, field.ty.clone());
            self.add_companion(
                &qualify(namespace, &field.name),
                type_args,
                vec![this.clone()],
                field.ty.clone(),
                getter,
                def.span,
            )?;

            if field.mutable {
                let params = vec![this.clone(), field.ty.clone()];
                let setter = BoundExpr::Store {
                    target: Box::new(load_param(&params, 0)),
                    index: field.index,
                    value: Box::new(load_param(&params, 1)),
                };
                self.add_companion(
                    &qualify(namespace, &format!("{}<-", field.name)),
                    type_args,
                    params,
                    BoundDecl::UNIT,
                    setter,
                    def.span,
                )?;
            }
        }
        Ok(())
    }

    fn add_union_companions(&mut self, def: &UnionDef) -> Result<()> {
        let this = BoundDecl::Union(def.ty.clone());
        let namespace = &def.search_space.namespace;
        let type_args = &def.ty.type_args;

        for case in &def.cases {
            let (params, payload) = if case.has_value() {
                (
                    vec![case.payload.clone()],
                    Some(Box::new(BoundExpr::local(0, case.payload.clone()))),
                )
            } else {
                (Vec::new(), None)
            };
            let construct = BoundExpr::ConstructUnion {
                tag: case.index,
                payload,
                ty: this.clone(),
            };
            self.add_companion(
                &qualify(namespace, &case.name),
                type_args,
                params,
                this.clone(),
                construct,
                def.span,
            )?;

            let tag = BoundExpr::load(BoundExpr::local(0, this.clone()), 0, BoundDecl::INT);
            let check = BoundExpr::Intrinsic {
                ops: vec![Primitive::EqualInt],
                arg: Box::new(BoundExpr::tuple(vec![tag, BoundExpr::Int(case.index)])),
                ty: BoundDecl::BOOL,
            };
            self.add_companion(
                &qualify(namespace, &format!("{}?", case.name)),
                type_args,
                vec![this.clone()],
                BoundDecl::BOOL,
                check,
                def.span,
            )?;

            if case.has_value() {
                let value = BoundExpr::load(BoundExpr::local(0, this.clone()), 1, case.payload.clone());
                self.add_companion(
                    &qualify(namespace, &format!("{}Value", case.name)),
                    type_args,
                    vec![this.clone()],
                    case.payload.clone(),
                    value,
                    def.span,
                )?;
            }
        }
        Ok(())
    }

    fn add_companion(
        &mut self,
        name: &str,
        type_args: &[BoundDecl],
        params: Vec<BoundDecl>,
        ret: BoundDecl,
        body: BoundExpr,
        span: Span,
    ) -> Result<()> {
        let locals = usize::from(!params.is_empty());
        let function = BoundFunction::new(
            name,
            type_args.to_vec(),
            FuncType::from_params(params, ret),
            span,
            FunctionBody::Bound { expr: body, locals },
        );
        trace!("companion {}", function.unique_name);
        self.functions.add(Callable::Function(function), span)
    }
}
