//! Type-argument inference.
//!
//! Walks a template's unbound parameter type in lock-step with the bound
//! argument type of a call. Wherever the parameter names one of the
//! template's type parameters, that parameter is bound to the matching
//! argument subtree; a repeated parameter must match its earlier binding.

use pie_core::{BoundDecl, UnboundDecl};

/// Infers one concrete type per entry of `type_params`.
///
/// Returns `None` if the shapes disagree, a parameter is bound to two
/// different types, or some parameter does not occur in `param` at all.
///
/// # Example
///
/// `Foo[A] (a A, b A)` called with `(Int, Int)` infers `A = Int`; called with
/// `(Int, String)` it fails.
pub fn infer_type_args(type_params: &[String], param: &UnboundDecl, arg: &BoundDecl) -> Option<Vec<BoundDecl>> {
    let mut inferrer = TypeArgInferrer {
        type_params,
        inferred: vec![None; type_params.len()],
        failed: false,
    };

    inferrer.walk(param, arg);

    if inferrer.failed {
        return None;
    }
    inferrer.inferred.into_iter().collect()
}

struct TypeArgInferrer<'a> {
    type_params: &'a [String],
    inferred: Vec<Option<BoundDecl>>,
    failed: bool,
}

impl TypeArgInferrer<'_> {
    fn walk(&mut self, param: &UnboundDecl, arg: &BoundDecl) {
        if self.failed || self.try_infer_param(param, arg) {
            return;
        }

        // The argument's shape decides what the parameter must look like.
        // Atomic arguments constrain nothing here; the bound signature is
        // checked against the argument after instantiation.
        match arg {
            BoundDecl::Atomic(_) => {}
            BoundDecl::Func(func) => match param {
                UnboundDecl::Func { param, ret } => {
                    self.walk(param, &func.param);
                    self.walk(ret, &func.ret);
                }
                _ => self.failed = true,
            },
            BoundDecl::Tuple(fields) => match param {
                UnboundDecl::Tuple(params) if params.len() == fields.len() => {
                    for (param, field) in params.iter().zip(fields) {
                        self.walk(param, field);
                    }
                }
                _ => self.failed = true,
            },
            BoundDecl::Array { element, .. } => match param {
                UnboundDecl::Array { element: param, .. } => self.walk(param, element),
                _ => self.failed = true,
            },
            BoundDecl::Record(fields) => match param {
                UnboundDecl::Record(params) if params.len() == fields.len() => {
                    for (name, field) in fields {
                        match params.iter().find(|(param_name, _)| param_name == name) {
                            Some((_, param)) => self.walk(param, field),
                            None => self.failed = true,
                        }
                    }
                }
                _ => self.failed = true,
            },
            BoundDecl::Struct(ty) | BoundDecl::Union(ty) => match param {
                UnboundDecl::Named { type_args, .. } if type_args.len() == ty.type_args.len() => {
                    for (param, arg) in type_args.iter().zip(&ty.type_args) {
                        self.walk(param, arg);
                    }
                }
                UnboundDecl::Bound(_) => {}
                _ => self.failed = true,
            },
        }
    }

    /// If `param` is a bare type parameter, binds or checks it and returns true.
    fn try_infer_param(&mut self, param: &UnboundDecl, arg: &BoundDecl) -> bool {
        let UnboundDecl::Named { name, type_args, .. } = param else {
            return false;
        };
        if !type_args.is_empty() {
            return false;
        }
        let Some(index) = self.type_params.iter().position(|type_param| type_param == name) else {
            return false;
        };

        match &self.inferred[index] {
            None => self.inferred[index] = Some(arg.clone()),
            Some(previous) if previous == arg => {}
            Some(_) => self.failed = true,
        }
        true
    }
}
