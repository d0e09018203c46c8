//! Function body binding.
//!
//! [`FunctionBinder`] turns one function's [`UnboundExpr`] body into a
//! [`BoundExpr`], resolving names, checking types, and desugaring loops,
//! `let`, quoted syntax, local functions, and `match` on the way.

mod sugar;

use std::rc::Rc;

use log::debug;
use pie_core::{
    BoundDecl, BoundExpr, CompilationError, FuncType, Function, LoopClause, MatchCase, Param, Span, UnboundDecl,
    UnboundExpr, qualify,
};
use pie_registry::{BoundFunction, Callable, FunctionBody, PendingBody};

use crate::Result;
use crate::context::{BindingContext, CompilationContext};
use crate::pattern;
use crate::scope::{LocalScope, load_param};

impl CompilationContext {
    /// Binds the body of a registered, still pending function.
    ///
    /// Does nothing if the body is already bound.
    pub fn bind_function_body(&mut self, unique_name: &str) -> Result<()> {
        let Some(function) = self.functions.function(unique_name) else {
            panic!("no function {unique_name} to bind");
        };
        let FunctionBody::Pending(pending) = &function.body else {
            return Ok(());
        };

        let ty = function.ty.clone();
        let pending = pending.clone();
        let source = Rc::clone(&pending.source);
        debug!("binding {unique_name}");

        let params = param_list(&ty, source.params.len());
        let binding = BindingContext {
            search_space: pending.search_space,
            substitution: pending.substitution,
        };

        let mut binder = FunctionBinder::new(self, binding, &source.params, params);
        let body = binder.bind_expr(&source.body)?;
        let locals = binder.scope.frame_size();
        let returns = std::mem::take(&mut binder.returns);

        for (returned, span) in returns {
            if returned != ty.ret {
                return Err(CompilationError::ReturnTypeMismatch {
                    name: source.name.clone(),
                    declared: ty.ret.to_string(),
                    actual: returned.to_string(),
                    span,
                });
            }
        }

        let actual = body.ty();
        if actual == BoundDecl::EARLY_RETURN {
            return Err(CompilationError::other(
                source.span,
                format!("unneeded explicit return at the end of {}", source.name),
            ));
        }
        if actual != ty.ret {
            return Err(CompilationError::ReturnTypeMismatch {
                name: source.name.clone(),
                declared: ty.ret.to_string(),
                actual: actual.to_string(),
                span: source.span,
            });
        }

        self.functions.set_body(unique_name, body, locals);
        Ok(())
    }
}

/// The declared parameter types of a signature taking `count` parameters.
fn param_list(ty: &FuncType, count: usize) -> Vec<BoundDecl> {
    match (count, &ty.param) {
        (0, _) => Vec::new(),
        (1, param) => vec![param.clone()],
        (_, BoundDecl::Tuple(fields)) => fields.clone(),
        (_, param) => panic!("signature {param} does not match {count} parameters"),
    }
}

/// Binds the body of a single function.
pub struct FunctionBinder<'a> {
    pub(crate) ctx: &'a mut CompilationContext,
    pub(crate) binding: BindingContext,
    pub(crate) param_names: Vec<String>,
    pub(crate) params: Vec<BoundDecl>,
    pub(crate) scope: LocalScope,
    /// Type and position of every `return` bound so far.
    returns: Vec<(BoundDecl, Span)>,
}

impl<'a> FunctionBinder<'a> {
    pub fn new(
        ctx: &'a mut CompilationContext,
        binding: BindingContext,
        source_params: &[Param],
        params: Vec<BoundDecl>,
    ) -> Self {
        Self {
            ctx,
            binding,
            param_names: source_params.iter().map(|param| param.name.clone()).collect(),
            scope: LocalScope::new(!params.is_empty()),
            params,
            returns: Vec::new(),
        }
    }

    /// Loads parameter `index` of the function being bound.
    pub(crate) fn load_param(&self, index: usize) -> BoundExpr {
        load_param(&self.params, index)
    }

    pub(crate) fn bind_type(&mut self, decl: &UnboundDecl) -> Result<BoundDecl> {
        self.ctx.bind_type(&self.binding, decl)
    }

    pub(crate) fn bind_types(&mut self, decls: &[UnboundDecl]) -> Result<Vec<BoundDecl>> {
        self.ctx.bind_types(&self.binding, decls)
    }

    // ==========================================================================
    // Expressions
    // ==========================================================================

    pub fn bind_expr(&mut self, expr: &UnboundExpr) -> Result<BoundExpr> {
        match expr {
            UnboundExpr::Unit(_) => Ok(BoundExpr::Unit),
            UnboundExpr::Bool(value, _) => Ok(BoundExpr::Bool(*value)),
            UnboundExpr::Int(value, _) => Ok(BoundExpr::Int(*value)),
            UnboundExpr::String(value, _) => Ok(BoundExpr::String(value.clone())),
            UnboundExpr::Bound(bound) => Ok(bound.clone()),

            UnboundExpr::Name { name, type_args, span } => self.resolve_name(name, type_args, None, *span),
            UnboundExpr::Call { target, arg, span } => self.bind_call(target, arg, *span),
            UnboundExpr::Operator { left, op, right, span } => {
                let arg = UnboundExpr::Tuple(vec![(**left).clone(), (**right).clone()], *span);
                let arg = self.bind_expr(&arg)?;
                self.resolve_name(op, &[], Some(arg), *span)
            }

            UnboundExpr::Assign { target, value, span } => self.bind_assign(target, value, *span),
            UnboundExpr::Define {
                names,
                value,
                mutable,
                span,
            } => self.bind_define(names, value, *mutable, *span),
            UnboundExpr::Block(exprs, span) => self.bind_block(exprs, *span),

            UnboundExpr::If {
                condition,
                then_body,
                else_body,
                span,
            } => self.bind_if(condition, then_body, else_body.as_deref(), *span),
            UnboundExpr::While { condition, body, span } => self.bind_while(condition, body, *span),

            UnboundExpr::Loop { clauses, body, span } => self.bind_loop(clauses, body, *span),
            UnboundExpr::Let {
                names,
                value,
                then_body,
                else_body,
                span,
            } => {
                let desugared = sugar::desugar_let(self.ctx, names, value, then_body, else_body, *span);
                self.bind_expr(&desugared)
            }
            UnboundExpr::Match { value, cases, span } => self.bind_match(value, cases, *span),
            UnboundExpr::Syntax(quoted, _) => {
                let desugared = sugar::syntax_literal(quoted)?;
                self.bind_expr(&desugared)
            }
            UnboundExpr::LocalFunction {
                params,
                ret,
                body,
                span,
            } => self.bind_local_function(params, ret, body, *span),
            UnboundExpr::FuncRef {
                name,
                type_args,
                param_types,
                span,
            } => self.bind_func_ref(name, type_args, param_types, *span),

            UnboundExpr::Tuple(fields, _) => {
                let fields = fields
                    .iter()
                    .map(|field| self.bind_expr(field))
                    .collect::<Result<Vec<_>>>()?;
                Ok(BoundExpr::tuple(fields))
            }
            UnboundExpr::Array {
                elements,
                element_type,
                mutable,
                span,
            } => self.bind_array(elements, element_type.as_ref(), *mutable, *span),
            UnboundExpr::Record(fields, _) => {
                let mut bound = Vec::with_capacity(fields.len());
                for (name, value) in fields {
                    bound.push((name.clone(), self.bind_expr(value)?));
                }
                bound.sort_by(|a, b| a.0.cmp(&b.0));

                let ty = BoundDecl::Record(bound.iter().map(|(name, value)| (name.clone(), value.ty())).collect());
                let fields = bound.into_iter().map(|(_, value)| value).collect();
                Ok(BoundExpr::Construct { fields, ty })
            }
            UnboundExpr::TupleField { tuple, index, span } => {
                let tuple = self.bind_expr(tuple)?;
                match tuple.ty() {
                    BoundDecl::Tuple(fields) if *index < fields.len() => {
                        let ty = fields[*index].clone();
                        Ok(BoundExpr::load(tuple, *index as u8, ty))
                    }
                    other => Err(CompilationError::type_mismatch(
                        *span,
                        format!("cannot read field {index} of a value of type {other}"),
                    )),
                }
            }
            UnboundExpr::Return { value, span } => {
                let value = self.bind_expr(value)?;
                self.returns.push((value.ty(), *span));
                Ok(BoundExpr::Return(Box::new(value)))
            }
        }
    }

    fn bind_call(&mut self, target: &UnboundExpr, arg: &UnboundExpr, span: Span) -> Result<BoundExpr> {
        let arg = self.bind_expr(arg)?;

        if let UnboundExpr::Name { name, type_args, span } = target {
            return self.resolve_name(name, type_args, Some(arg), *span);
        }

        let target = self.bind_expr(target)?;
        self.call_value(target, arg, span)
    }

    /// Calls a computed value: a function value directly, anything else
    /// through `__Call`.
    pub(crate) fn call_value(&mut self, target: BoundExpr, arg: BoundExpr, span: Span) -> Result<BoundExpr> {
        if let BoundDecl::Func(func) = target.ty() {
            if func.param != arg.ty() {
                return Err(CompilationError::type_mismatch(
                    span,
                    format!(
                        "argument of type {} passed to a function value expecting {}",
                        arg.ty(),
                        func.param
                    ),
                ));
            }
            return Ok(BoundExpr::Call {
                target: Box::new(target),
                arg: Box::new(arg),
                ty: func.ret.clone(),
            });
        }

        let arg = BoundExpr::tuple(vec![target, arg]);
        self.call_function("__Call", &[], arg, span)
    }

    // ==========================================================================
    // Locals
    // ==========================================================================

    fn bind_define(&mut self, names: &[String], value: &UnboundExpr, mutable: bool, span: Span) -> Result<BoundExpr> {
        let value = self.bind_expr(value)?;

        if let [name] = names {
            let local = self.scope.declare(name, value.ty(), mutable, span)?;
            return Ok(store_local(local.slot, value));
        }

        // `def a b <- pair` destructures through a hidden local.
        let BoundDecl::Tuple(fields) = value.ty() else {
            return Err(CompilationError::type_mismatch(
                span,
                format!("cannot destructure a value of type {} into {} names", value.ty(), names.len()),
            ));
        };
        if fields.len() != names.len() {
            return Err(CompilationError::type_mismatch(
                span,
                format!("cannot destructure a {}-field tuple into {} names", fields.len(), names.len()),
            ));
        }

        let temp_name = self.ctx.generate_name("def");
        let temp = self.scope.declare(&temp_name, value.ty(), false, span)?;
        let mut stores = vec![store_local(temp.slot, value)];
        for (index, (name, ty)) in names.iter().zip(fields).enumerate() {
            let local = self.scope.declare(name, ty.clone(), mutable, span)?;
            stores.push(store_local(local.slot, BoundExpr::load(temp.load(), index as u8, ty)));
        }
        Ok(BoundExpr::Block(stores))
    }

    fn bind_assign(&mut self, target: &UnboundExpr, value: &UnboundExpr, span: Span) -> Result<BoundExpr> {
        let value = self.bind_expr(value)?;

        match target {
            UnboundExpr::Name { name, type_args, span } if type_args.is_empty() && self.is_local(name) => {
                let local = match self.scope.get(name) {
                    Some(local) if !self.param_names.contains(name) => local.clone(),
                    // parameters are never assignable
                    _ => {
                        return Err(CompilationError::ImmutableAssignment {
                            name: name.clone(),
                            span: *span,
                        });
                    }
                };
                if !local.mutable {
                    return Err(CompilationError::ImmutableAssignment {
                        name: name.clone(),
                        span: *span,
                    });
                }
                if local.ty != value.ty() {
                    return Err(CompilationError::type_mismatch(
                        *span,
                        format!("cannot assign a value of type {} to {name} of type {}", value.ty(), local.ty),
                    ));
                }
                Ok(store_local(local.slot, value))
            }
            // `name <- value` calls the setter `name<-`.
            UnboundExpr::Name { name, type_args, span } => {
                self.resolve_name(&format!("{name}<-"), type_args, Some(value), *span)
            }
            UnboundExpr::Call {
                target: call_target,
                arg,
                span,
            } => {
                let arg = self.bind_expr(arg)?;
                match &**call_target {
                    // `y point <- 3` calls `y<- (point, 3)`.
                    UnboundExpr::Name { name, type_args, span } if !self.is_local(name) => {
                        self.resolve_name(&format!("{name}<-"), type_args, Some(arg.append_arg(value)), *span)
                    }
                    // `items 2 <- 3` calls `__Call<- (items, 2, 3)`.
                    other => {
                        let call_target = self.bind_expr(other)?;
                        let arg = BoundExpr::tuple(vec![call_target, arg, value]);
                        self.call_function("__Call<-", &[], arg, *span)
                    }
                }
            }
            UnboundExpr::Operator { left, op, right, span } => {
                let left = self.bind_expr(left)?;
                let right = self.bind_expr(right)?;
                let arg = BoundExpr::tuple(vec![left, right, value]);
                self.call_function(&format!("{op}<-"), &[], arg, *span)
            }
            other => Err(CompilationError::InvalidAssignmentTarget {
                target: describe(other).to_string(),
                span: other.span().or(span),
            }),
        }
    }

    pub(crate) fn is_local(&self, name: &str) -> bool {
        self.param_names.iter().any(|param| param == name) || self.scope.contains(name)
    }

    // ==========================================================================
    // Control flow
    // ==========================================================================

    fn bind_block(&mut self, exprs: &[UnboundExpr], span: Span) -> Result<BoundExpr> {
        self.scope.push_scope();
        let bound = self.bind_block_exprs(exprs, span);
        self.scope.pop_scope();
        bound
    }

    fn bind_block_exprs(&mut self, exprs: &[UnboundExpr], span: Span) -> Result<BoundExpr> {
        let mut bound = Vec::with_capacity(exprs.len());
        for (index, expr) in exprs.iter().enumerate() {
            let expr_bound = self.bind_expr(expr)?;
            if index + 1 < exprs.len() && !expr_bound.ty().is_unit() {
                return Err(CompilationError::type_mismatch(
                    expr.span().or(span),
                    format!(
                        "all expressions in a block except the last must be of type (), found {}",
                        expr_bound.ty()
                    ),
                ));
            }
            bound.push(expr_bound);
        }

        Ok(match bound.len() {
            0 => BoundExpr::Unit,
            _ => BoundExpr::Block(bound),
        })
    }

    fn bind_if(
        &mut self,
        condition: &UnboundExpr,
        then_body: &UnboundExpr,
        else_body: Option<&UnboundExpr>,
        span: Span,
    ) -> Result<BoundExpr> {
        let condition = self.bind_condition(condition, "if", span)?;
        let then_body = self.bind_expr(then_body)?;

        let Some(else_body) = else_body else {
            if !then_body.ty().is_unit() && then_body.ty() != BoundDecl::EARLY_RETURN {
                return Err(CompilationError::type_mismatch(
                    span,
                    format!(
                        "body of if/then is returning type {} but must be () or a return if there is no else branch",
                        then_body.ty()
                    ),
                ));
            }
            return Ok(BoundExpr::If {
                condition: Box::new(condition),
                then_body: Box::new(then_body),
                else_body: None,
                ty: BoundDecl::UNIT,
            });
        };

        let else_body = self.bind_expr(else_body)?;
        if then_body.ty() != else_body.ty() {
            return Err(CompilationError::type_mismatch(
                span,
                format!(
                    "branches of if/then/else do not return the same type: then arm returns {} while else arm returns {}",
                    then_body.ty(),
                    else_body.ty()
                ),
            ));
        }

        Ok(BoundExpr::If {
            condition: Box::new(condition),
            ty: then_body.ty(),
            then_body: Box::new(then_body),
            else_body: Some(Box::new(else_body)),
        })
    }

    fn bind_while(&mut self, condition: &UnboundExpr, body: &UnboundExpr, span: Span) -> Result<BoundExpr> {
        let condition = self.bind_condition(condition, "while", span)?;
        let body = self.bind_expr(body)?;
        if !body.ty().is_unit() {
            return Err(CompilationError::type_mismatch(
                span,
                format!("body of while/do is returning type {} but should be ()", body.ty()),
            ));
        }

        Ok(BoundExpr::While {
            condition: Box::new(condition),
            body: Box::new(body),
        })
    }

    fn bind_condition(&mut self, condition: &UnboundExpr, construct: &str, span: Span) -> Result<BoundExpr> {
        let condition = self.bind_expr(condition)?;
        if !condition.ty().is_bool() {
            return Err(CompilationError::type_mismatch(
                span,
                format!("condition of {construct} is returning type {} but should be Bool", condition.ty()),
            ));
        }
        Ok(condition)
    }

    fn bind_loop(&mut self, clauses: &[LoopClause], body: &UnboundExpr, span: Span) -> Result<BoundExpr> {
        let desugared = sugar::desugar_loop(self.ctx, clauses, body, span);
        self.bind_expr(&desugared)
    }

    fn bind_match(&mut self, value: &UnboundExpr, cases: &[MatchCase], span: Span) -> Result<BoundExpr> {
        let value = self.bind_expr(value)?;
        let desugared = pattern::compile_match(self.ctx, value, cases, span)?;
        self.bind_expr(&desugared)
    }

    // ==========================================================================
    // Functions
    // ==========================================================================

    /// Lifts an anonymous function to a generated top-level one and
    /// evaluates to a reference to it. It sees the enclosing namespace and
    /// type parameters but no locals.
    fn bind_local_function(
        &mut self,
        params: &[Param],
        ret: &UnboundDecl,
        body: &UnboundExpr,
        span: Span,
    ) -> Result<BoundExpr> {
        let name = qualify(&self.binding.search_space.namespace, &self.ctx.generate_name("local function"));
        let source = Function {
            name: name.clone(),
            type_params: Vec::new(),
            params: params.to_vec(),
            ret: ret.clone(),
            body: body.clone(),
            span,
            search_space: self.binding.search_space.clone(),
        };

        let param_types = params
            .iter()
            .map(|param| self.bind_type(&param.ty))
            .collect::<Result<Vec<_>>>()?;
        let ret = self.bind_type(ret)?;

        let function = BoundFunction::new(
            name,
            Vec::new(),
            FuncType::from_params(param_types, ret),
            span,
            FunctionBody::Pending(PendingBody {
                source: Rc::new(source),
                substitution: self.binding.substitution.clone(),
                search_space: self.binding.search_space.clone(),
            }),
        );
        let func_ref = function.func_ref();
        self.ctx.functions.add(Callable::Function(function), span)?;
        Ok(func_ref)
    }

    fn bind_func_ref(
        &mut self,
        name: &str,
        type_args: &[UnboundDecl],
        param_types: &[UnboundDecl],
        span: Span,
    ) -> Result<BoundExpr> {
        let type_args = self.bind_types(type_args)?;
        let param_types = self.bind_types(param_types)?;
        let arg_ty = BoundDecl::from_params(param_types);

        let found = self
            .ctx
            .find_function(&self.binding.search_space, name, &type_args, &arg_ty, span)?;
        match found.and_then(|unique| self.ctx.functions.get(&unique)) {
            Some(Callable::Function(function)) => Ok(function.func_ref()),
            Some(_) => Err(CompilationError::other(
                span,
                format!("can only take references to user-defined functions, not {name}"),
            )),
            None => Err(CompilationError::UnresolvedName {
                name: pie_core::unique_name(name, &type_args, &arg_ty.expand()),
                span,
            }),
        }
    }

    // ==========================================================================
    // Literals
    // ==========================================================================

    fn bind_array(
        &mut self,
        elements: &[UnboundExpr],
        element_type: Option<&UnboundDecl>,
        mutable: bool,
        span: Span,
    ) -> Result<BoundExpr> {
        let elements = elements
            .iter()
            .map(|element| self.bind_expr(element))
            .collect::<Result<Vec<_>>>()?;

        let element_type = match (element_type, elements.first()) {
            (Some(decl), _) => self.bind_type(decl)?,
            (None, Some(first)) => first.ty(),
            (None, None) => {
                return Err(CompilationError::type_mismatch(
                    span,
                    "an empty array literal needs an explicit element type",
                ));
            }
        };

        for (index, element) in elements.iter().enumerate() {
            if element.ty() != element_type {
                return Err(CompilationError::type_mismatch(
                    span,
                    format!(
                        "array elements must all be the same type: array is type {element_type}, but element {index} is type {}",
                        element.ty()
                    ),
                ));
            }
        }

        Ok(BoundExpr::Construct {
            fields: elements,
            ty: BoundDecl::array(element_type, mutable),
        })
    }
}

fn store_local(slot: u8, value: BoundExpr) -> BoundExpr {
    BoundExpr::Store {
        target: Box::new(BoundExpr::Locals),
        index: slot,
        value: Box::new(value),
    }
}

/// What an expression is, for fault messages.
fn describe(expr: &UnboundExpr) -> &'static str {
    match expr {
        UnboundExpr::Unit(_) => "()",
        UnboundExpr::Bool(..) => "a bool literal",
        UnboundExpr::Int(..) => "an int literal",
        UnboundExpr::String(..) => "a string literal",
        UnboundExpr::Name { .. } => "a name",
        UnboundExpr::Call { .. } => "a call",
        UnboundExpr::Operator { .. } => "an operator",
        UnboundExpr::Assign { .. } => "an assignment",
        UnboundExpr::Define { .. } => "a definition",
        UnboundExpr::Block(..) => "a block",
        UnboundExpr::If { .. } => "an if expression",
        UnboundExpr::While { .. } | UnboundExpr::Loop { .. } => "a loop",
        UnboundExpr::Let { .. } => "a let expression",
        UnboundExpr::Match { .. } => "a match expression",
        UnboundExpr::Syntax(..) => "a syntax literal",
        UnboundExpr::LocalFunction { .. } => "a local function",
        UnboundExpr::FuncRef { .. } => "a function reference",
        UnboundExpr::Tuple(..) => "a tuple",
        UnboundExpr::Array { .. } => "an array literal",
        UnboundExpr::Record(..) => "a record literal",
        UnboundExpr::Return { .. } => "a return",
        UnboundExpr::TupleField { .. } => "a tuple field",
        UnboundExpr::Bound(_) => "a bound expression",
    }
}
