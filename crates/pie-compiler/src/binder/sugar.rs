//! Syntactic sugar, rewritten into plain expressions before binding.

use pie_core::{CompilationError, LoopClause, Span, UnboundDecl, UnboundExpr};

use crate::Result;
use crate::context::CompilationContext;

/// Rewrites a `loop` into a `while`.
///
/// ```text
/// for x <- xs                 def <iter> <- Iterate xs
/// while ok            =>      while MoveNext <iter> & ok do
/// do body                         def x <- Current <iter>
///                                 body
/// ```
pub fn desugar_loop(ctx: &mut CompilationContext, clauses: &[LoopClause], body: &UnboundExpr, span: Span) -> UnboundExpr {
    let mut setup = Vec::new();
    let mut per_iteration = Vec::new();
    let mut condition: Option<UnboundExpr> = None;

    for clause in clauses {
        let test = match clause {
            LoopClause::While { condition, .. } => condition.clone(),
            LoopClause::For { name, sequence, span } => {
                let iterator = ctx.generate_name("iter");
                setup.push(UnboundExpr::define(&iterator, UnboundExpr::apply("Iterate", sequence.clone())).at(*span));
                per_iteration.push(UnboundExpr::define(name, UnboundExpr::apply("Current", UnboundExpr::name(&iterator))).at(*span));
                UnboundExpr::apply("MoveNext", UnboundExpr::name(&iterator)).at(*span)
            }
        };

        condition = Some(match condition {
            None => test,
            Some(previous) => UnboundExpr::op(previous, "&", test),
        });
    }

    per_iteration.push(body.clone());
    let condition = condition.unwrap_or_else(|| UnboundExpr::bool(true));
    setup.push(UnboundExpr::while_do(condition, UnboundExpr::block(per_iteration)).at(span));
    UnboundExpr::block(setup).at(span)
}

/// Rewrites `let names <- value then a else b` into a test of the
/// option-like value.
///
/// ```text
/// def <tmp> <- value
/// if Some? <tmp> then
///     def names <- SomeValue <tmp>
///     a
/// else b
/// ```
pub fn desugar_let(
    ctx: &mut CompilationContext,
    names: &[String],
    value: &UnboundExpr,
    then_body: &UnboundExpr,
    else_body: &UnboundExpr,
    span: Span,
) -> UnboundExpr {
    let temp = ctx.generate_name("let");

    let unwrap = UnboundExpr::Define {
        names: names.to_vec(),
        value: Box::new(UnboundExpr::apply("SomeValue", UnboundExpr::name(&temp))),
        mutable: false,
        span,
    };

    UnboundExpr::block(vec![
        UnboundExpr::define(&temp, value.clone()).at(span),
        UnboundExpr::if_else(
            UnboundExpr::apply("Some?", UnboundExpr::name(&temp)),
            UnboundExpr::block(vec![unwrap, then_body.clone()]),
            else_body.clone(),
        )
        .at(span),
    ])
    .at(span)
}

/// Rewrites a quoted expression into the calls that build its syntax tree,
/// e.g. `{ a + 1 }` becomes `CallExpr (NameExpr "+", TupleExpr [...])`.
pub fn syntax_literal(expr: &UnboundExpr) -> Result<UnboundExpr> {
    let build = |constructor: &str, arg: UnboundExpr| UnboundExpr::apply(constructor, arg).at(expr.span());

    Ok(match expr {
        UnboundExpr::Unit(_) => build("UnitExpr", UnboundExpr::unit()),
        UnboundExpr::Bool(value, _) => build("BoolExpr", UnboundExpr::bool(*value)),
        UnboundExpr::Int(value, _) => build("IntExpr", UnboundExpr::int(*value)),
        UnboundExpr::String(value, _) => build("StringExpr", UnboundExpr::string(value.clone())),
        UnboundExpr::Name { name, type_args, span } if type_args.is_empty() => {
            build("NameExpr", UnboundExpr::string(name.clone()).at(*span))
        }
        UnboundExpr::Tuple(fields, _) => build("TupleExpr", syntax_array(fields)?),
        UnboundExpr::Array { elements, .. } => build("ArrayExpr", syntax_array(elements)?),
        UnboundExpr::Block(exprs, _) => build("BlockExpr", syntax_array(exprs)?),
        UnboundExpr::Call { target, arg, .. } => {
            build("CallExpr", UnboundExpr::tuple(vec![syntax_literal(target)?, syntax_literal(arg)?]))
        }
        UnboundExpr::Operator { left, op, right, span } => {
            let target = UnboundExpr::apply("NameExpr", UnboundExpr::string(op.clone())).at(*span);
            let arg = UnboundExpr::apply("TupleExpr", syntax_array(&[(**left).clone(), (**right).clone()])?);
            build("CallExpr", UnboundExpr::tuple(vec![target, arg]))
        }
        UnboundExpr::Return { value, .. } => build("ReturnExpr", syntax_literal(value)?),
        UnboundExpr::Assign { target, value, .. } => {
            build("AssignExpr", UnboundExpr::tuple(vec![syntax_literal(target)?, syntax_literal(value)?]))
        }
        UnboundExpr::If {
            condition,
            then_body,
            else_body,
            ..
        } => {
            let else_body = match else_body {
                Some(else_body) => syntax_literal(else_body)?,
                None => UnboundExpr::apply("UnitExpr", UnboundExpr::unit()),
            };
            build(
                "IfExpr",
                UnboundExpr::tuple(vec![syntax_literal(condition)?, syntax_literal(then_body)?, else_body]),
            )
        }
        other => {
            return Err(CompilationError::other(
                other.span(),
                "this kind of expression cannot be quoted as syntax",
            ));
        }
    })
}

fn syntax_array(exprs: &[UnboundExpr]) -> Result<UnboundExpr> {
    let elements = exprs.iter().map(syntax_literal).collect::<Result<Vec<_>>>()?;
    Ok(UnboundExpr::Array {
        elements,
        element_type: Some(UnboundDecl::named("Expr")),
        mutable: false,
        span: Span::NONE,
    })
}
