//! Pattern-match compilation.
//!
//! A `match` is checked and rewritten in three steps:
//!
//! 1. [`shape`]: every case's pattern must fit the matched type
//! 2. [`coverage`]: every case must be reachable, and together the cases
//!    must cover every value
//! 3. [`desugar`]: the cases become an if/else chain over a temporary
//!    local holding the matched value
//!
//! The result is an ordinary unbound expression, bound like any other.

mod coverage;
mod desugar;
mod shape;

pub use coverage::{Cover, Ctor, Pat};
pub use shape::check_shape;

use log::debug;
use pie_core::{BoundExpr, CompilationError, MatchCase, Span, UnboundExpr};

use crate::Result;
use crate::context::CompilationContext;

/// Checks `cases` against the already-bound `value` and rewrites the
/// match into conditionals.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn compile_match(
    ctx: &mut CompilationContext,
    value: BoundExpr,
    cases: &[MatchCase],
    span: Span,
) -> Result<UnboundExpr> {
    if cases.is_empty() {
        return Err(CompilationError::other(span, "match expression has no cases"));
    }

    let ty = value.ty();
    let mut cover = Cover::new(ty.clone());
    for case in cases {
        let pat = check_shape(&ctx.types, &case.pattern, &ty)?;
        if !cover.add(&ctx.types, pat) {
            return Err(CompilationError::UnreachablePattern {
                pattern: case.pattern.to_string(),
                span: case.span,
            });
        }
    }

    if !cover.is_exhaustive(&ctx.types) {
        return Err(CompilationError::NonExhaustiveMatch {
            ty: ty.to_string(),
            span,
        });
    }

    let temp = ctx.generate_name("match");
    debug!("match over {ty} with {} case(s) into {temp}", cases.len());

    let chain = desugar::lower_cases(&ctx.types, &temp, &ty, cases);
    Ok(UnboundExpr::block(vec![UnboundExpr::define(&temp, UnboundExpr::Bound(value)).at(span), chain]).at(span))
}
