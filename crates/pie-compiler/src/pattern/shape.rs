//! Pattern shape checking.
//!
//! Verifies a pattern fits the type it matches and lowers it to a [`Pat`]
//! for coverage checking.

use pie_core::{Atomic, BoundDecl, CompilationError, Pattern};
use pie_registry::TypeTable;
use rustc_hash::FxHashSet;

use super::coverage::{Ctor, Pat};
use crate::Result;

/// Checks `pattern` against `ty` and lowers it.
///
/// A variable may appear only once per pattern.
pub fn check_shape(types: &TypeTable, pattern: &Pattern, ty: &BoundDecl) -> Result<Pat> {
    let mut variables = FxHashSet::default();
    lower(types, pattern, ty, &mut variables)
}

fn lower<'p>(types: &TypeTable, pattern: &'p Pattern, ty: &BoundDecl, variables: &mut FxHashSet<&'p str>) -> Result<Pat> {
    let pat = match (pattern, ty) {
        (Pattern::Wildcard(_), _) => Pat::Wild,
        (Pattern::Variable(name, span), _) => {
            if !variables.insert(name) {
                return Err(CompilationError::NonLinearPattern {
                    name: name.clone(),
                    span: *span,
                });
            }
            Pat::Wild
        }

        (Pattern::Bool(value, _), BoundDecl::Atomic(Atomic::Bool)) => Pat::Ctor(Ctor::Bool(*value), Vec::new()),
        (Pattern::Int(value, _), BoundDecl::Atomic(Atomic::Int)) => Pat::Ctor(Ctor::Int(*value), Vec::new()),
        (Pattern::String(value, _), BoundDecl::Atomic(Atomic::String)) => {
            Pat::Ctor(Ctor::String(value.clone()), Vec::new())
        }

        (Pattern::Case { name, payload, span }, BoundDecl::Union(union)) => {
            let Some(def) = types.union_def(union) else {
                return Err(shape_error(pattern, ty));
            };
            let short_name = name.rsplit("::").next().unwrap_or(name);
            let Some(case) = def.case(short_name) else {
                return Err(CompilationError::PatternShape {
                    pattern: pattern.to_string(),
                    ty: format!("{ty}, which has no case {short_name}"),
                    span: *span,
                });
            };

            match (payload, case.has_value()) {
                (None, false) => Pat::Ctor(Ctor::Case(case.index), Vec::new()),
                (Some(payload), true) => {
                    let payload = lower(types, payload, &case.payload, variables)?;
                    Pat::Ctor(Ctor::Case(case.index), vec![payload])
                }
                _ => return Err(shape_error(pattern, ty)),
            }
        }

        (Pattern::Tuple(fields, _), BoundDecl::Tuple(types_of_fields)) if fields.len() == types_of_fields.len() => {
            let mut lowered = Vec::with_capacity(fields.len());
            for (field, field_ty) in fields.iter().zip(types_of_fields) {
                lowered.push(lower(types, field, field_ty, variables)?);
            }
            Pat::Ctor(Ctor::Tuple, lowered)
        }

        _ => return Err(shape_error(pattern, ty)),
    };
    Ok(pat)
}

fn shape_error(pattern: &Pattern, ty: &BoundDecl) -> CompilationError {
    CompilationError::PatternShape {
        pattern: pattern.to_string(),
        ty: ty.to_string(),
        span: pattern.span(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pie_core::{NameSearchSpace, Span, TypeDef, TypeRef, UnionCase, UnionDef};

    fn option_table() -> (TypeTable, BoundDecl) {
        let ty = TypeRef::new("Option", vec![BoundDecl::INT]);
        let mut types = TypeTable::new();
        types.declare(BoundDecl::Union(ty.clone()), Span::NONE).unwrap();
        types.define(TypeDef::Union(UnionDef {
            ty: ty.clone(),
            cases: vec![
                UnionCase {
                    name: "None".into(),
                    payload: BoundDecl::UNIT,
                    index: 0,
                },
                UnionCase {
                    name: "Some".into(),
                    payload: BoundDecl::INT,
                    index: 1,
                },
            ],
            span: Span::NONE,
            search_space: NameSearchSpace::global(),
        }));
        (types, BoundDecl::Union(ty))
    }

    #[test]
    fn literal_must_match_type() {
        let types = TypeTable::new();
        assert!(check_shape(&types, &Pattern::Bool(true, Span::NONE), &BoundDecl::BOOL).is_ok());

        let err = check_shape(&types, &Pattern::Int(1, Span::NONE), &BoundDecl::STRING).unwrap_err();
        assert!(matches!(err, CompilationError::PatternShape { .. }));
    }

    #[test]
    fn case_payload_presence_must_match() {
        let (types, option) = option_table();

        let some = Pattern::case_with("Some", Pattern::variable("v"));
        assert_eq!(
            check_shape(&types, &some, &option).unwrap(),
            Pat::Ctor(Ctor::Case(1), vec![Pat::Wild])
        );

        assert!(check_shape(&types, &Pattern::case("Some"), &option).is_err());
        assert!(check_shape(&types, &Pattern::case_with("None", Pattern::wildcard()), &option).is_err());
        assert!(check_shape(&types, &Pattern::case("Other"), &option).is_err());
    }

    #[test]
    fn tuple_arity_must_match() {
        let types = TypeTable::new();
        let pair = BoundDecl::Tuple(vec![BoundDecl::INT, BoundDecl::BOOL]);
        let pattern = Pattern::Tuple(vec![Pattern::wildcard()], Span::NONE);
        assert!(check_shape(&types, &pattern, &pair).is_err());
    }

    #[test]
    fn variables_are_linear() {
        let types = TypeTable::new();
        let pair = BoundDecl::Tuple(vec![BoundDecl::INT, BoundDecl::INT]);
        let pattern = Pattern::Tuple(vec![Pattern::variable("a"), Pattern::variable("a")], Span::NONE);
        let err = check_shape(&types, &pattern, &pair).unwrap_err();
        assert!(matches!(err, CompilationError::NonLinearPattern { ref name, .. } if name == "a"));
    }
}
