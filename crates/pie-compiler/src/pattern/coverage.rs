//! Coverage and exhaustiveness.
//!
//! [`Cover`] keeps the lowered patterns of the cases seen so far, one row
//! each, and answers whether a new pattern is *useful*: whether some value
//! matches it and none of the earlier rows. A case that is not useful can
//! never be reached; a match is exhaustive once a wildcard is not useful.
//!
//! The check generalizes to any nesting of tuples and union payloads. Bool,
//! union, and tuple constructors form finite sets; Int and String literals
//! (and every other type) can only be closed by a wildcard.

use pie_core::{Atomic, BoundDecl};
use pie_registry::TypeTable;

/// A pattern constructor.
#[derive(Debug, Clone, PartialEq)]
pub enum Ctor {
    Bool(bool),
    Int(i32),
    String(String),
    /// A union case by tag.
    Case(i32),
    Tuple,
}

/// A pattern, reduced to what matters for coverage.
#[derive(Debug, Clone, PartialEq)]
pub enum Pat {
    /// Wildcards and variables.
    Wild,
    Ctor(Ctor, Vec<Pat>),
}

/// The coverage ledger of one `match`.
#[derive(Debug)]
pub struct Cover {
    ty: BoundDecl,
    rows: Vec<Vec<Pat>>,
}

impl Cover {
    pub fn new(ty: BoundDecl) -> Self {
        Self { ty, rows: Vec::new() }
    }

    /// Adds a case. Returns false, leaving the ledger unchanged, if the
    /// earlier cases already match everything `pat` does.
    pub fn add(&mut self, types: &TypeTable, pat: Pat) -> bool {
        let row = vec![pat];
        if !useful(types, &self.rows, &row, std::slice::from_ref(&self.ty)) {
            return false;
        }
        self.rows.push(row);
        true
    }

    /// Whether every value of the matched type is covered.
    pub fn is_exhaustive(&self, types: &TypeTable) -> bool {
        !useful(types, &self.rows, &[Pat::Wild], std::slice::from_ref(&self.ty))
    }
}

/// Whether some value vector matched by `row` is matched by none of `rows`.
/// `tys` holds the type of each column.
fn useful(types: &TypeTable, rows: &[Vec<Pat>], row: &[Pat], tys: &[BoundDecl]) -> bool {
    let Some((head, rest)) = row.split_first() else {
        return rows.is_empty();
    };

    match head {
        Pat::Ctor(ctor, args) => {
            let tys = specialize_types(types, tys, ctor);
            let rows = specialize(rows, ctor, args.len());
            let row: Vec<Pat> = args.iter().chain(rest).cloned().collect();
            useful(types, &rows, &row, &tys)
        }
        Pat::Wild => match complete_signature(types, &tys[0]) {
            Some(ctors) if ctors.iter().all(|ctor| heads(rows).any(|head| head == ctor)) => {
                ctors.iter().any(|ctor| {
                    let arity = field_types(types, &tys[0], ctor).len();
                    let tys = specialize_types(types, tys, ctor);
                    let rows = specialize(rows, ctor, arity);
                    let row: Vec<Pat> = std::iter::repeat_n(Pat::Wild, arity).chain(rest.iter().cloned()).collect();
                    useful(types, &rows, &row, &tys)
                })
            }
            _ => useful(types, &default_rows(rows), rest, &tys[1..]),
        },
    }
}

/// Constructors heading the first column.
fn heads(rows: &[Vec<Pat>]) -> impl Iterator<Item = &Ctor> {
    rows.iter().filter_map(|row| match row.first() {
        Some(Pat::Ctor(ctor, _)) => Some(ctor),
        _ => None,
    })
}

/// Rows that can match a value built with `ctor`, with the first column
/// replaced by that constructor's fields.
fn specialize(rows: &[Vec<Pat>], ctor: &Ctor, arity: usize) -> Vec<Vec<Pat>> {
    rows.iter()
        .filter_map(|row| {
            let (head, rest) = row.split_first()?;
            match head {
                Pat::Ctor(head, args) if head == ctor => Some(args.iter().chain(rest).cloned().collect()),
                Pat::Ctor(..) => None,
                Pat::Wild => Some(std::iter::repeat_n(Pat::Wild, arity).chain(rest.iter().cloned()).collect()),
            }
        })
        .collect()
}

/// Rows whose first column matches anything, without that column.
fn default_rows(rows: &[Vec<Pat>]) -> Vec<Vec<Pat>> {
    rows.iter()
        .filter(|row| matches!(row.first(), Some(Pat::Wild)))
        .map(|row| row[1..].to_vec())
        .collect()
}

fn specialize_types(types: &TypeTable, tys: &[BoundDecl], ctor: &Ctor) -> Vec<BoundDecl> {
    let mut specialized = field_types(types, &tys[0], ctor);
    specialized.extend_from_slice(&tys[1..]);
    specialized
}

/// Types of the fields `ctor` carries when building a value of type `ty`.
fn field_types(types: &TypeTable, ty: &BoundDecl, ctor: &Ctor) -> Vec<BoundDecl> {
    match (ctor, ty) {
        (Ctor::Tuple, BoundDecl::Tuple(fields)) => fields.clone(),
        (Ctor::Case(tag), BoundDecl::Union(union)) => types
            .union_def(union)
            .and_then(|def| def.cases.iter().find(|case| case.index == *tag))
            .filter(|case| case.has_value())
            .map(|case| vec![case.payload.clone()])
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Every constructor of `ty`, if there are finitely many.
fn complete_signature(types: &TypeTable, ty: &BoundDecl) -> Option<Vec<Ctor>> {
    match ty {
        BoundDecl::Atomic(Atomic::Bool) => Some(vec![Ctor::Bool(true), Ctor::Bool(false)]),
        BoundDecl::Tuple(_) => Some(vec![Ctor::Tuple]),
        BoundDecl::Union(union) => types
            .union_def(union)
            .map(|def| def.cases.iter().map(|case| Ctor::Case(case.index)).collect()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pie_core::{NameSearchSpace, Span, TypeDef, TypeRef, UnionCase, UnionDef};

    fn bool_pat(value: bool) -> Pat {
        Pat::Ctor(Ctor::Bool(value), Vec::new())
    }

    fn tuple(fields: Vec<Pat>) -> Pat {
        Pat::Ctor(Ctor::Tuple, fields)
    }

    #[test]
    fn wildcard_is_exhaustive_for_any_type() {
        let types = TypeTable::new();
        for ty in [BoundDecl::UNIT, BoundDecl::INT, BoundDecl::STRING, BoundDecl::BOOL] {
            let mut cover = Cover::new(ty);
            assert!(cover.add(&types, Pat::Wild));
            assert!(cover.is_exhaustive(&types));
            assert!(!cover.add(&types, Pat::Wild));
        }
    }

    #[test]
    fn bool_needs_both_values() {
        let types = TypeTable::new();
        let mut cover = Cover::new(BoundDecl::BOOL);
        assert!(cover.add(&types, bool_pat(true)));
        assert!(!cover.is_exhaustive(&types));
        assert!(!cover.add(&types, bool_pat(true)));
        assert!(cover.add(&types, bool_pat(false)));
        assert!(cover.is_exhaustive(&types));
        assert!(!cover.add(&types, Pat::Wild));
    }

    #[test]
    fn int_literals_never_exhaust() {
        let types = TypeTable::new();
        let mut cover = Cover::new(BoundDecl::INT);
        for value in 0..10 {
            assert!(cover.add(&types, Pat::Ctor(Ctor::Int(value), Vec::new())));
        }
        assert!(!cover.is_exhaustive(&types));
        assert!(!cover.add(&types, Pat::Ctor(Ctor::Int(3), Vec::new())));
        assert!(cover.add(&types, Pat::Wild));
        assert!(cover.is_exhaustive(&types));
    }

    #[test]
    fn tuples_cover_in_every_dimension() {
        let types = TypeTable::new();
        let ty = BoundDecl::Tuple(vec![BoundDecl::BOOL, BoundDecl::BOOL]);
        let mut cover = Cover::new(ty);

        assert!(cover.add(&types, tuple(vec![bool_pat(true), Pat::Wild])));
        assert!(cover.add(&types, tuple(vec![bool_pat(false), bool_pat(true)])));
        assert!(!cover.is_exhaustive(&types));

        // (false, true) is already handled
        assert!(!cover.add(&types, tuple(vec![Pat::Wild, bool_pat(true)])));

        assert!(cover.add(&types, tuple(vec![Pat::Wild, bool_pat(false)])));
        assert!(cover.is_exhaustive(&types));
    }

    #[test]
    fn union_payloads_must_be_covered() {
        let ty = TypeRef::new("Option", vec![BoundDecl::BOOL]);
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
                    payload: BoundDecl::BOOL,
                    index: 1,
                },
            ],
            span: Span::NONE,
            search_space: NameSearchSpace::global(),
        }));

        let none = Pat::Ctor(Ctor::Case(0), Vec::new());
        let some = |payload| Pat::Ctor(Ctor::Case(1), vec![payload]);

        let mut cover = Cover::new(BoundDecl::Union(ty));
        assert!(cover.add(&types, none.clone()));
        assert!(cover.add(&types, some(bool_pat(true))));
        assert!(!cover.is_exhaustive(&types));
        assert!(!cover.add(&types, none));
        assert!(cover.add(&types, some(bool_pat(false))));
        assert!(cover.is_exhaustive(&types));
        assert!(!cover.add(&types, some(Pat::Wild)));
    }
}
