//! Concrete struct and union definitions.

use log::trace;
use pie_core::{BoundDecl, CompilationError, Span, StructDef, TypeDef, TypeHash, TypeRef, UnionDef};
use rustc_hash::FxHashMap;

#[derive(Debug)]
struct TypeEntry {
    decl: BoundDecl,
    def: Option<TypeDef>,
}

/// Every concrete type in the compile unit, keyed by [`TypeHash`].
///
/// A type is *declared* (its name becomes resolvable) before it is
/// *defined* (its fields or cases are bound), so a type may refer to itself.
#[derive(Debug, Default)]
pub struct TypeTable {
    entries: FxHashMap<TypeHash, TypeEntry>,
    order: Vec<TypeHash>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `decl` (a struct or union reference) resolvable by name.
    pub fn declare(&mut self, decl: BoundDecl, span: Span) -> Result<(), CompilationError> {
        let Some(ty) = decl.type_ref() else {
            panic!("only structs and unions can be declared, got {decl}");
        };

        if self.entries.contains_key(&ty.hash) {
            return Err(CompilationError::DuplicateDefinition {
                name: ty.full_name(),
                span,
            });
        }

        trace!("declared type {ty}");
        self.order.push(ty.hash);
        self.entries.insert(ty.hash, TypeEntry { decl, def: None });
        Ok(())
    }

    /// Stores the bound definition of a declared type.
    ///
    /// # Panics
    ///
    /// If the type was never declared or is already defined.
    pub fn define(&mut self, def: TypeDef) {
        let hash = def.type_ref().hash;
        let entry = self
            .entries
            .get_mut(&hash)
            .unwrap_or_else(|| panic!("type {} defined before it was declared", def.type_ref()));
        assert!(entry.def.is_none(), "type {} defined twice", def.type_ref());
        entry.def = Some(def);
    }

    /// Finds a declared type by its full name, e.g. `Core::Option[Int]`.
    pub fn find(&self, full_name: &str) -> Option<&BoundDecl> {
        self.entries
            .get(&TypeHash::from_name(full_name))
            .map(|entry| &entry.decl)
    }

    pub fn contains(&self, ty: &TypeRef) -> bool {
        self.entries.contains_key(&ty.hash)
    }

    pub fn get(&self, ty: &TypeRef) -> Option<&TypeDef> {
        self.entries.get(&ty.hash).and_then(|entry| entry.def.as_ref())
    }

    pub fn struct_def(&self, ty: &TypeRef) -> Option<&StructDef> {
        match self.get(ty) {
            Some(TypeDef::Struct(def)) => Some(def),
            _ => None,
        }
    }

    pub fn union_def(&self, ty: &TypeRef) -> Option<&UnionDef> {
        match self.get(ty) {
            Some(TypeDef::Union(def)) => Some(def),
            _ => None,
        }
    }

    /// Defined types in declaration order.
    pub fn definitions(&self) -> impl Iterator<Item = &TypeDef> {
        self.order
            .iter()
            .filter_map(|hash| self.entries.get(hash).and_then(|entry| entry.def.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pie_core::{Field, NameSearchSpace, UnionCase};

    fn point() -> TypeRef {
        TypeRef::new("Point", vec![])
    }

    #[test]
    fn declared_types_resolve_before_definition() {
        let mut table = TypeTable::new();
        table.declare(BoundDecl::Struct(point()), Span::NONE).unwrap();

        assert_eq!(table.find("Point"), Some(&BoundDecl::Struct(point())));
        assert!(table.get(&point()).is_none());

        table.define(TypeDef::Struct(StructDef {
            ty: point(),
            fields: vec![Field {
                name: "x".into(),
                ty: BoundDecl::INT,
                mutable: false,
                index: 0,
            }],
            span: Span::NONE,
            search_space: NameSearchSpace::global(),
        }));
        assert_eq!(table.struct_def(&point()).unwrap().fields.len(), 1);
        assert!(table.union_def(&point()).is_none());
    }

    #[test]
    fn generic_instances_are_distinct_types() {
        let mut table = TypeTable::new();
        let option_int = TypeRef::new("Option", vec![BoundDecl::INT]);
        let option_bool = TypeRef::new("Option", vec![BoundDecl::BOOL]);
        table.declare(BoundDecl::Union(option_int.clone()), Span::NONE).unwrap();
        table.declare(BoundDecl::Union(option_bool), Span::NONE).unwrap();

        assert_eq!(table.len(), 2);
        assert!(table.find("Option[Int]").is_some());
        assert!(table.find("Option").is_none());

        table.define(TypeDef::Union(UnionDef {
            ty: option_int.clone(),
            cases: vec![UnionCase {
                name: "None".into(),
                payload: BoundDecl::UNIT,
                index: 0,
            }],
            span: Span::NONE,
            search_space: NameSearchSpace::global(),
        }));
        assert_eq!(table.definitions().count(), 1);
    }

    #[test]
    fn redeclaring_is_a_duplicate() {
        let mut table = TypeTable::new();
        table.declare(BoundDecl::Struct(point()), Span::NONE).unwrap();
        let err = table.declare(BoundDecl::Struct(point()), Span::line(2)).unwrap_err();
        assert!(matches!(err, CompilationError::DuplicateDefinition { .. }));
    }
}
