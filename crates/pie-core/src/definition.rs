//! Top-level definitions: functions, structs, unions, and the source files
//! that contain them.

use crate::names::qualify;
use crate::{BoundDecl, NameSearchSpace, Param, Span, TypeRef, UnboundDecl, UnboundExpr};

/// A function as parsed. With type parameters it is a generic template and is
/// never bound itself, only instantiated.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    /// Short name as parsed; qualified with the namespace on registration.
    pub name: String,
    pub type_params: Vec<String>,
    pub params: Vec<Param>,
    pub ret: UnboundDecl,
    pub body: UnboundExpr,
    pub span: Span,
    /// Filled in when the function is added to a compiler.
    pub search_space: NameSearchSpace,
}

impl Function {
    pub fn new(name: impl Into<String>, params: Vec<Param>, ret: UnboundDecl, body: UnboundExpr) -> Self {
        Self {
            name: name.into(),
            type_params: Vec::new(),
            params,
            ret,
            body,
            span: Span::NONE,
            search_space: NameSearchSpace::global(),
        }
    }

    pub fn with_type_params(mut self, type_params: &[&str]) -> Self {
        self.type_params = type_params.iter().map(|param| param.to_string()).collect();
        self
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }

    /// The declared parameter list as a single type.
    pub fn param_type(&self) -> UnboundDecl {
        UnboundDecl::from_params(self.params.iter().map(|param| param.ty.clone()).collect())
    }

    /// Moves this function into `search_space`, qualifying its name.
    pub fn qualified_in(mut self, search_space: &NameSearchSpace) -> Self {
        self.name = qualify(&search_space.namespace, &self.name);
        self.search_space = search_space.clone();
        self
    }
}

/// A struct field as parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: String,
    pub ty: UnboundDecl,
    pub mutable: bool,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, ty: UnboundDecl) -> Self {
        Self {
            name: name.into(),
            ty,
            mutable: false,
        }
    }

    pub fn mutable(name: impl Into<String>, ty: UnboundDecl) -> Self {
        Self {
            name: name.into(),
            ty,
            mutable: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Struct {
    pub name: String,
    pub type_params: Vec<String>,
    pub fields: Vec<FieldDecl>,
    pub span: Span,
    pub search_space: NameSearchSpace,
}

impl Struct {
    pub fn new(name: impl Into<String>, fields: Vec<FieldDecl>) -> Self {
        Self {
            name: name.into(),
            type_params: Vec::new(),
            fields,
            span: Span::NONE,
            search_space: NameSearchSpace::global(),
        }
    }

    pub fn with_type_params(mut self, type_params: &[&str]) -> Self {
        self.type_params = type_params.iter().map(|param| param.to_string()).collect();
        self
    }

    pub fn qualified_in(mut self, search_space: &NameSearchSpace) -> Self {
        self.name = qualify(&search_space.namespace, &self.name);
        self.search_space = search_space.clone();
        self
    }
}

/// A union case as parsed. `payload` is the type of the value it carries.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseDecl {
    pub name: String,
    pub payload: Option<UnboundDecl>,
}

impl CaseDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: None,
        }
    }

    pub fn with_value(name: impl Into<String>, payload: UnboundDecl) -> Self {
        Self {
            name: name.into(),
            payload: Some(payload),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Union {
    pub name: String,
    pub type_params: Vec<String>,
    pub cases: Vec<CaseDecl>,
    pub span: Span,
    pub search_space: NameSearchSpace,
}

impl Union {
    pub fn new(name: impl Into<String>, cases: Vec<CaseDecl>) -> Self {
        Self {
            name: name.into(),
            type_params: Vec::new(),
            cases,
            span: Span::NONE,
            search_space: NameSearchSpace::global(),
        }
    }

    pub fn with_type_params(mut self, type_params: &[&str]) -> Self {
        self.type_params = type_params.iter().map(|param| param.to_string()).collect();
        self
    }

    pub fn qualified_in(mut self, search_space: &NameSearchSpace) -> Self {
        self.name = qualify(&search_space.namespace, &self.name);
        self.search_space = search_space.clone();
        self
    }
}

// ============================================================================
// Bound type definitions
// ============================================================================

/// A bound struct field. `index` is its slot in the heap cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: BoundDecl,
    pub mutable: bool,
    pub index: u8,
}

/// A bound union case. `index` is the tag value stored in slot 0.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionCase {
    pub name: String,
    pub payload: BoundDecl,
    pub index: i32,
}

impl UnionCase {
    pub fn has_value(&self) -> bool {
        !self.payload.is_unit()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDef {
    pub ty: TypeRef,
    pub fields: Vec<Field>,
    pub span: Span,
    pub search_space: NameSearchSpace,
}

impl StructDef {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnionDef {
    pub ty: TypeRef,
    pub cases: Vec<UnionCase>,
    pub span: Span,
    pub search_space: NameSearchSpace,
}

impl UnionDef {
    pub fn case(&self, name: &str) -> Option<&UnionCase> {
        self.cases.iter().find(|case| case.name == name)
    }
}

/// A registered, concrete type definition.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDef {
    Struct(StructDef),
    Union(UnionDef),
}

impl TypeDef {
    pub fn type_ref(&self) -> &TypeRef {
        match self {
            TypeDef::Struct(def) => &def.ty,
            TypeDef::Union(def) => &def.ty,
        }
    }

    /// The bound type naming this definition.
    pub fn decl(&self) -> BoundDecl {
        match self {
            TypeDef::Struct(def) => BoundDecl::Struct(def.ty.clone()),
            TypeDef::Union(def) => BoundDecl::Union(def.ty.clone()),
        }
    }
}

// ============================================================================
// Source files
// ============================================================================

/// A (possibly nested) namespace block.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Namespace {
    /// Name relative to the enclosing namespace. Empty for the file root.
    pub name: String,
    pub functions: Vec<Function>,
    pub structs: Vec<Struct>,
    pub unions: Vec<Union>,
    pub namespaces: Vec<Namespace>,
}

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// One parsed source file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourceFile {
    pub path: String,
    /// Namespaces opened with `using`, in order.
    pub usings: Vec<String>,
    pub root: Namespace,
}

impl SourceFile {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn using(mut self, namespace: impl Into<String>) -> Self {
        self.usings.push(namespace.into());
        self
    }

    pub fn function(mut self, function: Function) -> Self {
        self.root.functions.push(function);
        self
    }

    pub fn structure(mut self, structure: Struct) -> Self {
        self.root.structs.push(structure);
        self
    }

    pub fn union(mut self, union: Union) -> Self {
        self.root.unions.push(union);
        self
    }

    pub fn namespace(mut self, namespace: Namespace) -> Self {
        self.root.namespaces.push(namespace);
        self
    }
}
