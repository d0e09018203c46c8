//! Generic templates awaiting instantiation.
//!
//! Templates are immutable and shared; instantiation binds them under a
//! substitution map instead of copying them.

use std::rc::Rc;

use pie_core::{CompilationError, Function, NameSearchSpace, Span, Struct, UnboundDecl, Union};
use rustc_hash::FxHashMap;

/// A companion function of a generic struct or union (constructor, field
/// accessor, case constructor, case check, case value).
///
/// Only its signature is kept: instantiating it instantiates the owning type,
/// which registers the concrete companion.
#[derive(Debug, Clone, PartialEq)]
pub struct CompanionTemplate {
    pub name: String,
    /// Qualified name of the owning type template.
    pub owner: String,
    pub type_params: Vec<String>,
    pub param: UnboundDecl,
    pub search_space: NameSearchSpace,
}

/// A generic function that calls can be resolved against.
#[derive(Debug, Clone)]
pub enum FunctionTemplate {
    User(Rc<Function>),
    Companion(Rc<CompanionTemplate>),
}

impl FunctionTemplate {
    pub fn name(&self) -> &str {
        match self {
            FunctionTemplate::User(function) => &function.name,
            FunctionTemplate::Companion(companion) => &companion.name,
        }
    }

    pub fn type_params(&self) -> &[String] {
        match self {
            FunctionTemplate::User(function) => &function.type_params,
            FunctionTemplate::Companion(companion) => &companion.type_params,
        }
    }

    /// The declared parameter type, used for inference.
    pub fn param(&self) -> UnboundDecl {
        match self {
            FunctionTemplate::User(function) => function.param_type(),
            FunctionTemplate::Companion(companion) => companion.param.clone(),
        }
    }

    pub fn search_space(&self) -> &NameSearchSpace {
        match self {
            FunctionTemplate::User(function) => &function.search_space,
            FunctionTemplate::Companion(companion) => &companion.search_space,
        }
    }

    /// Stable key of the template itself, for the instance cache.
    pub fn key(&self) -> String {
        match self {
            FunctionTemplate::User(function) => format!("{}[{}]", function.name, function.type_params.join(", ")),
            FunctionTemplate::Companion(companion) => format!("{}/{}", companion.owner, companion.name),
        }
    }
}

/// A generic struct or union.
#[derive(Debug, Clone)]
pub enum TypeTemplate {
    Struct(Rc<Struct>),
    Union(Rc<Union>),
}

impl TypeTemplate {
    pub fn name(&self) -> &str {
        match self {
            TypeTemplate::Struct(structure) => &structure.name,
            TypeTemplate::Union(union) => &union.name,
        }
    }

    pub fn type_params(&self) -> &[String] {
        match self {
            TypeTemplate::Struct(structure) => &structure.type_params,
            TypeTemplate::Union(union) => &union.type_params,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            TypeTemplate::Struct(structure) => structure.span,
            TypeTemplate::Union(union) => union.span,
        }
    }

    pub fn search_space(&self) -> &NameSearchSpace {
        match self {
            TypeTemplate::Struct(structure) => &structure.search_space,
            TypeTemplate::Union(union) => &union.search_space,
        }
    }
}

/// Generic functions and types by qualified base name.
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    functions: FxHashMap<String, Vec<FunctionTemplate>>,
    types: FxHashMap<String, TypeTemplate>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_function(&mut self, template: FunctionTemplate) {
        self.functions
            .entry(template.name().to_string())
            .or_default()
            .push(template);
    }

    pub fn add_type(&mut self, template: TypeTemplate) -> Result<(), CompilationError> {
        let name = template.name().to_string();
        if self.types.contains_key(&name) {
            return Err(CompilationError::DuplicateDefinition {
                name,
                span: template.span(),
            });
        }
        self.types.insert(name, template);
        Ok(())
    }

    /// Function templates whose base name is exactly `name`, in registration order.
    pub fn functions_named(&self, name: &str) -> &[FunctionTemplate] {
        self.functions.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn type_template(&self, name: &str) -> Option<&TypeTemplate> {
        self.types.get(name)
    }

    pub fn function_count(&self) -> usize {
        self.functions.values().map(Vec::len).sum()
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }
}
