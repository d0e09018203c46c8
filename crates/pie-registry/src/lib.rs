//! Pie Registry
//!
//! The symbol tables of one compile unit:
//!
//! - [`FunctionTable`]: bound callables keyed by mangled name
//! - [`TypeTable`]: concrete struct and union definitions
//! - [`TemplateRegistry`]: generic functions and types, consulted on a miss
//! - [`InstanceCache`]: which generic instances already exist

pub mod function_table;
pub mod instance_cache;
pub mod templates;
pub mod type_table;

pub use function_table::{
    BoundFunction, Callable, ForeignFunction, FunctionBody, FunctionTable, IntrinsicFunction, PendingBody,
};
pub use instance_cache::InstanceCache;
pub use templates::{CompanionTemplate, FunctionTemplate, TemplateRegistry, TypeTemplate};
pub use type_table::TypeTable;
