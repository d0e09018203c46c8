//! Generic instantiation.
//!
//! Generic functions, structs, and unions live in the
//! [`TemplateRegistry`](pie_registry::TemplateRegistry) and are only bound
//! when a call or type reference needs a concrete instance. Templates are
//! never mutated: an instance is the template bound under a substitution map.
//!
//! ## Components
//!
//! - [`infer_type_args`]: structural type-argument inference
//! - `CompilationContext::instantiate_type`: concrete struct or union instance
//! - `CompilationContext::instantiate_function`: concrete function instance
//! - `CompilationContext::instantiate_companion`: companion of a generic type

mod inference;
mod instantiation;

pub use inference::infer_type_args;
